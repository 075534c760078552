//! Entry points shared by the binaries in `src/bin`.

pub mod export;

use crate::utils::error::MappingError;

/// 記錄錯誤並輸出使用者看得懂的訊息，回傳退出碼
pub fn report_failure(context: &str, e: &MappingError) -> i32 {
    tracing::error!(
        "❌ {} failed: {} (Category: {:?}, Severity: {:?})",
        context,
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
    e.exit_code()
}
