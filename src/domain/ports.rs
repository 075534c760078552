use crate::domain::model::MappingKind;
use crate::utils::error::Result;
use async_trait::async_trait;

/// Reads the raw bytes of a source, remote or local.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, source: &str) -> Result<Vec<u8>>;
}

pub trait ConfigProvider: Send + Sync {
    fn database_path(&self) -> &str;
    fn table_name(&self, kind: MappingKind) -> &str;
    /// Seconds between table reloads in the label resolver.
    fn reload_frequency(&self) -> i64;
}
