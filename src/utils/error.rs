use thiserror::Error;

#[derive(Error, Debug)]
pub enum MappingError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Timestamp parsing error: {0}")]
    TimestampError(#[from] chrono::ParseError),

    #[error("Source returned HTTP {status} for {url}")]
    SourceStatusError { url: String, status: u16 },

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Malformed row {line}: {message}")]
    MalformedRowError { line: u64, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Data,
    Storage,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl MappingError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::HttpError(_) | Self::SourceStatusError { .. } => ErrorCategory::Network,
            Self::CsvError(_)
            | Self::SerializationError(_)
            | Self::TimestampError(_)
            | Self::MalformedRowError { .. } => ErrorCategory::Data,
            Self::IoError(_) | Self::DatabaseError(_) => ErrorCategory::Storage,
            Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // 網路錯誤通常重跑即可
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Data | ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Storage => ErrorSeverity::Critical,
        }
    }

    /// 根據嚴重程度決定退出碼，所有錯誤都是非零
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::High => 1,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::Critical => 3,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::HttpError(e) if e.is_timeout() => "The remote source timed out".to_string(),
            Self::HttpError(_) | Self::SourceStatusError { .. } => {
                format!("Could not fetch the remote source: {}", self)
            }
            Self::DatabaseError(e) => format!("Database operation failed: {}", e),
            Self::MalformedRowError { line, message } => {
                format!("Input row {} is malformed: {}", line, message)
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => "Check network access to the source address and retry",
            ErrorCategory::Data => "Inspect the input file; every row needs label,code,apply_from,apply_to",
            ErrorCategory::Storage => "Check that the database path is writable and not locked",
            ErrorCategory::Configuration => "Review the command line arguments and config file",
        }
    }
}

pub type Result<T> = std::result::Result<T, MappingError>;
