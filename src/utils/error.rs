use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("TSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("BLAST XML error: {message}")]
    XmlError { message: String },

    #[error("Search failed: {message}")]
    SearchError { message: String },

    #[error("Search gave up after {attempts} attempts: {last_error}")]
    RetryExhausted { attempts: u32, last_error: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Usage error: {message}")]
    UsageError { message: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Storage,
    Data,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl ScanError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ScanError::ApiError(_)
            | ScanError::SearchError { .. }
            | ScanError::RetryExhausted { .. } => ErrorCategory::Network,
            ScanError::IoError(_) => ErrorCategory::Storage,
            ScanError::CsvError(_)
            | ScanError::SerializationError(_)
            | ScanError::XmlError { .. }
            | ScanError::ProcessingError { .. } => ErrorCategory::Data,
            ScanError::ConfigError { .. }
            | ScanError::ConfigValidationError { .. }
            | ScanError::InvalidConfigValueError { .. }
            | ScanError::MissingConfigError { .. }
            | ScanError::UsageError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Data | ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Storage => ErrorSeverity::Critical,
        }
    }

    /// 搜尋服務的失敗一律視為暫時性，交給 RetryPolicy 重試
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ScanError::ApiError(_) | ScanError::SearchError { .. }
        )
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            ScanError::ApiError(_) | ScanError::SearchError { .. } => {
                "Check network connectivity to the BLAST service and try again"
            }
            ScanError::RetryExhausted { .. } => {
                "Raise search.max_attempts or remove it to retry without limit"
            }
            ScanError::IoError(_) => {
                "Check that the project directory exists and is writable"
            }
            ScanError::XmlError { .. } => {
                "Delete the broken file from the cache directory so it is fetched again"
            }
            ScanError::CsvError(_) | ScanError::SerializationError(_) => {
                "Check free disk space and output file permissions"
            }
            ScanError::UsageError { .. } => "Run as: mamscan project=<name>",
            ScanError::ConfigError { .. }
            | ScanError::ConfigValidationError { .. }
            | ScanError::InvalidConfigValueError { .. }
            | ScanError::MissingConfigError { .. } => {
                "Review the TOML configuration file against the documented keys"
            }
            ScanError::ProcessingError { .. } => "Re-run with --verbose for details",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            ScanError::ApiError(e) => format!("Could not reach the search service: {}", e),
            ScanError::IoError(e) => format!("File access failed: {}", e),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ScanError>;
