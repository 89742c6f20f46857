use thiserror::Error;

#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("Input source unavailable: {path}: {source}")]
    InputUnavailable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration for '{field}' (value: '{value}'): {reason}")]
    InvalidConfiguration {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration parsing error: {message}")]
    ConfigParse { message: String },

    #[error("Malformed record: {message}")]
    RecordMalformed { message: String },

    #[error("Record for '{customer}' spans no hours ({start_hour} -> {end_hour})")]
    ZeroOrNegativeSpan {
        customer: String,
        start_hour: u32,
        end_hour: u32,
    },

    #[error("Storage unavailable during {operation}: {message}")]
    StorageUnavailable { operation: String, message: String },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// 錯誤分類，用於日誌與退出碼
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Configuration,
    Record,
    Storage,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl SchedulerError {
    pub fn storage(operation: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::StorageUnavailable {
            operation: operation.into(),
            message: message.to_string(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::RecordMalformed {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InputUnavailable { .. } => ErrorCategory::Input,
            Self::InvalidConfiguration { .. } | Self::ConfigParse { .. } => {
                ErrorCategory::Configuration
            }
            Self::RecordMalformed { .. } | Self::ZeroOrNegativeSpan { .. } | Self::CsvError(_) => {
                ErrorCategory::Record
            }
            Self::StorageUnavailable { .. } | Self::SerializationError(_) => ErrorCategory::Storage,
            Self::IoError(_) => ErrorCategory::System,
        }
    }

    /// Low/Medium 可在最小單位內恢復；High/Critical 會中止整個執行
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::ZeroOrNegativeSpan { .. } => ErrorSeverity::Low,
            Self::RecordMalformed { .. } | Self::CsvError(_) => ErrorSeverity::Medium,
            Self::StorageUnavailable { .. } | Self::SerializationError(_) => ErrorSeverity::Medium,
            Self::InvalidConfiguration { .. } | Self::ConfigParse { .. } => ErrorSeverity::High,
            Self::InputUnavailable { .. } | Self::IoError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.severity() >= ErrorSeverity::High
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::InputUnavailable { path, .. } => {
                format!("Input file does not exist or cannot be opened: {}", path)
            }
            Self::InvalidConfiguration { field, reason, .. } => {
                format!("Invalid setting '{}': {}", field, reason)
            }
            Self::ConfigParse { message } => format!("Could not read configuration: {}", message),
            Self::RecordMalformed { message } => format!("Skipped a malformed row: {}", message),
            Self::ZeroOrNegativeSpan { customer, .. } => {
                format!("Skipped a row for '{}' with no active hours", customer)
            }
            Self::StorageUnavailable { operation, .. } => {
                format!("Storage failed during {}; results may be incomplete", operation)
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Input => "Check that the --input path exists and is readable",
            ErrorCategory::Configuration => {
                "Utilization must be in (0, 1]; batch size and workers must be at least 1"
            }
            ErrorCategory::Record => "Fix the offending row in the input CSV and re-run",
            ErrorCategory::Storage => "Check free disk space and permissions on the output directory",
            ErrorCategory::System => "Re-run with --verbose for details",
        }
    }

    /// 依嚴重程度決定退出碼
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
