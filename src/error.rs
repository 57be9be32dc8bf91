use crate::persistence::PersistenceError;
use chrono::NaiveDate;
use thiserror::Error;

/// Everything that can stop an import or export from completing.
#[derive(Debug, Error)]
pub enum InterchangeError {
    #[error("Unsupported file format: .{extension}")]
    UnsupportedFormat { extension: String },

    #[error("Failed to read file '{file_name}'")]
    Read {
        file_name: String,
        #[source]
        source: std::str::Utf8Error,
    },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid document: {0}")]
    InvalidDocument(String),

    #[error("programme declares {declared} tasks but carries {actual}")]
    TaskCountMismatch { declared: usize, actual: usize },

    #[error("Demo mode limited to {limit} tasks. File contains {found} tasks.")]
    DemoTaskQuotaExceeded { limit: usize, found: usize },

    #[error("Demo mode limited to {limit} exports per session.")]
    DemoExportQuotaExceeded { limit: usize },

    #[error("Date range of {days} days exceeds the maximum of {max_days} days.")]
    DateRangeTooLarge { days: i64, max_days: i64, demo: bool },

    #[error("date range start {start} must be on or before end {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl InterchangeError {
    /// True for the policy gates that reject a request before any work is done.
    pub fn is_quota(&self) -> bool {
        matches!(
            self,
            InterchangeError::DemoTaskQuotaExceeded { .. }
                | InterchangeError::DemoExportQuotaExceeded { .. }
                | InterchangeError::DateRangeTooLarge { .. }
        )
    }

    /// True when the caller sent something the engine cannot interpret.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            InterchangeError::UnsupportedFormat { .. }
                | InterchangeError::Read { .. }
                | InterchangeError::Csv(_)
                | InterchangeError::Json(_)
                | InterchangeError::InvalidDocument(_)
                | InterchangeError::TaskCountMismatch { .. }
                | InterchangeError::InvalidDateRange { .. }
        )
    }
}

pub type InterchangeResult<T> = Result<T, InterchangeError>;
