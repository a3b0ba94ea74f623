use thiserror::Error;

/// Errors raised by the cluster table and the preprocessing stages.
///
/// File-level failures (unreadable source, unwritable destination) are
/// reported through `anyhow` with the offending path attached; this enum
/// covers everything that can go wrong once a table is in memory.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PrepError {
    /// A column referenced by a stage or by the configuration is absent.
    #[error("column '{column}' is missing from the table")]
    MissingColumn { column: String },

    #[error("column '{column}' appears more than once")]
    DuplicateColumn { column: String },

    #[error("column '{column}' has {found} rows but the table has {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        found: usize,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),
}

impl PrepError {
    pub(crate) fn missing(column: &str) -> Self {
        PrepError::MissingColumn {
            column: column.to_string(),
        }
    }
}

pub type PrepResult<T> = Result<T, PrepError>;
