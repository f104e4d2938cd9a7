use thiserror::Error;

/// Malformed setup configuration. The only fallible entry point in the
/// engine's public surface — everything else is a logged no-op.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("rows must be in 4..=16, got {0}")]
    RowsOutOfRange(usize),
    #[error("columns must be in 4..=16, got {0}")]
    ColumnsOutOfRange(usize),
    #[error("duration must be positive, got {0}")]
    DurationNotPositive(i64),
}
