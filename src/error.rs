use thiserror::Error;

/// Domain errors raised while loading, aggregating or selecting.
///
/// These travel inside `anyhow::Error` so callers can still add context,
/// but tests and hosts can `downcast_ref` to tell them apart.
#[derive(Debug, Error, PartialEq)]
pub enum DashboardError {
    #[error("Column '{0}' not found")]
    MissingColumn(String),

    #[error("Top-N must be between {min} and {max}, got {got}")]
    TopNOutOfRange { got: usize, min: usize, max: usize },

    #[error("Failed to parse '{value}' as number in column '{column}' at row {row}")]
    NotNumeric {
        value: String,
        column: String,
        row: usize,
    },

    #[error("Variable '${0}' not defined")]
    UndefinedVariable(String),
}
