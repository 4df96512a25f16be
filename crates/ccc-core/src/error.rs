use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CccError {
    #[error("Invalid input: {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Invalid configuration: {field}: {reason}")]
    InvalidConfiguration { field: String, reason: String },

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Empty dataset: {0}")]
    EmptyDataset(String),

    #[error("Infeasible: {variable} needs {lower} <= x <= {upper} after applying constraints")]
    Infeasible {
        variable: String,
        lower: Decimal,
        upper: Decimal,
    },

    #[error("Solver error: {0}")]
    Solver(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for CccError {
    fn from(e: serde_json::Error) -> Self {
        CccError::SerializationError(e.to_string())
    }
}
