pub mod error;
pub mod metrics;
pub mod optimizer;
pub mod types;

#[cfg(feature = "monte_carlo")]
pub mod simulation;

#[cfg(feature = "monte_carlo")]
pub mod analysis;

pub use error::CccError;
pub use types::*;

/// Standard result type for all cash conversion cycle operations
pub type CccResult<T> = Result<T, CccError>;
