//! Convenience result type alias for StockPulse.

use crate::error::AppError;

/// A specialized `Result` type for StockPulse operations.
pub type AppResult<T> = Result<T, AppError>;
