//! # stockpulse-core
//!
//! Core crate for StockPulse. Contains the configuration schemas and the
//! unified error system shared by the stream client and the binaries.
//!
//! This crate has **no** internal dependencies on other StockPulse crates.

pub mod config;
pub mod error;
pub mod result;

pub use error::AppError;
pub use result::AppResult;
