//! # Error Types
//!
//! Errors raised by the foundational types. All errors use `thiserror`
//! for derive-based `Display` and `Error` implementations.

use thiserror::Error;

/// Top-level error type for `kdlconf-core`.
#[derive(Error, Debug)]
pub enum CoreError {
    /// The output tree could not be converted into the requested type.
    #[error("conversion error: {0}")]
    Conversion(#[from] serde_json::Error),
}
