//! Error types for packet parsing and validation.

use thiserror::Error;

/// Reasons a payload is refused at the parse boundary.
#[derive(Debug, Error)]
pub enum PacketError {
    /// Not JSON, a required field is missing, or a field has the wrong type.
    #[error("malformed packet: {0}")]
    Malformed(#[from] serde_json::Error),

    /// A numeric field is NaN or infinite.
    #[error("field `{field}` is not a finite number")]
    NonFinite { field: &'static str },

    /// A numeric field is outside the range the schema allows.
    #[error("field `{field}` out of range: {value}")]
    OutOfRange { field: &'static str, value: f64 },
}
