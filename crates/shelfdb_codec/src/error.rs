//! Error types for record encoding and decoding.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while encoding or decoding records.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    /// Input block length does not match the variant's declared size.
    #[error("size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch {
        /// The declared record size.
        expected: usize,
        /// The actual input length.
        actual: usize,
    },

    /// Record key cannot be represented in the 4-byte key field.
    #[error("invalid record key: {key:?} is not a u32")]
    InvalidKey {
        /// The offending key.
        key: String,
    },

    /// Unknown user role tag.
    #[error("unknown role tag: {value:#04x}")]
    UnknownRole {
        /// The raw tag byte.
        value: u8,
    },

    /// A string field holds bytes that are not valid UTF-8.
    #[error("string field is not valid UTF-8")]
    InvalidUtf8,
}
