//! Top-level error type for the cloakid library.
//!
//! Each module defines its own focused error enum; this type combines
//! them for callers that thread a single error through configuration and
//! decoding. Errors are returned to the immediate caller with a
//! descriptive message; the codec never retries, logs, or substitutes a
//! default for a failed operation.

use crate::alphabet::AlphabetError;
use crate::codec::{DecodeError, SettingsError};
use crate::uint::DivideByZero;

/// Errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The alphabet string failed validation.
    #[error("invalid alphabet: {0}")]
    Alphabet(#[from] AlphabetError),

    /// The codec settings failed validation.
    #[error("invalid codec settings: {0}")]
    Settings(#[from] SettingsError),

    /// An identifier could not be decoded.
    #[error("could not decode identifier: {0}")]
    Decode(#[from] DecodeError),

    /// An arbitrary-precision division received a zero divisor.
    #[error("{0}")]
    Arithmetic(#[from] DivideByZero),
}
