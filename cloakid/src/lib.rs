#![deny(missing_docs)]

//! # cloakid: self-describing obfuscated identifiers
//!
//! `cloakid` generates and decodes compact, URL-safe unique identifiers
//! built from a timestamp, random entropy, and a hidden structural
//! header, packed into one arbitrary-width integer and rendered through
//! a custom base alphabet.
//!
//! The layout is self-describing: a 6-bit header records the timestamp
//! field's width and is XOR-obfuscated with bits of the random field, so
//! a decoder recovers every field boundary from the encoded value and
//! the alphabet alone. No width configuration travels with the
//! identifier and none is needed to read one.
//!
//! ## Usage Example
//!
//! ```
//! use cloakid::{IdCodec, Settings};
//!
//! let codec = IdCodec::new(Settings::default()).unwrap();
//!
//! let id = codec.generate();
//! let decoded = codec.decode(&id).unwrap();
//!
//! assert_eq!(decoded.timestamp_length, 42);
//! assert_eq!(decoded.random_length, 90);
//! ```
//!
//! ## Obfuscation, not secrecy
//!
//! The XOR pads hide the timestamp structure from casual inspection and
//! the entropy width provides collision resistance. The scheme makes no
//! confidentiality or tamper-resistance guarantees.
//!
//! ## Architecture
//!
//! * **`uint`**: arbitrary-precision unsigned integer substrate; the
//!   packed value exceeds every native integer width
//! * **`alphabet`**: validated base alphabet and inverse index table
//! * **`codec`**: bit layout, XOR obfuscation, radix rendering
//! * **`source`**: injected entropy and clock collaborators

pub mod alphabet;
pub mod codec;
pub mod error;
pub mod source;
pub mod uint;

#[cfg(test)]
mod tests;

pub use alphabet::{Alphabet, AlphabetError, DEFAULT_ALPHABET};
pub use codec::{
    DecodeError, DecodedId, IdCodec, Settings, SettingsError, DEFAULT_ENTROPY_BITS,
    DEFAULT_TIMESTAMP_BITS, MAX_TIMESTAMP_BITS,
};
pub use error::Error;
pub use source::{Clock, EntropySource, OsEntropy, SystemClock};
pub use uint::Uint;
