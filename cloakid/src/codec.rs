//! Identifier generation and decoding.
//!
//! A packed identifier is a single arbitrary-width integer laid out
//! MSB-first as:
//!
//! ```text
//! [ flag:1 = 1 ][ header:6 ][ timestamp:timestamp_bits? ][ random:entropy_bits ]
//! ```
//!
//! The flag bit is always 1, so the integer's minimal binary form reveals
//! the exact total width after a round trip through base conversion. The
//! header carries the timestamp field's bit width, XOR-obfuscated with the
//! low 6 bits of the random field; the timestamp (when present) is
//! XOR-obfuscated with the top `timestamp_bits` bits of the random field.
//! Both pads are drawn from *within* the random field, which is stored
//! unmodified, so a decoder can strip the obfuscation using nothing but
//! the alphabet. No external record of the configured widths is needed.

use std::fmt;

use serde::Serialize;
use time::OffsetDateTime;

use crate::alphabet::Alphabet;
use crate::source::{Clock, EntropySource, OsEntropy, SystemClock};
use crate::uint::Uint;

/// Width of the forced leading flag bit.
const FLAG_BITS: u32 = 1;

/// Width of the header field carrying the timestamp bit width.
const HEADER_BITS: u32 = 6;

/// Largest timestamp width the 6-bit header can describe.
pub const MAX_TIMESTAMP_BITS: u8 = 63;

/// Default timestamp field width. 42 bits of milliseconds keeps the
/// masked value equal to the true Unix time until the year 2109.
pub const DEFAULT_TIMESTAMP_BITS: u8 = 42;

/// Default random field width.
pub const DEFAULT_ENTROPY_BITS: u16 = 90;

/// Codec configuration. Validated once when the [`IdCodec`] is built;
/// no partially valid configuration ever reaches the encode/decode paths.
#[derive(Debug, Clone)]
pub struct Settings {
    /// The base alphabet identifiers are rendered through.
    pub alphabet: Alphabet,
    /// Timestamp field width in bits; zero disables the field.
    pub timestamp_bits: u8,
    /// Random field width in bits. Must cover the 6-bit header pad plus
    /// the timestamp pad, both of which are drawn from this field.
    pub entropy_bits: u16,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            alphabet: Alphabet::default(),
            timestamp_bits: DEFAULT_TIMESTAMP_BITS,
            entropy_bits: DEFAULT_ENTROPY_BITS,
        }
    }
}

/// Errors detected while validating [`Settings`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    /// The timestamp width cannot be described by the 6-bit header.
    #[error("timestamp width {0} exceeds the header maximum of 63 bits")]
    TimestampTooWide(u8),

    /// The random field is too narrow to supply both obfuscation pads.
    #[error(
        "entropy width {actual} cannot supply the obfuscation pads; \
         a {timestamp_bits}-bit timestamp needs at least {required} bits"
    )]
    EntropyTooNarrow {
        /// The configured entropy width.
        actual: u16,
        /// The minimum legal entropy width, `timestamp_bits + 6`.
        required: u16,
        /// The configured timestamp width.
        timestamp_bits: u8,
    },
}

/// Errors detected while decoding an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The input contains a character outside the configured alphabet.
    #[error("identifier contains {0:?}, which is not in the alphabet")]
    InvalidCharacter(char),

    /// The payload is too narrow to contain the header and its pad.
    #[error("identifier payload of {0} bits is too narrow to contain a header")]
    TruncatedPayload(u32),

    /// The recovered header declares a timestamp wider than the payload
    /// can hold. The identifier is corrupted; field widths are never
    /// clamped to force a reading.
    #[error(
        "header declares a {timestamp_bits}-bit timestamp, \
         which does not fit a {payload_bits}-bit payload"
    )]
    FieldWidthMismatch {
        /// Payload width after stripping the flag bit.
        payload_bits: u32,
        /// Timestamp width recovered from the header.
        timestamp_bits: u8,
    },
}

/// The structured contents of a decoded identifier.
///
/// Produced fresh by every [`IdCodec::decode`] call and never mutated
/// afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodedId {
    /// Width of the timestamp field in bits, recovered from the header.
    pub timestamp_length: u8,
    /// The de-obfuscated timestamp in milliseconds, masked to
    /// `timestamp_length` bits at generation time. Zero when the field
    /// is absent.
    pub timestamp: u64,
    /// Width of the random field in bits.
    pub random_length: u32,
    /// The random field as lowercase hex, zero-padded to
    /// `ceil(random_length / 4)` digits.
    pub random: String,
    /// The timestamp as a calendar date, when the field is present and
    /// the masked value lands in the representable range.
    #[serde(with = "time::serde::rfc3339::option")]
    pub formatted_timestamp: Option<OffsetDateTime>,
    /// Minimal binary form of the full packed value, flag bit included.
    pub binary: String,
}

/// A configured identifier codec.
///
/// Owns the validated alphabet tables exclusively and holds the injected
/// entropy and clock collaborators. Both [`IdCodec::generate`] and
/// [`IdCodec::decode`] take `&self` and keep no per-call state, so one
/// instance may be shared freely across threads.
pub struct IdCodec {
    alphabet: Alphabet,
    timestamp_bits: u8,
    entropy_bits: u16,
    /// Fixed output length in characters, precomputed at construction.
    encoded_len: usize,
    entropy: Box<dyn EntropySource>,
    clock: Box<dyn Clock>,
}

impl IdCodec {
    /// Builds a codec from `settings` with the operating-system CSPRNG
    /// and the system wall clock.
    pub fn new(settings: Settings) -> Result<Self, SettingsError> {
        Self::with_sources(settings, Box::new(OsEntropy), Box::new(SystemClock))
    }

    /// Builds a codec with explicit entropy and clock collaborators.
    ///
    /// This is the seam deterministic tests use; production callers want
    /// [`IdCodec::new`].
    pub fn with_sources(
        settings: Settings,
        entropy: Box<dyn EntropySource>,
        clock: Box<dyn Clock>,
    ) -> Result<Self, SettingsError> {
        let Settings { alphabet, timestamp_bits, entropy_bits } = settings;
        if timestamp_bits > MAX_TIMESTAMP_BITS {
            return Err(SettingsError::TimestampTooWide(timestamp_bits));
        }
        let required = u16::from(timestamp_bits) + HEADER_BITS as u16;
        if entropy_bits < required {
            return Err(SettingsError::EntropyTooNarrow {
                actual: entropy_bits,
                required,
                timestamp_bits,
            });
        }
        let total_bits = FLAG_BITS + HEADER_BITS + u32::from(timestamp_bits) + u32::from(entropy_bits);
        let encoded_len = min_encoded_len(alphabet.radix(), total_bits);
        Ok(IdCodec {
            alphabet,
            timestamp_bits,
            entropy_bits,
            encoded_len,
            entropy,
            clock,
        })
    }

    /// The configured timestamp width in bits.
    pub fn timestamp_bits(&self) -> u8 {
        self.timestamp_bits
    }

    /// The configured random-field width in bits.
    pub fn entropy_bits(&self) -> u16 {
        self.entropy_bits
    }

    /// The fixed length in characters of every generated identifier.
    pub fn encoded_len(&self) -> usize {
        self.encoded_len
    }

    /// The configured alphabet.
    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    /// Generates a fresh identifier.
    ///
    /// Draws `entropy_bits` random bits, obfuscates the header and (when
    /// configured) the masked clock reading with pads taken from within
    /// the random field, packs flag, header, timestamp and random fields
    /// MSB-first, and renders the result through the alphabet at the
    /// codec's fixed output length.
    pub fn generate(&self) -> String {
        let entropy_bits = u32::from(self.entropy_bits);
        let timestamp_bits = u32::from(self.timestamp_bits);

        let mut buf = vec![0u8; (entropy_bits as usize).div_ceil(8)];
        self.entropy.fill(&mut buf);
        let random = &Uint::from_be_bytes(&buf) & &low_mask(entropy_bits);

        // The header self-describes the timestamp width, hidden behind
        // the low 6 bits of the random field.
        let header = u64::from(self.timestamp_bits);
        let header_pad = narrow(&(&random & &low_mask(HEADER_BITS)));
        let obfuscated_header = header ^ header_pad;

        let mut packed = Uint::one();
        packed = &(&packed << HEADER_BITS) | &Uint::from(obfuscated_header);
        if timestamp_bits > 0 {
            let raw = self.clock.now_millis() & u64_mask(timestamp_bits);
            // The pad is the top timestamp_bits bits of the random field.
            let pad = narrow(&(&random >> (entropy_bits - timestamp_bits)));
            let obfuscated = raw ^ pad;
            packed = &(&packed << timestamp_bits) | &Uint::from(obfuscated);
        }
        packed = &(&packed << entropy_bits) | &random;

        self.render(&packed)
    }

    /// Decodes an identifier into its constituent fields.
    ///
    /// Self-describing: only the alphabet is consulted, never the
    /// configured widths, so a codec built from the alphabet alone can
    /// decode identifiers produced under any width configuration.
    pub fn decode(&self, id: &str) -> Result<DecodedId, DecodeError> {
        let radix = self.alphabet.radix();
        let mut digits = Vec::with_capacity(id.len());
        for ch in id.chars() {
            let digit = self
                .alphabet
                .index_of(ch)
                .ok_or(DecodeError::InvalidCharacter(ch))?;
            digits.push(digit);
        }
        let full = Uint::from_radix_digits(&digits, radix);

        // The flag bit is the most significant set bit; everything below
        // it is payload. A well-formed payload holds at least the header
        // and the 6-bit slice of random that pads it.
        let bit_len = full.bit_len();
        if bit_len < FLAG_BITS + 2 * HEADER_BITS {
            return Err(DecodeError::TruncatedPayload(bit_len.saturating_sub(FLAG_BITS)));
        }
        let payload_bits = bit_len - FLAG_BITS;
        let value = full.saturating_sub(&Uint::pow2(payload_bits));

        // Self-description: the header XOR mask is the low 6 bits of the
        // random field, which sits at the low end of the payload no
        // matter how wide the timestamp is.
        let encoded_header = narrow(&(&value >> (payload_bits - HEADER_BITS)));
        let header_mask = narrow(&(&value & &low_mask(HEADER_BITS)));
        let timestamp_bits = (encoded_header ^ header_mask) as u8;

        let random_bits = payload_bits as i64 - HEADER_BITS as i64 - i64::from(timestamp_bits);
        if random_bits < i64::from(timestamp_bits) {
            // Covers both a negative random width and a timestamp pad
            // wider than the random field that must supply it.
            return Err(DecodeError::FieldWidthMismatch {
                payload_bits,
                timestamp_bits,
            });
        }
        let random_bits = random_bits as u32;
        let random = &value & &low_mask(random_bits);

        let (timestamp, formatted_timestamp) = if timestamp_bits > 0 {
            let width = u32::from(timestamp_bits);
            let encoded = narrow(&(&(&value >> random_bits) & &low_mask(width)));
            let pad = narrow(&(&random >> (random_bits - width)));
            let timestamp = encoded ^ pad;
            (timestamp, format_timestamp(timestamp))
        } else {
            (0, None)
        };

        Ok(DecodedId {
            timestamp_length: timestamp_bits,
            timestamp,
            random_length: random_bits,
            random: to_hex(&random, random_bits),
            formatted_timestamp,
            binary: full.to_binary_string(),
        })
    }

    /// Renders a packed value through the alphabet, left-padded with the
    /// zero character to the codec's fixed length.
    fn render(&self, value: &Uint) -> String {
        let digits = value.to_radix_digits(self.alphabet.radix());
        let mut out = String::with_capacity(self.encoded_len.max(digits.len()));
        for _ in digits.len()..self.encoded_len {
            out.push(self.alphabet.zero_char());
        }
        for digit in digits {
            out.push(self.alphabet.char_at(digit));
        }
        out
    }
}

impl Default for IdCodec {
    fn default() -> Self {
        match IdCodec::new(Settings::default()) {
            Ok(codec) => codec,
            Err(_) => unreachable!("default settings are valid"),
        }
    }
}

impl fmt::Debug for IdCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdCodec")
            .field("radix", &self.alphabet.radix())
            .field("timestamp_bits", &self.timestamp_bits)
            .field("entropy_bits", &self.entropy_bits)
            .field("encoded_len", &self.encoded_len)
            .finish_non_exhaustive()
    }
}

/// Smallest output length whose alphabet capacity covers every possible
/// packed value: the least `len` with `radix^len >= 2^total_bits`.
///
/// Computed with exact integer arithmetic; a floating-point
/// `ceil(bits / log2(radix))` can land on the wrong side of an exact
/// power.
fn min_encoded_len(radix: u32, total_bits: u32) -> usize {
    let target = Uint::pow2(total_bits);
    let mut capacity = Uint::one();
    let mut len = 0;
    while capacity < target {
        capacity = &capacity * &Uint::from(u64::from(radix));
        len += 1;
    }
    len
}

/// A mask covering the low `bits` bits.
fn low_mask(bits: u32) -> Uint {
    Uint::pow2(bits).saturating_sub(&Uint::one())
}

/// A native mask covering the low `bits` bits, for `bits <= 63`.
fn u64_mask(bits: u32) -> u64 {
    debug_assert!(bits <= 63);
    (1u64 << bits) - 1
}

/// Reads a value the caller has already masked to at most 64 bits.
fn narrow(value: &Uint) -> u64 {
    match value.to_u64() {
        Some(narrowed) => narrowed,
        None => unreachable!("masked value wider than 64 bits"),
    }
}

/// Lowercase hex rendering of the random field, zero-padded to the
/// field's nibble count.
fn to_hex(value: &Uint, bits: u32) -> String {
    let nibbles = (bits as usize).div_ceil(4).max(1);
    let digits = value.to_radix_digits(16);
    let mut out = String::with_capacity(nibbles.max(digits.len()));
    for _ in digits.len()..nibbles {
        out.push('0');
    }
    for digit in digits {
        out.push(b"0123456789abcdef"[digit as usize] as char);
    }
    out
}

/// Maps a millisecond timestamp onto a calendar date. Values outside the
/// representable range (possible only for very wide timestamp fields)
/// are left unformatted.
fn format_timestamp(millis: u64) -> Option<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000).ok()
}
