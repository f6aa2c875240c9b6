//! Base alphabet validation and lookup tables.
//!
//! An [`Alphabet`] is the ordered character set an identifier is rendered
//! through; its length is the encoding radix. Construction validates the
//! character set eagerly and builds the inverse index table once, so
//! encode and decode never revalidate and the tables are read-only for
//! the lifetime of the codec.

/// First allowed alphabet character (`!`). Characters must be printable
/// ASCII, which also rules out whitespace.
const PRINTABLE_LOW: u8 = 0x21;

/// Last allowed alphabet character (`~`).
const PRINTABLE_HIGH: u8 = 0x7E;

/// The default 58-character alphabet: alphanumerics with the visually
/// ambiguous `0`, `O`, `I` and `l` removed.
pub const DEFAULT_ALPHABET: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Errors detected while validating an alphabet string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AlphabetError {
    /// Fewer than two characters; no radix below 2 can encode anything.
    #[error("alphabet must contain at least 2 characters, got {0}")]
    TooShort(usize),

    /// A character outside printable ASCII (whitespace included).
    #[error("alphabet character {0:?} is not printable ASCII")]
    ForbiddenCharacter(char),

    /// The same character appears twice.
    #[error("duplicate alphabet character {0:?}")]
    DuplicateCharacter(char),
}

/// A validated base alphabet and its inverse index table.
///
/// The table maps each ASCII byte to its digit value, making per-character
/// decoding a single array read. Both the character list and the table are
/// written once at construction and never mutated.
#[derive(Debug, Clone)]
pub struct Alphabet {
    /// Characters in digit order; `chars[0]` is the zero character.
    chars: Vec<u8>,
    /// Inverse of `chars`, indexed by ASCII byte.
    index: [Option<u32>; 128],
}

impl Alphabet {
    /// Validates `alphabet` and builds the lookup tables.
    ///
    /// Every character must be printable ASCII (`0x21..=0x7E`, so no
    /// whitespace) and appear exactly once, and at least two characters
    /// are required.
    pub fn new(alphabet: &str) -> Result<Self, AlphabetError> {
        let mut chars = Vec::with_capacity(alphabet.len());
        let mut index = [None; 128];
        for ch in alphabet.chars() {
            if !ch.is_ascii() {
                return Err(AlphabetError::ForbiddenCharacter(ch));
            }
            let byte = ch as u8;
            if !(PRINTABLE_LOW..=PRINTABLE_HIGH).contains(&byte) {
                return Err(AlphabetError::ForbiddenCharacter(ch));
            }
            if index[byte as usize].is_some() {
                return Err(AlphabetError::DuplicateCharacter(ch));
            }
            index[byte as usize] = Some(chars.len() as u32);
            chars.push(byte);
        }
        if chars.len() < 2 {
            return Err(AlphabetError::TooShort(chars.len()));
        }
        Ok(Alphabet { chars, index })
    }

    /// The encoding radix (number of characters).
    pub fn radix(&self) -> u32 {
        self.chars.len() as u32
    }

    /// The character for a digit value. Panics if the digit is out of
    /// range, which indicates a radix-conversion bug rather than bad
    /// input.
    pub fn char_at(&self, digit: u32) -> char {
        self.chars[digit as usize] as char
    }

    /// The digit value of a character, or `None` if the character is not
    /// part of this alphabet.
    pub fn index_of(&self, ch: char) -> Option<u32> {
        if !ch.is_ascii() {
            return None;
        }
        self.index[ch as usize]
    }

    /// The character representing the digit zero, used for left-padding.
    pub fn zero_char(&self) -> char {
        self.chars[0] as char
    }
}

impl Default for Alphabet {
    fn default() -> Self {
        // The default alphabet is a compile-time constant and always
        // passes validation.
        match Alphabet::new(DEFAULT_ALPHABET) {
            Ok(alphabet) => alphabet,
            Err(_) => unreachable!("default alphabet is valid"),
        }
    }
}
