//! Randomness and clock collaborators.
//!
//! The codec never reaches for ambient globals: it draws random bytes and
//! wall-clock readings through these two traits, so tests can substitute
//! deterministic sources and assert the exact bit layout of a generated
//! identifier.

use std::time::{SystemTime, UNIX_EPOCH};

use rand::rngs::OsRng;
use rand::RngCore;

/// A cryptographically secure source of random bytes.
///
/// Implementations must be safe to call concurrently; the codec invokes
/// [`EntropySource::fill`] from `&self` on every generate call.
pub trait EntropySource: Send + Sync {
    /// Fills `buf` entirely with random bytes.
    fn fill(&self, buf: &mut [u8]);
}

/// A wall-clock source measuring elapsed time since the Unix epoch.
pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn now_millis(&self) -> u64;
}

/// The operating system CSPRNG, via [`rand::rngs::OsRng`].
#[derive(Debug, Clone, Copy, Default)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn fill(&self, buf: &mut [u8]) {
        OsRng.fill_bytes(buf);
    }
}

/// The system wall clock. Pre-epoch readings clamp to zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// Deterministic test doubles.
#[cfg(any(test, feature = "testing"))]
pub mod testing {
    use super::{Clock, EntropySource};

    /// An entropy source that repeats a fixed byte pattern, making the
    /// random field of a generated identifier fully predictable.
    #[derive(Debug, Clone)]
    pub struct FixedEntropy {
        bytes: Vec<u8>,
    }

    impl FixedEntropy {
        /// Creates a source cycling through `bytes`. The pattern must be
        /// non-empty.
        pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
            let bytes = bytes.into();
            assert!(!bytes.is_empty(), "entropy pattern must be non-empty");
            FixedEntropy { bytes }
        }
    }

    impl EntropySource for FixedEntropy {
        fn fill(&self, buf: &mut [u8]) {
            for (slot, &byte) in buf.iter_mut().zip(self.bytes.iter().cycle()) {
                *slot = byte;
            }
        }
    }

    /// A clock frozen at a fixed instant.
    #[derive(Debug, Clone, Copy)]
    pub struct FixedClock(pub u64);

    impl Clock for FixedClock {
        fn now_millis(&self) -> u64 {
            self.0
        }
    }
}
