//! Round-trip and layout testing for the identifier codec: generated
//! identifiers must decode to the configured field widths using nothing
//! but the alphabet, and the obfuscation layout must match the packed
//! format bit-for-bit.

use std::sync::Arc;

use proptest::prelude::*;
use test_case::test_case;

use crate::alphabet::{Alphabet, AlphabetError};
use crate::codec::{DecodeError, IdCodec, Settings, SettingsError};
use crate::source::testing::{FixedClock, FixedEntropy};
use crate::source::{Clock, SystemClock};

/// A codec over the default alphabet with the given field widths and the
/// production entropy/clock sources.
fn codec(timestamp_bits: u8, entropy_bits: u16) -> IdCodec {
    IdCodec::new(Settings {
        alphabet: Alphabet::default(),
        timestamp_bits,
        entropy_bits,
    })
    .expect("valid settings")
}

/// A deterministic codec over the decimal alphabet: 8-bit timestamp,
/// 16-bit random field, fixed entropy pattern and frozen clock.
fn deterministic_codec(entropy: &[u8], now_millis: u64) -> IdCodec {
    IdCodec::with_sources(
        Settings {
            alphabet: Alphabet::new("0123456789").unwrap(),
            timestamp_bits: 8,
            entropy_bits: 16,
        },
        Box::new(FixedEntropy::new(entropy)),
        Box::new(FixedClock(now_millis)),
    )
    .expect("valid settings")
}

#[test]
fn round_trip_recovers_configured_widths() {
    let codec = codec(42, 90);
    let before = SystemClock.now_millis() & ((1 << 42) - 1);
    let id = codec.generate();
    let after = SystemClock.now_millis() & ((1 << 42) - 1);

    let decoded = codec.decode(&id).expect("generated id must decode");
    assert_eq!(decoded.timestamp_length, 42);
    assert_eq!(decoded.random_length, 90);
    assert!(decoded.timestamp >= before && decoded.timestamp <= after);
    assert!(decoded.formatted_timestamp.is_some());
    // flag + header + timestamp + random
    assert_eq!(decoded.binary.len(), 1 + 6 + 42 + 90);
    assert!(decoded.binary.starts_with('1'));
}

#[test_case(0, 78; "no timestamp")]
#[test_case(8, 32; "narrow")]
#[test_case(32, 78; "variant low")]
#[test_case(42, 90; "default widths")]
#[test_case(43, 96; "variant high")]
#[test_case(63, 69; "minimum legal entropy for widest timestamp")]
fn self_description_needs_only_the_alphabet(timestamp_bits: u8, entropy_bits: u16) {
    let generator = codec(timestamp_bits, entropy_bits);
    // The decoder is configured with different widths on purpose; decode
    // must recover the generator's widths from the value alone.
    let decoder = IdCodec::new(Settings::default()).unwrap();

    let id = generator.generate();
    let decoded = decoder.decode(&id).expect("id must self-describe");
    assert_eq!(decoded.timestamp_length, timestamp_bits);
    assert_eq!(
        decoded.random_length,
        u32::from(entropy_bits),
        "random width must be the full entropy field"
    );
}

#[test]
fn generated_length_is_constant() {
    let codec = codec(42, 90);
    let expected = codec.encoded_len();
    for _ in 0..200 {
        assert_eq!(codec.generate().len(), expected);
    }
}

#[test]
fn zero_timestamp_width_omits_the_field() {
    let codec = codec(0, 78);
    let decoded = codec.decode(&codec.generate()).unwrap();
    assert_eq!(decoded.timestamp_length, 0);
    assert_eq!(decoded.timestamp, 0);
    assert_eq!(decoded.formatted_timestamp, None);
    assert_eq!(decoded.random_length, 78);
    // flag + header + random only
    assert_eq!(decoded.binary.len(), 1 + 6 + 78);
}

#[test]
fn concrete_decimal_scenario_is_ten_characters() {
    // 1 + 6 + 8 + 16 = 31 bits; ceil(31 / log2(10)) = 10 characters.
    let codec = deterministic_codec(&[0x5A, 0x7E], 1_000_000);
    assert_eq!(codec.encoded_len(), 10);

    let id = codec.generate();
    assert_eq!(id.len(), 10);
    let decoded = codec.decode(&id).unwrap();
    assert_eq!(decoded.timestamp_length, 8);
    assert_eq!(decoded.random_length, 16);
}

#[test]
fn layout_matches_packed_format_bit_for_bit() {
    // Entropy 0xABCD, clock 0x0012_3456: every field is hand-computable
    // with native arithmetic because the whole value is 31 bits wide.
    let codec = deterministic_codec(&[0xAB, 0xCD], 0x0012_3456);

    let random: u64 = 0xABCD;
    let header: u64 = 8;
    let obfuscated_header = header ^ (random & 0x3F);
    let raw_timestamp: u64 = 0x0012_3456 & 0xFF;
    let obfuscated_timestamp = raw_timestamp ^ (random >> 8);
    let packed =
        (((1u64 << 6 | obfuscated_header) << 8 | obfuscated_timestamp) << 16) | random;

    // Decimal alphabet, so the identifier is the packed value in base 10,
    // zero-padded to the fixed width.
    assert_eq!(codec.generate(), format!("{packed:010}"));

    let decoded = codec.decode(&codec.generate()).unwrap();
    assert_eq!(decoded.timestamp, raw_timestamp);
    assert_eq!(decoded.random, hex::encode([0xAB, 0xCD]));
    assert_eq!(decoded.binary, format!("{packed:b}"));
    assert_eq!(decoded.binary.len(), 31);
}

#[test]
fn repeated_generation_varies_only_in_content() {
    let codec = codec(8, 32);
    let first = codec.generate();
    let second = codec.generate();
    assert_eq!(first.len(), second.len());
    // With 32 random bits a collision here would be a codec bug, not
    // bad luck.
    assert_ne!(first, second);
}

#[test_case(64, 96 => matches SettingsError::TimestampTooWide(64); "timestamp beyond header range")]
#[test_case(63, 68 => matches SettingsError::EntropyTooNarrow { required: 69, .. }; "entropy below pad requirement")]
#[test_case(0, 5 => matches SettingsError::EntropyTooNarrow { required: 6, .. }; "entropy below header pad")]
fn invalid_settings_fail_at_construction(timestamp_bits: u8, entropy_bits: u16) -> SettingsError {
    IdCodec::new(Settings {
        alphabet: Alphabet::default(),
        timestamp_bits,
        entropy_bits,
    })
    .unwrap_err()
}

#[test]
fn minimum_legal_configuration_round_trips() {
    let codec = codec(63, 69);
    let decoded = codec.decode(&codec.generate()).unwrap();
    assert_eq!(decoded.timestamp_length, 63);
    assert_eq!(decoded.random_length, 69);
}

#[test]
fn decode_names_the_offending_character() {
    let codec = codec(42, 90);
    // '0' is excluded from the ambiguity-reduced default alphabet.
    let err = codec.decode("abc0def").unwrap_err();
    assert_eq!(err, DecodeError::InvalidCharacter('0'));
    assert!(err.to_string().contains("'0'"));
}

#[test]
fn decode_rejects_truncated_payloads() {
    let codec = deterministic_codec(&[0xFF], 0);
    // Value 1: flag bit only, no payload at all.
    assert_eq!(codec.decode("1").unwrap_err(), DecodeError::TruncatedPayload(0));
    // Value 0: no flag bit, width is unrecoverable.
    assert_eq!(codec.decode("0000000000").unwrap_err(), DecodeError::TruncatedPayload(0));
}

#[test]
fn decode_rejects_oversized_header_widths() {
    let codec = deterministic_codec(&[0xFF], 0);
    // 13-bit value whose payload reads back a 63-bit timestamp claim:
    // header 0b111111, header pad 0b000000. The 12-bit payload cannot
    // hold it, and the width must never be clamped to force a reading.
    let full = (1u64 << 12) | (0b111111 << 6);
    let err = codec.decode(&full.to_string()).unwrap_err();
    assert_eq!(
        err,
        DecodeError::FieldWidthMismatch { payload_bits: 12, timestamp_bits: 63 }
    );
}

#[test]
fn alphabet_validation_is_eager() {
    assert_eq!(
        Alphabet::new("abc def").unwrap_err(),
        AlphabetError::ForbiddenCharacter(' ')
    );
    assert_eq!(
        Alphabet::new("abcb").unwrap_err(),
        AlphabetError::DuplicateCharacter('b')
    );
    assert_eq!(
        Alphabet::new("ab\u{7f}").unwrap_err(),
        AlphabetError::ForbiddenCharacter('\u{7f}')
    );
}

#[test]
fn decoded_record_serializes_to_json() {
    let codec = deterministic_codec(&[0xAB, 0xCD], 0x0012_3456);
    let decoded = codec.decode(&codec.generate()).unwrap();
    let json = serde_json::to_value(&decoded).unwrap();

    assert_eq!(json["timestamp_length"], 8);
    assert_eq!(json["random_length"], 16);
    assert_eq!(json["random"], "abcd");
    assert!(json["formatted_timestamp"].is_string());
    assert!(json["binary"].as_str().unwrap().starts_with('1'));
}

#[test]
fn codec_is_shareable_across_threads() {
    let codec = Arc::new(codec(42, 90));
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let codec = Arc::clone(&codec);
            std::thread::spawn(move || {
                for _ in 0..50 {
                    let id = codec.generate();
                    let decoded = codec.decode(&id).expect("decode");
                    assert_eq!(decoded.timestamp_length, 42);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("worker panicked");
    }
}

/// Alphabets exercised by the property tests, spanning the radix range
/// the codec supports.
fn alphabet_choices() -> Vec<Alphabet> {
    let printable: String = (0x21u8..=0x7E).map(char::from).collect();
    vec![
        Alphabet::default(),
        Alphabet::new("0123456789").unwrap(),
        Alphabet::new("0123456789abcdef").unwrap(),
        Alphabet::new(&printable).unwrap(),
    ]
}

proptest! {
    #[test]
    fn round_trip_across_configurations(
        timestamp_bits in 0u8..=63,
        extra_entropy in 0u16..=64,
        alphabet_index in 0usize..4,
    ) {
        let entropy_bits = u16::from(timestamp_bits) + 6 + extra_entropy;
        let generator = IdCodec::new(Settings {
            alphabet: alphabet_choices().swap_remove(alphabet_index),
            timestamp_bits,
            entropy_bits,
        })
        .expect("valid settings");

        let id = generator.generate();
        prop_assert_eq!(id.len(), generator.encoded_len());

        let decoded = generator.decode(&id).expect("round trip");
        prop_assert_eq!(decoded.timestamp_length, timestamp_bits);
        prop_assert_eq!(decoded.random_length, u32::from(entropy_bits));
        prop_assert_eq!(
            decoded.binary.len(),
            7 + usize::from(timestamp_bits) + usize::from(entropy_bits)
        );
    }

    #[test]
    fn deterministic_sources_reproduce_identifiers(
        entropy in prop::collection::vec(any::<u8>(), 1..8),
        now_millis in any::<u64>(),
        timestamp_bits in 0u8..=32,
    ) {
        let entropy_bits = u16::from(timestamp_bits) + 6 + 10;
        let build = || {
            IdCodec::with_sources(
                Settings {
                    alphabet: Alphabet::default(),
                    timestamp_bits,
                    entropy_bits,
                },
                Box::new(FixedEntropy::new(entropy.clone())),
                Box::new(FixedClock(now_millis)),
            )
            .expect("valid settings")
        };
        // Same sources, same identifier: generation is a pure function
        // of entropy, clock and settings.
        prop_assert_eq!(build().generate(), build().generate());
    }
}
