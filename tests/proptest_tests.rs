//! Property-based tests using proptest.
//!
//! These tests verify the round-trip, rollback and split invariants of the
//! coder using randomly generated inputs.

use proptest::prelude::*;

use ppmrc::codec::RangeEncoder;
use ppmrc::write::{SplitOptions, SplitStrategy};
use ppmrc::{Model, Token};

mod common;

/// Strategy for inputs with a skewed byte distribution, so that contexts
/// actually repeat.
fn skewed_bytes(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    proptest::collection::vec(
        prop_oneof![
            6 => prop::sample::select(b"abcde ".to_vec()),
            1 => any::<u8>(),
        ],
        0..max_len,
    )
}

/// Encodes `data` followed by DONE and returns the flushed output.
fn encode_plain(model: &mut Model, data: &[u8]) -> Vec<u8> {
    let mut coder = RangeEncoder::new(Vec::new(), model.is_compatible());
    for &b in data {
        common::encode_step(model, &mut coder, Token::Byte(b));
    }
    common::encode_step(model, &mut coder, Token::Done);
    coder.flush().unwrap();
    coder.into_inner()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Expansion restores any input for any order.
    #[test]
    fn round_trip_any_input(data in skewed_bytes(600), order in 0u32..6) {
        let options = common::options(order);
        prop_assert_eq!(common::round_trip(&options, &data), data);
    }

    /// Compatibility mode round-trips too.
    #[test]
    fn round_trip_compatibility(data in skewed_bytes(300), order in 0u32..4) {
        let options = common::options(order).compatibility_mode(true);
        prop_assert_eq!(common::round_trip(&options, &data), data);
    }

    /// A speculative trial followed by rollback leaves no trace in the output
    /// or in the model.
    #[test]
    fn rollback_is_exact(
        data in skewed_bytes(300),
        trial in skewed_bytes(40),
        split_at in 0usize..300,
        order in 0u32..5,
        compat in any::<bool>(),
    ) {
        let split_at = split_at.min(data.len());

        let mut reference = Model::new(order, compat);
        let expected = encode_plain(&mut reference, &data);

        let mut model = Model::new(order, compat);
        let mut coder = RangeEncoder::new(Vec::new(), compat);
        for &b in &data[..split_at] {
            common::encode_step(&mut model, &mut coder, Token::Byte(b));
        }

        let before = common::exported(&model);
        model.set_checkpoint();
        coder.set_checkpoint();
        coder.begin_speculation();
        for &b in &trial {
            common::encode_step(&mut model, &mut coder, Token::Byte(b));
        }
        common::encode_step(&mut model, &mut coder, Token::EndOfPacket);
        coder.flush().unwrap();
        let _ = coder.end_speculation();
        coder.rollback();
        model.rollback();
        prop_assert_eq!(common::exported(&model), before);
        prop_assert_eq!(model.checkpoint_depth(), 0);

        for &b in &data[split_at..] {
            common::encode_step(&mut model, &mut coder, Token::Byte(b));
        }
        common::encode_step(&mut model, &mut coder, Token::Done);
        coder.flush().unwrap();
        prop_assert_eq!(coder.into_inner(), expected);
        prop_assert_eq!(common::exported(&model), common::exported(&reference));
    }

    /// Split output restores the input and respects the part budget.
    #[test]
    fn split_equivalence(
        data in skewed_bytes(800),
        part_max in 40u64..256,
        pad in any::<bool>(),
        order in 0u32..5,
        compat in any::<bool>(),
    ) {
        let options = common::options(order).compatibility_mode(compat);
        let split = SplitOptions::new(part_max).pad(pad);
        let parts = common::split(&options, &data, &split);
        for part in parts.parts() {
            prop_assert!(part.len() as u64 <= part_max);
            if pad {
                prop_assert_eq!(part.len() as u64, part_max);
            }
        }
        prop_assert_eq!(common::expand_parts(&options, &parts).unwrap(), data);
    }

    /// The estimating strategy also restores the input.
    #[test]
    fn split_estimate_round_trip(data in skewed_bytes(500), part_max in 24u64..128) {
        let options = common::options(2);
        let split = SplitOptions::new(part_max).strategy(SplitStrategy::Estimate);
        let parts = common::split(&options, &data, &split);
        prop_assert_eq!(common::expand_parts(&options, &parts).unwrap(), data);
    }
}
