//! Round-trip integration tests.
//!
//! These tests verify that expansion restores the input exactly across
//! window lengths, data shapes and compatibility mode, and pin down the
//! behaviour of a few fixed scenarios.

use ppmrc::{CoderOptions, Compressor, ContextKey, Expander};

mod common;

#[test]
fn test_alternating_pattern_order_3() {
    let options = common::options(3);
    let mut compressor = Compressor::new(options.clone()).unwrap();
    let packed = compressor.compress_bytes(b"ABABABAB").unwrap();
    assert_eq!(common::expand(&options, &packed).unwrap(), b"ABABABAB");

    let context = compressor
        .model()
        .context(&ContextKey::from_bytes(3, b"ABA"))
        .expect("context ABA exists");
    let best = context.stats().first().expect("ABA has stats");
    assert_eq!(best.symbol, b'B');
    assert!(context.stats().iter().all(|s| s.count <= best.count));
}

#[test]
fn test_empty_input() {
    let options = CoderOptions::default();
    let packed = common::compress(&options, b"");
    assert!(!packed.is_empty());
    assert!(common::expand(&options, &packed).unwrap().is_empty());
}

#[test]
fn test_single_byte() {
    let options = CoderOptions::default();
    for byte in [0u8, 1, 2, 3, 127, 255] {
        assert_eq!(common::round_trip(&options, &[byte]), [byte]);
    }
}

#[test]
fn test_every_order() {
    let text = common::sample_text();
    for order in 0..=8 {
        let options = common::options(order);
        assert_eq!(common::round_trip(&options, &text), text, "order {}", order);
    }
}

#[test]
fn test_maximum_order() {
    let text = common::sample_text();
    let options = common::options(ppmrc::model::MAX_ORDER);
    assert_eq!(common::round_trip(&options, &text), text);
}

#[test]
fn test_text_compresses() {
    let text = common::sample_text();
    let packed = common::compress(&common::options(3), &text);
    assert!(
        packed.len() < text.len() / 2,
        "{} bytes packed from {}",
        packed.len(),
        text.len()
    );
}

#[test]
fn test_random_data() {
    let data = common::random_bytes(4096, 0x5EED_0001);
    let options = common::options(2);
    assert_eq!(common::round_trip(&options, &data), data);
}

#[test]
fn test_long_run_rescales() {
    // One byte repeated far past the count limit
    let data = vec![b'z'; 5000];
    let options = common::options(1);
    let mut compressor = Compressor::new(options.clone()).unwrap();
    let packed = compressor.compress_bytes(&data).unwrap();
    assert_eq!(common::expand(&options, &packed).unwrap(), data);

    let context = compressor
        .model()
        .context(&ContextKey::from_bytes(1, b"z"))
        .unwrap();
    assert!(context.count_of(b'z') <= ppmrc::model::MAX_COUNT);
    assert!(packed.len() < 200);
}

#[test]
fn test_all_byte_values() {
    let data: Vec<u8> = (0..=255u8).cycle().take(2048).collect();
    let options = common::options(3);
    assert_eq!(common::round_trip(&options, &data), data);
}

#[test]
fn test_compatibility_round_trip() {
    let text = common::sample_text();
    for order in [0, 1, 3, 5] {
        let options = common::options(order).compatibility_mode(true);
        assert_eq!(common::round_trip(&options, &text), text, "order {}", order);
    }
}

#[test]
fn test_compatibility_trailer() {
    let options = CoderOptions::new().compatibility_mode(true);
    for data in [&b""[..], b"x", b"trailing zero bits"] {
        let packed = common::compress(&options, data);
        assert!(packed.len() >= 3);
        assert_eq!(&packed[packed.len() - 2..], &[0, 0]);
        assert_eq!(common::expand(&options, &packed).unwrap(), data);
    }
}

#[test]
fn test_compatibility_differs_from_default() {
    let text = common::sample_text();
    let plain = common::compress(&CoderOptions::default(), &text);
    let compat = common::compress(&CoderOptions::new().compatibility_mode(true), &text);
    assert_ne!(plain, compat);
}

#[test]
fn test_mismatched_options_do_not_restore() {
    let text = common::sample_text();
    let packed = common::compress(&common::options(3), &text);
    match common::expand(&common::options(1), &packed) {
        Ok(restored) => assert_ne!(restored, text),
        Err(e) => assert!(e.is_corruption()),
    }
}

#[test]
fn test_ratio_flushes_round_trip() {
    let options = CoderOptions::new()
        .check_interval(16)
        .compression_limit(5)
        .unwrap();
    let data = common::random_bytes(2000, 7);
    let mut compressor = Compressor::new(options.clone()).unwrap();
    let mut packed = Vec::new();
    let summary = compressor.compress(&data[..], &mut packed).unwrap();
    assert!(summary.flushes > 0);

    let mut restored = Vec::new();
    let expanded = Expander::new(options)
        .unwrap()
        .expand(&packed[..], &mut restored)
        .unwrap();
    assert_eq!(restored, data);
    assert_eq!(expanded.flushes, summary.flushes);
}

#[test]
fn test_compressor_reuse_continues_model() {
    let options = common::options(2);
    let mut compressor = Compressor::new(options.clone()).unwrap();
    let first = compressor.compress_bytes(b"repeat after me").unwrap();
    let second = compressor.compress_bytes(b"repeat after me").unwrap();
    assert!(second.len() < first.len());

    let mut expander = Expander::new(options).unwrap();
    assert_eq!(expander.expand_bytes(&first).unwrap(), b"repeat after me");
    assert_eq!(expander.expand_bytes(&second).unwrap(), b"repeat after me");
}
