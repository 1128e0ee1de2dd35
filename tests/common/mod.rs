//! Shared test utilities for integration tests.
//!
//! Note: `#![allow(dead_code)]` is required because each integration test file
//! compiles as a separate crate and may only use a subset of these helpers.

#![allow(dead_code)]

use std::io::Write;

use ppmrc::codec::RangeEncoder;
use ppmrc::volume::MemoryParts;
use ppmrc::write::SplitOptions;
use ppmrc::{CoderOptions, Compressor, Expander, Model, Token};

/// Options with the given window length and defaults otherwise.
pub fn options(order: u32) -> CoderOptions {
    CoderOptions::new()
        .max_order(order)
        .expect("order within range")
}

/// Compresses `data` with a fresh model.
pub fn compress(options: &CoderOptions, data: &[u8]) -> Vec<u8> {
    Compressor::new(options.clone())
        .expect("valid options")
        .compress_bytes(data)
        .expect("compression succeeds")
}

/// Expands `packed` with a fresh model.
pub fn expand(options: &CoderOptions, packed: &[u8]) -> ppmrc::Result<Vec<u8>> {
    Expander::new(options.clone())?.expand_bytes(packed)
}

/// Compresses then expands, returning the restored bytes.
pub fn round_trip(options: &CoderOptions, data: &[u8]) -> Vec<u8> {
    let packed = compress(options, data);
    expand(options, &packed).expect("expansion succeeds")
}

/// Compresses `data` into in-memory parts.
pub fn split(options: &CoderOptions, data: &[u8], split: &SplitOptions) -> MemoryParts {
    let mut parts = MemoryParts::new();
    let _ = Compressor::new(options.clone())
        .expect("valid options")
        .compress_split(data, &mut parts, split)
        .expect("split compression succeeds");
    parts
}

/// Expands in-memory parts with a fresh model.
pub fn expand_parts(options: &CoderOptions, parts: &MemoryParts) -> ppmrc::Result<Vec<u8>> {
    Expander::new(options.clone())?.expand_parts_to_vec(parts.clone())
}

/// Runs one coding step directly against a model and encoder.
pub fn encode_step<W: Write>(model: &mut Model, coder: &mut RangeEncoder<W>, token: Token) {
    loop {
        let (symbol, escaped) = model.symbol_for_token(token).expect("token codes");
        coder.encode(symbol).expect("encode succeeds");
        if !escaped {
            break;
        }
    }
    model.update(token);
    model.add_symbol(token);
}

/// Serializes a model to its JSON-lines text.
pub fn exported(model: &Model) -> String {
    let mut out = Vec::new();
    model.export(&mut out).expect("export succeeds");
    String::from_utf8(out).expect("export is UTF-8")
}

/// English-like text with plenty of repetition.
pub fn sample_text() -> Vec<u8> {
    let sentences: &[&[u8]] = &[
        b"The quick brown fox jumps over the lazy dog. ",
        b"A journey of a thousand miles begins with a single step. ",
        b"To be, or not to be, that is the question. ",
        b"All that glitters is not gold. ",
    ];
    let mut text = Vec::new();
    for round in 0..12 {
        for (i, sentence) in sentences.iter().enumerate() {
            if (round + i) % 3 != 0 {
                text.extend_from_slice(sentence);
            }
        }
    }
    text
}

/// Pseudo-random bytes (deterministically seeded for reproducibility).
pub fn random_bytes(len: usize, seed: u64) -> Vec<u8> {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    let mut rng = StdRng::seed_from_u64(seed);
    let mut data = vec![0u8; len];
    rng.fill(&mut data[..]);
    data
}
