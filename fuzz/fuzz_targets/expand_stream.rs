//! Fuzz target for Expander with arbitrary coded input.
//!
//! Every byte string is a valid prefix of some coded stream, so the decoder
//! must either reach DONE or fail with an error. Panics and hangs are bugs.
//!
//! Run with: cargo +nightly fuzz run expand_stream

#![no_main]

use libfuzzer_sys::fuzz_target;
use ppmrc::{CoderOptions, Expander};

fuzz_target!(|data: &[u8]| {
    let Some((&selector, coded)) = data.split_first() else {
        return;
    };
    let order = u32::from(selector & 0x07);
    let compat = selector & 0x80 != 0;

    let Ok(options) = CoderOptions::new().max_order(order) else {
        return;
    };
    let options = options.compatibility_mode(compat);

    // Truncated input ends in EndOfInput
    if let Ok(mut expander) = Expander::new(options) {
        let _ = expander.expand_bytes(coded);
    }
});
