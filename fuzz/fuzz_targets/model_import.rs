//! Fuzz target for Model::import with arbitrary text.
//!
//! Run with: cargo +nightly fuzz run model_import

#![no_main]

use libfuzzer_sys::fuzz_target;
use ppmrc::{CoderOptions, Compressor, Model};

fuzz_target!(|data: &[u8]| {
    let Ok(model) = Model::import(data) else {
        return;
    };

    // An accepted model must be usable for coding
    let options = CoderOptions::default();
    let mut compressor = Compressor::with_model(model, &options);
    let _ = compressor.compress_bytes(b"fuzzed model input");
});
