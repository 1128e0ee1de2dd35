//! # ppmrc
//!
//! An adaptive order-N context model (PPM) driving a 16-bit arithmetic
//! range coder.
//!
//! The model predicts every byte from up to `max_order` preceding bytes and
//! falls back to shorter contexts through escape symbols when a byte has not
//! been seen in the longer one. Compression and expansion run the same model
//! in lockstep, so nothing but the coded bits travels between them.
//!
//! ## Quick Start
//!
//! ### Compressing and Expanding
//!
//! ```rust
//! use ppmrc::{CoderOptions, Compressor, Expander, Result};
//!
//! fn main() -> Result<()> {
//!     let options = CoderOptions::new().max_order(4)?;
//!
//!     let text = b"How much wood would a woodchuck chuck";
//!     let packed = Compressor::new(options.clone())?.compress_bytes(text)?;
//!     let restored = Expander::new(options)?.expand_bytes(&packed)?;
//!
//!     assert_eq!(restored, text);
//!     Ok(())
//! }
//! ```
//!
//! ### Splitting Output into Parts
//!
//! ```rust
//! use ppmrc::volume::MemoryParts;
//! use ppmrc::write::SplitOptions;
//! use ppmrc::{CoderOptions, Compressor, Expander, Result};
//!
//! fn main() -> Result<()> {
//!     let text = b"parts of at most 64 bytes each, in order. ".repeat(10);
//!     let mut parts = MemoryParts::new();
//!     let summary = Compressor::new(CoderOptions::default())?
//!         .compress_split(&text[..], &mut parts, &SplitOptions::new(64))?;
//!     assert!(summary.part_sizes.iter().all(|&size| size <= 64));
//!
//!     let restored = Expander::new(CoderOptions::default())?.expand_parts_to_vec(&mut parts)?;
//!     assert_eq!(restored, text);
//!     Ok(())
//! }
//! ```
//!
//! ### Reusing a Trained Model
//!
//! ```rust
//! use std::io::Cursor;
//! use ppmrc::{CoderOptions, Compressor, Expander, Model, Result};
//!
//! fn main() -> Result<()> {
//!     let mut trainer = Compressor::new(CoderOptions::default())?;
//!     trainer.compress_bytes(b"the typical content of the files to come")?;
//!
//!     let mut saved = Vec::new();
//!     trainer.model().export(&mut saved)?;
//!
//!     let mut model = Model::import(Cursor::new(&saved))?;
//!     model.set_adaptive(false);
//!     let options = CoderOptions::default();
//!     let packed = Compressor::with_model(model.clone(), &options).compress_bytes(b"the content")?;
//!     let restored = Expander::with_model(model, &options).expand_bytes(&packed)?;
//!     assert_eq!(restored, b"the content");
//!     Ok(())
//! }
//! ```
//!
//! ## Compatibility Mode
//!
//! [`CoderOptions::compatibility_mode`] reproduces the legacy encoder bit
//! for bit: the initial table layout, the escape estimate, the scoreboard
//! marking, a 16-bit zero trailer after every flush, and a decoder that
//! refuses to read past the end of its input.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `streaming` | Yes | Background [`PacketWorker`](streaming::PacketWorker) on `crossbeam-channel` |
//! | `cli` | No | Command-line interface tool |
//!
//! ## Logging
//!
//! The crate logs through the [`log`] facade: part boundaries, model
//! flushes and rescales at `debug`, per-token detail at `trace`. No logger
//! is installed.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod codec;
pub mod error;
pub mod model;
pub mod options;
pub mod read;
pub mod rollback;
pub mod stats;
pub mod streaming;
pub mod volume;
pub mod write;

pub use error::{Error, Result};
pub use options::CoderOptions;

// Re-export the driving loops
pub use read::{ExpandSummary, Expander};
pub use write::{CompressSummary, Compressor, SplitOptions, SplitStrategy};

// Re-export the model API
pub use model::{ContextKey, Model, Token};

// Re-export part handling
pub use volume::{FilePartSink, FilePartSource, MemoryParts, PartConfig, PartSink, PartSource};
