//! Multi-part output support.
//!
//! A split compression writes its coded stream as a sequence of parts, each
//! no larger than a configured budget. Every part but the last ends with an
//! END-OF-PACKET token followed by a coder flush; the model carries over from
//! one part to the next, so parts must be expanded in order.
//!
//! Parts are produced through a [`PartSink`] and consumed through a
//! [`PartSource`]. File-backed implementations name parts
//! `{base}-part{n}.bin` with `n` counting from zero; [`MemoryParts`] keeps
//! them in memory.
//!
//! # Writing Parts to Disk
//!
//! ```rust,no_run
//! use ppmrc::volume::{FilePartSink, PartConfig};
//! use ppmrc::write::SplitOptions;
//! use ppmrc::{CoderOptions, Compressor};
//!
//! # fn main() -> ppmrc::Result<()> {
//! let config = PartConfig::new("corpus", 4096);
//! let mut sink = FilePartSink::new(config.clone());
//! let mut compressor = Compressor::new(CoderOptions::default())?;
//! let input = std::fs::File::open("corpus.txt")?;
//! let summary = compressor.compress_split(input, &mut sink, &SplitOptions::new(config.part_size()))?;
//! println!("wrote {} parts", summary.part_sizes.len());
//! # Ok(())
//! # }
//! ```

mod config;
mod memory;
mod reader;
mod writer;

use std::io::{Read, Write};

pub use config::PartConfig;
pub use memory::MemoryParts;
pub use reader::FilePartSource;
pub use writer::FilePartSink;

use crate::Result;

/// Destination for the parts of a split stream.
pub trait PartSink {
    /// Writer for a single part.
    type Writer: Write;

    /// Opens part `index` for writing.
    fn create_part(&mut self, index: u32) -> Result<Self::Writer>;

    /// Completes part `index` and returns its size in bytes.
    fn finish_part(&mut self, index: u32, writer: Self::Writer) -> Result<u64>;
}

/// Origin of the parts of a split stream.
pub trait PartSource {
    /// Reader for a single part.
    type Reader: Read;

    /// Opens part `index` for reading.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PartMissing`](crate::Error::PartMissing) when the
    /// part does not exist.
    fn open_part(&mut self, index: u32) -> Result<Self::Reader>;
}

impl<S: PartSink + ?Sized> PartSink for &mut S {
    type Writer = S::Writer;

    fn create_part(&mut self, index: u32) -> Result<Self::Writer> {
        (**self).create_part(index)
    }

    fn finish_part(&mut self, index: u32, writer: Self::Writer) -> Result<u64> {
        (**self).finish_part(index, writer)
    }
}

impl<S: PartSource + ?Sized> PartSource for &mut S {
    type Reader = S::Reader;

    fn open_part(&mut self, index: u32) -> Result<Self::Reader> {
        (**self).open_part(index)
    }
}
