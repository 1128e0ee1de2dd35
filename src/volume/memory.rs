//! In-memory parts.

use std::io::Cursor;

use super::{PartSink, PartSource};
use crate::{Error, Result};

/// Parts held in memory, usable as both sink and source.
///
/// # Example
///
/// ```rust
/// use ppmrc::volume::MemoryParts;
/// use ppmrc::write::SplitOptions;
/// use ppmrc::{CoderOptions, Compressor, Expander};
///
/// # fn main() -> ppmrc::Result<()> {
/// let text = b"the quick brown fox jumps over the lazy dog. ".repeat(20);
/// let mut parts = MemoryParts::new();
/// Compressor::new(CoderOptions::default())?
///     .compress_split(&text[..], &mut parts, &SplitOptions::new(64))?;
/// assert!(parts.len() > 1);
///
/// let restored = Expander::new(CoderOptions::default())?.expand_parts_to_vec(&mut parts)?;
/// assert_eq!(restored, text);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryParts {
    parts: Vec<Vec<u8>>,
}

impl MemoryParts {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps existing part buffers.
    pub fn from_parts(parts: Vec<Vec<u8>>) -> Self {
        Self { parts }
    }

    /// Number of stored parts.
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Returns `true` if no part is stored.
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Borrows the stored parts in order.
    pub fn parts(&self) -> &[Vec<u8>] {
        &self.parts
    }

    /// Consumes the set, returning the part buffers.
    pub fn into_parts(self) -> Vec<Vec<u8>> {
        self.parts
    }
}

impl PartSink for MemoryParts {
    type Writer = Vec<u8>;

    fn create_part(&mut self, _index: u32) -> Result<Self::Writer> {
        Ok(Vec::new())
    }

    fn finish_part(&mut self, index: u32, writer: Self::Writer) -> Result<u64> {
        let size = writer.len() as u64;
        let slot = index as usize;
        if slot < self.parts.len() {
            self.parts[slot] = writer;
        } else {
            self.parts.resize_with(slot, Vec::new);
            self.parts.push(writer);
        }
        Ok(size)
    }
}

impl PartSource for MemoryParts {
    type Reader = Cursor<Vec<u8>>;

    fn open_part(&mut self, index: u32) -> Result<Self::Reader> {
        self.parts
            .get(index as usize)
            .map(|part| Cursor::new(part.clone()))
            .ok_or_else(|| Error::PartMissing {
                index,
                path: format!("<memory part {}>", index),
            })
    }
}
