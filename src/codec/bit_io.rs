//! Bit-level packing beneath the range coder.
//!
//! Bits are packed MSB-first into bytes. The writer keeps a partial byte
//! (the *rack*) and a mask selecting the next bit position; the reader does
//! the same in reverse.
//!
//! # Speculation
//!
//! The writer can divert completed bytes into an in-memory scratch buffer
//! ([`BitWriter::begin_speculation`]). Together with the rack checkpoint this
//! lets a caller encode tentatively and throw the attempt away without a
//! single byte reaching the real sink.

use std::io::{self, Read, Write};

use crate::rollback::Ledger;
use crate::{Error, Result};

/// Mask of the first (most significant) bit position in a byte.
const FIRST_BIT: u8 = 0x80;

/// Zero bytes the reader invents past the end of its source before failing.
pub const MAX_SYNTHESIZED_BYTES: u32 = 2;

/// Saved partial-byte state of a [`BitWriter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RackSnapshot {
    rack: u8,
    mask: u8,
}

/// MSB-first bit writer over a byte sink.
#[derive(Debug)]
pub struct BitWriter<W: Write> {
    inner: W,
    rack: u8,
    mask: u8,
    /// Bytes delivered to `inner`.
    bytes_written: u64,
    /// Diversion buffer while speculating.
    scratch: Option<Vec<u8>>,
    ledger: Ledger<RackSnapshot>,
}

impl<W: Write> BitWriter<W> {
    /// Creates a bit writer with an empty rack.
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            rack: 0,
            mask: FIRST_BIT,
            bytes_written: 0,
            scratch: None,
            ledger: Ledger::new(),
        }
    }

    /// Writes one bit and returns how many bits left the rack (0 or 8).
    pub fn write_bit(&mut self, bit: bool) -> io::Result<u32> {
        if bit {
            self.rack |= self.mask;
        }
        self.mask >>= 1;
        if self.mask == 0 {
            let byte = self.rack;
            self.rack = 0;
            self.mask = FIRST_BIT;
            self.emit(byte)?;
            return Ok(8);
        }
        Ok(0)
    }

    /// Writes the low `count` bits of `value`, most significant first.
    pub fn write_bits(&mut self, value: u32, count: u32) -> io::Result<()> {
        debug_assert!(count <= 32);
        for shift in (0..count).rev() {
            self.write_bit((value >> shift) & 1 == 1)?;
        }
        Ok(())
    }

    /// Emits the partial byte (zero-padded in the low bits) and flushes the sink.
    ///
    /// While speculating the sink itself is left untouched.
    pub fn flush(&mut self) -> io::Result<()> {
        if self.mask != FIRST_BIT {
            let byte = self.rack;
            self.rack = 0;
            self.mask = FIRST_BIT;
            self.emit(byte)?;
        }
        if self.scratch.is_none() {
            self.inner.flush()?;
        }
        Ok(())
    }

    /// Appends whole zero bytes until `target` bytes have been produced.
    ///
    /// Call after [`flush`](Self::flush); the rack must be empty.
    pub fn pad_to(&mut self, target: u64) -> io::Result<()> {
        debug_assert_eq!(self.mask, FIRST_BIT, "padding over a partial byte");
        while self.len() < target {
            self.emit(0)?;
        }
        Ok(())
    }

    fn emit(&mut self, byte: u8) -> io::Result<()> {
        match &mut self.scratch {
            Some(buffer) => buffer.push(byte),
            None => {
                self.inner.write_all(&[byte])?;
                self.bytes_written += 1;
            }
        }
        Ok(())
    }

    /// Bytes produced so far, counting diverted bytes.
    pub fn len(&self) -> u64 {
        self.bytes_written + self.scratch.as_ref().map_or(0, |s| s.len() as u64)
    }

    /// Returns `true` if no byte has been produced yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bytes delivered to the real sink.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Bits waiting in the rack.
    pub fn pending_bits(&self) -> u32 {
        self.mask.leading_zeros()
    }

    /// Starts diverting completed bytes into a scratch buffer.
    pub fn begin_speculation(&mut self) {
        debug_assert!(self.scratch.is_none(), "speculation already active");
        self.scratch = Some(Vec::new());
    }

    /// Stops diverting and returns what was diverted.
    pub fn end_speculation(&mut self) -> Vec<u8> {
        self.scratch.take().unwrap_or_default()
    }

    /// Returns `true` while bytes are diverted.
    pub fn is_speculating(&self) -> bool {
        self.scratch.is_some()
    }

    /// Saves the rack and mask.
    pub fn set_checkpoint(&mut self) {
        self.ledger.checkpoint();
        self.ledger.record(RackSnapshot {
            rack: self.rack,
            mask: self.mask,
        });
    }

    /// Restores the rack and mask saved by the matching checkpoint.
    ///
    /// Bytes already handed to the sink stay written.
    pub fn rollback(&mut self) {
        if let Some(snapshot) = self.ledger.rewind().pop() {
            self.rack = snapshot.rack;
            self.mask = snapshot.mask;
        }
    }

    /// Drops the innermost checkpoint.
    pub fn commit(&mut self) {
        self.ledger.commit();
    }

    /// Returns a reference to the sink.
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Returns a mutable reference to the sink.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    /// Consumes the writer and returns the sink. Unflushed bits are lost.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

/// MSB-first bit reader over a byte source.
#[derive(Debug)]
pub struct BitReader<R: Read> {
    inner: R,
    rack: u8,
    mask: u8,
    bytes_read: u64,
    synthesized: u32,
    compatibility: bool,
}

impl<R: Read> BitReader<R> {
    /// Creates a bit reader.
    ///
    /// With `compatibility` set, the first read past the end of the source
    /// fails; otherwise up to [`MAX_SYNTHESIZED_BYTES`] zero bytes are
    /// supplied first.
    pub fn new(inner: R, compatibility: bool) -> Self {
        Self {
            inner,
            rack: 0,
            mask: FIRST_BIT,
            bytes_read: 0,
            synthesized: 0,
            compatibility,
        }
    }

    /// Reads one bit.
    pub fn read_bit(&mut self) -> Result<bool> {
        if self.mask == FIRST_BIT {
            self.rack = self.next_byte()?;
        }
        let bit = self.rack & self.mask != 0;
        self.mask >>= 1;
        if self.mask == 0 {
            self.mask = FIRST_BIT;
        }
        Ok(bit)
    }

    /// Reads `count` bits, most significant first.
    pub fn read_bits(&mut self, count: u32) -> Result<u32> {
        debug_assert!(count <= 32);
        let mut value = 0u32;
        for _ in 0..count {
            value = (value << 1) | u32::from(self.read_bit()?);
        }
        Ok(value)
    }

    fn next_byte(&mut self) -> Result<u8> {
        let mut buf = [0u8; 1];
        loop {
            match self.inner.read(&mut buf) {
                Ok(0) => return self.synthesize(),
                Ok(_) => {
                    self.bytes_read += 1;
                    return Ok(buf[0]);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(Error::Io(e)),
            }
        }
    }

    fn synthesize(&mut self) -> Result<u8> {
        if self.compatibility || self.synthesized >= MAX_SYNTHESIZED_BYTES {
            return Err(Error::EndOfInput {
                bytes_read: self.bytes_read,
            });
        }
        self.synthesized += 1;
        Ok(0)
    }

    /// Bytes consumed from the source.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Zero bytes supplied past the end of the source.
    pub fn synthesized_bytes(&self) -> u32 {
        self.synthesized
    }

    /// Consumes the reader and returns the source.
    pub fn into_inner(self) -> R {
        self.inner
    }
}
