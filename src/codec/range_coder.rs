//! 16-bit integer arithmetic coder.
//!
//! The coder keeps the classic `low`/`high` register pair (and `code` when
//! decoding) and an underflow counter for bits held back while the range
//! straddles the midpoint. A [`Symbol`] is a sub-range
//! `[low_count, high_count)` of a total `scale`, produced by the model.
//!
//! Every intermediate product is computed in `u32`: the range never exceeds
//! `0x10000` and the model keeps `scale` below [`MAXIMUM_SCALE`], so
//! `range * count` stays below 2^31.

use std::io::{Read, Write};

use super::bit_io::{BitReader, BitWriter};
use crate::rollback::Ledger;
use crate::Result;

/// Largest scale the model may hand to the coder (exclusive).
pub const MAXIMUM_SCALE: u32 = 16383;

/// Top bit of a register.
const TOP_BIT: u16 = 0x8000;

/// Second-highest bit of a register, the underflow indicator.
const SECOND_BIT: u16 = 0x4000;

/// Trailing zero bits appended by a compatibility-mode flush.
pub const COMPATIBILITY_TRAILER_BITS: u32 = 16;

/// A probability sub-range handed from the model to the coder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Symbol {
    /// Cumulative count below the symbol.
    pub low_count: u32,
    /// Cumulative count up to and including the symbol.
    pub high_count: u32,
    /// Total of the active context.
    pub scale: u32,
}

impl Symbol {
    /// Creates a symbol range.
    pub fn new(low_count: u32, high_count: u32, scale: u32) -> Self {
        debug_assert!(low_count < high_count && high_count <= scale);
        Self {
            low_count,
            high_count,
            scale,
        }
    }
}

/// Coder register file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registers {
    /// Lower bound of the coding interval.
    pub low: u16,
    /// Upper bound of the coding interval (inclusive).
    pub high: u16,
    /// Window onto the coded stream (decoder only).
    pub code: u16,
    /// Bits held back while the interval straddles the midpoint.
    pub underflow_bits: u64,
}

impl Registers {
    fn initial() -> Self {
        Self {
            low: 0,
            high: 0xffff,
            code: 0,
            underflow_bits: 0,
        }
    }

    fn range(&self) -> u32 {
        u32::from(self.high) - u32::from(self.low) + 1
    }

    /// Narrows `[low, high]` to the symbol's share of the current range.
    fn narrow(&mut self, symbol: Symbol) {
        let range = self.range();
        let low = u32::from(self.low);
        self.high = (low + range * symbol.high_count / symbol.scale - 1) as u16;
        self.low = (low + range * symbol.low_count / symbol.scale) as u16;
    }

    fn straddles(&self) -> bool {
        self.low & SECOND_BIT != 0 && self.high & SECOND_BIT == 0
    }

    fn shift(&mut self) {
        self.low <<= 1;
        self.high = (self.high << 1) | 1;
    }
}

/// Arithmetic encoder writing through a [`BitWriter`].
#[derive(Debug)]
pub struct RangeEncoder<W: Write> {
    regs: Registers,
    writer: BitWriter<W>,
    compatibility: bool,
    ledger: Ledger<Registers>,
}

impl<W: Write> RangeEncoder<W> {
    /// Creates an encoder over `inner`.
    ///
    /// `compatibility` selects the flush trailer of 16 zero bits.
    pub fn new(inner: W, compatibility: bool) -> Self {
        Self {
            regs: Registers::initial(),
            writer: BitWriter::new(inner),
            compatibility,
            ledger: Ledger::new(),
        }
    }

    /// Encodes one symbol range.
    pub fn encode(&mut self, symbol: Symbol) -> Result<()> {
        self.regs.narrow(symbol);
        loop {
            if self.regs.high & TOP_BIT == self.regs.low & TOP_BIT {
                let bit = self.regs.high & TOP_BIT != 0;
                self.writer.write_bit(bit)?;
                while self.regs.underflow_bits > 0 {
                    self.writer.write_bit(!bit)?;
                    self.regs.underflow_bits -= 1;
                }
            } else if self.regs.straddles() {
                self.regs.underflow_bits += 1;
                self.regs.low &= SECOND_BIT - 1;
                self.regs.high |= SECOND_BIT;
            } else {
                return Ok(());
            }
            self.regs.shift();
        }
    }

    /// Terminates the coded stream.
    ///
    /// Writes the two bits that pin the final interval (the second bit of
    /// `low`, then its inverse once per pending underflow bit plus one), the
    /// compatibility trailer if enabled, and the partial byte.
    pub fn flush(&mut self) -> Result<()> {
        let bit = self.regs.low & SECOND_BIT != 0;
        self.writer.write_bit(bit)?;
        self.regs.underflow_bits += 1;
        while self.regs.underflow_bits > 0 {
            self.writer.write_bit(!bit)?;
            self.regs.underflow_bits -= 1;
        }
        if self.compatibility {
            self.writer.write_bits(0, COMPATIBILITY_TRAILER_BITS)?;
        }
        self.writer.flush()?;
        Ok(())
    }

    /// Flushes, then pads with zero bytes up to `target` bytes.
    pub fn flush_padded(&mut self, target: u64) -> Result<()> {
        self.flush()?;
        self.writer.pad_to(target)?;
        Ok(())
    }

    /// Bytes produced so far, counting bytes diverted by speculation.
    pub fn len(&self) -> u64 {
        self.writer.len()
    }

    /// Returns `true` if no byte has been produced.
    pub fn is_empty(&self) -> bool {
        self.writer.is_empty()
    }

    /// Bytes delivered to the real sink.
    pub fn bytes_written(&self) -> u64 {
        self.writer.bytes_written()
    }

    /// Bits waiting in the writer's partial byte.
    pub fn pending_bits(&self) -> u32 {
        self.writer.pending_bits()
    }

    /// Current register values.
    pub fn registers(&self) -> Registers {
        self.regs
    }

    /// Diverts output into a scratch buffer, see [`BitWriter::begin_speculation`].
    pub fn begin_speculation(&mut self) {
        self.writer.begin_speculation();
    }

    /// Ends diversion and returns the diverted bytes.
    pub fn end_speculation(&mut self) -> Vec<u8> {
        self.writer.end_speculation()
    }

    /// Saves the registers and the writer's partial byte.
    pub fn set_checkpoint(&mut self) {
        self.ledger.checkpoint();
        self.ledger.record(self.regs);
        self.writer.set_checkpoint();
    }

    /// Restores registers and partial byte from the matching checkpoint.
    pub fn rollback(&mut self) {
        if let Some(saved) = self.ledger.rewind().pop() {
            self.regs = saved;
        }
        self.writer.rollback();
    }

    /// Drops the innermost checkpoint.
    pub fn commit(&mut self) {
        self.ledger.commit();
        self.writer.commit();
    }

    /// Returns a reference to the sink.
    pub fn get_ref(&self) -> &W {
        self.writer.get_ref()
    }

    /// Consumes the encoder and returns the sink. Call [`flush`](Self::flush) first.
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

/// Arithmetic decoder reading through a [`BitReader`].
#[derive(Debug)]
pub struct RangeDecoder<R: Read> {
    regs: Registers,
    reader: BitReader<R>,
}

impl<R: Read> RangeDecoder<R> {
    /// Creates a decoder and primes `code` with the first 16 bits.
    pub fn new(inner: R, compatibility: bool) -> Result<Self> {
        let mut reader = BitReader::new(inner, compatibility);
        let mut regs = Registers::initial();
        regs.code = reader.read_bits(16)? as u16;
        Ok(Self { regs, reader })
    }

    /// Maps `code` into `[0, scale)` so the model can find the symbol.
    pub fn current_count(&self, scale: u32) -> u32 {
        let range = u64::from(self.regs.range());
        let offset = u64::from(self.regs.code.wrapping_sub(self.regs.low)) + 1;
        ((offset * u64::from(scale) - 1) / range) as u32
    }

    /// Consumes the bits of a decoded symbol.
    pub fn remove_symbol(&mut self, symbol: Symbol) -> Result<()> {
        self.regs.narrow(symbol);
        loop {
            if self.regs.high & TOP_BIT == self.regs.low & TOP_BIT {
                // shift only
            } else if self.regs.straddles() {
                self.regs.code ^= SECOND_BIT;
                self.regs.low &= SECOND_BIT - 1;
                self.regs.high |= SECOND_BIT;
            } else {
                return Ok(());
            }
            self.regs.shift();
            self.regs.code = (self.regs.code << 1) | u16::from(self.reader.read_bit()?);
        }
    }

    /// Bytes consumed from the source.
    pub fn bytes_read(&self) -> u64 {
        self.reader.bytes_read()
    }

    /// Current register values.
    pub fn registers(&self) -> Registers {
        self.regs
    }

    /// Consumes the decoder and returns the source.
    pub fn into_inner(self) -> R {
        self.reader.into_inner()
    }
}
