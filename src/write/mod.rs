//! Compression.
//!
//! A [`Compressor`] owns the model and drives it over an input stream: each
//! step turns one token into one or more symbol ranges (one per escape plus
//! the final hit) and hands them to a [`RangeEncoder`]. The stream ends with
//! DONE followed by a coder flush.
//!
//! # Example
//!
//! ```rust
//! use ppmrc::{CoderOptions, Compressor};
//!
//! # fn main() -> ppmrc::Result<()> {
//! let mut compressor = Compressor::new(CoderOptions::new().max_order(2)?)?;
//! let mut packed = Vec::new();
//! let summary = compressor.compress(&b"banana bandana"[..], &mut packed)?;
//! assert_eq!(summary.input_bytes, 14);
//! assert_eq!(summary.output_bytes, packed.len() as u64);
//! # Ok(())
//! # }
//! ```
//!
//! # Split output
//!
//! [`Compressor::compress_split`] writes parts of bounded size through a
//! [`PartSink`]. Under [`SplitStrategy::Speculative`] the tail of every part
//! is sized by trial encoding: once a part nears its budget, each token is
//! encoded together with END-OF-PACKET into a scratch buffer under a
//! checkpoint, measured and rolled back. Only tokens that leave room for the
//! closing END-OF-PACKET are encoded for real.

mod options;

use std::io::{BufReader, Read, Write};

pub use options::{
    CompressSummary, END_OF_PACKET_SPACE, MIN_PART_SIZE, NEAR_END_PACKET_SIZE, SplitOptions,
    SplitStrategy,
};

use crate::codec::RangeEncoder;
use crate::model::{Model, Token};
use crate::stats::{ByteCounters, RatioCheck};
use crate::volume::PartSink;
use crate::{CoderOptions, Error, Result};

/// Outcome of offering a token to a part that has a size budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Placement {
    /// The token was encoded into the part.
    Encoded,
    /// The token does not fit; the part must be closed first.
    PartFull,
}

/// Drives the model and range coder over an input stream.
#[derive(Debug)]
pub struct Compressor {
    model: Model,
    options: CoderOptions,
    counters: ByteCounters,
    check: RatioCheck,
    flushes: u32,
}

impl Compressor {
    /// Creates a compressor with a fresh model.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the options are invalid.
    pub fn new(options: CoderOptions) -> Result<Self> {
        options.validate()?;
        let model = options.build_model();
        Ok(Self::assemble(model, options))
    }

    /// Creates a compressor around an existing (usually imported) model.
    ///
    /// The order, compatibility flag and adaptivity are taken from the
    /// model; the ratio-check settings from `options`.
    pub fn with_model(model: Model, options: &CoderOptions) -> Self {
        let options = options.matching(&model);
        Self::assemble(model, options)
    }

    fn assemble(model: Model, options: CoderOptions) -> Self {
        let check = RatioCheck::new(&options);
        Self {
            model,
            options,
            counters: ByteCounters::default(),
            check,
            flushes: 0,
        }
    }

    /// Returns the model.
    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Consumes the compressor and returns the model.
    pub fn into_model(self) -> Model {
        self.model
    }

    /// Returns the effective options.
    pub fn options(&self) -> &CoderOptions {
        &self.options
    }

    /// Byte tallies since the last ratio check.
    pub fn counters(&self) -> ByteCounters {
        self.counters
    }

    /// Compresses `input` into `output` as a single stream.
    pub fn compress<R: Read, W: Write>(&mut self, input: R, output: W) -> Result<CompressSummary> {
        let mut bytes = BufReader::new(input).bytes();
        let mut coder = RangeEncoder::new(output, self.model.is_compatible());
        let mut summary = CompressSummary::default();
        let flushes_before = self.flushes;

        loop {
            let token = self.next_token(|| bytes.next().transpose())?;
            self.encode_token(&mut coder, token)?;
            if let Token::Byte(_) = token {
                summary.input_bytes += 1;
            }
            if token == Token::Done {
                break;
            }
        }
        coder.flush()?;

        summary.output_bytes = coder.len();
        summary.part_sizes.push(coder.len());
        summary.flushes = self.flushes - flushes_before;
        log::debug!(
            "compressed {} bytes into {} bytes",
            summary.input_bytes,
            summary.output_bytes
        );
        Ok(summary)
    }

    /// Compresses a byte slice into a new buffer.
    pub fn compress_bytes(&mut self, data: &[u8]) -> Result<Vec<u8>> {
        let mut packed = Vec::new();
        let _ = self.compress(data, &mut packed)?;
        Ok(packed)
    }

    /// Compresses `input` into parts of at most `split.part_max` bytes.
    ///
    /// Every part but the last ends with END-OF-PACKET; the last ends with
    /// DONE. With `split.pad` every part, the last included, is padded with
    /// zero bytes to exactly `part_max`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PartTooSmall`] when a fresh part cannot hold a single
    /// token plus END-OF-PACKET, and [`Error::InvalidConfig`] for budgets
    /// below [`MIN_PART_SIZE`].
    pub fn compress_split<R: Read, S: PartSink>(
        &mut self,
        input: R,
        mut sink: S,
        split: &SplitOptions,
    ) -> Result<CompressSummary> {
        split.validate()?;
        let mut bytes = BufReader::new(input).bytes();
        let mut summary = CompressSummary::default();
        let flushes_before = self.flushes;

        let mut index = 0;
        let mut coder = RangeEncoder::new(sink.create_part(index)?, self.model.is_compatible());
        let mut fresh = true;
        let mut pending: Option<Token> = None;

        loop {
            let token = match pending.take() {
                Some(token) => token,
                None => self.next_token(|| bytes.next().transpose())?,
            };

            match self.place_token(&mut coder, token, fresh, split)? {
                Placement::Encoded => {
                    fresh = false;
                    if let Token::Byte(_) = token {
                        summary.input_bytes += 1;
                    }
                    if token == Token::Done {
                        let size = self.close_part(coder, &mut sink, index, split)?;
                        summary.part_sizes.push(size);
                        break;
                    }
                }
                Placement::PartFull => {
                    self.encode_token(&mut coder, Token::EndOfPacket)?;
                    let size = self.close_part(coder, &mut sink, index, split)?;
                    summary.part_sizes.push(size);
                    index += 1;
                    coder = RangeEncoder::new(sink.create_part(index)?, self.model.is_compatible());
                    fresh = true;
                    pending = Some(token);
                }
            }
        }

        summary.output_bytes = summary.part_sizes.iter().sum();
        summary.flushes = self.flushes - flushes_before;
        log::debug!(
            "compressed {} bytes into {} parts ({} bytes)",
            summary.input_bytes,
            summary.part_sizes.len(),
            summary.output_bytes
        );
        Ok(summary)
    }

    fn close_part<S: PartSink>(
        &mut self,
        mut coder: RangeEncoder<S::Writer>,
        sink: &mut S,
        index: u32,
        split: &SplitOptions,
    ) -> Result<u64> {
        if split.pad {
            coder.flush_padded(split.part_max)?;
        } else {
            coder.flush()?;
        }
        sink.finish_part(index, coder.into_inner())
    }

    /// Chooses the next token: FLUSH when the ratio check fires, otherwise
    /// the next input byte, or DONE at end of input.
    pub(crate) fn next_token(
        &mut self,
        next_byte: impl FnOnce() -> std::io::Result<Option<u8>>,
    ) -> Result<Token> {
        if self.check.step(&mut self.counters) {
            self.flushes += 1;
            return Ok(Token::Flush);
        }
        Ok(match next_byte()? {
            Some(byte) => Token::Byte(byte),
            None => Token::Done,
        })
    }

    /// Runs one full coding step for `token`.
    ///
    /// DONE first records the active context as the model's last context.
    pub(crate) fn encode_token<W: Write>(
        &mut self,
        coder: &mut RangeEncoder<W>,
        token: Token,
    ) -> Result<()> {
        if token == Token::Done {
            self.model.mark_last_context();
        }
        let before = coder.len();
        loop {
            let (symbol, escaped) = self.model.symbol_for_token(token)?;
            coder.encode(symbol)?;
            if !escaped {
                break;
            }
        }
        if token == Token::Flush {
            self.model.flush();
        }
        self.model.update(token);
        self.model.add_symbol(token);

        if let Token::Byte(_) = token {
            self.counters.record_input();
        }
        self.counters.record_output(coder.len() - before);
        log::trace!("coded {:?}, {} bytes out", token, coder.len());
        Ok(())
    }

    /// Measures the part size after encoding `tokens` and flushing, without
    /// changing any state.
    ///
    /// The model, coder, bit writer and byte counters are checkpointed, the
    /// coder output is diverted into a scratch buffer, and everything is
    /// rolled back afterwards.
    pub fn probe<W: Write>(&mut self, coder: &mut RangeEncoder<W>, tokens: &[Token]) -> Result<u64> {
        let counters = self.counters;
        self.model.set_checkpoint();
        coder.set_checkpoint();
        coder.begin_speculation();

        let outcome = self.probe_inner(coder, tokens);

        let _ = coder.end_speculation();
        coder.rollback();
        self.model.rollback();
        self.counters = counters;
        outcome
    }

    fn probe_inner<W: Write>(&mut self, coder: &mut RangeEncoder<W>, tokens: &[Token]) -> Result<u64> {
        for &token in tokens {
            self.encode_token(coder, token)?;
        }
        coder.flush()?;
        Ok(coder.len())
    }

    /// Encodes `token` into a budgeted part if the part can still be closed
    /// afterwards.
    pub(crate) fn place_token<W: Write>(
        &mut self,
        coder: &mut RangeEncoder<W>,
        token: Token,
        fresh: bool,
        split: &SplitOptions,
    ) -> Result<Placement> {
        let fits = match split.strategy {
            SplitStrategy::Speculative => {
                if coder.len() + self.near_end_margin(coder) <= split.part_max {
                    true
                } else {
                    let trial: &[Token] = if token == Token::Done {
                        &[Token::Done]
                    } else {
                        &[token, Token::EndOfPacket]
                    };
                    let size = self.probe(coder, trial)?;
                    if size > split.part_max && fresh {
                        return Err(Error::PartTooSmall {
                            part_max: split.part_max,
                            required: size,
                        });
                    }
                    size <= split.part_max
                }
            }
            SplitStrategy::Estimate => {
                let pending = u64::from(coder.pending_bits().div_ceil(8));
                fresh || coder.len() + pending + END_OF_PACKET_SPACE <= split.part_max
            }
        };

        if fits {
            self.encode_token(coder, token)?;
            Ok(Placement::Encoded)
        } else {
            log::debug!("part full at {} bytes", coder.len());
            Ok(Placement::PartFull)
        }
    }

    /// Room that one token plus END-OF-PACKET and a flush can take at most.
    fn near_end_margin<W: Write>(&self, coder: &RangeEncoder<W>) -> u64 {
        let chain = u64::from(self.model.max_order()) + 3;
        let underflow = u64::from(coder.registers().underflow_bits);
        NEAR_END_PACKET_SIZE + 4 * chain + underflow.div_ceil(8) + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::volume::MemoryParts;

    fn compressor(order: u32) -> Compressor {
        Compressor::new(CoderOptions::new().max_order(order).unwrap()).unwrap()
    }

    #[test]
    fn test_empty_input_codes_done() {
        let mut c = compressor(3);
        let packed = c.compress_bytes(b"").unwrap();
        assert!(!packed.is_empty());
        assert_eq!(c.model().current_key().len(), 0);
    }

    #[test]
    fn test_summary_counts() {
        let mut c = compressor(2);
        let mut out = Vec::new();
        let summary = c.compress(&b"abcabcabc"[..], &mut out).unwrap();
        assert_eq!(summary.input_bytes, 9);
        assert_eq!(summary.output_bytes, out.len() as u64);
        assert_eq!(summary.part_sizes, vec![out.len() as u64]);
    }

    #[test]
    fn test_probe_leaves_no_trace() {
        let mut c = compressor(2);
        let mut coder = RangeEncoder::new(Vec::new(), false);
        for &b in b"hello wor" {
            c.encode_token(&mut coder, Token::Byte(b)).unwrap();
        }
        let model_before = c.model().clone();
        let len_before = coder.len();
        let regs_before = coder.registers();
        let counters_before = c.counters();

        let size = c
            .probe(&mut coder, &[Token::Byte(b'l'), Token::EndOfPacket])
            .unwrap();
        assert!(size >= len_before);

        assert_eq!(coder.len(), len_before);
        assert_eq!(coder.registers(), regs_before);
        assert_eq!(c.counters(), counters_before);
        assert_eq!(c.model().len(), model_before.len());
        assert_eq!(c.model().current_key(), model_before.current_key());
        assert_eq!(c.model().checkpoint_depth(), 0);
    }

    #[test]
    fn test_probe_matches_real_encoding() {
        let mut c = compressor(3);
        let mut coder = RangeEncoder::new(Vec::new(), false);
        for &b in b"mississippi" {
            c.encode_token(&mut coder, Token::Byte(b)).unwrap();
        }
        let predicted = c.probe(&mut coder, &[Token::Done]).unwrap();
        c.encode_token(&mut coder, Token::Done).unwrap();
        coder.flush().unwrap();
        assert_eq!(predicted, coder.len());
    }

    #[test]
    fn test_split_respects_budget() {
        let text = b"It was the best of times, it was the worst of times. ".repeat(8);
        let mut parts = MemoryParts::new();
        let summary = compressor(3)
            .compress_split(&text[..], &mut parts, &SplitOptions::new(48))
            .unwrap();
        assert!(parts.len() > 1);
        assert!(parts.parts().iter().all(|p| p.len() as u64 <= 48));
        assert_eq!(summary.input_bytes, text.len() as u64);
        assert_eq!(summary.part_sizes.len(), parts.len());
    }

    #[test]
    fn test_split_padding() {
        let text = b"padding every part to the same size ".repeat(6);
        let mut parts = MemoryParts::new();
        let _ = compressor(2)
            .compress_split(&text[..], &mut parts, &SplitOptions::new(40).pad(true))
            .unwrap();
        assert!(parts.parts().iter().all(|p| p.len() == 40));
    }

    #[test]
    fn test_split_too_small() {
        // The compatibility trailer alone takes two of the four bytes
        let options = CoderOptions::new().compatibility_mode(true);
        let mut parts = MemoryParts::new();
        let err = Compressor::new(options)
            .unwrap()
            .compress_split(&b"xyz"[..], &mut parts, &SplitOptions::new(4))
            .unwrap_err();
        assert!(matches!(err, Error::PartTooSmall { part_max: 4, .. }));
    }

    #[test]
    fn test_ratio_check_emits_flush() {
        let options = CoderOptions::new().check_interval(8).compression_limit(1).unwrap();
        let mut c = Compressor::new(options).unwrap();
        let mut out = Vec::new();
        let summary = c.compress(&[0u8, 255, 17, 99, 3, 201, 45, 8].repeat(8)[..], &mut out).unwrap();
        assert!(summary.flushes > 0);
    }

    #[test]
    fn test_with_model_takes_model_flags() {
        let model = CoderOptions::new().compatibility_mode(true).build_model();
        let c = Compressor::with_model(model, &CoderOptions::new());
        assert!(c.options().compatibility_mode);
    }
}
