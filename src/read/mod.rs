//! Expansion.
//!
//! An [`Expander`] mirrors the [`Compressor`](crate::Compressor): it keeps
//! the same model, asks it for the scale of the active context, lets the
//! [`RangeDecoder`] pick a count, and maps the count back to a token. Escapes
//! repeat the lookup one order lower until a token comes out.
//!
//! # Example
//!
//! ```rust
//! use ppmrc::{CoderOptions, Compressor, Expander};
//!
//! # fn main() -> ppmrc::Result<()> {
//! let options = CoderOptions::new();
//! let packed = Compressor::new(options.clone())?.compress_bytes(b"hello, hello")?;
//! let mut restored = Vec::new();
//! let summary = Expander::new(options)?.expand(&packed[..], &mut restored)?;
//! assert_eq!(restored, b"hello, hello");
//! assert_eq!(summary.output_bytes, 12);
//! # Ok(())
//! # }
//! ```

use std::io::{self, BufReader, BufWriter, Read, Write};

use crate::codec::RangeDecoder;
use crate::model::{Model, Token};
use crate::volume::PartSource;
use crate::{CoderOptions, Error, Result};

/// Statistics of a finished expansion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpandSummary {
    /// Coded bytes consumed, synthesized tail bytes included.
    pub input_bytes: u64,
    /// Bytes restored.
    pub output_bytes: u64,
    /// Parts read.
    pub parts: u32,
    /// FLUSH tokens seen.
    pub flushes: u32,
}

/// How a coded part ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PartEnd {
    Done,
    EndOfPacket,
}

/// Drives the model and range decoder over a coded stream.
#[derive(Debug)]
pub struct Expander {
    model: Model,
    options: CoderOptions,
}

impl Expander {
    /// Creates an expander with a fresh model.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the options are invalid.
    pub fn new(options: CoderOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            model: options.build_model(),
            options,
        })
    }

    /// Creates an expander around an existing model.
    pub fn with_model(model: Model, options: &CoderOptions) -> Self {
        Self {
            options: options.matching(&model),
            model,
        }
    }

    /// Returns the model.
    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Consumes the expander and returns the model.
    pub fn into_model(self) -> Model {
        self.model
    }

    /// Returns the effective options.
    pub fn options(&self) -> &CoderOptions {
        &self.options
    }

    /// Expands a single coded stream.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EndOfInput`] for a truncated stream, and
    /// [`Error::CorruptStream`] for an END-OF-PACKET (the stream belongs to
    /// a split set) or a count outside the active scale.
    pub fn expand<R: Read, W: Write>(&mut self, input: R, output: W) -> Result<ExpandSummary> {
        let mut output = BufWriter::new(output);
        let mut summary = ExpandSummary::default();
        match self.expand_part(input, &mut output, &mut summary)? {
            PartEnd::Done => {}
            PartEnd::EndOfPacket => {
                return Err(Error::corrupt_stream(
                    "END-OF-PACKET in a single-part stream",
                ));
            }
        }
        output.flush()?;
        Ok(summary)
    }

    /// Expands a coded slice into a new buffer.
    pub fn expand_bytes(&mut self, packed: &[u8]) -> Result<Vec<u8>> {
        let mut restored = Vec::new();
        self.expand(packed, &mut restored)?;
        Ok(restored)
    }

    /// Expands a split stream, reading parts in order until DONE.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PartMissing`] when the source runs out of parts
    /// before DONE.
    pub fn expand_parts<S: PartSource, W: Write>(
        &mut self,
        mut source: S,
        output: W,
    ) -> Result<ExpandSummary> {
        let mut output = BufWriter::new(output);
        let mut summary = ExpandSummary::default();
        let mut index = 0;
        loop {
            let part = source.open_part(index)?;
            match self.expand_part(part, &mut output, &mut summary)? {
                PartEnd::Done => break,
                PartEnd::EndOfPacket => {
                    log::debug!("part {} ended, {} bytes restored", index, summary.output_bytes);
                    index += 1;
                }
            }
        }
        output.flush()?;
        Ok(summary)
    }

    /// Expands a split stream into a new buffer.
    pub fn expand_parts_to_vec<S: PartSource>(&mut self, source: S) -> Result<Vec<u8>> {
        let mut restored = Vec::new();
        self.expand_parts(source, &mut restored)?;
        Ok(restored)
    }

    /// Runs a coded stream through the model, discarding the output.
    ///
    /// Afterwards the model holds exactly the statistics the compressor had
    /// when it finished that stream, ready for [`Model::export`].
    pub fn train<R: Read>(&mut self, input: R) -> Result<ExpandSummary> {
        let summary = self.expand(input, io::sink())?;
        log::debug!(
            "trained on {} coded bytes, {} contexts",
            summary.input_bytes,
            self.model.len()
        );
        Ok(summary)
    }

    /// Writes the model as JSON lines, see [`Model::export`].
    pub fn export_model<W: Write>(&self, writer: W) -> Result<()> {
        self.model.export(writer)
    }

    fn expand_part<R: Read, W: Write>(
        &mut self,
        input: R,
        output: &mut W,
        summary: &mut ExpandSummary,
    ) -> Result<PartEnd> {
        let mut decoder = RangeDecoder::new(BufReader::new(input), self.model.is_compatible())?;
        summary.parts += 1;
        let end = loop {
            let token = self.decode_token(&mut decoder)?;
            match token {
                Token::Byte(byte) => {
                    output.write_all(&[byte])?;
                    summary.output_bytes += 1;
                }
                Token::Flush => {
                    self.model.flush();
                    summary.flushes += 1;
                }
                Token::Done | Token::EndOfPacket => {}
            }
            self.model.update(token);
            self.model.add_symbol(token);
            match token {
                Token::Done => {
                    self.model.mark_last_context();
                    break PartEnd::Done;
                }
                Token::EndOfPacket => break PartEnd::EndOfPacket,
                _ => {}
            }
        };
        summary.input_bytes += decoder.bytes_read();
        Ok(end)
    }

    fn decode_token<R: Read>(&mut self, decoder: &mut RangeDecoder<R>) -> Result<Token> {
        loop {
            let scale = self.model.symbol_scale();
            let count = decoder.current_count(scale);
            let (token, symbol) = self.model.token_for_count(count)?;
            decoder.remove_symbol(symbol)?;
            if let Some(token) = token {
                log::trace!("decoded {:?}", token);
                return Ok(token);
            }
        }
    }
}
