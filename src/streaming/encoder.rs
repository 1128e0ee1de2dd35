//! Synchronous packet encoder.

use std::collections::VecDeque;

use crate::codec::RangeEncoder;
use crate::model::Token;
use crate::write::{Placement, SplitOptions};
use crate::{Compressor, Result};

/// Result of [`PacketEncoder::poll`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PacketStatus {
    /// Every queued byte has been coded; push more or finish.
    NeedMoreInput,
    /// A packet reached its budget and was closed with END-OF-PACKET.
    PacketComplete(Vec<u8>),
}

/// Compresses pushed bytes into packets of at most `part_max` bytes.
#[derive(Debug)]
pub struct PacketEncoder {
    compressor: Compressor,
    split: SplitOptions,
    queue: VecDeque<u8>,
    coder: RangeEncoder<Vec<u8>>,
    pending: Option<Token>,
    fresh: bool,
    packets: u32,
}

impl PacketEncoder {
    /// Creates an encoder that codes through `compressor`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`](crate::Error::InvalidConfig) for a
    /// budget below the minimum part size.
    pub fn new(compressor: Compressor, split: SplitOptions) -> Result<Self> {
        split.validate()?;
        let coder = RangeEncoder::new(Vec::new(), compressor.model().is_compatible());
        Ok(Self {
            compressor,
            split,
            queue: VecDeque::new(),
            coder,
            pending: None,
            fresh: true,
            packets: 0,
        })
    }

    /// Queues input bytes.
    pub fn push(&mut self, bytes: &[u8]) {
        self.queue.extend(bytes);
    }

    /// Bytes queued but not yet coded.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Packets completed so far.
    pub fn packets(&self) -> u32 {
        self.packets
    }

    /// Returns the compressor.
    pub fn compressor(&self) -> &Compressor {
        &self.compressor
    }

    /// Codes queued bytes until a packet fills up or the queue runs dry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PartTooSmall`](crate::Error::PartTooSmall) if a
    /// fresh packet cannot hold one token plus END-OF-PACKET.
    pub fn poll(&mut self) -> Result<PacketStatus> {
        loop {
            let token = match self.pending.take() {
                Some(token) => token,
                None => {
                    if self.queue.is_empty() {
                        return Ok(PacketStatus::NeedMoreInput);
                    }
                    let queue = &mut self.queue;
                    self.compressor.next_token(|| Ok(queue.pop_front()))?
                }
            };
            match self
                .compressor
                .place_token(&mut self.coder, token, self.fresh, &self.split)?
            {
                Placement::Encoded => self.fresh = false,
                Placement::PartFull => {
                    self.pending = Some(token);
                    let packet = self.close_packet(true)?;
                    return Ok(PacketStatus::PacketComplete(packet));
                }
            }
        }
    }

    /// Codes the remaining input and DONE, returning every packet not yet
    /// handed out by [`poll`](Self::poll). The last one ends the stream.
    pub fn finish(mut self) -> Result<Vec<Vec<u8>>> {
        let mut packets = Vec::new();
        while let PacketStatus::PacketComplete(packet) = self.poll()? {
            packets.push(packet);
        }
        loop {
            let token = match self.pending.take() {
                Some(token) => token,
                None => self.compressor.next_token(|| Ok(None))?,
            };
            match self
                .compressor
                .place_token(&mut self.coder, token, self.fresh, &self.split)?
            {
                Placement::Encoded if token == Token::Done => break,
                Placement::Encoded => self.fresh = false,
                Placement::PartFull => {
                    self.pending = Some(token);
                    packets.push(self.close_packet(true)?);
                }
            }
        }
        packets.push(self.close_packet(false)?);
        log::debug!("packet stream finished after {} packets", self.packets);
        Ok(packets)
    }

    fn close_packet(&mut self, end_of_packet: bool) -> Result<Vec<u8>> {
        if end_of_packet {
            self.compressor
                .encode_token(&mut self.coder, Token::EndOfPacket)?;
        }
        if self.split.pad {
            self.coder.flush_padded(self.split.part_max)?;
        } else {
            self.coder.flush()?;
        }
        let next = RangeEncoder::new(Vec::new(), self.compressor.model().is_compatible());
        let packet = std::mem::replace(&mut self.coder, next).into_inner();
        self.fresh = true;
        self.packets += 1;
        log::debug!("packet {} complete ({} bytes)", self.packets, packet.len());
        Ok(packet)
    }
}
