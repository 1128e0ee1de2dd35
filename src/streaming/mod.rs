//! Packet-oriented streaming compression.
//!
//! [`PacketEncoder`] compresses bytes as they arrive into packets of
//! bounded size. The caller pushes input and polls; each poll either
//! returns a complete packet or reports that more input is needed. A packet
//! ends with END-OF-PACKET, the final one with DONE, so the packets form a
//! split stream that [`Expander::expand_parts`](crate::Expander::expand_parts)
//! restores.
//!
//! With the `streaming` feature (on by default), [`PacketWorker`] runs a
//! packet encoder on a background thread fed through channels.
//!
//! # Example
//!
//! ```rust
//! use ppmrc::streaming::{PacketEncoder, PacketStatus};
//! use ppmrc::write::SplitOptions;
//! use ppmrc::{CoderOptions, Compressor};
//!
//! # fn main() -> ppmrc::Result<()> {
//! let compressor = Compressor::new(CoderOptions::default())?;
//! let mut encoder = PacketEncoder::new(compressor, SplitOptions::new(64))?;
//! let mut packets = Vec::new();
//!
//! for chunk in [&b"first chunk, "[..], b"second chunk, ", b"third chunk"] {
//!     encoder.push(chunk);
//!     while let PacketStatus::PacketComplete(packet) = encoder.poll()? {
//!         packets.push(packet);
//!     }
//! }
//! packets.extend(encoder.finish()?);
//! assert!(packets.iter().all(|p| p.len() <= 64));
//! # Ok(())
//! # }
//! ```

mod encoder;
#[cfg(feature = "streaming")]
mod worker;

pub use encoder::{PacketEncoder, PacketStatus};
#[cfg(feature = "streaming")]
pub use worker::{DEFAULT_QUEUE_DEPTH, PacketWorker, WorkerEvent};
