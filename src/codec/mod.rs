//! Entropy coding layer.
//!
//! [`range_coder`] turns symbol ranges into bits and back; [`bit_io`] packs
//! those bits into bytes. Neither knows about contexts or orders.

pub mod bit_io;
pub mod range_coder;

pub use bit_io::{BitReader, BitWriter};
pub use range_coder::{MAXIMUM_SCALE, RangeDecoder, RangeEncoder, Registers, Symbol};
