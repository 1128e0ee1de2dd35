//! Error types for compression, expansion and model persistence.
//!
//! This module provides the [`Error`] enum which represents all failure
//! modes of the coder, along with a convenient [`Result<T>`] type alias.
//!
//! # Error Handling
//!
//! All fallible operations in this crate return `Result<T, Error>`. Note
//! what is *not* an error: escapes (a symbol missing from the active
//! context) and scale overflow (handled by rescaling) are part of normal
//! coding and never surface here.
//!
//! ```rust
//! use ppmrc::{CoderOptions, Compressor, Expander, Result};
//!
//! fn round_trip(data: &[u8]) -> Result<Vec<u8>> {
//!     let options = CoderOptions::new().max_order(3)?;
//!     let packed = Compressor::new(options.clone())?.compress_bytes(data)?;
//!     Expander::new(options)?.expand_bytes(&packed)
//! }
//! # assert_eq!(round_trip(b"abracadabra").unwrap(), b"abracadabra");
//! ```
//!
//! ## Matching on Variants
//!
//! ```rust
//! use ppmrc::Error;
//!
//! fn print_user_message(error: &Error) {
//!     match error {
//!         Error::Io(e) => println!("File error: {}", e),
//!         Error::EndOfInput { .. } => println!("The coded stream is truncated."),
//!         Error::InvalidModel(_) | Error::Json(_) => println!("The model file is damaged."),
//!         Error::PartMissing { path, .. } => println!("Missing part: {}", path),
//!         _ => println!("Error: {}", error),
//!     }
//! }
//! ```

use std::io;

/// The main error type for coder operations.
///
/// # Error Categories
///
/// | Category | Variants | Typical Cause |
/// |----------|----------|---------------|
/// | I/O | [`Io`][Self::Io] | Sink or source failure |
/// | Stream | [`EndOfInput`][Self::EndOfInput], [`CorruptStream`][Self::CorruptStream] | Truncated or damaged coded data |
/// | Model | [`InvalidModel`][Self::InvalidModel], [`Json`][Self::Json] | Damaged model file |
/// | Configuration | [`InvalidConfig`][Self::InvalidConfig], [`PartTooSmall`][Self::PartTooSmall] | Rejected options |
/// | Parts | [`PartMissing`][Self::PartMissing] | Incomplete multi-part set |
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// An I/O error occurred on the underlying sink or source.
    ///
    /// # Recovery
    ///
    /// Check the underlying [`std::io::ErrorKind`]. Transient kinds
    /// (`Interrupted`, `WouldBlock`, `TimedOut`) are reported by
    /// [`Error::is_recoverable`].
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The coded input ended before the decoder reached DONE.
    ///
    /// Outside compatibility mode the bit reader tolerates two synthesized
    /// zero bytes past the end of the source; this error is raised only once
    /// that allowance is used up. In compatibility mode it is raised on the
    /// first read past the end.
    ///
    /// # Recovery
    ///
    /// The stream is truncated. Arithmetic coding carries no integrity check,
    /// so the output produced so far may already be wrong.
    #[error("Unexpected end of coded input after {bytes_read} bytes")]
    EndOfInput {
        /// Bytes consumed from the source before exhaustion.
        bytes_read: u64,
    },

    /// The decoder produced a count outside the active scale.
    ///
    /// This is the only kind of mid-stream corruption the decoder can notice.
    /// Most bit errors decode silently into different output.
    #[error("Corrupt coded stream: {reason}")]
    CorruptStream {
        /// A description of the inconsistency.
        reason: String,
    },

    /// A persisted model is structurally invalid.
    ///
    /// Raised for a missing header, a key longer than its declared maximum,
    /// a key record without a following context record, and similar defects.
    #[error("Invalid model: {0}")]
    InvalidModel(String),

    /// A persisted model line is not valid JSON for its record type.
    #[error("Model JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A configuration value was rejected.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The split budget cannot hold a single token plus END-OF-PACKET.
    ///
    /// # Recovery
    ///
    /// Retry with a `part_max` of at least `required` bytes.
    #[error("Part size {part_max} is too small, at least {required} bytes are needed")]
    PartTooSmall {
        /// The configured maximum part size in bytes.
        part_max: u64,
        /// The size the first token of a fresh part needed.
        required: u64,
    },

    /// A multi-part stream asked for a part that does not exist.
    ///
    /// # Recovery
    ///
    /// Provide the missing part file and retry the expansion.
    #[error("Part {index} is missing: {path}")]
    PartMissing {
        /// Zero-based part index.
        index: u32,
        /// Location the part was expected at.
        path: String,
    },

    /// The background packet worker has stopped.
    #[error("Packet worker stopped")]
    WorkerStopped,
}

impl Error {
    /// Returns `true` if the operation may succeed when retried.
    pub fn is_recoverable(&self) -> bool {
        match self {
            // The caller can supply the missing part
            Error::PartMissing { .. } => true,
            Error::Io(e) => matches!(
                e.kind(),
                io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted | io::ErrorKind::TimedOut
            ),
            _ => false,
        }
    }

    /// Returns `true` if this error reports damaged coded data.
    pub fn is_corruption(&self) -> bool {
        matches!(self, Error::EndOfInput { .. } | Error::CorruptStream { .. })
    }

    /// Creates a CorruptStream error.
    pub fn corrupt_stream(reason: impl Into<String>) -> Self {
        Error::CorruptStream {
            reason: reason.into(),
        }
    }
}

/// A specialized Result type for coder operations.
pub type Result<T> = std::result::Result<T, Error>;
