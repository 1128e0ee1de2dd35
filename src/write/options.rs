//! Options for split compression.

use crate::{Error, Result};

/// Safety margin, in bytes, below which split compression starts probing.
///
/// The effective margin adds four bytes per order in the fallback chain and
/// the pending underflow bits.
pub const NEAR_END_PACKET_SIZE: u64 = 12;

/// Room reserved for END-OF-PACKET and the flush under
/// [`SplitStrategy::Estimate`].
pub const END_OF_PACKET_SPACE: u64 = 8;

/// Smallest accepted part budget.
pub const MIN_PART_SIZE: u64 = 4;

/// How split compression decides where a part ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum SplitStrategy {
    /// Near the end of a part, trial-encode each token plus END-OF-PACKET
    /// and roll back; parts never exceed the budget.
    #[default]
    Speculative,
    /// End the part when the bytes written plus pending bits plus
    /// [`END_OF_PACKET_SPACE`] would exceed the budget. Cheaper, but a part
    /// may overshoot by a few bytes.
    Estimate,
}

/// Options for [`Compressor::compress_split`](crate::Compressor::compress_split).
///
/// # Example
///
/// ```rust
/// use ppmrc::write::{SplitOptions, SplitStrategy};
///
/// let split = SplitOptions::new(512)
///     .pad(true)
///     .strategy(SplitStrategy::Estimate);
/// assert_eq!(split.part_max, 512);
/// assert!(split.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitOptions {
    /// Maximum size of a part in bytes.
    pub part_max: u64,
    /// Pad every part with zero bytes up to `part_max`.
    pub pad: bool,
    /// Part boundary rule.
    pub strategy: SplitStrategy,
}

impl SplitOptions {
    /// Creates options for parts of at most `part_max` bytes.
    pub fn new(part_max: u64) -> Self {
        Self {
            part_max,
            pad: false,
            strategy: SplitStrategy::default(),
        }
    }

    /// Sets the part budget, rejecting budgets below [`MIN_PART_SIZE`].
    pub fn try_part_max(mut self, part_max: u64) -> Result<Self> {
        self.part_max = part_max;
        self.validate()?;
        Ok(self)
    }

    /// Enables or disables zero padding of parts.
    pub fn pad(mut self, pad: bool) -> Self {
        self.pad = pad;
        self
    }

    /// Sets the part boundary rule.
    pub fn strategy(mut self, strategy: SplitStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Checks the part budget.
    pub fn validate(&self) -> Result<()> {
        if self.part_max < MIN_PART_SIZE {
            return Err(Error::InvalidConfig(format!(
                "part size {} is below the minimum of {} bytes",
                self.part_max, MIN_PART_SIZE
            )));
        }
        Ok(())
    }
}

/// Statistics of a finished compression.
#[must_use = "compression summaries report the part layout and should be checked"]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompressSummary {
    /// Input bytes consumed.
    pub input_bytes: u64,
    /// Coded bytes produced, padding included.
    pub output_bytes: u64,
    /// FLUSH tokens emitted by the ratio check.
    pub flushes: u32,
    /// Size of each part; a single entry for unsplit output.
    pub part_sizes: Vec<u64>,
}

impl CompressSummary {
    /// Returns the compression ratio (output / input).
    pub fn compression_ratio(&self) -> f64 {
        if self.input_bytes == 0 {
            1.0
        } else {
            self.output_bytes as f64 / self.input_bytes as f64
        }
    }

    /// Returns the space savings as a fraction.
    pub fn space_savings(&self) -> f64 {
        if self.input_bytes == 0 {
            0.0
        } else {
            1.0 - self.compression_ratio()
        }
    }
}
