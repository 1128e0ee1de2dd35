//! Byte counters driving the periodic compression-ratio check.
//!
//! A compression session owns one [`ByteCounters`] value. The driving loop
//! counts input bytes as it reads them and output bytes as the coder emits
//! them; every [`CoderOptions::check_interval`] steps a [`RatioCheck`]
//! compares the two and, when the output has grown to more than
//! [`CoderOptions::compression_limit`] percent of the input, asks for a FLUSH
//! so the model forgets stale statistics.
//!
//! The counters are `Copy`, so speculative encoding snapshots them by value
//! and restores the copy on rollback.
//!
//! [`CoderOptions::check_interval`]: crate::CoderOptions::check_interval
//! [`CoderOptions::compression_limit`]: crate::CoderOptions::compression_limit

use crate::CoderOptions;

/// Input and output byte tallies since the last reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ByteCounters {
    /// Bytes consumed from the input.
    pub input_bytes: u64,
    /// Coded bytes produced.
    pub output_bytes: u64,
}

impl ByteCounters {
    /// Counts one consumed input byte.
    pub fn record_input(&mut self) {
        self.input_bytes += 1;
    }

    /// Counts produced output bytes.
    pub fn record_output(&mut self, bytes: u64) {
        self.output_bytes += bytes;
    }

    /// Output size as a percentage of input size, `None` before any input.
    pub fn ratio_percent(&self) -> Option<u64> {
        if self.input_bytes == 0 {
            None
        } else {
            Some(self.output_bytes * 100 / self.input_bytes)
        }
    }

    /// Zeroes both tallies.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Decides when a session should emit FLUSH.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatioCheck {
    interval: u32,
    limit: u32,
    steps: u32,
}

impl RatioCheck {
    /// Creates a check from the coder options; static models never flush.
    pub fn new(options: &CoderOptions) -> Self {
        let interval = if options.static_model {
            0
        } else {
            options.check_interval
        };
        Self {
            interval,
            limit: options.compression_limit,
            steps: 0,
        }
    }

    /// Counts a step and reports whether the model should be flushed now.
    ///
    /// At every interval boundary the counters are cleared, whether or not
    /// the ratio was exceeded.
    pub fn step(&mut self, counters: &mut ByteCounters) -> bool {
        if self.interval == 0 {
            return false;
        }
        self.steps = self.steps.wrapping_add(1);
        if self.steps % self.interval != 0 {
            return false;
        }
        let exceeded = counters
            .ratio_percent()
            .is_some_and(|ratio| ratio > u64::from(self.limit));
        if exceeded {
            log::debug!(
                "compression ratio {}% above {}%, flushing model",
                counters.ratio_percent().unwrap_or_default(),
                self.limit
            );
        }
        counters.clear();
        exceeded
    }
}
