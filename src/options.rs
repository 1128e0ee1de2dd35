//! Coder configuration shared by compression and expansion.
//!
//! Both sides of a stream must use the same options (or the same imported
//! model); nothing in the coded stream records them.

use crate::model::{MAX_ORDER, Model};
use crate::{Error, Result};

/// Default context window length.
pub const DEFAULT_MAX_ORDER: u32 = 3;

/// Default number of steps between compression-ratio checks.
pub const DEFAULT_CHECK_INTERVAL: u32 = 256;

/// Default output/input ratio, in percent, above which the model is flushed.
pub const DEFAULT_COMPRESSION_LIMIT: u32 = 90;

/// Options for the context model and coder.
///
/// # Example
///
/// ```rust
/// use ppmrc::CoderOptions;
///
/// let options = CoderOptions::new()
///     .max_order(4)?
///     .compatibility_mode(true);
/// assert_eq!(options.max_order, 4);
/// # Ok::<(), ppmrc::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoderOptions {
    /// Context window length (0 to [`MAX_ORDER`]).
    pub max_order: u32,
    /// Reproduce the legacy encoder bit for bit.
    ///
    /// Affects the initial table layout, the escape estimate, scoreboard
    /// marking, the 16-bit flush trailer and end-of-input tolerance.
    pub compatibility_mode: bool,
    /// Never adapt the model while coding.
    pub static_model: bool,
    /// Steps between compression-ratio checks (0 disables the check).
    pub check_interval: u32,
    /// Output/input ratio in percent that triggers a FLUSH.
    pub compression_limit: u32,
}

impl Default for CoderOptions {
    fn default() -> Self {
        Self {
            max_order: DEFAULT_MAX_ORDER,
            compatibility_mode: false,
            static_model: false,
            check_interval: DEFAULT_CHECK_INTERVAL,
            compression_limit: DEFAULT_COMPRESSION_LIMIT,
        }
    }
}

impl CoderOptions {
    /// Creates options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the context window length (strict validation).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if `order` exceeds [`MAX_ORDER`].
    pub fn max_order(mut self, order: u32) -> Result<Self> {
        if order > MAX_ORDER {
            return Err(Error::InvalidConfig(format!(
                "max order {} exceeds {}",
                order, MAX_ORDER
            )));
        }
        self.max_order = order;
        Ok(self)
    }

    /// Sets the context window length, clamping to [`MAX_ORDER`].
    pub fn max_order_clamped(mut self, order: u32) -> Self {
        self.max_order = order.min(MAX_ORDER);
        self
    }

    /// Enables or disables compatibility mode.
    pub fn compatibility_mode(mut self, enabled: bool) -> Self {
        self.compatibility_mode = enabled;
        self
    }

    /// Enables or disables the static (read-only) model.
    pub fn static_model(mut self, enabled: bool) -> Self {
        self.static_model = enabled;
        self
    }

    /// Sets the steps between compression-ratio checks.
    pub fn check_interval(mut self, steps: u32) -> Self {
        self.check_interval = steps;
        self
    }

    /// Sets the ratio limit in percent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] for 0, which would flush on every check.
    pub fn compression_limit(mut self, percent: u32) -> Result<Self> {
        if percent == 0 {
            return Err(Error::InvalidConfig(
                "compression limit must be positive".into(),
            ));
        }
        self.compression_limit = percent;
        Ok(self)
    }

    /// Re-checks every field, for options assembled by hand.
    pub fn validate(&self) -> Result<()> {
        if self.max_order > MAX_ORDER {
            return Err(Error::InvalidConfig(format!(
                "max order {} exceeds {}",
                self.max_order, MAX_ORDER
            )));
        }
        if self.compression_limit == 0 {
            return Err(Error::InvalidConfig(
                "compression limit must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Builds a fresh model for these options.
    pub fn build_model(&self) -> Model {
        let mut model = Model::new(self.max_order, self.compatibility_mode);
        model.set_adaptive(!self.static_model);
        model
    }

    /// Options describing an existing model, keeping this instance's
    /// ratio-check settings.
    pub fn matching(&self, model: &Model) -> Self {
        Self {
            max_order: model.max_order(),
            compatibility_mode: model.is_compatible(),
            static_model: !model.is_adaptive(),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = CoderOptions::default();
        assert_eq!(options.max_order, 3);
        assert_eq!(options.check_interval, 256);
        assert_eq!(options.compression_limit, 90);
        assert!(!options.compatibility_mode);
        assert!(!options.static_model);
    }

    #[test]
    fn test_max_order_strict() {
        assert!(CoderOptions::new().max_order(MAX_ORDER).is_ok());
        assert!(matches!(
            CoderOptions::new().max_order(MAX_ORDER + 1),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_max_order_clamped() {
        assert_eq!(CoderOptions::new().max_order_clamped(99).max_order, MAX_ORDER);
    }

    #[test]
    fn test_validate_hand_built() {
        let options = CoderOptions {
            max_order: 40,
            ..CoderOptions::default()
        };
        assert!(options.validate().is_err());
        assert!(CoderOptions::new().compression_limit(0).is_err());
    }

    #[test]
    fn test_build_model() {
        let model = CoderOptions::new()
            .static_model(true)
            .compatibility_mode(true)
            .build_model();
        assert!(!model.is_adaptive());
        assert!(model.is_compatible());
        assert_eq!(model.max_order(), 3);

        let options = CoderOptions::new().matching(&model);
        assert!(options.static_model && options.compatibility_mode);
    }
}
