//! Capture timing configuration.

use platform::config::{ms_to_us, DEBOUNCE_INTERVAL_MS, REPEAT_DELAY_MS, REPEAT_TICK_MS};

/// Timing knobs for [`InputCapture`](crate::InputCapture).
///
/// ```
/// use input::CaptureConfig;
///
/// let config = CaptureConfig::new().debounce_ms(50).repeat_delay_ms(400);
/// assert_eq!(config.debounce_us(), 50_000);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CaptureConfig {
    debounce_ms: u32,
    repeat_delay_ms: u32,
    tick_ms: u32,
}

impl CaptureConfig {
    /// Defaults from [`platform::config`].
    pub const fn new() -> Self {
        Self {
            debounce_ms: DEBOUNCE_INTERVAL_MS,
            repeat_delay_ms: REPEAT_DELAY_MS,
            tick_ms: REPEAT_TICK_MS,
        }
    }

    /// Minimum gap between accepted edges of the same (button, transition).
    ///
    /// Also the repeat cadence once a held button starts repeating.
    #[must_use]
    pub const fn debounce_ms(mut self, ms: u32) -> Self {
        self.debounce_ms = ms;
        self
    }

    /// Hold time before the first synthetic repeat.
    #[must_use]
    pub const fn repeat_delay_ms(mut self, ms: u32) -> Self {
        self.repeat_delay_ms = ms;
        self
    }

    /// Period of the repeat scan. Clamped to at least 1 ms.
    #[must_use]
    pub const fn tick_ms(mut self, ms: u32) -> Self {
        self.tick_ms = if ms == 0 { 1 } else { ms };
        self
    }

    /// Debounce interval in microseconds.
    pub const fn debounce_us(&self) -> u64 {
        ms_to_us(self.debounce_ms)
    }

    /// Repeat delay in microseconds.
    pub const fn repeat_delay_us(&self) -> u64 {
        ms_to_us(self.repeat_delay_ms)
    }

    /// Repeat scan period in milliseconds.
    pub const fn tick_period_ms(&self) -> u32 {
        self.tick_ms
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self::new()
    }
}
