//! Scheduler timing configuration.

use platform::config::{
    ms_to_us, ALARM_GUARD_MS, GRACE_PERIOD_MS, INACTIVITY_TIMEOUT_MS, MIN_DEEP_SLEEP_MS,
    PRIMARY_BUTTON,
};
use platform::Button;

/// Timing and behaviour of the sleep cycle.
///
/// Defaults come from [`platform::config`]; every setter is `const` so a
/// configuration can live in a `static`.
///
/// ```
/// use power::SchedulerConfig;
///
/// const FAST: SchedulerConfig = SchedulerConfig::new()
///     .inactivity_timeout_ms(2_000)
///     .grace_period_ms(500);
/// assert_eq!(FAST.grace_period_us(), 500_000);
/// assert_eq!(FAST.alarm_window_us(), 1_500_000);
/// assert_eq!(FAST.recheck_window_us(), 3_000_000);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SchedulerConfig {
    inactivity_timeout_ms: u32,
    grace_period_ms: u32,
    alarm_guard_ms: u32,
    min_deep_sleep_ms: u32,
    wake_button: Button,
    play_jingle: bool,
}

impl SchedulerConfig {
    /// Compile-time defaults.
    pub const fn new() -> Self {
        Self {
            inactivity_timeout_ms: INACTIVITY_TIMEOUT_MS,
            grace_period_ms: GRACE_PERIOD_MS,
            alarm_guard_ms: ALARM_GUARD_MS,
            min_deep_sleep_ms: MIN_DEEP_SLEEP_MS,
            wake_button: PRIMARY_BUTTON,
            play_jingle: true,
        }
    }

    /// Idle time before a sleep attempt.
    #[must_use]
    pub const fn inactivity_timeout_ms(mut self, ms: u32) -> Self {
        self.inactivity_timeout_ms = ms;
        self
    }

    /// Length of the light-sleep window before deep sleep.
    #[must_use]
    pub const fn grace_period_ms(mut self, ms: u32) -> Self {
        self.grace_period_ms = ms;
        self
    }

    /// Margin kept between a deep-sleep timer wake and the alarm deadline.
    #[must_use]
    pub const fn alarm_guard_ms(mut self, ms: u32) -> Self {
        self.alarm_guard_ms = ms;
        self
    }

    /// Shortest timer wake deep sleep is committed for.
    #[must_use]
    pub const fn min_deep_sleep_ms(mut self, ms: u32) -> Self {
        self.min_deep_sleep_ms = ms;
        self
    }

    /// Button armed as the GPIO wake source.
    #[must_use]
    pub const fn wake_button(mut self, button: Button) -> Self {
        self.wake_button = button;
        self
    }

    /// Play the sleep jingle before deep sleep.
    #[must_use]
    pub const fn play_jingle(mut self, enabled: bool) -> Self {
        self.play_jingle = enabled;
        self
    }

    /// Inactivity timeout in µs.
    pub const fn inactivity_timeout_us(&self) -> u64 {
        ms_to_us(self.inactivity_timeout_ms)
    }

    /// Grace period in µs.
    pub const fn grace_period_us(&self) -> u64 {
        ms_to_us(self.grace_period_ms)
    }

    /// Alarm guard in µs.
    pub const fn alarm_guard_us(&self) -> u64 {
        ms_to_us(self.alarm_guard_ms)
    }

    /// An alarm due within this many µs keeps the device out of the grace
    /// period.
    pub const fn alarm_window_us(&self) -> u64 {
        self.grace_period_us().saturating_add(self.alarm_guard_us())
    }

    /// An alarm due within this many µs at grace expiry cancels deep sleep.
    /// Anything later gets a timer wake one guard ahead of the deadline.
    pub const fn recheck_window_us(&self) -> u64 {
        self.alarm_guard_us()
            .saturating_add(ms_to_us(self.min_deep_sleep_ms))
    }

    /// GPIO wake button.
    pub const fn wake_source(&self) -> Button {
        self.wake_button
    }

    /// Whether the sleep jingle plays.
    pub const fn jingle_enabled(&self) -> bool {
        self.play_jingle
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_platform_constants() {
        let cfg = SchedulerConfig::default();
        assert_eq!(cfg.inactivity_timeout_us(), 60_000_000);
        assert_eq!(cfg.grace_period_us(), 5_000_000);
        assert_eq!(cfg.alarm_window_us(), 6_000_000);
        assert_eq!(cfg.recheck_window_us(), 3_000_000);
        assert_eq!(cfg.wake_source(), Button::A);
        assert!(cfg.jingle_enabled());
    }

    #[test]
    fn setters_override_one_field() {
        let cfg = SchedulerConfig::new().wake_button(Button::B).play_jingle(false);
        assert_eq!(cfg.wake_source(), Button::B);
        assert!(!cfg.jingle_enabled());
        assert_eq!(cfg.grace_period_us(), SchedulerConfig::new().grace_period_us());
    }
}
