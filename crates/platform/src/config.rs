//! Compile-time timing and sizing constants.
//!
//! Each runtime config struct (`CaptureConfig`, `SchedulerConfig`) defaults to
//! these values; hosts override them to run scenarios at shortened timescales.

use crate::input::Button;

/// Capacity of the input event queue.
pub const EVENT_QUEUE_CAPACITY: usize = 16;

/// Minimum gap between accepted edges of the same (button, transition).
pub const DEBOUNCE_INTERVAL_MS: u32 = 300;

/// How long a button must be held before it starts repeating.
pub const REPEAT_DELAY_MS: u32 = 500;

/// Period of the repeat-scan tick.
pub const REPEAT_TICK_MS: u32 = 100;

/// Idle time before the sleep cycle begins.
pub const INACTIVITY_TIMEOUT_MS: u32 = 60_000;

/// Length of the light-sleep window before committing to deep sleep.
pub const GRACE_PERIOD_MS: u32 = 5_000;

/// Safety margin kept ahead of a scheduled alarm.
pub const ALARM_GUARD_MS: u32 = 1_000;

/// Shortest deep-sleep timer wake worth taking. An alarm closer than the
/// guard plus this span at grace expiry keeps the device awake.
pub const MIN_DEEP_SLEEP_MS: u32 = 2_000;

/// Delay the UI upkeep loop idles for between iterations.
pub const UPKEEP_IDLE_MS: u32 = 100;

/// Button that wakes the device and cancels interruptible melodies.
pub const PRIMARY_BUTTON: Button = Button::A;

/// Milliseconds to microseconds.
pub const fn ms_to_us(ms: u32) -> u64 {
    // Cannot overflow: u32::MAX * 1000 < u64::MAX.
    #[allow(clippy::arithmetic_side_effects)]
    let us = ms as u64 * 1_000;
    us
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_is_finer_than_debounce() {
        // A coarser tick would make the repeat cadence the tick, not the debounce.
        assert!(REPEAT_TICK_MS < DEBOUNCE_INTERVAL_MS);
    }

    #[test]
    fn ms_to_us_handles_max() {
        assert_eq!(ms_to_us(u32::MAX), u64::from(u32::MAX) * 1000);
        assert_eq!(ms_to_us(GRACE_PERIOD_MS), 5_000_000);
    }
}
