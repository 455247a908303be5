//! Monotonic time since first boot, bridged across deep sleep.
//!
//! The hardware uptime counter restarts at every reset, deep sleep
//! included. [`Timekeeper`] adds a persisted offset so that timestamps keep
//! counting from the very first boot:
//!
//! ```text
//! now_us = uptime_us + offset_us
//! ```
//!
//! Before deep sleep the current `now_us` goes into the retained record. On
//! resume the offset becomes that value plus the time spent asleep, measured
//! by the RTC when both readings exist, otherwise taken from the planned
//! timer wake.

use core::cell::Cell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use platform::{Clock, RetainedState, WakeCause};

/// Uptime clock plus sleep-bridging offset.
pub struct Timekeeper<C: Clock> {
    clock: C,
    offset_us: Mutex<CriticalSectionRawMutex, Cell<u64>>,
}

impl<C: Clock> Timekeeper<C> {
    /// Timekeeper over `clock`, offset zero.
    pub const fn new(clock: C) -> Self {
        Self {
            clock,
            offset_us: Mutex::new(Cell::new(0)),
        }
    }

    /// Underlying clock.
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Microseconds since first boot.
    pub fn now_us(&self) -> u64 {
        self.clock
            .uptime_us()
            .saturating_add(self.offset_us.lock(Cell::get))
    }

    /// Current offset added to the uptime counter.
    pub fn offset_us(&self) -> u64 {
        self.offset_us.lock(Cell::get)
    }

    /// Start the timebase from zero.
    pub fn first_boot(&self) {
        self.offset_us.lock(|o| o.set(0));
    }

    /// Snapshot to persist right before deep sleep.
    pub fn prepare_deep_sleep(
        &self,
        planned_sleep_us: Option<u64>,
        alarm_snoozed_at_us: u64,
    ) -> RetainedState {
        RetainedState {
            clock_offset_us: self.now_us(),
            rtc_at_sleep_us: self.clock.rtc_us(),
            planned_sleep_us,
            alarm_snoozed_at_us,
        }
    }

    /// Restore the timebase after a deep-sleep wake. Returns the time
    /// credited for the sleep.
    pub fn resume(&self, state: &RetainedState, cause: WakeCause) -> u64 {
        let slept = match (state.rtc_at_sleep_us, self.clock.rtc_us()) {
            (Some(before), Some(after)) => after.saturating_sub(before),
            _ if cause == WakeCause::Timer => state.planned_sleep_us.unwrap_or(0),
            // Woken early without an RTC: the length is unknown.
            _ => 0,
        };
        self.offset_us
            .lock(|o| o.set(state.clock_offset_us.saturating_add(slept)));
        slept
    }
}
