//! Alarm slot.
//!
//! The alarm app itself lives outside the core. It publishes its next
//! deadline here and the sleep cycle reads it back through
//! [`AlarmSource`]. An empty slot means "no alarm armed".

use core::cell::Cell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use platform::{AlarmSource, AlarmStatus};

/// Shared alarm status, writable from any context.
pub struct AlarmSlot {
    status: Mutex<CriticalSectionRawMutex, Cell<AlarmStatus>>,
}

impl AlarmSlot {
    /// Empty slot.
    pub const fn new() -> Self {
        Self {
            status: Mutex::new(Cell::new(AlarmStatus::NONE)),
        }
    }

    /// Arm the alarm for `deadline_us` (µs since first boot).
    pub fn arm(&self, deadline_us: u64) {
        self.status.lock(|s| s.set(AlarmStatus::at(deadline_us)));
    }

    /// Mark the alarm as ringing.
    pub fn trigger(&self) {
        self.status.lock(|s| s.set(AlarmStatus::ringing()));
    }

    /// Disarm.
    pub fn clear(&self) {
        self.status.lock(|s| s.set(AlarmStatus::NONE));
    }
}

impl Default for AlarmSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl AlarmSource for AlarmSlot {
    fn alarm_status(&self) -> AlarmStatus {
        self.status.lock(Cell::get)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_round_trip() {
        let slot = AlarmSlot::new();
        assert_eq!(slot.alarm_status(), AlarmStatus::NONE);

        slot.arm(30_000_000);
        assert_eq!(slot.alarm_status().deadline(), Some(30_000_000));

        slot.trigger();
        assert!(slot.alarm_status().triggered);

        slot.clear();
        assert_eq!(slot.alarm_status().deadline(), None);
    }
}
