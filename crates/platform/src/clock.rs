//! Time sources and the alarm collaborator

/// Free-running hardware counters.
pub trait Clock {
    /// Microseconds since the CPU last came out of reset or deep sleep.
    ///
    /// Restarts from zero after every deep sleep.
    fn uptime_us(&self) -> u64;

    /// Battery-backed real-time clock in microseconds, if it has been set.
    ///
    /// `None` until the wall clock is synchronised.
    fn rtc_us(&self) -> Option<u64> {
        None
    }
}

impl<T: Clock + ?Sized> Clock for &T {
    fn uptime_us(&self) -> u64 {
        (**self).uptime_us()
    }

    fn rtc_us(&self) -> Option<u64> {
        (**self).rtc_us()
    }
}

/// Alarm state as reported by the alarm application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AlarmStatus {
    /// Next alarm in microseconds since first boot, or `0` when none is armed.
    pub deadline_us: u64,
    /// The alarm is ringing (or has fired and is awaiting dismissal).
    pub triggered: bool,
}

impl AlarmStatus {
    /// No alarm armed.
    pub const NONE: AlarmStatus = AlarmStatus {
        deadline_us: 0,
        triggered: false,
    };

    /// Armed alarm at `deadline_us`.
    pub const fn at(deadline_us: u64) -> Self {
        AlarmStatus {
            deadline_us,
            triggered: false,
        }
    }

    /// Alarm that is currently ringing.
    pub const fn ringing() -> Self {
        AlarmStatus {
            deadline_us: 0,
            triggered: true,
        }
    }

    /// Deadline, treating zero as "none".
    pub const fn deadline(self) -> Option<u64> {
        if self.deadline_us == 0 {
            None
        } else {
            Some(self.deadline_us)
        }
    }
}

/// Source of [`AlarmStatus`].
///
/// An alarm app that cannot yet tell the time (wall clock not synchronised)
/// reports [`AlarmStatus::NONE`]; that is never an error.
pub trait AlarmSource {
    /// Current alarm status.
    fn alarm_status(&self) -> AlarmStatus;
}

impl<T: AlarmSource + ?Sized> AlarmSource for &T {
    fn alarm_status(&self) -> AlarmStatus {
        (**self).alarm_status()
    }
}
