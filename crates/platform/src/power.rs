//! Sleep control abstraction
//!
//! Two low-power modes are used by the core:
//!
//! - **light sleep**: execution pauses, RAM and peripherals are retained, and
//!   the call returns with the cause of the wake.
//! - **deep sleep**: only battery-backed state survives; the next code to run
//!   is the reset vector. On hardware [`SleepController::deep_sleep`] never
//!   returns. Host implementations record the call and return so tests can
//!   observe it.

use crate::input::Button;

/// Why the CPU is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WakeCause {
    /// Cold start or reset, not a wake from sleep
    PowerOn,
    /// Armed GPIO wake line fired
    Gpio,
    /// Armed wake timer expired
    Timer,
    /// Anything else the platform reports
    Unknown,
}

impl WakeCause {
    /// Short display name for log lines.
    pub const fn name(self) -> &'static str {
        match self {
            WakeCause::PowerOn => "power-on",
            WakeCause::Gpio => "gpio",
            WakeCause::Timer => "timer",
            WakeCause::Unknown => "unknown",
        }
    }
}

/// Sleep / wake errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror_no_std::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerError {
    /// Wake source could not be armed (line busy, peripheral contention)
    #[error("wake source could not be armed")]
    WakeSourceUnavailable,
}

impl PowerError {
    /// Short display name for log lines.
    pub const fn name(self) -> &'static str {
        match self {
            PowerError::WakeSourceUnavailable => "wake-source-unavailable",
        }
    }
}

/// Platform sleep controller
pub trait SleepController {
    /// Cause of the most recent wake (or [`WakeCause::PowerOn`] after reset).
    fn wake_cause(&self) -> WakeCause;

    /// Arm a wake on `button` going active-low.
    fn arm_gpio_wake(&mut self, button: Button) -> Result<(), PowerError>;

    /// Arm a wake `after_us` microseconds from now.
    ///
    /// Returns the delay actually armed. A timer that cannot reach `after_us`
    /// arms its longest delay instead and wakes early.
    fn arm_timer_wake(&mut self, after_us: u64) -> Result<u64, PowerError>;

    /// Disarm every wake source.
    fn disarm_wakes(&mut self);

    /// Enter light sleep; resolves when an armed source fires.
    async fn light_sleep(&mut self) -> WakeCause;

    /// Enter deep sleep. Does not return on hardware.
    fn deep_sleep(&mut self);
}
