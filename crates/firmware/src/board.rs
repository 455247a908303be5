//! Board binding.
//!
//! A [`Board`] names the concrete platform types one build links against.
//! The hardware binary binds the STM32H743 drivers; host tests bind the
//! `platform::mocks` types. Everything above this point is generic.

use platform::{AlarmSource, Clock, RetainedStore, SleepController, ToneOutput};

/// Platform types a [`Runtime`](crate::Runtime) is built from.
pub trait Board {
    /// Piezo output driven by the sound engine.
    type Buzzer: ToneOutput;
    /// Light/deep sleep and wake sources.
    type Sleep: SleepController;
    /// Alarm collaborator consulted before sleeping.
    type Alarm: AlarmSource;
    /// Battery-backed state that survives deep sleep.
    type Retained: RetainedStore;
    /// Uptime counter and optional RTC.
    type Clock: Clock;
}
