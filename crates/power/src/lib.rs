//! Power state scheduler: inactivity-driven light and deep sleep.
//!
//! - [`scheduler`]: pure [`SleepScheduler`] state machine (`Active`,
//!   `LightSleepGrace`, `DeepSleep`) with the alarm veto rules
//! - [`timekeeper`]: [`Timekeeper`], microseconds since first boot bridged
//!   across deep sleep by the retained record
//! - [`cycle`]: [`SleepCycle`], the async driver that performs one sleep
//!   attempt against the platform traits, plus the boot/resume hooks
//! - [`screen`]: the "going to sleep" screen
//!
//! Nothing here returns an error to the caller. Every failure degrades to
//! staying awake and is reported as a [`SleepAbort`] plus a log line.

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(unused_must_use)]
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::too_many_arguments)] // SleepCycle::new takes each collaborator

#[macro_use]
mod fmt;

pub mod config;
pub mod cycle;
pub mod scheduler;
pub mod screen;
pub mod timekeeper;

pub use config::SchedulerConfig;
pub use cycle::{SleepCycle, SleepOutcome};
pub use scheduler::{DeepSleepPlan, PowerState, SleepAbort, SleepScheduler};
pub use screen::SleepScreen;
pub use timekeeper::Timekeeper;
