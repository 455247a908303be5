//! Hardware Abstraction Layer (HAL) for the Pocketwatch handheld
//!
//! This crate provides trait-based abstractions for every peripheral the
//! firmware core touches, enabling development and testing without physical
//! hardware.
//!
//! # Architecture Layers
//!
//! ```text
//! Application Layer (firmware crate: runtime context, apps)
//!         ↓
//! Core Layers (input, sound, power)
//!         ↓
//! Platform HAL (this crate - trait abstractions)
//!         ↓
//! Hardware Layer (Embassy HAL + PAC)
//! ```
//!
//! # Abstractions
//!
//! - [`ButtonLevels`] - Live level of the six button lines
//! - [`ToneOutput`] - Piezo buzzer
//! - [`SleepPanel`] - Monochrome panel used for the sleep screen
//! - [`SleepController`] - Light/deep sleep and wake sources
//! - [`Clock`] - Free-running uptime counter and optional RTC
//! - [`AlarmSource`] - Alarm collaborator consulted before sleeping
//! - [`RetainedStore`] - Battery-backed state that survives deep sleep
//!
//! # Features
//!
//! - `std`: Enable host mocks ([`mocks`])
//! - `defmt`: Enable defmt derives
//!
//! # Example
//!
//! ```no_run
//! use platform::{Button, ButtonLevels};
//!
//! fn wake_held<L: ButtonLevels>(levels: &L) -> bool {
//!     levels.is_pressed(Button::A)
//! }
//! ```

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(clippy::unreachable)] // no unreachable!() that isn't documented
#![deny(unused_must_use)]
// all Results must be handled
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(all(not(test), not(feature = "std")), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(unsafe_op_in_unsafe_fn)] // unsafe fn body is not implicitly unsafe block
#![warn(clippy::print_stdout)] // prefer tracing/defmt over println! in lib code
// Pedantic lints suppressed for this hardware HAL crate:
#![allow(clippy::doc_markdown)]
#![allow(clippy::must_use_candidate)] // hardware accessors, callers decide
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(async_fn_in_trait)] // Embassy no_std: single-threaded, Send bounds not needed

pub mod buzzer;
pub mod clock;
pub mod config;
pub mod display;
pub mod input;
pub mod mocks;
pub mod power;
pub mod retained;

pub use buzzer::ToneOutput;
pub use clock::{AlarmSource, AlarmStatus, Clock};
pub use display::{DisplayError, SleepPanel};
pub use input::{Button, ButtonLevels, ButtonSet, Transition, BUTTON_COUNT};
pub use power::{PowerError, SleepController, WakeCause};
pub use retained::{RetainedState, RetainedStore, StorageError, RETAINED_LEN};
