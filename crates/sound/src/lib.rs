//! Buzzer sound engine: tones, melodies and the asynchronous playback task.
//!
//! - [`note`]: pitch table, [`Note`], built-in jingles and UI tones
//! - [`command`]: [`SoundCommand`], the unit of asynchronous work
//! - [`engine`]: [`SoundEngine`], blocking playback plus the depth-1
//!   fire-and-forget slot drained by [`SoundEngine::run`]
//!
//! The buzzer itself is any [`platform::ToneOutput`]; on the host the
//! [`platform::mocks::MockBuzzer`] records every call.

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

#[macro_use]
mod fmt;

pub mod command;
pub mod engine;
pub mod note;

pub use command::SoundCommand;
pub use engine::SoundEngine;
pub use note::{
    melody_duration_ms, Melody, Note, Pitch, BOOT_JINGLE, CANCEL_TONE, CONFIRM_TONE,
    NAVIGATION_TONE, SLEEP_JINGLE,
};
