//! Button input pipeline: debounced capture and the event queue.
//!
//! ```text
//! GPIO edge ──► InputCapture::on_edge ─┐
//!                                      ├─► EventQueue ──► consumer task
//! repeat tick ─► InputCapture::on_tick ┘   (overwrite-oldest, masked)
//! ```
//!
//! Everything here is `no_std`, allocation-free and safe to call from
//! interrupt context, except the `async` consumer/ticker methods.
//!
//! # Example
//!
//! ```
//! use input::{CaptureConfig, Event, EventQueue, InputCapture};
//! use platform::mocks::MockButtons;
//! use platform::Button;
//!
//! static QUEUE: EventQueue = EventQueue::new();
//! let capture = InputCapture::new(&QUEUE, CaptureConfig::new());
//! let lines = MockButtons::new();
//!
//! lines.press(Button::A);
//! capture.on_edge(Button::A, &lines, 1_000);
//! assert!(QUEUE.try_dequeue().is_some_and(|e| e.is_press_of(Button::A)));
//! ```

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

pub mod capture;
pub mod config;
pub mod event;
pub mod mask;
pub mod queue;

pub use capture::{DebounceTable, InputCapture, RepeatTracker};
pub use config::CaptureConfig;
pub use event::Event;
pub use mask::EventMask;
pub use queue::{EventQueue, MaskGuard};
