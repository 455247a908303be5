//! Pocketwatch handheld firmware
//!
//! Wires the core crates (`input`, `sound`, `power`) into one runtime
//! context and provides the STM32H743 board support.
//!
//! # Architecture
//!
//! ```text
//! Application Layer (main.rs, apps)
//!         ↓
//! Runtime context (runtime module)
//!         ↓
//! Core services (input, sound, power crates)
//!         ↓
//! Board support (hardware module) / host mocks
//! ```
//!
//! # Features
//!
//! - `hardware` - Build for STM32H7 target (embassy, defmt)
//! - `tracing` - Host logging through `tracing`
//! - `std` - Enable standard library (host mocks)
//!
//! # Examples
//!
//! ## Hardware Target
//!
//! ```bash
//! cargo build --release --target thumbv7em-none-eabihf --features hardware
//! ```

#![cfg_attr(all(not(test), not(feature = "std")), no_std)]
// Upgrade relevant warns to deny; keep pedantic as warn (too noisy for firmware)
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Critical correctness: deny these
#![deny(clippy::await_holding_lock)] // holding a blocking Mutex across .await is a bug
#![deny(unsafe_op_in_unsafe_fn)]
// unsafe fn body is not implicitly unsafe block
// Logging discipline (allow println in tests via clippy.toml)
#![warn(clippy::print_stdout)] // prefer tracing/defmt over println! in lib code
#![warn(clippy::dbg_macro)] // dbg! should not be left in committed code
// Intentional allows for this codebase:
#![allow(clippy::module_name_repetitions)] // common in Rust crates; not a real issue
#![allow(clippy::missing_errors_doc)] // most errors are self-explanatory
// Pedantic lints too noisy for firmware application code:
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::doc_markdown)]
#![allow(async_fn_in_trait)]

#[macro_use]
mod fmt;

pub mod alarm;
pub mod board;
pub mod boot;
pub mod calendar;
pub mod display;
pub mod runtime;

#[cfg(feature = "hardware")]
pub mod hardware;

pub use alarm::AlarmSlot;
pub use board::Board;
pub use boot::BootKind;
pub use display::{Ssd1306, StatusScreen};
pub use runtime::{Parts, Runtime, Services};
