//! Sleep panel abstraction
//!
//! The core never owns display content. It only needs a monochrome surface it
//! can paint the "going to sleep" screen onto, push to glass, and switch off
//! and back on around a sleep attempt.

use embedded_graphics::{pixelcolor::BinaryColor, prelude::*};

/// Monochrome panel used by the sleep cycle.
pub trait SleepPanel: DrawTarget<Color = BinaryColor> {
    /// Push the drawn frame to the panel.
    fn flush(&mut self) -> impl core::future::Future<Output = Result<(), DisplayError>>;

    /// Turn the panel on (contents retained by the controller).
    fn power_on(&mut self) -> impl core::future::Future<Output = Result<(), DisplayError>>;

    /// Turn the panel off.
    fn power_off(&mut self) -> impl core::future::Future<Output = Result<(), DisplayError>>;
}

/// Display errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror_no_std::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisplayError {
    /// Bus transfer failed
    #[error("display bus communication failed")]
    Communication,
    /// Controller reported busy
    #[error("display controller busy")]
    Busy,
    /// Operation needs the panel powered on
    #[error("display is powered off")]
    PoweredOff,
}

impl DisplayError {
    /// Short display name for log lines.
    pub const fn name(self) -> &'static str {
        match self {
            DisplayError::Communication => "communication",
            DisplayError::Busy => "busy",
            DisplayError::PoweredOff => "powered-off",
        }
    }
}
