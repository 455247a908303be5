//! "Going to sleep" screen.

// Coordinates are a few dozen pixels on a small panel; offsets cannot overflow i32.
#![allow(clippy::arithmetic_side_effects)]

use core::fmt::Write;

use embedded_graphics::mono_font::{ascii::FONT_6X10, MonoTextStyle};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Alignment, Baseline, Text, TextStyleBuilder};
use platform::Button;

/// Title line.
pub const SLEEP_TITLE: &str = "Sleeping...";

/// Shown just before the panel is switched off for the grace period.
pub struct SleepScreen;

impl SleepScreen {
    /// Clear `display` and draw the title plus a wake hint naming
    /// `wake_button`, both centred.
    ///
    /// # Errors
    ///
    /// Returns `D::Error` if any drawing operation fails.
    pub fn render<D>(display: &mut D, wake_button: Button) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = BinaryColor>,
    {
        display.clear(BinaryColor::Off)?;

        let character = MonoTextStyle::new(&FONT_6X10, BinaryColor::On);
        let centred = TextStyleBuilder::new()
            .alignment(Alignment::Center)
            .baseline(Baseline::Middle)
            .build();

        let center = display.bounding_box().center();
        let line = i32::try_from(FONT_6X10.character_size.height).unwrap_or(10);

        Text::with_text_style(
            SLEEP_TITLE,
            center - Point::new(0, line),
            character,
            centred,
        )
        .draw(display)?;

        let mut hint: heapless::String<24> = heapless::String::new();
        // "Press RIGHT to wake" is the longest and fits.
        let _ = write!(hint, "Press {} to wake", wake_button.name());
        Text::with_text_style(&hint, center + Point::new(0, line), character, centred)
            .draw(display)?;

        Ok(())
    }
}
