//! Display for the Pocketwatch handheld
//!
//! A 128×64 SSD1306 OLED on I2C1. The core only borrows it for the sleep
//! screen; between sleeps the main loop draws [`StatusScreen`] whenever the
//! runtime asks for a redraw.

pub mod ssd1306;

pub use ssd1306::{Ssd1306, DEFAULT_ADDRESS};

use core::fmt::Write;

use embedded_graphics::mono_font::{ascii::FONT_6X10, MonoTextStyle};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Baseline, Text};

/// Device name shown in the status header.
pub const DEVICE_NAME: &str = "Pocketwatch";

/// `HH:MM:SS` of `us` microseconds, hours wrapping at 100.
pub fn format_uptime(us: u64) -> heapless::String<8> {
    let secs = us / 1_000_000;
    let mut out = heapless::String::new();
    let _ = write!(
        out,
        "{:02}:{:02}:{:02}",
        (secs / 3_600) % 100,
        (secs / 60) % 60,
        secs % 60
    );
    out
}

/// Idle screen: device name and time since first boot.
pub struct StatusScreen;

impl StatusScreen {
    /// Clear `display` and draw the header and uptime.
    ///
    /// # Errors
    ///
    /// Returns `D::Error` if any drawing operation fails.
    pub fn render<D>(display: &mut D, now_us: u64) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = BinaryColor>,
    {
        display.clear(BinaryColor::Off)?;
        let style = MonoTextStyle::new(&FONT_6X10, BinaryColor::On);

        Text::with_baseline(DEVICE_NAME, Point::new(2, 2), style, Baseline::Top).draw(display)?;
        Text::with_baseline(
            &format_uptime(now_us),
            Point::new(2, 20),
            style,
            Baseline::Top,
        )
        .draw(display)?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use platform::mocks::MockPanel;

    #[test]
    fn uptime_format() {
        assert_eq!(format_uptime(0).as_str(), "00:00:00");
        assert_eq!(format_uptime(3_723_000_000).as_str(), "01:02:03");
        assert_eq!(format_uptime(59_999_999).as_str(), "00:00:59");
    }

    #[test]
    fn status_screen_draws_text() {
        let mut panel = MockPanel::new();
        StatusScreen::render(&mut panel, 42_000_000).unwrap();
        assert!(panel.lit_pixels() > 0);
    }
}
