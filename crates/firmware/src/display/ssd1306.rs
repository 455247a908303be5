//! SSD1306 128×64 OLED driver (async I²C, buffered)
//!
//! # Wiring (STM32H743ZI)
//!
//! | Signal | STM32 pin        |
//! |--------|------------------|
//! | SCL    | PB8 (I2C1_SCL)   |
//! | SDA    | PB9 (I2C1_SDA)   |
//!
//! # Memory layout
//!
//! The 1bpp framebuffer mirrors controller GDDRAM in horizontal addressing
//! mode: eight pages of 128 column bytes, bit 0 of each byte the top row of
//! the page. `draw_iter` only touches the buffer; [`SleepPanel::flush`]
//! pushes all eight pages.

// Coordinates are bounds-checked against 128×64 before use, so the index
// arithmetic and the i32→usize casts cannot overflow or lose data.
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::arithmetic_side_effects,
)]

use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_hal_async::i2c::I2c;
use platform::{DisplayError, SleepPanel};

/// Panel width in pixels.
pub const WIDTH: u32 = 128;
/// Panel height in pixels.
pub const HEIGHT: u32 = 64;
/// Number of 8-row pages.
pub const PAGES: usize = HEIGHT as usize / 8;
/// Framebuffer size in bytes.
pub const BUFFER_SIZE: usize = WIDTH as usize * PAGES;

/// Default 7-bit I²C address (SA0 low).
pub const DEFAULT_ADDRESS: u8 = 0x3C;

/// Control byte: the rest of the transfer is commands.
const CONTROL_COMMANDS: u8 = 0x00;
/// Control byte: the rest of the transfer is GDDRAM data.
const CONTROL_DATA: u8 = 0x40;

// ---------------------------------------------------------------------------
// Command enum
// ---------------------------------------------------------------------------

/// SSD1306 command codes used by this driver.
#[repr(u8)]
#[derive(Debug, Clone, Copy)]
pub enum Command {
    /// Memory addressing mode: 1 argument.
    AddressingMode = 0x20,
    /// Column address range: 2 arguments.
    ColumnRange = 0x21,
    /// Page address range: 2 arguments.
    PageRange = 0x22,
    /// Display start line 0.
    StartLine = 0x40,
    /// Contrast: 1 argument.
    Contrast = 0x81,
    /// Charge pump: 1 argument (0x14 on, 0x10 off).
    ChargePump = 0x8D,
    /// Segment remap (column 127 → SEG0).
    SegmentRemap = 0xA1,
    /// Display follows RAM.
    ResumeRam = 0xA4,
    /// Non-inverted display.
    Normal = 0xA6,
    /// Multiplex ratio: 1 argument.
    Multiplex = 0xA8,
    /// Panel off (sleep).
    DisplayOff = 0xAE,
    /// Panel on.
    DisplayOn = 0xAF,
    /// COM scan direction remapped.
    ComScanDec = 0xC8,
    /// Display offset: 1 argument.
    DisplayOffset = 0xD3,
    /// Clock divide / oscillator: 1 argument.
    ClockDiv = 0xD5,
    /// Pre-charge period: 1 argument.
    Precharge = 0xD9,
    /// COM pin configuration: 1 argument.
    ComPins = 0xDA,
    /// VCOMH deselect level: 1 argument.
    VcomDetect = 0xDB,
}

/// Power-up sequence for a 128×64 panel on the internal charge pump.
const INIT_SEQUENCE: [u8; 25] = [
    Command::DisplayOff as u8,
    Command::ClockDiv as u8, 0x80,
    Command::Multiplex as u8, 0x3F,
    Command::DisplayOffset as u8, 0x00,
    Command::StartLine as u8,
    Command::ChargePump as u8, 0x14,
    Command::AddressingMode as u8, 0x00, // horizontal
    Command::SegmentRemap as u8,
    Command::ComScanDec as u8,
    Command::ComPins as u8, 0x12,
    Command::Contrast as u8, 0xCF,
    Command::Precharge as u8, 0xF1,
    Command::VcomDetect as u8, 0x40,
    Command::ResumeRam as u8,
    Command::Normal as u8,
    Command::DisplayOn as u8,
];

// ---------------------------------------------------------------------------
// Driver struct
// ---------------------------------------------------------------------------

/// SSD1306 driver over any async [`I2c`] bus.
pub struct Ssd1306<I2C> {
    i2c: I2C,
    address: u8,
    powered: bool,
    framebuffer: [u8; BUFFER_SIZE],
}

impl<I2C: I2c> Ssd1306<I2C> {
    /// Driver at `address`. The panel is assumed off until [`init`] runs.
    ///
    /// [`init`]: Ssd1306::init
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self {
            i2c,
            address,
            powered: false,
            framebuffer: [0; BUFFER_SIZE],
        }
    }

    /// Send the power-up sequence and switch the panel on.
    pub async fn init(&mut self) -> Result<(), DisplayError> {
        let mut transfer = [CONTROL_COMMANDS; INIT_SEQUENCE.len() + 1];
        if let Some(body) = transfer.get_mut(1..) {
            body.copy_from_slice(&INIT_SEQUENCE);
        }
        self.write(&transfer).await?;
        self.powered = true;
        Ok(())
    }

    /// Raw framebuffer, page-major.
    pub fn framebuffer(&self) -> &[u8; BUFFER_SIZE] {
        &self.framebuffer
    }

    /// Give the bus back.
    pub fn release(self) -> I2C {
        self.i2c
    }

    async fn commands(&mut self, bytes: &[u8]) -> Result<(), DisplayError> {
        let mut transfer = [CONTROL_COMMANDS; 8];
        let len = bytes.len() + 1;
        let body = transfer
            .get_mut(1..len)
            .ok_or(DisplayError::Communication)?;
        body.copy_from_slice(bytes);
        let transfer = transfer.get(..len).ok_or(DisplayError::Communication)?;
        self.write(transfer).await
    }

    async fn write(&mut self, bytes: &[u8]) -> Result<(), DisplayError> {
        self.i2c
            .write(self.address, bytes)
            .await
            .map_err(|_| DisplayError::Communication)
    }
}

impl<I2C> OriginDimensions for Ssd1306<I2C> {
    fn size(&self) -> Size {
        Size::new(WIDTH, HEIGHT)
    }
}

impl<I2C> DrawTarget for Ssd1306<I2C> {
    type Color = BinaryColor;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if point.x < 0 || point.y < 0 || point.x >= WIDTH as i32 || point.y >= HEIGHT as i32 {
                continue;
            }
            let (x, y) = (point.x as usize, point.y as usize);
            let bit = 1u8 << (y % 8);
            if let Some(byte) = self.framebuffer.get_mut((y / 8) * WIDTH as usize + x) {
                if color.is_on() {
                    *byte |= bit;
                } else {
                    *byte &= !bit;
                }
            }
        }
        Ok(())
    }
}

impl<I2C: I2c> SleepPanel for Ssd1306<I2C> {
    async fn flush(&mut self) -> Result<(), DisplayError> {
        if !self.powered {
            return Err(DisplayError::PoweredOff);
        }
        self.commands(&[
            Command::ColumnRange as u8,
            0,
            (WIDTH - 1) as u8,
            Command::PageRange as u8,
            0,
            (PAGES - 1) as u8,
        ])
        .await?;

        let mut transfer = [CONTROL_DATA; WIDTH as usize + 1];
        for page in 0..PAGES {
            let start = page * WIDTH as usize;
            let src = self
                .framebuffer
                .get(start..start + WIDTH as usize)
                .ok_or(DisplayError::Communication)?;
            if let Some(dst) = transfer.get_mut(1..) {
                dst.copy_from_slice(src);
            }
            self.write(&transfer).await?;
        }
        Ok(())
    }

    async fn power_on(&mut self) -> Result<(), DisplayError> {
        self.commands(&[Command::ChargePump as u8, 0x14, Command::DisplayOn as u8])
            .await?;
        self.powered = true;
        Ok(())
    }

    async fn power_off(&mut self) -> Result<(), DisplayError> {
        self.commands(&[Command::DisplayOff as u8, Command::ChargePump as u8, 0x10])
            .await?;
        self.powered = false;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction};

    const ADDR: u8 = DEFAULT_ADDRESS;

    fn command_write(bytes: &[u8]) -> Transaction {
        let mut v = vec![CONTROL_COMMANDS];
        v.extend_from_slice(bytes);
        Transaction::write(ADDR, v)
    }

    fn init_write() -> Transaction {
        command_write(&INIT_SEQUENCE)
    }

    fn page_writes(buffer: &[u8; BUFFER_SIZE]) -> Vec<Transaction> {
        let mut txns = vec![command_write(&[0x21, 0, 127, 0x22, 0, 7])];
        for page in buffer.chunks(WIDTH as usize) {
            let mut v = vec![CONTROL_DATA];
            v.extend_from_slice(page);
            txns.push(Transaction::write(ADDR, v));
        }
        txns
    }

    #[tokio::test]
    async fn init_sends_sequence_in_one_transfer() {
        let mock = I2cMock::new(&[init_write()]);
        let mut panel = Ssd1306::new(mock, ADDR);
        panel.init().await.unwrap();
        panel.release().done();
    }

    #[test]
    fn pixels_land_in_page_bits() {
        let panel_bus = I2cMock::new(&[]);
        let mut panel = Ssd1306::new(panel_bus, ADDR);
        Pixel(Point::new(3, 0), BinaryColor::On).draw(&mut panel).unwrap();
        Pixel(Point::new(3, 9), BinaryColor::On).draw(&mut panel).unwrap();
        Pixel(Point::new(127, 63), BinaryColor::On).draw(&mut panel).unwrap();
        // Off-panel pixels are dropped.
        Pixel(Point::new(128, 0), BinaryColor::On).draw(&mut panel).unwrap();
        Pixel(Point::new(-1, 5), BinaryColor::On).draw(&mut panel).unwrap();

        let fb = panel.framebuffer();
        assert_eq!(fb[3], 0b0000_0001);
        assert_eq!(fb[128 + 3], 0b0000_0010);
        assert_eq!(fb[BUFFER_SIZE - 1], 0b1000_0000);
        assert_eq!(fb.iter().map(|b| b.count_ones()).sum::<u32>(), 3);

        Pixel(Point::new(3, 0), BinaryColor::Off).draw(&mut panel).unwrap();
        assert_eq!(panel.framebuffer()[3], 0);
        panel.release().done();
    }

    #[tokio::test]
    async fn flush_pushes_all_pages() {
        let mut expected = [0u8; BUFFER_SIZE];
        expected[..WIDTH as usize].fill(0x0F);

        let mut txns = vec![init_write()];
        txns.extend(page_writes(&expected));
        let mut panel = Ssd1306::new(I2cMock::new(&txns), ADDR);
        panel.init().await.unwrap();

        Rectangle::new(Point::zero(), Size::new(WIDTH, 4))
            .into_styled(PrimitiveStyle::with_fill(BinaryColor::On))
            .draw(&mut panel)
            .unwrap();
        panel.flush().await.unwrap();
        panel.release().done();
    }

    #[tokio::test]
    async fn flush_while_off_is_rejected_without_bus_traffic() {
        let mut panel = Ssd1306::new(I2cMock::new(&[]), ADDR);
        assert_eq!(panel.flush().await, Err(DisplayError::PoweredOff));
        panel.release().done();
    }

    #[tokio::test]
    async fn power_cycle_commands() {
        let txns = [
            init_write(),
            command_write(&[0xAE, 0x8D, 0x10]),
            command_write(&[0x8D, 0x14, 0xAF]),
        ];
        let mut panel = Ssd1306::new(I2cMock::new(&txns), ADDR);
        panel.init().await.unwrap();
        panel.power_off().await.unwrap();
        assert_eq!(panel.flush().await, Err(DisplayError::PoweredOff));
        panel.power_on().await.unwrap();
        panel.release().done();
    }

    #[tokio::test]
    async fn bus_error_maps_to_communication() {
        use embedded_hal_async::i2c::ErrorKind;

        let txns = [init_write().with_error(ErrorKind::Other)];
        let mut panel = Ssd1306::new(I2cMock::new(&txns), ADDR);
        assert_eq!(panel.init().await, Err(DisplayError::Communication));
        panel.release().done();
    }
}
