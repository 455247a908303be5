//! STM32H743ZI board support.
//!
//! # Pin assignments
//!
//! | Signal       | MCU pin | Notes                                  |
//! |--------------|---------|----------------------------------------|
//! | Button A     | PA0     | Active-low, pull-up, WKUP1 (deep wake) |
//! | Button B     | PA1     | Active-low, pull-up                    |
//! | Up           | PA2     | Active-low, pull-up                    |
//! | Down         | PA3     | Active-low, pull-up                    |
//! | Left         | PD4     | Active-low, pull-up                    |
//! | Right        | PD5     | Active-low, pull-up                    |
//! | Buzzer       | PA6     | TIM3_CH1 PWM                           |
//! | OLED SCL/SDA | PB8/PB9 | I2C1, 400 kHz                          |
//!
//! The core services are statics here because the EXTI loops, the repeat
//! ticker and the main task all reach them.

pub mod buttons;
pub mod buzzer;
pub mod clock;
pub mod retained;
pub mod sleep;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use input::{CaptureConfig, EventQueue, InputCapture};
use platform::Button;
use power::Timekeeper;

use crate::alarm::AlarmSlot;
use crate::board::Board;

pub use buttons::GpioLevels;
pub use buzzer::PwmBuzzer;
pub use clock::RtcClock;
pub use retained::BackupRegisters;
pub use sleep::StopStandby;

/// Event queue fed by the EXTI loops and the repeat ticker.
pub static QUEUE: EventQueue = EventQueue::new();

/// Debounce / repeat front end for [`QUEUE`].
pub static CAPTURE: InputCapture<'static> = InputCapture::new(&QUEUE, CaptureConfig::new());

/// Microseconds since first boot.
pub static TIME: Timekeeper<RtcClock> = Timekeeper::new(RtcClock);

/// Published by the alarm app, read before every sleep.
pub static ALARM: AlarmSlot = AlarmSlot::new();

/// Raised by the EXTI loops on every accepted-or-not press edge; the light
/// sleep waits on it.
pub static BUTTON_WAKE: Signal<CriticalSectionRawMutex, Button> = Signal::new();

/// The handheld.
pub struct Pocketwatch;

impl Board for Pocketwatch {
    type Buzzer = PwmBuzzer;
    type Sleep = StopStandby;
    type Alarm = &'static AlarmSlot;
    type Retained = BackupRegisters;
    type Clock = RtcClock;
}
