//! Button lines.
//!
//! Each line gets its own EXTI loop that forwards both edges to
//! [`CAPTURE`](super::CAPTURE). Debouncing, masking and repeat all happen
//! there; this module only reads pins.

use embassy_futures::join::join_array;
use embassy_stm32::exti::ExtiInput;
use embassy_stm32::gpio::AnyPin;
use embassy_stm32::pac;
use embassy_stm32::pac::gpio::vals::Idr;
use platform::{Button, ButtonLevels, BUTTON_COUNT};

use super::{BUTTON_WAKE, CAPTURE, TIME};

/// Live levels straight from the GPIO input data registers.
///
/// Reading IDR needs no ownership of the pins, so this is usable from any
/// loop while the `ExtiInput`s own the EXTI lines.
pub struct GpioLevels;

impl GpioLevels {
    fn line(button: Button) -> (pac::gpio::Gpio, usize) {
        match button {
            Button::A => (pac::GPIOA, 0),
            Button::B => (pac::GPIOA, 1),
            Button::Up => (pac::GPIOA, 2),
            Button::Down => (pac::GPIOA, 3),
            Button::Left => (pac::GPIOD, 4),
            Button::Right => (pac::GPIOD, 5),
        }
    }
}

impl ButtonLevels for GpioLevels {
    fn is_pressed(&self, button: Button) -> bool {
        let (port, pin) = Self::line(button);
        port.idr().read().idr(pin) == Idr::LOW
    }
}

/// Watch every button forever. `pins` are in [`Button::index`] order.
pub async fn watch(mut pins: [ExtiInput<'static, AnyPin>; BUTTON_COUNT]) {
    let [a, b, up, down, left, right] = &mut pins;
    join_array([
        edge_loop(a, Button::A),
        edge_loop(b, Button::B),
        edge_loop(up, Button::Up),
        edge_loop(down, Button::Down),
        edge_loop(left, Button::Left),
        edge_loop(right, Button::Right),
    ])
    .await;
}

async fn edge_loop(pin: &mut ExtiInput<'static, AnyPin>, button: Button) {
    loop {
        pin.wait_for_any_edge().await;
        if pin.is_low() {
            BUTTON_WAKE.signal(button);
        }
        if let Some(event) = CAPTURE.on_edge(button, &GpioLevels, TIME.now_us()) {
            trace!("edge: {} {}", button.name(), event.name());
        }
    }
}
