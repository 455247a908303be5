//! Piezo buzzer abstraction

/// Single-channel square-wave tone output.
///
/// Exactly one tone plays at a time: calling [`tone`](ToneOutput::tone)
/// while a tone is sounding retunes the output.
pub trait ToneOutput {
    /// Start (or retune to) a square wave at `hz`. `hz == 0` is silence.
    fn tone(&mut self, hz: u16);

    /// Stop any tone.
    fn silence(&mut self);
}

impl<T: ToneOutput + ?Sized> ToneOutput for &mut T {
    fn tone(&mut self, hz: u16) {
        (**self).tone(hz);
    }

    fn silence(&mut self) {
        (**self).silence();
    }
}
