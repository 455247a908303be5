//! Piezo on TIM3 CH1.

use embassy_stm32::peripherals::TIM3;
use embassy_stm32::time::Hertz;
use embassy_stm32::timer::simple_pwm::SimplePwm;
use embassy_stm32::timer::Channel;
use platform::ToneOutput;

/// Square wave at 50 % duty.
pub struct PwmBuzzer {
    pwm: SimplePwm<'static, TIM3>,
}

impl PwmBuzzer {
    /// Buzzer on an already configured PWM timer, initially silent.
    pub fn new(mut pwm: SimplePwm<'static, TIM3>) -> Self {
        pwm.disable(Channel::Ch1);
        Self { pwm }
    }
}

impl ToneOutput for PwmBuzzer {
    fn tone(&mut self, hz: u16) {
        if hz == 0 {
            self.silence();
            return;
        }
        self.pwm.set_frequency(Hertz(u32::from(hz)));
        let half = self.pwm.get_max_duty() / 2;
        self.pwm.set_duty(Channel::Ch1, half);
        self.pwm.enable(Channel::Ch1);
    }

    fn silence(&mut self) {
        self.pwm.disable(Channel::Ch1);
    }
}
