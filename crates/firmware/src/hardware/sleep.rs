//! Light sleep (executor idle) and deep sleep (standby).
//!
//! Light sleep parks the main task until the armed button edge or the grace
//! timer; with nothing else runnable the executor drops the core into WFE.
//! Deep sleep is STM32 standby: only the backup domain, the RTC wakeup timer
//! and the WKUP1 pin (PA0, button A) stay alive, and wake-up is a reset.

use embassy_futures::select::{select, Either};
use embassy_stm32::pac;
use embassy_time::{Duration, Timer};
use platform::{Button, PowerError, SleepController, WakeCause};

use super::BUTTON_WAKE;

/// RTC wakeup counter is 16 bits of 1 Hz ck_spre ticks.
const MAX_RTC_WAKE_S: u64 = 0x1_0000;

/// WKUP1 is the only deep-sleep-capable button line.
const DEEP_WAKE_BUTTON: Button = Button::A;

/// [`SleepController`] for the STM32H743.
pub struct StopStandby {
    cause: WakeCause,
    gpio: Option<Button>,
    timer_us: Option<u64>,
}

impl StopStandby {
    /// Sample and clear the reset flags. Must run before anything else
    /// touches PWR or the RTC wakeup flag.
    pub fn capture_wake_cause() -> Self {
        let pwr = pac::PWR;
        let from_standby = pwr.cpucr().read().sbf();
        let pin = pwr.wkupfr().read().wkupf(0);
        let rtc = pac::RTC.isr().read().wutf();

        let cause = match (from_standby, pin, rtc) {
            (false, _, _) => WakeCause::PowerOn,
            (true, true, _) => WakeCause::Gpio,
            (true, false, true) => WakeCause::Timer,
            (true, false, false) => WakeCause::Unknown,
        };

        pwr.cpucr().modify(|w| w.set_cssf(true));
        pwr.wkupcr().write(|w| w.set_wkupc(0, true));
        Self::unlock_rtc();
        pac::RTC.isr().modify(|w| w.set_wutf(false));
        pac::RTC.wpr().write(|w| w.set_key(0xFF));

        Self {
            cause,
            gpio: None,
            timer_us: None,
        }
    }

    fn unlock_rtc() {
        pac::PWR.cr1().modify(|w| w.set_dbp(true));
        pac::RTC.wpr().write(|w| w.set_key(0xCA));
        pac::RTC.wpr().write(|w| w.set_key(0x53));
    }

    fn arm_rtc_wakeup(seconds: u16) {
        let rtc = pac::RTC;
        Self::unlock_rtc();
        rtc.cr().modify(|w| w.set_wute(false));
        while !rtc.isr().read().wutwf() {}
        rtc.wutr().write(|w| w.set_wut(seconds));
        rtc.cr().modify(|w| {
            // ck_spre (1 Hz)
            w.set_wucksel(pac::rtc::vals::Wucksel::CLOCKSPARE);
            w.set_wutie(true);
            w.set_wute(true);
        });
        rtc.wpr().write(|w| w.set_key(0xFF));
    }

    fn disarm_rtc_wakeup() {
        Self::unlock_rtc();
        pac::RTC.cr().modify(|w| {
            w.set_wutie(false);
            w.set_wute(false);
        });
        pac::RTC.wpr().write(|w| w.set_key(0xFF));
    }
}

impl SleepController for StopStandby {
    fn wake_cause(&self) -> WakeCause {
        self.cause
    }

    fn arm_gpio_wake(&mut self, button: Button) -> Result<(), PowerError> {
        if button != DEEP_WAKE_BUTTON {
            return Err(PowerError::WakeSourceUnavailable);
        }
        self.gpio = Some(button);
        Ok(())
    }

    fn arm_timer_wake(&mut self, after_us: u64) -> Result<u64, PowerError> {
        // Beyond the counter range the device wakes early and the next
        // sleep attempt re-arms for the remainder.
        let armed = after_us.min(MAX_RTC_WAKE_S.saturating_mul(1_000_000));
        if armed < after_us {
            debug!("power: timer wake clamped to {} s", MAX_RTC_WAKE_S);
        }
        self.timer_us = Some(armed);
        Ok(armed)
    }

    fn disarm_wakes(&mut self) {
        self.gpio = None;
        self.timer_us = None;
        Self::disarm_rtc_wakeup();
    }

    async fn light_sleep(&mut self) -> WakeCause {
        let Some(button) = self.gpio else {
            return match self.timer_us {
                Some(us) => {
                    Timer::after(Duration::from_micros(us)).await;
                    WakeCause::Timer
                }
                None => WakeCause::Unknown,
            };
        };
        BUTTON_WAKE.reset();
        let pressed = async {
            while BUTTON_WAKE.wait().await != button {}
        };
        let timer = async {
            match self.timer_us {
                Some(us) => Timer::after(Duration::from_micros(us)).await,
                None => core::future::pending::<()>().await,
            }
        };
        match select(pressed, timer).await {
            Either::First(()) => WakeCause::Gpio,
            Either::Second(()) => WakeCause::Timer,
        }
    }

    fn deep_sleep(&mut self) {
        let pwr = pac::PWR;

        if let Some(us) = self.timer_us {
            // Whole seconds, rounded up, at least one.
            let seconds = us.div_ceil(1_000_000).clamp(1, MAX_RTC_WAKE_S);
            // WUT counts to zero inclusive: N+1 ticks.
            Self::arm_rtc_wakeup(u16::try_from(seconds.saturating_sub(1)).unwrap_or(u16::MAX));
        }

        if self.gpio.is_some() {
            pwr.wkupepr().modify(|w| {
                w.set_wkupen(0, true);
                // falling edge (active-low), pull-up
                w.set_wkupp(0, true);
                w.set_wkuppupd(0, pac::pwr::vals::Wkuppupd::PULLUP);
            });
        }
        pwr.wkupcr().write(|w| w.set_wkupc(0, true));

        pwr.cpucr().modify(|w| {
            w.set_pdds_d1(true);
            w.set_pdds_d2(true);
            w.set_pdds_d3(true);
        });

        info!("power: entering standby");
        // SAFETY: standby is entered with interrupts irrelevant; the core
        // resets on wake and nothing after WFI runs.
        let mut core = unsafe { cortex_m::Peripherals::steal() };
        core.SCB.set_sleepdeep();
        loop {
            cortex_m::asm::dsb();
            cortex_m::asm::wfi();
        }
    }
}
