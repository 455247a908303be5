//! Boot sequence for the Pocketwatch handheld.
//!
//! Initialization order (order matters for correctness):
//!   1. Read the wake cause (PWR standby flag, RTC wakeup flag, WKUP pin flag)
//!   2. Configure clocks (HSI → PLL1 400 MHz, LSI → RTC)
//!   3. Start the Embassy executor and spawn the button, ticker and sound tasks
//!   4. Load retained state and take the first-boot or resume path
//!
//! The wake flags must be sampled before anything clears them; step 4 must
//! run before the main loop reads the first event, otherwise timestamps are
//! not yet bridged across the sleep.

use platform::WakeCause;

/// Ordered list of boot sequence steps for documentation and testing.
///
/// Tests assert that the wake cause is read before the clock tree and the
/// executor are brought up, and that the boot path runs last.
pub const BOOT_SEQUENCE_STEPS: &[&str] = &[
    "1. Wake cause: sample PWR SBF / WKUPF and RTC WUTF before they are cleared",
    "2. RCC: HSI → PLL1 400 MHz system clock, LSI for the RTC domain",
    "3. Embassy executor: spawn button, ticker and sound tasks",
    "4. Boot path: load retained state, first boot or resume",
];

/// Which path [`Runtime::boot`](crate::Runtime::boot) took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BootKind {
    /// Power was applied: clock offset reset, boot jingle.
    FirstBoot,
    /// Woken from deep sleep: clock bridged, scheduler resumed.
    Resume,
}

impl BootKind {
    /// Boot path for the cause the platform reports at reset.
    ///
    /// Anything other than a fresh power-on came out of deep sleep, including
    /// [`WakeCause::Unknown`]; the retained record decides whether the clock
    /// can actually be bridged.
    pub const fn from_wake(cause: WakeCause) -> Self {
        match cause {
            WakeCause::PowerOn => BootKind::FirstBoot,
            WakeCause::Gpio | WakeCause::Timer | WakeCause::Unknown => BootKind::Resume,
        }
    }

    /// Short display name for log lines.
    pub const fn name(self) -> &'static str {
        match self {
            BootKind::FirstBoot => "first-boot",
            BootKind::Resume => "resume",
        }
    }
}

/// Build the Embassy STM32 configuration for the handheld.
///
/// The RTC runs from LSI so it keeps counting in standby; it provides both
/// the deep-sleep timer wake and the clock bridge across sleeps.
#[cfg(feature = "hardware")]
pub fn build_embassy_config() -> embassy_stm32::Config {
    use embassy_stm32::rcc::*;

    let mut config = embassy_stm32::Config::default();

    // ── Oscillators ─────────────────────────────────────────────────────────
    // HSI: 64 MHz internal oscillator (no prescaler)
    config.rcc.hsi = Some(HSIPrescaler::DIV1);
    config.rcc.csi = true;
    // LSI: ~32 kHz, RTC domain clock (survives standby)
    config.rcc.ls = LsConfig::default_lsi();

    // ── PLL1: system clock ──────────────────────────────────────────────────
    // HSI (64 MHz) / prediv(4) = 16 MHz → × mul(50) = 800 MHz VCO
    // PLL1_P = VCO / divp(2) = 400 MHz → system clock
    // PLL1_Q = VCO / divq(8) = 100 MHz → I2C / TIM kernel clocks
    config.rcc.pll1 = Some(Pll {
        source: PllSource::HSI,
        prediv: PllPreDiv::DIV4,
        mul: PllMul::MUL50,
        divp: Some(PllDiv::DIV2),
        divq: Some(PllDiv::DIV8),
        divr: None,
    });

    // ── System clock + bus prescalers ────────────────────────────────────────
    config.rcc.sys = Sysclk::PLL1_P; // 400 MHz
    config.rcc.ahb_pre = AHBPrescaler::DIV2; // 200 MHz
    config.rcc.apb1_pre = APBPrescaler::DIV2; // 100 MHz
    config.rcc.apb2_pre = APBPrescaler::DIV2; // 100 MHz
    config.rcc.apb3_pre = APBPrescaler::DIV2; // 100 MHz
    config.rcc.apb4_pre = APBPrescaler::DIV2; // 100 MHz
    config.rcc.voltage_scale = VoltageScale::Scale1;

    config
}

#[cfg(test)]
#[allow(clippy::arithmetic_side_effects)]
mod tests {
    use super::*;

    fn position(needle: &str) -> Option<usize> {
        BOOT_SEQUENCE_STEPS.iter().position(|s| s.contains(needle))
    }

    #[test]
    fn power_on_is_the_only_first_boot() {
        assert_eq!(BootKind::from_wake(WakeCause::PowerOn), BootKind::FirstBoot);
        for cause in [WakeCause::Gpio, WakeCause::Timer, WakeCause::Unknown] {
            assert_eq!(BootKind::from_wake(cause), BootKind::Resume, "{}", cause.name());
        }
    }

    #[test]
    fn wake_cause_is_read_before_clock_and_executor() {
        let wake = position("Wake cause").unwrap_or(usize::MAX);
        let rcc = position("RCC").unwrap_or(usize::MAX);
        let executor = position("executor").unwrap_or(usize::MAX);
        assert!(wake < rcc, "wake flags must be sampled before RCC setup");
        assert!(rcc < executor);
    }

    #[test]
    fn boot_path_runs_last() {
        assert_eq!(position("Boot path"), Some(BOOT_SEQUENCE_STEPS.len() - 1));
    }
}
