//! Uptime and RTC.
//!
//! Uptime is the Embassy time driver (restarts at every reset). The RTC
//! runs from LSI in the backup domain and keeps counting through standby,
//! which is what lets the timebase be bridged across a deep sleep.

// BCD nibbles are at most 9 and the year offset at most 99.
#![allow(clippy::arithmetic_side_effects)]

use embassy_stm32::pac;
use embassy_time::Instant;
use platform::Clock;

use crate::calendar::{from_bcd, CalendarTime};

/// RTC write-protection unlock keys.
const WPR_KEYS: [u8; 2] = [0xCA, 0x53];

/// Embassy uptime plus the STM32 RTC calendar.
pub struct RtcClock;

impl RtcClock {
    /// Start the calendar at 2000-01-01 00:00:00 unless it already runs.
    ///
    /// Called once after `embassy_stm32::init`, which enables the RTC
    /// kernel clock. A running calendar (resume from standby) is left alone.
    pub fn ensure_running() {
        let rtc = pac::RTC;
        if rtc.isr().read().inits() {
            return;
        }
        pac::PWR.cr1().modify(|w| w.set_dbp(true));
        for key in WPR_KEYS {
            rtc.wpr().write(|w| w.set_key(key));
        }
        rtc.isr().modify(|w| w.set_init(true));
        while !rtc.isr().read().initf() {}
        // LSI ≈ 32 kHz: async 128 × sync 250 → 1 Hz ck_spre.
        rtc.prer().write(|w| {
            w.set_prediv_a(127);
            w.set_prediv_s(249);
        });
        rtc.tr().write(|_| {});
        rtc.dr().write(|w| {
            w.set_mu(1);
            w.set_du(1);
        });
        rtc.isr().modify(|w| w.set_init(false));
        rtc.wpr().write(|w| w.set_key(0xFF));
    }

    fn calendar() -> Option<CalendarTime> {
        let rtc = pac::RTC;
        if !rtc.isr().read().inits() {
            return None;
        }
        // Reading TR locks DR until DR is read.
        let tr = rtc.tr().read();
        let dr = rtc.dr().read();
        CalendarTime::new(
            2000 + u16::from(from_bcd((dr.yt() << 4) | dr.yu())),
            from_bcd((u8::from(dr.mt()) << 4) | dr.mu()),
            from_bcd((dr.dt() << 4) | dr.du()),
            from_bcd((tr.ht() << 4) | tr.hu()),
            from_bcd((tr.mnt() << 4) | tr.mnu()),
            from_bcd((tr.st() << 4) | tr.su()),
        )
    }
}

impl Clock for RtcClock {
    fn uptime_us(&self) -> u64 {
        Instant::now().as_micros()
    }

    fn rtc_us(&self) -> Option<u64> {
        Self::calendar().map(|t| t.micros_since_epoch())
    }
}
