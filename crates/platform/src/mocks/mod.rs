//! Mock implementations for testing
//!
//! This module provides mock implementations of all platform traits
//! for use in unit and integration tests. Mocks that a component takes
//! ownership of share their state through a cloneable handle, so a test can
//! keep one clone and inspect it after handing the other to the component.

#![cfg(any(test, feature = "std"))]

use core::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::vec::Vec;

use embedded_graphics::{pixelcolor::BinaryColor, prelude::*};

use crate::*;

// ── Buttons ─────────────────────────────────────────────────────────────────

/// Mock button lines. Clones share state.
#[derive(Clone, Default)]
pub struct MockButtons {
    held: Rc<Cell<ButtonSet>>,
}

impl MockButtons {
    /// All buttons released.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pull `button` low.
    pub fn press(&self, button: Button) {
        self.held.set(self.held.get().with(button));
    }

    /// Let `button` float high.
    pub fn release(&self, button: Button) {
        self.held.set(self.held.get().without(button));
    }

    /// Replace the whole held set.
    pub fn set(&self, held: ButtonSet) {
        self.held.set(held);
    }
}

impl ButtonLevels for MockButtons {
    fn is_pressed(&self, button: Button) -> bool {
        self.held.get().contains(button)
    }
}

// ── Buzzer ──────────────────────────────────────────────────────────────────

/// A call made on [`MockBuzzer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToneCall {
    /// `tone(hz)`
    Tone(u16),
    /// `silence()`
    Silence,
}

/// Mock buzzer: records every call. Clones share the log.
#[derive(Clone, Default)]
pub struct MockBuzzer {
    calls: Rc<RefCell<Vec<ToneCall>>>,
}

impl MockBuzzer {
    /// Empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call so far.
    pub fn calls(&self) -> Vec<ToneCall> {
        self.calls.borrow().clone()
    }

    /// Frequencies of `tone` calls, in order.
    pub fn tones(&self) -> Vec<u16> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|c| match c {
                ToneCall::Tone(hz) => Some(*hz),
                ToneCall::Silence => None,
            })
            .collect()
    }

    /// The last call, if any.
    pub fn last(&self) -> Option<ToneCall> {
        self.calls.borrow().last().copied()
    }

    /// Forget recorded calls.
    pub fn clear(&self) {
        self.calls.borrow_mut().clear();
    }
}

impl ToneOutput for MockBuzzer {
    fn tone(&mut self, hz: u16) {
        self.calls.borrow_mut().push(ToneCall::Tone(hz));
    }

    fn silence(&mut self) {
        self.calls.borrow_mut().push(ToneCall::Silence);
    }
}

// ── Sleep panel ─────────────────────────────────────────────────────────────

/// Operations recorded by [`MockPanel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelOp {
    /// `flush()`
    Flush,
    /// `power_on()`
    PowerOn,
    /// `power_off()`
    PowerOff,
}

/// Mock 128×64 monochrome panel with an in-memory framebuffer.
pub struct MockPanel {
    frame: Vec<bool>,
    powered: bool,
    ops: Vec<PanelOp>,
    fail_power_off: Option<DisplayError>,
}

impl MockPanel {
    /// Panel width in pixels.
    pub const WIDTH: u32 = 128;
    /// Panel height in pixels.
    pub const HEIGHT: u32 = 64;

    /// Powered-on, blank panel.
    pub fn new() -> Self {
        Self {
            frame: std::vec![false; (Self::WIDTH * Self::HEIGHT) as usize],
            powered: true,
            ops: Vec::new(),
            fail_power_off: None,
        }
    }

    /// Make the next `power_off` fail with `err`.
    pub fn fail_power_off(&mut self, err: DisplayError) {
        self.fail_power_off = Some(err);
    }

    /// Whether the panel is on.
    pub fn is_powered(&self) -> bool {
        self.powered
    }

    /// Recorded operations, in order.
    pub fn ops(&self) -> &[PanelOp] {
        &self.ops
    }

    /// Number of lit pixels in the framebuffer.
    pub fn lit_pixels(&self) -> usize {
        self.frame.iter().filter(|p| **p).count()
    }
}

impl Default for MockPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl DrawTarget for MockPanel {
    type Color = BinaryColor;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            let (Ok(x), Ok(y)) = (u32::try_from(point.x), u32::try_from(point.y)) else {
                continue;
            };
            if x < Self::WIDTH && y < Self::HEIGHT {
                if let Some(px) = self.frame.get_mut((y * Self::WIDTH + x) as usize) {
                    *px = color.is_on();
                }
            }
        }
        Ok(())
    }
}

impl OriginDimensions for MockPanel {
    fn size(&self) -> Size {
        Size::new(Self::WIDTH, Self::HEIGHT)
    }
}

impl SleepPanel for MockPanel {
    async fn flush(&mut self) -> Result<(), DisplayError> {
        if !self.powered {
            return Err(DisplayError::PoweredOff);
        }
        self.ops.push(PanelOp::Flush);
        Ok(())
    }

    async fn power_on(&mut self) -> Result<(), DisplayError> {
        self.powered = true;
        self.ops.push(PanelOp::PowerOn);
        Ok(())
    }

    async fn power_off(&mut self) -> Result<(), DisplayError> {
        if let Some(err) = self.fail_power_off.take() {
            return Err(err);
        }
        self.powered = false;
        self.ops.push(PanelOp::PowerOff);
        Ok(())
    }
}

// ── Clock ───────────────────────────────────────────────────────────────────

/// Manually advanced clock. Clones share state.
#[derive(Clone, Default)]
pub struct MockClock {
    uptime_us: Rc<Cell<u64>>,
    rtc_us: Rc<Cell<Option<u64>>>,
}

impl MockClock {
    /// Uptime zero, RTC unset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Move both counters forward.
    pub fn advance_us(&self, us: u64) {
        self.uptime_us.set(self.uptime_us.get().saturating_add(us));
        if let Some(rtc) = self.rtc_us.get() {
            self.rtc_us.set(Some(rtc.saturating_add(us)));
        }
    }

    /// Move both counters forward by `ms`.
    pub fn advance_ms(&self, ms: u64) {
        self.advance_us(ms.saturating_mul(1_000));
    }

    /// Set the uptime counter.
    pub fn set_uptime_us(&self, us: u64) {
        self.uptime_us.set(us);
    }

    /// Set (or clear) the RTC.
    pub fn set_rtc_us(&self, rtc: Option<u64>) {
        self.rtc_us.set(rtc);
    }

    /// What a deep sleep does to the hardware counters: uptime restarts at
    /// zero, the RTC keeps counting through `slept_us`.
    pub fn reset_after_sleep(&self, slept_us: u64) {
        self.uptime_us.set(0);
        if let Some(rtc) = self.rtc_us.get() {
            self.rtc_us.set(Some(rtc.saturating_add(slept_us)));
        }
    }
}

impl Clock for MockClock {
    fn uptime_us(&self) -> u64 {
        self.uptime_us.get()
    }

    fn rtc_us(&self) -> Option<u64> {
        self.rtc_us.get()
    }
}

// ── Sleep controller ────────────────────────────────────────────────────────

#[derive(Default)]
struct SleepLog {
    boot_cause: Option<WakeCause>,
    script: VecDeque<(WakeCause, Option<u64>)>,
    gpio_wake: Option<Button>,
    timer_wake_us: Option<u64>,
    light_sleeps: usize,
    deep_sleeps: usize,
    deep_sleep_timer_us: Option<u64>,
    deep_sleep_gpio: Option<Button>,
    fail_gpio: bool,
    fail_timer: bool,
    max_timer_us: Option<u64>,
}

/// Scripted sleep controller. Clones share state.
///
/// Each `light_sleep` pops the next scripted wake and advances the linked
/// [`MockClock`]: by the armed timer for [`WakeCause::Timer`], otherwise by
/// the scripted delay (zero if none). An empty script behaves like a timer
/// wake.
#[derive(Clone)]
pub struct MockSleep {
    clock: MockClock,
    log: Rc<RefCell<SleepLog>>,
}

impl MockSleep {
    /// Controller driving `clock`.
    pub fn new(clock: MockClock) -> Self {
        Self {
            clock,
            log: Rc::new(RefCell::new(SleepLog::default())),
        }
    }

    /// Cause reported by `wake_cause()` (default [`WakeCause::PowerOn`]).
    pub fn set_boot_cause(&self, cause: WakeCause) {
        self.log.borrow_mut().boot_cause = Some(cause);
    }

    /// Queue the cause returned by the next `light_sleep`.
    pub fn push_wake(&self, cause: WakeCause) {
        self.log.borrow_mut().script.push_back((cause, None));
    }

    /// Queue a wake that happens `after_us` into the sleep.
    pub fn push_wake_after(&self, cause: WakeCause, after_us: u64) {
        self.log.borrow_mut().script.push_back((cause, Some(after_us)));
    }

    /// Make `arm_gpio_wake` fail.
    pub fn fail_gpio_arming(&self) {
        self.log.borrow_mut().fail_gpio = true;
    }

    /// Make `arm_timer_wake` fail.
    pub fn fail_timer_arming(&self) {
        self.log.borrow_mut().fail_timer = true;
    }

    /// Clamp timer wakes to `max_us`, like a narrow hardware counter.
    pub fn limit_timer_us(&self, max_us: u64) {
        self.log.borrow_mut().max_timer_us = Some(max_us);
    }

    /// Number of light sleeps entered.
    pub fn light_sleeps(&self) -> usize {
        self.log.borrow().light_sleeps
    }

    /// Number of deep sleeps entered.
    pub fn deep_sleeps(&self) -> usize {
        self.log.borrow().deep_sleeps
    }

    /// Timer wake armed when deep sleep was entered.
    pub fn deep_sleep_timer_us(&self) -> Option<u64> {
        self.log.borrow().deep_sleep_timer_us
    }

    /// GPIO wake armed when deep sleep was entered.
    pub fn deep_sleep_gpio(&self) -> Option<Button> {
        self.log.borrow().deep_sleep_gpio
    }

    /// Currently armed GPIO wake.
    pub fn armed_gpio(&self) -> Option<Button> {
        self.log.borrow().gpio_wake
    }

    /// Currently armed timer wake.
    pub fn armed_timer_us(&self) -> Option<u64> {
        self.log.borrow().timer_wake_us
    }
}

impl SleepController for MockSleep {
    fn wake_cause(&self) -> WakeCause {
        self.log.borrow().boot_cause.unwrap_or(WakeCause::PowerOn)
    }

    fn arm_gpio_wake(&mut self, button: Button) -> Result<(), PowerError> {
        let mut log = self.log.borrow_mut();
        if log.fail_gpio {
            return Err(PowerError::WakeSourceUnavailable);
        }
        log.gpio_wake = Some(button);
        Ok(())
    }

    fn arm_timer_wake(&mut self, after_us: u64) -> Result<u64, PowerError> {
        let mut log = self.log.borrow_mut();
        if log.fail_timer {
            return Err(PowerError::WakeSourceUnavailable);
        }
        let armed = log.max_timer_us.map_or(after_us, |max| after_us.min(max));
        log.timer_wake_us = Some(armed);
        Ok(armed)
    }

    fn disarm_wakes(&mut self) {
        let mut log = self.log.borrow_mut();
        log.gpio_wake = None;
        log.timer_wake_us = None;
    }

    async fn light_sleep(&mut self) -> WakeCause {
        let (cause, advance) = {
            let mut log = self.log.borrow_mut();
            log.light_sleeps = log.light_sleeps.saturating_add(1);
            let (cause, after) = log.script.pop_front().unwrap_or((WakeCause::Timer, None));
            let advance = match (cause, after) {
                (_, Some(us)) => us,
                (WakeCause::Timer, None) => log.timer_wake_us.unwrap_or(0),
                (_, None) => 0,
            };
            (cause, advance)
        };
        self.clock.advance_us(advance);
        cause
    }

    fn deep_sleep(&mut self) {
        let mut log = self.log.borrow_mut();
        log.deep_sleeps = log.deep_sleeps.saturating_add(1);
        log.deep_sleep_timer_us = log.timer_wake_us;
        log.deep_sleep_gpio = log.gpio_wake;
    }
}

// ── Alarm ───────────────────────────────────────────────────────────────────

/// Mock alarm collaborator. Clones share state.
#[derive(Clone, Default)]
pub struct MockAlarm {
    status: Rc<Cell<AlarmStatus>>,
    queries: Rc<Cell<usize>>,
}

impl MockAlarm {
    /// No alarm armed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the reported status.
    pub fn set(&self, status: AlarmStatus) {
        self.status.set(status);
    }

    /// How many times the status was read.
    pub fn queries(&self) -> usize {
        self.queries.get()
    }
}

impl AlarmSource for MockAlarm {
    fn alarm_status(&self) -> AlarmStatus {
        self.queries.set(self.queries.get().saturating_add(1));
        self.status.get()
    }
}

// ── Retained storage ────────────────────────────────────────────────────────

/// In-memory battery-backed register file. Clones share state.
#[derive(Clone, Default)]
pub struct MockRetainedStore {
    bytes: Rc<RefCell<Option<[u8; RETAINED_LEN]>>>,
    fail: Rc<Cell<bool>>,
}

impl MockRetainedStore {
    /// Blank registers (as after a cold start).
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every access fail with [`StorageError::Unavailable`].
    pub fn set_failing(&self, fail: bool) {
        self.fail.set(fail);
    }

    /// Decoded contents, if valid.
    pub fn contents(&self) -> Option<RetainedState> {
        self.bytes
            .borrow()
            .as_ref()
            .and_then(|b| RetainedState::from_bytes(b).ok())
    }
}

impl RetainedStore for MockRetainedStore {
    fn load(&mut self) -> Result<RetainedState, StorageError> {
        if self.fail.get() {
            return Err(StorageError::Unavailable);
        }
        match self.bytes.borrow().as_ref() {
            Some(bytes) => RetainedState::from_bytes(bytes),
            None => RetainedState::from_bytes(&[0u8; RETAINED_LEN]),
        }
    }

    fn store(&mut self, state: &RetainedState) -> Result<(), StorageError> {
        if self.fail.get() {
            return Err(StorageError::Unavailable);
        }
        *self.bytes.borrow_mut() = Some(state.to_bytes());
        Ok(())
    }

    fn invalidate(&mut self) -> Result<(), StorageError> {
        if self.fail.get() {
            return Err(StorageError::Unavailable);
        }
        *self.bytes.borrow_mut() = Some([0u8; RETAINED_LEN]);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn timer_wake_advances_clock_by_armed_duration() {
        let clock = MockClock::new();
        let mut sleep = MockSleep::new(clock.clone());
        sleep.arm_timer_wake(5_000_000).unwrap();
        assert_eq!(sleep.light_sleep().await, WakeCause::Timer);
        assert_eq!(clock.uptime_us(), 5_000_000);
    }

    #[tokio::test]
    async fn scripted_gpio_wake_uses_scripted_delay() {
        let clock = MockClock::new();
        let mut sleep = MockSleep::new(clock.clone());
        sleep.arm_timer_wake(5_000_000).unwrap();
        sleep.push_wake_after(WakeCause::Gpio, 1_200_000);
        assert_eq!(sleep.light_sleep().await, WakeCause::Gpio);
        assert_eq!(clock.uptime_us(), 1_200_000);
        assert_eq!(sleep.light_sleeps(), 1);
    }

    #[test]
    fn limited_timer_reports_the_clamped_delay() {
        let mut sleep = MockSleep::new(MockClock::new());
        sleep.limit_timer_us(10_000_000);
        assert_eq!(sleep.arm_timer_wake(4_000_000), Ok(4_000_000));
        assert_eq!(sleep.arm_timer_wake(70_000_000), Ok(10_000_000));
        assert_eq!(sleep.armed_timer_us(), Some(10_000_000));
    }

    #[test]
    fn deep_sleep_snapshots_armed_sources() {
        let mut sleep = MockSleep::new(MockClock::new());
        sleep.arm_gpio_wake(Button::A).unwrap();
        sleep.arm_timer_wake(24_000_000).unwrap();
        sleep.deep_sleep();
        assert_eq!(sleep.deep_sleeps(), 1);
        assert_eq!(sleep.deep_sleep_gpio(), Some(Button::A));
        assert_eq!(sleep.deep_sleep_timer_us(), Some(24_000_000));
    }

    #[test]
    fn blank_store_loads_as_corrupt() {
        let mut store = MockRetainedStore::new();
        assert_eq!(store.load(), Err(StorageError::Corrupt));
        store.store(&RetainedState::default()).unwrap();
        assert_eq!(store.load(), Ok(RetainedState::default()));
        store.invalidate().unwrap();
        assert_eq!(store.load(), Err(StorageError::Corrupt));
    }

    #[test]
    fn clock_sleep_reset_keeps_rtc_running() {
        let clock = MockClock::new();
        clock.set_uptime_us(10);
        clock.set_rtc_us(Some(1_000));
        clock.reset_after_sleep(500);
        assert_eq!(clock.uptime_us(), 0);
        assert_eq!(clock.rtc_us(), Some(1_500));
    }

    #[tokio::test]
    async fn panel_refuses_flush_while_off() {
        let mut panel = MockPanel::new();
        panel.power_off().await.unwrap();
        assert_eq!(panel.flush().await, Err(DisplayError::PoweredOff));
        panel.power_on().await.unwrap();
        assert_eq!(panel.flush().await, Ok(()));
        assert_eq!(panel.ops(), &[PanelOp::PowerOff, PanelOp::PowerOn, PanelOp::Flush]);
    }
}
