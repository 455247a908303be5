//! Debounced input capture.
//!
//! Turns raw, bouncy line changes into press/release [`Event`]s and
//! synthesises repeat presses for held buttons.
//!
//! # Entry points
//!
//! - [`InputCapture::on_edge`]: call on every electrical change of a
//!   button line (GPIO interrupt or its task-side wake).
//! - [`InputCapture::on_tick`]: call every [`CaptureConfig::tick_period_ms`]
//!   to generate repeats; [`InputCapture::run_ticker`] does this in a loop.
//!
//! # Ordering inside an edge
//!
//! 1. Sample all six lines; the triggering line decides press vs release.
//! 2. Masked pair → dropped. No debounce or repeat state is touched.
//! 3. Debounce: dropped unless `debounce` has elapsed since the last
//!    accepted edge of the same (button, transition).
//! 4. Record press start / compute press duration, enqueue.
//!
//! Steps 1–4 run inside one critical section, so the tick and other edge
//! handlers observe them atomically.
//!
//! The held snapshot is taken when the handler runs, after the edge. If a
//! second line changes between the edge and the handler, the snapshot
//! already shows it.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Ticker};
use platform::config::EVENT_QUEUE_CAPACITY;
use platform::{Button, ButtonLevels, ButtonSet, Transition, BUTTON_COUNT};

use crate::config::CaptureConfig;
use crate::event::Event;
use crate::mask::EventMask;
use crate::queue::EventQueue;

const SLOTS: usize = 2 * BUTTON_COUNT;

/// Last accepted edge time per (button, transition) slot.
///
/// Entries only ever move forward. A slot that has never accepted an edge
/// accepts the first one unconditionally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceTable {
    last_accepted_us: [Option<u64>; SLOTS],
}

impl DebounceTable {
    /// No edges accepted yet.
    pub const fn new() -> Self {
        Self {
            last_accepted_us: [None; SLOTS],
        }
    }

    /// Accept an edge in `slot` at `now_us` if at least `interval_us` has
    /// passed since the last accepted one, recording it if so.
    pub fn accept(&mut self, slot: usize, now_us: u64, interval_us: u64) -> bool {
        let Some(entry) = self.last_accepted_us.get_mut(slot) else {
            return false;
        };
        let ready = match *entry {
            None => true,
            // A clock that stepped backwards yields 0 here and is rejected.
            Some(last) => now_us.saturating_sub(last) >= interval_us && now_us >= last,
        };
        if ready {
            *entry = Some(now_us);
        }
        ready
    }

    /// Last accepted time in `slot`.
    pub fn last_accepted(&self, slot: usize) -> Option<u64> {
        self.last_accepted_us.get(slot).copied().flatten()
    }
}

impl Default for DebounceTable {
    fn default() -> Self {
        Self::new()
    }
}

/// When each button's current press began.
///
/// A press stays recorded until its release edge so the release can report
/// the full duration. A line seen up by the tick before that edge arrives
/// stops repeating but keeps its start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepeatTracker {
    press_started_us: [Option<u64>; BUTTON_COUNT],
    seen_up: ButtonSet,
}

impl RepeatTracker {
    /// No presses in progress.
    pub const fn new() -> Self {
        Self {
            press_started_us: [None; BUTTON_COUNT],
            seen_up: ButtonSet::EMPTY,
        }
    }

    /// Record that `button` was pressed at `now_us`.
    pub fn start(&mut self, button: Button, now_us: u64) {
        if let Some(entry) = self.press_started_us.get_mut(button.index()) {
            *entry = Some(now_us);
            self.seen_up = self.seen_up.without(button);
        }
    }

    /// End the press of `button`, returning how long it lasted (`0` if its
    /// start was never recorded).
    pub fn finish(&mut self, button: Button, now_us: u64) -> u64 {
        self.seen_up = self.seen_up.without(button);
        self.press_started_us
            .get_mut(button.index())
            .and_then(Option::take)
            .map_or(0, |start| now_us.saturating_sub(start))
    }

    /// Start time of the current press of `button`.
    pub fn started(&self, button: Button) -> Option<u64> {
        self.press_started_us.get(button.index()).copied().flatten()
    }

    /// Note that `button`'s line was up while its press is still open.
    pub fn line_up(&mut self, button: Button) {
        if self.started(button).is_some() {
            self.seen_up.insert(button);
        }
    }

    /// Start time of `button`'s press if it may still repeat.
    pub fn repeating_since(&self, button: Button) -> Option<u64> {
        if self.seen_up.contains(button) {
            None
        } else {
            self.started(button)
        }
    }

    /// `true` while any press may still repeat.
    pub fn any_repeating(&self) -> bool {
        Button::ALL
            .into_iter()
            .any(|b| self.repeating_since(b).is_some())
    }

    /// Forget all presses.
    pub fn clear_all(&mut self) {
        self.press_started_us = [None; BUTTON_COUNT];
        self.seen_up = ButtonSet::EMPTY;
    }
}

impl Default for RepeatTracker {
    fn default() -> Self {
        Self::new()
    }
}

struct CaptureState {
    enabled: bool,
    debounce: DebounceTable,
    repeat: RepeatTracker,
}

/// Debounced capture feeding an [`EventQueue`].
pub struct InputCapture<'q, const N: usize = EVENT_QUEUE_CAPACITY> {
    queue: &'q EventQueue<N>,
    config: CaptureConfig,
    state: Mutex<CriticalSectionRawMutex, RefCell<CaptureState>>,
    pressed: Signal<CriticalSectionRawMutex, ()>,
}

impl<'q, const N: usize> InputCapture<'q, N> {
    /// Enabled capture into `queue`.
    pub const fn new(queue: &'q EventQueue<N>, config: CaptureConfig) -> Self {
        Self {
            queue,
            config,
            state: Mutex::new(RefCell::new(CaptureState {
                enabled: true,
                debounce: DebounceTable::new(),
                repeat: RepeatTracker::new(),
            })),
            pressed: Signal::new(),
        }
    }

    /// Queue this capture feeds.
    pub fn queue(&self) -> &'q EventQueue<N> {
        self.queue
    }

    /// Active configuration.
    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    /// Resume capturing and reset the inactivity timer to `now_us`.
    pub fn enable(&self, now_us: u64) {
        self.state.lock(|s| s.borrow_mut().enabled = true);
        self.queue.touch(now_us);
        debug!("input capture enabled");
    }

    /// Ignore edges and ticks until [`enable`](Self::enable).
    pub fn disable(&self) {
        self.state.lock(|s| {
            let mut s = s.borrow_mut();
            s.enabled = false;
            s.repeat.clear_all();
        });
        debug!("input capture disabled");
    }

    /// `true` while capturing.
    pub fn is_enabled(&self) -> bool {
        self.state.lock(|s| s.borrow().enabled)
    }

    /// Handle an electrical change on `button`'s line.
    ///
    /// Returns the event that was enqueued, if the edge was accepted.
    pub fn on_edge<L: ButtonLevels>(&self, button: Button, levels: &L, now_us: u64) -> Option<Event> {
        self.state.lock(|s| {
            let mut s = s.borrow_mut();
            if !s.enabled {
                return None;
            }

            let held = levels.snapshot();
            let transition = if held.contains(button) {
                Transition::Press
            } else {
                Transition::Release
            };

            if self.queue.is_masked(button, transition) {
                trace!("{} {} masked", button.name(), transition.name());
                return None;
            }

            let slot = EventMask::slot(button, transition);
            if !s.debounce.accept(slot, now_us, self.config.debounce_us()) {
                trace!("{} {} debounced", button.name(), transition.name());
                return None;
            }

            let event = match transition {
                Transition::Press => {
                    s.repeat.start(button, now_us);
                    self.pressed.signal(());
                    Event::ButtonPress {
                        button,
                        held,
                        timestamp_us: now_us,
                        is_repeat: false,
                    }
                }
                Transition::Release => Event::ButtonRelease {
                    button,
                    held,
                    timestamp_us: now_us,
                    press_duration_us: s.repeat.finish(button, now_us),
                },
            };
            self.queue.enqueue(event);
            Some(event)
        })
    }

    /// Scan held buttons and synthesise repeat presses.
    ///
    /// Returns the number of repeats enqueued.
    pub fn on_tick<L: ButtonLevels>(&self, levels: &L, now_us: u64) -> usize {
        self.state.lock(|s| {
            let mut s = s.borrow_mut();
            if !s.enabled {
                return 0;
            }

            let held = levels.snapshot();
            let mut emitted = 0usize;
            for button in Button::ALL {
                if !held.contains(button) {
                    s.repeat.line_up(button);
                    continue;
                }
                let Some(started) = s.repeat.repeating_since(button) else {
                    continue;
                };
                if now_us.saturating_sub(started) < self.config.repeat_delay_us() {
                    continue;
                }
                if self.queue.is_masked(button, Transition::Press) {
                    continue;
                }
                let slot = EventMask::slot(button, Transition::Press);
                if !s.debounce.accept(slot, now_us, self.config.debounce_us()) {
                    continue;
                }
                self.queue.enqueue(Event::ButtonPress {
                    button,
                    held,
                    timestamp_us: now_us,
                    is_repeat: true,
                });
                emitted = emitted.saturating_add(1);
            }
            emitted
        })
    }

    /// `true` while a held button may still produce repeats.
    pub fn is_repeating(&self) -> bool {
        self.state.lock(|s| s.borrow().repeat.any_repeating())
    }

    /// Run [`on_tick`](Self::on_tick) forever at the configured period.
    ///
    /// Ticks only while a press may still repeat; otherwise parks until the
    /// next accepted press, so an idle device is not woken by the ticker.
    pub async fn run_ticker<L, F>(&self, levels: &L, now_us: F) -> !
    where
        L: ButtonLevels,
        F: Fn() -> u64,
    {
        let period = Duration::from_millis(u64::from(self.config.tick_period_ms()));
        loop {
            if !self.is_repeating() {
                self.pressed.wait().await;
            }
            let mut ticker = Ticker::every(period);
            while self.is_repeating() {
                ticker.next().await;
                self.on_tick(levels, now_us());
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use super::*;
    use core::cell::Cell;
    use embassy_futures::select::{select, Either};
    use embassy_time::Timer;
    use platform::mocks::MockButtons;

    const MS: u64 = 1_000;

    fn setup(queue: &EventQueue) -> (InputCapture<'_>, MockButtons) {
        let config = CaptureConfig::new().debounce_ms(300).repeat_delay_ms(500);
        (InputCapture::new(queue, config), MockButtons::new())
    }

    #[test]
    fn press_then_release_reports_duration() {
        let q = EventQueue::new();
        let (cap, lines) = setup(&q);

        lines.press(Button::A);
        cap.on_edge(Button::A, &lines, 1_000 * MS);
        lines.release(Button::A);
        cap.on_edge(Button::A, &lines, 1_420 * MS);

        assert_eq!(
            q.try_dequeue(),
            Some(Event::ButtonPress {
                button: Button::A,
                held: ButtonSet::single(Button::A),
                timestamp_us: 1_000 * MS,
                is_repeat: false,
            })
        );
        assert_eq!(
            q.try_dequeue(),
            Some(Event::ButtonRelease {
                button: Button::A,
                held: ButtonSet::EMPTY,
                timestamp_us: 1_420 * MS,
                press_duration_us: 420 * MS,
            })
        );
    }

    #[test]
    fn bounce_within_interval_is_dropped() {
        let q = EventQueue::new();
        let (cap, lines) = setup(&q);

        lines.press(Button::B);
        assert!(cap.on_edge(Button::B, &lines, 0).is_some());
        lines.release(Button::B);
        assert!(cap.on_edge(Button::B, &lines, 5 * MS).is_some());
        lines.press(Button::B);
        assert!(cap.on_edge(Button::B, &lines, 10 * MS).is_none());
        assert!(cap.on_edge(Button::B, &lines, 299 * MS).is_none());
        assert!(cap.on_edge(Button::B, &lines, 300 * MS).is_some());
        assert_eq!(q.len(), 3);
    }

    #[test]
    fn held_mask_reflects_every_line() {
        let q = EventQueue::new();
        let (cap, lines) = setup(&q);

        lines.press(Button::Up);
        lines.press(Button::Left);
        let ev = cap.on_edge(Button::Left, &lines, 0);
        assert!(matches!(
            ev,
            Some(Event::ButtonPress { held, .. }) if held == ButtonSet::single(Button::Up).with(Button::Left)
        ));
    }

    #[test]
    fn masked_edge_leaves_debounce_untouched() {
        let q = EventQueue::new();
        let (cap, lines) = setup(&q);

        q.mask(EventMask::press(Button::A));
        lines.press(Button::A);
        assert!(cap.on_edge(Button::A, &lines, 100 * MS).is_none());
        assert!(q.is_empty());

        q.unmask(EventMask::press(Button::A));
        // Would be debounced if the masked edge had been recorded.
        assert!(cap.on_edge(Button::A, &lines, 150 * MS).is_some());
    }

    #[test]
    fn disabled_capture_ignores_edges_and_ticks() {
        let q = EventQueue::new();
        let (cap, lines) = setup(&q);
        cap.disable();
        lines.press(Button::A);
        assert!(cap.on_edge(Button::A, &lines, 0).is_none());
        assert_eq!(cap.on_tick(&lines, 10_000 * MS), 0);
        cap.enable(20_000 * MS);
        assert_eq!(q.last_event_timestamp(), 20_000 * MS);
        assert!(cap.on_edge(Button::A, &lines, 20_000 * MS).is_some());
    }

    #[test]
    fn repeat_starts_after_delay_then_follows_debounce_cadence() {
        let q = EventQueue::new();
        let (cap, lines) = setup(&q);

        lines.press(Button::Down);
        cap.on_edge(Button::Down, &lines, 0);
        q.clear();

        let mut repeats = heapless::Vec::<u64, 16>::new();
        for tick in 1..=20u64 {
            let now = tick * 100 * MS;
            cap.on_tick(&lines, now);
            while let Some(ev) = q.try_dequeue() {
                assert!(matches!(ev, Event::ButtonPress { is_repeat: true, .. }));
                repeats.push(now).unwrap();
            }
        }
        // Delay 500 ms, then once per 300 ms on a 100 ms tick grid.
        assert_eq!(repeats.as_slice(), &[500 * MS, 800 * MS, 1_100 * MS, 1_400 * MS, 1_700 * MS, 2_000 * MS]);
    }

    #[test]
    fn no_repeat_after_release() {
        let q = EventQueue::new();
        let (cap, lines) = setup(&q);

        lines.press(Button::Right);
        cap.on_edge(Button::Right, &lines, 0);
        lines.release(Button::Right);
        // Release edge lost (debounced or never delivered): the tick still
        // sees the line up and stops repeating.
        assert_eq!(cap.on_tick(&lines, 600 * MS), 0);
        assert!(!cap.is_repeating());
        lines.press(Button::Right);
        assert_eq!(cap.on_tick(&lines, 700 * MS), 0);
    }

    #[test]
    fn tick_before_release_edge_keeps_press_duration() {
        let q = EventQueue::new();
        let (cap, lines) = setup(&q);

        lines.press(Button::Up);
        cap.on_edge(Button::Up, &lines, 0);
        assert!(cap.is_repeating());
        lines.release(Button::Up);
        // The ticker runs between the electrical release and its edge handler.
        assert_eq!(cap.on_tick(&lines, 250 * MS), 0);
        let ev = cap.on_edge(Button::Up, &lines, 260 * MS);
        assert!(matches!(
            ev,
            Some(Event::ButtonRelease { press_duration_us, .. }) if press_duration_us == 260 * MS
        ));
        assert!(!cap.is_repeating());
    }

    #[test]
    fn new_press_after_lost_release_repeats_again() {
        let q = EventQueue::new();
        let (cap, lines) = setup(&q);

        lines.press(Button::Left);
        cap.on_edge(Button::Left, &lines, 0);
        lines.release(Button::Left);
        cap.on_tick(&lines, 100 * MS);
        lines.press(Button::Left);
        assert!(cap.on_edge(Button::Left, &lines, 1_000 * MS).is_some());
        assert!(cap.is_repeating());
        assert_eq!(cap.on_tick(&lines, 1_500 * MS), 1);
    }

    #[tokio::test]
    async fn ticker_parks_until_a_press_and_again_after_release() {
        let q = EventQueue::new();
        let (cap, lines) = setup(&q);
        let ticks = Cell::new(0u32);
        let now = || {
            ticks.set(ticks.get() + 1);
            0
        };

        let driver = async {
            Timer::after_millis(350).await;
            assert_eq!(ticks.get(), 0, "no press, no ticks");

            lines.press(Button::A);
            cap.on_edge(Button::A, &lines, 0);
            Timer::after_millis(350).await;
            let while_held = ticks.get();
            assert!(while_held >= 2, "ticked {while_held} times while held");

            lines.release(Button::A);
            cap.on_edge(Button::A, &lines, 400 * MS);
            Timer::after_millis(150).await;
            let after_release = ticks.get();
            Timer::after_millis(350).await;
            assert_eq!(ticks.get(), after_release, "ticker kept running after release");
        };

        match select(cap.run_ticker(&lines, now), driver).await {
            Either::First(never) => never,
            Either::Second(()) => {}
        }
    }

    #[test]
    fn masked_press_suppresses_repeats() {
        let q = EventQueue::new();
        let (cap, lines) = setup(&q);

        lines.press(Button::A);
        cap.on_edge(Button::A, &lines, 0);
        q.mask(EventMask::press(Button::A));
        assert_eq!(cap.on_tick(&lines, 1_000 * MS), 0);
        q.unmask(EventMask::ALL);
        assert_eq!(cap.on_tick(&lines, 1_100 * MS), 1);
    }

    #[test]
    fn release_after_repeats_measures_from_original_press() {
        let q = EventQueue::new();
        let (cap, lines) = setup(&q);

        lines.press(Button::B);
        cap.on_edge(Button::B, &lines, 0);
        cap.on_tick(&lines, 600 * MS);
        lines.release(Button::B);
        let ev = cap.on_edge(Button::B, &lines, 900 * MS);
        assert!(matches!(
            ev,
            Some(Event::ButtonRelease { press_duration_us, .. }) if press_duration_us == 900 * MS
        ));
    }

    #[test]
    fn debounce_table_rejects_clock_going_backwards() {
        let mut table = DebounceTable::new();
        assert!(table.accept(0, 1_000, 300));
        assert!(!table.accept(0, 500, 300));
        assert_eq!(table.last_accepted(0), Some(1_000));
        assert!(!table.accept(SLOTS, 10_000, 300), "out-of-range slot");
    }
}
