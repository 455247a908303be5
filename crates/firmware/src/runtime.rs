//! Runtime context.
//!
//! [`Runtime`] is the one owned value applications talk to. It bundles the
//! shared core services (event queue, input capture, sound engine, timebase)
//! with the sleep cycle and the redraw flag, and exposes the application API:
//!
//! | Area   | Operations                                                                   |
//! |--------|------------------------------------------------------------------------------|
//! | Input  | `get_next_event`, `mask_event`, `unmask_event`, `clear_event_queue`, `get_last_event_timestamp` |
//! | Sound  | `play_melody`, `play_interruptible_melody`, `async_submit_*`, `stop_async_melody`, `is_melody_playing` |
//! | Power  | `enter_sleep_cycle`, `upkeep`, `boot`                                        |
//!
//! The queue, capture and sound engine are borrowed because interrupt
//! handlers and the sound task reach them too; on hardware they are statics.

use embassy_time::{Duration, Timer};
use platform::config::{EVENT_QUEUE_CAPACITY, UPKEEP_IDLE_MS};
use platform::{Button, SleepPanel, WakeCause};

use input::{Event, EventMask, EventQueue, InputCapture};
use power::{PowerState, SchedulerConfig, SleepCycle, SleepOutcome, Timekeeper};
use sound::{Melody, Note, SoundCommand, SoundEngine, BOOT_JINGLE};

use crate::board::Board;
use crate::boot::BootKind;

/// Shared services a [`Runtime`] borrows.
pub struct Services<'a, B: Board, const N: usize = EVENT_QUEUE_CAPACITY> {
    /// Event queue fed by [`InputCapture`].
    pub queue: &'a EventQueue<N>,
    /// Edge and tick handler feeding `queue`.
    pub capture: &'a InputCapture<'a, N>,
    /// Buzzer owner; its `run` future must be polled for async playback.
    pub sound: &'a SoundEngine<'static, B::Buzzer>,
    /// Microseconds since first boot.
    pub time: &'a Timekeeper<B::Clock>,
}

/// Owned platform parts a [`Runtime`] consumes.
pub struct Parts<B: Board> {
    /// Sleep controller.
    pub sleep: B::Sleep,
    /// Alarm collaborator.
    pub alarm: B::Alarm,
    /// Retained-state storage.
    pub retained: B::Retained,
}

type Cycle<'a, B, const N: usize> = SleepCycle<
    'a,
    'static,
    <B as Board>::Sleep,
    <B as Board>::Alarm,
    <B as Board>::Retained,
    <B as Board>::Clock,
    <B as Board>::Buzzer,
    N,
>;

/// Application-facing runtime context.
pub struct Runtime<'a, B: Board, const N: usize = EVENT_QUEUE_CAPACITY> {
    queue: &'a EventQueue<N>,
    capture: &'a InputCapture<'a, N>,
    sound: &'a SoundEngine<'static, B::Buzzer>,
    time: &'a Timekeeper<B::Clock>,
    power: Cycle<'a, B, N>,
    dirty: bool,
}

impl<'a, B: Board, const N: usize> Runtime<'a, B, N> {
    /// Runtime in [`PowerState::Active`], input disabled until [`boot`].
    ///
    /// [`boot`]: Runtime::boot
    pub fn new(services: Services<'a, B, N>, parts: Parts<B>, config: SchedulerConfig) -> Self {
        let Services {
            queue,
            capture,
            sound,
            time,
        } = services;
        capture.disable();
        Self {
            queue,
            capture,
            sound,
            time,
            power: SleepCycle::new(
                config,
                parts.sleep,
                parts.alarm,
                parts.retained,
                time,
                queue,
                sound,
            ),
            dirty: false,
        }
    }

    /// Take the first-boot or resume path for the reset `cause`, then enable
    /// input capture.
    ///
    /// A first boot plays the boot jingle (unless jingles are disabled in the
    /// [`SchedulerConfig`]). Either way the caller should draw a full frame.
    pub async fn boot(&mut self, cause: WakeCause) -> BootKind {
        let kind = BootKind::from_wake(cause);
        info!("boot: {} (wake cause {})", kind.name(), cause.name());

        match kind {
            BootKind::FirstBoot => self.power.first_boot(),
            BootKind::Resume => {
                if !self.power.resume(cause) {
                    warn!("boot: retained state lost, timebase restarted");
                }
            }
        }
        self.capture.enable(self.time.now_us());

        if kind == BootKind::FirstBoot && self.power.config().jingle_enabled() {
            self.sound.play(&BOOT_JINGLE).await;
        }
        self.dirty = true;
        kind
    }

    // ── Input ───────────────────────────────────────────────────────────────

    /// Next event, waiting up to `timeout_ms` (0 = don't wait).
    ///
    /// Returns [`Event::None`] on timeout.
    pub async fn get_next_event(&self, timeout_ms: u32) -> Event {
        self.queue
            .dequeue(Duration::from_millis(u64::from(timeout_ms)))
            .await
    }

    /// Stop capturing the `(button, transition)` pairs in `mask`.
    pub fn mask_event(&self, mask: EventMask) {
        self.queue.mask(mask);
    }

    /// Resume capturing the pairs in `mask`.
    pub fn unmask_event(&self, mask: EventMask) {
        self.queue.unmask(mask);
    }

    /// Drop every queued event.
    pub fn clear_event_queue(&self) {
        self.queue.clear();
    }

    /// Timestamp of the most recent activity (µs since first boot).
    pub fn get_last_event_timestamp(&self) -> u64 {
        self.queue.last_event_timestamp()
    }

    /// Turn input capture on; also counts as activity.
    pub fn enable_events(&self) {
        self.capture.enable(self.time.now_us());
    }

    /// Turn input capture off. Edges and ticks are ignored until re-enabled.
    pub fn disable_events(&self) {
        self.capture.disable();
    }

    /// Record activity without an event, postponing sleep.
    pub fn touch(&self) {
        self.queue.touch(self.time.now_us());
    }

    /// Microseconds since first boot.
    pub fn now_us(&self) -> u64 {
        self.time.now_us()
    }

    // ── Sound ───────────────────────────────────────────────────────────────

    /// Play `melody` to the end.
    pub async fn play_melody(&self, melody: &[Note]) {
        self.sound.play(melody).await;
    }

    /// Play `melody`, stopping early on a press of `cancel`.
    ///
    /// Every other event is masked for the duration and the queue is
    /// drained first. Returns `true` if interrupted.
    pub async fn play_interruptible_melody(&self, melody: &[Note], cancel: Button) -> bool {
        self.sound
            .play_interruptible(melody, self.queue, cancel)
            .await
    }

    /// Queue `melody` for background playback. Returns `false` (and drops
    /// it) if something is already playing.
    pub fn async_submit_melody(&self, melody: Melody<'static>) -> bool {
        self.sound.submit(SoundCommand::Melody(melody))
    }

    /// Queue `melody` for background playback that
    /// [`stop_async_melody`](Runtime::stop_async_melody) can cut short.
    pub fn async_submit_interruptible_melody(&self, melody: Melody<'static>, looping: bool) -> bool {
        self.sound.submit(SoundCommand::InterruptibleMelody {
            notes: melody,
            looping,
        })
    }

    /// Queue a single UI tone.
    pub fn async_submit_tone(&self, note: Note) -> bool {
        self.sound.submit(SoundCommand::tone(note))
    }

    /// Stop the background interruptible melody, if any.
    pub fn stop_async_melody(&self) {
        self.sound.cancel_current();
    }

    /// `true` while a background command holds the buzzer.
    pub fn is_melody_playing(&self) -> bool {
        self.sound.is_playing()
    }

    // ── Power ───────────────────────────────────────────────────────────────

    /// Current power state.
    pub fn power_state(&self) -> PowerState {
        self.power.state()
    }

    /// Run one sleep attempt now. An abort requests a redraw.
    pub async fn enter_sleep_cycle<D: SleepPanel>(&mut self, display: &mut D) -> SleepOutcome {
        let outcome = self.power.enter_sleep_cycle(display).await;
        if let SleepOutcome::Aborted(_) = outcome {
            self.dirty = true;
        }
        outcome
    }

    /// Periodic housekeeping for the main loop: start a sleep attempt once
    /// the inactivity timeout has passed, then idle briefly.
    pub async fn upkeep<D: SleepPanel>(&mut self, display: &mut D) -> Option<SleepOutcome> {
        let outcome = if self.power.is_due() {
            Some(self.enter_sleep_cycle(display).await)
        } else {
            None
        };
        Timer::after_millis(u64::from(UPKEEP_IDLE_MS)).await;
        outcome
    }

    /// Record an alarm snooze at the current time. Survives deep sleep.
    pub fn snooze_alarm(&mut self) {
        let now = self.time.now_us();
        self.power.set_alarm_snoozed_at_us(now);
    }

    /// When the alarm was last snoozed (0 = never).
    pub fn alarm_snoozed_at_us(&self) -> u64 {
        self.power.alarm_snoozed_at_us()
    }

    // ── Redraw ──────────────────────────────────────────────────────────────

    /// Request a full redraw.
    pub fn set_dirty(&mut self) {
        self.dirty = true;
    }

    /// Consume the redraw request.
    pub fn take_dirty(&mut self) -> bool {
        core::mem::take(&mut self.dirty)
    }
}
