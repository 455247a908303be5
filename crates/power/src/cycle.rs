//! Sleep cycle driver.
//!
//! [`SleepCycle`] owns the platform collaborators (sleep controller, alarm,
//! retained storage) and borrows the shared core services (timebase, event
//! queue, sound engine). It walks one sleep attempt through the
//! [`SleepScheduler`], doing the I/O each transition needs:
//!
//! | Step                   | Effects                                                        |
//! |------------------------|----------------------------------------------------------------|
//! | enter grace            | cancel melody, draw sleep screen, panel off, arm GPIO + timer  |
//! | GPIO wake              | abort: clear queue, reset inactivity, panel on, cancel tone    |
//! | timer wake             | jingle, re-check alarm, arm alarm timer + GPIO, persist, sleep |
//! | unexpected wake / arm  | abort as for GPIO wake, logged as a warning                    |
//! | persist fails          | abort as for GPIO wake; deep sleep would lose the timebase     |
//! | resume (boot)          | bridge clock, clear queue, reset inactivity                    |

use platform::config::EVENT_QUEUE_CAPACITY;
use platform::{
    AlarmSource, Clock, RetainedStore, SleepController, SleepPanel, ToneOutput, WakeCause,
};
use input::EventQueue;
use sound::{SoundCommand, SoundEngine, CANCEL_TONE, SLEEP_JINGLE};

use crate::config::SchedulerConfig;
use crate::scheduler::{PowerState, SleepAbort, SleepScheduler};
use crate::screen::SleepScreen;
use crate::timekeeper::Timekeeper;

/// How [`SleepCycle::enter_sleep_cycle`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SleepOutcome {
    /// Back to [`PowerState::Active`]; the caller should redraw.
    Aborted(SleepAbort),
    /// Deep sleep was entered. Only observable on the host, where
    /// [`SleepController::deep_sleep`] returns.
    Suspended,
}

impl SleepOutcome {
    /// Short display name for log lines.
    pub const fn name(self) -> &'static str {
        match self {
            SleepOutcome::Aborted(reason) => reason.name(),
            SleepOutcome::Suspended => "suspended",
        }
    }
}

/// Drives sleep attempts and the resume path.
pub struct SleepCycle<'a, 'm, S, A, R, C, T, const N: usize = EVENT_QUEUE_CAPACITY>
where
    S: SleepController,
    A: AlarmSource,
    R: RetainedStore,
    C: Clock,
    T: ToneOutput,
{
    scheduler: SleepScheduler,
    sleep: S,
    alarm: A,
    retained: R,
    time: &'a Timekeeper<C>,
    queue: &'a EventQueue<N>,
    sound: &'a SoundEngine<'m, T>,
    alarm_snoozed_at_us: u64,
}

impl<'a, 'm, S, A, R, C, T, const N: usize> SleepCycle<'a, 'm, S, A, R, C, T, N>
where
    S: SleepController,
    A: AlarmSource,
    R: RetainedStore,
    C: Clock,
    T: ToneOutput,
{
    /// Driver in [`PowerState::Active`].
    pub fn new(
        config: SchedulerConfig,
        sleep: S,
        alarm: A,
        retained: R,
        time: &'a Timekeeper<C>,
        queue: &'a EventQueue<N>,
        sound: &'a SoundEngine<'m, T>,
    ) -> Self {
        Self {
            scheduler: SleepScheduler::new(config),
            sleep,
            alarm,
            retained,
            time,
            queue,
            sound,
            alarm_snoozed_at_us: 0,
        }
    }

    /// Current power state.
    pub fn state(&self) -> PowerState {
        self.scheduler.state()
    }

    /// Active configuration.
    pub fn config(&self) -> &SchedulerConfig {
        self.scheduler.config()
    }

    /// Sleep controller.
    pub fn sleep_controller(&self) -> &S {
        &self.sleep
    }

    /// `true` once the inactivity timeout has elapsed since the last event.
    pub fn is_due(&self) -> bool {
        self.scheduler
            .is_inactive(self.time.now_us(), self.queue.last_event_timestamp())
    }

    /// When the alarm was last snoozed (µs since first boot, 0 = never).
    /// Survives deep sleep.
    pub fn alarm_snoozed_at_us(&self) -> u64 {
        self.alarm_snoozed_at_us
    }

    /// Record an alarm snooze.
    pub fn set_alarm_snoozed_at_us(&mut self, at_us: u64) {
        self.alarm_snoozed_at_us = at_us;
    }

    // ── Boot ────────────────────────────────────────────────────────────────

    /// Cold start: timebase from zero, stale retained state discarded.
    pub fn first_boot(&mut self) {
        self.time.first_boot();
        self.alarm_snoozed_at_us = 0;
        if let Err(e) = self.retained.invalidate() {
            warn!("power: could not clear retained state: {}", e.name());
        }
        self.scheduler.resume();
        self.reset_input();
    }

    /// Resume hook after a deep-sleep wake.
    ///
    /// Returns `false` if the retained record was unusable, in which case the
    /// timebase restarts from zero as on a cold start.
    pub fn resume(&mut self, cause: WakeCause) -> bool {
        let restored = match self.retained.load() {
            Ok(state) => {
                let slept = self.time.resume(&state, cause);
                self.alarm_snoozed_at_us = state.alarm_snoozed_at_us;
                info!(
                    "power: resumed by {} after {} ms",
                    cause.name(),
                    slept / 1_000
                );
                true
            }
            Err(e) => {
                warn!("power: retained state lost ({}), clock restarts", e.name());
                self.time.first_boot();
                false
            }
        };
        self.scheduler.resume();
        self.reset_input();
        restored
    }

    // ── Sleep attempt ───────────────────────────────────────────────────────

    /// Run one sleep attempt from `Active`.
    ///
    /// On hardware a successful attempt never returns: the device resets out
    /// of deep sleep. Every other path ends back in `Active` with
    /// [`SleepOutcome::Aborted`].
    pub async fn enter_sleep_cycle<D: SleepPanel>(&mut self, display: &mut D) -> SleepOutcome {
        let now = self.time.now_us();
        if let Err(reason) = self.scheduler.begin_grace(now, self.alarm.alarm_status()) {
            return SleepOutcome::Aborted(reason);
        }

        self.sound.cancel_current();
        self.blank_display(display).await;

        let wake_button = self.config().wake_source();
        let grace_us = self.config().grace_period_us();
        let armed = self
            .sleep
            .arm_gpio_wake(wake_button)
            .and_then(|()| self.sleep.arm_timer_wake(grace_us).map(drop));
        if let Err(e) = armed {
            warn!("power: cannot arm grace wake: {}", e.name());
            return self.abort(display, SleepAbort::WakeSourceUnavailable).await;
        }

        let cause = self.sleep.light_sleep().await;
        self.sleep.disarm_wakes();
        debug!("power: light sleep ended by {}", cause.name());

        match cause {
            WakeCause::Gpio => self.abort(display, SleepAbort::ButtonWake).await,
            WakeCause::Timer => self.enter_deep_sleep(display).await,
            WakeCause::PowerOn | WakeCause::Unknown => {
                warn!("power: unexpected wake cause {}", cause.name());
                self.abort(display, SleepAbort::UnexpectedWake).await
            }
        }
    }

    async fn enter_deep_sleep<D: SleepPanel>(&mut self, display: &mut D) -> SleepOutcome {
        if self.config().jingle_enabled() {
            self.sound.play(&SLEEP_JINGLE).await;
        }

        let now = self.time.now_us();
        let plan = match self
            .scheduler
            .commit_deep_sleep(now, self.alarm.alarm_status())
        {
            Ok(plan) => plan,
            Err(reason) => return self.restore(display, reason).await,
        };

        let wake_button = self.config().wake_source();
        let armed = match plan.timer_wake_us {
            Some(after_us) => self.sleep.arm_timer_wake(after_us).map(Some),
            None => Ok(None),
        }
        .and_then(|planned| self.sleep.arm_gpio_wake(wake_button).map(|()| planned));
        let planned_sleep_us = match armed {
            Ok(planned) => planned,
            Err(e) => {
                warn!("power: cannot arm deep-sleep wake: {}", e.name());
                return self.abort(display, SleepAbort::WakeSourceUnavailable).await;
            }
        };

        let state = self
            .time
            .prepare_deep_sleep(planned_sleep_us, self.alarm_snoozed_at_us);
        if let Err(e) = self.retained.store(&state) {
            warn!("power: retained state not saved: {}", e.name());
            return self
                .abort(display, SleepAbort::RetainedStateUnavailable)
                .await;
        }
        debug!("power: retained state saved at {} us", state.clock_offset_us);

        self.sleep.deep_sleep();
        SleepOutcome::Suspended
    }

    /// Abort from `LightSleepGrace` (or a failed commit) back to `Active`.
    async fn abort<D: SleepPanel>(&mut self, display: &mut D, reason: SleepAbort) -> SleepOutcome {
        self.scheduler.abort(reason);
        self.restore(display, reason).await
    }

    /// Undo the grace-period effects. The scheduler is already `Active`.
    async fn restore<D: SleepPanel>(&mut self, display: &mut D, reason: SleepAbort) -> SleepOutcome {
        self.sleep.disarm_wakes();
        self.reset_input();
        if let Err(e) = display.power_on().await {
            warn!("power: display did not come back: {}", e.name());
        }
        self.sound.submit(SoundCommand::tone(CANCEL_TONE));
        SleepOutcome::Aborted(reason)
    }

    async fn blank_display<D: SleepPanel>(&self, display: &mut D) {
        if SleepScreen::render(display, self.config().wake_source()).is_err() {
            warn!("power: sleep screen draw failed");
        }
        if let Err(e) = display.flush().await {
            warn!("power: sleep screen flush failed: {}", e.name());
        }
        if let Err(e) = display.power_off().await {
            warn!("power: display power-off failed: {}", e.name());
        }
    }

    fn reset_input(&self) {
        self.queue.clear();
        self.queue.touch(self.time.now_us());
    }
}
