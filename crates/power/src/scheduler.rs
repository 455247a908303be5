//! Power state machine.
//!
//! `SleepScheduler` is a pure, `no_std`, allocation-free state machine that
//! decides *whether* the device may go to sleep. It performs no I/O; the
//! [`SleepCycle`](crate::SleepCycle) driver arms wake sources, touches the
//! display and actually sleeps, asking the scheduler at each step.
//!
//! ```text
//!            inactivity, no alarm due
//!   Active ───────────────────────────► LightSleepGrace
//!     ▲  ▲                                │         │
//!     │  └── GPIO wake / alarm due / ─────┘         │ grace expired,
//!     │      unexpected wake (abort)                │ no alarm due
//!     │                                             ▼
//!     └──────────── resume hook at boot ─────── DeepSleep
//! ```

use platform::AlarmStatus;
use thiserror_no_std::Error;

use crate::config::SchedulerConfig;

/// Where the device is in the sleep cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerState {
    /// Running normally.
    Active,
    /// Display off, waiting out the grace period in light sleep.
    LightSleepGrace,
    /// Committed to deep sleep; only the resume hook leaves this state.
    DeepSleep,
}

impl PowerState {
    /// Short display name for log lines.
    pub const fn name(self) -> &'static str {
        match self {
            PowerState::Active => "Active",
            PowerState::LightSleepGrace => "LightSleepGrace",
            PowerState::DeepSleep => "DeepSleep",
        }
    }
}

/// Why a sleep attempt returned to [`PowerState::Active`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SleepAbort {
    /// The alarm is ringing.
    #[error("alarm already triggered")]
    AlarmTriggered,
    /// The alarm is due before deep sleep could safely start.
    #[error("alarm due too soon")]
    AlarmImminent,
    /// The wake button was pressed during the grace period.
    #[error("woken by button")]
    ButtonWake,
    /// A wake source could not be armed.
    #[error("wake source unavailable")]
    WakeSourceUnavailable,
    /// Light sleep ended for a reason other than the armed sources.
    #[error("unexpected wake cause")]
    UnexpectedWake,
    /// The clock offset could not be saved, so deep sleep would lose time.
    #[error("retained state could not be saved")]
    RetainedStateUnavailable,
}

impl SleepAbort {
    /// Short display name for log lines.
    pub const fn name(self) -> &'static str {
        match self {
            SleepAbort::AlarmTriggered => "alarm-triggered",
            SleepAbort::AlarmImminent => "alarm-imminent",
            SleepAbort::ButtonWake => "button-wake",
            SleepAbort::WakeSourceUnavailable => "wake-source-unavailable",
            SleepAbort::UnexpectedWake => "unexpected-wake",
            SleepAbort::RetainedStateUnavailable => "retained-state-unavailable",
        }
    }
}

/// Result of committing to deep sleep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeepSleepPlan {
    /// Timer wake to arm, in µs from now, so the device is up before the
    /// alarm. `None` when no alarm is set.
    pub timer_wake_us: Option<u64>,
}

/// Pure sleep/wake decision logic.
///
/// All fields are private; state is mutated only through the method API.
pub struct SleepScheduler {
    state: PowerState,
    config: SchedulerConfig,
}

impl SleepScheduler {
    /// Scheduler in [`PowerState::Active`].
    pub const fn new(config: SchedulerConfig) -> Self {
        Self {
            state: PowerState::Active,
            config,
        }
    }

    /// Current state.
    pub fn state(&self) -> PowerState {
        self.state
    }

    /// Active configuration.
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// `true` when active and no event has been seen for the inactivity
    /// timeout.
    pub fn is_inactive(&self, now_us: u64, last_event_us: u64) -> bool {
        self.state == PowerState::Active
            && now_us.saturating_sub(last_event_us) >= self.config.inactivity_timeout_us()
    }

    /// Reason the alarm forbids sleeping right now, if any.
    ///
    /// A zero deadline means no alarm (or a clock not yet synchronised) and
    /// never vetoes. A deadline already in the past but not yet triggered
    /// counts as imminent.
    pub fn alarm_veto(&self, alarm: AlarmStatus, now_us: u64) -> Option<SleepAbort> {
        veto_within(alarm, now_us, self.config.alarm_window_us())
    }

    /// Same as [`alarm_veto`](Self::alarm_veto) with the shorter window used
    /// when the grace period expires.
    pub fn recheck_veto(&self, alarm: AlarmStatus, now_us: u64) -> Option<SleepAbort> {
        veto_within(alarm, now_us, self.config.recheck_window_us())
    }

    /// `Active → LightSleepGrace`, unless the alarm vetoes it.
    ///
    /// # Errors
    ///
    /// Returns the veto reason; the state stays `Active`.
    pub fn begin_grace(&mut self, now_us: u64, alarm: AlarmStatus) -> Result<(), SleepAbort> {
        if let Some(reason) = self.alarm_veto(alarm, now_us) {
            debug!("power: not sleeping, {}", reason.name());
            return Err(reason);
        }
        self.transition(PowerState::LightSleepGrace);
        Ok(())
    }

    /// `LightSleepGrace → DeepSleep` after re-checking the alarm.
    ///
    /// # Errors
    ///
    /// Returns the veto reason after moving back to `Active`.
    pub fn commit_deep_sleep(
        &mut self,
        now_us: u64,
        alarm: AlarmStatus,
    ) -> Result<DeepSleepPlan, SleepAbort> {
        if let Some(reason) = self.recheck_veto(alarm, now_us) {
            self.abort(reason);
            return Err(reason);
        }
        let timer_wake_us = alarm.deadline().map(|deadline| {
            deadline
                .saturating_sub(now_us)
                .saturating_sub(self.config.alarm_guard_us())
        });
        self.transition(PowerState::DeepSleep);
        Ok(DeepSleepPlan { timer_wake_us })
    }

    /// Give up the current sleep attempt.
    pub fn abort(&mut self, reason: SleepAbort) {
        match reason {
            SleepAbort::WakeSourceUnavailable
            | SleepAbort::UnexpectedWake
            | SleepAbort::RetainedStateUnavailable => {
                warn!("power: sleep aborted, {}", reason.name());
            }
            _ => info!("power: sleep aborted, {}", reason.name()),
        }
        self.transition(PowerState::Active);
    }

    /// `DeepSleep → Active`, called from the boot path after a deep-sleep
    /// wake.
    pub fn resume(&mut self) {
        self.transition(PowerState::Active);
    }

    fn transition(&mut self, next: PowerState) {
        if self.state != next {
            info!("power: {} -> {}", self.state.name(), next.name());
            self.state = next;
        }
    }
}

fn veto_within(alarm: AlarmStatus, now_us: u64, window_us: u64) -> Option<SleepAbort> {
    if alarm.triggered {
        return Some(SleepAbort::AlarmTriggered);
    }
    let deadline = alarm.deadline()?;
    (deadline.saturating_sub(now_us) <= window_us).then_some(SleepAbort::AlarmImminent)
}

impl Default for SleepScheduler {
    fn default() -> Self {
        Self::new(SchedulerConfig::new())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use super::*;

    const S: u64 = 1_000_000;

    #[test]
    fn starts_active() {
        assert_eq!(SleepScheduler::default().state(), PowerState::Active);
    }

    #[test]
    fn inactivity_threshold_is_inclusive() {
        let sched = SleepScheduler::default();
        assert!(!sched.is_inactive(60 * S - 1, 0));
        assert!(sched.is_inactive(60 * S, 0));
        // A timestamp from the future (clock bridged backwards) is not idle.
        assert!(!sched.is_inactive(10, 20));
    }

    #[test]
    fn not_inactive_outside_active() {
        let mut sched = SleepScheduler::default();
        sched.begin_grace(0, AlarmStatus::NONE).unwrap();
        assert!(!sched.is_inactive(u64::MAX, 0));
    }

    #[test]
    fn triggered_alarm_blocks_grace() {
        let mut sched = SleepScheduler::default();
        assert_eq!(
            sched.begin_grace(100 * S, AlarmStatus::ringing()),
            Err(SleepAbort::AlarmTriggered)
        );
        assert_eq!(sched.state(), PowerState::Active);
    }

    #[test]
    fn alarm_within_window_blocks_grace() {
        let mut sched = SleepScheduler::default();
        let now = 100 * S;
        assert_eq!(
            sched.begin_grace(now, AlarmStatus::at(now + 6 * S)),
            Err(SleepAbort::AlarmImminent)
        );
        assert_eq!(sched.begin_grace(now, AlarmStatus::at(now + 6 * S + 1)), Ok(()));
        assert_eq!(sched.state(), PowerState::LightSleepGrace);
    }

    #[test]
    fn past_untriggered_alarm_is_imminent() {
        let sched = SleepScheduler::default();
        assert_eq!(
            sched.alarm_veto(AlarmStatus::at(5), 100 * S),
            Some(SleepAbort::AlarmImminent)
        );
    }

    #[test]
    fn no_alarm_means_no_timer_wake() {
        let mut sched = SleepScheduler::default();
        sched.begin_grace(0, AlarmStatus::NONE).unwrap();
        let plan = sched.commit_deep_sleep(5 * S, AlarmStatus::NONE).unwrap();
        assert_eq!(plan.timer_wake_us, None);
        assert_eq!(sched.state(), PowerState::DeepSleep);
    }

    #[test]
    fn timer_wake_lands_one_guard_before_alarm() {
        let mut sched = SleepScheduler::default();
        let alarm = AlarmStatus::at(95 * S);
        sched.begin_grace(65 * S, alarm).unwrap();
        let plan = sched.commit_deep_sleep(70 * S, alarm).unwrap();
        assert_eq!(plan.timer_wake_us, Some(24 * S));
    }

    #[test]
    fn recheck_aborts_to_active() {
        let mut sched = SleepScheduler::default();
        sched.begin_grace(60 * S, AlarmStatus::at(90 * S)).unwrap();
        assert_eq!(
            sched.commit_deep_sleep(87 * S, AlarmStatus::at(90 * S)),
            Err(SleepAbort::AlarmImminent)
        );
        assert_eq!(sched.state(), PowerState::Active);
    }

    #[test]
    fn recheck_window_is_shorter_than_grace_window() {
        let mut sched = SleepScheduler::default();
        let alarm = AlarmStatus::at(72 * S);
        sched.begin_grace(60 * S, alarm).unwrap();
        // Inside the pre-grace window, outside the re-check window.
        let plan = sched.commit_deep_sleep(68 * S, alarm).unwrap();
        assert_eq!(plan.timer_wake_us, Some(3 * S));
        assert_eq!(sched.state(), PowerState::DeepSleep);
    }

    #[test]
    fn recheck_boundary_is_inclusive() {
        let sched = SleepScheduler::default();
        let now = 100 * S;
        assert_eq!(
            sched.recheck_veto(AlarmStatus::at(now + 3 * S), now),
            Some(SleepAbort::AlarmImminent)
        );
        assert_eq!(sched.recheck_veto(AlarmStatus::at(now + 3 * S + 1), now), None);
        assert_eq!(
            sched.recheck_veto(AlarmStatus::ringing(), now),
            Some(SleepAbort::AlarmTriggered)
        );
    }

    #[test]
    fn resume_returns_to_active() {
        let mut sched = SleepScheduler::default();
        sched.begin_grace(0, AlarmStatus::NONE).unwrap();
        sched.commit_deep_sleep(0, AlarmStatus::NONE).unwrap();
        sched.resume();
        assert_eq!(sched.state(), PowerState::Active);
    }
}
