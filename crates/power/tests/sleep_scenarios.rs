//! End-to-end sleep attempts against the platform mocks.
//!
//! The mock sleep controller advances the mock clock by the armed timer (or
//! a scripted delay), so these run instantly except where a jingle plays.

#![allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]

use input::{Event, EventQueue};
use platform::mocks::{
    MockAlarm, MockBuzzer, MockClock, MockPanel, MockRetainedStore, MockSleep, PanelOp, ToneCall,
};
use platform::{AlarmStatus, Button, ButtonSet, DisplayError, WakeCause};
use power::{PowerState, SchedulerConfig, SleepAbort, SleepCycle, SleepOutcome, Timekeeper};
use sound::{SoundEngine, SLEEP_JINGLE};

const S: u64 = 1_000_000;

struct Rig {
    clock: MockClock,
    sleep: MockSleep,
    alarm: MockAlarm,
    store: MockRetainedStore,
    buzzer: MockBuzzer,
    time: Timekeeper<MockClock>,
    queue: EventQueue,
    sound: SoundEngine<'static, MockBuzzer>,
}

type Cycle<'a> =
    SleepCycle<'a, 'static, MockSleep, MockAlarm, MockRetainedStore, MockClock, MockBuzzer>;

impl Rig {
    /// Device idle since t=0, now at t=60 s.
    fn idle_for_a_minute() -> Self {
        let clock = MockClock::new();
        let buzzer = MockBuzzer::new();
        let rig = Self {
            sleep: MockSleep::new(clock.clone()),
            alarm: MockAlarm::new(),
            store: MockRetainedStore::new(),
            time: Timekeeper::new(clock.clone()),
            queue: EventQueue::new(),
            sound: SoundEngine::new(buzzer.clone()),
            buzzer,
            clock,
        };
        rig.clock.set_uptime_us(60 * S);
        rig
    }

    fn cycle(&self, config: SchedulerConfig) -> Cycle<'_> {
        SleepCycle::new(
            config,
            self.sleep.clone(),
            self.alarm.clone(),
            self.store.clone(),
            &self.time,
            &self.queue,
            &self.sound,
        )
    }
}

fn quiet() -> SchedulerConfig {
    SchedulerConfig::new().play_jingle(false)
}

fn stale_press(at_us: u64) -> Event {
    Event::ButtonPress {
        button: Button::A,
        held: ButtonSet::single(Button::A),
        timestamp_us: at_us,
        is_repeat: false,
    }
}

#[tokio::test]
async fn alarm_far_enough_away_proceeds_to_deep_sleep() {
    let rig = Rig::idle_for_a_minute();
    rig.alarm.set(AlarmStatus::at(90 * S));
    let mut cycle = rig.cycle(quiet());
    let mut panel = MockPanel::new();

    assert!(cycle.is_due());
    let outcome = cycle.enter_sleep_cycle(&mut panel).await;

    assert_eq!(outcome, SleepOutcome::Suspended);
    assert_eq!(cycle.state(), PowerState::DeepSleep);
    assert_eq!(rig.sleep.light_sleeps(), 1);
    assert_eq!(rig.sleep.deep_sleeps(), 1);
    // Grace expired at 65 s, alarm at 90 s: wake 1 s early.
    assert_eq!(rig.sleep.deep_sleep_timer_us(), Some(24 * S));
    assert_eq!(rig.sleep.deep_sleep_gpio(), Some(Button::A));
    assert_eq!(panel.ops(), [PanelOp::Flush, PanelOp::PowerOff]);

    let saved = rig.store.contents().unwrap();
    assert_eq!(saved.clock_offset_us, 65 * S);
    assert_eq!(saved.planned_sleep_us, Some(24 * S));
}

#[tokio::test]
async fn alarm_due_at_grace_expiry_aborts() {
    let rig = Rig::idle_for_a_minute();
    // 8 s away when grace starts, 3 s away when it ends.
    rig.alarm.set(AlarmStatus::at(68 * S));
    let mut cycle = rig.cycle(quiet());
    let mut panel = MockPanel::new();

    let outcome = cycle.enter_sleep_cycle(&mut panel).await;

    assert_eq!(outcome, SleepOutcome::Aborted(SleepAbort::AlarmImminent));
    assert_eq!(cycle.state(), PowerState::Active);
    assert_eq!(rig.sleep.deep_sleeps(), 0);
    assert!(panel.is_powered());
    assert_eq!(rig.store.contents(), None);
    // Cancel tone queued for the playback task.
    assert!(rig.sound.is_playing());
}

#[tokio::test]
async fn button_wake_during_grace_returns_active_with_empty_queue() {
    let rig = Rig::idle_for_a_minute();
    rig.sleep.push_wake_after(WakeCause::Gpio, 2 * S);
    let mut cycle = rig.cycle(quiet());
    let mut panel = MockPanel::new();

    // The waking press itself reaches the queue before the cycle resumes.
    rig.queue.enqueue(stale_press(61 * S));
    let outcome = cycle.enter_sleep_cycle(&mut panel).await;

    assert_eq!(outcome, SleepOutcome::Aborted(SleepAbort::ButtonWake));
    assert_eq!(cycle.state(), PowerState::Active);
    assert!(rig.queue.is_empty());
    assert_eq!(rig.queue.last_event_timestamp(), 62 * S);
    assert!(!cycle.is_due());
    assert_eq!(
        panel.ops(),
        [PanelOp::Flush, PanelOp::PowerOff, PanelOp::PowerOn]
    );
    assert_eq!(rig.sleep.armed_gpio(), None);
    assert_eq!(rig.sleep.armed_timer_us(), None);
}

#[tokio::test]
async fn ringing_alarm_never_starts_grace() {
    let rig = Rig::idle_for_a_minute();
    rig.alarm.set(AlarmStatus::ringing());
    let mut cycle = rig.cycle(quiet());
    let mut panel = MockPanel::new();

    let outcome = cycle.enter_sleep_cycle(&mut panel).await;

    assert_eq!(outcome, SleepOutcome::Aborted(SleepAbort::AlarmTriggered));
    assert_eq!(rig.sleep.light_sleeps(), 0);
    assert!(panel.ops().is_empty());
}

#[tokio::test]
async fn unknown_wake_is_recoverable() {
    let rig = Rig::idle_for_a_minute();
    rig.sleep.push_wake(WakeCause::Unknown);
    let mut cycle = rig.cycle(quiet());

    let outcome = cycle.enter_sleep_cycle(&mut MockPanel::new()).await;

    assert_eq!(outcome, SleepOutcome::Aborted(SleepAbort::UnexpectedWake));
    assert_eq!(cycle.state(), PowerState::Active);
}

#[tokio::test]
async fn wake_source_failure_stays_awake() {
    let rig = Rig::idle_for_a_minute();
    rig.sleep.fail_gpio_arming();
    let mut cycle = rig.cycle(quiet());
    let mut panel = MockPanel::new();

    let outcome = cycle.enter_sleep_cycle(&mut panel).await;

    assert_eq!(
        outcome,
        SleepOutcome::Aborted(SleepAbort::WakeSourceUnavailable)
    );
    assert_eq!(rig.sleep.light_sleeps(), 0);
    assert!(panel.is_powered());
}

#[tokio::test]
async fn alarm_just_outside_recheck_window_sleeps_with_short_timer() {
    let rig = Rig::idle_for_a_minute();
    // 9 s away when grace starts, 4 s away when it ends.
    rig.alarm.set(AlarmStatus::at(69 * S));
    let mut cycle = rig.cycle(quiet());

    let outcome = cycle.enter_sleep_cycle(&mut MockPanel::new()).await;

    assert_eq!(outcome, SleepOutcome::Suspended);
    assert_eq!(rig.sleep.deep_sleep_timer_us(), Some(3 * S));
    assert_eq!(rig.store.contents().unwrap().planned_sleep_us, Some(3 * S));
}

#[tokio::test]
async fn distant_alarm_sleeps_for_the_longest_timer_available() {
    let rig = Rig::idle_for_a_minute();
    rig.sleep.limit_timer_us(30 * S);
    rig.alarm.set(AlarmStatus::at(3_600 * S));
    let mut cycle = rig.cycle(quiet());

    let outcome = cycle.enter_sleep_cycle(&mut MockPanel::new()).await;

    assert_eq!(outcome, SleepOutcome::Suspended);
    assert_eq!(rig.sleep.deep_sleep_timer_us(), Some(30 * S));
    // The early wake is what gets credited on resume.
    assert_eq!(rig.store.contents().unwrap().planned_sleep_us, Some(30 * S));
}

#[tokio::test]
async fn unsaved_clock_keeps_the_device_awake() {
    let rig = Rig::idle_for_a_minute();
    rig.store.set_failing(true);
    let mut cycle = rig.cycle(quiet());
    let mut panel = MockPanel::new();

    let outcome = cycle.enter_sleep_cycle(&mut panel).await;

    assert_eq!(
        outcome,
        SleepOutcome::Aborted(SleepAbort::RetainedStateUnavailable)
    );
    assert_eq!(cycle.state(), PowerState::Active);
    assert_eq!(rig.sleep.deep_sleeps(), 0);
    assert_eq!(rig.sleep.armed_timer_us(), None);
    assert_eq!(rig.sleep.armed_gpio(), None);
    assert!(panel.is_powered());
    assert!(!cycle.is_due());
}

#[tokio::test]
async fn display_failure_does_not_block_sleep() {
    let rig = Rig::idle_for_a_minute();
    let mut cycle = rig.cycle(quiet());
    let mut panel = MockPanel::new();
    panel.fail_power_off(DisplayError::Busy);

    assert_eq!(
        cycle.enter_sleep_cycle(&mut panel).await,
        SleepOutcome::Suspended
    );
    assert_eq!(rig.sleep.deep_sleep_timer_us(), None);
}

#[tokio::test]
async fn sleep_jingle_plays_before_deep_sleep() {
    let rig = Rig::idle_for_a_minute();
    let mut cycle = rig.cycle(SchedulerConfig::new());

    cycle.enter_sleep_cycle(&mut MockPanel::new()).await;

    let expected: Vec<u16> = SLEEP_JINGLE.iter().map(|n| n.pitch.hz()).collect();
    assert_eq!(rig.buzzer.tones(), expected);
    assert_eq!(rig.buzzer.last(), Some(ToneCall::Silence));
}

#[tokio::test]
async fn resume_bridges_clock_and_discards_wake_press() {
    let rig = Rig::idle_for_a_minute();
    rig.alarm.set(AlarmStatus::at(90 * S));
    rig.cycle(quiet())
        .enter_sleep_cycle(&mut MockPanel::new())
        .await;

    // Reset: RAM is gone, the counter restarts, the timer fires after 24 s.
    rig.clock.reset_after_sleep(24 * S);
    let time = Timekeeper::new(rig.clock.clone());
    let queue: EventQueue = EventQueue::new();
    queue.enqueue(stale_press(0));
    let mut cycle = SleepCycle::new(
        quiet(),
        rig.sleep.clone(),
        rig.alarm.clone(),
        rig.store.clone(),
        &time,
        &queue,
        &rig.sound,
    );

    assert!(cycle.resume(WakeCause::Timer));
    assert_eq!(cycle.state(), PowerState::Active);
    assert_eq!(time.now_us(), 89 * S);
    assert!(queue.is_empty());
    assert_eq!(queue.last_event_timestamp(), 89 * S);
}

#[tokio::test]
async fn snooze_survives_deep_sleep() {
    let rig = Rig::idle_for_a_minute();
    let mut cycle = rig.cycle(quiet());
    cycle.set_alarm_snoozed_at_us(42 * S);
    cycle.enter_sleep_cycle(&mut MockPanel::new()).await;

    let mut resumed = rig.cycle(quiet());
    assert_eq!(resumed.alarm_snoozed_at_us(), 0);
    resumed.resume(WakeCause::Gpio);
    assert_eq!(resumed.alarm_snoozed_at_us(), 42 * S);
}

#[test]
fn lost_retained_state_restarts_clock() {
    let rig = Rig::idle_for_a_minute();
    let mut cycle = rig.cycle(quiet());
    rig.store.set_failing(true);

    assert!(!cycle.resume(WakeCause::Gpio));
    assert_eq!(rig.time.now_us(), 60 * S);
}

#[test]
fn first_boot_invalidates_retained_state() {
    let rig = Rig::idle_for_a_minute();
    let mut cycle = rig.cycle(quiet());
    cycle.first_boot();
    assert_eq!(rig.store.contents(), None);
    assert_eq!(rig.queue.last_event_timestamp(), 60 * S);
}
