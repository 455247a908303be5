//! Single-slot sound engine.
//!
//! [`SoundEngine`] owns the buzzer. Fire-and-forget commands go through a
//! depth-1 slot drained by [`SoundEngine::run`], which must be spawned as its
//! own task. Blocking playback ([`SoundEngine::play`],
//! [`SoundEngine::play_interruptible`]) runs on the caller's task and shares
//! the buzzer through an async mutex, so at most one melody sounds at a time.
//! Blocking playback takes priority: it cancels a background interruptible
//! melody before waiting for the buzzer, so a looping melody cannot stall the
//! caller.
//!
//! ```text
//! submit ──► slot (depth 1) ──► run() ──► ToneOutput
//!                                  ▲
//! cancel_current ──► cancel Signal ┘
//! ```
//!
//! Cancellation races the note timer, so an interruptible melody stops
//! within one executor poll of [`SoundEngine::cancel_current`] rather than at
//! the next note boundary.

use core::cell::Cell;

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::mutex::{Mutex as AsyncMutex, MutexGuard};
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Instant, Timer};
use input::{EventMask, EventQueue};
use platform::{Button, ToneOutput};

use crate::command::SoundCommand;
use crate::note::{Note, Pitch};

/// Buzzer owner plus the asynchronous playback slot.
pub struct SoundEngine<'m, T: ToneOutput> {
    buzzer: AsyncMutex<CriticalSectionRawMutex, T>,
    slot: Mutex<CriticalSectionRawMutex, Cell<Option<SoundCommand<'m>>>>,
    pending: Signal<CriticalSectionRawMutex, ()>,
    cancel: Signal<CriticalSectionRawMutex, ()>,
}

impl<'m, T: ToneOutput> SoundEngine<'m, T> {
    /// Engine driving `buzzer`, idle.
    pub const fn new(buzzer: T) -> Self {
        Self {
            buzzer: AsyncMutex::new(buzzer),
            slot: Mutex::new(Cell::new(None)),
            pending: Signal::new(),
            cancel: Signal::new(),
        }
    }

    // ── Asynchronous API ────────────────────────────────────────────────────

    /// Hand `command` to the playback task without waiting.
    ///
    /// Returns `false`, and drops `command`, if another command is still
    /// queued or playing.
    pub fn submit(&self, command: SoundCommand<'m>) -> bool {
        let accepted = self.slot.lock(|slot| {
            if slot.get().is_some() {
                false
            } else {
                slot.set(Some(command));
                true
            }
        });
        if accepted {
            debug!("sound: queued {}", command.name());
            self.pending.signal(());
        } else {
            warn!("sound queue busy, dropping {}", command.name());
        }
        accepted
    }

    /// Ask the playback task to stop an interruptible melody.
    ///
    /// No-op when nothing is queued or playing. Non-interruptible commands
    /// play to the end regardless.
    pub fn cancel_current(&self) {
        if self.is_playing() {
            debug!("sound: cancel requested");
            self.cancel.signal(());
        }
    }

    /// `true` while a submitted command is queued or executing.
    pub fn is_playing(&self) -> bool {
        self.slot.lock(|slot| slot.get().is_some())
    }

    /// Playback task body. Never returns.
    ///
    /// The command stays in the slot while it plays, so [`is_playing`]
    /// reports it; the slot is freed only after the buzzer is silenced.
    ///
    /// [`is_playing`]: SoundEngine::is_playing
    pub async fn run(&self) -> ! {
        loop {
            self.pending.wait().await;
            while let Some(command) = self.slot.lock(Cell::get) {
                self.execute(command).await;
                self.slot.lock(|slot| slot.set(None));
                // A cancel aimed at this command must not leak into the next.
                self.cancel.reset();
            }
        }
    }

    async fn execute(&self, command: SoundCommand<'m>) {
        let mut buzzer = self.buzzer.lock().await;
        trace!("sound: playing {}", command.name());
        match command {
            SoundCommand::SingleTone { pitch, duration_ms } => {
                sound(&mut *buzzer, pitch);
                Timer::after(Duration::from_millis(u64::from(duration_ms))).await;
            }
            SoundCommand::Melody(notes) => {
                for note in notes {
                    sound(&mut *buzzer, note.pitch);
                    Timer::after(note_duration(note)).await;
                }
            }
            SoundCommand::InterruptibleMelody { notes, looping } => {
                'outer: loop {
                    for note in notes {
                        if self.cancel.signaled() {
                            break 'outer;
                        }
                        sound(&mut *buzzer, note.pitch);
                        if let Either::Second(()) =
                            select(Timer::after(note_duration(note)), self.cancel.wait()).await
                        {
                            debug!("sound: {} cancelled", command.name());
                            break 'outer;
                        }
                    }
                    if !looping || notes.is_empty() {
                        break;
                    }
                }
            }
        }
        buzzer.silence();
    }

    // ── Blocking API ────────────────────────────────────────────────────────

    /// Play `melody` to the end on the calling task.
    ///
    /// A background interruptible melody is cancelled; a background tone or
    /// plain melody finishes first.
    pub async fn play(&self, melody: &[Note]) {
        let mut buzzer = self.preempt().await;
        for note in melody {
            sound(&mut *buzzer, note.pitch);
            Timer::after(note_duration(note)).await;
        }
        buzzer.silence();
    }

    /// Play one pitch for `duration_ms` on the calling task.
    pub async fn play_tone(&self, pitch: Pitch, duration_ms: u16) {
        self.play(&[Note::new(pitch, duration_ms)]).await;
    }

    /// Play `melody` on the calling task, stopping early if `cancel` is
    /// pressed.
    ///
    /// While playing, every event except a press of `cancel` is masked and
    /// the queue is drained. The previous mask is restored on every exit
    /// path, including the future being dropped. Returns `true` if the melody
    /// was interrupted.
    pub async fn play_interruptible<const N: usize>(
        &self,
        melody: &[Note],
        queue: &EventQueue<N>,
        cancel: Button,
    ) -> bool {
        let mut buzzer = self.preempt().await;
        let _mask = queue.scoped_mask(EventMask::ALL.without(EventMask::press(cancel)));
        queue.clear();

        for note in melody {
            sound(&mut *buzzer, note.pitch);
            let deadline = Instant::now()
                .checked_add(note_duration(note))
                .unwrap_or(Instant::MAX);
            loop {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining == Duration::from_ticks(0) {
                    break;
                }
                if queue.dequeue(remaining).await.is_press_of(cancel) {
                    buzzer.silence();
                    info!("sound: melody interrupted by {}", cancel.name());
                    return true;
                }
            }
        }
        buzzer.silence();
        false
    }

    async fn preempt(&self) -> MutexGuard<'_, CriticalSectionRawMutex, T> {
        self.cancel_current();
        self.buzzer.lock().await
    }
}

fn sound<T: ToneOutput + ?Sized>(buzzer: &mut T, pitch: Pitch) {
    if pitch.is_rest() {
        buzzer.silence();
    } else {
        buzzer.tone(pitch.hz());
    }
}

fn note_duration(note: &Note) -> Duration {
    Duration::from_millis(u64::from(note.duration_ms))
}

#[cfg(test)]
#[allow(clippy::arithmetic_side_effects, clippy::indexing_slicing)]
mod tests {
    use core::future::Future;

    use embassy_futures::join::join;
    use embassy_time::Timer;
    use input::{CaptureConfig, InputCapture};
    use platform::mocks::{MockBuzzer, MockButtons, ToneCall};

    use super::*;
    use crate::note::CONFIRM_TONE;

    const NOTE_MS: u16 = 40;

    static SCALE: [Note; 5] = [
        Note::new(Pitch::C5, NOTE_MS),
        Note::new(Pitch::D5, NOTE_MS),
        Note::new(Pitch::E5, NOTE_MS),
        Note::new(Pitch::F5, NOTE_MS),
        Note::new(Pitch::G5, NOTE_MS),
    ];

    static WITH_REST: [Note; 3] = [
        Note::new(Pitch::A4, 10),
        Note::rest(10),
        Note::new(Pitch::A5, 10),
    ];

    async fn with_engine<F: Future>(engine: &SoundEngine<'_, MockBuzzer>, body: F) -> F::Output {
        match select(engine.run(), body).await {
            Either::First(never) => never,
            Either::Second(out) => out,
        }
    }

    fn now_us() -> u64 {
        Instant::now().as_micros()
    }

    #[tokio::test]
    async fn blocking_melody_plays_every_note_then_silences() {
        let buzzer = MockBuzzer::new();
        let engine = SoundEngine::new(buzzer.clone());

        engine.play(&WITH_REST).await;

        assert_eq!(
            buzzer.calls(),
            [ToneCall::Tone(440), ToneCall::Silence, ToneCall::Tone(880), ToneCall::Silence]
        );
    }

    #[tokio::test]
    async fn blocking_melody_takes_its_full_duration() {
        let engine = SoundEngine::new(MockBuzzer::new());
        let started = Instant::now();
        engine.play(&SCALE).await;
        assert!(started.elapsed() >= Duration::from_millis(5 * u64::from(NOTE_MS)));
    }

    #[tokio::test]
    async fn play_tone_is_a_single_note() {
        let buzzer = MockBuzzer::new();
        let engine = SoundEngine::new(buzzer.clone());
        engine.play_tone(CONFIRM_TONE.pitch, 5).await;
        assert_eq!(buzzer.tones(), [1047]);
        assert_eq!(buzzer.last(), Some(ToneCall::Silence));
    }

    #[tokio::test]
    async fn interruptible_stops_on_cancel_press_and_restores_mask() {
        let queue: EventQueue = EventQueue::new();
        let capture = InputCapture::new(&queue, CaptureConfig::new().debounce_ms(1));
        let lines = MockButtons::new();
        let buzzer = MockBuzzer::new();
        let engine = SoundEngine::new(buzzer.clone());

        let before = EventMask::release(Button::Up);
        queue.set_mask(before);

        let (interrupted, ()) = join(engine.play_interruptible(&SCALE, &queue, Button::B), async {
            // Inside note 2 (index 1).
            Timer::after_millis(u64::from(NOTE_MS) + u64::from(NOTE_MS) / 2).await;
            lines.press(Button::B);
            capture.on_edge(Button::B, &lines, now_us());
        })
        .await;

        assert!(interrupted);
        let tones = buzzer.tones();
        assert!(tones.len() <= 2, "played past the cancel: {tones:?}");
        assert_eq!(buzzer.last(), Some(ToneCall::Silence));
        assert_eq!(queue.current_mask(), before);
    }

    #[tokio::test]
    async fn interruptible_ignores_other_buttons() {
        let queue: EventQueue = EventQueue::new();
        let capture = InputCapture::new(&queue, CaptureConfig::new().debounce_ms(1));
        let lines = MockButtons::new();
        let buzzer = MockBuzzer::new();
        let engine = SoundEngine::new(buzzer.clone());

        let (interrupted, ()) = join(engine.play_interruptible(&SCALE, &queue, Button::B), async {
            Timer::after_millis(u64::from(NOTE_MS)).await;
            lines.press(Button::A);
            assert!(capture.on_edge(Button::A, &lines, now_us()).is_none());
        })
        .await;

        assert!(!interrupted);
        assert_eq!(buzzer.tones().len(), SCALE.len());
        assert_eq!(queue.current_mask(), EventMask::NONE);
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn interruptible_discards_stale_events() {
        let queue: EventQueue = EventQueue::new();
        queue.enqueue(input::Event::ButtonPress {
            button: Button::B,
            held: platform::ButtonSet::single(Button::B),
            timestamp_us: 1,
            is_repeat: false,
        });
        let engine = SoundEngine::new(MockBuzzer::new());

        assert!(!engine.play_interruptible(&WITH_REST, &queue, Button::B).await);
    }

    #[tokio::test]
    async fn submitted_melody_finishes_without_cancel() {
        let buzzer = MockBuzzer::new();
        let engine = SoundEngine::new(buzzer.clone());

        with_engine(&engine, async {
            assert!(engine.submit(SoundCommand::InterruptibleMelody { notes: &SCALE, looping: false }));
            assert!(engine.is_playing());
            Timer::after_millis(5 * u64::from(NOTE_MS) + 100).await;
            assert!(!engine.is_playing());
        })
        .await;

        assert_eq!(buzzer.tones().len(), SCALE.len());
        assert_eq!(buzzer.last(), Some(ToneCall::Silence));
    }

    #[tokio::test]
    async fn second_submission_is_dropped_while_busy() {
        let buzzer = MockBuzzer::new();
        let engine = SoundEngine::new(buzzer.clone());

        with_engine(&engine, async {
            assert!(engine.submit(SoundCommand::Melody(&SCALE)));
            assert!(!engine.submit(SoundCommand::tone(CONFIRM_TONE)));
            Timer::after_millis(5 * u64::from(NOTE_MS) + 100).await;
        })
        .await;

        assert!(!buzzer.tones().contains(&CONFIRM_TONE.pitch.hz()));
    }

    #[tokio::test]
    async fn cancel_stops_looping_melody_within_a_note() {
        let buzzer = MockBuzzer::new();
        let engine = SoundEngine::new(buzzer.clone());

        with_engine(&engine, async {
            engine.submit(SoundCommand::InterruptibleMelody { notes: &SCALE, looping: true });
            // Long enough to wrap around at least once.
            Timer::after_millis(7 * u64::from(NOTE_MS)).await;
            assert!(engine.is_playing());

            engine.cancel_current();
            Timer::after_millis(u64::from(NOTE_MS)).await;
            assert!(!engine.is_playing());
        })
        .await;

        assert!(buzzer.tones().len() > SCALE.len());
        assert_eq!(buzzer.last(), Some(ToneCall::Silence));
    }

    #[tokio::test]
    async fn blocking_play_preempts_looping_background_melody() {
        let buzzer = MockBuzzer::new();
        let engine = SoundEngine::new(buzzer.clone());

        with_engine(&engine, async {
            engine.submit(SoundCommand::InterruptibleMelody {
                notes: &SCALE[..2],
                looping: true,
            });
            Timer::after_millis(30).await;
            assert!(engine.is_playing());

            let played =
                embassy_time::with_timeout(Duration::from_secs(2), engine.play(&WITH_REST)).await;
            assert!(played.is_ok(), "blocking play stalled behind the loop");
            assert!(!engine.is_playing());
        })
        .await;

        assert!(buzzer.tones().ends_with(&[440, 880]));
        assert_eq!(buzzer.last(), Some(ToneCall::Silence));
    }

    #[tokio::test]
    async fn plain_melody_ignores_cancel_and_cancel_does_not_leak() {
        let buzzer = MockBuzzer::new();
        let engine = SoundEngine::new(buzzer.clone());

        with_engine(&engine, async {
            engine.submit(SoundCommand::Melody(&WITH_REST));
            engine.cancel_current();
            Timer::after_millis(100).await;
            assert!(!engine.is_playing());

            // The unused cancel was discarded with the previous command.
            engine.submit(SoundCommand::InterruptibleMelody { notes: &WITH_REST, looping: false });
            Timer::after_millis(100).await;
        })
        .await;

        assert_eq!(buzzer.tones(), [440, 880, 440, 880]);
    }

    #[tokio::test]
    async fn cancel_when_idle_is_a_no_op() {
        let buzzer = MockBuzzer::new();
        let engine = SoundEngine::new(buzzer.clone());

        with_engine(&engine, async {
            engine.cancel_current();
            engine.submit(SoundCommand::InterruptibleMelody { notes: &WITH_REST, looping: false });
            Timer::after_millis(100).await;
        })
        .await;

        assert_eq!(buzzer.tones(), [440, 880]);
    }

    #[tokio::test]
    async fn empty_looping_melody_ends() {
        let engine = SoundEngine::new(MockBuzzer::new());
        with_engine(&engine, async {
            engine.submit(SoundCommand::InterruptibleMelody { notes: &[], looping: true });
            Timer::after_millis(20).await;
            assert!(!engine.is_playing());
        })
        .await;
    }
}
