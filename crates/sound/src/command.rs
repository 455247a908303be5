//! Commands accepted by the playback task.

use crate::note::{Melody, Note, Pitch};

/// One unit of work for [`SoundEngine::run`](crate::SoundEngine::run).
///
/// Melodies are borrowed; the caller keeps them alive (usually `static`)
/// for as long as the command may be playing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SoundCommand<'m> {
    /// A single pitch for `duration_ms`.
    SingleTone {
        /// Pitch to sound.
        pitch: Pitch,
        /// Duration in milliseconds.
        duration_ms: u16,
    },
    /// A melody played to the end. Ignores cancellation.
    Melody(Melody<'m>),
    /// A melody that stops on [`cancel_current`](crate::SoundEngine::cancel_current),
    /// optionally repeating until then.
    InterruptibleMelody {
        /// Notes to play.
        notes: Melody<'m>,
        /// Start over after the last note.
        looping: bool,
    },
}

impl<'m> SoundCommand<'m> {
    /// Single-note command from a [`Note`].
    pub const fn tone(note: Note) -> Self {
        SoundCommand::SingleTone {
            pitch: note.pitch,
            duration_ms: note.duration_ms,
        }
    }

    /// `true` if [`cancel_current`](crate::SoundEngine::cancel_current) can stop it.
    pub const fn is_interruptible(&self) -> bool {
        matches!(self, SoundCommand::InterruptibleMelody { .. })
    }

    /// Short display name for log lines.
    pub const fn name(&self) -> &'static str {
        match self {
            SoundCommand::SingleTone { .. } => "tone",
            SoundCommand::Melody(_) => "melody",
            SoundCommand::InterruptibleMelody { looping: false, .. } => "interruptible melody",
            SoundCommand::InterruptibleMelody { looping: true, .. } => "looping melody",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::CONFIRM_TONE;

    #[test]
    fn only_interruptible_melodies_can_be_cancelled() {
        static NOTES: [Note; 1] = [Note::new(Pitch::A4, 10)];
        assert!(!SoundCommand::tone(CONFIRM_TONE).is_interruptible());
        assert!(!SoundCommand::Melody(&NOTES).is_interruptible());
        assert!(SoundCommand::InterruptibleMelody { notes: &NOTES, looping: true }.is_interruptible());
    }

    #[test]
    fn tone_copies_the_note() {
        assert_eq!(
            SoundCommand::tone(CONFIRM_TONE),
            SoundCommand::SingleTone { pitch: Pitch::C6, duration_ms: 150 }
        );
    }
}
