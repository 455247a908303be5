//! Notes, pitches and the built-in jingles.

/// Equal-tempered pitch, value in Hz (rounded), or [`Pitch::Rest`].
///
/// Flats only; `Db4` is the same key as C♯4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u16)]
#[allow(missing_docs)] // note names are self-describing
pub enum Pitch {
    /// Silence for the note's duration.
    Rest = 0,
    // Octave 0
    C0 = 16,
    Db0 = 17,
    D0 = 18,
    Eb0 = 19,
    E0 = 21,
    F0 = 22,
    Gb0 = 23,
    G0 = 25,
    Ab0 = 26,
    A0 = 28,
    Bb0 = 29,
    B0 = 31,
    // Octave 1
    C1 = 33,
    Db1 = 35,
    D1 = 37,
    Eb1 = 39,
    E1 = 41,
    F1 = 44,
    Gb1 = 46,
    G1 = 49,
    Ab1 = 52,
    A1 = 55,
    Bb1 = 58,
    B1 = 62,
    // Octave 2
    C2 = 65,
    Db2 = 69,
    D2 = 73,
    Eb2 = 78,
    E2 = 82,
    F2 = 87,
    Gb2 = 93,
    G2 = 98,
    Ab2 = 104,
    A2 = 110,
    Bb2 = 117,
    B2 = 123,
    // Octave 3
    C3 = 131,
    Db3 = 139,
    D3 = 147,
    Eb3 = 156,
    E3 = 165,
    F3 = 175,
    Gb3 = 185,
    G3 = 196,
    Ab3 = 208,
    A3 = 220,
    Bb3 = 233,
    B3 = 247,
    // Octave 4
    C4 = 262,
    Db4 = 277,
    D4 = 294,
    Eb4 = 311,
    E4 = 330,
    F4 = 349,
    Gb4 = 370,
    G4 = 392,
    Ab4 = 415,
    A4 = 440,
    Bb4 = 466,
    B4 = 494,
    // Octave 5
    C5 = 523,
    Db5 = 554,
    D5 = 587,
    Eb5 = 622,
    E5 = 659,
    F5 = 698,
    Gb5 = 740,
    G5 = 784,
    Ab5 = 831,
    A5 = 880,
    Bb5 = 932,
    B5 = 988,
    // Octave 6
    C6 = 1047,
    Db6 = 1109,
    D6 = 1175,
    Eb6 = 1245,
    E6 = 1319,
    F6 = 1397,
    Gb6 = 1479,
    G6 = 1568,
    Ab6 = 1661,
    A6 = 1760,
    Bb6 = 1865,
    B6 = 1976,
    // Octave 7
    C7 = 2093,
    Db7 = 2217,
    D7 = 2349,
    Eb7 = 2489,
    E7 = 2637,
    F7 = 2794,
    Gb7 = 2959,
    G7 = 3136,
    Ab7 = 3322,
    A7 = 3520,
    Bb7 = 3729,
    B7 = 3951,
    // Octave 8
    C8 = 4186,
}

impl Pitch {
    /// Frequency in Hz; `0` for [`Pitch::Rest`].
    pub const fn hz(self) -> u16 {
        self as u16
    }

    /// `true` for [`Pitch::Rest`].
    pub const fn is_rest(self) -> bool {
        matches!(self, Pitch::Rest)
    }
}

/// One note: a pitch held for `duration_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Note {
    /// Pitch (or rest).
    pub pitch: Pitch,
    /// How long it sounds, in milliseconds.
    pub duration_ms: u16,
}

impl Note {
    /// `pitch` for `duration_ms`.
    pub const fn new(pitch: Pitch, duration_ms: u16) -> Self {
        Self { pitch, duration_ms }
    }

    /// Silence for `duration_ms`.
    pub const fn rest(duration_ms: u16) -> Self {
        Self::new(Pitch::Rest, duration_ms)
    }
}

/// An ordered, borrowed sequence of notes. The engine never copies it.
pub type Melody<'m> = &'m [Note];

/// Total length of a melody in milliseconds.
pub fn melody_duration_ms(melody: &[Note]) -> u32 {
    melody
        .iter()
        .fold(0u32, |acc, n| acc.saturating_add(u32::from(n.duration_ms)))
}

// ── Built-in sounds ─────────────────────────────────────────────────────────

/// Rising arpeggio played at first boot.
pub const BOOT_JINGLE: [Note; 4] = [
    Note::new(Pitch::C5, 200),
    Note::new(Pitch::F5, 200),
    Note::new(Pitch::A5, 200),
    Note::new(Pitch::C6, 200),
];

/// Falling arpeggio played just before deep sleep.
pub const SLEEP_JINGLE: [Note; 4] = [
    Note::new(Pitch::C6, 200),
    Note::new(Pitch::A5, 200),
    Note::new(Pitch::F5, 200),
    Note::new(Pitch::C5, 200),
];

/// Short blip acknowledging a confirmed action.
pub const CONFIRM_TONE: Note = Note::new(Pitch::C6, 150);

/// Short blip acknowledging a cancelled action.
pub const CANCEL_TONE: Note = Note::new(Pitch::A5, 150);

/// Short tick for moving a selection.
pub const NAVIGATION_TONE: Note = Note::new(Pitch::E5, 100);
