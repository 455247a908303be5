//! Input events delivered to the consumer task.

use platform::{Button, ButtonSet, Transition};

/// One input event.
///
/// Timestamps are microseconds on the monotonic since-first-boot clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    /// Nothing arrived before the dequeue timeout.
    #[default]
    None,
    /// A button went down (or is being held past the repeat delay).
    ButtonPress {
        /// Button that was pressed.
        button: Button,
        /// Every button held when the edge was handled.
        held: ButtonSet,
        /// When the press was accepted.
        timestamp_us: u64,
        /// Synthesised by the repeat tick rather than an edge.
        is_repeat: bool,
    },
    /// A button came back up.
    ButtonRelease {
        /// Button that was released.
        button: Button,
        /// Every button still held when the edge was handled.
        held: ButtonSet,
        /// When the release was accepted.
        timestamp_us: u64,
        /// Time since the accepted press of the same button, `0` if that press
        /// was never seen.
        press_duration_us: u64,
    },
}

impl Event {
    /// Button the event concerns, if any.
    pub const fn button(&self) -> Option<Button> {
        match self {
            Event::None => None,
            Event::ButtonPress { button, .. } | Event::ButtonRelease { button, .. } => {
                Some(*button)
            }
        }
    }

    /// Transition the event represents, if any.
    pub const fn transition(&self) -> Option<Transition> {
        match self {
            Event::None => None,
            Event::ButtonPress { .. } => Some(Transition::Press),
            Event::ButtonRelease { .. } => Some(Transition::Release),
        }
    }

    /// Acceptance time, if any.
    pub const fn timestamp_us(&self) -> Option<u64> {
        match self {
            Event::None => None,
            Event::ButtonPress { timestamp_us, .. } | Event::ButtonRelease { timestamp_us, .. } => {
                Some(*timestamp_us)
            }
        }
    }

    /// `true` for a press (edge or repeat) of `button`.
    pub fn is_press_of(&self, button: Button) -> bool {
        matches!(self, Event::ButtonPress { button: b, .. } if *b == button)
    }

    /// `true` for [`Event::None`].
    pub const fn is_none(&self) -> bool {
        matches!(self, Event::None)
    }

    /// Short display name for log lines.
    pub const fn name(&self) -> &'static str {
        match self {
            Event::None => "none",
            Event::ButtonPress { is_repeat: false, .. } => "press",
            Event::ButtonPress { is_repeat: true, .. } => "repeat",
            Event::ButtonRelease { .. } => "release",
        }
    }
}
