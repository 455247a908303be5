//! Event mask: one bit per (button, transition) pair.
//!
//! Bit layout follows the button index: presses occupy bits 0..6, releases
//! bits 6..12. A set bit means "drop this transition at capture time".

use platform::{Button, ButtonSet, Transition, BUTTON_COUNT};

/// 12-bit set of masked (button, transition) pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EventMask(u16);

impl EventMask {
    const VALID: u16 = 0x0FFF;

    /// Nothing masked.
    pub const NONE: EventMask = EventMask(0);

    /// Every press and release masked.
    pub const ALL: EventMask = EventMask(Self::VALID);

    /// Every press masked.
    pub const ALL_PRESSES: EventMask = EventMask(0x003F);

    /// Every release masked.
    pub const ALL_RELEASES: EventMask = EventMask(0x0FC0);

    /// Mask from raw bits; bits above the twelfth are discarded.
    pub const fn from_bits(bits: u16) -> Self {
        EventMask(bits & Self::VALID)
    }

    /// Raw bits.
    pub const fn bits(self) -> u16 {
        self.0
    }

    /// Bit position of a (button, transition) pair, `0..12`.
    ///
    /// This is also the slot index used by the debounce table.
    pub const fn slot(button: Button, transition: Transition) -> usize {
        match transition {
            Transition::Press => button.index(),
            // Cannot overflow: index < 6.
            #[allow(clippy::arithmetic_side_effects)]
            Transition::Release => button.index() + BUTTON_COUNT,
        }
    }

    /// Mask for exactly one (button, transition) pair.
    pub const fn of(button: Button, transition: Transition) -> Self {
        EventMask(1 << Self::slot(button, transition))
    }

    /// Mask for the press of `button`.
    pub const fn press(button: Button) -> Self {
        Self::of(button, Transition::Press)
    }

    /// Mask for the release of `button`.
    pub const fn release(button: Button) -> Self {
        Self::of(button, Transition::Release)
    }

    /// Mask for both transitions of every button in `buttons`.
    pub const fn buttons(buttons: ButtonSet) -> Self {
        let bits = buttons.bits() as u16;
        EventMask(bits | (bits << BUTTON_COUNT))
    }

    /// `true` if the pair is masked.
    pub const fn contains(self, button: Button, transition: Transition) -> bool {
        self.0 & Self::of(button, transition).0 != 0
    }

    /// `true` if nothing is masked.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Union.
    #[must_use]
    pub const fn union(self, other: EventMask) -> Self {
        EventMask(self.0 | other.0)
    }

    /// `self` with every bit of `other` cleared.
    #[must_use]
    pub const fn without(self, other: EventMask) -> Self {
        EventMask(self.0 & !other.0)
    }
}

impl core::ops::BitOr for EventMask {
    type Output = EventMask;

    fn bitor(self, rhs: EventMask) -> EventMask {
        self.union(rhs)
    }
}

impl core::ops::BitOrAssign for EventMask {
    fn bitor_assign(&mut self, rhs: EventMask) {
        *self = self.union(rhs);
    }
}

impl core::ops::Not for EventMask {
    type Output = EventMask;

    fn not(self) -> EventMask {
        EventMask::ALL.without(self)
    }
}
