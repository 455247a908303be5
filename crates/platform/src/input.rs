//! Button abstraction
//!
//! Six momentary, active-low push buttons. A [`Button`] names one line; a
//! [`ButtonSet`] packs any combination of them into the low six bits of a
//! byte, which is how "currently held" state travels inside events.

/// Number of physical buttons.
pub const BUTTON_COUNT: usize = 6;

/// Physical buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Button {
    /// Primary / confirm button (also the wake button)
    A = 0,
    /// Secondary / back button
    B = 1,
    /// D-pad up
    Up = 2,
    /// D-pad down
    Down = 3,
    /// D-pad left
    Left = 4,
    /// D-pad right
    Right = 5,
}

impl Button {
    /// All buttons in index order.
    pub const ALL: [Button; BUTTON_COUNT] = [
        Button::A,
        Button::B,
        Button::Up,
        Button::Down,
        Button::Left,
        Button::Right,
    ];

    /// Zero-based index, stable across builds (`A` = 0 … `Right` = 5).
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Button for an index produced by [`Button::index`].
    pub const fn from_index(index: usize) -> Option<Button> {
        match index {
            0 => Some(Button::A),
            1 => Some(Button::B),
            2 => Some(Button::Up),
            3 => Some(Button::Down),
            4 => Some(Button::Left),
            5 => Some(Button::Right),
            _ => None,
        }
    }

    /// Single-bit mask for this button.
    pub const fn bit(self) -> u8 {
        1 << (self as u8)
    }

    /// Short display name for log lines.
    pub const fn name(self) -> &'static str {
        match self {
            Button::A => "A",
            Button::B => "B",
            Button::Up => "UP",
            Button::Down => "DOWN",
            Button::Left => "LEFT",
            Button::Right => "RIGHT",
        }
    }
}

/// Direction of an electrical transition on a button line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Transition {
    /// Line went active (low).
    Press,
    /// Line returned to idle (high).
    Release,
}

impl Transition {
    /// Short display name for log lines.
    pub const fn name(self) -> &'static str {
        match self {
            Transition::Press => "press",
            Transition::Release => "release",
        }
    }
}

/// A set of buttons, one bit per [`Button`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ButtonSet(u8);

impl ButtonSet {
    const VALID: u8 = 0b0011_1111;

    /// No buttons.
    pub const EMPTY: ButtonSet = ButtonSet(0);

    /// Every button.
    pub const ALL: ButtonSet = ButtonSet(Self::VALID);

    /// Build a set from raw bits. Bits above the sixth are discarded.
    pub const fn from_bits(bits: u8) -> Self {
        ButtonSet(bits & Self::VALID)
    }

    /// Set containing exactly `button`.
    pub const fn single(button: Button) -> Self {
        ButtonSet(button.bit())
    }

    /// Raw bits.
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// `true` if no button is in the set.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// `true` if `button` is in the set.
    pub const fn contains(self, button: Button) -> bool {
        self.0 & button.bit() != 0
    }

    /// Copy of the set with `button` added.
    #[must_use]
    pub const fn with(self, button: Button) -> Self {
        ButtonSet(self.0 | button.bit())
    }

    /// Copy of the set with `button` removed.
    #[must_use]
    pub const fn without(self, button: Button) -> Self {
        ButtonSet(self.0 & !button.bit())
    }

    /// Add `button` in place.
    pub fn insert(&mut self, button: Button) {
        self.0 |= button.bit();
    }

    /// Number of buttons in the set.
    pub const fn len(self) -> u32 {
        self.0.count_ones()
    }

    /// Iterate the buttons in the set, in index order.
    pub fn iter(self) -> impl Iterator<Item = Button> {
        Button::ALL.into_iter().filter(move |b| self.contains(*b))
    }
}

impl FromIterator<Button> for ButtonSet {
    fn from_iter<I: IntoIterator<Item = Button>>(iter: I) -> Self {
        let mut set = ButtonSet::EMPTY;
        for button in iter {
            set.insert(button);
        }
        set
    }
}

/// Live view of the button lines.
///
/// Implementations read the physical level at call time; they must be cheap
/// and safe to call from interrupt context.
pub trait ButtonLevels {
    /// `true` while `button` is physically held (line low).
    fn is_pressed(&self, button: Button) -> bool;

    /// Every button currently held.
    fn snapshot(&self) -> ButtonSet {
        Button::ALL
            .into_iter()
            .filter(|b| self.is_pressed(*b))
            .collect()
    }
}

impl<T: ButtonLevels + ?Sized> ButtonLevels for &T {
    fn is_pressed(&self, button: Button) -> bool {
        (**self).is_pressed(button)
    }

    fn snapshot(&self) -> ButtonSet {
        (**self).snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_round_trips_for_every_button() {
        for (i, b) in Button::ALL.iter().enumerate() {
            assert_eq!(b.index(), i);
            assert_eq!(Button::from_index(i), Some(*b));
        }
        assert_eq!(Button::from_index(BUTTON_COUNT), None);
    }

    #[test]
    fn from_bits_discards_high_bits() {
        assert_eq!(ButtonSet::from_bits(0xFF), ButtonSet::ALL);
        assert_eq!(ButtonSet::from_bits(0xC0), ButtonSet::EMPTY);
    }

    #[test]
    fn with_and_without() {
        let set = ButtonSet::EMPTY.with(Button::A).with(Button::Right);
        assert!(set.contains(Button::A));
        assert!(set.contains(Button::Right));
        assert!(!set.contains(Button::B));
        assert_eq!(set.len(), 2);
        assert_eq!(set.without(Button::A), ButtonSet::single(Button::Right));
    }

    #[test]
    fn iter_yields_in_index_order() {
        let set: ButtonSet = [Button::Down, Button::A, Button::Left].into_iter().collect();
        let order: Vec<Button> = set.iter().collect();
        assert_eq!(order, [Button::A, Button::Down, Button::Left]);
    }

    struct Fixed(ButtonSet);

    impl ButtonLevels for Fixed {
        fn is_pressed(&self, button: Button) -> bool {
            self.0.contains(button)
        }
    }

    #[test]
    fn default_snapshot_collects_pressed_lines() {
        let held = ButtonSet::single(Button::B).with(Button::Up);
        assert_eq!(Fixed(held).snapshot(), held);
        assert_eq!((&Fixed(held)).snapshot(), held);
    }
}
