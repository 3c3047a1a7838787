//! # Digital Buttons
//!
//! Button identifiers and the per-tick pressed bitmask.
//!
//! | Button | evdev Code |
//! |--------|------------|
//! | South (×) | BTN_SOUTH |
//! | East (○) | BTN_EAST |
//! | West (□) | BTN_WEST |
//! | North (△) | BTN_NORTH |
//! | L1 / R1 | BTN_TL / BTN_TR |
//! | L2 / R2 (click) | BTN_TL2 / BTN_TR2 |
//! | Select / Start / Mode | BTN_SELECT / BTN_START / BTN_MODE |
//! | L3 / R3 | BTN_THUMBL / BTN_THUMBR |
//! | Touchpad | BTN_TOUCH |
//! | D-Pad | ABS_HAT0X / ABS_HAT0Y |

use bitflags::bitflags;
use std::fmt;
use std::str::FromStr;

use crate::error::EngineError;

bitflags! {
    /// Set of currently pressed buttons.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ButtonMask: u32 {
        const SOUTH = 1 << 0;
        const EAST = 1 << 1;
        const WEST = 1 << 2;
        const NORTH = 1 << 3;
        const L1 = 1 << 4;
        const R1 = 1 << 5;
        const L2 = 1 << 6;
        const R2 = 1 << 7;
        const SELECT = 1 << 8;
        const START = 1 << 9;
        const MODE = 1 << 10;
        const L3 = 1 << 11;
        const R3 = 1 << 12;
        const TOUCHPAD = 1 << 13;
        const DPAD_UP = 1 << 14;
        const DPAD_DOWN = 1 << 15;
        const DPAD_LEFT = 1 << 16;
        const DPAD_RIGHT = 1 << 17;
    }
}

/// One digital button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    South,
    East,
    West,
    North,
    L1,
    R1,
    L2,
    R2,
    Select,
    Start,
    Mode,
    L3,
    R3,
    Touchpad,
    DpadUp,
    DpadDown,
    DpadLeft,
    DpadRight,
}

impl Button {
    /// Every button, in bit order.
    pub const ALL: [Button; 18] = [
        Button::South,
        Button::East,
        Button::West,
        Button::North,
        Button::L1,
        Button::R1,
        Button::L2,
        Button::R2,
        Button::Select,
        Button::Start,
        Button::Mode,
        Button::L3,
        Button::R3,
        Button::Touchpad,
        Button::DpadUp,
        Button::DpadDown,
        Button::DpadLeft,
        Button::DpadRight,
    ];

    /// The mask bit for this button.
    #[must_use]
    pub fn mask(self) -> ButtonMask {
        match self {
            Button::South => ButtonMask::SOUTH,
            Button::East => ButtonMask::EAST,
            Button::West => ButtonMask::WEST,
            Button::North => ButtonMask::NORTH,
            Button::L1 => ButtonMask::L1,
            Button::R1 => ButtonMask::R1,
            Button::L2 => ButtonMask::L2,
            Button::R2 => ButtonMask::R2,
            Button::Select => ButtonMask::SELECT,
            Button::Start => ButtonMask::START,
            Button::Mode => ButtonMask::MODE,
            Button::L3 => ButtonMask::L3,
            Button::R3 => ButtonMask::R3,
            Button::Touchpad => ButtonMask::TOUCHPAD,
            Button::DpadUp => ButtonMask::DPAD_UP,
            Button::DpadDown => ButtonMask::DPAD_DOWN,
            Button::DpadLeft => ButtonMask::DPAD_LEFT,
            Button::DpadRight => ButtonMask::DPAD_RIGHT,
        }
    }

    /// Position in [`Button::ALL`].
    #[must_use]
    pub fn index(self) -> usize {
        self.mask().bits().trailing_zeros() as usize
    }

    /// Lower-case name used for event names and logs.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Button::South => "south",
            Button::East => "east",
            Button::West => "west",
            Button::North => "north",
            Button::L1 => "l1",
            Button::R1 => "r1",
            Button::L2 => "l2",
            Button::R2 => "r2",
            Button::Select => "select",
            Button::Start => "start",
            Button::Mode => "mode",
            Button::L3 => "l3",
            Button::R3 => "r3",
            Button::Touchpad => "touchpad",
            Button::DpadUp => "dpad_up",
            Button::DpadDown => "dpad_down",
            Button::DpadLeft => "dpad_left",
            Button::DpadRight => "dpad_right",
        }
    }
}

impl fmt::Display for Button {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Button {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Button::ALL
            .into_iter()
            .find(|b| b.name() == s)
            .ok_or_else(|| EngineError::InvalidArgument(format!("unknown button '{}'", s)))
    }
}

impl ButtonMask {
    /// Iterates the buttons set in this mask.
    pub fn buttons(self) -> impl Iterator<Item = Button> {
        Button::ALL.into_iter().filter(move |b| self.contains(b.mask()))
    }
}

impl From<Button> for ButtonMask {
    fn from(button: Button) -> Self {
        button.mask()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_button_has_a_distinct_bit() {
        let mut all = ButtonMask::empty();
        for button in Button::ALL {
            assert!(!all.intersects(button.mask()), "{} overlaps", button);
            all |= button.mask();
        }
        assert_eq!(all, ButtonMask::all());
    }

    #[test]
    fn test_index_matches_all_order() {
        for (i, button) in Button::ALL.into_iter().enumerate() {
            assert_eq!(button.index(), i);
        }
    }

    #[test]
    fn test_mask_iteration() {
        let mask = ButtonMask::SOUTH | ButtonMask::DPAD_LEFT;
        let pressed: Vec<_> = mask.buttons().collect();
        assert_eq!(pressed, vec![Button::South, Button::DpadLeft]);
        assert_eq!(ButtonMask::empty().buttons().count(), 0);
    }

    #[test]
    fn test_names() {
        assert_eq!(Button::DpadUp.to_string(), "dpad_up");
        assert_eq!(ButtonMask::from(Button::R3), ButtonMask::R3);
    }

    #[test]
    fn test_parse_names() {
        for button in Button::ALL {
            assert_eq!(button.name().parse::<Button>().unwrap(), button);
        }
        assert!(matches!(
            "trigger".parse::<Button>(),
            Err(EngineError::InvalidArgument(_))
        ));
    }
}
