//! Pointer and modifier snapshot
//!
//! The embedding UI feeds decoded input events into this snapshot; mode
//! transitions and tool commits read it instead of receiving ad-hoc
//! flags.

use kurbo::Point;

/// Pointer buttons the engine distinguishes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

/// Last known pointer and modifier state.
#[derive(Clone, Debug)]
pub struct InputState {
    pub pointer: Point,
    pub button: Option<PointerButton>,
    pub shift: bool,
    pub alt: bool,
}

impl Default for InputState {
    fn default() -> Self {
        Self {
            pointer: Point::ZERO,
            button: None,
            shift: false,
            alt: false,
        }
    }
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is(&self, button: PointerButton) -> bool {
        self.button == Some(button)
    }

    /// True while the secondary button is held. Inverts draw fill and
    /// lasso add/erase behavior.
    pub fn secondary_held(&self) -> bool {
        self.is(PointerButton::Secondary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button_state() {
        let mut input = InputState::new();
        assert!(!input.is(PointerButton::Primary));

        input.button = Some(PointerButton::Secondary);
        assert!(input.secondary_held());
        assert!(!input.is(PointerButton::Primary));

        input.button = None;
        assert!(!input.secondary_held());
    }
}
