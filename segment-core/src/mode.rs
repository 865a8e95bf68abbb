//! Interaction mode state
//!
//! Five orthogonal state slots: the primary mode plus the draw, lasso,
//! lasso-draw and label sub-modes. Each slot is a plain in-memory value
//! with a default, an optional cycle order, and a visibility flag;
//! rendering layers subscribe to the values instead of the values being
//! derived from the render tree.

use serde::{Deserialize, Serialize};

/// Primary interaction mode. Only one is active at a time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    View,
    Label,
    Erase,
    Add,
    Lasso,
}

/// Sub-mode of the add/erase draw tool.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DrawMode {
    #[default]
    Fill,
    NoFill,
    Select,
}

/// Whether a closed lasso adds to the partial base or erases.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LassoMode {
    #[default]
    Add,
    Erase,
}

/// How lasso edges are produced.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LassoDrawMode {
    /// Each step is snapped server-side to a suggested boundary.
    #[default]
    Magnetic,
    Manual,
}

/// Polarity applied to new label points.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LabelMode {
    #[default]
    Positive,
    Negative,
}

/// Cursor affordance the embedding UI should present.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CursorStyle {
    #[default]
    Default,
    Crosshair,
    Progress,
    /// The native cursor is hidden; the UI draws the radius circle.
    Hidden,
}

impl Mode {
    pub fn display_name(self) -> &'static str {
        match self {
            Mode::View => "view",
            Mode::Label => "label",
            Mode::Erase => "erase",
            Mode::Add => "add",
            Mode::Lasso => "lasso",
        }
    }
}

/// One state slot: a value with a default, a cycle order, and visibility.
#[derive(Clone, Debug)]
pub struct StateSlot<S> {
    value: S,
    default: S,
    cycle_order: Vec<S>,
    visible: bool,
}

impl<S: Copy + PartialEq> StateSlot<S> {
    /// Create a slot. `cycle_order` lists the states `cycle()` advances
    /// through; it may exclude states reachable only via `set()`.
    pub fn new(default: S, cycle_order: Vec<S>) -> Self {
        Self {
            value: default,
            default,
            cycle_order,
            visible: false,
        }
    }

    pub fn get(&self) -> S {
        self.value
    }

    pub fn is(&self, value: S) -> bool {
        self.value == value
    }

    pub fn set(&mut self, value: S) {
        self.value = value;
    }

    /// Back to the default value.
    pub fn reset(&mut self) {
        self.value = self.default;
    }

    /// Advance to the next state in the cycle order, wrapping. A current
    /// value outside the cycle order restarts at the first entry.
    pub fn cycle(&mut self) {
        if self.cycle_order.is_empty() {
            return;
        }
        let next = self
            .cycle_order
            .iter()
            .position(|s| *s == self.value)
            .map(|i| (i + 1) % self.cycle_order.len())
            .unwrap_or(0);
        self.value = self.cycle_order[next];
    }

    pub fn show(&mut self) {
        self.visible = true;
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }
}

/// The draw-mode cycle deliberately excludes `Select`; select is entered
/// only explicitly.
pub fn draw_mode_slot() -> StateSlot<DrawMode> {
    StateSlot::new(DrawMode::Fill, vec![DrawMode::Fill, DrawMode::NoFill])
}

pub fn lasso_mode_slot() -> StateSlot<LassoMode> {
    StateSlot::new(LassoMode::Add, vec![LassoMode::Add, LassoMode::Erase])
}

pub fn lasso_draw_mode_slot() -> StateSlot<LassoDrawMode> {
    StateSlot::new(
        LassoDrawMode::Magnetic,
        vec![LassoDrawMode::Magnetic, LassoDrawMode::Manual],
    )
}

pub fn label_mode_slot() -> StateSlot<LabelMode> {
    StateSlot::new(
        LabelMode::Positive,
        vec![LabelMode::Positive, LabelMode::Negative],
    )
}

pub fn mode_slot() -> StateSlot<Mode> {
    StateSlot::new(
        Mode::View,
        vec![Mode::View, Mode::Label, Mode::Lasso, Mode::Add, Mode::Erase],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_set_and_reset() {
        let mut slot = draw_mode_slot();
        assert!(slot.is(DrawMode::Fill));

        slot.set(DrawMode::Select);
        assert_eq!(slot.get(), DrawMode::Select);

        slot.reset();
        assert_eq!(slot.get(), DrawMode::Fill);
    }

    #[test]
    fn test_cycle_wraps() {
        let mut slot = lasso_mode_slot();
        slot.cycle();
        assert_eq!(slot.get(), LassoMode::Erase);
        slot.cycle();
        assert_eq!(slot.get(), LassoMode::Add);
    }

    #[test]
    fn test_cycle_from_out_of_order_state_restarts() {
        let mut slot = draw_mode_slot();
        slot.set(DrawMode::Select);
        // Select is not in the cycle order, so cycling restarts at Fill.
        slot.cycle();
        assert_eq!(slot.get(), DrawMode::Fill);
    }

    #[test]
    fn test_visibility_is_independent_of_value() {
        let mut slot = label_mode_slot();
        assert!(!slot.is_visible());
        slot.show();
        slot.set(LabelMode::Negative);
        assert!(slot.is_visible());
        slot.hide();
        assert_eq!(slot.get(), LabelMode::Negative);
    }
}
