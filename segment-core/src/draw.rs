//! Draw tool state
//!
//! Tracks the in-progress add/erase stroke. The tool exposes explicit
//! begin/append/take/cancel operations; the session validates and commits
//! on finish, so an abandoned or mode-mismatched stroke is simply
//! discarded.

use crate::buffer;
use crate::input::PointerButton;
use crate::mode::Mode;
use crate::polygon::PolygonSet;
use kurbo::Point;

/// Which accumulation layer a stroke feeds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StrokeTarget {
    Add,
    Erase,
}

impl StrokeTarget {
    /// The primary mode this target belongs to.
    pub fn mode(self) -> Mode {
        match self {
            StrokeTarget::Add => Mode::Add,
            StrokeTarget::Erase => Mode::Erase,
        }
    }

    pub fn from_mode(mode: Mode) -> Option<StrokeTarget> {
        match mode {
            Mode::Add => Some(StrokeTarget::Add),
            Mode::Erase => Some(StrokeTarget::Erase),
            _ => None,
        }
    }
}

/// An in-progress stroke.
#[derive(Clone, Debug)]
pub struct ActiveStroke {
    pub target: StrokeTarget,
    pub button: PointerButton,
    pub points: Vec<Point>,
}

impl ActiveStroke {
    /// Buffered preview of the stroke. `fill` reduces the buffer to its
    /// outer boundary.
    pub fn preview(&self, radius: f64, fill: bool) -> PolygonSet {
        let buffered = buffer::buffer_stroke(&self.points, radius);
        if fill {
            buffered.exterior()
        } else {
            buffered
        }
    }
}

/// Holder for the single in-progress stroke.
#[derive(Debug, Default)]
pub struct DrawTool {
    active: Option<ActiveStroke>,
}

impl DrawTool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn active(&self) -> Option<&ActiveStroke> {
        self.active.as_ref()
    }

    /// Start a stroke. Any previous stroke is dropped.
    pub fn begin(&mut self, target: StrokeTarget, button: PointerButton, start: Point) {
        self.active = Some(ActiveStroke {
            target,
            button,
            points: vec![start],
        });
    }

    /// Append a pointer position to the active stroke, if any.
    pub fn append(&mut self, point: Point) {
        if let Some(stroke) = self.active.as_mut() {
            stroke.points.push(point);
        }
    }

    /// Take the stroke for committing.
    pub fn take(&mut self) -> Option<ActiveStroke> {
        self.active.take()
    }

    /// Drop the stroke without committing.
    pub fn cancel(&mut self) {
        self.active = None;
    }
}
