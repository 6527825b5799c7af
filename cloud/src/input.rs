//! Pointer input types and the drag gesture state.
//!
//! `DragState` is the single active gesture between pointer-down and
//! pointer-up. It holds the context needed to turn cumulative pointer deltas
//! into a member position. Only one member can be dragged at a time.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use crate::geom::Point;
use crate::member::MemberId;

/// Source of a pointer event. Mouse and touch share one code path; the kind
/// is kept for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointerKind {
    #[default]
    Mouse,
    Touch,
}

/// A pointer sample in client coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerSample {
    pub client: Point,
    pub kind: PointerKind,
}

impl PointerSample {
    #[must_use]
    pub fn mouse(x: f64, y: f64) -> Self {
        Self { client: Point::new(x, y), kind: PointerKind::Mouse }
    }

    #[must_use]
    pub fn touch(x: f64, y: f64) -> Self {
        Self { client: Point::new(x, y), kind: PointerKind::Touch }
    }
}

/// Internal state of the drag gesture.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DragState {
    /// No drag in progress.
    #[default]
    Idle,
    /// A member follows the pointer.
    Dragging {
        /// Member being dragged.
        id: MemberId,
        /// Client position of the pointer at drag start.
        start_client: Point,
        /// Center-relative member position at drag start.
        start_position: Point,
    },
}

impl DragState {
    /// Id of the member being dragged, if any.
    #[must_use]
    pub fn active(&self) -> Option<MemberId> {
        match self {
            Self::Idle => None,
            Self::Dragging { id, .. } => Some(*id),
        }
    }

    /// Member position for a pointer at `client`: drag-start position plus
    /// the cumulative pointer delta. `None` when idle.
    #[must_use]
    pub fn position_for(&self, client: Point) -> Option<Point> {
        match self {
            Self::Idle => None,
            Self::Dragging { start_client, start_position, .. } => Some(*start_position + (client - *start_client)),
        }
    }
}
