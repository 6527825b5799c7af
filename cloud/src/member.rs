//! Member records: ring membership, orbit parameters, motion state and the
//! proximity style, plus the store that owns them.
//!
//! Each member is created once and never removed, so a [`MemberId`] is simply
//! its creation index and doubles as the index into [`MemberStore`].

#[cfg(test)]
#[path = "member_test.rs"]
mod member_test;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::consts::{INNER_MEMBER_CLASS, MEMBER_CLASS};
use crate::geom::Point;

/// Stable identifier for a member, assigned in creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberId(pub u32);

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "member-{}", self.0)
    }
}

/// Which concentric ring a member orbits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ring {
    /// Fixed-radius ring, evenly spaced, not draggable.
    Inner,
    /// Randomly packed annulus, draggable.
    Outer,
}

impl Ring {
    #[must_use]
    pub fn is_draggable(self) -> bool {
        matches!(self, Self::Outer)
    }

    /// Space-separated CSS classes for a member image on this ring.
    #[must_use]
    pub fn css_class(self) -> String {
        match self {
            Self::Inner => format!("{MEMBER_CLASS} {INNER_MEMBER_CLASS}"),
            Self::Outer => MEMBER_CLASS.to_owned(),
        }
    }
}

/// Fixed polar orbit parameters. Never change after placement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Orbit {
    /// Angle offset added to the ring angle, in radians.
    pub phase: f64,
    /// Horizontal semi-axis of the elliptical orbit.
    pub radius: f64,
}

impl Orbit {
    #[must_use]
    pub fn new(phase: f64, radius: f64) -> Self {
        Self { phase, radius }
    }

    /// Center-relative position on this orbit when the ring has rotated by
    /// `ring_angle`. Y is compressed by `vertical_factor`.
    #[must_use]
    pub fn point_at(&self, ring_angle: f64, vertical_factor: f64) -> Point {
        let angle = ring_angle + self.phase;
        Point {
            x: angle.cos() * self.radius,
            y: angle.sin() * self.radius * vertical_factor,
        }
    }
}

/// Spring state of a member catching up with its orbit after a drag.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Spring {
    pub position: Point,
    pub velocity: Point,
}

impl Spring {
    /// A spring at rest at `position`.
    #[must_use]
    pub fn at_rest(position: Point) -> Self {
        Self { position, velocity: Point::ZERO }
    }
}

/// Interaction state. A member is in exactly one of these at a time.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum Motion {
    /// Rendered position follows the orbit target every frame.
    #[default]
    Orbiting,
    /// Rendered position is owned by the pointer.
    Dragging,
    /// Rendered position springs toward the orbit target.
    Snapping(Spring),
}

impl Motion {
    #[must_use]
    pub fn kind(&self) -> MotionKind {
        match self {
            Self::Orbiting => MotionKind::Orbiting,
            Self::Dragging => MotionKind::Dragging,
            Self::Snapping(_) => MotionKind::Snapping,
        }
    }
}

/// [`Motion`] without its payload, as reported to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MotionKind {
    Orbiting,
    Dragging,
    Snapping,
}

/// Visual offset layered on top of the orbital position by the proximity effect.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MemberStyle {
    /// CSS `translate` offset.
    pub shift: Point,
    /// CSS `scale`.
    pub scale: f64,
    /// CSS `z-index`; `None` restores the stylesheet default.
    pub z_index: Option<i32>,
    /// Show a pointer cursor over the member.
    pub pointer_cursor: bool,
}

impl Default for MemberStyle {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

impl MemberStyle {
    pub const NEUTRAL: Self = Self {
        shift: Point::ZERO,
        scale: 1.0,
        z_index: None,
        pointer_cursor: false,
    };

    #[must_use]
    pub fn is_neutral(&self) -> bool {
        *self == Self::NEUTRAL
    }
}

/// One orbiting image and all of its mutable state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    /// Image source path.
    pub src: String,
    pub ring: Ring,
    /// `None` until the member has been placed.
    pub orbit: Option<Orbit>,
    /// Last rendered center-relative position.
    pub position: Point,
    /// Orbit target computed on the latest frame. Proximity reads this rather
    /// than `position`.
    pub target: Option<Point>,
    pub motion: Motion,
    pub style: MemberStyle,
}

impl Member {
    #[must_use]
    pub fn new(id: MemberId, src: String, ring: Ring) -> Self {
        Self {
            id,
            src,
            ring,
            orbit: None,
            position: Point::ZERO,
            target: None,
            motion: Motion::Orbiting,
            style: MemberStyle::NEUTRAL,
        }
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        matches!(self.motion, Motion::Dragging)
    }
}

/// Owns every member, in creation order.
#[derive(Debug, Clone, Default)]
pub struct MemberStore {
    members: Vec<Member>,
}

impl MemberStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a member at the origin and return its id.
    pub fn spawn(&mut self, src: String, ring: Ring) -> MemberId {
        let id = MemberId(u32::try_from(self.members.len()).unwrap_or(u32::MAX));
        self.members.push(Member::new(id, src, ring));
        id
    }

    #[must_use]
    pub fn get(&self, id: MemberId) -> Option<&Member> {
        self.members.get(id.0 as usize)
    }

    pub fn get_mut(&mut self, id: MemberId) -> Option<&mut Member> {
        self.members.get_mut(id.0 as usize)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Member> {
        self.members.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Member> {
        self.members.iter_mut()
    }

    /// Ids of all members on `ring`, in creation order.
    #[must_use]
    pub fn ids_on(&self, ring: Ring) -> Vec<MemberId> {
        self.members.iter().filter(|m| m.ring == ring).map(|m| m.id).collect()
    }
}
