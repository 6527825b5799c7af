//! Orbit integration: ring rotation, per-member targets, and the damped
//! spring that carries a released member back onto its orbit.

#[cfg(test)]
#[path = "orbit_test.rs"]
mod orbit_test;

use std::f64::consts::TAU;

use serde::Serialize;

use crate::config::CloudConfig;
use crate::geom::Point;
use crate::member::{Orbit, Ring, Spring};

/// Phase of the `index`-th of `total` evenly spaced inner members.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn inner_phase(index: usize, total: usize) -> f64 {
    index as f64 * (TAU / total.max(1) as f64)
}

/// The two accumulated ring angles, in radians.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Rotation {
    pub inner: f64,
    pub outer: f64,
}

impl Rotation {
    /// Advance both rings by `frames` nominal frames.
    pub fn advance(&mut self, frames: f64, config: &CloudConfig) {
        self.inner += config.inner_speed * frames;
        self.outer += config.outer_speed() * frames;
    }

    #[must_use]
    pub fn angle(&self, ring: Ring) -> f64 {
        match ring {
            Ring::Inner => self.inner,
            Ring::Outer => self.outer,
        }
    }

    /// Target position of a member with `orbit` on `ring` at the current angles.
    ///
    /// Returns `None` when the orbit parameters are not finite.
    #[must_use]
    pub fn target(&self, ring: Ring, orbit: Orbit, vertical_factor: f64) -> Option<Point> {
        let p = orbit.point_at(self.angle(ring), vertical_factor);
        p.is_finite().then_some(p)
    }
}

/// Spring constants and settle thresholds, copied out of [`CloudConfig`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpringParams {
    pub stiffness: f64,
    pub damping: f64,
    pub settle_distance: f64,
    pub settle_speed_sq: f64,
}

impl From<&CloudConfig> for SpringParams {
    fn from(config: &CloudConfig) -> Self {
        Self {
            stiffness: config.stiffness,
            damping: config.damping,
            settle_distance: config.settle_distance,
            settle_speed_sq: config.settle_speed_sq,
        }
    }
}

/// One semi-implicit Euler step toward `target`:
///
/// ```text
/// v' = (v + (t - p) * k) * d
/// p' = p + v'
/// ```
///
/// Returns the new state and whether it has settled. Settling compares the
/// post-step speed and the pre-step distance against the thresholds.
#[must_use]
pub fn spring_step(spring: Spring, target: Point, params: &SpringParams) -> (Spring, bool) {
    let error = target - spring.position;
    let velocity = (spring.velocity + error.scale(params.stiffness)).scale(params.damping);
    let next = Spring { position: spring.position + velocity, velocity };

    let settled = velocity.length_sq() < params.settle_speed_sq
        && error.length_sq() < params.settle_distance * params.settle_distance;
    (next, settled)
}
