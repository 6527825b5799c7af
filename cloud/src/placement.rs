//! Outer-ring placement by bounded rejection sampling.
//!
//! Each member gets an even angular sector around a shared random offset and
//! tries random candidates inside the placement annulus until one keeps the
//! minimum separation from everything accepted so far. A member that exhausts
//! its attempt budget lands on the deterministic fallback: the center of its
//! sector on the outer edge of the annulus. Fallbacks skip the separation
//! check, so a crowded ring may overlap; that packing is accepted as is.

#[cfg(test)]
#[path = "placement_test.rs"]
mod placement_test;

use std::f64::consts::TAU;

use rand::Rng;
use serde::Serialize;

use crate::config::CloudConfig;
use crate::geom::Point;
use crate::member::Orbit;

/// Result of placing one outer member.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Placement {
    /// Permanent phase and radius for the member.
    pub orbit: Orbit,
    /// Initial center-relative position (Y compressed).
    pub position: Point,
    /// The attempt budget ran out and the fallback position was used.
    pub fallback: bool,
}

/// Place `count` outer members, in index order.
pub fn place_outer<R: Rng + ?Sized>(count: usize, config: &CloudConfig, rng: &mut R) -> Vec<Placement> {
    if count == 0 {
        return Vec::new();
    }

    #[allow(clippy::cast_precision_loss)]
    let sector = TAU / count as f64;
    let offset = rng.random::<f64>() * TAU;
    let min_gap = config.min_separation();
    let band = config.outer_zone_end - config.outer_zone_start;

    let mut accepted: Vec<Point> = Vec::with_capacity(count);
    let mut placements = Vec::with_capacity(count);

    for index in 0..count {
        #[allow(clippy::cast_precision_loss)]
        let base = offset + index as f64 * sector;

        let candidate = (0..config.placement_attempts).find_map(|_| {
            let jitter = (rng.random::<f64>() - 0.5) * sector * config.jitter_sectors;
            let orbit = Orbit::new(base + jitter, config.outer_zone_start + rng.random::<f64>() * band);
            let position = orbit.point_at(0.0, config.vertical_factor);
            accepted
                .iter()
                .all(|p| p.distance(position) >= min_gap)
                .then_some((orbit, position))
        });

        let placement = match candidate {
            Some((orbit, position)) => Placement { orbit, position, fallback: false },
            None => {
                log::warn!("outer member {index} exhausted {} placement attempts", config.placement_attempts);
                let orbit = Orbit::new(base, config.outer_zone_end);
                Placement { orbit, position: orbit.point_at(0.0, config.vertical_factor), fallback: true }
            }
        };
        accepted.push(placement.position);
        placements.push(placement);
    }

    placements
}
