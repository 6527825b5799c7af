//! Cursor proximity: highlight the nearest member, push the rest away.
//!
//! [`resolve`] is a pure function of the cursor and the members' screen-space
//! orbit targets. It recomputes every candidate on each call.

#[cfg(test)]
#[path = "proximity_test.rs"]
mod proximity_test;

use crate::config::CloudConfig;
use crate::geom::Point;
use crate::member::{MemberId, MemberStyle};

/// A member eligible for the proximity effect, at its screen-space target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub id: MemberId,
    pub screen: Point,
}

/// Compute the style of every candidate for a cursor at `cursor`.
///
/// The single nearest candidate strictly inside the threshold is highlighted.
/// Other candidates inside the threshold are pushed along cursor→member by
/// `(threshold - distance) / threshold * max_shift`. Candidates at or beyond
/// the threshold are neutral. Output order follows `candidates`.
#[must_use]
pub fn resolve(cursor: Point, candidates: &[Candidate], config: &CloudConfig) -> Vec<(MemberId, MemberStyle)> {
    let threshold = config.proximity_threshold;

    let nearest = candidates
        .iter()
        .map(|c| (c.id, c.screen.distance(cursor)))
        .fold(None, |best: Option<(MemberId, f64)>, (id, dist)| match best {
            Some((_, best_dist)) if best_dist <= dist => best,
            _ => Some((id, dist)),
        })
        .map(|(id, _)| id);

    candidates
        .iter()
        .map(|c| {
            let offset = c.screen - cursor;
            let dist = offset.length();
            let style = if dist >= threshold {
                MemberStyle::NEUTRAL
            } else if Some(c.id) == nearest {
                MemberStyle {
                    shift: Point::ZERO,
                    scale: config.highlight_scale,
                    z_index: Some(config.highlight_z),
                    pointer_cursor: true,
                }
            } else {
                let force = (threshold - dist) / threshold;
                // Coincident with the cursor: no direction to push along.
                let shift = if dist > f64::EPSILON {
                    offset.scale(config.max_shift * force / dist)
                } else {
                    Point::ZERO
                };
                MemberStyle { shift, scale: 1.0, z_index: Some(config.repel_z), pointer_cursor: false }
            };
            (c.id, style)
        })
        .collect()
}
