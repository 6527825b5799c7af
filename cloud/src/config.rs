//! Tunable parameters for placement, orbit motion, springs, and proximity.
//!
//! Every field has a default matching the production page, so a partial JSON
//! document (or none at all) yields a usable configuration. Values loaded from
//! outside the crate go through [`CloudConfig::validate`] before use.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use serde::{Deserialize, Serialize};

/// Errors produced while loading or validating a [`CloudConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("`{field}` must be positive, got {value}")]
    NonPositive { field: &'static str, value: f64 },
    #[error("inner radius {inner} must be smaller than outer zone start {outer_start}")]
    InnerOverlapsOuter { inner: f64, outer_start: f64 },
    #[error("outer zone start {start} exceeds outer zone end {end}")]
    InvertedOuterZone { start: f64, end: f64 },
    #[error("`{field}` must lie in {range}, got {value}")]
    OutOfRange { field: &'static str, range: &'static str, value: f64 },
    #[error("placement attempt budget must be at least 1")]
    NoPlacementAttempts,
}

/// Cloud configuration. All distances are CSS pixels; speeds are radians per
/// nominal frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudConfig {
    /// Approximate rendered diameter of a member.
    pub member_size: f64,
    /// Extra spacing required between outer placements.
    pub buffer: f64,
    /// Fixed orbit radius of the inner ring.
    pub inner_radius: f64,
    /// Inner bound of the outer placement annulus.
    pub outer_zone_start: f64,
    /// Outer bound of the outer placement annulus.
    pub outer_zone_end: f64,
    /// Y scale applied to every orbit, making them elliptical.
    pub vertical_factor: f64,
    pub inner_speed: f64,
    /// Outer ring speed as a fraction of `inner_speed`.
    pub outer_speed_ratio: f64,
    pub stiffness: f64,
    pub damping: f64,
    /// A snapping member settles once its distance to target is below this.
    pub settle_distance: f64,
    /// A snapping member settles once its squared speed is below this.
    pub settle_speed_sq: f64,
    pub proximity_threshold: f64,
    pub max_shift: f64,
    pub highlight_scale: f64,
    pub highlight_z: i32,
    pub repel_z: i32,
    pub placement_attempts: u32,
    /// Width of the angular jitter window, in sectors (2.5 → ±1.25 sectors).
    pub jitter_sectors: f64,
    /// Maximum number of outer members drawn from the roster.
    pub outer_count: usize,
    pub outer_spawn_delay_ms: f64,
    pub inner_reveal_stagger_ms: f64,
    pub outer_reveal_stagger_ms: f64,
    /// Period of the idle CSS shake animation; each member gets a random phase within it.
    pub shake_period_s: f64,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            member_size: 80.0,
            buffer: 10.0,
            inner_radius: 210.0,
            outer_zone_start: 310.0,
            outer_zone_end: 430.0,
            vertical_factor: 0.8,
            inner_speed: 0.0015,
            outer_speed_ratio: 0.3,
            stiffness: 0.02,
            damping: 0.85,
            settle_distance: 0.5,
            settle_speed_sq: 0.01,
            proximity_threshold: 250.0,
            max_shift: 20.0,
            highlight_scale: 1.15,
            highlight_z: 50,
            repel_z: 1,
            placement_attempts: 500,
            jitter_sectors: 2.5,
            outer_count: 20,
            outer_spawn_delay_ms: 250.0,
            inner_reveal_stagger_ms: 100.0,
            outer_reveal_stagger_ms: 50.0,
            shake_period_s: 5.0,
        }
    }
}

impl CloudConfig {
    /// Parse a (possibly partial) JSON document and validate the result.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON, or the first
    /// [`validate`](Self::validate) failure.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Minimum center-to-center distance between two outer placements.
    #[must_use]
    pub fn min_separation(&self) -> f64 {
        self.member_size + self.buffer
    }

    #[must_use]
    pub fn outer_speed(&self) -> f64 {
        self.inner_speed * self.outer_speed_ratio
    }

    /// Check the invariants the placement engine and integrator rely on.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint as a [`ConfigError`].
    #[allow(clippy::neg_cmp_op_on_partial_ord)]
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("member_size", self.member_size),
            ("inner_radius", self.inner_radius),
            ("outer_zone_start", self.outer_zone_start),
            ("proximity_threshold", self.proximity_threshold),
        ] {
            if !(value > 0.0) {
                return Err(ConfigError::NonPositive { field, value });
            }
        }
        if !(self.buffer >= 0.0) {
            return Err(ConfigError::OutOfRange { field: "buffer", range: "[0, inf)", value: self.buffer });
        }
        if self.inner_radius >= self.outer_zone_start {
            return Err(ConfigError::InnerOverlapsOuter {
                inner: self.inner_radius,
                outer_start: self.outer_zone_start,
            });
        }
        if !(self.outer_zone_start <= self.outer_zone_end) {
            return Err(ConfigError::InvertedOuterZone {
                start: self.outer_zone_start,
                end: self.outer_zone_end,
            });
        }
        if !(self.vertical_factor > 0.0 && self.vertical_factor <= 1.0) {
            return Err(ConfigError::OutOfRange {
                field: "vertical_factor",
                range: "(0, 1]",
                value: self.vertical_factor,
            });
        }
        if !(self.stiffness > 0.0 && self.stiffness <= 1.0) {
            return Err(ConfigError::OutOfRange { field: "stiffness", range: "(0, 1]", value: self.stiffness });
        }
        if !(self.damping > 0.0 && self.damping < 1.0) {
            return Err(ConfigError::OutOfRange { field: "damping", range: "(0, 1)", value: self.damping });
        }
        if self.placement_attempts == 0 {
            return Err(ConfigError::NoPlacementAttempts);
        }
        Ok(())
    }
}
