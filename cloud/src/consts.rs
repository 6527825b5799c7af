//! Shared numeric and styling constants for the cloud crate.

// ── Timing ──────────────────────────────────────────────────────

/// Duration of one nominal animation frame (60 Hz). Angular speeds and the
/// spring constants are tuned per nominal frame.
pub const NOMINAL_FRAME_MS: f64 = 1000.0 / 60.0;

/// Largest elapsed time a single tick will integrate. Longer gaps (a hidden
/// tab, a debugger pause) are clamped so the rings do not jump.
pub const MAX_TICK_MS: f64 = 250.0;

/// Upper bound on spring sub-steps integrated in one tick.
pub const MAX_SPRING_STEPS_PER_TICK: u32 = 4;

// ── Styling ─────────────────────────────────────────────────────

/// Base CSS class shared by every member image.
pub const MEMBER_CLASS: &str = "member-img";

/// Extra CSS class for inner-ring members.
pub const INNER_MEMBER_CLASS: &str = "section-member";

/// CSS class present while a member is being dragged.
pub const DRAGGING_CLASS: &str = "dragging";

/// CSS class present while a released member springs back to its orbit.
pub const SNAPPING_CLASS: &str = "snapping";

/// Transition restored on release. `left` / `top` are driven per frame and
/// must not be transitioned.
pub const RELEASE_TRANSITION: &str = "scale 0.4s ease-out, translate 0.4s ease-out, z-index 0s";
