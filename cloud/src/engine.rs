use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, RngCore, SeedableRng};
use serde::Serialize;

use crate::config::CloudConfig;
use crate::consts::{MAX_SPRING_STEPS_PER_TICK, MAX_TICK_MS, NOMINAL_FRAME_MS};
use crate::geom::{Point, Rect};
use crate::input::{DragState, PointerSample};
use crate::member::{Member, MemberId, MemberStore, MemberStyle, Motion, MotionKind, Orbit, Ring, Spring};
use crate::orbit::{Rotation, SpringParams, inner_phase, spring_step};
use crate::placement::place_outer;
use crate::proximity::{self, Candidate};
use crate::roster::Roster;

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

/// Actions returned from the core for the host to apply to the page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Remove whatever the container currently holds.
    ClearContainer,
    /// Append a new member image. `shake_offset_s` desynchronizes its idle
    /// shake animation.
    MemberCreated { id: MemberId, src: String, ring: Ring, shake_offset_s: f64 },
    /// Write a center-relative position.
    Move { id: MemberId, position: Point },
    /// Fade the member in.
    Reveal { id: MemberId },
    /// Apply a proximity style.
    Restyle { id: MemberId, style: MemberStyle },
    /// Interaction state changed (toggle classes and transitions).
    MotionChanged { id: MemberId, motion: MotionKind },
}

/// Serializable view of the whole cloud.
#[derive(Debug, Clone, Serialize)]
pub struct CloudSnapshot {
    pub clock_ms: f64,
    pub rotation: Rotation,
    pub dragging: Option<MemberId>,
    pub members: Vec<Member>,
}

#[derive(Debug, Clone, Copy)]
struct PendingReveal {
    due_ms: f64,
    id: MemberId,
}

/// Core cloud state: every member, the ring rotation, the drag gesture, and
/// the session clock.
///
/// Holds no browser handles so it can be driven from tests or a headless
/// binary. Randomness comes only from the injected generator.
pub struct CloudCore {
    pub config: CloudConfig,
    roster: Roster,
    members: MemberStore,
    rotation: Rotation,
    drag: DragState,
    clock_ms: f64,
    /// Fractional spring steps carried over between ticks.
    spring_budget: f64,
    outer_spawn_at: Option<f64>,
    /// Sorted by `due_ms`.
    reveals: Vec<PendingReveal>,
    initialized: bool,
    rng: Box<dyn RngCore>,
}

impl CloudCore {
    #[must_use]
    pub fn new(config: CloudConfig, roster: Roster, rng: impl RngCore + 'static) -> Self {
        Self {
            config,
            roster,
            members: MemberStore::new(),
            rotation: Rotation::default(),
            drag: DragState::Idle,
            clock_ms: 0.0,
            spring_budget: 0.0,
            outer_spawn_at: None,
            reveals: Vec::new(),
            initialized: false,
            rng: Box::new(rng),
        }
    }

    /// Build a core with a seeded [`StdRng`].
    #[must_use]
    pub fn with_seed(config: CloudConfig, roster: Roster, seed: u64) -> Self {
        Self::new(config, roster, StdRng::seed_from_u64(seed))
    }

    // --- Lifecycle ---

    /// Create the inner ring and schedule the outer ring.
    ///
    /// Runs once; later calls and an empty roster return no actions.
    pub fn init(&mut self) -> Vec<Action> {
        if self.initialized {
            return Vec::new();
        }
        if self.roster.is_empty() {
            log::debug!("member roster is empty; cloud not started");
            return Vec::new();
        }
        self.initialized = true;

        let mut actions = vec![Action::ClearContainer];
        let sources = self.roster.inner.clone();
        let total = sources.len();
        for (index, src) in sources.into_iter().enumerate() {
            let orbit = Orbit::new(inner_phase(index, total), self.config.inner_radius);
            let position = orbit.point_at(self.rotation.inner, self.config.vertical_factor);
            let id = self.spawn(src, Ring::Inner, orbit, position, &mut actions);
            #[allow(clippy::cast_precision_loss)]
            let delay = index as f64 * self.config.inner_reveal_stagger_ms;
            self.schedule_reveal(id, delay);
        }

        if !self.roster.outer.is_empty() && self.config.outer_count > 0 {
            self.outer_spawn_at = Some(self.clock_ms + self.config.outer_spawn_delay_ms);
        }
        self.release_due_reveals(&mut actions);

        log::debug!("cloud initialized with {total} inner members");
        actions
    }

    /// Advance the cloud by `elapsed_ms` of wall time.
    ///
    /// Ring angles advance in proportion to elapsed nominal frames. Springs
    /// integrate whole nominal steps, carrying the remainder to the next tick.
    /// Non-finite or negative elapsed times count as zero and long gaps are
    /// clamped.
    pub fn tick(&mut self, elapsed_ms: f64) -> Vec<Action> {
        if !self.initialized {
            return Vec::new();
        }
        let elapsed = if elapsed_ms.is_finite() { elapsed_ms.clamp(0.0, MAX_TICK_MS) } else { 0.0 };
        self.clock_ms += elapsed;

        let mut actions = Vec::new();
        if self.outer_spawn_at.is_some_and(|due| self.clock_ms >= due) {
            self.outer_spawn_at = None;
            self.spawn_outer(&mut actions);
        }
        self.release_due_reveals(&mut actions);

        let frames = elapsed / NOMINAL_FRAME_MS;
        self.rotation.advance(frames, &self.config);

        let cap = f64::from(MAX_SPRING_STEPS_PER_TICK);
        self.spring_budget = (self.spring_budget + frames).min(cap);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let steps = self.spring_budget.floor() as u32;
        self.spring_budget -= f64::from(steps);

        self.integrate(steps, &mut actions);
        actions
    }

    /// Advance by exactly one nominal frame.
    pub fn step(&mut self) -> Vec<Action> {
        self.tick(NOMINAL_FRAME_MS)
    }

    // --- Pointer input ---

    /// Begin dragging `id`. Inner members and unknown ids are ignored. A drag
    /// already in progress on another member is released first.
    pub fn on_pointer_down(&mut self, id: MemberId, sample: PointerSample) -> Vec<Action> {
        let Some(member) = self.members.get(id) else {
            return Vec::new();
        };
        if !member.ring.is_draggable() || member.orbit.is_none() || !sample.client.is_finite() {
            return Vec::new();
        }
        let start_position = member.position;

        let mut actions = Vec::new();
        if self.drag.active().is_some_and(|active| active != id) {
            actions.extend(self.end_drag());
        }

        if let Some(member) = self.members.get_mut(id) {
            if !member.is_dragging() {
                member.motion = Motion::Dragging;
                actions.push(Action::MotionChanged { id, motion: member.motion.kind() });
            }
        }
        self.drag = DragState::Dragging { id, start_client: sample.client, start_position };
        log::debug!("drag start on {id} ({:?})", sample.kind);
        actions
    }

    /// Move the dragged member with the pointer. No-op when idle.
    pub fn on_pointer_move(&mut self, sample: PointerSample) -> Vec<Action> {
        let (Some(id), Some(position)) = (self.drag.active(), self.drag.position_for(sample.client)) else {
            return Vec::new();
        };
        if !position.is_finite() {
            return Vec::new();
        }
        let Some(member) = self.members.get_mut(id) else {
            return Vec::new();
        };
        member.position = position;
        vec![Action::Move { id, position }]
    }

    /// Release the dragged member into the spring.
    pub fn on_pointer_up(&mut self) -> Vec<Action> {
        self.end_drag()
    }

    /// A cancelled pointer releases the same way as pointer-up.
    pub fn on_pointer_cancel(&mut self) -> Vec<Action> {
        self.end_drag()
    }

    /// Recompute proximity styles for a cursor at `sample` over the section.
    ///
    /// `container` is the cloud container's client rectangle; member targets
    /// are relative to its center. Dragging and unplaced members are left
    /// untouched. Only changed styles are reported.
    pub fn on_hover(&mut self, sample: PointerSample, container: Rect) -> Vec<Action> {
        let center = container.center();
        let candidates: Vec<Candidate> = self
            .members
            .iter()
            .filter(|m| !m.is_dragging())
            .filter_map(|m| m.target.map(|t| Candidate { id: m.id, screen: center + t }))
            .collect();

        let mut actions = Vec::new();
        for (id, style) in proximity::resolve(sample.client, &candidates, &self.config) {
            let Some(member) = self.members.get_mut(id) else {
                continue;
            };
            if member.style != style {
                member.style = style;
                actions.push(Action::Restyle { id, style });
            }
        }
        actions
    }

    // --- Queries ---

    #[must_use]
    pub fn member(&self, id: MemberId) -> Option<&Member> {
        self.members.get(id)
    }

    pub fn members(&self) -> impl Iterator<Item = &Member> {
        self.members.iter()
    }

    /// Ids of every member on `ring`, in creation order.
    #[must_use]
    pub fn ids_on(&self, ring: Ring) -> Vec<MemberId> {
        self.members.ids_on(ring)
    }

    /// The member currently being dragged, if any.
    #[must_use]
    pub fn dragging(&self) -> Option<MemberId> {
        self.drag.active()
    }

    #[must_use]
    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    #[must_use]
    pub fn clock_ms(&self) -> f64 {
        self.clock_ms
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Whether the delayed outer ring is still waiting to spawn.
    #[must_use]
    pub fn outer_pending(&self) -> bool {
        self.outer_spawn_at.is_some()
    }

    #[must_use]
    pub fn snapshot(&self) -> CloudSnapshot {
        CloudSnapshot {
            clock_ms: self.clock_ms,
            rotation: self.rotation,
            dragging: self.drag.active(),
            members: self.members.iter().cloned().collect(),
        }
    }

    // --- Internals ---

    fn spawn(
        &mut self,
        src: String,
        ring: Ring,
        orbit: Orbit,
        position: Point,
        actions: &mut Vec<Action>,
    ) -> MemberId {
        let shake_offset_s = self.rng.random::<f64>() * self.config.shake_period_s;
        let id = self.members.spawn(src.clone(), ring);
        if let Some(member) = self.members.get_mut(id) {
            member.orbit = Some(orbit);
            member.position = position;
            member.target = Some(position);
        }
        actions.push(Action::MemberCreated { id, src, ring, shake_offset_s });
        actions.push(Action::Move { id, position });
        id
    }

    fn spawn_outer(&mut self, actions: &mut Vec<Action>) {
        let selected = self.roster.select_outer(self.config.outer_count, self.rng.as_mut());
        let placements = place_outer(selected.len(), &self.config, self.rng.as_mut());

        let mut ids = Vec::with_capacity(selected.len());
        for (src, placement) in selected.into_iter().zip(placements) {
            ids.push(self.spawn(src, Ring::Outer, placement.orbit, placement.position, actions));
        }

        // Reveal in a different random order than placement so the fade-in
        // does not sweep around the ring.
        ids.shuffle(self.rng.as_mut());
        for (i, id) in ids.iter().enumerate() {
            #[allow(clippy::cast_precision_loss)]
            let delay = i as f64 * self.config.outer_reveal_stagger_ms;
            self.schedule_reveal(*id, delay);
        }
        log::debug!("spawned {} outer members", ids.len());
    }

    fn schedule_reveal(&mut self, id: MemberId, delay_ms: f64) {
        let due_ms = self.clock_ms + delay_ms;
        let at = self.reveals.partition_point(|r| r.due_ms <= due_ms);
        self.reveals.insert(at, PendingReveal { due_ms, id });
    }

    fn release_due_reveals(&mut self, actions: &mut Vec<Action>) {
        let due = self.reveals.partition_point(|r| r.due_ms <= self.clock_ms);
        actions.extend(self.reveals.drain(..due).map(|r| Action::Reveal { id: r.id }));
    }

    fn integrate(&mut self, steps: u32, actions: &mut Vec<Action>) {
        let vertical_factor = self.config.vertical_factor;
        let params = SpringParams::from(&self.config);
        let rotation = self.rotation;

        for member in self.members.iter_mut() {
            let id = member.id;
            let ring = member.ring;
            let target = member.orbit.and_then(|orbit| rotation.target(ring, orbit, vertical_factor));
            let Some(target) = target else {
                log::trace!("skipping {id}: no usable orbit this frame");
                continue;
            };
            member.target = Some(target);

            match member.motion {
                Motion::Dragging => {}
                Motion::Orbiting => {
                    member.position = target;
                    actions.push(Action::Move { id, position: target });
                }
                Motion::Snapping(spring) => match advance_spring(spring, target, steps, &params) {
                    Some(spring) => {
                        member.motion = Motion::Snapping(spring);
                        if steps > 0 {
                            member.position = spring.position;
                            actions.push(Action::Move { id, position: spring.position });
                        }
                    }
                    None => {
                        member.motion = Motion::Orbiting;
                        member.position = target;
                        actions.push(Action::Move { id, position: target });
                        actions.push(Action::MotionChanged { id, motion: member.motion.kind() });
                    }
                },
            }
        }
    }

    fn end_drag(&mut self) -> Vec<Action> {
        let DragState::Dragging { id, .. } = std::mem::take(&mut self.drag) else {
            return Vec::new();
        };
        let Some(member) = self.members.get_mut(id) else {
            return Vec::new();
        };
        member.motion = Motion::Snapping(Spring::at_rest(member.position));
        log::debug!("drag end on {id}");
        vec![Action::MotionChanged { id, motion: member.motion.kind() }]
    }
}

/// Run up to `steps` spring steps. Returns the new state, or `None` once the
/// spring has settled (or become unusable) and the member should rejoin its
/// orbit.
fn advance_spring(mut spring: Spring, target: Point, steps: u32, params: &SpringParams) -> Option<Spring> {
    for _ in 0..steps {
        let (next, settled) = spring_step(spring, target, params);
        if settled || !next.position.is_finite() {
            return None;
        }
        spring = next;
    }
    Some(spring)
}
