#![allow(clippy::float_cmp)]

use std::f64::consts::PI;

use super::*;
use crate::input::PointerSample;

// =============================================================
// Helpers
// =============================================================

const EPSILON: f64 = 1e-9;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

fn core() -> CloudCore {
    CloudCore::with_seed(CloudConfig::default(), Roster::default(), 42)
}

/// A core with both rings spawned.
fn spawned() -> CloudCore {
    let mut core = core();
    core.init();
    while core.outer_pending() {
        core.step();
    }
    core
}

fn mouse(x: f64, y: f64) -> PointerSample {
    PointerSample::mouse(x, y)
}

fn first_outer(core: &CloudCore) -> MemberId {
    core.ids_on(Ring::Outer)[0]
}

fn moves_for(actions: &[Action], id: MemberId) -> usize {
    actions
        .iter()
        .filter(|a| matches!(a, Action::Move { id: m, .. } if *m == id))
        .count()
}

fn motion_index(actions: &[Action], id: MemberId, motion: MotionKind) -> Option<usize> {
    actions
        .iter()
        .position(|a| *a == Action::MotionChanged { id, motion })
}

fn motion_of(core: &CloudCore, id: MemberId) -> MotionKind {
    core.member(id).unwrap().motion.kind()
}

fn count_dragging(core: &CloudCore) -> usize {
    core.members().filter(|m| m.is_dragging()).count()
}

fn container() -> Rect {
    Rect::new(100.0, 50.0, 1000.0, 800.0)
}

fn screen_target(core: &CloudCore, id: MemberId) -> Point {
    container().center() + core.member(id).unwrap().target.unwrap()
}

// =============================================================
// Lifecycle
// =============================================================

#[test]
fn core_new_is_uninitialized() {
    let c = core();
    assert!(!c.is_initialized());
    assert_eq!(c.members().count(), 0);
    assert_eq!(c.dragging(), None);
    assert_eq!(c.clock_ms(), 0.0);
}

#[test]
fn tick_before_init_is_noop() {
    let mut c = core();
    assert!(c.step().is_empty());
    assert_eq!(c.rotation(), Rotation::default());
    assert_eq!(c.clock_ms(), 0.0);
}

#[test]
fn init_with_empty_roster_is_noop() {
    let mut c = CloudCore::with_seed(CloudConfig::default(), Roster::new(vec![], vec![]), 1);
    assert!(c.init().is_empty());
    assert!(!c.is_initialized());
    assert!(c.step().is_empty());
}

#[test]
fn init_clears_container_and_creates_inner_ring() {
    let mut c = core();
    let actions = c.init();
    assert_eq!(actions.first(), Some(&Action::ClearContainer));
    let created: Vec<_> = actions
        .iter()
        .filter_map(|a| match a {
            Action::MemberCreated { ring, src, .. } => Some((*ring, src.clone())),
            _ => None,
        })
        .collect();
    assert_eq!(created.len(), 5);
    assert!(created.iter().all(|(ring, _)| *ring == Ring::Inner));
    assert_eq!(created[0].1, Roster::default().inner[0]);
    assert!(c.ids_on(Ring::Outer).is_empty());
    assert!(c.outer_pending());
}

#[test]
fn init_runs_once() {
    let mut c = core();
    assert!(!c.init().is_empty());
    assert!(c.init().is_empty());
    assert_eq!(c.members().count(), 5);
}

#[test]
fn shake_offsets_lie_within_the_period() {
    let mut c = core();
    for a in c.init() {
        if let Action::MemberCreated { shake_offset_s, .. } = a {
            assert!((0.0..5.0).contains(&shake_offset_s));
        }
    }
}

#[test]
fn inner_member_two_of_five_at_zero_angle() {
    let mut c = core();
    c.init();
    let m = c.member(MemberId(2)).unwrap();
    let angle = 4.0 * PI / 5.0;
    assert!(approx_eq(m.position.x, angle.cos() * 210.0));
    assert!(approx_eq(m.position.y, angle.sin() * 210.0 * 0.8));
    assert_eq!(c.rotation().inner, 0.0);
}

#[test]
fn inner_members_share_fixed_radius() {
    let mut c = core();
    c.init();
    for id in c.ids_on(Ring::Inner) {
        assert_eq!(c.member(id).unwrap().orbit.unwrap().radius, 210.0);
    }
}

// =============================================================
// Reveal and outer spawn timing
// =============================================================

#[test]
fn first_inner_member_is_revealed_immediately() {
    let mut c = core();
    let actions = c.init();
    assert!(actions.contains(&Action::Reveal { id: MemberId(0) }));
    assert!(!actions.contains(&Action::Reveal { id: MemberId(1) }));
}

#[test]
fn inner_reveals_are_staggered_by_one_hundred_ms() {
    let mut c = core();
    c.init();
    let mut revealed_at = Vec::new();
    for _ in 0..40 {
        let actions = c.tick(10.0);
        for a in actions {
            if let Action::Reveal { id } = a {
                if id.0 < 5 {
                    revealed_at.push((id, c.clock_ms()));
                }
            }
        }
    }
    assert_eq!(revealed_at.len(), 4);
    assert_eq!(revealed_at[0].0, MemberId(1));
    assert!(approx_eq(revealed_at[0].1, 100.0));
    assert!(approx_eq(revealed_at[3].1, 400.0));
}

#[test]
fn outer_ring_spawns_after_delay() {
    let mut c = core();
    c.init();
    c.tick(200.0);
    assert!(c.ids_on(Ring::Outer).is_empty());
    let actions = c.tick(60.0);
    assert_eq!(c.ids_on(Ring::Outer).len(), 20);
    let created = actions
        .iter()
        .filter(|a| matches!(a, Action::MemberCreated { ring: Ring::Outer, .. }))
        .count();
    assert_eq!(created, 20);
    assert!(!c.outer_pending());
}

#[test]
fn outer_members_lie_in_the_annulus() {
    let c = spawned();
    for id in c.ids_on(Ring::Outer) {
        let r = c.member(id).unwrap().orbit.unwrap().radius;
        assert!((310.0..=430.0).contains(&r));
    }
}

#[test]
fn outer_sources_are_distinct_roster_entries() {
    let c = spawned();
    let roster = Roster::default();
    let mut srcs: Vec<_> = c.ids_on(Ring::Outer).iter().map(|id| c.member(*id).unwrap().src.clone()).collect();
    assert!(srcs.iter().all(|s| roster.outer.contains(s)));
    srcs.sort();
    srcs.dedup();
    assert_eq!(srcs.len(), 20);
}

#[test]
fn every_member_is_revealed_exactly_once() {
    let mut c = core();
    let mut revealed = c
        .init()
        .into_iter()
        .filter_map(|a| if let Action::Reveal { id } = a { Some(id) } else { None })
        .collect::<Vec<_>>();
    for _ in 0..120 {
        for a in c.step() {
            if let Action::Reveal { id } = a {
                revealed.push(id);
            }
        }
    }
    revealed.sort();
    let total = revealed.len();
    revealed.dedup();
    assert_eq!(total, 25);
    assert_eq!(revealed.len(), 25);
}

#[test]
fn outer_reveals_are_staggered_in_shuffled_order() {
    let mut c = core();
    c.init();
    let mut revealed_at = Vec::new();
    for _ in 0..300 {
        for a in c.tick(5.0) {
            if let Action::Reveal { id } = a {
                if id.0 >= 5 {
                    revealed_at.push((id, c.clock_ms()));
                }
            }
        }
    }

    assert_eq!(revealed_at.len(), 20);
    for (i, (_, at)) in revealed_at.iter().enumerate() {
        assert!(approx_eq(*at, 250.0 + i as f64 * 50.0), "reveal {i} at {at}");
    }
    let order: Vec<MemberId> = revealed_at.iter().map(|(id, _)| *id).collect();
    assert_ne!(order, c.ids_on(Ring::Outer));
}

#[test]
fn zero_outer_count_never_spawns_outer_ring() {
    let config = CloudConfig { outer_count: 0, ..CloudConfig::default() };
    let mut c = CloudCore::with_seed(config, Roster::default(), 3);
    c.init();
    assert!(!c.outer_pending());
    c.tick(250.0);
    c.tick(250.0);
    assert!(c.ids_on(Ring::Outer).is_empty());
}

// =============================================================
// Orbit integration
// =============================================================

#[test]
fn step_advances_both_rings() {
    let mut c = core();
    c.init();
    c.step();
    assert!(approx_eq(c.rotation().inner, 0.0015));
    assert!(approx_eq(c.rotation().outer, 0.00045));
}

#[test]
fn half_frames_add_up_to_a_full_frame() {
    let mut a = core();
    a.init();
    a.step();
    let mut b = core();
    b.init();
    b.tick(NOMINAL_FRAME_MS / 2.0);
    b.tick(NOMINAL_FRAME_MS / 2.0);
    assert!(approx_eq(a.rotation().inner, b.rotation().inner));
    assert!(approx_eq(a.rotation().outer, b.rotation().outer));
}

#[test]
fn invalid_elapsed_counts_as_zero() {
    let mut c = core();
    c.init();
    c.tick(f64::NAN);
    c.tick(-50.0);
    c.tick(f64::INFINITY);
    assert_eq!(c.clock_ms(), 0.0);
    assert_eq!(c.rotation().inner, 0.0);
}

#[test]
fn long_gaps_are_clamped() {
    let mut c = core();
    c.init();
    c.tick(10_000.0);
    assert_eq!(c.clock_ms(), MAX_TICK_MS);
}

#[test]
fn orbiting_members_render_at_their_target() {
    let mut c = spawned();
    let actions = c.step();
    for m in c.members() {
        assert_eq!(m.motion, Motion::Orbiting);
        assert_eq!(Some(m.position), m.target);
        assert_eq!(moves_for(&actions, m.id), 1);
    }
}

#[test]
fn outer_target_follows_placement_phase() {
    let mut c = spawned();
    c.step();
    let angle = c.rotation().outer;
    for id in c.ids_on(Ring::Outer) {
        let m = c.member(id).unwrap();
        let orbit = m.orbit.unwrap();
        let expected = orbit.point_at(angle, 0.8);
        assert!(approx_eq(m.target.unwrap().x, expected.x));
        assert!(approx_eq(m.target.unwrap().y, expected.y));
    }
}

#[test]
fn non_finite_orbit_is_skipped_without_stopping_others() {
    let config = CloudConfig { inner_radius: f64::NAN, ..CloudConfig::default() };
    let mut c = CloudCore::with_seed(config, Roster::default(), 5);
    c.init();
    while c.outer_pending() {
        c.step();
    }
    let actions = c.step();
    for id in c.ids_on(Ring::Inner) {
        assert_eq!(moves_for(&actions, id), 0);
    }
    for id in c.ids_on(Ring::Outer) {
        assert_eq!(moves_for(&actions, id), 1);
    }
}

// =============================================================
// Drag
// =============================================================

#[test]
fn inner_members_cannot_be_dragged() {
    let mut c = spawned();
    assert!(c.on_pointer_down(MemberId(0), mouse(10.0, 10.0)).is_empty());
    assert_eq!(c.dragging(), None);
    assert_eq!(motion_of(&c, MemberId(0)), MotionKind::Orbiting);
}

#[test]
fn unknown_member_is_ignored() {
    let mut c = spawned();
    assert!(c.on_pointer_down(MemberId(999), mouse(0.0, 0.0)).is_empty());
    assert_eq!(c.dragging(), None);
}

#[test]
fn pointer_down_starts_drag() {
    let mut c = spawned();
    let id = first_outer(&c);
    let actions = c.on_pointer_down(id, mouse(500.0, 500.0));
    assert_eq!(actions, vec![Action::MotionChanged { id, motion: MotionKind::Dragging }]);
    assert_eq!(c.dragging(), Some(id));
    assert_eq!(motion_of(&c, id), MotionKind::Dragging);
}

#[test]
fn drag_follows_cumulative_pointer_delta() {
    let mut c = spawned();
    let id = first_outer(&c);
    let start = c.member(id).unwrap().position;
    c.on_pointer_down(id, PointerSample::touch(500.0, 500.0));
    c.on_pointer_move(PointerSample::touch(510.0, 490.0));
    let actions = c.on_pointer_move(PointerSample::touch(530.0, 460.0));
    let expected = start + Point::new(30.0, -40.0);
    assert_eq!(actions, vec![Action::Move { id, position: expected }]);
    assert_eq!(c.member(id).unwrap().position, expected);
}

#[test]
fn pointer_move_without_drag_is_noop() {
    let mut c = spawned();
    assert!(c.on_pointer_move(mouse(1.0, 2.0)).is_empty());
}

#[test]
fn orbit_does_not_move_a_dragged_member_but_tracks_its_target() {
    let mut c = spawned();
    let id = first_outer(&c);
    c.on_pointer_down(id, mouse(0.0, 0.0));
    c.on_pointer_move(mouse(40.0, 40.0));
    let held = c.member(id).unwrap().position;
    let before = c.member(id).unwrap().target;
    let actions = c.step();
    assert_eq!(moves_for(&actions, id), 0);
    assert_eq!(c.member(id).unwrap().position, held);
    assert_ne!(c.member(id).unwrap().target, before);
}

#[test]
fn second_drag_releases_the_first_one_first() {
    let mut c = spawned();
    let outer = c.ids_on(Ring::Outer);
    let (a, b) = (outer[0], outer[1]);
    c.on_pointer_down(a, mouse(0.0, 0.0));
    let actions = c.on_pointer_down(b, mouse(5.0, 5.0));

    let a_snaps = motion_index(&actions, a, MotionKind::Snapping).unwrap();
    let b_drags = motion_index(&actions, b, MotionKind::Dragging).unwrap();
    assert!(a_snaps < b_drags);
    assert_eq!(motion_of(&c, a), MotionKind::Snapping);
    assert_eq!(c.dragging(), Some(b));
    assert_eq!(count_dragging(&c), 1);
}

#[test]
fn never_two_members_dragging() {
    let mut c = spawned();
    let outer = c.ids_on(Ring::Outer);
    for (i, id) in outer.iter().enumerate() {
        c.on_pointer_down(*id, mouse(i as f64, 0.0));
        c.on_pointer_move(mouse(i as f64 + 3.0, 2.0));
        c.step();
        assert_eq!(count_dragging(&c), 1);
    }
}

#[test]
fn pressing_the_dragged_member_again_restarts_from_its_position() {
    let mut c = spawned();
    let id = first_outer(&c);
    c.on_pointer_down(id, mouse(0.0, 0.0));
    c.on_pointer_move(mouse(20.0, 0.0));
    let held = c.member(id).unwrap().position;
    assert!(c.on_pointer_down(id, mouse(100.0, 100.0)).is_empty());
    let actions = c.on_pointer_move(mouse(110.0, 100.0));
    assert_eq!(actions, vec![Action::Move { id, position: held + Point::new(10.0, 0.0) }]);
}

// =============================================================
// Release and snap
// =============================================================

#[test]
fn pointer_up_seeds_spring_at_rest_from_rendered_position() {
    let mut c = spawned();
    let id = first_outer(&c);
    c.on_pointer_down(id, mouse(0.0, 0.0));
    c.on_pointer_move(mouse(-80.0, 60.0));
    let released_at = c.member(id).unwrap().position;
    let actions = c.on_pointer_up();
    assert_eq!(actions, vec![Action::MotionChanged { id, motion: MotionKind::Snapping }]);
    assert_eq!(c.dragging(), None);
    assert_eq!(c.member(id).unwrap().motion, Motion::Snapping(Spring::at_rest(released_at)));
}

#[test]
fn pointer_up_when_idle_is_noop() {
    let mut c = spawned();
    assert!(c.on_pointer_up().is_empty());
}

#[test]
fn pointer_cancel_releases_like_pointer_up() {
    let mut c = spawned();
    let id = first_outer(&c);
    c.on_pointer_down(id, mouse(0.0, 0.0));
    let actions = c.on_pointer_cancel();
    assert_eq!(actions, vec![Action::MotionChanged { id, motion: MotionKind::Snapping }]);
    assert_eq!(motion_of(&c, id), MotionKind::Snapping);
}

#[test]
fn released_member_springs_toward_target() {
    let mut c = spawned();
    let id = first_outer(&c);
    c.on_pointer_down(id, mouse(0.0, 0.0));
    c.on_pointer_move(mouse(150.0, 0.0));
    c.on_pointer_up();
    let before = c.member(id).unwrap();
    let gap_before = before.position.distance(before.target.unwrap());

    let actions = c.step();
    assert_eq!(moves_for(&actions, id), 1);
    let after = c.member(id).unwrap();
    let gap_after = after.position.distance(after.target.unwrap());
    assert!(gap_after < gap_before);
    assert_eq!(after.motion.kind(), MotionKind::Snapping);
}

/// A spawned core whose rings do not rotate, so released springs can settle.
fn stationary() -> CloudCore {
    let config = CloudConfig { inner_speed: 0.0, outer_speed_ratio: 0.0, ..CloudConfig::default() };
    let mut core = CloudCore::with_seed(config, Roster::default(), 42);
    core.init();
    while core.outer_pending() {
        core.step();
    }
    core
}

#[test]
fn released_member_rejoins_orbit_exactly() {
    let mut c = stationary();
    let id = first_outer(&c);
    c.on_pointer_down(id, mouse(0.0, 0.0));
    c.on_pointer_move(mouse(200.0, -120.0));
    c.on_pointer_up();

    let mut rejoined = None;
    for n in 0..1000 {
        let actions = c.step();
        if motion_index(&actions, id, MotionKind::Orbiting).is_some() {
            rejoined = Some(n);
            break;
        }
    }
    assert!(rejoined.is_some());
    let m = c.member(id).unwrap();
    assert_eq!(m.motion, Motion::Orbiting);
    assert_eq!(Some(m.position), m.target);
}

#[test]
fn released_member_stays_close_to_a_rotating_orbit() {
    let mut c = spawned();
    let id = first_outer(&c);
    c.on_pointer_down(id, mouse(0.0, 0.0));
    c.on_pointer_move(mouse(200.0, -120.0));
    c.on_pointer_up();
    for _ in 0..600 {
        c.step();
    }
    // A spring chasing a moving target may keep a small lag instead of settling.
    let m = c.member(id).unwrap();
    assert!(m.position.distance(m.target.unwrap()) < 2.0);
}

#[test]
fn spring_integrates_whole_nominal_steps_only() {
    let mut c = spawned();
    let id = first_outer(&c);
    c.on_pointer_down(id, mouse(0.0, 0.0));
    c.on_pointer_move(mouse(150.0, 0.0));
    c.on_pointer_up();
    let released_at = c.member(id).unwrap().position;

    let first = c.tick(NOMINAL_FRAME_MS / 2.0);
    assert_eq!(moves_for(&first, id), 0);
    assert_eq!(c.member(id).unwrap().position, released_at);

    let second = c.tick(NOMINAL_FRAME_MS / 2.0);
    assert_eq!(moves_for(&second, id), 1);
    assert_ne!(c.member(id).unwrap().position, released_at);
}

// =============================================================
// Proximity
// =============================================================

#[test]
fn hover_over_a_member_highlights_it() {
    let mut c = spawned();
    let id = first_outer(&c);
    let cursor = screen_target(&c, id);
    c.on_hover(mouse(cursor.x, cursor.y), container());
    let style = c.member(id).unwrap().style;
    assert_eq!(style.scale, 1.15);
    assert_eq!(style.z_index, Some(50));
    assert!(style.pointer_cursor);
    assert_eq!(c.members().filter(|m| m.style.pointer_cursor).count(), 1);
}

#[test]
fn hover_leaves_distant_members_neutral() {
    let mut c = spawned();
    let id = first_outer(&c);
    let cursor = screen_target(&c, id);
    c.on_hover(mouse(cursor.x, cursor.y), container());
    for m in c.members() {
        let d = screen_target(&c, m.id).distance(cursor);
        if d > 250.0 {
            assert!(m.style.is_neutral(), "{} at {d}px should be neutral", m.id);
        } else if m.id != id {
            assert_eq!(m.style.scale, 1.0);
            assert_eq!(m.style.z_index, Some(1));
        }
    }
}

#[test]
fn hover_reports_only_changes() {
    let mut c = spawned();
    let id = first_outer(&c);
    let cursor = screen_target(&c, id);
    assert!(!c.on_hover(mouse(cursor.x, cursor.y), container()).is_empty());
    assert!(c.on_hover(mouse(cursor.x, cursor.y), container()).is_empty());
}

#[test]
fn hover_far_away_resets_everyone() {
    let mut c = spawned();
    let id = first_outer(&c);
    let cursor = screen_target(&c, id);
    c.on_hover(mouse(cursor.x, cursor.y), container());
    let actions = c.on_hover(mouse(-5000.0, -5000.0), container());
    assert!(actions.contains(&Action::Restyle { id, style: MemberStyle::NEUTRAL }));
    assert!(c.members().all(|m| m.style.is_neutral()));
}

#[test]
fn hover_skips_the_dragged_member() {
    let mut c = spawned();
    let id = first_outer(&c);
    let cursor = screen_target(&c, id);
    c.on_pointer_down(id, mouse(0.0, 0.0));
    let actions = c.on_hover(mouse(cursor.x, cursor.y), container());
    assert!(!actions.iter().any(|a| matches!(a, Action::Restyle { id: m, .. } if *m == id)));
    assert!(c.member(id).unwrap().style.is_neutral());
}

#[test]
fn hover_uses_orbit_target_not_spring_position() {
    let mut c = spawned();
    let id = first_outer(&c);
    c.on_pointer_down(id, mouse(0.0, 0.0));
    c.on_pointer_move(mouse(600.0, 600.0));
    c.on_pointer_up();
    c.step();
    let cursor = screen_target(&c, id);
    c.on_hover(mouse(cursor.x, cursor.y), container());
    assert!(c.member(id).unwrap().style.pointer_cursor);
}

// =============================================================
// Snapshot and determinism
// =============================================================

#[test]
fn snapshot_serializes_every_member() {
    let c = spawned();
    let json = serde_json::to_value(c.snapshot()).unwrap();
    assert_eq!(json["members"].as_array().unwrap().len(), 25);
    assert_eq!(json["dragging"], serde_json::Value::Null);
    assert_eq!(json["members"][0]["ring"], "inner");
    assert_eq!(json["members"][0]["motion"]["state"], "orbiting");
}

#[test]
fn action_serializes_with_tag() {
    let json = serde_json::to_value(Action::Reveal { id: MemberId(3) }).unwrap();
    assert_eq!(json, serde_json::json!({ "action": "reveal", "id": 3 }));
}

#[test]
fn same_seed_same_session() {
    let run = |seed| {
        let mut c = CloudCore::with_seed(CloudConfig::default(), Roster::default(), seed);
        c.init();
        for _ in 0..30 {
            c.step();
        }
        let id = first_outer(&c);
        c.on_pointer_down(id, mouse(0.0, 0.0));
        c.on_pointer_move(mouse(50.0, 50.0));
        c.on_pointer_up();
        for _ in 0..10 {
            c.step();
        }
        serde_json::to_value(c.snapshot()).unwrap()
    };
    assert_eq!(run(9), run(9));
    assert_ne!(run(9), run(10));
}
