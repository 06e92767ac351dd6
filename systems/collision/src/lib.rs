#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Sliding collision resolution for circular agents against static walls.
//!
//! Motion is split into [`SUB_STEPS`] equal parts. Each part is checked only at
//! its destination; a blocked part first tries to slide along a wall it hit,
//! then to back away from the nearest wall it is already pressed into, and
//! contributes nothing when neither works.

use glam::Vec2;
use tracing::trace;
use umbra_core::Segment;
use umbra_world::{query, Map};

/// Number of equal parts a requested displacement is divided into.
pub const SUB_STEPS: usize = 2;

/// How a single sub-step was resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// The destination was free; the sub-step was taken as requested.
    Clear,
    /// The motion was projected onto a wall it hit.
    Slid,
    /// The agent backed away from a wall it overlapped.
    PushedOut,
    /// No free displacement was found; the sub-step contributed nothing.
    Blocked,
}

/// Result of resolving a requested displacement.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResolvedMove {
    /// Sum of the displacements taken by every sub-step.
    pub delta: Vec2,
    /// Outcome of each sub-step, in order.
    pub steps: [StepOutcome; SUB_STEPS],
}

impl ResolvedMove {
    /// Reports whether every sub-step was blocked.
    #[must_use]
    pub fn is_stalled(&self) -> bool {
        self.steps.iter().all(|step| *step == StepOutcome::Blocked)
    }

    /// Reports whether any sub-step touched a wall.
    #[must_use]
    pub fn collided(&self) -> bool {
        self.steps.iter().any(|step| *step != StepOutcome::Clear)
    }
}

/// Collision system owning the buffers reused across queries.
#[derive(Debug, Default)]
pub struct CollisionResolver {
    candidates: Vec<Segment>,
    colliders: Vec<Segment>,
}

impl CollisionResolver {
    /// Creates a resolver with empty buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves a move of `delta` from `start` for an agent of `radius` against the map's walls.
    ///
    /// Candidate walls are gathered once for the whole displacement.
    pub fn resolve(&mut self, map: &Map, start: Vec2, delta: Vec2, radius: f32) -> ResolvedMove {
        query::potential_colliders(map, start, delta, radius, &mut self.candidates);
        resolve_collision(start, delta, radius, &self.candidates, &mut self.colliders)
    }

    /// Walls gathered by the most recent [`CollisionResolver::resolve`] call.
    #[must_use]
    pub fn candidates(&self) -> &[Segment] {
        &self.candidates
    }
}

/// Replaces `out` with the candidates touching the circle of `radius` at `start + delta`.
pub fn check_collision(
    start: Vec2,
    delta: Vec2,
    radius: f32,
    candidates: &[Segment],
    out: &mut Vec<Segment>,
) {
    out.clear();
    let destination = start + delta;
    out.extend(
        candidates
            .iter()
            .filter(|segment| segment.collides_with_circle(destination, radius)),
    );
}

fn is_clear(destination: Vec2, radius: f32, candidates: &[Segment]) -> bool {
    !candidates
        .iter()
        .any(|segment| segment.collides_with_circle(destination, radius))
}

/// Displacement avoiding every candidate, found by sliding along a wall that was hit.
///
/// Returns `delta` untouched when nothing is hit. Otherwise `delta` is projected
/// onto each wall it hit; the longest projection that is itself free wins, the
/// earliest wall keeping ties. Zero-length projections never count, so
/// motion straight into a wall yields `None`.
#[must_use]
pub fn try_resolve_collision(
    start: Vec2,
    delta: Vec2,
    radius: f32,
    candidates: &[Segment],
    colliders: &mut Vec<Segment>,
) -> Option<Vec2> {
    check_collision(start, delta, radius, candidates, colliders);
    if colliders.is_empty() {
        return Some(delta);
    }

    let mut best: Option<(Vec2, f32)> = None;
    for segment in colliders.iter() {
        let Some(direction) = segment.direction() else {
            continue;
        };
        let slide = direction * delta.dot(direction);
        let length = slide.length();
        if length <= best.map_or(0.0, |(_, best_length)| best_length) {
            continue;
        }
        if is_clear(start + slide, radius, candidates) {
            best = Some((slide, length));
        }
    }

    best.map(|(slide, _)| slide)
}

/// Displacement backing away from the wall an agent at `start` is pressed into.
///
/// Among the walls hit at `start + delta`, only those whose line passes
/// strictly within `radius` of `start` qualify; the farthest of them wins, the
/// earliest keeping ties. The agent is pushed straight away from that line by
/// `|delta|`, provided the new position is free.
#[must_use]
pub fn try_resolve_collision_fallback(
    start: Vec2,
    delta: Vec2,
    radius: f32,
    candidates: &[Segment],
    colliders: &mut Vec<Segment>,
) -> Option<Vec2> {
    check_collision(start, delta, radius, candidates, colliders);

    let mut best: Option<(Vec2, f32)> = None;
    for segment in colliders.iter() {
        let nearest = segment.nearest_point_on_line(start);
        let distance = start.distance(nearest);
        if distance >= radius {
            continue;
        }
        if best.map_or(true, |(_, best_distance)| distance > best_distance) {
            best = Some((nearest, distance));
        }
    }

    let (nearest, _) = best?;
    let push = (start - nearest).try_normalize()? * delta.length();
    is_clear(start + push, radius, candidates).then_some(push)
}

/// Resolves a single sub-step: free, slid, pushed out, or blocked.
#[must_use]
pub fn resolve_step(
    start: Vec2,
    delta: Vec2,
    radius: f32,
    candidates: &[Segment],
    colliders: &mut Vec<Segment>,
) -> (Vec2, StepOutcome) {
    if let Some(resolved) = try_resolve_collision(start, delta, radius, candidates, colliders) {
        // Nothing was hit when the collider list came back empty.
        let outcome = if colliders.is_empty() {
            StepOutcome::Clear
        } else {
            StepOutcome::Slid
        };
        return (resolved, outcome);
    }

    match try_resolve_collision_fallback(start, delta, radius, candidates, colliders) {
        Some(push) => (push, StepOutcome::PushedOut),
        None => (Vec2::ZERO, StepOutcome::Blocked),
    }
}

/// Resolves `delta` from `start` in [`SUB_STEPS`] equal parts against `candidates`.
#[must_use]
pub fn resolve_collision(
    start: Vec2,
    delta: Vec2,
    radius: f32,
    candidates: &[Segment],
    colliders: &mut Vec<Segment>,
) -> ResolvedMove {
    let part = delta / SUB_STEPS as f32;
    let mut position = start;
    let mut total = Vec2::ZERO;
    let mut steps = [StepOutcome::Clear; SUB_STEPS];

    for (index, step) in steps.iter_mut().enumerate() {
        let (taken, outcome) = resolve_step(position, part, radius, candidates, colliders);
        if outcome != StepOutcome::Clear {
            trace!(
                step = index,
                ?outcome,
                x = position.x,
                y = position.y,
                dx = taken.x,
                dy = taken.y,
                "collision sub-step"
            );
        }
        position += taken;
        total += taken;
        *step = outcome;
    }

    ResolvedMove {
        delta: total,
        steps,
    }
}
