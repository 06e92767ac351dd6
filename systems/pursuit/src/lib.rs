#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Steering that chases a moving target through the navigation graph.
//!
//! The path toward the target is rebuilt only once the target has drifted far
//! enough from where the last path ended. Every step the pursuer asks the map
//! for the next waypoint, turns toward it at its own angular speed, and
//! advances along its look direction until it is close to the target.

use glam::Vec2;
use tracing::trace;
use umbra_core::config::GameProperties;
use umbra_system_collision::{CollisionResolver, ResolvedMove};
use umbra_system_movement::MovingAgent;
use umbra_world::{Map, NavCellId, PathSummary};

/// What a single pursuit update did.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PursuitStep {
    /// Summary of the path rebuild, when one happened.
    pub refreshed: Option<PathSummary>,
    /// Point the pursuer steered toward, absent when the target is unreachable.
    pub waypoint: Option<Vec2>,
    /// Resolved displacement, absent when the pursuer held its position.
    pub moved: Option<ResolvedMove>,
}

/// Pursuit system owning its refresh bookkeeping and lookup buffer.
#[derive(Clone, Debug)]
pub struct Pursuit {
    refresh_distance: f32,
    stop_distance: f32,
    path_end: Option<Vec2>,
    refreshes: u64,
    cells: Vec<NavCellId>,
}

impl Pursuit {
    /// Creates a pursuit system with explicit refresh and stop distances.
    #[must_use]
    pub fn new(refresh_distance: f32, stop_distance: f32) -> Self {
        Self {
            refresh_distance,
            stop_distance,
            path_end: None,
            refreshes: 0,
            cells: Vec::new(),
        }
    }

    /// Creates a pursuit system tuned by the game configuration.
    #[must_use]
    pub fn from_properties(properties: &GameProperties) -> Self {
        Self::new(
            properties.path_refresh_distance,
            properties.pursuit_stop_distance,
        )
    }

    /// Number of path rebuilds performed so far.
    #[must_use]
    pub const fn refreshes(&self) -> u64 {
        self.refreshes
    }

    /// Where the most recent path rebuild ended.
    #[must_use]
    pub const fn path_end(&self) -> Option<Vec2> {
        self.path_end
    }

    /// Rebuilds the path ending at `target` if it drifted at least the refresh distance.
    ///
    /// The first call always rebuilds.
    pub fn refresh_path(&mut self, map: &mut Map, target: Vec2) -> Option<PathSummary> {
        if let Some(previous) = self.path_end {
            if previous.distance(target) < self.refresh_distance {
                return None;
            }
        }

        self.path_end = Some(target);
        self.refreshes += 1;
        Some(map.construct_path_ending_at(target))
    }

    /// Turns `agent` toward its next waypoint and advances it unless it is close to `target`.
    ///
    /// The agent holds still when no waypoint is available.
    pub fn steer(
        &mut self,
        map: &Map,
        agent: &mut MovingAgent,
        target: Vec2,
        dt: f32,
        resolver: &mut CollisionResolver,
    ) -> (Option<Vec2>, Option<ResolvedMove>) {
        let radius = agent.properties().radius;
        let Some(waypoint) = map.move_target_from_path(agent.position(), radius, &mut self.cells)
        else {
            trace!(
                x = agent.position().x,
                y = agent.position().y,
                "no path toward target"
            );
            return (None, None);
        };

        agent.turn_towards_target(waypoint, dt);
        if agent.position().distance(target) <= self.stop_distance {
            return (Some(waypoint), None);
        }

        let moved = agent.move_in_direction(agent.look_vector(), dt, map, resolver);
        (Some(waypoint), Some(moved))
    }

    /// Refreshes the path when warranted, then steers `agent` toward `target`.
    pub fn update(
        &mut self,
        map: &mut Map,
        agent: &mut MovingAgent,
        target: Vec2,
        dt: f32,
        resolver: &mut CollisionResolver,
    ) -> PursuitStep {
        let refreshed = self.refresh_path(map, target);
        let (waypoint, moved) = self.steer(map, agent, target, dt, resolver);
        PursuitStep {
            refreshed,
            waypoint,
            moved,
        }
    }
}

impl Default for Pursuit {
    fn default() -> Self {
        Self::from_properties(&GameProperties::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use umbra_core::config::AgentProperties;

    const CORRIDOR: &str = r#"{
        "vertices": [[0.0, 0.0]],
        "polygons": {"kind": "polygon", "bbox": [0.0, 0.0, 0.0, 0.0], "value": []},
        "entities": {"kind": "rectangle", "bbox": [0.0, 30.0, 0.0, 4.0]}
    }"#;

    #[test]
    fn refresh_waits_for_target_to_drift() {
        let mut map = Map::from_json_str(CORRIDOR).expect("scene loads");
        let mut pursuit = Pursuit::new(1.0, 1.0);

        assert!(pursuit.refresh_path(&mut map, Vec2::new(5.0, 2.0)).is_some());
        assert!(pursuit.refresh_path(&mut map, Vec2::new(5.5, 2.0)).is_none());
        assert!(pursuit.refresh_path(&mut map, Vec2::new(6.0, 2.0)).is_some());
        assert_eq!(pursuit.refreshes(), 2);
        assert_eq!(pursuit.path_end(), Some(Vec2::new(6.0, 2.0)));
    }

    #[test]
    fn zero_refresh_distance_rebuilds_every_step() {
        let mut map = Map::from_json_str(CORRIDOR).expect("scene loads");
        let mut pursuit = Pursuit::new(0.0, 1.0);

        for _ in 0..5 {
            assert!(pursuit.refresh_path(&mut map, Vec2::new(5.0, 2.0)).is_some());
        }
        assert_eq!(pursuit.refreshes(), 5);
    }

    #[test]
    fn pursuer_holds_still_within_stop_distance() {
        let mut map = Map::from_json_str(CORRIDOR).expect("scene loads");
        let mut pursuit = Pursuit::new(0.0, 1.0);
        let mut resolver = CollisionResolver::new();
        let mut agent = MovingAgent::spawn(AgentProperties::enemy(), Vec2::new(4.5, 2.0));

        let step = pursuit.update(
            &mut map,
            &mut agent,
            Vec2::new(5.0, 2.0),
            1.0 / 60.0,
            &mut resolver,
        );
        assert_eq!(step.waypoint, Some(Vec2::new(5.0, 2.0)));
        assert!(step.moved.is_none());
        assert_eq!(agent.position(), Vec2::new(4.5, 2.0));
        assert_eq!(agent.look_vector(), Vec2::new(0.5, 0.0));
    }

    #[test]
    fn unreachable_target_leaves_pursuer_idle() {
        let mut map = Map::from_json_str(CORRIDOR).expect("scene loads");
        let mut pursuit = Pursuit::default();
        let mut resolver = CollisionResolver::new();
        let mut agent = MovingAgent::spawn(AgentProperties::enemy(), Vec2::new(4.5, 2.0));

        let step = pursuit.update(
            &mut map,
            &mut agent,
            Vec2::new(50.0, 2.0),
            1.0 / 60.0,
            &mut resolver,
        );
        assert!(step.refreshed.is_some());
        assert!(step.waypoint.is_none());
        assert!(step.moved.is_none());
        assert_eq!(agent.look_vector(), Vec2::ZERO);
    }
}
