//! Fixed-step headless game loop.

use glam::Vec2;
use serde::Serialize;
use tracing::{debug, info};
use umbra_core::config::GameProperties;
use umbra_rendering::{Camera, FrameGeometry};
use umbra_system_collision::CollisionResolver;
use umbra_system_movement::{MoveKeys, MovingAgent};
use umbra_system_pursuit::Pursuit;
use umbra_world::Map;

/// Where the player aims during a run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Aim {
    /// Keep facing the enemy.
    Enemy,
    /// Keep facing a fixed world point.
    Point(Vec2),
}

/// Totals reported once a run finishes.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub(crate) struct RunSummary {
    pub(crate) steps: u64,
    pub(crate) simulated_seconds: f32,
    pub(crate) player: [f32; 2],
    pub(crate) enemy: [f32; 2],
    pub(crate) enemy_distance: f32,
    pub(crate) caught_at_step: Option<u64>,
    pub(crate) path_refreshes: u64,
    pub(crate) unreachable_steps: u64,
    pub(crate) player_collisions: u64,
    pub(crate) player_stalls: u64,
    pub(crate) enemy_collisions: u64,
    pub(crate) enemy_stalls: u64,
    pub(crate) visible_triangles: usize,
    pub(crate) shadow_casters: usize,
}

/// Complete game state advanced one fixed step at a time.
#[derive(Debug)]
pub(crate) struct Simulation {
    properties: GameProperties,
    map: Map,
    resolver: CollisionResolver,
    pursuit: Pursuit,
    player: MovingAgent,
    enemy: MovingAgent,
    camera: Camera,
    frame: FrameGeometry,
    summary: RunSummary,
}

impl Simulation {
    pub(crate) fn new(map: Map, properties: GameProperties) -> Self {
        let player = MovingAgent::spawn(properties.player, properties.player_spawn);
        let enemy = MovingAgent::spawn(properties.enemy, properties.enemy_spawn);
        let camera = Camera::from_properties(&properties.camera);
        let pursuit = Pursuit::from_properties(&properties);

        Self {
            properties,
            map,
            resolver: CollisionResolver::new(),
            pursuit,
            player,
            enemy,
            camera,
            frame: FrameGeometry::new(),
            summary: RunSummary::default(),
        }
    }

    /// Advances the camera, the player, then the enemy by one step.
    pub(crate) fn step(&mut self, keys: MoveKeys, aim: Aim) {
        let dt = self.properties.step_time;

        self.camera.follow(self.player.position());
        self.frame.collect(&self.map, &self.camera);

        let look_target = match aim {
            Aim::Enemy => self.enemy.position(),
            Aim::Point(point) => point,
        };
        self.player.instantly_look_at(look_target);
        let direction = keys.direction(self.player.look_vector());
        let moved = self
            .player
            .move_in_direction(direction, dt, &self.map, &mut self.resolver);
        if moved.collided() {
            self.summary.player_collisions += 1;
        }
        if moved.is_stalled() {
            self.summary.player_stalls += 1;
        }

        let step = self.pursuit.update(
            &mut self.map,
            &mut self.enemy,
            self.player.position(),
            dt,
            &mut self.resolver,
        );
        if step.waypoint.is_none() {
            self.summary.unreachable_steps += 1;
        }
        if let Some(moved) = step.moved {
            if moved.collided() {
                self.summary.enemy_collisions += 1;
            }
            if moved.is_stalled() {
                self.summary.enemy_stalls += 1;
            }
        }

        self.summary.steps += 1;
        let distance = self.enemy.position().distance(self.player.position());
        if self.summary.caught_at_step.is_none()
            && distance <= self.properties.pursuit_stop_distance
        {
            self.summary.caught_at_step = Some(self.summary.steps);
            info!(step = self.summary.steps, "enemy reached the player");
        }
    }

    /// Runs `steps` steps with keys supplied by `keys`.
    pub(crate) fn run<F>(&mut self, steps: u64, aim: Aim, mut keys: F)
    where
        F: FnMut() -> MoveKeys,
    {
        for _ in 0..steps {
            self.step(keys(), aim);
        }
        debug!(steps, "run finished");
    }

    /// Snapshot of the run so far.
    pub(crate) fn summary(&self) -> RunSummary {
        let player = self.player.position();
        let enemy = self.enemy.position();
        RunSummary {
            simulated_seconds: self.summary.steps as f32 * self.properties.step_time,
            player: player.to_array(),
            enemy: enemy.to_array(),
            enemy_distance: player.distance(enemy),
            path_refreshes: self.pursuit.refreshes(),
            visible_triangles: self.frame.triangle_count(),
            shadow_casters: self.frame.shadow_casters().len(),
            ..self.summary.clone()
        }
    }
}
