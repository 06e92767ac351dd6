#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Kinematic integration of circular agents moving through a map.
//!
//! Agents accelerate toward a requested direction against speed-proportional
//! friction, so they settle at their configured maximum speed. Every
//! displacement passes through the collision system before it is applied, and
//! the velocity is derived from what was actually travelled.

use glam::Vec2;
use umbra_core::{angle_difference, angle_from_vector, config::AgentProperties};
use umbra_system_collision::{CollisionResolver, ResolvedMove, StepOutcome, SUB_STEPS};
use umbra_world::Map;

/// Circular agent with a position, a velocity, and a look direction.
#[derive(Clone, Debug, PartialEq)]
pub struct MovingAgent {
    properties: AgentProperties,
    position: Vec2,
    velocity: Vec2,
    move_vec: Vec2,
    look_vec: Vec2,
}

impl MovingAgent {
    /// Places a motionless agent at `position`.
    #[must_use]
    pub const fn spawn(properties: AgentProperties, position: Vec2) -> Self {
        Self {
            properties,
            position,
            velocity: Vec2::ZERO,
            move_vec: Vec2::ZERO,
            look_vec: Vec2::ZERO,
        }
    }

    /// Tuning the agent was spawned with.
    #[must_use]
    pub const fn properties(&self) -> &AgentProperties {
        &self.properties
    }

    /// Current position.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.position
    }

    /// Velocity derived from the last resolved displacement.
    #[must_use]
    pub const fn velocity(&self) -> Vec2 {
        self.velocity
    }

    /// Unit direction of the last attempted move, zero when idle.
    #[must_use]
    pub const fn move_vector(&self) -> Vec2 {
        self.move_vec
    }

    /// Offset from the agent to the point it looks at.
    #[must_use]
    pub const fn look_vector(&self) -> Vec2 {
        self.look_vec
    }

    /// Heading of the look vector, or of the move vector while nothing is looked at.
    #[must_use]
    pub fn look_angle(&self) -> f32 {
        if self.look_vec.length_squared() > 0.0 {
            angle_from_vector(self.look_vec)
        } else {
            angle_from_vector(self.move_vec)
        }
    }

    /// Point the agent is looking at.
    #[must_use]
    pub fn look_target(&self) -> Vec2 {
        self.position + self.look_vec
    }

    /// Points the look vector straight at `target`.
    pub fn instantly_look_at(&mut self, target: Vec2) {
        self.look_vec = target - self.position;
    }

    /// Rotates the look vector toward `target` by at most `angular_speed * dt`.
    ///
    /// Rotation takes the shorter way round. Once the remaining angle fits in
    /// a single step the look vector snaps onto the target.
    pub fn turn_towards_target(&mut self, target: Vec2, dt: f32) {
        if self.look_vec.length_squared() == 0.0 {
            self.instantly_look_at(target);
            return;
        }

        let target_vec = target - self.position;
        if target_vec.length_squared() == 0.0 {
            return;
        }

        let delta = angle_difference(
            angle_from_vector(self.look_vec),
            angle_from_vector(target_vec),
        );
        let max_delta = self.properties.angular_speed * dt;
        if delta > max_delta {
            self.look_vec = Vec2::from_angle(max_delta).rotate(self.look_vec);
        } else if delta < -max_delta {
            self.look_vec = Vec2::from_angle(-max_delta).rotate(self.look_vec);
        } else {
            self.look_vec = target_vec;
        }
    }

    /// Accelerates toward `direction` for `dt` seconds and moves through `map`.
    ///
    /// A zero direction lets friction slow the agent down. Non-positive
    /// timesteps leave the agent where it is.
    pub fn move_in_direction(
        &mut self,
        direction: Vec2,
        dt: f32,
        map: &Map,
        resolver: &mut CollisionResolver,
    ) -> ResolvedMove {
        self.move_vec = direction.normalize_or_zero();
        if dt <= 0.0 {
            return ResolvedMove {
                delta: Vec2::ZERO,
                steps: [StepOutcome::Clear; SUB_STEPS],
            };
        }

        let AgentProperties {
            acceleration,
            maximum_speed,
            radius,
            ..
        } = self.properties;
        let friction = self.velocity * (-(acceleration / maximum_speed) * dt);
        let thrust = self.move_vec * (acceleration * dt);
        let velocity = self.velocity + friction + thrust;

        let resolved = resolver.resolve(map, self.position, velocity * dt, radius);
        self.position += resolved.delta;
        self.velocity = resolved.delta / dt;
        resolved
    }
}

/// Directional keys held by the player during a step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct MoveKeys {
    /// Move toward the look target.
    pub forward: bool,
    /// Move away from the look target.
    pub back: bool,
    /// Strafe counter-clockwise of the look direction.
    pub left: bool,
    /// Strafe clockwise of the look direction.
    pub right: bool,
}

impl MoveKeys {
    /// Combines the held keys into a move direction relative to `look`.
    ///
    /// The result is not normalised; opposite keys cancel out.
    #[must_use]
    pub fn direction(&self, look: Vec2) -> Vec2 {
        let mut direction = Vec2::ZERO;
        if self.forward {
            direction += look;
        }
        if self.back {
            direction -= look;
        }
        if self.left {
            direction += look.perp();
        }
        if self.right {
            direction -= look.perp();
        }
        direction
    }
}
