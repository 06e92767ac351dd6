//! Tunable gameplay properties loaded by adapters.
//!
//! Every field has a default so partial configuration files only need to name
//! the values they override.

use std::f32::consts::PI;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Physical properties of a moving agent.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentProperties {
    /// Thrust applied along the move direction, in world units per second squared.
    pub acceleration: f32,
    /// Terminal speed reached when friction cancels the thrust.
    pub maximum_speed: f32,
    /// Fastest rate at which the look direction may rotate, in radians per second.
    pub angular_speed: f32,
    /// Radius of the agent's collision circle.
    pub radius: f32,
}

impl AgentProperties {
    /// Defaults used for the player-controlled agent.
    #[must_use]
    pub const fn player() -> Self {
        Self {
            acceleration: 25.0,
            maximum_speed: 5.0,
            angular_speed: 2.0 * PI,
            radius: 0.5,
        }
    }

    /// Defaults used for the pursuing enemy.
    #[must_use]
    pub const fn enemy() -> Self {
        Self {
            acceleration: 25.0,
            maximum_speed: 2.0,
            angular_speed: 2.0 * PI,
            radius: 0.5,
        }
    }
}

impl Default for AgentProperties {
    fn default() -> Self {
        Self::player()
    }
}

/// Size of the area kept visible by the camera.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraProperties {
    /// Visible extent across the screen, in world units.
    pub view_width: f32,
    /// Visible extent up the screen, in world units.
    pub view_height: f32,
}

impl Default for CameraProperties {
    fn default() -> Self {
        Self {
            view_width: 9.0,
            view_height: 9.0,
        }
    }
}

/// Top-level configuration for a simulation run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameProperties {
    /// Fixed simulation step, in seconds.
    pub step_time: f32,
    /// Player agent tuning.
    pub player: AgentProperties,
    /// Enemy agent tuning.
    pub enemy: AgentProperties,
    /// Where the player enters the map.
    pub player_spawn: Vec2,
    /// Where the enemy enters the map.
    pub enemy_spawn: Vec2,
    /// Distance the pursued target must travel before the path is rebuilt.
    ///
    /// Zero rebuilds the path on every step.
    pub path_refresh_distance: f32,
    /// The pursuer stops advancing once it is this close to its target.
    pub pursuit_stop_distance: f32,
    /// Camera view extents.
    pub camera: CameraProperties,
}

impl Default for GameProperties {
    fn default() -> Self {
        Self {
            step_time: 1.0 / 60.0,
            player: AgentProperties::player(),
            enemy: AgentProperties::enemy(),
            player_spawn: Vec2::ZERO,
            enemy_spawn: Vec2::new(7.0, 1.0),
            path_refresh_distance: 0.0,
            pursuit_stop_distance: 1.0,
            camera: CameraProperties::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let raw = r#"
            step_time = 0.02
            enemy_spawn = [3.0, 4.0]

            [enemy]
            maximum_speed = 3.5
        "#;

        let properties: GameProperties = toml::from_str(raw).expect("config parses");

        assert!((properties.step_time - 0.02).abs() < f32::EPSILON);
        assert_eq!(properties.enemy_spawn, Vec2::new(3.0, 4.0));
        assert!((properties.enemy.maximum_speed - 3.5).abs() < f32::EPSILON);
        assert!((properties.enemy.radius - 0.5).abs() < f32::EPSILON);
        assert_eq!(properties.player, AgentProperties::player());
        assert_eq!(properties.camera, CameraProperties::default());
    }

    #[test]
    fn empty_toml_matches_defaults() {
        let properties: GameProperties = toml::from_str("").expect("config parses");
        assert_eq!(properties, GameProperties::default());
    }
}
