//! The falling cat

use glam::{Mat4, Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::intent_to_world;
use crate::tuning::PlayerTuning;

/// The four directional keys, as currently held
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectionKeys {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
}

impl DirectionKeys {
    /// Movement intent: x = strafe right, y = forward. Unit length or zero.
    pub fn intent(&self) -> Vec2 {
        let axis = |pos: bool, neg: bool| (pos as i8 - neg as i8) as f32;
        Vec2::new(axis(self.right, self.left), axis(self.forward, self.back)).normalize_or_zero()
    }
}

/// Player state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub position: Vec3,
    /// Vertical velocity (negative while falling)
    pub velocity_y: f32,
    pub grounded: bool,
    /// Yaw of the last horizontal movement
    pub facing: f32,
}

impl Player {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            velocity_y: 0.0,
            grounded: false,
            facing: 0.0,
        }
    }

    pub fn world_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(Quat::from_rotation_y(self.facing), self.position)
    }
}

/// Integrates movement intent and the constant fall
#[derive(Debug, Clone)]
pub struct PlayerController {
    player: Player,
    tuning: PlayerTuning,
}

impl PlayerController {
    pub fn new(tuning: PlayerTuning, spawn_height: f32) -> Self {
        Self {
            player: Player::at(Vec3::new(0.0, spawn_height, 0.0)),
            tuning,
        }
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn position(&self) -> Vec3 {
        self.player.position
    }

    /// Advance one tick. Movement is relative to the camera yaw.
    pub fn update(&mut self, keys: DirectionKeys, camera_yaw: f32, ground_level: f32, dt: f32) {
        let player = &mut self.player;

        let intent = keys.intent();
        if intent != Vec2::ZERO {
            let dir = intent_to_world(intent, camera_yaw);
            player.position += dir * self.tuning.move_speed * dt;
            player.facing = crate::yaw_toward(dir);
        }
        let bound = self.tuning.bound;
        player.position.x = player.position.x.clamp(-bound, bound);
        player.position.z = player.position.z.clamp(-bound, bound);

        if player.grounded {
            return;
        }
        player.velocity_y = -self.tuning.fall_speed;
        player.position.y += player.velocity_y * dt;
        if player.position.y <= ground_level {
            player.position.y = ground_level;
            player.velocity_y = 0.0;
            player.grounded = true;
            log::debug!("Player touched ground at y={ground_level:.1}");
        }
    }

    /// Back to the spawn point, centered and falling
    pub fn reset(&mut self, spawn_height: f32) {
        self.player = Player::at(Vec3::new(0.0, spawn_height, 0.0));
    }
}
