//! Cat Descent - an endless falling-cat game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (world streaming, collisions, progression)
//! - `assets`: Model slots filled asynchronously by the asset loader
//! - `platform`: Seams to the renderer and HUD collaborators
//! - `audio`: Fire-and-forget sound effects
//! - `tuning`: Data-driven game balance

pub mod assets;
pub mod audio;
pub mod platform;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use settings::Settings;
pub use tuning::{ConfigError, Tuning};

use glam::{Vec2, Vec3};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (one logical tick per 60 Hz display frame)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 4;
    /// Largest frame delta fed to the accumulator (tab switches, breakpoints)
    pub const MAX_FRAME_DT: f32 = 0.1;
}

/// Project a vector onto the horizontal (XZ) plane
#[inline]
pub fn horizontal(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

/// Horizontal distance between two points, ignoring height
#[inline]
pub fn horizontal_distance(a: Vec3, b: Vec3) -> f32 {
    horizontal(b - a).length()
}

/// Yaw (rotation about +Y) that faces along a horizontal direction
#[inline]
pub fn yaw_toward(dir: Vec3) -> f32 {
    dir.x.atan2(dir.z)
}

/// Rotate a 2D intent (x = strafe, y = forward) by a yaw angle into world XZ
#[inline]
pub fn intent_to_world(intent: Vec2, yaw: f32) -> Vec3 {
    let (sin, cos) = yaw.sin_cos();
    // Forward is -Z at yaw 0
    Vec3::new(
        intent.x * cos - intent.y * sin,
        0.0,
        -intent.x * sin - intent.y * cos,
    )
}
