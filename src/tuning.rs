//! Data-driven game balance
//!
//! Every number the simulation depends on lives here so a tuning pass never
//! touches simulation code. Loaded from JSON; any section left out falls back
//! to its defaults.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tuning load/validation failure
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse tuning JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid tuning value `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

/// Vertical layout of the world and round structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldTuning {
    /// Height the player (and every stream frontier) starts at
    pub spawn_height: f32,
    /// Ground level for round 1
    pub initial_ground_level: f32,
    /// Hard floor the ground level never goes below
    pub ground_floor: f32,
    /// How much deeper the ground gets per round
    pub round_depth: f32,
    /// Round ends once the player is this close above the ground
    pub round_end_buffer: f32,
    /// Backdrop plane sits this far below the player
    pub backdrop_distance: f32,
}

impl Default for WorldTuning {
    fn default() -> Self {
        Self {
            spawn_height: 200.0,
            initial_ground_level: -100.0,
            ground_floor: -5000.0,
            round_depth: 200.0,
            round_end_buffer: 100.0,
            backdrop_distance: 400.0,
        }
    }
}

/// Spawn/retire parameters for one stream manager
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Vertical distance between consecutive spawns
    pub spacing: f32,
    /// Random upward offset added to each spawn, in `[0, jitter)`
    pub jitter: f32,
    /// How far below the player the next spawn may be placed
    pub spawn_ahead: f32,
    /// Entities this far above the player are retired
    pub retire_buffer: f32,
    /// No spawns within this distance above the ground
    pub stop_generation_buffer: f32,
    /// Horizontal half-extent of the spawn area
    pub spread: f32,
    /// Entities spawned per generation (inclusive range)
    pub batch_min: u32,
    pub batch_max: u32,
    /// Generate the whole descent on reset instead of following the player
    pub eager: bool,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            spacing: 30.0,
            jitter: 10.0,
            spawn_ahead: 30.0,
            retire_buffer: 20.0,
            stop_generation_buffer: 120.0,
            spread: 10.0,
            batch_min: 1,
            batch_max: 1,
            eager: false,
        }
    }
}

impl StreamConfig {
    pub fn halos() -> Self {
        Self::default()
    }

    pub fn birds() -> Self {
        Self {
            spacing: 45.0,
            jitter: 15.0,
            spawn_ahead: 40.0,
            ..Self::default()
        }
    }

    pub fn clouds() -> Self {
        Self {
            spacing: 25.0,
            jitter: 12.0,
            spawn_ahead: 60.0,
            retire_buffer: 40.0,
            stop_generation_buffer: 60.0,
            spread: 40.0,
            batch_min: 1,
            batch_max: 3,
            eager: false,
        }
    }

    pub fn islands() -> Self {
        Self {
            spacing: 90.0,
            jitter: 30.0,
            spawn_ahead: 0.0,
            retire_buffer: 150.0,
            stop_generation_buffer: 50.0,
            spread: 120.0,
            batch_min: 1,
            batch_max: 1,
            eager: true,
        }
    }

    fn validate(&self, field: &'static str) -> Result<(), ConfigError> {
        if !(self.spacing > 0.0) {
            return Err(invalid(field, "spacing must be positive"));
        }
        if self.jitter < 0.0 || self.jitter >= self.spacing {
            return Err(invalid(field, "jitter must lie in [0, spacing)"));
        }
        if self.spawn_ahead < 0.0 || self.retire_buffer < 0.0 || self.stop_generation_buffer < 0.0
        {
            return Err(invalid(field, "buffers must be non-negative"));
        }
        if !(self.spread >= 0.0) {
            return Err(invalid(field, "spread must be non-negative"));
        }
        if self.batch_min == 0 || self.batch_min > self.batch_max {
            return Err(invalid(field, "batch range must satisfy 1 <= min <= max"));
        }
        Ok(())
    }
}

/// Bird movement and behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BirdTuning {
    /// Velocity ceiling (units/second); actual speed scales with round
    pub max_velocity: f32,
    /// Horizontal distance at which a halo patroller starts turning
    pub turn_radius: f32,
    /// Patrol never strays further than this from its halo
    pub oscillation_distance: f32,
    /// Per-tick chance of reversing (patrol) or retreating (hunt)
    pub reverse_chance: f64,
    /// How long a hunting bird retreats, in milliseconds
    pub retreat_ms: f32,
    /// Chance a new bird patrols a halo instead of hunting the cat
    pub track_halo_chance: f64,
    /// Horizontal distance from its halo a patroller spawns at
    pub patrol_spawn_distance: f32,
}

impl Default for BirdTuning {
    fn default() -> Self {
        Self {
            max_velocity: 12.0,
            turn_radius: 0.5,
            oscillation_distance: 5.0,
            reverse_chance: 0.005,
            retreat_ms: 500.0,
            track_halo_chance: 0.5,
            patrol_spawn_distance: 10.0,
        }
    }
}

/// Collision detection thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionTuning {
    /// Ray hits closer than this count as contact
    pub threshold: f32,
    /// Seconds after a collision during which detection is suspended
    pub cooldown: f32,
}

impl Default for CollisionTuning {
    fn default() -> Self {
        Self {
            threshold: 0.25,
            cooldown: 1.0,
        }
    }
}

/// Health decay and damage
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthTuning {
    pub decay_amount: f32,
    pub decay_interval_ms: f32,
    pub bird_strike_damage: f32,
}

impl Default for HealthTuning {
    fn default() -> Self {
        Self {
            decay_amount: 2.0,
            decay_interval_ms: 1000.0,
            bird_strike_damage: 20.0,
        }
    }
}

/// Follow camera
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraTuning {
    /// Lerp factor toward the desired position each tick (1.0 = snap)
    pub smoothing: f32,
    /// Offset from the player before pitch/yaw rotation
    pub base_offset: [f32; 3],
    pub pitch_min: f32,
    pub pitch_max: f32,
    /// Radians per pixel of drag at 60 Hz
    pub drag_speed: f32,
}

impl Default for CameraTuning {
    fn default() -> Self {
        Self {
            smoothing: 0.1,
            base_offset: [0.0, 6.0, 8.0],
            pitch_min: -0.35,
            pitch_max: 0.6,
            drag_speed: 0.005,
        }
    }
}

/// Player movement
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    /// Constant fall rate (units/second)
    pub fall_speed: f32,
    /// Horizontal speed from movement intent (units/second)
    pub move_speed: f32,
    /// Horizontal clamp (half-extent of the play column)
    pub bound: f32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            fall_speed: 30.0,
            move_speed: 10.0,
            bound: 12.0,
        }
    }
}

/// Complete tuning table
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub world: WorldTuning,
    pub halos: StreamConfig,
    pub birds: StreamConfig,
    pub clouds: StreamConfig,
    pub islands: StreamConfig,
    pub bird_behavior: BirdTuning,
    pub collision: CollisionTuning,
    pub health: HealthTuning,
    pub camera: CameraTuning,
    pub player: PlayerTuning,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            world: WorldTuning::default(),
            halos: StreamConfig::halos(),
            birds: StreamConfig::birds(),
            clouds: StreamConfig::clouds(),
            islands: StreamConfig::islands(),
            bird_behavior: BirdTuning::default(),
            collision: CollisionTuning::default(),
            health: HealthTuning::default(),
            camera: CameraTuning::default(),
            player: PlayerTuning::default(),
        }
    }
}

impl Tuning {
    /// Parse and validate a tuning table
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let w = &self.world;
        if w.ground_floor > w.initial_ground_level {
            return Err(invalid("world.ground_floor", "floor must not be above the initial ground"));
        }
        if w.spawn_height <= w.initial_ground_level + w.round_end_buffer {
            return Err(invalid("world.spawn_height", "spawn must be above the round-end line"));
        }
        if w.round_depth < 0.0 || w.round_end_buffer < 0.0 {
            return Err(invalid("world", "round depth and end buffer must be non-negative"));
        }

        self.halos.validate("halos")?;
        self.birds.validate("birds")?;
        self.clouds.validate("clouds")?;
        self.islands.validate("islands")?;

        let b = &self.bird_behavior;
        for (field, p) in [
            ("bird_behavior.reverse_chance", b.reverse_chance),
            ("bird_behavior.track_halo_chance", b.track_halo_chance),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(invalid(field, "probability must lie in [0, 1]"));
            }
        }
        if b.max_velocity < 0.0 || b.oscillation_distance <= b.turn_radius {
            return Err(invalid(
                "bird_behavior",
                "velocity must be non-negative and oscillation distance exceed turn radius",
            ));
        }

        if self.collision.threshold <= 0.0 || self.collision.cooldown < 0.0 {
            return Err(invalid("collision", "threshold must be positive, cooldown non-negative"));
        }
        if self.health.decay_interval_ms <= 0.0 {
            return Err(invalid("health.decay_interval_ms", "interval must be positive"));
        }

        let c = &self.camera;
        if !(c.smoothing > 0.0 && c.smoothing <= 1.0) {
            return Err(invalid("camera.smoothing", "must lie in (0, 1]"));
        }
        if c.pitch_min > c.pitch_max {
            return Err(invalid("camera.pitch_min", "must not exceed pitch_max"));
        }
        Ok(())
    }
}
