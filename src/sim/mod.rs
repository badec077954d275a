//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep for ticks, wall-clock only for health decay
//! - Seeded RNG only
//! - Stable iteration order (spawn order within each stream)
//! - No rendering or platform dependencies

pub mod bird;
pub mod camera;
pub mod collision;
pub mod entity;
pub mod mesh;
pub mod player;
pub mod progression;
pub mod state;
pub mod stream;
pub mod tick;
pub mod timer;

pub use bird::{Bird, BirdMode, BirdState, velocity_for_round};
pub use camera::{CameraRig, DragEvent};
pub use collision::{CollisionDetector, CollisionEvent};
pub use entity::{BackgroundIsland, Cloud, EntityId, EntityKind, Halo, Lifecycle, Streamable, Transform};
pub use mesh::{Mesh, ModelKind};
pub use player::{DirectionKeys, Player, PlayerController};
pub use progression::{HealthModel, RoundManager, ScoreManager, ground_level_for_round};
pub use state::{EntitySnapshot, GameEvent, GamePhase, GameScene, SceneSnapshot, WorldPlanes};
pub use stream::StreamManager;
pub use tick::{FixedStep, TickInput, run_frame, tick};
