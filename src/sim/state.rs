//! Game scene and lifecycle
//!
//! `GameScene` owns every simulation component and is the only thing that
//! advances them. Collaborators (renderer, HUD, audio) learn what happened
//! by draining `GameEvent`s; they never mutate the scene.

use std::sync::Arc;

use glam::Vec3;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::bird::Bird;
use super::camera::CameraRig;
use super::collision::CollisionDetector;
use super::entity::{BackgroundIsland, Cloud, EntityId, EntityKind, Halo, Lifecycle, Streamable, Transform};
use super::mesh::{Mesh, ModelKind};
use super::player::PlayerController;
use super::progression::{HealthModel, RoundManager, ScoreManager, ground_level_for_round};
use super::stream::StreamManager;
use crate::assets::ModelLibrary;
use crate::settings::Settings;
use crate::tuning::{StreamConfig, Tuning};

/// Current phase of the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Start menu, nothing running
    Menu,
    /// Falling
    Playing,
    /// Health ran out; final score is kept for display
    GameOver,
}

/// Everything collaborators need to hear about, in the order it happened
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    PhaseChanged(GamePhase),
    /// Attach to the scene graph
    EntitySpawned {
        id: EntityId,
        kind: EntityKind,
        transform: Transform,
    },
    /// Detach from the scene graph
    EntityRetired { id: EntityId, kind: EntityKind },
    HaloCollected { id: EntityId, score: u32 },
    BirdStrike { id: EntityId, health: f32 },
    HealthChanged(f32),
    ScoreChanged(u32),
    RoundCompleted { round: u32, ground_level: f32 },
    GameOver { score: u32, round: u32 },
}

/// Large planes that follow the descent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldPlanes {
    /// Landing surface, at the current ground level
    pub ground_y: f32,
    /// Backdrop kept a fixed distance below the player
    pub backdrop_y: f32,
}

/// Hands out entity ids, never reusing one for the life of the scene
#[derive(Debug, Clone)]
pub struct IdAllocator {
    next: u32,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl IdAllocator {
    pub fn next(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next += 1;
        id
    }
}

/// Player/camera state handed to the renderer each frame
#[derive(Debug, Clone, Serialize)]
pub struct SceneSnapshot {
    pub phase: GamePhase,
    pub player: Transform,
    pub camera_position: Vec3,
    pub camera_target: Vec3,
    pub planes: WorldPlanes,
    pub entities: Vec<EntitySnapshot>,
    pub health: f32,
    pub score: u32,
    pub round: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct EntitySnapshot {
    pub id: EntityId,
    pub kind: EntityKind,
    pub transform: Transform,
}

/// The orchestrator: one per page, reset rather than recreated
#[derive(Debug)]
pub struct GameScene {
    /// Run seed for reproducibility
    pub seed: u64,
    pub(super) rng: Pcg32,
    pub(super) tuning: Tuning,
    pub(super) phase: GamePhase,
    /// Cleared synchronously on every path out of `Playing`; ticks check it first
    pub(super) running: bool,
    /// Simulation tick counter
    pub(super) time_ticks: u64,
    pub(super) player: PlayerController,
    pub(super) camera: CameraRig,
    pub(super) halos: StreamManager<Halo>,
    pub(super) birds: StreamManager<Bird>,
    pub(super) clouds: StreamManager<Cloud>,
    pub(super) islands: StreamManager<BackgroundIsland>,
    pub(super) collisions: CollisionDetector,
    pub(super) rounds: RoundManager,
    pub(super) score: ScoreManager,
    pub(super) health: HealthModel,
    pub(super) ground_level: f32,
    pub(super) planes: WorldPlanes,
    pub(super) models: ModelLibrary,
    pub(super) ids: IdAllocator,
    pub(super) events: Vec<GameEvent>,
}

impl GameScene {
    /// Create a scene in the menu. Models start unrequested.
    pub fn new(seed: u64, tuning: Tuning) -> Self {
        Self::with_models(seed, tuning, ModelLibrary::new())
    }

    pub fn with_models(seed: u64, tuning: Tuning, models: ModelLibrary) -> Self {
        let world = &tuning.world;
        let spawn = Vec3::new(0.0, world.spawn_height, 0.0);
        let ground = world.initial_ground_level;

        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            phase: GamePhase::Menu,
            running: false,
            time_ticks: 0,
            player: PlayerController::new(tuning.player.clone(), world.spawn_height),
            camera: CameraRig::new(&tuning.camera, spawn),
            halos: stream(&tuning.halos, world.spawn_height, ground),
            birds: stream(&tuning.birds, world.spawn_height, ground),
            clouds: stream(&tuning.clouds, world.spawn_height, ground),
            islands: stream(&tuning.islands, world.spawn_height, ground),
            collisions: CollisionDetector::new(&tuning.collision),
            rounds: RoundManager::new(world.round_end_buffer),
            score: ScoreManager::default(),
            health: HealthModel::new(),
            ground_level: ground,
            planes: WorldPlanes {
                ground_y: ground,
                backdrop_y: world.spawn_height - world.backdrop_distance,
            },
            models,
            ids: IdAllocator::default(),
            events: Vec::new(),
            tuning,
        }
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn time_ticks(&self) -> u64 {
        self.time_ticks
    }

    pub fn player(&self) -> &PlayerController {
        &self.player
    }

    pub fn camera(&self) -> &CameraRig {
        &self.camera
    }

    pub fn halos(&self) -> &StreamManager<Halo> {
        &self.halos
    }

    pub fn birds(&self) -> &StreamManager<Bird> {
        &self.birds
    }

    pub fn clouds(&self) -> &StreamManager<Cloud> {
        &self.clouds
    }

    pub fn islands(&self) -> &StreamManager<BackgroundIsland> {
        &self.islands
    }

    pub fn health(&self) -> &HealthModel {
        &self.health
    }

    pub fn score(&self) -> u32 {
        self.score.score()
    }

    pub fn round(&self) -> u32 {
        self.rounds.find_round_num()
    }

    pub fn ground_level(&self) -> f32 {
        self.ground_level
    }

    pub fn planes(&self) -> WorldPlanes {
        self.planes
    }

    pub fn models(&self) -> &ModelLibrary {
        &self.models
    }

    /// The asset loader reports through here
    pub fn models_mut(&mut self) -> &mut ModelLibrary {
        &mut self.models
    }

    pub fn apply_settings(&mut self, settings: &Settings) {
        self.camera.set_preferences(settings.drag_sensitivity, settings.invert_pitch);
    }

    /// Take everything that happened since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Menu or game over → playing, from a clean slate
    pub fn start(&mut self) {
        if self.phase == GamePhase::Playing {
            log::warn!("start() while already playing; restarting");
        }
        self.stop();
        self.reset_world();

        let health = &self.tuning.health;
        self.health.decrease_health_over_time(health.decay_amount, health.decay_interval_ms);
        self.running = true;
        self.set_phase(GamePhase::Playing);
        log::info!("Game started (seed {})", self.seed);
    }

    /// Same path as `start`
    pub fn restart(&mut self) {
        self.start();
    }

    /// Leave a game in progress for the menu
    pub fn abort_to_menu(&mut self) {
        if self.phase != GamePhase::Playing {
            return;
        }
        self.stop();
        self.reset_world();
        self.set_phase(GamePhase::Menu);
        log::info!("Game aborted to menu");
    }

    /// Health ran out. Score and round are left in place for display.
    pub(super) fn game_over(&mut self) {
        self.stop();
        self.set_phase(GamePhase::GameOver);
        let (score, round) = (self.score.score(), self.rounds.find_round_num());
        self.events.push(GameEvent::GameOver { score, round });
        log::info!("Game over: score {score}, round {round}");
    }

    /// Synchronous stop: no tick or decay step runs after this returns
    fn stop(&mut self) {
        self.running = false;
        self.health.cancel_decay();
    }

    fn set_phase(&mut self, phase: GamePhase) {
        if self.phase != phase {
            self.phase = phase;
            self.events.push(GameEvent::PhaseChanged(phase));
        }
    }

    /// Round 1, full health, zero score, fresh streams
    fn reset_world(&mut self) {
        self.rounds.reset();
        self.score.reset();
        self.health.reset();
        self.collisions.reset();
        self.ground_level = self.tuning.world.initial_ground_level;

        let spawn_height = self.tuning.world.spawn_height;
        self.player.reset(spawn_height);
        self.camera.reset(self.player.position());
        self.reset_streams();
        self.update_planes();

        self.events.push(GameEvent::HealthChanged(self.health.health()));
        self.events.push(GameEvent::ScoreChanged(self.score.score()));
    }

    /// Player past the round-end line: go deeper
    pub(super) fn complete_round(&mut self) {
        let round = self.rounds.find_round_num();
        self.ground_level = ground_level_for_round(&self.tuning.world, round);
        self.collisions.reset();

        self.player.reset(self.tuning.world.spawn_height);
        self.camera.snap_to(self.player.position());
        self.reset_streams();
        self.update_planes();

        self.events.push(GameEvent::RoundCompleted {
            round,
            ground_level: self.ground_level,
        });
        log::info!("Round {round} begins, ground at {:.0}", self.ground_level);
    }

    /// Clear every stream against the current ground level
    fn reset_streams(&mut self) {
        let ground = self.ground_level;
        let round = self.rounds.find_round_num();
        let Self {
            rng,
            ids,
            tuning,
            models,
            events,
            halos,
            birds,
            clouds,
            islands,
            ..
        } = self;

        let cleared = halos.reset(ground, rng, |y, rng| Halo::spawn(ids.next(), y, tuning.halos.spread, rng));
        retire_all(&cleared, events);
        register(halos.live_mut(), models, events);

        let cleared = birds.reset(ground, rng, |y, rng| {
            Bird::spawn(ids.next(), y, tuning.birds.spread, round, halos.live(), &tuning.bird_behavior, rng)
        });
        retire_all(&cleared, events);
        register(birds.live_mut(), models, events);

        let cleared = clouds.reset(ground, rng, |y, rng| Cloud::spawn(ids.next(), y, tuning.clouds.spread, rng));
        retire_all(&cleared, events);
        register(clouds.live_mut(), models, events);

        let cleared = islands.reset(ground, rng, |y, rng| {
            BackgroundIsland::spawn(ids.next(), y, tuning.islands.spread, rng)
        });
        retire_all(&cleared, events);
        register(islands.live_mut(), models, events);
    }

    pub(super) fn update_planes(&mut self) {
        self.planes = WorldPlanes {
            ground_y: self.ground_level,
            backdrop_y: self.player.position().y - self.tuning.world.backdrop_distance,
        };
    }

    /// Player and camera plus every live entity, for the renderer
    pub fn snapshot(&self) -> SceneSnapshot {
        let player = self.player.player();
        SceneSnapshot {
            phase: self.phase,
            player: Transform {
                position: player.position,
                rotation: glam::Quat::from_rotation_y(player.facing),
                scale: Vec3::ONE,
            },
            camera_position: self.camera.position(),
            camera_target: self.camera.target(),
            planes: self.planes,
            entities: self.entities().collect(),
            health: self.health.health(),
            score: self.score.score(),
            round: self.rounds.find_round_num(),
        }
    }

    /// Every live entity, background first
    pub fn entities(&self) -> impl Iterator<Item = EntitySnapshot> + '_ {
        snapshots(self.islands.live())
            .chain(snapshots(self.clouds.live()))
            .chain(snapshots(self.halos.live()))
            .chain(snapshots(self.birds.live()))
    }

    pub(super) fn player_mesh(&self) -> Option<Arc<Mesh>> {
        self.models.mesh(ModelKind::Cat)
    }
}

fn stream<T: Streamable>(config: &StreamConfig, spawn_height: f32, ground: f32) -> StreamManager<T> {
    StreamManager::new(config.clone(), spawn_height, ground)
}

fn snapshots<T: Streamable>(live: &[T]) -> impl Iterator<Item = EntitySnapshot> + '_ {
    live.iter().map(|e| EntitySnapshot {
        id: e.id(),
        kind: T::KIND,
        transform: *e.transform(),
    })
}

/// Announce newly spawned entities and give them a mesh if one is ready
pub(super) fn register<T: Streamable>(live: &mut [T], models: &ModelLibrary, events: &mut Vec<GameEvent>) {
    let mesh = models.mesh(T::KIND.model());
    for entity in live.iter_mut().filter(|e| e.lifecycle() == Lifecycle::Spawned) {
        if let Some(mesh) = &mesh {
            entity.attach_mesh(Arc::clone(mesh));
        }
        entity.set_lifecycle(Lifecycle::Active);
        events.push(GameEvent::EntitySpawned {
            id: entity.id(),
            kind: T::KIND,
            transform: *entity.transform(),
        });
    }
}

pub(super) fn retire_all<T: Streamable>(retired: &[T], events: &mut Vec<GameEvent>) {
    for entity in retired {
        log::debug!("{:?} {:?} retired", T::KIND, entity.id());
        events.push(GameEvent::EntityRetired {
            id: entity.id(),
            kind: T::KIND,
        });
    }
}

/// Give meshes to entities spawned before their model finished loading
pub(super) fn attach_ready_meshes<T: Streamable>(live: &mut [T], models: &ModelLibrary) {
    if live.iter().all(|e| e.mesh().is_some()) {
        return;
    }
    if let Some(mesh) = models.mesh(T::KIND.model()) {
        for entity in live.iter_mut() {
            entity.attach_mesh(Arc::clone(&mesh));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene() -> GameScene {
        GameScene::with_models(7, Tuning::default(), ModelLibrary::with_builtin_meshes())
    }

    #[test]
    fn test_new_scene_waits_in_menu() {
        let scene = scene();
        assert_eq!(scene.phase(), GamePhase::Menu);
        assert!(!scene.is_running());
        assert!(scene.halos().is_empty());
        assert!(!scene.health().is_decaying());
    }

    #[test]
    fn test_start_resets_and_populates_islands() {
        let mut scene = scene();
        scene.start();
        assert_eq!(scene.phase(), GamePhase::Playing);
        assert!(scene.is_running());
        assert!(scene.health().is_decaying());
        assert_eq!(scene.round(), 1);
        assert_eq!(scene.score(), 0);
        assert_eq!(scene.ground_level(), -100.0);

        // Islands exist immediately; the rest wait for the descent
        assert!(!scene.islands().is_empty());
        assert!(scene.halos().is_empty() && scene.birds().is_empty() && scene.clouds().is_empty());

        let events = scene.drain_events();
        assert!(events.contains(&GameEvent::PhaseChanged(GamePhase::Playing)));
        let spawned = events.iter().filter(|e| matches!(e, GameEvent::EntitySpawned { .. })).count();
        assert_eq!(spawned, scene.islands().len());
        assert!(scene.drain_events().is_empty());

        for island in scene.islands().live() {
            assert_eq!(island.lifecycle(), Lifecycle::Active);
            assert!(island.mesh().is_some());
        }
    }

    #[test]
    fn test_game_over_keeps_score_and_stops() {
        let mut scene = scene();
        scene.start();
        scene.score.update();
        scene.drain_events();

        scene.game_over();
        assert_eq!(scene.phase(), GamePhase::GameOver);
        assert!(!scene.is_running());
        assert!(!scene.health().is_decaying());
        assert_eq!(scene.score(), 1);
        assert_eq!(
            scene.drain_events(),
            vec![
                GameEvent::PhaseChanged(GamePhase::GameOver),
                GameEvent::GameOver { score: 1, round: 1 }
            ]
        );
    }

    #[test]
    fn test_abort_to_menu_resets() {
        let mut scene = scene();
        scene.abort_to_menu();
        assert!(scene.drain_events().is_empty());

        scene.start();
        scene.score.update();
        scene.abort_to_menu();
        assert_eq!(scene.phase(), GamePhase::Menu);
        assert!(!scene.is_running());
        assert!(!scene.health().is_decaying());
        assert_eq!(scene.score(), 0);
    }

    #[test]
    fn test_restart_retires_previous_entities() {
        let mut scene = scene();
        scene.start();
        let first: Vec<EntityId> = scene.islands().live().iter().map(|i| i.id()).collect();
        scene.drain_events();

        scene.restart();
        let events = scene.drain_events();
        for id in first {
            assert!(events.contains(&GameEvent::EntityRetired {
                id,
                kind: EntityKind::Island
            }));
        }
        // Ids are never reused
        let max_old = events
            .iter()
            .filter_map(|e| match e {
                GameEvent::EntityRetired { id, .. } => Some(*id),
                _ => None,
            })
            .max();
        assert!(scene.islands().live().iter().all(|i| Some(i.id()) > max_old));
    }

    #[test]
    fn test_ids_are_sequential() {
        let mut ids = IdAllocator::default();
        assert_eq!(ids.next(), EntityId(1));
        assert_eq!(ids.next(), EntityId(2));
    }

    #[test]
    fn test_snapshot_lists_every_entity() {
        let mut scene = scene();
        scene.start();
        let snapshot = scene.snapshot();
        assert_eq!(snapshot.entities.len(), scene.islands().len());
        assert_eq!(snapshot.player.position, Vec3::new(0.0, 200.0, 0.0));
        assert_eq!(snapshot.planes.backdrop_y, -200.0);
        assert!(serde_json::to_string(&snapshot).is_ok());
    }
}
