//! Per-frame simulation step
//!
//! Order matters: player, camera, streams, collisions, round end, world
//! planes. Each stage reads what the previous one produced this frame.

use serde::{Deserialize, Serialize};

use super::bird::Bird;
use super::camera::DragEvent;
use super::collision::CollisionEvent;
use super::entity::{BackgroundIsland, Cloud, Halo};
use super::player::DirectionKeys;
use super::state::{GameEvent, GamePhase, GameScene, attach_ready_meshes, register, retire_all};
use crate::consts::{MAX_FRAME_DT, MAX_SUBSTEPS, SIM_DT};

/// Input snapshot consumed by one tick
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TickInput {
    /// Directional keys currently held
    pub keys: DirectionKeys,
    /// Camera drag events since the last tick
    pub drag: Vec<DragEvent>,
}

/// Advance the scene by one fixed timestep
pub fn tick(scene: &mut GameScene, input: &TickInput, dt: f32) {
    if !scene.running || scene.phase != GamePhase::Playing {
        return;
    }
    scene.time_ticks += 1;

    // Player
    scene.player.update(input.keys, scene.camera.yaw(), scene.ground_level, dt);
    let player_pos = scene.player.position();

    // Camera
    for event in &input.drag {
        scene.camera.handle(*event, dt);
    }
    scene.camera.update(player_pos);

    // Streams
    step_streams(scene, dt);

    // Collisions
    scene.collisions.update(dt);
    let player_mesh = scene.player_mesh();
    let event = scene.collisions.detect(
        player_mesh.as_deref(),
        &scene.player.player().world_matrix(),
        scene.halos.live(),
        scene.birds.live(),
    );
    if let Some(event) = event {
        resolve_collision(scene, event);
        if !scene.running {
            return;
        }
    }

    // Round end
    if scene.rounds.check_round_end(player_pos.y, scene.ground_level) {
        scene.complete_round();
    }

    scene.update_planes();
}

/// Generate, retire and update every stream around the player
fn step_streams(scene: &mut GameScene, dt: f32) {
    let player_pos = scene.player.position();
    let round = scene.rounds.find_round_num();
    let GameScene {
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
    } = scene;

    // Halos before birds: new patrollers can pick a halo spawned this frame
    let spawned = halos.generate(player_pos.y, rng, |y, rng| {
        Halo::spawn(ids.next(), y, tuning.halos.spread, rng)
    });
    register(spawned, models, events);
    retire_all(&halos.remove_passed(player_pos.y), events);

    let spawned = birds.generate(player_pos.y, rng, |y, rng| {
        Bird::spawn(ids.next(), y, tuning.birds.spread, round, halos.live(), &tuning.bird_behavior, rng)
    });
    register(spawned, models, events);
    retire_all(&birds.remove_passed(player_pos.y), events);

    let spawned = clouds.generate(player_pos.y, rng, |y, rng| {
        Cloud::spawn(ids.next(), y, tuning.clouds.spread, rng)
    });
    register(spawned, models, events);
    retire_all(&clouds.remove_passed(player_pos.y), events);

    let spawned = islands.generate(player_pos.y, rng, |y, rng| {
        BackgroundIsland::spawn(ids.next(), y, tuning.islands.spread, rng)
    });
    register(spawned, models, events);
    retire_all(&islands.remove_passed(player_pos.y), events);

    for bird in birds.live_mut() {
        bird.update(player_pos, dt, &tuning.bird_behavior, rng);
    }

    attach_ready_meshes(halos.live_mut(), models);
    attach_ready_meshes(birds.live_mut(), models);
    attach_ready_meshes(clouds.live_mut(), models);
    attach_ready_meshes(islands.live_mut(), models);
}

fn resolve_collision(scene: &mut GameScene, event: CollisionEvent) {
    match event {
        CollisionEvent::Collect(id) => {
            if let Some(halo) = scene.halos.remove(id) {
                retire_all(&[halo], &mut scene.events);
            }
            let score = scene.score.update();
            scene.events.push(GameEvent::HaloCollected { id, score });
            scene.events.push(GameEvent::ScoreChanged(score));
        }
        CollisionEvent::Strike(id) => {
            let depleted = scene.health.decrease_health(scene.tuning.health.bird_strike_damage);
            let health = scene.health.health();
            scene.events.push(GameEvent::BirdStrike { id, health });
            scene.events.push(GameEvent::HealthChanged(health));
            if depleted {
                scene.game_over();
            }
        }
    }
}

impl GameScene {
    /// Wall-clock hook for the health decay schedule, called once per
    /// display frame independent of how many ticks ran
    pub fn advance_clock(&mut self, dt_ms: f32) {
        if !self.running {
            return;
        }
        let report = self.health.advance(dt_ms);
        if report.steps > 0 {
            self.events.push(GameEvent::HealthChanged(self.health.health()));
        }
        if report.depleted {
            self.game_over();
        }
    }
}

/// Fixed-timestep accumulator
#[derive(Debug, Clone, Default)]
pub struct FixedStep {
    accumulator: f32,
}

impl FixedStep {
    /// Add a frame's elapsed time; returns how many ticks to run
    pub fn advance(&mut self, frame_dt: f32) -> u32 {
        self.accumulator += frame_dt.clamp(0.0, MAX_FRAME_DT);

        let mut steps = 0;
        while self.accumulator >= SIM_DT && steps < MAX_SUBSTEPS {
            self.accumulator -= SIM_DT;
            steps += 1;
        }
        // Drop backlog the substep cap could not absorb
        if steps == MAX_SUBSTEPS {
            self.accumulator = self.accumulator.min(SIM_DT);
        }
        steps
    }
}

/// Run one display frame: fixed ticks, then the wall clock.
///
/// Drag events are consumed by the first tick that runs.
pub fn run_frame(scene: &mut GameScene, clock: &mut FixedStep, input: &mut TickInput, frame_dt: f32) -> u32 {
    let steps = clock.advance(frame_dt);
    for _ in 0..steps {
        tick(scene, input, SIM_DT);
        input.drag.clear();
    }
    scene.advance_clock(frame_dt.clamp(0.0, MAX_FRAME_DT) * 1000.0);
    steps
}
