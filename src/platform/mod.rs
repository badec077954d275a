//! Platform collaborators
//!
//! The simulation talks to the outside world through three seams:
//! - `SceneGraph`: the renderer's attach/detach and transform sync
//! - `Hud`: health bar, counters and menus
//! - `AudioSink`: sound effects
//!
//! `dispatch_events` routes drained `GameEvent`s to them. None of them can
//! reach back into the simulation.

use glam::Vec3;

use crate::audio::{AudioSink, SoundEffect};
use crate::sim::{EntityId, EntityKind, GameEvent, GamePhase, SceneSnapshot, Transform, WorldPlanes};

/// Renderer-side scene graph
pub trait SceneGraph {
    fn add(&mut self, id: EntityId, kind: EntityKind, transform: &Transform);
    fn remove(&mut self, id: EntityId);
    fn set_transform(&mut self, id: EntityId, transform: &Transform);
    fn set_player(&mut self, transform: &Transform);
    fn set_camera(&mut self, position: Vec3, target: Vec3);
    fn set_planes(&mut self, planes: WorldPlanes);
}

/// Display-only overlay
pub trait Hud {
    /// Health as a percentage
    fn set_health(&mut self, percent: f32);
    fn update_round_counter(&mut self, round: u32);
    fn update_score(&mut self, score: u32);
    fn show_start_menu(&mut self);
    fn show_game_over(&mut self, score: u32, round: u32);
    fn hide_menus(&mut self);
}

/// Scene graph that draws nothing
#[derive(Debug, Default)]
pub struct NullScene;

impl SceneGraph for NullScene {
    fn add(&mut self, _id: EntityId, _kind: EntityKind, _transform: &Transform) {}
    fn remove(&mut self, _id: EntityId) {}
    fn set_transform(&mut self, _id: EntityId, _transform: &Transform) {}
    fn set_player(&mut self, _transform: &Transform) {}
    fn set_camera(&mut self, _position: Vec3, _target: Vec3) {}
    fn set_planes(&mut self, _planes: WorldPlanes) {}
}

/// HUD that writes to the log (headless runs)
#[derive(Debug, Default)]
pub struct LogHud;

impl Hud for LogHud {
    fn set_health(&mut self, percent: f32) {
        log::debug!("Health {percent:.0}%");
    }

    fn update_round_counter(&mut self, round: u32) {
        log::info!("Round {round}");
    }

    fn update_score(&mut self, score: u32) {
        log::debug!("Score {score}");
    }

    fn show_start_menu(&mut self) {
        log::info!("[menu] start");
    }

    fn show_game_over(&mut self, score: u32, round: u32) {
        log::info!("[menu] game over - score {score}, round {round}");
    }

    fn hide_menus(&mut self) {}
}

/// Route events to collaborators, in order
pub fn dispatch_events(
    events: &[GameEvent],
    scene: &mut impl SceneGraph,
    hud: &mut impl Hud,
    audio: &mut impl AudioSink,
) {
    for event in events {
        match event {
            GameEvent::PhaseChanged(GamePhase::Menu) => hud.show_start_menu(),
            GameEvent::PhaseChanged(GamePhase::Playing) => {
                hud.hide_menus();
                hud.update_round_counter(1);
            }
            GameEvent::PhaseChanged(GamePhase::GameOver) => {}
            GameEvent::EntitySpawned { id, kind, transform } => scene.add(*id, *kind, transform),
            GameEvent::EntityRetired { id, .. } => scene.remove(*id),
            GameEvent::HaloCollected { .. } | GameEvent::BirdStrike { .. } => {}
            GameEvent::HealthChanged(health) => hud.set_health(*health),
            GameEvent::ScoreChanged(score) => hud.update_score(*score),
            GameEvent::RoundCompleted { round, .. } => hud.update_round_counter(*round),
            GameEvent::GameOver { score, round } => hud.show_game_over(*score, *round),
        }

        if let Some(effect) = SoundEffect::for_event(event) {
            audio.play(effect);
        }
    }
}

/// Push the frame's transforms to the scene graph
pub fn sync_scene(snapshot: &SceneSnapshot, scene: &mut impl SceneGraph) {
    scene.set_player(&snapshot.player);
    scene.set_camera(snapshot.camera_position, snapshot.camera_target);
    scene.set_planes(snapshot.planes);
    for entity in &snapshot.entities {
        scene.set_transform(entity.id, &entity.transform);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::ModelLibrary;
    use crate::audio::NullAudio;
    use crate::sim::{GameScene, TickInput, tick};
    use crate::tuning::Tuning;
    use std::collections::BTreeMap;

    #[derive(Default)]
    struct RecordingScene {
        nodes: BTreeMap<EntityId, (EntityKind, Transform)>,
        player: Option<Transform>,
        planes: Option<WorldPlanes>,
    }

    impl SceneGraph for RecordingScene {
        fn add(&mut self, id: EntityId, kind: EntityKind, transform: &Transform) {
            assert!(self.nodes.insert(id, (kind, *transform)).is_none(), "{id:?} added twice");
        }

        fn remove(&mut self, id: EntityId) {
            assert!(self.nodes.remove(&id).is_some(), "{id:?} removed but never added");
        }

        fn set_transform(&mut self, id: EntityId, transform: &Transform) {
            let node = self.nodes.get_mut(&id).expect("transform for unknown node");
            node.1 = *transform;
        }

        fn set_player(&mut self, transform: &Transform) {
            self.player = Some(*transform);
        }

        fn set_camera(&mut self, _position: Vec3, _target: Vec3) {}

        fn set_planes(&mut self, planes: WorldPlanes) {
            self.planes = Some(planes);
        }
    }

    #[derive(Default, Debug, PartialEq)]
    struct RecordingHud {
        health: Option<f32>,
        round: Option<u32>,
        score: Option<u32>,
        menu: Option<String>,
    }

    impl Hud for RecordingHud {
        fn set_health(&mut self, percent: f32) {
            self.health = Some(percent);
        }

        fn update_round_counter(&mut self, round: u32) {
            self.round = Some(round);
        }

        fn update_score(&mut self, score: u32) {
            self.score = Some(score);
        }

        fn show_start_menu(&mut self) {
            self.menu = Some("start".into());
        }

        fn show_game_over(&mut self, score: u32, round: u32) {
            self.menu = Some(format!("game over {score} {round}"));
        }

        fn hide_menus(&mut self) {
            self.menu = None;
        }
    }

    #[derive(Default)]
    struct RecordingAudio(Vec<SoundEffect>);

    impl AudioSink for RecordingAudio {
        fn play(&mut self, effect: SoundEffect) {
            self.0.push(effect);
        }
    }

    #[test]
    fn test_hud_follows_events() {
        let mut hud = RecordingHud::default();
        let mut audio = RecordingAudio::default();
        let events = [
            GameEvent::PhaseChanged(GamePhase::Playing),
            GameEvent::HealthChanged(100.0),
            GameEvent::HaloCollected {
                id: EntityId(4),
                score: 1,
            },
            GameEvent::ScoreChanged(1),
            GameEvent::RoundCompleted {
                round: 2,
                ground_level: -500.0,
            },
            GameEvent::PhaseChanged(GamePhase::GameOver),
            GameEvent::GameOver { score: 1, round: 2 },
        ];
        dispatch_events(&events, &mut NullScene, &mut hud, &mut audio);

        assert_eq!(
            hud,
            RecordingHud {
                health: Some(100.0),
                round: Some(2),
                score: Some(1),
                menu: Some("game over 1 2".into()),
            }
        );
        assert_eq!(
            audio.0,
            vec![SoundEffect::HaloCollect, SoundEffect::RoundComplete, SoundEffect::GameOver]
        );
    }

    #[test]
    fn test_scene_graph_mirrors_live_entities() {
        let mut game = GameScene::with_models(5, Tuning::default(), ModelLibrary::with_builtin_meshes());
        let mut scene = RecordingScene::default();
        let mut hud = RecordingHud::default();

        game.start();
        let input = TickInput::default();
        for _ in 0..600 {
            tick(&mut game, &input, crate::consts::SIM_DT);
            dispatch_events(&game.drain_events(), &mut scene, &mut hud, &mut NullAudio);
            sync_scene(&game.snapshot(), &mut scene);
        }

        let live: Vec<EntityId> = game.entities().map(|e| e.id).collect();
        let mut attached: Vec<EntityId> = scene.nodes.keys().copied().collect();
        let mut expected = live.clone();
        expected.sort();
        attached.sort();
        assert_eq!(attached, expected);

        let player = scene.player.expect("player synced");
        assert_eq!(player.position, game.player().position());
        assert_eq!(scene.planes, Some(game.planes()));
    }
}
