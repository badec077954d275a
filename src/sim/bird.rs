//! Bird behavior
//!
//! Birds fly in the horizontal plane at the height they spawned at. Half of
//! them patrol a halo (approach it, then oscillate around it); the rest hunt
//! the cat and occasionally break off for a short retreat.

use glam::{Quat, Vec3};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::entity::{Body, EntityId, EntityKind, Halo, Streamable, Transform, impl_streamable};
use crate::tuning::BirdTuning;
use crate::{horizontal, yaw_toward};

/// What a bird is chasing, fixed at spawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BirdMode {
    TrackHalo,
    TrackCat,
}

/// Behavior sub-state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BirdState {
    /// Patroller flying straight at its halo
    InitialTracking,
    /// Patroller oscillating around its halo
    StartTurning,
    /// Hunter closing in on the cat
    TowardsCat,
    /// Hunter backing off until the timer runs out
    AwayFromCat { remaining_ms: f32 },
}

/// The halo a patroller circles. Halos never move, so the position is
/// captured once and stays valid after the halo is collected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HaloAnchor {
    pub id: EntityId,
    pub position: Vec3,
}

/// Bird speed for a round: `min(0.95, 1 - 1.1^-round) * max_velocity`
pub fn velocity_for_round(round: u32, max_velocity: f32) -> f32 {
    let exponent = -(round.min(i32::MAX as u32) as i32);
    let factor = (1.0 - 1.1_f32.powi(exponent)).min(0.95);
    factor * max_velocity
}

#[derive(Debug, Clone)]
pub struct Bird {
    pub body: Body,
    pub mode: BirdMode,
    pub state: BirdState,
    /// Horizontal speed (units/second), fixed at spawn
    pub velocity: f32,
    /// Current horizontal heading (unit length, or zero before the first move)
    pub direction: Vec3,
    pub halo: Option<HaloAnchor>,
}

impl Bird {
    pub fn hunter(id: EntityId, position: Vec3, velocity: f32) -> Self {
        Self {
            body: Body::new(id, Transform::at(position)),
            mode: BirdMode::TrackCat,
            state: BirdState::TowardsCat,
            velocity,
            direction: Vec3::ZERO,
            halo: None,
        }
    }

    pub fn patroller(id: EntityId, position: Vec3, velocity: f32, halo: HaloAnchor) -> Self {
        let direction = horizontal(halo.position - position).normalize_or_zero();
        let mut bird = Self {
            body: Body::new(id, Transform::at(position)),
            mode: BirdMode::TrackHalo,
            state: BirdState::InitialTracking,
            velocity,
            direction,
            halo: Some(halo),
        };
        bird.face_direction();
        bird
    }

    /// Spawn a bird at height `y`.
    ///
    /// Patrollers pick the live halo closest in height and start
    /// `patrol_spawn_distance` away from it horizontally. With no halo
    /// available the bird hunts the cat.
    pub fn spawn(
        id: EntityId,
        y: f32,
        spread: f32,
        round: u32,
        halos: &[Halo],
        tuning: &BirdTuning,
        rng: &mut impl Rng,
    ) -> Self {
        let velocity = velocity_for_round(round, tuning.max_velocity);
        let patrol = rng.random_bool(tuning.track_halo_chance);

        let nearest_halo = halos.iter().min_by(|a, b| {
            let da = (a.position().y - y).abs();
            let db = (b.position().y - y).abs();
            da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
        });

        match nearest_halo {
            Some(halo) if patrol => {
                let angle = rng.random_range(0.0..std::f32::consts::TAU);
                let anchor = halo.position();
                let offset = Vec3::new(angle.cos(), 0.0, angle.sin()) * tuning.patrol_spawn_distance;
                let position = Vec3::new(anchor.x, y, anchor.z) + offset;
                Self::patroller(
                    id,
                    position,
                    velocity,
                    HaloAnchor {
                        id: halo.id(),
                        position: anchor,
                    },
                )
            }
            _ => {
                let position = Vec3::new(
                    rng.random_range(-spread..=spread),
                    y,
                    rng.random_range(-spread..=spread),
                );
                Self::hunter(id, position, velocity)
            }
        }
    }

    /// Advance one tick
    pub fn update(&mut self, player_pos: Vec3, dt: f32, tuning: &BirdTuning, rng: &mut impl Rng) {
        match self.mode {
            BirdMode::TrackHalo => self.update_patrol(dt, tuning, rng),
            BirdMode::TrackCat => self.update_hunt(player_pos, dt, tuning, rng),
        }
    }

    fn update_patrol(&mut self, dt: f32, tuning: &BirdTuning, rng: &mut impl Rng) {
        let Some(anchor) = self.halo else {
            return;
        };
        let to_halo = horizontal(anchor.position - self.position());
        let distance = to_halo.length();

        match self.state {
            BirdState::InitialTracking => {
                if distance < tuning.turn_radius {
                    // Keep the current heading so the bird flies through
                    self.state = BirdState::StartTurning;
                } else if let Some(dir) = to_halo.try_normalize() {
                    self.direction = dir;
                }
            }
            BirdState::StartTurning => {
                if rng.random_bool(tuning.reverse_chance) {
                    self.direction = -self.direction;
                } else if distance > tuning.oscillation_distance && self.direction.dot(to_halo) < 0.0 {
                    self.direction = -self.direction;
                }
            }
            BirdState::TowardsCat | BirdState::AwayFromCat { .. } => {
                self.state = BirdState::InitialTracking;
            }
        }

        self.advance(dt);
    }

    fn update_hunt(&mut self, player_pos: Vec3, dt: f32, tuning: &BirdTuning, rng: &mut impl Rng) {
        self.state = match self.state {
            BirdState::TowardsCat if rng.random_bool(tuning.reverse_chance) => {
                BirdState::AwayFromCat {
                    remaining_ms: tuning.retreat_ms,
                }
            }
            BirdState::AwayFromCat { remaining_ms } => {
                let remaining_ms = remaining_ms - dt * 1000.0;
                if remaining_ms <= 0.0 {
                    BirdState::TowardsCat
                } else {
                    BirdState::AwayFromCat { remaining_ms }
                }
            }
            BirdState::TowardsCat => BirdState::TowardsCat,
            BirdState::InitialTracking | BirdState::StartTurning => BirdState::TowardsCat,
        };

        // Directly under/over the cat: no defined heading this tick
        let Some(toward) = horizontal(player_pos - self.position()).try_normalize() else {
            return;
        };
        self.direction = match self.state {
            BirdState::AwayFromCat { .. } => -toward,
            _ => toward,
        };
        self.advance(dt);
    }

    fn advance(&mut self, dt: f32) {
        if self.direction.length_squared() < 1e-12 {
            return;
        }
        self.body.transform.position += self.direction * self.velocity * dt;
        self.face_direction();
    }

    fn face_direction(&mut self) {
        if self.direction.length_squared() > 1e-12 {
            self.body.transform.rotation = Quat::from_rotation_y(yaw_toward(self.direction));
        }
    }
}

impl_streamable!(Bird, EntityKind::Bird);
