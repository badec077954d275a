//! Player-versus-entity collision detection
//!
//! Every vertex of the cat's collision mesh casts a short ray along its
//! outward normal. A ray that meets a halo or bird mesh within `threshold`
//! world units is a contact. At most one contact is resolved per frame, and
//! a resolved contact starts a cooldown so a single touch is not counted on
//! consecutive frames.

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use super::bird::Bird;
use super::entity::{EntityId, Halo, Streamable};
use super::mesh::Mesh;
use crate::tuning::CollisionTuning;

/// The single contact resolved in a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollisionEvent {
    /// The cat flew through a halo
    Collect(EntityId),
    /// A bird hit the cat
    Strike(EntityId),
}

#[derive(Debug, Clone)]
pub struct CollisionDetector {
    threshold: f32,
    cooldown: f32,
    /// Seconds until detection resumes
    cooldown_remaining: f32,
}

impl CollisionDetector {
    pub fn new(tuning: &CollisionTuning) -> Self {
        Self {
            threshold: tuning.threshold,
            cooldown: tuning.cooldown,
            cooldown_remaining: 0.0,
        }
    }

    pub fn is_cooling_down(&self) -> bool {
        self.cooldown_remaining > 0.0
    }

    /// Count down the cooldown
    pub fn update(&mut self, dt: f32) {
        self.cooldown_remaining = (self.cooldown_remaining - dt).max(0.0);
    }

    pub fn reset(&mut self) {
        self.cooldown_remaining = 0.0;
    }

    /// Test the player against every live halo, then every live bird.
    ///
    /// Returns `None` while cooling down or while the player mesh has not
    /// loaded yet. Targets without a mesh cannot be hit.
    pub fn detect(
        &mut self,
        player_mesh: Option<&Mesh>,
        player_world: &Mat4,
        halos: &[Halo],
        birds: &[Bird],
    ) -> Option<CollisionEvent> {
        if self.is_cooling_down() {
            return None;
        }
        let player_mesh = player_mesh?;

        for (origin, normal) in player_mesh.world_vertices(player_world) {
            if normal == Vec3::ZERO {
                continue;
            }

            let event = first_hit(halos, origin, normal, self.threshold)
                .map(CollisionEvent::Collect)
                .or_else(|| first_hit(birds, origin, normal, self.threshold).map(CollisionEvent::Strike));

            if let Some(event) = event {
                self.cooldown_remaining = self.cooldown;
                log::debug!("Collision {:?} at {:?}", event, origin);
                return Some(event);
            }
        }

        None
    }
}

/// First target whose mesh the ray meets within `max_dist`
fn first_hit<T: Streamable>(targets: &[T], origin: Vec3, dir: Vec3, max_dist: f32) -> Option<EntityId> {
    targets.iter().find_map(|target| {
        let mesh = target.mesh()?;
        mesh.raycast(&target.transform().matrix(), origin, dir, max_dist)
            .map(|_| target.id())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn detector() -> CollisionDetector {
        CollisionDetector::new(&CollisionTuning::default())
    }

    fn player_mesh() -> Mesh {
        Mesh::uv_sphere(1.0, 8, 16)
    }

    fn target_mesh() -> Arc<Mesh> {
        Arc::new(Mesh::uv_sphere(0.5, 8, 16))
    }

    /// Just beside the player on +X, 0.1 units from its surface
    const NEAR: Vec3 = Vec3::new(1.6, 0.013, 0.021);

    fn halo_at(id: u32, pos: Vec3) -> Halo {
        let mut halo = Halo::new(EntityId(id), pos);
        halo.attach_mesh(target_mesh());
        halo
    }

    fn bird_at(id: u32, pos: Vec3) -> Bird {
        let mut bird = Bird::hunter(EntityId(id), pos, 1.0);
        bird.attach_mesh(target_mesh());
        bird
    }

    #[test]
    fn test_nearby_halo_is_collected() {
        let mut d = detector();
        let event = d.detect(Some(&player_mesh()), &Mat4::IDENTITY, &[halo_at(1, NEAR)], &[]);
        assert_eq!(event, Some(CollisionEvent::Collect(EntityId(1))));
        assert!(d.is_cooling_down());
    }

    #[test]
    fn test_nearby_bird_strikes() {
        let mut d = detector();
        let event = d.detect(Some(&player_mesh()), &Mat4::IDENTITY, &[], &[bird_at(2, NEAR)]);
        assert_eq!(event, Some(CollisionEvent::Strike(EntityId(2))));
    }

    #[test]
    fn test_distant_targets_miss() {
        let mut d = detector();
        let far = Vec3::new(3.0, 0.013, 0.021);
        assert!(
            d.detect(Some(&player_mesh()), &Mat4::IDENTITY, &[halo_at(1, far)], &[bird_at(2, far)])
                .is_none()
        );
        assert!(!d.is_cooling_down());
    }

    #[test]
    fn test_player_transform_is_applied() {
        let mut d = detector();
        let world = Mat4::from_translation(Vec3::new(0.0, -50.0, 0.0));
        assert!(d.detect(Some(&player_mesh()), &world, &[halo_at(1, NEAR)], &[]).is_none());

        let halo = halo_at(1, NEAR + Vec3::new(0.0, -50.0, 0.0));
        assert!(d.detect(Some(&player_mesh()), &world, &[halo], &[]).is_some());
    }

    #[test]
    fn test_one_event_per_frame_then_cooldown() {
        let mut d = detector();
        let mesh = player_mesh();
        let halos = [halo_at(1, NEAR), halo_at(2, -NEAR)];
        let birds = [bird_at(3, NEAR)];

        // Halos are tested before birds
        assert_eq!(
            d.detect(Some(&mesh), &Mat4::IDENTITY, &halos, &birds),
            Some(CollisionEvent::Collect(EntityId(1)))
        );
        assert!(d.detect(Some(&mesh), &Mat4::IDENTITY, &halos, &birds).is_none());

        d.update(0.5);
        assert!(d.detect(Some(&mesh), &Mat4::IDENTITY, &halos, &birds).is_none());

        d.update(0.6);
        assert!(!d.is_cooling_down());
        assert!(d.detect(Some(&mesh), &Mat4::IDENTITY, &halos, &birds).is_some());
    }

    #[test]
    fn test_missing_geometry_means_no_collision() {
        let mut d = detector();
        assert!(d.detect(None, &Mat4::IDENTITY, &[halo_at(1, NEAR)], &[]).is_none());
        assert!(!d.is_cooling_down());

        // Target whose model has not loaded
        let bare = Halo::new(EntityId(5), NEAR);
        assert!(d.detect(Some(&player_mesh()), &Mat4::IDENTITY, &[bare], &[]).is_none());
    }

    #[test]
    fn test_reset_clears_cooldown() {
        let mut d = detector();
        d.detect(Some(&player_mesh()), &Mat4::IDENTITY, &[halo_at(1, NEAR)], &[]);
        assert!(d.is_cooling_down());
        d.reset();
        assert!(!d.is_cooling_down());
    }
}
