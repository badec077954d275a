//! Streamed gameplay entities
//!
//! Entities are passive data: a transform, a lifecycle tag, and a collision
//! mesh attached once the asset loader delivers it. Only the owning stream
//! manager (and the entity's own `update`) moves them.

use std::sync::Arc;

use glam::{Mat4, Quat, Vec3};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::mesh::{Mesh, ModelKind};

/// Unique identifier for an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

/// Entity categories the renderer distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Halo,
    Bird,
    Cloud,
    Island,
}

impl EntityKind {
    pub fn model(&self) -> ModelKind {
        match self {
            EntityKind::Halo => ModelKind::Halo,
            EntityKind::Bird => ModelKind::Bird,
            EntityKind::Cloud => ModelKind::Cloud,
            EntityKind::Island => ModelKind::Island,
        }
    }
}

/// Position, orientation and scale of an entity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::at(Vec3::ZERO)
    }
}

impl Transform {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }

    /// Local-to-world matrix
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }
}

/// Where an entity is in its life
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Lifecycle {
    /// Created this frame, not yet announced to collaborators
    Spawned,
    /// Live, registered with the scene
    Active,
    /// Removed from its manager
    Retired,
}

/// State every streamed entity shares
#[derive(Debug, Clone)]
pub struct Body {
    pub id: EntityId,
    pub transform: Transform,
    pub lifecycle: Lifecycle,
    /// Collision mesh, attached when the model finishes loading
    pub mesh: Option<Arc<Mesh>>,
}

impl Body {
    pub fn new(id: EntityId, transform: Transform) -> Self {
        Self {
            id,
            transform,
            lifecycle: Lifecycle::Spawned,
            mesh: None,
        }
    }
}

/// An entity a `StreamManager` can own
pub trait Streamable {
    const KIND: EntityKind;

    fn body(&self) -> &Body;
    fn body_mut(&mut self) -> &mut Body;

    fn id(&self) -> EntityId {
        self.body().id
    }

    fn position(&self) -> Vec3 {
        self.body().transform.position
    }

    fn transform(&self) -> &Transform {
        &self.body().transform
    }

    fn lifecycle(&self) -> Lifecycle {
        self.body().lifecycle
    }

    fn set_lifecycle(&mut self, lifecycle: Lifecycle) {
        self.body_mut().lifecycle = lifecycle;
    }

    fn mesh(&self) -> Option<&Arc<Mesh>> {
        self.body().mesh.as_ref()
    }

    /// Attach the loaded model; returns false if one was already attached
    fn attach_mesh(&mut self, mesh: Arc<Mesh>) -> bool {
        let body = self.body_mut();
        if body.mesh.is_some() {
            return false;
        }
        body.mesh = Some(mesh);
        true
    }
}

macro_rules! impl_streamable {
    ($ty:ty, $kind:expr) => {
        impl Streamable for $ty {
            const KIND: EntityKind = $kind;

            fn body(&self) -> &Body {
                &self.body
            }

            fn body_mut(&mut self) -> &mut Body {
                &mut self.body
            }
        }
    };
}

pub(crate) use impl_streamable;

/// Collectible ring
#[derive(Debug, Clone)]
pub struct Halo {
    pub body: Body,
}

impl Halo {
    pub fn new(id: EntityId, position: Vec3) -> Self {
        Self {
            body: Body::new(id, Transform::at(position)),
        }
    }

    /// Halo at `y` somewhere inside the play column, slightly tilted
    pub fn spawn(id: EntityId, y: f32, spread: f32, rng: &mut impl Rng) -> Self {
        let x = rng.random_range(-spread..=spread);
        let z = rng.random_range(-spread..=spread);
        let mut halo = Self::new(id, Vec3::new(x, y, z));
        let tilt = rng.random_range(-0.3..=0.3);
        let yaw = rng.random_range(0.0..std::f32::consts::TAU);
        halo.body.transform.rotation = Quat::from_rotation_y(yaw) * Quat::from_rotation_x(tilt);
        halo
    }
}

impl_streamable!(Halo, EntityKind::Halo);

/// Random scale and rotation for scenery
fn scenery_transform(position: Vec3, min_scale: f32, max_scale: f32, rng: &mut impl Rng) -> Transform {
    let scale = rng.random_range(min_scale..=max_scale);
    Transform {
        position,
        rotation: Quat::from_rotation_y(rng.random_range(0.0..std::f32::consts::TAU)),
        scale: Vec3::new(scale * rng.random_range(1.0..=1.6), scale, scale),
    }
}

/// Decorative cloud - no behavior
#[derive(Debug, Clone)]
pub struct Cloud {
    pub body: Body,
}

impl Cloud {
    pub fn spawn(id: EntityId, y: f32, spread: f32, rng: &mut impl Rng) -> Self {
        let position = Vec3::new(
            rng.random_range(-spread..=spread),
            y,
            rng.random_range(-spread..=spread),
        );
        Self {
            body: Body::new(id, scenery_transform(position, 2.0, 5.0, rng)),
        }
    }
}

impl_streamable!(Cloud, EntityKind::Cloud);

/// Floating island far out in the background - no behavior
#[derive(Debug, Clone)]
pub struct BackgroundIsland {
    pub body: Body,
}

impl BackgroundIsland {
    /// Islands sit on a ring around the play column so they never block it
    pub fn spawn(id: EntityId, y: f32, spread: f32, rng: &mut impl Rng) -> Self {
        let angle = rng.random_range(0.0..std::f32::consts::TAU);
        let radius = rng.random_range(spread * 0.5..=spread);
        let position = Vec3::new(radius * angle.cos(), y, radius * angle.sin());
        Self {
            body: Body::new(id, scenery_transform(position, 8.0, 20.0, rng)),
        }
    }
}

impl_streamable!(BackgroundIsland, EntityKind::Island);

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_new_entities_start_spawned_without_mesh() {
        let halo = Halo::new(EntityId(7), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(halo.id(), EntityId(7));
        assert_eq!(halo.lifecycle(), Lifecycle::Spawned);
        assert!(halo.mesh().is_none());
        assert_eq!(halo.position(), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_attach_mesh_only_once() {
        let mut halo = Halo::new(EntityId(1), Vec3::ZERO);
        let mesh = Arc::new(Mesh::torus(1.0, 0.1, 8, 4));
        assert!(halo.attach_mesh(mesh.clone()));
        assert!(!halo.attach_mesh(mesh));
    }

    #[test]
    fn test_spawns_respect_height_and_spread() {
        let mut rng = Pcg32::seed_from_u64(3);
        for i in 0..50 {
            let halo = Halo::spawn(EntityId(i), -40.0, 10.0, &mut rng);
            assert_eq!(halo.position().y, -40.0);
            assert!(halo.position().x.abs() <= 10.0 && halo.position().z.abs() <= 10.0);

            let island = BackgroundIsland::spawn(EntityId(i), 12.0, 100.0, &mut rng);
            let r = crate::horizontal(island.position()).length();
            assert!(r >= 49.9 && r <= 100.1, "island radius {r}");
            assert!(island.transform().scale.y >= 8.0);
        }
    }

    #[test]
    fn test_transform_matrix_places_origin() {
        let t = Transform::at(Vec3::new(4.0, -2.0, 1.0));
        assert_eq!(t.matrix().transform_point3(Vec3::ZERO), Vec3::new(4.0, -2.0, 1.0));
    }
}
