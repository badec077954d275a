//! Model library
//!
//! The asset loader runs outside the simulation and reports back whenever a
//! model finishes. Each model occupies a slot that is pending until then.
//! The simulation only ever asks "is this mesh ready yet" and never waits.

use std::collections::HashMap;
use std::sync::Arc;

use glam::Vec3;
use thiserror::Error;

use crate::sim::mesh::{Mesh, ModelKind};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetError {
    #[error("failed to load {path}: {reason}")]
    Load { path: String, reason: String },
    #[error("unknown model path {0}")]
    UnknownModel(String),
    #[error("malformed mesh buffers for {path}: {reason}")]
    Malformed { path: String, reason: String },
}

/// Loading state of one model
#[derive(Debug, Clone)]
pub enum AssetState {
    Pending,
    Ready(Arc<Mesh>),
    Failed(AssetError),
}

#[derive(Debug, Default)]
pub struct ModelLibrary {
    slots: HashMap<ModelKind, AssetState>,
}

impl ModelLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Library with every model already resolved to its procedural stand-in
    pub fn with_builtin_meshes() -> Self {
        let mut library = Self::new();
        for kind in ModelKind::ALL {
            library.slots.insert(kind, AssetState::Ready(Arc::new(builtin_mesh(kind))));
        }
        library
    }

    /// Mark a model as wanted. Returns true if the caller should start loading it.
    pub fn request(&mut self, kind: ModelKind) -> bool {
        if self.slots.contains_key(&kind) {
            return false;
        }
        self.slots.insert(kind, AssetState::Pending);
        true
    }

    /// Record the outcome of a load
    pub fn resolve(&mut self, kind: ModelKind, result: Result<Mesh, AssetError>) {
        let state = match result {
            Ok(mesh) => {
                log::info!("Model {} ready ({} vertices)", kind.path(), mesh.vertices.len());
                AssetState::Ready(Arc::new(mesh))
            }
            Err(err) => {
                log::warn!("Model {} unavailable, continuing without it: {err}", kind.path());
                AssetState::Failed(err)
            }
        };
        self.slots.insert(kind, state);
    }

    /// Resolve by loader path
    pub fn resolve_path(&mut self, path: &str, result: Result<Mesh, AssetError>) -> Result<ModelKind, AssetError> {
        let kind = ModelKind::from_path(path).ok_or_else(|| AssetError::UnknownModel(path.to_string()))?;
        self.resolve(kind, result);
        Ok(kind)
    }

    pub fn state(&self, kind: ModelKind) -> Option<&AssetState> {
        self.slots.get(&kind)
    }

    pub fn mesh(&self, kind: ModelKind) -> Option<Arc<Mesh>> {
        match self.slots.get(&kind) {
            Some(AssetState::Ready(mesh)) => Some(Arc::clone(mesh)),
            _ => None,
        }
    }

    pub fn is_pending(&self, kind: ModelKind) -> bool {
        matches!(self.slots.get(&kind), Some(AssetState::Pending))
    }
}

/// Procedural collision mesh used when no model file is available
pub fn builtin_mesh(kind: ModelKind) -> Mesh {
    match kind {
        ModelKind::Cat => Mesh::uv_sphere(0.6, 8, 12),
        ModelKind::Halo => Mesh::torus(1.5, 0.15, 24, 8),
        ModelKind::Bird => Mesh::bird(1.6),
        ModelKind::Cloud | ModelKind::Island => Mesh::uv_sphere(1.0, 6, 8),
    }
}

/// Build a mesh from flat vertex/normal/index buffers as a loader hands them over
pub fn mesh_from_buffers(path: &str, positions: &[f32], normals: &[f32], indices: &[u32]) -> Result<Mesh, AssetError> {
    let malformed = |reason: &str| AssetError::Malformed {
        path: path.to_string(),
        reason: reason.to_string(),
    };

    if positions.len() % 3 != 0 || normals.len() != positions.len() {
        return Err(malformed("positions and normals must be matching xyz triples"));
    }
    if indices.len() % 3 != 0 {
        return Err(malformed("index count is not a multiple of 3"));
    }
    let vertex_count = positions.len() / 3;
    if indices.iter().any(|&i| i as usize >= vertex_count) {
        return Err(malformed("index out of range"));
    }

    let vertices = positions.chunks_exact(3).map(Vec3::from_slice).collect();
    let normals = normals.chunks_exact(3).map(|n| Vec3::from_slice(n).normalize_or_zero()).collect();
    let triangles = indices.chunks_exact(3).map(|t| [t[0], t[1], t[2]]).collect();
    Ok(Mesh::new(vertices, normals, triangles))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_then_resolve() {
        let mut library = ModelLibrary::new();
        assert!(library.request(ModelKind::Halo));
        assert!(!library.request(ModelKind::Halo));
        assert!(library.is_pending(ModelKind::Halo));
        assert!(library.mesh(ModelKind::Halo).is_none());

        library.resolve(ModelKind::Halo, Ok(builtin_mesh(ModelKind::Halo)));
        assert!(library.mesh(ModelKind::Halo).is_some());
    }

    #[test]
    fn test_failed_load_degrades_to_no_mesh() {
        let mut library = ModelLibrary::new();
        library.request(ModelKind::Bird);
        let err = AssetError::Load {
            path: "models/bird.glb".into(),
            reason: "404".into(),
        };
        library.resolve(ModelKind::Bird, Err(err.clone()));
        assert!(library.mesh(ModelKind::Bird).is_none());
        assert!(matches!(library.state(ModelKind::Bird), Some(AssetState::Failed(e)) if *e == err));
    }

    #[test]
    fn test_resolve_path_rejects_unknown_models() {
        let mut library = ModelLibrary::new();
        let result = library.resolve_path("models/dog.glb", Ok(builtin_mesh(ModelKind::Cat)));
        assert_eq!(result, Err(AssetError::UnknownModel("models/dog.glb".into())));

        let kind = library.resolve_path("models/cat.glb", Ok(builtin_mesh(ModelKind::Cat)));
        assert_eq!(kind, Ok(ModelKind::Cat));
    }

    #[test]
    fn test_builtin_library_is_complete() {
        let library = ModelLibrary::with_builtin_meshes();
        for kind in ModelKind::ALL {
            assert!(library.mesh(kind).is_some(), "{kind:?}");
        }
    }

    #[test]
    fn test_mesh_from_buffers() {
        let positions = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        let normals = [0.0, 0.0, 2.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0];
        let mesh = mesh_from_buffers("m", &positions, &normals, &[0, 1, 2]).unwrap();
        assert_eq!(mesh.triangles, vec![[0, 1, 2]]);
        assert_eq!(mesh.normals[0], Vec3::Z);

        assert!(mesh_from_buffers("m", &positions, &normals, &[0, 1, 3]).is_err());
        assert!(mesh_from_buffers("m", &positions[..8], &normals, &[0, 1, 2]).is_err());
        assert!(mesh_from_buffers("m", &positions, &normals, &[0, 1]).is_err());
    }
}
