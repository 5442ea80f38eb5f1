#![warn(missing_docs)]

//! Keyed mesh cache shared by all decoration generation in myoviz.
//!
//! Maps string keys (mesh file paths, in-memory instance identities, or
//! canonical primitive names) to previously generated or loaded [`Mesh`]es,
//! so that every decoration referencing the same geometry shares one
//! underlying mesh instead of regenerating or re-reading it.
//!
//! The cache is a plain, explicitly owned object: the application constructs
//! one and passes it by reference into decoration generation. All access is
//! expected to happen on the frame/UI thread; there is no internal locking.

use std::collections::HashMap;
use std::f32::consts::TAU;

use myoviz_mesh::Mesh;

const SPHERE_KEY: &str = "builtin/unit_sphere";
const CYLINDER_KEY: &str = "builtin/unit_cylinder";
const CONE_KEY: &str = "builtin/unit_cone";
const BRICK_KEY: &str = "builtin/unit_brick";
const CIRCLE_KEY: &str = "builtin/unit_circle";

/// Process-lifetime cache of generated/loaded meshes.
#[derive(Debug, Default)]
pub struct MeshCache {
    entries: HashMap<String, Mesh>,
}

impl MeshCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the mesh stored under `key`, invoking `generator` to produce
    /// and store it on a miss. For a given key the generator runs at most
    /// once for the cache's lifetime; every hit returns a handle to the same
    /// underlying mesh.
    pub fn get(&mut self, key: &str, generator: impl FnOnce() -> Mesh) -> Mesh {
        if let Some(mesh) = self.entries.get(key) {
            return mesh.clone();
        }
        let mesh = generator();
        self.entries.insert(key.to_owned(), mesh.clone());
        mesh
    }

    /// Fallible form of [`MeshCache::get`] for generators that can fail
    /// (e.g. loading a mesh file from disk). Nothing is stored when the
    /// generator errors, so a later lookup retries it.
    pub fn try_get<E>(
        &mut self,
        key: &str,
        generator: impl FnOnce() -> Result<Mesh, E>,
    ) -> Result<Mesh, E> {
        if let Some(mesh) = self.entries.get(key) {
            return Ok(mesh.clone());
        }
        let mesh = generator()?;
        self.entries.insert(key.to_owned(), mesh.clone());
        Ok(mesh)
    }

    /// Number of cached meshes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no meshes.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Evict every entry, forcing subsequent lookups to regenerate/reload.
    /// Used when mesh files may have changed on disk and must be re-read.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Unit-radius UV sphere.
    pub fn sphere(&mut self) -> Mesh {
        self.get(SPHERE_KEY, || myoviz_meshgen::sphere(1.0, 32, 16))
    }

    /// Unit-radius cylinder spanning y = -1..+1.
    pub fn cylinder(&mut self) -> Mesh {
        self.get(CYLINDER_KEY, || {
            myoviz_meshgen::cylinder(1.0, 1.0, 2.0, 32, 1, false, 0.0, TAU)
        })
    }

    /// Unit-radius cone spanning y = -1..+1, apex at +Y.
    pub fn cone(&mut self) -> Mesh {
        self.get(CONE_KEY, || myoviz_meshgen::cone(1.0, 2.0, 32, 1, false, 0.0, TAU))
    }

    /// Cube spanning [-1, +1] on each axis, so per-axis half-extents can be
    /// applied directly as scale.
    pub fn brick(&mut self) -> Mesh {
        self.get(BRICK_KEY, || myoviz_meshgen::brick(2.0, 2.0, 2.0))
    }

    /// Unit-radius disc in the XY plane.
    pub fn circle(&mut self) -> Mesh {
        self.get(CIRCLE_KEY, || myoviz_meshgen::circle(1.0, 32))
    }

    /// Torus keyed by its two radii (tori are not scale-invariant: the
    /// tube/center ratio changes the shape, so each radii pair is its own
    /// cache entry).
    pub fn torus(&mut self, center_radius: f32, tube_radius: f32) -> Mesh {
        let key = format!(
            "builtin/torus/{:08x}/{:08x}",
            center_radius.to_bits(),
            tube_radius.to_bits()
        );
        self.get(&key, || {
            myoviz_meshgen::torus(center_radius, tube_radius, 12, 32, TAU)
        })
    }
}
