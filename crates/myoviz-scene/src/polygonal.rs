//! The physics engine's polygon-soup mesh representation and its conversion
//! into the renderer's triangle format.
//!
//! The engine hands over meshes (in-memory or loaded from file) as indexed
//! polygonal faces of arbitrary arity. The renderer wants plain triangles,
//! so each face is triangulated and given a flat per-face normal.

use std::path::Path;

use myoviz_math::{Point3, Vec3};
use myoviz_mesh::Mesh;
use serde::{Deserialize, Serialize};

/// An indexed polygon-soup mesh, as produced by the engine's mesh loaders.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolygonalMesh {
    /// Vertex positions.
    pub vertices: Vec<Point3>,
    /// Faces as lists of vertex indices, arbitrary arity.
    pub faces: Vec<Vec<u32>>,
}

impl PolygonalMesh {
    /// Triangulate into an unindexed-style triangle [`Mesh`] with flat
    /// per-face normals (each triangle's corners are emitted as fresh
    /// vertices, so no normal smoothing happens across faces).
    ///
    /// Per face:
    /// - fewer than 3 vertices: skipped (a stray line/point in the soup)
    /// - 3 vertices: passed through as-is
    /// - 4 vertices: split into the triangles (0,1,2) and (2,3,0)
    /// - n-gon: fan-triangulated around the face's average center point,
    ///   one triangle per edge including the closing edge
    ///
    /// Faces referencing out-of-range vertex indices are skipped whole.
    pub fn triangulate(&self) -> Mesh {
        let mut vertices: Vec<Point3> = Vec::new();
        let mut normals: Vec<Vec3> = Vec::new();

        let mut push_triangle = |a: Point3, b: Point3, c: Point3| {
            let normal = (b - a)
                .cross(&(c - a))
                .try_normalize(f32::EPSILON)
                .unwrap_or_else(Vec3::zeros);
            vertices.extend([a, b, c]);
            normals.extend([normal, normal, normal]);
        };

        for face in &self.faces {
            if face.iter().any(|&i| i as usize >= self.vertices.len()) {
                continue;
            }
            let corner = |i: usize| self.vertices[face[i] as usize];

            match face.len() {
                0..=2 => {}
                3 => push_triangle(corner(0), corner(1), corner(2)),
                4 => {
                    push_triangle(corner(0), corner(1), corner(2));
                    push_triangle(corner(2), corner(3), corner(0));
                }
                n => {
                    let center = Point3::from(
                        (0..n).map(|i| corner(i).coords).sum::<Vec3>() / n as f32,
                    );
                    for i in 0..n {
                        push_triangle(corner(i), corner((i + 1) % n), center);
                    }
                }
            }
        }

        let indices: Vec<u32> = (0..vertices.len() as u32).collect();
        let mut mesh = Mesh::new();
        mesh.set_vertices(vertices);
        mesh.set_normals(normals);
        mesh.set_indices(indices);
        mesh
    }
}

/// Loads mesh files in whatever formats the surrounding application
/// supports, returning the engine's polygon-soup representation.
///
/// Decoration generation only drives this on a mesh-cache miss; a cache hit
/// never touches the loader (or the disk). Implemented for any
/// `FnMut(&Path) -> io::Result<PolygonalMesh>` closure.
pub trait MeshLoader {
    /// Load and parse the mesh file at `path`.
    fn load(&mut self, path: &Path) -> std::io::Result<PolygonalMesh>;
}

impl<F> MeshLoader for F
where
    F: FnMut(&Path) -> std::io::Result<PolygonalMesh>,
{
    fn load(&mut self, path: &Path) -> std::io::Result<PolygonalMesh> {
        self(path)
    }
}
