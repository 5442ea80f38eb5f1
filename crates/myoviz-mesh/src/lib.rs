#![warn(missing_docs)]

//! Copy-on-write renderable mesh handle for the myoviz scene pipeline.
//!
//! A [`Mesh`] is a cheap, value-like handle to CPU-side geometry buffers
//! (positions, optional per-vertex attributes, an index buffer, submesh
//! ranges). Copies share the underlying storage; the first mutation after a
//! share clones it. The renderer uploads the buffers to the GPU lazily on
//! first draw, which is outside this crate's scope.

use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};

use myoviz_math::{Aabb, Point3, Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// A 4-component vector (tangent + handedness sign).
pub type Vec4 = nalgebra::Vector4<f32>;

/// How a mesh's index buffer is interpreted by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MeshTopology {
    /// Every 3 indices form a triangle.
    #[default]
    Triangles,
    /// Every 2 indices form a line segment.
    Lines,
}

/// An RGBA color with linear `f32` components.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    /// Red.
    pub r: f32,
    /// Green.
    pub g: f32,
    /// Blue.
    pub b: f32,
    /// Alpha (1.0 = opaque).
    pub a: f32,
}

impl Color {
    /// Opaque white.
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);
    /// Opaque red.
    pub const RED: Self = Self::new(1.0, 0.0, 0.0, 1.0);
    /// Opaque green.
    pub const GREEN: Self = Self::new(0.0, 1.0, 0.0, 1.0);
    /// Opaque blue.
    pub const BLUE: Self = Self::new(0.0, 0.0, 1.0, 1.0);
    /// Fully transparent black, the zero-value for vertex color attributes.
    pub const CLEAR: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    /// Create a color from components.
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

/// A mesh index buffer. 16-bit where the vertex count permits, to halve the
/// upload size of the (very common) small primitive meshes.
#[derive(Debug, Clone, PartialEq)]
pub enum Indices {
    /// 16-bit indices.
    U16(Vec<u16>),
    /// 32-bit indices.
    U32(Vec<u32>),
}

impl Indices {
    /// Number of indices.
    pub fn len(&self) -> usize {
        match self {
            Indices::U16(v) => v.len(),
            Indices::U32(v) => v.len(),
        }
    }

    /// Whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate the indices widened to `u32`.
    pub fn iter(&self) -> Box<dyn Iterator<Item = u32> + '_> {
        match self {
            Indices::U16(v) => Box::new(v.iter().map(|&i| u32::from(i))),
            Indices::U32(v) => Box::new(v.iter().copied()),
        }
    }
}

/// An index range within a mesh that can be drawn separately (e.g. the torso
/// and each cap of a cylinder).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubMeshDescriptor {
    /// First index of the range.
    pub index_start: usize,
    /// Number of indices in the range.
    pub index_count: usize,
    /// Topology of the range.
    pub topology: MeshTopology,
}

impl SubMeshDescriptor {
    /// Create a descriptor.
    pub fn new(index_start: usize, index_count: usize, topology: MeshTopology) -> Self {
        Self {
            index_start,
            index_count,
            topology,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct MeshData {
    topology: MeshTopology,
    vertices: Vec<Point3>,
    normals: Vec<Vec3>,
    tex_coords: Vec<Vec2>,
    colors: Vec<Color>,
    tangents: Vec<Vec4>,
    indices: Option<Indices>,
    submeshes: Vec<SubMeshDescriptor>,
    bounds: OnceLock<Option<Aabb>>,
}

impl MeshData {
    // invariant: every nonempty attribute buffer has exactly `vertices.len()` entries
    fn resize_attributes(&mut self) {
        let n = self.vertices.len();
        if !self.normals.is_empty() {
            self.normals.resize(n, Vec3::zeros());
        }
        if !self.tex_coords.is_empty() {
            self.tex_coords.resize(n, Vec2::zeros());
        }
        if !self.colors.is_empty() {
            self.colors.resize(n, Color::CLEAR);
        }
        if !self.tangents.is_empty() {
            self.tangents.resize(n, Vec4::zeros());
        }
    }
}

/// A value-like handle to renderable geometry.
///
/// Cloning is cheap and shares storage. Equality and hashing are by storage
/// identity, not content, so a mesh pulled twice from a cache compares equal
/// to itself and distinct from an identical regeneration.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    data: Arc<MeshData>,
}

impl Mesh {
    /// Create an empty triangle mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stable identity of the underlying storage, usable as a cache key for
    /// in-memory mesh instances.
    pub fn id(&self) -> usize {
        Arc::as_ptr(&self.data) as usize
    }

    /// The mesh's primitive topology.
    pub fn topology(&self) -> MeshTopology {
        self.data.topology
    }

    /// Set the primitive topology.
    pub fn set_topology(&mut self, topology: MeshTopology) {
        Arc::make_mut(&mut self.data).topology = topology;
    }

    /// Whether the mesh has any vertices.
    pub fn has_vertex_data(&self) -> bool {
        !self.data.vertices.is_empty()
    }

    /// Number of vertices.
    pub fn num_vertices(&self) -> usize {
        self.data.vertices.len()
    }

    /// Vertex positions.
    pub fn vertices(&self) -> &[Point3] {
        &self.data.vertices
    }

    /// Replace the vertex positions.
    ///
    /// Any already-set optional attribute is resized to the new vertex count:
    /// existing values are kept at matching indices, new slots are filled
    /// with the attribute's zero-value, and excess entries are truncated.
    pub fn set_vertices(&mut self, vertices: Vec<Point3>) {
        let data = Arc::make_mut(&mut self.data);
        data.vertices = vertices;
        data.resize_attributes();
        data.bounds = OnceLock::new();
    }

    /// Per-vertex normals (empty when unset).
    pub fn normals(&self) -> &[Vec3] {
        &self.data.normals
    }

    /// Set per-vertex normals. A buffer whose length does not match the
    /// vertex count drops the attribute instead.
    pub fn set_normals(&mut self, normals: Vec<Vec3>) {
        let data = Arc::make_mut(&mut self.data);
        data.normals = if normals.len() == data.vertices.len() {
            normals
        } else {
            Vec::new()
        };
    }

    /// Per-vertex texture coordinates (empty when unset).
    pub fn tex_coords(&self) -> &[Vec2] {
        &self.data.tex_coords
    }

    /// Set per-vertex texture coordinates; mismatched lengths drop the attribute.
    pub fn set_tex_coords(&mut self, tex_coords: Vec<Vec2>) {
        let data = Arc::make_mut(&mut self.data);
        data.tex_coords = if tex_coords.len() == data.vertices.len() {
            tex_coords
        } else {
            Vec::new()
        };
    }

    /// Per-vertex colors (empty when unset).
    pub fn colors(&self) -> &[Color] {
        &self.data.colors
    }

    /// Set per-vertex colors; mismatched lengths drop the attribute.
    pub fn set_colors(&mut self, colors: Vec<Color>) {
        let data = Arc::make_mut(&mut self.data);
        data.colors = if colors.len() == data.vertices.len() {
            colors
        } else {
            Vec::new()
        };
    }

    /// Per-vertex tangents (empty when unset).
    pub fn tangents(&self) -> &[Vec4] {
        &self.data.tangents
    }

    /// Set per-vertex tangents; mismatched lengths drop the attribute.
    pub fn set_tangents(&mut self, tangents: Vec<Vec4>) {
        let data = Arc::make_mut(&mut self.data);
        data.tangents = if tangents.len() == data.vertices.len() {
            tangents
        } else {
            Vec::new()
        };
    }

    /// The index buffer, if set.
    pub fn indices(&self) -> Option<&Indices> {
        self.data.indices.as_ref()
    }

    /// Number of indices (0 when unset).
    pub fn num_indices(&self) -> usize {
        self.data.indices.as_ref().map_or(0, Indices::len)
    }

    /// Set the index buffer.
    ///
    /// The storage format (16- or 32-bit) is chosen from the vertex count:
    /// meshes with at most `u16::MAX + 1` vertices get a 16-bit buffer.
    pub fn set_indices(&mut self, indices: Vec<u32>) {
        let data = Arc::make_mut(&mut self.data);
        data.indices = Some(if data.vertices.len() <= usize::from(u16::MAX) + 1 {
            Indices::U16(indices.into_iter().map(|i| i as u16).collect())
        } else {
            Indices::U32(indices)
        });
    }

    /// Submesh draw ranges.
    pub fn submesh_descriptors(&self) -> &[SubMeshDescriptor] {
        &self.data.submeshes
    }

    /// Append a submesh draw range.
    pub fn push_submesh_descriptor(&mut self, descriptor: SubMeshDescriptor) {
        Arc::make_mut(&mut self.data).submeshes.push(descriptor);
    }

    /// Remove all submesh draw ranges.
    pub fn clear_submesh_descriptors(&mut self) {
        Arc::make_mut(&mut self.data).submeshes.clear();
    }

    /// Local-space bounds of the vertex positions, or `None` for a mesh with
    /// no vertex data. Computed on first call, cached until the vertices
    /// change.
    pub fn bounds(&self) -> Option<Aabb> {
        *self
            .data
            .bounds
            .get_or_init(|| Aabb::from_points(self.data.vertices.iter().copied()))
    }

    /// Invoke `f` with each indexed triangle's corner positions.
    ///
    /// Does nothing for line-topology meshes or meshes without indices.
    pub fn for_each_indexed_triangle<F: FnMut(Point3, Point3, Point3)>(&self, mut f: F) {
        if self.data.topology != MeshTopology::Triangles {
            return;
        }
        let Some(indices) = &self.data.indices else {
            return;
        };
        let verts = &self.data.vertices;
        let idx: Vec<u32> = indices.iter().collect();
        for tri in idx.chunks_exact(3) {
            let (a, b, c) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
            if a < verts.len() && b < verts.len() && c < verts.len() {
                f(verts[a], verts[b], verts[c]);
            }
        }
    }

    /// Reset the mesh to the empty state.
    pub fn clear(&mut self) {
        *Arc::make_mut(&mut self.data) = MeshData::default();
    }
}

impl PartialEq for Mesh {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }
}

impl Eq for Mesh {}

impl Hash for Mesh {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}
