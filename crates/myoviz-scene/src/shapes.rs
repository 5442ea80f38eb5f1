//! The input side of decoration generation: shape descriptors as handed over
//! by the physics engine, plus the per-frame table of simulated body poses.

use std::ops::{BitOr, BitOrAssign};
use std::path::PathBuf;
use std::sync::Arc;

use myoviz_math::{Point3, Transform, Vec3};
use serde::{Deserialize, Serialize};

use crate::polygonal::PolygonalMesh;

/// Index of a simulated body in a [`PoseTable`]. Index 0 is always the
/// ground frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BodyIndex(usize);

impl BodyIndex {
    /// The ground frame (identity pose).
    pub const GROUND: Self = Self(0);

    /// Create a body index.
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    /// The raw index value.
    pub fn index(self) -> usize {
        self.0
    }
}

/// The current simulated pose of every body, as body-to-ground transforms.
///
/// Snapshotted from the physics engine once per frame; entry 0 is the ground
/// frame and is always the identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoseTable {
    body_to_ground: Vec<Transform>,
}

impl PoseTable {
    /// Create a table containing only the ground frame.
    pub fn new() -> Self {
        Self {
            body_to_ground: vec![Transform::identity()],
        }
    }

    /// Append a body's pose, returning its index.
    pub fn push_body(&mut self, pose: Transform) -> BodyIndex {
        self.body_to_ground.push(pose);
        BodyIndex(self.body_to_ground.len() - 1)
    }

    /// Number of bodies in the table (including ground).
    pub fn num_bodies(&self) -> usize {
        self.body_to_ground.len()
    }

    /// The body-to-ground transform of `body`.
    ///
    /// # Panics
    /// Panics on an index from a different table; shapes always refer to
    /// bodies of the snapshot they were produced with.
    pub fn body_to_ground(&self, body: BodyIndex) -> Transform {
        self.body_to_ground[body.0]
    }
}

impl Default for PoseTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Renderer-facing state bits carried on each decoration, consumed by the
/// highlight/rim passes of the (separate) renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DecorationFlags(u8);

impl DecorationFlags {
    /// No flags set.
    pub const NONE: Self = Self(0);
    /// The decoration's source component is selected.
    pub const SELECTED: Self = Self(1 << 0);
    /// The decoration's source component is hovered by the cursor.
    pub const HOVERED: Self = Self(1 << 1);
    /// The decoration should be drawn with a rim highlight.
    pub const RIM_HIGHLIGHT: Self = Self(1 << 2);

    /// Whether every bit of `other` is set in `self`.
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for DecorationFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for DecorationFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// One decorative-geometry item from the physics engine's current state.
///
/// Carries the properties shared by every kind (owning body, body-local
/// transform, ambient scale factors, color) plus the kind-specific
/// parameters. Scale factors and opacity may arrive unset (non-positive /
/// negative); decoration generation clamps them rather than erroring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shape {
    /// The body this shape is attached to.
    pub body: BodyIndex,
    /// Shape-to-body transform.
    pub transform: Transform,
    /// Ambient per-axis scale factors; non-positive components mean "unset".
    pub scale_factors: Vec3,
    /// RGB color.
    pub color: [f32; 3],
    /// Opacity in `[0, 1]`; negative means "unset" (fully opaque).
    pub opacity: f32,
    /// Optional stable identifier, passed through to the decoration.
    pub id: Option<String>,
    /// Kind-specific geometry parameters.
    pub kind: ShapeKind,
}

impl Shape {
    /// Create a shape with engine defaults: identity transform, unset scale
    /// factors and opacity, white color, no id.
    pub fn new(body: BodyIndex, kind: ShapeKind) -> Self {
        Self {
            body,
            transform: Transform::identity(),
            scale_factors: Vec3::new(-1.0, -1.0, -1.0),
            color: [1.0, 1.0, 1.0],
            opacity: -1.0,
            id: None,
            kind,
        }
    }
}

/// The closed set of decorative-geometry kinds the physics engine emits.
///
/// Adding a kind here requires a matching dispatch case in decoration
/// generation; no open extensibility is assumed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ShapeKind {
    /// A point marker (not yet supported).
    Point,
    /// A line between two shape-local points.
    Line {
        /// First endpoint.
        p1: Point3,
        /// Second endpoint.
        p2: Point3,
    },
    /// An axis-aligned box.
    Brick {
        /// Per-axis half extents.
        half_lengths: Vec3,
    },
    /// A cylinder along the shape-local Y axis.
    Cylinder {
        /// Lateral radius.
        radius: f32,
        /// Half of the cylinder's height.
        half_height: f32,
    },
    /// A flat disc in the shape-local XY plane.
    Circle {
        /// Disc radius.
        radius: f32,
    },
    /// A sphere.
    Sphere {
        /// Sphere radius.
        radius: f32,
    },
    /// An ellipsoid.
    Ellipsoid {
        /// Per-axis radii.
        radii: Vec3,
    },
    /// A coordinate-frame visualization (origin sphere + three axis legs).
    Frame {
        /// Drawn length of each axis leg.
        axis_length: f32,
    },
    /// A text label (not yet supported).
    Text,
    /// An already-parsed in-memory polygonal mesh, shared with the engine.
    Mesh {
        /// The engine's polygonal mesh data.
        mesh: Arc<PolygonalMesh>,
    },
    /// A polygonal mesh loaded from a file on demand.
    MeshFile {
        /// Path of the mesh file.
        path: PathBuf,
    },
    /// An arrow from `start` to `end` with a conical tip.
    Arrow {
        /// Tail of the arrow, shape-local.
        start: Point3,
        /// Tip of the arrow, shape-local.
        end: Point3,
        /// Length of the tip cone, along the arrow direction.
        tip_length: f32,
    },
    /// A torus around the shape-local Y axis.
    Torus {
        /// Distance from the torus center to the tube center.
        torus_radius: f32,
        /// Radius of the tube.
        tube_radius: f32,
    },
    /// A cone from an origin point along a direction.
    Cone {
        /// Center of the cone's base, shape-local.
        origin: Point3,
        /// Direction from base to apex, shape-local.
        direction: Vec3,
        /// Radius of the base disc.
        base_radius: f32,
        /// Distance from base to apex.
        height: f32,
    },
}
