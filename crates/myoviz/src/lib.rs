#![warn(missing_docs)]

//! Scene-decoration core for musculoskeletal model visualization.
//!
//! Turns a physics engine's per-frame shape descriptors into a flat,
//! renderer-agnostic list of decorations (shared mesh + transform + color),
//! with mesh caching, BVH-backed hit-testing, and a snapshot undo/redo
//! engine for the edited model document.
//!
//! # Example
//!
//! ```
//! use myoviz::cache::MeshCache;
//! use myoviz::math::{Point3, Ray, Vec3};
//! use myoviz::scene::{
//!     generate_decorations, BodyIndex, PolygonalMesh, PoseTable, Scene, Shape, ShapeKind,
//! };
//!
//! let mut cache = MeshCache::new();
//! let poses = PoseTable::new();
//! let mut loader = |path: &std::path::Path| -> std::io::Result<PolygonalMesh> {
//!     Err(std::io::Error::new(std::io::ErrorKind::NotFound, path.display().to_string()))
//! };
//!
//! // one sphere of radius 0.5, attached to ground
//! let shapes = [Shape::new(BodyIndex::GROUND, ShapeKind::Sphere { radius: 0.5 })];
//! let decorations =
//!     generate_decorations(&mut cache, &poses, 1.0, &mut loader, &shapes).unwrap();
//! assert_eq!(decorations.len(), 1);
//!
//! // index it and pick it with a ray
//! let scene = Scene::new(decorations);
//! let ray = Ray::new(Point3::new(0.0, 0.0, -10.0), Vec3::z());
//! let hit = scene.closest_triangle_hit(&ray).unwrap();
//! assert_eq!(hit.index, 0);
//! ```

/// Math types: points, vectors, transforms, boxes, segments, rays.
pub use myoviz_math as math;

/// The copy-on-write renderable mesh handle.
pub use myoviz_mesh as mesh;

/// Procedural primitive-mesh generators.
pub use myoviz_meshgen as meshgen;

/// The keyed mesh cache.
pub use myoviz_cache as cache;

/// Bounding volume hierarchy for hit-testing.
pub use myoviz_bvh as bvh;

/// Decoration generation, scene assembly, and hit-testing.
pub use myoviz_scene as scene;

/// Snapshot-based undo/redo for edited documents.
pub use myoviz_undo as undo;
