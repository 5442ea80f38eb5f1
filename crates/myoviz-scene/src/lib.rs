#![warn(missing_docs)]

//! Scene decoration generation and hit-testing for myoviz.
//!
//! This crate turns the physics engine's per-frame shape descriptors (a
//! closed set of primitive kinds, each expressed in a body-local frame) into
//! a flat list of renderer-agnostic [`SceneDecoration`]s: shared mesh handle,
//! world transform, color, flags. The list can then be assembled into a
//! [`Scene`], which unions the decorations' world-space bounds into a BVH for
//! ray and mouse-cursor hit-testing.
//!
//! Everything runs synchronously on the frame/UI thread; the decoration list
//! and scene are rebuilt from physics state every frame.

mod generator;
mod polygonal;
mod scene;
mod shapes;

pub use generator::{generate_decorations, DecorationGenerator};
pub use polygonal::{MeshLoader, PolygonalMesh};
pub use scene::{screen_point_to_ray, Scene, SceneDecoration, SceneHit};
pub use shapes::{BodyIndex, DecorationFlags, PoseTable, Shape, ShapeKind};

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while generating decorations.
///
/// Most malformed input is clamped or skipped rather than reported (see the
/// per-kind rules on [`DecorationGenerator`]); only a mesh file that cannot
/// be read surfaces as an error, since silently omitting model geometry
/// would mislead the user.
#[derive(Debug, Error)]
pub enum SceneError {
    /// A referenced mesh file could not be opened or parsed.
    #[error("failed to load mesh file `{}`", path.display())]
    MeshFileLoad {
        /// Path of the file that failed to load.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Convenience alias for `Result<T, SceneError>`.
pub type Result<T, E = SceneError> = std::result::Result<T, E>;
