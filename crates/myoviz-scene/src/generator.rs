//! Per-kind dispatch from shape descriptors to scene decorations.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use myoviz_cache::MeshCache;
use myoviz_math::{cylinder_to_segment_transform, Point3, Segment, Transform, Vec3};
use myoviz_mesh::{Color, Mesh};

use crate::polygonal::MeshLoader;
use crate::scene::SceneDecoration;
use crate::shapes::{DecorationFlags, PoseTable, Shape, ShapeKind};
use crate::{Result, SceneError};

/// Visual thickness of line decorations, before the fixup scale factor.
const LINE_THICKNESS: f32 = 0.005;
/// Rescale applied to a frame's axis legs (and its origin sphere).
const FRAME_AXIS_LENGTH_RESCALE: f32 = 0.25;
/// Visual thickness of a frame's axis legs, before the fixup scale factor.
const FRAME_AXIS_THICKNESS: f32 = 0.0025;
/// Base radius of a frame's origin sphere.
const FRAME_ORIGIN_SPHERE_RADIUS: f32 = 0.05;
/// Visual thickness of an arrow's neck cylinder.
const ARROW_NECK_THICKNESS: f32 = 0.005;
/// Visual thickness of an arrow's head cone.
const ARROW_HEAD_THICKNESS: f32 = 0.02;

fn warn_once(already_warned: &AtomicBool, message: &str) {
    if !already_warned.swap(true, Ordering::Relaxed) {
        log::warn!("{message}");
    }
}

/// Ambient scale factors with non-positive ("unset") components replaced by 1.
fn sanitized_scale_factors(shape: &Shape) -> Vec3 {
    shape.scale_factors.map(|sf| if sf <= 0.0 { 1.0 } else { sf })
}

/// The shape's RGB + opacity, with a negative ("unset") opacity replaced by
/// fully opaque.
fn shape_color(shape: &Shape) -> Color {
    let [r, g, b] = shape.color;
    let a = if shape.opacity < 0.0 { 1.0 } else { shape.opacity };
    Color::new(r, g, b, a)
}

/// Turns [`Shape`]s into [`SceneDecoration`]s.
///
/// Holds the per-frame generation context: the shared mesh cache, the body
/// pose snapshot, the global fixup scale factor (a visual multiplier that
/// keeps very small or very large models visible), and the mesh-file loader.
///
/// Dispatch is per shape kind; one shape may emit zero decorations (the
/// unsupported point/text kinds, which warn once per kind per process and
/// are otherwise skipped) or several (frames, arrows). Malformed scale
/// factors and opacity are clamped, never reported. The only error path is
/// an unreadable mesh file.
pub struct DecorationGenerator<'a> {
    cache: &'a mut MeshCache,
    poses: &'a PoseTable,
    fixup_scale_factor: f32,
    loader: &'a mut dyn MeshLoader,
}

impl<'a> DecorationGenerator<'a> {
    /// Create a generator over one frame's worth of context.
    pub fn new(
        cache: &'a mut MeshCache,
        poses: &'a PoseTable,
        fixup_scale_factor: f32,
        loader: &'a mut dyn MeshLoader,
    ) -> Self {
        Self {
            cache,
            poses,
            fixup_scale_factor,
            loader,
        }
    }

    /// The shape's world transform: body pose composed with the shape-local
    /// transform, with the sanitized ambient scale factors as its scale.
    fn shape_to_ground(&self, shape: &Shape) -> Transform {
        let mut rv = self
            .poses
            .body_to_ground(shape.body)
            .then(&shape.transform);
        rv.scale = sanitized_scale_factors(shape);
        rv
    }

    /// Emit `shape`'s decorations into `consumer`.
    pub fn generate(
        &mut self,
        shape: &Shape,
        consumer: &mut dyn FnMut(SceneDecoration),
    ) -> Result<()> {
        let t = self.shape_to_ground(shape);
        let color = shape_color(shape);
        let mut emit = |mesh: Mesh, transform: Transform, color: Color| {
            consumer(SceneDecoration {
                mesh,
                transform,
                color,
                flags: DecorationFlags::NONE,
                id: shape.id.clone(),
            });
        };

        match &shape.kind {
            ShapeKind::Point => {
                static WARNED: AtomicBool = AtomicBool::new(false);
                warn_once(&WARNED, "model uses point decorations, which are not supported yet");
            }
            ShapeKind::Text => {
                static WARNED: AtomicBool = AtomicBool::new(false);
                warn_once(&WARNED, "model uses text decorations, which are not supported yet");
            }
            ShapeKind::Line { p1, p2 } => {
                let p1 = t.transform_point(p1);
                let p2 = t.transform_point(p2);
                let thickness = LINE_THICKNESS * self.fixup_scale_factor;

                let mut xform = cylinder_to_segment_transform(&Segment::new(p1, p2), thickness);
                xform.scale = xform.scale.component_mul(&t.scale);

                emit(self.cache.cylinder(), xform, color);
            }
            ShapeKind::Brick { half_lengths } => {
                let mut t = t;
                t.scale = t.scale.component_mul(half_lengths);
                emit(self.cache.brick(), t, color);
            }
            ShapeKind::Cylinder {
                radius,
                half_height,
            } => {
                let mut t = t;
                t.scale.x *= radius;
                t.scale.y *= half_height;
                t.scale.z *= radius;
                emit(self.cache.cylinder(), t, color);
            }
            ShapeKind::Circle { radius } => {
                let mut t = t;
                t.scale.x *= radius;
                t.scale.y *= radius;
                emit(self.cache.circle(), t, color);
            }
            ShapeKind::Sphere { radius } => {
                let mut t = t;
                t.scale *= self.fixup_scale_factor * radius;
                emit(self.cache.sphere(), t, color);
            }
            ShapeKind::Ellipsoid { radii } => {
                let mut t = t;
                t.scale = t.scale.component_mul(radii);
                emit(self.cache.sphere(), t, color);
            }
            ShapeKind::Frame { axis_length } => {
                // origin sphere
                let radius =
                    FRAME_ORIGIN_SPHERE_RADIUS * FRAME_AXIS_LENGTH_RESCALE * self.fixup_scale_factor;
                emit(self.cache.sphere(), t.with_uniform_scale(radius), Color::WHITE);

                // axis legs
                let axis_lengths = t.scale * *axis_length;
                let leg_length = FRAME_AXIS_LENGTH_RESCALE * self.fixup_scale_factor;
                let leg_thickness = FRAME_AXIS_THICKNESS * self.fixup_scale_factor;
                let leg_colors = [Color::RED, Color::GREEN, Color::BLUE];
                for axis in 0..3 {
                    let mut direction = Vec3::zeros();
                    direction[axis] = 1.0;

                    let origin = Point3::from(t.position);
                    let line = Segment::new(
                        origin,
                        origin + leg_length * axis_lengths[axis] * t.transform_direction(&direction),
                    );
                    let leg_xform = cylinder_to_segment_transform(&line, leg_thickness);

                    emit(self.cache.cylinder(), leg_xform, leg_colors[axis]);
                }
            }
            ShapeKind::Mesh { mesh } => {
                // keyed by instance identity, not content: repeated references
                // to the same engine mesh are cache hits
                let key = format!("memory/{:x}", Arc::as_ptr(mesh) as usize);
                emit(self.cache.get(&key, || mesh.triangulate()), t, color);
            }
            ShapeKind::MeshFile { path } => {
                let key = path.to_string_lossy();
                let loader = &mut *self.loader;
                let mesh = self
                    .cache
                    .try_get(&key, || {
                        loader.load(path).map(|polygons| polygons.triangulate())
                    })
                    .map_err(|source| SceneError::MeshFileLoad {
                        path: path.clone(),
                        source,
                    })?;
                emit(mesh, t, color);
            }
            ShapeKind::Arrow {
                start,
                end,
                tip_length,
            } => {
                let start = t.transform_point(start);
                let end = t.transform_point(end);
                let Some(direction) = (end - start).try_normalize(f32::EPSILON) else {
                    return Ok(()); // zero-length arrow: nothing to draw
                };

                let neck_end = end - *tip_length * direction;

                let neck_xform = cylinder_to_segment_transform(
                    &Segment::new(start, neck_end),
                    ARROW_NECK_THICKNESS,
                );
                emit(self.cache.cylinder(), neck_xform, color);

                let head_xform = cylinder_to_segment_transform(
                    &Segment::new(neck_end, end),
                    ARROW_HEAD_THICKNESS,
                );
                emit(self.cache.cone(), head_xform, color);
            }
            ShapeKind::Torus {
                torus_radius,
                tube_radius,
            } => {
                emit(self.cache.torus(*torus_radius, *tube_radius), t, color);
            }
            ShapeKind::Cone {
                origin,
                direction,
                base_radius,
                height,
            } => {
                let base = t.transform_point(origin);
                let apex = base + *height * t.transform_direction(direction);

                let mut xform =
                    cylinder_to_segment_transform(&Segment::new(base, apex), *base_radius);
                xform.scale = xform.scale.component_mul(&t.scale);

                emit(self.cache.cone(), xform, color);
            }
        }
        Ok(())
    }
}

/// Generate the decorations for a whole frame's shape list, in order.
///
/// Emission order follows the input order (a frame emits its origin sphere
/// before its axis legs, an arrow its neck before its head). Fails on the
/// first unreadable mesh file; decorations emitted before the failure are
/// discarded by the caller.
pub fn generate_decorations(
    cache: &mut MeshCache,
    poses: &PoseTable,
    fixup_scale_factor: f32,
    loader: &mut dyn MeshLoader,
    shapes: &[Shape],
) -> Result<Vec<SceneDecoration>> {
    let mut decorations = Vec::new();
    let mut generator = DecorationGenerator::new(cache, poses, fixup_scale_factor, loader);
    for shape in shapes {
        generator.generate(shape, &mut |decoration| decorations.push(decoration))?;
    }
    Ok(decorations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polygonal::PolygonalMesh;
    use crate::shapes::BodyIndex;
    use std::io;
    use std::path::{Path, PathBuf};

    fn no_files(path: &Path) -> io::Result<PolygonalMesh> {
        Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("no such mesh file: {}", path.display()),
        ))
    }

    fn generate_all(shapes: &[Shape], fixup: f32) -> Vec<SceneDecoration> {
        let mut cache = MeshCache::new();
        let poses = PoseTable::new();
        let mut loader = no_files;
        generate_decorations(&mut cache, &poses, fixup, &mut loader, shapes).unwrap()
    }

    #[test]
    fn test_sphere_decoration_scale_and_color() {
        let mut cache = MeshCache::new();
        let poses = PoseTable::new();
        let mut loader = no_files;

        let shape = Shape {
            color: [0.2, 0.4, 0.6],
            opacity: 0.8,
            ..Shape::new(BodyIndex::GROUND, ShapeKind::Sphere { radius: 0.05 })
        };
        let decorations =
            generate_decorations(&mut cache, &poses, 2.0, &mut loader, &[shape]).unwrap();

        assert_eq!(decorations.len(), 1);
        let decoration = &decorations[0];
        assert_eq!(decoration.mesh, cache.sphere());
        assert!((decoration.transform.scale - Vec3::new(0.1, 0.1, 0.1)).norm() < 1e-6);
        assert_eq!(decoration.color, Color::new(0.2, 0.4, 0.6, 0.8));
    }

    #[test]
    fn test_identical_lines_share_one_cylinder_mesh() {
        let line = Shape::new(
            BodyIndex::GROUND,
            ShapeKind::Line {
                p1: Point3::new(0.0, 0.0, 0.0),
                p2: Point3::new(0.0, 1.0, 0.0),
            },
        );
        let decorations = generate_all(&[line.clone(), line], 1.0);

        assert_eq!(decorations.len(), 2);
        assert_eq!(decorations[0].mesh, decorations[1].mesh);
        assert_eq!(decorations[0].mesh.id(), decorations[1].mesh.id());
    }

    #[test]
    fn test_line_thickness_scales_with_fixup_factor() {
        let line = Shape::new(
            BodyIndex::GROUND,
            ShapeKind::Line {
                p1: Point3::new(0.0, 0.0, 0.0),
                p2: Point3::new(0.0, 2.0, 0.0),
            },
        );
        let decorations = generate_all(&[line], 3.0);

        let scale = decorations[0].transform.scale;
        assert!((scale.x - LINE_THICKNESS * 3.0).abs() < 1e-6);
        assert!((scale.z - LINE_THICKNESS * 3.0).abs() < 1e-6);
        assert!((scale.y - 1.0).abs() < 1e-6); // half the segment length
    }

    #[test]
    fn test_brick_scales_by_half_lengths() {
        let brick = Shape::new(
            BodyIndex::GROUND,
            ShapeKind::Brick {
                half_lengths: Vec3::new(1.0, 2.0, 3.0),
            },
        );
        let decorations = generate_all(&[brick], 1.0);
        assert_eq!(decorations[0].transform.scale, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_ellipsoid_reuses_sphere_mesh() {
        let mut cache = MeshCache::new();
        let poses = PoseTable::new();
        let mut loader = no_files;

        let ellipsoid = Shape::new(
            BodyIndex::GROUND,
            ShapeKind::Ellipsoid {
                radii: Vec3::new(1.0, 2.0, 3.0),
            },
        );
        let decorations =
            generate_decorations(&mut cache, &poses, 1.0, &mut loader, &[ellipsoid]).unwrap();

        assert_eq!(decorations[0].mesh, cache.sphere());
        assert_eq!(decorations[0].transform.scale, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_non_positive_scale_factors_clamp_to_one() {
        let shape = Shape {
            scale_factors: Vec3::new(-1.0, 0.0, 2.0),
            ..Shape::new(BodyIndex::GROUND, ShapeKind::Sphere { radius: 1.0 })
        };
        let decorations = generate_all(&[shape], 1.0);
        assert_eq!(decorations[0].transform.scale, Vec3::new(1.0, 1.0, 2.0));
    }

    #[test]
    fn test_negative_opacity_means_opaque() {
        let shape = Shape {
            color: [0.5, 0.5, 0.5],
            opacity: -1.0,
            ..Shape::new(BodyIndex::GROUND, ShapeKind::Sphere { radius: 1.0 })
        };
        let decorations = generate_all(&[shape], 1.0);
        assert_eq!(decorations[0].color.a, 1.0);
    }

    #[test]
    fn test_body_pose_composes_with_local_transform() {
        let mut cache = MeshCache::new();
        let mut poses = PoseTable::new();
        let body = poses.push_body(Transform::translation(Vec3::new(10.0, 0.0, 0.0)));
        let mut loader = no_files;

        let shape = Shape {
            transform: Transform::translation(Vec3::new(0.0, 5.0, 0.0)),
            ..Shape::new(body, ShapeKind::Sphere { radius: 1.0 })
        };
        let decorations =
            generate_decorations(&mut cache, &poses, 1.0, &mut loader, &[shape]).unwrap();

        assert!((decorations[0].transform.position - Vec3::new(10.0, 5.0, 0.0)).norm() < 1e-6);
    }

    #[test]
    fn test_frame_emits_origin_sphere_and_three_legs() {
        let mut cache = MeshCache::new();
        let poses = PoseTable::new();
        let mut loader = no_files;

        let frame = Shape::new(BodyIndex::GROUND, ShapeKind::Frame { axis_length: 1.0 });
        let decorations =
            generate_decorations(&mut cache, &poses, 2.0, &mut loader, &[frame]).unwrap();

        assert_eq!(decorations.len(), 4);

        let sphere = &decorations[0];
        assert_eq!(sphere.mesh, cache.sphere());
        assert_eq!(sphere.color, Color::WHITE);
        let expected_radius = FRAME_ORIGIN_SPHERE_RADIUS * FRAME_AXIS_LENGTH_RESCALE * 2.0;
        assert!((sphere.transform.scale.x - expected_radius).abs() < 1e-6);

        assert_eq!(decorations[1].color, Color::RED);
        assert_eq!(decorations[2].color, Color::GREEN);
        assert_eq!(decorations[3].color, Color::BLUE);
        for leg in &decorations[1..] {
            assert_eq!(leg.mesh, cache.cylinder());
        }

        // the X leg's midpoint sits halfway along the rescaled axis length
        let x_leg = &decorations[1];
        let expected_length = FRAME_AXIS_LENGTH_RESCALE * 2.0;
        assert!((x_leg.transform.position.x - expected_length / 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_arrow_emits_neck_and_head() {
        let mut cache = MeshCache::new();
        let poses = PoseTable::new();
        let mut loader = no_files;

        let arrow = Shape::new(
            BodyIndex::GROUND,
            ShapeKind::Arrow {
                start: Point3::new(0.0, 0.0, 0.0),
                end: Point3::new(0.0, 10.0, 0.0),
                tip_length: 2.0,
            },
        );
        let decorations =
            generate_decorations(&mut cache, &poses, 1.0, &mut loader, &[arrow]).unwrap();

        assert_eq!(decorations.len(), 2);
        let (neck, head) = (&decorations[0], &decorations[1]);
        assert_eq!(neck.mesh, cache.cylinder());
        assert_eq!(head.mesh, cache.cone());

        // neck spans y = 0..8, head spans y = 8..10
        assert!((neck.transform.position.y - 4.0).abs() < 1e-6);
        assert!((neck.transform.scale.y - 4.0).abs() < 1e-6);
        assert!((head.transform.position.y - 9.0).abs() < 1e-6);
        assert!((head.transform.scale.y - 1.0).abs() < 1e-6);
        assert!((neck.transform.scale.x - ARROW_NECK_THICKNESS).abs() < 1e-6);
        assert!((head.transform.scale.x - ARROW_HEAD_THICKNESS).abs() < 1e-6);
    }

    #[test]
    fn test_zero_length_arrow_emits_nothing() {
        let arrow = Shape::new(
            BodyIndex::GROUND,
            ShapeKind::Arrow {
                start: Point3::new(1.0, 1.0, 1.0),
                end: Point3::new(1.0, 1.0, 1.0),
                tip_length: 0.1,
            },
        );
        assert!(generate_all(&[arrow], 1.0).is_empty());
    }

    #[test]
    fn test_unsupported_kinds_are_skipped() {
        let shapes = [
            Shape::new(BodyIndex::GROUND, ShapeKind::Point),
            Shape::new(BodyIndex::GROUND, ShapeKind::Text),
            Shape::new(BodyIndex::GROUND, ShapeKind::Sphere { radius: 1.0 }),
        ];
        let decorations = generate_all(&shapes, 1.0);
        assert_eq!(decorations.len(), 1);
    }

    #[test]
    fn test_in_memory_mesh_cached_by_instance_identity() {
        let mut cache = MeshCache::new();
        let poses = PoseTable::new();
        let mut loader = no_files;

        let polygons = Arc::new(PolygonalMesh {
            vertices: vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            faces: vec![vec![0, 1, 2]],
        });

        let shared_a = Shape::new(
            BodyIndex::GROUND,
            ShapeKind::Mesh {
                mesh: Arc::clone(&polygons),
            },
        );
        let shared_b = Shape::new(
            BodyIndex::GROUND,
            ShapeKind::Mesh {
                mesh: Arc::clone(&polygons),
            },
        );
        // same content, different instance
        let separate = Shape::new(
            BodyIndex::GROUND,
            ShapeKind::Mesh {
                mesh: Arc::new((*polygons).clone()),
            },
        );

        let decorations = generate_decorations(
            &mut cache,
            &poses,
            1.0,
            &mut loader,
            &[shared_a, shared_b, separate],
        )
        .unwrap();

        assert_eq!(decorations[0].mesh, decorations[1].mesh);
        assert_ne!(decorations[0].mesh, decorations[2].mesh);
    }

    #[test]
    fn test_mesh_file_loaded_once_then_cached() {
        let mut cache = MeshCache::new();
        let poses = PoseTable::new();

        let mut loads = 0;
        let mut loader = |_: &Path| -> io::Result<PolygonalMesh> {
            loads += 1;
            Ok(PolygonalMesh {
                vertices: vec![
                    Point3::new(0.0, 0.0, 0.0),
                    Point3::new(1.0, 0.0, 0.0),
                    Point3::new(0.0, 1.0, 0.0),
                ],
                faces: vec![vec![0, 1, 2]],
            })
        };

        let shape = Shape::new(
            BodyIndex::GROUND,
            ShapeKind::MeshFile {
                path: PathBuf::from("model/femur.vtp"),
            },
        );
        let decorations = generate_decorations(
            &mut cache,
            &poses,
            1.0,
            &mut loader,
            &[shape.clone(), shape],
        )
        .unwrap();

        assert_eq!(loads, 1);
        assert_eq!(decorations[0].mesh, decorations[1].mesh);
    }

    #[test]
    fn test_missing_mesh_file_propagates_error() {
        let shape = Shape::new(
            BodyIndex::GROUND,
            ShapeKind::MeshFile {
                path: PathBuf::from("model/missing.vtp"),
            },
        );

        let mut cache = MeshCache::new();
        let poses = PoseTable::new();
        let mut loader = no_files;
        let result = generate_decorations(&mut cache, &poses, 1.0, &mut loader, &[shape]);

        match result {
            Err(SceneError::MeshFileLoad { path, .. }) => {
                assert_eq!(path, PathBuf::from("model/missing.vtp"));
            }
            other => panic!("expected a mesh-file load error, got {other:?}"),
        }
    }

    #[test]
    fn test_torus_uses_radii_keyed_mesh_and_passes_transform_through() {
        let mut cache = MeshCache::new();
        let mut poses = PoseTable::new();
        let body = poses.push_body(Transform::translation(Vec3::new(0.0, 3.0, 0.0)));
        let mut loader = no_files;

        let torus = Shape {
            scale_factors: Vec3::new(2.0, 2.0, 2.0),
            ..Shape::new(
                body,
                ShapeKind::Torus {
                    torus_radius: 1.5,
                    tube_radius: 0.25,
                },
            )
        };
        let decorations =
            generate_decorations(&mut cache, &poses, 1.0, &mut loader, &[torus]).unwrap();

        assert_eq!(decorations.len(), 1);
        let decoration = &decorations[0];
        assert_eq!(decoration.mesh, cache.torus(1.5, 0.25));
        assert_ne!(decoration.mesh, cache.torus(1.5, 0.5));

        // transform passes through untouched apart from the scale factors
        assert!((decoration.transform.position - Vec3::new(0.0, 3.0, 0.0)).norm() < 1e-6);
        assert_eq!(decoration.transform.scale, Vec3::new(2.0, 2.0, 2.0));
    }

    #[test]
    fn test_cone_spans_origin_to_apex() {
        let cone = Shape::new(
            BodyIndex::GROUND,
            ShapeKind::Cone {
                origin: Point3::new(0.0, 0.0, 0.0),
                direction: Vec3::new(0.0, 1.0, 0.0),
                base_radius: 0.5,
                height: 4.0,
            },
        );
        let decorations = generate_all(&[cone], 1.0);

        let t = &decorations[0].transform;
        assert!((t.position.y - 2.0).abs() < 1e-6);
        assert!((t.scale.y - 2.0).abs() < 1e-6);
        assert!((t.scale.x - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_shape_id_passed_through() {
        let shape = Shape {
            id: Some("hip_joint_frame".to_owned()),
            ..Shape::new(BodyIndex::GROUND, ShapeKind::Frame { axis_length: 1.0 })
        };
        let decorations = generate_all(&[shape], 1.0);
        assert!(decorations.iter().all(|d| d.id.as_deref() == Some("hip_joint_frame")));
    }
}
