//! Decoration output types and the BVH-backed scene used for hit-testing.

use myoviz_bvh::Bvh;
use myoviz_math::{Mat4, Point3, Ray, Transform, Vec2};
use myoviz_mesh::{Color, Mesh};

use crate::shapes::DecorationFlags;

/// One renderable item: a shared mesh plus its per-instance state.
///
/// The flat decoration list is the boundary between this core and the
/// renderer: the renderer draws it, the scene below hit-tests it, and
/// neither needs to know anything about the physics engine's shapes.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneDecoration {
    /// The (typically cache-shared) mesh to draw.
    pub mesh: Mesh,
    /// Mesh-to-world transform.
    pub transform: Transform,
    /// Instance color (RGBA, linear).
    pub color: Color,
    /// Selection/hover/highlight state bits.
    pub flags: DecorationFlags,
    /// Optional stable identifier of the source model component.
    pub id: Option<String>,
}

/// A ray hit against a [`Scene`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneHit {
    /// Index of the hit decoration in the scene's decoration list.
    pub index: usize,
    /// Ray parameter of the hit.
    pub t: f32,
    /// World-space position of the hit.
    pub position: Point3,
}

/// A frame's decoration list indexed for hit-testing.
///
/// Built fresh whenever the decoration list changes (in practice once per
/// frame, since decorations are regenerated from physics state every frame);
/// the BVH is not maintained incrementally. Decorations without vertex data
/// have no bounds and are skipped by every query.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    decorations: Vec<SceneDecoration>,
    bvh: Bvh,
    // BVH leaf item -> index into `decorations`
    leaf_to_decoration: Vec<usize>,
}

impl Scene {
    /// Index `decorations` for hit-testing.
    pub fn new(decorations: Vec<SceneDecoration>) -> Self {
        let mut aabbs = Vec::with_capacity(decorations.len());
        let mut leaf_to_decoration = Vec::with_capacity(decorations.len());
        for (i, decoration) in decorations.iter().enumerate() {
            if let Some(bounds) = decoration.mesh.bounds() {
                aabbs.push(bounds.transformed_by(&decoration.transform));
                leaf_to_decoration.push(i);
            }
        }

        Self {
            decorations,
            bvh: Bvh::from_aabbs(&aabbs),
            leaf_to_decoration,
        }
    }

    /// The scene's decorations, in generation order.
    pub fn decorations(&self) -> &[SceneDecoration] {
        &self.decorations
    }

    /// World-space bounds of the whole scene, or `None` when empty.
    pub fn bounds(&self) -> Option<myoviz_math::Aabb> {
        self.bvh.bounds()
    }

    /// Nearest decoration whose world bounding box the ray hits. Cheaper but
    /// coarser than [`Scene::closest_triangle_hit`].
    pub fn closest_aabb_hit(&self, ray: &Ray) -> Option<SceneHit> {
        let hit = self.bvh.closest_aabb_hit(ray)?;
        Some(SceneHit {
            index: self.leaf_to_decoration[hit.item],
            t: hit.t,
            position: ray.at(hit.t),
        })
    }

    /// Nearest decoration the ray actually hits, refined per candidate by
    /// testing the ray against the decoration's world-transformed triangles.
    ///
    /// Overlap ties resolve to the smallest ray parameter (closest to the
    /// ray origin), never to decoration order. Line-topology decorations
    /// have no triangles and are never returned.
    pub fn closest_triangle_hit(&self, ray: &Ray) -> Option<SceneHit> {
        let hit = self.bvh.closest_hit(ray, |item, _| {
            let decoration = &self.decorations[self.leaf_to_decoration[item]];
            let mut best: Option<f32> = None;
            decoration.mesh.for_each_indexed_triangle(|a, b, c| {
                let a = decoration.transform.transform_point(&a);
                let b = decoration.transform.transform_point(&b);
                let c = decoration.transform.transform_point(&c);
                if let Some(t) = ray.intersect_triangle(&a, &b, &c) {
                    if best.map_or(true, |bt| t < bt) {
                        best = Some(t);
                    }
                }
            });
            best
        })?;

        Some(SceneHit {
            index: self.leaf_to_decoration[hit.item],
            t: hit.t,
            position: ray.at(hit.t),
        })
    }

    /// Resolve which decoration is under a screen-space point (e.g. the
    /// mouse cursor), given the camera's view and projection matrices.
    pub fn hit_test_screen_point(
        &self,
        screen_point: Vec2,
        viewport_dimensions: Vec2,
        view: &Mat4,
        projection: &Mat4,
    ) -> Option<SceneHit> {
        let ray = screen_point_to_ray(screen_point, viewport_dimensions, view, projection)?;
        self.closest_triangle_hit(&ray)
    }
}

/// Unproject a screen-space point (origin top-left, y down, in pixels) into
/// a world-space ray through the camera frustum.
///
/// Returns `None` for a degenerate camera (non-invertible view-projection).
pub fn screen_point_to_ray(
    screen_point: Vec2,
    viewport_dimensions: Vec2,
    view: &Mat4,
    projection: &Mat4,
) -> Option<Ray> {
    let inverse_viewproj = (projection * view).try_inverse()?;

    let ndc_x = 2.0 * screen_point.x / viewport_dimensions.x - 1.0;
    let ndc_y = 1.0 - 2.0 * screen_point.y / viewport_dimensions.y;

    let unproject = |ndc_z: f32| -> Option<Point3> {
        let h = inverse_viewproj * nalgebra::Vector4::new(ndc_x, ndc_y, ndc_z, 1.0);
        (h.w != 0.0).then(|| Point3::new(h.x / h.w, h.y / h.w, h.z / h.w))
    };

    let near = unproject(-1.0)?;
    let far = unproject(1.0)?;
    Some(Ray::new(near, far - near))
}

#[cfg(test)]
mod tests {
    use super::*;
    use myoviz_math::Vec3;

    fn sphere_decoration_at(position: Vec3, radius: f32) -> SceneDecoration {
        SceneDecoration {
            mesh: myoviz_meshgen::sphere(1.0, 16, 12),
            transform: Transform {
                position,
                ..Transform::identity().with_uniform_scale(radius)
            },
            color: Color::WHITE,
            flags: DecorationFlags::NONE,
            id: None,
        }
    }

    #[test]
    fn test_empty_scene_reports_no_hits() {
        let scene = Scene::new(Vec::new());
        assert!(scene.bounds().is_none());

        let ray = Ray::new(Point3::origin(), Vec3::z());
        assert!(scene.closest_aabb_hit(&ray).is_none());
        assert!(scene.closest_triangle_hit(&ray).is_none());
    }

    #[test]
    fn test_ray_hits_nearest_decoration() {
        let scene = Scene::new(vec![
            sphere_decoration_at(Vec3::new(0.0, 0.0, 10.0), 1.0),
            sphere_decoration_at(Vec3::new(0.0, 0.0, 5.0), 1.0),
            sphere_decoration_at(Vec3::new(4.0, 0.0, 5.0), 1.0),
        ]);

        let ray = Ray::new(Point3::origin(), Vec3::z());
        let hit = scene.closest_triangle_hit(&ray).unwrap();
        assert_eq!(hit.index, 1);
        assert!((hit.t - 4.0).abs() < 0.05); // front of the nearer sphere
        assert!((hit.position.z - 4.0).abs() < 0.05);

        let miss = Ray::new(Point3::new(100.0, 0.0, 0.0), Vec3::z());
        assert!(scene.closest_triangle_hit(&miss).is_none());
    }

    #[test]
    fn test_triangle_hit_rejects_aabb_only_overlap() {
        // ray passes through the sphere's corner AABB region but misses the
        // sphere surface itself, then hits a farther sphere dead-on
        let scene = Scene::new(vec![
            sphere_decoration_at(Vec3::new(1.6, 1.6, 5.0), 2.0),
            sphere_decoration_at(Vec3::new(0.0, 0.0, 20.0), 1.0),
        ]);

        let ray = Ray::new(Point3::origin(), Vec3::z());
        let aabb_hit = scene.closest_aabb_hit(&ray).unwrap();
        assert_eq!(aabb_hit.index, 0);

        let triangle_hit = scene.closest_triangle_hit(&ray).unwrap();
        assert_eq!(triangle_hit.index, 1);
    }

    #[test]
    fn test_decorations_without_vertex_data_are_skipped() {
        let empty = SceneDecoration {
            mesh: Mesh::new(),
            transform: Transform::identity(),
            color: Color::WHITE,
            flags: DecorationFlags::NONE,
            id: None,
        };
        let scene = Scene::new(vec![
            empty,
            sphere_decoration_at(Vec3::new(0.0, 0.0, 5.0), 1.0),
        ]);

        let ray = Ray::new(Point3::origin(), Vec3::z());
        let hit = scene.closest_triangle_hit(&ray).unwrap();
        assert_eq!(hit.index, 1);
    }

    #[test]
    fn test_screen_center_unprojects_to_view_direction() {
        let view = Mat4::look_at_rh(
            &Point3::new(0.0, 0.0, 10.0),
            &Point3::origin(),
            &Vec3::y(),
        );
        let projection = Mat4::new_perspective(16.0 / 9.0, 1.0, 0.1, 100.0);

        let viewport = Vec2::new(1920.0, 1080.0);
        let ray = screen_point_to_ray(Vec2::new(960.0, 540.0), viewport, &view, &projection)
            .unwrap();

        // camera looks down -Z from (0, 0, 10)
        assert!((ray.direction - -Vec3::z()).norm() < 1e-4);
        assert!(ray.origin.x.abs() < 1e-4);
        assert!(ray.origin.y.abs() < 1e-4);
    }

    #[test]
    fn test_hit_test_screen_point_resolves_cursor() {
        let scene = Scene::new(vec![sphere_decoration_at(Vec3::zeros(), 1.0)]);

        let view = Mat4::look_at_rh(
            &Point3::new(0.0, 0.0, 10.0),
            &Point3::origin(),
            &Vec3::y(),
        );
        let projection = Mat4::new_perspective(1.0, 1.0, 0.1, 100.0);
        let viewport = Vec2::new(800.0, 800.0);

        // cursor dead center: looking straight at the sphere
        let hit = scene
            .hit_test_screen_point(Vec2::new(400.0, 400.0), viewport, &view, &projection)
            .unwrap();
        assert_eq!(hit.index, 0);
        // the ray starts on the near plane (z = 9.9), the sphere front is
        // near z = 1 (slightly inside, on a triangle chord)
        assert!((hit.t - 8.9).abs() < 0.1);

        // cursor in a corner: looking past it
        let miss =
            scene.hit_test_screen_point(Vec2::new(5.0, 5.0), viewport, &view, &projection);
        assert!(miss.is_none());
    }
}
