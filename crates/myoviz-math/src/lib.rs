#![warn(missing_docs)]

//! Math types for the myoviz scene pipeline.
//!
//! Thin wrappers around nalgebra providing the domain-specific types used
//! by decoration generation and hit-testing: points, vectors, decomposed
//! transforms, bounding boxes, segments, and rays. Everything is `f32`,
//! matching renderer/pick precision.

use nalgebra::{Matrix4, Unit, UnitQuaternion, Vector2, Vector3};
use serde::{Deserialize, Serialize};

/// A point in 3D space.
pub type Point3 = nalgebra::Point3<f32>;

/// A vector in 3D space.
pub type Vec3 = Vector3<f32>;

/// A unit (normalized) direction vector in 3D space.
pub type Dir3 = Unit<Vector3<f32>>;

/// A point in 2D space (screen coordinates, texture coordinates).
pub type Point2 = nalgebra::Point2<f32>;

/// A vector in 2D space.
pub type Vec2 = Vector2<f32>;

/// A 4x4 matrix (camera view/projection matrices).
pub type Mat4 = Matrix4<f32>;

/// A rotation expressed as a unit quaternion.
pub type Quat = UnitQuaternion<f32>;

/// A decomposed affine transform: scale, then rotate, then translate.
///
/// Kept decomposed (rather than as a 4x4 matrix) because decoration
/// generation repeatedly edits the scale component in isolation, e.g.
/// stretching a shared unit cylinder along a line segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Per-axis scale applied first, in local space.
    pub scale: Vec3,
    /// Rotation applied after scaling.
    pub rotation: Quat,
    /// Translation applied last.
    pub position: Vec3,
}

impl Transform {
    /// The identity transform.
    pub fn identity() -> Self {
        Self {
            scale: Vec3::new(1.0, 1.0, 1.0),
            rotation: Quat::identity(),
            position: Vec3::zeros(),
        }
    }

    /// A pure translation.
    pub fn translation(position: Vec3) -> Self {
        Self {
            position,
            ..Self::identity()
        }
    }

    /// A pure rotation.
    pub fn rotation(rotation: Quat) -> Self {
        Self {
            rotation,
            ..Self::identity()
        }
    }

    /// Copy of this transform with a uniform scale.
    pub fn with_uniform_scale(&self, s: f32) -> Self {
        Self {
            scale: Vec3::new(s, s, s),
            ..*self
        }
    }

    /// Transform a point: scale, rotate, then translate.
    pub fn transform_point(&self, p: &Point3) -> Point3 {
        let scaled = Vec3::new(p.x * self.scale.x, p.y * self.scale.y, p.z * self.scale.z);
        Point3::from(self.rotation * scaled + self.position)
    }

    /// Transform a direction: rotation only (no scale, no translation).
    pub fn transform_direction(&self, d: &Vec3) -> Vec3 {
        self.rotation * d
    }

    /// Compose: apply `other` first, then `self`.
    ///
    /// Decomposed composition is only exact when `self.scale` is uniform or
    /// `other.rotation` is identity; decoration generation always composes a
    /// rigid body pose with a rigid local transform before touching scale,
    /// which satisfies that.
    pub fn then(&self, other: &Transform) -> Self {
        Self {
            scale: self.scale.component_mul(&other.scale),
            rotation: self.rotation * other.rotation,
            position: self.transform_point(&Point3::from(other.position)).coords,
        }
    }

    /// The equivalent 4x4 column-major matrix.
    pub fn to_matrix(&self) -> Mat4 {
        let mut m = self.rotation.to_homogeneous();
        for c in 0..3 {
            let s = self.scale[c];
            m[(0, c)] *= s;
            m[(1, c)] *= s;
            m[(2, c)] *= s;
        }
        m[(0, 3)] = self.position.x;
        m[(1, 3)] = self.position.y;
        m[(2, 3)] = self.position.z;
        m
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

/// A line segment between two world-space points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Start point.
    pub p1: Point3,
    /// End point.
    pub p2: Point3,
}

impl Segment {
    /// Create a segment from two points.
    pub fn new(p1: Point3, p2: Point3) -> Self {
        Self { p1, p2 }
    }
}

/// The transform that maps the canonical primitive cylinder/cone (radius 1,
/// spanning y = -1..+1) onto `segment`, with the given lateral radius.
///
/// Line, frame-axis, arrow, and cone decorations all reuse the shared unit
/// meshes through this mapping instead of generating bespoke geometry.
pub fn cylinder_to_segment_transform(segment: &Segment, radius: f32) -> Transform {
    let seg_dir = segment.p2 - segment.p1;
    let len = seg_dir.norm();

    let rotation = if len > 0.0 {
        Quat::rotation_between(&Vec3::y(), &seg_dir).unwrap_or_else(|| {
            // antiparallel: rotate 180 degrees about any perpendicular axis
            Quat::from_axis_angle(&Dir3::new_normalize(Vec3::x()), std::f32::consts::PI)
        })
    } else {
        Quat::identity()
    };

    Transform {
        scale: Vec3::new(radius, len / 2.0, radius),
        rotation,
        position: segment.p1.coords + seg_dir / 2.0,
    }
}

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    /// Minimum corner.
    pub min: Point3,
    /// Maximum corner.
    pub max: Point3,
}

impl Aabb {
    /// An "empty" box that any `include_point` call will snap onto.
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f32::INFINITY, f32::INFINITY, f32::INFINITY),
            max: Point3::new(f32::NEG_INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY),
        }
    }

    /// Tightest box around a set of points. Returns `None` for an empty set.
    pub fn from_points<I: IntoIterator<Item = Point3>>(points: I) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut rv = Self {
            min: first,
            max: first,
        };
        for p in iter {
            rv.include_point(&p);
        }
        Some(rv)
    }

    /// Grow the box to contain `p`.
    pub fn include_point(&mut self, p: &Point3) {
        self.min = Point3::new(self.min.x.min(p.x), self.min.y.min(p.y), self.min.z.min(p.z));
        self.max = Point3::new(self.max.x.max(p.x), self.max.y.max(p.y), self.max.z.max(p.z));
    }

    /// The exact union of two boxes.
    pub fn union(&self, other: &Aabb) -> Aabb {
        let mut rv = *self;
        rv.include_point(&other.min);
        rv.include_point(&other.max);
        rv
    }

    /// Geometric center of the box.
    pub fn center(&self) -> Point3 {
        nalgebra::center(&self.min, &self.max)
    }

    /// Full extents (max - min) of the box.
    pub fn dimensions(&self) -> Vec3 {
        self.max - self.min
    }

    /// Index (0 = x, 1 = y, 2 = z) of the box's longest dimension.
    pub fn longest_axis(&self) -> usize {
        let d = self.dimensions();
        if d.x >= d.y && d.x >= d.z {
            0
        } else if d.y >= d.z {
            1
        } else {
            2
        }
    }

    /// The 8 corners of the box.
    pub fn corners(&self) -> [Point3; 8] {
        let (lo, hi) = (self.min, self.max);
        [
            Point3::new(lo.x, lo.y, lo.z),
            Point3::new(hi.x, lo.y, lo.z),
            Point3::new(lo.x, hi.y, lo.z),
            Point3::new(hi.x, hi.y, lo.z),
            Point3::new(lo.x, lo.y, hi.z),
            Point3::new(hi.x, lo.y, hi.z),
            Point3::new(lo.x, hi.y, hi.z),
            Point3::new(hi.x, hi.y, hi.z),
        ]
    }

    /// Tightest axis-aligned box around this box after transforming it.
    pub fn transformed_by(&self, t: &Transform) -> Aabb {
        let mut rv = Aabb::empty();
        for corner in self.corners() {
            rv.include_point(&t.transform_point(&corner));
        }
        rv
    }
}

/// A ray with an origin and a (normalized) direction.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    /// Ray origin.
    pub origin: Point3,
    /// Ray direction. Normalized on construction via [`Ray::new`].
    pub direction: Vec3,
}

impl Ray {
    /// Create a ray, normalizing `direction`.
    pub fn new(origin: Point3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// Point at parameter `t` along the ray.
    pub fn at(&self, t: f32) -> Point3 {
        self.origin + t * self.direction
    }

    /// Slab test against an AABB.
    ///
    /// Returns `(t_enter, t_exit)` if the ray intersects the box in front of
    /// (or enclosing) the origin. Division by a zero direction component
    /// yields infinities, which the min/max folding handles correctly.
    pub fn intersect_aabb(&self, aabb: &Aabb) -> Option<(f32, f32)> {
        let mut t_enter = f32::NEG_INFINITY;
        let mut t_exit = f32::INFINITY;

        for axis in 0..3 {
            let inv_d = 1.0 / self.direction[axis];
            let t0 = (aabb.min[axis] - self.origin[axis]) * inv_d;
            let t1 = (aabb.max[axis] - self.origin[axis]) * inv_d;
            let (near, far) = if t0 <= t1 { (t0, t1) } else { (t1, t0) };
            t_enter = t_enter.max(near);
            t_exit = t_exit.min(far);
            if t_enter > t_exit {
                return None;
            }
        }

        if t_exit < 0.0 {
            return None;
        }
        Some((t_enter.max(0.0), t_exit))
    }

    /// Möller–Trumbore ray/triangle intersection.
    ///
    /// Returns the ray parameter of the hit, or `None` for a miss or a
    /// degenerate triangle. Both triangle windings hit (no backface culling),
    /// since picking should work from either side of a surface.
    pub fn intersect_triangle(&self, a: &Point3, b: &Point3, c: &Point3) -> Option<f32> {
        const EPS: f32 = 1e-7;

        let ab = b - a;
        let ac = c - a;
        let pvec = self.direction.cross(&ac);
        let det = ab.dot(&pvec);
        if det.abs() < EPS {
            return None;
        }

        let inv_det = 1.0 / det;
        let tvec = self.origin - a;
        let u = tvec.dot(&pvec) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let qvec = tvec.cross(&ab);
        let v = self.direction.dot(&qvec) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = ac.dot(&qvec) * inv_det;
        (t >= 0.0).then_some(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_transform_point_order() {
        // scale, then rotate 90 degrees about Z, then translate
        let t = Transform {
            scale: Vec3::new(2.0, 1.0, 1.0),
            rotation: Quat::from_axis_angle(&Dir3::new_normalize(Vec3::z()), PI / 2.0),
            position: Vec3::new(0.0, 0.0, 5.0),
        };
        let p = t.transform_point(&Point3::new(1.0, 0.0, 0.0));
        assert!(p.x.abs() < 1e-6);
        assert!((p.y - 2.0).abs() < 1e-6);
        assert!((p.z - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_then_composes_rigid_transforms() {
        let body = Transform {
            rotation: Quat::from_axis_angle(&Dir3::new_normalize(Vec3::z()), PI / 2.0),
            position: Vec3::new(1.0, 0.0, 0.0),
            ..Transform::identity()
        };
        let local = Transform::translation(Vec3::new(1.0, 0.0, 0.0));
        let composed = body.then(&local);

        let direct = body.transform_point(&local.transform_point(&Point3::origin()));
        let via = composed.transform_point(&Point3::origin());
        assert!((direct - via).norm() < 1e-6);
    }

    #[test]
    fn test_to_matrix_matches_transform_point() {
        let t = Transform {
            scale: Vec3::new(2.0, 3.0, 4.0),
            rotation: Quat::from_axis_angle(&Dir3::new_normalize(Vec3::new(1.0, 1.0, 0.0)), 0.7),
            position: Vec3::new(-1.0, 2.0, 0.5),
        };
        let p = Point3::new(0.3, -0.8, 1.2);
        let expected = t.transform_point(&p);
        let h = t.to_matrix() * nalgebra::Vector4::new(p.x, p.y, p.z, 1.0);
        assert!((h.x - expected.x).abs() < 1e-5);
        assert!((h.y - expected.y).abs() < 1e-5);
        assert!((h.z - expected.z).abs() < 1e-5);
    }

    #[test]
    fn test_cylinder_to_segment_transform() {
        // unit cylinder spans y = -1..+1; map it onto a vertical segment
        let seg = Segment::new(Point3::new(0.0, 0.0, 0.0), Point3::new(0.0, 4.0, 0.0));
        let t = cylinder_to_segment_transform(&seg, 0.5);

        let bottom = t.transform_point(&Point3::new(0.0, -1.0, 0.0));
        let top = t.transform_point(&Point3::new(0.0, 1.0, 0.0));
        assert!((bottom - seg.p1).norm() < 1e-6);
        assert!((top - seg.p2).norm() < 1e-6);

        // lateral radius preserved
        let side = t.transform_point(&Point3::new(1.0, 0.0, 0.0));
        assert!((side.x - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_cylinder_to_segment_transform_arbitrary_direction() {
        let seg = Segment::new(Point3::new(1.0, 2.0, 3.0), Point3::new(-2.0, 0.0, 5.0));
        let t = cylinder_to_segment_transform(&seg, 0.1);
        let bottom = t.transform_point(&Point3::new(0.0, -1.0, 0.0));
        let top = t.transform_point(&Point3::new(0.0, 1.0, 0.0));
        assert!((bottom - seg.p1).norm() < 1e-5);
        assert!((top - seg.p2).norm() < 1e-5);
    }

    #[test]
    fn test_cylinder_to_segment_transform_antiparallel() {
        let seg = Segment::new(Point3::new(0.0, 1.0, 0.0), Point3::new(0.0, -1.0, 0.0));
        let t = cylinder_to_segment_transform(&seg, 1.0);
        let bottom = t.transform_point(&Point3::new(0.0, -1.0, 0.0));
        assert!((bottom - seg.p1).norm() < 1e-6);
    }

    #[test]
    fn test_aabb_union_and_center() {
        let a = Aabb::from_points([Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0)]).unwrap();
        let b = Aabb::from_points([Point3::new(2.0, -1.0, 0.5)]).unwrap();
        let u = a.union(&b);
        assert_eq!(u.min, Point3::new(0.0, -1.0, 0.0));
        assert_eq!(u.max, Point3::new(2.0, 1.0, 1.0));
        assert_eq!(u.center(), Point3::new(1.0, 0.0, 0.5));
    }

    #[test]
    fn test_aabb_longest_axis() {
        let b = Aabb::from_points([Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 5.0, 2.0)]).unwrap();
        assert_eq!(b.longest_axis(), 1);
    }

    #[test]
    fn test_aabb_transformed_by_rotation() {
        let b = Aabb::from_points([Point3::new(-1.0, -2.0, 0.0), Point3::new(1.0, 2.0, 0.0)]).unwrap();
        let t = Transform::rotation(Quat::from_axis_angle(
            &Dir3::new_normalize(Vec3::z()),
            PI / 2.0,
        ));
        let r = b.transformed_by(&t);
        assert!((r.min.x - -2.0).abs() < 1e-5);
        assert!((r.max.x - 2.0).abs() < 1e-5);
        assert!((r.min.y - -1.0).abs() < 1e-5);
        assert!((r.max.y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_ray_aabb_hit_and_miss() {
        let b = Aabb::from_points([Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 1.0, 1.0)]).unwrap();

        let hit = Ray::new(Point3::new(0.0, 0.0, -5.0), Vec3::z());
        let (t_enter, t_exit) = hit.intersect_aabb(&b).unwrap();
        assert!((t_enter - 4.0).abs() < 1e-5);
        assert!((t_exit - 6.0).abs() < 1e-5);

        let miss = Ray::new(Point3::new(5.0, 0.0, -5.0), Vec3::z());
        assert!(miss.intersect_aabb(&b).is_none());

        // behind the origin
        let behind = Ray::new(Point3::new(0.0, 0.0, 5.0), Vec3::z());
        assert!(behind.intersect_aabb(&b).is_none());
    }

    #[test]
    fn test_ray_aabb_origin_inside() {
        let b = Aabb::from_points([Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 1.0, 1.0)]).unwrap();
        let ray = Ray::new(Point3::origin(), Vec3::x());
        let (t_enter, t_exit) = ray.intersect_aabb(&b).unwrap();
        assert_eq!(t_enter, 0.0);
        assert!((t_exit - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_ray_triangle() {
        let a = Point3::new(-1.0, -1.0, 2.0);
        let b = Point3::new(1.0, -1.0, 2.0);
        let c = Point3::new(0.0, 1.0, 2.0);

        let hit = Ray::new(Point3::origin(), Vec3::z());
        let t = hit.intersect_triangle(&a, &b, &c).unwrap();
        assert!((t - 2.0).abs() < 1e-5);

        let miss = Ray::new(Point3::new(5.0, 5.0, 0.0), Vec3::z());
        assert!(miss.intersect_triangle(&a, &b, &c).is_none());

        // hits from behind the triangle as well (no culling)
        let reverse = Ray::new(Point3::new(0.0, 0.0, 4.0), -Vec3::z());
        assert!(reverse.intersect_triangle(&a, &b, &c).is_some());
    }
}
