#![warn(missing_docs)]

//! Procedural primitive mesh generators for the myoviz scene pipeline.
//!
//! Each generator is a pure function from shape parameters to a fully
//! populated [`Mesh`] (vertices, outward-facing normals, texture
//! coordinates, indices). UV convention: `u` wraps around the shape, `v`
//! runs along its axis. Segment counts below the engineering minimum for a
//! non-degenerate shape are clamped up rather than rejected.
//!
//! The grid-based generators share one pattern: build a 2D parametric grid
//! of (u, v) samples, map each sample to a position + normal, then emit two
//! triangles per grid cell, treating polar singularities (sphere poles, cone
//! apex) as degenerate fans.

use std::collections::HashSet;
use std::f32::consts::{PI, TAU};

use myoviz_math::{Point3, Vec2, Vec3};
use myoviz_mesh::{Mesh, MeshTopology, SubMeshDescriptor};

/// Generate a UV sphere spanning the full longitude/latitude range.
pub fn sphere(radius: f32, width_segments: usize, height_segments: usize) -> Mesh {
    sphere_section(radius, width_segments, height_segments, 0.0, TAU, 0.0, PI)
}

/// Generate a partial UV sphere.
///
/// `phi` is longitude (around the Y axis), `theta` is latitude measured from
/// the +Y pole. Width segments clamp to >= 3, height segments to >= 2.
pub fn sphere_section(
    radius: f32,
    width_segments: usize,
    height_segments: usize,
    phi_start: f32,
    phi_length: f32,
    theta_start: f32,
    theta_length: f32,
) -> Mesh {
    let width_segments = width_segments.max(3);
    let height_segments = height_segments.max(2);
    let theta_end = (theta_start + theta_length).min(PI);

    let mut vertices = Vec::new();
    let mut normals = Vec::new();
    let mut uvs = Vec::new();
    let mut indices = Vec::new();
    let mut grid: Vec<Vec<u32>> = Vec::new();
    let mut index = 0u32;

    for iy in 0..=height_segments {
        let mut row = Vec::with_capacity(width_segments + 1);
        let v = iy as f32 / height_segments as f32;

        // poles collapse a grid row to a single point; nudge u so the
        // texture seam stays centered on each pole triangle
        let u_offset = if iy == 0 && theta_start == 0.0 {
            0.5 / width_segments as f32
        } else if iy == height_segments && theta_end >= PI {
            -0.5 / width_segments as f32
        } else {
            0.0
        };

        let theta = theta_start + v * theta_length;
        for ix in 0..=width_segments {
            let u = ix as f32 / width_segments as f32;
            let phi = phi_start + u * phi_length;

            let vertex = Point3::new(
                -radius * phi.cos() * theta.sin(),
                radius * theta.cos(),
                radius * phi.sin() * theta.sin(),
            );
            vertices.push(vertex);
            normals.push(vertex.coords.normalize());
            uvs.push(Vec2::new(u + u_offset, 1.0 - v));
            row.push(index);
            index += 1;
        }
        grid.push(row);
    }

    for iy in 0..height_segments {
        for ix in 0..width_segments {
            let a = grid[iy][ix + 1];
            let b = grid[iy][ix];
            let c = grid[iy + 1][ix];
            let d = grid[iy + 1][ix + 1];

            if iy != 0 || theta_start > 0.0 {
                indices.extend([a, b, d]);
            }
            if iy != height_segments - 1 || theta_end < PI {
                indices.extend([b, c, d]);
            }
        }
    }

    let mut rv = Mesh::new();
    rv.set_vertices(vertices);
    rv.set_normals(normals);
    rv.set_tex_coords(uvs);
    rv.set_indices(indices);
    rv
}

/// Generate a capped cylinder centered on the origin, axis along Y.
///
/// `radius_top`/`radius_bottom` may differ (a cone is a cylinder whose top
/// radius is zero). The torso and each cap are recorded as separate submesh
/// ranges. Radial segments clamp to >= 3, height segments to >= 1.
pub fn cylinder(
    radius_top: f32,
    radius_bottom: f32,
    height: f32,
    radial_segments: usize,
    height_segments: usize,
    open_ended: bool,
    theta_start: f32,
    theta_length: f32,
) -> Mesh {
    let radial_segments = radial_segments.max(3);
    let height_segments = height_segments.max(1);
    let half_height = height / 2.0;

    let mut vertices: Vec<Point3> = Vec::new();
    let mut normals: Vec<Vec3> = Vec::new();
    let mut uvs: Vec<Vec2> = Vec::new();
    let mut indices: Vec<u32> = Vec::new();
    let mut groups: Vec<SubMeshDescriptor> = Vec::new();
    let mut index = 0u32;
    let mut group_start = 0usize;

    // torso
    {
        let slope = (radius_bottom - radius_top) / height;
        let mut rows: Vec<Vec<u32>> = Vec::new();

        for y in 0..=height_segments {
            let v = y as f32 / height_segments as f32;
            let radius = v * (radius_bottom - radius_top) + radius_top;
            let mut row = Vec::with_capacity(radial_segments + 1);
            for x in 0..=radial_segments {
                let u = x as f32 / radial_segments as f32;
                let theta = u * theta_length + theta_start;
                let (sin_theta, cos_theta) = theta.sin_cos();

                vertices.push(Point3::new(
                    radius * sin_theta,
                    -v * height + half_height,
                    radius * cos_theta,
                ));
                normals.push(Vec3::new(sin_theta, slope, cos_theta).normalize());
                uvs.push(Vec2::new(u, 1.0 - v));
                row.push(index);
                index += 1;
            }
            rows.push(row);
        }

        for x in 0..radial_segments {
            for y in 0..height_segments {
                let a = rows[y][x];
                let b = rows[y + 1][x];
                let c = rows[y + 1][x + 1];
                let d = rows[y][x + 1];
                indices.extend([a, b, d]);
                indices.extend([b, c, d]);
            }
        }

        let count = indices.len() - group_start;
        groups.push(SubMeshDescriptor::new(group_start, count, MeshTopology::Triangles));
        group_start = indices.len();
    }

    // caps: one center vertex per segment so each cap triangle gets its own uv
    let mut generate_cap = |top: bool| {
        let radius = if top { radius_top } else { radius_bottom };
        let sign = if top { 1.0f32 } else { -1.0f32 };

        let center_index_start = index;
        for _ in 1..=radial_segments {
            vertices.push(Point3::new(0.0, sign * half_height, 0.0));
            normals.push(Vec3::new(0.0, sign, 0.0));
            uvs.push(Vec2::new(0.5, 0.5));
            index += 1;
        }
        let center_index_end = index;

        for x in 0..=radial_segments {
            let u = x as f32 / radial_segments as f32;
            let theta = u * theta_length + theta_start;
            let (sin_theta, cos_theta) = theta.sin_cos();

            vertices.push(Point3::new(radius * sin_theta, sign * half_height, radius * cos_theta));
            normals.push(Vec3::new(0.0, sign, 0.0));
            uvs.push(Vec2::new(cos_theta * 0.5 + 0.5, sin_theta * 0.5 * sign + 0.5));
            index += 1;
        }

        for x in 0..radial_segments as u32 {
            let c = center_index_start + x;
            let i = center_index_end + x;
            if top {
                indices.extend([i, i + 1, c]);
            } else {
                indices.extend([i + 1, i, c]);
            }
        }

        let count = indices.len() - group_start;
        groups.push(SubMeshDescriptor::new(group_start, count, MeshTopology::Triangles));
        group_start = indices.len();
    };

    if !open_ended {
        if radius_top > 0.0 {
            generate_cap(true);
        }
        if radius_bottom > 0.0 {
            generate_cap(false);
        }
    }

    let mut rv = Mesh::new();
    rv.set_vertices(vertices);
    rv.set_normals(normals);
    rv.set_tex_coords(uvs);
    rv.set_indices(indices);
    for g in groups {
        rv.push_submesh_descriptor(g);
    }
    rv
}

/// Generate a capped cone with its apex at +Y, base at -Y.
pub fn cone(
    radius: f32,
    height: f32,
    radial_segments: usize,
    height_segments: usize,
    open_ended: bool,
    theta_start: f32,
    theta_length: f32,
) -> Mesh {
    cylinder(
        0.0,
        radius,
        height,
        radial_segments,
        height_segments,
        open_ended,
        theta_start,
        theta_length,
    )
}

/// Generate a torus around the Z axis.
///
/// `radius` is the distance from the torus center to the tube center,
/// `tube` the tube radius, `arc` the swept angle.
pub fn torus(radius: f32, tube: f32, radial_segments: usize, tubular_segments: usize, arc: f32) -> Mesh {
    let radial_segments = radial_segments.max(3);
    let tubular_segments = tubular_segments.max(3);

    let mut vertices = Vec::new();
    let mut normals = Vec::new();
    let mut uvs = Vec::new();
    let mut indices = Vec::new();

    for j in 0..=radial_segments {
        let v = j as f32 / radial_segments as f32 * TAU;
        for i in 0..=tubular_segments {
            let u = i as f32 / tubular_segments as f32 * arc;

            let vertex = Point3::new(
                (radius + tube * v.cos()) * u.cos(),
                (radius + tube * v.cos()) * u.sin(),
                tube * v.sin(),
            );
            vertices.push(vertex);
            // from the tube's center circle out to the vertex
            let center = Vec3::new(radius * u.cos(), radius * u.sin(), 0.0);
            normals.push((vertex.coords - center).normalize());
            uvs.push(Vec2::new(
                i as f32 / tubular_segments as f32,
                j as f32 / radial_segments as f32,
            ));
        }
    }

    let stride = (tubular_segments + 1) as u32;
    for j in 1..=radial_segments as u32 {
        for i in 1..=tubular_segments as u32 {
            let a = stride * j + i - 1;
            let b = stride * (j - 1) + i - 1;
            let c = stride * (j - 1) + i;
            let d = stride * j + i;
            indices.extend([a, b, d]);
            indices.extend([b, c, d]);
        }
    }

    let mut rv = Mesh::new();
    rv.set_vertices(vertices);
    rv.set_normals(normals);
    rv.set_tex_coords(uvs);
    rv.set_indices(indices);
    rv
}

/// Generate an axis-aligned box centered on the origin.
pub fn brick(width: f32, height: f32, depth: f32) -> Mesh {
    let (hw, hh, hd) = (width / 2.0, height / 2.0, depth / 2.0);

    // 4 vertices per face so each face gets a flat normal and its own uvs
    let faces: [(Vec3, Vec3, Vec3); 6] = [
        (Vec3::x(), Vec3::y(), Vec3::z()),
        (-Vec3::x(), Vec3::y(), -Vec3::z()),
        (Vec3::y(), Vec3::z(), Vec3::x()),
        (-Vec3::y(), -Vec3::z(), Vec3::x()),
        (Vec3::z(), Vec3::y(), -Vec3::x()),
        (-Vec3::z(), Vec3::y(), Vec3::x()),
    ];
    let half = Vec3::new(hw, hh, hd);

    let mut vertices = Vec::with_capacity(24);
    let mut normals = Vec::with_capacity(24);
    let mut uvs = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);

    for (face, (normal, up, right)) in faces.iter().enumerate() {
        let base = (face * 4) as u32;
        for (du, dv) in [(-1.0f32, -1.0f32), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
            let corner = (*normal + *right * du + *up * dv).component_mul(&half);
            vertices.push(Point3::from(corner));
            normals.push(*normal);
            uvs.push(Vec2::new((du + 1.0) / 2.0, (dv + 1.0) / 2.0));
        }
        indices.extend([base, base + 1, base + 2]);
        indices.extend([base, base + 2, base + 3]);
    }

    let mut rv = Mesh::new();
    rv.set_vertices(vertices);
    rv.set_normals(normals);
    rv.set_tex_coords(uvs);
    rv.set_indices(indices);
    rv
}

/// Generate a flat plane in the XY plane, facing +Z.
pub fn plane(width: f32, height: f32, width_segments: usize, height_segments: usize) -> Mesh {
    let width_segments = width_segments.max(1);
    let height_segments = height_segments.max(1);
    let half_width = width / 2.0;
    let half_height = height / 2.0;

    let grid_x1 = width_segments + 1;

    let mut vertices = Vec::new();
    let mut normals = Vec::new();
    let mut uvs = Vec::new();
    let mut indices = Vec::new();

    for iy in 0..=height_segments {
        let y = iy as f32 * height / height_segments as f32 - half_height;
        for ix in 0..=width_segments {
            let x = ix as f32 * width / width_segments as f32 - half_width;
            vertices.push(Point3::new(x, -y, 0.0));
            normals.push(Vec3::z());
            uvs.push(Vec2::new(
                ix as f32 / width_segments as f32,
                1.0 - iy as f32 / height_segments as f32,
            ));
        }
    }

    for iy in 0..height_segments {
        for ix in 0..width_segments {
            let a = (ix + grid_x1 * iy) as u32;
            let b = (ix + grid_x1 * (iy + 1)) as u32;
            let c = (ix + 1 + grid_x1 * (iy + 1)) as u32;
            let d = (ix + 1 + grid_x1 * iy) as u32;
            indices.extend([a, b, d]);
            indices.extend([b, c, d]);
        }
    }

    let mut rv = Mesh::new();
    rv.set_vertices(vertices);
    rv.set_normals(normals);
    rv.set_tex_coords(uvs);
    rv.set_indices(indices);
    rv
}

/// Generate a filled disc in the XY plane, facing +Z.
pub fn circle(radius: f32, segments: usize) -> Mesh {
    let segments = segments.max(3);

    let mut vertices = vec![Point3::origin()];
    let mut normals = vec![Vec3::z()];
    let mut uvs = vec![Vec2::new(0.5, 0.5)];
    let mut indices = Vec::new();

    for s in 0..=segments {
        let theta = s as f32 / segments as f32 * TAU;
        let (sin_t, cos_t) = theta.sin_cos();
        vertices.push(Point3::new(radius * cos_t, radius * sin_t, 0.0));
        normals.push(Vec3::z());
        uvs.push(Vec2::new((cos_t + 1.0) / 2.0, (sin_t + 1.0) / 2.0));
    }

    for i in 1..=segments as u32 {
        indices.extend([i, i + 1, 0]);
    }

    let mut rv = Mesh::new();
    rv.set_vertices(vertices);
    rv.set_normals(normals);
    rv.set_tex_coords(uvs);
    rv.set_indices(indices);
    rv
}

/// Extract the unique undirected edge set of a triangle mesh as a
/// line-topology mesh, for debug/wireframe visualization.
///
/// Edges shared between triangles are emitted exactly once; an edge is
/// canonicalized by ordering its two endpoint indices. Line meshes pass
/// through unchanged.
pub fn wireframe(mesh: &Mesh) -> Mesh {
    if mesh.topology() == MeshTopology::Lines {
        return mesh.clone();
    }

    let Some(source_indices) = mesh.indices() else {
        return Mesh::new();
    };
    let verts = mesh.vertices();

    let mut seen: HashSet<(u32, u32)> = HashSet::new();
    let mut points: Vec<Point3> = Vec::new();

    let idx: Vec<u32> = source_indices.iter().collect();
    for tri in idx.chunks_exact(3) {
        // shrinking a mesh's vertex buffer can strand dangling indices
        if tri.iter().any(|&i| i as usize >= verts.len()) {
            continue;
        }
        for (a, b) in [(tri[0], tri[1]), (tri[0], tri[2]), (tri[1], tri[2])] {
            let edge = if a < b { (a, b) } else { (b, a) };
            if seen.insert(edge) {
                points.push(verts[edge.0 as usize]);
                points.push(verts[edge.1 as usize]);
            }
        }
    }

    let indices: Vec<u32> = (0..points.len() as u32).collect();

    let mut rv = Mesh::new();
    rv.set_topology(MeshTopology::Lines);
    rv.set_vertices(points);
    rv.set_indices(indices);
    rv
}

/// Generate an `n` x `n` grid of lines spanning [-1, +1] in the XY plane.
/// `n` clamps to >= 1.
pub fn grid_lines(n: usize) -> Mesh {
    let n = n.max(1);
    let nlines = n + 1;
    let step = 2.0 / n as f32;

    let mut vertices = Vec::with_capacity(4 * nlines);
    let mut normals = Vec::with_capacity(4 * nlines);

    for i in 0..nlines {
        let y = -1.0 + i as f32 * step;
        vertices.push(Point3::new(-1.0, y, 0.0));
        vertices.push(Point3::new(1.0, y, 0.0));
    }
    for i in 0..nlines {
        let x = -1.0 + i as f32 * step;
        vertices.push(Point3::new(x, -1.0, 0.0));
        vertices.push(Point3::new(x, 1.0, 0.0));
    }
    normals.resize(vertices.len(), Vec3::z());

    let indices: Vec<u32> = (0..vertices.len() as u32).collect();

    let mut rv = Mesh::new();
    rv.set_topology(MeshTopology::Lines);
    rv.set_vertices(vertices);
    rv.set_normals(normals);
    rv.set_indices(indices);
    rv
}

/// Generate the 12 edges of the [-1, +1] cube as a line mesh.
pub fn cube_lines() -> Mesh {
    let mut rv = Mesh::new();
    rv.set_topology(MeshTopology::Lines);
    rv.set_vertices(vec![
        Point3::new(1.0, 1.0, 1.0),
        Point3::new(-1.0, 1.0, 1.0),
        Point3::new(-1.0, -1.0, 1.0),
        Point3::new(1.0, -1.0, 1.0),
        Point3::new(1.0, 1.0, -1.0),
        Point3::new(-1.0, 1.0, -1.0),
        Point3::new(-1.0, -1.0, -1.0),
        Point3::new(1.0, -1.0, -1.0),
    ]);
    rv.set_indices(vec![
        0, 1, 1, 2, 2, 3, 3, 0, 4, 5, 5, 6, 6, 7, 7, 4, 0, 4, 1, 5, 2, 6, 3, 7,
    ]);
    rv
}

/// Generate a single line from (0, -1, 0) to (0, +1, 0).
pub fn y_line() -> Mesh {
    let mut rv = Mesh::new();
    rv.set_topology(MeshTopology::Lines);
    rv.set_vertices(vec![Point3::new(0.0, -1.0, 0.0), Point3::new(0.0, 1.0, 0.0)]);
    // give renderers that insist on normals *something* to work with
    rv.set_normals(vec![Vec3::z(), Vec3::z()]);
    rv.set_indices(vec![0, 1]);
    rv
}
