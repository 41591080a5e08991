//! Procedural geometry generators.
//!
//! Layouts follow the usual box/plane/sphere/cone conventions of web 3D
//! engines: counter-clockwise front faces, planes in XY facing +Z, and uv
//! `v = 1` at the top edge of an image.

use glam::Vec3;
use std::f32::consts::PI;

/// Interleaved vertex: position, normal, uv.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    pub fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }
}

/// Indexed triangle list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Geometry {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Geometry {
    pub fn from_data(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Axis-aligned box centred on the origin, one segment per side.
    pub fn cuboid(width: f32, height: f32, depth: f32) -> Self {
        Self::cuboid_with_segments(width, height, depth, 1, 1, 1)
    }

    pub fn cuboid_with_segments(
        width: f32,
        height: f32,
        depth: f32,
        width_segments: u32,
        height_segments: u32,
        depth_segments: u32,
    ) -> Self {
        let mut builder = BoxBuilder::default();
        let (ws, hs, ds) = (
            width_segments.max(1),
            height_segments.max(1),
            depth_segments.max(1),
        );
        // +X, -X, +Y, -Y, +Z, -Z
        builder.face([2, 1, 0], -1.0, -1.0, depth, height, width, ds, hs);
        builder.face([2, 1, 0], 1.0, -1.0, depth, height, -width, ds, hs);
        builder.face([0, 2, 1], 1.0, 1.0, width, depth, height, ws, ds);
        builder.face([0, 2, 1], 1.0, -1.0, width, depth, -height, ws, ds);
        builder.face([0, 1, 2], 1.0, -1.0, width, height, depth, ws, hs);
        builder.face([0, 1, 2], -1.0, -1.0, width, height, -depth, ws, hs);
        Self::from_data(builder.vertices, builder.indices)
    }

    /// Plane in XY facing +Z.
    pub fn plane(width: f32, height: f32, width_segments: u32, height_segments: u32) -> Self {
        let grid_x = width_segments.max(1);
        let grid_y = height_segments.max(1);
        let grid_x1 = grid_x + 1;
        let segment_width = width / grid_x as f32;
        let segment_height = height / grid_y as f32;

        let mut vertices = Vec::with_capacity((grid_x1 * (grid_y + 1)) as usize);
        for iy in 0..=grid_y {
            let y = iy as f32 * segment_height - height * 0.5;
            for ix in 0..=grid_x {
                let x = ix as f32 * segment_width - width * 0.5;
                vertices.push(Vertex::new(
                    [x, -y, 0.0],
                    [0.0, 0.0, 1.0],
                    [ix as f32 / grid_x as f32, 1.0 - iy as f32 / grid_y as f32],
                ));
            }
        }

        let mut indices = Vec::with_capacity((grid_x * grid_y * 6) as usize);
        for iy in 0..grid_y {
            for ix in 0..grid_x {
                let a = ix + grid_x1 * iy;
                let b = ix + grid_x1 * (iy + 1);
                let c = (ix + 1) + grid_x1 * (iy + 1);
                let d = (ix + 1) + grid_x1 * iy;
                indices.extend_from_slice(&[a, b, d, b, c, d]);
            }
        }
        Self::from_data(vertices, indices)
    }

    /// UV sphere. The pole rows collapse to single triangles.
    pub fn sphere(radius: f32, width_segments: u32, height_segments: u32) -> Self {
        let ws = width_segments.max(3);
        let hs = height_segments.max(2);

        let mut vertices = Vec::new();
        let mut grid = Vec::with_capacity(hs as usize + 1);
        for iy in 0..=hs {
            let v = iy as f32 / hs as f32;
            let u_offset = if iy == 0 {
                0.5 / ws as f32
            } else if iy == hs {
                -0.5 / ws as f32
            } else {
                0.0
            };
            let mut row = Vec::with_capacity(ws as usize + 1);
            for ix in 0..=ws {
                let u = ix as f32 / ws as f32;
                let (phi, theta) = (u * 2.0 * PI, v * PI);
                let position = Vec3::new(
                    -radius * phi.cos() * theta.sin(),
                    radius * theta.cos(),
                    radius * phi.sin() * theta.sin(),
                );
                let normal = position.normalize_or_zero();
                row.push(vertices.len() as u32);
                vertices.push(Vertex::new(
                    position.to_array(),
                    normal.to_array(),
                    [u + u_offset, 1.0 - v],
                ));
            }
            grid.push(row);
        }

        let mut indices = Vec::new();
        for iy in 0..hs as usize {
            for ix in 0..ws as usize {
                let a = grid[iy][ix + 1];
                let b = grid[iy][ix];
                let c = grid[iy + 1][ix];
                let d = grid[iy + 1][ix + 1];
                if iy != 0 {
                    indices.extend_from_slice(&[a, b, d]);
                }
                if iy != hs as usize - 1 {
                    indices.extend_from_slice(&[b, c, d]);
                }
            }
        }
        Self::from_data(vertices, indices)
    }

    /// Cone with its apex up and a closed base, centred on the origin.
    pub fn cone(radius: f32, height: f32, radial_segments: u32) -> Self {
        let rs = radial_segments.max(3);
        let half_height = height * 0.5;
        let slope = radius / height;

        let mut vertices = Vec::new();
        let mut rows = Vec::with_capacity(2);
        // Torso: apex row (radius 0) and base row.
        for y in 0..=1u32 {
            let v = y as f32;
            let ring_radius = v * radius;
            let mut row = Vec::with_capacity(rs as usize + 1);
            for x in 0..=rs {
                let u = x as f32 / rs as f32;
                let theta = u * 2.0 * PI;
                let (sin, cos) = theta.sin_cos();
                let normal = Vec3::new(sin, slope, cos).normalize();
                row.push(vertices.len() as u32);
                vertices.push(Vertex::new(
                    [ring_radius * sin, -v * height + half_height, ring_radius * cos],
                    normal.to_array(),
                    [u, 1.0 - v],
                ));
            }
            rows.push(row);
        }

        let mut indices = Vec::new();
        for x in 0..rs as usize {
            let b = rows[1][x];
            let c = rows[1][x + 1];
            let d = rows[0][x + 1];
            indices.extend_from_slice(&[b, c, d]);
        }

        // Base cap, facing -Y.
        let center_start = vertices.len() as u32;
        for _ in 0..rs {
            vertices.push(Vertex::new(
                [0.0, -half_height, 0.0],
                [0.0, -1.0, 0.0],
                [0.5, 0.5],
            ));
        }
        let ring_start = vertices.len() as u32;
        for x in 0..=rs {
            let theta = x as f32 / rs as f32 * 2.0 * PI;
            let (sin, cos) = theta.sin_cos();
            vertices.push(Vertex::new(
                [radius * sin, -half_height, radius * cos],
                [0.0, -1.0, 0.0],
                [cos * 0.5 + 0.5, -sin * 0.5 + 0.5],
            ));
        }
        for x in 0..rs {
            let center = center_start + x;
            let ring = ring_start + x;
            indices.extend_from_slice(&[ring + 1, ring, center]);
        }

        Self::from_data(vertices, indices)
    }
}

#[derive(Default)]
struct BoxBuilder {
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
}

impl BoxBuilder {
    /// Emit one face. `axes` maps (u, v, w) to vector components; the face
    /// sits at `w = depth / 2` with its normal along `sign(depth) * w`.
    #[allow(clippy::too_many_arguments)]
    fn face(
        &mut self,
        axes: [usize; 3],
        u_dir: f32,
        v_dir: f32,
        width: f32,
        height: f32,
        depth: f32,
        grid_x: u32,
        grid_y: u32,
    ) {
        let [u, v, w] = axes;
        let base = self.vertices.len() as u32;
        let segment_width = width / grid_x as f32;
        let segment_height = height / grid_y as f32;
        let grid_x1 = grid_x + 1;

        for iy in 0..=grid_y {
            let y = iy as f32 * segment_height - height * 0.5;
            for ix in 0..=grid_x {
                let x = ix as f32 * segment_width - width * 0.5;
                let mut position = [0.0; 3];
                position[u] = x * u_dir;
                position[v] = y * v_dir;
                position[w] = depth * 0.5;
                let mut normal = [0.0; 3];
                normal[w] = if depth > 0.0 { 1.0 } else { -1.0 };
                self.vertices.push(Vertex::new(
                    position,
                    normal,
                    [ix as f32 / grid_x as f32, 1.0 - iy as f32 / grid_y as f32],
                ));
            }
        }

        for iy in 0..grid_y {
            for ix in 0..grid_x {
                let a = base + ix + grid_x1 * iy;
                let b = base + ix + grid_x1 * (iy + 1);
                let c = base + (ix + 1) + grid_x1 * (iy + 1);
                let d = base + (ix + 1) + grid_x1 * iy;
                self.indices.extend_from_slice(&[a, b, d, b, c, d]);
            }
        }
    }
}
