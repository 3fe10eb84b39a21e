//! The fixed vertex layout consumed by every program.

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3, Vec4};

use super::Region;

/// One vertex: position at location 0, color at 1, texture coordinate at 2.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
    pub tex_coord: [f32; 2],
}

static_assertions::const_assert_eq!(std::mem::size_of::<Vertex>(), 36);

impl Vertex {
    /// Floats per vertex in a raw buffer.
    pub const FLOATS: usize = 9;
    /// Byte stride between vertices.
    pub const STRIDE: u64 = std::mem::size_of::<Vertex>() as u64;
    /// Highest attribute location a vertex stage may read.
    pub const MAX_LOCATION: u32 = 2;

    pub fn new(position: Vec3, color: Vec4, tex_coord: Vec2) -> Self {
        Self {
            position: position.to_array(),
            color: color.to_array(),
            tex_coord: tex_coord.to_array(),
        }
    }

    /// Two triangles covering `region`, texture coordinates spanning 0..1.
    pub fn quad(region: Region, color: Vec4) -> [Vertex; 6] {
        let left = region.x as f32;
        let top = region.y as f32;
        let right = left + region.width as f32;
        let bottom = top + region.height as f32;

        let v = |x: f32, y: f32, u: f32, t: f32| {
            Vertex::new(Vec3::new(x, y, 0.0), color, Vec2::new(u, t))
        };
        [
            v(left, top, 0.0, 0.0),
            v(left, bottom, 0.0, 1.0),
            v(right, top, 1.0, 0.0),
            v(right, top, 1.0, 0.0),
            v(left, bottom, 0.0, 1.0),
            v(right, bottom, 1.0, 1.0),
        ]
    }
}

/// Flatten vertices into the raw float layout accepted by `create_buffer`.
pub fn vertices_to_floats(vertices: &[Vertex]) -> Vec<f32> {
    bytemuck::cast_slice(vertices).to_vec()
}
