//! Quad and vertex layout shared by self-rendered sprites and sheet atlases.
//!
//! Vertex order inside a quad is top-left, bottom-left, top-right,
//! bottom-right (y-up), so four vertices drawn as a triangle strip produce
//! two triangles sharing the top-left/bottom-right diagonal.

use bytemuck::{Pod, Zeroable};
use wgpu::{VertexAttribute, VertexBufferLayout, VertexFormat, VertexStepMode};

use crate::types::Color4B;

/// One corner of a sprite quad.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct QuadVertex {
    /// Position (x, y, z); world space once written to an atlas
    pub position: [f32; 3],
    /// RGBA color, 8 bits per channel
    pub color: [u8; 4],
    /// Texture coordinates
    pub uv: [f32; 2],
}

impl QuadVertex {
    pub fn desc() -> VertexBufferLayout<'static> {
        VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadVertex>() as u64,
            step_mode: VertexStepMode::Vertex,
            attributes: &[
                // position
                VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: VertexFormat::Float32x3,
                },
                // color
                VertexAttribute {
                    offset: 12,
                    shader_location: 1,
                    format: VertexFormat::Unorm8x4,
                },
                // uv
                VertexAttribute {
                    offset: 16,
                    shader_location: 2,
                    format: VertexFormat::Float32x2,
                },
            ],
        }
    }
}

/// Four vertices forming one textured rectangle.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Quad {
    pub vertices: [QuadVertex; 4],
}

impl Quad {
    pub const TOP_LEFT: usize = 0;
    pub const BOTTOM_LEFT: usize = 1;
    pub const TOP_RIGHT: usize = 2;
    pub const BOTTOM_RIGHT: usize = 3;

    /// Flat `[x, y, z]` positions of the four vertices.
    pub fn positions(&self) -> [f32; 12] {
        let mut out = [0.0; 12];
        for (i, v) in self.vertices.iter().enumerate() {
            out[i * 3..i * 3 + 3].copy_from_slice(&v.position);
        }
        out
    }

    pub fn set_positions(&mut self, positions: &[f32; 12]) {
        for (i, v) in self.vertices.iter_mut().enumerate() {
            v.position.copy_from_slice(&positions[i * 3..i * 3 + 3]);
        }
    }

    /// Position of a single vertex.
    pub fn position(&self, vertex: usize) -> [f32; 3] {
        self.vertices[vertex].position
    }

    pub fn colors(&self) -> [Color4B; 4] {
        self.vertices.map(|v| Color4B::from(v.color))
    }

    pub fn set_colors(&mut self, colors: &[Color4B; 4]) {
        for (v, c) in self.vertices.iter_mut().zip(colors) {
            v.color = c.to_array();
        }
    }

    /// Flat normalized `[r, g, b, a]` colors of the four vertices.
    pub fn colors_f32(&self) -> [f32; 16] {
        let mut out = [0.0; 16];
        for (i, c) in self.colors().iter().enumerate() {
            out[i * 4..i * 4 + 4].copy_from_slice(&c.to_f32());
        }
        out
    }

    /// Flat `[u, v]` texture coordinates of the four vertices.
    pub fn tex_coords(&self) -> [f32; 8] {
        let mut out = [0.0; 8];
        for (i, v) in self.vertices.iter().enumerate() {
            out[i * 2..i * 2 + 2].copy_from_slice(&v.uv);
        }
        out
    }

    pub fn set_tex_coords(&mut self, tex_coords: &[f32; 8]) {
        for (i, v) in self.vertices.iter_mut().enumerate() {
            v.uv.copy_from_slice(&tex_coords[i * 2..i * 2 + 2]);
        }
    }
}
