//! Draw contract between sprites/sheets and a graphics backend.

use crate::blend::BlendFunc;
use crate::texture::{TextureId, TextureRef};
use crate::transform::AffineTransform;

use super::quad::Quad;

/// The graphics context a sprite or sheet draws into.
///
/// Implementations own all GPU state; this crate only decides what to bind
/// and which vertex data to submit.
pub trait RenderContext {
    fn bind_texture(&mut self, texture: &TextureRef);

    fn set_blend_func(&mut self, blend: BlendFunc);

    /// Draw four vertices as a triangle strip.
    fn draw_triangle_strip(
        &mut self,
        vertices: &[f32; 12],
        colors: &[f32; 16],
        tex_coords: &[f32; 8],
    );

    /// Draw a run of quads from a shared buffer in one call.
    ///
    /// Quad positions are in the sheet's space; `transform` maps them to world.
    fn draw_quads(&mut self, quads: &[Quad], transform: &AffineTransform);
}

/// A single recorded draw operation.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    BindTexture(TextureId),
    SetBlendFunc(BlendFunc),
    TriangleStrip {
        /// `[x, y, z]` per vertex, in quad vertex order
        vertices: [f32; 12],
        /// Normalized `[r, g, b, a]` per vertex
        colors: [f32; 16],
        /// `[u, v]` per vertex
        tex_coords: [f32; 8],
    },
    Quads {
        quads: Vec<Quad>,
        transform: AffineTransform,
    },
}

/// A [`RenderContext`] that records commands instead of executing them.
///
/// Useful for tests and for backends that want to replay a frame later.
#[derive(Debug, Default)]
pub struct CommandRecorder {
    pub commands: Vec<DrawCommand>,
}

impl CommandRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take all recorded commands (clears the list).
    pub fn take(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Number of recorded draw calls (strips and quad runs).
    pub fn draw_call_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::TriangleStrip { .. } | DrawCommand::Quads { .. }))
            .count()
    }
}

impl RenderContext for CommandRecorder {
    fn bind_texture(&mut self, texture: &TextureRef) {
        self.commands.push(DrawCommand::BindTexture(texture.id()));
    }

    fn set_blend_func(&mut self, blend: BlendFunc) {
        self.commands.push(DrawCommand::SetBlendFunc(blend));
    }

    fn draw_triangle_strip(
        &mut self,
        vertices: &[f32; 12],
        colors: &[f32; 16],
        tex_coords: &[f32; 8],
    ) {
        self.commands.push(DrawCommand::TriangleStrip {
            vertices: *vertices,
            colors: *colors,
            tex_coords: *tex_coords,
        });
    }

    fn draw_quads(&mut self, quads: &[Quad], transform: &AffineTransform) {
        self.commands.push(DrawCommand::Quads {
            quads: quads.to_vec(),
            transform: *transform,
        });
    }
}
