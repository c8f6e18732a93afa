//! Blend factors for sprites and sheets.

use wgpu::{BlendComponent, BlendFactor, BlendOperation, BlendState};

use crate::config::RenderConfig;
use crate::texture::Texture;

/// Source/destination blend factors used for a draw call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlendFunc {
    pub src: BlendFactor,
    pub dst: BlendFactor,
}

impl BlendFunc {
    /// Blending for textures whose color channels are premultiplied by alpha.
    pub const PREMULTIPLIED: BlendFunc = BlendFunc::new(BlendFactor::One, BlendFactor::OneMinusSrcAlpha);

    /// Blending for straight (non-premultiplied) alpha.
    pub const STRAIGHT_ALPHA: BlendFunc =
        BlendFunc::new(BlendFactor::SrcAlpha, BlendFactor::OneMinusSrcAlpha);

    pub const fn new(src: BlendFactor, dst: BlendFactor) -> Self {
        Self { src, dst }
    }

    /// Blend function matching a texture's alpha format.
    ///
    /// Untextured content and straight-alpha textures get
    /// [`BlendFunc::STRAIGHT_ALPHA`]; premultiplied textures get the
    /// configured default.
    pub fn for_texture(texture: Option<&Texture>, config: &RenderConfig) -> Self {
        match texture {
            Some(t) if t.has_premultiplied_alpha() => config.default_blend,
            _ => Self::STRAIGHT_ALPHA,
        }
    }

    /// The equivalent wgpu blend state (same factors for color and alpha).
    pub fn to_blend_state(self) -> BlendState {
        let component = BlendComponent {
            src_factor: self.src,
            dst_factor: self.dst,
            operation: BlendOperation::Add,
        };
        BlendState {
            color: component,
            alpha: component,
        }
    }
}

impl Default for BlendFunc {
    fn default() -> Self {
        Self::PREMULTIPLIED
    }
}
