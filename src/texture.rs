//! Texture descriptors.
//!
//! Decoding and uploading pixels is someone else's job; sprites only need to
//! know a texture's dimensions, its alpha format and a stable identity to
//! tell two textures apart.

use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::types::Size;

/// Identity token of a texture.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct TextureId(u64);

static NEXT_TEXTURE_ID: AtomicU64 = AtomicU64::new(1);

impl TextureId {
    /// Generate a new unique texture ID
    pub fn next() -> Self {
        TextureId(NEXT_TEXTURE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// Shared, non-owning-by-convention handle to a texture.
pub type TextureRef = Rc<Texture>;

#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    id: TextureId,
    /// Allocated width in pixels (may be padded, e.g. to a power of two)
    pixels_wide: u32,
    /// Allocated height in pixels
    pixels_high: u32,
    /// Size of the meaningful image content
    content_size: Size,
    premultiplied_alpha: bool,
}

impl Texture {
    /// Describe a texture whose content fills the whole allocation.
    pub fn new(pixels_wide: u32, pixels_high: u32, premultiplied_alpha: bool) -> Self {
        Self::with_content_size(
            pixels_wide,
            pixels_high,
            Size::new(pixels_wide as f32, pixels_high as f32),
            premultiplied_alpha,
        )
    }

    /// Describe a padded texture whose content only covers `content_size`.
    pub fn with_content_size(
        pixels_wide: u32,
        pixels_high: u32,
        content_size: Size,
        premultiplied_alpha: bool,
    ) -> Self {
        Self {
            id: TextureId::next(),
            pixels_wide,
            pixels_high,
            content_size,
            premultiplied_alpha,
        }
    }

    /// Convenience for `Rc::new(Texture::new(..))`.
    pub fn shared(pixels_wide: u32, pixels_high: u32, premultiplied_alpha: bool) -> TextureRef {
        Rc::new(Self::new(pixels_wide, pixels_high, premultiplied_alpha))
    }

    pub fn id(&self) -> TextureId {
        self.id
    }

    pub fn pixels_wide(&self) -> u32 {
        self.pixels_wide
    }

    pub fn pixels_high(&self) -> u32 {
        self.pixels_high
    }

    pub fn content_size(&self) -> Size {
        self.content_size
    }

    pub fn has_premultiplied_alpha(&self) -> bool {
        self.premultiplied_alpha
    }
}
