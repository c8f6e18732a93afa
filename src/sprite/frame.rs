//! Sprite frames, animations and named frame lookup.

use std::collections::HashMap;

use crate::config::RenderConfig;
use crate::error::{Result, SpriteError};
use crate::scene::NodeState;
use crate::texture::TextureRef;
use crate::types::{Point, Rect, Size};

use super::Sprite;

/// A region of a texture displayable by a sprite.
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteFrame {
    pub texture: TextureRef,
    /// Pixels of the texture to display
    pub rect: Rect,
    /// Offset of the trimmed rect's center from the original image's center
    pub offset: Point,
    /// Size of the image before trimming
    pub original_size: Size,
}

impl SpriteFrame {
    /// An untrimmed frame.
    pub fn new(texture: TextureRef, rect: Rect) -> Self {
        Self {
            texture,
            rect,
            offset: Point::ZERO,
            original_size: rect.size(),
        }
    }

    /// A frame trimmed by an editor.
    pub fn trimmed(texture: TextureRef, rect: Rect, offset: Point, original_size: Size) -> Self {
        Self {
            texture,
            rect,
            offset,
            original_size,
        }
    }
}

/// A named sequence of frames.
#[derive(Debug, Clone)]
pub struct Animation {
    name: String,
    /// Seconds between frames
    delay: f32,
    frames: Vec<SpriteFrame>,
}

impl Animation {
    pub fn new(name: impl Into<String>, delay: f32, frames: Vec<SpriteFrame>) -> Self {
        Self {
            name: name.into(),
            delay,
            frames,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn delay(&self) -> f32 {
        self.delay
    }

    pub fn frames(&self) -> &[SpriteFrame] {
        &self.frames
    }

    pub fn add_frame(&mut self, frame: SpriteFrame) {
        self.frames.push(frame);
    }

    pub fn frame(&self, index: usize) -> Result<&SpriteFrame> {
        self.frames
            .get(index)
            .ok_or_else(|| SpriteError::FrameIndexOutOfRange {
                animation: self.name.clone(),
                index,
                len: self.frames.len(),
            })
    }
}

/// Source of sprite frames by name.
pub trait FrameLookup {
    fn sprite_frame(&self, name: &str) -> Option<SpriteFrame>;
}

/// In-memory frame registry.
#[derive(Debug, Default)]
pub struct SpriteFrameCache {
    frames: HashMap<String, SpriteFrame>,
}

impl SpriteFrameCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_frame(&mut self, name: impl Into<String>, frame: SpriteFrame) {
        self.frames.insert(name.into(), frame);
    }

    pub fn remove_frame(&mut self, name: &str) -> Option<SpriteFrame> {
        self.frames.remove(name)
    }

    pub fn frame(&self, name: &str) -> Option<&SpriteFrame> {
        self.frames.get(name)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }
}

impl FrameLookup for SpriteFrameCache {
    fn sprite_frame(&self, name: &str) -> Option<SpriteFrame> {
        self.frames.get(name).cloned()
    }
}

impl Sprite {
    /// Display `frame`, switching texture first if it is a different one.
    ///
    /// # Panics
    ///
    /// Panics when the frame's texture differs from the bound one while the
    /// sprite is batch-rendered.
    pub fn set_display_frame(
        &mut self,
        frame: &SpriteFrame,
        state: &mut NodeState,
        config: &RenderConfig,
    ) {
        self.set_unflipped_offset_from_center(frame.offset);

        let same_texture = self
            .texture()
            .is_some_and(|t| t.id() == frame.texture.id());
        if !same_texture {
            self.set_texture(Some(frame.texture.clone()), config);
        }

        self.set_texture_rect_with_size(frame.rect, frame.original_size, state);
    }

    /// Display frame `index` of the animation registered as `animation`.
    pub fn set_display_frame_by_name(
        &mut self,
        animation: &str,
        index: usize,
        state: &mut NodeState,
        config: &RenderConfig,
    ) -> Result<()> {
        let frame = self
            .animation_by_name(animation)
            .ok_or_else(|| SpriteError::AnimationNotFound(animation.to_string()))?
            .frame(index)?
            .clone();
        self.set_display_frame(&frame, state, config);
        Ok(())
    }

    /// Whether `frame` is the one currently displayed.
    pub fn is_frame_displayed(&self, frame: &SpriteFrame) -> bool {
        self.texture_rect() == frame.rect
            && self.texture().is_some_and(|t| t.id() == frame.texture.id())
            && self.unflipped_offset_from_center() == frame.offset
    }

    /// The frame currently displayed, if a texture is bound.
    pub fn displayed_frame(&self, content_size: Size) -> Option<SpriteFrame> {
        self.texture().map(|texture| {
            SpriteFrame::trimmed(
                texture.clone(),
                self.texture_rect(),
                self.unflipped_offset_from_center(),
                content_size,
            )
        })
    }
}
