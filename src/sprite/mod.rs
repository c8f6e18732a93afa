//! Sprite state: texture binding, color, UVs, render mode and dirty flags.
//!
//! A [`Sprite`] lives inside a scene node. Operations that depend on the
//! node's geometry (content size, anchor) take the node's
//! [`NodeState`](crate::scene::NodeState); operations that may write to a
//! shared atlas take the sprite's resolved [`QuadBuffer`], if any. Most
//! callers go through [`Scene`](crate::scene::Scene), which resolves both.
//!
//! ## Render modes
//!
//! - **Self render** (initial): the sprite keeps a private quad in local
//!   coordinates and issues its own draw call.
//! - **Batch render**: the quad lives in the atlas of the owning sprite
//!   sheet at `atlas_index`; the sheet issues one draw call for all of its
//!   sprites. Texture binding and blending belong to the sheet in this mode.

mod color;
pub mod frame;
mod texture_rect;

use std::collections::HashMap;

use bitflags::bitflags;

use crate::blend::BlendFunc;
use crate::config::RenderConfig;
use crate::renderer::{AtlasHandle, Quad};
use crate::scene::{NodeId, NodeState};
use crate::texture::TextureRef;
use crate::transform::AffineTransform;
use crate::types::{Color3B, Point, Rect};

use self::frame::Animation;

bitflags! {
    /// Which of a parent's transform components a batched sprite inherits.
    ///
    /// The mask declared on a sprite filters the contribution of its
    /// parent when a batched transform chain is composed.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct HonorTransform: u8 {
        /// Translate with the parent
        const TRANSLATE = 1 << 0;
        /// Rotate with the parent
        const ROTATE    = 1 << 1;
        /// Scale with the parent
        const SCALE     = 1 << 2;
        const ALL = Self::TRANSLATE.bits() | Self::ROTATE.bits() | Self::SCALE.bits();
    }
}

impl Default for HonorTransform {
    fn default() -> Self {
        Self::ALL
    }
}

/// How a sprite's quad reaches the screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderMode {
    SelfRender,
    /// Quad stored in a sheet's atlas. Both handles are non-owning and only
    /// valid while the sheet exists.
    BatchRender { sheet: NodeId, atlas: AtlasHandle },
}

#[derive(Debug)]
pub struct Sprite {
    texture: Option<TextureRef>,
    /// Texture pixels currently displayed
    rect: Rect,
    /// Offset of the quad inside the content box (trimmed frames, flips)
    offset_position: Point,
    /// Frame offset from the content center, before flipping
    unflipped_offset_from_center: Point,
    flip_x: bool,
    flip_y: bool,

    color: Color3B,
    color_unmodified: Color3B,
    opacity: u8,
    opacity_modify_rgb: bool,
    blend_func: BlendFunc,

    honor_parent_transform: HonorTransform,
    render_mode: RenderMode,
    atlas_index: Option<usize>,

    dirty: bool,
    recursive_dirty: bool,
    has_children: bool,

    /// Local vertices (self render), vertex colors and UVs
    quad: Quad,

    animations: Option<HashMap<String, Animation>>,
}

impl Sprite {
    /// Create an untextured, self-rendered sprite and center the node's
    /// anchor point.
    pub fn new(state: &mut NodeState, config: &RenderConfig) -> Self {
        let mut sprite = Self {
            texture: None,
            rect: Rect::new(0.0, 0.0, 1.0, 1.0),
            offset_position: Point::ZERO,
            unflipped_offset_from_center: Point::ZERO,
            flip_x: false,
            flip_y: false,
            color: Color3B::WHITE,
            color_unmodified: Color3B::WHITE,
            opacity: 255,
            opacity_modify_rgb: true,
            blend_func: config.default_blend,
            honor_parent_transform: HonorTransform::ALL,
            render_mode: RenderMode::SelfRender,
            atlas_index: None,
            dirty: false,
            recursive_dirty: false,
            has_children: false,
            quad: Quad::default(),
            animations: None,
        };

        sprite.use_self_render();
        // No texture yet: straight alpha, no premultiplication of the color
        sprite.update_blend_func(config);
        state.set_anchor_point(Point::new(0.5, 0.5));
        sprite.set_texture_rect(Rect::default(), state);
        sprite
    }

    pub fn texture(&self) -> Option<&TextureRef> {
        self.texture.as_ref()
    }

    /// Bind a new texture and re-derive blending from its alpha format.
    ///
    /// # Panics
    ///
    /// Panics if the sprite is batch-rendered: the sheet owns the texture.
    pub fn set_texture(&mut self, texture: Option<TextureRef>, config: &RenderConfig) {
        assert!(
            !self.is_batch_rendered(),
            "Sprite::set_texture is not supported while the sprite is batch-rendered by a sprite sheet"
        );
        self.texture = texture;
        self.update_blend_func(config);
    }

    pub fn texture_rect(&self) -> Rect {
        self.rect
    }

    pub fn offset_position(&self) -> Point {
        self.offset_position
    }

    pub fn flip_x(&self) -> bool {
        self.flip_x
    }

    pub fn flip_y(&self) -> bool {
        self.flip_y
    }

    pub fn honor_parent_transform(&self) -> HonorTransform {
        self.honor_parent_transform
    }

    pub fn set_honor_parent_transform(&mut self, honor: HonorTransform) {
        self.honor_parent_transform = honor;
    }

    /// The sprite's private quad: local vertices in self render, and the
    /// current vertex colors and UVs in both modes.
    pub fn quad(&self) -> &Quad {
        &self.quad
    }

    // ---- render mode ----

    pub fn render_mode(&self) -> RenderMode {
        self.render_mode
    }

    pub fn is_batch_rendered(&self) -> bool {
        matches!(self.render_mode, RenderMode::BatchRender { .. })
    }

    pub fn sheet(&self) -> Option<NodeId> {
        match self.render_mode {
            RenderMode::BatchRender { sheet, .. } => Some(sheet),
            RenderMode::SelfRender => None,
        }
    }

    pub fn atlas_handle(&self) -> Option<AtlasHandle> {
        match self.render_mode {
            RenderMode::BatchRender { atlas, .. } => Some(atlas),
            RenderMode::SelfRender => None,
        }
    }

    /// Slot in the sheet's atlas; `None` until the sheet places the sprite.
    pub fn atlas_index(&self) -> Option<usize> {
        self.atlas_index
    }

    pub(crate) fn set_atlas_index(&mut self, index: Option<usize>) {
        self.atlas_index = index;
    }

    /// Switch to self render: drop any atlas slot and sheet reference,
    /// clear the dirty flags and rebuild the private quad.
    pub fn use_self_render(&mut self) {
        if self.is_batch_rendered() {
            log::debug!("Sprite leaving batch render (atlas index {:?})", self.atlas_index);
        }
        self.atlas_index = None;
        self.render_mode = RenderMode::SelfRender;
        self.dirty = false;
        self.recursive_dirty = false;
        self.rebuild_local_vertices();
    }

    /// Switch to batch render inside `sheet`. The atlas index is assigned
    /// separately by the sheet.
    pub fn use_batch_render(&mut self, sheet: NodeId, atlas: AtlasHandle) {
        log::debug!("Sprite entering batch render for sheet {:?}", sheet);
        self.render_mode = RenderMode::BatchRender { sheet, atlas };
    }

    // ---- dirty tracking ----

    /// Whether the sprite's atlas slot must be rewritten before the next draw.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Whether the whole subtree below this sprite is already known dirty.
    pub fn is_recursive_dirty(&self) -> bool {
        self.recursive_dirty
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn mark_dirty_recursive_flags(&mut self) {
        self.dirty = true;
        self.recursive_dirty = true;
    }

    pub(crate) fn clear_dirty(&mut self) {
        self.dirty = false;
        self.recursive_dirty = false;
    }

    pub fn has_children(&self) -> bool {
        self.has_children
    }

    pub(crate) fn set_has_children(&mut self, has_children: bool) {
        self.has_children = has_children;
    }

    // ---- geometry ----

    /// The four quad corners of the local rect mapped through `matrix`,
    /// as flat `[x, y, z]` triples in quad vertex order.
    pub fn transformed_vertices(&self, matrix: &AffineTransform, z: f32) -> [f32; 12] {
        let x1 = self.offset_position.x;
        let y1 = self.offset_position.y;
        let x2 = x1 + self.rect.width;
        let y2 = y1 + self.rect.height;

        let (dx, dy) = matrix.transform_point(x1, y2);
        let (ax, ay) = matrix.transform_point(x1, y1);
        let (cx, cy) = matrix.transform_point(x2, y2);
        let (bx, by) = matrix.transform_point(x2, y1);

        [dx, dy, z, ax, ay, z, cx, cy, z, bx, by, z]
    }

    /// Rebuild the private quad's vertices from offset and rect, at z = 0.
    fn rebuild_local_vertices(&mut self) {
        let vertices = self.transformed_vertices(&AffineTransform::IDENTITY, 0.0);
        self.quad.set_positions(&vertices);
    }

    // ---- animations ----

    pub fn add_animation(&mut self, animation: Animation) {
        self.animations
            .get_or_insert_with(HashMap::new)
            .insert(animation.name().to_string(), animation);
    }

    pub fn animation_by_name(&self, name: &str) -> Option<&Animation> {
        self.animations.as_ref().and_then(|a| a.get(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::AtlasStore;
    use crate::renderer::TextureAtlas;
    use crate::scene::Scene;
    use crate::texture::Texture;

    fn new_sprite() -> (Sprite, NodeState) {
        let mut state = NodeState::default();
        let sprite = Sprite::new(&mut state, &RenderConfig::default());
        (sprite, state)
    }

    #[test]
    fn test_new_sprite_defaults() {
        let (sprite, state) = new_sprite();
        assert_eq!(sprite.render_mode(), RenderMode::SelfRender);
        assert_eq!(sprite.atlas_index(), None);
        assert!(!sprite.is_dirty());
        assert!(!sprite.does_opacity_modify_rgb());
        assert_eq!(sprite.blend_func(), BlendFunc::STRAIGHT_ALPHA);
        assert_eq!(sprite.honor_parent_transform(), HonorTransform::ALL);
        assert_eq!(state.anchor_point(), Point::new(0.5, 0.5));
        assert_eq!(sprite.texture_rect(), Rect::default());
    }

    #[test]
    fn test_mode_switch_clears_batch_state() {
        let (mut sprite, _) = new_sprite();
        let mut scene = Scene::new();
        let sheet = scene.create_node();
        let mut atlases = AtlasStore::new();
        let atlas = atlases.insert(TextureAtlas::new(Texture::shared(8, 8, true), 1));

        sprite.use_batch_render(sheet, atlas);
        sprite.set_atlas_index(Some(3));
        sprite.mark_dirty_recursive_flags();
        assert_eq!(sprite.sheet(), Some(sheet));
        assert_eq!(sprite.atlas_handle(), Some(atlas));

        sprite.use_self_render();
        assert_eq!(sprite.render_mode(), RenderMode::SelfRender);
        assert_eq!(sprite.atlas_index(), None);
        assert!(!sprite.is_dirty());
        assert!(!sprite.is_recursive_dirty());
    }

    #[test]
    #[should_panic(expected = "batch-rendered")]
    fn test_set_texture_while_batched_panics() {
        let (mut sprite, _) = new_sprite();
        let mut scene = Scene::new();
        let sheet = scene.create_node();
        let mut atlases = AtlasStore::new();
        let atlas = atlases.insert(TextureAtlas::new(Texture::shared(8, 8, true), 1));

        sprite.use_batch_render(sheet, atlas);
        sprite.set_texture(Some(Texture::shared(8, 8, true)), &RenderConfig::default());
    }

    #[test]
    fn test_honor_mask_bits() {
        let mask = HonorTransform::ALL - HonorTransform::ROTATE;
        assert!(mask.contains(HonorTransform::TRANSLATE));
        assert!(!mask.contains(HonorTransform::ROTATE));
        assert!(mask.contains(HonorTransform::SCALE));
        assert_eq!(HonorTransform::default(), HonorTransform::ALL);
    }
}
