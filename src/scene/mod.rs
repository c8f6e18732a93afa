//! Arena-based scene storage for sprites, sprite sheets and plain nodes.
//!
//! The Scene owns every node using a sparse-set architecture with
//! generational indices, plus the [`AtlasStore`] holding each sprite
//! sheet's quad atlas.
//!
//! ## Key Features
//!
//! - **Generational Indices**: NodeId contains index + generation, so a
//!   stale id never resolves to a node allocated later in the same slot.
//!
//! - **Dense Storage**: Nodes stored contiguously, with swap-remove on
//!   destruction.
//!
//! - **Non-owning links**: parents, children and a batched sprite's sheet
//!   and atlas are ids/handles resolved through the scene at use time.
//!
//! - **Dirty hooks**: every setter that affects a node's transform marks
//!   batched sprites (and their subtrees) dirty, so the owning sheet
//!   recomputes exactly the stale quads before drawing.

mod dirty;
mod draw;
mod hierarchy;
mod node;
mod sheet;
mod update;

pub use node::{NodeKind, NodeState};
pub use sheet::SpriteSheet;

use crate::blend::BlendFunc;
use crate::config::RenderConfig;
use crate::error::{Result, SpriteError};
use crate::renderer::{AtlasHandle, AtlasStore, QuadBuffer, TextureAtlas};
use crate::sprite::frame::{Animation, FrameLookup, SpriteFrame};
use crate::sprite::{HonorTransform, Sprite};
use crate::texture::TextureRef;
use crate::types::{Color3B, Point, Rect, Size};

use node::Node;

/// Unique identifier for a node in the scene.
///
/// Uses a generational index design:
/// - `index`: Position in the sparse array (reusable after removal)
/// - `generation`: Version counter that increments when a slot is reused
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Convert to a u64 for external use.
    /// Combines generation (high bits) with index (low bits).
    pub fn as_u64(self) -> u64 {
        ((self.generation as u64) << 32) | (self.index as u64)
    }
}

/// Entry in the sparse map. Keeps its generation after the node is removed
/// so the next allocation of the slot gets a fresh one.
struct SparseEntry {
    /// Index into the dense array, `None` while the slot is free
    dense_index: Option<usize>,
    generation: u32,
}

pub struct Scene {
    /// Dense array of nodes
    dense: Vec<Node>,
    /// Sparse map from index to dense position + generation
    sparse: Vec<SparseEntry>,
    /// Free list of reusable sparse indices
    free_indices: Vec<u32>,
    atlases: AtlasStore,
    config: RenderConfig,
}

impl Scene {
    pub fn new() -> Self {
        Self::with_config(RenderConfig::default())
    }

    pub fn with_config(config: RenderConfig) -> Self {
        Self {
            dense: Vec::new(),
            sparse: Vec::new(),
            free_indices: Vec::new(),
            atlases: AtlasStore::new(),
            config,
        }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    // ---- arena ----

    fn register(&mut self, state: NodeState, kind: NodeKind) -> NodeId {
        // Allocate a sparse index (reuse from free list or allocate new)
        let (sparse_index, generation) = if let Some(idx) = self.free_indices.pop() {
            let entry = &mut self.sparse[idx as usize];
            entry.generation = entry.generation.wrapping_add(1);
            (idx, entry.generation)
        } else {
            let idx = self.sparse.len() as u32;
            self.sparse.push(SparseEntry {
                dense_index: None,
                generation: 0,
            });
            (idx, 0)
        };

        self.sparse[sparse_index as usize].dense_index = Some(self.dense.len());
        self.dense.push(Node {
            state,
            kind,
            parent: None,
            children: Vec::new(),
            sparse_index,
        });

        NodeId::new(sparse_index, generation)
    }

    /// Drop a single node from the arena. Links to it must already be gone.
    fn unregister(&mut self, id: NodeId) {
        let Some(dense_index) = self.dense_index(id) else {
            return;
        };

        let last_dense_index = self.dense.len() - 1;
        let removed = self.dense.swap_remove(dense_index);

        // Fix up the moved node's sparse entry
        if dense_index != last_dense_index {
            let moved_sparse_idx = self.dense[dense_index].sparse_index;
            self.sparse[moved_sparse_idx as usize].dense_index = Some(dense_index);
        }

        self.sparse[id.index as usize].dense_index = None;
        self.free_indices.push(id.index);

        if let NodeKind::Sheet(sheet) = &removed.kind {
            self.atlases.remove(sheet.atlas_handle());
            log::debug!("Destroyed sprite sheet {:?} and its atlas", id);
        }
    }

    /// Get the dense array index for a NodeId, validating generation.
    fn dense_index(&self, id: NodeId) -> Option<usize> {
        self.sparse
            .get(id.index as usize)
            .filter(|e| e.generation == id.generation)
            .and_then(|e| e.dense_index)
    }

    fn get_node(&self, id: NodeId) -> Option<&Node> {
        self.dense_index(id).map(|idx| &self.dense[idx])
    }

    pub(crate) fn node(&self, id: NodeId) -> &Node {
        self.get_node(id)
            .unwrap_or_else(|| panic!("node {:?} is not in the scene", id))
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        let idx = self
            .dense_index(id)
            .unwrap_or_else(|| panic!("node {:?} is not in the scene", id));
        &mut self.dense[idx]
    }

    pub(crate) fn sprite_mut(&mut self, id: NodeId) -> &mut Sprite {
        self.node_mut(id)
            .kind
            .as_sprite_mut()
            .unwrap_or_else(|| panic!("node {:?} is not a sprite", id))
    }

    /// Run `f` with a sprite, its node state, its resolved atlas (batched
    /// sprites only) and the scene config.
    fn with_sprite_mut<R>(
        &mut self,
        id: NodeId,
        f: impl FnOnce(&mut Sprite, &mut NodeState, Option<&mut dyn QuadBuffer>, &RenderConfig) -> R,
    ) -> R {
        let idx = self
            .dense_index(id)
            .unwrap_or_else(|| panic!("node {:?} is not in the scene", id));
        let Scene {
            dense,
            atlases,
            config,
            ..
        } = self;
        let Node { state, kind, .. } = &mut dense[idx];
        let sprite = kind
            .as_sprite_mut()
            .unwrap_or_else(|| panic!("node {:?} is not a sprite", id));
        let atlas = sprite
            .atlas_handle()
            .and_then(|handle| atlases.get_mut(handle))
            .map(|atlas| atlas as &mut dyn QuadBuffer);
        f(sprite, state, atlas, config)
    }

    // ---- creation ----

    /// Create a plain grouping node.
    pub fn create_node(&mut self) -> NodeId {
        self.register(NodeState::default(), NodeKind::Node)
    }

    /// Create an untextured sprite with an empty rect.
    pub fn create_empty_sprite(&mut self) -> NodeId {
        let mut state = NodeState::default();
        let sprite = Sprite::new(&mut state, &self.config);
        self.register(state, NodeKind::Sprite(Box::new(sprite)))
    }

    /// Create a sprite showing the whole content of `texture`.
    pub fn create_sprite(&mut self, texture: TextureRef) -> NodeId {
        let rect = Rect::from_size(texture.content_size());
        self.create_sprite_with_rect(texture, rect)
    }

    /// Create a sprite showing `rect` of `texture`.
    pub fn create_sprite_with_rect(&mut self, texture: TextureRef, rect: Rect) -> NodeId {
        let mut state = NodeState::default();
        let mut sprite = Sprite::new(&mut state, &self.config);
        sprite.set_texture(Some(texture), &self.config);
        sprite.set_texture_rect(rect, &mut state);
        self.register(state, NodeKind::Sprite(Box::new(sprite)))
    }

    pub fn create_sprite_with_frame(&mut self, frame: &SpriteFrame) -> NodeId {
        let id = self.create_sprite_with_rect(frame.texture.clone(), frame.rect);
        self.set_display_frame(id, frame);
        id
    }

    /// Create a sprite from a frame looked up by name.
    pub fn create_sprite_with_frame_name(
        &mut self,
        frames: &impl FrameLookup,
        name: &str,
    ) -> Result<NodeId> {
        let frame = frames
            .sprite_frame(name)
            .ok_or_else(|| SpriteError::FrameNotFound(name.to_string()))?;
        Ok(self.create_sprite_with_frame(&frame))
    }

    /// Create a sprite using `sheet`'s texture, already in batch render.
    ///
    /// The sprite gets its atlas slot when it is added as a child of the
    /// sheet (or of one of the sheet's sprites).
    pub fn create_sprite_in_sheet(&mut self, sheet: NodeId, rect: Rect) -> NodeId {
        let sheet_data = self
            .sheet(sheet)
            .unwrap_or_else(|| panic!("node {:?} is not a sprite sheet", sheet));
        let texture = sheet_data.texture().clone();
        let atlas = sheet_data.atlas_handle();

        let id = self.create_sprite_with_rect(texture, rect);
        self.sprite_mut(id).use_batch_render(sheet, atlas);
        id
    }

    // ---- queries ----

    pub fn contains(&self, id: NodeId) -> bool {
        self.dense_index(id).is_some()
    }

    pub fn node_count(&self) -> usize {
        self.dense.len()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get_node(id).and_then(|n| n.parent)
    }

    /// Children ordered by z order.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get_node(id)
            .map(|n| n.children.as_slice())
            .unwrap_or_default()
    }

    pub fn state(&self, id: NodeId) -> Option<&NodeState> {
        self.get_node(id).map(|n| &n.state)
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.get_node(id).map(|n| &n.kind)
    }

    pub fn sprite(&self, id: NodeId) -> Option<&Sprite> {
        self.get_node(id).and_then(|n| n.kind.as_sprite())
    }

    pub fn sheet(&self, id: NodeId) -> Option<&SpriteSheet> {
        self.get_node(id).and_then(|n| n.kind.as_sheet())
    }

    pub fn atlas(&self, handle: AtlasHandle) -> Option<&TextureAtlas> {
        self.atlases.get(handle)
    }

    /// The atlas owned by `sheet`.
    pub fn sheet_atlas(&self, sheet: NodeId) -> Option<&TextureAtlas> {
        self.sheet(sheet)
            .and_then(|s| self.atlases.get(s.atlas_handle()))
    }

    // ---- transform state ----

    pub fn set_position(&mut self, id: NodeId, position: Point) {
        self.node_mut(id).state.set_position(position);
        self.mark_dirty_recursive(id);
    }

    /// Rotation in degrees, clockwise-positive.
    pub fn set_rotation(&mut self, id: NodeId, degrees: f32) {
        self.node_mut(id).state.set_rotation(degrees);
        self.mark_dirty_recursive(id);
    }

    pub fn set_scale(&mut self, id: NodeId, scale: f32) {
        self.node_mut(id).state.set_scale(scale);
        self.mark_dirty_recursive(id);
    }

    pub fn set_scale_x(&mut self, id: NodeId, scale_x: f32) {
        self.node_mut(id).state.set_scale_x(scale_x);
        self.mark_dirty_recursive(id);
    }

    pub fn set_scale_y(&mut self, id: NodeId, scale_y: f32) {
        self.node_mut(id).state.set_scale_y(scale_y);
        self.mark_dirty_recursive(id);
    }

    pub fn set_anchor_point(&mut self, id: NodeId, anchor: Point) {
        self.node_mut(id).state.set_anchor_point(anchor);
        self.mark_dirty_recursive(id);
    }

    pub fn set_vertex_z(&mut self, id: NodeId, z: f32) {
        self.node_mut(id).state.set_vertex_z(z);
        self.mark_dirty_recursive(id);
    }

    /// Plain nodes only carry a content size for anchoring; sprites derive
    /// theirs from the texture rect.
    pub fn set_content_size(&mut self, id: NodeId, size: Size) {
        assert!(
            self.sprite(id).is_none(),
            "the content size of sprite {:?} follows its texture rect",
            id
        );
        self.node_mut(id).state.set_content_size(size);
    }

    pub fn set_tag(&mut self, id: NodeId, tag: i32) {
        self.node_mut(id).state.set_tag(Some(tag));
    }

    // ---- sprite properties ----

    pub fn set_color(&mut self, id: NodeId, color: Color3B) {
        self.with_sprite_mut(id, |sprite, _, atlas, _| sprite.set_color(color, atlas));
    }

    pub fn set_opacity(&mut self, id: NodeId, opacity: u8) {
        self.with_sprite_mut(id, |sprite, _, atlas, _| sprite.set_opacity(opacity, atlas));
    }

    pub fn set_opacity_modify_rgb(&mut self, id: NodeId, modify: bool) {
        self.with_sprite_mut(id, |sprite, _, atlas, _| {
            sprite.set_opacity_modify_rgb(modify, atlas)
        });
    }

    /// # Panics
    ///
    /// Panics if the sprite is batch-rendered.
    pub fn set_texture(&mut self, id: NodeId, texture: TextureRef) {
        self.with_sprite_mut(id, |sprite, _, _, config| {
            sprite.set_texture(Some(texture), config)
        });
    }

    pub fn update_blend_func(&mut self, id: NodeId) {
        self.with_sprite_mut(id, |sprite, _, _, config| sprite.update_blend_func(config));
    }

    pub fn set_blend_func(&mut self, id: NodeId, blend_func: BlendFunc) {
        self.with_sprite_mut(id, |sprite, _, _, _| sprite.set_blend_func(blend_func));
    }

    pub fn set_texture_rect(&mut self, id: NodeId, rect: Rect) {
        self.with_sprite_mut(id, |sprite, state, _, _| sprite.set_texture_rect(rect, state));
    }

    pub fn set_texture_rect_with_size(&mut self, id: NodeId, rect: Rect, size: Size) {
        self.with_sprite_mut(id, |sprite, state, _, _| {
            sprite.set_texture_rect_with_size(rect, size, state)
        });
    }

    pub fn set_flip_x(&mut self, id: NodeId, flip: bool) {
        self.with_sprite_mut(id, |sprite, state, _, _| sprite.set_flip_x(flip, state));
    }

    pub fn set_flip_y(&mut self, id: NodeId, flip: bool) {
        self.with_sprite_mut(id, |sprite, state, _, _| sprite.set_flip_y(flip, state));
    }

    pub fn set_honor_parent_transform(&mut self, id: NodeId, honor: HonorTransform) {
        self.with_sprite_mut(id, |sprite, _, _, _| sprite.set_honor_parent_transform(honor));
    }

    pub fn set_display_frame(&mut self, id: NodeId, frame: &SpriteFrame) {
        self.with_sprite_mut(id, |sprite, state, _, config| {
            sprite.set_display_frame(frame, state, config)
        });
    }

    pub fn set_display_frame_by_name(
        &mut self,
        id: NodeId,
        animation: &str,
        index: usize,
    ) -> Result<()> {
        self.with_sprite_mut(id, |sprite, state, _, config| {
            sprite.set_display_frame_by_name(animation, index, state, config)
        })
    }

    pub fn add_animation(&mut self, id: NodeId, animation: Animation) {
        self.with_sprite_mut(id, |sprite, _, _, _| sprite.add_animation(animation));
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}
