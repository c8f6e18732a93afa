//! Sprite sheets: one texture, one atlas, one draw call for all descendants.
//!
//! The atlas stores quads in the sheet's draw order (depth first; children
//! with negative z before their parent, the rest after). `descendants`
//! mirrors the atlas so that `descendants[i]` is the sprite owning quad `i`.

use crate::blend::BlendFunc;
use crate::renderer::{AtlasHandle, QuadBuffer, RenderContext, TextureAtlas};
use crate::texture::TextureRef;

use super::{NodeId, NodeKind, NodeState, Scene};

#[derive(Debug)]
pub struct SpriteSheet {
    atlas: AtlasHandle,
    texture: TextureRef,
    blend_func: BlendFunc,
    /// Batched sprites in atlas order
    descendants: Vec<NodeId>,
}

impl SpriteSheet {
    pub fn atlas_handle(&self) -> AtlasHandle {
        self.atlas
    }

    pub fn texture(&self) -> &TextureRef {
        &self.texture
    }

    pub fn blend_func(&self) -> BlendFunc {
        self.blend_func
    }

    /// Every sprite batched by this sheet, in atlas order.
    pub fn descendants(&self) -> &[NodeId] {
        &self.descendants
    }
}

/// Draw-order traversal step.
enum Visit {
    Enter(NodeId),
    Emit(NodeId),
}

impl Scene {
    pub fn create_sprite_sheet(&mut self, texture: TextureRef) -> NodeId {
        let capacity = self.config.atlas_capacity;
        self.create_sprite_sheet_with_capacity(texture, capacity)
    }

    pub fn create_sprite_sheet_with_capacity(
        &mut self,
        texture: TextureRef,
        capacity: usize,
    ) -> NodeId {
        let blend_func = BlendFunc::for_texture(Some(&texture), &self.config);
        let atlas = self
            .atlases
            .insert(TextureAtlas::new(texture.clone(), capacity));

        let sheet = SpriteSheet {
            atlas,
            texture,
            blend_func,
            descendants: Vec::with_capacity(capacity),
        };
        let id = self.register(NodeState::default(), NodeKind::Sheet(sheet));
        log::debug!("Created sprite sheet {:?} (capacity {})", id, capacity);
        id
    }

    pub fn set_sheet_blend_func(&mut self, sheet: NodeId, blend_func: BlendFunc) {
        self.sheet_mut(sheet).blend_func = blend_func;
    }

    fn sheet_mut(&mut self, sheet: NodeId) -> &mut SpriteSheet {
        self.node_mut(sheet)
            .kind
            .as_sheet_mut()
            .unwrap_or_else(|| panic!("node {:?} is not a sprite sheet", sheet))
    }

    pub(crate) fn sheet_ref(&self, sheet: NodeId) -> &SpriteSheet {
        self.sheet(sheet)
            .unwrap_or_else(|| panic!("node {:?} is not a sprite sheet", sheet))
    }

    /// Atlas slot `child` should take: the number of sprites already placed
    /// before it in the sheet's draw order.
    pub(crate) fn atlas_index_for_child(&self, sheet: NodeId, child: NodeId) -> usize {
        let mut count = 0;
        let mut stack: Vec<Visit> = self
            .children(sheet)
            .iter()
            .rev()
            .map(|&id| Visit::Enter(id))
            .collect();

        while let Some(visit) = stack.pop() {
            match visit {
                Visit::Enter(id) => {
                    let node = self.node(id);
                    let split = node
                        .children
                        .iter()
                        .position(|&c| self.node(c).state.z_order() >= 0)
                        .unwrap_or(node.children.len());
                    let (behind, in_front) = node.children.split_at(split);

                    // Pushed in reverse so they pop in draw order
                    stack.extend(in_front.iter().rev().map(|&c| Visit::Enter(c)));
                    stack.push(Visit::Emit(id));
                    stack.extend(behind.iter().rev().map(|&c| Visit::Enter(c)));
                }
                Visit::Emit(id) => {
                    if id == child {
                        return count;
                    }
                    if self.sprite(id).is_some_and(|s| s.atlas_index().is_some()) {
                        count += 1;
                    }
                }
            }
        }

        count
    }

    /// Put `child` (and its sprite subtree) in the sheet's atlas, starting
    /// at slot `index`.
    pub(crate) fn insert_child(&mut self, sheet: NodeId, child: NodeId, index: usize) {
        let handle = self.sheet_ref(sheet).atlas_handle();

        let node = self.node_mut(child);
        let sprite = node.kind.as_sprite_mut().unwrap_or_else(|| {
            panic!(
                "sprite sheets only batch sprites, node {:?} is not a sprite",
                child
            )
        });
        sprite.use_batch_render(sheet, handle);
        sprite.set_atlas_index(Some(index));
        sprite.mark_dirty();
        let quad = *sprite.quad();
        let children = node.children.clone();

        self.atlases
            .get_mut(handle)
            .unwrap_or_else(|| panic!("sprite sheet {:?} has a stale atlas handle", sheet))
            .insert_quad(quad, index);
        self.sheet_mut(sheet).descendants.insert(index, child);
        self.reindex_descendants(sheet, index + 1);
        log::debug!("Inserted {:?} into sheet {:?} at atlas index {}", child, sheet, index);

        for grandchild in children {
            let index = self.atlas_index_for_child(sheet, grandchild);
            self.insert_child(sheet, grandchild, index);
        }
    }

    /// Take `child` and its sprite subtree out of the sheet's atlas and
    /// switch them back to self render.
    pub(crate) fn remove_sprite_from_atlas(&mut self, sheet: NodeId, child: NodeId) {
        let handle = self.sheet_ref(sheet).atlas_handle();

        if let Some(pos) = self
            .sheet_ref(sheet)
            .descendants
            .iter()
            .position(|&d| d == child)
        {
            if let Some(atlas) = self.atlases.get_mut(handle) {
                atlas.remove_quad(pos);
            }
            self.sheet_mut(sheet).descendants.remove(pos);
            self.reindex_descendants(sheet, pos);
            log::debug!("Removed {:?} from sheet {:?} (atlas index {})", child, sheet, pos);
        }

        let node = self.node_mut(child);
        let children = node.children.clone();
        if let Some(sprite) = node.kind.as_sprite_mut() {
            sprite.use_self_render();
        }

        for grandchild in children {
            if self.sprite(grandchild).is_some() {
                self.remove_sprite_from_atlas(sheet, grandchild);
            }
        }
    }

    fn reindex_descendants(&mut self, sheet: NodeId, from: usize) {
        let len = self.sheet_ref(sheet).descendants.len();
        for i in from..len {
            let id = self.sheet_ref(sheet).descendants[i];
            self.sprite_mut(id).set_atlas_index(Some(i));
        }
    }

    /// Recompute the quad of every dirty sprite in the sheet, in atlas order.
    pub fn update_sheet(&mut self, sheet: NodeId) {
        let len = self.sheet_ref(sheet).descendants.len();
        for i in 0..len {
            let id = self.sheet_ref(sheet).descendants[i];
            if self.sprite(id).is_some_and(|s| s.is_dirty()) {
                self.update_transform(id);
            }
        }
    }

    /// Draw every batched sprite of `sheet` with a single call.
    pub fn draw_sheet(&mut self, sheet: NodeId, ctx: &mut dyn RenderContext) {
        if !self.node(sheet).state.is_visible() {
            return;
        }

        self.update_sheet(sheet);

        let world = self.node_to_world_transform(sheet).unwrap_or_default();
        let sheet_data = self.sheet_ref(sheet);
        let atlas = self
            .atlases
            .get(sheet_data.atlas_handle())
            .unwrap_or_else(|| panic!("sprite sheet {:?} has a stale atlas handle", sheet));
        if atlas.total_quads() == 0 {
            return;
        }

        let default_blend = self.config.default_blend;
        let override_blend = sheet_data.blend_func != default_blend;
        if override_blend {
            ctx.set_blend_func(sheet_data.blend_func);
        }

        ctx.bind_texture(&sheet_data.texture);
        ctx.draw_quads(atlas.vertex_buffer(), &world);

        if override_blend {
            ctx.set_blend_func(default_blend);
        }
    }
}
