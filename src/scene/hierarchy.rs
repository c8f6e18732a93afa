//! Parent/child links, z ordering and node destruction.

use super::{NodeId, NodeKind, Scene};

impl Scene {
    /// Attach `child` under `parent` at z order `z`.
    ///
    /// Children are kept sorted by z; a child added with a z equal to an
    /// existing sibling's goes after it. When `parent` is a sprite sheet or
    /// a batch-rendered sprite, the child and its sprite subtree join the
    /// sheet's atlas.
    ///
    /// # Panics
    ///
    /// Panics if `child` already has a parent, or if a batching parent is
    /// given a node that is not a sprite or uses a different texture.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId, z: i32) {
        assert_ne!(parent, child, "a node cannot be its own child");
        assert!(
            self.node(child).parent.is_none(),
            "node {:?} already has a parent",
            child
        );

        // Sheet the child joins, and whether it takes a slot right away.
        // Under a batched parent that has no slot yet, the parent's own
        // insertion places the whole subtree later.
        let (batch_sheet, place_now) = match &self.node(parent).kind {
            NodeKind::Sheet(_) => (Some(parent), true),
            NodeKind::Sprite(sprite) => (sprite.sheet(), sprite.atlas_index().is_some()),
            NodeKind::Node => (None, false),
        };

        if let Some(sheet) = batch_sheet {
            assert!(
                self.sprite(child).is_some(),
                "batched parent {:?} only accepts sprites, node {:?} is not a sprite",
                parent,
                child
            );
            let sheet_texture = self.sheet_ref(sheet).texture().id();
            let same_texture = self
                .sprite(child)
                .and_then(|s| s.texture())
                .is_some_and(|t| t.id() == sheet_texture);
            assert!(
                same_texture,
                "sprite {:?} does not use the texture of sprite sheet {:?}",
                child,
                sheet
            );
        }

        self.attach(parent, child, z);

        if let Some(sprite) = self.node_mut(parent).kind.as_sprite_mut() {
            sprite.set_has_children(true);
        }

        if let (Some(sheet), true) = (batch_sheet, place_now) {
            let index = self.atlas_index_for_child(sheet, child);
            self.insert_child(sheet, child, index);
        }
    }

    pub fn add_child_with_tag(&mut self, parent: NodeId, child: NodeId, z: i32, tag: i32) {
        self.set_tag(child, tag);
        self.add_child(parent, child, z);
    }

    /// Detach `child` from its parent, taking it out of any atlas first.
    /// With `cleanup`, the child and its subtree are destroyed too.
    pub fn remove_child(&mut self, child: NodeId, cleanup: bool) {
        let Some(parent) = self.node(child).parent else {
            return;
        };

        if let Some(sheet) = self.sprite(child).and_then(|s| s.sheet()) {
            self.remove_sprite_from_atlas(sheet, child);
        }

        self.detach(parent, child);

        if cleanup {
            self.destroy_subtree(child);
        }
    }

    pub fn remove_all_children(&mut self, parent: NodeId, cleanup: bool) {
        for child in self.node(parent).children.clone() {
            self.remove_child(child, cleanup);
        }
    }

    /// Move `child` to z order `z` among its siblings.
    pub fn reorder_child(&mut self, child: NodeId, z: i32) {
        let node = self.node(child);
        if node.state.z_order() == z {
            return;
        }
        let Some(parent) = node.parent else {
            self.node_mut(child).state.set_z_order(z);
            return;
        };

        let batched = self.sprite(child).is_some_and(|s| s.is_batch_rendered());
        if batched {
            // the atlas slot depends on z, so re-insert
            self.remove_child(child, false);
            self.add_child(parent, child, z);
        } else {
            self.detach(parent, child);
            self.attach(parent, child, z);
        }
    }

    pub fn child_by_tag(&self, parent: NodeId, tag: i32) -> Option<NodeId> {
        self.children(parent)
            .iter()
            .copied()
            .find(|&c| self.node(c).state.tag() == Some(tag))
    }

    /// Remove `id` and its whole subtree from the scene. Destroying a sprite
    /// sheet also drops its atlas.
    pub fn remove_node(&mut self, id: NodeId) {
        if !self.contains(id) {
            return;
        }
        if self.node(id).parent.is_some() {
            self.remove_child(id, true);
        } else {
            self.destroy_subtree(id);
        }
    }

    fn attach(&mut self, parent: NodeId, child: NodeId, z: i32) {
        let child_node = self.node_mut(child);
        child_node.parent = Some(parent);
        child_node.state.set_z_order(z);

        let position = {
            let siblings = &self.node(parent).children;
            siblings
                .iter()
                .position(|&s| self.node(s).state.z_order() > z)
                .unwrap_or(siblings.len())
        };
        self.node_mut(parent).children.insert(position, child);
    }

    fn detach(&mut self, parent: NodeId, child: NodeId) {
        let parent_node = self.node_mut(parent);
        parent_node.children.retain(|&c| c != child);
        let now_empty = parent_node.children.is_empty();
        if let Some(sprite) = parent_node.kind.as_sprite_mut() {
            sprite.set_has_children(!now_empty);
        }
        self.node_mut(child).parent = None;
    }

    fn destroy_subtree(&mut self, root: NodeId) {
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            stack.extend(self.node(id).children.iter().copied());
            self.unregister(id);
        }
    }
}
