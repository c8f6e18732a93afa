//! Dirty propagation for batch-rendered sprites.
//!
//! A batched sprite's quad depends on the transforms of every ancestor up to
//! its sheet, so a transform change marks the whole subtree. The
//! `recursive_dirty` flag makes repeated changes before the next update
//! cheap: a subtree already marked is not walked again.

use super::{NodeId, Scene};

impl Scene {
    /// Hook run after any transform-affecting change to `id`.
    pub(crate) fn mark_dirty_recursive(&mut self, id: NodeId) {
        let needs_marking = self
            .sprite(id)
            .is_some_and(|s| s.is_batch_rendered() && !s.is_recursive_dirty());
        if needs_marking {
            self.set_dirty_recursively(id);
        }
    }

    /// Flag `id` and every sprite below it as needing a transform update.
    pub fn set_dirty_recursively(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let node = self.node_mut(current);
            match node.kind.as_sprite_mut() {
                Some(sprite) => {
                    sprite.mark_dirty_recursive_flags();
                    if sprite.has_children() {
                        stack.extend(node.children.iter().copied());
                    }
                }
                None => log::warn!(
                    "Skipping non-sprite node {:?} while marking a batched subtree dirty",
                    current
                ),
            }
        }
    }

    /// Show or hide `id`.
    ///
    /// Batched sprites write a degenerate quad while hidden, so a change
    /// also hides or shows the sprite's children and marks the subtree for
    /// update.
    pub fn set_visible(&mut self, id: NodeId, visible: bool) {
        let node = self.node_mut(id);
        if node.state.is_visible() == visible {
            return;
        }
        node.state.set_visible(visible);

        let propagate = node
            .kind
            .as_sprite()
            .is_some_and(|s| s.is_batch_rendered() && !s.is_recursive_dirty());
        if !propagate {
            return;
        }

        for child in node.children.clone() {
            if self.sprite(child).is_some() {
                self.set_visible(child, visible);
            } else {
                log::warn!("Skipping non-sprite node {:?} while propagating visibility", child);
            }
        }
        self.set_dirty_recursively(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::texture::Texture;
    use crate::types::{Point, Rect};

    fn batched_family() -> (Scene, NodeId, NodeId, NodeId, NodeId) {
        let mut scene = Scene::new();
        let sheet = scene.create_sprite_sheet(Texture::shared(64, 64, true));
        let parent = scene.create_sprite_in_sheet(sheet, Rect::new(0.0, 0.0, 16.0, 16.0));
        let c1 = scene.create_sprite_in_sheet(sheet, Rect::new(16.0, 0.0, 16.0, 16.0));
        let c2 = scene.create_sprite_in_sheet(sheet, Rect::new(32.0, 0.0, 16.0, 16.0));
        scene.add_child(sheet, parent, 0);
        scene.add_child(parent, c1, 0);
        scene.add_child(parent, c2, 0);
        scene.update_sheet(sheet);
        (scene, sheet, parent, c1, c2)
    }

    #[test]
    fn test_transform_change_marks_subtree() {
        let (mut scene, _, parent, c1, c2) = batched_family();
        assert!(!scene.sprite(c1).unwrap().is_dirty());

        scene.set_position(parent, Point::new(10.0, 0.0));

        for id in [parent, c1, c2] {
            let sprite = scene.sprite(id).unwrap();
            assert!(sprite.is_dirty());
            assert!(sprite.is_recursive_dirty());
        }
    }

    #[test]
    fn test_repeated_marking_is_noop() {
        let (mut scene, _, parent, c1, _) = batched_family();
        scene.set_rotation(parent, 45.0);
        let before = (
            scene.sprite(parent).unwrap().is_dirty(),
            scene.sprite(c1).unwrap().is_recursive_dirty(),
        );

        scene.set_scale(parent, 2.0);

        let after = (
            scene.sprite(parent).unwrap().is_dirty(),
            scene.sprite(c1).unwrap().is_recursive_dirty(),
        );
        assert_eq!(before, after);
    }

    #[test]
    fn test_self_rendered_sprite_is_never_marked() {
        let mut scene = Scene::new();
        let id = scene.create_sprite(Texture::shared(8, 8, true));
        scene.set_position(id, Point::new(3.0, 3.0));
        assert!(!scene.sprite(id).unwrap().is_dirty());
    }

    #[test]
    fn test_set_visible_propagates_to_batched_children() {
        let (mut scene, _, parent, c1, c2) = batched_family();

        scene.set_visible(parent, false);

        for id in [parent, c1, c2] {
            assert!(!scene.state(id).unwrap().is_visible());
            assert!(scene.sprite(id).unwrap().is_recursive_dirty());
        }
    }

    #[test]
    fn test_set_visible_same_value_is_noop() {
        let (mut scene, _, parent, _, _) = batched_family();
        scene.set_visible(parent, true);
        assert!(!scene.sprite(parent).unwrap().is_dirty());
    }
}
