//! Transform computation: node-to-parent/world matrices and the quad
//! update of batched sprites.

use crate::renderer::{Quad, QuadBuffer};
use crate::sprite::{HonorTransform, RenderMode};
use crate::transform::AffineTransform;

use super::{NodeId, NodeState, Scene};

/// One link of a batched transform chain, gated by the mask of the node
/// below it.
fn chain_link(state: &NodeState, honor: HonorTransform) -> AffineTransform {
    let mut matrix = AffineTransform::IDENTITY;

    if honor.contains(HonorTransform::TRANSLATE) {
        let position = state.position();
        matrix = matrix.translated(position.x, position.y);
    }
    if honor.contains(HonorTransform::ROTATE) {
        matrix = matrix.then(&AffineTransform::rotate_node_degrees(state.rotation()));
    }
    if honor.contains(HonorTransform::SCALE) {
        matrix = matrix.scaled(state.scale_x(), state.scale_y());
    }

    let anchor = state.anchor_point_in_pixels();
    matrix.translated(-anchor.x, -anchor.y)
}

impl Scene {
    /// Recompute a batched sprite's quad and write it to its atlas slot.
    ///
    /// Hidden sprites get a degenerate all-zero quad. Sprites attached
    /// directly to their sheet (or not attached at all) use their own
    /// node-to-parent matrix; deeper sprites compose the chain of ancestors
    /// up to the sheet, each filtered by the honor mask of the node below.
    ///
    /// # Panics
    ///
    /// Panics unless `id` is a batch-rendered sprite with an atlas slot.
    pub fn update_transform(&mut self, id: NodeId) {
        let node = self.node(id);
        let sprite = node
            .kind
            .as_sprite()
            .unwrap_or_else(|| panic!("node {:?} is not a sprite", id));
        let RenderMode::BatchRender { sheet, atlas } = sprite.render_mode() else {
            panic!("update_transform requires a batch-rendered sprite, {:?} renders itself", id);
        };
        let index = sprite
            .atlas_index()
            .unwrap_or_else(|| panic!("batched sprite {:?} has no atlas slot yet", id));

        let quad = if node.state.is_visible() {
            let matrix = match node.parent {
                Some(parent) if parent != sheet => self.batched_chain_transform(id, sheet),
                _ => node.state.node_to_parent_transform(),
            };
            let mut quad = *sprite.quad();
            quad.set_positions(&sprite.transformed_vertices(&matrix, node.state.vertex_z()));
            Some(quad)
        } else {
            None
        };

        let buffer = self
            .atlases
            .get_mut(atlas)
            .unwrap_or_else(|| panic!("batched sprite {:?} has a stale atlas handle", id));
        match &quad {
            Some(quad) => buffer.update_quad(quad, index),
            None => buffer.put_vertex(&[0.0; 12], index),
        }

        self.sprite_mut(id).clear_dirty();
        log::trace!("Updated transform of {:?} at atlas index {}", id, index);
    }

    fn batched_chain_transform(&self, id: NodeId, sheet: NodeId) -> AffineTransform {
        let mut matrix = AffineTransform::IDENTITY;
        let mut honor = HonorTransform::ALL;
        let mut current = Some(id);

        while let Some(node_id) = current.filter(|&n| n != sheet) {
            let node = self.node(node_id);
            // ancestors are applied after descendants
            matrix = chain_link(&node.state, honor).then(&matrix);
            honor = node
                .kind
                .as_sprite()
                .map_or(HonorTransform::ALL, |s| s.honor_parent_transform());
            current = node.parent;
        }

        matrix
    }

    /// Matrix from `id`'s local space to its parent's.
    pub fn node_to_parent_transform(&self, id: NodeId) -> Option<AffineTransform> {
        self.state(id).map(NodeState::node_to_parent_transform)
    }

    /// Matrix from `id`'s local space to the scene root's.
    pub fn node_to_world_transform(&self, id: NodeId) -> Option<AffineTransform> {
        let mut matrix = self.node_to_parent_transform(id)?;
        let mut current = self.parent(id);
        while let Some(parent) = current {
            let node = self.node(parent);
            matrix = node.state.node_to_parent_transform().then(&matrix);
            current = node.parent;
        }
        Some(matrix)
    }

    /// The quad a sprite currently renders.
    ///
    /// Self-rendered sprites are mapped to world space (z = vertex z).
    /// Batched sprites return their atlas slot, in their sheet's space, or
    /// `None` while unplaced.
    pub fn rendered_quad(&self, id: NodeId) -> Option<Quad> {
        let sprite = self.sprite(id)?;
        match sprite.render_mode() {
            RenderMode::SelfRender => {
                let world = self.node_to_world_transform(id)?;
                let z = self.node(id).state.vertex_z();
                let mut quad = *sprite.quad();
                quad.set_positions(&sprite.transformed_vertices(&world, z));
                Some(quad)
            }
            RenderMode::BatchRender { atlas, .. } => {
                let index = sprite.atlas_index()?;
                self.atlases.get(atlas)?.quad(index).copied()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::texture::Texture;
    use crate::types::{Point, Rect};

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    fn assert_point(actual: [f32; 3], x: f32, y: f32) {
        assert!(
            approx_eq(actual[0], x) && approx_eq(actual[1], y),
            "expected ({}, {}), got {:?}",
            x,
            y,
            actual
        );
    }

    #[test]
    fn test_direct_sheet_child_quad() {
        let mut scene = Scene::new();
        let sheet = scene.create_sprite_sheet(Texture::shared(64, 64, true));
        let id = scene.create_sprite_in_sheet(sheet, Rect::new(0.0, 0.0, 32.0, 32.0));
        scene.add_child(sheet, id, 0);
        scene.set_position(id, Point::new(100.0, 100.0));
        scene.set_vertex_z(id, 2.0);

        scene.update_transform(id);

        let quad = scene.rendered_quad(id).unwrap();
        assert_point(quad.position(Quad::BOTTOM_LEFT), 84.0, 84.0);
        assert_point(quad.position(Quad::TOP_RIGHT), 116.0, 116.0);
        assert_eq!(quad.position(Quad::TOP_LEFT)[2], 2.0);
        assert!(!scene.sprite(id).unwrap().is_dirty());
    }

    #[test]
    fn test_hidden_sprite_writes_zero_quad() {
        let mut scene = Scene::new();
        let sheet = scene.create_sprite_sheet(Texture::shared(64, 64, true));
        let id = scene.create_sprite_in_sheet(sheet, Rect::new(0.0, 0.0, 8.0, 8.0));
        scene.add_child(sheet, id, 0);
        scene.set_position(id, Point::new(5.0, 5.0));
        scene.update_transform(id);

        scene.set_visible(id, false);
        scene.update_transform(id);

        let quad = scene.rendered_quad(id).unwrap();
        assert_eq!(quad.positions(), [0.0; 12]);
        assert!(!scene.sprite(id).unwrap().is_dirty());
    }

    #[test]
    fn test_chain_composes_parent_transform() {
        let mut scene = Scene::new();
        let sheet = scene.create_sprite_sheet(Texture::shared(64, 64, true));
        let parent = scene.create_sprite_in_sheet(sheet, Rect::new(0.0, 0.0, 10.0, 10.0));
        let child = scene.create_sprite_in_sheet(sheet, Rect::new(0.0, 0.0, 10.0, 10.0));
        scene.add_child(sheet, parent, 0);
        scene.add_child(parent, child, 0);
        scene.set_position(parent, Point::new(50.0, 0.0));
        scene.set_position(child, Point::new(5.0, 5.0));

        scene.update_sheet(sheet);

        // child origin in parent space: (5, 5) - (5, 5) = (0, 0),
        // then the parent's anchor and position: (0, 0) - (5, 5) + (50, 0)
        let quad = scene.rendered_quad(child).unwrap();
        assert_point(quad.position(Quad::BOTTOM_LEFT), 45.0, -5.0);
        assert_point(quad.position(Quad::TOP_RIGHT), 55.0, 5.0);
    }

    #[test]
    fn test_batched_chain_matches_world_transform_without_masks() {
        let mut scene = Scene::new();
        let sheet = scene.create_sprite_sheet(Texture::shared(64, 64, true));
        let parent = scene.create_sprite_in_sheet(sheet, Rect::new(0.0, 0.0, 16.0, 8.0));
        let child = scene.create_sprite_in_sheet(sheet, Rect::new(0.0, 0.0, 4.0, 4.0));
        scene.add_child(sheet, parent, 0);
        scene.add_child(parent, child, 0);
        scene.set_position(parent, Point::new(20.0, 30.0));
        scene.set_rotation(parent, 30.0);
        scene.set_scale(parent, 1.5);
        scene.set_position(child, Point::new(3.0, -2.0));
        scene.set_rotation(child, -60.0);

        scene.update_sheet(sheet);

        let batched = scene.rendered_quad(child).unwrap();
        let expected = scene
            .node_to_world_transform(child)
            .map(|m| scene.sprite(child).unwrap().transformed_vertices(&m, 0.0))
            .unwrap();
        for (a, b) in batched.positions().iter().zip(expected) {
            assert!(approx_eq(*a, b));
        }
    }

    #[test]
    #[should_panic(expected = "renders itself")]
    fn test_update_transform_on_self_rendered_panics() {
        let mut scene = Scene::new();
        let id = scene.create_sprite(Texture::shared(8, 8, true));
        scene.update_transform(id);
    }

    #[test]
    #[should_panic(expected = "no atlas slot")]
    fn test_update_transform_on_unplaced_sprite_panics() {
        let mut scene = Scene::new();
        let sheet = scene.create_sprite_sheet(Texture::shared(8, 8, true));
        let id = scene.create_sprite_in_sheet(sheet, Rect::new(0.0, 0.0, 8.0, 8.0));
        scene.update_transform(id);
    }

    #[test]
    fn test_world_transform_composes_ancestors() {
        let mut scene = Scene::new();
        let root = scene.create_node();
        let child = scene.create_node();
        scene.add_child(root, child, 0);
        scene.set_position(root, Point::new(10.0, 0.0));
        scene.set_scale(root, 2.0);
        scene.set_position(child, Point::new(1.0, 1.0));

        let world = scene.node_to_world_transform(child).unwrap();
        let (x, y) = world.transform_point(0.0, 0.0);
        assert!(approx_eq(x, 12.0));
        assert!(approx_eq(y, 2.0));
    }
}
