//! Texture rect, UV mapping and flipping.

use crate::scene::NodeState;
use crate::types::{Point, Rect, Size};

use super::Sprite;

impl Sprite {
    /// Display `rect` of the texture; the content size becomes the rect size.
    pub fn set_texture_rect(&mut self, rect: Rect, state: &mut NodeState) {
        self.set_texture_rect_with_size(rect, rect.size(), state);
    }

    /// Display `rect` of the texture inside a content box of `size`.
    ///
    /// `size` differs from the rect size for frames trimmed by an editor;
    /// the quad is then offset inside the content box.
    pub fn set_texture_rect_with_size(&mut self, rect: Rect, size: Size, state: &mut NodeState) {
        self.rect = rect;
        state.set_content_size(size);
        self.update_tex_coords();

        let mut relative = self.unflipped_offset_from_center;
        if self.flip_x {
            relative.x = -relative.x;
        }
        if self.flip_y {
            relative.y = -relative.y;
        }

        self.offset_position = Point::new(
            relative.x + (size.width - rect.width) / 2.0,
            relative.y + (size.height - rect.height) / 2.0,
        );

        if self.is_batch_rendered() {
            // the subtree is unaffected, only this slot needs rewriting
            self.dirty = true;
        } else {
            self.rebuild_local_vertices();
        }
    }

    pub fn set_flip_x(&mut self, flip: bool, state: &mut NodeState) {
        if self.flip_x != flip {
            self.flip_x = flip;
            self.set_texture_rect(self.rect, state);
        }
    }

    pub fn set_flip_y(&mut self, flip: bool, state: &mut NodeState) {
        if self.flip_y != flip {
            self.flip_y = flip;
            self.set_texture_rect(self.rect, state);
        }
    }

    /// Frame offset relative to the content center, before flipping.
    pub fn unflipped_offset_from_center(&self) -> Point {
        self.unflipped_offset_from_center
    }

    pub(crate) fn set_unflipped_offset_from_center(&mut self, offset: Point) {
        self.unflipped_offset_from_center = offset;
    }

    fn update_tex_coords(&mut self) {
        let (atlas_width, atlas_height) = match &self.texture {
            Some(t) => (t.pixels_wide() as f32, t.pixels_high() as f32),
            None => (1.0, 1.0),
        };

        let rect = self.rect;
        let mut left = rect.x / atlas_width;
        let mut right = (rect.x + rect.width) / atlas_width;
        let mut top = rect.y / atlas_height;
        let mut bottom = (rect.y + rect.height) / atlas_height;

        if self.flip_x {
            std::mem::swap(&mut left, &mut right);
        }
        if self.flip_y {
            std::mem::swap(&mut top, &mut bottom);
        }

        self.quad
            .set_tex_coords(&[left, top, left, bottom, right, top, right, bottom]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RenderConfig;
    use crate::renderer::Quad;
    use crate::texture::Texture;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    fn textured_sprite(rect: Rect) -> (Sprite, NodeState) {
        let config = RenderConfig::default();
        let mut state = NodeState::default();
        let mut sprite = Sprite::new(&mut state, &config);
        sprite.set_texture(Some(Texture::shared(64, 64, true)), &config);
        sprite.set_texture_rect(rect, &mut state);
        (sprite, state)
    }

    #[test]
    fn test_uvs_normalized_by_texture_pixels() {
        let (sprite, state) = textured_sprite(Rect::new(0.0, 0.0, 32.0, 32.0));
        assert_eq!(sprite.quad().tex_coords(), [0.0, 0.0, 0.0, 0.5, 0.5, 0.0, 0.5, 0.5]);
        assert_eq!(state.content_size(), Size::new(32.0, 32.0));
        assert_eq!(state.anchor_point_in_pixels(), Point::new(16.0, 16.0));
    }

    #[test]
    fn test_uvs_without_texture_use_unit_size() {
        let config = RenderConfig::default();
        let mut state = NodeState::default();
        let mut sprite = Sprite::new(&mut state, &config);
        sprite.set_texture_rect(Rect::new(0.0, 0.0, 2.0, 3.0), &mut state);
        assert_eq!(sprite.quad().tex_coords(), [0.0, 0.0, 0.0, 3.0, 2.0, 0.0, 2.0, 3.0]);
    }

    #[test]
    fn test_self_render_local_vertices() {
        let (sprite, _) = textured_sprite(Rect::new(8.0, 8.0, 16.0, 8.0));
        let q = sprite.quad();
        assert_eq!(q.position(Quad::TOP_LEFT), [0.0, 8.0, 0.0]);
        assert_eq!(q.position(Quad::BOTTOM_LEFT), [0.0, 0.0, 0.0]);
        assert_eq!(q.position(Quad::TOP_RIGHT), [16.0, 8.0, 0.0]);
        assert_eq!(q.position(Quad::BOTTOM_RIGHT), [16.0, 0.0, 0.0]);
    }

    #[test]
    fn test_flip_swaps_uv_pairs() {
        let (mut sprite, mut state) = textured_sprite(Rect::new(16.0, 0.0, 16.0, 32.0));
        sprite.set_flip_x(true, &mut state);
        let uv = sprite.quad().tex_coords();
        assert!(approx_eq(uv[0], 0.5)); // left became right
        assert!(approx_eq(uv[4], 0.25));

        sprite.set_flip_y(true, &mut state);
        let uv = sprite.quad().tex_coords();
        assert!(approx_eq(uv[1], 0.5)); // top became bottom
        assert!(approx_eq(uv[3], 0.0));
    }

    #[test]
    fn test_flip_twice_restores_uvs_and_offset() {
        let (mut sprite, mut state) = textured_sprite(Rect::new(4.0, 4.0, 20.0, 10.0));
        sprite.set_unflipped_offset_from_center(Point::new(3.0, -2.0));
        sprite.set_texture_rect(sprite.texture_rect(), &mut state);
        let uvs = sprite.quad().tex_coords();
        let offset = sprite.offset_position();

        sprite.set_flip_x(true, &mut state);
        assert_eq!(sprite.offset_position().x, -offset.x);
        sprite.set_flip_x(false, &mut state);
        sprite.set_flip_y(true, &mut state);
        assert_eq!(sprite.offset_position().y, -offset.y);
        sprite.set_flip_y(false, &mut state);

        assert_eq!(sprite.quad().tex_coords(), uvs);
        assert_eq!(sprite.offset_position(), offset);
    }

    #[test]
    fn test_flip_does_not_move_anchor() {
        let (mut sprite, mut state) = textured_sprite(Rect::new(0.0, 0.0, 32.0, 16.0));
        let anchor = state.anchor_point();
        let anchor_px = state.anchor_point_in_pixels();
        sprite.set_flip_x(true, &mut state);
        sprite.set_flip_y(true, &mut state);
        assert_eq!(state.anchor_point(), anchor);
        assert_eq!(state.anchor_point_in_pixels(), anchor_px);
    }

    #[test]
    fn test_untrimmed_size_offsets_quad() {
        let config = RenderConfig::default();
        let mut state = NodeState::default();
        let mut sprite = Sprite::new(&mut state, &config);
        sprite.set_texture(Some(Texture::shared(64, 64, true)), &config);
        sprite.set_texture_rect_with_size(
            Rect::new(0.0, 0.0, 20.0, 10.0),
            Size::new(40.0, 30.0),
            &mut state,
        );
        assert_eq!(sprite.offset_position(), Point::new(10.0, 10.0));
        assert_eq!(state.content_size(), Size::new(40.0, 30.0));
    }
}
