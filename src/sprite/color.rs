//! Vertex color compositing: base color, opacity and premultiplied alpha.

use crate::blend::BlendFunc;
use crate::config::RenderConfig;
use crate::renderer::QuadBuffer;
use crate::types::{Color3B, Color4B};

use super::Sprite;

impl Sprite {
    /// The logical color, as last passed to [`Sprite::set_color`].
    pub fn color(&self) -> Color3B {
        if self.opacity_modify_rgb {
            self.color_unmodified
        } else {
            self.color
        }
    }

    /// The color actually written to the vertices (premultiplied by opacity
    /// when `opacity_modify_rgb` is set).
    pub fn displayed_color(&self) -> Color3B {
        self.color
    }

    pub fn opacity(&self) -> u8 {
        self.opacity
    }

    pub fn does_opacity_modify_rgb(&self) -> bool {
        self.opacity_modify_rgb
    }

    pub fn blend_func(&self) -> BlendFunc {
        self.blend_func
    }

    pub fn set_blend_func(&mut self, blend_func: BlendFunc) {
        self.blend_func = blend_func;
    }

    pub fn set_color(&mut self, color: Color3B, atlas: Option<&mut dyn QuadBuffer>) {
        self.color = color;
        self.color_unmodified = color;

        if self.opacity_modify_rgb {
            self.color = color.scaled_by_opacity(self.opacity);
        }

        self.update_color(atlas);
    }

    pub fn set_opacity(&mut self, opacity: u8, atlas: Option<&mut dyn QuadBuffer>) {
        self.opacity = opacity;

        // premultiplied textures carry opacity in the color channels too
        if self.opacity_modify_rgb {
            self.color = self.color_unmodified.scaled_by_opacity(opacity);
        }

        self.update_color(atlas);
    }

    /// Change whether opacity is folded into the RGB channels, keeping the
    /// logical color.
    pub fn set_opacity_modify_rgb(&mut self, modify: bool, atlas: Option<&mut dyn QuadBuffer>) {
        let color = self.color();
        self.opacity_modify_rgb = modify;
        self.set_color(color, atlas);
    }

    /// Re-derive blending and premultiplication from the bound texture.
    ///
    /// # Panics
    ///
    /// Panics if the sprite is batch-rendered: the sheet owns blending.
    pub fn update_blend_func(&mut self, config: &RenderConfig) {
        assert!(
            !self.is_batch_rendered(),
            "Sprite::update_blend_func is not supported while the sprite is batch-rendered by a sprite sheet"
        );

        let premultiplied = self
            .texture
            .as_ref()
            .is_some_and(|t| t.has_premultiplied_alpha());
        self.blend_func = BlendFunc::for_texture(self.texture.as_deref(), config);
        self.set_opacity_modify_rgb(premultiplied, None);
    }

    /// Write the current color and opacity to the four vertices.
    ///
    /// Batch-rendered sprites also write straight into their atlas slot; a
    /// sprite not yet placed in the atlas is only flagged dirty.
    pub fn update_color(&mut self, atlas: Option<&mut dyn QuadBuffer>) {
        let colors = [self.color.with_alpha(self.opacity); 4];
        self.quad.set_colors(&colors);

        if !self.is_batch_rendered() {
            return;
        }

        match self.atlas_index {
            Some(index) => write_colors(atlas, &colors, index),
            // no need to propagate: the subtree's geometry is unchanged
            None => self.dirty = true,
        }
    }
}

fn write_colors(atlas: Option<&mut dyn QuadBuffer>, colors: &[Color4B; 4], index: usize) {
    let atlas = atlas.unwrap_or_else(|| {
        panic!("batch-rendered sprite at atlas index {} has a stale atlas handle", index)
    });
    atlas.update_color(colors, index);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::TextureAtlas;
    use crate::renderer::{AtlasStore, Quad};
    use crate::scene::{NodeState, Scene};
    use crate::texture::Texture;

    fn premultiplied_sprite() -> Sprite {
        let config = RenderConfig::default();
        let mut state = NodeState::default();
        let mut sprite = Sprite::new(&mut state, &config);
        sprite.set_texture(Some(Texture::shared(64, 64, true)), &config);
        sprite
    }

    #[test]
    fn test_premultiplied_texture_enables_modify_rgb() {
        let sprite = premultiplied_sprite();
        assert!(sprite.does_opacity_modify_rgb());
        assert_eq!(sprite.blend_func(), BlendFunc::PREMULTIPLIED);
    }

    #[test]
    fn test_straight_texture_disables_modify_rgb() {
        let config = RenderConfig::default();
        let mut sprite = premultiplied_sprite();
        sprite.set_texture(Some(Texture::shared(64, 64, false)), &config);
        assert!(!sprite.does_opacity_modify_rgb());
        assert_eq!(sprite.blend_func(), BlendFunc::STRAIGHT_ALPHA);
    }

    #[test]
    fn test_opacity_scales_color_and_round_trips() {
        let mut sprite = premultiplied_sprite();
        sprite.set_color(Color3B::new(200, 100, 50), None);
        sprite.set_opacity(128, None);

        assert_eq!(sprite.displayed_color(), Color3B::new(100, 50, 25));
        assert_eq!(sprite.color(), Color3B::new(200, 100, 50));
        assert_eq!(sprite.quad().colors()[0], Color4B::new(100, 50, 25, 128));

        sprite.set_opacity(255, None);
        assert_eq!(sprite.displayed_color(), Color3B::new(200, 100, 50));
        assert_eq!(sprite.quad().colors()[3], Color4B::new(200, 100, 50, 255));
    }

    #[test]
    fn test_opacity_without_modify_rgb_keeps_color() {
        let config = RenderConfig::default();
        let mut state = NodeState::default();
        let mut sprite = Sprite::new(&mut state, &config);
        sprite.set_color(Color3B::new(200, 100, 50), None);
        sprite.set_opacity(10, None);
        assert_eq!(sprite.quad().colors()[0], Color4B::new(200, 100, 50, 10));
    }

    #[test]
    fn test_toggle_modify_rgb_keeps_logical_color() {
        let mut sprite = premultiplied_sprite();
        sprite.set_opacity(128, None);
        sprite.set_color(Color3B::new(200, 100, 50), None);

        sprite.set_opacity_modify_rgb(false, None);
        assert_eq!(sprite.displayed_color(), Color3B::new(200, 100, 50));

        sprite.set_opacity_modify_rgb(true, None);
        assert_eq!(sprite.displayed_color(), Color3B::new(100, 50, 25));
        assert_eq!(sprite.color(), Color3B::new(200, 100, 50));
    }

    #[test]
    fn test_unplaced_batch_sprite_only_flags_dirty() {
        let mut sprite = premultiplied_sprite();
        let mut scene = Scene::new();
        let sheet = scene.create_node();
        let mut atlases = AtlasStore::new();
        let handle = atlases.insert(TextureAtlas::new(Texture::shared(64, 64, true), 1));
        sprite.use_batch_render(sheet, handle);

        sprite.set_opacity(7, None);
        assert!(sprite.is_dirty());
        assert!(!sprite.is_recursive_dirty());
    }

    #[test]
    fn test_placed_batch_sprite_writes_atlas() {
        let mut sprite = premultiplied_sprite();
        let mut scene = Scene::new();
        let sheet = scene.create_node();
        let mut atlases = AtlasStore::new();
        let handle = atlases.insert(TextureAtlas::new(Texture::shared(64, 64, true), 2));
        {
            let atlas = atlases.get_mut(handle).unwrap();
            atlas.insert_quad(Quad::default(), 0);
            atlas.insert_quad(Quad::default(), 1);
        }
        sprite.use_batch_render(sheet, handle);
        sprite.set_atlas_index(Some(1));

        let atlas = atlases.get_mut(handle).unwrap();
        sprite.set_color(Color3B::new(10, 20, 30), Some(atlas));

        let atlas = atlases.get(handle).unwrap();
        assert_eq!(atlas.quad(1).unwrap().colors()[2], Color4B::new(10, 20, 30, 255));
        assert_eq!(atlas.quad(0).unwrap().colors()[2], Color4B::default());
        assert!(!sprite.is_dirty());
    }
}
