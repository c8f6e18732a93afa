use crate::renderer::RenderContext;

use super::{NodeId, Scene};

impl Scene {
    /// Draw a self-rendered sprite with its own call.
    ///
    /// # Panics
    ///
    /// Panics if the sprite is batch-rendered; its sheet draws it.
    pub fn draw_sprite(&self, id: NodeId, ctx: &mut dyn RenderContext) {
        let node = self.node(id);
        let sprite = node
            .kind
            .as_sprite()
            .unwrap_or_else(|| panic!("node {:?} is not a sprite", id));
        assert!(
            !sprite.is_batch_rendered(),
            "sprite {:?} is batch-rendered, draw its sprite sheet instead",
            id
        );

        if !node.state.is_visible() {
            return;
        }
        let Some(quad) = self.rendered_quad(id) else {
            return;
        };

        let default_blend = self.config.default_blend;
        let override_blend = sprite.blend_func() != default_blend;
        if override_blend {
            ctx.set_blend_func(sprite.blend_func());
        }

        if let Some(texture) = sprite.texture() {
            ctx.bind_texture(texture);
        }
        ctx.draw_triangle_strip(&quad.positions(), &quad.colors_f32(), &quad.tex_coords());

        if override_blend {
            ctx.set_blend_func(default_blend);
        }
    }

    /// Draw `id` if it draws anything: sheets draw their atlas, sprites
    /// draw themselves unless batched.
    pub fn draw(&mut self, id: NodeId, ctx: &mut dyn RenderContext) {
        if self.sheet(id).is_some() {
            self.draw_sheet(id, ctx);
        } else if self.sprite(id).is_some_and(|s| !s.is_batch_rendered()) {
            self.draw_sprite(id, ctx);
        }
    }
}
