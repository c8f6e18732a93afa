//! Shared quad storage for batched sprites.
//!
//! A [`TextureAtlas`] is a contiguous array of quads drawn with one texture
//! in a single call. Sprites never own an atlas: they hold an
//! [`AtlasHandle`] into the scene's [`AtlasStore`] and resolve it each time
//! they write, so a handle that outlived its atlas is detected at use.

use crate::texture::TextureRef;
use crate::types::Color4B;

use super::quad::Quad;

/// Write access to a quad store, addressed by quad index.
///
/// Writes never resize the store; only [`TextureAtlas::insert_quad`] and
/// [`TextureAtlas::remove_quad`] change its length.
pub trait QuadBuffer {
    /// Overwrite the twelve `[x, y, z]` position floats of a quad.
    fn put_vertex(&mut self, vertices: &[f32; 12], index: usize);

    /// Overwrite the four vertex colors of a quad.
    fn update_color(&mut self, colors: &[Color4B; 4], index: usize);

    /// Overwrite the eight `[u, v]` texture coordinates of a quad.
    fn update_tex_coords(&mut self, tex_coords: &[f32; 8], index: usize);

    /// Overwrite a whole quad.
    fn update_quad(&mut self, quad: &Quad, index: usize);

    /// The quads currently stored, in draw order.
    fn vertex_buffer(&self) -> &[Quad];
}

#[derive(Debug, Clone)]
pub struct TextureAtlas {
    texture: TextureRef,
    quads: Vec<Quad>,
}

impl TextureAtlas {
    pub fn new(texture: TextureRef, capacity: usize) -> Self {
        Self {
            texture,
            quads: Vec::with_capacity(capacity),
        }
    }

    pub fn texture(&self) -> &TextureRef {
        &self.texture
    }

    pub fn total_quads(&self) -> usize {
        self.quads.len()
    }

    pub fn capacity(&self) -> usize {
        self.quads.capacity()
    }

    /// Insert a quad at `index`, shifting later quads up by one.
    pub fn insert_quad(&mut self, quad: Quad, index: usize) {
        assert!(
            index <= self.quads.len(),
            "insert_quad: index {} out of bounds ({} quads)",
            index,
            self.quads.len()
        );
        self.quads.insert(index, quad);
    }

    /// Remove the quad at `index`, shifting later quads down by one.
    pub fn remove_quad(&mut self, index: usize) -> Quad {
        assert!(
            index < self.quads.len(),
            "remove_quad: index {} out of bounds ({} quads)",
            index,
            self.quads.len()
        );
        self.quads.remove(index)
    }

    pub fn quad(&self, index: usize) -> Option<&Quad> {
        self.quads.get(index)
    }

    pub fn remove_all_quads(&mut self) {
        self.quads.clear();
    }

    /// Raw bytes of the stored quads, ready for a vertex buffer upload.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.quads)
    }

    fn slot(&mut self, index: usize) -> &mut Quad {
        let len = self.quads.len();
        self.quads
            .get_mut(index)
            .unwrap_or_else(|| panic!("atlas index {} out of bounds ({} quads)", index, len))
    }
}

impl QuadBuffer for TextureAtlas {
    fn put_vertex(&mut self, vertices: &[f32; 12], index: usize) {
        self.slot(index).set_positions(vertices);
    }

    fn update_color(&mut self, colors: &[Color4B; 4], index: usize) {
        self.slot(index).set_colors(colors);
    }

    fn update_tex_coords(&mut self, tex_coords: &[f32; 8], index: usize) {
        self.slot(index).set_tex_coords(tex_coords);
    }

    fn update_quad(&mut self, quad: &Quad, index: usize) {
        *self.slot(index) = *quad;
    }

    fn vertex_buffer(&self) -> &[Quad] {
        &self.quads
    }
}

/// Handle to an atlas registered in an [`AtlasStore`].
///
/// Uses index + generation so a handle to a removed atlas never resolves to
/// an atlas registered later in the same slot.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct AtlasHandle {
    index: u32,
    generation: u32,
}

struct AtlasSlot {
    generation: u32,
    atlas: Option<TextureAtlas>,
}

/// Registry owning every atlas of a scene.
#[derive(Default)]
pub struct AtlasStore {
    slots: Vec<AtlasSlot>,
    free_indices: Vec<u32>,
}

impl AtlasStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, atlas: TextureAtlas) -> AtlasHandle {
        if let Some(index) = self.free_indices.pop() {
            let slot = &mut self.slots[index as usize];
            slot.generation = slot.generation.wrapping_add(1);
            slot.atlas = Some(atlas);
            return AtlasHandle {
                index,
                generation: slot.generation,
            };
        }

        let index = self.slots.len() as u32;
        self.slots.push(AtlasSlot {
            generation: 0,
            atlas: Some(atlas),
        });
        AtlasHandle {
            index,
            generation: 0,
        }
    }

    pub fn remove(&mut self, handle: AtlasHandle) -> Option<TextureAtlas> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        let atlas = slot.atlas.take();
        if atlas.is_some() {
            self.free_indices.push(handle.index);
        }
        atlas
    }

    pub fn get(&self, handle: AtlasHandle) -> Option<&TextureAtlas> {
        self.slots
            .get(handle.index as usize)
            .filter(|s| s.generation == handle.generation)
            .and_then(|s| s.atlas.as_ref())
    }

    pub fn get_mut(&mut self, handle: AtlasHandle) -> Option<&mut TextureAtlas> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|s| s.generation == handle.generation)
            .and_then(|s| s.atlas.as_mut())
    }

    pub fn contains(&self, handle: AtlasHandle) -> bool {
        self.get(handle).is_some()
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.atlas.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::texture::Texture;

    fn quad_at(x: f32) -> Quad {
        let mut q = Quad::default();
        q.set_positions(&[x; 12]);
        q
    }

    #[test]
    fn test_insert_shifts_later_quads() {
        let mut atlas = TextureAtlas::new(Texture::shared(8, 8, true), 4);
        atlas.insert_quad(quad_at(1.0), 0);
        atlas.insert_quad(quad_at(2.0), 1);
        atlas.insert_quad(quad_at(3.0), 0);

        let xs: Vec<f32> = atlas.vertex_buffer().iter().map(|q| q.position(0)[0]).collect();
        assert_eq!(xs, vec![3.0, 1.0, 2.0]);

        atlas.remove_quad(1);
        let xs: Vec<f32> = atlas.vertex_buffer().iter().map(|q| q.position(0)[0]).collect();
        assert_eq!(xs, vec![3.0, 2.0]);
    }

    #[test]
    fn test_writes_do_not_resize() {
        let mut atlas = TextureAtlas::new(Texture::shared(8, 8, true), 1);
        atlas.insert_quad(Quad::default(), 0);
        atlas.put_vertex(&[5.0; 12], 0);
        atlas.update_color(&[Color4B::new(1, 2, 3, 4); 4], 0);
        atlas.update_tex_coords(&[0.5; 8], 0);

        assert_eq!(atlas.total_quads(), 1);
        let q = atlas.quad(0).unwrap();
        assert_eq!(q.positions(), [5.0; 12]);
        assert_eq!(q.colors()[3], Color4B::new(1, 2, 3, 4));
        assert_eq!(q.tex_coords(), [0.5; 8]);
        assert_eq!(atlas.as_bytes().len(), 96);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_write_past_end_panics() {
        let mut atlas = TextureAtlas::new(Texture::shared(8, 8, true), 1);
        atlas.put_vertex(&[0.0; 12], 0);
    }

    #[test]
    fn test_store_stale_handle() {
        let tex = Texture::shared(8, 8, true);
        let mut store = AtlasStore::new();
        let a = store.insert(TextureAtlas::new(tex.clone(), 1));
        assert!(store.contains(a));

        store.remove(a);
        let b = store.insert(TextureAtlas::new(tex, 1));

        assert!(!store.contains(a));
        assert!(store.get_mut(a).is_none());
        assert!(store.contains(b));
        assert_eq!(store.len(), 1);
    }
}
