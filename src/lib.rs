//! Sprite transform and batching engine.
//!
//! Sprites are textured quads living in a [`Scene`](scene::Scene). A sprite
//! either draws itself or is batched by a sprite sheet, which keeps every
//! descendant's quad in one shared atlas and draws them all with a single
//! call. Transform changes mark batched sprites dirty, and the sheet
//! recomputes only the stale quads before drawing.

pub mod blend;
pub mod config;
pub mod error;
pub mod renderer;
pub mod scene;
pub mod sprite;
pub mod texture;
pub mod transform;
pub mod types;

pub use config::RenderConfig;
pub use error::{Result, SpriteError};

pub mod prelude {
    pub use crate::blend::BlendFunc;
    pub use crate::config::RenderConfig;
    pub use crate::error::{Result, SpriteError};
    pub use crate::renderer::{
        AtlasHandle, CommandRecorder, DrawCommand, Quad, QuadBuffer, QuadVertex, RenderContext,
        TextureAtlas,
    };
    pub use crate::scene::{NodeId, NodeKind, NodeState, Scene, SpriteSheet};
    pub use crate::sprite::frame::{Animation, FrameLookup, SpriteFrame, SpriteFrameCache};
    pub use crate::sprite::{HonorTransform, RenderMode, Sprite};
    pub use crate::texture::{Texture, TextureId, TextureRef};
    pub use crate::transform::AffineTransform;
    pub use crate::types::{Color3B, Color4B, Point, Rect, Size};
}
