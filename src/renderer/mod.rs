//! GPU-facing data: quad vertices, atlases and the draw contract.

pub mod atlas;
pub mod commands;
pub mod quad;

pub use atlas::{AtlasHandle, AtlasStore, QuadBuffer, TextureAtlas};
pub use commands::{CommandRecorder, DrawCommand, RenderContext};
pub use quad::{Quad, QuadVertex};
