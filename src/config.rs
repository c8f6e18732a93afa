use crate::blend::BlendFunc;

/// Scene-wide rendering configuration.
///
/// Holds what would otherwise be process-wide defaults, so two scenes can
/// run with different blend policies.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    /// Blend function assumed to be active between draw calls, and the one
    /// given to premultiplied-alpha content.
    pub default_blend: BlendFunc,
    /// Number of quads a new sheet's atlas reserves up front.
    pub atlas_capacity: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            default_blend: BlendFunc::PREMULTIPLIED,
            atlas_capacity: 29,
        }
    }
}
