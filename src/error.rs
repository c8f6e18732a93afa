use thiserror::Error;

/// Lookup failures for named frames and animations.
///
/// Misuse of the render-mode state machine is a programming error and
/// panics instead; only lookups by name or index can fail at runtime.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpriteError {
    #[error("Sprite frame not found: {0}")]
    FrameNotFound(String),
    #[error("Animation not found: {0}")]
    AnimationNotFound(String),
    #[error("Frame index {index} out of range for animation '{animation}' ({len} frames)")]
    FrameIndexOutOfRange {
        animation: String,
        index: usize,
        len: usize,
    },
}

pub type Result<T> = std::result::Result<T, SpriteError>;
