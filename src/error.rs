//! Crate-level error types.

use std::fmt;

use crate::effect::lifecycle::FrameStage;
use crate::gpu::render_context::RenderContextError;

/// Errors produced by the ascii-post crate.
#[derive(Debug)]
pub enum AsciiError {
    /// GPU context initialization failure.
    Gpu(RenderContextError),
    /// Generic I/O failure.
    Io(std::io::Error),
    /// TOML options parsing/serialization failure.
    OptionsParse(String),
    /// Image decode/encode failure (glyph atlas, CLI input/output).
    Image(image::ImageError),
    /// Glyph atlas dimensions do not match its glyph count.
    GlyphAtlas(String),
    /// WGSL composition failure.
    Shader(String),
    /// GPU-to-CPU texture readback failure.
    Readback(String),
    /// A frame callback was invoked in the wrong stage of the frame cycle.
    Lifecycle {
        /// The callback that was invoked.
        operation: &'static str,
        /// The stage the effect was in at the time.
        stage: FrameStage,
    },
}

impl fmt::Display for AsciiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gpu(e) => write!(f, "GPU error: {e}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::OptionsParse(msg) => {
                write!(f, "options parse error: {msg}")
            }
            Self::Image(e) => write!(f, "image error: {e}"),
            Self::GlyphAtlas(msg) => write!(f, "glyph atlas error: {msg}"),
            Self::Shader(msg) => write!(f, "shader error: {msg}"),
            Self::Readback(msg) => write!(f, "readback error: {msg}"),
            Self::Lifecycle { operation, stage } => {
                write!(f, "`{operation}` called while frame is {stage:?}")
            }
        }
    }
}

impl std::error::Error for AsciiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Gpu(e) => Some(e),
            Self::Io(e) => Some(e),
            Self::Image(e) => Some(e),
            _ => None,
        }
    }
}

impl From<RenderContextError> for AsciiError {
    fn from(e: RenderContextError) -> Self {
        Self::Gpu(e)
    }
}

impl From<std::io::Error> for AsciiError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<image::ImageError> for AsciiError {
    fn from(e: image::ImageError) -> Self {
        Self::Image(e)
    }
}
