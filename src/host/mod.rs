//! The render-host contract the effect is driven through.
//!
//! A host owns every GPU resource. The effect only ever holds opaque ids:
//! [`MaterialId`] for shader instances it created, [`TransientId`] for
//! frame-scoped scratch surfaces, and [`SurfaceId::Target`] for the frame's
//! color target, which it reads from and writes back into.
//!
//! Two hosts ship with the crate: [`recording::RecordingHost`] keeps a
//! command log in memory (dry runs, tests), and
//! [`crate::renderer::frame::GpuFrame`] records real wgpu passes.

pub mod recording;

use glam::{UVec2, Vec4};

/// Pixel format used for every scratch surface the effect allocates.
pub const SCRATCH_FORMAT: wgpu::TextureFormat =
    wgpu::TextureFormat::Rgba16Float;

/// Handle to a material created through [`RenderHost::create_material`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaterialId(pub u32);

/// Handle to a frame-scoped scratch surface.
///
/// Valid from [`RenderHost::acquire_temporary`] until the matching
/// [`RenderHost::release_temporary`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransientId(pub u32);

/// Handle to a long-lived texture registered with the host (glyph atlas).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub u32);

/// Source or destination of a blit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceId {
    /// The frame's color target (both the effect's input and output).
    Target,
    /// A scratch surface acquired this frame.
    Transient(TransientId),
}

/// Size and format of a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceDesc {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Texel format.
    pub format: wgpu::TextureFormat,
}

impl SurfaceDesc {
    /// Descriptor with the given size and format.
    #[must_use]
    pub fn new(width: u32, height: u32, format: wgpu::TextureFormat) -> Self {
        Self {
            width,
            height,
            format,
        }
    }

    /// Same size, different format.
    #[must_use]
    pub fn with_format(self, format: wgpu::TextureFormat) -> Self {
        Self { format, ..self }
    }

    /// Half the size on both axes (integer truncation).
    #[must_use]
    pub fn halved(self) -> Self {
        Self {
            width: self.width / 2,
            height: self.height / 2,
            ..self
        }
    }

    /// Size as a vector.
    #[must_use]
    pub fn size(self) -> UVec2 {
        UVec2::new(self.width, self.height)
    }
}

/// Shader programs the effect instantiates materials from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderKind {
    /// Box resample used by the downscale/upscale chain.
    Rescale,
    /// Glyph compositing shader.
    Ascii,
}

impl ShaderKind {
    /// Identifier the shader program is requested by.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Rescale => "ascii_post/rescale",
            Self::Ascii => "ascii_post/ascii",
        }
    }
}

/// Pre-resolved shader parameter handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderParam {
    /// Number of glyphs in the font atlas.
    CharacterCount,
    /// `(columns, rows, surface width, surface height)`.
    Resolution,
    /// Glyph height-to-width ratio.
    FontRatio,
    /// Glyph tint color.
    FontColor,
    /// Blend factor between source color and glyph tint.
    FontColorStrength,
    /// Cell background color.
    BackingColor,
    /// Blend factor between source color and background color.
    BackingColorStrength,
    /// Glyph atlas texture.
    FontAsset,
    /// Resample tap offset in source texels.
    RescaleUvOffset,
}

impl ShaderParam {
    /// Parameter name on the shader side, for diagnostics.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::CharacterCount => "character_count",
            Self::Resolution => "resolution",
            Self::FontRatio => "font_ratio",
            Self::FontColor => "font_color",
            Self::FontColorStrength => "font_color_strength",
            Self::BackingColor => "backing_color",
            Self::BackingColorStrength => "backing_color_strength",
            Self::FontAsset => "font_asset",
            Self::RescaleUvOffset => "uv_offset",
        }
    }
}

/// Value pushed into a material parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamValue {
    /// Scalar.
    Float(f32),
    /// Four-component vector.
    Vector(Vec4),
    /// Linear RGBA color.
    Color(Vec4),
    /// Registered texture.
    Texture(TextureId),
}

/// Resource and command interface the host exposes to the effect.
///
/// Calls are made from the single thread that records the frame. Surface
/// acquisition and release are assumed to succeed; pool exhaustion is the
/// host's concern.
pub trait RenderHost {
    /// Instantiate a material for `shader`, or `None` if the program is
    /// unavailable.
    fn create_material(&mut self, shader: ShaderKind) -> Option<MaterialId>;

    /// Destroy a material created by
    /// [`create_material`](Self::create_material).
    fn destroy_material(&mut self, material: MaterialId);

    /// Whether `texture` is registered and can be bound this frame.
    fn has_texture(&self, texture: TextureId) -> bool;

    /// Acquire a scratch surface valid until it is released.
    fn acquire_temporary(
        &mut self,
        desc: &SurfaceDesc,
        label: &'static str,
    ) -> TransientId;

    /// Return a scratch surface to the host.
    fn release_temporary(&mut self, id: TransientId);

    /// Set a material parameter. Values are captured by subsequent blits.
    fn set_param(
        &mut self,
        material: MaterialId,
        param: ShaderParam,
        value: ParamValue,
    );

    /// Draw `src` into the whole of `dst`, through `material` or as a
    /// plain copy when `None`.
    fn blit(
        &mut self,
        src: SurfaceId,
        dst: SurfaceId,
        material: Option<MaterialId>,
    );
}
