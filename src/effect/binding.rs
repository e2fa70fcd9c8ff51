//! Parameter values the effect pushes into its materials each frame.

use glam::{UVec2, Vec4};

use super::resolution::ResolvedResolution;
use crate::host::{
    MaterialId, ParamValue, RenderHost, ShaderParam, TextureId,
};
use crate::options::EffectSettings;

/// Parameter values pushed to the glyph compositing material each frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShaderBinding {
    /// Number of glyphs in the atlas.
    pub character_count: f32,
    /// `(columns, rows, surface width, surface height)`.
    pub resolution: Vec4,
    /// Glyph height-to-width ratio.
    pub font_ratio: f32,
    /// Glyph tint, alpha forced to 1.
    pub font_color: Vec4,
    /// Blend between source color (0) and glyph tint (1).
    pub font_color_strength: f32,
    /// Cell background, alpha forced to 1.
    pub backing_color: Vec4,
    /// Blend between source color (0) and background color (1).
    pub backing_color_strength: f32,
    /// Glyph atlas.
    pub font_asset: Option<TextureId>,
}

impl ShaderBinding {
    /// Derive the binding from settings, the resolved grid and the surface.
    #[must_use]
    pub fn new(
        settings: &EffectSettings,
        grid: ResolvedResolution,
        surface: UVec2,
        font_asset: Option<TextureId>,
    ) -> Self {
        let [fr, fg, fb] = settings.font_color;
        let [br, bg, bb] = settings.backing_color;
        Self {
            character_count: settings.character_count as f32,
            resolution: Vec4::new(
                grid.columns as f32,
                grid.rows as f32,
                surface.x as f32,
                surface.y as f32,
            ),
            font_ratio: settings.font_ratio,
            font_color: Vec4::new(fr, fg, fb, 1.0),
            font_color_strength: settings.font_color_strength,
            backing_color: Vec4::new(br, bg, bb, 1.0),
            backing_color_strength: settings.backing_color_strength,
            font_asset,
        }
    }

    /// Push every value into `material`.
    pub fn apply<H: RenderHost + ?Sized>(
        &self,
        host: &mut H,
        material: MaterialId,
    ) {
        let values = [
            (
                ShaderParam::CharacterCount,
                ParamValue::Float(self.character_count),
            ),
            (ShaderParam::Resolution, ParamValue::Vector(self.resolution)),
            (ShaderParam::FontRatio, ParamValue::Float(self.font_ratio)),
            (ShaderParam::FontColor, ParamValue::Color(self.font_color)),
            (
                ShaderParam::FontColorStrength,
                ParamValue::Float(self.font_color_strength),
            ),
            (
                ShaderParam::BackingColor,
                ParamValue::Color(self.backing_color),
            ),
            (
                ShaderParam::BackingColorStrength,
                ParamValue::Float(self.backing_color_strength),
            ),
        ];
        for (param, value) in values {
            host.set_param(material, param, value);
        }
        if let Some(texture) = self.font_asset {
            host.set_param(
                material,
                ShaderParam::FontAsset,
                ParamValue::Texture(texture),
            );
        }
    }
}

pub(crate) fn bind_rescale_offset<H: RenderHost + ?Sized>(
    host: &mut H,
    material: MaterialId,
    offset: f32,
) {
    host.set_param(
        material,
        ShaderParam::RescaleUvOffset,
        ParamValue::Float(offset),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::recording::RecordingHost;
    use crate::host::ShaderKind;

    #[test]
    fn binding_reflects_settings() {
        let settings = EffectSettings {
            font_color: [0.0, 1.0, 0.0],
            font_color_strength: 1.0,
            ..EffectSettings::default()
        };
        let grid = ResolvedResolution {
            columns: 128,
            rows: 72,
        };
        let binding = ShaderBinding::new(
            &settings,
            grid,
            UVec2::new(1920, 1080),
            Some(TextureId(3)),
        );
        assert_eq!(binding.resolution, Vec4::new(128.0, 72.0, 1920.0, 1080.0));
        assert_eq!(binding.font_color, Vec4::new(0.0, 1.0, 0.0, 1.0));
        assert_eq!(binding.character_count, 10.0);
        assert_eq!(binding.backing_color_strength, 0.8);
    }

    #[test]
    fn apply_pushes_every_parameter() {
        let mut host = RecordingHost::new();
        let material = host.create_material(ShaderKind::Ascii).unwrap();
        let binding = ShaderBinding::new(
            &EffectSettings::default(),
            ResolvedResolution {
                columns: 64,
                rows: 36,
            },
            UVec2::new(1280, 720),
            Some(TextureId(0)),
        );
        binding.apply(&mut host, material);

        assert_eq!(
            host.param(material, ShaderParam::FontRatio),
            Some(ParamValue::Float(3.0))
        );
        assert_eq!(
            host.param(material, ShaderParam::FontAsset),
            Some(ParamValue::Texture(TextureId(0)))
        );
        assert_eq!(
            host.param(material, ShaderParam::Resolution),
            Some(ParamValue::Vector(Vec4::new(64.0, 36.0, 1280.0, 720.0)))
        );
    }
}
