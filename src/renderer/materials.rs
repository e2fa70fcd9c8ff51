//! CPU-side material state and the uniform blocks it is packed into.

use crate::host::{ParamValue, ShaderKind, ShaderParam, TextureId};

/// Glyph compositor params — must match `AsciiParams` in `ascii.wgsl`
#[repr(C)]
#[derive(
    Debug, Clone, Copy, PartialEq, Default, bytemuck::Pod, bytemuck::Zeroable,
)]
pub struct AsciiUniforms {
    resolution: [f32; 4],
    font_color: [f32; 4],
    backing_color: [f32; 4],
    character_count: f32,
    font_ratio: f32,
    font_color_strength: f32,
    backing_color_strength: f32,
}

/// Resample params — must match `RescaleParams` in `rescale.wgsl`
#[repr(C)]
#[derive(
    Debug, Clone, Copy, PartialEq, Default, bytemuck::Pod, bytemuck::Zeroable,
)]
pub struct RescaleUniforms {
    uv_offset: f32,
    _pad: [f32; 3],
}

impl AsciiUniforms {
    fn set(&mut self, param: ShaderParam, value: ParamValue) -> bool {
        let slot = match (param, value) {
            (ShaderParam::CharacterCount, ParamValue::Float(v)) => {
                self.character_count = v;
                return true;
            }
            (ShaderParam::FontRatio, ParamValue::Float(v)) => {
                self.font_ratio = v;
                return true;
            }
            (ShaderParam::FontColorStrength, ParamValue::Float(v)) => {
                self.font_color_strength = v;
                return true;
            }
            (ShaderParam::BackingColorStrength, ParamValue::Float(v)) => {
                self.backing_color_strength = v;
                return true;
            }
            (ShaderParam::Resolution, _) => &mut self.resolution,
            (ShaderParam::FontColor, _) => &mut self.font_color,
            (ShaderParam::BackingColor, _) => &mut self.backing_color,
            _ => return false,
        };
        match value {
            ParamValue::Vector(v) | ParamValue::Color(v) => {
                *slot = v.to_array();
                true
            }
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Uniforms {
    Ascii(AsciiUniforms),
    Rescale(RescaleUniforms),
}

/// A shader instance with its own parameter block.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    shader: ShaderKind,
    uniforms: Uniforms,
    font: Option<TextureId>,
}

impl Material {
    /// Material with zeroed parameters.
    #[must_use]
    pub fn new(shader: ShaderKind) -> Self {
        let uniforms = match shader {
            ShaderKind::Ascii => Uniforms::Ascii(AsciiUniforms::default()),
            ShaderKind::Rescale => {
                Uniforms::Rescale(RescaleUniforms::default())
            }
        };
        Self {
            shader,
            uniforms,
            font: None,
        }
    }

    /// Program this material draws with.
    #[must_use]
    pub fn shader(&self) -> ShaderKind {
        self.shader
    }

    /// Glyph atlas bound to the material.
    #[must_use]
    pub fn font(&self) -> Option<TextureId> {
        self.font
    }

    /// Write one parameter. Returns `false` (and logs) when the parameter
    /// does not exist on this material's program or has the wrong type.
    pub fn set(&mut self, param: ShaderParam, value: ParamValue) -> bool {
        let accepted = match &mut self.uniforms {
            Uniforms::Rescale(u) => match (param, value) {
                (ShaderParam::RescaleUvOffset, ParamValue::Float(v)) => {
                    u.uv_offset = v;
                    true
                }
                _ => false,
            },
            Uniforms::Ascii(u) => {
                if let (ShaderParam::FontAsset, ParamValue::Texture(t)) =
                    (param, value)
                {
                    self.font = Some(t);
                    true
                } else {
                    u.set(param, value)
                }
            }
        };
        if !accepted {
            log::warn!(
                "{} has no parameter {} of type {value:?}",
                self.shader.name(),
                param.name()
            );
        }
        accepted
    }

    /// Uniform block bytes as laid out in WGSL.
    #[must_use]
    pub fn uniform_bytes(&self) -> &[u8] {
        match &self.uniforms {
            Uniforms::Ascii(u) => bytemuck::bytes_of(u),
            Uniforms::Rescale(u) => bytemuck::bytes_of(u),
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec4;

    use super::*;

    #[test]
    fn uniform_sizes_match_wgsl() {
        assert_eq!(size_of::<AsciiUniforms>(), 64);
        assert_eq!(size_of::<RescaleUniforms>(), 16);
    }

    #[test]
    fn ascii_params_pack_in_order() {
        let mut material = Material::new(ShaderKind::Ascii);
        assert!(material.set(
            ShaderParam::Resolution,
            ParamValue::Vector(Vec4::new(128.0, 72.0, 1920.0, 1080.0))
        ));
        assert!(material
            .set(ShaderParam::CharacterCount, ParamValue::Float(10.0)));
        assert!(material
            .set(ShaderParam::FontAsset, ParamValue::Texture(TextureId(2))));

        let floats: &[f32] = bytemuck::cast_slice(material.uniform_bytes());
        assert_eq!(&floats[0..4], &[128.0, 72.0, 1920.0, 1080.0]);
        assert_eq!(floats[12], 10.0);
        assert_eq!(material.font(), Some(TextureId(2)));
    }

    #[test]
    fn wrong_parameter_is_rejected() {
        let mut rescale = Material::new(ShaderKind::Rescale);
        assert!(!rescale.set(ShaderParam::FontRatio, ParamValue::Float(3.0)));
        assert!(
            rescale.set(ShaderParam::RescaleUvOffset, ParamValue::Float(0.5))
        );
        let floats: &[f32] = bytemuck::cast_slice(rescale.uniform_bytes());
        assert_eq!(floats, &[0.5, 0.0, 0.0, 0.0]);

        let mut ascii = Material::new(ShaderKind::Ascii);
        assert!(!ascii
            .set(ShaderParam::FontRatio, ParamValue::Texture(TextureId(0))));
        assert!(!ascii.set(ShaderParam::FontColor, ParamValue::Float(1.0)));
    }
}
