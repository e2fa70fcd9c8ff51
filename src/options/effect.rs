//! Persisted effect settings and their per-frame sanitizing.

use std::path::PathBuf;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::effect::aspect::AspectRatio;
use crate::effect::chain::MAX_ITERATIONS;

/// Where in the frame the host schedules the effect.
#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    Default,
    JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum InjectionPoint {
    /// After opaque/transparent geometry, before the host's post stack.
    #[default]
    BeforePostProcessing,
    /// After the host's post stack.
    AfterPostProcessing,
}

impl InjectionPoint {
    /// Sort key for ordering passes within a frame; lower runs first.
    #[must_use]
    pub fn order(self) -> i32 {
        match self {
            Self::BeforePostProcessing => 550,
            Self::AfterPostProcessing => 600,
        }
    }
}

/// Persisted configuration of the ASCII effect.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "ASCII Effect", inline)]
#[serde(default)]
pub struct EffectSettings {
    /// Number of glyphs in the font atlas.
    #[schemars(title = "Characters", range(min = 1, max = 64))]
    pub character_count: u32,
    /// Number of glyph columns across the surface.
    #[schemars(title = "Columns", range(min = 1, max = 1024))]
    pub columns: u32,
    /// Aspect ratio of one character cell.
    #[schemars(title = "Aspect Ratio")]
    pub aspect_ratio: AspectRatio,
    /// Swap the aspect ratio's numerator and denominator.
    #[schemars(title = "Flip Aspect")]
    pub flip_aspect: bool,
    /// Glyph height-to-width ratio inside a cell.
    #[schemars(
        title = "Font Ratio",
        range(min = 1.0, max = 8.0),
        extend("step" = 0.1)
    )]
    pub font_ratio: f32,
    /// Glyph tint (linear RGB, may exceed 1 for HDR targets).
    #[schemars(skip)]
    pub font_color: [f32; 3],
    /// Blend between the source color (0) and the glyph tint (1).
    #[schemars(
        title = "Font Color Strength",
        range(min = 0.0, max = 1.0),
        extend("step" = 0.01)
    )]
    pub font_color_strength: f32,
    /// Cell background color (linear RGB).
    #[schemars(skip)]
    pub backing_color: [f32; 3],
    /// Blend between the source color (0) and the background color (1).
    #[schemars(
        title = "Backing Color Strength",
        range(min = 0.0, max = 1.0),
        extend("step" = 0.01)
    )]
    pub backing_color_strength: f32,
    /// Downscale iterations before compositing.
    #[schemars(title = "Iterations", range(min = 0, max = 8))]
    pub iterations: u32,
    /// Frame position of the pass.
    #[schemars(title = "Injection Point")]
    pub injection_point: InjectionPoint,
    /// PNG glyph atlas; the built-in ramp is used when unset.
    #[schemars(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_atlas: Option<PathBuf>,
}

impl Default for EffectSettings {
    fn default() -> Self {
        Self {
            character_count: 10,
            columns: 128,
            aspect_ratio: AspectRatio::OneToOne,
            flip_aspect: false,
            font_ratio: 3.0,
            font_color: [1.0, 1.0, 1.0],
            font_color_strength: 0.0,
            backing_color: [0.0, 0.0, 0.0],
            backing_color_strength: 0.8,
            iterations: 2,
            injection_point: InjectionPoint::BeforePostProcessing,
            font_atlas: None,
        }
    }
}

impl EffectSettings {
    /// Copy with every numeric field forced into its valid range.
    ///
    /// Non-finite floats fall back to their defaults.
    #[must_use]
    pub fn sanitized(&self) -> Self {
        let defaults = Self::default();
        let finite_or = |value: f32, fallback: f32| {
            if value.is_finite() {
                value
            } else {
                fallback
            }
        };
        let color = |value: [f32; 3], fallback: [f32; 3]| {
            let mut out = value;
            for (c, f) in out.iter_mut().zip(fallback) {
                *c = finite_or(*c, f).max(0.0);
            }
            out
        };

        Self {
            character_count: self.character_count.max(1),
            columns: self.columns.max(1),
            font_ratio: finite_or(self.font_ratio, defaults.font_ratio)
                .max(1.0),
            font_color: color(self.font_color, defaults.font_color),
            font_color_strength: finite_or(
                self.font_color_strength,
                defaults.font_color_strength,
            )
            .clamp(0.0, 1.0),
            backing_color: color(self.backing_color, defaults.backing_color),
            backing_color_strength: finite_or(
                self.backing_color_strength,
                defaults.backing_color_strength,
            )
            .clamp(0.0, 1.0),
            iterations: self.iterations.min(MAX_ITERATIONS),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_clamps_out_of_range_values() {
        let wild = EffectSettings {
            character_count: 0,
            columns: 0,
            font_ratio: f32::NAN,
            font_color_strength: 4.0,
            backing_color: [f32::INFINITY, -1.0, 0.5],
            backing_color_strength: -0.5,
            iterations: 12,
            ..EffectSettings::default()
        };
        let clean = wild.sanitized();
        assert_eq!(clean.character_count, 1);
        assert_eq!(clean.columns, 1);
        assert_eq!(clean.font_ratio, 3.0);
        assert_eq!(clean.font_color_strength, 1.0);
        assert_eq!(clean.backing_color, [0.0, 0.0, 0.5]);
        assert_eq!(clean.backing_color_strength, 0.0);
        assert_eq!(clean.iterations, MAX_ITERATIONS);
    }

    #[test]
    fn sanitize_keeps_valid_settings() {
        let settings = EffectSettings::default();
        assert_eq!(settings.sanitized(), settings);
    }

    #[test]
    fn injection_order() {
        assert!(
            InjectionPoint::BeforePostProcessing.order()
                < InjectionPoint::AfterPostProcessing.order()
        );
    }
}
