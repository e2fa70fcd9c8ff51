//! Effect and demo-run options with TOML preset support.
//!
//! Presets live in `assets/presets/`. Every section uses
//! `#[serde(default)]`, so a file that only overrides `[effect]` works.

mod effect;
mod playback;

use std::path::Path;

pub use effect::{EffectSettings, InjectionPoint};
pub use playback::{FrameStatsOptions, PlaylistOptions};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::AsciiError;
use crate::playback::ScheduleStep;

/// Top-level options container.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default, JsonSchema)]
#[serde(default)]
pub struct Options {
    /// ASCII effect parameters.
    pub effect: EffectSettings,
    /// Clip sequencing for `render`.
    pub playlist: PlaylistOptions,
    /// Timed settings tweaks, applied by elapsed playback time.
    #[schemars(skip)]
    pub schedule: Vec<ScheduleStep>,
    /// Frame-time sampler.
    pub frame_stats: FrameStatsOptions,
}

impl Options {
    /// Generate JSON Schema describing the UI-exposed options.
    #[must_use]
    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(Options)
    }

    /// Load options from a TOML file. Missing fields use defaults.
    ///
    /// # Errors
    ///
    /// [`AsciiError::Io`] if the file cannot be read, or
    /// [`AsciiError::OptionsParse`] if it is not valid options TOML.
    pub fn load(path: &Path) -> Result<Self, AsciiError> {
        let content = std::fs::read_to_string(path)?;
        let options = Self::from_toml(&content)?;
        log::info!("loaded options from {}", path.display());
        Ok(options)
    }

    /// Parse options from TOML text.
    ///
    /// # Errors
    ///
    /// [`AsciiError::OptionsParse`] on malformed TOML or mistyped fields.
    pub fn from_toml(content: &str) -> Result<Self, AsciiError> {
        toml::from_str(content)
            .map_err(|e| AsciiError::OptionsParse(e.to_string()))
    }

    /// Save options to a TOML file (pretty-printed).
    ///
    /// # Errors
    ///
    /// [`AsciiError::OptionsParse`] if serialization fails, or
    /// [`AsciiError::Io`] if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), AsciiError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| AsciiError::OptionsParse(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        log::info!("saved options to {}", path.display());
        Ok(())
    }

    /// List available preset names (TOML file stems) in a directory.
    #[must_use]
    pub fn list_presets(dir: &Path) -> Vec<String> {
        let mut names = Vec::new();
        if let Ok(entries) = std::fs::read_dir(dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.extension().is_some_and(|ext| ext == "toml") {
                    if let Some(stem) =
                        path.file_stem().and_then(|s| s.to_str())
                    {
                        names.push(stem.to_owned());
                    }
                }
            }
        }
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::aspect::AspectRatio;

    #[test]
    fn default_round_trips_through_toml() {
        let opts = Options::default();
        let toml_str = toml::to_string_pretty(&opts).unwrap();
        let parsed: Options = toml::from_str(&toml_str).unwrap();
        assert_eq!(opts, parsed);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let toml_str = r"
[effect]
columns = 64
";
        let opts = Options::from_toml(toml_str).unwrap();
        assert_eq!(opts.effect.columns, 64);
        // Everything else should be default
        assert_eq!(opts.effect.iterations, 2);
        assert_eq!(opts.effect.backing_color_strength, 0.8);
        assert_eq!(opts.frame_stats.warmup_seconds, 3.0);
        assert!(opts.schedule.is_empty());
    }

    #[test]
    fn unknown_aspect_label_is_one_to_one() {
        let opts = Options::from_toml(
            r#"
[effect]
aspect_ratio = "21:9"
"#,
        )
        .unwrap();
        assert_eq!(opts.effect.aspect_ratio, AspectRatio::OneToOne);
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = Options::from_toml("[effect\ncolumns = ").unwrap_err();
        assert!(matches!(err, AsciiError::OptionsParse(_)));
    }

    #[test]
    fn schedule_round_trips() {
        let toml_str = r"
[[schedule]]
at_seconds = 5.0
columns = 32
iterations = 0

[[schedule]]
at_seconds = 10.0
columns = 64
";
        let opts = Options::from_toml(toml_str).unwrap();
        assert_eq!(opts.schedule.len(), 2);
        let again =
            Options::from_toml(&toml::to_string_pretty(&opts).unwrap())
                .unwrap();
        assert_eq!(opts, again);
    }

    #[test]
    fn bundled_default_preset_parses() {
        let opts = Options::from_toml(include_str!(
            "../../assets/presets/default.toml"
        ))
        .unwrap();
        assert_eq!(opts.schedule.len(), 3);
        assert_eq!(opts.effect, EffectSettings::default());
    }

    #[test]
    fn save_then_load() {
        let dir = std::env::temp_dir()
            .join(format!("ascii-post-options-{}", std::process::id()));
        let path = dir.join("saved.toml");
        let mut opts = Options::default();
        opts.effect.columns = 200;
        opts.save(&path).unwrap();
        assert_eq!(Options::load(&path).unwrap(), opts);
        assert_eq!(Options::list_presets(&dir), vec!["saved".to_owned()]);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn schema_has_expected_properties() {
        let schema_value =
            serde_json::to_value(Options::json_schema()).unwrap();
        let props = schema_value["properties"].as_object().unwrap();

        assert!(props.contains_key("effect"));
        assert!(props.contains_key("playlist"));
        assert!(props.contains_key("frame_stats"));
        assert!(!props.contains_key("schedule"));

        let effect = &props["effect"]["properties"];
        assert!(effect.get("columns").is_some());
        assert_eq!(effect["iterations"]["maximum"], 8);
        assert!(effect.get("font_color").is_none());
        assert!(effect.get("font_atlas").is_none());
    }
}
