//! Timed settings tweaks for demos and recorded runs.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::effect::aspect::AspectRatio;
use crate::options::EffectSettings;

/// Partial [`EffectSettings`]; only `Some` fields are written.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SettingsPatch {
    /// Overrides [`EffectSettings::character_count`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub character_count: Option<u32>,
    /// Overrides [`EffectSettings::columns`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub columns: Option<u32>,
    /// Overrides [`EffectSettings::aspect_ratio`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<AspectRatio>,
    /// Overrides [`EffectSettings::flip_aspect`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flip_aspect: Option<bool>,
    /// Overrides [`EffectSettings::font_ratio`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_ratio: Option<f32>,
    /// Overrides [`EffectSettings::font_color`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_color: Option<[f32; 3]>,
    /// Overrides [`EffectSettings::font_color_strength`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_color_strength: Option<f32>,
    /// Overrides [`EffectSettings::backing_color`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backing_color: Option<[f32; 3]>,
    /// Overrides [`EffectSettings::backing_color_strength`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backing_color_strength: Option<f32>,
    /// Overrides [`EffectSettings::iterations`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iterations: Option<u32>,
}

impl SettingsPatch {
    /// Write every set field into `settings`.
    pub fn apply(&self, settings: &mut EffectSettings) {
        fn set<T: Copy>(slot: &mut T, value: Option<T>) {
            if let Some(value) = value {
                *slot = value;
            }
        }
        set(&mut settings.character_count, self.character_count);
        set(&mut settings.columns, self.columns);
        set(&mut settings.aspect_ratio, self.aspect_ratio);
        set(&mut settings.flip_aspect, self.flip_aspect);
        set(&mut settings.font_ratio, self.font_ratio);
        set(&mut settings.font_color, self.font_color);
        set(&mut settings.font_color_strength, self.font_color_strength);
        set(&mut settings.backing_color, self.backing_color);
        set(&mut settings.backing_color_strength, self.backing_color_strength);
        set(&mut settings.iterations, self.iterations);
    }

    /// Whether applying the patch would change nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// One entry of a [`TweakSchedule`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ScheduleStep {
    /// Seconds since the schedule started.
    pub at_seconds: f32,
    /// Settings written once `at_seconds` has passed.
    #[serde(flatten)]
    pub patch: SettingsPatch,
}

/// Applies [`ScheduleStep`]s in time order, each exactly once.
#[derive(Debug, Clone, Default)]
pub struct TweakSchedule {
    steps: Vec<ScheduleStep>,
    next: usize,
}

impl TweakSchedule {
    /// Build a schedule; steps are sorted by time, ties keep file order.
    #[must_use]
    pub fn new(mut steps: Vec<ScheduleStep>) -> Self {
        steps.retain(|step| step.at_seconds.is_finite());
        steps.sort_by(|a, b| a.at_seconds.total_cmp(&b.at_seconds));
        Self { steps, next: 0 }
    }

    /// Apply every pending step whose time has passed. Returns `true` if
    /// any step was applied.
    pub fn update(
        &mut self,
        elapsed: Duration,
        settings: &mut EffectSettings,
    ) -> bool {
        let now = elapsed.as_secs_f32();
        let start = self.next;
        while let Some(step) = self.steps.get(self.next) {
            if step.at_seconds > now {
                break;
            }
            step.patch.apply(settings);
            log::debug!("applied schedule step at {:.2}s", step.at_seconds);
            self.next += 1;
        }
        self.next > start
    }

    /// Rewind so every step applies again.
    pub fn reset(&mut self) {
        self.next = 0;
    }

    /// Steps not yet applied.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.steps.len() - self.next
    }

    /// Whether every step has been applied.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.next >= self.steps.len()
    }
}
