//! Playlist and frame statistics options for demo runs.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Clip sequencing for the `render` command.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Playlist", inline)]
#[serde(default)]
pub struct PlaylistOptions {
    /// Start over at the first clip after the last one.
    #[schemars(title = "Loop From End")]
    pub loop_from_end: bool,
    /// Frames rendered per still-image clip.
    #[schemars(title = "Frames Per Clip", range(min = 1, max = 10000))]
    pub frames_per_clip: u32,
    /// Simulated playback rate for still-image clips.
    #[schemars(title = "FPS", range(min = 1, max = 240))]
    pub fps: u32,
    /// Clip sources (paths or URLs), played in order.
    #[schemars(skip)]
    pub clips: Vec<String>,
}

impl Default for PlaylistOptions {
    fn default() -> Self {
        Self {
            loop_from_end: false,
            frames_per_clip: 60,
            fps: 30,
            clips: Vec::new(),
        }
    }
}

/// Frame-time sampling.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Frame Stats", inline)]
#[serde(default)]
pub struct FrameStatsOptions {
    /// Seconds to wait before sampling frame times.
    #[schemars(
        title = "Warm-up (s)",
        range(min = 0.0, max = 30.0),
        extend("step" = 0.5)
    )]
    pub warmup_seconds: f32,
    /// Weight of the newest frame in the trailing average.
    #[schemars(
        title = "Smoothing",
        range(min = 0.0001, max = 1.0),
        extend("step" = 0.001)
    )]
    pub smoothing: f32,
    /// Log a summary every N frames (0 disables logging).
    #[schemars(title = "Log Interval", range(min = 0, max = 10000))]
    pub log_interval_frames: u32,
}

impl Default for FrameStatsOptions {
    fn default() -> Self {
        Self {
            warmup_seconds: 3.0,
            smoothing: 0.005,
            log_interval_frames: 60,
        }
    }
}
