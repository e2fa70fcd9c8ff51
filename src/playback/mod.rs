//! Demo-run collaborators: clip playlists and timed settings tweaks.

pub mod playlist;
pub mod schedule;

pub use playlist::{normalize_share_url, Playlist, PlaylistEvent};
pub use schedule::{ScheduleStep, SettingsPatch, TweakSchedule};
