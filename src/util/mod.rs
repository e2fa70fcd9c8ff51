//! Frame pacing and frame-time statistics.

pub mod frame_stats;
pub mod frame_timing;

pub use frame_stats::FrameStats;
pub use frame_timing::FrameTiming;
