//! The ASCII effect core, independent of any GPU API.
//!
//! - [`feature::AsciiRenderFeature`] - per-frame configure/execute/cleanup
//! - [`chain`] - downscale/upscale pyramid planning and recording
//! - [`resolution`] - character grid resolution with input caching
//! - [`binding`] - shader parameter values
//! - [`lifecycle`] - callback ordering guard

/// Character-grid aspect ratios.
pub mod aspect;
/// Material parameter values.
pub mod binding;
/// Downscale/upscale pyramid.
pub mod chain;
/// The effect and its frame callbacks.
pub mod feature;
/// Frame stage tracking.
pub mod lifecycle;
/// Character-grid resolution cache.
pub mod resolution;

pub use aspect::AspectRatio;
pub use feature::{
    AsciiRenderFeature, FrameOutcome, FrameReport, ScreenEffect, SkipReason,
};
pub use resolution::{ResolutionResolver, ResolvedResolution};
