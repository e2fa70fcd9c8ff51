//! GPU resource management utilities.
//!
//! Provides headless wgpu initialization, render targets with readback,
//! scratch texture pooling, glyph atlases and shader composition.

/// Glyph atlas loading and upload.
pub mod glyph_atlas;
/// Shared wgpu boilerplate helpers for screen-space pipelines.
pub mod pipeline_helpers;
/// wgpu device and queue initialization.
pub mod render_context;
/// WGSL shader composition with `#import` support via naga-oil.
pub mod shader_composer;
/// Render-target textures with CPU upload and readback.
pub mod texture;
/// Per-frame scratch texture recycling.
pub mod transient_pool;
