//! wgpu backend for the ASCII effect.
//!
//! Contains the blit pipelines (copy, rescale, glyph compositing), CPU-side
//! material state, and the [`frame::GpuFrame`] host that records them.

pub mod frame;
pub mod materials;
pub mod pipelines;

pub use frame::{GpuFrame, GpuRenderer};
