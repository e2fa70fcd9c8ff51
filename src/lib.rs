// -- Lint policy ---------------------------------------------------------
// This is the single source of truth for crate-wide lints.

// Broad lint groups
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
// Documentation
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::bare_urls)]
// No panicking in library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
// No debug/print artifacts
#![deny(clippy::dbg_macro)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]
// Import hygiene
#![deny(clippy::wildcard_imports)]
// Complexity limits (thresholds in clippy.toml)
#![deny(clippy::cognitive_complexity)]
#![deny(clippy::too_many_lines)]
#![deny(clippy::excessive_nesting)]
// Function signature hygiene
#![deny(clippy::too_many_arguments)]
#![deny(clippy::fn_params_excessive_bools)]
// Clone / pass-by-value hygiene
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::implicit_clone)]
// String hygiene
#![deny(clippy::inefficient_to_string)]
#![deny(clippy::redundant_closure_for_method_calls)]
#![deny(clippy::manual_string_new)]
#![deny(clippy::str_to_string)]
// Cargo lints (warn, not deny since cargo lints can be noisy)
#![warn(clippy::cargo)]
// Unused / redundant code
#![deny(unused_results)]
#![deny(unused_qualifications)]
// Cast hygiene
#![deny(trivial_casts)]
#![deny(trivial_numeric_casts)]

//! ASCII-art post-processing screen filter for wgpu render pipelines.
//!
//! The effect turns a rendered frame into a grid of glyphs. Each frame it
//! optionally blurs the image through a downscale/upscale chain, then
//! composites one glyph per character cell: the glyph is picked by cell
//! luminance and tinted between the source color and a configured font
//! color, over a configurable background.
//!
//! # Key entry points
//!
//! - [`effect::AsciiRenderFeature`] - the effect, driven once per frame
//!   through [`effect::ScreenEffect`]
//! - [`host::RenderHost`] - the resource and command interface a host
//!   provides; [`renderer::GpuRenderer`] implements it with wgpu and
//!   [`host::recording::RecordingHost`] records commands in memory
//! - [`options::Options`] - effect settings and demo-run configuration,
//!   loaded from TOML presets
//! - [`playback`] - clip playlists and timed settings tweaks
//!
//! # Frame flow
//!
//! ```text
//! configure ─► resolve grid, ensure materials, acquire composite
//! execute   ─► target ─► downscale × N ─► upscale back ─► _FinalUpscale
//!              ─► ascii ─► _ASCIITarget ─► copy ─► target
//! cleanup   ─► release every surface acquired this frame
//! ```

pub mod effect;
pub mod error;
pub mod gpu;
pub mod host;
pub mod options;
pub mod playback;
pub mod renderer;
pub mod util;

pub use error::AsciiError;
