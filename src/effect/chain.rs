//! Downscale/upscale pyramid run before compositing.
//!
//! The frame is halved level by level into scratch surfaces, then blitted
//! back up through the same surfaces and finally into one full-resolution
//! surface. The result is a blurred, blocky approximation of the frame
//! that the glyph shader samples per cell.
//!
//! ```text
//! target ─▶ L0 (w/2) ─▶ L1 (w/4) ─▶ … ─▶ Lk-1   downscale, offset 1.0
//!            ▲           │ ▲                │
//!            └───────────┘ └────────────────┘    upscale, offset 0.5
//!  L0 ─▶ final upscale (w)                       sampled by the compositor
//! ```

use super::binding::bind_rescale_offset;
use crate::host::{
    MaterialId, RenderHost, SurfaceDesc, SurfaceId, TransientId,
    SCRATCH_FORMAT,
};

/// Upper bound on configured iterations.
pub const MAX_ITERATIONS: u32 = 8;

/// Smallest width/height a pyramid level may have.
pub const MIN_LEVEL_SIZE: u32 = 2;

/// Resample weighting while walking down the pyramid.
pub const DOWNSCALE_OFFSET: f32 = 1.0;

/// Resample weighting while walking back up.
pub const UPSCALE_OFFSET: f32 = 0.5;

const LEVEL_LABELS: [&str; MAX_ITERATIONS as usize] = [
    "_Sample0", "_Sample1", "_Sample2", "_Sample3", "_Sample4", "_Sample5",
    "_Sample6", "_Sample7",
];

/// Label of the full-resolution surface the pyramid is reconstructed into.
pub const FINAL_UPSCALE_LABEL: &str = "_FinalUpscale";

/// Number of pyramid levels a `width`×`height` surface supports for a
/// requested iteration count.
#[must_use]
pub fn achievable_levels(width: u32, height: u32, requested: u32) -> u32 {
    let (mut w, mut h) = (width, height);
    let mut levels = 0;
    while levels < requested.min(MAX_ITERATIONS) {
        w /= 2;
        h /= 2;
        if w < MIN_LEVEL_SIZE || h < MIN_LEVEL_SIZE {
            break;
        }
        levels += 1;
    }
    levels
}

/// Sizes of every pyramid level for one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainPlan {
    source: SurfaceDesc,
    levels: Vec<SurfaceDesc>,
    requested: u32,
}

impl ChainPlan {
    /// Plan the pyramid below `target`. The requested count is clamped to
    /// [`MAX_ITERATIONS`], then cut short where a level would drop below
    /// [`MIN_LEVEL_SIZE`].
    #[must_use]
    pub fn new(target: SurfaceDesc, requested: u32) -> Self {
        let requested = requested.min(MAX_ITERATIONS);
        let source = target.with_format(SCRATCH_FORMAT);
        let mut levels = Vec::with_capacity(requested as usize);
        let mut desc = source;
        for _ in 0..requested {
            desc = desc.halved();
            if desc.width < MIN_LEVEL_SIZE || desc.height < MIN_LEVEL_SIZE {
                break;
            }
            levels.push(desc);
        }

        if levels.len() < requested as usize {
            log::debug!(
                "ASCII chain clamped to {} of {requested} iterations for {}x{}",
                levels.len(),
                target.width,
                target.height
            );
        }

        Self {
            source,
            levels,
            requested,
        }
    }

    /// Full-resolution descriptor in the scratch format.
    #[must_use]
    pub fn source(&self) -> SurfaceDesc {
        self.source
    }

    /// Level descriptors, finest first.
    #[must_use]
    pub fn levels(&self) -> &[SurfaceDesc] {
        &self.levels
    }

    /// Iteration count after clamping.
    #[must_use]
    pub fn requested(&self) -> u32 {
        self.requested
    }

    /// Number of levels that will actually be built.
    #[must_use]
    pub fn effective_iterations(&self) -> u32 {
        self.levels.len() as u32
    }

    /// Whether the surface size forced fewer levels than requested.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.effective_iterations() < self.requested
    }

    /// Whether the chain runs at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

/// The scratch surfaces one frame's pyramid lives in.
///
/// Handles are kept in a reusable list: [`release_all`](Self::release_all)
/// empties it without giving up its capacity.
#[derive(Debug, Default)]
pub struct FrameTargetChain {
    levels: Vec<TransientId>,
    final_upscale: Option<TransientId>,
}

impl FrameTargetChain {
    /// Create an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self {
            levels: Vec::with_capacity(MAX_ITERATIONS as usize),
            final_upscale: None,
        }
    }

    /// Record the pyramid for `plan`, reading from `source`, and return the
    /// surface the compositor should sample. An empty plan returns `source`
    /// without allocating.
    pub fn build<H: RenderHost + ?Sized>(
        &mut self,
        host: &mut H,
        plan: &ChainPlan,
        source: SurfaceId,
        rescale: MaterialId,
    ) -> SurfaceId {
        if plan.is_empty() {
            return source;
        }

        bind_rescale_offset(host, rescale, DOWNSCALE_OFFSET);
        let mut previous = source;
        for (desc, label) in plan.levels().iter().zip(LEVEL_LABELS) {
            let id = host.acquire_temporary(desc, label);
            self.levels.push(id);
            let level = SurfaceId::Transient(id);
            host.blit(previous, level, Some(rescale));
            previous = level;
        }

        bind_rescale_offset(host, rescale, UPSCALE_OFFSET);
        for pair in self.levels.windows(2).rev() {
            host.blit(
                SurfaceId::Transient(pair[1]),
                SurfaceId::Transient(pair[0]),
                Some(rescale),
            );
        }

        let final_upscale =
            host.acquire_temporary(&plan.source(), FINAL_UPSCALE_LABEL);
        self.final_upscale = Some(final_upscale);
        host.blit(
            SurfaceId::Transient(self.levels[0]),
            SurfaceId::Transient(final_upscale),
            Some(rescale),
        );
        SurfaceId::Transient(final_upscale)
    }

    /// Number of surfaces currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.levels.len() + usize::from(self.final_upscale.is_some())
    }

    /// Whether no surfaces are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Release every held surface and return how many were released.
    pub fn release_all<H: RenderHost + ?Sized>(
        &mut self,
        host: &mut H,
    ) -> usize {
        let mut released = 0;
        if let Some(id) = self.final_upscale.take() {
            host.release_temporary(id);
            released += 1;
        }
        for id in self.levels.drain(..) {
            host.release_temporary(id);
            released += 1;
        }
        released
    }
}
