//! Per-frame callback ordering.
//!
//! ```text
//!  Configured ──configure──▶ Prepared ──execute──▶ Executing
//!      ▲                        │                     │
//!      │                        └──────cleanup────────┤
//!      │                                              ▼
//!      └────────────── (next frame) ◀──────────── CleanedUp
//! ```

use crate::error::AsciiError;

/// Stage of the current frame's callback cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameStage {
    /// Settings loaded; no frame in flight.
    #[default]
    Configured,
    /// Surfaces declared and materials ready for this frame.
    Prepared,
    /// Commands recorded for this frame.
    Executing,
    /// Every surface acquired this frame has been released.
    CleanedUp,
}

/// Guards the `configure → execute → cleanup` order.
#[derive(Debug, Default)]
pub struct FrameLifecycle {
    stage: FrameStage,
    frames: u64,
}

impl FrameLifecycle {
    /// Start in [`FrameStage::Configured`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current stage.
    #[must_use]
    pub fn stage(&self) -> FrameStage {
        self.stage
    }

    /// Number of frames that reached [`FrameStage::CleanedUp`].
    #[must_use]
    pub fn completed_frames(&self) -> u64 {
        self.frames
    }

    /// Enter `Prepared`. Only legal between frames.
    ///
    /// # Errors
    ///
    /// [`AsciiError::Lifecycle`] while a frame is in flight.
    pub fn begin_prepare(&mut self) -> Result<(), AsciiError> {
        match self.stage {
            FrameStage::Configured | FrameStage::CleanedUp => {
                self.stage = FrameStage::Prepared;
                Ok(())
            }
            stage => Err(AsciiError::Lifecycle {
                operation: "configure",
                stage,
            }),
        }
    }

    /// Enter `Executing`. Only legal right after `Prepared`.
    ///
    /// # Errors
    ///
    /// [`AsciiError::Lifecycle`] from any other stage.
    pub fn begin_execute(&mut self) -> Result<(), AsciiError> {
        match self.stage {
            FrameStage::Prepared => {
                self.stage = FrameStage::Executing;
                Ok(())
            }
            stage => Err(AsciiError::Lifecycle {
                operation: "execute",
                stage,
            }),
        }
    }

    /// Enter `CleanedUp`. Returns `false` when no frame was in flight, in
    /// which case there is nothing to release.
    pub fn finish(&mut self) -> bool {
        match self.stage {
            FrameStage::Prepared | FrameStage::Executing => {
                self.stage = FrameStage::CleanedUp;
                self.frames += 1;
                true
            }
            FrameStage::Configured | FrameStage::CleanedUp => false,
        }
    }
}
