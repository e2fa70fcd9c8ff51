//! The ASCII render feature: one `configure → execute → cleanup` cycle per
//! frame, driven by a [`RenderHost`].

use glam::UVec2;

use super::binding::ShaderBinding;
use super::chain::{ChainPlan, FrameTargetChain};
use super::lifecycle::{FrameLifecycle, FrameStage};
use super::resolution::{ResolutionResolver, ResolvedResolution};
use crate::error::AsciiError;
use crate::host::{
    MaterialId, RenderHost, ShaderKind, SurfaceDesc, SurfaceId, TextureId,
    TransientId, SCRATCH_FORMAT,
};
use crate::options::{EffectSettings, InjectionPoint};

/// Label of the surface the glyph shader renders into.
pub const COMPOSITE_LABEL: &str = "_ASCIITarget";

/// Frame callbacks a host invokes on a screen-space effect.
pub trait ScreenEffect {
    /// Declare this frame's surfaces and make sure materials exist.
    ///
    /// # Errors
    ///
    /// [`AsciiError::Lifecycle`] when the previous frame was not cleaned up.
    fn configure(
        &mut self,
        host: &mut dyn RenderHost,
        target: SurfaceDesc,
    ) -> Result<(), AsciiError>;

    /// Record the effect's commands.
    ///
    /// # Errors
    ///
    /// [`AsciiError::Lifecycle`] unless `configure` ran first this frame.
    fn execute(
        &mut self,
        host: &mut dyn RenderHost,
    ) -> Result<FrameReport, AsciiError>;

    /// Release everything acquired this frame; returns how many surfaces
    /// were released.
    fn cleanup(&mut self, host: &mut dyn RenderHost) -> usize;

    /// Where in the frame the host should schedule the effect.
    fn injection_point(&self) -> InjectionPoint;
}

/// Why a frame was passed through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The host could not provide a shader program.
    MissingShader(ShaderKind),
    /// No glyph atlas has been set, or the host no longer has it.
    MissingGlyphTexture,
    /// The frame target has a zero dimension.
    EmptySurface,
}

/// Whether the effect drew this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Glyphs were composited into the target.
    Applied,
    /// The target was left as rendered.
    Skipped(SkipReason),
}

/// What one `execute` call did.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    /// Applied or skipped.
    pub outcome: FrameOutcome,
    /// Iterations after clamping to the configured bound.
    pub requested_iterations: u32,
    /// Pyramid levels actually built.
    pub effective_iterations: u32,
    /// Pyramid level sizes, finest first.
    pub levels: Vec<UVec2>,
    /// Character grid used.
    pub grid: Option<ResolvedResolution>,
    /// Parameters pushed to the glyph material.
    pub binding: Option<ShaderBinding>,
}

impl FrameReport {
    fn skipped(reason: SkipReason, requested: u32) -> Self {
        Self {
            outcome: FrameOutcome::Skipped(reason),
            requested_iterations: requested,
            effective_iterations: 0,
            levels: Vec::new(),
            grid: None,
            binding: None,
        }
    }

    /// Whether the effect drew this frame.
    #[must_use]
    pub fn applied(&self) -> bool {
        self.outcome == FrameOutcome::Applied
    }
}

/// ASCII-art screen filter.
///
/// Holds only cross-frame state: settings, the cached character grid and
/// material handles. Every surface it acquires is released in
/// [`cleanup`](ScreenEffect::cleanup) of the same frame.
#[derive(Debug)]
pub struct AsciiRenderFeature {
    settings: EffectSettings,
    frame_settings: EffectSettings,
    resolver: ResolutionResolver,
    lifecycle: FrameLifecycle,

    ascii_material: Option<MaterialId>,
    rescale_material: Option<MaterialId>,
    font_texture: Option<TextureId>,

    target: Option<SurfaceDesc>,
    composite: Option<TransientId>,
    chain: FrameTargetChain,

    last_skip: Option<SkipReason>,
}

impl AsciiRenderFeature {
    /// Create the feature from persisted settings.
    #[must_use]
    pub fn new(settings: EffectSettings) -> Self {
        let frame_settings = settings.sanitized();
        Self {
            settings,
            frame_settings,
            resolver: ResolutionResolver::new(),
            lifecycle: FrameLifecycle::new(),
            ascii_material: None,
            rescale_material: None,
            font_texture: None,
            target: None,
            composite: None,
            chain: FrameTargetChain::new(),
            last_skip: None,
        }
    }

    /// Persisted settings as last written.
    #[must_use]
    pub fn settings(&self) -> &EffectSettings {
        &self.settings
    }

    /// Mutable settings; changes take effect at the next `configure`.
    pub fn settings_mut(&mut self) -> &mut EffectSettings {
        self.resolver.invalidate();
        &mut self.settings
    }

    /// Replace the settings.
    pub fn set_settings(&mut self, settings: EffectSettings) {
        self.resolver.invalidate();
        self.settings = settings;
    }

    /// Set (or clear) the glyph atlas texture.
    pub fn set_font_texture(&mut self, texture: Option<TextureId>) {
        self.font_texture = texture;
    }

    /// Current frame stage.
    #[must_use]
    pub fn stage(&self) -> FrameStage {
        self.lifecycle.stage()
    }

    /// Last resolved character grid.
    #[must_use]
    pub fn resolution(&self) -> Option<ResolvedResolution> {
        self.resolver.current()
    }

    /// How often the grid was recomputed.
    #[must_use]
    pub fn resolution_recomputes(&self) -> u64 {
        self.resolver.recompute_count()
    }

    /// Frames completed so far.
    #[must_use]
    pub fn completed_frames(&self) -> u64 {
        self.lifecycle.completed_frames()
    }

    /// Destroy the materials this feature created. A later `configure`
    /// recreates them.
    pub fn dispose(&mut self, host: &mut dyn RenderHost) {
        if let Some(material) = self.ascii_material.take() {
            host.destroy_material(material);
        }
        if let Some(material) = self.rescale_material.take() {
            host.destroy_material(material);
        }
    }

    fn ensure_materials(&mut self, host: &mut dyn RenderHost) {
        if self.ascii_material.is_none() {
            self.ascii_material = host.create_material(ShaderKind::Ascii);
        }
        if self.frame_settings.iterations > 0 && self.rescale_material.is_none()
        {
            self.rescale_material = host.create_material(ShaderKind::Rescale);
        }
    }

    fn skip_reason(
        &self,
        host: &dyn RenderHost,
        target: SurfaceDesc,
    ) -> Option<SkipReason> {
        if target.width == 0 || target.height == 0 {
            return Some(SkipReason::EmptySurface);
        }
        if self.ascii_material.is_none() {
            return Some(SkipReason::MissingShader(ShaderKind::Ascii));
        }
        if self.frame_settings.iterations > 0 && self.rescale_material.is_none()
        {
            return Some(SkipReason::MissingShader(ShaderKind::Rescale));
        }
        match self.font_texture {
            Some(font) if host.has_texture(font) => None,
            _ => Some(SkipReason::MissingGlyphTexture),
        }
    }

    fn note_skip(&mut self, reason: SkipReason) {
        if self.last_skip != Some(reason) {
            log::warn!("ASCII effect skipped: {reason:?}");
        }
        self.last_skip = Some(reason);
    }
}

impl ScreenEffect for AsciiRenderFeature {
    fn configure(
        &mut self,
        host: &mut dyn RenderHost,
        target: SurfaceDesc,
    ) -> Result<(), AsciiError> {
        self.lifecycle.begin_prepare()?;
        self.frame_settings = self.settings.sanitized();
        self.ensure_materials(host);

        let settings = &self.frame_settings;
        let _ = self.resolver.resolve(
            target.size(),
            settings.columns,
            settings.aspect_ratio,
            settings.flip_aspect,
        );

        if target.width > 0 && target.height > 0 {
            self.composite = Some(host.acquire_temporary(
                &target.with_format(SCRATCH_FORMAT),
                COMPOSITE_LABEL,
            ));
        }
        self.target = Some(target);
        Ok(())
    }

    fn execute(
        &mut self,
        host: &mut dyn RenderHost,
    ) -> Result<FrameReport, AsciiError> {
        self.lifecycle.begin_execute()?;
        let requested = self.frame_settings.iterations;

        let empty = FrameReport::skipped(SkipReason::EmptySurface, requested);
        let Some(target) = self.target else {
            return Ok(empty);
        };
        if let Some(reason) = self.skip_reason(&*host, target) {
            self.note_skip(reason);
            return Ok(FrameReport::skipped(reason, requested));
        }
        let (Some(ascii), Some(composite)) =
            (self.ascii_material, self.composite)
        else {
            return Ok(empty);
        };
        self.last_skip = None;

        let settings = &self.frame_settings;
        let grid = self.resolver.resolve(
            target.size(),
            settings.columns,
            settings.aspect_ratio,
            settings.flip_aspect,
        );
        let binding = ShaderBinding::new(
            settings,
            grid,
            target.size(),
            self.font_texture,
        );
        binding.apply(host, ascii);

        let plan = ChainPlan::new(target, requested);
        let input = match self.rescale_material {
            Some(rescale) if requested > 0 => {
                self.chain.build(host, &plan, SurfaceId::Target, rescale)
            }
            _ => SurfaceId::Target,
        };

        let composite = SurfaceId::Transient(composite);
        host.blit(input, composite, Some(ascii));
        host.blit(composite, SurfaceId::Target, None);

        Ok(FrameReport {
            outcome: FrameOutcome::Applied,
            requested_iterations: plan.requested(),
            effective_iterations: plan.effective_iterations(),
            levels: plan.levels().iter().map(|d| d.size()).collect(),
            grid: Some(grid),
            binding: Some(binding),
        })
    }

    fn cleanup(&mut self, host: &mut dyn RenderHost) -> usize {
        let mut released = self.chain.release_all(host);
        if let Some(composite) = self.composite.take() {
            host.release_temporary(composite);
            released += 1;
        }
        self.target = None;
        let _ = self.lifecycle.finish();
        released
    }

    fn injection_point(&self) -> InjectionPoint {
        self.settings.injection_point
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::recording::{HostCommand, HostViolation, RecordingHost};

    fn target(width: u32, height: u32) -> SurfaceDesc {
        SurfaceDesc::new(width, height, wgpu::TextureFormat::Bgra8UnormSrgb)
    }

    fn feature(iterations: u32) -> AsciiRenderFeature {
        let mut feature = AsciiRenderFeature::new(EffectSettings {
            iterations,
            ..EffectSettings::default()
        });
        feature.set_font_texture(Some(TextureId(0)));
        feature
    }

    fn run_frame(
        feature: &mut AsciiRenderFeature,
        host: &mut RecordingHost,
        desc: SurfaceDesc,
    ) -> (FrameReport, usize) {
        feature.configure(host, desc).unwrap();
        let report = feature.execute(host).unwrap();
        let released = feature.cleanup(host);
        (report, released)
    }

    #[test]
    fn full_frame_releases_everything() {
        let mut host = RecordingHost::new();
        let mut fx = feature(4);
        let (report, released) =
            run_frame(&mut fx, &mut host, target(256, 256));

        assert!(report.applied());
        assert_eq!(report.effective_iterations, 4);
        assert_eq!(
            report.levels,
            vec![
                UVec2::splat(128),
                UVec2::splat(64),
                UVec2::splat(32),
                UVec2::splat(16)
            ]
        );
        // 4 levels + final upscale + composite
        assert_eq!(released, 6);
        assert_eq!(host.outstanding(), 0);
        assert!(host.violations().is_empty());
        assert_eq!(fx.stage(), FrameStage::CleanedUp);

        let blits = host.blits();
        let last_two = &blits[blits.len() - 2..];
        assert_eq!(last_two[1].1, SurfaceId::Target);
        assert_eq!(last_two[1].2, None);
        assert_eq!(last_two[0].1, last_two[1].0);
    }

    #[test]
    fn degraded_chain_still_releases_each_surface_once() {
        let mut host = RecordingHost::new();
        let mut fx = feature(8);
        let (report, released) = run_frame(&mut fx, &mut host, target(8, 8));

        assert_eq!(report.requested_iterations, 8);
        assert_eq!(report.effective_iterations, 2);
        assert_eq!(released, 4);
        assert_eq!(host.outstanding(), 0);
        assert!(host.violations().is_empty());
        // The configured count is untouched by the clamp.
        assert_eq!(fx.settings().iterations, 8);
    }

    #[test]
    fn zero_iterations_skip_the_chain() {
        let mut host = RecordingHost::new();
        let mut fx = feature(0);
        let (report, released) =
            run_frame(&mut fx, &mut host, target(1920, 1080));

        assert!(report.applied());
        assert_eq!(released, 1);
        let blits = host.blits();
        assert_eq!(blits.len(), 2);
        assert_eq!(blits[0].0, SurfaceId::Target);
        assert!(!host.commands().iter().any(|c| matches!(
            c,
            HostCommand::CreateMaterial {
                shader: ShaderKind::Rescale,
                ..
            }
        )));
    }

    #[test]
    fn two_identical_frames_are_identical() {
        let mut host = RecordingHost::new();
        let mut fx = feature(3);
        let (first, _) = run_frame(&mut fx, &mut host, target(1920, 1080));
        let first_cmds = host.take_commands();
        let (second, _) = run_frame(&mut fx, &mut host, target(1920, 1080));
        let second_cmds = host.take_commands();

        assert_eq!(first.binding, second.binding);
        assert_eq!(first.effective_iterations, second.effective_iterations);
        assert_eq!(fx.resolution_recomputes(), 1);
        // Materials are created once; the second frame only allocates,
        // binds, blits and releases.
        let creates = |cmds: &[HostCommand]| {
            cmds.iter()
                .filter(|c| matches!(c, HostCommand::CreateMaterial { .. }))
                .count()
        };
        assert_eq!(creates(&first_cmds), 2);
        assert_eq!(creates(&second_cmds), 0);
        assert_eq!(first_cmds.len() - 2, second_cmds.len());
        assert_eq!(fx.completed_frames(), 2);
    }

    #[test]
    fn resize_recomputes_grid() {
        let mut host = RecordingHost::new();
        let mut fx = feature(2);
        let (hd, _) = run_frame(&mut fx, &mut host, target(1920, 1080));
        assert_eq!(hd.grid.unwrap().rows, 72);
        let (square, _) = run_frame(&mut fx, &mut host, target(512, 512));
        assert_eq!(square.grid.unwrap().rows, 128);
        assert_eq!(fx.resolution_recomputes(), 2);
    }

    #[test]
    fn missing_ascii_shader_passes_through() {
        let mut host = RecordingHost::new().without_shader(ShaderKind::Ascii);
        let mut fx = feature(2);
        let (report, released) =
            run_frame(&mut fx, &mut host, target(640, 480));

        assert_eq!(
            report.outcome,
            FrameOutcome::Skipped(SkipReason::MissingShader(ShaderKind::Ascii))
        );
        assert!(host.blits().is_empty());
        assert_eq!(released, 1);
        assert_eq!(host.outstanding(), 0);
    }

    #[test]
    fn missing_rescale_shader_passes_through() {
        let mut host = RecordingHost::new().without_shader(ShaderKind::Rescale);
        let mut fx = feature(2);
        let (report, _) = run_frame(&mut fx, &mut host, target(640, 480));
        assert_eq!(
            report.outcome,
            FrameOutcome::Skipped(SkipReason::MissingShader(
                ShaderKind::Rescale
            ))
        );
        assert!(host.blits().is_empty());
    }

    #[test]
    fn missing_glyph_texture_passes_through() {
        let mut host = RecordingHost::new();
        let mut fx = feature(2);
        fx.set_font_texture(None);
        let (report, _) = run_frame(&mut fx, &mut host, target(640, 480));
        assert_eq!(
            report.outcome,
            FrameOutcome::Skipped(SkipReason::MissingGlyphTexture)
        );
        assert!(host.blits().is_empty());
        assert_eq!(host.outstanding(), 0);
    }

    #[test]
    fn unregistered_glyph_texture_passes_through() {
        let mut host = RecordingHost::new().without_texture(TextureId(7));
        let mut fx = feature(3);
        fx.set_font_texture(Some(TextureId(7)));
        let (report, released) =
            run_frame(&mut fx, &mut host, target(64, 64));

        assert_eq!(
            report.outcome,
            FrameOutcome::Skipped(SkipReason::MissingGlyphTexture)
        );
        assert!(host.blits().is_empty());
        assert!(!host.commands().iter().any(|c| matches!(
            c,
            HostCommand::SetParam { .. }
        )));
        assert_eq!(released, 1);
        assert_eq!(host.outstanding(), 0);

        // Pointing at an available atlas resumes drawing.
        fx.set_font_texture(Some(TextureId(0)));
        let (report, _) = run_frame(&mut fx, &mut host, target(64, 64));
        assert!(report.applied());
        assert!(host.violations().is_empty());
    }

    #[test]
    fn empty_surface_allocates_nothing() {
        let mut host = RecordingHost::new();
        let mut fx = feature(2);
        let (report, released) =
            run_frame(&mut fx, &mut host, target(0, 720));
        assert_eq!(
            report.outcome,
            FrameOutcome::Skipped(SkipReason::EmptySurface)
        );
        assert_eq!(released, 0);
        assert!(host.acquisitions().is_empty());
    }

    #[test]
    fn out_of_order_callbacks_error() {
        let mut host = RecordingHost::new();
        let mut fx = feature(2);
        assert!(fx.execute(&mut host).is_err());
        fx.configure(&mut host, target(64, 64)).unwrap();
        assert!(fx.configure(&mut host, target(64, 64)).is_err());
        let _ = fx.execute(&mut host).unwrap();
        assert!(fx.execute(&mut host).is_err());
        assert!(fx.cleanup(&mut host) > 0);
        assert_eq!(fx.cleanup(&mut host), 0);
        assert!(host
            .violations()
            .iter()
            .all(|v| !matches!(v, HostViolation::DoubleRelease(_))));
    }

    #[test]
    fn settings_are_revalidated_each_frame() {
        let mut host = RecordingHost::new();
        let mut fx = feature(2);
        fx.settings_mut().iterations = 40;
        fx.settings_mut().columns = 0;
        let (report, _) = run_frame(&mut fx, &mut host, target(4096, 4096));
        assert_eq!(report.requested_iterations, 8);
        assert_eq!(report.grid.unwrap().columns, 1);
    }

    #[test]
    fn dispose_destroys_materials() {
        let mut host = RecordingHost::new();
        let mut fx = feature(2);
        let _ = run_frame(&mut fx, &mut host, target(64, 64));
        assert_eq!(host.material_count(), 2);
        fx.dispose(&mut host);
        assert_eq!(host.material_count(), 0);
        assert!(host.violations().is_empty());
    }
}
