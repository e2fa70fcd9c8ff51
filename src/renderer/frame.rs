//! wgpu implementation of [`RenderHost`].
//!
//! [`GpuRenderer`] owns everything that outlives a frame: compiled
//! pipelines, the transient texture pool, materials and registered
//! textures. [`GpuFrame`] borrows it together with a command encoder and
//! the frame target for one `configure → execute → cleanup` cycle.
//!
//! Material parameters are captured when a blit is recorded: every blit
//! gets its own small uniform buffer, so a later `set_param` never changes
//! an earlier blit.

use rustc_hash::FxHashMap;
use wgpu::util::DeviceExt;

use super::materials::Material;
use super::pipelines::{BlitPipelines, BlitProgram};
use crate::effect::feature::{FrameReport, ScreenEffect};
use crate::error::AsciiError;
use crate::gpu::glyph_atlas::GlyphAtlas;
use crate::gpu::render_context::RenderContext;
use crate::gpu::texture::RenderTarget;
use crate::gpu::transient_pool::{PoolKey, TransientPool};
use crate::host::{
    MaterialId, ParamValue, RenderHost, ShaderKind, ShaderParam, SurfaceDesc,
    SurfaceId, TextureId, TransientId,
};

/// Frames a released scratch texture may sit unused before it is freed.
pub const DEFAULT_MAX_IDLE_FRAMES: u32 = 3;

struct RegisteredTexture {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

/// Long-lived GPU state behind [`GpuFrame`].
pub struct GpuRenderer {
    pipelines: BlitPipelines,
    pool: TransientPool<RenderTarget>,
    materials: FxHashMap<MaterialId, Material>,
    next_material: u32,
    textures: FxHashMap<TextureId, RegisteredTexture>,
    next_texture: u32,
    max_idle_frames: u32,
}

impl GpuRenderer {
    /// Compile the blit pipelines.
    ///
    /// # Errors
    ///
    /// Returns [`AsciiError::Shader`] if the shared shader modules or the
    /// copy shader fail to compose.
    pub fn new(context: &RenderContext) -> Result<Self, AsciiError> {
        Self::with_disabled_shaders(context, &[])
    }

    /// Like [`new`](Self::new), but treat the listed programs as
    /// unavailable.
    ///
    /// # Errors
    ///
    /// See [`new`](Self::new).
    pub fn with_disabled_shaders(
        context: &RenderContext,
        disabled: &[ShaderKind],
    ) -> Result<Self, AsciiError> {
        Ok(Self {
            pipelines: BlitPipelines::new(&context.device, disabled)?,
            pool: TransientPool::new(),
            materials: FxHashMap::default(),
            next_material: 0,
            textures: FxHashMap::default(),
            next_texture: 0,
            max_idle_frames: DEFAULT_MAX_IDLE_FRAMES,
        })
    }

    /// Register a sampled texture the effect can bind by id.
    pub fn register_texture(&mut self, texture: wgpu::Texture) -> TextureId {
        let id = TextureId(self.next_texture);
        self.next_texture += 1;
        let view =
            texture.create_view(&wgpu::TextureViewDescriptor::default());
        let _ = self.textures.insert(
            id,
            RegisteredTexture {
                _texture: texture,
                view,
            },
        );
        id
    }

    /// Upload and register a glyph atlas.
    pub fn register_glyph_atlas(
        &mut self,
        context: &RenderContext,
        atlas: &GlyphAtlas,
    ) -> TextureId {
        self.register_texture(atlas.upload(&context.device, &context.queue))
    }

    /// Drop a registered texture. Effects still pointing at it skip their
    /// next frame.
    pub fn unregister_texture(&mut self, id: TextureId) -> bool {
        self.textures.remove(&id).is_some()
    }

    /// Borrow the renderer for one frame that draws into `target`.
    pub fn begin_frame<'a>(
        &'a mut self,
        device: &'a wgpu::Device,
        encoder: &'a mut wgpu::CommandEncoder,
        target: &'a RenderTarget,
    ) -> GpuFrame<'a> {
        GpuFrame {
            renderer: self,
            device,
            encoder,
            target,
        }
    }

    /// Age the texture pool; call once per frame after submission.
    pub fn end_frame(&mut self) {
        let dropped = self.pool.trim(self.max_idle_frames);
        if dropped > 0 {
            log::debug!("freed {dropped} idle scratch textures");
        }
    }

    /// Run one full frame of `effect` on `target` and submit it.
    ///
    /// Cleanup runs even when `execute` fails.
    ///
    /// # Errors
    ///
    /// Returns the effect's lifecycle error, if any.
    pub fn render(
        &mut self,
        context: &RenderContext,
        effect: &mut dyn ScreenEffect,
        target: &RenderTarget,
    ) -> Result<FrameReport, AsciiError> {
        let desc =
            SurfaceDesc::new(target.width(), target.height(), target.format());
        let mut encoder = context.create_encoder();
        let report = {
            let mut frame =
                self.begin_frame(&context.device, &mut encoder, target);
            let result = effect
                .configure(&mut frame, desc)
                .and_then(|()| effect.execute(&mut frame));
            let released = effect.cleanup(&mut frame);
            log::debug!("released {released} scratch surfaces");
            result
        };
        context.submit(encoder);
        self.end_frame();
        report
    }

    /// Scratch textures in use and in total.
    #[must_use]
    pub fn pool_usage(&self) -> (usize, usize) {
        (self.pool.outstanding(), self.pool.total_count())
    }
}

/// One frame's view of a [`GpuRenderer`].
pub struct GpuFrame<'a> {
    renderer: &'a mut GpuRenderer,
    device: &'a wgpu::Device,
    encoder: &'a mut wgpu::CommandEncoder,
    target: &'a RenderTarget,
}

fn surface_view<'r>(
    renderer: &'r GpuRenderer,
    target: &'r RenderTarget,
    surface: SurfaceId,
) -> Option<&'r wgpu::TextureView> {
    match surface {
        SurfaceId::Target => Some(&target.view),
        SurfaceId::Transient(id) => renderer.pool.get(id).map(|t| &t.view),
    }
}

fn surface_format(
    renderer: &GpuRenderer,
    target: &RenderTarget,
    surface: SurfaceId,
) -> Option<wgpu::TextureFormat> {
    match surface {
        SurfaceId::Target => Some(target.format()),
        SurfaceId::Transient(id) => {
            renderer.pool.get(id).map(RenderTarget::format)
        }
    }
}

/// Glyph atlas view a blit binds, or why the blit cannot run.
fn glyph_view<'r>(
    renderer: &'r GpuRenderer,
    material: Option<&Material>,
    program: BlitProgram,
) -> Result<Option<&'r wgpu::TextureView>, String> {
    match material.and_then(Material::font) {
        Some(id) => renderer
            .textures
            .get(&id)
            .map(|t| Some(&t.view))
            .ok_or_else(|| {
                format!("glyph texture #{} is not registered", id.0)
            }),
        None if program == BlitProgram::Material(ShaderKind::Ascii) => {
            Err("ASCII blit without a glyph texture".to_owned())
        }
        None => Ok(None),
    }
}

/// Resources bound by one blit.
struct BlitBindings<'r> {
    src: &'r wgpu::TextureView,
    dst: &'r wgpu::TextureView,
    uniforms: Option<&'r wgpu::Buffer>,
    font: Option<&'r wgpu::TextureView>,
}

/// Record one fullscreen pass drawing `program` into `bindings.dst`.
fn encode_blit(
    device: &wgpu::Device,
    encoder: &mut wgpu::CommandEncoder,
    pipelines: &BlitPipelines,
    program: BlitProgram,
    pipeline: &wgpu::RenderPipeline,
    bindings: &BlitBindings<'_>,
) {
    let mut entries = vec![
        wgpu::BindGroupEntry {
            binding: 0,
            resource: wgpu::BindingResource::TextureView(bindings.src),
        },
        wgpu::BindGroupEntry {
            binding: 1,
            resource: wgpu::BindingResource::Sampler(&pipelines.linear_sampler),
        },
    ];
    if let Some(buffer) = bindings.uniforms {
        entries.push(wgpu::BindGroupEntry {
            binding: 2,
            resource: buffer.as_entire_binding(),
        });
    }
    if let Some(view) = bindings.font {
        entries.push(wgpu::BindGroupEntry {
            binding: 3,
            resource: wgpu::BindingResource::TextureView(view),
        });
        entries.push(wgpu::BindGroupEntry {
            binding: 4,
            resource: wgpu::BindingResource::Sampler(&pipelines.glyph_sampler),
        });
    }
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Blit Bind Group"),
        layout: pipelines.layout(program),
        entries: &entries,
    });

    let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("Blit Pass"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: bindings.dst,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        })],
        depth_stencil_attachment: None,
        ..Default::default()
    });
    pass.set_pipeline(pipeline);
    pass.set_bind_group(0, &bind_group, &[]);
    pass.draw(0..3, 0..1);
}

impl RenderHost for GpuFrame<'_> {
    fn create_material(&mut self, shader: ShaderKind) -> Option<MaterialId> {
        if !self.renderer.pipelines.is_available(shader) {
            log::warn!("{} is unavailable", shader.name());
            return None;
        }
        let id = MaterialId(self.renderer.next_material);
        self.renderer.next_material += 1;
        let _ = self.renderer.materials.insert(id, Material::new(shader));
        Some(id)
    }

    fn destroy_material(&mut self, material: MaterialId) {
        if self.renderer.materials.remove(&material).is_none() {
            log::warn!("destroying unknown material #{}", material.0);
        }
    }

    fn has_texture(&self, texture: TextureId) -> bool {
        self.renderer.textures.contains_key(&texture)
    }

    fn acquire_temporary(
        &mut self,
        desc: &SurfaceDesc,
        label: &'static str,
    ) -> TransientId {
        let device = self.device;
        self.renderer.pool.allocate(PoolKey::from(desc), || {
            RenderTarget::new(
                device,
                label,
                desc.width,
                desc.height,
                desc.format,
            )
        })
    }

    fn release_temporary(&mut self, id: TransientId) {
        let _ = self.renderer.pool.release(id);
    }

    fn set_param(
        &mut self,
        material: MaterialId,
        param: ShaderParam,
        value: ParamValue,
    ) {
        match self.renderer.materials.get_mut(&material) {
            Some(m) => {
                let _ = m.set(param, value);
            }
            None => {
                log::warn!("parameter for unknown material #{}", material.0);
            }
        }
    }

    fn blit(
        &mut self,
        src: SurfaceId,
        dst: SurfaceId,
        material: Option<MaterialId>,
    ) {
        let material = match material {
            Some(id) => match self.renderer.materials.get(&id) {
                Some(m) => Some(m.clone()),
                None => {
                    log::warn!("blit with unknown material #{}", id.0);
                    return;
                }
            },
            None => None,
        };
        let program = material
            .as_ref()
            .map_or(BlitProgram::Copy, |m| BlitProgram::Material(m.shader()));

        let Some(format) = surface_format(self.renderer, self.target, dst)
        else {
            log::warn!("blit into a surface that is not acquired");
            return;
        };
        if !self.renderer.pipelines.prepare(self.device, program, format) {
            return;
        }

        let uniforms = material.as_ref().map(|m| {
            self.device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Blit Params Buffer"),
                    contents: m.uniform_bytes(),
                    usage: wgpu::BufferUsages::UNIFORM,
                })
        });
        let font = match glyph_view(self.renderer, material.as_ref(), program)
        {
            Ok(font) => font,
            Err(reason) => {
                log::warn!("{reason}");
                return;
            }
        };
        let (Some(src_view), Some(dst_view)) = (
            surface_view(self.renderer, self.target, src),
            surface_view(self.renderer, self.target, dst),
        ) else {
            log::warn!("blit between surfaces that are not acquired");
            return;
        };
        let pipelines = &self.renderer.pipelines;
        let Some(pipeline) = pipelines.get(program, format) else {
            return;
        };

        encode_blit(
            self.device,
            self.encoder,
            pipelines,
            program,
            pipeline,
            &BlitBindings {
                src: src_view,
                dst: dst_view,
                uniforms: uniforms.as_ref(),
                font,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::feature::{AsciiRenderFeature, FrameOutcome, SkipReason};
    use crate::options::EffectSettings;

    const FILL: [u8; 4] = [200, 100, 50, 255];

    /// `None` when the machine has no adapter; GPU tests then pass vacuously.
    fn context() -> Option<RenderContext> {
        pollster::block_on(RenderContext::headless()).ok()
    }

    fn filled_target(context: &RenderContext) -> RenderTarget {
        let pixels = FILL.repeat(64 * 64);
        RenderTarget::from_rgba8(
            &context.device,
            &context.queue,
            "Test Target",
            64,
            64,
            &pixels,
        )
    }

    fn effect(iterations: u32) -> AsciiRenderFeature {
        AsciiRenderFeature::new(EffectSettings {
            iterations,
            ..EffectSettings::default()
        })
    }

    fn assert_untouched(context: &RenderContext, target: &RenderTarget) {
        let pixels =
            target.read_rgba8(&context.device, &context.queue).unwrap();
        assert!(pixels.chunks_exact(4).all(|px| px == FILL));
    }

    #[test]
    fn applies_with_builtin_atlas_and_returns_scratch_surfaces() {
        let Some(context) = context() else {
            return;
        };
        let mut renderer = GpuRenderer::new(&context).unwrap();
        let font =
            renderer.register_glyph_atlas(&context, &GlyphAtlas::builtin());
        let target = filled_target(&context);

        for iterations in [0, 3, 8] {
            let mut fx = effect(iterations);
            fx.set_font_texture(Some(font));
            let report = renderer.render(&context, &mut fx, &target).unwrap();
            assert!(report.applied());
            assert_eq!(renderer.pool_usage().0, 0);
        }
        let pixels =
            target.read_rgba8(&context.device, &context.queue).unwrap();
        assert!(pixels.chunks_exact(4).any(|px| px != FILL));
    }

    #[test]
    fn unregistered_glyph_texture_leaves_target_untouched() {
        let Some(context) = context() else {
            return;
        };
        let mut renderer = GpuRenderer::new(&context).unwrap();
        let target = filled_target(&context);
        let mut fx = effect(3);
        fx.set_font_texture(Some(TextureId(7)));

        let report = renderer.render(&context, &mut fx, &target).unwrap();
        assert_eq!(
            report.outcome,
            FrameOutcome::Skipped(SkipReason::MissingGlyphTexture)
        );
        assert_untouched(&context, &target);
        assert_eq!(renderer.pool_usage().0, 0);
    }

    #[test]
    fn unregistering_the_atlas_skips_the_next_frame() {
        let Some(context) = context() else {
            return;
        };
        let mut renderer = GpuRenderer::new(&context).unwrap();
        let font =
            renderer.register_glyph_atlas(&context, &GlyphAtlas::builtin());
        let target = filled_target(&context);
        let mut fx = effect(2);
        fx.set_font_texture(Some(font));
        assert!(renderer.unregister_texture(font));

        let report = renderer.render(&context, &mut fx, &target).unwrap();
        assert!(!report.applied());
        assert_untouched(&context, &target);
    }

    #[test]
    fn missing_glyph_texture_leaves_target_untouched() {
        let Some(context) = context() else {
            return;
        };
        let mut renderer = GpuRenderer::new(&context).unwrap();
        let target = filled_target(&context);
        let mut fx = effect(2);

        let report = renderer.render(&context, &mut fx, &target).unwrap();
        assert_eq!(
            report.outcome,
            FrameOutcome::Skipped(SkipReason::MissingGlyphTexture)
        );
        assert_untouched(&context, &target);
    }

    #[test]
    fn disabled_shader_leaves_target_untouched() {
        let Some(context) = context() else {
            return;
        };
        let target = filled_target(&context);
        for kind in [ShaderKind::Ascii, ShaderKind::Rescale] {
            let mut renderer =
                GpuRenderer::with_disabled_shaders(&context, &[kind]).unwrap();
            let font = renderer
                .register_glyph_atlas(&context, &GlyphAtlas::builtin());
            let mut fx = effect(2);
            fx.set_font_texture(Some(font));

            let report =
                renderer.render(&context, &mut fx, &target).unwrap();
            assert_eq!(
                report.outcome,
                FrameOutcome::Skipped(SkipReason::MissingShader(kind))
            );
            assert_untouched(&context, &target);
            assert_eq!(renderer.pool_usage().0, 0);
        }
    }

    #[test]
    fn idle_scratch_textures_are_trimmed() {
        let Some(context) = context() else {
            return;
        };
        let mut renderer = GpuRenderer::new(&context).unwrap();
        let font =
            renderer.register_glyph_atlas(&context, &GlyphAtlas::builtin());
        let target = filled_target(&context);
        let mut fx = effect(2);
        fx.set_font_texture(Some(font));
        let _ = renderer.render(&context, &mut fx, &target).unwrap();
        assert!(renderer.pool_usage().1 > 0);

        fx.set_font_texture(None);
        for _ in 0..=DEFAULT_MAX_IDLE_FRAMES {
            let _ = renderer.render(&context, &mut fx, &target).unwrap();
        }
        // Only the surface reused by each skipped frame's composite stays.
        assert_eq!(renderer.pool_usage(), (0, 1));
    }
}
