//! Shader modules, bind group layouts and a per-format pipeline cache for
//! every fullscreen blit the effect records.

use rustc_hash::FxHashMap;

use crate::error::AsciiError;
use crate::gpu::pipeline_helpers::{
    create_screen_space_pipeline, filtering_sampler, linear_sampler,
    nearest_sampler, texture_2d, uniform_buffer,
};
use crate::gpu::shader_composer::ShaderComposer;
use crate::host::ShaderKind;

/// What a blit draws with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlitProgram {
    /// Plain copy.
    Copy,
    /// A material's program.
    Material(ShaderKind),
}

impl BlitProgram {
    fn label(self) -> &'static str {
        match self {
            Self::Copy => "Copy Blit",
            Self::Material(ShaderKind::Rescale) => "Rescale Blit",
            Self::Material(ShaderKind::Ascii) => "ASCII Blit",
        }
    }
}

/// `(program, source, file path)` for every blit shader.
pub(crate) const SHADER_SOURCES: [(BlitProgram, &str, &str); 3] = [
    (
        BlitProgram::Copy,
        include_str!("../../assets/shaders/screen/copy.wgsl"),
        "screen/copy.wgsl",
    ),
    (
        BlitProgram::Material(ShaderKind::Rescale),
        include_str!("../../assets/shaders/screen/rescale.wgsl"),
        "screen/rescale.wgsl",
    ),
    (
        BlitProgram::Material(ShaderKind::Ascii),
        include_str!("../../assets/shaders/screen/ascii.wgsl"),
        "screen/ascii.wgsl",
    ),
];

/// Compiled blit programs.
pub struct BlitPipelines {
    shaders: FxHashMap<BlitProgram, wgpu::ShaderModule>,
    copy_layout: wgpu::BindGroupLayout,
    rescale_layout: wgpu::BindGroupLayout,
    ascii_layout: wgpu::BindGroupLayout,
    /// Samples the source surface.
    pub linear_sampler: wgpu::Sampler,
    /// Samples the glyph atlas.
    pub glyph_sampler: wgpu::Sampler,
    cache: FxHashMap<(BlitProgram, wgpu::TextureFormat), wgpu::RenderPipeline>,
}

impl BlitPipelines {
    /// Compose every blit shader. A material shader that fails to compose
    /// is logged and left unavailable; the copy shader is required.
    ///
    /// # Errors
    ///
    /// Returns [`AsciiError::Shader`] if the shared modules or the copy
    /// shader fail to compose.
    pub fn new(
        device: &wgpu::Device,
        disabled: &[ShaderKind],
    ) -> Result<Self, AsciiError> {
        let mut composer = ShaderComposer::new()?;
        let mut shaders = FxHashMap::default();
        for (program, source, file_path) in SHADER_SOURCES {
            if let BlitProgram::Material(kind) = program {
                if disabled.contains(&kind) {
                    log::info!("{} disabled", kind.name());
                    continue;
                }
            }
            match composer.compose(device, program.label(), source, file_path)
            {
                Ok(module) => {
                    let _ = shaders.insert(program, module);
                }
                Err(e) if program == BlitProgram::Copy => return Err(e),
                Err(e) => log::error!("{e}"),
            }
        }

        let copy_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Copy Blit Bind Group Layout"),
                entries: &[texture_2d(0), filtering_sampler(1)],
            });
        let rescale_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Rescale Blit Bind Group Layout"),
                entries: &[
                    texture_2d(0),
                    filtering_sampler(1),
                    uniform_buffer(2),
                ],
            });
        let ascii_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("ASCII Blit Bind Group Layout"),
                entries: &[
                    texture_2d(0),
                    filtering_sampler(1),
                    uniform_buffer(2),
                    texture_2d(3),
                    filtering_sampler(4),
                ],
            });

        Ok(Self {
            shaders,
            copy_layout,
            rescale_layout,
            ascii_layout,
            linear_sampler: linear_sampler(device, "Blit Source Sampler"),
            glyph_sampler: nearest_sampler(device, "Glyph Atlas Sampler"),
            cache: FxHashMap::default(),
        })
    }

    /// Whether materials of `kind` can be drawn.
    #[must_use]
    pub fn is_available(&self, kind: ShaderKind) -> bool {
        self.shaders.contains_key(&BlitProgram::Material(kind))
    }

    /// Bind group layout for `program`.
    #[must_use]
    pub fn layout(&self, program: BlitProgram) -> &wgpu::BindGroupLayout {
        match program {
            BlitProgram::Copy => &self.copy_layout,
            BlitProgram::Material(ShaderKind::Rescale) => &self.rescale_layout,
            BlitProgram::Material(ShaderKind::Ascii) => &self.ascii_layout,
        }
    }

    /// Build the pipeline for `program` writing `format` if it is not
    /// cached yet. Returns `false` when the program is unavailable.
    pub fn prepare(
        &mut self,
        device: &wgpu::Device,
        program: BlitProgram,
        format: wgpu::TextureFormat,
    ) -> bool {
        if self.cache.contains_key(&(program, format)) {
            return true;
        }
        let Some(shader) = self.shaders.get(&program) else {
            return false;
        };
        log::debug!("building {} pipeline for {format:?}", program.label());
        let pipeline = create_screen_space_pipeline(
            device,
            program.label(),
            shader,
            format,
            None,
            &[self.layout(program)],
        );
        let _ = self.cache.insert((program, format), pipeline);
        true
    }

    /// A pipeline built by [`prepare`](Self::prepare).
    #[must_use]
    pub fn get(
        &self,
        program: BlitProgram,
        format: wgpu::TextureFormat,
    ) -> Option<&wgpu::RenderPipeline> {
        self.cache.get(&(program, format))
    }

    /// Number of cached pipelines.
    #[must_use]
    pub fn cached_count(&self) -> usize {
        self.cache.len()
    }
}
