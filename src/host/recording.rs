//! In-memory host that records every command instead of drawing.
//!
//! Used for dry runs (`ascii-post plan`) and to check the effect's
//! resource discipline: every acquired surface released exactly once, no
//! scratch surface read before a blit wrote it.

use std::fmt;

use rustc_hash::{FxHashMap, FxHashSet};

use super::{
    MaterialId, ParamValue, RenderHost, ShaderKind, ShaderParam, SurfaceDesc,
    SurfaceId, TextureId, TransientId,
};

/// One recorded host call.
#[derive(Debug, Clone, PartialEq)]
pub enum HostCommand {
    /// `create_material` and its result.
    CreateMaterial {
        /// Requested program.
        shader: ShaderKind,
        /// Returned handle (`None` when the program is unavailable).
        material: Option<MaterialId>,
    },
    /// `destroy_material`.
    DestroyMaterial(MaterialId),
    /// `acquire_temporary`.
    Acquire {
        /// Returned handle.
        id: TransientId,
        /// Requested size and format.
        desc: SurfaceDesc,
        /// Debug label.
        label: &'static str,
    },
    /// `release_temporary`.
    Release(TransientId),
    /// `set_param`.
    SetParam {
        /// Target material.
        material: MaterialId,
        /// Parameter handle.
        param: ShaderParam,
        /// Value written.
        value: ParamValue,
    },
    /// `blit`.
    Blit {
        /// Source surface.
        src: SurfaceId,
        /// Destination surface.
        dst: SurfaceId,
        /// Material drawn with, `None` for a plain copy.
        material: Option<MaterialId>,
    },
}

impl fmt::Display for HostCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreateMaterial { shader, material } => match material {
                Some(m) => {
                    write!(f, "create  {} -> material#{}", shader.name(), m.0)
                }
                None => {
                    write!(f, "create  {} -> unavailable", shader.name())
                }
            },
            Self::DestroyMaterial(m) => write!(f, "destroy material#{}", m.0),
            Self::Acquire { id, desc, label } => write!(
                f,
                "acquire {label} #{} {}x{} {:?}",
                id.0, desc.width, desc.height, desc.format
            ),
            Self::Release(id) => write!(f, "release #{}", id.0),
            Self::SetParam {
                material,
                param,
                value,
            } => write!(
                f,
                "param   material#{}.{} = {value:?}",
                material.0,
                param.name()
            ),
            Self::Blit { src, dst, material } => {
                let via = material.map_or_else(
                    || "copy".to_owned(),
                    |m| format!("material#{}", m.0),
                );
                write!(
                    f,
                    "blit    {} -> {} via {via}",
                    surface_name(*src),
                    surface_name(*dst)
                )
            }
        }
    }
}

fn surface_name(surface: SurfaceId) -> String {
    match surface {
        SurfaceId::Target => "target".to_owned(),
        SurfaceId::Transient(id) => format!("#{}", id.0),
    }
}

/// Resource-discipline violation detected by [`RecordingHost`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostViolation {
    /// A surface was released twice, or released without being acquired.
    DoubleRelease(TransientId),
    /// A scratch surface was blitted from before anything was written to it.
    ReadBeforeWrite(TransientId),
    /// A blit referenced a surface that is not currently acquired.
    UnknownSurface(TransientId),
    /// A material id that was never created (or already destroyed).
    UnknownMaterial(MaterialId),
}

#[derive(Debug)]
struct RecordedMaterial {
    shader: ShaderKind,
    params: FxHashMap<ShaderParam, ParamValue>,
}

/// [`RenderHost`] that records commands and tracks surface lifetimes.
#[derive(Debug, Default)]
pub struct RecordingHost {
    commands: Vec<HostCommand>,
    unavailable: FxHashSet<ShaderKind>,
    missing_textures: FxHashSet<TextureId>,
    materials: FxHashMap<MaterialId, RecordedMaterial>,
    outstanding: FxHashMap<TransientId, SurfaceDesc>,
    written: FxHashSet<TransientId>,
    violations: Vec<HostViolation>,
    next_material: u32,
    next_transient: u32,
}

impl RecordingHost {
    /// Create a host where every shader and texture is available.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `create_material(shader)` return `None`.
    #[must_use]
    pub fn without_shader(mut self, shader: ShaderKind) -> Self {
        let _ = self.unavailable.insert(shader);
        self
    }

    /// Make `has_texture(texture)` return `false`, as if the texture was
    /// never registered or has been unregistered.
    #[must_use]
    pub fn without_texture(mut self, texture: TextureId) -> Self {
        let _ = self.missing_textures.insert(texture);
        self
    }

    /// All commands recorded so far.
    #[must_use]
    pub fn commands(&self) -> &[HostCommand] {
        &self.commands
    }

    /// Take the recorded commands, leaving the log empty. Lifetime
    /// tracking is not reset.
    pub fn take_commands(&mut self) -> Vec<HostCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Number of surfaces acquired and not yet released.
    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.outstanding.len()
    }

    /// Violations detected so far.
    #[must_use]
    pub fn violations(&self) -> &[HostViolation] {
        &self.violations
    }

    /// Last value written to a material parameter.
    #[must_use]
    pub fn param(
        &self,
        material: MaterialId,
        param: ShaderParam,
    ) -> Option<ParamValue> {
        self.materials
            .get(&material)
            .and_then(|m| m.params.get(&param).copied())
    }

    /// Program a live material was created from.
    #[must_use]
    pub fn material_shader(&self, material: MaterialId) -> Option<ShaderKind> {
        self.materials.get(&material).map(|m| m.shader)
    }

    /// Number of live materials.
    #[must_use]
    pub fn material_count(&self) -> usize {
        self.materials.len()
    }

    /// The recorded blits as `(src, dst, material)` triples.
    #[must_use]
    pub fn blits(&self) -> Vec<(SurfaceId, SurfaceId, Option<MaterialId>)> {
        self.commands
            .iter()
            .filter_map(|cmd| match cmd {
                HostCommand::Blit { src, dst, material } => {
                    Some((*src, *dst, *material))
                }
                _ => None,
            })
            .collect()
    }

    /// Descriptors of every recorded acquisition, in order.
    #[must_use]
    pub fn acquisitions(
        &self,
    ) -> Vec<(TransientId, SurfaceDesc, &'static str)> {
        self.commands
            .iter()
            .filter_map(|cmd| match cmd {
                HostCommand::Acquire { id, desc, label } => {
                    Some((*id, *desc, *label))
                }
                _ => None,
            })
            .collect()
    }

    fn check_surface_read(&mut self, surface: SurfaceId) {
        if let SurfaceId::Transient(id) = surface {
            if !self.outstanding.contains_key(&id) {
                self.violations.push(HostViolation::UnknownSurface(id));
            } else if !self.written.contains(&id) {
                self.violations.push(HostViolation::ReadBeforeWrite(id));
            }
        }
    }

    fn check_surface_write(&mut self, surface: SurfaceId) {
        if let SurfaceId::Transient(id) = surface {
            if self.outstanding.contains_key(&id) {
                let _ = self.written.insert(id);
            } else {
                self.violations.push(HostViolation::UnknownSurface(id));
            }
        }
    }
}

impl RenderHost for RecordingHost {
    fn create_material(&mut self, shader: ShaderKind) -> Option<MaterialId> {
        let material = if self.unavailable.contains(&shader) {
            None
        } else {
            let id = MaterialId(self.next_material);
            self.next_material += 1;
            let _ = self.materials.insert(
                id,
                RecordedMaterial {
                    shader,
                    params: FxHashMap::default(),
                },
            );
            Some(id)
        };
        self.commands
            .push(HostCommand::CreateMaterial { shader, material });
        material
    }

    fn destroy_material(&mut self, material: MaterialId) {
        if self.materials.remove(&material).is_none() {
            self.violations
                .push(HostViolation::UnknownMaterial(material));
        }
        self.commands.push(HostCommand::DestroyMaterial(material));
    }

    fn has_texture(&self, texture: TextureId) -> bool {
        !self.missing_textures.contains(&texture)
    }

    fn acquire_temporary(
        &mut self,
        desc: &SurfaceDesc,
        label: &'static str,
    ) -> TransientId {
        let id = TransientId(self.next_transient);
        self.next_transient += 1;
        let _ = self.outstanding.insert(id, *desc);
        self.commands.push(HostCommand::Acquire {
            id,
            desc: *desc,
            label,
        });
        id
    }

    fn release_temporary(&mut self, id: TransientId) {
        if self.outstanding.remove(&id).is_none() {
            self.violations.push(HostViolation::DoubleRelease(id));
        }
        let _ = self.written.remove(&id);
        self.commands.push(HostCommand::Release(id));
    }

    fn set_param(
        &mut self,
        material: MaterialId,
        param: ShaderParam,
        value: ParamValue,
    ) {
        match self.materials.get_mut(&material) {
            Some(recorded) => {
                let _ = recorded.params.insert(param, value);
            }
            None => self
                .violations
                .push(HostViolation::UnknownMaterial(material)),
        }
        self.commands.push(HostCommand::SetParam {
            material,
            param,
            value,
        });
    }

    fn blit(
        &mut self,
        src: SurfaceId,
        dst: SurfaceId,
        material: Option<MaterialId>,
    ) {
        self.check_surface_read(src);
        self.check_surface_write(dst);
        if let Some(m) = material {
            if !self.materials.contains_key(&m) {
                self.violations.push(HostViolation::UnknownMaterial(m));
            }
        }
        self.commands.push(HostCommand::Blit { src, dst, material });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desc() -> SurfaceDesc {
        SurfaceDesc::new(64, 64, crate::host::SCRATCH_FORMAT)
    }

    #[test]
    fn tracks_outstanding_surfaces() {
        let mut host = RecordingHost::new();
        let a = host.acquire_temporary(&desc(), "a");
        let b = host.acquire_temporary(&desc(), "b");
        assert_ne!(a, b);
        assert_eq!(host.outstanding(), 2);
        host.release_temporary(a);
        host.release_temporary(b);
        assert_eq!(host.outstanding(), 0);
        assert!(host.violations().is_empty());
    }

    #[test]
    fn flags_double_release() {
        let mut host = RecordingHost::new();
        let a = host.acquire_temporary(&desc(), "a");
        host.release_temporary(a);
        host.release_temporary(a);
        assert_eq!(host.violations(), &[HostViolation::DoubleRelease(a)]);
    }

    #[test]
    fn flags_read_before_write() {
        let mut host = RecordingHost::new();
        let a = host.acquire_temporary(&desc(), "a");
        let b = host.acquire_temporary(&desc(), "b");
        host.blit(SurfaceId::Transient(a), SurfaceId::Transient(b), None);
        assert_eq!(host.violations(), &[HostViolation::ReadBeforeWrite(a)]);

        host.blit(SurfaceId::Target, SurfaceId::Transient(a), None);
        host.blit(SurfaceId::Transient(a), SurfaceId::Target, None);
        assert_eq!(host.violations().len(), 1);
    }

    #[test]
    fn unavailable_shader_yields_none() {
        let mut host = RecordingHost::new().without_shader(ShaderKind::Ascii);
        assert!(host.create_material(ShaderKind::Ascii).is_none());
        let rescale = host.create_material(ShaderKind::Rescale);
        assert!(rescale.is_some());
        assert_eq!(host.material_count(), 1);
    }

    #[test]
    fn missing_texture_is_reported() {
        let host = RecordingHost::new().without_texture(TextureId(3));
        assert!(!host.has_texture(TextureId(3)));
        assert!(host.has_texture(TextureId(0)));
    }

    #[test]
    fn commands_render_as_text() {
        let mut host = RecordingHost::new();
        let a = host.acquire_temporary(&desc(), "_Sample0");
        host.blit(SurfaceId::Target, SurfaceId::Transient(a), None);
        let lines: Vec<String> =
            host.commands().iter().map(ToString::to_string).collect();
        assert!(lines[0].starts_with("acquire _Sample0 #0 64x64"));
        assert_eq!(lines[1], "blit    target -> #0 via copy");
    }
}
