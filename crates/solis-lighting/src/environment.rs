use crate::sh::{ColorEstimate, SphericalHarmonics, MAX_COEFFICIENTS};
use bitflags::bitflags;
use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Vec3};
use solis_core::{BufferHandle, TextureRef};

/// Resolved irradiance of a built environment. Radiance input has already been
/// converted to pre-scaled irradiance coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Irradiance {
    #[default]
    None,
    SphericalHarmonics(SphericalHarmonics),
    Cubemap(TextureRef),
}

/// Validated contents of an environment, before it is bound to device resources.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ResolvedEnvironment {
    pub reflections: Option<TextureRef>,
    pub irradiance: Irradiance,
    pub intensity: f32,
    pub rotation: Mat3,
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EnvironmentFlags: u32 {
        const REFLECTIONS = 1 << 0;
        const IRRADIANCE_SH = 1 << 1;
        const IRRADIANCE_CUBEMAP = 1 << 2;
    }
}

/// Per-environment uniform block, std140-compatible.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct EnvironmentUniforms {
    /// Pre-scaled irradiance coefficients, w unused
    pub sh: [[f32; 4]; MAX_COEFFICIENTS],
    /// Rotation columns, w unused
    pub rotation: [[f32; 4]; 3],
    pub intensity: f32,
    /// Mip level of the reflections cubemap that holds roughness 1
    pub roughness_one_level: f32,
    pub sh_bands: u32,
    pub flags: u32,
}

/// Consistent copy of everything a renderer reads from an environment in one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvironmentSnapshot {
    pub reflections: Option<TextureRef>,
    pub irradiance: Irradiance,
    pub intensity: f32,
    pub rotation: Mat3,
}

/// Distant environment lighting: irradiance plus pre-filtered reflections.
///
/// Environments live inside an [`Engine`](crate::Engine). They are created with an
/// [`EnvironmentBuilder`](crate::EnvironmentBuilder) and destroyed with
/// [`Engine::destroy_environment`](crate::Engine::destroy_environment). Only the
/// intensity and the rotation can change after creation.
///
/// The rotation maps environment space to world space and applies to both the
/// irradiance and the reflection lookups.
#[derive(Debug)]
pub struct Environment {
    reflections: Option<TextureRef>,
    irradiance: Irradiance,
    intensity: f32,
    rotation: Mat3,
    uniform_buffer: BufferHandle,
    dirty: bool,
}

impl Environment {
    pub(crate) fn new(resolved: ResolvedEnvironment, uniform_buffer: BufferHandle) -> Self {
        Self {
            reflections: resolved.reflections,
            irradiance: resolved.irradiance,
            intensity: resolved.intensity,
            rotation: resolved.rotation,
            uniform_buffer,
            dirty: false,
        }
    }

    /// Intensity in cd/m²
    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    /// Sets the intensity in cd/m². Any value is accepted; it reaches the device on the
    /// next [`Engine::prepare`](crate::Engine::prepare).
    pub fn set_intensity(&mut self, intensity: f32) {
        self.intensity = intensity;
        self.dirty = true;
    }

    pub fn rotation(&self) -> Mat3 {
        self.rotation
    }

    /// Sets the environment rotation. Must be rigid; this is not checked here.
    pub fn set_rotation(&mut self, rotation: Mat3) {
        self.rotation = rotation;
        self.dirty = true;
    }

    pub fn irradiance(&self) -> &Irradiance {
        &self.irradiance
    }

    pub fn spherical_harmonics(&self) -> Option<&SphericalHarmonics> {
        match &self.irradiance {
            Irradiance::SphericalHarmonics(sh) => Some(sh),
            _ => None,
        }
    }

    pub fn irradiance_texture(&self) -> Option<TextureRef> {
        match self.irradiance {
            Irradiance::Cubemap(texture) => Some(texture),
            _ => None,
        }
    }

    pub fn reflections(&self) -> Option<TextureRef> {
        self.reflections
    }

    /// Whether this environment lights anything at all.
    pub fn has_contribution(&self) -> bool {
        self.reflections.is_some() || self.irradiance != Irradiance::None
    }

    pub fn uniform_buffer(&self) -> BufferHandle {
        self.uniform_buffer
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub(crate) fn mark_clean(&mut self) {
        self.dirty = false;
    }

    pub fn snapshot(&self) -> EnvironmentSnapshot {
        EnvironmentSnapshot {
            reflections: self.reflections,
            irradiance: self.irradiance,
            intensity: self.intensity,
            rotation: self.rotation,
        }
    }

    pub fn flags(&self) -> EnvironmentFlags {
        let mut flags = EnvironmentFlags::empty();
        flags.set(EnvironmentFlags::REFLECTIONS, self.reflections.is_some());
        match self.irradiance {
            Irradiance::None => {}
            Irradiance::SphericalHarmonics(_) => flags |= EnvironmentFlags::IRRADIANCE_SH,
            Irradiance::Cubemap(_) => flags |= EnvironmentFlags::IRRADIANCE_CUBEMAP,
        }
        flags
    }

    /// Mip level of the reflections holding roughness 1; 0 without reflections.
    pub fn roughness_one_level(&self) -> f32 {
        self.reflections.map_or(0.0, |r| r.max_level() as f32)
    }

    /// Mip level to sample the reflections at for a given perceptual roughness.
    pub fn reflection_lod(&self, perceptual_roughness: f32) -> f32 {
        let r = perceptual_roughness.clamp(0.0, 1.0);
        self.roughness_one_level() * r * (2.0 - r)
    }

    pub fn uniforms(&self) -> EnvironmentUniforms {
        let mut uniforms = EnvironmentUniforms::zeroed();
        if let Some(sh) = self.spherical_harmonics() {
            for (dst, c) in uniforms.sh.iter_mut().zip(sh.coefficients()) {
                *dst = c.extend(0.0).to_array();
            }
            uniforms.sh_bands = sh.bands() as u32;
        }
        for (dst, col) in uniforms
            .rotation
            .iter_mut()
            .zip([self.rotation.x_axis, self.rotation.y_axis, self.rotation.z_axis])
        {
            *dst = col.extend(0.0).to_array();
        }
        uniforms.intensity = self.intensity;
        uniforms.roughness_one_level = self.roughness_one_level();
        uniforms.flags = self.flags().bits();
        uniforms
    }

    /// World-space direction travelled by light from the brightest part of the
    /// environment. Needs at least two SH bands.
    pub fn direction_estimate(&self) -> Option<Vec3> {
        self.spherical_harmonics()?
            .direction_estimate()
            .and_then(|d| (self.rotation * d).try_normalize())
    }

    /// Colour and intensity (cd/m²-scaled) of a directional light travelling along the
    /// world-space `direction`, estimated from the SH irradiance.
    pub fn color_estimate(&self, direction: Vec3) -> Option<ColorEstimate> {
        let sh = self.spherical_harmonics()?;
        let mut estimate = sh.color_estimate(self.rotation.transpose() * direction);
        estimate.intensity *= self.intensity;
        Some(estimate)
    }
}
