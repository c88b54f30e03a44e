use crate::engine::{Engine, EnvironmentHandle};
use crate::environment::{Irradiance, ResolvedEnvironment};
use crate::sh::{self, SphericalHarmonics};
use glam::{Mat3, Vec3};
use solis_core::{is_rigid, EngineConfig, Result, SolisError, TextureRef};

/// Default environment intensity in cd/m²
pub const DEFAULT_INTENSITY: f32 = 30_000.0;

/// Where the irradiance of an environment comes from.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum IrradianceSource {
    #[default]
    None,
    /// Pre-scaled irradiance coefficients
    SphericalHarmonics { bands: u8, coefficients: Vec<Vec3> },
    /// Radiance coefficients, converted to irradiance on build
    Radiance { bands: u8, coefficients: Vec<Vec3> },
    /// Irradiance cubemap, already convolved with the cosine lobe
    Cubemap(TextureRef),
}

/// Everything needed to create an environment. Nothing is checked until it is
/// resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvironmentDesc {
    /// Pre-filtered specular cubemap; mip level `k` holds the `k`-th roughness level
    pub reflections: Option<TextureRef>,
    pub irradiance: IrradianceSource,
    /// cd/m²
    pub intensity: f32,
    /// Rigid rotation from environment space to world space
    pub rotation: Mat3,
}

impl Default for EnvironmentDesc {
    fn default() -> Self {
        Self {
            reflections: None,
            irradiance: IrradianceSource::None,
            intensity: DEFAULT_INTENSITY,
            rotation: Mat3::IDENTITY,
        }
    }
}

impl EnvironmentDesc {
    /// Checks the description against `config` without creating anything.
    pub fn validate(&self, config: &EngineConfig) -> Result<()> {
        self.resolve(config).map(|_| ())
    }

    pub(crate) fn resolve(&self, config: &EngineConfig) -> Result<ResolvedEnvironment> {
        if let Some(reflections) = self.reflections {
            require_cubemap("reflections", reflections)?;
        }

        let irradiance = match &self.irradiance {
            IrradianceSource::None => Irradiance::None,
            IrradianceSource::SphericalHarmonics { bands, coefficients } => {
                Irradiance::SphericalHarmonics(SphericalHarmonics::new(*bands, coefficients)?)
            }
            IrradianceSource::Radiance { bands, coefficients } => Irradiance::SphericalHarmonics(
                sh::radiance_to_irradiance(&SphericalHarmonics::new(*bands, coefficients)?),
            ),
            IrradianceSource::Cubemap(cubemap) => {
                require_cubemap("irradiance", *cubemap)?;
                Irradiance::Cubemap(*cubemap)
            }
        };

        if config.validate_rotation && !is_rigid(&self.rotation, config.rotation_tolerance) {
            return Err(SolisError::NonRigidRotation);
        }

        Ok(ResolvedEnvironment {
            reflections: self.reflections,
            irradiance,
            intensity: self.intensity,
            rotation: self.rotation,
        })
    }
}

fn require_cubemap(what: &'static str, texture: TextureRef) -> Result<()> {
    if texture.is_cubemap() {
        Ok(())
    } else {
        Err(SolisError::NotACubemap {
            what,
            target: texture.target,
        })
    }
}

/// Builder for [`Environment`](crate::Environment)s.
///
/// Setters can be called in any order; the last call wins. Irradiance setters replace
/// each other. Validation happens in [`build`](Self::build).
///
/// ```ignore
/// let handle = EnvironmentBuilder::new()
///     .with_reflections(cubemap)
///     .with_irradiance_sh(3, &sh)
///     .build(&mut engine)?;
///
/// engine.destroy_environment(handle);
/// ```
#[derive(Debug, Clone, Default)]
pub struct EnvironmentBuilder {
    desc: EnvironmentDesc,
}

impl EnvironmentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the reflections cubemap mip chain
    pub fn with_reflections(mut self, cubemap: TextureRef) -> Self {
        self.desc.reflections = Some(cubemap);
        self
    }

    /// Set the irradiance as pre-scaled SH coefficients: `bands` must be 1, 2 or 3 and
    /// `coefficients` must hold `bands²` entries
    pub fn with_irradiance_sh(mut self, bands: u8, coefficients: &[Vec3]) -> Self {
        self.desc.irradiance = IrradianceSource::SphericalHarmonics {
            bands,
            coefficients: coefficients.to_vec(),
        };
        self
    }

    /// Set the irradiance from radiance SH coefficients
    pub fn with_radiance_sh(mut self, bands: u8, coefficients: &[Vec3]) -> Self {
        self.desc.irradiance = IrradianceSource::Radiance {
            bands,
            coefficients: coefficients.to_vec(),
        };
        self
    }

    /// Set the irradiance as a cubemap
    pub fn with_irradiance_cubemap(mut self, cubemap: TextureRef) -> Self {
        self.desc.irradiance = IrradianceSource::Cubemap(cubemap);
        self
    }

    /// Set the intensity in cd/m² (default 30000)
    pub fn with_intensity(mut self, intensity: f32) -> Self {
        self.desc.intensity = intensity;
        self
    }

    /// Set the rigid-body rotation of the environment
    pub fn with_rotation(mut self, rotation: Mat3) -> Self {
        self.desc.rotation = rotation;
        self
    }

    pub fn desc(&self) -> &EnvironmentDesc {
        &self.desc
    }

    /// Back to the defaults, ready to describe another environment.
    pub fn reset(&mut self) {
        self.desc = EnvironmentDesc::default();
    }

    /// Creates the environment in `engine`.
    ///
    /// Fails with a precondition error for invalid input and with a postcondition error
    /// when the device cannot provide the resources. Nothing is created on failure.
    pub fn build(&self, engine: &mut Engine) -> Result<EnvironmentHandle> {
        engine.create_environment(&self.desc)
    }

    /// Like [`build`](Self::build), but logs the error and returns `None`.
    pub fn try_build(&self, engine: &mut Engine) -> Option<EnvironmentHandle> {
        match self.build(engine) {
            Ok(handle) => Some(handle),
            Err(err) => {
                log::error!("Failed to build environment ({:?}): {}", err.kind(), err);
                None
            }
        }
    }
}

impl From<EnvironmentDesc> for EnvironmentBuilder {
    fn from(desc: EnvironmentDesc) -> Self {
        Self { desc }
    }
}
