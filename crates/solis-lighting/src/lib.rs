//! Image-based lighting for Solis
//!
//! An [`Environment`] describes lighting from a distant environment (sky, far
//! mountains) as two parts:
//!
//! 1. irradiance, as spherical harmonics of 1, 2 or 3 bands or as a cubemap
//! 2. reflections, as a cubemap pyramid pre-filtered per roughness level
//!
//! Environments are described with an [`EnvironmentBuilder`], created in an [`Engine`]
//! and destroyed through it:
//!
//! ```ignore
//! let mut engine = Engine::new(EngineConfig::default());
//! let environment = EnvironmentBuilder::new()
//!     .with_reflections(cubemap)
//!     .with_irradiance_sh(3, &coefficients)
//!     .build(&mut engine)?;
//!
//! engine.destroy_environment(environment);
//! ```

pub mod builder;
pub mod engine;
pub mod environment;
pub mod sh;

pub use builder::{EnvironmentBuilder, EnvironmentDesc, IrradianceSource, DEFAULT_INTENSITY};
pub use engine::{Engine, EnvironmentHandle};
pub use environment::{
    Environment, EnvironmentFlags, EnvironmentSnapshot, EnvironmentUniforms, Irradiance,
};
pub use sh::{ColorEstimate, SphericalHarmonics};
