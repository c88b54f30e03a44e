//! Solis - image-based lighting for real-time renderers
//!
//! Solis describes the light of a distant environment as spherical-harmonics or
//! cubemap irradiance plus pre-filtered cubemap reflections, and keeps it in sync
//! with the device buffers a renderer binds.

pub use solis_core as core;
pub use solis_lighting as lighting;

pub mod prelude {
    pub use crate::core::{
        Device, EngineConfig, FailureKind, HostDevice, SolisError, TextureId, TextureRef,
    };
    pub use crate::lighting::{
        Engine, Environment, EnvironmentBuilder, EnvironmentHandle, Irradiance,
        SphericalHarmonics,
    };
    pub use glam;
}
