//! Core types shared by the Solis crates: errors, texture references, the device
//! seam and engine configuration.

pub mod config;
pub mod error;
pub mod gpu_resources;
pub mod rotation;
pub mod texture;

pub use config::EngineConfig;
pub use error::{FailureKind, Result, SolisError};
pub use gpu_resources::{BufferDesc, BufferHandle, BufferUsage, Device, HostDevice, ResourceHandle};
pub use rotation::is_rigid;
pub use texture::{TextureId, TextureRef, TextureTarget};

pub use glam;
