use serde::{Deserialize, Serialize};

/// Engine-wide settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Upper bound on device memory in bytes. `None` means unlimited.
    pub device_memory_budget: Option<u64>,
    /// Reject non-rigid environment rotations when building
    pub validate_rotation: bool,
    /// Per-element tolerance used by the rigidity check
    pub rotation_tolerance: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            device_memory_budget: None,
            validate_rotation: true,
            rotation_tolerance: 1e-3,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_device_memory_budget(mut self, bytes: u64) -> Self {
        self.device_memory_budget = Some(bytes);
        self
    }

    pub fn with_rotation_validation(mut self, enabled: bool) -> Self {
        self.validate_rotation = enabled;
        self
    }

    pub fn with_rotation_tolerance(mut self, tolerance: f32) -> Self {
        self.rotation_tolerance = tolerance.abs();
        self
    }
}
