use crate::TextureTarget;
use thiserror::Error;

/// Which side of the contract a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The caller handed in malformed input. Never retried.
    Precondition,
    /// The device or environment failed at runtime (out of memory, device loss).
    /// The caller may retry after freeing resources.
    Postcondition,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolisError {
    #[error("Invalid spherical harmonics band count: {0} (must be 1, 2 or 3)")]
    InvalidBandCount(u8),

    #[error("Spherical harmonics coefficient count mismatch: {bands} band(s) need {expected} coefficients, got {actual}")]
    CoefficientCountMismatch {
        bands: u8,
        expected: usize,
        actual: usize,
    },

    #[error("{what} must be a cubemap, got {target:?}")]
    NotACubemap {
        what: &'static str,
        target: TextureTarget,
    },

    #[error("Rotation must be a rigid-body transform")]
    NonRigidRotation,

    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Out of memory: requested {requested} bytes, {available} available")]
    OutOfMemory { requested: u64, available: u64 },

    #[error("GPU device error: {0}")]
    GpuDeviceError(String),
}

impl SolisError {
    pub fn kind(&self) -> FailureKind {
        match self {
            SolisError::InvalidBandCount(_)
            | SolisError::CoefficientCountMismatch { .. }
            | SolisError::NotACubemap { .. }
            | SolisError::NonRigidRotation
            | SolisError::ResourceNotFound(_) => FailureKind::Precondition,
            SolisError::OutOfMemory { .. } | SolisError::GpuDeviceError(_) => {
                FailureKind::Postcondition
            }
        }
    }

    pub fn is_precondition(&self) -> bool {
        self.kind() == FailureKind::Precondition
    }

    pub fn is_postcondition(&self) -> bool {
        self.kind() == FailureKind::Postcondition
    }
}

pub type Result<T> = std::result::Result<T, SolisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caller_errors_are_preconditions() {
        assert!(SolisError::InvalidBandCount(4).is_precondition());
        assert!(SolisError::NonRigidRotation.is_precondition());
        assert!(SolisError::CoefficientCountMismatch { bands: 2, expected: 4, actual: 3 }
            .is_precondition());
    }

    #[test]
    fn device_errors_are_postconditions() {
        let err = SolisError::OutOfMemory { requested: 256, available: 64 };
        assert_eq!(err.kind(), FailureKind::Postcondition);
        assert!(SolisError::GpuDeviceError("lost".into()).is_postcondition());
    }

    #[test]
    fn messages_name_the_offending_values() {
        let msg = SolisError::CoefficientCountMismatch {
            bands: 2,
            expected: 4,
            actual: 3,
        }
        .to_string();
        assert!(msg.contains("2 band(s)"));
        assert!(msg.contains("got 3"));
    }
}
