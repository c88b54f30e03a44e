use glam::{Mat3, Quat};

/// Whether `m` is a rigid-body rotation: orthonormal with determinant +1, within
/// `tolerance` per element.
pub fn is_rigid(m: &Mat3, tolerance: f32) -> bool {
    let gram = m.transpose() * *m;
    gram.abs_diff_eq(Mat3::IDENTITY, tolerance) && (m.determinant() - 1.0).abs() <= tolerance
}

/// Rotation of `angle` radians around the world up axis (+Y), the usual way to
/// spin a sky environment.
pub fn yaw(angle: f32) -> Mat3 {
    Mat3::from_quat(Quat::from_rotation_y(angle))
}
