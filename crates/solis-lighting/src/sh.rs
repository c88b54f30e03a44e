//! Spherical harmonics for distant irradiance.
//!
//! Coefficients are RGB and ordered by `index(l, m) = l * (l + 1) + m`, up to 3 bands
//! (9 coefficients). Two flavours travel through this module:
//!
//! - *radiance* coefficients `L(l,m)`, projections of the environment radiance onto the
//!   orthonormal real SH basis;
//! - *irradiance* coefficients, `L(l,m)` pre-scaled by [`IRRADIANCE_SCALE`]: the basis
//!   normalization, the clamped-cosine convolution and the Lambertian `1/π`. Once
//!   pre-scaled, coefficient 0 is the environment's average irradiance.
//!
//! Basis convention (no Condon-Shortley phase):
//!
//! | index | l | m  | basis     |
//! |:-----:|:-:|:--:|:----------|
//! | 0     | 0 | 0  | 1         |
//! | 1     | 1 | -1 | y         |
//! | 2     | 1 | 0  | z         |
//! | 3     | 1 | 1  | x         |
//! | 4     | 2 | -2 | xy        |
//! | 5     | 2 | -1 | yz        |
//! | 6     | 2 | 0  | 3z² - 1   |
//! | 7     | 2 | 1  | xz        |
//! | 8     | 2 | 2  | x² - y²   |

use glam::{DMat3, DVec3, Mat3, Vec3};
use solis_core::{Result, SolisError};
use std::f64::consts::FRAC_1_SQRT_2;

pub const MAX_BANDS: u8 = 3;
pub const MAX_COEFFICIENTS: usize = 9;

/// `(1/π) · K̂(l,m) · Ĉ(l)` per coefficient: converts radiance to pre-scaled irradiance.
pub const IRRADIANCE_SCALE: [f32; MAX_COEFFICIENTS] = [
    0.282095, // l=0
    0.325735, 0.325735, 0.325735, // l=1
    0.045523, 0.091046, 0.157696, 0.091046, 0.045523, // l=2
];

// Orthonormal basis normalization
const K00: f64 = 0.282_094_791_773_878_14; // sqrt(1/4π)
const K1: f64 = 0.488_602_511_902_919_9; // sqrt(3/4π)
const K2_XY: f64 = 1.092_548_430_592_079_2; // sqrt(15/4π)
const K2_ZZ: f64 = 0.315_391_565_252_520_05; // sqrt(5/16π)
const K2_XX: f64 = 0.546_274_215_296_039_6; // sqrt(15/16π)

// Five directions whose band-2 basis samples form an invertible system. The closed form
// in `project_band2` is the inverse of that system.
const BAND2_SAMPLES: [DVec3; 5] = [
    DVec3::new(1.0, 0.0, 0.0),
    DVec3::new(0.0, 0.0, 1.0),
    DVec3::new(FRAC_1_SQRT_2, FRAC_1_SQRT_2, 0.0),
    DVec3::new(FRAC_1_SQRT_2, 0.0, FRAC_1_SQRT_2),
    DVec3::new(0.0, FRAC_1_SQRT_2, FRAC_1_SQRT_2),
];

// Rec. 709 luminance
const LUMINANCE: Vec3 = Vec3::new(0.2126, 0.7152, 0.0722);

pub fn is_valid_band_count(bands: u8) -> bool {
    (1..=MAX_BANDS).contains(&bands)
}

pub fn coefficient_count(bands: u8) -> usize {
    bands as usize * bands as usize
}

pub fn index(l: u8, m: i8) -> usize {
    debug_assert!(m.unsigned_abs() <= l, "m must lie in [-l, l]");
    let l = l as i32;
    (l * (l + 1) + m as i32) as usize
}

/// Checks a band count and the number of coefficients supplied for it.
pub fn validate(bands: u8, len: usize) -> Result<()> {
    if !is_valid_band_count(bands) {
        return Err(SolisError::InvalidBandCount(bands));
    }
    let expected = coefficient_count(bands);
    if len != expected {
        return Err(SolisError::CoefficientCountMismatch {
            bands,
            expected,
            actual: len,
        });
    }
    Ok(())
}

/// A validated set of 1, 4 or 9 RGB coefficients.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphericalHarmonics {
    bands: u8,
    coefficients: [Vec3; MAX_COEFFICIENTS],
}

impl SphericalHarmonics {
    pub fn new(bands: u8, coefficients: &[Vec3]) -> Result<Self> {
        validate(bands, coefficients.len())?;
        let mut storage = [Vec3::ZERO; MAX_COEFFICIENTS];
        storage[..coefficients.len()].copy_from_slice(coefficients);
        Ok(Self {
            bands,
            coefficients: storage,
        })
    }

    pub fn zero(bands: u8) -> Result<Self> {
        validate(bands, coefficient_count(bands))?;
        Ok(Self {
            bands,
            coefficients: [Vec3::ZERO; MAX_COEFFICIENTS],
        })
    }

    pub fn bands(&self) -> u8 {
        self.bands
    }

    pub fn coefficients(&self) -> &[Vec3] {
        &self.coefficients[..coefficient_count(self.bands)]
    }

    /// The `2l + 1` coefficients of band `l`, empty if the set has fewer bands.
    pub fn band(&self, l: u8) -> &[Vec3] {
        if l >= self.bands {
            return &[];
        }
        let start = coefficient_count(l);
        &self.coefficients[start..start + 2 * l as usize + 1]
    }

    pub fn get(&self, l: u8, m: i8) -> Option<Vec3> {
        if l >= self.bands || m.unsigned_abs() > l {
            return None;
        }
        Some(self.coefficients[index(l, m)])
    }

    /// Sum of squared coefficient magnitudes within band `l`.
    pub fn band_energy(&self, l: u8) -> f32 {
        self.band(l).iter().map(|c| c.length_squared()).sum()
    }

    pub fn radiance_to_irradiance(&self) -> Self {
        self.scaled(|c, scale| c * scale)
    }

    pub fn irradiance_to_radiance(&self) -> Self {
        self.scaled(|c, scale| c / scale)
    }

    fn scaled(&self, op: impl Fn(Vec3, f32) -> Vec3) -> Self {
        let mut out = *self;
        for (c, &scale) in out.coefficients[..coefficient_count(self.bands)]
            .iter_mut()
            .zip(IRRADIANCE_SCALE.iter())
        {
            *c = op(*c, scale);
        }
        out
    }

    /// Rotates the represented function by `rotation`: the result evaluated at `R·n`
    /// equals the input evaluated at `n`.
    ///
    /// Works on orthonormal (radiance) coefficients, where each band transforms
    /// orthogonally and keeps its energy. `rotation` must be rigid.
    pub fn rotate(&self, rotation: &Mat3) -> Self {
        if *rotation == Mat3::IDENTITY || self.bands == 1 {
            return *self;
        }

        let mut out = *self;
        let r = rotation.as_dmat3();

        // Band 1 is a vector (x, y, z) = (c3, c1, c2) per channel: rotate it directly.
        let band1 = DMat3::from_cols(
            self.coefficients[3].as_dvec3(),
            self.coefficients[1].as_dvec3(),
            self.coefficients[2].as_dvec3(),
        ) * r.transpose();
        out.coefficients[1] = band1.y_axis.as_vec3();
        out.coefficients[2] = band1.z_axis.as_vec3();
        out.coefficients[3] = band1.x_axis.as_vec3();

        if self.bands == 3 {
            let band2 = rotate_band2(&self.coefficients[4..9], &r);
            out.coefficients[4..9].copy_from_slice(&band2);
        }
        out
    }

    /// [`rotate`](Self::rotate) for pre-scaled irradiance coefficients.
    pub fn rotate_irradiance(&self, rotation: &Mat3) -> Self {
        if *rotation == Mat3::IDENTITY {
            return *self;
        }
        self.irradiance_to_radiance()
            .rotate(rotation)
            .radiance_to_irradiance()
    }

    /// Irradiance around `normal`, divided by π, from pre-scaled coefficients.
    pub fn irradiance(&self, normal: Vec3) -> Vec3 {
        let Vec3 { x, y, z } = normal;
        // Associated Legendre polynomials matching the K̂ factors in IRRADIANCE_SCALE
        let polynomial = [
            1.0,
            y,
            z,
            x,
            6.0 * x * y,
            3.0 * y * z,
            0.5 * (3.0 * z * z - 1.0),
            3.0 * x * z,
            3.0 * (x * x - y * y),
        ];
        self.coefficients()
            .iter()
            .zip(polynomial)
            .fold(Vec3::ZERO, |acc, (c, p)| acc + *c * p)
    }

    /// Direction travelled by light from the brightest region of the environment,
    /// taken from the luminance-weighted linear band.
    ///
    /// `None` for a single band or a perfectly uniform environment.
    pub fn direction_estimate(&self) -> Option<Vec3> {
        if self.bands < 2 {
            return None;
        }
        let towards_light = Vec3::new(
            self.coefficients[3].dot(LUMINANCE),
            self.coefficients[1].dot(LUMINANCE),
            self.coefficients[2].dot(LUMINANCE),
        );
        (-towards_light).try_normalize()
    }

    /// Colour and intensity of the directional light, travelling along `direction`,
    /// that best explains these pre-scaled irradiance coefficients.
    pub fn color_estimate(&self, direction: Vec3) -> ColorEstimate {
        let s = -direction.normalize_or_zero();
        let basis = orthonormal_basis(s);
        let radiance = self.irradiance_to_radiance();

        let mut projected = Vec3::ZERO;
        let mut norm = 0.0;
        for (c, y) in radiance.coefficients().iter().zip(basis) {
            projected += *c * y;
            norm += y * y;
        }
        ColorEstimate::from_rgb(projected / norm)
    }
}

/// Radiance coefficients to pre-scaled irradiance coefficients.
pub fn radiance_to_irradiance(radiance: &SphericalHarmonics) -> SphericalHarmonics {
    radiance.radiance_to_irradiance()
}

/// See [`SphericalHarmonics::rotate`].
pub fn rotate(coefficients: &SphericalHarmonics, rotation: &Mat3) -> SphericalHarmonics {
    coefficients.rotate(rotation)
}

/// Colour of an estimated light, split into a normalized colour and an intensity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorEstimate {
    /// Colour with its largest component at 1 (black when `intensity` is 0)
    pub color: Vec3,
    pub intensity: f32,
}

impl ColorEstimate {
    fn from_rgb(rgb: Vec3) -> Self {
        let intensity = rgb.max_element().max(0.0);
        let color = if intensity > 0.0 {
            (rgb / intensity).max(Vec3::ZERO)
        } else {
            Vec3::ZERO
        };
        Self { color, intensity }
    }

    pub fn rgb(&self) -> Vec3 {
        self.color * self.intensity
    }
}

fn orthonormal_basis(s: Vec3) -> [f32; MAX_COEFFICIENTS] {
    let DVec3 { x, y, z } = s.as_dvec3();
    [
        K00,
        K1 * y,
        K1 * z,
        K1 * x,
        K2_XY * x * y,
        K2_XY * y * z,
        K2_ZZ * (3.0 * z * z - 1.0),
        K2_XY * x * z,
        K2_XX * (x * x - y * y),
    ]
    .map(|v| v as f32)
}

fn band2_basis(n: DVec3) -> [f64; 5] {
    let DVec3 { x, y, z } = n;
    [
        K2_XY * x * y,
        K2_XY * y * z,
        K2_ZZ * (3.0 * z * z - 1.0),
        K2_XY * x * z,
        K2_XX * (x * x - y * y),
    ]
}

/// Band-2 coefficients of a band-2 function sampled at `BAND2_SAMPLES`.
fn project_band2(f: [DVec3; 5]) -> [DVec3; 5] {
    let [f0, f1, f2, f3, f4] = f;
    [
        (2.0 * f2 + f1) / K2_XY,
        (2.0 * f4 + f0) / K2_XY,
        f1 / (2.0 * K2_ZZ),
        (2.0 * f3 - f0 - f1) / K2_XY,
        (f0 + 0.5 * f1) / K2_XX,
    ]
}

fn rotate_band2(band: &[Vec3], rotation: &DMat3) -> [Vec3; 5] {
    let inverse = rotation.transpose();
    let samples = BAND2_SAMPLES.map(|n| {
        band.iter()
            .zip(band2_basis(inverse * n))
            .fold(DVec3::ZERO, |acc, (c, y)| acc + c.as_dvec3() * y)
    });
    project_band2(samples).map(|c| c.as_vec3())
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;

    fn sample_set() -> SphericalHarmonics {
        let coefficients: Vec<Vec3> = (0..9)
            .map(|i| {
                let i = i as f32;
                Vec3::new(0.9 - 0.1 * i, 0.05 * i - 0.2, (i * 0.7).sin())
            })
            .collect();
        SphericalHarmonics::new(3, &coefficients).unwrap()
    }

    fn rotation() -> Mat3 {
        Mat3::from_quat(Quat::from_axis_angle(Vec3::new(0.3, -1.0, 0.7).normalize(), 1.1))
    }

    #[test]
    fn band_counts() {
        assert!(!is_valid_band_count(0));
        assert!(is_valid_band_count(1));
        assert!(is_valid_band_count(3));
        assert!(!is_valid_band_count(4));
        assert_eq!(coefficient_count(1), 1);
        assert_eq!(coefficient_count(2), 4);
        assert_eq!(coefficient_count(3), 9);
    }

    #[test]
    fn index_layout() {
        assert_eq!(index(0, 0), 0);
        assert_eq!(index(1, -1), 1);
        assert_eq!(index(1, 1), 3);
        assert_eq!(index(2, -2), 4);
        assert_eq!(index(2, 0), 6);
        assert_eq!(index(2, 2), 8);
    }

    #[test]
    fn validate_rejects_bad_shapes() {
        assert!(validate(2, 4).is_ok());
        assert_eq!(
            validate(2, 3),
            Err(SolisError::CoefficientCountMismatch { bands: 2, expected: 4, actual: 3 })
        );
        assert_eq!(validate(0, 0), Err(SolisError::InvalidBandCount(0)));
        assert_eq!(validate(4, 16), Err(SolisError::InvalidBandCount(4)));
    }

    #[test]
    fn zero_sets() {
        let sh = SphericalHarmonics::zero(2).unwrap();
        assert_eq!(sh.coefficients(), &[Vec3::ZERO; 4]);
        assert!(SphericalHarmonics::zero(0).is_err());
        assert!(SphericalHarmonics::zero(5).is_err());
    }

    #[test]
    fn band_slices() {
        let sh = sample_set();
        assert_eq!(sh.band(0).len(), 1);
        assert_eq!(sh.band(1).len(), 3);
        assert_eq!(sh.band(2), &sh.coefficients()[4..9]);
        assert!(sh.band(3).is_empty());
        assert_eq!(sh.get(2, -1), Some(sh.coefficients()[5]));
        assert_eq!(sh.get(1, 2), None);
    }

    #[test]
    fn conversion_scales_each_coefficient() {
        let sh = SphericalHarmonics::new(3, &[Vec3::ONE; 9]).unwrap();
        let irradiance = sh.radiance_to_irradiance();
        for (c, scale) in irradiance.coefficients().iter().zip(IRRADIANCE_SCALE) {
            assert_eq!(*c, Vec3::splat(scale));
        }
    }

    #[test]
    fn conversion_round_trips() {
        let sh = sample_set();
        let back = sh.radiance_to_irradiance().irradiance_to_radiance();
        for (a, b) in sh.coefficients().iter().zip(back.coefficients()) {
            assert!(a.abs_diff_eq(*b, 1e-5));
        }
    }

    #[test]
    fn band1_rotation_follows_the_matrix() {
        // A lobe pointing at +X rotated a quarter turn around +Z points at +Y.
        let sh =
            SphericalHarmonics::new(2, &[Vec3::ZERO, Vec3::ZERO, Vec3::ZERO, Vec3::ONE]).unwrap();
        let r = Mat3::from_rotation_z(std::f32::consts::FRAC_PI_2);
        let rotated = sh.rotate(&r);
        assert!(rotated.coefficients()[1].abs_diff_eq(Vec3::ONE, 1e-6));
        assert!(rotated.coefficients()[3].abs_diff_eq(Vec3::ZERO, 1e-6));
    }

    #[test]
    fn rotated_function_matches_at_rotated_directions() {
        let sh = sample_set().radiance_to_irradiance();
        let r = rotation();
        let rotated = sh.rotate_irradiance(&r);
        let directions = [
            Vec3::X,
            Vec3::new(0.2, 0.5, -0.8).normalize(),
            Vec3::new(-1.0, 1.0, 1.0).normalize(),
        ];
        for n in directions {
            let expected = sh.irradiance(n);
            let actual = rotated.irradiance(r * n);
            assert!(actual.abs_diff_eq(expected, 1e-4), "{actual} != {expected}");
        }
    }

    #[test]
    fn single_band_ignores_rotation() {
        let sh = SphericalHarmonics::new(1, &[Vec3::new(0.1, 0.2, 0.3)]).unwrap();
        assert_eq!(sh.rotate(&rotation()), sh);
    }

    #[test]
    fn constant_environment_irradiance_is_uniform() {
        let sh = SphericalHarmonics::new(1, &[Vec3::splat(0.5)]).unwrap();
        assert_eq!(sh.irradiance(Vec3::Y), Vec3::splat(0.5));
        assert_eq!(sh.irradiance(-Vec3::Z), Vec3::splat(0.5));
    }

    #[test]
    fn direction_estimate_points_away_from_the_light() {
        // Radiance of a white light arriving from +Y, projected on bands 0 and 1.
        let radiance = SphericalHarmonics::new(
            2,
            &[Vec3::splat(K00 as f32), Vec3::splat(K1 as f32), Vec3::ZERO, Vec3::ZERO],
        )
        .unwrap();
        let direction = radiance.radiance_to_irradiance().direction_estimate().unwrap();
        assert!(direction.abs_diff_eq(-Vec3::Y, 1e-6));
    }

    #[test]
    fn direction_estimate_needs_a_linear_band() {
        assert!(SphericalHarmonics::new(1, &[Vec3::ONE]).unwrap().direction_estimate().is_none());
        let flat =
            SphericalHarmonics::new(2, &[Vec3::ONE, Vec3::ZERO, Vec3::ZERO, Vec3::ZERO]).unwrap();
        assert!(flat.direction_estimate().is_none());
    }

    #[test]
    fn color_estimate_recovers_a_directional_light() {
        let color = Vec3::new(2.0, 1.0, 0.5);
        let from = Vec3::new(0.3, 0.8, -0.5).normalize();
        let projected: Vec<Vec3> = orthonormal_basis(from).iter().map(|y| color * *y).collect();
        let irradiance = SphericalHarmonics::new(3, &projected).unwrap().radiance_to_irradiance();

        let estimate = irradiance.color_estimate(-from);
        assert!((estimate.intensity - 2.0).abs() < 1e-3);
        assert!(estimate.color.abs_diff_eq(Vec3::new(1.0, 0.5, 0.25), 1e-3));
        assert!(estimate.rgb().abs_diff_eq(color, 1e-3));
    }

    #[test]
    fn color_estimate_of_darkness_is_black() {
        let sh = SphericalHarmonics::zero(3).unwrap();
        let estimate = sh.color_estimate(Vec3::Y);
        assert_eq!(estimate.intensity, 0.0);
        assert_eq!(estimate.color, Vec3::ZERO);
    }
}
