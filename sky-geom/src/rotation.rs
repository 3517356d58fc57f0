//! 3x3 rotation matrices for reprojecting sky positions.
//!
//! Tiles are described in equatorial coordinates but are often easier to
//! reason about in a local frame whose +X axis points at the tile center. That
//! frame is reached by two axis rotations: first about Z by the center's right
//! ascension, then about Y by minus its declination. See
//! [`RotationMatrix3::centered_on`].
//!
//! # Conventions
//!
//! Storage is row-major, `elements[row][col]`. Axis rotations follow the ERFA
//! convention (positive angles rotate the *frame* counterclockwise, looking
//! from the positive axis toward the origin), and each `rotate_*` call
//! pre-multiplies, so the most recent call acts last on a vector:
//!
//! ```text
//! Rz(psi)   = | cos  sin  0 |      Ry(theta) = | cos  0  -sin |
//!             |-sin  cos  0 |                  |  0   1    0  |
//!             |  0    0   1 |                  | sin  0   cos |
//! ```
//!
//! ```
//! use sky_geom::{RotationMatrix3, Vector3};
//!
//! let m = RotationMatrix3::centered_on(0.4, -0.2);
//! let center = m.apply(&Vector3::from_spherical(0.4, -0.2));
//! assert!((center.x - 1.0).abs() < 1e-15);
//! ```

use crate::Vector3;

/// A proper 3x3 rotation (orthogonal, determinant +1). Angles in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RotationMatrix3 {
    elements: [[f64; 3]; 3],
}

impl RotationMatrix3 {
    pub fn identity() -> Self {
        Self {
            elements: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
        }
    }

    /// Wraps a row-major array. No orthogonality check is made; see
    /// [`is_rotation_matrix`](Self::is_rotation_matrix).
    pub fn from_array(elements: [[f64; 3]; 3]) -> Self {
        Self { elements }
    }

    /// The rotation that carries the sky position `(ra, dec)` (radians) to
    /// `(1, 0, 0)`: `Ry(-dec) * Rz(ra)`.
    pub fn centered_on(ra: f64, dec: f64) -> Self {
        let mut m = Self::identity();
        m.rotate_z(ra);
        m.rotate_y(-dec);
        m
    }

    /// Replaces `self` with `Rz(psi) * self`.
    pub fn rotate_z(&mut self, psi: f64) {
        let (s, c) = psi.sin_cos();

        let a00 = c * self.elements[0][0] + s * self.elements[1][0];
        let a01 = c * self.elements[0][1] + s * self.elements[1][1];
        let a02 = c * self.elements[0][2] + s * self.elements[1][2];
        let a10 = -s * self.elements[0][0] + c * self.elements[1][0];
        let a11 = -s * self.elements[0][1] + c * self.elements[1][1];
        let a12 = -s * self.elements[0][2] + c * self.elements[1][2];

        self.elements[0] = [a00, a01, a02];
        self.elements[1] = [a10, a11, a12];
    }

    /// Replaces `self` with `Ry(theta) * self`.
    pub fn rotate_y(&mut self, theta: f64) {
        let (s, c) = theta.sin_cos();

        let a00 = c * self.elements[0][0] - s * self.elements[2][0];
        let a01 = c * self.elements[0][1] - s * self.elements[2][1];
        let a02 = c * self.elements[0][2] - s * self.elements[2][2];
        let a20 = s * self.elements[0][0] + c * self.elements[2][0];
        let a21 = s * self.elements[0][1] + c * self.elements[2][1];
        let a22 = s * self.elements[0][2] + c * self.elements[2][2];

        self.elements[0] = [a00, a01, a02];
        self.elements[2] = [a20, a21, a22];
    }

    /// `self * other`: `other` acts first.
    pub fn multiply(&self, other: &Self) -> Self {
        let mut result = [[0.0; 3]; 3];

        for (i, row) in result.iter_mut().enumerate() {
            for (j, cell) in row.iter_mut().enumerate() {
                for k in 0..3 {
                    *cell += self.elements[i][k] * other.elements[k][j];
                }
            }
        }

        Self::from_array(result)
    }

    pub fn apply(&self, v: &Vector3) -> Vector3 {
        let m = &self.elements;
        Vector3::new(
            m[0][0] * v.x + m[0][1] * v.y + m[0][2] * v.z,
            m[1][0] * v.x + m[1][1] * v.y + m[1][2] * v.z,
            m[2][0] * v.x + m[2][1] * v.y + m[2][2] * v.z,
        )
    }

    /// The inverse rotation.
    pub fn transpose(&self) -> Self {
        let m = &self.elements;
        Self::from_array([
            [m[0][0], m[1][0], m[2][0]],
            [m[0][1], m[1][1], m[2][1]],
            [m[0][2], m[1][2], m[2][2]],
        ])
    }

    pub fn determinant(&self) -> f64 {
        let m = &self.elements;

        m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
            - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
            + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
    }

    /// True when `det = +1` and `M * Mᵀ = I`, both within `tolerance`.
    pub fn is_rotation_matrix(&self, tolerance: f64) -> bool {
        if (self.determinant() - 1.0).abs() > tolerance {
            return false;
        }

        let product = self.multiply(&self.transpose());
        let identity = Self::identity();
        (0..3).all(|i| {
            (0..3).all(|j| (product.elements[i][j] - identity.elements[i][j]).abs() <= tolerance)
        })
    }

    /// Rotates a sky position given in radians. The returned RA is in
    /// `[0, 2π)`.
    pub fn transform_spherical(&self, ra: f64, dec: f64) -> (f64, f64) {
        self.apply(&Vector3::from_spherical(ra, dec)).to_spherical()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{DEG_TO_RAD, HALF_PI};
    use approx::assert_abs_diff_eq;

    fn assert_vec_eq(a: Vector3, b: Vector3, eps: f64) {
        assert_abs_diff_eq!(a.x, b.x, epsilon = eps);
        assert_abs_diff_eq!(a.y, b.y, epsilon = eps);
        assert_abs_diff_eq!(a.z, b.z, epsilon = eps);
    }

    #[test]
    fn test_rotate_z_erfa_sense() {
        let mut m = RotationMatrix3::identity();
        m.rotate_z(HALF_PI);
        assert_vec_eq(
            m.apply(&Vector3::x_axis()),
            Vector3::new(0.0, -1.0, 0.0),
            1e-15,
        );
    }

    #[test]
    fn test_rotate_y_erfa_sense() {
        let mut m = RotationMatrix3::identity();
        m.rotate_y(HALF_PI);
        assert_vec_eq(
            m.apply(&Vector3::z_axis()),
            Vector3::new(-1.0, 0.0, 0.0),
            1e-15,
        );
    }

    #[test]
    fn test_centered_on_matches_explicit_product() {
        let (ra, dec) = (37.0 * DEG_TO_RAD, -21.0 * DEG_TO_RAD);
        let (sr, cr) = ra.sin_cos();
        let (sd, cd) = dec.sin_cos();
        let ra_mat = RotationMatrix3::from_array([[cr, sr, 0.0], [-sr, cr, 0.0], [0.0, 0.0, 1.0]]);
        let dec_mat = RotationMatrix3::from_array([[cd, 0.0, sd], [0.0, 1.0, 0.0], [-sd, 0.0, cd]]);
        let expected = dec_mat.multiply(&ra_mat);

        let m = RotationMatrix3::centered_on(ra, dec);
        for axis in [Vector3::x_axis(), Vector3::y_axis(), Vector3::z_axis()] {
            assert_vec_eq(m.apply(&axis), expected.apply(&axis), 1e-15);
        }
    }

    #[test]
    fn test_centered_on_maps_center_to_x_axis() {
        let (ra, dec) = (200.0 * DEG_TO_RAD, 63.0 * DEG_TO_RAD);
        let m = RotationMatrix3::centered_on(ra, dec);
        assert_vec_eq(
            m.apply(&Vector3::from_spherical(ra, dec)),
            Vector3::x_axis(),
            1e-14,
        );
        assert!(m.is_rotation_matrix(1e-14));
    }

    #[test]
    fn test_transpose_inverts() {
        let m = RotationMatrix3::centered_on(1.1, 0.3);
        let v = Vector3::from_spherical(2.0, -0.7);
        assert_vec_eq(m.transpose().apply(&m.apply(&v)), v, 1e-15);
    }

    #[test]
    fn test_is_rotation_matrix_rejects_scaling() {
        let m = RotationMatrix3::from_array([[2.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]);
        assert!(!m.is_rotation_matrix(1e-14));
    }

    #[test]
    fn test_is_rotation_matrix_rejects_reflection() {
        let m = RotationMatrix3::from_array([[-1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]);
        assert!(!m.is_rotation_matrix(1e-14));
    }

    #[test]
    fn test_transform_spherical_identity() {
        let (ra, dec) = RotationMatrix3::identity().transform_spherical(1.0, 0.5);
        assert_abs_diff_eq!(ra, 1.0, epsilon = 1e-14);
        assert_abs_diff_eq!(dec, 0.5, epsilon = 1e-14);
    }
}
