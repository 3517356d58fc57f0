//! Cartesian 3-vectors for positions on the unit sphere.
//!
//! Sky positions enter the geometry as right ascension / declination and are
//! converted once to unit vectors; every containment test after that is a dot
//! product. The convention is the usual equatorial one:
//!
//! ```text
//! x = cos(dec) cos(ra)    y = cos(dec) sin(ra)    z = sin(dec)
//! ```
//!
//! ```
//! use sky_geom::Vector3;
//!
//! let vernal_equinox = Vector3::from_degrees(0.0, 0.0);
//! let north_pole = Vector3::from_degrees(0.0, 90.0);
//! assert!(vernal_equinox.dot(&north_pole).abs() < 1e-15);
//! ```

use crate::constants::{DEG_TO_RAD, RAD_TO_DEG, TWOPI};
use crate::{GeomError, GeomResult};
use std::fmt;

/// A 3D cartesian vector. Components are public; most callers only ever hold
/// unit vectors.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    #[inline]
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub fn zeros() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    #[inline]
    pub fn x_axis() -> Self {
        Self::new(1.0, 0.0, 0.0)
    }

    #[inline]
    pub fn y_axis() -> Self {
        Self::new(0.0, 1.0, 0.0)
    }

    /// The north celestial pole.
    #[inline]
    pub fn z_axis() -> Self {
        Self::new(0.0, 0.0, 1.0)
    }

    #[inline]
    pub fn from_array(arr: [f64; 3]) -> Self {
        Self::new(arr[0], arr[1], arr[2])
    }

    #[inline]
    pub fn to_array(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    /// Unit vector for a sky position given in radians.
    pub fn from_spherical(ra: f64, dec: f64) -> Self {
        let (sin_ra, cos_ra) = libm::sincos(ra);
        let (sin_dec, cos_dec) = libm::sincos(dec);
        Self::new(cos_dec * cos_ra, cos_dec * sin_ra, sin_dec)
    }

    /// Unit vector for a sky position given in degrees.
    pub fn from_degrees(ra_deg: f64, dec_deg: f64) -> Self {
        Self::from_spherical(ra_deg * DEG_TO_RAD, dec_deg * DEG_TO_RAD)
    }

    /// Returns `(ra, dec)` in radians with `ra` in `[0, 2π)`.
    ///
    /// The vector need not be normalized. The zero vector maps to `(0, 0)`.
    pub fn to_spherical(&self) -> (f64, f64) {
        let d2 = self.x * self.x + self.y * self.y;
        let mut ra = if d2 == 0.0 {
            0.0
        } else {
            libm::atan2(self.y, self.x)
        };
        if ra < 0.0 {
            ra += TWOPI;
        }
        let dec = if self.z == 0.0 {
            0.0
        } else {
            libm::atan2(self.z, libm::sqrt(d2))
        };
        (ra, dec)
    }

    /// Same as [`to_spherical`](Self::to_spherical), in degrees.
    pub fn to_degrees(&self) -> (f64, f64) {
        let (ra, dec) = self.to_spherical();
        (ra * RAD_TO_DEG, dec * RAD_TO_DEG)
    }

    #[inline]
    pub fn magnitude(&self) -> f64 {
        libm::sqrt(self.magnitude_squared())
    }

    #[inline]
    pub fn magnitude_squared(&self) -> f64 {
        self.x * self.x + self.y * self.y + self.z * self.z
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Returns the unit vector in the same direction, or the zero vector
    /// unchanged.
    pub fn normalize(&self) -> Self {
        let mag = self.magnitude();
        if mag == 0.0 {
            *self
        } else {
            *self / mag
        }
    }

    /// Like [`normalize`](Self::normalize) but rejects zero-length and
    /// non-finite input instead of passing it through.
    pub fn try_normalize(&self, operation: &str) -> GeomResult<Self> {
        if !self.is_finite() {
            return Err(GeomError::invalid_vector(
                operation,
                &format!("non-finite components {}", self),
            ));
        }
        let mag = self.magnitude();
        if mag == 0.0 {
            return Err(GeomError::invalid_vector(operation, "zero-length vector"));
        }
        Ok(*self / mag)
    }

    #[inline]
    pub fn dot(&self, other: &Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(&self, other: &Self) -> Self {
        Self::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    /// Angle between two directions, in radians.
    ///
    /// Uses `atan2(|a × b|, a · b)`, which stays accurate for both tiny and
    /// near-antipodal separations where `acos` of the dot product does not.
    pub fn angular_separation(&self, other: &Self) -> f64 {
        libm::atan2(self.cross(other).magnitude(), self.dot(other))
    }
}

impl std::ops::Add for Vector3 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl std::ops::Sub for Vector3 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl std::ops::Mul<f64> for Vector3 {
    type Output = Self;

    fn mul(self, scalar: f64) -> Self {
        Self::new(self.x * scalar, self.y * scalar, self.z * scalar)
    }
}

impl std::ops::Mul<Vector3> for f64 {
    type Output = Vector3;

    fn mul(self, vec: Vector3) -> Vector3 {
        vec * self
    }
}

impl std::ops::Div<f64> for Vector3 {
    type Output = Self;

    fn div(self, scalar: f64) -> Self {
        Self::new(self.x / scalar, self.y / scalar, self.z / scalar)
    }
}

impl std::ops::Neg for Vector3 {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

impl fmt::Display for Vector3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.9}, {:.9}, {:.9})", self.x, self.y, self.z)
    }
}
