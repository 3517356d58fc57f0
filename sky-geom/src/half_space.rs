//! Half-spaces of the unit sphere.
//!
//! A half-space is everything on one side of a plane: the unit vectors `p`
//! with `n · p >= d` for a unit normal `n` and cutoff `d ∈ [-1, 1]`. On the
//! sphere that is a cap centered on `n` with angular radius `acos(d)`:
//!
//! | `d` | Shape |
//! |-----|-------|
//! | `1` | the single point `n` |
//! | `(0, 1)` | a cap smaller than a hemisphere |
//! | `0` | the hemisphere bounded by the great circle normal to `n` |
//! | `(-1, 0)` | a cap larger than a hemisphere |
//! | `-1` | the whole sphere |
//!
//! Convex spherical polygons are intersections of half-spaces, which is how
//! tiles are represented elsewhere. This module supplies the per-half-space
//! predicates (point containment, circle overlap, trixel classification), the
//! boundary intersection [`intersect_half_spaces`], and the HTM cover
//! [`HalfSpace::find_all_trixels`].

use crate::constants::{BOUNDARY_TOLERANCE, CUTOFF_SLACK, DEG_TO_RAD, HALF_PI, PI};
use crate::htm::{check_level, Trixel, TrixelBounds, TrixelContainment};
use crate::{GeomError, GeomResult, Vector3};

/// A cap of the unit sphere: points `p` with `vector · p >= dd`.
///
/// With the `serde` feature, deserialization goes through [`HalfSpace::new`]:
/// the normal is renormalized, `phi` is recomputed from `dd`, and invalid
/// input is rejected.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "RawHalfSpace")
)]
pub struct HalfSpace {
    vector: Vector3,
    dd: f64,
    phi: f64,
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawHalfSpace {
    vector: Vector3,
    dd: f64,
}

#[cfg(feature = "serde")]
impl TryFrom<RawHalfSpace> for HalfSpace {
    type Error = GeomError;

    fn try_from(raw: RawHalfSpace) -> GeomResult<Self> {
        Self::new(raw.vector, raw.dd)
    }
}

impl HalfSpace {
    /// Builds a half-space from any non-zero normal; the normal is rescaled to
    /// unit length.
    ///
    /// # Errors
    /// [`GeomError::InvalidVector`] for a zero or non-finite normal,
    /// [`GeomError::InvalidHalfSpace`] when `dd` is not finite or lies outside
    /// `[-1, 1]` by more than rounding slack.
    pub fn new(vector: Vector3, dd: f64) -> GeomResult<Self> {
        let vector = vector.try_normalize("HalfSpace::new")?;
        if !dd.is_finite() {
            return Err(GeomError::invalid_half_space(format!(
                "cutoff must be finite, got {}",
                dd
            )));
        }
        if dd.abs() > 1.0 + CUTOFF_SLACK {
            return Err(GeomError::invalid_half_space(format!(
                "cutoff {} outside [-1, 1]",
                dd
            )));
        }
        let dd = dd.clamp(-1.0, 1.0);
        Ok(Self {
            vector,
            dd,
            phi: libm::acos(dd),
        })
    }

    /// The cap of angular radius `radius` (radians) around `center`. Radii of
    /// π or more give the whole sphere.
    pub fn from_center(center: Vector3, radius: f64) -> GeomResult<Self> {
        Self::new(center, libm::cos(radius.min(PI)))
    }

    /// The cap of angular radius `radius_deg` around `(ra_deg, dec_deg)`.
    pub fn from_ra_dec(ra_deg: f64, dec_deg: f64, radius_deg: f64) -> GeomResult<Self> {
        Self::from_center(
            Vector3::from_degrees(ra_deg, dec_deg),
            radius_deg * DEG_TO_RAD,
        )
    }

    /// The hemisphere bounded by the great circle through `pt1` and `pt2`,
    /// on whichever side holds `inner`.
    ///
    /// # Errors
    /// [`GeomError::DegenerateGeometry`] when `pt1` and `pt2` are parallel or
    /// antiparallel, so no unique great circle passes through them.
    pub fn from_points(pt1: &Vector3, pt2: &Vector3, inner: &Vector3) -> GeomResult<Self> {
        let axis = pt1.cross(pt2);
        if !axis.is_finite() || axis.magnitude() < BOUNDARY_TOLERANCE {
            return Err(GeomError::degenerate(
                "HalfSpace::from_points",
                &format!("{} and {} do not define a great circle", pt1, pt2),
            ));
        }
        let axis = axis.normalize();
        let axis = if axis.dot(inner) < 0.0 { -axis } else { axis };
        Ok(Self {
            vector: axis,
            dd: 0.0,
            phi: HALF_PI,
        })
    }

    /// Unit normal; the center of the cap.
    pub fn vector(&self) -> &Vector3 {
        &self.vector
    }

    /// Cutoff: the cosine of the cap's angular radius.
    pub fn dd(&self) -> f64 {
        self.dd
    }

    /// Angular radius of the cap in radians, `acos(dd)`.
    pub fn phi(&self) -> f64 {
        self.phi
    }

    /// Same cap after rotating its center with `rotate`. Rotations preserve
    /// angles, so the cutoff carries over unchanged.
    pub fn map_vector(&self, rotate: impl FnOnce(&Vector3) -> Vector3) -> GeomResult<Self> {
        Self::new(rotate(&self.vector), self.dd)
    }

    pub fn contains_pt(&self, pt: &Vector3) -> bool {
        self.vector.dot(pt) >= self.dd
    }

    /// Containment with `BOUNDARY_TOLERANCE` of slack, for points computed to
    /// lie on this half-space's own boundary.
    pub fn contains_pt_within_tolerance(&self, pt: &Vector3) -> bool {
        self.vector.dot(pt) >= self.dd - BOUNDARY_TOLERANCE
    }

    pub fn contains_many_pts(&self, pts: &[Vector3]) -> Vec<bool> {
        pts.iter().map(|p| self.contains_pt(p)).collect()
    }

    /// False only when the circle lies entirely outside the cap: the centers
    /// are further apart than the two radii combined.
    pub fn intersects_circle(&self, center: &Vector3, radius: f64) -> bool {
        self.vector.angular_separation(center) <= self.phi + radius
    }

    /// Where this half-space's boundary crosses the arc from `a` to `b`
    /// (shorter than π), if anywhere.
    fn crosses_arc(&self, a: &Vector3, b: &Vector3) -> bool {
        let Ok(normal) = a.cross(b).try_normalize("crosses_arc") else {
            return false;
        };
        let plane = Self {
            vector: normal,
            dd: 0.0,
            phi: HALF_PI,
        };
        match intersect_half_spaces(&plane, self) {
            Some(roots) => roots
                .iter()
                .any(|r| a.cross(r).dot(&normal) >= 0.0 && r.cross(b).dot(&normal) >= 0.0),
            None => false,
        }
    }

    fn crosses_any_edge(&self, trixel: &Trixel) -> bool {
        let [c0, c1, c2] = trixel.corners();
        self.crosses_arc(c0, c1) || self.crosses_arc(c1, c2) || self.crosses_arc(c2, c0)
    }

    /// Classifies a trixel against this half-space.
    pub fn contains_trixel(&self, trixel: &Trixel) -> TrixelContainment {
        let inside = trixel.corners().iter().filter(|c| self.contains_pt(c)).count();

        if inside == 3 {
            // A cap no larger than a hemisphere is convex, so it holds the
            // whole triangle. A larger cap can still have its hole inside.
            if self.dd >= 0.0 || self.dd <= -1.0 {
                return TrixelContainment::Full;
            }
            if trixel.contains_pt(&-self.vector) || self.crosses_any_edge(trixel) {
                return TrixelContainment::Partial;
            }
            return TrixelContainment::Full;
        }
        if inside > 0 {
            return TrixelContainment::Partial;
        }

        if trixel.contains_pt(&self.vector) {
            return TrixelContainment::Partial;
        }
        if !self.intersects_circle(&trixel.center(), trixel.bounding_radius()) {
            return TrixelContainment::Outside;
        }
        if self.crosses_any_edge(trixel) {
            TrixelContainment::Partial
        } else {
            TrixelContainment::Outside
        }
    }

    /// The htmids at `level` of every trixel that touches this half-space.
    ///
    /// Walks down from the base trixels: trixels wholly inside contribute
    /// their full range, partially covered ones are split until `level`, and
    /// trixels outside are dropped.
    pub fn find_all_trixels(&self, level: u32) -> GeomResult<TrixelBounds> {
        check_level(level)?;

        let mut ranges = Vec::new();
        let mut active = Trixel::base_trixels();
        while !active.is_empty() {
            let mut next = Vec::new();
            for trixel in active {
                match self.contains_trixel(&trixel) {
                    TrixelContainment::Full => ranges.push(trixel.htmid_range_at(level)?),
                    TrixelContainment::Partial if trixel.level() == level => {
                        ranges.push(trixel.htmid_range_at(level)?)
                    }
                    TrixelContainment::Partial => next.extend(trixel.children()),
                    TrixelContainment::Outside => {}
                }
            }
            active = next;
        }

        let bounds = TrixelBounds::from_ranges(level, ranges);
        log::trace!(
            "half-space cover at level {}: {} ranges, {} trixels",
            level,
            bounds.ranges().len(),
            bounds.count()
        );
        Ok(bounds)
    }
}

/// The points where the boundary circles of `a` and `b` meet.
///
/// Returns `None` when the normals are parallel or antiparallel, or when the
/// circles do not meet. Tangent circles yield the touching point twice.
pub fn intersect_half_spaces(a: &HalfSpace, b: &HalfSpace) -> Option<[Vector3; 2]> {
    let (n1, n2) = (a.vector, b.vector);
    let cos = n1.dot(&n2);
    let direction = n1.cross(&n2);
    let sin_sq = direction.magnitude_squared();
    if sin_sq < 1.0e-15 {
        return None;
    }

    // Point on the planes' line of intersection closest to the origin.
    let alpha = (a.dd - b.dd * cos) / sin_sq;
    let beta = (b.dd - a.dd * cos) / sin_sq;
    let foot = n1 * alpha + n2 * beta;
    let foot_sq = foot.magnitude_squared();
    if foot_sq > 1.0 + CUTOFF_SLACK {
        return None;
    }

    let t = libm::sqrt((1.0 - foot_sq).max(0.0) / sin_sq);
    Some([foot + direction * t, foot - direction * t])
}
