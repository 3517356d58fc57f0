//! Tiles: convex sky polygons stored as intersections of half-spaces.
//!
//! Tiles are built from the corners of an RA/Dec box. Corners sharing a right
//! ascension bound a great-circle edge; corners sharing a declination bound a
//! constant-declination edge, which is a cap centered on one of the poles.
//! Every other corner pair (diagonals, coincident corners) contributes
//! nothing.
//!
//! Great-circle edges are oriented with a reference point offset by
//! `INTERIOR_OFFSET` radians from the box's RA and Dec extremes. Tiles
//! narrower than that offset may end up with an edge facing the wrong way.

use crate::errors::{TileError, TileResult};
use sky_geom::constants::{BOUNDARY_TOLERANCE, HALF_PI};
use sky_geom::{
    check_level, intersect_half_spaces, GeomResult, HalfSpace, RotationMatrix3, TrixelBounds,
    Vector3,
};
use std::sync::{Mutex, PoisonError};

/// Corners closer than this (in `1 - cos` of their separation, or in RA/Dec
/// difference) are treated as the same.
const CORNER_TOLERANCE: f64 = 1.0e-10;

/// Radians between a box extreme and the point used to orient a
/// great-circle edge.
const INTERIOR_OFFSET: f64 = 0.001;

/// A convex region of the sky: the points inside every one of its
/// half-spaces.
///
/// A tile with no half-spaces is *empty*. It is what degenerate corner lists
/// (fewer than three distinct corners) produce, and it contains nothing,
/// intersects nothing and covers no trixels.
#[derive(Debug)]
pub struct Tile {
    half_spaces: Vec<HalfSpace>,
    vertices: Vec<Vector3>,
    trixel_cache: Mutex<Option<TrixelBounds>>,
}

impl Tile {
    /// Builds a tile from box corners given as `(ra, dec)` in radians.
    ///
    /// # Errors
    /// [`TileError::MissingEdge`] when two corners that share an RA or a Dec
    /// do not determine an edge (for instance the two poles).
    pub fn build(corners: &[(f64, f64)]) -> TileResult<Self> {
        let points: Vec<Vector3> = corners
            .iter()
            .map(|&(ra, dec)| Vector3::from_spherical(ra, dec))
            .collect();

        let distinct = count_distinct(&points);
        if distinct < 3 {
            if !corners.is_empty() {
                log::warn!(
                    "tile with {} corners has only {} distinct, treating it as empty",
                    corners.len(),
                    distinct
                );
            }
            return Ok(Self::empty());
        }

        let (ra_min, ra_max) = min_max(corners.iter().map(|c| c.0));
        let (dec_min, dec_max) = min_max(corners.iter().map(|c| c.1));

        let mut half_spaces = Vec::new();
        for (i, &c1) in corners.iter().enumerate() {
            for (j, &c2) in corners.iter().enumerate().skip(i + 1) {
                if (1.0 - points[i].dot(&points[j])).abs() < CORNER_TOLERANCE {
                    continue;
                }

                let dra = (c1.0 - c2.0).abs();
                let ddec = (c1.1 - c2.1).abs();
                let edge = if dra < CORNER_TOLERANCE && ddec > CORNER_TOLERANCE {
                    let inner = if (c1.0 - ra_min).abs() < CORNER_TOLERANCE {
                        (ra_min + INTERIOR_OFFSET, dec_min + INTERIOR_OFFSET)
                    } else {
                        (ra_max - INTERIOR_OFFSET, dec_min + INTERIOR_OFFSET)
                    };
                    HalfSpace::from_points(
                        &points[i],
                        &points[j],
                        &Vector3::from_spherical(inner.0, inner.1),
                    )
                } else if ddec < CORNER_TOLERANCE && dra > CORNER_TOLERANCE {
                    if (c1.1 - dec_min).abs() < CORNER_TOLERANCE {
                        HalfSpace::from_center(Vector3::z_axis(), HALF_PI - dec_min)
                    } else {
                        HalfSpace::from_center(-Vector3::z_axis(), HALF_PI + dec_max)
                    }
                } else {
                    continue;
                };

                half_spaces.push(edge.map_err(|e| TileError::missing_edge(c1, c2, &e))?);
            }
        }

        Ok(Self::from_half_spaces(half_spaces))
    }

    /// A tile bounded by exactly `half_spaces`.
    pub fn from_half_spaces(half_spaces: Vec<HalfSpace>) -> Self {
        let vertices = find_vertices(&half_spaces);
        Self {
            half_spaces,
            vertices,
            trixel_cache: Mutex::new(None),
        }
    }

    pub fn empty() -> Self {
        Self::from_half_spaces(Vec::new())
    }

    pub fn half_spaces(&self) -> &[HalfSpace] {
        &self.half_spaces
    }

    pub fn is_empty(&self) -> bool {
        self.half_spaces.is_empty()
    }

    /// Polygon corners recovered from the half-spaces: pairwise boundary
    /// intersections that lie inside every other half-space.
    pub fn vertices(&self) -> &[Vector3] {
        &self.vertices
    }

    pub fn contains_pt(&self, pt: &Vector3) -> bool {
        !self.is_empty() && self.half_spaces.iter().all(|hs| hs.contains_pt(pt))
    }

    pub fn contains_many(&self, pts: &[Vector3]) -> Vec<bool> {
        pts.iter().map(|p| self.contains_pt(p)).collect()
    }

    /// The same tile with every half-space normal rotated by `matrix`.
    /// The trixel cache of the new tile starts out empty.
    pub fn rotate(&self, matrix: &RotationMatrix3) -> TileResult<Self> {
        let half_spaces = self
            .half_spaces
            .iter()
            .map(|hs| hs.map_vector(|v| matrix.apply(v)))
            .collect::<GeomResult<Vec<_>>>()?;
        Ok(Self::from_half_spaces(half_spaces))
    }

    /// Does any part of the circle of angular radius `radius` (radians)
    /// around `center` overlap the tile?
    pub fn intersects_circle(&self, center: &Vector3, radius: f64) -> bool {
        if self.is_empty() {
            return false;
        }
        if !self
            .half_spaces
            .iter()
            .all(|hs| hs.intersects_circle(center, radius))
        {
            return false;
        }
        if self.contains_pt(center) {
            return true;
        }

        let Ok(circle) = HalfSpace::from_center(*center, radius) else {
            return false;
        };

        // The circle's boundary enters the tile through some edge.
        for (i, edge) in self.half_spaces.iter().enumerate() {
            if let Some(roots) = intersect_half_spaces(edge, &circle) {
                if roots.iter().any(|r| self.contains_except(i, r)) {
                    return true;
                }
            }
        }

        // The tile sits wholly inside the circle.
        self.interior_points()
            .any(|p| circle.contains_pt_within_tolerance(&p))
    }

    /// Trixels at `level` that touch the tile, as the intersection of each
    /// half-space's cover.
    ///
    /// The last result is cached; asking for a different level replaces it.
    pub fn find_all_trixels(&self, level: u32) -> GeomResult<TrixelBounds> {
        check_level(level)?;

        let mut cache = self
            .trixel_cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(bounds) = cache.as_ref().filter(|b| b.level() == level) {
            return Ok(bounds.clone());
        }

        log::debug!(
            "computing trixel bounds at level {} for a tile with {} half-spaces",
            level,
            self.half_spaces.len()
        );
        let mut bounds: Option<TrixelBounds> = None;
        for hs in &self.half_spaces {
            let cover = hs.find_all_trixels(level)?;
            bounds = Some(match bounds {
                Some(acc) => acc.join(&cover)?,
                None => cover,
            });
        }
        let bounds = bounds.unwrap_or_else(|| TrixelBounds::empty(level));

        *cache = Some(bounds.clone());
        Ok(bounds)
    }

    /// Level of the cached trixel bounds, if any have been computed.
    pub fn trixel_bound_level(&self) -> Option<u32> {
        self.trixel_cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(TrixelBounds::level)
    }

    /// Points of the tile to test against an enclosing circle. A tile with no
    /// vertices is bounded by its tightest cap, whose center lies inside it.
    fn interior_points(&self) -> impl Iterator<Item = Vector3> + '_ {
        let centers = self
            .half_spaces
            .iter()
            .filter(move |_| self.vertices.is_empty())
            .map(|hs| *hs.vector())
            .filter(move |n| self.contains_pt(n));
        self.vertices.iter().copied().chain(centers)
    }

    fn contains_except(&self, skip: usize, pt: &Vector3) -> bool {
        self.half_spaces
            .iter()
            .enumerate()
            .all(|(k, hs)| k == skip || hs.contains_pt_within_tolerance(pt))
    }
}

impl Clone for Tile {
    fn clone(&self) -> Self {
        let cached = self
            .trixel_cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        Self {
            half_spaces: self.half_spaces.clone(),
            vertices: self.vertices.clone(),
            trixel_cache: Mutex::new(cached),
        }
    }
}

fn count_distinct(points: &[Vector3]) -> usize {
    let mut distinct: Vec<&Vector3> = Vec::with_capacity(points.len());
    for p in points {
        if !distinct
            .iter()
            .any(|q| (1.0 - p.dot(q)).abs() < CORNER_TOLERANCE)
        {
            distinct.push(p);
        }
    }
    distinct.len()
}

fn min_max(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    })
}

fn find_vertices(half_spaces: &[HalfSpace]) -> Vec<Vector3> {
    let mut vertices: Vec<Vector3> = Vec::new();
    for (i, a) in half_spaces.iter().enumerate() {
        for (j, b) in half_spaces.iter().enumerate().skip(i + 1) {
            let Some(roots) = intersect_half_spaces(a, b) else {
                continue;
            };
            for root in roots {
                let on_polygon = half_spaces
                    .iter()
                    .enumerate()
                    .all(|(k, hs)| k == i || k == j || hs.contains_pt_within_tolerance(&root));
                let seen = vertices
                    .iter()
                    .any(|v| (1.0 - v.dot(&root)).abs() < BOUNDARY_TOLERANCE);
                if on_polygon && !seen {
                    vertices.push(root);
                }
            }
        }
    }
    vertices
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use sky_geom::find_htmid;

    fn radec(ra_deg: f64, dec_deg: f64) -> (f64, f64) {
        (ra_deg.to_radians(), dec_deg.to_radians())
    }

    fn square() -> Tile {
        Tile::build(&[
            radec(10.0, 10.0),
            radec(10.0, 20.0),
            radec(20.0, 10.0),
            radec(20.0, 20.0),
        ])
        .unwrap()
    }

    fn pt(ra_deg: f64, dec_deg: f64) -> Vector3 {
        Vector3::from_degrees(ra_deg, dec_deg)
    }

    fn hits(tile: &Tile, ra_deg: f64, dec_deg: f64, radius_deg: f64) -> bool {
        tile.intersects_circle(&pt(ra_deg, dec_deg), radius_deg.to_radians())
    }

    #[test]
    fn test_square_has_four_edges_and_vertices() {
        let tile = square();
        assert_eq!(tile.half_spaces().len(), 4);
        assert_eq!(tile.vertices().len(), 4);
        for corner in [pt(10.0, 10.0), pt(10.0, 20.0), pt(20.0, 10.0), pt(20.0, 20.0)] {
            assert!(tile
                .vertices()
                .iter()
                .any(|v| v.angular_separation(&corner) < 1e-9));
        }
    }

    #[test]
    fn test_contains_many() {
        let tile = square();
        let probes = [pt(15.0, 15.0), pt(25.0, 15.0), pt(15.0, 5.0), pt(11.0, 19.0)];
        assert_eq!(tile.contains_many(&probes), vec![true, false, false, true]);
    }

    #[test]
    fn test_corner_order_does_not_matter() {
        let tile = Tile::build(&[
            radec(20.0, 20.0),
            radec(10.0, 10.0),
            radec(20.0, 10.0),
            radec(10.0, 20.0),
        ])
        .unwrap();
        let probes = [pt(15.0, 15.0), pt(9.5, 15.0), pt(15.0, 20.5), pt(19.9, 10.1)];
        assert_eq!(tile.contains_many(&probes), square().contains_many(&probes));
    }

    #[test]
    fn test_circle_inside_tile() {
        assert!(hits(&square(), 15.0, 15.0, 1.0));
    }

    #[test]
    fn test_antipodal_circle_misses() {
        assert!(!hits(&square(), 195.0, -15.0, 1.0));
    }

    #[test]
    fn test_circle_crossing_one_edge() {
        assert!(hits(&square(), 21.0, 15.0, 2.0));
        assert!(hits(&square(), 15.0, 9.0, 1.5));
    }

    #[test]
    fn test_circle_near_but_outside() {
        assert!(!hits(&square(), 25.0, 15.0, 2.0));
        assert!(!hits(&square(), 15.0, 22.0, 1.0));
    }

    #[test]
    fn test_circle_containing_whole_tile() {
        assert!(hits(&square(), 15.0, 15.0, 30.0));
        // Center outside, no edge crossing inside the tile: only the
        // vertices show the overlap.
        assert!(!square().contains_pt(&pt(25.0, 15.0)));
        assert!(hits(&square(), 25.0, 15.0, 20.0));
    }

    #[test]
    fn test_cap_tile_inside_circle() {
        // Corners along one parallel: the tile is the polar cap above Dec 80.
        let tile = Tile::build(&[
            radec(0.0, 80.0),
            radec(1.5, 80.0),
            radec(3.0, 80.0),
            radec(4.5, 80.0),
        ])
        .unwrap();
        assert!(tile.vertices().is_empty());
        assert!(tile.contains_pt(&pt(0.0, 85.0)));

        assert!(hits(&tile, 0.0, 70.0, 40.0));
        assert!(hits(&tile, 120.0, -60.0, 180.0));
        assert!(!hits(&tile, 0.0, 60.0, 5.0));
    }

    #[test]
    fn test_circle_of_half_turn_or_more_covers_everything() {
        let tile = square();
        for r in [180.0, 200.0, 360.0, 400.0] {
            assert!(hits(&tile, 195.0, -15.0, r), "radius {}", r);
        }
    }

    #[test]
    fn test_identity_rotation_preserves_tile() {
        let tile = square();
        let same = tile.rotate(&RotationMatrix3::identity()).unwrap();
        for (a, b) in tile.half_spaces().iter().zip(same.half_spaces()) {
            assert_abs_diff_eq!(a.dd(), b.dd(), epsilon = 1e-15);
            let drift = a.vector().angular_separation(b.vector());
            assert_abs_diff_eq!(drift, 0.0, epsilon = 1e-15);
        }
    }

    #[test]
    fn test_rotation_preserves_circle_overlap() {
        let tile = square();
        let m = RotationMatrix3::centered_on(15f64.to_radians(), 15f64.to_radians());
        let rotated = tile.rotate(&m).unwrap();

        let queries: [(f64, f64, f64); 6] = [
            (15.0, 15.0, 1.0),
            (195.0, -15.0, 1.0),
            (21.0, 15.0, 2.0),
            (25.0, 15.0, 2.0),
            (25.0, 15.0, 20.0),
            (15.0, 22.0, 1.0),
        ];
        for (ra, dec, r) in queries {
            let center = pt(ra, dec);
            assert_eq!(
                tile.intersects_circle(&center, r.to_radians()),
                rotated.intersects_circle(&m.apply(&center), r.to_radians()),
                "query ({}, {}, {})",
                ra,
                dec,
                r
            );
        }
        assert!(rotated.contains_pt(&Vector3::x_axis()));
    }

    #[test]
    fn test_empty_corner_list() {
        let tile = Tile::build(&[]).unwrap();
        assert!(tile.is_empty());
        assert!(!hits(&tile, 0.0, 0.0, 180.0));
    }

    #[test]
    fn test_two_corner_tile_is_empty() {
        let tile = Tile::build(&[radec(10.0, 10.0), radec(10.0, 20.0)]).unwrap();
        assert!(tile.is_empty());
        assert_eq!(tile.contains_many(&[pt(10.0, 15.0), pt(12.0, 15.0)]), vec![false, false]);
        assert!(!hits(&tile, 10.0, 15.0, 5.0));
        assert!(tile.find_all_trixels(5).unwrap().is_empty());
    }

    #[test]
    fn test_repeated_corners_count_once() {
        let corners = [radec(10.0, 10.0), radec(10.0, 10.0), radec(10.0, 20.0)];
        assert!(Tile::build(&corners).unwrap().is_empty());
    }

    #[test]
    fn test_polar_edge_is_missing() {
        let err = Tile::build(&[(0.0, HALF_PI), (0.0, -HALF_PI), (1.0, 0.0)]).unwrap_err();
        assert!(matches!(err, TileError::MissingEdge { .. }));
    }

    #[test]
    fn test_trixel_cover_contains_tile() {
        let tile = square();
        let bounds = tile.find_all_trixels(7).unwrap();
        assert_eq!(bounds.level(), 7);
        for p in [pt(15.0, 15.0), pt(10.5, 10.5), pt(19.5, 19.5)] {
            assert!(bounds.contains(find_htmid(&p, 7).unwrap()));
        }
        assert!(!bounds.contains(find_htmid(&pt(195.0, -15.0), 7).unwrap()));
    }

    #[test]
    fn test_trixel_cache_follows_level() {
        let tile = square();
        assert_eq!(tile.trixel_bound_level(), None);

        let first = tile.find_all_trixels(6).unwrap();
        assert_eq!(tile.trixel_bound_level(), Some(6));
        assert_eq!(tile.find_all_trixels(6).unwrap(), first);

        let deeper = tile.find_all_trixels(8).unwrap();
        assert_eq!(tile.trixel_bound_level(), Some(8));
        assert!(deeper.count() > first.count());

        assert_eq!(tile.find_all_trixels(6).unwrap(), first);
        assert_eq!(tile.trixel_bound_level(), Some(6));
    }

    #[test]
    fn test_rotated_tile_starts_uncached() {
        let tile = square();
        tile.find_all_trixels(5).unwrap();
        let rotated = tile.rotate(&RotationMatrix3::identity()).unwrap();
        assert_eq!(rotated.trixel_bound_level(), None);
        assert_eq!(tile.clone().trixel_bound_level(), Some(5));
    }

    #[test]
    fn test_find_all_trixels_rejects_bad_level() {
        assert!(square().find_all_trixels(0).is_err());
        assert!(Tile::empty().find_all_trixels(31).is_err());
    }
}
