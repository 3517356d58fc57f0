//! Hierarchical Triangular Mesh (HTM) trixels.
//!
//! The sphere is split into 8 base spherical triangles ("trixels"), four in
//! each hemisphere. Each trixel splits into four children by joining the
//! midpoints of its edges, recursively. A trixel is named by an integer
//! `htmid` that encodes the recursion path:
//!
//! - base trixels S0..S3, N0..N3 have htmids `8..=15` and are level 1;
//! - child `k` (0..=3) of trixel `h` has htmid `4h + k`;
//! - so a level-`L` htmid has exactly `2L + 2` significant bits.
//!
//! Because children extend their parent's id, every trixel at level `l` covers
//! one contiguous htmid range at any deeper level `L`:
//! `[h << 2(L-l), ((h+1) << 2(L-l)) - 1]`. [`TrixelBounds`] stores covers as
//! sorted runs of such ranges.
//!
//! ```
//! use sky_geom::htm::{find_htmid, Trixel};
//! use sky_geom::Vector3;
//!
//! let pt = Vector3::from_degrees(15.0, 15.0);
//! let htmid = find_htmid(&pt, 6).unwrap();
//! let trixel = Trixel::from_htmid(htmid).unwrap();
//! assert_eq!(trixel.level(), 6);
//! assert!(trixel.contains_pt(&pt));
//! ```

use crate::constants::MAX_HTM_LEVEL;
use crate::{GeomError, GeomResult, Vector3};

/// How a trixel relates to a region of the sphere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TrixelContainment {
    /// Every point of the trixel is inside the region.
    Full,
    /// Some points are inside, some are not.
    Partial,
    /// No point of the trixel is inside the region.
    Outside,
}

/// One spherical triangle of the mesh. Corners are counterclockwise seen from
/// outside the sphere.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Trixel {
    htmid: u64,
    level: u32,
    corners: [Vector3; 3],
}

const V0: Vector3 = Vector3 { x: 0.0, y: 0.0, z: 1.0 };
const V1: Vector3 = Vector3 { x: 1.0, y: 0.0, z: 0.0 };
const V2: Vector3 = Vector3 { x: 0.0, y: 1.0, z: 0.0 };
const V3: Vector3 = Vector3 { x: -1.0, y: 0.0, z: 0.0 };
const V4: Vector3 = Vector3 { x: 0.0, y: -1.0, z: 0.0 };
const V5: Vector3 = Vector3 { x: 0.0, y: 0.0, z: -1.0 };

/// Corners of S0, S1, S2, S3, N0, N1, N2, N3 (htmids 8..=15).
const BASE_CORNERS: [[Vector3; 3]; 8] = [
    [V1, V5, V2],
    [V2, V5, V3],
    [V3, V5, V4],
    [V4, V5, V1],
    [V1, V0, V4],
    [V4, V0, V3],
    [V3, V0, V2],
    [V2, V0, V1],
];

impl Trixel {
    /// One of the 8 level-1 trixels, `htmid` in `8..=15`.
    pub fn base(htmid: u64) -> GeomResult<Self> {
        if !(8..=15).contains(&htmid) {
            return Err(GeomError::invalid_htmid(
                htmid,
                "base trixels are numbered 8 through 15",
            ));
        }
        Ok(Self {
            htmid,
            level: 1,
            corners: BASE_CORNERS[(htmid - 8) as usize],
        })
    }

    /// All 8 level-1 trixels in htmid order.
    pub fn base_trixels() -> Vec<Self> {
        (8..=15)
            .map(|htmid| Self {
                htmid,
                level: 1,
                corners: BASE_CORNERS[(htmid - 8) as usize],
            })
            .collect()
    }

    /// Rebuilds a trixel from its id by walking down from its base trixel.
    pub fn from_htmid(htmid: u64) -> GeomResult<Self> {
        let level = level_from_htmid(htmid)?;
        let mut trixel = Self::base(htmid >> (2 * (level - 1)))?;
        for depth in (0..level - 1).rev() {
            let child = ((htmid >> (2 * depth)) & 3) as usize;
            trixel = trixel.children().swap_remove(child);
        }
        Ok(trixel)
    }

    pub fn htmid(&self) -> u64 {
        self.htmid
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn corners(&self) -> &[Vector3; 3] {
        &self.corners
    }

    /// The four children, ordered by htmid.
    pub fn children(&self) -> Vec<Trixel> {
        let [c0, c1, c2] = self.corners;
        let w0 = (c1 + c2).normalize();
        let w1 = (c0 + c2).normalize();
        let w2 = (c0 + c1).normalize();
        let base = self.htmid << 2;
        let level = self.level + 1;

        [[c0, w2, w1], [c1, w0, w2], [c2, w1, w0], [w0, w1, w2]]
            .into_iter()
            .enumerate()
            .map(|(k, corners)| Trixel {
                htmid: base + k as u64,
                level,
                corners,
            })
            .collect()
    }

    /// True if `pt` is on the inner side of all three edge planes. Points on
    /// an edge belong to both neighbouring trixels.
    pub fn contains_pt(&self, pt: &Vector3) -> bool {
        let [c0, c1, c2] = &self.corners;
        c0.cross(c1).dot(pt) >= 0.0 && c1.cross(c2).dot(pt) >= 0.0 && c2.cross(c0).dot(pt) >= 0.0
    }

    /// Unit vector through the mean of the corners.
    pub fn center(&self) -> Vector3 {
        let [c0, c1, c2] = self.corners;
        (c0 + c1 + c2).normalize()
    }

    /// Angular radius (radians) of the smallest cap around [`center`](Self::center)
    /// that holds all three corners.
    pub fn bounding_radius(&self) -> f64 {
        let center = self.center();
        self.corners
            .iter()
            .map(|c| center.angular_separation(c))
            .fold(0.0, f64::max)
    }

    /// Solid angle in steradians (Van Oosterom & Strackee spherical excess).
    pub fn area(&self) -> f64 {
        let [a, b, c] = &self.corners;
        let triple = a.dot(&b.cross(c));
        let denom = 1.0 + a.dot(b) + b.dot(c) + c.dot(a);
        2.0 * libm::atan2(triple.abs(), denom)
    }

    /// The htmids this trixel covers at a deeper (or equal) `level`.
    pub fn htmid_range_at(&self, level: u32) -> GeomResult<(u64, u64)> {
        check_level(level)?;
        if level < self.level {
            return Err(GeomError::invalid_level(
                level,
                format!("trixel {} is already at level {}", self.htmid, self.level),
            ));
        }
        let shift = 2 * (level - self.level);
        Ok((self.htmid << shift, ((self.htmid + 1) << shift) - 1))
    }
}

/// Fails with [`GeomError::InvalidLevel`] unless `1 <= level <= MAX_HTM_LEVEL`.
pub fn check_level(level: u32) -> GeomResult<()> {
    if level == 0 || level > MAX_HTM_LEVEL {
        return Err(GeomError::invalid_level(
            level,
            format!("supported levels are 1..={}", MAX_HTM_LEVEL),
        ));
    }
    Ok(())
}

/// Recursion level encoded in an htmid.
pub fn level_from_htmid(htmid: u64) -> GeomResult<u32> {
    if htmid < 8 {
        return Err(GeomError::invalid_htmid(htmid, "smaller than any base trixel"));
    }
    let bits = u64::BITS - htmid.leading_zeros();
    if bits % 2 != 0 {
        return Err(GeomError::invalid_htmid(
            htmid,
            format!("{} significant bits; trixel ids have an even count", bits),
        ));
    }
    let level = (bits - 2) / 2;
    check_level(level)?;
    Ok(level)
}

/// The htmid of the level-`level` trixel holding `pt`.
///
/// Points on a shared edge resolve to the lowest-numbered candidate.
pub fn find_htmid(pt: &Vector3, level: u32) -> GeomResult<u64> {
    check_level(level)?;
    let pt = pt.try_normalize("find_htmid")?;

    let mut trixel = Trixel::base_trixels()
        .into_iter()
        .find(|t| t.contains_pt(&pt))
        .ok_or_else(|| GeomError::degenerate("find_htmid", "point outside every base trixel"))?;

    while trixel.level < level {
        let children = trixel.children();
        // Rounding at the midpoints can leave a point a hair outside all four.
        trixel = match children.iter().position(|c| c.contains_pt(&pt)) {
            Some(k) => children[k].clone(),
            None => closest_child(children, &pt),
        };
    }
    Ok(trixel.htmid)
}

fn closest_child(children: Vec<Trixel>, pt: &Vector3) -> Trixel {
    children
        .into_iter()
        .min_by(|a, b| {
            a.center()
                .angular_separation(pt)
                .total_cmp(&b.center().angular_separation(pt))
        })
        .unwrap_or_else(|| unreachable!("children() always yields four trixels"))
}

/// Every trixel at `level`, in htmid order. There are `8 * 4^(level-1)` of them.
pub fn all_trixels(level: u32) -> GeomResult<Vec<Trixel>> {
    check_level(level)?;
    let mut active = Trixel::base_trixels();
    for _ in 1..level {
        active = active.iter().flat_map(Trixel::children).collect();
    }
    Ok(active)
}

/// A set of htmids at one level, stored as sorted, non-adjacent inclusive ranges.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrixelBounds {
    level: u32,
    ranges: Vec<(u64, u64)>,
}

impl TrixelBounds {
    pub fn empty(level: u32) -> Self {
        Self {
            level,
            ranges: Vec::new(),
        }
    }

    /// Sorts the ranges and merges any that overlap or touch.
    pub fn from_ranges(level: u32, mut ranges: Vec<(u64, u64)>) -> Self {
        ranges.retain(|(lo, hi)| lo <= hi);
        ranges.sort_unstable();

        let mut merged: Vec<(u64, u64)> = Vec::with_capacity(ranges.len());
        for (lo, hi) in ranges {
            match merged.last_mut() {
                Some(last) if lo <= last.1.saturating_add(1) => last.1 = last.1.max(hi),
                _ => merged.push((lo, hi)),
            }
        }
        Self {
            level,
            ranges: merged,
        }
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn ranges(&self) -> &[(u64, u64)] {
        &self.ranges
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Number of trixels in the set.
    pub fn count(&self) -> u64 {
        self.ranges.iter().map(|(lo, hi)| hi - lo + 1).sum()
    }

    pub fn contains(&self, htmid: u64) -> bool {
        let idx = self.ranges.partition_point(|&(_, hi)| hi < htmid);
        self.ranges.get(idx).is_some_and(|&(lo, _)| lo <= htmid)
    }

    /// Set intersection: htmids present in both.
    pub fn join(&self, other: &Self) -> GeomResult<Self> {
        self.check_same_level(other)?;

        let mut out = Vec::new();
        let (mut i, mut j) = (0, 0);
        while i < self.ranges.len() && j < other.ranges.len() {
            let (a_lo, a_hi) = self.ranges[i];
            let (b_lo, b_hi) = other.ranges[j];
            let lo = a_lo.max(b_lo);
            let hi = a_hi.min(b_hi);
            if lo <= hi {
                out.push((lo, hi));
            }
            if a_hi < b_hi {
                i += 1;
            } else {
                j += 1;
            }
        }
        Ok(Self {
            level: self.level,
            ranges: out,
        })
    }

    /// Set union.
    pub fn union(&self, other: &Self) -> GeomResult<Self> {
        self.check_same_level(other)?;
        let ranges = self
            .ranges
            .iter()
            .chain(other.ranges.iter())
            .copied()
            .collect();
        Ok(Self::from_ranges(self.level, ranges))
    }

    fn check_same_level(&self, other: &Self) -> GeomResult<()> {
        if self.level != other.level {
            return Err(GeomError::invalid_level(
                other.level,
                format!("cannot combine with bounds at level {}", self.level),
            ));
        }
        Ok(())
    }
}
