//! Selecting mesh trixels by half-space conditions.
//!
//! A [`Region`] is a conjunction of clauses; each clause is satisfied when at
//! least one of its [`Condition`]s holds. A condition asks either that a
//! trixel lie wholly inside a half-space ([`Accept::Full`]) or merely that it
//! touch it ([`Accept::Touching`]). This is enough to express bands and
//! their complements, e.g. "|galactic latitude| > 30° and within 12° of some
//! point":
//!
//! ```
//! use sky_geom::{Accept, Condition, HalfSpace, Region};
//!
//! let north = HalfSpace::from_ra_dec(192.86, 27.13, 60.0).unwrap();
//! let south = HalfSpace::from_ra_dec(12.86, -27.13, 60.0).unwrap();
//! let field = HalfSpace::from_ra_dec(150.0, 10.0, 12.0).unwrap();
//!
//! let region = Region::new()
//!     .any_of(vec![
//!         Condition::new(north, Accept::Full),
//!         Condition::new(south, Accept::Full),
//!     ])
//!     .all_of(vec![Condition::new(field, Accept::Touching)]);
//!
//! let trixels = region.select(5).unwrap();
//! assert!(!trixels.is_empty());
//! ```

use crate::constants::SQ_DEG_PER_STERADIAN;
use crate::htm::{check_level, Trixel, TrixelContainment};
use crate::{GeomResult, HalfSpace};

/// What a trixel must satisfy against a condition's half-space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Accept {
    /// Trixel wholly inside.
    Full,
    /// Trixel at least partially inside.
    Touching,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Condition {
    pub half_space: HalfSpace,
    pub accept: Accept,
}

impl Condition {
    pub fn new(half_space: HalfSpace, accept: Accept) -> Self {
        Self { half_space, accept }
    }

    /// Tests one trixel.
    pub fn accepts(&self, trixel: &Trixel) -> bool {
        let containment = self.half_space.contains_trixel(trixel);
        match self.accept {
            Accept::Full => containment == TrixelContainment::Full,
            Accept::Touching => containment != TrixelContainment::Outside,
        }
    }
}

/// AND of clauses, each an OR of conditions. An empty region accepts every
/// trixel.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Region {
    clauses: Vec<Vec<Condition>>,
}

impl Region {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a clause satisfied when any one of `conditions` holds. An empty
    /// clause accepts nothing.
    pub fn any_of(mut self, conditions: Vec<Condition>) -> Self {
        self.clauses.push(conditions);
        self
    }

    /// Adds one single-condition clause per entry, so every condition must hold.
    pub fn all_of(mut self, conditions: Vec<Condition>) -> Self {
        self.clauses
            .extend(conditions.into_iter().map(|condition| vec![condition]));
        self
    }

    pub fn clauses(&self) -> &[Vec<Condition>] {
        &self.clauses
    }

    pub fn accepts(&self, trixel: &Trixel) -> bool {
        self.clauses
            .iter()
            .all(|clause| clause.iter().any(|condition| condition.accepts(trixel)))
    }

    /// The trixels at `level` that satisfy every clause, in htmid order.
    ///
    /// Descends from the base trixels and skips a subtree as soon as one
    /// clause has every condition `Outside` for it, since no descendant can
    /// then satisfy that clause.
    pub fn select(&self, level: u32) -> GeomResult<Vec<Trixel>> {
        check_level(level)?;

        let mut active = Trixel::base_trixels();
        for _ in 1..level {
            active = active
                .iter()
                .filter(|trixel| !self.rules_out(trixel))
                .flat_map(Trixel::children)
                .collect();
        }
        let selected: Vec<Trixel> = active
            .into_iter()
            .filter(|trixel| self.accepts(trixel))
            .collect();

        log::debug!(
            "region with {} clauses selected {} trixels at level {}",
            self.clauses.len(),
            selected.len(),
            level
        );
        Ok(selected)
    }

    fn rules_out(&self, trixel: &Trixel) -> bool {
        self.clauses.iter().any(|clause| {
            clause.iter().all(|condition| {
                condition.half_space.contains_trixel(trixel) == TrixelContainment::Outside
            })
        })
    }
}

/// Total area of `trixels` in square degrees.
pub fn total_area_deg2(trixels: &[Trixel]) -> f64 {
    trixels.iter().map(Trixel::area).sum::<f64>() * SQ_DEG_PER_STERADIAN
}
