//! Spherical geometry for sky tiling.
//!
//! Everything here works on unit vectors: sky positions are converted from
//! right ascension / declination once, and regions of the sky are described
//! as caps ([`HalfSpace`]) or intersections of caps. The Hierarchical
//! Triangular Mesh ([`htm`]) gives a hierarchical integer index over the
//! sphere that half-spaces can be covered with.
//!
//! # Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`vector`] | [`Vector3`], RA/Dec conversion, angular separation |
//! | [`rotation`] | [`RotationMatrix3`], frames centered on a sky position |
//! | [`half_space`] | [`HalfSpace`] predicates, [`intersect_half_spaces`] |
//! | [`htm`] | [`Trixel`], [`TrixelBounds`], htmid arithmetic |
//! | [`region`] | [`Region`] selection of trixels by half-space conditions |
//!
//! # Features
//!
//! - **`serde`**: `Serialize`/`Deserialize` for the geometry value types.

pub mod constants;
pub mod errors;
pub mod half_space;
pub mod htm;
pub mod region;
pub mod rotation;
pub mod vector;

pub use errors::{GeomError, GeomResult};
pub use half_space::{intersect_half_spaces, HalfSpace};
pub use htm::{check_level, find_htmid, level_from_htmid, Trixel, TrixelBounds, TrixelContainment};
pub use region::{total_area_deg2, Accept, Condition, Region};
pub use rotation::RotationMatrix3;
pub use vector::Vector3;
