//! Sky tiling: which tiles of a fixed partition overlap a circle on the sky?
//!
//! A tile table lists convex RA/Dec boxes by their corners. Each box becomes a
//! [`Tile`], the intersection of the half-spaces bounding it, and the whole
//! table a [`TileIndex`] that answers circle-overlap queries in file order.
//!
//! # Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`tile`] | [`Tile`] construction from corners, containment, circle overlap, trixel covers |
//! | [`index`] | [`TileIndex`] loading ([`TableFormat`], [`parse_row`]), per-tile frames, [`TileIndex::find_all_tiles`] |
//! | [`errors`] | [`TileError`] and [`TileResult`] |
//!
//! # Quick Start
//!
//! ```ignore
//! use sky_tiles::TileIndex;
//!
//! let index = TileIndex::from_path("tile_data.txt")?;
//! for id in index.find_all_tiles(53.0, -27.5, 0.5)? {
//!     println!("{} centered at ({}, {})", id, index.tile_ra(id)?, index.tile_dec(id)?);
//! }
//! ```
//!
//! # Features
//!
//! - **`cli`**: builds the `query-tiles` binary for inspecting and querying
//!   tile tables from the command line.

pub mod errors;
pub mod index;
pub mod tile;

pub use errors::{TileError, TileResult};
pub use index::{parse_row, TableFormat, TileIndex, TileRow};
pub use tile::Tile;

/// Upstream name of [`TileIndex`].
pub type FatboyTiles = TileIndex;
