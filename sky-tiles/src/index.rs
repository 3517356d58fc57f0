//! The tile table and its overlap queries.
//!
//! A tile table is a text file with one tile per line:
//!
//! ```text
//! # id;ra;dec;box
//! 7;15.0;15.0;[[0.1745,0.1745],[0.1745,0.3491],[0.3491,0.1745],[0.3491,0.3491]]
//! ```
//!
//! `ra`/`dec` are the tile center in degrees; `box` is a JSON array of the
//! tile's corners as `[ra, dec]` pairs in **radians**. The table is loaded
//! in full up front: a single bad row fails the whole load.
//!
//! ```
//! use sky_tiles::{TableFormat, TileIndex};
//!
//! let table = "\
//! 1;15.0;15.0;[[0.1745329,0.1745329],[0.1745329,0.3490659],[0.3490659,0.1745329],[0.3490659,0.3490659]]
//! ";
//! let index = TileIndex::load(table.as_bytes(), &TableFormat::default()).unwrap();
//! assert_eq!(index.find_all_tiles(15.0, 15.0, 0.5).unwrap(), vec![1]);
//! assert!(index.find_all_tiles(195.0, -15.0, 0.5).unwrap().is_empty());
//! ```

use crate::errors::{TileError, TileResult};
use crate::tile::Tile;
use rayon::prelude::*;
use sky_geom::constants::{DEG_TO_RAD, RAD_TO_DEG};
use sky_geom::{RotationMatrix3, Vector3};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Layout of a tile table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableFormat {
    /// Field separator.
    pub delimiter: char,
    /// Longest accepted `box` field, in bytes.
    pub max_box_len: usize,
    /// Lines starting with this character (after leading whitespace) are
    /// skipped.
    pub comment: char,
}

impl Default for TableFormat {
    fn default() -> Self {
        Self {
            delimiter: ';',
            max_box_len: 500,
            comment: '#',
        }
    }
}

/// One parsed table row.
#[derive(Debug, Clone, PartialEq)]
pub struct TileRow {
    pub id: i64,
    pub ra_deg: f64,
    pub dec_deg: f64,
    /// Corners as `(ra, dec)` in radians.
    pub corners: Vec<(f64, f64)>,
}

/// Parses a single table row.
///
/// Errors are reported against line 0; loaders relocate them to the actual
/// line.
pub fn parse_row(line: &str, format: &TableFormat) -> TileResult<TileRow> {
    let fields: Vec<&str> = line.split(format.delimiter).map(str::trim).collect();
    if fields.len() != 4 {
        return Err(TileError::parse(
            0,
            format!("expected 4 fields, found {}", fields.len()),
        ));
    }

    let id = fields[0]
        .parse::<i64>()
        .map_err(|e| TileError::parse(0, format!("bad tile id '{}': {}", fields[0], e)))?;
    let ra_deg = parse_angle(fields[1], "ra")?;
    let dec_deg = parse_angle(fields[2], "dec")?;

    let raw_box = fields[3];
    if raw_box.len() > format.max_box_len {
        return Err(TileError::parse(
            0,
            format!(
                "box field is {} bytes, longer than the {} allowed",
                raw_box.len(),
                format.max_box_len
            ),
        ));
    }
    let corners: Vec<[f64; 2]> = serde_json::from_str(raw_box)
        .map_err(|e| TileError::parse(0, format!("bad box for tile {}: {}", id, e)))?;
    if corners.iter().flatten().any(|v| !v.is_finite()) {
        return Err(TileError::parse(
            0,
            format!("box for tile {} has non-finite corners", id),
        ));
    }

    Ok(TileRow {
        id,
        ra_deg,
        dec_deg,
        corners: corners.into_iter().map(|[ra, dec]| (ra, dec)).collect(),
    })
}

fn parse_angle(field: &str, name: &str) -> TileResult<f64> {
    let value = field
        .parse::<f64>()
        .map_err(|e| TileError::parse(0, format!("bad {} '{}': {}", name, field, e)))?;
    if !value.is_finite() {
        return Err(TileError::parse(0, format!("{} must be finite", name)));
    }
    Ok(value)
}

#[derive(Debug, Clone)]
struct TileEntry {
    id: i64,
    ra_deg: f64,
    dec_deg: f64,
    rotation: RotationMatrix3,
    tile: Tile,
}

/// All tiles of a table, in file order.
#[derive(Debug, Clone, Default)]
pub struct TileIndex {
    entries: Vec<TileEntry>,
    by_id: HashMap<i64, usize>,
}

impl TileIndex {
    /// Reads a whole table from `reader`.
    pub fn load<R: BufRead>(reader: R, format: &TableFormat) -> TileResult<Self> {
        let mut index = Self::default();
        for (n, line) in reader.lines().enumerate() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with(format.comment) {
                continue;
            }
            let row = parse_row(trimmed, format).map_err(|e| e.at_line(n + 1))?;
            index.insert(row).map_err(|e| e.at_line(n + 1))?;
        }

        log::debug!("loaded {} tiles", index.len());
        Ok(index)
    }

    /// Reads a table with the default `;`-separated layout.
    pub fn from_path(path: impl AsRef<Path>) -> TileResult<Self> {
        let path = path.as_ref();
        log::debug!("reading tile table {}", path.display());
        let file = File::open(path)?;
        Self::load(BufReader::new(file), &TableFormat::default())
    }

    /// Builds an index from rows that are already parsed. Duplicate ids are
    /// reported against the row's 1-based position.
    pub fn from_rows(rows: impl IntoIterator<Item = TileRow>) -> TileResult<Self> {
        let mut index = Self::default();
        for (n, row) in rows.into_iter().enumerate() {
            index.insert(row).map_err(|e| e.at_line(n + 1))?;
        }
        Ok(index)
    }

    fn insert(&mut self, row: TileRow) -> TileResult<()> {
        if self.by_id.contains_key(&row.id) {
            return Err(TileError::DuplicateTile { id: row.id, line: 0 });
        }

        let tile = Tile::build(&row.corners)?;
        let rotation =
            RotationMatrix3::centered_on(row.ra_deg * DEG_TO_RAD, row.dec_deg * DEG_TO_RAD);

        self.by_id.insert(row.id, self.entries.len());
        self.entries.push(TileEntry {
            id: row.id,
            ra_deg: row.ra_deg,
            dec_deg: row.dec_deg,
            rotation,
            tile,
        });
        Ok(())
    }

    fn entry(&self, id: i64) -> TileResult<&TileEntry> {
        self.by_id
            .get(&id)
            .map(|&i| &self.entries[i])
            .ok_or(TileError::UnknownTile { id })
    }

    /// Tile center RA in degrees.
    pub fn tile_ra(&self, id: i64) -> TileResult<f64> {
        Ok(self.entry(id)?.ra_deg)
    }

    /// Tile center Dec in degrees.
    pub fn tile_dec(&self, id: i64) -> TileResult<f64> {
        Ok(self.entry(id)?.dec_deg)
    }

    /// The rotation carrying the tile center to `(1, 0, 0)`.
    pub fn rotation_matrix(&self, id: i64) -> TileResult<&RotationMatrix3> {
        Ok(&self.entry(id)?.rotation)
    }

    pub fn tile(&self, id: i64) -> TileResult<&Tile> {
        Ok(&self.entry(id)?.tile)
    }

    /// Tile ids in file order.
    pub fn ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.entries.iter().map(|e| e.id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ids of every tile overlapping the circle of `radius_deg` around
    /// `(ra_deg, dec_deg)`, in file order. All arguments are in degrees; a
    /// radius of 180 or more covers the whole sky.
    pub fn find_all_tiles(
        &self,
        ra_deg: f64,
        dec_deg: f64,
        radius_deg: f64,
    ) -> TileResult<Vec<i64>> {
        if !(ra_deg.is_finite() && dec_deg.is_finite() && radius_deg.is_finite()) {
            return Err(TileError::invalid_query(format!(
                "non-finite circle ({}, {}, {})",
                ra_deg, dec_deg, radius_deg
            )));
        }
        if radius_deg < 0.0 {
            return Err(TileError::invalid_query(format!(
                "radius must be non-negative, got {}",
                radius_deg
            )));
        }

        let center = Vector3::from_degrees(ra_deg, dec_deg);
        let radius = radius_deg * DEG_TO_RAD;
        Ok(self
            .entries
            .iter()
            .filter(|e| e.tile.intersects_circle(&center, radius))
            .map(|e| e.id)
            .collect())
    }

    /// A sky position in the tile's local frame, where the tile center sits
    /// at `(0, 0)`. Degrees in and out; RA comes back in `(-180, 180]`.
    pub fn to_tile_frame(&self, id: i64, ra_deg: f64, dec_deg: f64) -> TileResult<(f64, f64)> {
        let entry = self.entry(id)?;
        let (ra, dec) = entry
            .rotation
            .transform_spherical(ra_deg * DEG_TO_RAD, dec_deg * DEG_TO_RAD);
        let ra_deg = ra * RAD_TO_DEG;
        let ra_deg = if ra_deg > 180.0 { ra_deg - 360.0 } else { ra_deg };
        Ok((ra_deg, dec * RAD_TO_DEG))
    }

    /// The tile rotated into its own local frame.
    pub fn local_tile(&self, id: i64) -> TileResult<Tile> {
        let entry = self.entry(id)?;
        entry.tile.rotate(&entry.rotation)
    }

    /// Fills every tile's trixel cache at `level` in parallel, so later
    /// `find_all_trixels` calls at that level are lookups.
    pub fn precompute_trixels(&self, level: u32) -> TileResult<()> {
        self.entries
            .par_iter()
            .try_for_each(|e| e.tile.find_all_trixels(level).map(drop))?;
        log::debug!("precomputed level {} trixels for {} tiles", level, self.len());
        Ok(())
    }
}
