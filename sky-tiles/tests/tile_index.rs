use sky_geom::Vector3;
use sky_tiles::{TableFormat, TileError, TileIndex};
use std::io::Write;
use tempfile::NamedTempFile;

/// A 3x3 grid of 8° x 8° tiles with 2° gaps between them. Tile `(k, m)` spans
/// RA `[10k + 1, 10k + 9]` and Dec `[10m + 1, 10m + 9]` and has id
/// `10k + m + 1`.
fn grid_table() -> String {
    let mut table = String::from("# id;ra;dec;box\n");
    for k in 0..3 {
        for m in 0..3 {
            let (ra_lo, ra_hi) = (10.0 * k as f64 + 1.0, 10.0 * k as f64 + 9.0);
            let (dec_lo, dec_hi) = (10.0 * m as f64 + 1.0, 10.0 * m as f64 + 9.0);
            let corners: Vec<[f64; 2]> = [
                (ra_lo, dec_lo),
                (ra_lo, dec_hi),
                (ra_hi, dec_lo),
                (ra_hi, dec_hi),
            ]
            .iter()
            .map(|&(ra, dec)| [f64::to_radians(ra), f64::to_radians(dec)])
            .collect();
            table.push_str(&format!(
                "{};{};{};{}\n",
                grid_id(k, m),
                ra_lo + 4.0,
                dec_lo + 4.0,
                serde_json::to_string(&corners).unwrap()
            ));
        }
    }
    table
}

fn grid_id(k: usize, m: usize) -> i64 {
    (10 * k + m + 1) as i64
}

fn grid_index() -> TileIndex {
    TileIndex::load(grid_table().as_bytes(), &TableFormat::default()).unwrap()
}

#[test]
fn test_load_grid() {
    let index = grid_index();
    assert_eq!(index.len(), 9);
    assert_eq!(
        index.ids().collect::<Vec<_>>(),
        vec![1, 2, 3, 11, 12, 13, 21, 22, 23]
    );
    assert_eq!(index.tile_ra(12).unwrap(), 15.0);
    assert_eq!(index.tile_dec(12).unwrap(), 15.0);
    assert_eq!(index.tile(12).unwrap().half_spaces().len(), 4);
}

#[test]
fn test_tiny_circle_finds_own_tile() {
    let index = grid_index();
    for k in 0..3 {
        for m in 0..3 {
            let ra = 10.0 * k as f64 + 5.0;
            let dec = 10.0 * m as f64 + 5.0;
            assert_eq!(
                index.find_all_tiles(ra, dec, 1e-6).unwrap(),
                vec![grid_id(k, m)],
                "tile at ({}, {})",
                ra,
                dec
            );
        }
    }
}

#[test]
fn test_zero_radius_inside_tile() {
    let index = grid_index();
    assert_eq!(index.find_all_tiles(23.0, 27.0, 0.0).unwrap(), vec![23]);
}

#[test]
fn test_circle_in_gap_matches_nothing() {
    let index = grid_index();
    assert!(index.find_all_tiles(10.0, 5.0, 0.5).unwrap().is_empty());
    assert!(index.find_all_tiles(200.0, -45.0, 5.0).unwrap().is_empty());
}

#[test]
fn test_circle_spanning_gap_matches_both_sides() {
    let index = grid_index();
    assert_eq!(index.find_all_tiles(10.0, 5.0, 1.5).unwrap(), vec![1, 11]);
    assert_eq!(index.find_all_tiles(5.0, 10.0, 1.5).unwrap(), vec![1, 2]);
}

#[test]
fn test_large_circle_matches_all_in_file_order() {
    let index = grid_index();
    let ids: Vec<i64> = index.ids().collect();
    assert_eq!(index.find_all_tiles(15.0, 15.0, 40.0).unwrap(), ids);
}

#[test]
fn test_half_turn_radius_matches_all() {
    let index = grid_index();
    let ids: Vec<i64> = index.ids().collect();
    for r in [180.0, 200.0, 360.0, 400.0] {
        assert_eq!(index.find_all_tiles(195.0, -15.0, r).unwrap(), ids, "radius {}", r);
    }
}

#[test]
fn test_circle_swallowing_tile_from_outside() {
    // Centered in the gap east of tile 1 and wide enough to hold all of it.
    let index = grid_index();
    let ids = index.find_all_tiles(10.0, 5.0, 12.0).unwrap();
    assert!(ids.contains(&1));
    assert!(ids.contains(&11));
    assert!(!ids.contains(&3));
}

#[test]
fn test_comments_and_blank_lines_are_skipped() {
    let table = format!("\n# leading comment\n\n{}   \n  # indented comment\n", grid_table());
    let index = TileIndex::load(table.as_bytes(), &TableFormat::default()).unwrap();
    assert_eq!(index.len(), 9);
}

#[test]
fn test_malformed_box_fails_load() {
    let table = "\
1;5.0;5.0;[[0.01745,0.01745],[0.01745,0.15708],[0.15708,0.01745],[0.15708,0.15708]]
2;15.0;5.0;[[0.1919,0.01745],[0.1919,
";
    let err = TileIndex::load(table.as_bytes(), &TableFormat::default()).unwrap_err();
    match err {
        TileError::Parse { line, .. } => assert_eq!(line, 2),
        other => panic!("expected a parse error, got {:?}", other),
    }
}

#[test]
fn test_wrong_field_count_fails_load() {
    let table = "# header\n1;5.0;5.0\n";
    let err = TileIndex::load(table.as_bytes(), &TableFormat::default()).unwrap_err();
    assert!(matches!(err, TileError::Parse { line: 2, .. }));
}

#[test]
fn test_duplicate_id_fails_load() {
    let table = format!("{}1;0.0;0.0;[]\n", grid_table());
    let err = TileIndex::load(table.as_bytes(), &TableFormat::default()).unwrap_err();
    assert!(matches!(err, TileError::DuplicateTile { id: 1, line: 11 }));
}

#[test]
fn test_polar_edge_fails_load_at_its_line() {
    let table = format!(
        "{}99;0.0;0.0;[[0.0,1.5707963267948966],[0.0,-1.5707963267948966],[1.0,0.0]]\n",
        grid_table()
    );
    let err = TileIndex::load(table.as_bytes(), &TableFormat::default()).unwrap_err();
    assert!(matches!(err, TileError::MissingEdge { line: 11, .. }));
}

#[test]
fn test_degenerate_row_loads_but_never_matches() {
    let table = "\
7;10.0;10.0;[[0.1745,0.1745],[0.1745,0.3491]]
8;10.0;10.0;[]
";
    let index = TileIndex::load(table.as_bytes(), &TableFormat::default()).unwrap();
    assert_eq!(index.len(), 2);
    assert!(index.tile(7).unwrap().is_empty());
    assert!(index.find_all_tiles(10.0, 15.0, 90.0).unwrap().is_empty());
}

#[test]
fn test_unknown_tile_lookups() {
    let index = grid_index();
    assert!(matches!(
        index.tile_ra(999),
        Err(TileError::UnknownTile { id: 999 })
    ));
    assert!(index.tile_dec(999).is_err());
    assert!(index.rotation_matrix(999).is_err());
    assert!(index.tile(999).is_err());
    assert!(index.to_tile_frame(999, 0.0, 0.0).is_err());
}

#[test]
fn test_from_path() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(grid_table().as_bytes()).unwrap();
    file.flush().unwrap();

    let index = TileIndex::from_path(file.path()).unwrap();
    assert_eq!(index.len(), 9);
    assert_eq!(index.find_all_tiles(25.0, 25.0, 0.1).unwrap(), vec![23]);
}

#[test]
fn test_from_path_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = TileIndex::from_path(dir.path().join("missing.txt")).unwrap_err();
    assert!(matches!(err, TileError::Io { .. }));
}

#[test]
fn test_local_tile_is_centered() {
    let index = grid_index();
    let local = index.local_tile(22).unwrap();
    assert!(local.contains_pt(&Vector3::x_axis()));
    assert!(!local.contains_pt(&-Vector3::x_axis()));

    let (ra, dec) = index.to_tile_frame(22, 25.0, 15.0).unwrap();
    assert!(ra.abs() < 1e-9 && dec.abs() < 1e-9);
}

#[test]
fn test_precompute_trixels_fills_caches() {
    let index = grid_index();
    index.precompute_trixels(6).unwrap();
    for id in index.ids() {
        assert_eq!(index.tile(id).unwrap().trixel_bound_level(), Some(6));
    }
    assert!(index.precompute_trixels(0).is_err());
}

#[test]
fn test_concurrent_queries() {
    let index = grid_index();
    std::thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|k| {
                let index = &index;
                s.spawn(move || {
                    let ra = 10.0 * (k % 3) as f64 + 5.0;
                    index.tile(1).unwrap().find_all_trixels(5 + k as u32).unwrap();
                    index.find_all_tiles(ra, 5.0, 0.1).unwrap()
                })
            })
            .collect();
        for (k, handle) in handles.into_iter().enumerate() {
            assert_eq!(handle.join().unwrap(), vec![grid_id(k % 3, 0)]);
        }
    });
}
