use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use flexi_logger::Logger;
use sky_tiles::TileIndex;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Parser)]
#[command(name = "query-tiles")]
#[command(about = "Query a sky tile table for tiles overlapping a circle")]
struct Cli {
    /// Path to the tile table
    #[arg(long)]
    tiles: PathBuf,

    /// Log at debug level
    #[arg(long, short)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print tile table information
    Info,
    /// Find the tiles overlapping a circle
    Search {
        /// Right ascension of the circle center, degrees
        #[arg(allow_negative_numbers = true)]
        ra: f64,
        /// Declination of the circle center, degrees
        #[arg(allow_negative_numbers = true)]
        dec: f64,
        /// Circle radius in degrees
        #[arg(long, default_value = "1.0")]
        radius: f64,
        /// Print query timing
        #[arg(long)]
        timing: bool,
        /// Output format
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
    /// Print the HTM trixel ranges covering one tile
    Trixels {
        /// Tile id
        id: i64,
        /// HTM level
        #[arg(long, default_value = "7")]
        level: u32,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_spec = if cli.verbose { "debug" } else { "info" };
    let _logger = Logger::try_with_env_or_str(log_spec)?
        .log_to_stderr()
        .start()
        .context("Failed to start logger")?;

    let index = TileIndex::from_path(&cli.tiles)
        .with_context(|| format!("Failed to load tile table {}", cli.tiles.display()))?;

    match cli.command {
        Commands::Info => print_info(&index),
        Commands::Search {
            ra,
            dec,
            radius,
            timing,
            format,
        } => {
            let start = if timing { Some(Instant::now()) } else { None };

            let ids = index.find_all_tiles(ra, dec, radius)?;

            if let Some(start_time) = start {
                let elapsed = start_time.elapsed();
                eprintln!(
                    "Query of {} tiles completed in {:.2} ms",
                    index.len(),
                    elapsed.as_secs_f64() * 1000.0
                );
            }

            let hits = collect_hits(&index, &ids)?;
            match format {
                OutputFormat::Table => print_table(&hits),
                OutputFormat::Json => print_json(&hits)?,
                OutputFormat::Csv => print_csv(&hits),
            }
        }
        Commands::Trixels { id, level } => {
            let tile = index.tile(id)?;
            let bounds = tile.find_all_trixels(level)?;
            println!(
                "Tile {}: {} trixels in {} ranges at level {}",
                id,
                bounds.count(),
                bounds.ranges().len(),
                level
            );
            for (lo, hi) in bounds.ranges() {
                println!("{:>20} {:>20}", lo, hi);
            }
        }
    }

    Ok(())
}

#[derive(serde::Serialize)]
struct JsonTile {
    id: i64,
    ra_deg: f64,
    dec_deg: f64,
}

fn collect_hits(index: &TileIndex, ids: &[i64]) -> anyhow::Result<Vec<JsonTile>> {
    ids.iter()
        .map(|&id| {
            Ok(JsonTile {
                id,
                ra_deg: index.tile_ra(id)?,
                dec_deg: index.tile_dec(id)?,
            })
        })
        .collect()
}

fn print_info(index: &TileIndex) {
    println!("Tiles: {}", index.len());
    let empty = index
        .ids()
        .filter(|&id| index.tile(id).map(|t| t.is_empty()).unwrap_or(false))
        .count();
    println!("Empty tiles: {}", empty);
    if let (Some(min), Some(max)) = (index.ids().min(), index.ids().max()) {
        println!("Id range: {} .. {}", min, max);
    }
}

fn print_table(hits: &[JsonTile]) {
    for (i, hit) in hits.iter().enumerate() {
        println!(
            "{:4}: {:>12} RA={:.6}° Dec={:+.6}°",
            i + 1,
            hit.id,
            hit.ra_deg,
            hit.dec_deg
        );
    }

    if hits.is_empty() {
        println!("No tiles overlap the search circle.");
    } else {
        println!("\nTotal tiles: {}", hits.len());
    }
}

fn print_json(hits: &[JsonTile]) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(hits)?);
    Ok(())
}

fn print_csv(hits: &[JsonTile]) {
    println!("id,ra_deg,dec_deg");
    for hit in hits {
        println!("{},{},{}", hit.id, hit.ra_deg, hit.dec_deg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_accepts_negative_coordinates() {
        let cli = Cli::try_parse_from([
            "query-tiles",
            "--tiles",
            "tiles.txt",
            "search",
            "-10.5",
            "-30",
            "--radius",
            "2",
        ])
        .unwrap();
        match cli.command {
            Commands::Search {
                ra, dec, radius, ..
            } => {
                assert_eq!(ra, -10.5);
                assert_eq!(dec, -30.0);
                assert_eq!(radius, 2.0);
            }
            _ => panic!("expected the search subcommand"),
        }
    }
}
