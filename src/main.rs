//! tracevault CLI: import trace files and inspect the resulting store.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use env_logger::Env;

use tracevault::awards::{top_ascent_awards_for_all_sports, top_awards_for_all_sports};
use tracevault::tiles::TileCalculator;
use tracevault::{
    run_importer, ActivityStore, ImportConfig, ImportMode, Result, SectionKind,
};

#[derive(Parser)]
#[command(name = "tracevault", version, about = "Import FIT/GPX trace files into a local activity store")]
struct Cli {
    /// Path to the SQLite database.
    #[arg(long, global = true, default_value = "tracevault.db")]
    db: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Import trace files from a directory tree.
    Import {
        /// Directory containing FIT/GPX files.
        trace_dir: PathBuf,
        /// Re-parse known files and overwrite stored payloads.
        #[arg(long)]
        reimport: bool,
        /// Print the import report as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Show the fastest/climb/ascent awards per sport.
    Awards,
    /// Evaluate the metric tiles.
    Tiles {
        /// Restrict to one sport (by slug, e.g. "trail-running").
        #[arg(long)]
        sport: Option<String>,
        /// Only consider activities of the trailing N days.
        #[arg(long)]
        days: Option<u32>,
        /// Print the tile values as JSON.
        #[arg(long)]
        json: bool,
    },
    /// List the sport catalog with activity counts.
    Sports,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut store = ActivityStore::open(&cli.db)?;

    match cli.command {
        Command::Import {
            trace_dir,
            reimport,
            json,
        } => {
            let config = ImportConfig::new(trace_dir);
            let mode = if reimport {
                ImportMode::Reimport
            } else {
                ImportMode::Import
            };
            let report = run_importer(&mut store, &config, mode)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!(
                    "{} file(s) found: {} imported, {} updated, {} known, {} duplicate(s), {} failure(s)",
                    report.found,
                    report.imported,
                    report.updated,
                    report.skipped_known,
                    report.duplicates,
                    report.failures
                );
            }
        }
        Command::Awards => {
            // Only the section catalog and rank limit matter here.
            let config = ImportConfig::new(".");
            for (label, kind) in [("Fastest sections", SectionKind::Fastest), ("Best climbs", SectionKind::Climb)] {
                println!("{label}:");
                let awards = top_awards_for_all_sports(&store, &config, &[kind])?;
                if awards.is_empty() {
                    println!("  (none)");
                }
                for (sport, entries) in awards {
                    println!("  {sport}:");
                    for award in entries {
                        let value = match kind {
                            SectionKind::Fastest => format!("{:.2} m/s", award.max_value),
                            SectionKind::Climb => format!("{:.1} m/min", award.max_value),
                        };
                        println!(
                            "    #{} {:>6} m  {}  ({})",
                            award.rank, award.distance, value, award.activity_name
                        );
                    }
                }
            }
            println!("Top ascents:");
            let ascents = top_ascent_awards_for_all_sports(&store, config.rank_limit)?;
            if ascents.is_empty() {
                println!("  (none)");
            }
            for (sport, entries) in ascents {
                println!("  {sport}:");
                for award in entries {
                    println!(
                        "    #{} {} m  ({})",
                        award.rank, award.total_ascent, award.activity_name
                    );
                }
            }
        }
        Command::Tiles { sport, days, json } => {
            store.populate_default_tiles()?;
            let mut calc = TileCalculator::new(&store);
            if let Some(slug) = sport {
                match store.sport_id_by_slug(&slug)? {
                    Some(id) => calc = calc.with_sport(id),
                    None => {
                        eprintln!("unknown sport: {slug}");
                        return Ok(());
                    }
                }
            }
            if let Some(days) = days {
                calc = calc.with_days_limit(days);
            }
            let values = calc.calculate_all()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&values)?);
            } else {
                for value in values {
                    let unit = value.tile.unit.as_deref().unwrap_or("");
                    println!("{:<16} {} {}", value.tile.title, value.formatted, unit);
                }
            }
        }
        Command::Sports => {
            store.populate_default_sports()?;
            for sport in store.sports()? {
                let count = store.activity_count_for_sport(sport.id)?;
                let awards = if sport.evaluates_for_awards { "" } else { "  (no awards)" };
                println!("{:<24} {:>4} activities{awards}", sport.name, count);
            }
        }
    }
    Ok(())
}
