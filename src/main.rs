use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use spinlog::pipeline::EtlPaths;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "spinlog", version, about = "Songplay warehouse ETL")]
struct Cli {
    /// Path to the SQLite database
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,

    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the ETL: load song and log corpora into the star schema
    Run {
        /// Song-metadata root directory (defaults to config, then data/song_data)
        #[arg(long)]
        song_data: Option<PathBuf>,

        /// Activity-log root directory (defaults to config, then data/log_data)
        #[arg(long)]
        log_data: Option<PathBuf>,

        /// Drop and recreate all tables before loading
        #[arg(long)]
        reset: bool,
    },

    /// Create the tables (or recreate them empty with --reset)
    Init {
        /// Drop existing tables first
        #[arg(long)]
        reset: bool,
    },

    /// Show per-table row counts
    Stats,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Load config file (optional, defaults if missing)
    let config = spinlog::config::AppConfig::load();

    // Resolve database path: CLI > config > XDG default
    let db_path = cli
        .db_path
        .or(config.db_path.clone())
        .unwrap_or_else(spinlog::config::default_db_path);
    log::info!("Database: {}", db_path.display());

    let db = spinlog::db::Database::open(&db_path).context("Failed to open database")?;

    match cli.command {
        Commands::Run {
            song_data,
            log_data,
            reset,
        } => {
            if reset {
                db.reset().context("Failed to reset tables")?;
                println!("Tables recreated");
            }

            // Resolve data roots: CLI args > config > defaults
            let paths = EtlPaths {
                song_data: song_data
                    .or(config.song_data_dir)
                    .unwrap_or_else(spinlog::config::default_song_data_dir),
                log_data: log_data
                    .or(config.log_data_dir)
                    .unwrap_or_else(spinlog::config::default_log_data_dir),
            };

            let report = spinlog::pipeline::run_etl(&db, &paths).context("ETL run failed")?;
            println!(
                "Load complete: {} song files, {} log files -> {} songs, {} artists, {} users, {} time slots, {} songplays ({} unmatched)",
                report.song_files,
                report.log_files,
                report.songs,
                report.artists,
                report.users,
                report.time_slots,
                report.songplays,
                report.unmatched
            );
        }

        Commands::Init { reset } => {
            if reset {
                db.reset().context("Failed to reset tables")?;
                println!("Tables dropped and recreated");
            } else {
                // Database::open already created them; report and move on.
                println!("Tables ready");
            }
        }

        Commands::Stats => {
            let stats = db.stats().context("Failed to read stats")?;
            println!("songs:     {}", stats.songs);
            println!("artists:   {}", stats.artists);
            println!("users:     {}", stats.users);
            println!("time:      {}", stats.time_slots);
            println!("songplays: {}", stats.songplays);
        }
    }

    Ok(())
}
