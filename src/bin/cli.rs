//! geolife CLI - load a GeoLife dataset and run activity reports
//!
//! Usage:
//!   geolife load [--data-dir <dir>] [--keep] [--db <file>]
//!   geolife query --query <n> [--db <file>]
//!
//! `load` drops previously loaded data unless `--keep` is given, in which case
//! every row is inserted again alongside the existing ones.

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use geolife::{Config, DataLoader, GeolifeError, Queries, Store};
use log::{error, info};

#[derive(Parser)]
#[command(name = "geolife")]
#[command(about = "Load GeoLife trajectories and run activity reports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// SQLite database file (overrides the config file)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// JSON config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose debug output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Load users, activities and trackpoints from a dataset directory
    Load {
        /// Dataset root containing labeled_ids.txt and Data/
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Keep existing rows instead of dropping them first
        #[arg(long)]
        keep: bool,
    },

    /// Run one numbered report (1-11, 13)
    Query {
        /// Report number; unknown numbers print an error and exit normally
        #[arg(short, long, allow_negative_numbers = true)]
        query: Option<i64>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format(|buf, record| writeln!(buf, "[{:5}] {}", record.level(), record.args()))
        .init();

    let mut config = match &cli.config {
        Some(path) => match Config::from_json_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("ERROR: {}", e);
                return ExitCode::FAILURE;
            }
        },
        None => Config::default(),
    };
    if let Some(db) = cli.db {
        config.db_path = db;
    }

    match cli.command {
        Commands::Load { data_dir, keep } => {
            if let Some(dir) = data_dir {
                config.data_dir = dir;
            }
            match run_load(&config, !keep) {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    error!("Load failed: {}", e);
                    eprintln!("ERROR: {}", e);
                    ExitCode::FAILURE
                }
            }
        }
        Commands::Query { query } => match run_query(&config, query) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                error!("Query failed: {}", e);
                eprintln!("ERROR: Failed to use database: {}", e);
                ExitCode::FAILURE
            }
        },
    }
}

fn run_load(config: &Config, drop_first: bool) -> Result<(), GeolifeError> {
    info!(
        "Loading {} into {}",
        config.data_dir.display(),
        config.db_path.display()
    );
    let mut store = Store::open(&config.db_path)?;
    let stats = DataLoader::new(&mut store, config.loader()).run(drop_first)?;
    println!(
        "Inserted {} users, {} activities, {} trackpoints ({} activities over {} points skipped)",
        stats.users,
        stats.activities,
        stats.trackpoints,
        stats.skipped_activities,
        config.max_trackpoints_per_activity
    );
    Ok(())
}

fn run_query(config: &Config, query: Option<i64>) -> Result<(), GeolifeError> {
    let store = Store::open(&config.db_path)?;
    let report = match query {
        Some(number) => Queries::new(&store, config.queries()).run(number)?,
        None => None,
    };

    match report {
        Some(report) => print!("{}", report),
        None => println!("ERROR: Invalid query number"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query_arg(args: &[&str]) -> Option<i64> {
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Commands::Query { query } => query,
            Commands::Load { .. } => panic!("expected query subcommand"),
        }
    }

    #[test]
    fn test_query_accepts_any_integer() {
        assert_eq!(query_arg(&["geolife", "query", "--query", "4"]), Some(4));
        assert_eq!(query_arg(&["geolife", "query", "--query", "-1"]), Some(-1));
        assert_eq!(query_arg(&["geolife", "query", "-q", "4294967296"]), Some(4294967296));
        assert_eq!(query_arg(&["geolife", "query"]), None);
    }

    #[test]
    fn test_out_of_range_query_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            db_path: dir.path().join("geolife.db"),
            ..Config::default()
        };
        for query in [Some(-1), Some(12), Some(4294967296), None] {
            assert!(run_query(&config, query).is_ok(), "query {:?}", query);
        }
    }
}
