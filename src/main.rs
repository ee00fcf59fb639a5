mod bot;
mod budget;
mod catalog;
mod config;
mod parser;
mod response;
mod track;

use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::bot::{Orchestrator, SpoolTransport, Watermarks};
use crate::budget::CallBudgetManager;
use crate::catalog::SatelliteCatalog;
use crate::config::Config;
use crate::parser::Observer;
use crate::response::{ResponseAssembler, ResponseContext};
use crate::track::TrackAdapter;

#[derive(Parser)]
#[command(name = "wheres-that-sat")]
#[command(about = "Replies to satellite mentions with ground track maps")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve mentions, searches and direct messages once
    Run {
        #[arg(long)]
        config: PathBuf,
        /// Log replies instead of posting them
        #[arg(long)]
        dry_run: bool,
    },
    /// Check a configuration file and its catalog
    Validate {
        #[arg(long)]
        config: PathBuf,
    },
    /// Assemble one reply offline and print it
    Respond {
        #[arg(long)]
        config: PathBuf,
        #[arg(long)]
        satellite: String,
        /// Unix seconds
        #[arg(long)]
        mention_time: i64,
        /// Unix seconds; defaults to now
        #[arg(long)]
        response_time: Option<i64>,
        /// `lat,lon` in degrees
        #[arg(long)]
        observer: Option<String>,
        /// Treat the mention time as an explicit `#time`
        #[arg(long)]
        explicit: bool,
    },
    /// Maintain the satellite catalog
    Catalog {
        #[arg(long)]
        config: PathBuf,
        #[command(subcommand)]
        command: CatalogCommands,
    },
}

#[derive(Subcommand)]
enum CatalogCommands {
    /// Add element sets from a directory of TLE files
    Import { dir: PathBuf },
    /// Register an alternate name for a catalog entry
    Alias { alias: String, canonical: String },
    /// Drop a canonical entry
    Remove { name: String },
    /// Write the catalog to another file
    Export { path: PathBuf },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config, dry_run } => run(&config, dry_run),
        Commands::Validate { config } => validate(&config),
        Commands::Respond {
            config,
            satellite,
            mention_time,
            response_time,
            observer,
            explicit,
        } => respond(
            &config,
            &satellite,
            mention_time,
            response_time,
            observer.as_deref(),
            explicit,
        ),
        Commands::Catalog { config, command } => catalog(&config, command),
    }
}

fn load_config(path: &Path) -> Option<Config> {
    match Config::from_file(path) {
        Ok(c) => Some(c),
        Err(e) => {
            eprintln!("Error loading config {}: {}", path.display(), e);
            None
        }
    }
}

fn load_catalog(config: &Config) -> Option<SatelliteCatalog> {
    match SatelliteCatalog::load(&config.catalog) {
        Ok(c) => Some(c),
        Err(e) => {
            eprintln!("Error loading catalog: {}", e);
            None
        }
    }
}

fn run(path: &Path, dry_run: bool) -> ExitCode {
    let Some(config) = load_config(path) else {
        return ExitCode::FAILURE;
    };
    let Some(catalog) = load_catalog(&config) else {
        return ExitCode::FAILURE;
    };
    log::info!(
        "Catalog has {} entries, {} aliases",
        catalog.canonical_count(),
        catalog.alias_count()
    );

    let (propagator, trace_interval, gazetteer, lock_wait) = match (
        config.propagator(),
        config.trace_interval(),
        config.gazetteer(),
        config.lock_wait(),
    ) {
        (Ok(p), Ok(t), Ok(g), Ok(w)) => (p, t, g, w),
        (Err(e), ..) | (_, Err(e), ..) | (_, _, Err(e), _) | (.., Err(e)) => {
            eprintln!("Config error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut budget = match CallBudgetManager::open(&config.budget.state, lock_wait) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("Budget error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let available = budget.available(config.budget.hourly_cap);
    log::info!(
        "{} of {} calls available this hour",
        available,
        config.budget.hourly_cap
    );

    let watermarks = match Watermarks::load(&config.state) {
        Ok(w) => w,
        Err(e) => {
            log::error!("Cannot read watermarks, starting fresh: {}", e);
            Watermarks::default()
        }
    };

    let assembler = ResponseAssembler::new(
        TrackAdapter::new(propagator, trace_interval),
        &config.map.base_url,
    );
    let mut orchestrator = Orchestrator::new(
        &catalog,
        SpoolTransport::new(&config.transport.spool),
        gazetteer,
        assembler,
        config.bot_settings(dry_run),
    );
    let report = orchestrator.run(available, &watermarks);

    let mut status = ExitCode::SUCCESS;
    match budget.record(report.consumed()) {
        Ok(total) => log::info!(
            "Consumed {} calls this run, {} this hour",
            report.consumed(),
            total
        ),
        Err(e) => {
            log::error!("Cannot record budget: {}", e);
            status = ExitCode::FAILURE;
        }
    }

    if dry_run {
        for reply in report.replies() {
            println!("{} {}: {}", reply.category, reply.in_reply_to, reply.text);
        }
        return status;
    }

    let mut updated = watermarks;
    updated.apply(&report);
    if let Err(e) = updated.save(&config.state) {
        log::error!("Cannot save watermarks: {}", e);
        status = ExitCode::FAILURE;
    }
    status
}

fn validate(path: &Path) -> ExitCode {
    let Some(config) = load_config(path) else {
        return ExitCode::FAILURE;
    };
    let Some(catalog) = load_catalog(&config) else {
        return ExitCode::FAILURE;
    };
    let gazetteer = match config.gazetteer() {
        Ok(g) => g,
        Err(e) => {
            eprintln!("Config error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    println!("Config is valid (account @{})", config.account);
    println!(
        "  catalog: {} entries, {} aliases",
        catalog.canonical_count(),
        catalog.alias_count()
    );
    for term in &config.searches.terms {
        let status = if catalog.contains(term) {
            "ok"
        } else {
            "not in catalog"
        };
        println!("  search term {:?}: {}", term, status);
    }
    println!("  gazetteer: {} places", gazetteer.len());
    println!("  propagator: {:?}", config.propagator.backend);
    ExitCode::SUCCESS
}

fn respond(
    path: &Path,
    satellite: &str,
    mention_time: i64,
    response_time: Option<i64>,
    observer: Option<&str>,
    explicit_time: bool,
) -> ExitCode {
    let Some(config) = load_config(path) else {
        return ExitCode::FAILURE;
    };
    let Some(catalog) = load_catalog(&config) else {
        return ExitCode::FAILURE;
    };
    let Some(elements) = catalog.resolve(satellite) else {
        eprintln!("Unknown satellite {:?}", satellite);
        return ExitCode::FAILURE;
    };

    let observer = match observer.map(parse_observer).transpose() {
        Ok(o) => o,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let (propagator, trace_interval) = match (config.propagator(), config.trace_interval()) {
        (Ok(p), Ok(t)) => (p, t),
        (Err(e), _) | (_, Err(e)) => {
            eprintln!("Config error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let assembler = ResponseAssembler::new(
        TrackAdapter::new(propagator, trace_interval),
        &config.map.base_url,
    );

    let ctx = ResponseContext {
        satellite,
        elements,
        author: &config.account,
        message_id: 0,
        mention_time,
        response_time: response_time.unwrap_or_else(|| Utc::now().timestamp()),
        explicit_time,
        observer: observer.as_ref(),
    };
    match assembler.assemble(&ctx) {
        Ok(response) => {
            println!("{}", response.text);
            println!("{}", response.map_url);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Propagation failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn parse_observer(s: &str) -> Result<Observer, String> {
    let invalid = || format!("Invalid observer {:?}, expected lat,lon", s);
    let (lat, lon) = s.split_once(',').ok_or_else(invalid)?;
    let latitude: f64 = lat.trim().parse().map_err(|_| invalid())?;
    let longitude: f64 = lon.trim().parse().map_err(|_| invalid())?;
    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        return Err(invalid());
    }
    Ok(Observer {
        latitude,
        longitude,
        name: s.trim().to_string(),
    })
}

fn catalog(path: &Path, command: CatalogCommands) -> ExitCode {
    let Some(config) = load_config(path) else {
        return ExitCode::FAILURE;
    };
    let Some(mut catalog) = load_catalog(&config) else {
        return ExitCode::FAILURE;
    };

    match command {
        CatalogCommands::Import { dir } => match catalog.import_tle_dir(&dir) {
            Ok(summary) => println!(
                "Imported {} element sets ({} duplicates, {} unreadable files)",
                summary.added, summary.duplicates, summary.failed_files
            ),
            Err(e) => {
                eprintln!("Import failed: {}", e);
                return ExitCode::FAILURE;
            }
        },
        CatalogCommands::Alias { alias, canonical } => {
            if let Err(e) = catalog.add_alias(&alias, &canonical) {
                eprintln!("Cannot add alias: {}", e);
                return ExitCode::FAILURE;
            }
            println!("{} -> {}", alias, canonical);
        }
        CatalogCommands::Remove { name } => {
            if catalog.remove(&name).is_none() {
                eprintln!("No canonical entry {:?}", name);
                return ExitCode::FAILURE;
            }
            println!("Removed {}", name);
        }
        CatalogCommands::Export { path } => {
            return match catalog.export(&path) {
                Ok(()) => {
                    println!("Exported to {}", path.display());
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("Export failed: {}", e);
                    ExitCode::FAILURE
                }
            };
        }
    }

    match catalog.save() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Cannot save catalog: {}", e);
            ExitCode::FAILURE
        }
    }
}
