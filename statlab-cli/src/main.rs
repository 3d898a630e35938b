//! StatLab CLI — availability checks, snapshot refresh, and cache management.
//!
//! Commands:
//! - `check` — verify each dataset yields a non-empty table
//! - `fetch` — refresh dataset snapshots from the stats API
//! - `import` — import a dataset CSV into the snapshot cache
//! - `cache status` — report cached snapshots and staleness
//! - `cache clean` — remove old snapshot files

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use statlab_core::check::{verify_datasets, Verdict};
use statlab_core::config::AppConfig;
use statlab_core::data::{
    refresh_datasets, CircuitBreaker, DataProvider, Dataset, FallbackProvider, ForecastProvider,
    PlayingProvider, PointsProvider, SampleProvider, SnapshotCache, SnapshotProvider, StatsApi,
    StdoutProgress, TableImporter,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(
    name = "statlab",
    about = "StatLab CLI — fantasy-football data toolkit"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify each dataset yields a non-empty table.
    Check {
        /// Check cached snapshots only; no network access.
        #[arg(long, default_value_t = false)]
        offline: bool,

        /// Check deterministic sample tables instead of real sources.
        #[arg(long, default_value_t = false)]
        synthetic: bool,

        /// Cache directory. Defaults to [cache].dir from config (./data).
        #[arg(long)]
        cache_dir: Option<PathBuf>,

        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Fetch dataset snapshots from the stats API.
    Fetch {
        /// Datasets to fetch (points playing forecast). Defaults to all.
        datasets: Vec<String>,

        /// Force re-fetch even if today's snapshot exists.
        #[arg(long, default_value_t = false)]
        force: bool,

        /// Cache directory. Defaults to [cache].dir from config (./data).
        #[arg(long)]
        cache_dir: Option<PathBuf>,

        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Import a dataset from a CSV file into the snapshot cache.
    Import {
        /// Dataset name (points, playing, forecast).
        dataset: String,

        /// Path to the CSV file.
        path: PathBuf,

        /// Cache directory. Defaults to [cache].dir from config (./data).
        #[arg(long)]
        cache_dir: Option<PathBuf>,

        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Cache management commands.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Report cached snapshots, row counts, and staleness.
    Status {
        /// Cache directory. Defaults to [cache].dir from config (./data).
        #[arg(long)]
        cache_dir: Option<PathBuf>,

        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Remove snapshot files older than the given number of days.
    Clean {
        /// Remove snapshots with an as-of date older than this many days.
        #[arg(long)]
        older_than_days: u32,

        /// Cache directory. Defaults to [cache].dir from config (./data).
        #[arg(long)]
        cache_dir: Option<PathBuf>,

        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Actually delete (without this flag, only previews what would be removed).
        #[arg(long, default_value_t = false)]
        confirm: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check {
            offline,
            synthetic,
            cache_dir,
            config,
        } => run_check(offline, synthetic, cache_dir, config),
        Commands::Fetch {
            datasets,
            force,
            cache_dir,
            config,
        } => run_fetch(datasets, force, cache_dir, config),
        Commands::Import {
            dataset,
            path,
            cache_dir,
            config,
        } => run_import(&dataset, &path, cache_dir, config),
        Commands::Cache { action } => match action {
            CacheAction::Status { cache_dir, config } => run_cache_status(cache_dir, config),
            CacheAction::Clean {
                older_than_days,
                cache_dir,
                config,
                confirm,
            } => run_cache_clean(older_than_days, cache_dir, config, confirm),
        },
    }
}

fn load_config(path: Option<PathBuf>) -> Result<AppConfig> {
    match path {
        Some(p) => Ok(AppConfig::from_file(&p)?),
        None => Ok(AppConfig::default()),
    }
}

fn resolve_cache_dir(cache_dir: Option<PathBuf>, config: &AppConfig) -> PathBuf {
    cache_dir.unwrap_or_else(|| config.cache.dir.clone())
}

fn api_provider(dataset: Dataset, api: &Arc<StatsApi>) -> Box<dyn DataProvider> {
    match dataset {
        Dataset::Points => Box::new(PointsProvider::new(Arc::clone(api))),
        Dataset::Playing => Box::new(PlayingProvider::new(Arc::clone(api))),
        Dataset::Forecast => Box::new(ForecastProvider::new(Arc::clone(api))),
    }
}

fn run_check(
    offline: bool,
    synthetic: bool,
    cache_dir: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    if offline && synthetic {
        bail!("--offline and --synthetic are mutually exclusive");
    }

    let config = load_config(config_path)?;
    let cache_dir = resolve_cache_dir(cache_dir, &config);

    let providers: Vec<Box<dyn DataProvider>> = if synthetic {
        Dataset::ALL
            .iter()
            .map(|&ds| Box::new(SampleProvider::new(ds)) as Box<dyn DataProvider>)
            .collect()
    } else if offline {
        Dataset::ALL
            .iter()
            .map(|&ds| Box::new(SnapshotProvider::new(&cache_dir, ds)) as Box<dyn DataProvider>)
            .collect()
    } else {
        // Online: the stats API, with cached snapshots as a safety net
        let circuit_breaker = Arc::new(CircuitBreaker::default_api());
        let api = Arc::new(StatsApi::from_config(&config.api, circuit_breaker));
        Dataset::ALL
            .iter()
            .map(|&ds| {
                Box::new(FallbackProvider::new(
                    api_provider(ds, &api),
                    Box::new(SnapshotProvider::new(&cache_dir, ds)),
                )) as Box<dyn DataProvider>
            })
            .collect()
    };

    let provider_refs: Vec<&dyn DataProvider> = providers.iter().map(|p| p.as_ref()).collect();
    let summary = verify_datasets(&provider_refs);

    println!("=== Data Availability ===");
    for result in &summary.results {
        match &result.verdict {
            Verdict::Pass => {
                println!("PASS   {:<10} ({})", result.dataset, result.provider);
            }
            Verdict::Empty { reason } => {
                println!("FAIL   {:<10} {reason} ({})", result.dataset, result.provider);
            }
            Verdict::ProviderError(e) => {
                println!("ERROR  {:<10} {e} ({})", result.dataset, result.provider);
            }
        }
    }
    println!();
    println!(
        "{}/{} datasets available",
        summary.passed(),
        summary.results.len()
    );

    if !summary.all_passed() {
        std::process::exit(1);
    }
    Ok(())
}

fn run_fetch(
    datasets: Vec<String>,
    force: bool,
    cache_dir: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config(config_path)?;
    let cache_dir = resolve_cache_dir(cache_dir, &config);

    let selected: Vec<Dataset> = if datasets.is_empty() {
        Dataset::ALL.to_vec()
    } else {
        datasets
            .iter()
            .map(|s| s.parse::<Dataset>().map_err(|e| anyhow::anyhow!(e)))
            .collect::<Result<_>>()?
    };

    let circuit_breaker = Arc::new(CircuitBreaker::default_api());
    let api = Arc::new(StatsApi::from_config(&config.api, circuit_breaker));
    let providers: Vec<Box<dyn DataProvider>> =
        selected.iter().map(|&ds| api_provider(ds, &api)).collect();
    let provider_refs: Vec<&dyn DataProvider> = providers.iter().map(|p| p.as_ref()).collect();

    let cache = SnapshotCache::new(&cache_dir);
    let today = chrono::Local::now().date_naive();

    let summary = refresh_datasets(&provider_refs, &cache, today, force, &StdoutProgress);

    if !summary.all_succeeded() {
        for (ds, err) in &summary.errors {
            eprintln!("Error for {ds}: {err}");
        }
        std::process::exit(1);
    }

    Ok(())
}

fn run_import(
    dataset: &str,
    path: &PathBuf,
    cache_dir: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let dataset: Dataset = dataset.parse().map_err(|e: String| anyhow::anyhow!(e))?;
    let config = load_config(config_path)?;
    let cache_dir = resolve_cache_dir(cache_dir, &config);

    let df = TableImporter::import_csv(dataset, path)?;
    if df.height() == 0 {
        bail!("imported {dataset} table has no rows after cleaning");
    }

    let cache = SnapshotCache::new(&cache_dir);
    let today = chrono::Local::now().date_naive();
    cache.write(dataset, &df, today, "csv_import")?;

    println!(
        "Imported {} rows into the {dataset} snapshot for {today}",
        df.height()
    );
    Ok(())
}

fn run_cache_status(cache_dir: Option<PathBuf>, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config(config_path)?;
    let cache_dir = resolve_cache_dir(cache_dir, &config);

    if !cache_dir.exists() {
        println!("Cache directory does not exist: {}", cache_dir.display());
        return Ok(());
    }

    let cache = SnapshotCache::new(&cache_dir);
    let today = chrono::Local::now().date_naive();

    println!("Cache: {}", cache_dir.display());
    println!();
    println!("{:<10} {:<12} {:>8}  {}", "Dataset", "As Of", "Rows", "State");
    println!("{}", "-".repeat(42));

    for status in cache.status() {
        if status.cached {
            let state = if cache.is_fresh(status.dataset, config.cache.max_age_days, today) {
                "fresh"
            } else {
                "stale"
            };
            println!(
                "{:<10} {:<12} {:>8}  {state}",
                status.dataset,
                status.as_of.map(|d| d.to_string()).unwrap_or_default(),
                status.row_count.unwrap_or(0),
            );
        } else {
            println!("{:<10} {:<12} {:>8}  missing", status.dataset, "-", "-");
        }
    }

    Ok(())
}

fn run_cache_clean(
    older_than_days: u32,
    cache_dir: Option<PathBuf>,
    config_path: Option<PathBuf>,
    confirm: bool,
) -> Result<()> {
    let config = load_config(config_path)?;
    let cache_dir = resolve_cache_dir(cache_dir, &config);

    if !cache_dir.exists() {
        println!("Cache directory does not exist: {}", cache_dir.display());
        return Ok(());
    }

    let cache = SnapshotCache::new(&cache_dir);
    let cutoff = chrono::Local::now().date_naive() - chrono::Duration::days(i64::from(older_than_days));

    let mut to_remove = Vec::new();
    for ds in Dataset::ALL {
        if let Ok(snapshots) = cache.snapshots(ds) {
            for snap in snapshots {
                if snap.as_of < cutoff {
                    to_remove.push((ds, snap));
                }
            }
        }
    }

    if to_remove.is_empty() {
        println!("No snapshots older than {older_than_days} days to remove.");
        return Ok(());
    }

    println!(
        "Found {} snapshot(s) older than {older_than_days} days:",
        to_remove.len()
    );
    for (ds, snap) in &to_remove {
        println!("  {ds} {} ({})", snap.as_of, format_size(snap.size_bytes));
    }

    if !confirm {
        println!();
        println!("Dry run — pass --confirm to actually delete.");
        return Ok(());
    }

    for (ds, snap) in &to_remove {
        std::fs::remove_file(&snap.path)?;
        println!("Removed: {ds} {}", snap.as_of);
    }

    println!("Done. Removed {} snapshot(s).", to_remove.len());
    Ok(())
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
