//! Marketboard CLI: board, categories and windows commands.
//!
//! Commands:
//! - `board`: fetch, aggregate and rank one category, print a table or JSON
//! - `categories`: list configured categories
//! - `windows`: show how horizons resolve for a date

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use marketboard_core::data::{DataProvider, PolygonProvider, StaticProvider};
use marketboard_core::{
    Board, BoardConfig, BoardSnapshot, Clock, FixedClock, Horizon, SystemClock, WindowSet,
};

#[derive(Parser)]
#[command(
    name = "marketboard",
    about = "Marketboard CLI: multi-horizon market boards from daily bars"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch, aggregate and rank one category.
    Board {
        /// Category name (see `categories`).
        category: String,

        /// Board config TOML. Defaults to the bundled configuration.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Offline mode: answer from the fallback snapshot only.
        #[arg(long, default_value_t = false)]
        offline: bool,

        /// Print the board as JSON instead of a table.
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Resolve windows as of this date (YYYY-MM-DD). Defaults to today (UTC).
        #[arg(long)]
        as_of: Option<String>,
    },
    /// List configured categories.
    Categories {
        /// Board config TOML. Defaults to the bundled configuration.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Show the date range each horizon resolves to.
    Windows {
        /// Resolve as of this date (YYYY-MM-DD). Defaults to today (UTC).
        #[arg(long)]
        as_of: Option<String>,

        /// Comma-separated horizons, e.g. 5D,1M,YTD. Defaults to all.
        #[arg(long, value_delimiter = ',')]
        horizons: Vec<String>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("marketboard=info,marketboard_core=info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Board {
            category,
            config,
            offline,
            json,
            as_of,
        } => run_board(&category, config.as_deref(), offline, json, as_of.as_deref()),
        Commands::Categories { config } => run_categories(config.as_deref()),
        Commands::Windows { as_of, horizons } => run_windows(as_of.as_deref(), &horizons),
    }
}

fn load_config(path: Option<&Path>) -> Result<BoardConfig> {
    match path {
        Some(p) => BoardConfig::from_file(p).with_context(|| format!("loading {}", p.display())),
        None => Ok(BoardConfig::bundled()?),
    }
}

fn clock_for(as_of: Option<&str>) -> Result<Arc<dyn Clock>> {
    Ok(match as_of {
        Some(s) => {
            let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .with_context(|| format!("invalid --as-of date '{s}'"))?;
            Arc::new(FixedClock(date))
        }
        None => Arc::new(SystemClock),
    })
}

fn run_board(
    category_name: &str,
    config_path: Option<&Path>,
    offline: bool,
    json: bool,
    as_of: Option<&str>,
) -> Result<()> {
    let config = load_config(config_path)?;
    let Some(category) = config.category(category_name) else {
        let known: Vec<&str> = config.categories.iter().map(|c| c.name.as_str()).collect();
        bail!(
            "unknown category '{category_name}'. Valid: {}",
            known.join(", ")
        );
    };

    let clock = clock_for(as_of)?;
    let fallback = match &config.provider.fallback_file {
        Some(path) => StaticProvider::from_file(path, clock.clone())?,
        None => StaticProvider::bundled(clock.clone())?,
    };

    let live = if offline {
        None
    } else {
        match config
            .provider
            .polygon_settings()
            .and_then(PolygonProvider::new)
        {
            Ok(provider) => Some(provider),
            Err(e) => {
                info!(error = %e, "live source unavailable, using fallback snapshot");
                None
            }
        }
    };

    let board = Board::new(category, clock.as_ref(), config.provider.limit);
    let snapshot = board
        .load(
            live.as_ref().map(|p| p as &dyn DataProvider),
            &fallback,
            config.provider.fallback,
        )
        .map_err(|e| anyhow::anyhow!("HTTP {}: {e}", e.status_code()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        print_board(&snapshot);
    }
    Ok(())
}

fn run_categories(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;

    println!(
        "{:<14} {:<10} {:>7} {:>5}  Horizons",
        "Category", "Class", "Symbols", "Top"
    );
    println!("{}", "-".repeat(60));
    for c in &config.categories {
        let horizons: Vec<&str> = c.horizons.iter().map(|h| h.label()).collect();
        let top = c.top_n.map(|n| n.to_string()).unwrap_or_else(|| "all".into());
        println!(
            "{:<14} {:<10} {:>7} {:>5}  {}",
            c.name,
            format!("{:?}", c.asset_class).to_lowercase(),
            c.symbols.len(),
            top,
            horizons.join(" ")
        );
    }
    Ok(())
}

fn run_windows(as_of: Option<&str>, horizon_args: &[String]) -> Result<()> {
    let horizons: Vec<Horizon> = if horizon_args.is_empty() {
        Horizon::ALL.to_vec()
    } else {
        horizon_args
            .iter()
            .map(|s| s.parse::<Horizon>())
            .collect::<Result<_, _>>()?
    };

    let clock = clock_for(as_of)?;
    let windows = WindowSet::resolve(&horizons, clock.as_ref());

    println!("{:<6} {:<12} {:<12}", "Window", "From", "To");
    println!("{}", "-".repeat(32));
    for w in &windows {
        println!("{:<6} {:<12} {:<12}", w.label, w.from, w.to);
    }
    Ok(())
}

fn print_board(snapshot: &BoardSnapshot) {
    println!();
    println!("=== {} ({}) ===", snapshot.category, snapshot.as_of);
    println!("Source: {:?}", snapshot.source);
    println!();

    let labels: Vec<&str> = snapshot.windows.labels().collect();
    let mut header = format!("{:<10} {:<24} {:>12}", "Symbol", "Name", "Price");
    for label in &labels {
        header.push_str(&format!(" {:>8}", label));
    }
    header.push_str(&format!("  {:<24} {:<24}", "Day Range", "Year Range"));
    println!("{header}");
    println!("{}", "-".repeat(header.len()));

    for r in &snapshot.results {
        let mut line = format!(
            "{:<10} {:<24} {:>12.2}",
            r.symbol,
            r.name.as_deref().unwrap_or(&r.symbol),
            r.latest_price
        );
        for label in &labels {
            line.push_str(&format!(" {:>7.2}%", r.change(label)));
        }
        line.push_str(&format!("  {:<24} {:<24}", r.daily_range, r.year_range));
        println!("{line}");
    }

    if snapshot.results.is_empty() {
        println!("(no symbols with a price)");
    }
    println!();
}
