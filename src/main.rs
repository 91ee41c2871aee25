use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use ranking_tracker::models::site_today;
use ranking_tracker::renderer::{ChromeRenderer, ChromeSettings};
use ranking_tracker::scheduler::build_scheduler;
use ranking_tracker::{Config, CycleOutcome, Database, RankingTracker};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "ranking-tracker",
    version,
    about = "Scrapes daily per-category product rankings into SQLite"
)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database URL
    #[arg(long, global = true, env = "RANKING_DATABASE_URL")]
    database_url: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape once at startup, then on the configured schedule
    Run,

    /// Scrape every category once, or a single category
    Scrape {
        /// Category label to refresh
        #[arg(long)]
        category: Option<String>,
    },

    /// Print stored rankings for a category as JSON
    Rankings {
        #[arg(long)]
        category: String,

        /// Day to show (defaults to today, site-local)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Last day of an inclusive range starting at --date
        #[arg(long)]
        to: Option<NaiveDate>,
    },

    /// Search product names across all categories
    Search {
        query: String,

        #[arg(long)]
        from: Option<NaiveDate>,

        #[arg(long)]
        to: Option<NaiveDate>,
    },

    /// Print the most recent update timestamp
    LastUpdate,

    /// List configured categories
    Categories,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run_forever(tracker: RankingTracker, schedule: &[String]) -> Result<()> {
    // Run once immediately
    if let CycleOutcome::Completed(report) = tracker.run_cycle().await
        && !report.failed.is_empty()
    {
        error!("Initial cycle had {} failed categories", report.failed.len());
    }

    let mut sched = build_scheduler(&tracker, schedule).await?;
    sched.start().await?;
    info!("Scheduler started with {} trigger(s)", schedule.len());

    tokio::signal::ctrl_c().await.context("waiting for Ctrl-C")?;
    info!("Shutting down scheduler");
    sched.shutdown().await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = Config::load(cli.config.as_deref())?.with_env();
    if let Some(url) = cli.database_url {
        config.database_url = url;
    }

    let database = Database::open(&config.database_url).await?;
    let renderer = Arc::new(ChromeRenderer::new(ChromeSettings::from(&config)));
    let tracker = RankingTracker::new(&config, renderer, database)?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            info!("Starting ranking tracker");
            run_forever(tracker, &config.schedule).await?;
        }
        Commands::Scrape { category: Some(label) } => match tracker.refresh_category(&label).await {
            Ok(outcome) => info!("{}: {:?}", label, outcome),
            Err(e) if e.is_config() => {
                bail!("{e}; run `ranking-tracker categories` to list valid labels")
            }
            Err(e) => return Err(e.into()),
        },
        Commands::Scrape { category: None } => {
            if let CycleOutcome::Completed(report) = tracker.run_cycle().await {
                for (label, reason) in &report.failed {
                    error!("{}: {}", label, reason);
                }
            }
        }
        Commands::Rankings { category, date, to } => {
            tracker.categories().get(&category)?;
            let from = date.unwrap_or_else(site_today);
            let records = tracker
                .database()
                .rankings_between(&category, from, to.unwrap_or(from))
                .await?;
            print_json(&records)?;
        }
        Commands::Search { query, from, to } => {
            let records = tracker
                .database()
                .search(&query, from, to, tracker.categories())
                .await?;
            print_json(&records)?;
        }
        Commands::LastUpdate => match tracker.database().latest_update().await? {
            Some(entry) => println!("{}", entry.updated_at.to_rfc3339()),
            None => println!("never"),
        },
        Commands::Categories => {
            for category in tracker.categories().iter() {
                println!("{}\t{}", category.label, category.code);
            }
        }
    }

    Ok(())
}
