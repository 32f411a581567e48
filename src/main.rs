use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};

use thrift_watcher::config::AppConfig;
use thrift_watcher::logging::init_logging;
use thrift_watcher::monitor::Monitor;
use thrift_watcher::plugins::{build_sources, EmailNotifier, LogNotifier, Notifier};
use thrift_watcher::scheduler::CycleScheduler;
use thrift_watcher::store::{SeenListingStore, SqliteSeenStore};

const EXIT_CYCLE_FAILED: u8 = 1;
const EXIT_STARTUP_FAILED: u8 = 2;

#[derive(Parser)]
#[command(name = "thrift-watcher", version, about = "Watches secondhand marketplaces for new vintage listings")]
struct Cli {
    /// Directory holding default.toml and optional overrides
    #[arg(long, global = true, default_value = "config")]
    config: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run a single monitoring cycle and exit (default)
    Run {
        /// Log digests instead of emailing them
        #[arg(long)]
        dry_run: bool,
    },
    /// Record current listings as seen without notifying
    Seed,
    /// Run cycles on the configured cron schedule until interrupted
    Watch {
        #[arg(long)]
        dry_run: bool,
    },
    /// Show the most recently recorded listings
    Recent {
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
    /// Validate configuration and print a summary
    CheckConfig,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = match AppConfig::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::from(EXIT_STARTUP_FAILED);
        }
    };

    let _guard = init_logging(&config.logging);
    let command = cli.command.unwrap_or(Command::Run { dry_run: false });

    match execute(command, &config).await {
        Ok(code) => code,
        Err(e) => {
            error!(error = ?e, "Fatal error");
            ExitCode::from(EXIT_STARTUP_FAILED)
        }
    }
}

async fn execute(command: Command, config: &AppConfig) -> Result<ExitCode> {
    match command {
        Command::CheckConfig => {
            print_config_summary(config);
            Ok(ExitCode::SUCCESS)
        }
        Command::Recent { limit } => {
            let store = open_store(config).await?;
            for record in store.recent(limit).await? {
                println!(
                    "{}  [{}] {}  {}  {}",
                    record.first_seen.format("%Y-%m-%d %H:%M"),
                    record.platform.display_name(),
                    record.title,
                    record.price,
                    record.url
                );
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Seed => {
            let monitor = build_monitor(config, true).await?;
            match monitor.seed().await {
                Ok(report) => {
                    info!(seeded = report.new_listings, "Database seeded");
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => {
                    error!(error = %e, "Seeding failed");
                    Ok(ExitCode::from(EXIT_CYCLE_FAILED))
                }
            }
        }
        Command::Run { dry_run } => {
            let monitor = build_monitor(config, dry_run).await?;
            seed_if_empty(&monitor, config).await;

            info!("Starting monitoring cycle");
            match monitor.run_cycle().await {
                Ok(report) => {
                    info!(new_listings = report.new_listings, "Monitoring cycle completed successfully");
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => {
                    error!(error = %e, "Error in monitoring cycle");
                    Ok(ExitCode::from(EXIT_CYCLE_FAILED))
                }
            }
        }
        Command::Watch { dry_run } => {
            if config.metrics.enabled {
                PrometheusBuilder::new()
                    .with_http_listener(([0, 0, 0, 0], config.metrics.port))
                    .install()
                    .context("Failed to start Prometheus exporter")?;
                info!(port = config.metrics.port, "Prometheus exporter listening");
            }

            let monitor = build_monitor(config, dry_run).await?;
            seed_if_empty(&monitor, config).await;

            let mut scheduler = CycleScheduler::new(Arc::new(monitor), config.scheduler.clone()).await?;
            scheduler.start().await?;

            tokio::signal::ctrl_c().await?;
            info!("Shutting down...");
            scheduler.shutdown().await?;

            let stats = scheduler.stats().await;
            info!(runs = stats.runs, failures = stats.failures, new_listings = stats.new_listings, "Watch finished");
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn open_store(config: &AppConfig) -> Result<Arc<SqliteSeenStore>> {
    let store = SqliteSeenStore::connect(&config.database)
        .await
        .with_context(|| format!("Failed to open seen-listing store at {}", config.database.url))?;
    Ok(Arc::new(store))
}

async fn build_monitor(config: &AppConfig, dry_run: bool) -> Result<Monitor> {
    let store = open_store(config).await?;
    let sources = build_sources(config)?;
    if sources.is_empty() {
        warn!("No enabled sources configured; cycles will find nothing");
    }

    let notifier: Arc<dyn Notifier> = if dry_run {
        Arc::new(LogNotifier::new())
    } else if !config.notifications.smtp.is_complete() {
        warn!("Email configuration missing (EMAIL_USER, EMAIL_PASSWORD, RECIPIENT_EMAIL); digests will only be logged");
        Arc::new(LogNotifier::new())
    } else {
        Arc::new(EmailNotifier::new(&config.notifications.smtp)?)
    };

    Ok(Monitor::from_config(config, sources, store, notifier))
}

/// Seed a fresh deployment so the first cycle does not report the whole backlog.
async fn seed_if_empty(monitor: &Monitor, config: &AppConfig) {
    if !config.search.seed_on_empty {
        return;
    }

    match monitor.store().is_empty().await {
        Ok(true) => {
            info!("New deployment detected, seeding database with current listings");
            match monitor.seed().await {
                Ok(report) => info!(seeded = report.new_listings, "Database seeding completed"),
                Err(e) => warn!(error = %e, "Error seeding database, continuing with normal monitoring"),
            }
        }
        Ok(false) => {}
        Err(e) => warn!(error = %e, "Could not determine whether the store is empty"),
    }
}

fn print_config_summary(config: &AppConfig) {
    println!("Configuration OK");
    println!("  database:        {}", config.database.url);
    println!("  phrases:         {}", config.phrases().len());
    for source in &config.sources {
        println!(
            "  source:          {} ({}) {}{}",
            source.name,
            source.platform,
            source.endpoint,
            if source.enabled { "" } else { " [disabled]" }
        );
    }
    println!("  max per batch:   {}", config.digest.max_per_batch);
    println!("  schedule:        {}", config.scheduler.cron);
    println!(
        "  email:           {}",
        if config.notifications.smtp.is_complete() { "configured" } else { "incomplete, log only" }
    );
}
