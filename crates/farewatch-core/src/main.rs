//! Farewatch CLI
//!
//! Command-line interface for the flight price monitor.

use std::process::ExitCode;
use std::sync::Arc;

use chrono::{Days, Local};
use clap::{Parser, Subcommand};
use console::style;
use tracing::info;

use farewatch::db::Database;
use farewatch::scheduler::{build_aggregator, FlightMonitor};
use farewatch::Config;

/// Farewatch - flight price monitoring and alerting
#[derive(Parser)]
#[command(name = "farewatch")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, env = "FAREWATCH_CONFIG", default_value = "config.yaml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the monitor until interrupted
    Start,

    /// Check a route once and print the best offer
    Check {
        /// Origin airport IATA code
        origin: String,

        /// Destination airport IATA code
        destination: String,

        /// How many days ahead to search
        #[arg(long, default_value = "30")]
        days: u64,
    },

    /// List configured routes
    Routes,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = match Config::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration from {}: {e}", cli.config);
            return ExitCode::FAILURE;
        }
    };

    let log_level = if cli.verbose {
        "debug".to_string()
    } else {
        config.logging.level.clone()
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    let result = match cli.command {
        Commands::Start => run_start(config).await,
        Commands::Check {
            origin,
            destination,
            days,
        } => run_check(config, &origin, &destination, days).await,
        Commands::Routes => run_routes(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run_start(config: Config) -> anyhow::Result<()> {
    let history = match &config.database {
        Some(db_config) => {
            let database = Database::connect(db_config).await?;
            database.ensure_schema().await?;
            info!("Price history store connected");
            Some(database.history())
        }
        None => None,
    };

    let monitor = Arc::new(FlightMonitor::from_config(&config, history));
    let handles = monitor.start();

    info!(routes = handles.len(), "Flight monitor started");
    println!("Monitoring {} route(s). Press Ctrl+C to stop.", handles.len());

    tokio::signal::ctrl_c().await?;

    for handle in &handles {
        handle.abort();
    }
    info!("Flight monitor stopped");

    Ok(())
}

async fn run_check(
    config: Config,
    origin: &str,
    destination: &str,
    days: u64,
) -> anyhow::Result<()> {
    println!("Checking {origin} -> {destination}...");

    let aggregator = build_aggregator(&config.sources);
    let today = Local::now().date_naive();
    let end = today
        .checked_add_days(Days::new(days))
        .unwrap_or(today);

    let offers = aggregator.fetch_all(origin, destination, today, end).await;

    match aggregator.best_price(&offers) {
        Some(best) => {
            println!();
            println!(
                "Best price: {}",
                style(format!("{} {}", best.price, best.currency)).green().bold()
            );
            println!("Airline:    {}", best.airline);
            println!("Flight:     {}", best.flight_number);
            println!("Date:       {}", best.departure_date);
            println!("Stops:      {}", best.stops);
            println!("Source:     {}", best.source);
        }
        None => println!("No flights found"),
    }

    Ok(())
}

fn run_routes(config: &Config) -> anyhow::Result<()> {
    if config.routes.is_empty() {
        println!("No routes configured.");
        return Ok(());
    }

    println!();
    println!("Configured routes ({}):", config.routes.len());
    println!();
    for route in &config.routes {
        println!("  {}", style(&route.name).bold());
        println!("    Route:    {} -> {}", route.origin, route.destination);
        println!("    Interval: {}", route.check_interval);
        if let Some(range) = &route.date_range {
            println!("    Dates:    {} to {}", range.start, range.end);
        }
        println!("    Alerts:   {}", route.alerts.len());
        println!();
    }

    Ok(())
}
