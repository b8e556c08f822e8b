//! `healthguard` command line
//!
//! - `run`: produce today's briefing and save it to the history
//! - `history`: list recent briefings with their average score
//! - `status`: show the configured city and which API keys are present
//! - `serve`: start the dashboard JSON API

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use healthguard::api::AppState;
use healthguard::{
    BriefingHistory, HealthGuardConfig, HealthGuardError, HealthGuardian, HistoryStats, RunState,
    logging, web,
};

#[derive(Parser)]
#[command(name = "healthguard")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Daily environmental health briefings", long_about = None)]
struct Cli {
    /// Path to a TOML config file
    #[arg(short, long, global = true, env = "HEALTHGUARD_CONFIG")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Produce a briefing now
    Run {
        /// Do not write the briefing to the history directory
        #[arg(long)]
        no_save: bool,
    },

    /// Show recent briefings
    History {
        /// How many days back to look
        #[arg(short, long, default_value = "7")]
        days: u32,
    },

    /// Show configuration status
    Status,

    /// Serve the dashboard API
    Serve {
        /// Port to listen on (defaults to server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        match err.downcast_ref::<HealthGuardError>() {
            Some(app_err) => eprintln!("Error: {}", app_err.user_message()),
            None => eprintln!("Error: {err:#}"),
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = HealthGuardConfig::load_from_path(cli.config.clone())?;
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    logging::init(&config.logging);

    let history = BriefingHistory::new(&config.history.directory);

    match cli.command {
        Commands::Run { no_save } => {
            let guardian = HealthGuardian::from_config(&config)?;
            let state = guardian.run().await?;
            if !no_save {
                history.save(&state)?;
            }
            print_run(&state, cli.json)?;
        }
        Commands::History { days } => {
            let records = history.get_recent(days)?;
            let stats = HistoryStats::from_records(&records);
            if cli.json {
                let out = json!({ "days": days, "stats": stats, "briefings": records });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                match stats.average_score {
                    Some(avg) => println!(
                        "{} briefing(s) in the last {} day(s), average risk {:.0}/100",
                        stats.count, days, avg
                    ),
                    None => println!("No briefings in the last {days} day(s)"),
                }
                for record in &records {
                    println!(
                        "\n{} | {:.0}/100 ({})\n{}",
                        record.timestamp.format("%Y-%m-%d %H:%M"),
                        record.risk_score,
                        record.risk_level,
                        record.briefing_text
                    );
                }
            }
        }
        Commands::Status => {
            let keys = config.validate_keys();
            if cli.json {
                let out = json!({
                    "location": config.location.name,
                    "latitude": config.location.latitude,
                    "longitude": config.location.longitude,
                    "api_keys": keys,
                    "history_directory": config.history.directory,
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                let location = config.location.to_location();
                println!("Location: {} ({})", location.name, location.format_coordinates());
                for (name, present) in &keys {
                    println!("  {name:<12} {}", if *present { "✓" } else { "✗ missing" });
                }
                println!("History: {}", history.directory().display());
            }
        }
        Commands::Serve { port } => {
            let port = port.unwrap_or(config.server.port);
            let guardian = HealthGuardian::from_config(&config)?;
            info!("Serving briefings for {}", guardian.location());
            let state = AppState {
                guardian: Arc::new(guardian),
                history: Arc::new(history),
                config: Arc::new(config),
            };
            web::run(port, state).await?;
        }
    }

    Ok(())
}

fn print_run(state: &RunState, as_json: bool) -> Result<()> {
    if as_json {
        println!("{}", serde_json::to_string_pretty(state)?);
        return Ok(());
    }

    println!("{}\n", state.briefing_text);
    if let Some(plan) = &state.action_plan {
        println!("{}", plan.summary);
        for action in &plan.actions {
            println!("  [{}] {}", action.priority, action.action);
        }
    }
    println!(
        "Confidence: {} | Data completeness: {:.0}%",
        state.confidence_label(),
        state.completeness * 100.0
    );
    if !state.errors.is_empty() {
        println!("\nWarnings:");
        for error in &state.errors {
            println!("  - {error}");
        }
    }
    Ok(())
}
