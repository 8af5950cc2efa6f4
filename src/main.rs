//! MLBX — matchup scoring for baseball slates.
//!
//! Entry point. Loads configuration, initialises structured logging, loads
//! the classifier once, then either scores a CSV from disk or serves the
//! dashboard API.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::info;

use mlbx::config::AppConfig;
use mlbx::dashboard::{self, routes::DashboardState};
use mlbx::export;
use mlbx::model;
use mlbx::pipeline::report::SlateReport;
use mlbx::pipeline::ScoringPipeline;
use mlbx::sheet::MatchupSheet;

/// Score baseball matchups and surface value picks, props and parlays.
#[derive(Parser)]
#[command(name = "mlbx", about = "MLBX matchup scoring")]
struct Cli {
    /// Path of the TOML configuration file.
    #[arg(long, default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Score a CSV file and print the report.
    Score {
        /// Input CSV with one matchup per row.
        input: String,

        /// Write the annotated rows to this CSV file.
        #[arg(long)]
        output: Option<String>,

        /// Print the full report as JSON instead of tables.
        #[arg(long)]
        json: bool,
    },
    /// Serve the dashboard API.
    Serve {
        /// Override the configured port.
        #[arg(long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let cli = Cli::parse();
    init_logging();

    let cfg = if std::path::Path::new(&cli.config).exists() {
        AppConfig::load(&cli.config)?
    } else {
        info!(path = %cli.config, "No config file found, using defaults");
        AppConfig::default()
    };

    let classifier = model::shared_model(&cfg.model.artifact_path)?;
    let pipeline = ScoringPipeline::new(classifier, cfg.pipeline.clone());

    match cli.command {
        Command::Score { input, output, json } => {
            let sheet = MatchupSheet::from_path(&input)?;
            let slate = pipeline
                .score(sheet)
                .with_context(|| format!("Failed to score {input}"))?;
            let report = slate.report(pipeline.options());

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }

            if let Some(path) = output {
                export::write_path(&slate, &path)?;
            }
            info!(%report, "Scoring complete");
        }
        Command::Serve { port } => {
            let port = port.unwrap_or(cfg.dashboard.port);
            let state = Arc::new(DashboardState::new(pipeline, cfg.dashboard.max_upload_bytes));
            dashboard::serve(state, port).await?;
        }
    }

    Ok(())
}

/// Print the report views as plain-text tables.
fn print_report(report: &SlateReport) {
    println!("Predictions ({} rows)", report.row_count);
    for row in &report.rows {
        println!("  {row}");
    }

    println!(
        "\nWins: {} | Losses: {}",
        report.summary.win_count, report.summary.loss_count
    );

    if let Some(roi) = &report.roi {
        println!("\nROI tracker (1 unit flat)");
        println!(
            "  Smart bets: {} | Wins: {} | Losses: {} | Units: {} | ROI: {}%",
            roi.bets, roi.wins, roi.losses, roi.units, roi.roi_percent
        );
    }

    println!("\nSmart bets");
    for row in &report.smart_bets {
        println!(
            "  {:<24} edge {:>6.2}%  win {:>6.2}%",
            row.matchup, row.features.edge_pct, row.derived.win_probability
        );
    }

    println!("\nTop parlay");
    for row in &report.top_parlay {
        println!("  {:<24} {:>6.2}%", row.matchup, row.derived.win_probability);
    }

    if let Some(legs) = &report.prop_parlay {
        println!("\nProp parlay");
        for leg in legs {
            println!(
                "  {:<24} score {:>6.1}  {}",
                leg.matchup, leg.gematria_alignment_score, leg.confidence_tier
            );
        }
    }

    println!("\nWin probability distribution");
    for bin in &report.histogram {
        println!(
            "  {:>6.2} - {:>6.2}  {}",
            bin.start,
            bin.end,
            "#".repeat(bin.count)
        );
    }
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("mlbx=info"));

    let json_logging = std::env::var("MLBX_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .with_writer(std::io::stderr)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    }
}
