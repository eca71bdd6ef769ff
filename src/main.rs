use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use rentvest::api::{
    ComparePayload, InputError, config_from_payload, payload_from_json, run_http_server,
    validate_horizon,
};
use rentvest::core::{Checkpoint, Strategy, checkpoint_report, compare};
use rentvest::telemetry;
use thiserror::Error;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(
    name = "rentvest",
    about = "Compare buying a rental property against investing the same capital and renting",
    version
)]
struct Cli {
    /// Log filter used when RUST_LOG is unset
    #[arg(long, env = "RENTVEST_LOG", default_value = "info", global = true)]
    log_level: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP API
    Serve(ServeArgs),
    /// Run one comparison and print the checkpoint summaries
    Compare(CompareArgs),
}

#[derive(Args, Debug)]
struct ServeArgs {
    #[arg(long, env = "RENTVEST_HOST", default_value = "127.0.0.1")]
    host: IpAddr,
    #[arg(long, env = "RENTVEST_PORT", default_value_t = 8080)]
    port: u16,
}

#[derive(Args, Debug)]
struct CompareArgs {
    /// Horizon in years; overrides the value from --config
    #[arg(long)]
    years: Option<u32>,
    /// JSON file with the same fields as the /api/compare payload
    #[arg(long)]
    config: Option<PathBuf>,
    /// Print the full comparison as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Error)]
enum CliError {
    #[error("failed to read {path}: {source}")]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Input(#[from] InputError),
    #[error("failed to encode output: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("server error: {0}")]
    Server(std::io::Error),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = telemetry::init(&cli.log_level) {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }

    let outcome = match cli.command {
        Command::Serve(args) => serve(args).await,
        Command::Compare(args) => run_compare(args),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "command failed");
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn serve(args: ServeArgs) -> Result<(), CliError> {
    let addr = SocketAddr::new(args.host, args.port);
    info!("Local access: http://{addr}/api/compare");
    run_http_server(addr).await.map_err(CliError::Server)
}

fn run_compare(args: CompareArgs) -> Result<(), CliError> {
    let payload = match &args.config {
        Some(path) => {
            let json = std::fs::read_to_string(path).map_err(|source| CliError::ReadConfig {
                path: path.clone(),
                source,
            })?;
            payload_from_json(&json)?
        }
        None => ComparePayload::default(),
    };
    let mut config = config_from_payload(payload)?;
    if let Some(years) = args.years {
        config.years = validate_horizon(years)?;
    }

    let checkpoints = checkpoint_report(&config);
    if args.json {
        let comparison = compare(&config, config.years);
        let body = serde_json::json!({
            "configuration": config,
            "comparison": comparison,
            "checkpoints": checkpoints,
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    for checkpoint in &checkpoints {
        println!("{}", format_checkpoint(checkpoint));
    }
    Ok(())
}

fn format_checkpoint(checkpoint: &Checkpoint) -> String {
    let summary = &checkpoint.summary;
    let winner = match summary.winner {
        Strategy::Buy => "buy",
        Strategy::Invest => "invest",
    };
    format!(
        "{:>3} years | buy {:>16.2} (property {:.2}, cash {:.2}, exit -{:.2}) | invest {:>16.2} | difference {:>+16.2} | {winner} wins",
        checkpoint.years,
        summary.buy_total,
        checkpoint.property_value,
        checkpoint.cash,
        checkpoint.exit_cost,
        summary.invest_total,
        summary.difference,
    )
}
