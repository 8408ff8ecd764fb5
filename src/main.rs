//! CNC Tool Wear Prediction - Main Entry Point
//!
//! Thin presentation shell over the inference pipeline: loads the model and
//! scaler once, runs one request and prints the three labels (or one error).

mod api;
mod constants;
mod logic;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};

use api::commands::{self, CommandResponse};
use logic::config::AppConfig;
use logic::context::AppContext;

#[derive(Parser, Debug)]
#[command(name = "toolwear", version, about = "CNC tool wear, machining and visual inspection prediction")]
struct Cli {
    /// ONNX model file (overrides TOOLWEAR_MODEL_PATH)
    #[arg(long, global = true)]
    model: Option<PathBuf>,

    /// Scaler JSON file (overrides TOOLWEAR_SCALER_PATH)
    #[arg(long, global = true)]
    scaler: Option<PathBuf>,

    /// Time steps the model was trained on (overrides TOOLWEAR_TIME_STEPS)
    #[arg(long, global = true)]
    time_steps: Option<usize>,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Predict from a CSV of consecutive readings
    PredictFile {
        /// CSV whose header contains all 16 feature columns
        path: PathBuf,
    },
    /// Predict from manually entered values (unset fields default to 0.0)
    PredictValues {
        /// Field assignment, e.g. --set feedrate=6
        #[arg(long = "set", value_name = "NAME=VALUE", value_parser = parse_assignment)]
        values: Vec<(String, f32)>,
    },
    /// List the required feature columns
    Features,
    /// Show loaded model and scaler information
    Status,
}

fn parse_assignment(raw: &str) -> Result<(String, f32), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", raw))?;
    let value: f32 = value
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a number", value.trim()))?;
    Ok((name.trim().to_string(), value))
}

fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut config = AppConfig::from_env();
    if let Some(model) = cli.model {
        config.model_path = model;
    }
    if let Some(scaler) = cli.scaler {
        config.scaler_path = scaler;
    }
    if let Some(time_steps) = cli.time_steps {
        config.time_steps = time_steps;
    }

    let response = match cli.command {
        Command::Features => {
            print_features(cli.json)?;
            return Ok(ExitCode::SUCCESS);
        }
        Command::Status => {
            let ctx = load_context(config)?;
            let status = commands::engine_status(&ctx);
            println!("{}", serde_json::to_string_pretty(&status)?);
            return Ok(ExitCode::SUCCESS);
        }
        Command::PredictFile { path } => commands::predict_from_file(&load_context(config)?, &path),
        Command::PredictValues { values } => commands::predict_from_fields(&load_context(config)?, &values),
    };

    print_response(&response, cli.json)?;

    Ok(if response.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Artifacts are loaded once per process; failure here is fatal
fn load_context(config: AppConfig) -> anyhow::Result<AppContext> {
    log::info!("Starting {} v{}...", constants::APP_NAME, constants::APP_VERSION);
    AppContext::load(config).context("failed to load model artifacts")
}

fn print_features(json: bool) -> anyhow::Result<()> {
    let features = commands::required_features();
    if json {
        println!("{}", serde_json::to_string_pretty(&features)?);
    } else {
        for (i, name) in features.iter().enumerate() {
            println!("{:>2}  {}", i, name);
        }
    }
    Ok(())
}

fn print_response(response: &CommandResponse, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(response)?);
    } else {
        print!("{}", response.render_text());
    }
    Ok(())
}
