//! Command-line interface for the stock advisory engine
//!
//! # Usage
//!
//! ```bash
//! # Evaluate one symbol from a JSON bundle
//! advisor evaluate --input acme.json
//!
//! # Custom weights, strict mode, JSON output
//! advisor evaluate --input acme.json --weights weights.json --strict --format json
//!
//! # Evaluate an array of bundles in parallel
//! advisor batch --input watchlist.json
//!
//! # Show the effective normalized weights
//! ADVISOR_WEIGHT_SENTIMENT=0.1 advisor weights
//! ```

use advisor_engine::interface::{FormatterFactory, OutputFormat};
use advisor_engine::{AdvisoryEngine, EngineConfig, EvaluationRequest, WeightConfig};
use advisor_utils::{Config, LogFormat};
use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Parser, Debug)]
#[command(name = "advisor", version)]
#[command(about = "Score stocks from price, fundamental and news data", long_about = None)]
struct Cli {
    /// Debug-level logging for the engine
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate a single symbol
    Evaluate {
        /// JSON bundle with price_history, fundamentals and news
        #[arg(short, long)]
        input: PathBuf,

        #[command(flatten)]
        engine: EngineArgs,
    },
    /// Evaluate a JSON array of bundles
    Batch {
        #[arg(short, long)]
        input: PathBuf,

        #[command(flatten)]
        engine: EngineArgs,
    },
    /// Print the effective domain weights
    Weights {
        /// JSON file with technical, fundamental and sentiment weights
        #[arg(short, long)]
        weights: Option<PathBuf>,

        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
}

#[derive(Args, Debug)]
struct EngineArgs {
    /// JSON file with technical, fundamental and sentiment weights
    #[arg(short, long)]
    weights: Option<PathBuf>,

    /// Full engine configuration as JSON
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Fail instead of advising DO NOTHING when no data is usable
    #[arg(long)]
    strict: bool,

    #[arg(short, long, value_enum, default_value_t = Format::Text)]
    format: Format,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Text,
    Json,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Text => OutputFormat::Text,
            Format::Json => OutputFormat::Json,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let mut log_config = Config::from_env().with_app_name("advisor");
    if cli.verbose {
        log_config = log_config.verbose();
    }
    if cli.json_logs {
        log_config.log_format = LogFormat::Json;
    }
    advisor_utils::init_tracing_with(&log_config);

    match cli.command {
        Command::Evaluate { input, engine } => run_evaluate(&input, &engine).await,
        Command::Batch { input, engine } => run_batch(&input, &engine).await,
        Command::Weights { weights, format } => run_weights(weights.as_deref(), format).await,
    }
}

async fn run_evaluate(input: &Path, args: &EngineArgs) -> anyhow::Result<()> {
    let engine = build_engine(args).await?;
    let request: EvaluationRequest = read_json(input).await?;
    let formatter = FormatterFactory::create(args.format.into());

    let recommendation = engine
        .evaluate_request(&request)
        .with_context(|| format!("evaluating {}", request.label()))?;
    println!("{}", formatter.format_recommendation(&recommendation)?);
    Ok(())
}

async fn run_batch(input: &Path, args: &EngineArgs) -> anyhow::Result<()> {
    let engine = build_engine(args).await?;
    let requests: Vec<EvaluationRequest> = read_json(input).await?;
    let formatter = FormatterFactory::create(args.format.into());

    let results = engine.evaluate_batch(&requests);
    let mut recommendations = Vec::with_capacity(results.len());
    let mut failed = 0usize;

    for (request, result) in requests.iter().zip(results) {
        match result {
            Ok(recommendation) => recommendations.push(recommendation),
            Err(e) => {
                failed += 1;
                eprintln!(
                    "{}",
                    formatter.format_error(&format!("{}: {e}", request.label()))
                );
            }
        }
    }

    println!("{}", formatter.format_batch(&recommendations)?);

    if failed > 0 {
        bail!("{failed} of {} evaluations failed", requests.len());
    }
    Ok(())
}

async fn run_weights(path: Option<&Path>, format: Format) -> anyhow::Result<()> {
    let weights = load_weights(path).await?;
    let formatter = FormatterFactory::create(format.into());
    println!("{}", formatter.format_weights(&weights.normalized()?)?);
    Ok(())
}

/// Engine config from file, then the weights file, then `ADVISOR_WEIGHT_*`
async fn build_engine(args: &EngineArgs) -> anyhow::Result<AdvisoryEngine> {
    let mut config = match &args.config {
        Some(path) => {
            let raw = read_text(path).await?;
            EngineConfig::from_json(&raw)
                .with_context(|| format!("invalid engine config in {}", path.display()))?
        }
        None => EngineConfig::default(),
    };

    if args.weights.is_some() {
        config.weights = load_weights(args.weights.as_deref()).await?;
    } else {
        config.weights = config.weights.with_env_overrides()?;
    }
    config.strict |= args.strict;

    debug!(weights = ?config.weights, strict = config.strict, "engine configuration loaded");
    Ok(AdvisoryEngine::new(config)?)
}

async fn load_weights(path: Option<&Path>) -> anyhow::Result<WeightConfig> {
    let weights = match path {
        Some(path) => read_json(path).await?,
        None => WeightConfig::default(),
    };
    Ok(weights.with_env_overrides()?)
}

async fn read_text(path: &Path) -> anyhow::Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let raw = read_text(path).await?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_evaluate() {
        let cli = Cli::try_parse_from([
            "advisor", "evaluate", "--input", "acme.json", "--strict", "--format", "json",
        ])
        .unwrap();
        match cli.command {
            Command::Evaluate { input, engine } => {
                assert_eq!(input, PathBuf::from("acme.json"));
                assert!(engine.strict);
                assert!(matches!(engine.format, Format::Json));
                assert!(engine.weights.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_weights_with_global_flag() {
        let cli = Cli::try_parse_from(["advisor", "weights", "-v"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Command::Weights { weights: None, .. }));
    }

    #[test]
    fn test_evaluate_requires_input() {
        assert!(Cli::try_parse_from(["advisor", "evaluate"]).is_err());
    }
}
