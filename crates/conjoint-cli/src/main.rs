//! Conjoint - choice experiment CLI
//!
//! The `conjoint` command runs simulated choice experiments and analyses
//! recorded responses.
//!
//! ## Commands
//!
//! - `run`: Spawn agents, generate tasks, simulate responses and analyse them
//! - `analyze`: Estimate results from recorded responses
//! - `forecast`: Predict shares for new concepts from a results file

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, Level};

use conjoint_core::{
    analyze, read_json, read_results_json, run_experiment, write_json, write_results_json,
    write_summary_md, Alternative, EstimationInput, ExperimentConfig, Response, ResultsArtifact,
    Task, METRICS,
};

#[derive(Parser)]
#[command(name = "conjoint")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Simulated conjoint experiments and choice-model estimation", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Abort analysis after this many seconds
    #[arg(long, global = true, env = "CONJOINT_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a simulated experiment end to end
    Run {
        /// Experiment config (TOML or JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// Output directory for tasks, responses, results and summary
        #[arg(short, long, default_value = "conjoint-out")]
        out: PathBuf,

        /// Seed for every random stage (overrides the config)
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Analyse recorded responses
    Analyze {
        /// Experiment config (TOML or JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// Responses file (JSON array)
        #[arg(short, long)]
        responses: PathBuf,

        /// Tasks file; enables holdout and repeat validation
        #[arg(short, long)]
        tasks: Option<PathBuf>,

        /// Output directory for results.json and summary.md
        #[arg(short, long, default_value = "conjoint-out")]
        out: PathBuf,

        /// Seed for bootstrap resampling (overrides the config)
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Predict choice shares for hypothetical concepts
    Forecast {
        /// results.json written by `run` or `analyze`
        #[arg(short, long)]
        results: PathBuf,

        /// Concepts file (JSON array of alternatives)
        #[arg(short, long)]
        concepts: PathBuf,
    },
}

#[derive(Debug, Serialize)]
struct ForecastOutput {
    experiment: String,
    shares: BTreeMap<String, f64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    conjoint_core::init_tracing(cli.json, level);

    let outcome = match cli.command {
        Commands::Run { config, out, seed } => cmd_run(&config, &out, seed, cli.timeout_secs).await,
        Commands::Analyze {
            config,
            responses,
            tasks,
            out,
            seed,
        } => {
            cmd_analyze(
                &config,
                &responses,
                tasks.as_deref(),
                &out,
                seed,
                cli.timeout_secs,
            )
            .await
        }
        Commands::Forecast { results, concepts } => cmd_forecast(&results, &concepts),
    };
    METRICS.flush();
    outcome
}

fn load_config(path: &Path) -> Result<ExperimentConfig> {
    ExperimentConfig::from_path(path)
        .with_context(|| format!("Failed to load experiment config: {:?}", path))
}

fn seeded_rng(cli_seed: Option<u64>, config: &ExperimentConfig) -> ChaCha8Rng {
    let seed = cli_seed.or(config.seed).unwrap_or_else(rand::random);
    info!(seed, "seeding random stages");
    ChaCha8Rng::seed_from_u64(seed)
}

/// Run CPU-bound work off the async runtime, bounded by an optional deadline.
async fn run_blocking<T, F>(timeout_secs: Option<u64>, work: F) -> Result<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let handle = tokio::task::spawn_blocking(work);
    let joined = match timeout_secs {
        Some(secs) if secs > 0 => tokio::time::timeout(Duration::from_secs(secs), handle)
            .await
            .map_err(|_| anyhow!("Analysis timed out after {} seconds", secs))?,
        _ => handle.await,
    };
    joined.context("Analysis task failed")
}

fn write_outputs(out: &Path, artifact: &ResultsArtifact) -> Result<()> {
    let results_path = out.join("results.json");
    write_results_json(&results_path, artifact)
        .with_context(|| format!("Failed to write {:?}", results_path))?;
    let summary_path = out.join("summary.md");
    write_summary_md(&summary_path, artifact)
        .with_context(|| format!("Failed to write {:?}", summary_path))?;
    println!("Results written to {:?}", results_path);
    println!("Summary written to {:?}", summary_path);
    Ok(())
}

async fn cmd_run(
    config_path: &Path,
    out: &Path,
    seed: Option<u64>,
    timeout_secs: Option<u64>,
) -> Result<()> {
    let config = load_config(config_path)?;
    let mut rng = seeded_rng(seed, &config);
    std::fs::create_dir_all(out).with_context(|| format!("Failed to create {:?}", out))?;

    let (config, run, results) = run_blocking(timeout_secs, move || {
        let run = run_experiment(&config, &mut rng)?;
        let results = run.analyze(&config, &mut rng);
        Ok::<_, conjoint_core::ConjointError>((config, run, results))
    })
    .await?
    .context("Experiment run failed")?;

    write_json(&out.join("tasks.json"), &run.tasks).context("Failed to write tasks.json")?;
    write_json(&out.join("responses.json"), &run.responses)
        .context("Failed to write responses.json")?;

    let artifact = ResultsArtifact::new(&config.name, Some(run.run_id), &run.responses, results)
        .context("Failed to build results artifact")?;
    println!(
        "Run {}: {} agents, {} tasks, {} responses",
        run.run_id,
        run.agents.len(),
        run.tasks.len(),
        run.responses.len()
    );
    write_outputs(out, &artifact)
}

async fn cmd_analyze(
    config_path: &Path,
    responses_path: &Path,
    tasks_path: Option<&Path>,
    out: &Path,
    seed: Option<u64>,
    timeout_secs: Option<u64>,
) -> Result<()> {
    let config = load_config(config_path)?;
    let responses: Vec<Response> = read_json(responses_path)
        .with_context(|| format!("Failed to read responses: {:?}", responses_path))?;
    let tasks: Vec<Task> = match tasks_path {
        Some(path) => {
            read_json(path).with_context(|| format!("Failed to read tasks: {:?}", path))?
        }
        None => Vec::new(),
    };
    let mut rng = seeded_rng(seed, &config);
    std::fs::create_dir_all(out).with_context(|| format!("Failed to create {:?}", out))?;

    let (config, responses, results) = run_blocking(timeout_secs, move || {
        let input = EstimationInput::new(&config.features, &config.alternatives, &responses)
            .with_segments(&config.segments)
            .with_tasks(&tasks);
        let results = analyze(&input, &config.estimator, &mut rng);
        (config, responses, results)
    })
    .await?;

    let artifact = ResultsArtifact::new(&config.name, None, &responses, results)
        .context("Failed to build results artifact")?;
    write_outputs(out, &artifact)
}

fn cmd_forecast(results_path: &Path, concepts_path: &Path) -> Result<()> {
    let artifact = read_results_json(results_path)
        .with_context(|| format!("Failed to read results: {:?}", results_path))?;
    let concepts: Vec<Alternative> = read_json(concepts_path)
        .with_context(|| format!("Failed to read concepts: {:?}", concepts_path))?;
    if concepts.is_empty() {
        anyhow::bail!("No concepts to forecast in {:?}", concepts_path);
    }

    let output = ForecastOutput {
        experiment: artifact.experiment.clone(),
        shares: artifact.results.forecast(&concepts),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
