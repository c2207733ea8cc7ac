//! Tenderscope CLI
//!
//! The `tenderscope` command drives the evaluation engine from JSON files.
//!
//! ## Commands
//!
//! - `score`: Normalize submissions and print ranked category scores
//! - `benchmark`: Summarize price observations and flag outliers
//! - `run`: Score, lock and benchmark a tender in one pass

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn, Level};

use tenderscope_core::{
    BenchmarkReport, BenchmarkState, Category, CategoryScore, EngineConfig, MatrixState,
    MemoryTenderSource, PriceObservation, Role, Score, TenderData, TenderRegistry, TenderSpan,
    TransitionRecord, WeightAlignment, METRICS,
};

#[derive(Parser)]
#[command(name = "tenderscope")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Vendor evaluation scoring and market benchmark outlier engine", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Engine configuration file (JSON)
    #[arg(long, global = true, env = "TENDERSCOPE_CONFIG")]
    config: Option<PathBuf>,

    /// Write the result here instead of stdout
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest submissions and print weight alignment and category rankings
    Score {
        /// Tender document (JSON)
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Compute distribution summaries and deviation records for prices
    Benchmark {
        /// Price observations document (JSON)
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Score, lock and forward a tender to benchmarking
    Run {
        /// Tender document (JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Role of the caller attempting the lock
        #[arg(long, default_value = "chair")]
        role: Role,
    },
}

/// Input for `benchmark`: a bare list of observations.
#[derive(Debug, Deserialize)]
struct PricesFile {
    observations: Vec<PriceObservation>,
}

#[derive(Debug, Serialize)]
struct ScoreReport {
    tender_id: String,
    alignments: Vec<WeightAlignment>,
    rankings: BTreeMap<Category, Vec<CategoryScore>>,
    scores: Vec<Score>,
}

#[derive(Debug, Serialize)]
struct RunReport {
    tender_id: String,
    lifecycle: MatrixState,
    benchmark_state: Option<BenchmarkState>,
    snapshot_digest: Option<String>,
    scoring: ScoreReport,
    benchmark: Option<BenchmarkReport>,
    history: Vec<TransitionRecord>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    tenderscope_core::init_tracing(cli.json, level);

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Score { input } => {
            let data: TenderData = read_json_file(&input)?;
            let report = cmd_score(data, config).await?;
            emit(&report, cli.output.as_deref())
        }
        Commands::Benchmark { input } => {
            let prices: PricesFile = read_json_file(&input)?;
            let report = cmd_benchmark(&prices.observations, &config);
            emit(&report, cli.output.as_deref())
        }
        Commands::Run { input, role } => {
            let data: TenderData = read_json_file(&input)?;
            let report = cmd_run(data, role, config).await?;
            emit(&report, cli.output.as_deref())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config: {:?}", path)),
        None => Ok(EngineConfig::default()),
    }
}

async fn cmd_score(data: TenderData, config: EngineConfig) -> Result<ScoreReport> {
    let tender_id = data.tender_id.clone();
    let source = MemoryTenderSource::from(data);
    let registry = TenderRegistry::new(config);

    let handle = registry
        .get_or_load(&tender_id, &source)
        .await
        .with_context(|| format!("Failed to load tender {}", tender_id))?;
    let session = handle.read().await;
    Ok(score_report(&session))
}

fn cmd_benchmark(observations: &[PriceObservation], config: &EngineConfig) -> BenchmarkReport {
    let report = BenchmarkReport::compute(observations, config);
    info!(
        categories = report.summaries.len(),
        outliers = report.outliers().count(),
        "benchmark computed"
    );
    report
}

async fn cmd_run(data: TenderData, role: Role, config: EngineConfig) -> Result<RunReport> {
    let tender_id = data.tender_id.clone();
    let _span = TenderSpan::enter(&tender_id);
    let source = MemoryTenderSource::from(data);
    let registry = TenderRegistry::new(config);

    registry
        .get_or_load(&tender_id, &source)
        .await
        .with_context(|| format!("Failed to load tender {}", tender_id))?;

    let locked = registry
        .with_session(&tender_id, |s| s.lock(role).map(|_| ()))
        .await?;
    match locked {
        Ok(()) => {
            registry
                .begin_benchmarking(&tender_id, &source)
                .await
                .context("Failed to enter benchmarking")?;
        }
        Err(e) => warn!(error = %e, "matrix not locked; skipping benchmarking"),
    }
    METRICS.flush();

    let report = registry
        .with_session(&tender_id, |s| RunReport {
            tender_id: s.tender_id().to_string(),
            lifecycle: s.lifecycle_state(),
            benchmark_state: s.benchmark_state(),
            snapshot_digest: s.snapshot().map(|snap| snap.digest.to_string()),
            scoring: score_report(s),
            benchmark: s.report().cloned(),
            history: s.history().to_vec(),
        })
        .await?;
    Ok(report)
}

fn score_report(session: &tenderscope_core::TenderSession) -> ScoreReport {
    let categories = session.matrix().active_categories();
    ScoreReport {
        tender_id: session.tender_id().to_string(),
        alignments: session.alignments(),
        rankings: categories
            .into_iter()
            .map(|c| (c, session.ranking(c)))
            .collect(),
        scores: session.matrix().scores().cloned().collect(),
    }
}

fn read_json_file<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read JSON file: {:?}", path))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {:?}", path))
}

fn emit<T: Serialize>(value: &T, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    match output {
        Some(path) => {
            std::fs::write(path, &json)
                .with_context(|| format!("Failed to write output to {:?}", path))?;
            info!(path = %path.display(), "result written");
        }
        None => println!("{}", json),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tender_json() -> serde_json::Value {
        json!({
            "tender_id": "T-2024-017",
            "vendors": [
                { "id": "v1", "name": "Acme" },
                { "id": "v2", "name": "Globex" }
            ],
            "criteria": [
                { "id": "iso", "name": "ISO 9001", "category": "technical", "weight": 50.0 },
                { "id": "staff", "name": "Consultants", "category": "technical", "weight": 50.0 }
            ],
            "submissions": [
                { "vendor_id": "v1", "values": { "ISO 9001": "Yes", "Consultants": 50 } },
                { "vendor_id": "v2", "values": { "ISO 9001": "No", "Consultants": "25" } }
            ],
            "observations": [
                { "category": "steel", "vendor_name": "market", "price": 1500.0 },
                { "category": "steel", "vendor_name": "market", "price": 1520.0 },
                { "category": "steel", "vendor_name": "market", "price": 1550.0 },
                { "category": "steel", "vendor_name": "market", "price": 1580.0 },
                { "category": "steel", "vendor_name": "market", "price": 1600.0 },
                { "category": "steel", "vendor_name": "market", "price": 1620.0 },
                { "category": "steel", "vendor_name": "market", "price": 1650.0 },
                { "category": "steel", "vendor_name": "Acme", "price": 1550.0 },
                { "category": "steel", "vendor_name": "Globex", "price": 2500.0 }
            ]
        })
    }

    fn tender() -> TenderData {
        serde_json::from_value(tender_json()).unwrap()
    }

    #[tokio::test]
    async fn test_cmd_score_ranks_vendors() {
        let report = cmd_score(tender(), EngineConfig::default()).await.unwrap();
        let technical = &report.rankings[&Category::Technical];
        assert_eq!(technical[0].vendor_id.as_str(), "v1");
        assert_eq!(technical[0].score, 10.0);
        assert_eq!(technical[1].score, 2.5);
        assert!(report.alignments.iter().all(|a| a.aligned));
        assert_eq!(report.scores.len(), 4);
    }

    #[tokio::test]
    async fn test_cmd_run_as_chair_benchmarks() {
        let report = cmd_run(tender(), Role::Chair, EngineConfig::default())
            .await
            .unwrap();
        assert_eq!(report.lifecycle, MatrixState::Locked);
        assert_eq!(report.benchmark_state, Some(BenchmarkState::Provisional));
        assert_eq!(report.snapshot_digest.as_deref().map(str::len), Some(64));

        let benchmark = report.benchmark.unwrap();
        let flagged: Vec<&str> = benchmark.outliers().map(|r| r.vendor.as_str()).collect();
        assert_eq!(flagged, vec!["Globex"]);
        assert_eq!(report.history.len(), 2);
    }

    #[tokio::test]
    async fn test_cmd_run_as_evaluator_stays_editable() {
        let report = cmd_run(tender(), Role::Evaluator, EngineConfig::default())
            .await
            .unwrap();
        assert_eq!(report.lifecycle, MatrixState::Editable);
        assert!(report.benchmark.is_none());
        assert!(report.snapshot_digest.is_none());
        assert!(report.history[0].rejection.is_some());
    }

    #[test]
    fn test_cmd_benchmark_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prices.json");
        let doc = json!({ "observations": tender_json()["observations"] });
        std::fs::write(&path, doc.to_string()).unwrap();

        let prices: PricesFile = read_json_file(&path).unwrap();
        let report = cmd_benchmark(&prices.observations, &EngineConfig::default());
        assert_eq!(report.summaries["steel"].count, 9);
        assert_eq!(report.records.len(), 9);
    }

    #[test]
    fn test_load_config_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"tukey_multiplier": -1.0}"#).unwrap();
        let err = load_config(Some(&path)).unwrap_err();
        assert!(format!("{:#}", err).contains("tukey_multiplier"));

        assert_eq!(load_config(None).unwrap(), EngineConfig::default());
    }

    #[test]
    fn test_emit_writes_output_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        emit(&json!({"ok": true}), Some(&path)).unwrap();
        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["ok"], true);
    }

    #[test]
    fn test_cli_parses_role_and_globals() {
        let cli = Cli::try_parse_from([
            "tenderscope",
            "run",
            "--input",
            "t.json",
            "--role",
            "Evaluator",
            "--json",
        ])
        .unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Run { role, .. } => assert_eq!(role, Role::Evaluator),
            _ => panic!("expected run"),
        }
    }
}
