//! kudos-cli — Command-line front-end for the Kudos reputation engine.
//!
//! Loads a graph snapshot from JSON, runs a batch reputation computation
//! (or just the structural solver), and emits a JSON report to stdout or a
//! file.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use tracing::info;

use kudos_core::constants::DEFAULT_DAMPING_FACTOR;
use kudos_core::graph::GraphModel;
use kudos_core::types::{GraphEdge, GraphNode, NodeId, ReputationResult};
use kudos_engine::{BatchConfig, BatchReputationEngine, EngineConfig};
use kudos_rank::RankConfig;

/// Kudos command-line reputation runner.
#[derive(Parser)]
#[command(name = "kudos-cli")]
#[command(version, about = "Trust is a graph; score it.")]
struct Cli {
    /// Verbose logging (debug level).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute fused reputation scores for users in a snapshot.
    Score(ScoreArgs),
    /// Compute only the structural-importance ranking.
    Rank(RankArgs),
}

#[derive(Args)]
struct ScoreArgs {
    /// Path to a JSON snapshot: { "nodes": [...], "edges": [...] }.
    #[arg(long)]
    graph: PathBuf,

    /// Users to score (comma separated). Defaults to every node.
    #[arg(long, value_delimiter = ',')]
    users: Option<Vec<String>>,

    /// How many top-ranked entries to include in the report.
    #[arg(long, default_value_t = 20)]
    top: usize,

    /// Damping factor for the structural solver.
    #[arg(long, default_value_t = DEFAULT_DAMPING_FACTOR)]
    damping: f64,

    /// Cap on concurrently in-flight per-user computations.
    #[arg(long)]
    max_workers: Option<usize>,

    /// Write the JSON report here instead of stdout.
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct RankArgs {
    /// Path to a JSON snapshot: { "nodes": [...], "edges": [...] }.
    #[arg(long)]
    graph: PathBuf,

    /// How many entries to print.
    #[arg(long, default_value_t = 20)]
    top: usize,

    /// Damping factor for the structural solver.
    #[arg(long, default_value_t = DEFAULT_DAMPING_FACTOR)]
    damping: f64,
}

/// On-disk snapshot format produced by the ingestion collaborator.
#[derive(Debug, Deserialize)]
struct SnapshotFile {
    #[serde(default)]
    nodes: Vec<GraphNode>,
    #[serde(default)]
    edges: Vec<GraphEdge>,
}

/// One row of the top-ranked listing.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RankedEntry {
    user_id: NodeId,
    final_score: f64,
    sybil_risk: f64,
    confidence: f64,
}

/// Full JSON report emitted by `score`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScoreReport {
    generated_at: DateTime<Utc>,
    computation_method: String,
    convergent: bool,
    total_processed: usize,
    total_failed: usize,
    processing_time_ms: u64,
    top_ranked: Vec<RankedEntry>,
    scores: HashMap<NodeId, ReputationResult>,
    failed: HashMap<NodeId, String>,
}

fn load_snapshot(path: &PathBuf) -> Result<GraphModel> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading snapshot {}", path.display()))?;
    let snapshot: SnapshotFile = serde_json::from_str(&raw)
        .with_context(|| format!("parsing snapshot {}", path.display()))?;
    GraphModel::build(snapshot.nodes, snapshot.edges).context("building graph snapshot")
}

async fn run_score(args: ScoreArgs) -> Result<()> {
    if args.damping <= 0.0 || args.damping >= 1.0 {
        bail!("--damping must lie strictly between 0 and 1, got {}", args.damping);
    }

    let graph = Arc::new(load_snapshot(&args.graph)?);
    info!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "snapshot loaded"
    );

    let mut batch = BatchConfig::default();
    if let Some(workers) = args.max_workers {
        batch.max_workers = workers;
    }
    let config = EngineConfig {
        rank: RankConfig {
            damping_factor: args.damping,
            ..RankConfig::default()
        },
        batch,
        ..EngineConfig::default()
    };

    let users: Vec<NodeId> = match args.users {
        Some(users) => users,
        None => graph.node_ids().map(str::to_string).collect(),
    };

    let engine = BatchReputationEngine::new(Arc::clone(&graph), config)?;
    let convergent = engine.structural_scores().convergent;
    let batch = engine.compute_batch(&users, None).await;

    let mut top_ranked: Vec<RankedEntry> = batch
        .scores
        .values()
        .map(|r| RankedEntry {
            user_id: r.user_id.clone(),
            final_score: r.final_score,
            sybil_risk: r.sybil_risk,
            confidence: r.confidence,
        })
        .collect();
    top_ranked.sort_by(|a, b| {
        b.final_score
            .total_cmp(&a.final_score)
            .then_with(|| a.user_id.cmp(&b.user_id))
    });
    top_ranked.truncate(args.top);

    let report = ScoreReport {
        generated_at: Utc::now(),
        computation_method: engine.method().to_string(),
        convergent,
        total_processed: batch.total_processed,
        total_failed: batch.total_failed,
        processing_time_ms: batch.processing_time_ms,
        top_ranked,
        scores: batch.scores,
        failed: batch.failed,
    };

    let rendered = serde_json::to_string_pretty(&report).context("serializing report")?;
    match args.output {
        Some(path) => {
            fs::write(&path, rendered)
                .with_context(|| format!("writing report to {}", path.display()))?;
            info!(path = %path.display(), "report written");
        }
        None => println!("{rendered}"),
    }
    Ok(())
}

fn run_rank(args: RankArgs) -> Result<()> {
    let graph = load_snapshot(&args.graph)?;
    let config = RankConfig {
        damping_factor: args.damping,
        ..RankConfig::default()
    };
    let solver = kudos_rank::PageRank::new(config)?;
    let result = solver.compute(&graph);

    if !result.convergent {
        eprintln!(
            "warning: solver hit the iteration cap after {} iterations",
            result.iterations
        );
    }

    let mut rows: Vec<(&String, &f64)> = result.scores.iter().collect();
    rows.sort_by(|a, b| b.1.total_cmp(a.1).then_with(|| a.0.cmp(b.0)));
    for (user, score) in rows.into_iter().take(args.top) {
        println!("{score:.6}  {user}");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Score(args) => run_score(args).await,
        Commands::Rank(args) => run_rank(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SNAPSHOT: &str = r#"{
        "nodes": [
            {"id": "a", "metadata": {"stake": 10.0}},
            {"id": "b"},
            {"id": "c"}
        ],
        "edges": [
            {"source": "a", "target": "b", "weight": 1.0,
             "edgeType": "FOLLOW", "timestamp": "2024-01-01T00:00:00Z"},
            {"source": "b", "target": "c", "weight": 2.0,
             "edgeType": "ENDORSE", "timestamp": "2024-01-02T00:00:00Z"}
        ]
    }"#;

    #[test]
    fn snapshot_file_parses() {
        let snapshot: SnapshotFile = serde_json::from_str(SNAPSHOT).unwrap();
        assert_eq!(snapshot.nodes.len(), 3);
        assert_eq!(snapshot.edges.len(), 2);
        assert_eq!(snapshot.nodes[0].stake(), 10.0);
    }

    #[test]
    fn snapshot_defaults_to_empty_sections() {
        let snapshot: SnapshotFile = serde_json::from_str("{}").unwrap();
        assert!(snapshot.nodes.is_empty());
        assert!(snapshot.edges.is_empty());
    }

    #[test]
    fn load_snapshot_builds_graph() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SNAPSHOT.as_bytes()).unwrap();
        let graph = load_snapshot(&file.path().to_path_buf()).unwrap();
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn load_snapshot_rejects_dangling_edge() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            br#"{"nodes": [{"id": "a"}],
                 "edges": [{"source": "a", "target": "ghost", "weight": 1.0,
                            "edgeType": "FOLLOW", "timestamp": "2024-01-01T00:00:00Z"}]}"#,
        )
        .unwrap();
        assert!(load_snapshot(&file.path().to_path_buf()).is_err());
    }

    #[test]
    fn cli_parses_score_command() {
        let cli = Cli::try_parse_from([
            "kudos-cli", "score", "--graph", "snap.json", "--users", "a,b", "--top", "5",
        ])
        .unwrap();
        match cli.command {
            Commands::Score(args) => {
                assert_eq!(args.users.as_deref(), Some(&["a".to_string(), "b".to_string()][..]));
                assert_eq!(args.top, 5);
                assert_eq!(args.damping, DEFAULT_DAMPING_FACTOR);
            }
            _ => panic!("expected score command"),
        }
    }
}
