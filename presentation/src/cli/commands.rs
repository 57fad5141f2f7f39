//! CLI command definitions

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for query results
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Full formatted output with citations, confidence, and trace
    Full,
    /// Only the final answer
    Answer,
    /// JSON output
    Json,
}

/// Which orchestration engine runs the query
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum EngineKind {
    /// Route once, then walk the fallback chain
    Routed,
    /// Iterative plan-retrieve-critique loop
    Iterative,
}

/// CLI arguments for finsight
#[derive(Parser, Debug)]
#[command(name = "finsight")]
#[command(author, version, about = "Evidence-grounded Q&A over financial filings")]
#[command(long_about = r#"
Finsight answers questions about financial filings by retrieving evidence
passages, validating them, and synthesizing a cited answer.

A query is classified and routed to a retrieval strategy (structured,
semantic, or hybrid); comparison questions are decomposed into topics that
run in parallel. The iterative engine instead loops retrieve-synthesize-
critique until the draft passes or the budget runs out.

Configuration files are loaded from (in priority order):
1. --config <path>     Explicit config file
2. ./finsight.toml     Project-level config
3. ~/.config/finsight/config.toml   Global config

Example:
  finsight --corpus filings.jsonl "What were Bank of America's credit risk factors in 2023?"
  finsight --corpus filings.jsonl --engine iterative "How did JPM describe liquidity risk?"
  finsight --corpus filings.jsonl -o json "Compare interest rate risk and operational risk for BAC"
"#)]
pub struct Cli {
    /// The question to answer
    pub question: String,

    /// Path to the JSONL passage corpus to query
    #[arg(long, value_name = "PATH")]
    pub corpus: PathBuf,

    /// Use the deterministic local embedder instead of the backend
    /// embedding API (no network needed; for offline runs)
    #[arg(long)]
    pub hash_embeddings: bool,

    /// Orchestration engine
    #[arg(short, long, value_enum, default_value = "routed")]
    pub engine: EngineKind,

    /// Output format
    #[arg(short, long, value_enum, default_value = "full")]
    pub output: OutputFormat,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,
}
