//! CLI entrypoint for finsight
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, bail};
use clap::Parser;
use finsight_application::ports::{EmbeddingService, NoProgress, RunProgress};
use finsight_application::{
    EvidenceValidator, HybridRetriever, IterativeOrchestrator, MasterSynthesizer, Orchestrator,
    ParallelRunner, RoutedOrchestrator, SemanticRetriever, SinglePassEngine, StrategySet,
    StructuredRetriever, Synthesizer,
};
use finsight_domain::Query;
use finsight_infrastructure::memory::index::IndexedPassage;
use finsight_infrastructure::{
    ConfigLoader, FileConfig, HashEmbedder, InMemoryStructuredStore, InMemoryVectorIndex,
    OpenAiCompletion, OpenAiEmbedding, load_corpus,
};
use finsight_presentation::{Cli, ConsoleFormatter, EngineKind, OutputFormat, ProgressReporter};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity level
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config: FileConfig = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref()).context("failed to load configuration")?
    };
    config.validate().context("invalid configuration")?;

    let Some(query) = Query::try_new(cli.question.clone()) else {
        bail!("Question cannot be empty.");
    };

    // === Dependency Injection ===
    let completion = Arc::new(OpenAiCompletion::new(&config.backend));
    let embedder: Arc<dyn EmbeddingService> = if cli.hash_embeddings {
        Arc::new(HashEmbedder)
    } else {
        Arc::new(OpenAiEmbedding::new(&config.backend))
    };

    // Load the corpus and index it with the chosen embedder
    let passages = load_corpus(&cli.corpus).context("failed to load corpus")?;
    if passages.is_empty() {
        bail!("Corpus {} contains no passages.", cli.corpus.display());
    }
    info!(passages = passages.len(), "indexing corpus");

    let mut indexed = Vec::with_capacity(passages.len());
    for passage in &passages {
        let embedding = embedder
            .embed(&passage.text)
            .await
            .with_context(|| format!("failed to embed corpus passage {}", passage.id))?;
        indexed.push(IndexedPassage {
            id: passage.id.clone(),
            text: passage.text.clone(),
            embedding,
            metadata: passage.metadata.clone(),
        });
    }

    let store = Arc::new(InMemoryStructuredStore::new(passages));
    let index = Arc::new(InMemoryVectorIndex::new(indexed));

    let strategies = StrategySet::new(
        Arc::new(StructuredRetriever::new(
            store.clone(),
            config.retrieval.clone(),
        )),
        Arc::new(HybridRetriever::new(
            embedder.clone(),
            index.clone(),
            store.clone(),
            config.retrieval.clone(),
        )),
        Arc::new(SemanticRetriever::new(
            embedder.clone(),
            index.clone(),
            config.retrieval.clone(),
        )),
    );

    let synthesizer = Arc::new(Synthesizer::new(completion.clone()));

    let orchestrator: Box<dyn Orchestrator> = match cli.engine {
        EngineKind::Routed => {
            let validator = Arc::new(EvidenceValidator::new(
                completion.clone(),
                config.validator.clone(),
            ));
            let engine = Arc::new(SinglePassEngine::new(
                strategies,
                validator,
                synthesizer,
                config.orchestrator.clone(),
            ));
            let runner = ParallelRunner::new(engine.clone(), config.orchestrator.clone());
            let master = MasterSynthesizer::new(completion.clone());
            Box::new(RoutedOrchestrator::new(completion, engine, runner, master))
        }
        EngineKind::Iterative => Box::new(IterativeOrchestrator::new(
            completion,
            strategies,
            synthesizer,
            store,
            config.orchestrator.clone(),
        )),
    };

    // Execute with or without progress reporting
    let response = if cli.quiet {
        orchestrator.run_query(&query, &NoProgress).await?
    } else {
        let progress = ProgressReporter::new();
        let result = orchestrator.run_query(&query, &progress).await;
        progress.on_stage(finsight_domain::RunStage::Complete);
        result?
    };

    let output = match cli.output {
        OutputFormat::Full => ConsoleFormatter::format(&cli.question, &response),
        OutputFormat::Answer => ConsoleFormatter::format_answer_only(&response),
        OutputFormat::Json => ConsoleFormatter::format_json(&response),
    };

    println!("{output}");

    Ok(())
}
