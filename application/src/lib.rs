//! Application layer for finsight
//!
//! Use cases and ports for the query pipeline: the three retrieval
//! strategies, evidence validation, synthesis, and the two orchestrators
//! (the routed single-pass state machine and the iterative critique-driven
//! planner). Depends only on the domain layer; backends and UI plug in
//! through the ports.

pub mod config;
pub mod master_synth;
pub mod orchestrator;
pub mod ports;
pub mod retrieval;
pub mod synthesizer;
pub mod validator;

pub use config::{OrchestratorParams, RetrievalParams, ValidatorParams};
pub use master_synth::{MasterSynthesis, MasterSynthesizer};
pub use orchestrator::{
    IterativeOrchestrator, OrchestrateError, Orchestrator, ParallelRunner, RoutedOrchestrator,
    SinglePassEngine,
};
pub use retrieval::{
    HybridRetriever, RetrievalRequest, RetrievalStrategy, SemanticRetriever, StrategySet,
    StructuredRetriever,
};
pub use synthesizer::{Synthesis, Synthesizer};
pub use validator::EvidenceValidator;
