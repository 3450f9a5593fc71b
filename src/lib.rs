//! sumai: extractive, abstractive and hybrid text summarization with batch
//! evaluation.
//!
//! The engine ranks sentences on a similarity graph (extractive), map-reduces
//! long input through a bounded-context generation backend (abstractive), or
//! chains the two (hybrid). A batch evaluation mode scores a strategy against
//! a labeled dataset with overlap metrics and runs asynchronously behind a
//! TTL-bounded job registry.

pub mod budget;
pub mod chunker;
pub mod config;
pub mod dataset;
pub mod error;
pub mod evaluation;
pub mod interfaces;
pub mod jobs;
pub mod orchestrator;
pub mod remote;
pub mod scoring;
pub mod segment;
pub mod server;
pub mod similarity;
pub mod textrank;
pub mod types;

pub use error::{Result, SumAiError};
pub use orchestrator::Summarizer;
pub use types::{GenerationSettings, Strategy, SummaryResult};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
