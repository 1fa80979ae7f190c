//! Fan-out/fan-in execution of scoring tasks

pub mod context;
pub mod derived;
pub mod orchestrator;
pub mod pool;

pub use context::ScoringContext;
pub use derived::{DerivedInputs, FilingExcerpt, TranscriptExcerpt};
pub use orchestrator::Orchestrator;
pub use pool::WorkerPool;
