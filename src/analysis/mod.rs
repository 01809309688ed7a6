//! AI analysis pipeline
//!
//! Takes submitted answer sets (against a job definition) or free text,
//! assembles a multi-part prompt, calls the generative API, and persists
//! every lifecycle transition so clients can poll the job record.

pub mod answer;
pub mod orchestrator;
pub mod prompts;
pub mod store;

pub use answer::{analysis_cache_key, Answer, Question};
pub use orchestrator::AnalysisOrchestrator;
pub use store::{AnalysisStore, MongoAnalysisStore};
