//! Document schemas for the Atrium collections

pub mod analysis_cache;
pub mod analysis_job;
pub mod consultation;
pub mod job_definition;
pub mod post;
pub mod user;

pub use analysis_cache::{AnalysisCacheDoc, ANALYSIS_CACHE_COLLECTION};
pub use analysis_job::{AnalysisJobDoc, JobStatus, ANALYSIS_JOB_COLLECTION};
pub use consultation::{ConsultationDoc, CONSULTATION_COLLECTION};
pub use job_definition::{JobDefinitionDoc, JOB_DEFINITION_COLLECTION};
pub use post::{PostDoc, PostStats, POST_COLLECTION};
pub use user::{UserDoc, USER_COLLECTION};
