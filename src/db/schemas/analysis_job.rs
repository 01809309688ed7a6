//! Analysis job record schema
//!
//! A job record is created when a user submits their answers to a job
//! definition. The orchestrator drives it through the
//! pending -> processing -> completed/failed lifecycle; every transition
//! is persisted so a crash mid-run leaves an inspectable state.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::IntoIndexes;

/// Collection name for analysis job records
pub const ANALYSIS_JOB_COLLECTION: &str = "analysisJobs";

/// Lifecycle state of an analysis job
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
}

/// Analysis job document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisJobDoc {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    #[serde(default)]
    pub user_id: Option<String>,
    /// Job definition this record was answered against
    pub definition_id: String,

    /// Question snapshot taken at submission time; entries are either
    /// plain strings or objects with `text`/`question` and `imageUrl`
    #[serde(default)]
    pub questions: Vec<serde_json::Value>,
    /// One entry per question; numbers, strings, image sentinels, or
    /// structured objects
    #[serde(default)]
    pub answers: Vec<serde_json::Value>,

    #[serde(default)]
    pub status: JobStatus,
    #[serde(default)]
    pub ai_analysis: Option<String>,
    /// Set on completion: whether the result came from the durable cache
    #[serde(default)]
    pub from_cache: Option<bool>,
    /// User-facing failure message
    #[serde(default)]
    pub error_message: Option<String>,
    /// Truncated technical detail for operators
    #[serde(default)]
    pub error_details: Option<String>,

    pub created_at: bson::DateTime,
    #[serde(default)]
    pub processing_started_at: Option<bson::DateTime>,
    #[serde(default)]
    pub completed_at: Option<bson::DateTime>,
    #[serde(default)]
    pub failed_at: Option<bson::DateTime>,
}

impl IntoIndexes for AnalysisJobDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "userId": 1, "createdAt": -1 },
            Some(
                IndexOptions::builder()
                    .name("jobs_by_user".to_string())
                    .build(),
            ),
        )]
    }
}
