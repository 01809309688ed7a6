//! Job definition schema

use bson::Document;
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::IntoIndexes;

/// Collection name for job definitions
pub const JOB_DEFINITION_COLLECTION: &str = "jobDefinitions";

/// A job definition: the question template an analysis job is answered
/// against, with an optional custom system instruction for the model.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct JobDefinitionDoc {
    /// Definitions are keyed by a caller-visible string id
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    /// Overrides the default analysis instruction when present
    #[serde(default)]
    pub ai_system_instruction: Option<String>,
}

impl IntoIndexes for JobDefinitionDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![]
    }
}
