//! Durable analysis result cache schema
//!
//! Keyed by a content hash over (definition id, answers), so an
//! identical re-submission within the retention window is answered
//! without another model call.

use bson::{doc, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::IntoIndexes;

/// Collection name for cached analysis results
pub const ANALYSIS_CACHE_COLLECTION: &str = "analysisCache";

/// Cached analysis result document
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisCacheDoc {
    /// SHA-256 hex of the canonical (definition id, answers) encoding
    #[serde(rename = "_id")]
    pub key: String,
    pub definition_id: String,
    pub analysis: String,
    pub created_at: bson::DateTime,
}

impl IntoIndexes for AnalysisCacheDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "definitionId": 1 },
            Some(
                IndexOptions::builder()
                    .name("cache_by_definition".to_string())
                    .build(),
            ),
        )]
    }
}
