//! Consultation record schema

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::IntoIndexes;

/// Collection name for free-text consultation records
pub const CONSULTATION_COLLECTION: &str = "consultations";

/// A saved free-text analysis exchange. Persistence is best-effort: the
/// analysis is returned to the caller even if this record fails to save.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ConsultationDoc {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    pub user_id: String,
    /// The text the user submitted; may be empty for attachment-only requests
    pub text: String,
    pub analysis: String,
    #[serde(default)]
    pub attachment_urls: Vec<String>,

    pub created_at: bson::DateTime,
}

impl IntoIndexes for ConsultationDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "userId": 1, "createdAt": -1 },
            Some(
                IndexOptions::builder()
                    .name("consultations_by_user".to_string())
                    .build(),
            ),
        )]
    }
}
