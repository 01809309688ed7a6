//! User profile document schema

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::auth::Role;
use crate::db::mongo::IntoIndexes;

/// Collection name for user profiles
pub const USER_COLLECTION: &str = "users";

/// User profile document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UserDoc {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    /// Identity-provider user id; the id used everywhere else in the API
    pub user_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub profession: Option<String>,
    /// Expertise areas, relevant for expert accounts
    #[serde(default)]
    pub specialties: Vec<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub about: Option<String>,
    #[serde(default)]
    pub supports_online: bool,

    pub created_at: bson::DateTime,
}

impl IntoIndexes for UserDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "userId": 1 },
            Some(
                IndexOptions::builder()
                    .name("user_id_unique".to_string())
                    .unique(true)
                    .build(),
            ),
        )]
    }
}
