//! Post document schema
//!
//! Content items are created and mutated by the authoring and engagement
//! flows; Atrium reads them for feed, search, and formatting. Only
//! non-comment, non-deleted posts are eligible for feed and search.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::auth::Role;
use crate::db::mongo::IntoIndexes;

/// Collection name for posts
pub const POST_COLLECTION: &str = "posts";

/// Engagement counters maintained by out-of-scope collaborator flows
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PostStats {
    #[serde(default)]
    pub like_count: i64,
    #[serde(default)]
    pub reply_count: i64,
    #[serde(default)]
    pub repost_count: i64,
    #[serde(default)]
    pub quote_count: i64,
}

/// Post document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PostDoc {
    /// MongoDB document ID
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    pub author_id: String,
    #[serde(default)]
    pub author_name: Option<String>,
    #[serde(default)]
    pub author_username: Option<String>,
    #[serde(default)]
    pub author_role: Role,
    #[serde(default)]
    pub author_profession: Option<String>,

    pub content: String,
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub media_name: Option<String>,

    #[serde(default)]
    pub stats: PostStats,

    pub created_at: bson::DateTime,
    #[serde(default)]
    pub edited_at: Option<bson::DateTime>,

    #[serde(default)]
    pub is_comment: bool,
    #[serde(default)]
    pub deleted: bool,

    #[serde(default)]
    pub root_post_id: Option<String>,
    #[serde(default)]
    pub repost_of_post_id: Option<String>,
    #[serde(default)]
    pub is_quote_repost: bool,
    #[serde(default)]
    pub reposted_by_user_id: Option<String>,
    #[serde(default)]
    pub reposted_by_name: Option<String>,
    #[serde(default)]
    pub reposted_by_username: Option<String>,
    #[serde(default)]
    pub reposted_by_role: Option<Role>,

    #[serde(default)]
    pub mentioned_user_ids: Vec<String>,
    /// Pre-extracted search keywords
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl IntoIndexes for PostDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            // Feed/search query path: eligible posts in reverse creation order
            (
                doc! { "isComment": 1, "deleted": 1, "createdAt": -1 },
                Some(
                    IndexOptions::builder()
                        .name("feed_eligibility".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "authorId": 1 },
                Some(
                    IndexOptions::builder()
                        .name("author_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}
