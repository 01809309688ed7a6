//! Post and user search
//!
//! Term matching runs in-process over a bounded candidate pool pulled
//! newest-first from the store. A document matching any term is a hit;
//! matching is case-insensitive over content, pre-extracted keywords,
//! and profile fields. User search additionally supports role,
//! profession, and expertise filters, and can be driven by filters
//! alone with no query text.

use std::sync::Arc;

use async_trait::async_trait;
use bson::doc;
use serde::Serialize;
use tracing::debug;

use crate::auth::Role;
use crate::db::schemas::{PostDoc, UserDoc};
use crate::db::MongoCollection;
use crate::feed::{FeedPost, PostQuery, PostStore};
use crate::types::{AtriumError, Result};

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 50;
/// Candidate pool scanned per search request
const SEARCH_POOL_SIZE: i64 = 500;

/// Minimum length for a term to be considered at all
const MIN_TERM_LEN: usize = 2;
/// Minimum term length for specialty matching; two-letter terms match far
/// too many specialty names to be useful
const MIN_SPECIALTY_TERM_LEN: usize = 3;

/// Reject queries too short to search on
fn validate_query(query: &str) -> Result<()> {
    if query.trim().len() < MIN_TERM_LEN {
        return Err(AtriumError::Validation(
            "Search query must be at least 2 characters".into(),
        ));
    }
    Ok(())
}

/// Split a raw query into lowercase search terms
pub fn parse_terms(query: &str) -> Vec<String> {
    query
        .split_whitespace()
        .map(str::to_lowercase)
        .filter(|term| term.len() >= MIN_TERM_LEN)
        .collect()
}

/// Whether a post matches at least one term, via content or keywords
pub fn post_matches(post: &PostDoc, terms: &[String]) -> bool {
    let content = post.content.to_lowercase();
    terms.iter().any(|term| {
        content.contains(term)
            || post
                .keywords
                .iter()
                .any(|keyword| keyword.to_lowercase().contains(term))
    })
}

/// Whether a user profile matches at least one term, via name, username,
/// or (for longer terms) specialties
pub fn user_matches(user: &UserDoc, terms: &[String]) -> bool {
    let name = user.name.as_deref().unwrap_or_default().to_lowercase();
    let username = user.username.as_deref().unwrap_or_default().to_lowercase();

    terms.iter().any(|term| {
        name.contains(term)
            || username.contains(term)
            || (term.len() >= MIN_SPECIALTY_TERM_LEN
                && user
                    .specialties
                    .iter()
                    .any(|s| s.to_lowercase().contains(term)))
    })
}

/// Whether a user satisfies an expertise filter
pub fn expertise_matches(user: &UserDoc, expertise: &str) -> bool {
    let wanted = expertise.to_lowercase();
    user.specialties
        .iter()
        .any(|s| s.to_lowercase().contains(&wanted))
}

/// Whether a user satisfies a profession filter
pub fn profession_matches(user: &UserDoc, profession: &str) -> bool {
    let wanted = profession.to_lowercase();
    user.profession
        .as_deref()
        .unwrap_or_default()
        .to_lowercase()
        .contains(&wanted)
}

/// User search filters. Any present filter makes query text optional.
#[derive(Debug, Clone, Default)]
pub struct UserFilters {
    pub role: Option<Role>,
    /// Only applied when the role filter selects experts
    pub profession: Option<String>,
    pub expertise: Option<String>,
}

impl UserFilters {
    fn present(value: &Option<String>) -> bool {
        value.as_deref().is_some_and(|v| !v.trim().is_empty())
    }

    pub fn any(&self) -> bool {
        self.role.is_some() || Self::present(&self.profession) || Self::present(&self.expertise)
    }

    fn accepts(&self, user: &UserDoc) -> bool {
        if let Some(role) = self.role {
            if user.role != role {
                return false;
            }
        }
        if self.role == Some(Role::Expert) {
            if let Some(profession) = self.profession.as_deref() {
                if !profession.trim().is_empty() && !profession_matches(user, profession) {
                    return false;
                }
            }
        }
        if let Some(expertise) = self.expertise.as_deref() {
            if !expertise.trim().is_empty() && !expertise_matches(user, expertise) {
                return false;
            }
        }
        true
    }
}

/// Read access to user profiles for search
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Most recently registered profiles first
    async fn list_users(&self, limit: i64) -> Result<Vec<UserDoc>>;
}

/// MongoDB-backed user store
pub struct MongoUserStore {
    users: MongoCollection<UserDoc>,
}

impl MongoUserStore {
    pub fn new(users: MongoCollection<UserDoc>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl UserStore for MongoUserStore {
    async fn list_users(&self, limit: i64) -> Result<Vec<UserDoc>> {
        self.users
            .find_many(doc! {}, Some(doc! { "createdAt": -1 }), Some(limit))
            .await
    }
}

/// API shape of a user search hit
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchUser {
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profession: Option<String>,
    pub specialties: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    pub supports_online: bool,
}

impl From<UserDoc> for SearchUser {
    fn from(doc: UserDoc) -> Self {
        SearchUser {
            user_id: doc.user_id,
            name: doc.name,
            username: doc.username,
            role: doc.role,
            profession: doc.profession,
            specialties: doc.specialties,
            photo_url: doc.photo_url,
            city: doc.city,
            supports_online: doc.supports_online,
        }
    }
}

/// One page of post search results
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostSearchPage {
    pub posts: Vec<FeedPost>,
    pub has_more: bool,
    pub total_results: usize,
}

/// One page of user search results
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSearchPage {
    pub users: Vec<SearchUser>,
    pub has_more: bool,
    pub total_results: usize,
}

/// Search over posts and user profiles
pub struct SearchService {
    posts: Arc<dyn PostStore>,
    users: Arc<dyn UserStore>,
}

impl SearchService {
    pub fn new(posts: Arc<dyn PostStore>, users: Arc<dyn UserStore>) -> Self {
        Self { posts, users }
    }

    pub async fn search_posts(&self, query: &str, limit: Option<i64>) -> Result<PostSearchPage> {
        validate_query(query)?;
        let terms = parse_terms(query);
        if terms.is_empty() {
            // Nothing usable survived term parsing; no point hitting the store
            return Ok(PostSearchPage {
                posts: Vec::new(),
                has_more: false,
                total_results: 0,
            });
        }
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE) as usize;

        let pool = self
            .posts
            .query_posts(PostQuery {
                after: None,
                since: None,
                limit: SEARCH_POOL_SIZE,
            })
            .await?;
        debug!(terms = ?terms, pool = pool.len(), "post search");

        let mut hits: Vec<PostDoc> = pool
            .into_iter()
            .filter(|post| post_matches(post, &terms))
            .take(limit + 1)
            .collect();

        let has_more = hits.len() > limit;
        hits.truncate(limit);

        Ok(PostSearchPage {
            total_results: hits.len(),
            posts: hits.into_iter().map(FeedPost::from).collect(),
            has_more,
        })
    }

    /// Query text and filters combine; a filter-only request (empty
    /// query) browses the directory instead of term-matching it.
    pub async fn search_users(
        &self,
        query: &str,
        filters: &UserFilters,
        limit: Option<i64>,
    ) -> Result<UserSearchPage> {
        if !filters.any() {
            validate_query(query)?;
        }
        let terms = parse_terms(query);
        if terms.is_empty() && !filters.any() {
            return Ok(UserSearchPage {
                users: Vec::new(),
                has_more: false,
                total_results: 0,
            });
        }
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE) as usize;

        let pool = self.users.list_users(SEARCH_POOL_SIZE).await?;

        let mut hits: Vec<UserDoc> = pool
            .into_iter()
            .filter(|user| terms.is_empty() || user_matches(user, &terms))
            .filter(|user| filters.accepts(user))
            .take(limit + 1)
            .collect();

        let has_more = hits.len() > limit;
        hits.truncate(limit);

        Ok(UserSearchPage {
            total_results: hits.len(),
            users: hits.into_iter().map(SearchUser::from).collect(),
            has_more,
        })
    }
}
