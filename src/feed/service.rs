//! Feed service: paging, caching, and strategy dispatch
//!
//! Pages after the first are cached per (user, cursor) for a few
//! minutes. The first page is never cached so a fresh open always shows
//! new content; `skipCache` lets a pull-to-refresh bypass the cache on
//! deeper pages too.

use std::sync::Arc;

use async_trait::async_trait;
use bson::{doc, oid::ObjectId, Document};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::auth::Role;
use crate::cache::{CacheConfig, ResultCache};
use crate::db::schemas::PostDoc;
use crate::db::MongoCollection;
use crate::feed::{ranker, FeedStrategy};
use crate::types::{AtriumError, Result};

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 50;

/// Candidate pool size for the ranked strategy. Also the `hasMore`
/// ceiling: a full pool means the window almost certainly holds more.
const RANKED_POOL_SIZE: i64 = 200;
/// Ranked candidates come from the trailing week
const RANKED_WINDOW_HOURS: i64 = 168;

/// A store-level page request
#[derive(Debug, Clone, Default)]
pub struct PostQuery {
    /// Resume strictly after this post id
    pub after: Option<String>,
    /// Only posts created at or after this instant
    pub since: Option<DateTime<Utc>>,
    pub limit: i64,
}

/// Read access to eligible posts, newest first
#[async_trait]
pub trait PostStore: Send + Sync {
    /// Non-comment, non-deleted posts in reverse creation order
    async fn query_posts(&self, query: PostQuery) -> Result<Vec<PostDoc>>;
}

/// MongoDB-backed post store
pub struct MongoPostStore {
    posts: MongoCollection<PostDoc>,
}

impl MongoPostStore {
    pub fn new(posts: MongoCollection<PostDoc>) -> Self {
        Self { posts }
    }

    fn eligibility_filter() -> Document {
        doc! { "isComment": false, "deleted": false }
    }
}

#[async_trait]
impl PostStore for MongoPostStore {
    async fn query_posts(&self, query: PostQuery) -> Result<Vec<PostDoc>> {
        let mut filter = Self::eligibility_filter();

        if let Some(since) = query.since {
            filter.insert("createdAt", doc! { "$gte": bson::DateTime::from_chrono(since) });
        }

        if let Some(after) = &query.after {
            let anchor_id = ObjectId::parse_str(after)
                .map_err(|_| AtriumError::Validation("Invalid cursor".into()))?;
            let anchor = self
                .posts
                .find_one(doc! { "_id": anchor_id })
                .await?
                .ok_or_else(|| AtriumError::Validation("Unknown cursor".into()))?;

            // Seek pagination on (createdAt, _id): stable under inserts,
            // unlike offset paging
            filter.insert(
                "$or",
                vec![
                    doc! { "createdAt": { "$lt": anchor.created_at } },
                    doc! { "createdAt": anchor.created_at, "_id": { "$lt": anchor_id } },
                ],
            );
        }

        self.posts
            .find_many(
                filter,
                Some(doc! { "createdAt": -1, "_id": -1 }),
                Some(query.limit),
            )
            .await
    }
}

/// One feed page request, as received from the API
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeedRequest {
    pub limit: Option<i64>,
    /// Post id of the last item of the previous page
    pub cursor: Option<String>,
    pub skip_cache: bool,
}

/// API shape of a feed post
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedPost {
    pub id: String,
    pub author_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_username: Option<String>,
    pub author_role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_profession: Option<String>,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    pub like_count: i64,
    pub reply_count: i64,
    pub repost_count: i64,
    pub quote_count: i64,
    /// RFC 3339 creation timestamp
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edited_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repost_of_post_id: Option<String>,
    pub is_quote_repost: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reposted_by_name: Option<String>,
}

impl From<PostDoc> for FeedPost {
    fn from(doc: PostDoc) -> Self {
        FeedPost {
            id: doc.id.map(|id| id.to_hex()).unwrap_or_default(),
            author_id: doc.author_id,
            author_name: doc.author_name,
            author_username: doc.author_username,
            author_role: doc.author_role,
            author_profession: doc.author_profession,
            content: doc.content,
            media_url: doc.media_url,
            media_type: doc.media_type,
            like_count: doc.stats.like_count,
            reply_count: doc.stats.reply_count,
            repost_count: doc.stats.repost_count,
            quote_count: doc.stats.quote_count,
            created_at: doc.created_at.to_chrono().to_rfc3339(),
            edited_at: doc.edited_at.map(|t| t.to_chrono().to_rfc3339()),
            repost_of_post_id: doc.repost_of_post_id,
            is_quote_repost: doc.is_quote_repost,
            reposted_by_name: doc.reposted_by_name,
        }
    }
}

/// One assembled feed page
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedPage {
    pub posts: Vec<FeedPost>,
    pub has_more: bool,
    pub total_results: usize,
}

/// Assembles feed pages with a short-lived per-(user, cursor) cache
pub struct FeedService {
    store: Arc<dyn PostStore>,
    strategy: FeedStrategy,
    cache: ResultCache<FeedPage>,
}

impl FeedService {
    pub fn new(store: Arc<dyn PostStore>, strategy: FeedStrategy) -> Self {
        Self {
            store,
            strategy,
            cache: ResultCache::new(CacheConfig::default()),
        }
    }

    pub fn strategy(&self) -> FeedStrategy {
        self.strategy
    }

    /// Assemble one feed page for a requester
    pub async fn get_feed(&self, user_id: Option<&str>, request: FeedRequest) -> Result<FeedPage> {
        let limit = request
            .limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);

        let first_page = request.cursor.is_none();
        let cache_key = format!(
            "feed:{}:{}",
            user_id.unwrap_or("anon"),
            request.cursor.as_deref().unwrap_or("first")
        );

        // The first page is always assembled fresh
        if !first_page && !request.skip_cache {
            if let Some(page) = self.cache.get(&cache_key).await {
                debug!(key = %cache_key, "feed cache hit");
                return Ok(page);
            }
        }

        let page = match self.strategy {
            FeedStrategy::Chronological => self.chronological_page(limit, &request.cursor).await?,
            FeedStrategy::Ranked => self.ranked_page(limit, &request.cursor).await?,
        };

        if !first_page && !request.skip_cache {
            self.cache.set(&cache_key, page.clone()).await;
        }

        Ok(page)
    }

    /// Newest-first page; fetches one extra row to learn whether a next
    /// page exists
    async fn chronological_page(&self, limit: i64, cursor: &Option<String>) -> Result<FeedPage> {
        let mut posts = self
            .store
            .query_posts(PostQuery {
                after: cursor.clone(),
                since: None,
                limit: limit + 1,
            })
            .await?;

        let has_more = posts.len() as i64 > limit;
        posts.truncate(limit as usize);

        Ok(FeedPage {
            total_results: posts.len(),
            posts: posts.into_iter().map(FeedPost::from).collect(),
            has_more,
        })
    }

    /// Ranked page over a trailing-week candidate pool. When the window
    /// is empty (a quiet deployment) it falls back to the same pool size
    /// without the window so the feed is never blank while posts exist.
    async fn ranked_page(&self, limit: i64, cursor: &Option<String>) -> Result<FeedPage> {
        let since = Utc::now() - chrono::Duration::hours(RANKED_WINDOW_HOURS);

        let mut candidates = self
            .store
            .query_posts(PostQuery {
                after: cursor.clone(),
                since: Some(since),
                limit: RANKED_POOL_SIZE,
            })
            .await?;

        if candidates.is_empty() {
            warn!("ranked window empty, falling back to unwindowed candidates");
            candidates = self
                .store
                .query_posts(PostQuery {
                    after: cursor.clone(),
                    since: None,
                    limit: RANKED_POOL_SIZE,
                })
                .await?;
        }

        // A full pool hit the ceiling, so more candidates almost
        // certainly remain past this page
        let has_more = candidates.len() as i64 >= RANKED_POOL_SIZE;

        let page = ranker::rank(candidates, limit as usize, Utc::now());

        Ok(FeedPage {
            total_results: page.len(),
            posts: page.into_iter().map(FeedPost::from).collect(),
            has_more,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schemas::PostStats;
    use bson::oid::ObjectId;
    use tokio::sync::Mutex;

    /// In-memory store: posts held newest-first, cursor and window applied
    /// the same way the MongoDB query would
    struct MemoryPostStore {
        posts: Mutex<Vec<PostDoc>>,
        calls: Mutex<Vec<PostQuery>>,
    }

    impl MemoryPostStore {
        fn new(mut posts: Vec<PostDoc>) -> Self {
            posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Self {
                posts: Mutex::new(posts),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl PostStore for MemoryPostStore {
        async fn query_posts(&self, query: PostQuery) -> Result<Vec<PostDoc>> {
            self.calls.lock().await.push(query.clone());
            let posts = self.posts.lock().await;

            let start = match &query.after {
                Some(after) => {
                    posts
                        .iter()
                        .position(|p| p.id.map(|id| id.to_hex()).as_deref() == Some(after))
                        .map(|i| i + 1)
                        .unwrap_or(posts.len())
                }
                None => 0,
            };

            Ok(posts[start..]
                .iter()
                .filter(|p| match query.since {
                    Some(since) => p.created_at.to_chrono() >= since,
                    None => true,
                })
                .take(query.limit as usize)
                .cloned()
                .collect())
        }
    }

    fn post_at(age_hours: i64) -> PostDoc {
        PostDoc {
            id: Some(ObjectId::new()),
            author_id: format!("author-{}", age_hours),
            author_name: Some("Someone".to_string()),
            author_username: None,
            author_role: Role::Client,
            author_profession: None,
            content: format!("post from {}h ago", age_hours),
            media_url: None,
            media_type: None,
            media_name: None,
            stats: PostStats::default(),
            created_at: bson::DateTime::from_chrono(
                Utc::now() - chrono::Duration::hours(age_hours),
            ),
            edited_at: None,
            is_comment: false,
            deleted: false,
            root_post_id: None,
            repost_of_post_id: None,
            is_quote_repost: false,
            reposted_by_user_id: None,
            reposted_by_name: None,
            reposted_by_username: None,
            reposted_by_role: None,
            mentioned_user_ids: Vec::new(),
            keywords: Vec::new(),
        }
    }

    fn service_over(posts: Vec<PostDoc>, strategy: FeedStrategy) -> (FeedService, Arc<MemoryPostStore>) {
        let store = Arc::new(MemoryPostStore::new(posts));
        (FeedService::new(store.clone(), strategy), store)
    }

    #[tokio::test]
    async fn chronological_page_is_newest_first_with_has_more() {
        let posts: Vec<_> = (1..=25).map(post_at).collect();
        let (service, _) = service_over(posts, FeedStrategy::Chronological);

        let page = service
            .get_feed(Some("u1"), FeedRequest { limit: Some(10), ..Default::default() })
            .await
            .unwrap();

        assert_eq!(page.posts.len(), 10);
        assert_eq!(page.total_results, 10);
        assert!(page.has_more);
        assert_eq!(page.posts[0].content, "post from 1h ago");
        assert_eq!(page.posts[9].content, "post from 10h ago");
    }

    #[tokio::test]
    async fn last_page_reports_no_more() {
        let posts: Vec<_> = (1..=5).map(post_at).collect();
        let (service, _) = service_over(posts, FeedStrategy::Chronological);

        let page = service
            .get_feed(Some("u1"), FeedRequest { limit: Some(10), ..Default::default() })
            .await
            .unwrap();

        assert_eq!(page.posts.len(), 5);
        assert!(!page.has_more);
    }

    #[tokio::test]
    async fn cursor_resumes_after_the_anchor() {
        let posts: Vec<_> = (1..=25).map(post_at).collect();
        let (service, _) = service_over(posts, FeedStrategy::Chronological);

        let first = service
            .get_feed(Some("u1"), FeedRequest { limit: Some(10), ..Default::default() })
            .await
            .unwrap();
        let cursor = first.posts.last().unwrap().id.clone();

        let second = service
            .get_feed(
                Some("u1"),
                FeedRequest {
                    limit: Some(10),
                    cursor: Some(cursor),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(second.posts[0].content, "post from 11h ago");
    }

    #[tokio::test]
    async fn limit_is_clamped_to_the_page_bounds() {
        let posts: Vec<_> = (1..=80).map(post_at).collect();
        let (service, _) = service_over(posts, FeedStrategy::Chronological);

        let oversized = service
            .get_feed(Some("u1"), FeedRequest { limit: Some(500), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(oversized.posts.len(), 50);

        let undersized = service
            .get_feed(Some("u1"), FeedRequest { limit: Some(0), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(undersized.posts.len(), 1);
    }

    #[tokio::test]
    async fn later_pages_are_served_from_cache() {
        let posts: Vec<_> = (1..=30).map(post_at).collect();
        let (service, store) = service_over(posts, FeedStrategy::Chronological);

        let first = service
            .get_feed(Some("u1"), FeedRequest { limit: Some(10), ..Default::default() })
            .await
            .unwrap();
        let cursor = first.posts.last().unwrap().id.clone();
        let request = FeedRequest {
            limit: Some(10),
            cursor: Some(cursor),
            ..Default::default()
        };

        service.get_feed(Some("u1"), request.clone()).await.unwrap();
        let calls_after_miss = store.calls.lock().await.len();
        service.get_feed(Some("u1"), request).await.unwrap();

        assert_eq!(store.calls.lock().await.len(), calls_after_miss);
    }

    #[tokio::test]
    async fn first_page_is_never_cached() {
        let posts: Vec<_> = (1..=30).map(post_at).collect();
        let (service, store) = service_over(posts, FeedStrategy::Chronological);

        let request = FeedRequest { limit: Some(10), ..Default::default() };
        service.get_feed(Some("u1"), request.clone()).await.unwrap();
        service.get_feed(Some("u1"), request).await.unwrap();

        // Both requests hit the store
        assert_eq!(store.calls.lock().await.len(), 2);
    }

    #[tokio::test]
    async fn skip_cache_bypasses_a_cached_page() {
        let posts: Vec<_> = (1..=30).map(post_at).collect();
        let (service, store) = service_over(posts, FeedStrategy::Chronological);

        let first = service
            .get_feed(Some("u1"), FeedRequest { limit: Some(10), ..Default::default() })
            .await
            .unwrap();
        let cursor = first.posts.last().unwrap().id.clone();

        let cached = FeedRequest {
            limit: Some(10),
            cursor: Some(cursor.clone()),
            skip_cache: false,
        };
        service.get_feed(Some("u1"), cached).await.unwrap();

        let refresh = FeedRequest {
            limit: Some(10),
            cursor: Some(cursor),
            skip_cache: true,
        };
        let calls_before = store.calls.lock().await.len();
        service.get_feed(Some("u1"), refresh).await.unwrap();

        assert_eq!(store.calls.lock().await.len(), calls_before + 1);
    }

    #[tokio::test]
    async fn ranked_page_queries_the_trailing_week() {
        let posts: Vec<_> = (1..=30).map(post_at).collect();
        let (service, store) = service_over(posts, FeedStrategy::Ranked);

        let page = service
            .get_feed(Some("u1"), FeedRequest { limit: Some(10), ..Default::default() })
            .await
            .unwrap();

        assert_eq!(page.posts.len(), 10);
        assert!(!page.has_more);
        let calls = store.calls.lock().await;
        assert_eq!(calls.len(), 1);
        assert!(calls[0].since.is_some());
        assert_eq!(calls[0].limit, 200);
    }

    #[tokio::test]
    async fn ranked_page_falls_back_when_the_window_is_empty() {
        // Every post is older than the window
        let posts: Vec<_> = (400..=420).map(post_at).collect();
        let (service, store) = service_over(posts, FeedStrategy::Ranked);

        let page = service
            .get_feed(Some("u1"), FeedRequest { limit: Some(10), ..Default::default() })
            .await
            .unwrap();

        assert_eq!(page.posts.len(), 10);
        let calls = store.calls.lock().await;
        assert_eq!(calls.len(), 2);
        assert!(calls[1].since.is_none());
    }

    #[tokio::test]
    async fn ranked_has_more_reflects_a_full_candidate_pool() {
        let posts: Vec<_> = (0..250).map(|i| post_at(1 + i % 100)).collect();
        let (service, _) = service_over(posts, FeedStrategy::Ranked);

        let page = service
            .get_feed(Some("u1"), FeedRequest { limit: Some(10), ..Default::default() })
            .await
            .unwrap();

        assert!(page.has_more);
    }
}
