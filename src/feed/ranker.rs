//! Feed candidate scoring and ordering
//!
//! Scores are deterministic except for a bounded random factor that
//! keeps repeated refreshes from returning an identical order. The
//! random factor is strictly less than 20% of the deterministic score,
//! so it reshuffles near-ties without letting a weak post leapfrog a
//! strong one.

use chrono::{DateTime, Utc};
use rand::Rng;

use crate::auth::Role;
use crate::db::schemas::{PostDoc, PostStats};

const ADMIN_BOOST: i64 = 1000;
const EXPERT_BOOST: i64 = 20;

const LIKE_WEIGHT: i64 = 1;
const REPLY_WEIGHT: i64 = 3;
const REPOST_WEIGHT: i64 = 2;
const QUOTE_WEIGHT: i64 = 4;

const RECENCY_FRESH: i64 = 100;
const RECENCY_THIS_WEEK: i64 = 50;
const RECENCY_OLD: i64 = 10;

/// Fraction of a page that any single non-admin author may occupy
const AUTHOR_SHARE: f64 = 0.3;
/// Random factor upper bound, as a fraction of the deterministic score
const JITTER_SHARE: f64 = 0.2;

/// A candidate with its deterministic and jittered scores attached
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub post: PostDoc,
    pub total_score: i64,
    pub final_score: f64,
}

/// Weighted engagement: replies and quotes signal more effort than likes
pub fn engagement_score(stats: &PostStats) -> i64 {
    stats.like_count * LIKE_WEIGHT
        + stats.reply_count * REPLY_WEIGHT
        + stats.repost_count * REPOST_WEIGHT
        + stats.quote_count * QUOTE_WEIGHT
}

/// Step function over post age; never zero, so engagement and boosts
/// still order posts older than a week
pub fn recency_score(created_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let age = now.signed_duration_since(created_at);
    if age < chrono::Duration::hours(24) {
        RECENCY_FRESH
    } else if age < chrono::Duration::hours(168) {
        RECENCY_THIS_WEEK
    } else {
        RECENCY_OLD
    }
}

/// Deterministic score for one post
pub fn total_score(post: &PostDoc, now: DateTime<Utc>) -> i64 {
    let role_boost = match post.author_role {
        Role::Admin => ADMIN_BOOST,
        Role::Expert => EXPERT_BOOST,
        Role::Client | Role::Other => 0,
    };

    role_boost + engagement_score(&post.stats) + recency_score(post.created_at.to_chrono(), now)
}

/// Maximum number of page slots a single non-admin author may take
pub fn author_cap(page_size: usize) -> usize {
    (page_size as f64 * AUTHOR_SHARE).ceil() as usize
}

/// Score every candidate and sort best-first
pub fn score_candidates<R: Rng>(
    posts: Vec<PostDoc>,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Vec<ScoredCandidate> {
    let mut scored: Vec<ScoredCandidate> = posts
        .into_iter()
        .map(|post| {
            let total = total_score(&post, now);
            let jitter_cap = total as f64 * JITTER_SHARE;
            let jitter = if jitter_cap > 0.0 {
                rng.gen_range(0.0..jitter_cap)
            } else {
                0.0
            };
            ScoredCandidate {
                final_score: total as f64 + jitter,
                total_score: total,
                post,
            }
        })
        .collect();

    scored.sort_by(|a, b| {
        b.final_score
            .partial_cmp(&a.final_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    scored
}

/// Single greedy pass over the sorted candidates: take posts best-first,
/// skipping any that would push a non-admin author past the per-page cap.
/// Admin posts are always taken. Stops once the page is full; skipped
/// posts are simply absent from this page, not reordered into later ones.
pub fn apply_diversity(scored: Vec<ScoredCandidate>, page_size: usize) -> Vec<PostDoc> {
    let cap = author_cap(page_size);
    let mut per_author: std::collections::HashMap<String, usize> = std::collections::HashMap::new();
    let mut page = Vec::with_capacity(page_size);

    for candidate in scored {
        if page.len() >= page_size {
            break;
        }

        let post = candidate.post;
        if post.author_role == Role::Admin {
            page.push(post);
            continue;
        }

        let taken = per_author.entry(post.author_id.clone()).or_insert(0);
        if *taken < cap {
            *taken += 1;
            page.push(post);
        }
    }

    page
}

/// Rank a candidate pool into one page
pub fn rank(posts: Vec<PostDoc>, page_size: usize, now: DateTime<Utc>) -> Vec<PostDoc> {
    let mut rng = rand::thread_rng();
    apply_diversity(score_candidates(posts, now, &mut rng), page_size)
}
