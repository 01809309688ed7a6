//! Discovery feed assembly
//!
//! Two interchangeable strategies behind one entry point: a plain
//! reverse-chronological page, and a ranked page that scores a recent
//! candidate pool and re-orders it with an author diversity pass.

pub mod ranker;
pub mod service;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

pub use service::{FeedPage, FeedPost, FeedRequest, FeedService, MongoPostStore, PostQuery, PostStore};

/// Which feed assembly strategy the service runs with
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedStrategy {
    /// Newest eligible posts first
    Chronological,
    /// Scored and diversity-capped ordering over a recent candidate pool
    Ranked,
}
