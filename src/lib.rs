//! Atrium - backend gateway for a social content app
//!
//! Atrium authenticates requests, serves a ranked discovery feed, runs
//! post/user search over the document store, and proxies free text,
//! attachments, and quiz answers to an external generative-AI API with
//! retry, caching, and durable status tracking.
//!
//! ## Services
//!
//! - **Feed**: cursor-paginated discovery feed (chronological or ranked)
//! - **Search**: term-filtered post and user search
//! - **Analysis**: asynchronous quiz analysis plus synchronous free-text
//!   analysis via the generative API
//! - **Cache**: in-memory feed page cache and durable analysis cache

pub mod ai;
pub mod analysis;
pub mod auth;
pub mod cache;
pub mod config;
pub mod db;
pub mod feed;
pub mod routes;
pub mod search;
pub mod server;
pub mod types;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{AtriumError, Result};
