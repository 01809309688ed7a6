//! Generative AI client and retry machinery

mod client;
mod retry;

pub use client::{AiClient, AiClientConfig, MediaFetcher, Part, TextGenerator};
pub use retry::{retry_with_backoff, RetryPolicy};
