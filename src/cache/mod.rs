//! In-memory result caching

mod store;

pub use store::{CacheConfig, ResultCache};
