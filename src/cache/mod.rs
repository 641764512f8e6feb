// Response cache module
// Author: kelexine (https://github.com/kelexine)

pub mod key;
pub mod models;
pub mod response_cache;

pub use key::{derive_key, CacheKeyDeriver};
pub use models::{CacheStats, CachedResponse};
pub use response_cache::ResponseCache;
