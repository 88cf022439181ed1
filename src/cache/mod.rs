//! Response caching
//!
//! Question-to-answer caching with frequency-ranked eviction. The public
//! surface is [`ResponseCache`]; it runs over any [`CacheStore`], with
//! [`RedisStore`] for production and [`MemoryStore`] for embedded use and
//! tests. Keys are normalized question text ([`normalize_question`]):
//! exact-intent matches only, no semantic lookup.
//!
//! Eviction ranks keys by a cumulative read+write frequency counter
//! rather than recency, so a rarely-changing answer that is asked often
//! stays resident indefinitely while storage stays bounded.

pub mod key;
pub mod redis;
pub mod response;
pub mod store;

pub use key::normalize_question;
pub use response::{CacheStats, ResponseCache};
pub use self::redis::RedisStore;
pub use store::{CacheStore, MemoryStore};
