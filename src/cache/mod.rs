//! Translation cache: remembers provider results per `(locale, phrase)` so a
//! phrase is only ever sent to the provider once per locale.
//!
//! - `memory`: process-local map, mostly for tests and one-shot runs
//! - `postgres`: shared table, survives across runs

mod memory;
mod postgres;

pub use memory::MemoryCache;
pub use postgres::PgCache;

use futures::future::BoxFuture;

use crate::error::CacheError;

/// Storage for previously fetched translations.
///
/// Keys come from [`cache_key`]. Writes are idempotent, so concurrent
/// writers for the same key are harmless.
pub trait CacheStore: Send + Sync {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<String>, CacheError>>;

    fn set<'a>(&'a self, key: &'a str, value: &'a str) -> BoxFuture<'a, Result<(), CacheError>>;
}

/// Number of hex characters kept from the digest.
const HASH_LEN: usize = 16;

/// Stable content hash of a phrase, as lowercase hex.
pub fn content_hash(phrase: &str) -> String {
    let digest = blake3::hash(phrase.as_bytes()).to_hex();
    digest.as_str()[..HASH_LEN].to_string()
}

/// Cache key for a phrase in a locale: `"<locale>:<hash>"`.
pub fn cache_key(locale: &str, phrase: &str) -> String {
    format!("{}:{}", locale, content_hash(phrase))
}
