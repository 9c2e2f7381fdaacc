use std::collections::HashMap;

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::sync::RwLock;

use super::CacheStore;
use crate::error::CacheError;

/// In-process cache backed by a map.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl CacheStore for MemoryCache {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<String>, CacheError>> {
        async move { Ok(self.entries.read().await.get(key).cloned()) }.boxed()
    }

    fn set<'a>(&'a self, key: &'a str, value: &'a str) -> BoxFuture<'a, Result<(), CacheError>> {
        async move {
            self.entries
                .write()
                .await
                .insert(key.to_string(), value.to_string());
            Ok(())
        }
        .boxed()
    }
}
