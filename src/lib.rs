//! Keeps JSON locale files in step with a phrase catalog and writes
//! localized copies of markdown documents.

pub mod cache;
pub mod config;
pub mod error;
pub mod locales;
pub mod markdown;
pub mod metrics;
pub mod phrases;
pub mod provider;
pub mod reconcile;
pub mod retry;
pub mod store;
pub mod translator;

#[cfg(test)]
mod test_utils;

pub use cache::{cache_key, CacheStore, MemoryCache, PgCache};
pub use config::{FailurePolicy, PhraseScheduling, SyncConfig};
pub use error::{CacheError, ConfigError, DocumentError, ProviderError, ReconcileError, StoreError};
pub use markdown::{DiscoveryOptions, MarkdownGenerator, RenderOptions};
pub use metrics::{MetricsReport, TranslationMetrics};
pub use phrases::PhraseSet;
pub use provider::{GoogleTranslateProvider, OpenAiProvider, TranslationProvider};
pub use reconcile::{PhraseOutcome, ReconcileReport, Reconciler};
pub use store::{LocaleFile, LocaleFileStore};
pub use translator::{LocaleDictionary, PhraseTranslator};
