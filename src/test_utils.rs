//! Shared helpers for unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::error::ProviderError;
use crate::provider::TranslationProvider;
use crate::store::LocaleFile;

pub(crate) fn locale_file(entries: &[(&str, &str)]) -> LocaleFile {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Scripted provider: answers from a table keyed by `(phrase, locale)`.
/// Unknown pairs fail with a 400.
#[derive(Default)]
pub(crate) struct FakeProvider {
    answers: HashMap<(String, String), Result<String, ProviderError>>,
    delays: HashMap<String, Duration>,
    calls: AtomicUsize,
    requested: Mutex<Vec<(String, String)>>,
}

impl FakeProvider {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with(mut self, phrase: &str, locale: &str, translation: &str) -> Self {
        self.answers.insert(
            (phrase.to_string(), locale.to_string()),
            Ok(translation.to_string()),
        );
        self
    }

    pub(crate) fn failing(mut self, phrase: &str, locale: &str) -> Self {
        self.answers.insert(
            (phrase.to_string(), locale.to_string()),
            Err(ProviderError::from_http(500, r#"{"error": {"message": "boom"}}"#)),
        );
        self
    }

    pub(crate) fn delayed(mut self, phrase: &str, delay: Duration) -> Self {
        self.delays.insert(phrase.to_string(), delay);
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn requested(&self) -> Vec<(String, String)> {
        self.requested
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

impl TranslationProvider for FakeProvider {
    fn translate<'a>(
        &'a self,
        text: &'a str,
        target_locale: &'a str,
    ) -> BoxFuture<'a, Result<String, ProviderError>> {
        async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Ok(mut requested) = self.requested.lock() {
                requested.push((text.to_string(), target_locale.to_string()));
            }
            if let Some(delay) = self.delays.get(text) {
                tokio::time::sleep(*delay).await;
            }
            self.answers
                .get(&(text.to_string(), target_locale.to_string()))
                .cloned()
                .unwrap_or_else(|| Err(ProviderError::from_http(400, "unexpected phrase")))
        }
        .boxed()
    }
}
