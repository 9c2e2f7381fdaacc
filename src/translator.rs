//! Phrase translators used by the markdown generator.
//!
//! Anything that maps `(phrase, locale)` to text can drive document
//! generation: a plain closure, the [`Reconciler`] (cache + provider), or a
//! [`LocaleDictionary`] built from the locale files on disk.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use futures::future::{self, BoxFuture};
use futures::FutureExt;
use tracing::{debug, warn};

use crate::error::{ProviderError, StoreError};
use crate::reconcile::{PhraseOutcome, Reconciler};
use crate::store::{LocaleFile, LocaleFileStore};

pub trait PhraseTranslator: Send + Sync {
    fn translate<'a>(
        &'a self,
        phrase: &'a str,
        locale: &'a str,
    ) -> BoxFuture<'a, Result<String, ProviderError>>;
}

impl<F> PhraseTranslator for F
where
    F: Fn(&str, &str) -> String + Send + Sync,
{
    fn translate<'a>(
        &'a self,
        phrase: &'a str,
        locale: &'a str,
    ) -> BoxFuture<'a, Result<String, ProviderError>> {
        future::ready(Ok(self(phrase, locale))).boxed()
    }
}

/// Documents go through the same cache and provider as locale files. A
/// phrase that times out is left in the source language.
impl PhraseTranslator for Reconciler {
    fn translate<'a>(
        &'a self,
        phrase: &'a str,
        locale: &'a str,
    ) -> BoxFuture<'a, Result<String, ProviderError>> {
        async move {
            match self.translate_phrase(phrase, locale).await? {
                PhraseOutcome::Translated(translation) => Ok(translation),
                PhraseOutcome::TimedOut => Ok(phrase.to_string()),
            }
        }
        .boxed()
    }
}

#[derive(Debug, Default)]
struct DictionaryState {
    files: BTreeMap<String, LocaleFile>,
    dirty: BTreeSet<String>,
}

/// Looks phrases up in the locale files.
///
/// Unknown phrases translate to themselves and are recorded as identity
/// entries, so the next reconciliation run sends them to the provider once
/// [`LocaleDictionary::persist_missing`] has saved them.
#[derive(Debug)]
pub struct LocaleDictionary {
    store: LocaleFileStore,
    state: Mutex<DictionaryState>,
}

impl LocaleDictionary {
    pub async fn load<I, S>(store: LocaleFileStore, locales: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut files = BTreeMap::new();
        for locale in locales {
            let locale = locale.into();
            let file = store.load(&locale).await;
            files.insert(locale, file);
        }
        Self {
            store,
            state: Mutex::new(DictionaryState {
                files,
                dirty: BTreeSet::new(),
            }),
        }
    }

    /// Look a phrase up, recording it if it is unknown.
    pub fn lookup(&self, phrase: &str, locale: &str) -> String {
        let Ok(mut state) = self.state.lock() else {
            return phrase.to_string();
        };
        let file = state.files.entry(locale.to_string()).or_default();
        if let Some(value) = file.get(phrase) {
            return value.clone();
        }
        debug!("No {} entry for {:?}, recording it", locale, phrase);
        file.insert(phrase.to_string(), phrase.to_string());
        state.dirty.insert(locale.to_string());
        phrase.to_string()
    }

    /// Locales that gained entries since loading or the last save.
    pub fn dirty_locales(&self) -> Vec<String> {
        self.state
            .lock()
            .map(|state| state.dirty.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Save every locale that gained entries. Returns the saved locales.
    pub async fn persist_missing(&self) -> Result<Vec<String>, StoreError> {
        let pending: Vec<(String, LocaleFile)> = match self.state.lock() {
            Ok(mut state) => {
                let dirty = std::mem::take(&mut state.dirty);
                dirty
                    .into_iter()
                    .filter_map(|locale| {
                        let file = state.files.get(&locale)?.clone();
                        Some((locale, file))
                    })
                    .collect()
            }
            Err(_) => {
                warn!("Locale dictionary state is poisoned, nothing persisted");
                return Ok(Vec::new());
            }
        };

        let mut saved = Vec::with_capacity(pending.len());
        for (locale, file) in pending {
            self.store.save(&locale, &file).await?;
            saved.push(locale);
        }
        Ok(saved)
    }
}

impl PhraseTranslator for LocaleDictionary {
    fn translate<'a>(
        &'a self,
        phrase: &'a str,
        locale: &'a str,
    ) -> BoxFuture<'a, Result<String, ProviderError>> {
        future::ready(Ok(self.lookup(phrase, locale))).boxed()
    }
}
