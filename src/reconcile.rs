//! The reconciliation engine: brings every locale file up to date with the
//! phrase catalog.
//!
//! For each locale, in the configured order and one locale at a time:
//!
//! 1. load the locale file (missing or malformed files start empty)
//! 2. add catalog phrases the file lacks, mapped to themselves
//! 3. queue every candidate phrase that still appears as a *value* in the
//!    file, i.e. is still an untranslated placeholder
//! 4. translate the queue through the cache and the provider, escaping `|`
//!    and saving the file as translations arrive
//!
//! A phrase whose real translation equals its source text looks
//! untranslated and is queued again on every run.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, error, info, warn};

use crate::cache::{cache_key, CacheStore};
use crate::config::{FailurePolicy, PhraseScheduling, SyncConfig};
use crate::error::{ConfigError, ProviderError, ReconcileError};
use crate::metrics::{MetricsReport, TranslationMetrics};
use crate::phrases::PhraseSet;
use crate::provider::TranslationProvider;
use crate::store::{LocaleFile, LocaleFileStore};

/// Result of translating one phrase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhraseOutcome {
    Translated(String),
    /// The provider did not answer before the deadline. The phrase stays a
    /// placeholder and is retried on the next run.
    TimedOut,
}

/// A locale that could not be fully reconciled.
#[derive(Debug)]
pub struct LocaleFailure {
    pub locale: String,
    /// The in-memory file as far as it got.
    pub file: LocaleFile,
    pub error: ReconcileError,
}

/// Everything one `reconcile` run produced.
#[derive(Debug, Default)]
pub struct ReconcileReport {
    /// Final contents per locale, including partially reconciled ones.
    pub files: BTreeMap<String, LocaleFile>,
    pub failures: Vec<LocaleFailure>,
    pub metrics: MetricsReport,
}

impl ReconcileReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn file(&self, locale: &str) -> Option<&LocaleFile> {
        self.files.get(locale)
    }
}

/// Replace `|` so i18n libraries don't read it as a plural/range separator.
pub fn escape_pipes(text: &str) -> String {
    text.replace('|', "&#124;")
}

/// Add each phrase missing from `file` as an identity entry. Existing
/// entries are never touched. Returns how many entries were added.
fn fill_missing(file: &mut LocaleFile, phrases: &PhraseSet) -> usize {
    let mut added = 0;
    for phrase in phrases.iter() {
        if !file.contains_key(phrase) {
            file.insert(phrase.to_string(), phrase.to_string());
            added += 1;
        }
    }
    added
}

/// Unique catalog phrases followed by the default-locale values.
fn candidate_phrases(phrases: &PhraseSet, default_file: &LocaleFile) -> Vec<String> {
    let mut seen = HashSet::new();
    phrases
        .iter()
        .chain(default_file.values().map(String::as_str))
        .filter(|phrase| seen.insert(*phrase))
        .map(str::to_string)
        .collect()
}

/// Candidates still stored verbatim as a value in `file`.
fn pending_phrases(candidates: &[String], file: &LocaleFile) -> Vec<String> {
    let values: HashSet<&str> = file.values().map(String::as_str).collect();
    candidates
        .iter()
        .filter(|phrase| values.contains(phrase.as_str()))
        .cloned()
        .collect()
}

/// Builder for [`Reconciler`]. `build` fails if a collaborator is missing.
pub struct ReconcilerBuilder {
    config: SyncConfig,
    provider: Option<Arc<dyn TranslationProvider>>,
    cache: Option<Arc<dyn CacheStore>>,
}

impl ReconcilerBuilder {
    pub fn provider(mut self, provider: Arc<dyn TranslationProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn cache(mut self, cache: Arc<dyn CacheStore>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn build(self) -> Result<Reconciler, ConfigError> {
        let mut config = self.config;
        let phrases = config
            .phrases
            .take()
            .ok_or(ConfigError::MissingPhraseCatalog)?;
        let provider = self.provider.ok_or(ConfigError::MissingProvider)?;
        config.validate()?;

        Ok(Reconciler {
            store: LocaleFileStore::new(&config.directory),
            config,
            phrases,
            provider,
            cache: self.cache,
            metrics: TranslationMetrics::new(),
        })
    }
}

/// Keeps locale files in step with the phrase catalog.
pub struct Reconciler {
    config: SyncConfig,
    phrases: PhraseSet,
    store: LocaleFileStore,
    provider: Arc<dyn TranslationProvider>,
    cache: Option<Arc<dyn CacheStore>>,
    metrics: TranslationMetrics,
}

impl Reconciler {
    pub fn builder(config: SyncConfig) -> ReconcilerBuilder {
        ReconcilerBuilder {
            config,
            provider: None,
            cache: None,
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn phrases(&self) -> &PhraseSet {
        &self.phrases
    }

    pub fn store(&self) -> &LocaleFileStore {
        &self.store
    }

    /// Lifetime counters for this engine.
    pub fn metrics(&self) -> MetricsReport {
        self.metrics.report()
    }

    /// Reconcile every configured locale, in order.
    ///
    /// Never fails as a whole: a locale that fails is reported in
    /// [`ReconcileReport::failures`] and the next locale still runs.
    pub async fn reconcile(&self) -> ReconcileReport {
        let before = self.metrics.report();
        let default_file = self.store.load(&self.config.default_locale).await;
        let candidates = candidate_phrases(&self.phrases, &default_file);

        let mut report = ReconcileReport::default();
        for locale in &self.config.locales {
            match self.reconcile_locale(locale, &candidates).await {
                Ok(file) => {
                    report.files.insert(locale.clone(), file);
                }
                Err(failure) => {
                    error!("Failed to reconcile locale {}: {}", locale, failure.error);
                    report.files.insert(locale.clone(), failure.file.clone());
                    report.failures.push(failure);
                }
            }
        }

        report.metrics = self.metrics.report().since(&before);
        info!(
            "Reconciled {} locale(s), {} failed. {}",
            self.config.locales.len(),
            report.failures.len(),
            report.metrics.format()
        );
        report
    }

    /// Reconcile a single locale against precomputed candidate phrases.
    async fn reconcile_locale(
        &self,
        locale: &str,
        candidates: &[String],
    ) -> Result<LocaleFile, LocaleFailure> {
        let mut file = self.store.load(locale).await;
        let added = fill_missing(&mut file, &self.phrases);
        if added > 0 {
            debug!("Added {} missing phrase(s) to {}", added, locale);
        }

        let queue = if locale == self.config.default_locale {
            Vec::new()
        } else {
            pending_phrases(candidates, &file)
        };

        if queue.is_empty() {
            if added > 0 {
                if let Err(e) = self.persist(locale, &file).await {
                    return Err(self.failure(locale, file, e.into()));
                }
            }
            info!("Locale {} is up to date", locale);
            return Ok(file);
        }

        info!("Locale {}: {} phrase(s) need translation", locale, queue.len());
        let result = match self.config.scheduling {
            PhraseScheduling::Sequential => self.translate_sequential(locale, &queue, &mut file).await,
            PhraseScheduling::Parallel => self.translate_parallel(locale, &queue, &mut file).await,
        };

        match result {
            Ok(written) => {
                if !written && added > 0 {
                    if let Err(e) = self.persist(locale, &file).await {
                        return Err(self.failure(locale, file, e.into()));
                    }
                }
                Ok(file)
            }
            Err(error) => {
                // Keep new placeholders on disk even when nothing was translated.
                if added > 0 {
                    if let Err(e) = self.persist(locale, &file).await {
                        warn!("Failed to save placeholders for {}: {}", locale, e);
                    }
                }
                Err(self.failure(locale, file, error))
            }
        }
    }

    /// One phrase at a time, saving after every translation so progress
    /// survives an interruption. Returns whether the file was written.
    async fn translate_sequential(
        &self,
        locale: &str,
        queue: &[String],
        file: &mut LocaleFile,
    ) -> Result<bool, ReconcileError> {
        let mut written = false;
        let mut errors = Vec::new();

        for phrase in queue {
            match self.translate_phrase(phrase, locale).await {
                Ok(PhraseOutcome::Translated(translation)) => {
                    file.insert(phrase.clone(), escape_pipes(&translation));
                    self.persist(locale, file).await?;
                    written = true;
                }
                Ok(PhraseOutcome::TimedOut) => {}
                Err(e) => match self.config.failure_policy {
                    FailurePolicy::FailFast => return Err(e.into()),
                    FailurePolicy::CollectErrors => {
                        warn!("Failed to translate {:?} to {}: {}", phrase, locale, e);
                        errors.push(e);
                    }
                },
            }
        }

        if errors.is_empty() {
            Ok(written)
        } else {
            Err(ReconcileError::Providers(errors))
        }
    }

    /// Every phrase at once, saving a single time after all calls settle.
    /// Successful translations are kept even when some phrases fail.
    async fn translate_parallel(
        &self,
        locale: &str,
        queue: &[String],
        file: &mut LocaleFile,
    ) -> Result<bool, ReconcileError> {
        let results = join_all(
            queue
                .iter()
                .map(|phrase| self.translate_phrase(phrase, locale)),
        )
        .await;

        let mut changed = false;
        let mut errors = Vec::new();
        for (phrase, result) in queue.iter().zip(results) {
            match result {
                Ok(PhraseOutcome::Translated(translation)) => {
                    file.insert(phrase.clone(), escape_pipes(&translation));
                    changed = true;
                }
                Ok(PhraseOutcome::TimedOut) => {}
                Err(e) => {
                    warn!("Failed to translate {:?} to {}: {}", phrase, locale, e);
                    errors.push(e);
                }
            }
        }

        if changed {
            self.persist(locale, file).await?;
        }

        if errors.is_empty() {
            return Ok(changed);
        }
        match self.config.failure_policy {
            FailurePolicy::FailFast => Err(ReconcileError::Provider(errors.swap_remove(0))),
            FailurePolicy::CollectErrors => Err(ReconcileError::Providers(errors)),
        }
    }

    /// Translate one phrase through the cache and the provider, under the
    /// configured deadline. The result is not pipe-escaped.
    pub async fn translate_phrase(
        &self,
        phrase: &str,
        locale: &str,
    ) -> Result<PhraseOutcome, ProviderError> {
        let key = cache_key(locale, phrase);

        if let Some(cache) = &self.cache {
            match cache.get(&key).await {
                Ok(Some(translation)) => {
                    self.metrics.record_cache_hit();
                    debug!("Cache hit for {} ({:?})", key, phrase);
                    return Ok(PhraseOutcome::Translated(translation));
                }
                Ok(None) => self.metrics.record_cache_miss(),
                Err(e) => {
                    self.metrics.record_cache_miss();
                    warn!("Cache lookup for {} failed, asking provider: {}", key, e);
                }
            }
        }

        debug!("Requesting translation of {:?} to {}", phrase, locale);
        self.metrics.record_provider_call();
        let call = self.provider.translate(phrase, locale);
        let result = match self.config.phrase_timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(result) => result,
                Err(_) => {
                    self.metrics.record_timeout();
                    warn!(
                        "Translation of {:?} to {} timed out after {:?}, will retry next run",
                        phrase, locale, limit
                    );
                    return Ok(PhraseOutcome::TimedOut);
                }
            },
            None => call.await,
        };

        let translation = match result {
            Ok(translation) => translation,
            Err(e) => {
                self.metrics.record_provider_failure();
                return Err(e);
            }
        };
        debug!("Got translation {:?} for {}", translation, key);

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.set(&key, &translation).await {
                warn!("Failed to cache translation {}: {}", key, e);
            }
        }

        Ok(PhraseOutcome::Translated(translation))
    }

    async fn persist(&self, locale: &str, file: &LocaleFile) -> Result<(), crate::error::StoreError> {
        self.store.save(locale, file).await?;
        self.metrics.record_file_written();
        Ok(())
    }

    fn failure(&self, locale: &str, file: LocaleFile, error: ReconcileError) -> LocaleFailure {
        LocaleFailure {
            locale: locale.to_string(),
            file,
            error,
        }
    }
}
