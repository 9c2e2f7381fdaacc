use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::error::ConfigError;
use crate::phrases::PhraseSet;

/// Per-phrase deadline applied to provider calls unless configured otherwise.
pub const DEFAULT_PHRASE_TIMEOUT: Duration = Duration::from_secs(20);

/// What happens to the rest of a locale when one phrase fails to translate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Abandon the locale's remaining phrases on the first provider error.
    #[default]
    FailFast,
    /// Keep translating, then report every error once the locale settles.
    CollectErrors,
}

impl FromStr for FailurePolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail-fast" | "fail_fast" | "failfast" => Ok(FailurePolicy::FailFast),
            "collect" | "collect-errors" | "collect_errors" => Ok(FailurePolicy::CollectErrors),
            other => bail!("Unknown failure policy: '{}'", other),
        }
    }
}

/// How the phrases of one locale are sent to the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PhraseScheduling {
    /// One phrase at a time; the locale file is saved after each translation.
    #[default]
    Sequential,
    /// All phrases at once; the locale file is saved once they settle.
    Parallel,
}

impl FromStr for PhraseScheduling {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequential" => Ok(PhraseScheduling::Sequential),
            "parallel" => Ok(PhraseScheduling::Parallel),
            other => bail!("Unknown phrase scheduling: '{}'", other),
        }
    }
}

/// Which translation provider the binary talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Google,
    OpenAi,
}

impl FromStr for ProviderKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "google" => Ok(ProviderKind::Google),
            "openai" => Ok(ProviderKind::OpenAi),
            other => bail!("Unknown translation provider: '{}'", other),
        }
    }
}

/// Settings for one reconciliation engine.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Locales to reconcile, in processing order.
    pub locales: Vec<String>,
    pub default_locale: String,
    /// Directory holding `<locale>.json` files.
    pub directory: PathBuf,
    pub phrases: Option<PhraseSet>,
    /// `None` lets provider calls run as long as they need.
    pub phrase_timeout: Option<Duration>,
    pub failure_policy: FailurePolicy,
    pub scheduling: PhraseScheduling,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            locales: vec!["en".to_string()],
            default_locale: "en".to_string(),
            directory: PathBuf::from("locales"),
            phrases: None,
            phrase_timeout: Some(DEFAULT_PHRASE_TIMEOUT),
            failure_policy: FailurePolicy::default(),
            scheduling: PhraseScheduling::default(),
        }
    }
}

impl SyncConfig {
    pub fn with_locales<I, S>(mut self, locales: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.locales = locales.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_default_locale(mut self, locale: impl Into<String>) -> Self {
        self.default_locale = locale.into();
        self
    }

    pub fn with_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = directory.into();
        self
    }

    pub fn with_phrases(mut self, phrases: PhraseSet) -> Self {
        self.phrases = Some(phrases);
        self
    }

    pub fn with_phrase_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.phrase_timeout = timeout;
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn with_scheduling(mut self, scheduling: PhraseScheduling) -> Self {
        self.scheduling = scheduling;
        self
    }

    /// Check everything except the phrase catalog, which the engine takes
    /// ownership of separately.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.locales.is_empty() {
            return Err(ConfigError::NoLocales);
        }
        if !self.locales.contains(&self.default_locale) {
            return Err(ConfigError::UnknownDefaultLocale(
                self.default_locale.clone(),
            ));
        }
        Ok(())
    }
}

/// Settings for the `lingua-sync` binary, read from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub environment: String,

    // Catalog and locale files
    pub phrases_file: String,
    pub locales: Vec<String>,
    pub default_locale: String,
    pub directory: String,

    // Provider
    pub provider: ProviderKind,
    pub google_api_key: Option<String>,
    pub google_api_url: Option<String>,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_api_url: Option<String>,

    // Cache
    pub database_url: Option<String>,
    pub cache_prefix: String,

    // Reconciliation
    pub phrase_timeout: Option<Duration>,
    pub failure_policy: FailurePolicy,
    pub scheduling: PhraseScheduling,

    // Markdown
    pub markdown: bool,
    pub markdown_root: String,
    pub heading_links: bool,
}

fn optional_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn bool_var(name: &str, default: bool) -> bool {
    match optional_var(name) {
        Some(v) => matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        None => default,
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let environment = optional_var("LINGUA_ENV").unwrap_or_else(|| "development".to_string());

        let provider: ProviderKind = optional_var("LINGUA_PROVIDER")
            .unwrap_or_else(|| "google".to_string())
            .parse()?;

        let google_api_key = optional_var("GOOGLE_TRANSLATE_API_KEY");
        let openai_api_key = optional_var("OPENAI_API_KEY");
        match provider {
            ProviderKind::Google if google_api_key.is_none() => {
                bail!("GOOGLE_TRANSLATE_API_KEY not set")
            }
            ProviderKind::OpenAi if openai_api_key.is_none() => bail!("OPENAI_API_KEY not set"),
            _ => {}
        }

        let phrase_timeout = match optional_var("LINGUA_PHRASE_TIMEOUT_SECS") {
            Some(v) => {
                let secs: u64 = v
                    .trim()
                    .parse()
                    .context("LINGUA_PHRASE_TIMEOUT_SECS must be a whole number of seconds")?;
                (secs > 0).then(|| Duration::from_secs(secs))
            }
            None => Some(DEFAULT_PHRASE_TIMEOUT),
        };

        Ok(Self {
            cache_prefix: optional_var("LINGUA_CACHE_PREFIX")
                .unwrap_or_else(|| format!("lingua_sync_{}", environment.to_lowercase())),
            environment,

            // Catalog and locale files
            phrases_file: std::env::var("LINGUA_PHRASES_FILE")
                .context("LINGUA_PHRASES_FILE not set")?,
            locales: optional_var("LINGUA_LOCALES")
                .unwrap_or_else(|| "en".to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            default_locale: optional_var("LINGUA_DEFAULT_LOCALE")
                .unwrap_or_else(|| "en".to_string()),
            directory: optional_var("LINGUA_DIRECTORY").unwrap_or_else(|| "locales".to_string()),

            // Provider
            provider,
            google_api_key,
            google_api_url: optional_var("GOOGLE_TRANSLATE_API_URL"),
            openai_api_key,
            openai_model: optional_var("OPENAI_MODEL")
                .unwrap_or_else(|| "gpt-4o-mini".to_string()),
            openai_api_url: optional_var("OPENAI_API_URL"),

            // Cache
            database_url: optional_var("DATABASE_URL"),

            // Reconciliation
            phrase_timeout,
            failure_policy: optional_var("LINGUA_FAILURE_POLICY")
                .map(|v| v.parse::<FailurePolicy>())
                .transpose()?
                .unwrap_or_default(),
            scheduling: optional_var("LINGUA_PHRASE_SCHEDULING")
                .map(|v| v.parse::<PhraseScheduling>())
                .transpose()?
                .unwrap_or_default(),

            // Markdown
            markdown: bool_var("LINGUA_MARKDOWN", false),
            markdown_root: optional_var("LINGUA_MARKDOWN_ROOT").unwrap_or_else(|| ".".to_string()),
            heading_links: bool_var("LINGUA_HEADING_LINKS", true),
        })
    }

    /// Engine settings derived from this configuration, with the catalog
    /// still to be attached.
    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig::default()
            .with_locales(self.locales.clone())
            .with_default_locale(self.default_locale.clone())
            .with_directory(&self.directory)
            .with_phrase_timeout(self.phrase_timeout)
            .with_failure_policy(self.failure_policy)
            .with_scheduling(self.scheduling)
    }
}
