//! Error types shared across the crate.
//!
//! Library code returns these typed errors; the binary wraps them in
//! `anyhow` at the edge.

use std::path::PathBuf;

use thiserror::Error;

/// Invalid or incomplete configuration. Raised when a `Reconciler` is built.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("a phrase catalog is required")]
    MissingPhraseCatalog,

    #[error("a translation provider is required")]
    MissingProvider,

    #[error("at least one locale must be configured")]
    NoLocales,

    #[error("default locale '{0}' is not in the configured locales")]
    UnknownDefaultLocale(String),
}

/// A failed call to a translation provider.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    /// The provider answered with a non-success status.
    #[error("provider error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The request never produced a response (connection refused, DNS, ...).
    #[error("provider request failed: {0}")]
    Transport(String),

    /// The response body could not be decoded.
    #[error("malformed provider response: {0}")]
    MalformedResponse(String),

    /// The provider answered successfully but returned no translation.
    #[error("provider returned no translation")]
    EmptyResult,
}

impl ProviderError {
    /// Build an error from an HTTP status and raw body.
    ///
    /// Bodies shaped like `{"error": {"message": "..."}}` are unwrapped into
    /// the plain message; anything else is kept verbatim.
    pub fn from_http(status: u16, body: &str) -> Self {
        let message = unwrap_error_envelope(body).unwrap_or_else(|| body.trim().to_string());
        ProviderError::Api { status, message }
    }

    /// 429, 5xx and transport failures are transient. Other 4xx are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::Api { status, .. } => *status == 429 || *status >= 500,
            ProviderError::Transport(_) => true,
            ProviderError::MalformedResponse(_) => true,
            ProviderError::EmptyResult => false,
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ProviderError::MalformedResponse(err.to_string())
        } else {
            ProviderError::Transport(err.to_string())
        }
    }
}

fn unwrap_error_envelope(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("error")?
        .get("message")?
        .as_str()
        .map(str::to_string)
}

/// Failure while persisting a locale file.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize locale '{locale}': {source}")]
    Serialize {
        locale: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Failure of the cache backend. Never fatal to reconciliation.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend error: {0}")]
    Backend(#[from] sqlx::Error),
}

/// Why a single locale could not be fully reconciled.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("{} phrase(s) failed to translate; first: {}", .0.len(), first_message(.0))]
    Providers(Vec<ProviderError>),

    #[error(transparent)]
    Store(#[from] StoreError),
}

fn first_message(errors: &[ProviderError]) -> String {
    errors
        .first()
        .map(ToString::to_string)
        .unwrap_or_default()
}

/// Failure while generating localized markdown.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to render markdown for {path}")]
    Render { path: PathBuf },

    #[error("failed to translate text in {path}: {source}")]
    Translate {
        path: PathBuf,
        #[source]
        source: ProviderError,
    },

    #[error("invalid discovery pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("failed to build glob set: {0}")]
    GlobSetBuild(#[from] globset::Error),
}
