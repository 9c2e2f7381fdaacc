//! Localized copies of markdown documents.
//!
//! Every discovered document is written once per non-default locale, next to
//! the source, with its text nodes run through a [`PhraseTranslator`].
//! Copies are independent: a failed file or locale does not stop the others
//! from being written.

mod discovery;
mod filename;
mod transform;

use std::path::{Path, PathBuf};

use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::error::DocumentError;
use crate::translator::PhraseTranslator;

pub use discovery::{default_exclude, DiscoveryOptions, DEFAULT_INCLUDE};
pub use filename::localized_file_name;
pub use transform::{
    expand_shortcodes, should_translate, slugify, split_whitespace, translate_document,
    RenderOptions, Slugger,
};

#[derive(Debug, Clone)]
pub struct MarkdownGenerator {
    locales: Vec<String>,
    default_locale: String,
    discovery: DiscoveryOptions,
    render: RenderOptions,
}

impl MarkdownGenerator {
    pub fn new<I, S>(root: impl Into<PathBuf>, locales: I, default_locale: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            locales: locales.into_iter().map(Into::into).collect(),
            default_locale: default_locale.into(),
            discovery: DiscoveryOptions::new(root),
            render: RenderOptions::default(),
        }
    }

    pub fn with_discovery(mut self, discovery: DiscoveryOptions) -> Self {
        self.discovery = discovery;
        self
    }

    pub fn with_render_options(mut self, render: RenderOptions) -> Self {
        self.render = render;
        self
    }

    pub fn discovery(&self) -> &DiscoveryOptions {
        &self.discovery
    }

    /// Locales that get a generated copy: everything but the default.
    pub fn target_locales(&self) -> impl Iterator<Item = &str> {
        self.locales
            .iter()
            .map(String::as_str)
            .filter(move |locale| *locale != self.default_locale)
    }

    /// Localize every discovered document. Returns the written paths.
    pub async fn generate(
        &self,
        translator: &dyn PhraseTranslator,
    ) -> Result<Vec<PathBuf>, DocumentError> {
        let files = self.discovery.discover()?;
        if files.is_empty() {
            info!("No markdown documents found under {}", self.discovery.root.display());
            return Ok(Vec::new());
        }

        let results = join_all(files.iter().map(|file| self.localize_file(file, translator))).await;
        let written = settle(results)?.into_iter().flatten().collect::<Vec<_>>();

        info!(
            "Generated {} localized document(s) from {} source file(s)",
            written.len(),
            files.len()
        );
        Ok(written)
    }

    /// Write one localized copy of `path` per target locale.
    pub async fn localize_file(
        &self,
        path: &Path,
        translator: &dyn PhraseTranslator,
    ) -> Result<Vec<PathBuf>, DocumentError> {
        let source = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| DocumentError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        let results = join_all(
            self.target_locales()
                .map(|locale| self.write_localized(path, &source, locale, translator)),
        )
        .await;
        settle(results)
    }

    async fn write_localized(
        &self,
        path: &Path,
        source: &str,
        locale: &str,
        translator: &dyn PhraseTranslator,
    ) -> Result<PathBuf, DocumentError> {
        let rendered = translate_document(path, source, locale, translator, &self.render).await?;
        let output = localized_file_name(path, locale);
        tokio::fs::write(&output, rendered)
            .await
            .map_err(|source| DocumentError::Write {
                path: output.clone(),
                source,
            })?;
        debug!("Wrote {}", output.display());
        Ok(output)
    }
}

/// Wait for every result, keeping the successes. Fails with the first error
/// once all have settled; the rest are logged.
fn settle<T>(results: Vec<Result<T, DocumentError>>) -> Result<Vec<T>, DocumentError> {
    let mut done = Vec::with_capacity(results.len());
    let mut first_error = None;
    for result in results {
        match result {
            Ok(value) => done.push(value),
            Err(e) if first_error.is_none() => first_error = Some(e),
            Err(e) => warn!("{}", e),
        }
    }
    match first_error {
        Some(e) => Err(e),
        None => Ok(done),
    }
}
