use std::sync::Arc;

use anyhow::{bail, Context, Result};
use lingua_sync::config::{Config, ProviderKind};
use lingua_sync::{
    CacheStore, GoogleTranslateProvider, MarkdownGenerator, OpenAiProvider, PgCache, PhraseSet,
    Reconciler, RenderOptions, TranslationProvider,
};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in CI)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("lingua_sync=info".parse()?),
        )
        .init();

    info!("Starting locale sync");

    let config = Config::from_env()?;

    let phrases = PhraseSet::load(&config.phrases_file).await?;
    info!(
        "Loaded {} phrase(s) from {}",
        phrases.len(),
        config.phrases_file
    );

    let provider = build_provider(&config)?;
    let cache = build_cache(&config).await;

    let mut builder = Reconciler::builder(config.sync_config().with_phrases(phrases))
        .provider(provider);
    if let Some(cache) = cache {
        builder = builder.cache(cache);
    }
    let reconciler = builder.build().context("Invalid sync configuration")?;

    // Step 1: Reconcile locale files
    info!(
        "Reconciling {} locale(s) in {}",
        config.locales.len(),
        config.directory
    );
    let report = reconciler.reconcile().await;

    for failure in &report.failures {
        error!("Locale {} failed: {}", failure.locale, failure.error);
    }

    // Step 2: Localize markdown documents
    if config.markdown {
        info!("Generating localized markdown under {}", config.markdown_root);
        let generator = MarkdownGenerator::new(
            &config.markdown_root,
            config.locales.clone(),
            config.default_locale.clone(),
        )
        .with_render_options(RenderOptions {
            heading_links: config.heading_links,
        });
        let written = generator.generate(&reconciler).await?;
        info!("Wrote {} localized document(s)", written.len());
    }

    if !report.is_success() {
        bail!("{} locale(s) failed to reconcile", report.failures.len());
    }

    info!("Locale sync finished");
    Ok(())
}

fn build_provider(config: &Config) -> Result<Arc<dyn TranslationProvider>> {
    match config.provider {
        ProviderKind::Google => {
            let api_key = config
                .google_api_key
                .clone()
                .context("GOOGLE_TRANSLATE_API_KEY not set")?;
            let mut provider = GoogleTranslateProvider::new(api_key)
                .with_source_locale(config.default_locale.clone());
            if let Some(url) = &config.google_api_url {
                provider = provider.with_api_url(url.clone());
            }
            Ok(Arc::new(provider))
        }
        ProviderKind::OpenAi => {
            let api_key = config
                .openai_api_key
                .clone()
                .context("OPENAI_API_KEY not set")?;
            let mut provider = OpenAiProvider::new(api_key).with_model(config.openai_model.clone());
            if let Some(url) = &config.openai_api_url {
                provider = provider.with_api_url(url.clone());
            }
            Ok(Arc::new(provider))
        }
    }
}

/// Without a reachable database every phrase goes to the provider.
async fn build_cache(config: &Config) -> Option<Arc<dyn CacheStore>> {
    let url = config.database_url.as_deref()?;
    match PgCache::connect(url, config.cache_prefix.clone()).await {
        Ok(cache) => {
            info!("Using Postgres translation cache ({})", config.cache_prefix);
            Some(Arc::new(cache))
        }
        Err(e) => {
            warn!("Translation cache unavailable, continuing without it: {}", e);
            None
        }
    }
}
