//! Integration tests for lingua-sync
//!
//! These tests drive the public API end to end: a phrase catalog, a locale
//! directory on disk, a provider (scripted or mocked over HTTP) and the
//! markdown generator.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use tempfile::TempDir;
use wiremock::{
    matchers::{method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

use lingua_sync::retry::RetryConfig;
use lingua_sync::{
    cache_key, CacheStore, GoogleTranslateProvider, LocaleDictionary, LocaleFileStore,
    MarkdownGenerator, MemoryCache, PhraseSet, ProviderError, Reconciler, RenderOptions,
    SyncConfig, TranslationProvider,
};

// ==================== Test Helpers ====================

/// Answers from a fixed table and counts every call.
#[derive(Default)]
struct TableProvider {
    answers: HashMap<(String, String), String>,
    calls: AtomicUsize,
}

impl TableProvider {
    fn with(mut self, phrase: &str, locale: &str, translation: &str) -> Self {
        self.answers
            .insert((phrase.to_string(), locale.to_string()), translation.to_string());
        self
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TranslationProvider for TableProvider {
    fn translate<'a>(
        &'a self,
        text: &'a str,
        target_locale: &'a str,
    ) -> BoxFuture<'a, Result<String, ProviderError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let answer = self
            .answers
            .get(&(text.to_string(), target_locale.to_string()))
            .cloned()
            .ok_or_else(|| ProviderError::from_http(400, "unknown phrase"));
        futures::future::ready(answer).boxed()
    }
}

fn sync_config(dir: &Path, locales: &[&str], phrases: &[&str]) -> SyncConfig {
    SyncConfig::default()
        .with_locales(locales.iter().copied())
        .with_default_locale(locales[0])
        .with_directory(dir)
        .with_phrases(phrases.iter().copied().collect::<PhraseSet>())
}

fn read_json(path: &Path) -> serde_json::Value {
    let text = std::fs::read_to_string(path).expect("Failed to read locale file");
    serde_json::from_str(&text).expect("Locale file is not valid JSON")
}

// ==================== Reconciliation ====================

#[tokio::test]
async fn test_hello_hola_from_empty_directory() {
    let dir = TempDir::new().unwrap();
    let provider = Arc::new(TableProvider::default().with("Hello", "es", "Hola"));

    let reconciler = Reconciler::builder(sync_config(dir.path(), &["en", "es"], &["Hello"]))
        .provider(provider.clone())
        .build()
        .unwrap();
    let report = reconciler.reconcile().await;

    assert!(report.is_success());
    assert_eq!(provider.calls(), 1);
    assert_eq!(
        read_json(&dir.path().join("en.json")),
        serde_json::json!({ "Hello": "Hello" })
    );
    assert_eq!(
        read_json(&dir.path().join("es.json")),
        serde_json::json!({ "Hello": "Hola" })
    );

    let raw = std::fs::read_to_string(dir.path().join("es.json")).unwrap();
    assert_eq!(raw, "{\n  \"Hello\": \"Hola\"\n}\n");
}

#[tokio::test]
async fn test_second_run_is_a_no_op() {
    let dir = TempDir::new().unwrap();
    let provider = Arc::new(TableProvider::default().with("Hello", "es", "Hola"));
    let reconciler = Reconciler::builder(sync_config(dir.path(), &["en", "es"], &["Hello"]))
        .provider(provider.clone())
        .build()
        .unwrap();

    reconciler.reconcile().await;
    let before = std::fs::read_to_string(dir.path().join("es.json")).unwrap();

    let second = reconciler.reconcile().await;

    assert!(second.is_success());
    assert_eq!(provider.calls(), 1);
    assert_eq!(second.metrics.provider_calls, 0);
    assert_eq!(second.metrics.files_written, 0);
    assert_eq!(
        std::fs::read_to_string(dir.path().join("es.json")).unwrap(),
        before
    );
}

#[tokio::test]
async fn test_gap_fill_keeps_existing_translations() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("es.json"),
        r#"{ "Hello": "Hola", "Legacy": "Antiguo" }"#,
    )
    .unwrap();
    let provider = Arc::new(TableProvider::default().with("Goodbye", "es", "Adiós"));

    let reconciler = Reconciler::builder(sync_config(
        dir.path(),
        &["en", "es"],
        &["Hello", "Goodbye"],
    ))
    .provider(provider.clone())
    .build()
    .unwrap();
    let report = reconciler.reconcile().await;

    assert!(report.is_success());
    assert_eq!(provider.calls(), 1);
    assert_eq!(
        read_json(&dir.path().join("es.json")),
        serde_json::json!({ "Goodbye": "Adiós", "Hello": "Hola", "Legacy": "Antiguo" })
    );
}

#[tokio::test]
async fn test_pipes_in_translations_are_escaped() {
    let dir = TempDir::new().unwrap();
    let provider = Arc::new(TableProvider::default().with("one | many", "fr", "un | plusieurs"));

    let reconciler = Reconciler::builder(sync_config(dir.path(), &["en", "fr"], &["one | many"]))
        .provider(provider)
        .build()
        .unwrap();
    reconciler.reconcile().await;

    assert_eq!(
        read_json(&dir.path().join("fr.json")),
        serde_json::json!({ "one | many": "un &#124; plusieurs" })
    );
}

#[tokio::test]
async fn test_warm_cache_skips_provider() {
    let dir = TempDir::new().unwrap();
    let cache = Arc::new(MemoryCache::new());
    cache
        .set(&cache_key("es", "Hello"), "Hola")
        .await
        .unwrap();
    let provider = Arc::new(TableProvider::default());

    let reconciler = Reconciler::builder(sync_config(dir.path(), &["en", "es"], &["Hello"]))
        .provider(provider.clone())
        .cache(cache)
        .build()
        .unwrap();
    let report = reconciler.reconcile().await;

    assert!(report.is_success());
    assert_eq!(provider.calls(), 0);
    assert_eq!(report.metrics.cache_hits, 1);
    assert_eq!(
        read_json(&dir.path().join("es.json")),
        serde_json::json!({ "Hello": "Hola" })
    );
}

#[tokio::test]
async fn test_failed_locale_does_not_stop_the_others() {
    let dir = TempDir::new().unwrap();
    let provider = Arc::new(TableProvider::default().with("Hello", "fr", "Bonjour"));

    let reconciler = Reconciler::builder(sync_config(
        dir.path(),
        &["en", "es", "fr"],
        &["Hello"],
    ))
    .provider(provider)
    .build()
    .unwrap();
    let report = reconciler.reconcile().await;

    assert!(!report.is_success());
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].locale, "es");
    assert_eq!(
        read_json(&dir.path().join("fr.json")),
        serde_json::json!({ "Hello": "Bonjour" })
    );
}

// ==================== Google provider over HTTP ====================

#[tokio::test]
async fn test_google_provider_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/language/translate/v2"))
        .and(query_param("key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": { "translations": [{ "translatedText": "Hola" }] }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = GoogleTranslateProvider::new("test-key")
        .with_api_url(format!("{}/language/translate/v2", server.uri()))
        .with_retry(RetryConfig::no_retry());

    let dir = TempDir::new().unwrap();
    let reconciler = Reconciler::builder(sync_config(dir.path(), &["en", "es"], &["Hello"]))
        .provider(Arc::new(provider))
        .build()
        .unwrap();
    let report = reconciler.reconcile().await;

    assert!(report.is_success());
    assert_eq!(
        read_json(&dir.path().join("es.json")),
        serde_json::json!({ "Hello": "Hola" })
    );
}

#[tokio::test]
async fn test_google_error_envelope_reaches_report() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403).set_body_string(
            r#"{"error": {"code": 403, "message": "Daily limit exceeded"}}"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let provider = GoogleTranslateProvider::new("test-key")
        .with_api_url(format!("{}/language/translate/v2", server.uri()));

    let dir = TempDir::new().unwrap();
    let reconciler = Reconciler::builder(sync_config(dir.path(), &["en", "es"], &["Hello"]))
        .provider(Arc::new(provider))
        .build()
        .unwrap();
    let report = reconciler.reconcile().await;

    assert_eq!(report.failures.len(), 1);
    let message = report.failures[0].error.to_string();
    assert!(message.contains("Daily limit exceeded"), "{message}");
    assert!(!message.contains("\"code\""), "{message}");
    // The placeholder is still on disk for the next run.
    assert_eq!(
        read_json(&dir.path().join("es.json")),
        serde_json::json!({ "Hello": "Hello" })
    );
}

// ==================== Markdown ====================

#[tokio::test]
async fn test_markdown_heading_translated_with_closure() {
    let dir = TempDir::new().unwrap();
    let docs = dir.path().join("docs");
    std::fs::create_dir_all(&docs).unwrap();
    std::fs::write(docs.join("name.md"), "# Hello\n").unwrap();

    let shout = |phrase: &str, _locale: &str| format!("{}!", phrase.to_uppercase());
    let generator = MarkdownGenerator::new(dir.path(), ["en", "fr"], "en")
        .with_render_options(RenderOptions {
            heading_links: false,
        });
    let written = generator.generate(&shout).await.unwrap();

    assert_eq!(written, vec![docs.join("name-fr.md")]);
    let output = std::fs::read_to_string(docs.join("name-fr.md")).unwrap();
    assert!(output.contains("# HELLO!"), "{output}");
}

#[tokio::test]
async fn test_markdown_from_reconciled_locale_files() {
    let dir = TempDir::new().unwrap();
    let locales = dir.path().join("locales");
    let docs = dir.path().join("docs");
    std::fs::create_dir_all(&docs).unwrap();
    std::fs::write(docs.join("guide.md"), "# Welcome\n\nRead the docs\n").unwrap();

    let provider = Arc::new(
        TableProvider::default()
            .with("Welcome", "es", "Bienvenido")
            .with("Read the docs", "es", "Lee la documentación"),
    );
    let reconciler = Reconciler::builder(sync_config(
        &locales,
        &["en", "es"],
        &["Welcome", "Read the docs"],
    ))
    .provider(provider.clone())
    .build()
    .unwrap();
    assert!(reconciler.reconcile().await.is_success());

    let dictionary = LocaleDictionary::load(LocaleFileStore::new(&locales), ["en", "es"]).await;
    let generator = MarkdownGenerator::new(dir.path(), ["en", "es"], "en");
    generator.generate(&dictionary).await.unwrap();

    let output = std::fs::read_to_string(docs.join("guide-es.md")).unwrap();
    assert!(output.contains("Bienvenido"), "{output}");
    assert!(output.contains("Lee la documentación"), "{output}");
    assert!(output.contains(r##"href="#welcome""##), "{output}");
    assert!(dictionary.dirty_locales().is_empty());
    assert_eq!(provider.calls(), 2);
}
