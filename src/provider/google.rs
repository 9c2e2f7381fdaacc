use futures::future::BoxFuture;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{check_status, TranslationProvider};
use crate::error::ProviderError;
use crate::retry::{with_retry_if, RetryConfig};

pub const DEFAULT_GOOGLE_API_URL: &str = "https://translation.googleapis.com/language/translate/v2";

/// Google Cloud Translation v2 request body
#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    q: &'a str,
    target: &'a str,
    format: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    data: TranslateData,
}

#[derive(Debug, Deserialize)]
struct TranslateData {
    translations: Vec<Translation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Translation {
    translated_text: String,
}

/// Google Cloud Translation (v2) authenticated with an API key.
#[derive(Debug, Clone)]
pub struct GoogleTranslateProvider {
    client: reqwest::Client,
    api_key: String,
    api_url: String,
    source_locale: Option<String>,
    retry: RetryConfig,
}

impl GoogleTranslateProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            api_url: DEFAULT_GOOGLE_API_URL.to_string(),
            source_locale: None,
            retry: RetryConfig::provider_call(),
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Pin the source language instead of letting Google detect it.
    pub fn with_source_locale(mut self, locale: impl Into<String>) -> Self {
        self.source_locale = Some(locale.into());
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    async fn translate_once(&self, text: &str, target_locale: &str) -> Result<String, ProviderError> {
        let request = TranslateRequest {
            q: text,
            target: target_locale,
            format: "text",
            source: self.source_locale.as_deref(),
        };

        let response = self
            .client
            .post(&self.api_url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await?;
        let response = check_status(response).await?;

        let body: TranslateResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;

        body.data
            .translations
            .into_iter()
            .next()
            .map(|t| t.translated_text)
            .ok_or(ProviderError::EmptyResult)
    }
}

impl TranslationProvider for GoogleTranslateProvider {
    fn translate<'a>(
        &'a self,
        text: &'a str,
        target_locale: &'a str,
    ) -> BoxFuture<'a, Result<String, ProviderError>> {
        async move {
            debug!("Google translate to {}: {:?}", target_locale, text);
            with_retry_if(
                &self.retry,
                &format!("Google translation to {}", target_locale),
                || self.translate_once(text, target_locale),
                ProviderError::is_retryable,
            )
            .await
        }
        .boxed()
    }
}
