//! Translation providers: the remote services that turn a phrase into a
//! phrase in another locale.
//!
//! - `google`: Google Cloud Translation (v2 REST)
//! - `openai`: OpenAI chat completions with a translation prompt
//!
//! Both retry transient failures (429, 5xx, transport) with exponential
//! backoff and give up immediately on other client errors.

mod google;
mod openai;

pub use google::GoogleTranslateProvider;
pub use openai::OpenAiProvider;

use futures::future::BoxFuture;

use crate::error::ProviderError;

/// A remote `translate(text, target_locale) -> text` call.
pub trait TranslationProvider: Send + Sync {
    fn translate<'a>(
        &'a self,
        text: &'a str,
        target_locale: &'a str,
    ) -> BoxFuture<'a, Result<String, ProviderError>>;
}

/// Read a provider response, turning non-success statuses into
/// [`ProviderError::Api`] with any JSON error envelope unwrapped.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .unwrap_or_else(|e| format!("<failed to read body: {}>", e));
    Err(ProviderError::from_http(status, &body))
}
