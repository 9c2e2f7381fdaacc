use futures::future::BoxFuture;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{check_status, TranslationProvider};
use crate::error::ProviderError;
use crate::retry::{with_retry_if, RetryConfig};

pub const DEFAULT_OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

/// OpenAI Chat Completion request for translation
#[derive(Debug, Serialize)]
struct TranslationRequest {
    model: String,
    messages: Vec<Message>,
    max_completion_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reasoning_effort: Option<String>,
}

/// Check if a model is a reasoning model that doesn't support temperature
fn is_reasoning_model(model: &str) -> bool {
    model.starts_with("gpt-5")
        || model.starts_with("o1")
        || model.starts_with("o3")
        || model.starts_with("o4")
}

#[derive(Debug, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

/// Build the system prompt for translating one interface phrase
fn build_translation_system_prompt(target_locale: &str) -> String {
    format!(
        r#"You are a professional software localizer. Translate the user's text into the language with locale code "{}".

## Translation Rules

### DO NOT translate or alter:
- Format placeholders (e.g., %s, %d, %j, {{{{name}}}})
- HTML tags and their attributes (e.g., <a href="%s">, <strong>)
- URLs, email addresses and code identifiers

### Output:
- Reply with the translated text only, no quotes, notes or explanations
- Preserve leading/trailing punctuation and capitalization style
- Keep markdown formatting intact"#,
        target_locale
    )
}

/// OpenAI chat completions used as a translation provider.
#[derive(Debug, Clone)]
pub struct OpenAiProvider {
    client: reqwest::Client,
    api_key: String,
    api_url: String,
    model: String,
    max_tokens: u32,
    retry: RetryConfig,
}

impl OpenAiProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            api_url: DEFAULT_OPENAI_API_URL.to_string(),
            model: DEFAULT_OPENAI_MODEL.to_string(),
            max_tokens: 1000,
            retry: RetryConfig::provider_call(),
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    fn build_request(&self, text: &str, target_locale: &str) -> TranslationRequest {
        // Reasoning models need higher token limits and don't support temperature
        let is_reasoning = is_reasoning_model(&self.model);
        TranslationRequest {
            model: self.model.clone(),
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: build_translation_system_prompt(target_locale),
                },
                Message {
                    role: "user".to_string(),
                    content: text.to_string(),
                },
            ],
            max_completion_tokens: if is_reasoning { 16000 } else { self.max_tokens },
            temperature: if is_reasoning { None } else { Some(0.3) },
            reasoning_effort: if is_reasoning {
                Some("low".to_string())
            } else {
                None
            },
        }
    }

    async fn translate_once(&self, request: &TranslationRequest) -> Result<String, ProviderError> {
        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(request)
            .send()
            .await?;
        let response = check_status(response).await?;

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;

        chat_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or(ProviderError::EmptyResult)
    }
}

impl TranslationProvider for OpenAiProvider {
    fn translate<'a>(
        &'a self,
        text: &'a str,
        target_locale: &'a str,
    ) -> BoxFuture<'a, Result<String, ProviderError>> {
        async move {
            debug!("OpenAI translate to {}: {:?}", target_locale, text);
            let request = self.build_request(text, target_locale);
            with_retry_if(
                &self.retry,
                &format!("OpenAI translation to {}", target_locale),
                || self.translate_once(&request),
                ProviderError::is_retryable,
            )
            .await
        }
        .boxed()
    }
}
