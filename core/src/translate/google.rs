use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::Deserialize;
use std::time::Duration;

use super::retry::{evaluate_retry, retry_after, Failure, RetryDecision, RetryPolicy};
use super::{ProviderError, TranslationProvider};
use crate::config::EditorSettings;
use crate::resources::TranslatedText;

pub const DEFAULT_BASE_URL: &str = "https://translation.googleapis.com/language/translate/v2";

/// Google Cloud Translation (v2, neural model) over plain HTTPS with an API key.
#[derive(Debug, Clone)]
pub struct GoogleTranslateClient {
    client: Client,
    api_key: String,
    base_url: String,
    policy: RetryPolicy,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct LanguageList {
    #[serde(default)]
    languages: Vec<LanguageEntry>,
}

#[derive(Debug, Deserialize)]
struct LanguageEntry {
    language: String,
}

#[derive(Debug, Deserialize)]
struct TranslationList {
    #[serde(default)]
    translations: Vec<TranslationEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranslationEntry {
    translated_text: String,
    detected_source_language: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl GoogleTranslateClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self, ProviderError> {
        let api_key = api_key.into().trim().to_string();
        if api_key.is_empty() {
            return Err(ProviderError::MissingApiKey);
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| ProviderError::Network(err.to_string()))?;
        Ok(Self {
            client,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            policy: RetryPolicy::default(),
        })
    }

    /// Uses the key from settings, falling back to `GOOGLE_TRANSLATE_API_KEY`.
    pub fn from_settings(settings: &EditorSettings) -> Result<Self, ProviderError> {
        Self::new(settings.api_key().ok_or(ProviderError::MissingApiKey)?)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    fn endpoint(&self, suffix: &str) -> Result<Url, ProviderError> {
        Url::parse_with_params(
            &format!("{}{suffix}", self.base_url),
            &[("key", self.api_key.as_str())],
        )
        .map_err(|err| ProviderError::InvalidResponse(format!("bad endpoint: {err}")))
    }

    async fn send_with_retry(
        &self,
        build: impl Fn() -> RequestBuilder,
    ) -> Result<Response, ProviderError> {
        let mut attempt = 0;
        loop {
            let (failure, error) = match build().send().await {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) => {
                    let status = response.status();
                    let hint = retry_after(response.headers());
                    let body = response.text().await.unwrap_or_default();
                    (
                        Failure::Http {
                            status,
                            retry_after: hint,
                        },
                        ProviderError::Http {
                            status: status.as_u16(),
                            message: error_message(&body),
                        },
                    )
                }
                Err(err) => {
                    let failure = if err.is_timeout() || err.is_connect() {
                        Failure::Network
                    } else {
                        Failure::Fatal
                    };
                    (failure, ProviderError::Network(err.to_string()))
                }
            };

            match evaluate_retry(failure, self.policy, attempt) {
                RetryDecision::RetryAfter { delay, from_server } => {
                    warn!(
                        "Google Translate call failed ({error}), retry {} in {}ms{}",
                        attempt + 1,
                        delay.as_millis(),
                        if from_server { " (server hint)" } else { "" }
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                RetryDecision::GiveUp => return Err(error),
            }
        }
    }
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| body.trim().chars().take(200).collect())
}

#[async_trait]
impl TranslationProvider for GoogleTranslateClient {
    fn name(&self) -> &'static str {
        "Google Translate"
    }

    async fn list_supported_languages(&self) -> Result<Vec<String>, ProviderError> {
        let url = self.endpoint("/languages")?;
        let response = self
            .send_with_retry(|| self.client.get(url.clone()))
            .await?;
        let listing = response
            .json::<Envelope<LanguageList>>()
            .await
            .map_err(|err| ProviderError::InvalidResponse(err.to_string()))?;
        Ok(listing
            .data
            .languages
            .into_iter()
            .map(|entry| entry.language)
            .collect())
    }

    async fn translate_batch(
        &self,
        texts: &[String],
        source: &str,
        target: &str,
    ) -> Result<Vec<TranslatedText>, ProviderError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let url = self.endpoint("")?;
        let body = serde_json::json!({
            "q": texts,
            "source": source,
            "target": target,
            "format": "text",
            "model": "nmt",
        });
        debug!("Google Translate: {} texts {source} -> {target}", texts.len());

        let response = self
            .send_with_retry(|| self.client.post(url.clone()).json(&body))
            .await?;
        let listing = response
            .json::<Envelope<TranslationList>>()
            .await
            .map_err(|err| ProviderError::InvalidResponse(err.to_string()))?;

        let translations = listing.data.translations;
        if translations.len() != texts.len() {
            return Err(ProviderError::InvalidResponse(format!(
                "sent {} texts, received {} translations",
                texts.len(),
                translations.len()
            )));
        }
        Ok(translations
            .into_iter()
            .map(|entry| TranslatedText {
                text: entry.translated_text,
                detected_source_language: entry.detected_source_language,
            })
            .collect())
    }
}
