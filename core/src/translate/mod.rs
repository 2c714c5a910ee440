//! Machine translation of resource texts: the provider seam, the batching
//! orchestrator and a Google Cloud Translation client.

pub mod batch;
pub mod cancel;
pub mod google;
pub mod retry;

use async_trait::async_trait;
use std::ops::Range;
use thiserror::Error;

use crate::resources::{ResourceError, TranslatedText};

pub use batch::{
    BatchConfig, BatchEvent, BatchRun, BatchTranslator, ChunkOutcome, ChunkStatus, LanguageCheck,
    ResourceTranslation,
};
pub use cancel::CancelFlag;
pub use google::GoogleTranslateClient;
pub use retry::RetryPolicy;

/// Failure of a single provider call.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("unexpected response: {0}")]
    InvalidResponse(String),

    #[error("no API key configured")]
    MissingApiKey,
}

#[derive(Debug, Error)]
pub enum TranslationError {
    #[error("language not supported by the translation service: {0}")]
    UnsupportedLanguage(String),

    #[error("chunk {chunk} (texts {}..{}) failed: {source}", .range.start, .range.end)]
    ProviderCallFailed {
        chunk: usize,
        range: Range<usize>,
        #[source]
        source: ProviderError,
    },

    #[error("could not list supported languages: {0}")]
    ListLanguagesFailed(#[source] ProviderError),

    #[error(transparent)]
    Resource(#[from] ResourceError),

    #[error("translation cancelled")]
    Cancelled,
}

/// A machine translation service.
#[async_trait]
pub trait TranslationProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Language codes the service accepts, e.g. `en`, `fr`, `zh-TW`.
    async fn list_supported_languages(&self) -> Result<Vec<String>, ProviderError>;

    /// Translates `texts` in one call. The result has one entry per input,
    /// in input order.
    async fn translate_batch(
        &self,
        texts: &[String],
        source: &str,
        target: &str,
    ) -> Result<Vec<TranslatedText>, ProviderError>;
}
