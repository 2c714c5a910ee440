use std::ops::Range;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::{Mutex, OnceCell};
use tokio::time::Instant;
use uuid::Uuid;

use super::{CancelFlag, ProviderError, TranslationError, TranslationProvider};
use crate::resources::{ResourceHolder, TranslatedText, TranslationConfig, TranslationPlan};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchConfig {
    /// Most texts sent in one provider call.
    pub batch_size: usize,
    /// Least time between two consecutive provider calls.
    pub inter_batch_delay: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 50,
            inter_batch_delay: Duration::from_secs(5),
        }
    }
}

/// Progress of a run, sent on the optional channel handed to the translator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum BatchEvent {
    ChunkStarted { index: usize, total: usize },
    ChunkCompleted { index: usize, total: usize },
    ChunkFailed { index: usize, message: String },
    CoolingDown { delay_ms: u64 },
    Cancelled { pending: usize },
    Finished { translated: usize, failed: usize },
}

#[derive(Debug)]
pub enum ChunkStatus {
    Pending,
    Translated(Vec<TranslatedText>),
    Failed(TranslationError),
}

#[derive(Debug)]
pub struct ChunkOutcome {
    pub index: usize,
    /// Positions of the chunk's texts in the run input.
    pub range: Range<usize>,
    pub status: ChunkStatus,
}

/// One translation request split into chunks. Failed or unsent chunks can be
/// re-issued with [`BatchTranslator::retry_failed`].
#[derive(Debug)]
pub struct BatchRun {
    id: Uuid,
    source: String,
    target: String,
    texts: Vec<String>,
    chunks: Vec<ChunkOutcome>,
    cancelled: bool,
}

impl BatchRun {
    fn new(texts: Vec<String>, source: String, target: String, batch_size: usize) -> Self {
        let chunks = (0..texts.len())
            .step_by(batch_size)
            .enumerate()
            .map(|(index, start)| ChunkOutcome {
                index,
                range: start..(start + batch_size).min(texts.len()),
                status: ChunkStatus::Pending,
            })
            .collect();
        Self {
            id: Uuid::new_v4(),
            source,
            target,
            texts,
            chunks,
            cancelled: false,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Provider code the texts are translated from.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn texts(&self) -> &[String] {
        &self.texts
    }

    pub fn chunks(&self) -> &[ChunkOutcome] {
        &self.chunks
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn failures(&self) -> impl Iterator<Item = &TranslationError> + '_ {
        self.chunks.iter().filter_map(|chunk| match &chunk.status {
            ChunkStatus::Failed(err) => Some(err),
            _ => None,
        })
    }

    pub fn is_complete(&self) -> bool {
        self.chunks
            .iter()
            .all(|chunk| matches!(chunk.status, ChunkStatus::Translated(_)))
    }

    /// One slot per input text; `None` where the chunk failed or was not sent.
    pub fn results(&self) -> Vec<Option<&TranslatedText>> {
        let mut slots = vec![None; self.texts.len()];
        for chunk in &self.chunks {
            if let ChunkStatus::Translated(results) = &chunk.status {
                for (slot, result) in slots[chunk.range.clone()].iter_mut().zip(results) {
                    *slot = Some(result);
                }
            }
        }
        slots
    }

    /// All results in input order, only when every chunk succeeded.
    pub fn complete_results(&self) -> Option<Vec<TranslatedText>> {
        if !self.is_complete() {
            return None;
        }
        let mut all = Vec::with_capacity(self.texts.len());
        for chunk in &self.chunks {
            if let ChunkStatus::Translated(results) = &chunk.status {
                all.extend(results.iter().cloned());
            }
        }
        Some(all)
    }

    fn unfinished(&self) -> Vec<usize> {
        self.chunks
            .iter()
            .filter(|chunk| !matches!(chunk.status, ChunkStatus::Translated(_)))
            .map(|chunk| chunk.index)
            .collect()
    }
}

/// Support check of a set of language codes against the provider.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LanguageCheck {
    /// Requested code and the provider code it maps to.
    pub supported: Vec<(String, String)>,
    pub unsupported: Vec<String>,
}

/// Outcome of [`BatchTranslator::translate_resource`].
#[derive(Debug)]
pub struct ResourceTranslation {
    pub plan: TranslationPlan,
    pub run: BatchRun,
    /// Whether the results were written into the holder.
    pub applied: bool,
}

pub struct BatchTranslator {
    provider: Arc<dyn TranslationProvider>,
    config: BatchConfig,
    supported: OnceCell<Vec<String>>,
    /// When the provider last answered, across runs and retries.
    last_call: Mutex<Option<Instant>>,
}

impl BatchTranslator {
    pub fn new(provider: Arc<dyn TranslationProvider>, config: BatchConfig) -> Self {
        Self {
            provider,
            config: BatchConfig {
                batch_size: config.batch_size.max(1),
                ..config
            },
            supported: OnceCell::new(),
            last_call: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Provider languages, fetched on first use and cached for the lifetime
    /// of this translator.
    pub async fn supported_languages(&self) -> Result<&[String], TranslationError> {
        let languages = self
            .supported
            .get_or_try_init(|| async {
                let languages = self
                    .provider
                    .list_supported_languages()
                    .await
                    .map_err(TranslationError::ListLanguagesFailed)?;
                info!(
                    "{} supports {} languages",
                    self.provider.name(),
                    languages.len()
                );
                Ok::<_, TranslationError>(languages)
            })
            .await?;
        Ok(languages.as_slice())
    }

    pub async fn check_languages<'a>(
        &self,
        codes: impl IntoIterator<Item = &'a str>,
    ) -> Result<LanguageCheck, TranslationError> {
        let supported = self.supported_languages().await?;
        let mut check = LanguageCheck::default();
        for code in codes {
            match resolve_code(code, supported) {
                Some(resolved) => check.supported.push((code.to_string(), resolved)),
                None => {
                    warn!("{} does not support language {code}", self.provider.name());
                    check.unsupported.push(code.to_string());
                }
            }
        }
        Ok(check)
    }

    async fn resolve(&self, code: &str) -> Result<String, TranslationError> {
        let supported = self.supported_languages().await?;
        resolve_code(code, supported)
            .ok_or_else(|| TranslationError::UnsupportedLanguage(code.to_string()))
    }

    /// Translates `texts` chunk by chunk. A failed chunk is recorded in the
    /// run and the remaining chunks still go out. Cancellation stops the run
    /// at the next chunk boundary.
    pub async fn translate(
        &self,
        texts: Vec<String>,
        source: &str,
        target: &str,
        cancel: &CancelFlag,
        progress: Option<&UnboundedSender<BatchEvent>>,
    ) -> Result<BatchRun, TranslationError> {
        let source = self.resolve(source).await?;
        let target = self.resolve(target).await?;
        let mut run = BatchRun::new(texts, source, target, self.config.batch_size);
        info!(
            "run {}: {} texts in {} chunks, {} -> {}",
            run.id,
            run.texts.len(),
            run.chunks.len(),
            run.source,
            run.target
        );
        let indices: Vec<usize> = (0..run.chunks.len()).collect();
        self.run_chunks(&mut run, &indices, cancel, progress).await;
        Ok(run)
    }

    /// Re-sends every chunk of `run` that failed or was never sent.
    pub async fn retry_failed(
        &self,
        run: &mut BatchRun,
        cancel: &CancelFlag,
        progress: Option<&UnboundedSender<BatchEvent>>,
    ) {
        let indices = run.unfinished();
        if indices.is_empty() {
            return;
        }
        info!("run {}: retrying {} chunks", run.id, indices.len());
        run.cancelled = false;
        self.run_chunks(run, &indices, cancel, progress).await;
    }

    /// Picks the texts of `holder` selected by `config`, translates them and
    /// writes the results back when every chunk succeeded. `None` means
    /// nothing qualified for translation. A cancelled run writes nothing and
    /// fails with [`TranslationError::Cancelled`].
    pub async fn translate_resource(
        &self,
        holder: &mut ResourceHolder,
        config: &TranslationConfig,
        cancel: &CancelFlag,
        progress: Option<&UnboundedSender<BatchEvent>>,
    ) -> Result<Option<ResourceTranslation>, TranslationError> {
        let Some(plan) = holder.get_text_for_translating(config)? else {
            debug!("nothing to translate in {}", holder.id());
            return Ok(None);
        };
        let run = self
            .translate(
                plan.texts().to_vec(),
                &config.source_code(),
                &config.target_code(),
                cancel,
                progress,
            )
            .await?;
        if run.is_cancelled() {
            return Err(TranslationError::Cancelled);
        }
        let applied = match run.complete_results() {
            Some(results) => {
                holder.set_translated_text(&plan, &results)?;
                true
            }
            None => false,
        };
        Ok(Some(ResourceTranslation { plan, run, applied }))
    }

    async fn run_chunks(
        &self,
        run: &mut BatchRun,
        indices: &[usize],
        cancel: &CancelFlag,
        progress: Option<&UnboundedSender<BatchEvent>>,
    ) {
        let send = |event: BatchEvent| {
            if let Some(tx) = progress {
                let _ = tx.send(event);
            }
        };
        let total = run.chunks.len();

        for (position, &index) in indices.iter().enumerate() {
            let pending = indices.len() - position;
            if cancel.is_cancelled() {
                run.cancelled = true;
                send(BatchEvent::Cancelled { pending });
                break;
            }
            let delay = self.cool_down_remaining().await;
            if !delay.is_zero() {
                send(BatchEvent::CoolingDown {
                    delay_ms: delay.as_millis() as u64,
                });
                if !cancel.sleep(delay).await {
                    run.cancelled = true;
                    send(BatchEvent::Cancelled { pending });
                    break;
                }
            }

            send(BatchEvent::ChunkStarted { index, total });
            let range = run.chunks[index].range.clone();
            let texts = &run.texts[range.clone()];
            debug!("run {}: chunk {index} with {} texts", run.id, texts.len());

            let answer = self
                .provider
                .translate_batch(texts, &run.source, &run.target)
                .await;
            *self.last_call.lock().await = Some(Instant::now());

            let status = match answer {
                Ok(results) if results.len() == texts.len() => {
                    send(BatchEvent::ChunkCompleted { index, total });
                    ChunkStatus::Translated(results)
                }
                Ok(results) => {
                    let source = ProviderError::InvalidResponse(format!(
                        "expected {} translations, got {}",
                        texts.len(),
                        results.len()
                    ));
                    self.chunk_failed(run.id, index, range, source, &send)
                }
                Err(source) => self.chunk_failed(run.id, index, range, source, &send),
            };
            run.chunks[index].status = status;
        }

        let failed = run.failures().count();
        let translated = run
            .chunks
            .iter()
            .filter(|chunk| matches!(chunk.status, ChunkStatus::Translated(_)))
            .count();
        send(BatchEvent::Finished { translated, failed });
        info!(
            "run {}: {translated}/{total} chunks translated, {failed} failed{}",
            run.id,
            if run.cancelled { ", cancelled" } else { "" }
        );
    }

    /// Part of `inter_batch_delay` not yet elapsed since the last provider call.
    async fn cool_down_remaining(&self) -> Duration {
        match *self.last_call.lock().await {
            Some(at) => self.config.inter_batch_delay.saturating_sub(at.elapsed()),
            None => Duration::ZERO,
        }
    }

    fn chunk_failed(
        &self,
        run_id: Uuid,
        index: usize,
        range: Range<usize>,
        source: ProviderError,
        send: &impl Fn(BatchEvent),
    ) -> ChunkStatus {
        warn!("run {run_id}: chunk {index} failed: {source}");
        send(BatchEvent::ChunkFailed {
            index,
            message: source.to_string(),
        });
        ChunkStatus::Failed(TranslationError::ProviderCallFailed {
            chunk: index,
            range,
            source,
        })
    }
}

/// Exact (case-insensitive) match first, then the primary language subtag,
/// so `fr-FR` maps to `fr` and `zh-TW` stays `zh-TW` when offered.
fn resolve_code(code: &str, supported: &[String]) -> Option<String> {
    let wanted = code.trim().replace('_', "-");
    if let Some(exact) = supported.iter().find(|s| s.eq_ignore_ascii_case(&wanted)) {
        return Some(exact.clone());
    }
    let primary = wanted.split('-').next().unwrap_or(&wanted);
    supported
        .iter()
        .find(|s| s.eq_ignore_ascii_case(primary))
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::drain;
    use crate::formats::json::JsonStore;
    use crate::resources::{HolderOptions, LanguageRef, Locale, SelectionScope};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::sync::mpsc::unbounded_channel;
    use tokio::time::Instant;

    #[derive(Default)]
    struct MockProvider {
        languages: Vec<String>,
        /// 1-based call numbers that fail.
        failing_calls: Vec<usize>,
        cancel_on_first_call: Option<CancelFlag>,
        calls: Mutex<Vec<(usize, Instant)>>,
        list_calls: AtomicUsize,
    }

    impl MockProvider {
        fn new(languages: &[&str]) -> Self {
            Self {
                languages: languages.iter().map(|l| l.to_string()).collect(),
                ..Self::default()
            }
        }

        fn call_sizes(&self) -> Vec<usize> {
            self.calls.lock().unwrap().iter().map(|(n, _)| *n).collect()
        }
    }

    #[async_trait]
    impl TranslationProvider for MockProvider {
        fn name(&self) -> &'static str {
            "mock"
        }

        async fn list_supported_languages(&self) -> Result<Vec<String>, ProviderError> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.languages.clone())
        }

        async fn translate_batch(
            &self,
            texts: &[String],
            _source: &str,
            target: &str,
        ) -> Result<Vec<TranslatedText>, ProviderError> {
            let call = {
                let mut calls = self.calls.lock().unwrap();
                calls.push((texts.len(), Instant::now()));
                calls.len()
            };
            if call == 1 {
                if let Some(flag) = &self.cancel_on_first_call {
                    flag.cancel();
                }
            }
            if self.failing_calls.contains(&call) {
                return Err(ProviderError::Http {
                    status: 503,
                    message: "unavailable".into(),
                });
            }
            Ok(texts
                .iter()
                .map(|text| TranslatedText::new(format!("{target}:{text}")))
                .collect())
        }
    }

    fn texts(count: usize) -> Vec<String> {
        (0..count).map(|i| format!("t{i}")).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn splits_into_chunks_with_delays_only_between_them() {
        let provider = Arc::new(MockProvider::new(&["en", "fr"]));
        let translator = BatchTranslator::new(provider.clone(), BatchConfig::default());
        let (tx, mut rx) = unbounded_channel();
        let started = Instant::now();

        let run = translator
            .translate(texts(120), "en", "fr", &CancelFlag::new(), Some(&tx))
            .await
            .unwrap();

        assert_eq!(provider.call_sizes(), [50, 50, 20]);
        let results = run.complete_results().unwrap();
        assert_eq!(results.len(), 120);
        assert!(results
            .iter()
            .enumerate()
            .all(|(i, r)| r.text == format!("fr:t{i}")));

        let events = drain(&mut rx);
        let cooldowns = events
            .iter()
            .filter(|e| matches!(e, BatchEvent::CoolingDown { .. }))
            .count();
        assert_eq!(cooldowns, 2);

        let calls = provider.calls.lock().unwrap();
        assert_eq!(calls[1].1 - calls[0].1, Duration::from_secs(5));
        assert_eq!(calls[2].1 - calls[1].1, Duration::from_secs(5));
        assert_eq!(started.elapsed(), Duration::from_secs(10), "no delay after the last chunk");
    }

    #[tokio::test(start_paused = true)]
    async fn failed_chunk_is_recorded_and_later_chunks_still_run() {
        let provider = Arc::new(MockProvider {
            failing_calls: vec![2],
            ..MockProvider::new(&["en", "fr"])
        });
        let translator = BatchTranslator::new(provider.clone(), BatchConfig::default());

        let mut run = translator
            .translate(texts(120), "en", "fr", &CancelFlag::new(), None)
            .await
            .unwrap();

        assert_eq!(provider.call_sizes().len(), 3);
        assert!(!run.is_complete());
        assert!(run.complete_results().is_none());
        let failures: Vec<&TranslationError> = run.failures().collect();
        assert_eq!(failures.len(), 1);
        assert!(matches!(
            failures[0],
            TranslationError::ProviderCallFailed { chunk: 1, range, .. } if *range == (50..100)
        ));

        let slots = run.results();
        assert_eq!(slots[49].map(|r| r.text.as_str()), Some("fr:t49"));
        assert!(slots[50..100].iter().all(Option::is_none));
        assert_eq!(slots[100].map(|r| r.text.as_str()), Some("fr:t100"));

        translator.retry_failed(&mut run, &CancelFlag::new(), None).await;
        assert_eq!(provider.call_sizes(), [50, 50, 20, 50]);
        assert!(run.is_complete());
        assert_eq!(run.complete_results().unwrap()[75].text, "fr:t75");

        let calls = provider.calls.lock().unwrap();
        assert_eq!(
            calls[3].1 - calls[2].1,
            Duration::from_secs(5),
            "a retry waits out the delay after the previous call"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn a_new_run_waits_only_for_the_rest_of_the_delay() {
        let provider = Arc::new(MockProvider::new(&["en", "fr"]));
        let translator = BatchTranslator::new(provider.clone(), BatchConfig::default());

        translator
            .translate(texts(1), "en", "fr", &CancelFlag::new(), None)
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_secs(2)).await;
        translator
            .translate(texts(1), "en", "fr", &CancelFlag::new(), None)
            .await
            .unwrap();

        let calls = provider.calls.lock().unwrap();
        assert_eq!(calls[1].1 - calls[0].1, Duration::from_secs(5));
    }

    #[tokio::test]
    async fn unsupported_languages_are_reported_and_list_is_cached() {
        let provider = Arc::new(MockProvider::new(&["en", "fr"]));
        let translator = BatchTranslator::new(provider.clone(), BatchConfig::default());

        let check = translator.check_languages(["en", "fr", "xx"]).await.unwrap();
        assert_eq!(check.unsupported, ["xx"]);
        assert_eq!(check.supported.len(), 2);

        let check = translator.check_languages(["fr-FR"]).await.unwrap();
        assert_eq!(check.supported, [("fr-FR".to_string(), "fr".to_string())]);

        let err = translator
            .translate(texts(3), "en", "xx", &CancelFlag::new(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, TranslationError::UnsupportedLanguage(code) if code == "xx"));
        assert!(provider.call_sizes().is_empty());
        assert_eq!(provider.list_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_stops_at_the_next_chunk_and_can_resume() {
        let cancel = CancelFlag::new();
        let provider = Arc::new(MockProvider {
            cancel_on_first_call: Some(cancel.clone()),
            ..MockProvider::new(&["en", "de"])
        });
        let translator = BatchTranslator::new(provider.clone(), BatchConfig::default());
        let (tx, mut rx) = unbounded_channel();

        let mut run = translator
            .translate(texts(120), "en", "de", &cancel, Some(&tx))
            .await
            .unwrap();

        assert!(run.is_cancelled());
        assert_eq!(provider.call_sizes(), [50]);
        assert!(drain(&mut rx).contains(&BatchEvent::Cancelled { pending: 2 }));

        translator.retry_failed(&mut run, &CancelFlag::new(), None).await;
        assert!(!run.is_cancelled());
        assert!(run.is_complete());
        assert_eq!(provider.call_sizes(), [50, 50, 20]);
    }

    #[tokio::test]
    async fn empty_input_makes_no_calls() {
        let provider = Arc::new(MockProvider::new(&["en", "fr"]));
        let translator = BatchTranslator::new(provider.clone(), BatchConfig::default());

        let run = translator
            .translate(Vec::new(), "en", "fr", &CancelFlag::new(), None)
            .await
            .unwrap();

        assert!(run.is_complete());
        assert_eq!(run.complete_results().unwrap(), Vec::<TranslatedText>::new());
        assert!(provider.call_sizes().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn translate_resource_writes_back_only_complete_runs() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("strings.json");
        std::fs::write(&base, r#"{"A": "Hello", "B": "World", "C": ""}"#).unwrap();
        let mut holder = ResourceHolder::load(
            "strings",
            base,
            true,
            Vec::new(),
            Arc::new(JsonStore::new(false)),
            HolderOptions::default(),
        )
        .unwrap();
        let fr_locale = Locale::parse("fr-FR").unwrap();
        holder.add_language(&fr_locale, false).unwrap();
        let fr = LanguageRef::Locale(fr_locale.clone());
        let config =
            TranslationConfig::new(LanguageRef::Default, fr.clone(), SelectionScope::AllMissing);

        let failing = BatchTranslator::new(
            Arc::new(MockProvider {
                failing_calls: vec![1],
                ..MockProvider::new(&["en", "fr"])
            }),
            BatchConfig::default(),
        );
        let outcome = failing
            .translate_resource(&mut holder, &config, &CancelFlag::new(), None)
            .await
            .unwrap()
            .unwrap();
        assert!(!outcome.applied);
        assert_eq!(holder.language(&fr_locale).unwrap().entries().value("A"), None);

        let translator = BatchTranslator::new(
            Arc::new(MockProvider::new(&["en", "fr"])),
            BatchConfig::default(),
        );
        let outcome = translator
            .translate_resource(&mut holder, &config, &CancelFlag::new(), None)
            .await
            .unwrap()
            .unwrap();
        assert!(outcome.applied);
        assert_eq!(outcome.run.target(), "fr");
        let entries = holder.language(&fr_locale).unwrap().entries();
        assert_eq!(entries.value("A"), Some("fr:Hello"));
        assert_eq!(entries.value("B"), Some("fr:World"));
        assert_eq!(entries.value("C"), None);

        let again = translator
            .translate_resource(&mut holder, &config, &CancelFlag::new(), None)
            .await
            .unwrap();
        assert!(again.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_resource_translation_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("strings.json");
        std::fs::write(&base, r#"{"A": "Hello", "B": "World"}"#).unwrap();
        let mut holder = ResourceHolder::load(
            "strings",
            base,
            true,
            Vec::new(),
            Arc::new(JsonStore::new(false)),
            HolderOptions::default(),
        )
        .unwrap();
        let fr = Locale::parse("fr").unwrap();
        holder.add_language(&fr, false).unwrap();
        holder.save().unwrap();
        let config = TranslationConfig::new(
            LanguageRef::Default,
            LanguageRef::Locale(fr.clone()),
            SelectionScope::AllMissing,
        );

        let cancel = CancelFlag::new();
        let translator = BatchTranslator::new(
            Arc::new(MockProvider {
                cancel_on_first_call: Some(cancel.clone()),
                ..MockProvider::new(&["en", "fr"])
            }),
            BatchConfig {
                batch_size: 1,
                ..BatchConfig::default()
            },
        );
        let err = translator
            .translate_resource(&mut holder, &config, &cancel, None)
            .await
            .unwrap_err();

        assert!(matches!(err, TranslationError::Cancelled));
        assert_eq!(holder.language(&fr).unwrap().entries().value("A"), None);
        assert!(!holder.is_dirty());
    }

    #[test]
    fn resolves_exact_codes_before_primary_subtags() {
        let supported: Vec<String> = ["en", "zh-TW", "zh", "pt"].map(String::from).to_vec();
        assert_eq!(resolve_code("zh-TW", &supported).as_deref(), Some("zh-TW"));
        assert_eq!(resolve_code("zh_tw", &supported).as_deref(), Some("zh-TW"));
        assert_eq!(resolve_code("zh-CN", &supported).as_deref(), Some("zh"));
        assert_eq!(resolve_code("pt-BR", &supported).as_deref(), Some("pt"));
        assert_eq!(resolve_code("xx", &supported), None);
    }
}
