//! Caller-facing translator: wraps the shared manager with UI state
//!
//! Errors never escape [`Translator::translate`]; they land in
//! [`Translator::last_error`] and the call resolves to `None`.

use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use super::TranslationResult;
use super::engine::EngineDescriptor;
use super::health::HealthCheckRecord;
use super::manager::{ListenerId, StatusReport, TranslationManager};

pub const HISTORY_LIMIT: usize = 50;
pub const DEFAULT_BATCH_DELAY: Duration = Duration::from_millis(200);

const EMPTY_TEXT_ERROR: &str = "Translation text must not be empty";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationHistoryItem {
    pub id: u64,
    pub original_text: String,
    pub translated_text: String,
    pub source_lang: String,
    pub target_lang: String,
    pub engine: String,
    pub confidence: f32,
    pub timestamp: u64,
    pub from_cache: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchItem {
    pub index: usize,
    pub original: String,
    pub translated: Option<String>,
    pub engine: Option<String>,
    pub confidence: Option<f32>,
    pub error: Option<String>,
    pub success: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationStats {
    pub total_translations: usize,
    pub engine_usage: BTreeMap<String, usize>,
    pub language_pairs: BTreeMap<String, usize>,
    /// Rounded percentage of history entries served from cache.
    pub cache_hit_rate: u32,
}

#[derive(Default)]
struct TranslatorState {
    current_engine: Option<EngineDescriptor>,
    last_error: Option<String>,
    last_result: Option<TranslationResult>,
    history: VecDeque<TranslationHistoryItem>,
    in_flight: usize,
    latest_call: u64,
}

pub struct Translator {
    manager: Arc<TranslationManager>,
    state: Arc<Mutex<TranslatorState>>,
    listener: ListenerId,
    next_call: AtomicU64,
    batch_delay: Duration,
}

fn lock(state: &Mutex<TranslatorState>) -> MutexGuard<'_, TranslatorState> {
    state.lock().unwrap_or_else(|p| p.into_inner())
}

impl Translator {
    pub fn new(manager: Arc<TranslationManager>) -> Self {
        let state = Arc::new(Mutex::new(TranslatorState {
            current_engine: manager.current_engine(),
            ..Default::default()
        }));

        let listener_state = Arc::clone(&state);
        let listener = manager.subscribe(move |event| {
            tracing::debug!(
                "[Translator] Engine switched: {} -> {}",
                event.previous,
                event.current.name
            );
            lock(&listener_state).current_engine = Some(event.current.clone());
        });

        Self {
            manager,
            state,
            listener,
            next_call: AtomicU64::new(1),
            batch_delay: DEFAULT_BATCH_DELAY,
        }
    }

    pub fn with_batch_delay(mut self, delay: Duration) -> Self {
        self.batch_delay = delay;
        self
    }

    pub fn manager(&self) -> &Arc<TranslationManager> {
        &self.manager
    }

    pub fn is_translating(&self) -> bool {
        lock(&self.state).in_flight > 0
    }

    pub fn current_engine(&self) -> Option<EngineDescriptor> {
        lock(&self.state).current_engine.clone()
    }

    pub fn last_error(&self) -> Option<String> {
        lock(&self.state).last_error.clone()
    }

    pub fn last_result(&self) -> Option<TranslationResult> {
        lock(&self.state).last_result.clone()
    }

    /// Most recent first.
    pub fn history(&self) -> Vec<TranslationHistoryItem> {
        lock(&self.state).history.iter().cloned().collect()
    }

    pub async fn translate(
        &self,
        text: &str,
        target_lang: &str,
        source_lang: &str,
    ) -> Option<TranslationResult> {
        if text.trim().is_empty() {
            lock(&self.state).last_error = Some(EMPTY_TEXT_ERROR.to_string());
            return None;
        }

        let call_id = self.next_call.fetch_add(1, Ordering::Relaxed);
        {
            let mut state = lock(&self.state);
            state.in_flight += 1;
            state.latest_call = call_id;
            state.last_error = None;
        }

        let outcome = self
            .manager
            .smart_translate(text, target_lang, source_lang)
            .await;

        let mut state = lock(&self.state);
        state.in_flight = state.in_flight.saturating_sub(1);
        // Only the most recently started call owns the visible result/error
        let is_latest = state.latest_call == call_id;

        match outcome {
            Ok(result) => {
                state.history.push_front(TranslationHistoryItem {
                    id: call_id,
                    original_text: text.to_string(),
                    translated_text: result.translated_text.clone(),
                    source_lang: source_lang.to_string(),
                    target_lang: target_lang.to_string(),
                    engine: result.engine.clone(),
                    confidence: result.confidence,
                    timestamp: self.manager.now_millis(),
                    from_cache: result.from_cache,
                });
                state.history.truncate(HISTORY_LIMIT);
                if is_latest {
                    state.last_result = Some(result.clone());
                }
                Some(result)
            }
            Err(err) => {
                tracing::error!("[Translator] Translation failed: {}", err);
                if is_latest {
                    state.last_error = Some(err.to_string());
                }
                None
            }
        }
    }

    /// Translate one by one with a pause between requests.
    pub async fn batch_translate<F>(
        &self,
        texts: &[String],
        target_lang: &str,
        source_lang: &str,
        progress_callback: Option<F>,
    ) -> Vec<BatchItem>
    where
        F: Fn(usize) + Send + Sync,
    {
        if texts.is_empty() {
            lock(&self.state).last_error = Some("Batch must contain at least one text".to_string());
            return Vec::new();
        }

        {
            let mut state = lock(&self.state);
            state.in_flight += 1;
            state.last_error = None;
        }

        let mut results = Vec::with_capacity(texts.len());
        for (index, text) in texts.iter().enumerate() {
            let item = if text.trim().is_empty() {
                BatchItem {
                    index,
                    original: text.clone(),
                    translated: None,
                    engine: None,
                    confidence: None,
                    error: Some(EMPTY_TEXT_ERROR.to_string()),
                    success: false,
                }
            } else {
                match self
                    .manager
                    .smart_translate(text, target_lang, source_lang)
                    .await
                {
                    Ok(result) => BatchItem {
                        index,
                        original: text.clone(),
                        translated: Some(result.translated_text),
                        engine: Some(result.engine),
                        confidence: Some(result.confidence),
                        error: None,
                        success: true,
                    },
                    Err(err) => BatchItem {
                        index,
                        original: text.clone(),
                        translated: None,
                        engine: None,
                        confidence: None,
                        error: Some(err.to_string()),
                        success: false,
                    },
                }
            };
            results.push(item);

            if let Some(ref cb) = progress_callback {
                cb(index + 1);
            }

            if index + 1 < texts.len() && !self.batch_delay.is_zero() {
                tokio::time::sleep(self.batch_delay).await;
            }
        }

        let mut state = lock(&self.state);
        state.in_flight = state.in_flight.saturating_sub(1);
        tracing::info!(
            "[Translator] Batch complete: {}/{} succeeded",
            results.iter().filter(|r| r.success).count(),
            texts.len()
        );

        results
    }

    pub fn switch_engine(&self, engine_key: &str) -> Option<EngineDescriptor> {
        match self.manager.switch_engine(engine_key) {
            Ok(engine) => {
                let mut state = lock(&self.state);
                state.current_engine = Some(engine.clone());
                state.last_error = None;
                Some(engine)
            }
            Err(err) => {
                lock(&self.state).last_error = Some(err.to_string());
                None
            }
        }
    }

    pub fn get_all_engines(&self) -> Vec<EngineDescriptor> {
        self.manager.engines()
    }

    pub fn get_engine_status(&self) -> StatusReport {
        self.manager.status_report()
    }

    pub async fn refresh_engines(&self) -> Vec<HealthCheckRecord> {
        let records = self.manager.check_all_engines_health().await;
        lock(&self.state).current_engine = self.manager.current_engine();
        records
    }

    pub fn detect_language(&self, text: &str) -> &'static str {
        self.manager.detect_language(text)
    }

    pub fn clear_cache(&self) {
        self.manager.clear_cache();
        lock(&self.state).history.clear();
    }

    pub fn get_translation_stats(&self) -> TranslationStats {
        let state = lock(&self.state);
        let mut stats = TranslationStats {
            total_translations: state.history.len(),
            ..Default::default()
        };

        let mut cache_hits = 0;
        for item in &state.history {
            *stats.engine_usage.entry(item.engine.clone()).or_insert(0) += 1;
            let pair = format!("{} -> {}", item.source_lang, item.target_lang);
            *stats.language_pairs.entry(pair).or_insert(0) += 1;
            if item.from_cache {
                cache_hits += 1;
            }
        }

        if !state.history.is_empty() {
            stats.cache_hit_rate =
                ((cache_hits as f64 / state.history.len() as f64) * 100.0).round() as u32;
        }

        stats
    }
}

impl Drop for Translator {
    fn drop(&mut self) {
        self.manager.unsubscribe(self.listener);
    }
}
