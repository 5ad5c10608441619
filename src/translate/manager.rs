//! Multi-engine translation manager with automatic failover
//!
//! The manager owns the engine registry, the current-engine pointer and the
//! response cache. All of them are shared by every caller: a failure seen by
//! one call takes the engine out of rotation for all others until a success
//! or a health probe brings it back.

use futures::future::join_all;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use super::TranslationResult;
use super::adapter::TranslationAdapter;
use super::cache::{self, TranslationCache};
use super::engine::EngineDescriptor;
use super::error::{TranslateError, TranslateResult};
use super::health::{Clock, HealthCheckRecord, HealthMonitorHandle, SystemClock};
use super::language;

pub const DEFAULT_MAX_ENGINE_HOPS: usize = 3;
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 1;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone)]
pub struct ManagerSettings {
    pub cache_capacity: usize,
    /// Engine switches allowed within one `smart_translate` call.
    pub max_engine_hops: usize,
    /// Consecutive failures (live calls or probes) before an engine is
    /// marked unavailable.
    pub failure_threshold: u32,
    pub request_timeout: Duration,
}

impl Default for ManagerSettings {
    fn default() -> Self {
        Self {
            cache_capacity: cache::DEFAULT_CAPACITY,
            max_engine_hops: DEFAULT_MAX_ENGINE_HOPS,
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SwitchReason {
    Failover,
    HealthCheck,
    Manual,
}

#[derive(Debug, Clone)]
pub struct EngineSwitchEvent {
    pub previous: String,
    pub current: EngineDescriptor,
    pub reason: SwitchReason,
}

pub type EngineSwitchListener = Arc<dyn Fn(&EngineSwitchEvent) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineStatus {
    #[serde(flatten)]
    pub descriptor: EngineDescriptor,
    pub consecutive_failures: u32,
    pub last_check: Option<HealthCheckRecord>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub current_engine: String,
    pub current_engine_key: String,
    pub total_engines: usize,
    pub available_engines: usize,
    pub engines: Vec<EngineStatus>,
    pub cache_size: usize,
}

struct EngineSlot {
    descriptor: EngineDescriptor,
    adapter: Arc<dyn TranslationAdapter>,
    consecutive_failures: u32,
    last_check: Option<HealthCheckRecord>,
}

struct EngineState {
    slots: Vec<EngineSlot>,
    current: usize,
}

impl EngineState {
    fn index_of(&self, key: &str) -> Option<usize> {
        self.slots.iter().position(|s| s.descriptor.key == key)
    }

    /// Lowest priority value among available engines, registry order on ties.
    fn best_available(&self, excluding: &str) -> Option<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.descriptor.available && s.descriptor.key != excluding)
            .min_by_key(|(i, s)| (s.descriptor.priority, *i))
            .map(|(i, _)| i)
    }
}

pub struct TranslationManager {
    state: Mutex<EngineState>,
    cache: Mutex<TranslationCache>,
    listeners: Mutex<Vec<(ListenerId, EngineSwitchListener)>>,
    next_listener_id: AtomicU64,
    settings: ManagerSettings,
    clock: Arc<dyn Clock>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| {
        tracing::warn!("[TranslationManager] Mutex poisoned, recovering");
        poisoned.into_inner()
    })
}

impl TranslationManager {
    /// Entries whose descriptor key does not match the adapter's engine key
    /// are skipped.
    pub fn new(
        engines: Vec<(EngineDescriptor, Arc<dyn TranslationAdapter>)>,
        settings: ManagerSettings,
    ) -> Self {
        let slots: Vec<EngineSlot> = engines
            .into_iter()
            .filter(|(descriptor, adapter)| {
                let matches = descriptor.key == adapter.engine_key();
                if !matches {
                    tracing::warn!(
                        "[TranslationManager] Skipping {}: adapter serves {}",
                        descriptor.key,
                        adapter.engine_key()
                    );
                }
                matches
            })
            .map(|(mut descriptor, adapter)| {
                descriptor.available = true;
                EngineSlot {
                    descriptor,
                    adapter,
                    consecutive_failures: 0,
                    last_check: None,
                }
            })
            .collect();

        let mut state = EngineState { slots, current: 0 };
        state.current = state.best_available("").unwrap_or(0);

        if let Some(slot) = state.slots.get(state.current) {
            tracing::info!(
                "[TranslationManager] {} engine(s) registered, current: {}",
                state.slots.len(),
                slot.descriptor.name
            );
        }

        Self {
            cache: Mutex::new(TranslationCache::new(settings.cache_capacity)),
            state: Mutex::new(state),
            listeners: Mutex::new(Vec::new()),
            next_listener_id: AtomicU64::new(1),
            settings,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn now_millis(&self) -> u64 {
        self.clock.now_millis()
    }

    pub fn detect_language(&self, text: &str) -> &'static str {
        language::detect_language(text)
    }

    pub fn current_engine(&self) -> Option<EngineDescriptor> {
        let state = lock(&self.state);
        state.slots.get(state.current).map(|s| s.descriptor.clone())
    }

    pub fn engines(&self) -> Vec<EngineDescriptor> {
        lock(&self.state)
            .slots
            .iter()
            .map(|s| s.descriptor.clone())
            .collect()
    }

    pub fn engine_statuses(&self) -> Vec<EngineStatus> {
        lock(&self.state)
            .slots
            .iter()
            .map(|s| EngineStatus {
                descriptor: s.descriptor.clone(),
                consecutive_failures: s.consecutive_failures,
                last_check: s.last_check.clone(),
            })
            .collect()
    }

    pub fn status_report(&self) -> StatusReport {
        let engines = self.engine_statuses();
        let (current_engine, current_engine_key) = match self.current_engine() {
            Some(e) => (e.name, e.key),
            None => ("None".to_string(), String::new()),
        };

        StatusReport {
            current_engine,
            current_engine_key,
            total_engines: engines.len(),
            available_engines: engines.iter().filter(|e| e.descriptor.available).count(),
            engines,
            cache_size: self.cache_len(),
        }
    }

    pub fn cache_len(&self) -> usize {
        lock(&self.cache).len()
    }

    pub fn clear_cache(&self) {
        lock(&self.cache).clear();
        tracing::info!("[TranslationManager] Translation cache cleared");
    }

    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&EngineSwitchEvent) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_listener_id.fetch_add(1, Ordering::Relaxed));
        lock(&self.listeners).push((id, Arc::new(listener)));
        id
    }

    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = lock(&self.listeners);
        let before = listeners.len();
        listeners.retain(|(lid, _)| *lid != id);
        listeners.len() != before
    }

    fn notify(&self, event: &EngineSwitchEvent) {
        // Listeners run outside the lock so they may call back into the manager
        let listeners: Vec<EngineSwitchListener> =
            lock(&self.listeners).iter().map(|(_, l)| l.clone()).collect();
        for listener in listeners {
            listener(event);
        }
    }

    /// Point the manager at `engine_key`, even if it is marked unavailable.
    pub fn switch_engine(&self, engine_key: &str) -> TranslateResult<EngineDescriptor> {
        let event = {
            let mut state = lock(&self.state);
            let idx = state
                .index_of(engine_key)
                .ok_or_else(|| TranslateError::UnknownEngine(engine_key.to_string()))?;
            let previous = state.slots[state.current].descriptor.key.clone();
            state.current = idx;
            EngineSwitchEvent {
                previous,
                current: state.slots[idx].descriptor.clone(),
                reason: SwitchReason::Manual,
            }
        };

        tracing::info!(
            "[TranslationManager] Manual switch: {} -> {}",
            event.previous,
            event.current.key
        );
        self.notify(&event);
        Ok(event.current)
    }

    /// Move to the best available engine other than `excluding`.
    fn promote_next(&self, excluding: &str, reason: SwitchReason) -> Option<EngineDescriptor> {
        let event = {
            let mut state = lock(&self.state);
            let idx = state.best_available(excluding)?;
            if idx == state.current {
                return Some(state.slots[idx].descriptor.clone());
            }
            let previous = state.slots[state.current].descriptor.key.clone();
            state.current = idx;
            EngineSwitchEvent {
                previous,
                current: state.slots[idx].descriptor.clone(),
                reason,
            }
        };

        tracing::info!(
            "[TranslationManager] Engine switch: {} -> {} ({:?})",
            event.previous,
            event.current.key,
            reason
        );
        self.notify(&event);
        Some(event.current)
    }

    fn current_adapter(&self) -> Option<(String, Arc<dyn TranslationAdapter>)> {
        let state = lock(&self.state);
        state
            .slots
            .get(state.current)
            .map(|s| (s.descriptor.key.clone(), s.adapter.clone()))
    }

    fn adapter_for(&self, engine_key: &str) -> Option<Arc<dyn TranslationAdapter>> {
        let state = lock(&self.state);
        state
            .index_of(engine_key)
            .map(|idx| state.slots[idx].adapter.clone())
    }

    fn record_success(&self, engine_key: &str) {
        let mut state = lock(&self.state);
        if let Some(idx) = state.index_of(engine_key) {
            let slot = &mut state.slots[idx];
            if !slot.descriptor.available {
                tracing::info!("[TranslationManager] {} is available again", engine_key);
            }
            slot.consecutive_failures = 0;
            slot.descriptor.available = true;
        }
    }

    fn record_failure(&self, engine_key: &str, error: &TranslateError) {
        let mut state = lock(&self.state);
        let threshold = self.settings.failure_threshold.max(1);
        if let Some(idx) = state.index_of(engine_key) {
            let slot = &mut state.slots[idx];
            slot.consecutive_failures = slot.consecutive_failures.saturating_add(1);
            if slot.descriptor.available
                && (error.is_permanent() || slot.consecutive_failures >= threshold)
            {
                slot.descriptor.available = false;
                tracing::warn!(
                    "[TranslationManager] {} marked unavailable after {} failure(s)",
                    engine_key,
                    slot.consecutive_failures
                );
            }
        }
    }

    async fn call_adapter(
        &self,
        engine_key: &str,
        adapter: &dyn TranslationAdapter,
        text: &str,
        target_lang: &str,
        source_lang: &str,
    ) -> TranslateResult<TranslationResult> {
        let timeout = self.settings.request_timeout;
        match tokio::time::timeout(timeout, adapter.translate(text, target_lang, source_lang)).await
        {
            Ok(result) => result,
            Err(_) => Err(TranslateError::Timeout {
                engine: engine_key.to_string(),
                secs: timeout.as_secs(),
            }),
        }
    }

    /// Translate with the current engine, failing over by priority.
    ///
    /// Cache hits never contact an engine. Each failure moves the current
    /// pointer to the next available engine and retries there; the call gives
    /// up once no engine is left or `max_engine_hops` switches have been made.
    /// A switch event is only emitted when a retry follows it.
    pub async fn smart_translate(
        &self,
        text: &str,
        target_lang: &str,
        source_lang: &str,
    ) -> TranslateResult<TranslationResult> {
        if text.trim().is_empty() {
            return Err(TranslateError::Validation);
        }

        let cache_key = TranslationCache::key(text, source_lang, target_lang);
        if let Some(cached) = lock(&self.cache).get(&cache_key) {
            tracing::debug!("[TranslationManager] Cache hit");
            return Ok(TranslationResult {
                from_cache: true,
                ..cached.clone()
            });
        }

        let mut attempts = 0;
        loop {
            let Some((engine_key, adapter)) = self.current_adapter() else {
                return Err(TranslateError::AllEnginesExhausted {
                    attempts,
                    last_error: "no engines registered".to_string(),
                });
            };
            attempts += 1;

            tracing::debug!("[TranslationManager] Translating with {}", engine_key);
            match self
                .call_adapter(&engine_key, adapter.as_ref(), text, target_lang, source_lang)
                .await
            {
                Ok(result) => {
                    self.record_success(&engine_key);
                    lock(&self.cache).set(cache_key, result.clone());
                    return Ok(result);
                }
                Err(err) => {
                    tracing::warn!("[TranslationManager] {} failed: {}", engine_key, err);
                    self.record_failure(&engine_key, &err);

                    let exhausted = TranslateError::AllEnginesExhausted {
                        attempts,
                        last_error: err.to_string(),
                    };
                    if attempts - 1 >= self.settings.max_engine_hops {
                        return Err(exhausted);
                    }
                    match self.promote_next(&engine_key, SwitchReason::Failover) {
                        Some(next) => {
                            tracing::info!("[TranslationManager] Retrying with {}", next.name);
                        }
                        None => return Err(exhausted),
                    }
                }
            }
        }
    }

    pub async fn check_engine_health(&self, engine_key: &str) -> TranslateResult<HealthCheckRecord> {
        let adapter = self
            .adapter_for(engine_key)
            .ok_or_else(|| TranslateError::UnknownEngine(engine_key.to_string()))?;

        let timeout = self.settings.request_timeout;
        let started = Instant::now();
        let outcome = match tokio::time::timeout(timeout, adapter.probe()).await {
            Ok(result) => result,
            Err(_) => Err(TranslateError::Timeout {
                engine: engine_key.to_string(),
                secs: timeout.as_secs(),
            }),
        };
        let response_time_ms = started.elapsed().as_millis() as u64;

        let record = HealthCheckRecord {
            engine: engine_key.to_string(),
            timestamp: self.clock.now_millis(),
            healthy: outcome.is_ok(),
            response_time_ms,
            error: outcome.as_ref().err().map(|e| e.to_string()),
        };

        match &outcome {
            Ok(()) => {
                self.record_success(engine_key);
                tracing::debug!("[Health] {} healthy ({}ms)", engine_key, response_time_ms);
            }
            Err(err) => {
                self.record_failure(engine_key, err);
                tracing::warn!("[Health] {} check failed: {}", engine_key, err);
            }
        }

        let mut state = lock(&self.state);
        if let Some(idx) = state.index_of(engine_key) {
            state.slots[idx].last_check = Some(record.clone());
        }

        Ok(record)
    }

    /// Probe every engine concurrently, then move off the current engine if
    /// it ended up unavailable.
    pub async fn check_all_engines_health(&self) -> Vec<HealthCheckRecord> {
        let keys: Vec<String> = self.engines().into_iter().map(|e| e.key).collect();
        tracing::info!("[Health] Checking {} engine(s)", keys.len());

        let records: Vec<HealthCheckRecord> =
            join_all(keys.iter().map(|key| self.check_engine_health(key)))
                .await
                .into_iter()
                .filter_map(|r| r.ok())
                .collect();

        if let Some(current) = self.current_engine() {
            if !current.available {
                self.promote_next(&current.key, SwitchReason::HealthCheck);
            }
        }

        let available = records.iter().filter(|r| r.healthy).count();
        tracing::info!(
            "[Health] Check complete, {}/{} engine(s) available",
            available,
            records.len()
        );

        records
    }

    pub fn start_health_monitor(
        self: &Arc<Self>,
        interval: Duration,
        initial_delay: Duration,
    ) -> HealthMonitorHandle {
        HealthMonitorHandle::spawn(Arc::downgrade(self), interval, initial_delay)
    }
}
