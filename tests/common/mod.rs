//! Scripted translation engines for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use iprompt::translate::TranslationResult;
use iprompt::translate::adapter::TranslationAdapter;
use iprompt::translate::engine::{EngineDescriptor, EngineType};
use iprompt::translate::error::{TranslateError, TranslateResult};
use iprompt::translate::manager::{EngineSwitchEvent, ManagerSettings, TranslationManager};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Behavior {
    Succeed,
    Fail,
    MissingKey,
    Hang(Duration),
}

pub struct MockAdapter {
    key: String,
    behavior: Mutex<Behavior>,
    slow_text: Mutex<Option<(String, Duration)>>,
    calls: AtomicUsize,
}

impl MockAdapter {
    pub fn new(key: &str, behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            key: key.to_string(),
            behavior: Mutex::new(behavior),
            slow_text: Mutex::new(None),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn set_behavior(&self, behavior: Behavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    /// `text` succeeds after `delay` whatever the configured behavior.
    pub fn set_slow_text(&self, text: &str, delay: Duration) {
        *self.slow_text.lock().unwrap() = Some((text.to_string(), delay));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TranslationAdapter for MockAdapter {
    fn engine_key(&self) -> &str {
        &self.key
    }

    async fn translate(
        &self,
        text: &str,
        target_lang: &str,
        source_lang: &str,
    ) -> TranslateResult<TranslationResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let slow = self.slow_text.lock().unwrap().clone();
        if let Some((slow_text, delay)) = slow {
            if slow_text == text {
                tokio::time::sleep(delay).await;
                return Ok(TranslationResult::new(text, &self.key, 0.9, source_lang, target_lang));
            }
        }

        let behavior = *self.behavior.lock().unwrap();
        match behavior {
            Behavior::Succeed => Ok(TranslationResult::new(
                &format!("[{}] {}", self.key, text),
                &self.key,
                0.9,
                source_lang,
                target_lang,
            )),
            Behavior::Fail => Err(TranslateError::adapter(&self.key, "service unavailable")),
            Behavior::MissingKey => Err(TranslateError::CredentialMissing {
                engine: self.key.clone(),
            }),
            Behavior::Hang(delay) => {
                tokio::time::sleep(delay).await;
                Ok(TranslationResult::new(text, &self.key, 0.9, source_lang, target_lang))
            }
        }
    }
}

pub type Registry = Vec<(EngineDescriptor, Arc<dyn TranslationAdapter>)>;

/// Engines are given as `(key, priority, behavior)`.
pub fn registry(engines: &[(&str, i32, Behavior)]) -> (Registry, Vec<Arc<MockAdapter>>) {
    let mocks: Vec<Arc<MockAdapter>> = engines
        .iter()
        .map(|(key, _, behavior)| MockAdapter::new(key, *behavior))
        .collect();

    let registry: Registry = engines
        .iter()
        .zip(&mocks)
        .map(|((key, priority, _), mock)| {
            let engine_type = if *priority == 1 {
                EngineType::Primary
            } else {
                EngineType::Fallback
            };
            (
                EngineDescriptor::new(key, &key.to_uppercase(), *priority, engine_type),
                mock.clone() as Arc<dyn TranslationAdapter>,
            )
        })
        .collect();

    (registry, mocks)
}

pub fn build(
    engines: &[(&str, i32, Behavior)],
    settings: ManagerSettings,
) -> (Arc<TranslationManager>, Vec<Arc<MockAdapter>>) {
    let (registry, mocks) = registry(engines);
    (Arc::new(TranslationManager::new(registry, settings)), mocks)
}

pub fn settings() -> ManagerSettings {
    ManagerSettings {
        request_timeout: Duration::from_secs(2),
        ..Default::default()
    }
}

/// Collects switch events delivered to a manager listener.
pub fn record_switches(manager: &TranslationManager) -> Arc<Mutex<Vec<EngineSwitchEvent>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    manager.subscribe(move |event| sink.lock().unwrap().push(event.clone()));
    events
}

pub fn is_available(manager: &TranslationManager, key: &str) -> bool {
    manager
        .engines()
        .into_iter()
        .find(|e| e.key == key)
        .map(|e| e.available)
        .unwrap_or(false)
}
