//! Failover, caching and health checks in the translation manager

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{Behavior, MockAdapter, build, is_available, record_switches, registry, settings};
use iprompt::translate::adapter::TranslationAdapter;
use iprompt::translate::engine::{EngineDescriptor, EngineType};
use iprompt::translate::error::TranslateError;
use iprompt::translate::facade::Translator;
use iprompt::translate::health::Clock;
use iprompt::translate::manager::{ManagerSettings, SwitchReason, TranslationManager};

struct FixedClock(u64);

impl Clock for FixedClock {
    fn now_millis(&self) -> u64 {
        self.0
    }
}

#[tokio::test]
async fn test_second_call_is_served_from_cache() {
    let (manager, mocks) = build(&[("a", 1, Behavior::Succeed)], settings());

    let first = manager.smart_translate("hello", "zh", "en").await.unwrap();
    let second = manager.smart_translate("hello", "zh", "en").await.unwrap();

    assert!(!first.from_cache);
    assert!(second.from_cache);
    assert_eq!(first.translated_text, second.translated_text);
    assert_eq!(mocks[0].calls(), 1);
    assert_eq!(manager.cache_len(), 1);
}

#[tokio::test]
async fn test_cache_key_includes_languages() {
    let (manager, mocks) = build(&[("a", 1, Behavior::Succeed)], settings());

    manager.smart_translate("hello", "zh", "en").await.unwrap();
    manager.smart_translate("hello", "ja", "en").await.unwrap();
    manager.smart_translate("hello", "zh", "auto").await.unwrap();

    assert_eq!(mocks[0].calls(), 3);
    assert_eq!(manager.cache_len(), 3);
}

#[tokio::test]
async fn test_empty_text_never_reaches_an_engine() {
    let (manager, mocks) = build(&[("a", 1, Behavior::Succeed)], settings());

    let err = manager.smart_translate("   ", "zh", "en").await.unwrap_err();

    assert_eq!(err, TranslateError::Validation);
    assert_eq!(mocks[0].calls(), 0);
}

#[tokio::test]
async fn test_failover_moves_to_next_priority() {
    let (manager, mocks) = build(
        &[
            ("a", 1, Behavior::Fail),
            ("b", 2, Behavior::Succeed),
            ("c", 3, Behavior::Succeed),
        ],
        settings(),
    );
    let events = record_switches(&manager);

    let result = manager.smart_translate("hello", "zh", "en").await.unwrap();

    assert_eq!(result.engine, "b");
    assert!(!is_available(&manager, "a"));
    assert_eq!(manager.current_engine().unwrap().key, "b");
    assert_eq!(mocks[2].calls(), 0);

    let events = events.lock().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].previous, "a");
    assert_eq!(events[0].current.key, "b");
    assert_eq!(events[0].reason, SwitchReason::Failover);
}

#[tokio::test]
async fn test_failover_follows_priority_not_registration_order() {
    let (manager, _mocks) = build(
        &[
            ("a", 1, Behavior::Fail),
            ("c", 3, Behavior::Succeed),
            ("b", 2, Behavior::Succeed),
        ],
        settings(),
    );

    let result = manager.smart_translate("hello", "zh", "en").await.unwrap();
    assert_eq!(result.engine, "b");
}

#[tokio::test]
async fn test_all_engines_failing_is_exhaustion() {
    let (manager, mocks) = build(
        &[
            ("a", 1, Behavior::Fail),
            ("b", 2, Behavior::Fail),
            ("c", 3, Behavior::Fail),
        ],
        settings(),
    );

    let err = manager.smart_translate("hello", "zh", "en").await.unwrap_err();

    assert!(matches!(
        err,
        TranslateError::AllEnginesExhausted { attempts: 3, .. }
    ));
    assert!(mocks.iter().all(|m| m.calls() == 1));
    assert_eq!(manager.status_report().available_engines, 0);
    assert_eq!(manager.cache_len(), 0);
}

#[tokio::test]
async fn test_hop_limit_bounds_a_single_call() {
    let engines: Vec<(&str, i32, Behavior)> = ["a", "b", "c", "d", "e"]
        .iter()
        .enumerate()
        .map(|(i, key)| (*key, i as i32 + 1, Behavior::Fail))
        .collect();
    let (manager, mocks) = build(&engines, settings());
    let events = record_switches(&manager);

    let err = manager.smart_translate("hello", "zh", "en").await.unwrap_err();

    match err {
        TranslateError::AllEnginesExhausted {
            attempts,
            last_error,
        } => {
            assert_eq!(attempts, 4);
            assert!(last_error.starts_with("d:"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(mocks[4].calls(), 0);
    assert!(is_available(&manager, "e"));

    // No switch is announced for an engine that is never tried
    assert_eq!(manager.current_engine().unwrap().key, "d");
    let events = events.lock().unwrap();
    assert_eq!(events.len(), 3);
    assert!(events.iter().all(|e| e.current.key != "e"));
}

#[tokio::test]
async fn test_exhausted_engines_fail_fast_on_next_call() {
    let (manager, mocks) = build(
        &[("a", 1, Behavior::Fail), ("b", 2, Behavior::Fail)],
        settings(),
    );

    manager.smart_translate("one", "zh", "en").await.unwrap_err();
    let err = manager.smart_translate("two", "zh", "en").await.unwrap_err();

    // The current engine is still tried once even when marked unavailable
    assert!(matches!(
        err,
        TranslateError::AllEnginesExhausted { attempts: 1, .. }
    ));
    assert_eq!(mocks[0].calls() + mocks[1].calls(), 3);
}

#[tokio::test]
async fn test_success_restores_availability() {
    let (manager, mocks) = build(
        &[("a", 1, Behavior::Fail), ("b", 2, Behavior::Succeed)],
        settings(),
    );

    manager.smart_translate("one", "zh", "en").await.unwrap();
    assert!(!is_available(&manager, "a"));

    mocks[0].set_behavior(Behavior::Succeed);
    manager.switch_engine("a").unwrap();
    let result = manager.smart_translate("two", "zh", "en").await.unwrap();

    assert_eq!(result.engine, "a");
    assert!(is_available(&manager, "a"));
    let status = manager
        .engine_statuses()
        .into_iter()
        .find(|s| s.descriptor.key == "a")
        .unwrap();
    assert_eq!(status.consecutive_failures, 0);
}

#[tokio::test]
async fn test_manual_switch_is_tried_first() {
    let (manager, mocks) = build(
        &[("a", 1, Behavior::Succeed), ("b", 2, Behavior::Succeed)],
        settings(),
    );
    let events = record_switches(&manager);

    let engine = manager.switch_engine("b").unwrap();
    assert_eq!(engine.key, "b");

    let result = manager.smart_translate("hello", "zh", "en").await.unwrap();
    assert_eq!(result.engine, "b");
    assert_eq!(mocks[0].calls(), 0);

    let events = events.lock().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].reason, SwitchReason::Manual);
}

#[tokio::test]
async fn test_unknown_engine_is_rejected() {
    let (manager, _mocks) = build(&[("a", 1, Behavior::Succeed)], settings());

    assert_eq!(
        manager.switch_engine("nope").unwrap_err(),
        TranslateError::UnknownEngine("nope".to_string())
    );
    assert!(manager.check_engine_health("nope").await.is_err());
    assert_eq!(manager.current_engine().unwrap().key, "a");
}

#[tokio::test]
async fn test_missing_credentials_mark_engine_down_immediately() {
    let settings = ManagerSettings {
        failure_threshold: 3,
        ..settings()
    };
    let (manager, _mocks) = build(
        &[("a", 1, Behavior::MissingKey), ("b", 2, Behavior::Succeed)],
        settings,
    );

    let result = manager.smart_translate("hello", "zh", "en").await.unwrap();

    assert_eq!(result.engine, "b");
    assert!(!is_available(&manager, "a"));
}

#[tokio::test]
async fn test_failure_threshold_counts_consecutive_failures() {
    let settings = ManagerSettings {
        failure_threshold: 2,
        ..settings()
    };
    let (manager, _mocks) = build(
        &[("a", 1, Behavior::Fail), ("b", 2, Behavior::Succeed)],
        settings,
    );

    manager.smart_translate("one", "zh", "en").await.unwrap();
    assert!(is_available(&manager, "a"));

    manager.check_engine_health("a").await.unwrap();
    assert!(!is_available(&manager, "a"));
}

#[tokio::test]
async fn test_slow_engine_times_out_and_fails_over() {
    let settings = ManagerSettings {
        request_timeout: Duration::from_millis(50),
        ..settings()
    };
    let (manager, _mocks) = build(
        &[
            ("a", 1, Behavior::Hang(Duration::from_secs(5))),
            ("b", 2, Behavior::Succeed),
        ],
        settings,
    );

    let result = manager.smart_translate("hello", "zh", "en").await.unwrap();

    assert_eq!(result.engine, "b");
    assert!(!is_available(&manager, "a"));
}

#[tokio::test]
async fn test_health_check_marks_down_and_promotes() {
    let (manager, mocks) = build(
        &[("a", 1, Behavior::Fail), ("b", 2, Behavior::Succeed)],
        settings(),
    );
    let events = record_switches(&manager);

    let records = manager.check_all_engines_health().await;

    assert_eq!(records.len(), 2);
    let a = records.iter().find(|r| r.engine == "a").unwrap();
    assert!(!a.healthy);
    assert!(a.error.is_some());
    assert!(records.iter().find(|r| r.engine == "b").unwrap().healthy);
    assert_eq!(manager.current_engine().unwrap().key, "b");
    assert_eq!(events.lock().unwrap()[0].reason, SwitchReason::HealthCheck);

    // Recovery does not move the current engine back
    mocks[0].set_behavior(Behavior::Succeed);
    let record = manager.check_engine_health("a").await.unwrap();
    assert!(record.healthy);
    assert!(is_available(&manager, "a"));
    assert_eq!(manager.current_engine().unwrap().key, "b");

    let report = manager.status_report();
    assert_eq!(report.available_engines, 2);
    assert!(report.engines.iter().all(|e| e.last_check.is_some()));
}

#[tokio::test]
async fn test_health_monitor_runs_until_stopped() {
    let (manager, mocks) = build(
        &[("a", 1, Behavior::Fail), ("b", 2, Behavior::Succeed)],
        settings(),
    );

    let handle = manager.start_health_monitor(Duration::from_millis(20), Duration::ZERO);
    tokio::time::sleep(Duration::from_millis(150)).await;

    assert!(handle.is_running());
    assert!(!is_available(&manager, "a"));
    assert_eq!(manager.current_engine().unwrap().key, "b");

    handle.stop();
    tokio::time::sleep(Duration::from_millis(50)).await;
    let calls = mocks[1].calls();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(mocks[1].calls(), calls);
}

#[tokio::test]
async fn test_status_report_counts_engines() {
    let (manager, _mocks) = build(
        &[("a", 1, Behavior::Fail), ("b", 2, Behavior::Succeed)],
        settings(),
    );

    manager.smart_translate("hello", "zh", "en").await.unwrap();
    let report = manager.status_report();

    assert_eq!(report.current_engine, "B");
    assert_eq!(report.current_engine_key, "b");
    assert_eq!(report.total_engines, 2);
    assert_eq!(report.available_engines, 1);
    assert_eq!(report.cache_size, 1);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["engines"][0]["key"], "a");
    assert_eq!(json["engines"][0]["consecutiveFailures"], 1);
}

#[tokio::test]
async fn test_no_engines_registered() {
    let manager = TranslationManager::new(Vec::new(), ManagerSettings::default());

    assert!(manager.current_engine().is_none());
    assert_eq!(manager.status_report().current_engine, "None");
    let err = manager.smart_translate("hello", "zh", "en").await.unwrap_err();
    assert!(matches!(
        err,
        TranslateError::AllEnginesExhausted { attempts: 0, .. }
    ));
}

#[tokio::test]
async fn test_unsubscribed_listener_gets_no_events() {
    let (manager, _mocks) = build(
        &[("a", 1, Behavior::Succeed), ("b", 2, Behavior::Succeed)],
        settings(),
    );

    let id = manager.subscribe(|_| panic!("listener should be removed"));
    assert!(manager.unsubscribe(id));
    assert!(!manager.unsubscribe(id));

    manager.switch_engine("b").unwrap();
}

#[tokio::test]
async fn test_concurrent_calls_share_engine_state() {
    let (manager, mocks) = build(
        &[("a", 1, Behavior::Fail), ("b", 2, Behavior::Succeed)],
        settings(),
    );

    let (first, second) = tokio::join!(
        manager.smart_translate("one", "zh", "en"),
        manager.smart_translate("two", "zh", "en"),
    );

    assert_eq!(first.unwrap().engine, "b");
    assert_eq!(second.unwrap().engine, "b");
    assert!(!is_available(&manager, "a"));
    assert!(mocks[0].calls() <= 2);
    assert_eq!(mocks[1].calls(), 2);
    assert_eq!(manager.current_engine().unwrap().key, "b");
}

#[tokio::test]
async fn test_injected_clock_stamps_records() {
    const NOW: u64 = 1_700_000_000_000;
    let (engines, _mocks) = registry(&[("a", 1, Behavior::Succeed)]);
    let manager = Arc::new(
        TranslationManager::new(engines, settings()).with_clock(Arc::new(FixedClock(NOW))),
    );

    let record = manager.check_engine_health("a").await.unwrap();
    assert_eq!(record.timestamp, NOW);
    assert_eq!(manager.now_millis(), NOW);

    let translator = Translator::new(manager);
    translator.translate("hello", "zh", "en").await.unwrap();
    assert_eq!(translator.history()[0].timestamp, NOW);
}

#[tokio::test]
async fn test_mismatched_adapter_is_not_registered() {
    let good = MockAdapter::new("a", Behavior::Succeed);
    let wrong = MockAdapter::new("other", Behavior::Succeed);
    let engines: Vec<(EngineDescriptor, Arc<dyn TranslationAdapter>)> = vec![
        (
            EngineDescriptor::new("a", "A", 1, EngineType::Primary),
            good as Arc<dyn TranslationAdapter>,
        ),
        (
            EngineDescriptor::new("b", "B", 2, EngineType::Fallback),
            wrong as Arc<dyn TranslationAdapter>,
        ),
    ];

    let manager = TranslationManager::new(engines, settings());

    let keys: Vec<String> = manager.engines().into_iter().map(|e| e.key).collect();
    assert_eq!(keys, vec!["a".to_string()]);
    assert!(manager.switch_engine("b").is_err());
}

#[tokio::test]
async fn test_stop_interrupts_health_check_in_flight() {
    let settings = ManagerSettings {
        request_timeout: Duration::from_secs(30),
        ..settings()
    };
    let (manager, mocks) = build(&[("a", 1, Behavior::Hang(Duration::from_secs(30)))], settings);

    let handle = manager.start_health_monitor(Duration::from_secs(3600), Duration::ZERO);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(mocks[0].calls(), 1);
    assert_eq!(Arc::strong_count(&manager), 2);

    handle.stop();
    tokio::time::sleep(Duration::from_millis(100)).await;

    // The monitor task let go of the manager without waiting for the probe
    assert_eq!(Arc::strong_count(&manager), 1);
}
