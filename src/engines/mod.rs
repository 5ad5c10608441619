//! Engine inspection and health-check commands

use anyhow::Result;
use colored::Colorize;
use std::sync::Arc;
use std::time::Duration;

use crate::cli::{EnginesAction, EnginesArgs};
use crate::config::Config;
use crate::translate::build_manager;
use crate::translate::engine::EngineDescriptor;
use crate::translate::health::HealthCheckRecord;
use crate::translate::language::supported_languages;
use crate::translate::manager::{StatusReport, TranslationManager};

pub async fn run(args: EnginesArgs, cfg: &Config) -> Result<()> {
    if let EnginesAction::Languages = args.action {
        for (code, name) in supported_languages() {
            println!("{:<4} {}", code, name);
        }
        return Ok(());
    }

    let manager = Arc::new(build_manager(cfg)?);

    match args.action {
        EnginesAction::List { json } => list(&manager, json),
        EnginesAction::Status { json } => status(&manager, json).await,
        EnginesAction::Check { engine } => check(&manager, engine.as_deref()).await,
        EnginesAction::Watch { interval } => {
            let interval = interval
                .map(|secs| Duration::from_secs(secs.max(1)))
                .unwrap_or_else(|| cfg.health_interval());
            watch(&manager, interval, cfg.health_initial_delay()).await
        }
        EnginesAction::Languages => Ok(()),
    }
}

fn sorted_by_priority(mut engines: Vec<EngineDescriptor>) -> Vec<EngineDescriptor> {
    engines.sort_by_key(|e| e.priority);
    engines
}

fn list(manager: &TranslationManager, json: bool) -> Result<()> {
    let engines = sorted_by_priority(manager.engines());

    if json {
        println!("{}", serde_json::to_string_pretty(&engines)?);
        return Ok(());
    }

    let current = manager.current_engine().map(|e| e.key).unwrap_or_default();
    for engine in engines {
        let marker = if engine.key == current { "*" } else { " " };
        println!(
            "{} {:<8} {:<18} priority {:<3} {:<8} {:>3} languages",
            marker,
            engine.key,
            engine.name,
            engine.priority,
            format!("{:?}", engine.engine_type).to_lowercase(),
            engine.languages
        );
    }

    Ok(())
}

async fn status(manager: &TranslationManager, json: bool) -> Result<()> {
    manager.check_all_engines_health().await;
    let report = manager.status_report();

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    Ok(())
}

fn print_report(report: &StatusReport) {
    println!(
        "{}",
        format!(
            "[Engines] Current: {} ({}/{} available, cache {})",
            report.current_engine,
            report.available_engines,
            report.total_engines,
            report.cache_size
        )
        .green()
    );

    for status in &report.engines {
        let engine = &status.descriptor;
        let state = if engine.available {
            "available".green()
        } else {
            "unavailable".red()
        };
        let detail = match &status.last_check {
            Some(check) => format!(
                "{}ms{}",
                check.response_time_ms,
                check
                    .error
                    .as_ref()
                    .map(|e| format!(" - {}", e))
                    .unwrap_or_default()
            ),
            None => "not checked".to_string(),
        };
        println!("  {:<8} {:<11} {}", engine.key, state, detail);
    }
}

fn print_record(record: &HealthCheckRecord) {
    if record.healthy {
        println!(
            "{}",
            format!("[OK] {} healthy ({}ms)", record.engine, record.response_time_ms).green()
        );
    } else {
        println!(
            "{}",
            format!(
                "[FAIL] {} ({}ms): {}",
                record.engine,
                record.response_time_ms,
                record.error.as_deref().unwrap_or("unknown error")
            )
            .red()
        );
    }
}

async fn check(manager: &TranslationManager, engine: Option<&str>) -> Result<()> {
    let records = match engine {
        Some(key) => vec![manager.check_engine_health(key).await?],
        None => manager.check_all_engines_health().await,
    };

    for record in &records {
        print_record(record);
    }

    Ok(())
}

async fn watch(
    manager: &Arc<TranslationManager>,
    interval: Duration,
    initial_delay: Duration,
) -> Result<()> {
    let listener = manager.subscribe(|event| {
        println!(
            "{}",
            format!(
                "[Engines] Switched {} -> {} ({:?})",
                event.previous, event.current.key, event.reason
            )
            .yellow()
        );
    });

    let monitor = manager.start_health_monitor(interval, initial_delay);
    println!(
        "{}",
        format!(
            "[Engines] Checking every {}s, press Ctrl-C to stop",
            interval.as_secs()
        )
        .cyan()
    );

    // Report slightly after each monitor tick so the probes have landed
    let mut ticker = tokio::time::interval_at(
        tokio::time::Instant::now() + initial_delay + Duration::from_secs(1),
        interval,
    );
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = ticker.tick() => print_report(&manager.status_report()),
        }
    }

    monitor.stop();
    manager.unsubscribe(listener);
    println!("{}", "[Engines] Stopped".green());

    Ok(())
}
