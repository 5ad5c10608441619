pub mod adapter;
pub mod cache;
pub mod engine;
pub mod error;
pub mod facade;
pub mod health;
pub mod language;
pub mod llm;
pub mod machine_translate;
pub mod manager;

use anyhow::{Context, Result};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::fs;
use std::sync::Arc;
use std::time::Duration;

use crate::cli::{DetectArgs, TranslateArgs};
use crate::config::Config;
use crate::utils::truncate_display;
use adapter::TranslationAdapter;
use engine::{BuiltinEngine, EngineDescriptor};
use facade::{BatchItem, Translator};
use llm::{LlmAdapter, LlmConfig};
use machine_translate::{MachineTranslateAdapter, MachineTranslateConfig};
use manager::TranslationManager;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranslationStatus {
    Success,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationResult {
    pub translated_text: String,
    pub engine: String,
    pub confidence: f32,
    pub status: TranslationStatus,
    pub source_language: String,
    pub target_language: String,
    #[serde(default)]
    pub from_cache: bool,
}

impl TranslationResult {
    pub fn new(
        translated_text: &str,
        engine: &str,
        confidence: f32,
        source_language: &str,
        target_language: &str,
    ) -> Self {
        Self {
            translated_text: translated_text.to_string(),
            engine: engine.to_string(),
            confidence,
            status: TranslationStatus::Success,
            source_language: source_language.to_string(),
            target_language: target_language.to_string(),
            from_cache: false,
        }
    }
}

/// Build the engine registry and adapters described by `cfg`.
pub fn build_engines(
    cfg: &Config,
) -> Result<Vec<(EngineDescriptor, Arc<dyn TranslationAdapter>)>> {
    let timeout = cfg.request_timeout();
    let mut engines: Vec<(EngineDescriptor, Arc<dyn TranslationAdapter>)> = Vec::new();

    for builtin in BuiltinEngine::ALL {
        let key = builtin.key();
        let overrides = cfg.engine_override(key);
        if overrides.enabled == Some(false) {
            tracing::debug!("[Translate] {} disabled by config", key);
            continue;
        }

        let mut descriptor = builtin.descriptor();
        if let Some(priority) = overrides.priority {
            descriptor = descriptor.with_priority(priority);
        }

        let adapter: Arc<dyn TranslationAdapter> = if builtin.is_ai_model() {
            let api_key = cfg.zhipu_api_key();
            if api_key.is_none() {
                tracing::warn!(
                    "[Translate] No Zhipu API key configured; {} will fail over",
                    descriptor.name
                );
            }
            let config = LlmConfig::zhipu()
                .with_api_key(api_key)
                .with_base_url(Some(cfg.zhipu.base_url.clone()))
                .with_model(Some(cfg.zhipu.model.clone()))
                .with_timeout(timeout);
            Arc::new(LlmAdapter::new(config)?)
        } else {
            let config = MachineTranslateConfig::new(key)
                .with_endpoint(overrides.endpoint)
                .with_timeout(timeout);
            Arc::new(MachineTranslateAdapter::new(config)?)
        };

        engines.push((descriptor, adapter));
    }

    if engines.is_empty() {
        anyhow::bail!("All translation engines are disabled in the config");
    }

    Ok(engines)
}

pub fn build_manager(cfg: &Config) -> Result<TranslationManager> {
    let engines = build_engines(cfg)?;
    Ok(TranslationManager::new(engines, cfg.manager_settings()))
}

pub async fn run(args: TranslateArgs, cfg: &Config) -> Result<()> {
    let mut texts = args.texts.clone();
    if let Some(path) = &args.input {
        let content = fs::read_to_string(path)
            .context(format!("Failed to read input file: {}", path.display()))?;
        texts.extend(
            content
                .lines()
                .filter(|l| !l.trim().is_empty())
                .map(|l| l.to_string()),
        );
    }

    if texts.is_empty() {
        anyhow::bail!("Nothing to translate. Pass text arguments or --input <FILE>.");
    }

    let target = args
        .target
        .clone()
        .unwrap_or_else(|| cfg.translation.default_target.clone());
    let source = args
        .source
        .clone()
        .unwrap_or_else(|| cfg.translation.default_source.clone());

    let manager = Arc::new(build_manager(cfg)?);
    let translator = Translator::new(manager).with_batch_delay(cfg.batch_delay());

    if let Some(engine) = &args.engine {
        let engine = BuiltinEngine::from_key(engine)
            .map(|b| b.key().to_string())
            .unwrap_or_else(|| engine.clone());
        if translator.switch_engine(&engine).is_none() {
            anyhow::bail!(
                "{}",
                translator
                    .last_error()
                    .unwrap_or_else(|| format!("Cannot switch to {}", engine))
            );
        }
    }

    if texts.len() == 1 {
        translate_single(&translator, &texts[0], &target, &source, args.json).await
    } else {
        translate_batch(&translator, &texts, &target, &source, args.json).await
    }
}

async fn translate_single(
    translator: &Translator,
    text: &str,
    target: &str,
    source: &str,
    json: bool,
) -> Result<()> {
    let pb = ProgressBar::new_spinner();
    pb.set_message(format!("Translating \"{}\"", truncate_display(text, 40)));
    pb.enable_steady_tick(Duration::from_millis(100));

    let result = translator.translate(text, target, source).await;
    pb.finish_and_clear();

    let Some(result) = result else {
        anyhow::bail!(
            "{}",
            translator
                .last_error()
                .unwrap_or_else(|| "Translation failed".to_string())
        );
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    eprintln!(
        "{}",
        format!(
            "[Translate] {} ({} -> {}, confidence {:.2}{})",
            result.engine,
            result.source_language,
            result.target_language,
            result.confidence,
            if result.from_cache { ", cached" } else { "" }
        )
        .cyan()
    );
    println!("{}", result.translated_text);

    Ok(())
}

async fn translate_batch(
    translator: &Translator,
    texts: &[String],
    target: &str,
    source: &str,
    json: bool,
) -> Result<()> {
    let pb = ProgressBar::new(texts.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len}")?
            .progress_chars("=>-"),
    );
    pb.enable_steady_tick(Duration::from_millis(100));

    let results = translator
        .batch_translate(
            texts,
            target,
            source,
            Some(|count: usize| {
                pb.set_position(count as u64);
            }),
        )
        .await;

    pb.finish_and_clear();

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        print_batch(&results);
    }

    if results.iter().all(|r| !r.success) {
        anyhow::bail!("No text could be translated");
    }

    Ok(())
}

fn print_batch(results: &[BatchItem]) {
    for item in results {
        match (&item.translated, &item.error) {
            (Some(translated), _) => println!("{}", translated),
            (None, error) => eprintln!(
                "{}",
                format!(
                    "[ERROR] #{} \"{}\": {}",
                    item.index + 1,
                    truncate_display(&item.original, 40),
                    error.as_deref().unwrap_or("unknown error")
                )
                .red()
            ),
        }
    }

    let succeeded = results.iter().filter(|r| r.success).count();
    eprintln!(
        "{}",
        format!("[OK] Translated {}/{} entries", succeeded, results.len()).green()
    );
}

pub fn detect(args: DetectArgs) -> Result<()> {
    let code = language::detect_language(&args.text);
    println!("{} ({})", code, language::language_name(code));
    Ok(())
}
