//! Config command handlers

use anyhow::{Context, Result};
use colored::Colorize;
use std::str::FromStr;

use super::Config;
use crate::cli::{ConfigAction, ConfigArgs};
use crate::utils::mask_key;

pub fn run(args: ConfigArgs) -> Result<()> {
    match args.action {
        ConfigAction::Show => show_config(),
        ConfigAction::Init { force } => init_config(force),
        ConfigAction::Set { key, value } => set_config(&key, &value),
        ConfigAction::Get { key } => get_config(&key),
        ConfigAction::Path => show_path(),
        ConfigAction::Edit => edit_config(),
    }
}

fn show_config() -> Result<()> {
    let mut config = Config::load()?;
    config.zhipu.api_key = config.zhipu.api_key.map(|k| mask_key(&k));
    let content = toml::to_string_pretty(&config)?;

    println!("{}", "[Config]".green());
    println!("{}", content);

    Ok(())
}

fn init_config(force: bool) -> Result<()> {
    let path = Config::config_path().context("Could not determine config path")?;

    if path.exists() && !force {
        println!(
            "{}",
            format!("Config file already exists: {}", path.display()).yellow()
        );
        println!("Use --force to overwrite");
        return Ok(());
    }

    let saved_path = Config::default().save()?;

    println!("{}", "[Config] Initialized".green());
    println!("  Created: {}", saved_path.display());
    println!();
    println!("Set your Zhipu API key to enable AI translation:");
    println!("  iprompt config set zhipu.api_key <KEY>");

    Ok(())
}

fn optional(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn parse<T: FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .parse()
        .with_context(|| format!("Invalid value for {}: {}", key, value))
}

/// Apply `key = value` to a config. Keys are dotted paths like
/// `translation.batch_delay_ms` or `engines.baidu.priority`.
pub fn apply_setting(config: &mut Config, key: &str, value: &str) -> Result<()> {
    let parts: Vec<&str> = key.split('.').collect();

    match parts.as_slice() {
        ["general", "verbose"] => config.general.verbose = parse(key, value)?,
        ["zhipu", "api_key"] => config.zhipu.api_key = optional(value.trim()),
        ["zhipu", "base_url"] => config.zhipu.base_url = value.to_string(),
        ["zhipu", "model"] => config.zhipu.model = value.to_string(),
        ["translation", "default_target"] => {
            config.translation.default_target = value.to_string()
        }
        ["translation", "default_source"] => {
            config.translation.default_source = value.to_string()
        }
        ["translation", "batch_delay_ms"] => {
            config.translation.batch_delay_ms = parse(key, value)?
        }
        ["translation", "request_timeout_secs"] => {
            config.translation.request_timeout_secs = parse(key, value)?
        }
        ["translation", "cache_capacity"] => {
            config.translation.cache_capacity = parse(key, value)?
        }
        ["translation", "max_engine_hops"] => {
            config.translation.max_engine_hops = parse(key, value)?
        }
        ["translation", "failure_threshold"] => {
            config.translation.failure_threshold = parse(key, value)?
        }
        ["health", "interval_secs"] => config.health.interval_secs = parse(key, value)?,
        ["health", "initial_delay_secs"] => {
            config.health.initial_delay_secs = parse(key, value)?
        }
        ["engines", engine, field] => {
            let entry = config.engines.entry(engine.to_string()).or_default();
            match *field {
                "priority" => entry.priority = optional(value).map(|v| parse(key, &v)).transpose()?,
                "endpoint" => entry.endpoint = optional(value),
                "enabled" => entry.enabled = optional(value).map(|v| parse(key, &v)).transpose()?,
                _ => anyhow::bail!("Unknown config key: {}", key),
            }
        }
        _ => anyhow::bail!("Unknown config key: {}", key),
    }

    Ok(())
}

/// Read a setting as display text. Secrets are masked.
pub fn read_setting(config: &Config, key: &str) -> Result<Option<String>> {
    let parts: Vec<&str> = key.split('.').collect();
    let t = &config.translation;

    let value = match parts.as_slice() {
        ["general", "verbose"] => Some(config.general.verbose.to_string()),
        ["zhipu", "api_key"] => config.zhipu.api_key.as_deref().map(mask_key),
        ["zhipu", "base_url"] => Some(config.zhipu.base_url.clone()),
        ["zhipu", "model"] => Some(config.zhipu.model.clone()),
        ["translation", "default_target"] => Some(t.default_target.clone()),
        ["translation", "default_source"] => Some(t.default_source.clone()),
        ["translation", "batch_delay_ms"] => Some(t.batch_delay_ms.to_string()),
        ["translation", "request_timeout_secs"] => Some(t.request_timeout_secs.to_string()),
        ["translation", "cache_capacity"] => Some(t.cache_capacity.to_string()),
        ["translation", "max_engine_hops"] => Some(t.max_engine_hops.to_string()),
        ["translation", "failure_threshold"] => Some(t.failure_threshold.to_string()),
        ["health", "interval_secs"] => Some(config.health.interval_secs.to_string()),
        ["health", "initial_delay_secs"] => Some(config.health.initial_delay_secs.to_string()),
        ["engines", engine, field] => {
            let entry = config.engine_override(engine);
            match *field {
                "priority" => entry.priority.map(|p| p.to_string()),
                "endpoint" => entry.endpoint,
                "enabled" => entry.enabled.map(|e| e.to_string()),
                _ => anyhow::bail!("Unknown config key: {}", key),
            }
        }
        _ => anyhow::bail!("Unknown config key: {}", key),
    };

    Ok(value)
}

fn set_config(key: &str, value: &str) -> Result<()> {
    let mut config = Config::load()?;
    apply_setting(&mut config, key, value)?;
    config.save()?;

    let shown = if key == "zhipu.api_key" {
        mask_key(value)
    } else {
        value.to_string()
    };
    println!("{}", format!("[Config] Set {} = {}", key, shown).green());

    Ok(())
}

fn get_config(key: &str) -> Result<()> {
    let config = Config::load()?;

    match read_setting(&config, key)? {
        Some(v) => println!("{} = {}", key, v),
        None => println!("{} = (not set)", key),
    }

    Ok(())
}

fn show_path() -> Result<()> {
    match Config::config_path() {
        Some(path) => {
            println!("{}", path.display());
            if path.exists() {
                println!("{}", "(exists)".green());
            } else {
                println!("{}", "(not created)".yellow());
            }
        }
        None => {
            println!("{}", "Could not determine config path".red());
        }
    }
    Ok(())
}

fn edit_config() -> Result<()> {
    let path = Config::config_path().context("Could not determine config path")?;

    if !path.exists() {
        Config::default().save_to(&path)?;
        println!("{}", "[Config] Created default config".green());
    }

    let editor = std::env::var("EDITOR")
        .or_else(|_| std::env::var("VISUAL"))
        .unwrap_or_else(|_| {
            if cfg!(windows) {
                "notepad".to_string()
            } else {
                "nano".to_string()
            }
        });

    println!("Opening config with: {}", editor);
    println!("Path: {}", path.display());

    std::process::Command::new(&editor)
        .arg(&path)
        .status()
        .context(format!("Failed to open editor: {}", editor))?;

    Ok(())
}
