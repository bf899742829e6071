//! Config command handlers

use std::path::PathBuf;

use anyhow::{Context, Result};

use tidings_core::Config;

use crate::output::{Output, OutputFormat};

/// Show current configuration
pub fn show(output: &Output) -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "backend": config.backend.to_string(),
                    "firebase_api_key": config.firebase_api_key.as_ref().map(|_| "(set)"),
                    "firebase_project_id": config.firebase_project_id,
                    "poll_interval_secs": config.poll_interval_secs,
                    "news_api_url": config.news_api_url,
                    "news_api_key": config.news_api_key.as_ref().map(|_| "(set)"),
                    "news_query": config.news_query,
                    "default_country": config.default_country,
                    "request_timeout_secs": config.request_timeout_secs,
                    "log_level": config.log_level
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", config.backend);
        }
        OutputFormat::Human => {
            println!("Configuration:");
            println!("  backend:              {}", config.backend);
            println!(
                "  firebase_api_key:     {}",
                secret(config.firebase_api_key.as_deref())
            );
            println!(
                "  firebase_project_id:  {}",
                config.firebase_project_id.as_deref().unwrap_or("(not set)")
            );
            println!("  poll_interval_secs:   {}", config.poll_interval_secs);
            println!("  news_api_url:         {}", config.news_api_url);
            println!(
                "  news_api_key:         {}",
                secret(config.news_api_key.as_deref())
            );
            println!("  news_query:           {}", config.news_query);
            println!("  default_country:      {}", config.default_country);
            println!("  request_timeout_secs: {}", config.request_timeout_secs);
            println!("  log_level:            {}", config.log_level);
            println!();
            println!("Config file: {}", Config::config_file_path().display());
        }
    }

    Ok(())
}

/// Set a configuration value
pub fn set(key: String, value: String, output: &Output) -> Result<()> {
    let path = Config::config_file_path();
    set_at(&path, &key, &value)?;
    output.success(&format!("Set {} = {}", key, display_value(&key, &value)));
    Ok(())
}

fn set_at(path: &PathBuf, key: &str, value: &str) -> Result<()> {
    let mut config = Config::load_from_path(path).context("Failed to load configuration")?;
    config.set_value(key, value).with_context(|| {
        format!(
            "Could not set '{}'. Valid keys: backend, firebase_api_key, \
             firebase_project_id, poll_interval_secs, news_api_url, news_api_key, \
             news_query, default_country, request_timeout_secs, log_level",
            key
        )
    })?;
    config
        .save_to_path(path)
        .context("Failed to save configuration")
}

fn secret(value: Option<&str>) -> &'static str {
    match value {
        Some(_) => "(set)",
        None => "(not set)",
    }
}

/// Keys are echoed back, but never in full
fn display_value<'a>(key: &str, value: &'a str) -> &'a str {
    if key.ends_with("_api_key") && !value.is_empty() {
        "(hidden)"
    } else {
        value
    }
}
