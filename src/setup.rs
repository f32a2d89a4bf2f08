// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use anyhow::Result;
use inquire::validator::Validation;
use inquire::{Confirm, CustomType, Text};
use std::path::Path;
use std::time::Duration;

use crate::api::MovieApi;
use crate::cache::ResponseCache;
use crate::config::{ApiConfig, Config};

/// Write a config file to `path`, prompting for the main settings unless
/// `use_defaults` is set.
pub async fn init_config(path: &Path, use_defaults: bool) -> Result<()> {
    if path.exists() && !use_defaults {
        let overwrite = Confirm::new(&format!("{} exists. Overwrite it?", path.display()))
            .with_default(false)
            .prompt()?;
        if !overwrite {
            return Ok(());
        }
    }

    let config = if use_defaults {
        Config::default()
    } else {
        prompt_for_config().await?
    };

    save_config(&config, path)?;
    println!("You can now run 'moviecat' to launch the interactive TUI");
    Ok(())
}

async fn prompt_for_config() -> Result<Config> {
    let defaults = Config::default();
    let mut config = defaults.clone();

    config.api.base_url = Text::new("Catalog API base URL:")
        .with_default(&defaults.api.base_url)
        .with_validator(|input: &str| {
            if !input.starts_with("http://") && !input.starts_with("https://") {
                Ok(Validation::Invalid(
                    "URL must start with http:// or https://".into(),
                ))
            } else {
                Ok(Validation::Valid)
            }
        })
        .prompt()?
        .trim_end_matches('/')
        .to_string();

    println!("\nTesting connection...");
    if let Err(e) = test_connection(&config.api).await {
        println!("Warning: Could not reach the catalog: {}", e);
        println!("    The URL will be saved anyway.");
    } else {
        println!("Connection successful!");
    }

    config.cache.ttl_seconds = CustomType::<u64>::new("Cache lifetime in seconds:")
        .with_default(defaults.cache.ttl_seconds)
        .prompt()?;

    config.player.command = Text::new("Video player command:")
        .with_default(&defaults.player.command)
        .with_help_message("Playback is driven over mpv's JSON IPC")
        .prompt()?;

    Ok(config)
}

async fn test_connection(api_config: &ApiConfig) -> Result<()> {
    let api = MovieApi::new(api_config, ResponseCache::new()?)?;
    match tokio::time::timeout(Duration::from_secs(10), api.request_raw("/search/popular")).await {
        Ok(Ok(_)) => Ok(()),
        Ok(Err(e)) => Err(anyhow::anyhow!("Failed to connect: {}", e)),
        Err(_) => Err(anyhow::anyhow!("Connection timeout")),
    }
}

fn save_config(config: &Config, path: &Path) -> Result<()> {
    if path.exists() {
        let backup_path = path.with_extension("toml.backup");
        std::fs::copy(path, &backup_path)?;
        println!("Existing config backed up to: {}", backup_path.display());
    }

    config.save(path)?;
    println!("Configuration saved to: {}", path.display());
    Ok(())
}
