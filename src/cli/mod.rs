// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use anyhow::Result;
use clap::ValueEnum;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::future::Future;
use std::time::Duration;

use moviecat::api::MovieApi;
use moviecat::config::Config;
use moviecat::player::Player;

pub mod cache;
pub mod detail;
pub mod raw;
pub mod search;

pub use cache::CacheCommand;
pub use detail::{EpisodeCommand, EpisodesCommand, MovieCommand, SeriesCommand, TrailerCommand};
pub use raw::RawCommand;
pub use search::SearchCommand;

/// Output format for command results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    /// Print `value` as pretty JSON, or fall back to the text renderer.
    pub fn emit<T: Serialize>(self, value: &T, text: impl FnOnce(&T)) -> Result<()> {
        match self {
            Self::Json => println!("{}", serde_json::to_string_pretty(value)?),
            Self::Text => text(value),
        }
        Ok(())
    }
}

/// Everything a command needs to talk to the catalog and the player
pub struct CommandContext {
    pub config: Config,
    pub api: MovieApi,
    pub player: Player,
}

impl CommandContext {
    pub fn new(config: Config, api: MovieApi, player: Player) -> Self {
        Self {
            config,
            api,
            player,
        }
    }
}

/// Run `fut` behind a spinner on stderr.
pub async fn with_spinner<T>(message: &str, fut: impl Future<Output = T>) -> T {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));

    let result = fut.await;
    spinner.finish_and_clear();
    result
}
