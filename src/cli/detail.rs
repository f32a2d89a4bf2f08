// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use anyhow::{Context, Result};
use inquire::Select;
use std::io::IsTerminal;
use std::time::Duration;

use super::{CommandContext, OutputFormat, with_spinner};
use moviecat::api::Subject;
use moviecat::api::types::extract_subject;
use moviecat::player::MpvBackend;
use moviecat::views::episodes::{self, EpisodePlayer};
use moviecat::views::movie::{self, MovieController};
use moviecat::views::{EpisodeListView, MovieView, QualityOption, SeriesView, SubtitleOption, series};

const NO_SUBTITLES: &str = "No subtitles";

/// Block until the mpv window driven by `backend` is closed.
async fn wait_for_player(backend: &MpvBackend) {
    backend.flush().await;
    while backend.is_running().await {
        tokio::time::sleep(Duration::from_millis(500)).await;
    }
    backend.shutdown().await;
}

fn interactive() -> bool {
    std::io::stdin().is_terminal() && std::io::stdout().is_terminal()
}

fn print_subject(subject: &Subject) {
    println!("{}", subject.title);
    if !subject.description.is_empty() {
        println!("\n{}", subject.description);
    }
    if let Some(cover) = &subject.cover {
        println!("\nCover: {}", cover);
    }
}

pub struct MovieCommand {
    pub id: String,
    pub play: bool,
    /// Quality label to start with, instead of the best one.
    pub quality: Option<String>,
    /// Subtitle name to attach once playing.
    pub subtitle: Option<String>,
    pub format: OutputFormat,
}

impl MovieCommand {
    pub async fn execute(self, context: CommandContext) -> Result<()> {
        let view = with_spinner("Loading movie...", movie::load(&context.api, &self.id)).await;

        if !self.play {
            return self.format.emit(&view, print_movie);
        }
        if let Some(message) = &view.error {
            anyhow::bail!("{}", message);
        }
        context.player.ensure_available()?;

        let quality = self.pick_quality(&view)?;
        let subtitle = self.pick_subtitle(&view)?;

        let backend = MpvBackend::new(context.config.player.clone());
        let mut controller = MovieController::new(backend.clone());
        let token = controller.begin_load();
        controller.apply(token, view).await;

        if let Some(option) = quality {
            let best_url = controller
                .view()
                .and_then(|v| v.best_source())
                .and_then(|s| s.url.clone());
            if best_url.as_deref() != Some(option.url.as_str()) {
                println!("Switching to {}", option.text);
                controller.choose_quality(&option.url).await;
            }
        }
        if subtitle.is_some() {
            controller.choose_subtitle_option(subtitle.as_ref()).await;
        }

        match controller.surface().source() {
            Some(source) => println!("Playing {}", source),
            None => anyhow::bail!("No playable url"),
        }
        wait_for_player(&backend).await;
        Ok(())
    }

    fn pick_quality(&self, view: &MovieView) -> Result<Option<QualityOption>> {
        let playable: Vec<QualityOption> = view
            .qualities
            .iter()
            .filter(|q| !q.url.is_empty())
            .cloned()
            .collect();

        if let Some(wanted) = &self.quality {
            let found = playable
                .into_iter()
                .find(|q| q.label.eq_ignore_ascii_case(wanted))
                .with_context(|| format!("No source with quality {}", wanted))?;
            return Ok(Some(found));
        }

        if playable.len() < 2 || !interactive() {
            return Ok(None);
        }

        let texts: Vec<String> = playable.iter().map(|q| q.text.clone()).collect();
        let start = view
            .best_source()
            .and_then(|best| playable.iter().position(|q| q.label == best.label))
            .unwrap_or(0);
        let chosen = Select::new("Quality:", texts)
            .with_starting_cursor(start)
            .prompt()?;
        Ok(playable.into_iter().find(|q| q.text == chosen))
    }

    fn pick_subtitle(&self, view: &MovieView) -> Result<Option<SubtitleOption>> {
        let options: Vec<SubtitleOption> = view
            .subtitle_options()
            .into_iter()
            .filter(|s| !s.url.is_empty())
            .collect();

        if let Some(wanted) = &self.subtitle {
            let found = options
                .into_iter()
                .find(|s| s.name.eq_ignore_ascii_case(wanted))
                .with_context(|| format!("No subtitle named {}", wanted))?;
            return Ok(Some(found));
        }

        if options.is_empty() || !interactive() {
            return Ok(None);
        }

        let mut names = vec![NO_SUBTITLES.to_string()];
        names.extend(options.iter().map(|s| s.name.clone()));
        let chosen = Select::new("Subtitles:", names).prompt()?;
        Ok(options.into_iter().find(|s| s.name == chosen))
    }
}

fn print_movie(view: &MovieView) {
    if let Some(message) = &view.error {
        println!("{}", message);
        return;
    }
    if let Some(subject) = &view.subject {
        print_subject(subject);
    }
    if let Some(trailer) = &view.trailer {
        println!("Trailer: {}", trailer.embed_url());
    }

    println!("\nQualities:");
    if view.qualities.is_empty() {
        println!("  (none)");
    }
    for (i, quality) in view.qualities.iter().enumerate() {
        let marker = if view.best == Some(i) { "*" } else { " " };
        println!("{} {:<20} {}", marker, quality.text, quality.url);
    }

    if !view.subtitles.is_empty() {
        println!("\nSubtitles:");
        for sub in &view.subtitles {
            println!("  {:<20} {}", sub.name, sub.url.as_deref().unwrap_or("-"));
        }
    }
}

pub struct SeriesCommand {
    pub id: String,
    pub format: OutputFormat,
}

impl SeriesCommand {
    pub async fn execute(self, context: CommandContext) -> Result<()> {
        let view = with_spinner("Loading series...", series::load(&context.api, &self.id)).await;
        self.format.emit(&view, print_series)
    }
}

fn print_series(view: &SeriesView) {
    if let Some(message) = &view.message {
        println!("{}", message);
        return;
    }
    if let Some(subject) = &view.subject {
        print_subject(subject);
    }

    if !view.seasons.buttons.is_empty() {
        println!("\nSeasons:");
        for button in &view.seasons.buttons {
            println!("  {:<6} {}", button.season, button.label);
        }
    }
    for notice in &view.seasons.notices {
        println!("{}", notice);
    }
    if let Some(guessed) = &view.seasons.guessed {
        print_episodes(guessed);
    }
}

pub struct EpisodesCommand {
    pub series_id: String,
    pub season: String,
    pub format: OutputFormat,
}

impl EpisodesCommand {
    pub async fn execute(self, context: CommandContext) -> Result<()> {
        let (view, _) = with_spinner(
            "Loading episodes...",
            episodes::load_episodes(&context.api, &self.series_id, &self.season),
        )
        .await;
        self.format.emit(&view, print_episodes)
    }
}

fn print_episodes(view: &EpisodeListView) {
    println!("\nSeason {}:", view.season);
    if let Some(message) = &view.message {
        println!("  {}", message);
    }
    for card in &view.cards {
        println!(
            "  {:<6} {}",
            card.episode_id.as_deref().unwrap_or("-"),
            card.title
        );
    }
}

pub struct EpisodeCommand {
    pub series_id: String,
    pub season: String,
    pub episode_id: String,
    pub play: bool,
    pub format: OutputFormat,
}

impl EpisodeCommand {
    pub async fn execute(self, context: CommandContext) -> Result<()> {
        if !self.play {
            let view = with_spinner(
                "Loading episode sources...",
                episodes::load_episode_player(
                    &context.api,
                    &self.series_id,
                    &self.season,
                    &self.episode_id,
                ),
            )
            .await;
            return self.format.emit(&view, |view| {
                println!("{}", view.title);
                if let Some(message) = &view.message {
                    println!("{}", message);
                }
                for (i, source) in view.sources.iter().enumerate() {
                    let marker = if view.default == Some(i) { "*" } else { " " };
                    println!(
                        "{} {:<10} {:<10} {}",
                        marker,
                        source.label,
                        source.size_label(),
                        source.url.as_deref().unwrap_or("-")
                    );
                }
            });
        }

        context.player.ensure_available()?;
        let backend = MpvBackend::new(context.config.player.clone());
        let mut player = EpisodePlayer::new(backend.clone());
        player
            .open(&context.api, &self.series_id, &self.season, &self.episode_id)
            .await;

        if let Some(message) = player.view().and_then(|v| v.message.clone()) {
            anyhow::bail!("{}", message);
        }
        match player.surface().source() {
            Some(source) => println!("Playing {}", source),
            None => anyhow::bail!("No playable url"),
        }
        wait_for_player(&backend).await;
        Ok(())
    }
}

pub struct TrailerCommand {
    pub id: String,
    pub play: bool,
}

impl TrailerCommand {
    pub async fn execute(self, context: CommandContext) -> Result<()> {
        let info = context
            .api
            .info(&self.id)
            .await
            .with_context(|| format!("Failed to load info for {}", self.id))?;
        let subject = extract_subject(&info)
            .map(Subject::from_value)
            .with_context(|| format!("No info for {}", self.id))?;

        let Some(trailer) = movie::resolve_trailer(&context.api, &self.id, &subject).await else {
            println!("No trailer available for {}", subject.title);
            return Ok(());
        };

        println!("{}", trailer.embed_url());
        if self.play {
            let title = format!("{} (trailer)", subject.title);
            context
                .player
                .play_blocking(&trailer.playable_url(), &title, None)
                .await?;
        }
        Ok(())
    }
}
