// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use serde::Serialize;
use tracing::{debug, info};

use crate::api::types::episode_list;
use crate::api::{Episode, EpisodeSources, MovieApi, Source};
use crate::fallback::FallbackChain;
use crate::format::is_truthy;
use crate::playback::{PlaybackBackend, PlaybackSurface};
use crate::session::{SessionToken, Sessions};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpisodeCard {
    pub title: String,
    pub overview: String,
    pub cover: Option<String>,
    /// Identifier handed to the episode player.
    pub episode_id: Option<String>,
}

impl From<Episode> for EpisodeCard {
    fn from(ep: Episode) -> Self {
        Self {
            title: ep.title,
            overview: ep.overview,
            cover: ep.cover,
            episode_id: ep.id,
        }
    }
}

/// Episode grid of one season.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpisodeListView {
    pub series_id: String,
    pub season: String,
    pub cards: Vec<EpisodeCard>,
    pub message: Option<String>,
}

impl EpisodeListView {
    fn message(series_id: &str, season: &str, text: &str) -> Self {
        Self {
            series_id: series_id.to_string(),
            season: season.to_string(),
            cards: Vec::new(),
            message: Some(text.to_string()),
        }
    }
}

/// Episodes of `season`, trying the path form then the query form.
///
/// The flag tells whether at least one episode was found.
pub async fn load_episodes(
    api: &MovieApi,
    series_id: &str,
    season: &str,
) -> (EpisodeListView, bool) {
    let data = FallbackChain::new("episodes")
        .step("path", || async move {
            let data = api.episodes_by_path(series_id, season).await?;
            Ok(is_truthy(&data).then_some(data))
        })
        .step("query", || async move {
            let data = api.episodes_by_query(series_id, season).await?;
            Ok(is_truthy(&data).then_some(data))
        })
        .run()
        .await;

    let Some(data) = data else {
        return (
            EpisodeListView::message(
                series_id,
                season,
                "Episodes not available for this series/season.",
            ),
            false,
        );
    };

    let episodes = episode_list(&data);
    if episodes.is_empty() {
        return (
            EpisodeListView::message(series_id, season, "No episodes found."),
            false,
        );
    }

    debug!(
        "Series {} season {}: {} episodes",
        series_id,
        season,
        episodes.len()
    );
    let view = EpisodeListView {
        series_id: series_id.to_string(),
        season: season.to_string(),
        cards: episodes.into_iter().map(EpisodeCard::from).collect(),
        message: None,
    };
    (view, true)
}

/// Sources of one episode ready for the episode player.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpisodePlayerView {
    pub title: String,
    pub sources: Vec<Source>,
    /// Index played on arrival: the last source in list order.
    pub default: Option<usize>,
    pub message: Option<String>,
}

impl EpisodePlayerView {
    pub fn default_source(&self) -> Option<&Source> {
        self.default.and_then(|i| self.sources.get(i))
    }
}

pub async fn load_episode_player(
    api: &MovieApi,
    series_id: &str,
    season: &str,
    episode_id: &str,
) -> EpisodePlayerView {
    let found = FallbackChain::new("episode sources")
        .step("sources by episode", || async move {
            let data = api.sources(episode_id).await?;
            Ok(EpisodeSources::from_value(&data))
        })
        .step("sources by season", || async move {
            let data = api.episode_sources(series_id, season, episode_id).await?;
            Ok(EpisodeSources::from_value(&data))
        })
        .step("episode info", || async move {
            let info = api.info(episode_id).await?;
            Ok(info.get("results").and_then(EpisodeSources::from_value))
        })
        .run()
        .await;

    match found {
        Some(EpisodeSources { title, sources }) => EpisodePlayerView {
            title,
            default: sources.len().checked_sub(1),
            sources,
            message: None,
        },
        None => EpisodePlayerView {
            title: "Episode".into(),
            sources: Vec::new(),
            default: None,
            message: Some("No sources found for this episode".into()),
        },
    }
}

/// The episode player panel.
#[derive(Debug)]
pub struct EpisodePlayer<B> {
    surface: PlaybackSurface<B>,
    sessions: Sessions,
    view: Option<EpisodePlayerView>,
    active: Option<usize>,
}

impl<B: PlaybackBackend> EpisodePlayer<B> {
    pub fn new(backend: B) -> Self {
        Self {
            surface: PlaybackSurface::new(backend),
            sessions: Sessions::new(),
            view: None,
            active: None,
        }
    }

    pub fn view(&self) -> Option<&EpisodePlayerView> {
        self.view.as_ref()
    }

    pub fn surface(&self) -> &PlaybackSurface<B> {
        &self.surface
    }

    pub fn active(&self) -> Option<usize> {
        self.active
    }

    /// Show the panel empty and paused while a new episode loads.
    pub async fn begin_load(&mut self) -> SessionToken {
        self.view = None;
        self.active = None;
        self.surface.stop().await;
        self.sessions.begin()
    }

    pub async fn apply(&mut self, token: SessionToken, view: EpisodePlayerView) -> bool {
        if !self.sessions.is_current(token) {
            debug!("Dropping stale episode load {}", token.id());
            return false;
        }

        if let Some(url) = view.default_source().and_then(|s| s.url.as_deref()) {
            info!("Playing {} ({})", view.title, url);
            self.surface.swap_source(url).await;
        }
        self.active = view.default;
        self.view = Some(view);
        true
    }

    pub async fn open(&mut self, api: &MovieApi, series_id: &str, season: &str, episode_id: &str) {
        let token = self.begin_load().await;
        let view = load_episode_player(api, series_id, season, episode_id).await;
        self.apply(token, view).await;
    }

    /// Quick source control. Sources without an address do nothing.
    pub async fn choose(&mut self, index: usize) -> bool {
        let Some(url) = self
            .view
            .as_ref()
            .and_then(|v| v.sources.get(index))
            .and_then(|s| s.url.clone())
        else {
            debug!("Episode source {} has no playable url", index);
            return false;
        };
        self.surface.swap_source(&url).await;
        self.active = Some(index);
        true
    }

    pub async fn stop(&mut self) {
        self.surface.stop().await;
    }
}
