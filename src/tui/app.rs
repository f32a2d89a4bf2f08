// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use chrono::{DateTime, Local};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::debug;

use crate::api::{MovieApi, Route};
use crate::config::Config;
use crate::player::{MpvBackend, Player};
use crate::session::{SessionToken, Sessions};
use crate::views::episodes::{self, EpisodePlayer};
use crate::views::movie::{self, MovieController};
use crate::views::search::{self, Debouncer};
use crate::views::series;
use crate::views::{EpisodeListView, EpisodePlayerView, MovieView, ResultsView, SeriesView};

const MAX_LOGS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Home,
    Movie,
    Series,
}

/// Which list on the current screen receives navigation keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Results,
    Sources,
    Subtitles,
    Seasons,
    Episodes,
    EpisodeSources,
}

#[derive(Debug, Clone)]
pub enum Action {
    Quit,
}

/// A finished background load, tagged with the session that started it.
#[derive(Debug)]
pub enum Loaded {
    Results(SessionToken, ResultsView),
    Movie(SessionToken, MovieView),
    Series(SessionToken, SeriesView),
    Episodes(SessionToken, EpisodeListView),
    EpisodeSources(SessionToken, EpisodePlayerView),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NavigationState {
    pub selected_index: usize,
}

impl NavigationState {
    pub fn reset(&mut self) {
        self.selected_index = 0;
    }

    fn up(&mut self, len: usize) {
        if len == 0 {
            return;
        }
        self.selected_index = if self.selected_index == 0 {
            len - 1
        } else {
            (self.selected_index - 1).min(len - 1)
        };
    }

    fn down(&mut self, len: usize) {
        if len == 0 {
            return;
        }
        self.selected_index = if self.selected_index + 1 >= len {
            0
        } else {
            self.selected_index + 1
        };
    }

    fn page_up(&mut self, page: usize) {
        self.selected_index = self.selected_index.saturating_sub(page);
    }

    fn page_down(&mut self, len: usize, page: usize) {
        self.selected_index = (self.selected_index + page).min(len.saturating_sub(1));
    }

    fn end(&mut self, len: usize) {
        self.selected_index = len.saturating_sub(1);
    }
}

pub struct App {
    pub screen: Screen,
    pub focus: Focus,
    pub config: Config,
    api: MovieApi,
    player: Player,
    pub movie: MovieController<MpvBackend>,
    pub episode_player: EpisodePlayer<MpvBackend>,
    backend: MpvBackend,
    sender: mpsc::UnboundedSender<Loaded>,
    receiver: mpsc::UnboundedReceiver<Loaded>,
    results_sessions: Sessions,
    series_sessions: Sessions,
    episodes_sessions: Sessions,
    pub query: String,
    pub input_active: bool,
    debouncer: Debouncer,
    pub results: ResultsView,
    pub results_loading: bool,
    pub series: Option<SeriesView>,
    pub series_loading: bool,
    pub episodes: Option<EpisodeListView>,
    pub episodes_loading: bool,
    pub episode_sources_loading: bool,
    pub results_nav: NavigationState,
    pub sources_nav: NavigationState,
    pub subtitles_nav: NavigationState,
    pub seasons_nav: NavigationState,
    pub episodes_nav: NavigationState,
    pub episode_sources_nav: NavigationState,
    pub alert: Option<String>,
    pub status_message: Option<String>,
    pub logs: Vec<(DateTime<Local>, String)>,
    pub show_help: bool,
    pub visible_height: usize,
}

impl App {
    pub fn new(config: Config, api: MovieApi, player: Player) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let backend = MpvBackend::new(config.player.clone());
        let debouncer = Debouncer::new(config.ui.search_debounce());

        let mut app = Self {
            screen: Screen::Home,
            focus: Focus::Results,
            config,
            api,
            player,
            movie: MovieController::new(backend.clone()),
            episode_player: EpisodePlayer::new(backend.clone()),
            backend,
            sender,
            receiver,
            results_sessions: Sessions::new(),
            series_sessions: Sessions::new(),
            episodes_sessions: Sessions::new(),
            query: String::new(),
            input_active: false,
            debouncer,
            results: ResultsView::message("Loading..."),
            results_loading: true,
            series: None,
            series_loading: false,
            episodes: None,
            episodes_loading: false,
            episode_sources_loading: false,
            results_nav: NavigationState::default(),
            sources_nav: NavigationState::default(),
            subtitles_nav: NavigationState::default(),
            seasons_nav: NavigationState::default(),
            episodes_nav: NavigationState::default(),
            episode_sources_nav: NavigationState::default(),
            alert: None,
            status_message: None,
            logs: Vec::new(),
            show_help: false,
            visible_height: 20,
        };
        if !app.player.is_available() {
            let message = format!(
                "⚠ {} not found, playback is disabled",
                app.config.player.command
            );
            app.status_message = Some(message.clone());
            app.add_log(message);
        }
        app.start_initial_load();
        app
    }

    /// Typing has restarted the debounce window and no search has fired yet.
    pub fn search_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    pub fn update_visible_height(&mut self, height: usize) {
        self.visible_height = height.saturating_sub(8).max(1);
    }

    /// Fires a debounced search once typing has paused.
    pub fn tick(&mut self) {
        if self.debouncer.poll(Instant::now()) {
            let query = self.query.trim().to_string();
            if !query.is_empty() {
                self.start_search(query);
            }
        }
    }

    /// Installs finished loads. Returns true when anything changed.
    pub async fn async_tick(&mut self) -> bool {
        let mut changed = false;
        while let Ok(loaded) = self.receiver.try_recv() {
            self.install(loaded).await;
            changed = true;
        }
        changed
    }

    async fn install(&mut self, loaded: Loaded) {
        match loaded {
            Loaded::Results(token, view) => {
                if !self.results_sessions.is_current(token) {
                    debug!("Dropping stale results {}", token.id());
                    return;
                }
                self.results_loading = false;
                if let Some(label) = &view.count_label {
                    self.add_log(label.clone());
                }
                self.results = match view.count_label {
                    Some(_) => view,
                    // Message-only views keep the previous count label.
                    None => ResultsView {
                        count_label: self.results.count_label.take(),
                        ..view
                    },
                };
                self.results_nav.reset();
            }
            Loaded::Movie(token, view) => {
                let error = view.error.clone();
                let title = view.subject.as_ref().map(|s| s.title.clone());
                if self.movie.apply(token, view).await {
                    self.sources_nav.reset();
                    self.subtitles_nav.reset();
                    match (error, title) {
                        (Some(err), _) => self.add_log(format!("❌ {}", err)),
                        (None, Some(title)) => self.add_log(format!("Loaded {}", title)),
                        (None, None) => {}
                    }
                }
            }
            Loaded::Series(token, view) => {
                if !self.series_sessions.is_current(token) {
                    debug!("Dropping stale series load {}", token.id());
                    return;
                }
                self.series_loading = false;
                if let Some(msg) = &view.message {
                    self.add_log(format!("❌ {}", msg));
                }
                for notice in &view.seasons.notices {
                    self.add_log(notice.clone());
                }
                if let Some(guessed) = view.seasons.guessed.clone() {
                    self.episodes_sessions.invalidate();
                    self.episodes_loading = false;
                    self.episodes = Some(guessed);
                    self.episodes_nav.reset();
                }
                self.seasons_nav.reset();
                self.series = Some(view);
            }
            Loaded::Episodes(token, view) => {
                if !self.episodes_sessions.is_current(token) {
                    debug!("Dropping stale episode list {}", token.id());
                    return;
                }
                self.episodes_loading = false;
                if let Some(msg) = &view.message {
                    self.add_log(msg.clone());
                }
                self.episodes = Some(view);
                self.episodes_nav.reset();
                self.focus = Focus::Episodes;
            }
            Loaded::EpisodeSources(token, view) => {
                let message = view.message.clone();
                let title = view.title.clone();
                if self.episode_player.apply(token, view).await {
                    self.episode_sources_loading = false;
                    self.episode_sources_nav.selected_index =
                        self.episode_player.active().unwrap_or(0);
                    match message {
                        Some(msg) => self.add_log(msg),
                        None => {
                            self.add_log(format!("▶ {}", title));
                            self.focus = Focus::EpisodeSources;
                        }
                    }
                }
            }
        }
    }

    fn start_initial_load(&mut self) {
        let token = self.results_sessions.begin();
        let api = self.api.clone();
        let sender = self.sender.clone();
        tokio::spawn(async move {
            let view = search::initial_load(&api).await;
            let _ = sender.send(Loaded::Results(token, view));
        });
    }

    fn start_search(&mut self, query: String) {
        self.debouncer.cancel();
        self.add_log(format!("Searching for \"{}\"", query));
        let token = self.results_sessions.begin();
        self.results_loading = true;
        let api = self.api.clone();
        let sender = self.sender.clone();
        tokio::spawn(async move {
            if let Some(view) = search::run_query(&api, &query).await {
                let _ = sender.send(Loaded::Results(token, view));
            }
        });
    }

    fn start_popular(&mut self) {
        self.add_log("Loading trending titles".to_string());
        let token = self.results_sessions.begin();
        self.results_loading = true;
        self.results = ResultsView {
            count_label: self.results.count_label.take(),
            ..ResultsView::message("Loading...")
        };
        let api = self.api.clone();
        let sender = self.sender.clone();
        tokio::spawn(async move {
            let view = search::popular(&api).await;
            let _ = sender.send(Loaded::Results(token, view));
        });
    }

    fn open_route(&mut self, route: Route) {
        match route {
            Route::Movie(id) => {
                self.screen = Screen::Movie;
                self.focus = Focus::Sources;
                self.add_log(format!("Opening movie {}", id));
                let token = self.movie.begin_load();
                let api = self.api.clone();
                let sender = self.sender.clone();
                tokio::spawn(async move {
                    let view = movie::load(&api, &id).await;
                    let _ = sender.send(Loaded::Movie(token, view));
                });
            }
            Route::Series(id) => {
                self.screen = Screen::Series;
                self.focus = Focus::Seasons;
                self.add_log(format!("Opening series {}", id));
                self.series = None;
                self.series_loading = true;
                self.episodes = None;
                self.episodes_sessions.invalidate();
                let token = self.series_sessions.begin();
                let api = self.api.clone();
                let sender = self.sender.clone();
                tokio::spawn(async move {
                    let view = series::load(&api, &id).await;
                    let _ = sender.send(Loaded::Series(token, view));
                });
            }
        }
    }

    fn open_season(&mut self, season: String) {
        let Some(series_id) = self.series.as_ref().map(|s| s.id.clone()) else {
            return;
        };
        self.add_log(format!("Loading season {}", season));
        self.episodes = None;
        self.episodes_loading = true;
        let token = self.episodes_sessions.begin();
        let api = self.api.clone();
        let sender = self.sender.clone();
        tokio::spawn(async move {
            let (view, _) = episodes::load_episodes(&api, &series_id, &season).await;
            let _ = sender.send(Loaded::Episodes(token, view));
        });
    }

    async fn open_episode(&mut self, episode_id: String) {
        let Some((series_id, season)) = self
            .episodes
            .as_ref()
            .map(|e| (e.series_id.clone(), e.season.clone()))
        else {
            return;
        };
        self.add_log(format!("Loading episode {}", episode_id));
        self.episode_sources_loading = true;
        let token = self.episode_player.begin_load().await;
        let api = self.api.clone();
        let sender = self.sender.clone();
        tokio::spawn(async move {
            let view =
                episodes::load_episode_player(&api, &series_id, &season, &episode_id).await;
            let _ = sender.send(Loaded::EpisodeSources(token, view));
        });
    }

    fn play_trailer(&mut self) {
        let Some(trailer) = self.movie.view().and_then(|v| v.trailer.clone()) else {
            self.add_log("No trailer for this title".to_string());
            return;
        };
        let title = self
            .movie
            .view()
            .and_then(|v| v.subject.as_ref())
            .map(|s| format!("{} (trailer)", s.title))
            .unwrap_or_else(|| "Trailer".to_string());
        match self.player.play_detached(&trailer.playable_url(), &title, None) {
            Ok(()) => self.add_log(format!("▶ Trailer {}", trailer.embed_url())),
            Err(e) => self.add_log(format!("❌ {}", e)),
        }
    }

    async fn stop_playing(&mut self) {
        self.movie.stop().await;
        self.episode_player.stop().await;
        self.add_log("Stopping any active playback".to_string());
    }

    pub async fn shutdown(&mut self) {
        self.backend.shutdown().await;
    }

    fn focused_len(&self) -> usize {
        match self.focus {
            Focus::Results => self.results.cards.len(),
            Focus::Sources => self.movie.view().map_or(0, |v| v.sources.len()),
            Focus::Subtitles => self.movie.view().map_or(0, |v| v.subtitles.len()),
            Focus::Seasons => self.series.as_ref().map_or(0, |s| s.seasons.buttons.len()),
            Focus::Episodes => self.episodes.as_ref().map_or(0, |e| e.cards.len()),
            Focus::EpisodeSources => self.episode_player.view().map_or(0, |v| v.sources.len()),
        }
    }

    fn focused_nav(&mut self) -> &mut NavigationState {
        match self.focus {
            Focus::Results => &mut self.results_nav,
            Focus::Sources => &mut self.sources_nav,
            Focus::Subtitles => &mut self.subtitles_nav,
            Focus::Seasons => &mut self.seasons_nav,
            Focus::Episodes => &mut self.episodes_nav,
            Focus::EpisodeSources => &mut self.episode_sources_nav,
        }
    }

    fn cycle_focus(&mut self) {
        self.focus = match (self.screen, self.focus) {
            (Screen::Home, _) => Focus::Results,
            (Screen::Movie, Focus::Sources) => Focus::Subtitles,
            (Screen::Movie, _) => Focus::Sources,
            (Screen::Series, Focus::Seasons) => Focus::Episodes,
            (Screen::Series, Focus::Episodes) => Focus::EpisodeSources,
            (Screen::Series, _) => Focus::Seasons,
        };
    }

    fn go_back(&mut self) {
        if self.screen != Screen::Home {
            self.screen = Screen::Home;
            self.focus = Focus::Results;
        }
    }

    pub async fn handle_key_event(&mut self, key: KeyEvent) -> Option<Action> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Some(Action::Quit);
        }

        // Alerts block everything until dismissed
        if self.alert.is_some() {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
                self.alert = None;
            }
            return None;
        }

        if self.input_active {
            self.handle_input_key(key);
            return None;
        }

        if self.show_help {
            self.show_help = false;
            return None;
        }

        let page = self.visible_height.saturating_sub(2).max(1);
        match key.code {
            KeyCode::Char('q') => return Some(Action::Quit),
            KeyCode::Char('?') | KeyCode::F(1) => self.show_help = true,
            KeyCode::Char('/') => {
                self.go_back();
                self.input_active = true;
                self.status_message = Some(format!("Search: {}", self.query));
            }
            KeyCode::Char('p') if self.screen == Screen::Home => self.start_popular(),
            KeyCode::Char('s') => self.stop_playing().await,
            KeyCode::Esc | KeyCode::Char('b') => self.go_back(),
            KeyCode::Tab => self.cycle_focus(),
            KeyCode::Up | KeyCode::Char('k') => {
                let len = self.focused_len();
                self.focused_nav().up(len);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                let len = self.focused_len();
                self.focused_nav().down(len);
            }
            KeyCode::PageUp => self.focused_nav().page_up(page),
            KeyCode::PageDown => {
                let len = self.focused_len();
                self.focused_nav().page_down(len, page);
            }
            KeyCode::Home => self.focused_nav().reset(),
            KeyCode::End => {
                let len = self.focused_len();
                self.focused_nav().end(len);
            }
            KeyCode::Enter => self.activate().await,
            _ if self.screen == Screen::Movie => self.handle_movie_key(key).await,
            _ => {}
        }
        None
    }

    fn handle_input_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.input_active = false;
                self.debouncer.cancel();
                self.status_message = None;
            }
            KeyCode::Enter => {
                self.input_active = false;
                self.status_message = None;
                let query = self.query.trim().to_string();
                if !query.is_empty() {
                    self.start_search(query);
                }
            }
            KeyCode::Backspace => {
                self.query.pop();
                self.debouncer.touch(Instant::now());
                self.status_message = Some(format!("Search: {}", self.query));
            }
            KeyCode::Char(c) => {
                self.query.push(c);
                self.debouncer.touch(Instant::now());
                self.status_message = Some(format!("Search: {}", self.query));
            }
            _ => {}
        }
    }

    async fn handle_movie_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('n') => {
                self.movie.choose_subtitle_option(None).await;
                self.add_log("Subtitles off".to_string());
            }
            KeyCode::Char('i') => {
                self.movie.toggle_picture_in_picture().await;
                let state = if self.movie.surface().picture_in_picture() {
                    "on"
                } else {
                    "off"
                };
                self.add_log(format!("Picture-in-picture {}", state));
            }
            KeyCode::Char('t') => self.play_trailer(),
            KeyCode::Char('o') => {
                let link = self.movie.surface().open_link().map(str::to_string);
                if let Some(link) = link {
                    self.add_log(format!("Source: {}", link));
                }
            }
            _ => {}
        }
    }

    async fn activate(&mut self) {
        let index = self.focused_nav().selected_index;
        match self.focus {
            Focus::Results => {
                let Some(card) = self.results.cards.get(index) else {
                    return;
                };
                match card.route.clone() {
                    Some(route) => self.open_route(route),
                    None => debug!("Result {} has no identifier", card.title),
                }
            }
            Focus::Sources => match self.movie.play_source_by_index(index).await {
                Ok(()) => {
                    let label = self
                        .movie
                        .view()
                        .and_then(|v| v.sources.get(index))
                        .map(|s| s.label.clone());
                    if let Some(label) = label {
                        self.add_log(format!("▶ {}", label));
                    }
                }
                Err(e) => self.alert = Some(e.to_string()),
            },
            Focus::Subtitles => {
                let showing = self.movie.toggle_subtitle(index).await;
                let verb = if showing { "on" } else { "off" };
                let line = self
                    .movie
                    .active_subtitle()
                    .map(|name| format!("Subtitle {} {}", name, verb));
                if let Some(line) = line {
                    self.add_log(line);
                }
            }
            Focus::Seasons => {
                let season = self
                    .series
                    .as_ref()
                    .and_then(|s| s.seasons.buttons.get(index))
                    .map(|b| b.season.clone());
                if let Some(season) = season {
                    self.open_season(season);
                }
            }
            Focus::Episodes => {
                let episode_id = self
                    .episodes
                    .as_ref()
                    .and_then(|e| e.cards.get(index))
                    .and_then(|c| c.episode_id.clone());
                match episode_id {
                    Some(id) => self.open_episode(id).await,
                    None => debug!("Episode card {} has no identifier", index),
                }
            }
            Focus::EpisodeSources => {
                if !self.episode_player.choose(index).await {
                    return;
                }
                let label = self
                    .episode_player
                    .view()
                    .and_then(|v| v.sources.get(index))
                    .map(|s| s.label.clone());
                if let Some(label) = label {
                    self.add_log(format!("▶ {}", label));
                }
            }
        }
    }

    pub fn add_log(&mut self, message: String) {
        self.logs.push((Local::now(), message));
        if self.logs.len() > MAX_LOGS {
            self.logs.remove(0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::client::test_support::api_for;
    use wiremock::MockServer;

    async fn app_with_player(command: &str) -> (tempfile::TempDir, MockServer, App) {
        let server = MockServer::start().await;
        let (dir, api) = api_for(&server.uri());
        let mut config = Config::default();
        config.player.command = command.to_string();
        let player = Player::new(config.player.clone());
        (dir, server, App::new(config, api, player))
    }

    #[tokio::test]
    async fn missing_player_is_reported_at_startup() {
        let (_dir, _server, app) = app_with_player("moviecat-no-such-player").await;
        let status = app.status_message.as_deref().unwrap_or_default();
        assert!(status.contains("moviecat-no-such-player not found"));
        assert!(app.logs.iter().any(|(_, line)| line.contains("playback is disabled")));
    }

    #[tokio::test]
    async fn typing_leaves_a_search_pending_until_it_fires() {
        let (_dir, _server, mut app) = app_with_player("moviecat-no-such-player").await;
        assert!(!app.search_pending());

        app.query = "dune".into();
        app.debouncer.touch(Instant::now());
        assert!(app.search_pending());

        app.start_search("dune".into());
        assert!(!app.search_pending());
    }

    #[test]
    fn navigation_wraps_at_both_ends() {
        let mut nav = NavigationState::default();
        nav.up(3);
        assert_eq!(nav.selected_index, 2);
        nav.down(3);
        assert_eq!(nav.selected_index, 0);
        nav.page_down(3, 10);
        assert_eq!(nav.selected_index, 2);
        nav.page_up(10);
        assert_eq!(nav.selected_index, 0);
        nav.down(0);
        assert_eq!(nav.selected_index, 0);
    }
}
