// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use serde::Serialize;
use serde_json::Value;
use std::cmp::Reverse;
use tracing::{debug, error, info};

use crate::api::types::{extract_subject, source_list, subtitles_for};
use crate::api::{MovieApi, Source, Subject, Subtitle};
use crate::error::{ApiError, PlayError};
use crate::playback::{PlaybackBackend, PlaybackSurface};
use crate::session::{SessionToken, Sessions};
use crate::trailer::{Trailer, has_payload};

/// One entry of the quality dropdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityOption {
    pub label: String,
    /// `"{label} • {size}"`
    pub text: String,
    /// Empty when the source has no playable address.
    pub url: String,
}

impl From<&Source> for QualityOption {
    fn from(source: &Source) -> Self {
        Self {
            label: source.label.clone(),
            text: format!("{} • {}", source.label, source.size_label()),
            url: source.url.clone().unwrap_or_default(),
        }
    }
}

/// One entry of the subtitle dropdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubtitleOption {
    pub name: String,
    pub url: String,
}

impl From<&Subtitle> for SubtitleOption {
    fn from(sub: &Subtitle) -> Self {
        Self {
            name: sub.name.clone(),
            url: sub.url.clone().unwrap_or_default(),
        }
    }
}

/// Everything fetched for one movie.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovieView {
    pub id: String,
    pub subject: Option<Subject>,
    /// Replaces the info panel when a required fetch failed.
    pub error: Option<String>,
    pub trailer: Option<Trailer>,
    pub sources: Vec<Source>,
    pub qualities: Vec<QualityOption>,
    pub subtitles: Vec<Subtitle>,
    /// Index into `sources` of the automatically chosen stream.
    pub best: Option<usize>,
}

impl MovieView {
    fn empty(id: &str) -> Self {
        Self {
            id: id.to_string(),
            subject: None,
            error: None,
            trailer: None,
            sources: Vec::new(),
            qualities: Vec::new(),
            subtitles: Vec::new(),
            best: None,
        }
    }

    pub fn subtitle_options(&self) -> Vec<SubtitleOption> {
        self.subtitles.iter().map(SubtitleOption::from).collect()
    }

    pub fn best_source(&self) -> Option<&Source> {
        self.best.and_then(|i| self.sources.get(i))
    }

    async fn fill(&mut self, api: &MovieApi) -> Result<(), ApiError> {
        let info = api.info(&self.id).await?;
        let subject_value = extract_subject(&info).cloned().unwrap_or(Value::Null);
        let subject = Subject::from_value(&subject_value);
        self.subject = Some(subject.clone());

        self.trailer = resolve_trailer(api, &self.id, &subject).await;

        let payload = api.sources(&self.id).await?;
        self.sources = source_list(&payload);
        self.subtitles = subtitles_for(&payload, &subject);
        self.qualities = self.sources.iter().map(QualityOption::from).collect();
        self.best = best_source_index(&self.sources);
        Ok(())
    }
}

/// Fetch info, trailer and sources for `id`.
///
/// Info and sources are required; when either fails the view carries
/// `Error loading movie` along with whatever was fetched before.
pub async fn load(api: &MovieApi, id: &str) -> MovieView {
    let mut view = MovieView::empty(id);
    if let Err(e) = view.fill(api).await {
        error!("Loading movie {} failed: {}", id, e);
        view.error = Some("Error loading movie".into());
    }
    view
}

/// `/trailer/{id}`, else the trailer embedded in the subject.
pub async fn resolve_trailer(api: &MovieApi, id: &str, subject: &Subject) -> Option<Trailer> {
    let fetched = match api.trailer(id).await {
        Ok(data) if has_payload(&data) => Some(data),
        Ok(_) => None,
        Err(e) => {
            debug!("Trailer endpoint failed for {}: {}", id, e);
            None
        }
    };

    match fetched {
        Some(data) => Trailer::from_payload(&data),
        None => subject.trailer.as_ref().and_then(Trailer::from_payload),
    }
}

/// Highest numeric quality (then resolution); ties keep list order.
pub fn best_source_index(sources: &[Source]) -> Option<usize> {
    let mut order: Vec<usize> = (0..sources.len()).collect();
    order.sort_by_key(|&i| Reverse(sources[i].rank()));
    order.first().copied()
}

/// Movie detail screen state bound to a playback surface.
#[derive(Debug)]
pub struct MovieController<B> {
    surface: PlaybackSurface<B>,
    sessions: Sessions,
    view: Option<MovieView>,
    loading: bool,
    active_source: Option<usize>,
    selected_quality: Option<String>,
    active_subtitle: Option<String>,
}

impl<B: PlaybackBackend> MovieController<B> {
    pub fn new(backend: B) -> Self {
        Self {
            surface: PlaybackSurface::new(backend),
            sessions: Sessions::new(),
            view: None,
            loading: false,
            active_source: None,
            selected_quality: None,
            active_subtitle: None,
        }
    }

    pub fn view(&self) -> Option<&MovieView> {
        self.view.as_ref()
    }

    pub fn surface(&self) -> &PlaybackSurface<B> {
        &self.surface
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Index of the highlighted quick source.
    pub fn active_source(&self) -> Option<usize> {
        self.active_source
    }

    /// Current dropdown value.
    pub fn selected_quality(&self) -> Option<&str> {
        self.selected_quality.as_deref()
    }

    pub fn active_subtitle(&self) -> Option<&str> {
        self.active_subtitle.as_deref()
    }

    /// Clear every selector and link, and start a new load session.
    pub fn begin_load(&mut self) -> SessionToken {
        self.view = None;
        self.loading = true;
        self.active_source = None;
        self.selected_quality = None;
        self.active_subtitle = None;
        self.surface.reset();
        self.sessions.begin()
    }

    /// Install a finished load and start the best stream.
    ///
    /// Returns false, leaving the screen untouched, when a newer load has
    /// started since `token` was issued.
    pub async fn apply(&mut self, token: SessionToken, view: MovieView) -> bool {
        if !self.sessions.is_current(token) {
            debug!("Dropping stale movie load {} for {}", token.id(), view.id);
            return false;
        }
        self.loading = false;

        if let Some(best) = view.best_source() {
            if let Some(url) = best.url.as_deref() {
                info!("Auto-selected {} for {}", best.label, view.id);
                self.surface.set_source(url).await;
                self.surface.mirror_links(url);
            }
            self.active_source = Some(0);
        }

        self.view = Some(view);
        true
    }

    /// Load `id` and start playback in one go.
    pub async fn select_movie(&mut self, api: &MovieApi, id: &str) {
        if id.is_empty() {
            return;
        }
        let token = self.begin_load();
        let view = load(api, id).await;
        self.apply(token, view).await;
    }

    /// Quick-source selection.
    pub async fn play_source_by_index(&mut self, index: usize) -> Result<(), PlayError> {
        let url = self
            .view
            .as_ref()
            .and_then(|v| v.sources.get(index))
            .and_then(|s| s.url.clone())
            .ok_or(PlayError::NoPlayableUrl)?;

        self.surface.set_source(&url).await;
        self.surface.mirror_links(&url);
        self.selected_quality = Some(url);
        self.active_source = Some(index);
        Ok(())
    }

    /// Dropdown selection: swap straight to the option's address.
    pub async fn choose_quality(&mut self, url: &str) {
        self.selected_quality = Some(url.to_string());
        self.surface.set_source(url).await;
    }

    /// Dropdown selection; `None` is the "no subtitles" entry.
    pub async fn choose_subtitle_option(&mut self, option: Option<&SubtitleOption>) {
        match option {
            Some(opt) if !opt.url.is_empty() => {
                self.surface.add_track(&opt.url, &opt.name).await;
            }
            _ => self.surface.remove_tracks().await,
        }
    }

    /// Quick subtitle control; choosing the showing subtitle again hides it.
    pub async fn toggle_subtitle(&mut self, index: usize) -> bool {
        let Some(sub) = self.view.as_ref().and_then(|v| v.subtitles.get(index)).cloned() else {
            return false;
        };
        let showing = self.surface.toggle_subtitle(&sub).await;
        self.active_subtitle = Some(sub.name);
        showing
    }

    pub async fn toggle_picture_in_picture(&mut self) {
        self.surface.toggle_picture_in_picture().await;
    }

    pub async fn stop(&mut self) {
        self.surface.stop().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::client::test_support::api_for;
    use crate::playback::test_support::RecordingBackend;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount(server: &MockServer, route: &str, status: u16, body: Value) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(server)
            .await;
    }

    #[test]
    fn best_source_prefers_highest_quality() {
        let sources: Vec<Source> = [480, 1080, 720]
            .iter()
            .map(|q| Source::from_value(&json!({"quality": format!("{}p", q), "url": q.to_string()})))
            .collect();
        assert_eq!(best_source_index(&sources), Some(1));
    }

    #[test]
    fn unparseable_qualities_keep_list_order() {
        let sources: Vec<Source> = ["HD", "SD", "CAM"]
            .iter()
            .map(|q| Source::from_value(&json!({"quality": q})))
            .collect();
        assert_eq!(best_source_index(&sources), Some(0));
        assert_eq!(best_source_index(&[]), None);
    }

    #[test]
    fn quality_option_text_includes_size() {
        let opt = QualityOption::from(&Source::from_value(&json!({
            "resolution": "720", "download_url": "d.mp4", "size": 5_000_000
        })));
        assert_eq!(opt.text, "720 • 4.77 MB");
        assert_eq!(opt.url, "d.mp4");

        let bare = QualityOption::from(&Source::from_value(&json!({})));
        assert_eq!(bare.text, "auto • —");
        assert_eq!(bare.url, "");
    }

    #[tokio::test]
    async fn select_movie_autoplays_highest_quality() {
        let server = MockServer::start().await;
        mount(
            &server,
            "/api/info/m1",
            200,
            json!({"results": {"subject": {"title": "Heat", "trailer": "https://youtu.be/abc123"}}}),
        )
        .await;
        mount(&server, "/api/trailer/m1", 200, json!({"status": 404})).await;
        mount(
            &server,
            "/api/sources/m1",
            200,
            json!({"results": [
                {"quality": "480", "stream_url": "u480", "size": 1000},
                {"quality": "1080", "stream_url": "u1080"},
                {"quality": "720", "url": "u720"}
            ], "subtitles": [{"lanName": "English", "url": "en.vtt"}]}),
        )
        .await;

        let (_dir, api) = api_for(&server.uri());
        let backend = RecordingBackend::default();
        let mut controller = MovieController::new(backend.clone());
        controller.select_movie(&api, "m1").await;

        let view = controller.view().unwrap();
        assert_eq!(view.error, None);
        assert_eq!(view.subject.as_ref().unwrap().title, "Heat");
        assert_eq!(view.trailer, Some(Trailer::YouTube { id: "abc123".into() }));
        assert_eq!(view.qualities.len(), 3);
        assert_eq!(view.subtitles[0].name, "English");

        assert_eq!(controller.surface().source(), Some("u1080"));
        assert_eq!(controller.surface().download_link(), Some("u1080"));
        assert_eq!(controller.surface().open_link(), Some("u1080"));
        assert_eq!(controller.active_source(), Some(0));
        assert!(backend.calls().contains(&"load u1080".to_string()));
    }

    #[tokio::test]
    async fn failed_sources_keep_info_and_report_error() {
        let server = MockServer::start().await;
        mount(&server, "/api/info/m2", 200, json!({"results": {"title": "Solo"}})).await;
        mount(
            &server,
            "/api/trailer/m2",
            200,
            json!({"results": [{"url": "https://cdn/t.mp4"}]}),
        )
        .await;
        mount(&server, "/api/sources/m2", 500, json!({})).await;

        let (_dir, api) = api_for(&server.uri());
        let view = load(&api, "m2").await;

        assert_eq!(view.error.as_deref(), Some("Error loading movie"));
        assert_eq!(view.subject.unwrap().title, "Solo");
        assert_eq!(view.trailer, Some(Trailer::Video { url: "https://cdn/t.mp4".into() }));
        assert!(view.sources.is_empty());
    }

    #[tokio::test]
    async fn failed_info_aborts_before_other_calls() {
        let server = MockServer::start().await;
        mount(&server, "/api/info/m3", 404, json!({})).await;
        Mock::given(method("GET"))
            .and(path("/api/sources/m3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
            .expect(0)
            .mount(&server)
            .await;

        let (_dir, api) = api_for(&server.uri());
        let view = load(&api, "m3").await;
        assert_eq!(view.error.as_deref(), Some("Error loading movie"));
        assert_eq!(view.subject, None);
    }

    #[tokio::test]
    async fn stale_load_is_discarded() {
        let mut controller = MovieController::new(RecordingBackend::default());
        let stale = controller.begin_load();
        let fresh = controller.begin_load();

        let mut old = MovieView::empty("old");
        old.sources = vec![Source::from_value(&json!({"url": "old.mp4"}))];
        old.best = Some(0);
        assert!(!controller.apply(stale, old).await);
        assert!(controller.view().is_none());
        assert!(controller.is_loading());

        assert!(controller.apply(fresh, MovieView::empty("new")).await);
        assert_eq!(controller.view().unwrap().id, "new");
        assert_eq!(controller.surface().source(), None);
    }

    #[tokio::test]
    async fn manual_source_switch() {
        let mut controller = MovieController::new(RecordingBackend::default());
        let token = controller.begin_load();
        let mut view = MovieView::empty("m");
        view.sources = vec![
            Source::from_value(&json!({"quality": "720", "file": "a.mp4"})),
            Source::from_value(&json!({"quality": "480"})),
        ];
        controller.apply(token, view).await;

        assert_eq!(controller.play_source_by_index(0).await, Ok(()));
        assert_eq!(controller.selected_quality(), Some("a.mp4"));
        assert_eq!(controller.surface().download_link(), Some("a.mp4"));

        assert_eq!(
            controller.play_source_by_index(1).await,
            Err(PlayError::NoPlayableUrl)
        );
        assert_eq!(controller.active_source(), Some(0));
        assert_eq!(
            controller.play_source_by_index(9).await,
            Err(PlayError::NoPlayableUrl)
        );
    }

    #[tokio::test]
    async fn subtitle_controls() {
        let backend = RecordingBackend::default();
        let mut controller = MovieController::new(backend.clone());
        let token = controller.begin_load();
        let mut view = MovieView::empty("m");
        view.subtitles = vec![Subtitle {
            name: "English".into(),
            url: Some("en.vtt".into()),
        }];
        controller.apply(token, view).await;

        assert!(controller.toggle_subtitle(0).await);
        assert_eq!(controller.active_subtitle(), Some("English"));
        assert!(!controller.toggle_subtitle(0).await);
        assert!(!controller.toggle_subtitle(5).await);

        let opt = controller.view().unwrap().subtitle_options()[0].clone();
        controller.choose_subtitle_option(Some(&opt)).await;
        assert_eq!(controller.surface().tracks().len(), 1);
        controller.choose_subtitle_option(None).await;
        assert!(controller.surface().tracks().is_empty());
    }
}
