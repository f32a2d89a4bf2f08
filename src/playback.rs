// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use anyhow::Result;
use serde::Serialize;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::api::Subtitle;

/// Time a freshly attached track gets before it is switched on.
pub const TRACK_SHOW_DELAY: Duration = Duration::from_millis(300);

/// Whatever actually renders video.
#[allow(async_fn_in_trait)]
pub trait PlaybackBackend {
    /// Wait between attaching a subtitle track and showing it.
    const SHOW_DELAY: Duration = TRACK_SHOW_DELAY;

    async fn pause(&self) -> Result<()>;
    /// Replace the current media and reload.
    async fn load(&self, url: &str) -> Result<()>;
    async fn play(&self) -> Result<()>;
    async fn add_subtitle(&self, url: &str, label: &str) -> Result<()>;
    async fn show_subtitle(&self) -> Result<()>;
    async fn clear_subtitles(&self) -> Result<()>;
    async fn set_picture_in_picture(&self, enabled: bool) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TrackMode {
    Disabled,
    Showing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextTrack {
    pub url: String,
    pub label: String,
    pub mode: TrackMode,
}

/// The video element: current source, its subtitle track, the mirrored
/// "open source" and download links, and picture-in-picture.
#[derive(Debug)]
pub struct PlaybackSurface<B> {
    backend: B,
    source: Option<String>,
    tracks: Vec<TextTrack>,
    open_link: Option<String>,
    download_link: Option<String>,
    picture_in_picture: bool,
}

impl<B: PlaybackBackend> PlaybackSurface<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            source: None,
            tracks: Vec::new(),
            open_link: None,
            download_link: None,
            picture_in_picture: false,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn tracks(&self) -> &[TextTrack] {
        &self.tracks
    }

    pub fn open_link(&self) -> Option<&str> {
        self.open_link.as_deref()
    }

    pub fn download_link(&self) -> Option<&str> {
        self.download_link.as_deref()
    }

    pub fn picture_in_picture(&self) -> bool {
        self.picture_in_picture
    }

    /// Forget the links and source of the previous title.
    pub fn reset(&mut self) {
        self.open_link = None;
        self.download_link = None;
    }

    /// Pause, drop tracks, switch source, reload and try to autoplay.
    pub async fn set_source(&mut self, url: &str) {
        if let Err(e) = self.backend.pause().await {
            debug!("Pause before source switch failed: {:#}", e);
        }
        self.remove_tracks().await;
        self.source = Some(url.to_string());

        if let Err(e) = self.backend.load(url).await {
            warn!("Failed to load source {}: {:#}", url, e);
            return;
        }
        if let Err(e) = self.backend.play().await {
            debug!("Autoplay rejected: {:#}", e);
        }

        self.mirror_links(url);
    }

    /// Swap the source without touching tracks, as the episode player does.
    pub async fn swap_source(&mut self, url: &str) {
        self.source = Some(url.to_string());
        if let Err(e) = self.backend.load(url).await {
            warn!("Failed to load source {}: {:#}", url, e);
            return;
        }
        if let Err(e) = self.backend.play().await {
            debug!("Autoplay rejected: {:#}", e);
        }
    }

    pub fn mirror_links(&mut self, url: &str) {
        self.open_link = Some(url.to_string());
        self.download_link = Some(url.to_string());
    }

    pub async fn stop(&mut self) {
        if let Err(e) = self.backend.pause().await {
            debug!("Pause failed: {:#}", e);
        }
        self.source = None;
    }

    pub async fn remove_tracks(&mut self) {
        if let Err(e) = self.backend.clear_subtitles().await {
            debug!("Clearing subtitles failed: {:#}", e);
        }
        self.tracks.clear();
    }

    /// Replace any track with one subtitle and show it after a short delay.
    pub async fn add_track(&mut self, url: &str, label: &str) {
        self.remove_tracks().await;
        if url.is_empty() {
            return;
        }

        let label = if label.is_empty() { "sub" } else { label };
        if let Err(e) = self.backend.add_subtitle(url, label).await {
            warn!("Failed to add subtitle track {}: {:#}", url, e);
            return;
        }
        self.tracks.push(TextTrack {
            url: url.to_string(),
            label: label.to_string(),
            mode: TrackMode::Disabled,
        });

        if !B::SHOW_DELAY.is_zero() {
            sleep(B::SHOW_DELAY).await;
        }

        if let Some(track) = self.tracks.first_mut() {
            match self.backend.show_subtitle().await {
                Ok(()) => track.mode = TrackMode::Showing,
                Err(e) => debug!("Could not show subtitle track: {:#}", e),
            }
        }
    }

    /// Second selection of the active subtitle removes it.
    /// Returns whether a track is showing afterwards.
    pub async fn toggle_subtitle(&mut self, subtitle: &Subtitle) -> bool {
        let url = subtitle.url.clone().unwrap_or_default();
        let active = self.tracks.iter().any(|t| t.url == url);
        if active {
            self.remove_tracks().await;
        } else {
            self.add_track(&url, &subtitle.name).await;
        }
        !self.tracks.is_empty()
    }

    pub async fn toggle_picture_in_picture(&mut self) {
        let wanted = !self.picture_in_picture;
        match self.backend.set_picture_in_picture(wanted).await {
            Ok(()) => self.picture_in_picture = wanted,
            Err(e) => debug!("Picture-in-picture toggle failed: {:#}", e),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Backend that records every call instead of rendering.
    #[derive(Debug, Clone, Default)]
    pub(crate) struct RecordingBackend {
        pub calls: Arc<Mutex<Vec<String>>>,
        pub reject_play: bool,
        pub reject_pip: bool,
    }

    impl RecordingBackend {
        pub(crate) fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }
    }

    impl PlaybackBackend for RecordingBackend {
        async fn pause(&self) -> Result<()> {
            self.record("pause".into());
            Ok(())
        }

        async fn load(&self, url: &str) -> Result<()> {
            self.record(format!("load {}", url));
            Ok(())
        }

        async fn play(&self) -> Result<()> {
            self.record("play".into());
            if self.reject_play {
                anyhow::bail!("autoplay blocked");
            }
            Ok(())
        }

        async fn add_subtitle(&self, url: &str, label: &str) -> Result<()> {
            self.record(format!("sub-add {} {}", url, label));
            Ok(())
        }

        async fn show_subtitle(&self) -> Result<()> {
            self.record("sub-show".into());
            Ok(())
        }

        async fn clear_subtitles(&self) -> Result<()> {
            self.record("sub-clear".into());
            Ok(())
        }

        async fn set_picture_in_picture(&self, enabled: bool) -> Result<()> {
            self.record(format!("pip {}", enabled));
            if self.reject_pip {
                anyhow::bail!("not supported");
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::RecordingBackend;
    use super::*;

    fn subtitle(name: &str, url: &str) -> Subtitle {
        Subtitle {
            name: name.into(),
            url: Some(url.into()),
        }
    }

    #[tokio::test]
    async fn set_source_pauses_clears_loads_and_plays() {
        let backend = RecordingBackend {
            reject_play: true,
            ..Default::default()
        };
        let mut surface = PlaybackSurface::new(backend.clone());
        surface.add_track("en.vtt", "English").await;

        surface.set_source("https://cdn/a.mp4").await;

        assert_eq!(surface.source(), Some("https://cdn/a.mp4"));
        assert!(surface.tracks().is_empty());
        assert_eq!(surface.open_link(), Some("https://cdn/a.mp4"));
        assert_eq!(surface.download_link(), Some("https://cdn/a.mp4"));
        let calls = backend.calls();
        let tail = &calls[calls.len() - 4..];
        assert_eq!(tail, ["pause", "sub-clear", "load https://cdn/a.mp4", "play"]);
    }

    #[tokio::test]
    async fn add_track_shows_after_delay() {
        let backend = RecordingBackend::default();
        let mut surface = PlaybackSurface::new(backend.clone());
        surface.add_track("fr.vtt", "").await;

        assert_eq!(surface.tracks().len(), 1);
        assert_eq!(surface.tracks()[0].label, "sub");
        assert_eq!(surface.tracks()[0].mode, TrackMode::Showing);
        assert_eq!(backend.calls(), ["sub-clear", "sub-add fr.vtt sub", "sub-show"]);
    }

    #[tokio::test]
    async fn empty_track_url_only_clears() {
        let backend = RecordingBackend::default();
        let mut surface = PlaybackSurface::new(backend.clone());
        surface.add_track("", "None").await;
        assert!(surface.tracks().is_empty());
        assert_eq!(backend.calls(), ["sub-clear"]);
    }

    #[tokio::test]
    async fn toggling_same_subtitle_twice_removes_it() {
        let mut surface = PlaybackSurface::new(RecordingBackend::default());
        let en = subtitle("English", "en.vtt");
        let fr = subtitle("French", "fr.vtt");

        assert!(surface.toggle_subtitle(&en).await);
        assert!(surface.toggle_subtitle(&fr).await);
        assert_eq!(surface.tracks()[0].url, "fr.vtt");
        assert!(!surface.toggle_subtitle(&fr).await);
        assert!(surface.tracks().is_empty());
    }

    #[tokio::test]
    async fn picture_in_picture_failures_are_swallowed() {
        let mut surface = PlaybackSurface::new(RecordingBackend::default());
        surface.toggle_picture_in_picture().await;
        assert!(surface.picture_in_picture());
        surface.toggle_picture_in_picture().await;
        assert!(!surface.picture_in_picture());

        let mut stubborn = PlaybackSurface::new(RecordingBackend {
            reject_pip: true,
            ..Default::default()
        });
        stubborn.toggle_picture_in_picture().await;
        assert!(!stubborn.picture_in_picture());
    }
}
