// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

mod mpv;

use anyhow::{Context, Result};
use mpv::MpvIpc;
use serde_json::{Value, json};
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::api::Subtitle;
use crate::config::PlayerConfig;
use crate::playback::{PlaybackBackend, TRACK_SHOW_DELAY};

const MAX_SUB_TRACKS: usize = 16;

/// One-shot playback for the command line.
#[derive(Debug, Clone)]
pub struct Player {
    config: PlayerConfig,
    available: bool,
}

impl Player {
    pub fn new(config: PlayerConfig) -> Self {
        let available = Self::is_command_available(&config.command);
        if available {
            debug!("{} detected and will be used as the video player", config.command);
        } else {
            debug!("{} not found, playback is disabled", config.command);
        }
        Self { config, available }
    }

    fn is_command_available(command: &str) -> bool {
        Command::new(command)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    pub fn ensure_available(&self) -> Result<()> {
        if !self.available {
            anyhow::bail!(
                "{} is not installed. Please install it to play streams.",
                self.config.command
            );
        }
        Ok(())
    }

    fn command_for(&self, url: &str, title: &str, subtitle: Option<&Subtitle>) -> Command {
        let mut cmd = Command::new(&self.config.command);
        cmd.arg(url)
            .arg(format!("--title={}", title))
            .args(&self.config.args);
        if let Some(sub_url) = subtitle.and_then(|s| s.url.as_deref()) {
            cmd.arg(format!("--sub-file={}", sub_url));
        }
        cmd
    }

    /// Play and wait for the player to exit.
    pub async fn play_blocking(
        &self,
        url: &str,
        title: &str,
        subtitle: Option<&Subtitle>,
    ) -> Result<()> {
        self.ensure_available()?;

        let mut cmd = self.command_for(url, title, subtitle);
        let status = tokio::task::spawn_blocking(move || cmd.status())
            .await
            .context("Failed to wait for player")?
            .with_context(|| format!("Failed to start {}", self.config.command))?;

        if !status.success()
            && let Some(code) = status.code()
        {
            // Exit code 4 is a normal user quit in mpv
            if code != 4 {
                anyhow::bail!("{} exited with code: {}", self.config.command, code);
            }
        }

        Ok(())
    }

    /// Start the player in its own session and return immediately.
    pub fn play_detached(&self, url: &str, title: &str, subtitle: Option<&Subtitle>) -> Result<()> {
        self.ensure_available()?;

        let mut cmd = if cfg!(target_os = "linux") {
            let mut setsid = Command::new("setsid");
            setsid.arg(&self.config.command);
            setsid.arg(url).arg(format!("--title={}", title)).args(&self.config.args);
            if let Some(sub_url) = subtitle.and_then(|s| s.url.as_deref()) {
                setsid.arg(format!("--sub-file={}", sub_url));
            }
            setsid
        } else {
            self.command_for(url, title, subtitle)
        };

        cmd.stdout(Stdio::null())
            .stderr(Stdio::null())
            .stdin(Stdio::null())
            .spawn()
            .with_context(|| format!("Failed to start {} in detached mode", self.config.command))?;

        Ok(())
    }
}

/// Commands for the mpv worker, handled strictly in order.
enum Request {
    Load(String),
    SetProperty(&'static str, Value),
    AddSubtitle { url: String, label: String },
    ShowSubtitle,
    ClearSubtitles,
    Flush(oneshot::Sender<()>),
}

/// Long-running mpv driven over its IPC socket; backs the TUI's player.
///
/// Calls only enqueue work. A worker task owns the IPC conversation,
/// including the lazy launch, so callers never wait on mpv.
#[derive(Clone)]
pub struct MpvBackend {
    command: String,
    mpv: Arc<Mutex<Option<MpvIpc>>>,
    queue: mpsc::UnboundedSender<Request>,
}

impl std::fmt::Debug for MpvBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MpvBackend")
            .field("command", &self.command)
            .finish()
    }
}

impl MpvBackend {
    /// Spawns the worker, so this needs a running tokio runtime.
    pub fn new(config: PlayerConfig) -> Self {
        let mpv = Arc::new(Mutex::new(None));
        let (queue, requests) = mpsc::unbounded_channel();
        let command = config.command.clone();
        tokio::spawn(run_worker(config, mpv.clone(), requests));
        Self {
            command,
            mpv,
            queue,
        }
    }

    fn submit(&self, request: Request) -> Result<()> {
        self.queue
            .send(request)
            .map_err(|_| anyhow::anyhow!("MPV worker has stopped"))
    }

    /// Wait until everything queued so far has been handled.
    pub async fn flush(&self) {
        let (done, handled) = oneshot::channel();
        if self.submit(Request::Flush(done)).is_ok() {
            let _ = handled.await;
        }
    }

    pub async fn is_running(&self) -> bool {
        let mut guard = self.mpv.lock().await;
        guard.as_mut().is_some_and(|mpv| mpv.is_running())
    }

    pub async fn shutdown(&self) {
        if let Some(mut mpv) = self.mpv.lock().await.take() {
            mpv.shutdown();
        }
    }
}

async fn run_worker(
    config: PlayerConfig,
    mpv: Arc<Mutex<Option<MpvIpc>>>,
    mut requests: mpsc::UnboundedReceiver<Request>,
) {
    let mut after_sub_add = false;
    while let Some(request) = requests.recv().await {
        let request = match request {
            Request::Flush(done) => {
                let _ = done.send(());
                continue;
            }
            other => other,
        };

        // A freshly added track needs a moment before it can be shown
        if matches!(request, Request::ShowSubtitle) && after_sub_add {
            sleep(TRACK_SHOW_DELAY).await;
        }
        after_sub_add = matches!(request, Request::AddSubtitle { .. });

        let mut slot = mpv.lock().await;
        if let Err(e) = handle_request(&config, &mut slot, request).await {
            debug!("MPV request failed: {:#}", e);
        }
    }
    debug!("MPV worker finished");
}

async fn handle_request(
    config: &PlayerConfig,
    slot: &mut Option<MpvIpc>,
    request: Request,
) -> Result<()> {
    if matches!(request, Request::Load(_)) && !slot.as_mut().is_some_and(|mpv| mpv.is_running()) {
        let mut mpv = MpvIpc::new();
        if let Err(e) = mpv.launch(config).await {
            warn!("Could not start {}: {:#}", config.command, e);
            return Err(e);
        }
        *slot = Some(mpv);
    }

    let mpv = match slot.as_mut() {
        Some(mpv) => {
            if !mpv.is_running() {
                anyhow::bail!("MPV is not running");
            }
            mpv
        }
        None => anyhow::bail!("MPV is not running"),
    };

    match request {
        Request::Load(url) => {
            debug!("Loading {} via {:?}", url, mpv.socket());
            mpv.command(&[json!("loadfile"), json!(url), json!("replace")])?;
        }
        Request::SetProperty(name, value) => mpv.set_property(name, value)?,
        Request::AddSubtitle { url, label } => {
            mpv.command(&[json!("sub-add"), json!(url), json!("auto"), json!(label)])?;
        }
        Request::ShowSubtitle => mpv.set_property("sub-visibility", json!(true))?,
        Request::ClearSubtitles => {
            // sub-remove without an id drops the selected track; repeat
            // until mpv reports there is nothing left.
            for _ in 0..MAX_SUB_TRACKS {
                if mpv.command(&[json!("sub-remove")]).is_err() {
                    break;
                }
            }
        }
        Request::Flush(done) => {
            let _ = done.send(());
        }
    }
    Ok(())
}

impl PlaybackBackend for MpvBackend {
    /// The worker waits before showing a new track instead.
    const SHOW_DELAY: Duration = Duration::ZERO;

    async fn pause(&self) -> Result<()> {
        self.submit(Request::SetProperty("pause", json!(true)))
    }

    async fn load(&self, url: &str) -> Result<()> {
        self.submit(Request::Load(url.to_string()))
    }

    async fn play(&self) -> Result<()> {
        self.submit(Request::SetProperty("pause", json!(false)))
    }

    async fn add_subtitle(&self, url: &str, label: &str) -> Result<()> {
        self.submit(Request::AddSubtitle {
            url: url.to_string(),
            label: label.to_string(),
        })
    }

    async fn show_subtitle(&self) -> Result<()> {
        self.submit(Request::ShowSubtitle)
    }

    async fn clear_subtitles(&self) -> Result<()> {
        self.submit(Request::ClearSubtitles)
    }

    async fn set_picture_in_picture(&self, enabled: bool) -> Result<()> {
        self.submit(Request::SetProperty("ontop", json!(enabled)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn missing_player() -> PlayerConfig {
        PlayerConfig {
            command: "moviecat-test-no-such-player".into(),
            args: Vec::new(),
        }
    }

    #[test]
    fn missing_command_is_unavailable() {
        let player = Player::new(missing_player());
        assert!(!player.is_available());
        assert!(player.ensure_available().is_err());
    }

    #[tokio::test]
    async fn commands_without_mpv_return_at_once() {
        let backend = MpvBackend::new(missing_player());

        let started = Instant::now();
        backend.pause().await.unwrap();
        backend.add_subtitle("http://x/en.srt", "English").await.unwrap();
        backend.show_subtitle().await.unwrap();
        assert!(started.elapsed() < Duration::from_millis(100));

        tokio::time::timeout(Duration::from_secs(5), backend.flush())
            .await
            .unwrap();
        assert!(!backend.is_running().await);
    }

    #[tokio::test]
    async fn failed_launch_leaves_backend_stopped() {
        let backend = MpvBackend::new(missing_player());
        backend.load("http://x/movie.mp4").await.unwrap();
        tokio::time::timeout(Duration::from_secs(5), backend.flush())
            .await
            .unwrap();
        assert!(!backend.is_running().await);
        backend.shutdown().await;
    }
}
