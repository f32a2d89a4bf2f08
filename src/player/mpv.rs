// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use anyhow::{Context, Result};
use serde_json::{Value, json};
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::os::unix::fs::PermissionsExt;
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, warn};

use crate::config::PlayerConfig;

const SOCKET_POLL: Duration = Duration::from_millis(250);
const SOCKET_ATTEMPTS: u32 = 20;
const IPC_TIMEOUT: Duration = Duration::from_secs(2);

/// One line of mpv's JSON IPC protocol.
fn encode_command(args: &[Value]) -> String {
    let mut line = json!({ "command": args }).to_string();
    line.push('\n');
    line
}

/// Reply of an IPC command; anything but `"error": "success"` fails.
fn decode_reply(line: &str) -> Result<Value> {
    let reply: Value = serde_json::from_str(line.trim_end())
        .with_context(|| format!("Failed to parse MPV reply: {}", line))?;
    match reply.get("error").and_then(Value::as_str) {
        Some("success") | None => Ok(reply),
        Some(error) => anyhow::bail!("MPV command failed: {}", error),
    }
}

/// Per-user socket under `$XDG_STATE_HOME/moviecat`, or the temp dir.
fn socket_path() -> PathBuf {
    // SAFETY: getuid has no preconditions and cannot fail.
    let uid = unsafe { libc::getuid() };
    let fallback = std::env::temp_dir().join(format!("moviecat-mpv-{}.sock", uid));

    let state_dir = std::env::var("XDG_STATE_HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| dirs::home_dir().map(|home| home.join(".local").join("state")));
    let Some(app_dir) = state_dir.map(|dir| dir.join("moviecat")) else {
        return fallback;
    };

    if !app_dir.exists() {
        if let Err(e) = fs::create_dir_all(&app_dir) {
            warn!("Failed to create state directory: {}", e);
            return fallback;
        }
        if let Err(e) = fs::set_permissions(&app_dir, fs::Permissions::from_mode(0o700)) {
            warn!("Failed to set permissions on state directory: {}", e);
        }
    }
    app_dir.join("mpv.sock")
}

/// A long lived mpv window controlled over its IPC socket.
pub(super) struct MpvIpc {
    socket: PathBuf,
    child: Option<Child>,
}

impl MpvIpc {
    pub(super) fn new() -> Self {
        Self::at(socket_path())
    }

    fn at(socket: PathBuf) -> Self {
        Self {
            socket,
            child: None,
        }
    }

    pub(super) fn socket(&self) -> &Path {
        &self.socket
    }

    pub(super) fn command(&self, args: &[Value]) -> Result<Value> {
        let mut stream = UnixStream::connect(&self.socket)
            .with_context(|| format!("Failed to connect to MPV socket at {:?}", self.socket))?;
        stream.set_read_timeout(Some(IPC_TIMEOUT))?;
        stream.set_write_timeout(Some(IPC_TIMEOUT))?;

        let line = encode_command(args);
        debug!("MPV <- {}", line.trim_end());
        stream.write_all(line.as_bytes())?;

        let mut reply = String::new();
        BufReader::new(stream)
            .read_line(&mut reply)
            .context("No reply from MPV")?;
        decode_reply(&reply)
    }

    pub(super) fn set_property(&self, name: &str, value: Value) -> Result<()> {
        self.command(&[json!("set_property"), json!(name), value])?;
        Ok(())
    }

    fn responds(&self) -> bool {
        self.socket.exists()
            && self
                .command(&[json!("get_property"), json!("mpv-version")])
                .is_ok()
    }

    fn reap(&mut self) -> bool {
        if let Some(child) = self.child.as_mut()
            && let Ok(Some(status)) = child.try_wait()
        {
            debug!("MPV exited with status: {:?}", status);
            self.child = None;
            return true;
        }
        false
    }

    /// Start an idle mpv with IPC enabled and wait for its socket.
    pub(super) async fn launch(&mut self, config: &PlayerConfig) -> Result<()> {
        if self.responds() {
            debug!("MPV already listening on {:?}", self.socket);
            return Ok(());
        }

        self.kill();
        let _ = fs::remove_file(&self.socket);

        let mut cmd = Command::new(&config.command);
        cmd.arg(format!("--input-ipc-server={}", self.socket.display()))
            .args(["--idle=yes", "--keep-open=yes", "--no-terminal", "--really-quiet"])
            .arg("--title=moviecat")
            .args(&config.args)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .stdin(Stdio::null());

        debug!("Starting MPV: {:?}", cmd);
        self.child = Some(
            cmd.spawn()
                .with_context(|| format!("Failed to start {}. Is it installed?", config.command))?,
        );

        for attempt in 1..=SOCKET_ATTEMPTS {
            sleep(SOCKET_POLL).await;
            if self.reap() {
                error!("MPV exited before its IPC socket came up");
                anyhow::bail!("MPV exited before its IPC socket came up");
            }
            if self.responds() {
                debug!("MPV IPC socket ready after {:?}", SOCKET_POLL * attempt);
                return Ok(());
            }
        }

        anyhow::bail!(
            "MPV IPC socket failed to start after {:?}",
            SOCKET_POLL * SOCKET_ATTEMPTS
        )
    }

    pub(super) fn is_running(&mut self) -> bool {
        !self.reap() && self.responds()
    }

    fn kill(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }

    pub(super) fn shutdown(&mut self) {
        if self.responds() {
            let _ = self.command(&[json!("quit")]);
        }
        self.kill();
        let _ = fs::remove_file(&self.socket);
    }
}

impl Drop for MpvIpc {
    fn drop(&mut self) {
        if self.child.is_some() {
            self.shutdown();
        }
    }
}
