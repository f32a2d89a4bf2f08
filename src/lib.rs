// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod fallback;
pub mod format;
pub mod playback;
pub mod player;
pub mod session;
pub mod setup;
pub mod trailer;
pub mod tui;
pub mod views;

pub use api::MovieApi;
pub use cache::ResponseCache;
pub use config::Config;
pub use error::{ApiError, PlayError};
pub use player::{MpvBackend, Player};
pub use tui::run_tui;
