// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

pub mod client;
pub mod types;

pub use client::MovieApi;
pub use types::{
    Episode, EpisodeSources, Route, SearchItem, SeasonEntry, SeasonInfo, Source, Subject, Subtitle,
};
