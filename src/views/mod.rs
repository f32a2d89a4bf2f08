// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

//! Controllers for each screen.
//!
//! Every controller fetches through [`crate::api::MovieApi`], normalises the
//! payloads and hands back a plain view model. Binding those models to the
//! terminal lives in [`crate::tui`] and [`crate::cli`].

pub mod episodes;
pub mod movie;
pub mod search;
pub mod series;

pub use episodes::{EpisodeCard, EpisodeListView, EpisodePlayerView};
pub use movie::{MovieController, MovieView, QualityOption, SubtitleOption};
pub use search::{Debouncer, ResultCard, ResultsView};
pub use series::{SeasonButton, SeasonsView, SeriesView};
