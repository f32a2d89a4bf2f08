// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use anyhow::Result;
use serde_json::json;

use super::{CommandContext, OutputFormat, with_spinner};
use moviecat::views::ResultsView;
use moviecat::views::search;

pub struct SearchCommand {
    /// `None` lists trending titles instead.
    pub query: Option<String>,
    pub format: OutputFormat,
}

impl SearchCommand {
    pub async fn execute(self, context: CommandContext) -> Result<()> {
        let view = match &self.query {
            Some(query) => {
                let message = format!("Searching for \"{}\"...", query);
                match with_spinner(&message, search::run_query(&context.api, query)).await {
                    Some(view) => view,
                    None => anyhow::bail!("Search query is empty"),
                }
            }
            None => with_spinner("Loading trending titles...", search::popular(&context.api)).await,
        };

        let cards: Vec<_> = view
            .cards
            .iter()
            .map(|card| {
                json!({
                    "title": card.title,
                    "caption": card.caption,
                    "cover": card.cover,
                    "route": card.route,
                    "href": card.route.as_ref().map(|r| r.href()),
                })
            })
            .collect();
        let output = json!({
            "count": view.count_label,
            "message": view.message,
            "results": cards,
        });

        self.format.emit(&output, |_| print_text(&view))
    }
}

fn print_text(view: &ResultsView) {
    if let Some(label) = &view.count_label {
        println!("{}", label);
    }
    if let Some(message) = &view.message {
        println!("{}", message);
    }
    for card in &view.cards {
        let target = card
            .route
            .as_ref()
            .map(|r| format!("{:<8} {}", kind_of(r), r.id()))
            .unwrap_or_else(|| "-".to_string());
        println!("{:<24} {} ({})", target, card.title, card.caption);
    }
}

fn kind_of(route: &moviecat::api::Route) -> &'static str {
    match route {
        moviecat::api::Route::Movie(_) => "movie",
        moviecat::api::Route::Series(_) => "series",
    }
}
