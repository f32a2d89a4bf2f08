// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use serde::Serialize;
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::api::types::search_items;
use crate::api::{MovieApi, Route, SearchItem};
use crate::fallback::FallbackChain;

/// Queries tried, in order, for the "popular" listing.
pub const POPULAR_QUERIES: [&str; 3] = ["trending", "popular", "top"];

/// Fires once the input has been quiet for `wait`.
#[derive(Debug, Clone)]
pub struct Debouncer {
    wait: Duration,
    last_touch: Option<Instant>,
}

impl Debouncer {
    pub fn new(wait: Duration) -> Self {
        Self {
            wait,
            last_touch: None,
        }
    }

    /// Restart the quiet period.
    pub fn touch(&mut self, now: Instant) {
        self.last_touch = Some(now);
    }

    pub fn is_pending(&self) -> bool {
        self.last_touch.is_some()
    }

    pub fn cancel(&mut self) {
        self.last_touch = None;
    }

    /// True exactly once per burst of touches.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.last_touch {
            Some(at) if now.saturating_duration_since(at) >= self.wait => {
                self.last_touch = None;
                true
            }
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultCard {
    pub title: String,
    pub caption: String,
    pub cover: Option<String>,
    /// `None` makes the card inert.
    pub route: Option<Route>,
}

impl From<&SearchItem> for ResultCard {
    fn from(item: &SearchItem) -> Self {
        Self {
            title: item.title.clone(),
            caption: item.caption(),
            cover: item.cover.clone(),
            route: item.route(),
        }
    }
}

/// What the results panel shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultsView {
    /// `None` leaves the previous count label in place.
    pub count_label: Option<String>,
    pub cards: Vec<ResultCard>,
    pub message: Option<String>,
}

impl ResultsView {
    pub fn message(text: &str) -> Self {
        Self {
            count_label: None,
            cards: Vec::new(),
            message: Some(text.to_string()),
        }
    }
}

pub fn render_results(items: &[SearchItem]) -> ResultsView {
    if items.is_empty() {
        return ResultsView {
            count_label: Some("No results".into()),
            cards: Vec::new(),
            message: Some("No movies or series found.".into()),
        };
    }

    ResultsView {
        count_label: Some(format!("{} results", items.len())),
        cards: items.iter().map(ResultCard::from).collect(),
        message: None,
    }
}

/// Raw search response, or `None` for an empty query or a failed call.
pub async fn search(api: &MovieApi, query: &str) -> Option<Value> {
    if query.is_empty() {
        return None;
    }
    match api.search(query).await {
        Ok(data) => Some(data),
        Err(e) => {
            warn!("Search for {:?} failed: {}", query, e);
            None
        }
    }
}

/// Live or explicit search. An empty query is a no-op and returns `None`,
/// leaving whatever is on screen untouched.
pub async fn run_query(api: &MovieApi, query: &str) -> Option<ResultsView> {
    let query = query.trim();
    if query.is_empty() {
        return None;
    }
    let items = search(api, query)
        .await
        .map(|data| search_items(&data))
        .unwrap_or_default();
    Some(render_results(&items))
}

/// First non-empty listing among [`POPULAR_QUERIES`].
pub async fn popular(api: &MovieApi) -> ResultsView {
    let mut chain = FallbackChain::new("popular");
    for query in POPULAR_QUERIES {
        chain = chain.step(query, move || async move {
            let data = api.search(query).await?;
            let items = search_items(&data);
            Ok((!items.is_empty()).then_some(items))
        });
    }

    match chain.run().await {
        Some(items) => render_results(&items),
        None => ResultsView::message("No trending results found."),
    }
}

/// Listing shown before the user types anything.
pub async fn initial_load(api: &MovieApi) -> ResultsView {
    match api.search("popular").await {
        Ok(data) => render_results(&search_items(&data)),
        Err(e) => {
            debug!("Initial listing failed: {}", e);
            ResultsView::message("Start by searching above")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::client::test_support::api_for;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn debouncer_fires_once_after_quiet_period() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(Duration::from_millis(350));
        assert!(!debouncer.poll(start));

        debouncer.touch(start);
        debouncer.touch(start + Duration::from_millis(200));
        assert!(!debouncer.poll(start + Duration::from_millis(400)));
        assert!(debouncer.poll(start + Duration::from_millis(550)));
        assert!(!debouncer.poll(start + Duration::from_millis(900)));
    }

    #[test]
    fn empty_results_render_only_the_message() {
        let view = render_results(&[]);
        assert_eq!(view.count_label.as_deref(), Some("No results"));
        assert_eq!(view.message.as_deref(), Some("No movies or series found."));
        assert!(view.cards.is_empty());
    }

    #[test]
    fn one_card_per_item() {
        let items: Vec<SearchItem> = (0..3)
            .map(|i| SearchItem::from_value(&json!({"title": format!("T{}", i), "id": i + 1})))
            .collect();
        let view = render_results(&items);
        assert_eq!(view.count_label.as_deref(), Some("3 results"));
        assert_eq!(view.cards.len(), 3);
        assert_eq!(view.cards[1].route, Some(Route::Movie("2".into())));
        assert_eq!(view.message, None);
    }

    #[tokio::test]
    async fn empty_query_is_a_no_op() {
        let server = MockServer::start().await;
        let (_dir, api) = api_for(&server.uri());
        assert_eq!(run_query(&api, "   ").await, None);
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_search_renders_no_results() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/search/dune"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let (_dir, api) = api_for(&server.uri());
        let view = run_query(&api, " dune ").await.unwrap();
        assert_eq!(view.count_label.as_deref(), Some("No results"));
    }

    #[tokio::test]
    async fn popular_stops_at_first_listing_with_items() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/search/trending"))
            .respond_with(ResponseTemplate::new(502))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/search/popular"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": {"items": [{"title": "Hit", "subjectId": "9", "type": "TV Series"}]}
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/search/top"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
            .expect(0)
            .mount(&server)
            .await;

        let (_dir, api) = api_for(&server.uri());
        let view = popular(&api).await;
        assert_eq!(view.count_label.as_deref(), Some("1 results"));
        assert_eq!(view.cards[0].route, Some(Route::Series("9".into())));
    }

    #[tokio::test]
    async fn popular_with_nothing_anywhere() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
            .expect(3)
            .mount(&server)
            .await;

        let (_dir, api) = api_for(&server.uri());
        let view = popular(&api).await;
        assert_eq!(view.message.as_deref(), Some("No trending results found."));
        assert_eq!(view.count_label, None);
    }

    #[tokio::test]
    async fn initial_load_failure_invites_a_search() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/search/popular"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let (_dir, api) = api_for(&server.uri());
        let view = initial_load(&api).await;
        assert_eq!(view.message.as_deref(), Some("Start by searching above"));
        assert!(view.cards.is_empty());
    }
}
