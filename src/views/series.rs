// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error};

use crate::api::types::extract_subject;
use crate::api::{MovieApi, SeasonInfo, Subject};
use crate::error::ApiError;
use crate::format::is_truthy;
use crate::views::episodes::{EpisodeListView, load_episodes};

/// Season tried when a series says nothing about its seasons.
pub const GUESSED_SEASON: &str = "1";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeasonButton {
    pub label: String,
    /// Value passed to the episode list.
    pub season: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SeasonsView {
    pub buttons: Vec<SeasonButton>,
    pub notices: Vec<String>,
    /// Episodes of the guessed season 1, when it was tried.
    pub guessed: Option<EpisodeListView>,
}

impl SeasonsView {
    fn from_info(info: &SeasonInfo) -> Option<Self> {
        let buttons = match info {
            SeasonInfo::Explicit(entries) => entries
                .iter()
                .map(|entry| SeasonButton {
                    label: entry.label.clone(),
                    season: entry.season.clone().unwrap_or_default(),
                })
                .collect(),
            SeasonInfo::Count(count) => (1..=*count)
                .map(|n| SeasonButton {
                    label: format!("Season {}", n),
                    season: n.to_string(),
                })
                .collect(),
            SeasonInfo::Unknown => return None,
        };
        Some(Self {
            buttons,
            ..Default::default()
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesView {
    pub id: String,
    pub subject: Option<Subject>,
    /// Replaces the info panel.
    pub message: Option<String>,
    pub seasons: SeasonsView,
}

impl SeriesView {
    fn message(id: &str, text: &str) -> Self {
        Self {
            id: id.to_string(),
            subject: None,
            message: Some(text.to_string()),
            seasons: SeasonsView::default(),
        }
    }
}

/// `/series/{id}`, else the subject of `/info/{id}`.
///
/// Only the info lookup can fail the whole load; the series endpoint is
/// optional.
async fn fetch_series_record(api: &MovieApi, id: &str) -> Result<Option<Value>, ApiError> {
    match api.series(id).await {
        Ok(data) if is_truthy(&data) => {
            let record = extract_subject(&data).cloned().unwrap_or(data);
            return Ok(Some(record));
        }
        Ok(_) => debug!("Series endpoint returned nothing for {}", id),
        Err(e) => debug!("Series endpoint failed for {}: {}", id, e),
    }

    let info = api.info(id).await?;
    Ok(extract_subject(&info).cloned())
}

pub async fn load(api: &MovieApi, id: &str) -> SeriesView {
    let record = match fetch_series_record(api, id).await {
        Ok(Some(record)) => record,
        Ok(None) => return SeriesView::message(id, "Series info not available"),
        Err(e) => {
            error!("Loading series {} failed: {}", id, e);
            return SeriesView::message(id, "Error loading series");
        }
    };

    let subject = Subject::from_value(&record);
    let seasons = match SeasonsView::from_info(&subject.seasons) {
        Some(seasons) => seasons,
        None => guess_first_season(api, id).await,
    };

    SeriesView {
        id: id.to_string(),
        subject: Some(subject),
        message: None,
        seasons,
    }
}

async fn guess_first_season(api: &MovieApi, id: &str) -> SeasonsView {
    let mut seasons = SeasonsView {
        notices: vec!["No seasons metadata — trying episodes endpoint".into()],
        ..Default::default()
    };

    let (view, found) = load_episodes(api, id, GUESSED_SEASON).await;
    if !found {
        seasons
            .notices
            .push("No seasons or episodes available.".into());
    }
    seasons.guessed = Some(view);
    seasons
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::client::test_support::api_for;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn series_returns(server: &MockServer, id: &str, body: Value) {
        Mock::given(method("GET"))
            .and(path(format!("/api/series/{}", id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn explicit_seasons_become_buttons() {
        let server = MockServer::start().await;
        series_returns(
            &server,
            "a",
            json!({
                "title": "Show",
                "seasons": [{"season": 1}, {"title": "Extras", "id": "x"}]
            }),
        )
        .await;

        let (_dir, api) = api_for(&server.uri());
        let view = load(&api, "a").await;
        assert_eq!(view.subject.unwrap().title, "Show");
        assert_eq!(
            view.seasons.buttons,
            vec![
                SeasonButton { label: "Season 1".into(), season: "1".into() },
                SeasonButton { label: "Extras".into(), season: "x".into() },
            ]
        );
        assert_eq!(view.seasons.guessed, None);
    }

    #[tokio::test]
    async fn season_count_becomes_numbered_buttons() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/series/b"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/info/b"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": {"subject": {"name": "Counted", "seasonCount": "3"}}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let (_dir, api) = api_for(&server.uri());
        let view = load(&api, "b").await;
        let labels: Vec<_> = view.seasons.buttons.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, ["Season 1", "Season 2", "Season 3"]);
        assert_eq!(view.seasons.buttons[2].season, "3");
    }

    #[tokio::test]
    async fn missing_metadata_tries_season_one_once() {
        let server = MockServer::start().await;
        series_returns(&server, "c", json!({"title": "Mystery"})).await;
        Mock::given(method("GET"))
            .and(path("/api/episodes/c/1"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/episodes/c"))
            .and(query_param("season", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
            .expect(1)
            .mount(&server)
            .await;

        let (_dir, api) = api_for(&server.uri());
        let view = load(&api, "c").await;
        assert!(view.seasons.buttons.is_empty());
        assert_eq!(
            view.seasons.notices,
            vec![
                "No seasons metadata — trying episodes endpoint".to_string(),
                "No seasons or episodes available.".to_string(),
            ]
        );
        assert_eq!(view.seasons.guessed.unwrap().season, "1");
    }

    #[tokio::test]
    async fn successful_guess_adds_no_failure_notice() {
        let server = MockServer::start().await;
        series_returns(&server, "d", json!({"results": {"title": "Wrapped"}})).await;
        Mock::given(method("GET"))
            .and(path("/api/episodes/d/1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"episode": 1}])))
            .expect(1)
            .mount(&server)
            .await;

        let (_dir, api) = api_for(&server.uri());
        let view = load(&api, "d").await;
        assert_eq!(view.subject.unwrap().title, "Wrapped");
        assert_eq!(view.seasons.notices.len(), 1);
        assert_eq!(view.seasons.guessed.unwrap().cards.len(), 1);
    }

    #[tokio::test]
    async fn info_failure_is_a_series_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/info/e"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let (_dir, api) = api_for(&server.uri());
        let view = load(&api, "e").await;
        assert_eq!(view.message.as_deref(), Some("Error loading series"));
        assert_eq!(view.subject, None);
    }

    #[tokio::test]
    async fn no_record_anywhere() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/info/f"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": null})))
            .mount(&server)
            .await;

        let (_dir, api) = api_for(&server.uri());
        let view = load(&api, "f").await;
        assert_eq!(view.message.as_deref(), Some("Series info not available"));
    }
}
