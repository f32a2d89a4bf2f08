// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

//! Strict records built from the catalog's loosely shaped JSON.
//!
//! The API spells the same thing several ways (`quality` / `resolution` /
//! `label`, `stream_url` / `download_url` / `url` / `file`, ...). Every
//! alias list lives here; nothing outside this module reads raw responses.

use serde::Serialize;
use serde_json::Value;

use crate::format::{is_truthy, parse_int};

/// First present (truthy) field among `keys`.
pub fn first_value<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| value.get(*key))
        .find(|v| is_truthy(v))
}

/// First present field among `keys`, rendered as text.
pub fn first_string(value: &Value, keys: &[&str]) -> Option<String> {
    first_value(value, keys).and_then(value_to_string)
}

pub fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn cover_url(value: &Value) -> Option<String> {
    value
        .get("cover")
        .and_then(|c| first_string(c, &["url"]))
        .or_else(|| first_string(value, &["thumbnail"]))
}

/// Truthy array at `key`, if the field holds one.
fn array_at<'a>(value: &'a Value, key: &str) -> Option<&'a Vec<Value>> {
    value.get(key).and_then(Value::as_array)
}

/// Where a search result leads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum Route {
    Movie(String),
    Series(String),
}

impl Route {
    pub fn id(&self) -> &str {
        match self {
            Route::Movie(id) | Route::Series(id) => id,
        }
    }

    /// Detail page address used by the catalog's web front end.
    pub fn href(&self) -> String {
        match self {
            Route::Movie(id) => format!("movie.html?id={}", id),
            Route::Series(id) => format!("series.html?id={}", id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchItem {
    pub title: String,
    pub year: Option<String>,
    pub kind: Option<String>,
    pub is_series: bool,
    pub cover: Option<String>,
    pub id: Option<String>,
}

impl SearchItem {
    pub fn from_value(value: &Value) -> Self {
        Self {
            title: first_string(value, &["title"]).unwrap_or_default(),
            year: first_string(value, &["year"]),
            kind: first_string(value, &["type"]),
            is_series: value.get("isSeries").is_some_and(is_truthy),
            cover: cover_url(value),
            id: first_string(value, &["subjectId", "id", "_id", "detailPath"]),
        }
    }

    /// `None` for items without any usable identifier.
    pub fn route(&self) -> Option<Route> {
        let id = self.id.clone()?;
        let series = self
            .kind
            .as_deref()
            .is_some_and(|k| k.to_lowercase().contains("series"));
        if series || self.is_series {
            Some(Route::Series(id))
        } else {
            Some(Route::Movie(id))
        }
    }

    /// `"{year} • {type}"` subtitle line of a result card.
    pub fn caption(&self) -> String {
        format!(
            "{} • {}",
            self.year.as_deref().unwrap_or(""),
            self.kind.as_deref().unwrap_or("")
        )
    }
}

/// Items of a search response: `results.items`, else `results`.
pub fn search_items(payload: &Value) -> Vec<SearchItem> {
    let results = payload.get("results");
    let list = results
        .and_then(|r| first_value(r, &["items"]))
        .or_else(|| results.filter(|r| is_truthy(r)));

    list.and_then(Value::as_array)
        .map(|items| items.iter().map(SearchItem::from_value).collect())
        .unwrap_or_default()
}

/// Subject record of an info response: `results.subject`, else `results`.
pub fn extract_subject(payload: &Value) -> Option<&Value> {
    let results = payload.get("results")?;
    first_value(results, &["subject"]).or_else(|| Some(results).filter(|r| is_truthy(r)))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonEntry {
    pub label: String,
    pub season: Option<String>,
}

/// What a subject says about its seasons.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SeasonInfo {
    Explicit(Vec<SeasonEntry>),
    Count(u32),
    Unknown,
}

impl SeasonInfo {
    pub fn from_subject(value: &Value) -> Self {
        let explicit = ["seasons", "seasonsList"]
            .iter()
            .filter_map(|key| array_at(value, key))
            .find(|list| !list.is_empty());

        if let Some(list) = explicit {
            return SeasonInfo::Explicit(list.iter().map(SeasonEntry::from_value).collect());
        }

        match value.get("seasonCount").filter(|v| is_truthy(v)) {
            Some(count) => {
                let n = parse_int(count).unwrap_or(0).clamp(0, i64::from(u32::MAX));
                SeasonInfo::Count(u32::try_from(n).unwrap_or(0))
            }
            None => SeasonInfo::Unknown,
        }
    }
}

impl SeasonEntry {
    pub fn from_value(value: &Value) -> Self {
        let number = first_string(value, &["season", "number"]);
        let label = first_string(value, &["title"]).unwrap_or_else(|| match &number {
            Some(n) => format!("Season {}", n),
            None => "Season".to_string(),
        });
        Self {
            label,
            season: first_string(value, &["season", "number", "id"]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Subject {
    pub title: String,
    pub description: String,
    pub cover: Option<String>,
    #[serde(skip)]
    pub trailer: Option<Value>,
    pub subtitles: Vec<Subtitle>,
    pub seasons: SeasonInfo,
}

impl Subject {
    pub fn from_value(value: &Value) -> Self {
        Self {
            title: first_string(value, &["title", "name"]).unwrap_or_else(|| "Untitled".into()),
            description: first_string(value, &["description", "overview", "postTitle"])
                .unwrap_or_default(),
            cover: cover_url(value),
            trailer: first_value(value, &["trailer", "trailerUrl"]).cloned(),
            subtitles: first_value(value, &["subtitlesList", "subtitles"])
                .map(subtitle_list)
                .unwrap_or_default(),
            seasons: SeasonInfo::from_subject(value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Source {
    pub label: String,
    pub url: Option<String>,
    pub size: Option<Value>,
    #[serde(skip)]
    quality: Option<Value>,
    #[serde(skip)]
    resolution: Option<Value>,
}

impl Source {
    pub fn from_value(value: &Value) -> Self {
        Self {
            label: first_string(value, &["quality", "resolution", "label"])
                .unwrap_or_else(|| "auto".into()),
            url: first_string(value, &["stream_url", "download_url", "url", "file"]),
            size: value.get("size").cloned(),
            quality: value.get("quality").cloned(),
            resolution: value.get("resolution").cloned(),
        }
    }

    /// Numeric quality used to pick the best movie source.
    pub fn rank(&self) -> i64 {
        let parsed = |v: &Option<Value>| {
            v.as_ref()
                .and_then(parse_int)
                .filter(|n| *n != 0)
        };
        parsed(&self.quality)
            .or_else(|| parsed(&self.resolution))
            .unwrap_or(0)
    }

    pub fn size_label(&self) -> String {
        crate::format::bytes_to(self.size.as_ref())
    }
}

/// `results` of a sources response: arrays as is, a lone object wrapped.
pub fn source_list(payload: &Value) -> Vec<Source> {
    match payload.get("results") {
        Some(Value::Array(items)) => items.iter().map(Source::from_value).collect(),
        Some(single) if is_truthy(single) => vec![Source::from_value(single)],
        _ => Vec::new(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Subtitle {
    pub name: String,
    pub url: Option<String>,
}

impl Subtitle {
    pub fn from_value(value: &Value) -> Self {
        let name = first_string(value, &["lanName", "label", "lan"])
            .or_else(|| value_to_string(value))
            .unwrap_or_else(|| "Subtitle".into());
        Self {
            name,
            url: first_string(value, &["url", "file"]),
        }
    }
}

fn subtitle_list(value: &Value) -> Vec<Subtitle> {
    value
        .as_array()
        .map(|items| items.iter().map(Subtitle::from_value).collect())
        .unwrap_or_default()
}

/// Subtitles of a sources response, falling back to the subject's own.
pub fn subtitles_for(sources_payload: &Value, subject: &Subject) -> Vec<Subtitle> {
    match first_value(sources_payload, &["subtitles"]) {
        Some(list) => subtitle_list(list),
        None => subject.subtitles.clone(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Episode {
    pub title: String,
    pub cover: Option<String>,
    pub overview: String,
    pub id: Option<String>,
}

impl Episode {
    pub fn from_value(value: &Value) -> Self {
        let title = first_string(value, &["title", "episodeName"]).unwrap_or_else(|| {
            let n = first_string(value, &["episode", "number"]).unwrap_or_default();
            format!("Episode {}", n).trim_end().to_string()
        });
        Self {
            title,
            cover: cover_url(value),
            overview: first_string(value, &["overview", "description"]).unwrap_or_default(),
            id: first_string(value, &["episode", "number", "id", "_id"]),
        }
    }
}

/// Episodes of a season response: `results`, `episodes`, or the payload.
pub fn episode_list(payload: &Value) -> Vec<Episode> {
    let list = first_value(payload, &["results", "episodes"]).unwrap_or(payload);
    list.as_array()
        .map(|items| items.iter().map(Episode::from_value).collect())
        .unwrap_or_default()
}

/// Sources of an episode payload, with the title shown above the player.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpisodeSources {
    pub title: String,
    pub sources: Vec<Source>,
}

impl EpisodeSources {
    /// Only a non-empty `results` array counts as a list of sources.
    pub fn from_value(payload: &Value) -> Option<Self> {
        let items = array_at(payload, "results").filter(|items| !items.is_empty())?;
        Some(Self {
            title: first_string(payload, &["title"]).unwrap_or_else(|| "Episode".into()),
            sources: items.iter().map(Source::from_value).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn search_items_prefer_nested_items() {
        let payload = json!({"results": {"items": [{"title": "A"}, {"title": "B"}]}});
        assert_eq!(search_items(&payload).len(), 2);

        let flat = json!({"results": [{"title": "A"}]});
        assert_eq!(search_items(&flat)[0].title, "A");

        assert!(search_items(&json!({})).is_empty());
        assert!(search_items(&json!({"results": {"total": 0}})).is_empty());
    }

    #[test]
    fn routes_follow_type_heuristic() {
        let series = SearchItem::from_value(&json!({"subjectId": 42, "type": "TV Series"}));
        assert_eq!(series.route(), Some(Route::Series("42".into())));
        assert_eq!(series.route().unwrap().href(), "series.html?id=42");

        let flagged = SearchItem::from_value(&json!({"_id": "x", "isSeries": true}));
        assert_eq!(flagged.route(), Some(Route::Series("x".into())));

        let movie = SearchItem::from_value(&json!({"detailPath": "m-1", "type": "movie"}));
        assert_eq!(movie.route(), Some(Route::Movie("m-1".into())));

        let inert = SearchItem::from_value(&json!({"title": "No id", "type": "series"}));
        assert_eq!(inert.route(), None);
    }

    #[test]
    fn subject_fields_use_first_present_alias() {
        let subject = Subject::from_value(&json!({
            "name": "Named",
            "overview": "",
            "postTitle": "Post",
            "thumbnail": "t.jpg"
        }));
        assert_eq!(subject.title, "Named");
        assert_eq!(subject.description, "Post");
        assert_eq!(subject.cover.as_deref(), Some("t.jpg"));

        let bare = Subject::from_value(&json!({}));
        assert_eq!(bare.title, "Untitled");
        assert_eq!(bare.cover, None);
    }

    #[test]
    fn extract_subject_prefers_nested_subject() {
        let nested = json!({"results": {"subject": {"title": "S"}, "x": 1}});
        assert_eq!(extract_subject(&nested), Some(&json!({"title": "S"})));

        let flat = json!({"results": {"title": "F"}});
        assert_eq!(extract_subject(&flat), Some(&json!({"title": "F"})));

        assert_eq!(extract_subject(&json!({"results": null})), None);
    }

    #[test]
    fn sources_are_normalised() {
        let payload = json!({"results": {"resolution": "720", "file": "f.mp4", "size": "2048"}});
        let sources = source_list(&payload);
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].label, "720");
        assert_eq!(sources[0].url.as_deref(), Some("f.mp4"));
        assert_eq!(sources[0].size_label(), "2.0 KB");
        assert_eq!(sources[0].rank(), 720);

        assert!(source_list(&json!({"results": null})).is_empty());
    }

    #[test]
    fn rank_falls_back_to_resolution_then_zero() {
        let s = Source::from_value(&json!({"quality": "HD", "resolution": 1080}));
        assert_eq!(s.rank(), 1080);
        let none = Source::from_value(&json!({"quality": "HD"}));
        assert_eq!(none.rank(), 0);
        assert_eq!(none.label, "HD");
    }

    #[test]
    fn subtitles_come_from_sources_then_subject() {
        let subject = Subject::from_value(&json!({"subtitlesList": [{"lan": "fr", "url": "fr.vtt"}]}));
        let own = json!({"subtitles": [{"lanName": "English", "file": "en.vtt"}]});
        assert_eq!(
            subtitles_for(&own, &subject),
            vec![Subtitle { name: "English".into(), url: Some("en.vtt".into()) }]
        );
        assert_eq!(subtitles_for(&json!({}), &subject)[0].name, "fr");

        let bare = Subtitle::from_value(&json!("Deutsch"));
        assert_eq!(bare.name, "Deutsch");
        assert_eq!(bare.url, None);
    }

    #[test]
    fn season_info_priority() {
        let explicit = SeasonInfo::from_subject(&json!({
            "seasons": [{"season": 1}, {"title": "Specials", "number": 2}],
            "seasonCount": 5
        }));
        assert_eq!(
            explicit,
            SeasonInfo::Explicit(vec![
                SeasonEntry { label: "Season 1".into(), season: Some("1".into()) },
                SeasonEntry { label: "Specials".into(), season: Some("2".into()) },
            ])
        );

        // Zero is falsy, so it never counts as a season value
        let zero = SeasonEntry::from_value(&json!({"title": "Specials", "number": 0}));
        assert_eq!(zero, SeasonEntry { label: "Specials".into(), season: None });

        assert_eq!(
            SeasonInfo::from_subject(&json!({"seasons": [], "seasonCount": "3"})),
            SeasonInfo::Count(3)
        );
        assert_eq!(SeasonInfo::from_subject(&json!({"title": "x"})), SeasonInfo::Unknown);
    }

    #[test]
    fn episodes_accept_three_shapes() {
        let a = json!({"results": [{"episode": 1}]});
        let b = json!({"episodes": [{"title": "Pilot", "id": "e1"}]});
        let c = json!([{"number": 3, "description": "d"}]);

        assert_eq!(episode_list(&a)[0].title, "Episode 1");
        assert_eq!(episode_list(&b)[0].title, "Pilot");
        assert_eq!(episode_list(&b)[0].id.as_deref(), Some("e1"));
        assert_eq!(episode_list(&c)[0].overview, "d");
        assert!(episode_list(&json!({"results": []})).is_empty());
    }

    #[test]
    fn episode_sources_need_a_non_empty_array() {
        assert!(EpisodeSources::from_value(&json!({"results": []})).is_none());
        assert!(EpisodeSources::from_value(&json!({"results": {"url": "x"}})).is_none());

        let found = EpisodeSources::from_value(&json!({"results": [{"url": "x"}]})).unwrap();
        assert_eq!(found.title, "Episode");
        assert_eq!(found.sources.len(), 1);
    }
}
