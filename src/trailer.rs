// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::api::types::first_string;
use crate::format::is_truthy;

/// How a trailer should be shown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Trailer {
    YouTube { id: String },
    Video { url: String },
}

impl Trailer {
    pub fn embed_url(&self) -> String {
        match self {
            Trailer::YouTube { id } => format!("https://www.youtube.com/embed/{}", id),
            Trailer::Video { url } => url.clone(),
        }
    }

    /// Address handed to the player. mpv resolves watch pages itself.
    pub fn playable_url(&self) -> String {
        match self {
            Trailer::YouTube { id } => format!("https://www.youtube.com/watch?v={}", id),
            Trailer::Video { url } => url.clone(),
        }
    }

    /// Builds the trailer view from a trailer payload.
    ///
    /// Accepts a `/trailer` response (`results` array or `result` object), a
    /// bare trailer record, or a plain URL string.
    pub fn from_payload(data: &Value) -> Option<Self> {
        let record = match data.get("results") {
            Some(Value::Array(items)) => items.first()?,
            _ => data.get("result").filter(|r| !r.is_null()).unwrap_or(data),
        };

        let url = match record {
            Value::String(s) if !s.is_empty() => s.clone(),
            _ => first_string(record, &["url", "trailer", "source", "file"])?,
        };

        Some(Self::from_url(&url))
    }

    pub fn from_url(url: &str) -> Self {
        match youtube_id(url) {
            Some(id) => Trailer::YouTube { id },
            None => Trailer::Video {
                url: url.to_string(),
            },
        }
    }
}

/// Whether a `/trailer` response carries anything worth rendering.
pub fn has_payload(data: &Value) -> bool {
    let present = |key: &str| data.get(key).is_some_and(is_truthy);
    present("results") || present("result")
}

/// Video id of a YouTube watch page or `youtu.be` short link.
pub fn youtube_id(raw: &str) -> Option<String> {
    let url = Url::parse(raw).ok()?;
    let host = url.host_str()?;

    let id = if host.contains("youtu.be") {
        url.path().trim_start_matches('/').to_string()
    } else if host.contains("youtube.com") {
        url.query_pairs()
            .find(|(k, _)| k == "v")
            .map(|(_, v)| v.into_owned())
            .unwrap_or_default()
    } else {
        return None;
    };

    (!id.is_empty()).then_some(id)
}
