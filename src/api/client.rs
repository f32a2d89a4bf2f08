// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::cache::{DEFAULT_TTL, ResponseCache};
use crate::config::ApiConfig;
use crate::error::ApiError;

/// Gateway to the catalog API.
///
/// Every GET goes through the response cache, keyed by the full URL. A fresh
/// cached body short-circuits the network call; every successful fetch
/// refreshes the cache.
#[derive(Debug, Clone)]
pub struct MovieApi {
    client: Client,
    base_url: String,
    cache: ResponseCache,
    ttl: Duration,
}

impl MovieApi {
    pub fn new(config: &ApiConfig, cache: ResponseCache) -> Result<Self> {
        let parsed = reqwest::Url::parse(&config.base_url)
            .with_context(|| format!("Invalid API base URL: {}", config.base_url))?;
        debug!("Using catalog API at {}", parsed);

        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(config.timeout_secs))
                .user_agent(config.user_agent.clone())
                .build()?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            cache,
            ttl: DEFAULT_TTL,
        })
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn request(&self, path: &str) -> Result<Value, ApiError> {
        let url = self.url_for(path);

        if let Some(cached) = self.cache.get(&url, self.ttl).await {
            debug!("Cache hit: {}", url);
            return Ok(cached);
        }

        debug!("Requesting: {}", url);
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        let json: Value = serde_json::from_slice(&body)?;

        self.cache.set(&url, &json).await;
        Ok(json)
    }

    /// Uncached GET used by the `api` subcommand to show exactly what the
    /// server answers right now.
    pub async fn request_raw(&self, path: &str) -> Result<Value, ApiError> {
        let url = self.url_for(path);
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status(status.as_u16()));
        }
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    pub async fn search(&self, query: &str) -> Result<Value, ApiError> {
        self.request(&format!("/search/{}", urlencoding::encode(query)))
            .await
    }

    pub async fn info(&self, id: &str) -> Result<Value, ApiError> {
        self.request(&format!("/info/{}", urlencoding::encode(id)))
            .await
    }

    pub async fn trailer(&self, id: &str) -> Result<Value, ApiError> {
        self.request(&format!("/trailer/{}", urlencoding::encode(id)))
            .await
    }

    pub async fn sources(&self, id: &str) -> Result<Value, ApiError> {
        self.request(&format!("/sources/{}", urlencoding::encode(id)))
            .await
    }

    pub async fn episode_sources(
        &self,
        series_id: &str,
        season: &str,
        episode_id: &str,
    ) -> Result<Value, ApiError> {
        self.request(&format!(
            "/sources/{}/{}/{}",
            urlencoding::encode(series_id),
            urlencoding::encode(season),
            urlencoding::encode(episode_id)
        ))
        .await
    }

    pub async fn series(&self, id: &str) -> Result<Value, ApiError> {
        self.request(&format!("/series/{}", urlencoding::encode(id)))
            .await
    }

    pub async fn episodes_by_path(&self, series_id: &str, season: &str) -> Result<Value, ApiError> {
        self.request(&format!(
            "/episodes/{}/{}",
            urlencoding::encode(series_id),
            urlencoding::encode(season)
        ))
        .await
    }

    pub async fn episodes_by_query(
        &self,
        series_id: &str,
        season: &str,
    ) -> Result<Value, ApiError> {
        self.request(&format!(
            "/episodes/{}?season={}",
            urlencoding::encode(series_id),
            urlencoding::encode(season)
        ))
        .await
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Gateway against a mock server with a throwaway cache directory.
    pub(crate) fn api_for(server_uri: &str) -> (tempfile::TempDir, MovieApi) {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResponseCache::with_dir(dir.path().join("responses")).unwrap();
        let config = ApiConfig {
            base_url: format!("{}/api", server_uri),
            user_agent: "moviecat-test".into(),
            timeout_secs: 5,
        };
        (dir, MovieApi::new(&config, cache).unwrap())
    }
}
