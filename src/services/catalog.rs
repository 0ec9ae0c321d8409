// Catalog metadata service client
// Thin passthrough over the catalog API: resources are fetched as raw JSON
// and composed by the title endpoints; only the fields this server acts on
// (trailer keys) get a typed view.

use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

const REQUEST_TIMEOUT_SECS: u64 = 10;

pub struct CatalogClient {
    client: Client,
    base_url: String,
    auth_query: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VideosResponse {
    results: Vec<VideoEntry>,
}

#[derive(Debug, Deserialize)]
struct VideoEntry {
    key: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
}

impl CatalogClient {
    pub fn new(base_url: String, auth_query: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url,
            auth_query,
        }
    }

    fn resource_url(&self, path: &str) -> String {
        let mut url = format!("{}/{}", self.base_url.trim_end_matches('/'), path);
        if let Some(auth) = &self.auth_query {
            url.push('?');
            url.push_str(auth);
        }
        url
    }

    /// Fetch one catalog resource as raw JSON.
    pub async fn fetch_resource(&self, path: &str) -> Result<Value> {
        let url = self.resource_url(path);
        self.client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch catalog resource {}", path))?
            .error_for_status()
            .with_context(|| format!("Catalog resource {} returned an error status", path))?
            .json()
            .await
            .with_context(|| format!("Failed to parse catalog resource {}", path))
    }

    pub async fn title_details(&self, media_type: &str, id: &str) -> Result<Value> {
        self.fetch_resource(&format!("{}/{}", media_type, id)).await
    }

    pub async fn external_ids(&self, media_type: &str, id: &str) -> Result<Value> {
        self.fetch_resource(&format!("{}/{}/external_ids", media_type, id))
            .await
    }

    pub async fn credits(&self, media_type: &str, id: &str) -> Result<Value> {
        self.fetch_resource(&format!("{}/{}/credits", media_type, id))
            .await
    }

    pub async fn season_details(&self, id: &str, season: i32) -> Result<Value> {
        self.fetch_resource(&format!("tv/{}/season/{}", id, season))
            .await
    }

    pub async fn episode_details(&self, id: &str, season: i32, episode: i32) -> Result<Value> {
        self.fetch_resource(&format!("tv/{}/season/{}/episode/{}", id, season, episode))
            .await
    }

    /// Fetch the title's videos and reduce them to trailer keys.
    pub async fn trailer_keys(&self, media_type: &str, id: &str) -> Result<Vec<String>> {
        let url = self.resource_url(&format!("{}/{}/videos", media_type, id));
        let response: VideosResponse = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to fetch catalog videos")?
            .error_for_status()
            .context("Catalog videos returned an error status")?
            .json()
            .await
            .context("Failed to parse catalog videos response")?;

        Ok(filter_trailers(response.results))
    }
}

fn filter_trailers(entries: Vec<VideoEntry>) -> Vec<String> {
    entries
        .into_iter()
        .filter(|entry| entry.kind.as_deref() == Some("Trailer"))
        .filter_map(|entry| entry.key)
        .collect()
}
