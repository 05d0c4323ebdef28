use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::cache::{cache_key, Params, ResponseCache, DEFAULT_TTL};
use crate::tmdb::http_client;

pub const OMDB_BASE: &str = "http://www.omdbapi.com/";

/// Ratings lookups by IMDb id. Unconfigured keys, upstream failures and
/// "not found" payloads all come back as `None`.
#[async_trait]
pub trait OmdbApi: Send + Sync {
    fn is_configured(&self) -> bool;
    async fn fetch_title(&self, imdb_id: &str) -> Option<Value>;
}

/// Subset of the ratings payload the API exposes.
#[derive(Debug, Default, Deserialize)]
pub struct OmdbTitle {
    #[serde(rename = "Response")]
    pub response: Option<String>,
    #[serde(rename = "imdbRating")]
    pub imdb_rating: Option<String>,
    #[serde(rename = "imdbVotes")]
    pub imdb_votes: Option<String>,
    #[serde(rename = "Ratings", default)]
    pub ratings: Vec<OmdbRating>,
    #[serde(rename = "Rated")]
    pub rated: Option<String>,
    #[serde(rename = "Awards")]
    pub awards: Option<String>,
    #[serde(rename = "BoxOffice")]
    pub box_office: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OmdbRating {
    #[serde(rename = "Source", default)]
    pub source: String,
    #[serde(rename = "Value", default)]
    pub value: String,
}

fn found(payload: &Value) -> bool {
    payload.get("Response").and_then(Value::as_str) == Some("True")
}

#[derive(Debug, Clone)]
pub struct OmdbClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    cache: ResponseCache,
}

impl OmdbClient {
    pub fn new(api_key: Option<String>, base_url: Option<String>, cache: ResponseCache) -> Result<Self> {
        Ok(Self {
            client: http_client()?,
            api_key: api_key.filter(|k| !k.is_empty()),
            base_url: base_url.unwrap_or_else(|| OMDB_BASE.to_string()),
            cache,
        })
    }

    async fn get_json(&self, imdb_id: &str, api_key: &str) -> Result<Value> {
        let res = self
            .client
            .get(&self.base_url)
            .query(&[("i", imdb_id), ("apikey", api_key)])
            .send()
            .await
            .map_err(reqwest::Error::without_url)
            .context("request failed")?;

        let status = res.status();
        let text = res.text().await.context("reading body failed")?;
        if !status.is_success() {
            return Err(anyhow!("OMDb {} for {}: {}", status, imdb_id, text));
        }
        serde_json::from_str(&text).context("JSON parse failed")
    }
}

#[async_trait]
impl OmdbApi for OmdbClient {
    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn fetch_title(&self, imdb_id: &str) -> Option<Value> {
        let Some(api_key) = self.api_key.as_deref() else {
            warn!("OMDB_API_KEY not configured, skipping ratings for {}", imdb_id);
            return None;
        };

        let key = cache_key("omdb", "/", &Params::new().set("i", imdb_id));
        if let Some(cached) = self.cache.get_fresh(&key, DEFAULT_TTL) {
            return Some(cached);
        }

        match self.get_json(imdb_id, api_key).await {
            Ok(data) if found(&data) => {
                self.cache.set(key, data.clone());
                Some(data)
            }
            Ok(data) => {
                let reason = data.get("Error").and_then(|e| e.as_str()).unwrap_or("unknown");
                debug!(imdb_id, error = reason, "OMDb has no record");
                None
            }
            Err(e) => {
                error!("OMDb request failed: {:#}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn only_true_response_counts_as_found() {
        assert!(found(&json!({"Response": "True"})));
        assert!(!found(&json!({"Response": "False", "Error": "Incorrect IMDb ID."})));
        assert!(!found(&json!({})));
    }

    #[test]
    fn title_decodes_with_missing_fields() {
        let title: OmdbTitle = serde_json::from_value(json!({"Response": "True"})).unwrap();
        assert!(title.ratings.is_empty());
        assert_eq!(title.imdb_rating, None);
    }

    #[tokio::test]
    async fn unconfigured_client_skips_lookup() {
        let client = OmdbClient::new(None, None, ResponseCache::new()).unwrap();
        assert!(!client.is_configured());
        assert!(client.fetch_title("tt0137523").await.is_none());
    }
}
