use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::{error, warn};

use super::TmdbApi;
use crate::cache::{cache_key, Params, ResponseCache};

pub const TMDB_BASE: &str = "https://api.themoviedb.org/3";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(2);
const MAX_RETRY_AFTER: Duration = REQUEST_TIMEOUT;

#[derive(Debug, Clone)]
pub struct TmdbClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    cache: ResponseCache,
}

impl TmdbClient {
    pub fn new(api_key: Option<String>, base_url: Option<String>, cache: ResponseCache) -> Result<Self> {
        Ok(Self {
            client: http_client()?,
            api_key: api_key.filter(|k| !k.is_empty()),
            base_url: base_url
                .unwrap_or_else(|| TMDB_BASE.to_string())
                .trim_end_matches('/')
                .to_string(),
            cache,
        })
    }

    async fn get_json(&self, url: &str, api_key: &str, params: &Params) -> Result<Value> {
        let mut res = self.send(url, api_key, params).await?;
        if res.status() == StatusCode::TOO_MANY_REQUESTS {
            let wait = retry_after(res.headers());
            warn!("TMDB rate limited on {}, retrying once in {}s", url, wait.as_secs());
            tokio::time::sleep(wait).await;
            res = self.send(url, api_key, params).await?;
        }

        let status = res.status();
        let text = res.text().await.context("reading body failed")?;
        if !status.is_success() {
            return Err(anyhow!("{} -> {}: {}", url, status, text));
        }
        serde_json::from_str(&text).context("JSON parse failed")
    }

    async fn send(&self, url: &str, api_key: &str, params: &Params) -> Result<Response> {
        self.client
            .get(url)
            .query(&[("api_key", api_key)])
            .query(&params.pairs())
            .send()
            .await
            .map_err(reqwest::Error::without_url)
            .context("request failed")
    }
}

#[async_trait]
impl TmdbApi for TmdbClient {
    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn fetch(&self, endpoint: &str, params: &Params, ttl: Duration) -> Option<Value> {
        let Some(api_key) = self.api_key.as_deref() else {
            warn!("TMDB_API_KEY not configured, skipping {}", endpoint);
            return None;
        };

        let key = cache_key("tmdb", endpoint, params);
        if let Some(cached) = self.cache.get_fresh(&key, ttl) {
            return Some(cached);
        }

        let url = format!("{}{}", self.base_url, endpoint);
        match self.get_json(&url, api_key, params).await {
            Ok(data) => {
                self.cache.set(key, data.clone());
                Some(data)
            }
            Err(e) => {
                error!("TMDB request failed: {:#}", e);
                None
            }
        }
    }
}

pub(crate) fn http_client() -> Result<Client> {
    let user_agent = format!("cinevault/{}", env!("CARGO_PKG_VERSION"));
    Client::builder()
        .connect_timeout(Duration::from_secs(5))
        .timeout(REQUEST_TIMEOUT)
        .user_agent(user_agent)
        .build()
        .context("Failed to build HTTP client")
}

/// Delay requested by a 429 response, in whole seconds and capped at the
/// request timeout; 2s when the header is absent or not a number.
pub fn retry_after(headers: &HeaderMap) -> Duration {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(|secs| Duration::from_secs(secs).min(MAX_RETRY_AFTER))
        .unwrap_or(DEFAULT_RETRY_AFTER)
}
