use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use crate::cache::Params;

mod client;
pub mod models;

pub(crate) use client::http_client;
pub use client::{retry_after, TmdbClient, TMDB_BASE};

/// Catalog API access. Every failure, including a missing API key, is
/// reported as `None` so callers can fall back to default responses.
#[async_trait]
pub trait TmdbApi: Send + Sync {
    fn is_configured(&self) -> bool;
    async fn fetch(&self, endpoint: &str, params: &Params, ttl: Duration) -> Option<Value>;
}
