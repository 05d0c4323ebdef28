//! Fetch a movie or TV detail through the real catalog client and print the
//! normalized response, optionally with ratings.
//! Usage:
//!   cargo run --bin catalog_probe -- movie <tmdb_id>
//!   cargo run --bin catalog_probe -- tv <tmdb_id>
//! Requires TMDB_API_KEY in the environment (.env supported). When
//! OMDB_API_KEY is also set and the title has an IMDb id, ratings are printed.

use anyhow::{Context, Result};
use cinevault::cache::ResponseCache;
use cinevault::catalog;
use cinevault::config::Config;
use cinevault::models::MediaType;
use cinevault::omdb::OmdbClient;
use cinevault::tmdb::TmdbClient;
use dotenvy::dotenv;
use serde_json::json;
use std::env;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenv();
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: cargo run --bin catalog_probe -- movie <tmdb_id>");
        eprintln!("       cargo run --bin catalog_probe -- tv <tmdb_id>");
        std::process::exit(1);
    }

    let media_type: MediaType = args[1].to_lowercase().parse()?;
    let tmdb_id: i64 = args[2].parse().context("tmdb_id must be an integer")?;

    let config = Config::from_env()?;
    if config.tmdb_api_key.is_none() {
        anyhow::bail!("TMDB_API_KEY must be set");
    }

    let cache = ResponseCache::new();
    let tmdb = TmdbClient::new(config.tmdb_api_key, config.tmdb_base_url, cache.clone())?;
    let omdb = OmdbClient::new(config.omdb_api_key, config.omdb_base_url, cache)?;

    let detail = catalog::detail(&tmdb, media_type, tmdb_id, &config.watch_region)
        .await
        .with_context(|| format!("no {} found for id {}", media_type, tmdb_id))?;

    let ratings = match detail.imdb_id.as_deref() {
        Some(imdb_id) => catalog::ratings(&omdb, imdb_id).await,
        None => None,
    };

    let output = json!({
        "detail": detail,
        "ratings": ratings,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
