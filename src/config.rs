use anyhow::{Context, Result};
use std::env;
use std::net::SocketAddr;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8001";
pub const DEFAULT_WATCH_REGION: &str = "US";

/// Allowed CORS origins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsOrigins {
    Any,
    List(Vec<String>),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: Option<String>,
    pub db_name: Option<String>,
    pub tmdb_api_key: Option<String>,
    pub omdb_api_key: Option<String>,
    pub tmdb_base_url: Option<String>,
    pub omdb_base_url: Option<String>,
    pub cors_origins: CorsOrigins,
    pub bind_addr: SocketAddr,
    pub watch_region: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let bind_raw = get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr: SocketAddr = bind_raw
            .parse()
            .with_context(|| format!("BIND_ADDR is not a socket address: {}", bind_raw))?;

        Ok(Self {
            database_url: get("DATABASE_URL"),
            db_name: get("DB_NAME"),
            tmdb_api_key: get("TMDB_API_KEY"),
            omdb_api_key: get("OMDB_API_KEY"),
            tmdb_base_url: get("TMDB_BASE_URL"),
            omdb_base_url: get("OMDB_BASE_URL"),
            cors_origins: parse_origins(get("CORS_ORIGINS").as_deref().unwrap_or("*")),
            bind_addr,
            watch_region: get("WATCH_REGION")
                .map(|r| r.to_uppercase())
                .unwrap_or_else(|| DEFAULT_WATCH_REGION.to_string()),
        })
    }
}

fn parse_origins(raw: &str) -> CorsOrigins {
    let origins: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect();
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        CorsOrigins::Any
    } else {
        CorsOrigins::List(origins)
    }
}
