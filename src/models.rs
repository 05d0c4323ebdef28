use anyhow::anyhow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

pub const DEFAULT_AVATAR_COLOR: &str = "#6366f1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    Tv,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Tv => "tv",
        }
    }
}

impl FromStr for MediaType {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "movie" => Ok(MediaType::Movie),
            "tv" => Ok(MediaType::Tv),
            _ => Err(anyhow!("media type must be 'movie' or 'tv', got '{}'", s)),
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    #[default]
    PlanToWatch,
    Watching,
    Watched,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::PlanToWatch => "plan_to_watch",
            ItemStatus::Watching => "watching",
            ItemStatus::Watched => "watched",
        }
    }
}

impl FromStr for ItemStatus {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "plan_to_watch" => Ok(ItemStatus::PlanToWatch),
            "watching" => Ok(ItemStatus::Watching),
            "watched" => Ok(ItemStatus::Watched),
            _ => Err(anyhow!("unknown watchlist item status '{}'", s)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct User {
    pub id: String,
    pub name: String,
    pub avatar_color: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NewUser {
    pub name: String,
    #[serde(default = "default_avatar_color")]
    pub avatar_color: String,
}

fn default_avatar_color() -> String {
    DEFAULT_AVATAR_COLOR.to_string()
}

impl User {
    pub fn new(input: NewUser) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: input.name.trim().to_string(),
            avatar_color: input.avatar_color,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Watchlist {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub items: Vec<WatchlistItem>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NewWatchlist {
    pub user_id: String,
    pub name: String,
}

impl Watchlist {
    pub fn new(input: NewWatchlist) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: input.user_id,
            name: input.name.trim().to_string(),
            items: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// True when an item with the same catalog id and media type is already present.
    pub fn contains(&self, tmdb_id: i64, media_type: MediaType) -> bool {
        self.items
            .iter()
            .any(|i| i.tmdb_id == tmdb_id && i.media_type == media_type)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WatchlistItem {
    pub id: String,
    /// Catalog (TMDB) id of the movie or show.
    pub tmdb_id: i64,
    pub media_type: MediaType,
    pub title: String,
    pub poster_path: Option<String>,
    pub status: ItemStatus,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NewWatchlistItem {
    pub tmdb_id: i64,
    pub media_type: MediaType,
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub status: ItemStatus,
}

impl WatchlistItem {
    pub fn new(input: NewWatchlistItem) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            tmdb_id: input.tmdb_id,
            media_type: input.media_type,
            title: input.title,
            poster_path: input.poster_path,
            status: input.status,
            added_at: Utc::now(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ItemUpdate {
    #[serde(default)]
    pub status: Option<ItemStatus>,
}
