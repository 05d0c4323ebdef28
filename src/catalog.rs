//! Catalog and ratings aggregation: builds upstream queries, reads through the
//! response cache via the clients, and normalizes what comes back. Upstream
//! failures never surface as errors here; they become empty or default
//! responses.

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::time::Duration;
use tracing::warn;

use crate::app::AppState;
use crate::cache::{Params, CONFIG_TTL, DEFAULT_TTL};
use crate::error::{AppError, AppResult};
use crate::models::MediaType;
use crate::normalize::{
    build_media_detail, image_url, normalize_media_item, parse_ratings, upstream_media_type,
    ImageRole, MediaDetail, MediaItem, RatingsSummary,
};
use crate::omdb::{OmdbApi, OmdbTitle};
use crate::tmdb::models::{Genre, GenreList, RawDetail, RawMediaItem, RawPage, WatchProvider};
use crate::tmdb::TmdbApi;

const DETAIL_APPEND: &str = "credits,videos,watch/providers,external_ids,recommendations";
const DEFAULT_SORT: &str = "popularity.desc";

const FALLBACK_GENRES: [(i64, &str); 19] = [
    (28, "Action"),
    (12, "Adventure"),
    (16, "Animation"),
    (35, "Comedy"),
    (80, "Crime"),
    (99, "Documentary"),
    (18, "Drama"),
    (10751, "Family"),
    (14, "Fantasy"),
    (36, "History"),
    (27, "Horror"),
    (10402, "Music"),
    (9648, "Mystery"),
    (10749, "Romance"),
    (878, "Science Fiction"),
    (10770, "TV Movie"),
    (53, "Thriller"),
    (10752, "War"),
    (37, "Western"),
];

pub fn fallback_genres() -> Vec<Genre> {
    FALLBACK_GENRES
        .iter()
        .map(|(id, name)| Genre {
            id: *id,
            name: name.to_string(),
        })
        .collect()
}

/// Paged list envelope shared by every catalog list endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Paged {
    pub results: Vec<MediaItem>,
    pub page: i64,
    pub total_pages: i64,
    pub total_results: i64,
}

impl Paged {
    pub fn empty() -> Self {
        Self {
            results: Vec::new(),
            page: 1,
            total_pages: 0,
            total_results: 0,
        }
    }
}

fn decode<T: serde::de::DeserializeOwned>(what: &str, value: Value) -> Option<T> {
    match serde_json::from_value(value) {
        Ok(v) => Some(v),
        Err(e) => {
            warn!("Unexpected {} payload from TMDB: {}", what, e);
            None
        }
    }
}

/// Fetches a paged list. With a media type hint every result is normalized as
/// that type; without one, results that are neither movies nor TV are dropped.
pub async fn list(tmdb: &dyn TmdbApi, endpoint: &str, params: &Params, hint: Option<MediaType>) -> Paged {
    let Some(page) = tmdb
        .fetch(endpoint, params, DEFAULT_TTL)
        .await
        .and_then(|v| decode::<RawPage<RawMediaItem>>(endpoint, v))
    else {
        return Paged::empty();
    };

    let results = page
        .results
        .into_iter()
        .filter(|raw| hint.is_some() || upstream_media_type(raw).is_some())
        .map(|raw| normalize_media_item(raw, hint))
        .collect();

    Paged {
        results,
        page: page.page.unwrap_or(1),
        total_pages: page.total_pages.unwrap_or(0),
        total_results: page.total_results.unwrap_or(0),
    }
}

pub async fn genres(tmdb: &dyn TmdbApi, media_type: MediaType) -> Vec<Genre> {
    let endpoint = format!("/genre/{}/list", media_type);
    tmdb.fetch(&endpoint, &Params::new(), CONFIG_TTL)
        .await
        .and_then(|v| decode::<GenreList>(&endpoint, v))
        .map(|list| list.genres)
        .unwrap_or_else(fallback_genres)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendingScope {
    #[default]
    All,
    Movie,
    Tv,
}

impl TrendingScope {
    fn path(self) -> &'static str {
        match self {
            TrendingScope::All => "all",
            TrendingScope::Movie => "movie",
            TrendingScope::Tv => "tv",
        }
    }

    fn hint(self) -> Option<MediaType> {
        match self {
            TrendingScope::All => None,
            TrendingScope::Movie => Some(MediaType::Movie),
            TrendingScope::Tv => Some(MediaType::Tv),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeWindow {
    Day,
    #[default]
    Week,
}

impl TimeWindow {
    fn path(self) -> &'static str {
        match self {
            TimeWindow::Day => "day",
            TimeWindow::Week => "week",
        }
    }
}

pub async fn trending(tmdb: &dyn TmdbApi, scope: TrendingScope, window: TimeWindow, page: u32) -> Paged {
    let endpoint = format!("/trending/{}/{}", scope.path(), window.path());
    list(tmdb, &endpoint, &Params::new().set("page", page), scope.hint()).await
}

pub async fn search(tmdb: &dyn TmdbApi, query: &str, page: u32) -> Paged {
    let params = Params::new().set("query", query).set("page", page);
    list(tmdb, "/search/multi", &params, None).await
}

fn first_page() -> u32 {
    1
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DiscoverQuery {
    #[serde(default = "first_page")]
    pub page: u32,
    pub sort_by: Option<String>,
    pub with_genres: Option<String>,
    pub year: Option<i32>,
    #[serde(alias = "vote_average.gte")]
    pub vote_average_gte: Option<f64>,
    #[serde(alias = "vote_average.lte")]
    pub vote_average_lte: Option<f64>,
    pub with_watch_providers: Option<String>,
    pub with_original_language: Option<String>,
    pub watch_region: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

/// Upstream parameters for a discover query. `default_region` applies only
/// when a provider filter is present and the query names no region.
pub fn discover_params(media_type: MediaType, query: &DiscoverQuery, default_region: &str) -> Params {
    let providers = non_empty(&query.with_watch_providers);
    let region = providers.map(|_| non_empty(&query.watch_region).unwrap_or(default_region));
    let year_key = match media_type {
        MediaType::Movie => "primary_release_year",
        MediaType::Tv => "first_air_date_year",
    };

    Params::new()
        .set("page", query.page)
        .set("sort_by", non_empty(&query.sort_by).unwrap_or(DEFAULT_SORT))
        .set_opt("with_genres", non_empty(&query.with_genres))
        .set_opt("vote_average.gte", query.vote_average_gte)
        .set_opt("vote_average.lte", query.vote_average_lte)
        .set_opt("with_watch_providers", providers)
        .set_opt("watch_region", region)
        .set_opt("with_original_language", non_empty(&query.with_original_language))
        .set_opt(year_key, query.year.filter(|y| *y != 0))
}

pub async fn discover(tmdb: &dyn TmdbApi, media_type: MediaType, query: &DiscoverQuery, default_region: &str) -> Paged {
    let endpoint = format!("/discover/{}", media_type);
    let params = discover_params(media_type, query, default_region);
    list(tmdb, &endpoint, &params, Some(media_type)).await
}

/// Detail page for one title, or `None` when the upstream fetch itself failed.
pub async fn detail(tmdb: &dyn TmdbApi, media_type: MediaType, id: i64, region: &str) -> Option<MediaDetail> {
    let endpoint = format!("/{}/{}", media_type, id);
    let params = Params::new().set("append_to_response", DETAIL_APPEND);
    let raw = tmdb.fetch(&endpoint, &params, DEFAULT_TTL).await?;
    let raw: RawDetail = decode(&endpoint, raw)?;
    Some(build_media_detail(raw, media_type, region))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderSummary {
    pub provider_id: i64,
    pub provider_name: String,
    pub logo_path: Option<String>,
}

/// Concatenates movie then TV providers, keeping the first entry per id.
pub fn merge_providers(movie: Vec<WatchProvider>, tv: Vec<WatchProvider>) -> Vec<ProviderSummary> {
    let mut seen = HashSet::new();
    movie
        .into_iter()
        .chain(tv)
        .filter(|p| seen.insert(p.provider_id))
        .map(|p| ProviderSummary {
            logo_path: image_url(p.logo_path.as_deref(), ImageRole::Logo),
            provider_id: p.provider_id,
            provider_name: p.provider_name,
        })
        .collect()
}

async fn provider_list(tmdb: &dyn TmdbApi, endpoint: &str, params: &Params, ttl: Duration) -> Vec<WatchProvider> {
    tmdb.fetch(endpoint, params, ttl)
        .await
        .and_then(|v| decode::<RawPage<WatchProvider>>(endpoint, v))
        .map(|page| page.results)
        .unwrap_or_default()
}

pub async fn watch_providers(tmdb: &dyn TmdbApi, region: &str) -> Vec<ProviderSummary> {
    let params = Params::new().set("watch_region", region);
    let (movie, tv) = tokio::join!(
        provider_list(tmdb, "/watch/providers/movie", &params, CONFIG_TTL),
        provider_list(tmdb, "/watch/providers/tv", &params, CONFIG_TTL),
    );
    merge_providers(movie, tv)
}

/// Ratings for an IMDb id, or `None` when the ratings service has nothing.
pub async fn ratings(omdb: &dyn OmdbApi, imdb_id: &str) -> Option<RatingsSummary> {
    let raw = omdb.fetch_title(imdb_id).await?;
    match serde_json::from_value::<OmdbTitle>(raw) {
        Ok(title) => Some(parse_ratings(title)),
        Err(e) => {
            warn!("Unexpected OMDb payload for {}: {}", imdb_id, e);
            None
        }
    }
}

// HTTP handlers

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default = "first_page")]
    pub page: u32,
}

#[derive(Debug, Deserialize)]
pub struct GenreQuery {
    #[serde(default = "default_genre_type")]
    pub media_type: MediaType,
}

fn default_genre_type() -> MediaType {
    MediaType::Movie
}

#[derive(Debug, Deserialize)]
pub struct TrendingQuery {
    #[serde(default)]
    pub media_type: TrendingScope,
    #[serde(default)]
    pub time_window: TimeWindow,
    #[serde(default = "first_page")]
    pub page: u32,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub query: String,
    #[serde(default = "first_page")]
    pub page: u32,
}

#[derive(Debug, Deserialize)]
pub struct RegionQuery {
    pub watch_region: Option<String>,
}

async fn get_genres(State(state): State<AppState>, Query(q): Query<GenreQuery>) -> Json<Value> {
    Json(json!({ "genres": genres(state.tmdb.as_ref(), q.media_type).await }))
}

async fn get_trending(State(state): State<AppState>, Query(q): Query<TrendingQuery>) -> Json<Paged> {
    Json(trending(state.tmdb.as_ref(), q.media_type, q.time_window, q.page).await)
}

async fn get_search(State(state): State<AppState>, Query(q): Query<SearchQuery>) -> AppResult<Json<Paged>> {
    let query = q.query.trim();
    if query.is_empty() {
        return Err(AppError::bad_request("query must not be empty"));
    }
    Ok(Json(search(state.tmdb.as_ref(), query, q.page).await))
}

async fn get_discover(
    State(state): State<AppState>,
    Path(media_type): Path<String>,
    Query(q): Query<DiscoverQuery>,
) -> AppResult<Json<Paged>> {
    let media_type: MediaType = media_type
        .parse()
        .map_err(|e: anyhow::Error| AppError::bad_request(e.to_string()))?;
    Ok(Json(discover(state.tmdb.as_ref(), media_type, &q, &state.watch_region).await))
}

async fn get_movie(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<Json<MediaDetail>> {
    detail(state.tmdb.as_ref(), MediaType::Movie, id, &state.watch_region)
        .await
        .map(Json)
        .ok_or_else(|| AppError::not_found("Movie not found"))
}

async fn get_tv(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<Json<MediaDetail>> {
    detail(state.tmdb.as_ref(), MediaType::Tv, id, &state.watch_region)
        .await
        .map(Json)
        .ok_or_else(|| AppError::not_found("TV show not found"))
}

async fn get_watch_providers(State(state): State<AppState>, Query(q): Query<RegionQuery>) -> Json<Value> {
    let region = non_empty(&q.watch_region).unwrap_or(state.watch_region.as_str());
    Json(json!({ "providers": watch_providers(state.tmdb.as_ref(), region).await }))
}

pub async fn get_ratings(State(state): State<AppState>, Path(imdb_id): Path<String>) -> Json<Value> {
    match ratings(state.omdb.as_ref(), &imdb_id).await {
        Some(summary) => Json(json!(summary)),
        None => Json(json!({ "ratings": null })),
    }
}

/// Route for one of the fixed upstream lists (popular, top rated, ...).
fn fixed_list(endpoint: &'static str, media_type: MediaType) -> axum::routing::MethodRouter<AppState> {
    get(move |State(state): State<AppState>, Query(q): Query<PageQuery>| async move {
        let params = Params::new().set("page", q.page);
        Json(list(state.tmdb.as_ref(), endpoint, &params, Some(media_type)).await)
    })
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/genres", get(get_genres))
        .route("/trending", get(get_trending))
        .route("/search", get(get_search))
        .route("/watch-providers", get(get_watch_providers))
        .route("/discover/:media_type", get(get_discover))
        .route("/movie/now-playing", fixed_list("/movie/now_playing", MediaType::Movie))
        .route("/movie/upcoming", fixed_list("/movie/upcoming", MediaType::Movie))
        .route("/movie/popular", fixed_list("/movie/popular", MediaType::Movie))
        .route("/movie/top-rated", fixed_list("/movie/top_rated", MediaType::Movie))
        .route("/movie/:id", get(get_movie))
        .route("/tv/popular", fixed_list("/tv/popular", MediaType::Tv))
        .route("/tv/top-rated", fixed_list("/tv/top_rated", MediaType::Tv))
        .route("/tv/on-the-air", fixed_list("/tv/on_the_air", MediaType::Tv))
        .route("/tv/:id", get(get_tv))
}
