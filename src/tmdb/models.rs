//! Upstream TMDB payload shapes.
//!
//! Every field is optional or defaulted: TMDB omits fields freely (and sends
//! `null` for some lists), and a sparse record must still normalize.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// Treats an explicit `null` like a missing field.
fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genre {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct GenreList {
    #[serde(default, deserialize_with = "null_default")]
    pub genres: Vec<Genre>,
}

/// A movie or TV record as it appears in list endpoints and at the top level
/// of detail responses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMediaItem {
    pub id: Option<i64>,
    pub media_type: Option<String>,
    pub title: Option<String>,
    pub name: Option<String>,
    pub original_title: Option<String>,
    pub original_name: Option<String>,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub release_date: Option<String>,
    pub first_air_date: Option<String>,
    pub vote_average: Option<f64>,
    pub vote_count: Option<i64>,
    pub popularity: Option<f64>,
    #[serde(default, deserialize_with = "null_default")]
    pub genre_ids: Vec<i64>,
    #[serde(default, deserialize_with = "null_default")]
    pub genres: Vec<Genre>,
}

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct RawPage<T> {
    pub page: Option<i64>,
    #[serde(default = "Vec::new", deserialize_with = "null_default_vec")]
    pub results: Vec<T>,
    pub total_pages: Option<i64>,
    pub total_results: Option<i64>,
}

impl<T> Default for RawPage<T> {
    fn default() -> Self {
        Self {
            page: None,
            results: Vec::new(),
            total_pages: None,
            total_results: None,
        }
    }
}

fn null_default_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// `movie/{id}` or `tv/{id}` with
/// `append_to_response=credits,videos,watch/providers,external_ids,recommendations`.
#[derive(Debug, Default, Deserialize)]
pub struct RawDetail {
    #[serde(flatten)]
    pub item: RawMediaItem,
    pub status: Option<String>,
    pub tagline: Option<String>,
    pub runtime: Option<i64>,
    pub budget: Option<i64>,
    pub revenue: Option<i64>,
    pub number_of_seasons: Option<i64>,
    pub number_of_episodes: Option<i64>,
    #[serde(default, deserialize_with = "null_default")]
    pub episode_run_time: Vec<i64>,
    #[serde(default, deserialize_with = "null_default")]
    pub networks: Vec<RawNetwork>,
    #[serde(default, deserialize_with = "null_default")]
    pub external_ids: RawExternalIds,
    #[serde(default, deserialize_with = "null_default")]
    pub credits: RawCredits,
    #[serde(default, deserialize_with = "null_default")]
    pub videos: RawVideos,
    #[serde(rename = "watch/providers", default, deserialize_with = "null_default")]
    pub watch_providers: RawWatchProviders,
    #[serde(default, deserialize_with = "null_default")]
    pub recommendations: RawPage<RawMediaItem>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawNetwork {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub name: String,
    pub logo_path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawExternalIds {
    pub imdb_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawCredits {
    #[serde(default, deserialize_with = "null_default")]
    pub cast: Vec<RawCastMember>,
    #[serde(default, deserialize_with = "null_default")]
    pub crew: Vec<RawCrewMember>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawCastMember {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub name: String,
    pub character: Option<String>,
    pub profile_path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawCrewMember {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub name: String,
    pub job: Option<String>,
    pub department: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawVideos {
    #[serde(default, deserialize_with = "null_default")]
    pub results: Vec<RawVideo>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawVideo {
    pub key: Option<String>,
    pub site: Option<String>,
    #[serde(rename = "type")]
    pub video_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawWatchProviders {
    #[serde(default, deserialize_with = "null_default")]
    pub results: HashMap<String, RawRegionProviders>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawRegionProviders {
    #[serde(default, deserialize_with = "null_default")]
    pub flatrate: Vec<WatchProvider>,
    #[serde(default, deserialize_with = "null_default")]
    pub rent: Vec<WatchProvider>,
    #[serde(default, deserialize_with = "null_default")]
    pub buy: Vec<WatchProvider>,
}

/// A streaming provider entry. Passed through unchanged in detail responses,
/// so `logo_path` stays relative to the image base.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchProvider {
    #[serde(default)]
    pub provider_id: i64,
    #[serde(default)]
    pub provider_name: String,
    #[serde(default)]
    pub logo_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_priority: Option<i64>,
}
