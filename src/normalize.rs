//! Maps upstream catalog and ratings payloads onto the canonical shapes the
//! API serves. Everything here is pure; absent or empty upstream fields come
//! out as `None`.

use serde::Serialize;

use crate::models::MediaType;
use crate::omdb::OmdbTitle;
use crate::tmdb::models::{
    Genre, RawCastMember, RawCrewMember, RawDetail, RawMediaItem, RawNetwork, RawVideos,
    WatchProvider,
};

pub const IMAGE_BASE: &str = "https://image.tmdb.org/t/p/";
const YOUTUBE_EMBED: &str = "https://www.youtube.com/embed/";
const MAX_CAST: usize = 10;
const MAX_RECOMMENDATIONS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageRole {
    Poster,
    Backdrop,
    Profile,
    Logo,
}

impl ImageRole {
    fn size(self) -> &'static str {
        match self {
            ImageRole::Poster => "w342",
            ImageRole::Backdrop => "w1280",
            ImageRole::Profile => "w185",
            ImageRole::Logo => "w92",
        }
    }
}

pub fn image_url(path: Option<&str>, role: ImageRole) -> Option<String> {
    path.filter(|p| !p.is_empty())
        .map(|p| format!("{IMAGE_BASE}{}{p}", role.size()))
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

/// Canonical movie/TV record. Image fields carry full URLs but keep the
/// `*_path` wire names the web client reads.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaItem {
    pub id: Option<i64>,
    pub media_type: MediaType,
    pub title: Option<String>,
    pub original_title: Option<String>,
    pub overview: Option<String>,
    #[serde(rename = "poster_path")]
    pub poster_url: Option<String>,
    #[serde(rename = "backdrop_path")]
    pub backdrop_url: Option<String>,
    pub release_date: Option<String>,
    pub vote_average: Option<f64>,
    pub vote_count: Option<i64>,
    pub popularity: Option<f64>,
    pub genre_ids: Vec<i64>,
    pub genres: Vec<Genre>,
}

/// Media type named by the upstream record, when it is one we serve.
pub fn upstream_media_type(raw: &RawMediaItem) -> Option<MediaType> {
    raw.media_type.as_deref().and_then(|s| s.parse().ok())
}

pub fn normalize_media_item(raw: RawMediaItem, hint: Option<MediaType>) -> MediaItem {
    let media_type = hint
        .or_else(|| upstream_media_type(&raw))
        .unwrap_or(MediaType::Movie);
    MediaItem {
        id: raw.id,
        media_type,
        poster_url: image_url(raw.poster_path.as_deref(), ImageRole::Poster),
        backdrop_url: image_url(raw.backdrop_path.as_deref(), ImageRole::Backdrop),
        title: present(raw.title).or(present(raw.name)),
        original_title: present(raw.original_title).or(present(raw.original_name)),
        overview: raw.overview,
        release_date: present(raw.release_date).or(present(raw.first_air_date)),
        vote_average: raw.vote_average,
        vote_count: raw.vote_count,
        popularity: raw.popularity,
        genre_ids: raw.genre_ids,
        genres: raw.genres,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CastMember {
    pub id: i64,
    pub name: String,
    pub character: Option<String>,
    pub profile_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrewMember {
    pub id: i64,
    pub name: String,
    pub job: Option<String>,
    pub department: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Network {
    pub id: i64,
    pub name: String,
    pub logo_path: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StreamingProviders {
    pub flatrate: Vec<WatchProvider>,
    pub rent: Vec<WatchProvider>,
    pub buy: Vec<WatchProvider>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovieFacts {
    pub runtime: Option<i64>,
    pub budget: Option<i64>,
    pub revenue: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TvFacts {
    pub number_of_seasons: Option<i64>,
    pub number_of_episodes: Option<i64>,
    pub episode_run_time: Vec<i64>,
    pub networks: Vec<Network>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DetailFacts {
    Movie(MovieFacts),
    Tv(TvFacts),
}

/// A detail page: the canonical item plus type-specific facts and derived
/// fields, flattened into one object on the wire.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaDetail {
    #[serde(flatten)]
    pub item: MediaItem,
    #[serde(flatten)]
    pub facts: DetailFacts,
    pub status: Option<String>,
    pub tagline: Option<String>,
    pub imdb_id: Option<String>,
    pub cast: Vec<CastMember>,
    pub crew: Vec<CrewMember>,
    pub trailer_url: Option<String>,
    pub streaming: StreamingProviders,
    pub recommendations: Vec<MediaItem>,
}

fn crew_jobs(media_type: MediaType) -> &'static [&'static str] {
    match media_type {
        MediaType::Movie => &["Director", "Writer", "Screenplay"],
        MediaType::Tv => &["Executive Producer", "Creator"],
    }
}

/// First YouTube trailer in upstream order, as an embeddable URL.
pub fn select_trailer(videos: &RawVideos) -> Option<String> {
    videos
        .results
        .iter()
        .find(|v| v.video_type.as_deref() == Some("Trailer") && v.site.as_deref() == Some("YouTube"))
        .and_then(|v| v.key.as_deref())
        .map(|key| format!("{YOUTUBE_EMBED}{key}"))
}

fn top_cast(cast: Vec<RawCastMember>) -> Vec<CastMember> {
    cast.into_iter()
        .take(MAX_CAST)
        .map(|c| CastMember {
            profile_path: image_url(c.profile_path.as_deref(), ImageRole::Profile),
            id: c.id,
            name: c.name,
            character: c.character,
        })
        .collect()
}

fn key_crew(crew: Vec<RawCrewMember>, media_type: MediaType) -> Vec<CrewMember> {
    let jobs = crew_jobs(media_type);
    crew.into_iter()
        .filter(|c| c.job.as_deref().is_some_and(|job| jobs.contains(&job)))
        .map(|c| CrewMember {
            id: c.id,
            name: c.name,
            job: c.job,
            department: c.department,
        })
        .collect()
}

fn networks(list: Vec<RawNetwork>) -> Vec<Network> {
    list.into_iter()
        .map(|n| Network {
            logo_path: image_url(n.logo_path.as_deref(), ImageRole::Logo),
            id: n.id,
            name: n.name,
        })
        .collect()
}

pub fn build_media_detail(raw: RawDetail, media_type: MediaType, region: &str) -> MediaDetail {
    let RawDetail {
        item,
        status,
        tagline,
        runtime,
        budget,
        revenue,
        number_of_seasons,
        number_of_episodes,
        episode_run_time,
        networks: raw_networks,
        external_ids,
        credits,
        videos,
        mut watch_providers,
        recommendations,
    } = raw;

    let facts = match media_type {
        MediaType::Movie => DetailFacts::Movie(MovieFacts {
            runtime,
            budget,
            revenue,
        }),
        MediaType::Tv => DetailFacts::Tv(TvFacts {
            number_of_seasons,
            number_of_episodes,
            episode_run_time,
            networks: networks(raw_networks),
        }),
    };

    let streaming = watch_providers
        .results
        .remove(region)
        .map(|p| StreamingProviders {
            flatrate: p.flatrate,
            rent: p.rent,
            buy: p.buy,
        })
        .unwrap_or_default();

    MediaDetail {
        item: normalize_media_item(item, Some(media_type)),
        facts,
        status,
        tagline,
        imdb_id: present(external_ids.imdb_id),
        trailer_url: select_trailer(&videos),
        cast: top_cast(credits.cast),
        crew: key_crew(credits.crew, media_type),
        streaming,
        recommendations: recommendations
            .results
            .into_iter()
            .take(MAX_RECOMMENDATIONS)
            .map(|r| normalize_media_item(r, Some(media_type)))
            .collect(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImdbRating {
    pub value: String,
    pub votes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreValue {
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SourceRatings {
    pub imdb: Option<ImdbRating>,
    pub rotten_tomatoes: Option<ScoreValue>,
    pub metacritic: Option<ScoreValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingsSummary {
    pub ratings: SourceRatings,
    pub rated: Option<String>,
    pub awards: Option<String>,
    pub box_office: Option<String>,
}

/// Collapses the ratings payload. When a source appears more than once, the
/// last entry wins.
pub fn parse_ratings(raw: OmdbTitle) -> RatingsSummary {
    let mut ratings = SourceRatings::default();

    if let Some(value) = raw.imdb_rating.filter(|r| !r.is_empty() && r != "N/A") {
        ratings.imdb = Some(ImdbRating {
            value,
            votes: raw.imdb_votes.unwrap_or_default().replace(',', ""),
        });
    }

    for rating in raw.ratings {
        if rating.source.contains("Rotten Tomatoes") {
            ratings.rotten_tomatoes = Some(ScoreValue { value: rating.value });
        } else if rating.source.contains("Metacritic") {
            ratings.metacritic = Some(ScoreValue { value: rating.value });
        }
    }

    RatingsSummary {
        ratings,
        rated: raw.rated,
        awards: raw.awards,
        box_office: raw.box_office,
    }
}
