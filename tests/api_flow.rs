use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use cinevault::app::{build_router, AppState};
use cinevault::cache::Params;
use cinevault::omdb::OmdbApi;
use cinevault::store::MemoryStore;
use cinevault::tmdb::TmdbApi;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::util::ServiceExt;

#[derive(Default)]
struct FakeTmdb {
    configured: bool,
    responses: HashMap<String, Value>,
    calls: AtomicUsize,
    seen: Mutex<Vec<(String, Params)>>,
}

impl FakeTmdb {
    fn with(responses: &[(&str, Value)]) -> Self {
        Self {
            configured: true,
            responses: responses
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
            ..Default::default()
        }
    }
}

#[async_trait::async_trait]
impl TmdbApi for FakeTmdb {
    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn fetch(&self, endpoint: &str, params: &Params, _ttl: Duration) -> Option<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen
            .lock()
            .unwrap()
            .push((endpoint.to_string(), params.clone()));
        if !self.configured {
            return None;
        }
        self.responses.get(endpoint).cloned()
    }
}

#[derive(Default)]
struct FakeOmdb {
    titles: HashMap<String, Value>,
}

#[async_trait::async_trait]
impl OmdbApi for FakeOmdb {
    fn is_configured(&self) -> bool {
        !self.titles.is_empty()
    }

    async fn fetch_title(&self, imdb_id: &str) -> Option<Value> {
        self.titles.get(imdb_id).cloned()
    }
}

fn app_with(tmdb: Arc<FakeTmdb>, omdb: FakeOmdb) -> Router {
    build_router(AppState {
        store: Arc::new(MemoryStore::new()),
        tmdb: tmdb as Arc<dyn TmdbApi>,
        omdb: Arc::new(omdb),
        watch_region: "US".to_string(),
    })
}

fn app() -> Router {
    app_with(Arc::new(FakeTmdb::default()), FakeOmdb::default())
}

async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(v) => {
            req = req.header("content-type", "application/json");
            Body::from(v.to_string())
        }
        None => Body::empty(),
    };
    let res = app.clone().oneshot(req.body(body).unwrap()).await.unwrap();
    let status = res.status();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn create_user(app: &Router, name: &str) -> String {
    let (status, user) = call(app, "POST", "/api/users", Some(json!({"name": name}))).await;
    assert_eq!(status, StatusCode::OK);
    user["id"].as_str().unwrap().to_string()
}

async fn create_watchlist(app: &Router, user_id: &str) -> String {
    let (status, wl) = call(
        app,
        "POST",
        "/api/watchlists",
        Some(json!({"user_id": user_id, "name": "Weekend"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    wl["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn root_and_health_report_configuration() {
    let app = app();
    let (status, body) = call(&app, "GET", "/api", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "CineVault API");

    let (status, body) = call(&app, "GET", "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"status": "healthy", "tmdb_api": "not_configured", "omdb_api": "not_configured"})
    );
}

#[tokio::test]
async fn genres_fall_back_without_credentials() {
    let app = app();
    for uri in ["/api/catalog/genres", "/api/tmdb/genres?media_type=tv"] {
        let (status, body) = call(&app, "GET", uri, None).await;
        assert_eq!(status, StatusCode::OK);
        let genres = body["genres"].as_array().unwrap();
        assert_eq!(genres.len(), 19);
        assert_eq!(genres[0], json!({"id": 28, "name": "Action"}));
    }
}

#[tokio::test]
async fn lists_are_empty_envelopes_when_upstream_unavailable() {
    let app = app();
    for uri in [
        "/api/catalog/trending",
        "/api/catalog/movie/popular?page=3",
        "/api/catalog/tv/on-the-air",
        "/api/catalog/discover/movie?year=2020",
        "/api/catalog/search?query=alien",
    ] {
        let (status, body) = call(&app, "GET", uri, None).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert_eq!(
            body,
            json!({"results": [], "page": 1, "total_pages": 0, "total_results": 0}),
            "{uri}"
        );
    }
}

#[tokio::test]
async fn user_lifecycle_and_delete_cascade() {
    let app = app();
    let user_id = create_user(&app, "Ada").await;

    let (_, users) = call(&app, "GET", "/api/users", None).await;
    assert_eq!(users.as_array().unwrap().len(), 1);
    assert_eq!(users[0]["avatar_color"], "#6366f1");

    let wl_id = create_watchlist(&app, &user_id).await;
    let (status, second) = call(
        &app,
        "POST",
        "/api/watchlists",
        Some(json!({"user_id": user_id, "name": "Classics"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let second_id = second["id"].as_str().unwrap().to_string();
    let (status, _) = call(&app, "GET", &format!("/api/watchlists/{wl_id}"), None).await;
    assert_eq!(status, StatusCode::OK);

    let by_user = format!("/api/watchlists?user_id={user_id}");
    let (_, lists) = call(&app, "GET", &by_user, None).await;
    assert_eq!(lists.as_array().unwrap().len(), 2);

    let (status, body) = call(&app, "DELETE", &format!("/api/users/{user_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "User deleted");

    for id in [&wl_id, &second_id] {
        let (status, body) = call(&app, "GET", &format!("/api/watchlists/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], "Watchlist not found");
    }
    let (status, lists) = call(&app, "GET", &by_user, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(lists, json!([]));

    let (status, body) = call(&app, "GET", &format!("/api/users/{user_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "User not found");
}

#[tokio::test]
async fn watchlist_requires_existing_user_and_name() {
    let app = app();
    let (status, _) = call(
        &app,
        "POST",
        "/api/watchlists",
        Some(json!({"user_id": "nobody", "name": "Weekend"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let user_id = create_user(&app, "Ada").await;
    let (status, _) = call(
        &app,
        "POST",
        "/api/watchlists",
        Some(json!({"user_id": user_id, "name": "   "})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn duplicate_item_is_rejected() {
    let app = app();
    let user_id = create_user(&app, "Ada").await;
    let wl_id = create_watchlist(&app, &user_id).await;
    let uri = format!("/api/watchlists/{wl_id}/items");
    let item = json!({"tmdb_id": 550, "media_type": "movie", "title": "Fight Club"});

    let (status, added) = call(&app, "POST", &uri, Some(item.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(added["status"], "plan_to_watch");

    let (status, body) = call(&app, "POST", &uri, Some(item)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["detail"], "Item already in watchlist");

    let (status, _) = call(
        &app,
        "POST",
        &uri,
        Some(json!({"tmdb_id": 550, "media_type": "tv", "title": "Other"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, wl) = call(&app, "GET", &format!("/api/watchlists/{wl_id}"), None).await;
    assert_eq!(wl["items"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn item_status_update_rename_and_removal() {
    let app = app();
    let user_id = create_user(&app, "Ada").await;
    let wl_id = create_watchlist(&app, &user_id).await;
    let (_, item) = call(
        &app,
        "POST",
        &format!("/api/watchlists/{wl_id}/items"),
        Some(json!({"tmdb_id": 1399, "media_type": "tv", "title": "Game of Thrones"})),
    )
    .await;
    let item_uri = format!("/api/watchlists/{wl_id}/items/{}", item["id"].as_str().unwrap());

    let (status, body) = call(&app, "PUT", &item_uri, Some(json!({"status": "watching"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Item updated");

    let (status, body) = call(&app, "PUT", &format!("/api/watchlists/{wl_id}?name=Tonight"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Watchlist updated");

    let (_, wl) = call(&app, "GET", &format!("/api/watchlists?user_id={user_id}"), None).await;
    assert_eq!(wl[0]["name"], "Tonight");
    assert_eq!(wl[0]["items"][0]["status"], "watching");

    let (status, body) = call(&app, "DELETE", &item_uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Item removed");
    let (status, _) = call(&app, "DELETE", &item_uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = call(&app, "DELETE", &format!("/api/watchlists/{wl_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Watchlist deleted");
}

#[tokio::test]
async fn detail_is_not_found_when_upstream_absent() {
    let app = app();
    let (status, body) = call(&app, "GET", "/api/catalog/movie/550", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Movie not found");

    let (status, body) = call(&app, "GET", "/api/tmdb/tv/1399", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "TV show not found");
}

#[tokio::test]
async fn detail_is_normalized_with_appended_data() {
    let tmdb = Arc::new(FakeTmdb::with(&[(
        "/movie/550",
        json!({
            "id": 550,
            "title": "Fight Club",
            "poster_path": "/p.jpg",
            "runtime": 139,
            "external_ids": {"imdb_id": "tt0137523"},
            "videos": {"results": [{"key": "abc", "site": "YouTube", "type": "Trailer"}]},
            "watch/providers": {"results": {"US": {"rent": [{"provider_id": 2, "provider_name": "Apple TV", "logo_path": "/a.png"}]}}}
        }),
    )]));
    let app = app_with(tmdb.clone(), FakeOmdb::default());

    let (status, body) = call(&app, "GET", "/api/catalog/movie/550", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["media_type"], "movie");
    assert_eq!(body["poster_path"], "https://image.tmdb.org/t/p/w342/p.jpg");
    assert_eq!(body["trailer_url"], "https://www.youtube.com/embed/abc");
    assert_eq!(body["imdb_id"], "tt0137523");
    assert_eq!(body["streaming"]["rent"][0]["logo_path"], "/a.png");
    assert_eq!(body["streaming"]["flatrate"], json!([]));
    assert_eq!(body["cast"], json!([]));

    let seen = tmdb.seen.lock().unwrap();
    let (_, params) = seen.last().unwrap();
    assert_eq!(
        params.get("append_to_response"),
        Some("credits,videos,watch/providers,external_ids,recommendations")
    );
}

#[tokio::test]
async fn watch_providers_are_merged_without_duplicates() {
    let tmdb = Arc::new(FakeTmdb::with(&[
        (
            "/watch/providers/movie",
            json!({"results": [{"provider_id": 8, "provider_name": "Netflix", "logo_path": "/n.png"}]}),
        ),
        (
            "/watch/providers/tv",
            json!({"results": [
                {"provider_id": 8, "provider_name": "Netflix", "logo_path": "/n.png"},
                {"provider_id": 9, "provider_name": "Hulu", "logo_path": "/h.png"}
            ]}),
        ),
    ]));
    let app = app_with(tmdb.clone(), FakeOmdb::default());

    let (status, body) = call(&app, "GET", "/api/catalog/watch-providers?watch_region=GB", None).await;
    assert_eq!(status, StatusCode::OK);
    let providers = body["providers"].as_array().unwrap();
    let ids: Vec<_> = providers.iter().map(|p| p["provider_id"].as_i64().unwrap()).collect();
    assert_eq!(ids, vec![8, 9]);
    assert_eq!(providers[1]["logo_path"], "https://image.tmdb.org/t/p/w92/h.png");

    let seen = tmdb.seen.lock().unwrap();
    assert!(seen.iter().all(|(_, p)| p.get("watch_region") == Some("GB")));
    assert_eq!(tmdb.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn search_drops_people() {
    let tmdb = Arc::new(FakeTmdb::with(&[(
        "/search/multi",
        json!({
            "page": 1,
            "total_pages": 1,
            "total_results": 3,
            "results": [
                {"id": 1, "media_type": "movie", "title": "Alien"},
                {"id": 2, "media_type": "person", "name": "Sigourney Weaver"},
                {"id": 3, "media_type": "tv", "name": "Alien: Earth", "first_air_date": "2025-08-12"}
            ]
        }),
    )]));
    let app = app_with(tmdb, FakeOmdb::default());

    let (status, body) = call(&app, "GET", "/api/catalog/search?query=alien", None).await;
    assert_eq!(status, StatusCode::OK);
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[1]["title"], "Alien: Earth");
    assert_eq!(results[1]["release_date"], "2025-08-12");
    assert_eq!(body["total_results"], 3);
}

#[tokio::test]
async fn discover_forwards_mapped_parameters() {
    let tmdb = Arc::new(FakeTmdb::with(&[("/discover/tv", json!({"results": [{"id": 7, "name": "Show"}]}))]));
    let app = app_with(tmdb.clone(), FakeOmdb::default());

    let (status, body) = call(
        &app,
        "GET",
        "/api/catalog/discover/tv?year=2019&with_watch_providers=8&vote_average_gte=7",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"][0]["media_type"], "tv");

    let seen = tmdb.seen.lock().unwrap();
    let (endpoint, params) = seen.last().unwrap();
    assert_eq!(endpoint, "/discover/tv");
    assert_eq!(params.get("first_air_date_year"), Some("2019"));
    assert_eq!(params.get("watch_region"), Some("US"));
    assert_eq!(params.get("vote_average.gte"), Some("7"));
    assert_eq!(params.get("sort_by"), Some("popularity.desc"));

    let (status, _) = call(&app, "GET", "/api/catalog/discover/person", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn ratings_are_null_when_unavailable_and_parsed_otherwise() {
    let mut omdb = FakeOmdb::default();
    omdb.titles.insert(
        "tt0137523".to_string(),
        json!({
            "Response": "True",
            "imdbRating": "8.8",
            "imdbVotes": "2,000,000",
            "Ratings": [{"Source": "Rotten Tomatoes", "Value": "79%"}],
            "Rated": "R"
        }),
    );
    let app = app_with(Arc::new(FakeTmdb::default()), omdb);

    let (status, body) = call(&app, "GET", "/api/ratings/tt0000000", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"ratings": null}));

    let (status, body) = call(&app, "GET", "/api/omdb/tt0137523", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ratings"]["imdb"], json!({"value": "8.8", "votes": "2000000"}));
    assert_eq!(body["ratings"]["rotten_tomatoes"], json!({"value": "79%"}));
    assert_eq!(body["ratings"]["metacritic"], Value::Null);
    assert_eq!(body["rated"], "R");
    assert_eq!(body["box_office"], Value::Null);
}
