use axum::{
    extract::{Path, Query, State},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::app::AppState;
use crate::error::{AppError, AppResult};
use crate::models::{ItemUpdate, NewWatchlist, NewWatchlistItem, Watchlist, WatchlistItem};
use crate::store::AddItem;

#[derive(Debug, Deserialize)]
pub struct OwnerQuery {
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct RenameQuery {
    pub name: String,
}

async fn list_watchlists(State(state): State<AppState>, Query(q): Query<OwnerQuery>) -> AppResult<Json<Vec<Watchlist>>> {
    Ok(Json(state.store.list_watchlists(&q.user_id).await?))
}

async fn create_watchlist(State(state): State<AppState>, Json(input): Json<NewWatchlist>) -> AppResult<Json<Watchlist>> {
    if input.name.trim().is_empty() {
        return Err(AppError::bad_request("name must not be empty"));
    }
    if state.store.get_user(&input.user_id).await?.is_none() {
        return Err(AppError::not_found("User not found"));
    }
    let watchlist = state.store.create_watchlist(input).await?;
    info!("Created watchlist '{}' for user {}", watchlist.name, watchlist.user_id);
    Ok(Json(watchlist))
}

async fn get_watchlist(State(state): State<AppState>, Path(id): Path<String>) -> AppResult<Json<Watchlist>> {
    state
        .store
        .get_watchlist(&id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Watchlist not found"))
}

async fn rename_watchlist(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(q): Query<RenameQuery>,
) -> AppResult<Json<Value>> {
    let name = q.name.trim();
    if name.is_empty() {
        return Err(AppError::bad_request("name must not be empty"));
    }
    if !state.store.rename_watchlist(&id, name).await? {
        return Err(AppError::not_found("Watchlist not found"));
    }
    Ok(Json(json!({ "message": "Watchlist updated" })))
}

async fn delete_watchlist(State(state): State<AppState>, Path(id): Path<String>) -> AppResult<Json<Value>> {
    if !state.store.delete_watchlist(&id).await? {
        return Err(AppError::not_found("Watchlist not found"));
    }
    Ok(Json(json!({ "message": "Watchlist deleted" })))
}

async fn add_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<NewWatchlistItem>,
) -> AppResult<Json<WatchlistItem>> {
    match state.store.add_item(&id, input).await? {
        AddItem::Added(item) => {
            info!("Added {} {} to watchlist {}", item.media_type, item.tmdb_id, id);
            Ok(Json(item))
        }
        AddItem::Duplicate => Err(AppError::Conflict("Item already in watchlist".to_string())),
        AddItem::WatchlistMissing => Err(AppError::not_found("Watchlist not found")),
    }
}

async fn update_item(
    State(state): State<AppState>,
    Path((id, item_id)): Path<(String, String)>,
    Json(update): Json<ItemUpdate>,
) -> AppResult<Json<Value>> {
    let Some(status) = update.status else {
        return Err(AppError::bad_request("status is required"));
    };
    if !state.store.update_item_status(&id, &item_id, status).await? {
        return Err(AppError::not_found("Item not found"));
    }
    Ok(Json(json!({ "message": "Item updated" })))
}

async fn remove_item(
    State(state): State<AppState>,
    Path((id, item_id)): Path<(String, String)>,
) -> AppResult<Json<Value>> {
    if !state.store.remove_item(&id, &item_id).await? {
        return Err(AppError::not_found("Item not found"));
    }
    Ok(Json(json!({ "message": "Item removed" })))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_watchlists).post(create_watchlist))
        .route(
            "/:id",
            get(get_watchlist).put(rename_watchlist).delete(delete_watchlist),
        )
        .route("/:id/items", post(add_item))
        .route("/:id/items/:item_id", put(update_item).delete(remove_item))
}
