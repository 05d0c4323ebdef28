use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tracing::info;

use crate::app::AppState;
use crate::error::{AppError, AppResult};
use crate::models::{NewUser, User};

async fn list_users(State(state): State<AppState>) -> AppResult<Json<Vec<User>>> {
    Ok(Json(state.store.list_users().await?))
}

async fn create_user(State(state): State<AppState>, Json(input): Json<NewUser>) -> AppResult<Json<User>> {
    if input.name.trim().is_empty() {
        return Err(AppError::bad_request("name must not be empty"));
    }
    let user = state.store.create_user(input).await?;
    info!("Created user {} ({})", user.name, user.id);
    Ok(Json(user))
}

async fn get_user(State(state): State<AppState>, Path(id): Path<String>) -> AppResult<Json<User>> {
    state
        .store
        .get_user(&id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("User not found"))
}

async fn delete_user(State(state): State<AppState>, Path(id): Path<String>) -> AppResult<Json<Value>> {
    if !state.store.delete_user(&id).await? {
        return Err(AppError::not_found("User not found"));
    }
    info!("Deleted user {} and their watchlists", id);
    Ok(Json(json!({ "message": "User deleted" })))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/:id", get(get_user).delete(delete_user))
}
