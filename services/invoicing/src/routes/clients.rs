//! Client handlers

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    middleware::AuthUser,
    models::{ClientDetails, ClientQuery},
    repositories::Store,
    state::AppState,
    validation::{validate_email, validate_required},
};

fn validated(mut details: ClientDetails) -> ApiResult<ClientDetails> {
    details.name = details.name.trim().to_string();
    details.email = details.email.trim().to_lowercase();
    validate_required("name", &details.name).map_err(ApiError::BadRequest)?;
    validate_email(&details.email).map_err(ApiError::BadRequest)?;
    Ok(details)
}

pub async fn create<S: Store>(
    State(state): State<AppState<S>>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<ClientDetails>,
) -> ApiResult<impl IntoResponse> {
    let details = validated(payload)?;
    let client = state.services.clients.create(auth.id, &details).await?;
    Ok((StatusCode::CREATED, Json(client)))
}

pub async fn list<S: Store>(
    State(state): State<AppState<S>>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<ClientQuery>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.services.clients.list(auth.id, &query).await?))
}

pub async fn get<S: Store>(
    State(state): State<AppState<S>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.services.clients.get(id, auth.id).await?))
}

pub async fn update<S: Store>(
    State(state): State<AppState<S>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ClientDetails>,
) -> ApiResult<impl IntoResponse> {
    let details = validated(payload)?;
    Ok(Json(
        state.services.clients.update(id, auth.id, &details).await?,
    ))
}

pub async fn delete<S: Store>(
    State(state): State<AppState<S>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    state.services.clients.delete(id, auth.id).await?;
    Ok(Json(json!({ "message": "Client deleted" })))
}
