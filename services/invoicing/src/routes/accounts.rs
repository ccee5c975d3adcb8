//! Authentication and account handlers

use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;

use crate::{
    error::{ApiError, ApiResult},
    jwt::{TokenPair, TokenType},
    middleware::AuthUser,
    models::{BankingDetails, UpdateProfile, User},
    repositories::Store,
    services::Registration,
    state::AppState,
    validation::{validate_account_number, validate_email, validate_password, validate_required},
};

#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone: String,
    #[serde(flatten)]
    pub banking: BankingDetails,
}

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

/// User with a fresh token pair
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: User,
    #[serde(flatten)]
    pub tokens: TokenPair,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn check_banking(banking: &BankingDetails) -> ApiResult<()> {
    validate_account_number(&banking.bank_account_number).map_err(ApiError::BadRequest)
}

/// Register a new account, or bring back a deactivated one
pub async fn sign_up<S: Store>(
    State(state): State<AppState<S>>,
    Json(payload): Json<SignUpRequest>,
) -> ApiResult<impl IntoResponse> {
    let email = normalize_email(&payload.email);
    validate_required("name", &payload.name).map_err(ApiError::BadRequest)?;
    validate_email(&email).map_err(ApiError::BadRequest)?;
    validate_password(&payload.password).map_err(ApiError::BadRequest)?;
    check_banking(&payload.banking)?;

    let registration = Registration {
        name: payload.name.trim().to_string(),
        password: payload.password,
        address: payload.address,
        phone: payload.phone,
        banking: payload.banking,
    };
    let user = state.services.accounts.sign_up(&email, &registration).await?;
    let tokens = state.jwt_service.issue_pair(user.id)?;

    Ok((StatusCode::CREATED, Json(AuthResponse { user, tokens })))
}

pub async fn sign_in<S: Store>(
    State(state): State<AppState<S>>,
    Json(payload): Json<SignInRequest>,
) -> ApiResult<impl IntoResponse> {
    let email = normalize_email(&payload.email);
    let user = state
        .services
        .accounts
        .sign_in(&email, &payload.password)
        .await?;
    let tokens = state.jwt_service.issue_pair(user.id)?;

    Ok(Json(AuthResponse { user, tokens }))
}

/// Trade a refresh token of an active account for a new pair
pub async fn refresh_token<S: Store>(
    State(state): State<AppState<S>>,
    Json(payload): Json<RefreshRequest>,
) -> ApiResult<impl IntoResponse> {
    let claims = state
        .jwt_service
        .validate_token(&payload.refresh_token)
        .map_err(|e| {
            warn!("Failed to validate refresh token: {}", e);
            ApiError::Unauthorized
        })?;

    if claims.token_type != TokenType::Refresh {
        warn!("Access token used as refresh token");
        return Err(ApiError::Unauthorized);
    }

    state.services.accounts.me(claims.sub).await.map_err(|e| {
        warn!(user_id = %claims.sub, "Refresh rejected: {}", e);
        ApiError::Unauthorized
    })?;

    Ok(Json(state.jwt_service.issue_pair(claims.sub)?))
}

pub async fn me<S: Store>(
    State(state): State<AppState<S>>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.services.accounts.me(auth.id).await?))
}

pub async fn update_profile<S: Store>(
    State(state): State<AppState<S>>,
    Extension(auth): Extension<AuthUser>,
    Json(mut payload): Json<UpdateProfile>,
) -> ApiResult<impl IntoResponse> {
    payload.email = normalize_email(&payload.email);
    payload.name = payload.name.trim().to_string();
    validate_required("name", &payload.name).map_err(ApiError::BadRequest)?;
    validate_email(&payload.email).map_err(ApiError::BadRequest)?;

    let user = state
        .services
        .accounts
        .update_profile(auth.id, &payload)
        .await?;
    Ok(Json(user))
}

pub async fn update_banking<S: Store>(
    State(state): State<AppState<S>>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<BankingDetails>,
) -> ApiResult<impl IntoResponse> {
    check_banking(&payload)?;

    let user = state
        .services
        .accounts
        .update_banking(auth.id, &payload)
        .await?;
    Ok(Json(user))
}

pub async fn change_password<S: Store>(
    State(state): State<AppState<S>>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<ChangePasswordRequest>,
) -> ApiResult<impl IntoResponse> {
    validate_password(&payload.new_password).map_err(ApiError::BadRequest)?;

    state
        .services
        .accounts
        .change_password(auth.id, &payload.old_password, &payload.new_password)
        .await?;
    Ok(Json(json!({ "message": "Password changed" })))
}

/// Deactivate the caller's account; issued tokens stop working for refresh
pub async fn deactivate<S: Store>(
    State(state): State<AppState<S>>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    state.services.accounts.deactivate(auth.id).await?;
    Ok(Json(json!({ "message": "Account deactivated" })))
}
