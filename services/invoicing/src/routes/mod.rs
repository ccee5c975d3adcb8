//! HTTP routes of the invoicing service

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, patch, post, put},
};
use serde_json::json;

use crate::{middleware::auth_middleware, repositories::Store, state::AppState};

mod accounts;
mod clients;
mod invoices;

/// Create the router for the invoicing service
pub fn create_router<S: Store>(state: AppState<S>) -> Router {
    let public_routes = Router::new()
        .route("/auth/sign-up", post(accounts::sign_up::<S>))
        .route("/auth/sign-in", post(accounts::sign_in::<S>))
        .route("/auth/refresh-token", post(accounts::refresh_token::<S>))
        .route("/invoices/preview", post(invoices::preview));

    let protected_routes = Router::new()
        .route("/me", get(accounts::me::<S>))
        .route("/me/profile", put(accounts::update_profile::<S>))
        .route("/me/banking", put(accounts::update_banking::<S>))
        .route("/me/change-password", post(accounts::change_password::<S>))
        .route("/me/deactivate", post(accounts::deactivate::<S>))
        .route(
            "/clients",
            post(clients::create::<S>).get(clients::list::<S>),
        )
        .route(
            "/clients/:id",
            get(clients::get::<S>)
                .put(clients::update::<S>)
                .delete(clients::delete::<S>),
        )
        .route("/invoices/summary", get(invoices::summary::<S>))
        .route(
            "/invoices",
            post(invoices::create::<S>).get(invoices::list::<S>),
        )
        .route(
            "/invoices/:id",
            get(invoices::get::<S>)
                .put(invoices::update::<S>)
                .delete(invoices::delete::<S>),
        )
        .route("/invoices/:id/status", patch(invoices::update_status::<S>))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware::<S>,
        ));

    Router::new()
        .route("/health", get(health_check::<S>))
        .nest("/v1/public", public_routes)
        .nest("/v1/protected", protected_routes)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check<S: Store>(State(state): State<AppState<S>>) -> impl IntoResponse {
    if state.store.ping().await {
        (
            StatusCode::OK,
            Json(json!({ "status": "ok", "database": "up" })),
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "degraded", "database": "down" })),
        )
    }
}
