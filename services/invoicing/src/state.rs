//! Application state shared across handlers

use crate::{jwt::JwtService, repositories::Store, services::Services};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState<S: Store> {
    pub store: S,
    pub services: Services<S>,
    pub jwt_service: JwtService,
}
