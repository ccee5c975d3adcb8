//! Middleware for JWT token validation and authentication

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use tracing::warn;
use uuid::Uuid;

use crate::{
    error::{ApiError, ServiceError},
    jwt::TokenType,
    repositories::Store,
    state::AppState,
};

/// Caller identity taken from a valid access token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub id: Uuid,
}

/// Reject requests without a valid access token and expose the caller as an
/// [`AuthUser`] extension
///
/// The token's subject must still be an active account; a token issued
/// before deactivation stops working at once.
pub async fn auth_middleware<S: Store>(
    State(state): State<AppState<S>>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let TypedHeader(Authorization(bearer)) = bearer.ok_or(ApiError::Unauthorized)?;

    let claims = state
        .jwt_service
        .validate_token(bearer.token())
        .map_err(|e| {
            warn!("Failed to validate token: {}", e);
            ApiError::Unauthorized
        })?;

    if claims.token_type != TokenType::Access {
        warn!("Refresh token used as access token");
        return Err(ApiError::Unauthorized);
    }

    state
        .services
        .accounts
        .me(claims.sub)
        .await
        .map_err(|e| match e {
            ServiceError::NotFound(_) => {
                warn!(user_id = %claims.sub, "Token subject is not an active account");
                ApiError::Unauthorized
            }
            other => ApiError::Service(other),
        })?;

    req.extensions_mut().insert(AuthUser { id: claims.sub });

    Ok(next.run(req).await)
}
