//! Bearer token middleware for protected routes

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};
use tunimaqam_common::auth::{authorize, validate_token, AuthError, Role};

use crate::{ApiError, AppState};

/// Validate `Authorization: Bearer <token>` and attach the [`Claims`] to the request
///
/// Every role may use the protected surface. With `auth_secret == 0` the
/// check is skipped and no claims are attached.
///
/// [`Claims`]: tunimaqam_common::auth::Claims
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if state.auth_secret == 0 {
        return Ok(next.run(request).await);
    }

    let token = bearer_token(&request).ok_or(AuthError::MissingToken)?;

    let now_ms = chrono::Utc::now().timestamp_millis();
    let claims = validate_token(token, state.auth_secret, now_ms).map_err(|e| {
        warn!("Rejected token on {}: {}", request.uri().path(), e);
        e
    })?;
    authorize(&claims, &Role::ALL)?;

    debug!("Authorized {} ({})", claims.email, claims.role);
    request.extensions_mut().insert(claims);

    Ok(next.run(request).await)
}

fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}
