use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use tracing::debug;

use crate::error::AppError;
use crate::sessions::{cookie::session_token, SessionIdentity};
use crate::state::AppState;

/// Auth gate for protected routes. Resolves the session cookie once and
/// hands the identity to handlers through request extensions.
pub async fn require_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(token) = session_token(&state.config.session, &jar) else {
        debug!(path = %req.uri().path(), "request without session cookie");
        return Err(AppError::not_authenticated());
    };

    let Some(identity) = state.sessions.validate_session(&token).await? else {
        debug!(path = %req.uri().path(), "invalid or expired session");
        return Err(AppError::not_authenticated());
    };

    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}

/// Identity resolved by [`require_session`]. Rejects with 401 if the gate did
/// not run for this route.
#[derive(Debug, Clone)]
pub struct CurrentSession(pub SessionIdentity);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SessionIdentity>()
            .cloned()
            .map(CurrentSession)
            .ok_or_else(AppError::not_authenticated)
    }
}
