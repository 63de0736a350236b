use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::{CookieJar, WithRejection};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, MessageResponse, PublicUser, SignupRequest},
        extractors::CurrentSession,
    },
    error::{AppError, AppResult},
    sessions::cookie::{removal_cookie, session_cookie, session_token},
    state::AppState,
};

/// Routes reachable without a session.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/signup", post(signup))
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/api/auth/me", get(get_me))
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<SignupRequest>, AppError>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let user = state
        .credentials
        .create_user(
            payload.username.as_deref().unwrap_or_default(),
            payload.email.as_deref().unwrap_or_default(),
            payload.password.as_deref().unwrap_or_default(),
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User created successfully",
            user: user.into(),
        }),
    ))
}

#[instrument(skip(state, jar, payload))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    WithRejection(Json(payload), _): WithRejection<Json<LoginRequest>, AppError>,
) -> AppResult<(CookieJar, Json<AuthResponse>)> {
    let user = state
        .credentials
        .authenticate(
            payload.email.as_deref().unwrap_or_default(),
            payload.password.as_deref().unwrap_or_default(),
        )
        .await?;

    // A login over an existing session replaces it.
    if let Some(previous) = session_token(&state.config.session, &jar) {
        state.sessions.destroy_session(&previous).await?;
    }

    let session = state.sessions.create_session(user.id, &user.username).await?;
    let jar = jar.add(session_cookie(
        &state.config.session,
        session.token,
        state.sessions.ttl(),
    ));

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok((
        jar,
        Json(AuthResponse {
            message: "Login successful",
            user: user.into(),
        }),
    ))
}

#[instrument(skip(state, jar))]
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<MessageResponse>)> {
    let cfg = &state.config.session;
    if let Some(token) = session_token(cfg, &jar) {
        state.sessions.destroy_session(&token).await?;
    }

    Ok((
        jar.remove(removal_cookie(cfg)),
        Json(MessageResponse {
            message: "Logout successful",
        }),
    ))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    CurrentSession(identity): CurrentSession,
) -> AppResult<Json<PublicUser>> {
    let Some(user) = state.credentials.find_by_id(identity.user_id).await? else {
        warn!(user_id = %identity.user_id, "session refers to a missing user");
        return Err(AppError::NotFound("User not found".into()));
    };
    Ok(Json(user.into()))
}
