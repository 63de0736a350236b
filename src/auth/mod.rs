use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod extractors;
pub mod handlers;
pub mod password;
pub mod repo;
pub mod repo_types;
pub mod services;

pub use services::CredentialStore;

/// Signup, login and logout. Not behind the session gate.
pub fn router() -> Router<AppState> {
    handlers::auth_routes()
}

/// Routes that need the session gate layered on by the caller.
pub fn protected_router() -> Router<AppState> {
    handlers::me_routes()
}
