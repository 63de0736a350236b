pub mod app;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod memory;
pub mod sessions;
pub mod state;
pub mod tasks;

pub use app::build_app;
pub use config::AppConfig;
pub use state::AppState;
