pub mod cookie;
pub mod repo;
pub mod repo_types;
pub mod services;

pub use repo_types::SessionIdentity;
pub use services::SessionManager;
