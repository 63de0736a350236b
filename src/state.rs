use std::sync::Arc;

use time::Duration;
use tracing::info;

use crate::auth::{password::PasswordHasher, repo::PgUserRepo, CredentialStore};
use crate::config::AppConfig;
use crate::memory::MemoryStore;
use crate::sessions::{repo::PgSessionRepo, SessionManager};
use crate::tasks::{repo::PgTaskRepo, TaskService};
use crate::db;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub credentials: CredentialStore,
    pub sessions: SessionManager,
    pub tasks: TaskService,
}

impl AppState {
    /// Connects the configured storage backend.
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        if config.database.is_memory() {
            info!("using in-memory storage; data is lost on restart");
            return Self::in_memory(config);
        }

        let hasher = PasswordHasher::new(config.password)?;
        let ttl = Duration::hours(config.session.ttl_hours);
        let pool = db::connect(&config.database).await?;

        Ok(Self {
            credentials: CredentialStore::new(Arc::new(PgUserRepo::new(pool.clone())), hasher),
            sessions: SessionManager::new(Arc::new(PgSessionRepo::new(pool.clone())), ttl),
            tasks: TaskService::new(Arc::new(PgTaskRepo::new(pool))),
            config: Arc::new(config),
        })
    }

    /// State over a fresh, isolated in-process store.
    pub fn in_memory(config: AppConfig) -> anyhow::Result<Self> {
        let hasher = PasswordHasher::new(config.password)?;
        let ttl = Duration::hours(config.session.ttl_hours);
        let store = Arc::new(MemoryStore::default());

        Ok(Self {
            credentials: CredentialStore::new(store.clone(), hasher),
            sessions: SessionManager::new(store.clone(), ttl),
            tasks: TaskService::new(store),
            config: Arc::new(config),
        })
    }
}
