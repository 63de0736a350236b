//! In-process storage backend.
//!
//! Used when `DATABASE_URL=memory` and by the test suite, where every test
//! builds its own isolated instance. State lives only as long as the process.
//! Each mutation holds one write guard across lookup and change, which gives
//! the same per-record atomicity the Postgres backend gets from single
//! statements.

use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::auth::repo::UserRepo;
use crate::auth::repo_types::User;
use crate::db::to_db_precision;
use crate::error::StoreError;
use crate::sessions::repo::SessionRepo;
use crate::sessions::repo_types::Session;
use crate::tasks::repo::TaskRepo;
use crate::tasks::repo_types::{Task, TaskFilter, TaskPatch};

#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
    sessions: RwLock<HashMap<String, Session>>,
    tasks: RwLock<HashMap<Uuid, Task>>,
}

impl MemoryStore {
    /// Number of stored sessions, expired or not.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[async_trait]
impl UserRepo for MemoryStore {
    async fn insert(&self, user: &User) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict);
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.get(&id).cloned())
    }
}

#[async_trait]
impl SessionRepo for MemoryStore {
    async fn insert(&self, session: &Session) -> Result<(), StoreError> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&session.token) {
            return Err(StoreError::Conflict);
        }
        sessions.insert(session.token.clone(), session.clone());
        Ok(())
    }

    async fn find_valid(&self, token: &str, now: OffsetDateTime) -> Result<Option<Session>, StoreError> {
        let mut sessions = self.sessions.write().await;
        let expired = match sessions.get(token) {
            Some(s) => s.is_expired_at(now),
            None => return Ok(None),
        };
        if expired {
            sessions.remove(token);
            return Ok(None);
        }
        Ok(sessions.get(token).cloned())
    }

    async fn delete(&self, token: &str) -> Result<(), StoreError> {
        self.sessions.write().await.remove(token);
        Ok(())
    }

    async fn purge_expired(&self, now: OffsetDateTime) -> Result<u64, StoreError> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired_at(now));
        Ok((before - sessions.len()) as u64)
    }
}

#[async_trait]
impl TaskRepo for MemoryStore {
    async fn list(&self, user_id: Uuid, filter: &TaskFilter) -> Result<Vec<Task>, StoreError> {
        let tasks = self.tasks.read().await;
        let mut owned: Vec<Task> = tasks
            .values()
            .filter(|t| t.user_id == user_id && filter.matches(t))
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(owned)
    }

    async fn find(&self, user_id: Uuid, task_id: Uuid) -> Result<Option<Task>, StoreError> {
        let tasks = self.tasks.read().await;
        Ok(tasks
            .get(&task_id)
            .filter(|t| t.user_id == user_id)
            .cloned())
    }

    async fn insert(&self, task: &Task) -> Result<(), StoreError> {
        let mut tasks = self.tasks.write().await;
        if tasks.contains_key(&task.id) {
            return Err(StoreError::Conflict);
        }
        let mut stored = task.clone();
        stored.created_at = to_db_precision(stored.created_at);
        stored.updated_at = to_db_precision(stored.updated_at);
        tasks.insert(task.id, stored);
        Ok(())
    }

    async fn update(
        &self,
        user_id: Uuid,
        task_id: Uuid,
        patch: &TaskPatch,
        now: OffsetDateTime,
    ) -> Result<Option<Task>, StoreError> {
        let mut tasks = self.tasks.write().await;
        let Some(task) = tasks.get_mut(&task_id).filter(|t| t.user_id == user_id) else {
            return Ok(None);
        };
        patch.apply(task, to_db_precision(now));
        Ok(Some(task.clone()))
    }

    async fn delete(&self, user_id: Uuid, task_id: Uuid) -> Result<bool, StoreError> {
        let mut tasks = self.tasks.write().await;
        let owned = tasks.get(&task_id).is_some_and(|t| t.user_id == user_id);
        if owned {
            tasks.remove(&task_id);
        }
        Ok(owned)
    }
}
