use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;

use crate::error::StoreError;
use crate::sessions::repo_types::Session;

#[async_trait]
pub trait SessionRepo: Send + Sync {
    async fn insert(&self, session: &Session) -> Result<(), StoreError>;
    /// Returns the session only if it is still valid at `now`.
    async fn find_valid(&self, token: &str, now: OffsetDateTime) -> Result<Option<Session>, StoreError>;
    async fn delete(&self, token: &str) -> Result<(), StoreError>;
    /// Deletes every session expired at `now`. Returns how many were removed.
    async fn purge_expired(&self, now: OffsetDateTime) -> Result<u64, StoreError>;
}

#[derive(Clone)]
pub struct PgSessionRepo {
    db: PgPool,
}

impl PgSessionRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SessionRepo for PgSessionRepo {
    async fn insert(&self, session: &Session) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO sessions (token, user_id, username, created_at, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&session.token)
        .bind(session.user_id)
        .bind(&session.username)
        .bind(session.created_at)
        .bind(session.expires_at)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn find_valid(&self, token: &str, now: OffsetDateTime) -> Result<Option<Session>, StoreError> {
        let session = sqlx::query_as::<_, Session>(
            r#"
            SELECT token, user_id, username, created_at, expires_at
            FROM sessions
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.db)
        .await?;

        match session {
            Some(s) if s.is_expired_at(now) => {
                self.delete(token).await?;
                Ok(None)
            }
            other => Ok(other),
        }
    }

    async fn delete(&self, token: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    async fn purge_expired(&self, now: OffsetDateTime) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected())
    }
}
