use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::StoreError;
use crate::tasks::repo_types::{Task, TaskFilter, TaskPatch, TaskRow};

/// Task persistence. Every per-task operation takes the owner id and must
/// resolve (id, owner) in a single storage operation.
#[async_trait]
pub trait TaskRepo: Send + Sync {
    /// Tasks owned by `user_id`, newest first.
    async fn list(&self, user_id: Uuid, filter: &TaskFilter) -> Result<Vec<Task>, StoreError>;
    async fn find(&self, user_id: Uuid, task_id: Uuid) -> Result<Option<Task>, StoreError>;
    async fn insert(&self, task: &Task) -> Result<(), StoreError>;
    /// `None` when no task with that id belongs to `user_id`.
    async fn update(
        &self,
        user_id: Uuid,
        task_id: Uuid,
        patch: &TaskPatch,
        now: OffsetDateTime,
    ) -> Result<Option<Task>, StoreError>;
    /// `false` when no task with that id belongs to `user_id`.
    async fn delete(&self, user_id: Uuid, task_id: Uuid) -> Result<bool, StoreError>;
}

#[derive(Clone)]
pub struct PgTaskRepo {
    db: PgPool,
}

impl PgTaskRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn into_task(row: TaskRow) -> Result<Task, StoreError> {
    Task::try_from(row).map_err(|e| StoreError::Backend(anyhow::Error::new(e)))
}

#[async_trait]
impl TaskRepo for PgTaskRepo {
    async fn list(&self, user_id: Uuid, filter: &TaskFilter) -> Result<Vec<Task>, StoreError> {
        let rows = sqlx::query_as::<_, TaskRow>(
            r#"
            SELECT id, user_id, title, description, priority, category, due_date,
                   completed, created_at, updated_at
            FROM tasks
            WHERE user_id = $1
              AND ($2::text IS NULL OR priority = $2)
              AND ($3::text IS NULL OR category = $3)
              AND ($4::bool IS NULL OR completed = $4)
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(user_id)
        .bind(filter.priority.map(|p| p.as_str()))
        .bind(filter.category.as_deref())
        .bind(filter.completed)
        .fetch_all(&self.db)
        .await?;
        rows.into_iter().map(into_task).collect()
    }

    async fn find(&self, user_id: Uuid, task_id: Uuid) -> Result<Option<Task>, StoreError> {
        let row = sqlx::query_as::<_, TaskRow>(
            r#"
            SELECT id, user_id, title, description, priority, category, due_date,
                   completed, created_at, updated_at
            FROM tasks
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(task_id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;
        row.map(into_task).transpose()
    }

    async fn insert(&self, task: &Task) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO tasks (id, user_id, title, description, priority, category,
                               due_date, completed, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(task.id)
        .bind(task.user_id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.priority.as_str())
        .bind(&task.category)
        .bind(task.due_date)
        .bind(task.completed)
        .bind(task.created_at)
        .bind(task.updated_at)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn update(
        &self,
        user_id: Uuid,
        task_id: Uuid,
        patch: &TaskPatch,
        now: OffsetDateTime,
    ) -> Result<Option<Task>, StoreError> {
        let row = sqlx::query_as::<_, TaskRow>(
            r#"
            UPDATE tasks SET
                title       = COALESCE($3, title),
                description = COALESCE($4, description),
                priority    = COALESCE($5, priority),
                category    = COALESCE($6, category),
                due_date    = CASE WHEN $7 THEN $8 ELSE due_date END,
                completed   = COALESCE($9, completed),
                updated_at  = $10
            WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, title, description, priority, category, due_date,
                      completed, created_at, updated_at
            "#,
        )
        .bind(task_id)
        .bind(user_id)
        .bind(patch.title.as_deref())
        .bind(patch.description.as_deref())
        .bind(patch.priority.map(|p| p.as_str()))
        .bind(patch.category.as_deref())
        .bind(patch.due_date.is_some())
        .bind(patch.due_date.flatten())
        .bind(patch.completed)
        .bind(now)
        .fetch_optional(&self.db)
        .await?;
        row.map(into_task).transpose()
    }

    async fn delete(&self, user_id: Uuid, task_id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND user_id = $2")
            .bind(task_id)
            .bind(user_id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
