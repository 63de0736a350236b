use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::db;
use crate::error::{AppError, AppResult};
use crate::tasks::dto::TaskDraft;
use crate::tasks::repo::TaskRepo;
use crate::tasks::repo_types::{Task, TaskFilter, TaskPatch, DEFAULT_CATEGORY};

fn not_found() -> AppError {
    AppError::NotFound("Task not found".into())
}

/// Path ids that are not UUIDs cannot name any task.
pub fn parse_task_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| not_found())
}

fn normalize_category(raw: Option<String>) -> String {
    raw.map(|c| c.trim().to_owned())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| DEFAULT_CATEGORY.to_owned())
}

#[derive(Clone)]
pub struct TaskService {
    repo: Arc<dyn TaskRepo>,
}

impl TaskService {
    pub fn new(repo: Arc<dyn TaskRepo>) -> Self {
        Self { repo }
    }

    pub async fn list(&self, user_id: Uuid, filter: &TaskFilter) -> AppResult<Vec<Task>> {
        Ok(self.repo.list(user_id, filter).await?)
    }

    pub async fn get(&self, user_id: Uuid, task_id: Uuid) -> AppResult<Task> {
        self.repo
            .find(user_id, task_id)
            .await?
            .ok_or_else(not_found)
    }

    pub async fn create(&self, user_id: Uuid, draft: TaskDraft) -> AppResult<Task> {
        let title = draft.title.trim();
        if title.is_empty() {
            return Err(AppError::Validation("Title is required".into()));
        }

        let now = db::now();
        let task = Task {
            id: Uuid::new_v4(),
            user_id,
            title: title.to_owned(),
            description: draft
                .description
                .map(|d| d.trim().to_owned())
                .unwrap_or_default(),
            priority: draft.priority.unwrap_or_default(),
            category: normalize_category(draft.category),
            due_date: draft.due_date,
            completed: false,
            created_at: now,
            updated_at: now,
        };
        self.repo.insert(&task).await?;

        info!(user_id = %user_id, task_id = %task.id, "task created");
        Ok(task)
    }

    pub async fn update(&self, user_id: Uuid, task_id: Uuid, mut patch: TaskPatch) -> AppResult<Task> {
        if let Some(title) = patch.title.take() {
            let title = title.trim();
            if title.is_empty() {
                return Err(AppError::Validation("Title cannot be empty".into()));
            }
            patch.title = Some(title.to_owned());
        }
        if patch.category.is_some() {
            patch.category = Some(normalize_category(patch.category.take()));
        }

        let task = self
            .repo
            .update(user_id, task_id, &patch, db::now())
            .await?
            .ok_or_else(not_found)?;

        info!(user_id = %user_id, task_id = %task_id, "task updated");
        Ok(task)
    }

    pub async fn delete(&self, user_id: Uuid, task_id: Uuid) -> AppResult<()> {
        if !self.repo.delete(user_id, task_id).await? {
            return Err(not_found());
        }
        info!(user_id = %user_id, task_id = %task_id, "task deleted");
        Ok(())
    }
}
