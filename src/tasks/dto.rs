use serde::{Deserialize, Deserializer, Serialize};
use time::{format_description::FormatItem, macros::format_description, Date, OffsetDateTime};
use uuid::Uuid;

use crate::error::AppError;
use crate::tasks::repo_types::{Priority, Task, TaskFilter, TaskPatch};

const DUE_DATE_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Task as returned to the client. The owner id is never serialised.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResponse {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub category: String,
    pub due_date: Option<String>,
    pub completed: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<Task> for TaskResponse {
    fn from(t: Task) -> Self {
        Self {
            id: t.id,
            title: t.title,
            description: t.description,
            priority: t.priority,
            category: t.category,
            due_date: t.due_date.and_then(|d| d.format(DUE_DATE_FORMAT).ok()),
            completed: t.completed,
            created_at: t.created_at,
            updated_at: t.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
}

/// Fields of a new task after parsing, before title validation and defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub category: Option<String>,
    pub due_date: Option<Date>,
}

impl TryFrom<CreateTaskRequest> for TaskDraft {
    type Error = AppError;

    fn try_from(req: CreateTaskRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            title: req.title.unwrap_or_default(),
            description: req.description,
            priority: req.priority.as_deref().map(parse_priority).transpose()?,
            category: req.category,
            due_date: req.due_date.as_deref().map(parse_due_date).transpose()?.flatten(),
        })
    }
}

/// Partial update body. Anything not listed here (id, userId, createdAt,
/// updatedAt, unknown keys) is ignored by deserialisation.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    /// Absent: keep. `null` or `""`: clear. Otherwise `YYYY-MM-DD`.
    #[serde(default, deserialize_with = "present")]
    pub due_date: Option<Option<String>>,
    #[serde(default)]
    pub completed: Option<bool>,
}

impl TryFrom<UpdateTaskRequest> for TaskPatch {
    type Error = AppError;

    fn try_from(req: UpdateTaskRequest) -> Result<Self, Self::Error> {
        let due_date = match req.due_date {
            None => None,
            Some(None) => Some(None),
            Some(Some(raw)) => Some(parse_due_date(&raw)?),
        };
        Ok(Self {
            title: req.title,
            description: req.description,
            priority: req.priority.as_deref().map(parse_priority).transpose()?,
            category: req.category,
            due_date,
            completed: req.completed,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListTasksQuery {
    pub priority: Option<String>,
    pub category: Option<String>,
    pub completed: Option<bool>,
}

impl TryFrom<ListTasksQuery> for TaskFilter {
    type Error = AppError;

    fn try_from(q: ListTasksQuery) -> Result<Self, Self::Error> {
        Ok(Self {
            priority: q.priority.as_deref().map(parse_priority).transpose()?,
            category: q.category.filter(|c| !c.is_empty()),
            completed: q.completed,
        })
    }
}

// Distinguishes an explicit `null` from a missing key.
fn present<'de, D, T>(de: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(de).map(Some)
}

fn parse_priority(raw: &str) -> Result<Priority, AppError> {
    raw.parse()
        .map_err(|_| AppError::Validation("Priority must be one of: low, medium, high".into()))
}

/// Empty string means "no due date".
fn parse_due_date(raw: &str) -> Result<Option<Date>, AppError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    Date::parse(raw, DUE_DATE_FORMAT)
        .map(Some)
        .map_err(|_| AppError::Validation("Due date must be formatted as YYYY-MM-DD".into()))
}
