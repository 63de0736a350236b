use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Server-side session state keyed by the opaque cookie token.
#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub token: String,
    pub user_id: Uuid,
    pub username: String,
    pub created_at: OffsetDateTime,
    pub expires_at: OffsetDateTime,
}

impl Session {
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        self.expires_at <= now
    }

    pub fn identity(&self) -> SessionIdentity {
        SessionIdentity {
            user_id: self.user_id,
            username: self.username.clone(),
        }
    }
}

/// Who is making the request. Resolved once by the auth gate and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionIdentity {
    pub user_id: Uuid,
    pub username: String,
}
