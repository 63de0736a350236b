use std::sync::Arc;

use base64ct::{Base64UrlUnpadded, Encoding};
use rand::{rngs::OsRng, RngCore};
use time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

use crate::db;
use crate::error::AppResult;
use crate::sessions::repo::SessionRepo;
use crate::sessions::repo_types::{Session, SessionIdentity};

const TOKEN_BYTES: usize = 32;
/// Length of a base64url (unpadded) encoding of `TOKEN_BYTES`.
const TOKEN_LEN: usize = 43;

pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    Base64UrlUnpadded::encode_string(&bytes)
}

pub(crate) fn is_well_formed(token: &str) -> bool {
    token.len() == TOKEN_LEN
        && token
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

#[derive(Clone)]
pub struct SessionManager {
    repo: Arc<dyn SessionRepo>,
    ttl: Duration,
}

impl SessionManager {
    pub fn new(repo: Arc<dyn SessionRepo>, ttl: Duration) -> Self {
        Self { repo, ttl }
    }

    /// Lifetime of a new session; the cookie's Max-Age uses the same value.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issues a new session. Sessions that expired without being presented
    /// again are swept here, so storage does not grow with abandoned logins.
    pub async fn create_session(&self, user_id: Uuid, username: &str) -> AppResult<Session> {
        let now = db::now();
        let purged = self.repo.purge_expired(now).await?;
        if purged > 0 {
            debug!(purged, "expired sessions removed");
        }

        let session = Session {
            token: generate_token(),
            user_id,
            username: username.to_owned(),
            created_at: now,
            expires_at: now + self.ttl,
        };
        self.repo.insert(&session).await?;
        info!(user_id = %user_id, expires_at = %session.expires_at, "session created");
        Ok(session)
    }

    /// `None` for malformed, unknown or expired tokens.
    pub async fn validate_session(&self, token: &str) -> AppResult<Option<SessionIdentity>> {
        if !is_well_formed(token) {
            debug!("malformed session token");
            return Ok(None);
        }
        let session = self
            .repo
            .find_valid(token, db::now())
            .await?;
        Ok(session.map(|s| s.identity()))
    }

    pub async fn destroy_session(&self, token: &str) -> AppResult<()> {
        if !is_well_formed(token) {
            return Ok(());
        }
        self.repo.delete(token).await?;
        info!("session destroyed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    fn manager(ttl: Duration) -> SessionManager {
        SessionManager::new(Arc::new(MemoryStore::default()), ttl)
    }

    #[test]
    fn tokens_are_unique_and_well_formed() {
        let a = generate_token();
        let b = generate_token();
        assert_ne!(a, b);
        assert_eq!(a.len(), TOKEN_LEN);
        assert!(is_well_formed(&a));
        assert!(!is_well_formed("short"));
        assert!(!is_well_formed(&format!("{}=", &a[..42])));
    }

    #[tokio::test]
    async fn session_resolves_to_its_identity() {
        let sessions = manager(Duration::hours(24));
        let user_id = Uuid::new_v4();
        let session = sessions.create_session(user_id, "alice").await.unwrap();
        assert_eq!(session.expires_at - session.created_at, Duration::hours(24));

        let identity = sessions
            .validate_session(&session.token)
            .await
            .unwrap()
            .expect("valid session");
        assert_eq!(identity.user_id, user_id);
        assert_eq!(identity.username, "alice");
    }

    #[tokio::test]
    async fn destroyed_session_no_longer_validates() {
        let sessions = manager(Duration::hours(24));
        let session = sessions.create_session(Uuid::new_v4(), "alice").await.unwrap();
        sessions.destroy_session(&session.token).await.unwrap();
        assert!(sessions.validate_session(&session.token).await.unwrap().is_none());
        // destroying twice is harmless
        sessions.destroy_session(&session.token).await.unwrap();
    }

    #[tokio::test]
    async fn abandoned_expired_sessions_are_swept_by_the_next_login() {
        let store = Arc::new(MemoryStore::default());
        let short_lived = SessionManager::new(store.clone(), Duration::ZERO);
        let sessions = SessionManager::new(store.clone(), Duration::hours(24));

        short_lived.create_session(Uuid::new_v4(), "bob").await.unwrap();
        assert_eq!(store.session_count().await, 1);

        let fresh = sessions.create_session(Uuid::new_v4(), "alice").await.unwrap();
        assert_eq!(store.session_count().await, 1);
        assert!(sessions.validate_session(&fresh.token).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn expired_session_is_rejected() {
        let sessions = manager(Duration::ZERO);
        let session = sessions.create_session(Uuid::new_v4(), "alice").await.unwrap();
        assert!(sessions.validate_session(&session.token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unknown_and_malformed_tokens_are_rejected() {
        let sessions = manager(Duration::hours(24));
        assert!(sessions.validate_session(&generate_token()).await.unwrap().is_none());
        assert!(sessions.validate_session("").await.unwrap().is_none());
        assert!(sessions.validate_session("../../etc").await.unwrap().is_none());
    }
}
