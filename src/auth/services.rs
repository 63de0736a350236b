use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::auth::password::PasswordHasher;
use crate::auth::repo::UserRepo;
use crate::auth::repo_types::User;
use crate::db;
use crate::error::{AppError, AppResult, StoreError};

pub const MIN_PASSWORD_LEN: usize = 6;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Persisted user accounts plus the hashing discipline around them.
#[derive(Clone)]
pub struct CredentialStore {
    repo: Arc<dyn UserRepo>,
    hasher: PasswordHasher,
}

impl CredentialStore {
    pub fn new(repo: Arc<dyn UserRepo>, hasher: PasswordHasher) -> Self {
        Self { repo, hasher }
    }

    pub async fn create_user(&self, username: &str, email: &str, password: &str) -> AppResult<User> {
        let username = username.trim();
        if username.is_empty() || email.trim().is_empty() || password.is_empty() {
            return Err(AppError::Validation("All fields are required".into()));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::Validation(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        if !is_valid_email(email) {
            return Err(AppError::Validation("Invalid email address".into()));
        }

        if self.repo.find_by_email(email).await?.is_some() {
            warn!(email = %email, "email already registered");
            return Err(email_taken());
        }

        let password_hash = self.hash_off_thread(password.to_owned()).await?;
        let user = User {
            id: Uuid::new_v4(),
            username: username.to_owned(),
            email: email.to_owned(),
            password_hash,
            created_at: db::now(),
        };

        // The pre-check above races with concurrent signups; the unique index decides.
        match self.repo.insert(&user).await {
            Ok(()) => {}
            Err(StoreError::Conflict) => {
                warn!(email = %email, "email registered concurrently");
                return Err(email_taken());
            }
            Err(e) => return Err(e.into()),
        }

        info!(user_id = %user.id, email = %user.email, "user registered");
        Ok(user)
    }

    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(self.repo.find_by_email(email).await?)
    }

    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.repo.find_by_id(id).await?)
    }

    pub async fn verify_password(&self, user: &User, password: &str) -> AppResult<bool> {
        let hasher = self.hasher.clone();
        let plain = password.to_owned();
        let hash = user.password_hash.clone();
        let ok = tokio::task::spawn_blocking(move || hasher.verify(&plain, &hash))
            .await
            .map_err(|e| anyhow::anyhow!("password verification task failed: {e}"))??;
        Ok(ok)
    }

    /// Resolves login credentials to a user. Unknown email and wrong password
    /// are reported identically.
    pub async fn authenticate(&self, email: &str, password: &str) -> AppResult<User> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(AppError::Validation("Email and password are required".into()));
        }

        let Some(user) = self.find_by_email(email).await? else {
            warn!(email = %email, "login unknown email");
            return Err(AppError::Unauthenticated(INVALID_CREDENTIALS.into()));
        };

        if !self.verify_password(&user, password).await? {
            warn!(email = %email, user_id = %user.id, "login invalid password");
            return Err(AppError::Unauthenticated(INVALID_CREDENTIALS.into()));
        }

        debug!(user_id = %user.id, "credentials verified");
        Ok(user)
    }

    async fn hash_off_thread(&self, password: String) -> AppResult<String> {
        let hasher = self.hasher.clone();
        let hash = tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| anyhow::anyhow!("password hashing task failed: {e}"))??;
        Ok(hash)
    }
}

fn email_taken() -> AppError {
    AppError::Conflict("Email already registered".into())
}
