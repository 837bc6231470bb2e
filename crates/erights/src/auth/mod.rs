//! Admin auth gate: signup with a salted bcrypt hash, login verification,
//! and server-side session tokens checked by a uniform guard on every
//! admin route. Login failures are reported with one generic message that
//! never reveals whether the email or the password was wrong.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Matches the registrar's existing credential records.
const BCRYPT_COST: u32 = 10;

/// One stored administrator credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminAccount {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
}

/// Credential storage contract. Email uniqueness is enforced here, at the
/// store layer, not left to callers.
#[async_trait]
pub trait AdminDirectory: Send + Sync {
    async fn create(&self, email: &str, password_hash: &str)
        -> Result<AdminAccount, AdminStoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<AdminAccount>, AdminStoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum AdminStoreError {
    #[error("admin email already registered")]
    DuplicateEmail,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// In-memory credential store for tests and databaseless development runs.
#[derive(Default, Clone)]
pub struct InMemoryAdminDirectory {
    accounts: Arc<Mutex<Vec<AdminAccount>>>,
}

impl InMemoryAdminDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AdminDirectory for InMemoryAdminDirectory {
    async fn create(
        &self,
        email: &str,
        password_hash: &str,
    ) -> Result<AdminAccount, AdminStoreError> {
        let mut accounts = self.accounts.lock().expect("admin directory mutex poisoned");
        if accounts
            .iter()
            .any(|account| account.email.eq_ignore_ascii_case(email))
        {
            return Err(AdminStoreError::DuplicateEmail);
        }

        let account = AdminAccount {
            id: accounts.len() as i64 + 1,
            email: email.to_string(),
            password_hash: password_hash.to_string(),
        };
        accounts.push(account.clone());
        Ok(account)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<AdminAccount>, AdminStoreError> {
        let accounts = self.accounts.lock().expect("admin directory mutex poisoned");
        Ok(accounts
            .iter()
            .find(|account| account.email.eq_ignore_ascii_case(email))
            .cloned())
    }
}

/// A session issued to a logged-in administrator.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedSession {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

struct SessionEntry {
    email: String,
    expires_at: DateTime<Utc>,
}

/// Opaque server-side session tokens with a fixed TTL. Expired entries are
/// purged lazily on every issue and verification.
pub struct SessionStore {
    sessions: Mutex<HashMap<String, SessionEntry>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl_minutes: i64) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            ttl: Duration::minutes(ttl_minutes.max(1)),
        }
    }

    pub fn issue(&self, email: &str) -> IssuedSession {
        let token = Uuid::new_v4().simple().to_string();
        let expires_at = Utc::now() + self.ttl;

        let mut sessions = self.sessions.lock().expect("session mutex poisoned");
        purge_expired(&mut sessions);
        sessions.insert(
            token.clone(),
            SessionEntry {
                email: email.to_string(),
                expires_at,
            },
        );

        IssuedSession { token, expires_at }
    }

    /// Resolve a bearer token to the admin email it was issued for.
    pub fn verify(&self, token: &str) -> Option<String> {
        let mut sessions = self.sessions.lock().expect("session mutex poisoned");
        purge_expired(&mut sessions);
        sessions.get(token).map(|entry| entry.email.clone())
    }
}

fn purge_expired(sessions: &mut HashMap<String, SessionEntry>) {
    let now = Utc::now();
    sessions.retain(|_, entry| entry.expires_at > now);
}

/// Signup and login on top of the credential store and session issuer.
pub struct AuthService {
    admins: Arc<dyn AdminDirectory>,
    sessions: Arc<SessionStore>,
}

impl AuthService {
    pub fn new(admins: Arc<dyn AdminDirectory>, sessions: Arc<SessionStore>) -> Self {
        Self { admins, sessions }
    }

    pub async fn signup(&self, email: &str, password: &str) -> Result<(), AuthError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::MissingFields);
        }

        let password_hash =
            bcrypt::hash(password, BCRYPT_COST).map_err(|err| AuthError::Hash(err.to_string()))?;

        match self.admins.create(email, &password_hash).await {
            Ok(_) => Ok(()),
            Err(AdminStoreError::DuplicateEmail) => Err(AuthError::DuplicateEmail),
            Err(other) => Err(AuthError::Store(other)),
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<IssuedSession, AuthError> {
        let account = self
            .admins
            .find_by_email(email.trim())
            .await
            .map_err(AuthError::Store)?
            .ok_or(AuthError::InvalidCredentials)?;

        let valid = bcrypt::verify(password, &account.password_hash)
            .map_err(|err| AuthError::Hash(err.to_string()))?;
        if !valid {
            return Err(AuthError::InvalidCredentials);
        }

        Ok(self.sessions.issue(&account.email))
    }

    pub fn authorize(&self, token: &str) -> Option<String> {
        self.sessions.verify(token)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("email and password are required")]
    MissingFields,
    #[error("admin email already registered")]
    DuplicateEmail,
    #[error("password hashing failed: {0}")]
    Hash(String),
    #[error(transparent)]
    Store(AdminStoreError),
}
