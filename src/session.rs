//! Process-wide session: bearer token plus cached user profile.
//!
//! A [`SessionStore`] is created once at startup and handed by clone to every
//! component that needs it (the API client reads the token on each request).
//! Reads are synchronous; writes update memory first and then persist to the
//! [`Database`] under two fixed keys.
//!
//! Token and user are set and cleared together. Setting an empty token or
//! clearing the user is the same as [`SessionStore::logout`].

use anyhow::{Context, Result};
use secrecy::SecretString;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::api::User;
use crate::storage::Database;

/// Durable key holding the raw bearer token.
pub const TOKEN_KEY: &str = "auth.token";
/// Durable key holding the `{username, email}` JSON object.
pub const USER_KEY: &str = "auth.user";

#[derive(Default)]
struct SessionState {
    token: Option<SecretString>,
    user: Option<User>,
}

/// Shared handle to the session. Cloning shares the same underlying state.
#[derive(Clone, Default)]
pub struct SessionStore {
    state: Arc<RwLock<SessionState>>,
    db: Option<Database>,
}

/// Token is never printed.
impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.read();
        f.debug_struct("SessionStore")
            .field("token", &state.token.as_ref().map(|_| "[REDACTED]"))
            .field("user", &state.user)
            .field("persistent", &self.db.is_some())
            .finish()
    }
}

impl SessionStore {
    /// Session that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Restore the session persisted in `db`.
    ///
    /// A half-written session (token without user or the reverse) violates the
    /// "set together" invariant and is discarded.
    pub async fn load(db: Database) -> Result<Self> {
        let token = db
            .get_value(TOKEN_KEY)
            .await
            .context("Failed to read stored token")?
            .filter(|t| !t.trim().is_empty());

        let user = match db
            .get_value(USER_KEY)
            .await
            .context("Failed to read stored user")?
        {
            Some(raw) => match serde_json::from_str::<User>(&raw) {
                Ok(user) => Some(user),
                Err(e) => {
                    tracing::warn!(error = %e, "Stored user profile is not valid JSON, discarding");
                    None
                }
            },
            None => None,
        };

        let store = Self {
            state: Arc::new(RwLock::new(SessionState::default())),
            db: Some(db),
        };

        match (token, user) {
            (Some(token), Some(user)) => {
                tracing::debug!(username = %user.username, "Restored session");
                let mut state = store.write();
                state.token = Some(SecretString::from(token));
                state.user = Some(user);
            }
            (None, None) => {}
            _ => {
                tracing::warn!("Stored session is incomplete, signing out");
                store.logout().await?;
            }
        }

        Ok(store)
    }

    fn read(&self) -> RwLockReadGuard<'_, SessionState> {
        self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.state
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // ========================================================================
    // Reads
    // ========================================================================

    pub fn token(&self) -> Option<SecretString> {
        self.read().token.clone()
    }

    /// True when a non-empty token is held; the gate for every mutating action.
    pub fn has_token(&self) -> bool {
        self.read().token.is_some()
    }

    pub fn user(&self) -> Option<User> {
        self.read().user.clone()
    }

    pub fn username(&self) -> Option<String> {
        self.read().user.as_ref().map(|u| u.username.clone())
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Replace the token. An empty or whitespace-only token signs out.
    pub async fn set_token(&self, token: &str) -> Result<()> {
        let token = token.trim();
        if token.is_empty() {
            return self.logout().await;
        }

        self.write().token = Some(SecretString::from(token.to_string()));
        if let Some(db) = &self.db {
            db.set_value(TOKEN_KEY, token)
                .await
                .context("Failed to persist token")?;
        }
        Ok(())
    }

    /// Replace the cached profile. `None` signs out.
    pub async fn set_user(&self, user: Option<User>) -> Result<()> {
        let Some(user) = user else {
            return self.logout().await;
        };

        let raw = serde_json::to_string(&user).context("Failed to serialize user")?;
        self.write().user = Some(user);
        if let Some(db) = &self.db {
            db.set_value(USER_KEY, &raw)
                .await
                .context("Failed to persist user")?;
        }
        Ok(())
    }

    /// Set token and user in one step, the normal way a session starts.
    pub async fn sign_in(&self, token: &str, user: User) -> Result<()> {
        let token = token.trim();
        if token.is_empty() {
            return self.logout().await;
        }

        let raw = serde_json::to_string(&user).context("Failed to serialize user")?;
        {
            let mut state = self.write();
            state.token = Some(SecretString::from(token.to_string()));
            state.user = Some(user);
        }
        if let Some(db) = &self.db {
            db.set_values(&[(TOKEN_KEY, token), (USER_KEY, &raw)])
                .await
                .context("Failed to persist session")?;
        }
        Ok(())
    }

    /// Clear token and user, in memory and on disk.
    pub async fn logout(&self) -> Result<()> {
        {
            let mut state = self.write();
            state.token = None;
            state.user = None;
        }
        if let Some(db) = &self.db {
            db.delete_values(&[TOKEN_KEY, USER_KEY])
                .await
                .context("Failed to clear stored session")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    fn ada() -> User {
        User {
            username: "ada".to_string(),
            email: "ada@example.com".to_string(),
        }
    }

    async fn test_db() -> Database {
        Database::open(":memory:").await.unwrap()
    }

    #[tokio::test]
    async fn test_empty_token_logs_out() {
        let session = SessionStore::in_memory();
        session.sign_in("tok", ada()).await.unwrap();
        assert!(session.has_token());

        session.set_token("   ").await.unwrap();
        assert!(!session.has_token());
        assert!(session.user().is_none());
    }

    #[tokio::test]
    async fn test_clearing_user_logs_out() {
        let session = SessionStore::in_memory();
        session.sign_in("tok", ada()).await.unwrap();

        session.set_user(None).await.unwrap();
        assert!(!session.has_token());
        assert!(session.user().is_none());
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let session = SessionStore::in_memory();
        let other = session.clone();
        session.sign_in("tok", ada()).await.unwrap();

        assert_eq!(other.token().unwrap().expose_secret(), "tok");
        assert_eq!(other.username().as_deref(), Some("ada"));
    }

    #[tokio::test]
    async fn test_session_survives_reload() {
        let db = test_db().await;
        let session = SessionStore::load(db.clone()).await.unwrap();
        session.sign_in("tok", ada()).await.unwrap();

        let restored = SessionStore::load(db).await.unwrap();
        assert_eq!(restored.token().unwrap().expose_secret(), "tok");
        assert_eq!(restored.user(), Some(ada()));
    }

    #[tokio::test]
    async fn test_logout_clears_storage() {
        let db = test_db().await;
        let session = SessionStore::load(db.clone()).await.unwrap();
        session.sign_in("tok", ada()).await.unwrap();
        session.logout().await.unwrap();

        assert_eq!(db.get_value(TOKEN_KEY).await.unwrap(), None);
        assert_eq!(db.get_value(USER_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_incomplete_stored_session_discarded() {
        let db = test_db().await;
        db.set_value(TOKEN_KEY, "orphan").await.unwrap();

        let session = SessionStore::load(db.clone()).await.unwrap();
        assert!(!session.has_token());
        assert_eq!(db.get_value(TOKEN_KEY).await.unwrap(), None);
    }

    #[test]
    fn test_debug_redacts_token() {
        let session = SessionStore::in_memory();
        session.write().token = Some(SecretString::from("super-secret".to_string()));
        let output = format!("{:?}", session);
        assert!(!output.contains("super-secret"));
        assert!(output.contains("[REDACTED]"));
    }
}
