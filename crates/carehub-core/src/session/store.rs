use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::backend::{KeyValueStore, MemoryStore, StoreError};
use super::cookies::CookieJar;
use super::keys::SessionScope;
use super::teardown::{AuthTeardown, TeardownReport};
use crate::api::DefaultHeaders;
use crate::models::UserRecord;

/// An authenticated pairing of bearer token and user record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: UserRecord,
}

/// Persistence of the `{token, user}` pair for both session scopes.
///
/// The durable primary store is authoritative. Every write is mirrored
/// into the volatile store for consumers that read it directly.
pub struct SessionStore {
    primary: Arc<dyn KeyValueStore>,
    mirror: Arc<dyn KeyValueStore>,
    cookies: Arc<CookieJar>,
    teardown: AuthTeardown,
}

impl SessionStore {
    pub fn new(
        primary: Arc<dyn KeyValueStore>,
        mirror: Arc<dyn KeyValueStore>,
        cookies: Arc<CookieJar>,
        headers: Arc<DefaultHeaders>,
        cookie_host: Option<String>,
    ) -> Self {
        let teardown = AuthTeardown::new(
            primary.clone(),
            mirror.clone(),
            cookies.clone(),
            headers,
            cookie_host,
        );
        Self {
            primary,
            mirror,
            cookies,
            teardown,
        }
    }

    /// Memory-only store, for tests and throwaway clients.
    pub fn in_memory(headers: Arc<DefaultHeaders>) -> Self {
        Self::new(
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryStore::new()),
            Arc::new(CookieJar::new()),
            headers,
            None,
        )
    }

    /// The primary session, if complete.
    pub fn get(&self) -> Option<Session> {
        self.get_scoped(SessionScope::Primary)
    }

    /// Either a complete session or none; half-written state reads as none.
    pub fn get_scoped(&self, scope: SessionScope) -> Option<Session> {
        let token = self.primary.get(scope.token_key());
        let user = self.primary.get(scope.user_key());

        match (token, user) {
            (Some(token), Some(user)) if !token.is_empty() => {
                match serde_json::from_str::<UserRecord>(&user) {
                    Ok(user) => Some(Session { token, user }),
                    Err(e) => {
                        warn!(?scope, error = %e, "Stored user record is unreadable");
                        None
                    }
                }
            }
            (None, None) => None,
            _ => {
                debug!(?scope, "Ignoring partial session state");
                None
            }
        }
    }

    pub fn token(&self) -> Option<String> {
        self.get().map(|s| s.token)
    }

    pub fn set(&self, token: &str, user: UserRecord) -> Result<Session, StoreError> {
        self.set_scoped(SessionScope::Primary, token, user)
    }

    /// Persist both fields. The user entry is written before the token so
    /// that a reader on a backend without batch commits sees either the old
    /// state or the complete new one.
    pub fn set_scoped(
        &self,
        scope: SessionScope,
        token: &str,
        user: UserRecord,
    ) -> Result<Session, StoreError> {
        let user_json = serde_json::to_string(&user)?;
        let entries = [
            (scope.user_key(), user_json.as_str()),
            (scope.token_key(), token),
        ];

        self.primary.set_many(&entries)?;
        if let Err(e) = self.mirror.set_many(&entries) {
            warn!(?scope, error = %e, "Failed to mirror session");
        }

        info!(?scope, user = %user.email, "Session established");
        Ok(Session {
            token: token.to_string(),
            user,
        })
    }

    /// Replace the user record of an existing primary session.
    /// Returns `false` when there is no session to update.
    pub fn update_user(&self, user: UserRecord) -> Result<bool, StoreError> {
        if self.get().is_none() {
            return Ok(false);
        }
        let key = SessionScope::Primary.user_key();
        let user_json = serde_json::to_string(&user)?;
        self.primary.set(key, &user_json)?;
        if let Err(e) = self.mirror.set(key, &user_json) {
            warn!(error = %e, "Failed to mirror updated user");
        }
        Ok(true)
    }

    /// Tear down every session scope, cookie and cached header.
    pub fn clear(&self) -> TeardownReport {
        self.teardown.run()
    }

    pub fn mirror(&self) -> &Arc<dyn KeyValueStore> {
        &self.mirror
    }

    pub fn cookies(&self) -> &Arc<CookieJar> {
        &self.cookies
    }
}
