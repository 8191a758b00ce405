//! Login and logout flows.
//!
//! `AuthService` is the only writer of sessions: a successful login stores
//! the `{token, user}` pair and caches the bearer header on the client;
//! logout (or any 401 seen by the client) erases it again.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::api::{ApiClient, ApiError, ErrorKind};
use crate::models::UserRecord;
use crate::session::{Session, SessionScope, TeardownReport};

const LOGIN_PATH: &str = "/auth/login";
const LOGOUT_PATH: &str = "/auth/logout";
const PROFILE_PATH: &str = "/auth/me";
const SUPERUSER_LOGIN_PATH: &str = "/superuser/login";

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: String,
    user: UserRecord,
}

/// `/auth/me` answers either `{user: {...}}` or the bare record.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ProfileResponse {
    Wrapped { user: UserRecord },
    Bare(UserRecord),
}

impl ProfileResponse {
    fn into_user(self) -> UserRecord {
        match self {
            ProfileResponse::Wrapped { user } => user,
            ProfileResponse::Bare(user) => user,
        }
    }
}

#[derive(Clone)]
pub struct AuthService {
    client: ApiClient,
}

impl AuthService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Authenticate and establish the primary session.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, ApiError> {
        let response: LoginResponse = self
            .client
            .post(LOGIN_PATH, &LoginRequest { email, password })
            .await?;
        let session = self.establish(SessionScope::Primary, response)?;
        self.client.set_auth_header(&session.token)?;
        Ok(session)
    }

    /// Authenticate into the separately-privileged superuser area.
    pub async fn superuser_login(&self, email: &str, password: &str) -> Result<Session, ApiError> {
        let response: LoginResponse = self
            .client
            .post(SUPERUSER_LOGIN_PATH, &LoginRequest { email, password })
            .await?;
        self.establish(SessionScope::Superuser, response)
    }

    fn establish(&self, scope: SessionScope, response: LoginResponse) -> Result<Session, ApiError> {
        self.client
            .session()
            .set_scoped(scope, &response.token, response.user)
            .map_err(|e| ApiError::new(ErrorKind::Unknown).with_cause(e))
    }

    /// Tell the server, then tear down locally. The server call is best
    /// effort; local state is always erased.
    pub async fn logout(&self) -> TeardownReport {
        if self.client.session().get().is_some() {
            if let Err(e) = self
                .client
                .post::<serde_json::Value, _>(LOGOUT_PATH, &serde_json::json!({}))
                .await
            {
                debug!(kind = %e.kind(), "Server-side logout failed");
            }
        }
        let report = self.client.session().clear();
        info!("Logged out");
        report
    }

    /// Re-fetch the profile and replace the stored user record.
    pub async fn refresh_profile(&self) -> Result<UserRecord, ApiError> {
        let user = self
            .client
            .get::<ProfileResponse>(PROFILE_PATH)
            .await?
            .into_user();
        self.client
            .session()
            .update_user(user.clone())
            .map_err(|e| ApiError::new(ErrorKind::Unknown).with_cause(e))?;
        Ok(user)
    }

    pub fn current_user(&self) -> Option<UserRecord> {
        self.client.session().get().map(|s| s.user)
    }
}
