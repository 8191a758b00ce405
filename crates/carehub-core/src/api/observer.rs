use serde::Serialize;
use tracing::info;

use crate::session::SessionScope;

/// Raised once per 401 after the session has been torn down.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInvalidated {
    /// Scope of the exchange that was rejected. Both scopes are gone either way.
    pub scope: SessionScope,
    /// Login entry point with the expired marker. `None` when the host is
    /// already on the login page or in the superuser area and must stay put.
    pub redirect_to: Option<String>,
}

/// Host application hook for forced logouts.
///
/// Called synchronously by the client after teardown and before the
/// failing call returns, so the host decides how and when to navigate.
pub trait SessionObserver: Send + Sync {
    /// Path the host is currently showing, e.g. `/orphans/12`.
    fn current_path(&self) -> String;

    fn session_invalidated(&self, event: &SessionInvalidated);
}

/// Observer for headless use; only logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl SessionObserver for NoopObserver {
    fn current_path(&self) -> String {
        "/".to_string()
    }

    fn session_invalidated(&self, event: &SessionInvalidated) {
        info!(scope = ?event.scope, redirect = ?event.redirect_to, "Session invalidated");
    }
}

fn path_only(path: &str) -> &str {
    let end = path.find(|c: char| c == '?' || c == '#').unwrap_or(path.len());
    &path[..end]
}

fn within(path: &str, prefix: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Where to send the host after a forced logout, or `None` when the current
/// location is the login page or the superuser area (no redirect loop).
pub fn login_redirect(current_path: &str, login_path: &str, superuser_prefix: &str) -> Option<String> {
    let path = path_only(current_path);
    if within(path, login_path) || within(path, superuser_prefix) {
        return None;
    }
    Some(format!("{}?expired=true", login_path))
}
