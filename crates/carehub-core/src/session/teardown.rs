use std::sync::Arc;

use tracing::{debug, info, warn};

use super::backend::KeyValueStore;
use super::cookies::CookieJar;
use super::keys;
use crate::api::DefaultHeaders;

/// What a teardown pass actually removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TeardownReport {
    pub keys_removed: usize,
    pub cookies_expired: usize,
    pub header_cleared: bool,
}

impl TeardownReport {
    pub fn is_noop(&self) -> bool {
        self.keys_removed == 0 && self.cookies_expired == 0 && !self.header_cleared
    }
}

/// Erases all session state: both scopes in the primary store and its
/// mirror, auth-related cookies, and the cached `Authorization` header.
///
/// Synchronous and idempotent. Storage failures are logged and skipped so
/// the remaining backends are still cleared.
pub struct AuthTeardown {
    primary: Arc<dyn KeyValueStore>,
    mirror: Arc<dyn KeyValueStore>,
    cookies: Arc<CookieJar>,
    headers: Arc<DefaultHeaders>,
    cookie_host: Option<String>,
}

impl AuthTeardown {
    pub fn new(
        primary: Arc<dyn KeyValueStore>,
        mirror: Arc<dyn KeyValueStore>,
        cookies: Arc<CookieJar>,
        headers: Arc<DefaultHeaders>,
        cookie_host: Option<String>,
    ) -> Self {
        Self {
            primary,
            mirror,
            cookies,
            headers,
            cookie_host,
        }
    }

    pub fn run(&self) -> TeardownReport {
        let mut report = TeardownReport {
            keys_removed: Self::clear_store(self.primary.as_ref(), "primary")
                + Self::clear_store(self.mirror.as_ref(), "mirror"),
            ..TeardownReport::default()
        };

        report.header_cleared = self.headers.clear_authorization();
        report.cookies_expired = self.expire_cookies();

        if report.is_noop() {
            debug!("Teardown found no session state");
        } else {
            info!(
                keys = report.keys_removed,
                cookies = report.cookies_expired,
                header = report.header_cleared,
                "Session torn down"
            );
        }
        report
    }

    fn clear_store(store: &dyn KeyValueStore, label: &str) -> usize {
        let mut removed = 0;
        for key in keys::all() {
            if store.get(key).is_none() {
                continue;
            }
            match store.remove(key) {
                Ok(()) => removed += 1,
                Err(e) => warn!(store = label, key, error = %e, "Failed to remove session key"),
            }
        }
        removed
    }

    /// Expire every auth-related cookie for the host-only domain and the
    /// apex domain.
    fn expire_cookies(&self) -> usize {
        let Some(ref host) = self.cookie_host else {
            return 0;
        };
        let apex = keys::apex_domain(host);

        let mut expired = 0;
        for name in self.cookies.names() {
            if !keys::is_auth_cookie(&name) {
                continue;
            }
            if self.cookies.expire(&name, host) {
                expired += 1;
            }
            if let Some(ref apex) = apex {
                if self.cookies.expire(&name, apex) {
                    expired += 1;
                }
            }
        }
        expired
    }
}
