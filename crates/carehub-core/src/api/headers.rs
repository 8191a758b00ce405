use parking_lot::RwLock;
use reqwest::header::{HeaderMap, HeaderValue, InvalidHeaderValue, AUTHORIZATION};

/// Default headers shared by every clone of a client.
///
/// Holds the cached `Authorization` header set after login. Teardown
/// removes it so later calls on the same client don't resend a stale token.
#[derive(Debug, Default)]
pub struct DefaultHeaders {
    inner: RwLock<HeaderMap>,
}

pub(crate) fn bearer_value(token: &str) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut value = HeaderValue::from_str(&format!("Bearer {}", token))?;
    value.set_sensitive(true);
    Ok(value)
}

impl DefaultHeaders {
    pub fn with_headers(headers: HeaderMap) -> Self {
        Self {
            inner: RwLock::new(headers),
        }
    }

    pub fn set_bearer(&self, token: &str) -> Result<(), InvalidHeaderValue> {
        let value = bearer_value(token)?;
        self.inner.write().insert(AUTHORIZATION, value);
        Ok(())
    }

    /// Returns whether a header was present.
    pub fn clear_authorization(&self) -> bool {
        self.inner.write().remove(AUTHORIZATION).is_some()
    }

    pub fn authorization(&self) -> Option<HeaderValue> {
        self.inner.read().get(AUTHORIZATION).cloned()
    }

    pub fn snapshot(&self) -> HeaderMap {
        self.inner.read().clone()
    }
}
