//! In-process cookie jar.
//!
//! Cookies are keyed by `(name, domain)` so a host-only cookie and one set
//! for the apex domain are separate entries, the same way a browser keeps
//! them. The client feeds `Set-Cookie` headers in and sends matching
//! cookies back out.

use std::collections::BTreeMap;

use parking_lot::Mutex;
use reqwest::header::{HeaderMap, HeaderValue, SET_COOKIE};
use tracing::debug;

use super::keys::apex_domain;

#[derive(Debug, Default)]
pub struct CookieJar {
    cookies: Mutex<BTreeMap<(String, String), String>>,
}

fn normalize_domain(domain: &str) -> String {
    let domain = domain.to_ascii_lowercase();
    // A leading dot always denotes the apex form; bare hosts stay host-only.
    if let Some(stripped) = domain.strip_prefix('.') {
        format!(".{}", stripped.trim_start_matches('.'))
    } else {
        domain
    }
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, name: &str, domain: &str, value: &str) {
        self.cookies
            .lock()
            .insert((name.to_string(), normalize_domain(domain)), value.to_string());
    }

    pub fn get(&self, name: &str, domain: &str) -> Option<String> {
        self.cookies
            .lock()
            .get(&(name.to_string(), normalize_domain(domain)))
            .cloned()
    }

    /// Distinct cookie names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.cookies.lock().keys().map(|(n, _)| n.clone()).collect();
        names.dedup();
        names
    }

    /// Remove one `(name, domain)` entry. Returns whether it existed.
    pub fn expire(&self, name: &str, domain: &str) -> bool {
        self.cookies
            .lock()
            .remove(&(name.to_string(), normalize_domain(domain)))
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.cookies.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.lock().is_empty()
    }

    /// `Cookie` header value for a request to `host`: host-only cookies for
    /// that exact host plus cookies scoped to its apex domain.
    pub fn header_for(&self, host: &str) -> Option<HeaderValue> {
        let host = normalize_domain(host);
        let apex = apex_domain(&host);
        let cookies = self.cookies.lock();
        let pairs: Vec<String> = cookies
            .iter()
            .filter(|((_, domain), _)| *domain == host || Some(domain) == apex.as_ref())
            .map(|((name, _), value)| format!("{}={}", name, value))
            .collect();
        if pairs.is_empty() {
            return None;
        }
        HeaderValue::from_str(&pairs.join("; ")).ok()
    }

    /// Apply every `Set-Cookie` header of a response received from `host`.
    pub fn absorb(&self, host: &str, headers: &HeaderMap) {
        for value in headers.get_all(SET_COOKIE) {
            if let Ok(raw) = value.to_str() {
                self.apply_set_cookie(host, raw);
            }
        }
    }

    fn apply_set_cookie(&self, host: &str, raw: &str) {
        let mut parts = raw.split(';').map(str::trim);
        let Some((name, value)) = parts.next().and_then(|nv| nv.split_once('=')) else {
            return;
        };
        let name = name.trim();
        if name.is_empty() {
            return;
        }

        let mut domain = host.to_string();
        let mut expired = false;
        for attr in parts {
            let (key, val) = attr.split_once('=').unwrap_or((attr, ""));
            match key.trim().to_ascii_lowercase().as_str() {
                "domain" if !val.trim().is_empty() => {
                    domain = format!(".{}", val.trim().trim_start_matches('.'));
                }
                "max-age" => {
                    expired = val.trim().parse::<i64>().map(|age| age <= 0).unwrap_or(false);
                }
                _ => {}
            }
        }

        if expired {
            debug!(cookie = name, domain = %domain, "Server expired cookie");
            self.expire(name, &domain);
        } else {
            self.set(name, &domain, value.trim());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_and_apex_entries_are_distinct() {
        let jar = CookieJar::new();
        jar.set("authToken", "admin.carehub.org", "a");
        jar.set("authToken", ".carehub.org", "b");
        assert_eq!(jar.len(), 2);
        assert_eq!(jar.names(), vec!["authToken".to_string()]);

        assert!(jar.expire("authToken", "admin.carehub.org"));
        assert!(!jar.expire("authToken", "admin.carehub.org"));
        assert_eq!(jar.get("authToken", ".carehub.org").as_deref(), Some("b"));
    }

    #[test]
    fn test_absorb_set_cookie_headers() {
        let jar = CookieJar::new();
        let mut headers = HeaderMap::new();
        headers.append(SET_COOKIE, HeaderValue::from_static("sessionId=xyz; Path=/; HttpOnly"));
        headers.append(
            SET_COOKIE,
            HeaderValue::from_static("lang=en; Domain=carehub.org; Path=/"),
        );
        jar.absorb("admin.carehub.org", &headers);

        assert_eq!(jar.get("sessionId", "admin.carehub.org").as_deref(), Some("xyz"));
        assert_eq!(jar.get("lang", ".carehub.org").as_deref(), Some("en"));

        let mut expire = HeaderMap::new();
        expire.append(SET_COOKIE, HeaderValue::from_static("sessionId=; Max-Age=0"));
        jar.absorb("admin.carehub.org", &expire);
        assert_eq!(jar.get("sessionId", "admin.carehub.org"), None);
    }

    #[test]
    fn test_header_for_matches_host_and_apex_only() {
        let jar = CookieJar::new();
        jar.set("a", "admin.carehub.org", "1");
        jar.set("b", ".carehub.org", "2");
        jar.set("c", "other.org", "3");

        let header = jar.header_for("admin.carehub.org").unwrap();
        assert_eq!(header.to_str().unwrap(), "a=1; b=2");
        assert!(jar.header_for("example.com").is_none());
    }
}
