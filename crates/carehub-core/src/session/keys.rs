//! Registry of auth-related storage keys.
//!
//! Login writes and teardown erases exactly these names, in declaration
//! order. Cookies are matched more loosely because the backend and third
//! party widgets name them freely.

use std::net::IpAddr;

use serde::{Deserialize, Serialize};

pub const TOKEN_KEY: &str = "token";
pub const USER_KEY: &str = "user";
pub const SUPERUSER_TOKEN_KEY: &str = "superuserToken";
pub const SUPERUSER_USER_KEY: &str = "superuserUser";

/// Keys older dashboard builds and the login page leave behind.
pub const AUXILIARY_KEYS: &[&str] = &[
    "authToken",
    "userData",
    "session",
    "refreshToken",
    "superuserSession",
];

/// Case-insensitive name fragments that mark a cookie as auth-related.
const COOKIE_FRAGMENTS: &[&str] = &["auth", "token", "user", "session"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionScope {
    Primary,
    Superuser,
}

impl SessionScope {
    pub const ALL: [SessionScope; 2] = [SessionScope::Primary, SessionScope::Superuser];

    pub fn token_key(self) -> &'static str {
        match self {
            SessionScope::Primary => TOKEN_KEY,
            SessionScope::Superuser => SUPERUSER_TOKEN_KEY,
        }
    }

    pub fn user_key(self) -> &'static str {
        match self {
            SessionScope::Primary => USER_KEY,
            SessionScope::Superuser => SUPERUSER_USER_KEY,
        }
    }
}

/// Every registered key: scope token/user pairs first, then auxiliaries.
pub fn all() -> impl Iterator<Item = &'static str> {
    SessionScope::ALL
        .into_iter()
        .flat_map(|scope| [scope.token_key(), scope.user_key()])
        .chain(AUXILIARY_KEYS.iter().copied())
}

pub fn is_registered(key: &str) -> bool {
    all().any(|k| k == key)
}

pub fn is_auth_cookie(name: &str) -> bool {
    if is_registered(name) {
        return true;
    }
    let lower = name.to_ascii_lowercase();
    COOKIE_FRAGMENTS.iter().any(|fragment| lower.contains(fragment))
}

/// Registrable parent of a host, in cookie-domain form: `admin.carehub.org`
/// becomes `.carehub.org`. IP literals and single-label hosts have none.
pub fn apex_domain(host: &str) -> Option<String> {
    let host = host.trim_start_matches('.').to_ascii_lowercase();
    if host.parse::<IpAddr>().is_ok() {
        return None;
    }
    let labels: Vec<&str> = host.split('.').filter(|l| !l.is_empty()).collect();
    if labels.len() < 2 {
        return None;
    }
    Some(format!(".{}", labels[labels.len() - 2..].join(".")))
}
