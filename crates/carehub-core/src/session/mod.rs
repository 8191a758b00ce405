//! Session persistence and teardown.
//!
//! This module provides:
//! - `SessionStore`: the `{token, user}` pair, never observable half-written
//! - `KeyValueStore` backends: `FileStore` (durable) and `MemoryStore` (volatile mirror)
//! - `CookieJar`: cookies the API hands out alongside the session
//! - `AuthTeardown`: erases every auth-related key, cookie and cached header
//! - `keys`: the central registry of auth-related storage keys
//!
//! A primary and a superuser session coexist under distinct key pairs and
//! are destroyed by the same teardown pass.

pub mod backend;
pub mod cookies;
pub mod keys;
pub mod store;
pub mod teardown;

pub use backend::{FileStore, KeyValueStore, MemoryStore, StoreError};
pub use cookies::CookieJar;
pub use keys::SessionScope;
pub use store::{Session, SessionStore};
pub use teardown::{AuthTeardown, TeardownReport};
