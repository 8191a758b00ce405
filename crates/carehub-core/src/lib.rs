//! Core library for the CareHub administrative dashboard.
//!
//! Every domain service (auth, orphans, inventory, fundraisers, volunteers,
//! reports) talks to the remote REST API through the [`ApiClient`] defined
//! here. The client owns the session plumbing:
//!
//! - `session`: the persisted `{token, user}` pair, its storage backends,
//!   the auth key registry and the teardown that erases all of it
//! - `api`: request decoration, response classification and the transport
//! - `auth`: login/logout flows that establish and destroy sessions
//! - `models`: user identity records shared with the dashboard UI

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod session;

pub use api::{ApiClient, ApiError, ErrorKind, RequestBody, SessionInvalidated, SessionObserver};
pub use auth::AuthService;
pub use config::{AppConfig, ClientConfig};
pub use models::{DashboardStats, UserRecord, UserRole};
pub use session::{Session, SessionScope, SessionStore};
