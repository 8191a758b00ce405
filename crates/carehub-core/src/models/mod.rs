//! Data models shared between the API client and the dashboard UI.
//!
//! Only the identity record lives here; domain payloads (orphans,
//! fundraisers, inventory) are opaque JSON to the core.

pub mod user;

pub use user::{DashboardStats, UserRecord, UserRole};
