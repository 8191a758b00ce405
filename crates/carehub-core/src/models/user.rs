use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity and profile of the logged-in account.
///
/// Owned by the session store. The UI reads it but never mutates it;
/// profile-update flows replace it wholesale through
/// [`SessionStore::update_user`](crate::session::SessionStore::update_user).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct UserRecord {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    #[cfg_attr(feature = "ts", ts(type = "string"))]
    pub role: UserRole,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_verified: bool,
    /// Snapshot taken at login time; not refreshed by the core.
    #[serde(default)]
    pub dashboard_stats: DashboardStats,
}

fn default_true() -> bool {
    true
}

impl UserRecord {
    pub fn is_admin(&self) -> bool {
        matches!(self.role, UserRole::Admin)
    }

    /// Name plus branch, e.g. "Amina Yusuf (Kano)".
    pub fn display_name(&self) -> String {
        match self.branch.as_deref() {
            Some(branch) if !branch.is_empty() => format!("{} ({})", self.name, branch),
            _ => self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum UserRole {
    Admin,
    Manager,
    #[default]
    Staff,
    Volunteer,
    /// Roles the backend added after this client was built.
    Other(String),
}

impl UserRole {
    pub fn as_str(&self) -> &str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Manager => "manager",
            UserRole::Staff => "staff",
            UserRole::Volunteer => "volunteer",
            UserRole::Other(s) => s,
        }
    }
}

impl From<String> for UserRole {
    fn from(s: String) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "admin" => UserRole::Admin,
            "manager" => UserRole::Manager,
            "staff" => UserRole::Staff,
            "volunteer" => UserRole::Volunteer,
            _ => UserRole::Other(s),
        }
    }
}

impl From<UserRole> for String {
    fn from(role: UserRole) -> Self {
        role.as_str().to_string()
    }
}

/// Denormalized dashboard counters captured with the login response.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct DashboardStats {
    #[serde(default)]
    pub total_orphans: u32,
    #[serde(default)]
    pub active_fundraisers: u32,
    #[serde(default)]
    pub inventory_items: u32,
    #[serde(default)]
    pub volunteers: u32,
    #[serde(default)]
    #[cfg_attr(feature = "ts", ts(type = "string | null"))]
    pub captured_at: Option<DateTime<Utc>>,
}
