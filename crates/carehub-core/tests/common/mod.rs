//! Shared fixtures for integration tests against a mock CareHub API.

#![allow(dead_code)]

use std::sync::Arc;

use carehub_core::api::{ApiClient, SessionInvalidated, SessionObserver};
use carehub_core::config::ClientConfig;
use carehub_core::models::{DashboardStats, UserRecord, UserRole};
use carehub_core::session::KeyValueStore;
use parking_lot::Mutex;

/// Observer that records invalidation events and reports a settable path.
pub struct RecordingObserver {
    path: Mutex<String>,
    events: Mutex<Vec<SessionInvalidated>>,
}

impl RecordingObserver {
    pub fn at(path: &str) -> Arc<Self> {
        Arc::new(Self {
            path: Mutex::new(path.to_string()),
            events: Mutex::new(Vec::new()),
        })
    }

    pub fn navigate(&self, path: &str) {
        *self.path.lock() = path.to_string();
    }

    pub fn events(&self) -> Vec<SessionInvalidated> {
        self.events.lock().clone()
    }

    pub fn redirects(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| e.redirect_to)
            .collect()
    }
}

impl SessionObserver for RecordingObserver {
    fn current_path(&self) -> String {
        self.path.lock().clone()
    }

    fn session_invalidated(&self, event: &SessionInvalidated) {
        self.events.lock().push(event.clone());
    }
}

pub fn user(email: &str) -> UserRecord {
    UserRecord {
        id: "64f1c2".to_string(),
        name: "Amina Yusuf".to_string(),
        email: email.to_string(),
        role: UserRole::Admin,
        branch: Some("Kano".to_string()),
        image_url: None,
        is_active: true,
        is_verified: true,
        dashboard_stats: DashboardStats::default(),
    }
}

pub fn user_json(email: &str) -> serde_json::Value {
    serde_json::to_value(user(email)).expect("user serializes")
}

pub fn client(base_url: &str, observer: Arc<RecordingObserver>) -> ApiClient {
    ApiClient::builder(ClientConfig::new(base_url))
        .observer(observer)
        .build()
        .expect("client builds")
}

pub fn client_with_store(
    base_url: &str,
    observer: Arc<RecordingObserver>,
    primary: Arc<dyn KeyValueStore>,
) -> ApiClient {
    ApiClient::builder(ClientConfig::new(base_url))
        .observer(observer)
        .primary_store(primary)
        .build()
        .expect("client builds")
}
