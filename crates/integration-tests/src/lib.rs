//! Integration tests for the HR feedback client.
//!
//! Every test runs the real [`ApiClient`] against a `wiremock` server that
//! plays the feedback backend, so no backend needs to be running.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p hr-feedback-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `sessions` - identity persistence and tab isolation
//! - `teams` - team cache, offline fallback and concurrency
//! - `forms` - form template round trips and strict writes
//! - `file_storage` - sessions persisted to disk

#![allow(clippy::missing_panics_doc, clippy::expect_used)]

use std::sync::Arc;

use serde_json::{Value, json};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use hr_feedback_client::{
    AdminSession, ApiClient, ClientConfig, KeyValueStore, MemoryStorage, SessionBackends,
    WritePolicy,
};

/// A mock backend plus the local store shared by every tab of one "browser".
pub struct TestContext {
    pub server: MockServer,
    pub local: MemoryStorage,
}

impl TestContext {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
            local: MemoryStorage::new(),
        }
    }

    pub fn config(&self) -> ClientConfig {
        ClientConfig::new(&self.server.uri()).expect("mock server URI is valid")
    }

    pub fn api(&self) -> ApiClient {
        ApiClient::new(&self.config()).expect("failed to create client")
    }

    /// A session for the given tab, sharing this context's local store.
    pub fn session(&self, tab: &MemoryStorage) -> AdminSession {
        AdminSession::new(
            SessionBackends::api(self.api()),
            Arc::new(self.local.clone()),
            Arc::new(tab.clone()),
            WritePolicy::Optimistic,
            WritePolicy::Strict,
        )
    }

    pub fn local_store(&self) -> Arc<dyn KeyValueStore> {
        Arc::new(self.local.clone())
    }

    /// Read and parse a raw local-storage entry.
    pub fn cached(&self, key: &str) -> Option<Value> {
        self.local
            .get(key)
            .expect("memory storage never fails")
            .map(|raw| serde_json::from_str(&raw).expect("cache holds JSON"))
    }

    /// Accept `email`/`password` as admin `id`.
    pub async fn mount_admin(&self, id: &str, email: &str, password: &str) {
        Mock::given(method("POST"))
            .and(path("/api/HRAdmin/authenticateHRAdmin"))
            .and(body_partial_json(json!({ "email": email, "password": password })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "hrAdmin": id })))
            .mount(&self.server)
            .await;

        Mock::given(method("POST"))
            .and(path("/api/HRAdmin/_getHRAdmin"))
            .and(body_partial_json(json!({ "hrAdminId": id })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "hrAdminData": { "_id": id, "email": email } })),
            )
            .mount(&self.server)
            .await;
    }

    /// Serve `teams` as the team list of `owner`.
    pub async fn mount_teams(&self, owner: &str, teams: Value) {
        Mock::given(method("POST"))
            .and(path("/api/OrgGraph/_getTeamsByOwner"))
            .and(body_partial_json(json!({ "owner": owner })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "teams": teams })))
            .mount(&self.server)
            .await;
    }

    /// Serve `templates` as the form list of `creator`.
    pub async fn mount_forms(&self, creator: &str, templates: Value) {
        Mock::given(method("POST"))
            .and(path("/api/FormTemplate/_getTemplatesByCreator"))
            .and(body_partial_json(json!({ "creator": creator })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "templates": templates })),
            )
            .mount(&self.server)
            .await;
    }
}
