//! Storage key layout and session key derivation.

use std::sync::Arc;

use rand::seq::IndexedRandom;
use tracing::warn;

use hr_feedback_core::AdminId;

use super::{KeyValueStore, StorageError};

/// Tab-scoped key holding the session identifier.
pub const SESSION_ID_KEY: &str = "hrSessionId";
/// Persisted identity (full JSON), namespaced by session.
pub const CURRENT_ADMIN_KEY: &str = "hrCurrentAdmin";
/// Persisted admin ID, namespaced by session.
pub const ADMIN_ID_KEY: &str = "hrAdminId";
/// Persisted admin email, namespaced by session.
pub const ADMIN_EMAIL_KEY: &str = "hrAdminEmail";
/// Cached team list, namespaced by admin.
pub const TEAMS_KEY: &str = "hrTeams";
/// Cached form-template list, namespaced by admin.
pub const FORMS_KEY: &str = "hr_feedback_forms";

const SESSION_SUFFIX_LEN: usize = 9;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Key of an admin-scoped entry: `base_adminId`.
#[must_use]
pub fn admin_key(base: &str, admin: &AdminId) -> String {
    format!("{base}_{admin}")
}

/// Derives per-tab storage keys from the session identifier kept in the
/// tab-scoped store.
#[derive(Clone)]
pub struct SessionKeys {
    tab: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for SessionKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionKeys").finish_non_exhaustive()
    }
}

impl SessionKeys {
    #[must_use]
    pub fn new(tab: Arc<dyn KeyValueStore>) -> Self {
        Self { tab }
    }

    /// The identifier of this tab, created and persisted on first access.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the tab store cannot be read or written.
    pub fn session_id(&self) -> Result<String, StorageError> {
        if let Some(existing) = self.tab.get(SESSION_ID_KEY)?.filter(|id| !id.is_empty()) {
            return Ok(existing);
        }
        let id = generate_session_id();
        self.tab.set(SESSION_ID_KEY, &id)?;
        Ok(id)
    }

    /// `base_sessionId`, or `base` unchanged if no session identifier is
    /// available.
    #[must_use]
    pub fn session_key(&self, base: &str) -> String {
        match self.session_id() {
            Ok(id) => format!("{base}_{id}"),
            Err(e) => {
                warn!(error = %e, base, "Tab storage unavailable, using shared key");
                base.to_owned()
            }
        }
    }
}

fn generate_session_id() -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..SESSION_SUFFIX_LEN)
        .filter_map(|_| BASE36.choose(&mut rng).copied().map(char::from))
        .collect();
    format!(
        "session_{}_{suffix}",
        chrono::Utc::now().timestamp_millis()
    )
}
