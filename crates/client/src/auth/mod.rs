//! Auth identity store.
//!
//! Holds "who is logged in" for one session. The identity is persisted in the
//! shared local store under session-namespaced keys, so it survives reloads
//! of the same tab while two tabs (or two admins on one machine) never see
//! each other's identity.

mod error;

pub use error::{AuthError, INVALID_CREDENTIALS, REGISTRATION_FAILED};

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use hr_feedback_core::{AdminId, AdminIdentity, Email};

use crate::api::{ApiClient, ApiError};
use crate::storage::{
    ADMIN_EMAIL_KEY, ADMIN_ID_KEY, CURRENT_ADMIN_KEY, Decoded, KeyValueStore, SessionKeys,
    read_json,
};

/// Backend operations the auth store depends on.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    async fn register(&self, email: &Email, password: &SecretString) -> Result<AdminId, ApiError>;
    async fn authenticate(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<AdminId, ApiError>;
    async fn fetch_admin(&self, id: &AdminId) -> Result<AdminIdentity, ApiError>;
}

#[async_trait]
impl AuthBackend for ApiClient {
    async fn register(&self, email: &Email, password: &SecretString) -> Result<AdminId, ApiError> {
        self.register_admin(email, password).await
    }

    async fn authenticate(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<AdminId, ApiError> {
        self.authenticate_admin(email, password).await
    }

    async fn fetch_admin(&self, id: &AdminId) -> Result<AdminIdentity, ApiError> {
        self.get_admin(id).await
    }
}

/// Persisted identity as read back from storage, before validation.
#[derive(Deserialize)]
struct PersistedAdmin {
    #[serde(rename = "_id", default)]
    id: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

impl PersistedAdmin {
    fn validate(self) -> Option<AdminIdentity> {
        let id = self.id.filter(|id| !id.trim().is_empty())?;
        let email = Email::parse(self.email.as_deref()?).ok()?;
        Some(AdminIdentity::new(AdminId::new(id), email))
    }
}

/// Single source of truth for the authenticated admin of one session.
pub struct AuthStore {
    backend: Arc<dyn AuthBackend>,
    local: Arc<dyn KeyValueStore>,
    keys: SessionKeys,
    current: Mutex<Option<AdminIdentity>>,
}

impl std::fmt::Debug for AuthStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthStore")
            .field("current", &self.current_admin())
            .finish_non_exhaustive()
    }
}

impl AuthStore {
    /// Create the store and restore any identity persisted for this session.
    ///
    /// A persisted identity that is malformed (missing id or email) or not
    /// valid JSON is discarded and its keys are cleared.
    #[must_use]
    pub fn new(
        backend: Arc<dyn AuthBackend>,
        local: Arc<dyn KeyValueStore>,
        keys: SessionKeys,
    ) -> Self {
        let store = Self {
            backend,
            local,
            keys,
            current: Mutex::new(None),
        };
        let restored = store.load_persisted();
        *store.lock() = restored;
        store
    }

    /// The logged-in admin, if any.
    #[must_use]
    pub fn current_admin(&self) -> Option<AdminIdentity> {
        self.lock().clone()
    }

    /// ID of the logged-in admin, if any.
    #[must_use]
    pub fn current_admin_id(&self) -> Option<AdminId> {
        self.lock().as_ref().map(|admin| admin.id.clone())
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.lock().is_some()
    }

    /// Register a new admin, then log them in.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidInput` for a malformed email or empty
    /// password, and `AuthError::Rejected` with the backend's message (or a
    /// generic one) if registration fails.
    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<AdminIdentity, AuthError> {
        let email = validate_credentials(email, password)?;

        let identity = async {
            let id = self.backend.register(&email, password).await?;
            self.backend.fetch_admin(&id).await
        }
        .await
        .map_err(|e| rejected(&e, REGISTRATION_FAILED))?;

        info!(admin_id = %identity.id, "Admin registered");
        self.establish(identity.clone());
        Ok(identity)
    }

    /// Log an admin in.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidInput` for a malformed email or empty
    /// password, and `AuthError::Rejected` with the backend's message (or
    /// "Invalid email or password.") if authentication fails.
    #[instrument(skip(self, password))]
    pub async fn login(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<AdminIdentity, AuthError> {
        let email = validate_credentials(email, password)?;

        let identity = async {
            let id = self.backend.authenticate(&email, password).await?;
            self.backend.fetch_admin(&id).await
        }
        .await
        .map_err(|e| rejected(&e, INVALID_CREDENTIALS))?;

        info!(admin_id = %identity.id, "Admin logged in");
        self.establish(identity.clone());
        Ok(identity)
    }

    /// Forget the current admin and every persisted identity key of this session.
    pub fn logout(&self) {
        *self.lock() = None;
        self.clear_persisted();
        info!("Admin logged out");
    }

    fn establish(&self, identity: AdminIdentity) {
        self.persist(&identity);
        *self.lock() = Some(identity);
    }

    fn persist(&self, identity: &AdminIdentity) {
        let full = match serde_json::to_string(identity) {
            Ok(full) => full,
            Err(e) => {
                warn!(error = %e, "Could not encode admin identity");
                return;
            }
        };
        let entries = [
            (self.keys.session_key(CURRENT_ADMIN_KEY), full),
            (
                self.keys.session_key(ADMIN_ID_KEY),
                identity.id.to_string(),
            ),
            (
                self.keys.session_key(ADMIN_EMAIL_KEY),
                identity.email.to_string(),
            ),
        ];
        if let Err(e) = self.local.set_many(&entries) {
            warn!(error = %e, "Could not persist admin identity; it will not survive a reload");
        }
    }

    fn load_persisted(&self) -> Option<AdminIdentity> {
        let key = self.keys.session_key(CURRENT_ADMIN_KEY);
        match read_json::<PersistedAdmin>(self.local.as_ref(), &key) {
            Decoded::Value(persisted) => {
                if let Some(identity) = persisted.validate() {
                    debug!(admin_id = %identity.id, "Restored admin identity");
                    return Some(identity);
                }
                warn!("Persisted admin identity is incomplete, discarding");
            }
            Decoded::Corrupt(reason) => {
                warn!(%reason, "Persisted admin identity is corrupt, discarding");
            }
            Decoded::Missing => {
                if !self.has_stray_identity_keys() {
                    return None;
                }
                warn!("Partial admin identity found, discarding");
            }
        }
        self.clear_persisted();
        None
    }

    fn has_stray_identity_keys(&self) -> bool {
        [ADMIN_ID_KEY, ADMIN_EMAIL_KEY].iter().any(|base| {
            matches!(self.local.get(&self.keys.session_key(base)), Ok(Some(_)))
        })
    }

    fn clear_persisted(&self) {
        let keys = [CURRENT_ADMIN_KEY, ADMIN_ID_KEY, ADMIN_EMAIL_KEY]
            .map(|base| self.keys.session_key(base));
        if let Err(e) = self.local.remove_many(&keys) {
            warn!(error = %e, "Could not clear persisted admin identity");
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<AdminIdentity>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn validate_credentials(email: &str, password: &SecretString) -> Result<Email, AuthError> {
    let email = Email::parse(email)?;
    if password.expose_secret().is_empty() {
        return Err(AuthError::InvalidInput("Password cannot be empty.".to_string()));
    }
    Ok(email)
}

fn rejected(error: &ApiError, fallback: &str) -> AuthError {
    warn!(error = %error, "Authentication request failed");
    AuthError::Rejected(
        error
            .backend_message()
            .map_or_else(|| fallback.to_string(), ToString::to_string),
    )
}
