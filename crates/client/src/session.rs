//! Per-tab session context.

use std::sync::Arc;

use secrecy::SecretString;
use tracing::{debug, info, instrument};

use hr_feedback_core::{AdminId, AdminIdentity, FormTemplate, ResourceId, Team};

use crate::access::{MemberAccessCode, generate_team_access_codes};
use crate::api::{ApiClient, ApiError};
use crate::auth::{AuthBackend, AuthError, AuthStore};
use crate::config::ClientConfig;
use crate::resources::{
    FormStore, ResourceBackend, StoreError, SyncReport, TeamStore, WritePolicy,
};
use crate::storage::{FileStorage, KeyValueStore, SessionKeys};

/// Remote endpoints used by one session.
#[derive(Clone)]
pub struct SessionBackends {
    pub auth: Arc<dyn AuthBackend>,
    pub teams: Arc<dyn ResourceBackend<Team>>,
    pub forms: Arc<dyn ResourceBackend<FormTemplate>>,
}

impl SessionBackends {
    /// Use the REST client for every endpoint.
    #[must_use]
    pub fn api(client: ApiClient) -> Self {
        let client = Arc::new(client);
        Self {
            auth: client.clone(),
            teams: client.clone(),
            forms: client,
        }
    }
}

/// A sent form and the access codes for its team's members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentForm {
    pub form: FormTemplate,
    /// Empty when the form has no team or the team is not cached.
    pub access_codes: Vec<MemberAccessCode>,
}

/// Everything one tab knows: who is logged in, plus that admin's teams and
/// form templates.
///
/// Sessions sharing a `local` store share cached teams and forms per admin,
/// but each `tab` store yields its own identity.
pub struct AdminSession {
    auth: AuthStore,
    teams: TeamStore,
    forms: FormStore,
}

impl std::fmt::Debug for AdminSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminSession")
            .field("auth", &self.auth)
            .field("teams", &self.teams)
            .field("forms", &self.forms)
            .finish()
    }
}

impl AdminSession {
    /// Build a session and restore any identity persisted for this tab.
    ///
    /// The stores are attached to a restored admin but not loaded; call
    /// [`restore`](Self::restore) for that.
    #[must_use]
    pub fn new(
        backends: SessionBackends,
        local: Arc<dyn KeyValueStore>,
        tab: Arc<dyn KeyValueStore>,
        team_policy: WritePolicy,
        form_policy: WritePolicy,
    ) -> Self {
        let auth = AuthStore::new(backends.auth, local.clone(), SessionKeys::new(tab));
        let teams = TeamStore::new(backends.teams, local.clone(), team_policy);
        let forms = FormStore::new(backends.forms, local, form_policy);
        let session = Self { auth, teams, forms };
        session.attach(session.auth.current_admin_id());
        session
    }

    /// Open the file-backed session described by `config`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Config` if the HTTP client cannot be built.
    pub fn open(config: &ClientConfig) -> Result<Self, ApiError> {
        let client = ApiClient::new(config)?;
        let local = Arc::new(FileStorage::new(config.local_storage_path()));
        let tab = Arc::new(FileStorage::new(config.tab_storage_path()));
        debug!(data_dir = %config.data_dir.display(), "Opening session");
        Ok(Self::new(
            SessionBackends::api(client),
            local,
            tab,
            config.team_write_policy,
            config.form_write_policy,
        ))
    }

    #[must_use]
    pub const fn auth(&self) -> &AuthStore {
        &self.auth
    }

    #[must_use]
    pub const fn teams(&self) -> &TeamStore {
        &self.teams
    }

    #[must_use]
    pub const fn forms(&self) -> &FormStore {
        &self.forms
    }

    #[must_use]
    pub fn current_admin(&self) -> Option<AdminIdentity> {
        self.auth.current_admin()
    }

    fn attach(&self, owner: Option<AdminId>) {
        self.teams.set_owner(owner.clone());
        self.forms.set_owner(owner);
    }

    async fn load_all(&self) {
        tokio::join!(self.teams.load_from_backend(), self.forms.load_from_backend());
    }

    /// Load teams and forms for the restored admin, if any.
    pub async fn restore(&self) {
        self.attach(self.auth.current_admin_id());
        self.load_all().await;
    }

    /// Log in and load the admin's teams and forms.
    ///
    /// # Errors
    ///
    /// See [`AuthStore::login`].
    #[instrument(skip(self, password))]
    pub async fn login(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<AdminIdentity, AuthError> {
        let admin = self.auth.login(email, password).await?;
        self.attach(Some(admin.id.clone()));
        self.load_all().await;
        Ok(admin)
    }

    /// Register, log in and load the (normally empty) teams and forms.
    ///
    /// # Errors
    ///
    /// See [`AuthStore::register`].
    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<AdminIdentity, AuthError> {
        let admin = self.auth.register(email, password).await?;
        self.attach(Some(admin.id.clone()));
        self.load_all().await;
        Ok(admin)
    }

    /// Log out and detach both stores.
    ///
    /// Cached teams and forms stay in local storage for the next login.
    pub fn logout(&self) {
        self.auth.logout();
        self.attach(None);
    }

    /// Mark a form as sent and issue an access code to each member of its
    /// team.
    ///
    /// # Errors
    ///
    /// See [`FormStore::send_form`].
    #[instrument(skip(self))]
    pub async fn send_form(&self, id: &ResourceId) -> Result<SentForm, StoreError> {
        let form = self.forms.send_form(id).await?;
        let access_codes = form
            .team_id
            .as_ref()
            .and_then(|team_id| self.teams.get_team_by_id(team_id))
            .map(|team| generate_team_access_codes(&team))
            .unwrap_or_default();
        debug!(codes = access_codes.len(), "Access codes issued");
        Ok(SentForm { form, access_codes })
    }

    /// Push pending teams, then pending forms.
    ///
    /// Forms assigned to an offline team follow it to its backend ID before
    /// they are pushed.
    ///
    /// # Errors
    ///
    /// See [`ResourceStore::sync_pending`](crate::resources::ResourceStore::sync_pending).
    pub async fn sync_pending(&self) -> Result<(SyncReport, SyncReport), StoreError> {
        let teams = self.teams.sync_pending().await?;
        for (temp, id) in &teams.replaced {
            let moved = self.forms.reassign_team(temp, id);
            if moved > 0 {
                debug!(temp = %temp, id = %id, forms = moved, "Forms moved to synced team");
            }
        }
        let forms = self.forms.sync_pending().await?;
        info!(
            teams = teams.synced,
            forms = forms.synced,
            failed = teams.failed + forms.failed,
            "Pending changes pushed"
        );
        Ok((teams, forms))
    }
}
