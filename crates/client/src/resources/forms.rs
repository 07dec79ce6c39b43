//! Form template store.

use async_trait::async_trait;
use tracing::{debug, instrument};

use hr_feedback_core::{AdminId, FormStatus, FormTemplate, ResourceId};

use super::{Resource, ResourceBackend, ResourceStore, StoreError};
use crate::api::{ApiClient, ApiError};
use crate::storage::FORMS_KEY;

/// Prefix of IDs given to templates the backend has not accepted yet.
pub const FORM_TEMP_PREFIX: &str = "temp_form_";

/// The current admin's form templates.
pub type FormStore = ResourceStore<FormTemplate>;

impl Resource for FormTemplate {
    const KIND: &'static str = "form template";
    const STORAGE_KEY: &'static str = FORMS_KEY;
    const TEMP_PREFIX: &'static str = FORM_TEMP_PREFIX;

    fn id(&self) -> Option<&ResourceId> {
        self.id.as_ref()
    }

    fn set_id(&mut self, id: ResourceId) {
        self.id = Some(id);
    }

    fn assign_owner(&mut self, owner: &AdminId) {
        self.creator = owner.clone();
    }
}

#[async_trait]
impl ResourceBackend<FormTemplate> for ApiClient {
    async fn list(&self, owner: &AdminId) -> Result<Vec<FormTemplate>, ApiError> {
        self.list_templates(owner).await
    }

    async fn create(&self, owner: &AdminId, record: &FormTemplate) -> Result<ResourceId, ApiError> {
        self.create_template(owner, record).await
    }

    async fn update(&self, record: &FormTemplate) -> Result<(), ApiError> {
        self.update_template(record).await
    }

    async fn delete(&self, id: &ResourceId) -> Result<(), ApiError> {
        self.delete_template(id).await
    }
}

impl ResourceStore<FormTemplate> {
    #[must_use]
    pub fn forms(&self) -> Vec<FormTemplate> {
        self.records()
    }

    /// Templates assigned to the given team.
    #[must_use]
    pub fn forms_for_team(&self, team_id: &ResourceId) -> Vec<FormTemplate> {
        self.records()
            .into_iter()
            .filter(|f| f.team_id.as_ref() == Some(team_id))
            .collect()
    }

    /// Create or update a template and return the stored copy.
    ///
    /// A template is created when it has no ID, or when its ID is not in the
    /// list; otherwise it is updated in place.
    ///
    /// # Errors
    ///
    /// See [`ResourceStore::create`] and [`ResourceStore::update`].
    #[instrument(skip_all, fields(name = %form.name))]
    pub async fn save_form(&self, form: FormTemplate) -> Result<FormTemplate, StoreError> {
        let existing = form.id.as_ref().filter(|id| self.get_by_id(id).is_some()).cloned();
        match existing {
            Some(id) => {
                self.update(form.clone()).await?;
                Ok(self.get_by_id(&id).unwrap_or(form))
            }
            None => self.create(FormTemplate { id: None, ..form }).await,
        }
    }

    /// Delete a template by ID.
    ///
    /// # Errors
    ///
    /// See [`ResourceStore::delete`].
    pub async fn delete_form(&self, id: &ResourceId) -> Result<(), StoreError> {
        self.delete(id).await
    }

    #[must_use]
    pub fn get_form_by_id(&self, id: &ResourceId) -> Option<FormTemplate> {
        self.get_by_id(id)
    }

    /// Point templates assigned to team `from` at team `to`.
    ///
    /// Used once an offline team has been given its backend ID. Templates
    /// the backend already knows are marked unsynced so the new team reaches
    /// it on the next sync. Returns the number of templates changed.
    pub fn reassign_team(&self, from: &ResourceId, to: &ResourceId) -> usize {
        self.rewrite_local(|form| {
            if form.team_id.as_ref() == Some(from) {
                form.team_id = Some(to.clone());
                true
            } else {
                false
            }
        })
    }

    /// Mark a template as sent to its team and save it.
    ///
    /// # Errors
    ///
    /// - `NotFound` if no template has this ID
    /// - anything [`ResourceStore::update`] returns
    #[instrument(skip(self))]
    pub async fn send_form(&self, id: &ResourceId) -> Result<FormTemplate, StoreError> {
        let mut form = self.get_by_id(id).ok_or_else(|| StoreError::NotFound {
            kind: FormTemplate::KIND,
            id: id.to_string(),
        })?;
        if form.status == FormStatus::Sent {
            debug!("Template already sent");
            return Ok(form);
        }
        form.status = FormStatus::Sent;
        self.update(form.clone()).await?;
        Ok(self.get_by_id(id).unwrap_or(form))
    }
}
