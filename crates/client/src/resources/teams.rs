//! Team store.

use async_trait::async_trait;
use tracing::instrument;

use hr_feedback_core::{AdminId, ResourceId, Team, TeamMember};

use super::{Resource, ResourceBackend, ResourceStore, StoreError};
use crate::api::{ApiClient, ApiError};
use crate::storage::TEAMS_KEY;

/// Prefix of IDs given to teams the backend has not accepted yet.
pub const TEAM_TEMP_PREFIX: &str = "temp_team_";

/// The current admin's teams.
pub type TeamStore = ResourceStore<Team>;

impl Resource for Team {
    const KIND: &'static str = "team";
    const STORAGE_KEY: &'static str = TEAMS_KEY;
    const TEMP_PREFIX: &'static str = TEAM_TEMP_PREFIX;

    fn id(&self) -> Option<&ResourceId> {
        (!self.id.as_str().is_empty()).then_some(&self.id)
    }

    fn set_id(&mut self, id: ResourceId) {
        self.id = id;
    }

    fn assign_owner(&mut self, owner: &AdminId) {
        self.owner = Some(owner.clone());
    }
}

#[async_trait]
impl ResourceBackend<Team> for ApiClient {
    async fn list(&self, owner: &AdminId) -> Result<Vec<Team>, ApiError> {
        self.list_teams(owner).await
    }

    async fn create(&self, owner: &AdminId, record: &Team) -> Result<ResourceId, ApiError> {
        self.create_team(owner, record).await
    }

    async fn update(&self, record: &Team) -> Result<(), ApiError> {
        self.update_team(record).await
    }

    async fn delete(&self, id: &ResourceId) -> Result<(), ApiError> {
        self.delete_team(id).await
    }
}

impl ResourceStore<Team> {
    /// Snapshot of the current team list.
    #[must_use]
    pub fn teams(&self) -> Vec<Team> {
        self.records()
    }

    /// Create a team from plain member emails.
    ///
    /// # Errors
    ///
    /// See [`ResourceStore::create`].
    #[instrument(skip(self, members), fields(members = members.len()))]
    pub async fn create_team(&self, name: &str, members: Vec<String>) -> Result<Team, StoreError> {
        self.create(Team::draft(name.trim(), members)).await
    }

    /// Create a team whose members carry roles.
    ///
    /// # Errors
    ///
    /// See [`ResourceStore::create`].
    #[instrument(skip(self, members), fields(members = members.len()))]
    pub async fn create_team_with_roles(
        &self,
        name: &str,
        members: Vec<TeamMember>,
    ) -> Result<Team, StoreError> {
        self.create(Team::draft_with_roles(name.trim(), members)).await
    }

    /// Replace a team by ID.
    ///
    /// # Errors
    ///
    /// See [`ResourceStore::update`].
    pub async fn update_team(&self, team: Team) -> Result<(), StoreError> {
        self.update(team).await
    }

    /// Delete a team by ID.
    ///
    /// # Errors
    ///
    /// See [`ResourceStore::delete`].
    pub async fn delete_team(&self, id: &ResourceId) -> Result<(), StoreError> {
        self.delete(id).await
    }

    #[must_use]
    pub fn get_team_by_id(&self, id: &ResourceId) -> Option<Team> {
        self.get_by_id(id)
    }
}
