//! `OrgGraph` concept endpoints (teams).

use serde::{Deserialize, Serialize};
use serde::de::IgnoredAny;
use tracing::{debug, instrument};

use hr_feedback_core::{AdminId, ResourceId, Team, TeamMember};

use super::client::ApiClient;
use super::error::ApiError;

#[derive(Serialize)]
struct OwnerRequest<'a> {
    owner: &'a AdminId,
}

#[derive(Deserialize)]
struct TeamsResponse {
    #[serde(default)]
    teams: Vec<Team>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateTeamRequest<'a> {
    owner: &'a AdminId,
    name: &'a str,
    members: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    members_with_roles: Option<&'a [TeamMember]>,
}

#[derive(Deserialize)]
struct CreateTeamResponse {
    team: ResourceId,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateTeamRequest<'a> {
    team: &'a ResourceId,
    name: &'a str,
    members: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    members_with_roles: Option<&'a [TeamMember]>,
}

#[derive(Serialize)]
struct TeamIdRequest<'a> {
    team: &'a ResourceId,
}

impl ApiClient {
    /// List the teams owned by an admin.
    ///
    /// Teams without an `owner` field are attributed to `owner`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self), fields(owner = %owner))]
    pub async fn list_teams(&self, owner: &AdminId) -> Result<Vec<Team>, ApiError> {
        let response: TeamsResponse = self
            .post("/api/OrgGraph/_getTeamsByOwner", &OwnerRequest { owner })
            .await?;

        let teams: Vec<Team> = response
            .teams
            .into_iter()
            .map(|mut team| {
                team.owner.get_or_insert_with(|| owner.clone());
                team
            })
            .collect();
        debug!(count = teams.len(), "Fetched teams");
        Ok(teams)
    }

    /// Create a team and return its backend-issued ID.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self, team), fields(owner = %owner, name = %team.name))]
    pub async fn create_team(&self, owner: &AdminId, team: &Team) -> Result<ResourceId, ApiError> {
        let response: CreateTeamResponse = self
            .post(
                "/api/OrgGraph/createTeam",
                &CreateTeamRequest {
                    owner,
                    name: &team.name,
                    members: &team.members,
                    members_with_roles: team.members_with_roles.as_deref(),
                },
            )
            .await?;
        Ok(response.team)
    }

    /// Replace a team's name and members.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self, team), fields(team_id = %team.id))]
    pub async fn update_team(&self, team: &Team) -> Result<(), ApiError> {
        let _: IgnoredAny = self
            .post(
                "/api/OrgGraph/updateTeam",
                &UpdateTeamRequest {
                    team: &team.id,
                    name: &team.name,
                    members: &team.members,
                    members_with_roles: team.members_with_roles.as_deref(),
                },
            )
            .await?;
        Ok(())
    }

    /// Delete a team.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self), fields(team_id = %team_id))]
    pub async fn delete_team(&self, team_id: &ResourceId) -> Result<(), ApiError> {
        let _: IgnoredAny = self
            .post("/api/OrgGraph/deleteTeam", &TeamIdRequest { team: team_id })
            .await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_list_teams_fills_owner() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/OrgGraph/_getTeamsByOwner"))
            .and(body_json(json!({"owner": "a1"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "teams": [
                    {"_id": "t1", "name": "Eng", "members": ["e1@x.com"]},
                    {"_id": "t2", "name": "Ops", "owner": "a1", "members": []}
                ]
            })))
            .mount(&server)
            .await;

        let client = ApiClient::new(&ClientConfig::new(&server.uri()).unwrap()).unwrap();
        let teams = client.list_teams(&AdminId::new("a1")).await.unwrap();
        assert_eq!(teams.len(), 2);
        assert!(teams.iter().all(|t| t.owner == Some(AdminId::new("a1"))));
    }

    #[tokio::test]
    async fn test_create_team_request_shape() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/OrgGraph/createTeam"))
            .and(body_json(json!({
                "owner": "a1",
                "name": "Eng",
                "members": ["e1@x.com"]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"team": "t9"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::new(&ClientConfig::new(&server.uri()).unwrap()).unwrap();
        let id = client
            .create_team(
                &AdminId::new("a1"),
                &Team::draft("Eng", vec!["e1@x.com".to_owned()]),
            )
            .await
            .unwrap();
        assert_eq!(id, ResourceId::new("t9"));
    }
}
