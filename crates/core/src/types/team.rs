//! Teams owned by an HR admin.

use serde::{Deserialize, Serialize};

use super::id::{AdminId, ResourceId};

/// A team member together with the role used to target questions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    /// Employee ID.
    pub member_id: String,
    /// Role such as "manager" or "developer".
    pub role: String,
    /// Employee email address.
    #[serde(default)]
    pub email: String,
}

/// A team (roster) managed by an admin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    #[serde(rename = "_id")]
    pub id: ResourceId,
    pub name: String,
    /// Admin who owns the team. Older cache entries may lack it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<AdminId>,
    /// Member emails or employee IDs, in the order they were entered.
    #[serde(default)]
    pub members: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub members_with_roles: Option<Vec<TeamMember>>,
}

impl Team {
    /// Start a team that has no identifier yet.
    ///
    /// The empty ID is replaced by the store on creation.
    #[must_use]
    pub fn draft(name: impl Into<String>, members: Vec<String>) -> Self {
        Self {
            id: ResourceId::new(""),
            name: name.into(),
            owner: None,
            members,
            members_with_roles: None,
        }
    }

    /// Start a team from members with roles.
    ///
    /// The plain member list is derived from the members' emails, falling back
    /// to their IDs.
    #[must_use]
    pub fn draft_with_roles(name: impl Into<String>, members: Vec<TeamMember>) -> Self {
        let plain = members
            .iter()
            .map(|m| {
                if m.email.is_empty() {
                    m.member_id.clone()
                } else {
                    m.email.clone()
                }
            })
            .collect();
        Self {
            members_with_roles: Some(members),
            ..Self::draft(name, plain)
        }
    }

    /// Role of the given member, if roles are tracked for this team.
    #[must_use]
    pub fn role_of(&self, member_id: &str) -> Option<&str> {
        self.members_with_roles
            .as_deref()?
            .iter()
            .find(|m| m.member_id == member_id || m.email == member_id)
            .map(|m| m.role.as_str())
    }
}
