//! Feedback form templates.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::id::{AdminId, ResourceId};
use super::status::{FormStatus, QuestionType};

/// A single question on a feedback form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackQuestion {
    pub prompt: String,
    #[serde(rename = "type")]
    pub kind: QuestionType,
    /// If set, only members with one of these roles see the question.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_roles: Option<Vec<String>>,
}

impl FeedbackQuestion {
    #[must_use]
    pub fn new(prompt: impl Into<String>, kind: QuestionType) -> Self {
        Self {
            prompt: prompt.into(),
            kind,
            target_roles: None,
        }
    }

    /// Whether a member with `role` should be asked this question.
    #[must_use]
    pub fn applies_to(&self, role: Option<&str>) -> bool {
        match (&self.target_roles, role) {
            (None, _) => true,
            (Some(roles), _) if roles.is_empty() => true,
            (Some(roles), Some(role)) => roles.iter().any(|r| r.eq_ignore_ascii_case(role)),
            (Some(_), None) => false,
        }
    }
}

/// A feedback form template built by an admin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormTemplate {
    /// Absent until the template has been saved once.
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ResourceId>,
    pub name: String,
    /// Admin who created the template.
    pub creator: AdminId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<ResourceId>,
    #[serde(default)]
    pub status: FormStatus,
    pub created_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub questions: Vec<FeedbackQuestion>,
}

impl FormTemplate {
    /// Start a new, unsaved template.
    #[must_use]
    pub fn draft(name: impl Into<String>, creator: AdminId, created_date: DateTime<Utc>) -> Self {
        Self {
            id: None,
            name: name.into(),
            creator,
            team_id: None,
            status: FormStatus::Created,
            created_date,
            completed_date: None,
            due_date: None,
            questions: Vec::new(),
        }
    }

    /// Questions visible to a member with the given role.
    pub fn questions_for_role<'a>(
        &'a self,
        role: Option<&'a str>,
    ) -> impl Iterator<Item = &'a FeedbackQuestion> + 'a {
        self.questions.iter().filter(move |q| q.applies_to(role))
    }
}
