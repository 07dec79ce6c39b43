//! `FormTemplate` concept endpoints.

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use hr_feedback_core::{AdminId, FeedbackQuestion, FormStatus, FormTemplate, ResourceId};

use super::client::ApiClient;
use super::error::ApiError;

#[derive(Serialize)]
struct CreatorRequest<'a> {
    creator: &'a AdminId,
}

#[derive(Deserialize)]
struct TemplatesResponse {
    #[serde(default)]
    templates: Vec<FormTemplate>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateTemplateRequest<'a> {
    creator: &'a AdminId,
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    team_id: Option<&'a ResourceId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    due_date: Option<NaiveDate>,
    questions: &'a [FeedbackQuestion],
}

#[derive(Deserialize)]
struct CreateTemplateResponse {
    template: ResourceId,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateTemplateRequest<'a> {
    template: &'a ResourceId,
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    team_id: Option<&'a ResourceId>,
    status: FormStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    due_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    completed_date: Option<DateTime<Utc>>,
    questions: &'a [FeedbackQuestion],
}

#[derive(Serialize)]
struct TemplateIdRequest<'a> {
    template: &'a ResourceId,
}

impl ApiClient {
    /// List the form templates created by an admin.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self), fields(creator = %creator))]
    pub async fn list_templates(&self, creator: &AdminId) -> Result<Vec<FormTemplate>, ApiError> {
        let response: TemplatesResponse = self
            .post(
                "/api/FormTemplate/_getTemplatesByCreator",
                &CreatorRequest { creator },
            )
            .await?;
        debug!(count = response.templates.len(), "Fetched form templates");
        Ok(response.templates)
    }

    /// Create a template and return its backend-issued ID.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self, form), fields(creator = %creator, name = %form.name))]
    pub async fn create_template(
        &self,
        creator: &AdminId,
        form: &FormTemplate,
    ) -> Result<ResourceId, ApiError> {
        let response: CreateTemplateResponse = self
            .post(
                "/api/FormTemplate/createTemplate",
                &CreateTemplateRequest {
                    creator,
                    name: &form.name,
                    team_id: form.team_id.as_ref(),
                    due_date: form.due_date,
                    questions: &form.questions,
                },
            )
            .await?;
        Ok(response.template)
    }

    /// Replace a saved template's fields.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidResponse` if the form was never saved, or
    /// another `ApiError` if the request fails.
    #[instrument(skip(self, form), fields(template_id = ?form.id))]
    pub async fn update_template(&self, form: &FormTemplate) -> Result<(), ApiError> {
        let template = form
            .id
            .as_ref()
            .ok_or_else(|| ApiError::InvalidResponse("form template has no id".to_string()))?;
        let _: IgnoredAny = self
            .post(
                "/api/FormTemplate/updateTemplate",
                &UpdateTemplateRequest {
                    template,
                    name: &form.name,
                    team_id: form.team_id.as_ref(),
                    status: form.status,
                    due_date: form.due_date,
                    completed_date: form.completed_date,
                    questions: &form.questions,
                },
            )
            .await?;
        Ok(())
    }

    /// Delete a template.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self), fields(template_id = %template_id))]
    pub async fn delete_template(&self, template_id: &ResourceId) -> Result<(), ApiError> {
        let _: IgnoredAny = self
            .post(
                "/api/FormTemplate/deleteTemplate",
                &TemplateIdRequest {
                    template: template_id,
                },
            )
            .await?;
        Ok(())
    }
}
