//! `HRAdmin` concept endpoints.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use hr_feedback_core::{AdminId, AdminIdentity, Email};

use super::client::ApiClient;
use super::error::ApiError;

#[derive(Serialize)]
struct CredentialsRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AdminIdResponse {
    hr_admin: AdminId,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GetAdminRequest<'a> {
    hr_admin_id: &'a AdminId,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GetAdminResponse {
    hr_admin_data: AdminIdentity,
}

impl ApiClient {
    /// Register a new admin and return its ID.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the backend rejects the registration or is unreachable.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn register_admin(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<AdminId, ApiError> {
        let response: AdminIdResponse = self
            .post(
                "/api/HRAdmin/registerHRAdmin",
                &CredentialsRequest {
                    email: email.as_str(),
                    password: password.expose_secret(),
                },
            )
            .await?;
        Ok(response.hr_admin)
    }

    /// Check credentials and return the admin's ID.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the credentials are rejected or the backend is unreachable.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn authenticate_admin(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<AdminId, ApiError> {
        let response: AdminIdResponse = self
            .post(
                "/api/HRAdmin/authenticateHRAdmin",
                &CredentialsRequest {
                    email: email.as_str(),
                    password: password.expose_secret(),
                },
            )
            .await?;
        Ok(response.hr_admin)
    }

    /// Fetch an admin's identity by ID.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the admin does not exist or the backend is unreachable.
    #[instrument(skip(self), fields(admin_id = %admin_id))]
    pub async fn get_admin(&self, admin_id: &AdminId) -> Result<AdminIdentity, ApiError> {
        let response: GetAdminResponse = self
            .post(
                "/api/HRAdmin/_getHRAdmin",
                &GetAdminRequest {
                    hr_admin_id: admin_id,
                },
            )
            .await?;
        Ok(response.hr_admin_data)
    }
}
