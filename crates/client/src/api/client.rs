//! Feedback backend HTTP client.
//!
//! Every backend operation is a JSON `POST` to a concept/action path such as
//! `/api/OrgGraph/createTeam`. Failures carry the body's `error` field when
//! the backend provides one.

use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::error::ApiError;
use crate::config::ClientConfig;

/// Stateless client for the feedback backend.
#[derive(Clone)]
pub struct ApiClient {
    /// HTTP client.
    client: Client,
    /// Base URL without trailing slash.
    base_url: String,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a new client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Config` if the HTTP client fails to build.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ApiError::Config(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Base URL requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `POST` a JSON body to `path` and decode the JSON response.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Network` if the request fails, `ApiError::Status` on
    /// a non-2xx answer, `ApiError::Backend` if a 2xx body carries an `error`
    /// field, and `ApiError::InvalidResponse` if the body does not decode.
    #[instrument(skip(self, body), fields(base_url = %self.base_url))]
    pub(crate) async fn post<B, R>(&self, path: &str, body: &B) -> Result<R, ApiError>
    where
        B: Serialize + Sync + ?Sized,
        R: DeserializeOwned,
    {
        let response = self
            .client
            .post(format!("{}{path}", self.base_url))
            .json(body)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let value: Value = if text.trim().is_empty() {
            Value::Null
        } else {
            match serde_json::from_str(&text) {
                Ok(value) => value,
                Err(e) if status.is_success() => {
                    return Err(ApiError::InvalidResponse(e.to_string()));
                }
                Err(_) => Value::Null,
            }
        };

        if !status.is_success() {
            let message = error_field(&value);
            warn!(status = status.as_u16(), ?message, "Backend request failed");
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        if let Some(message) = error_field(&value) {
            warn!(%message, "Backend reported an error");
            return Err(ApiError::Backend(message));
        }

        debug!(status = status.as_u16(), "Backend request succeeded");

        serde_json::from_value(value).map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }
}

fn error_field(value: &Value) -> Option<String> {
    value
        .get("error")
        .and_then(Value::as_str)
        .map(ToString::to_string)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Debug, Deserialize)]
    struct Created {
        team: String,
    }

    async fn client_for(server: &MockServer) -> ApiClient {
        ApiClient::new(&ClientConfig::new(&server.uri()).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_post_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/OrgGraph/createTeam"))
            .and(body_json(json!({"name": "Eng"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"team": "t1"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let created: Created = client
            .post("/api/OrgGraph/createTeam", &json!({"name": "Eng"}))
            .await
            .unwrap();
        assert_eq!(created.team, "t1");
    }

    #[tokio::test]
    async fn test_post_error_status_carries_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({"error": "Email already registered"})),
            )
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client
            .post::<_, Value>("/api/HRAdmin/registerHRAdmin", &json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Status { status: 400, .. }));
        assert_eq!(err.backend_message(), Some("Email already registered"));
    }

    #[tokio::test]
    async fn test_post_error_status_without_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client
            .post::<_, Value>("/api/OrgGraph/_getTeamsByOwner", &json!({}))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ApiError::Status {
                status: 503,
                message: None
            }
        ));
    }

    #[tokio::test]
    async fn test_post_error_body_on_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"error": "Invalid password"})))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client
            .post::<_, Value>("/api/HRAdmin/authenticateHRAdmin", &json!({}))
            .await
            .unwrap_err();
        assert_eq!(err.backend_message(), Some("Invalid password"));
    }

    #[tokio::test]
    async fn test_post_empty_body_decodes_as_unit() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let result: Result<serde::de::IgnoredAny, _> =
            client.post("/api/OrgGraph/deleteTeam", &json!({"team": "t1"})).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_post_network_error() {
        // Nothing listens on the discard port.
        let config = ClientConfig::new("http://127.0.0.1:9").unwrap();
        let client = ApiClient::new(&config).unwrap();
        let err = client
            .post::<_, Value>("/api/OrgGraph/_getTeamsByOwner", &json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Network(_)));
    }
}
