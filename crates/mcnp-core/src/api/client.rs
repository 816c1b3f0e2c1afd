use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use super::{ApiError, ProfileFormApi};
use crate::models::{ProfileFormData, WireFormData};

const PROFILE_FORM_PATH: &str = "/wp-json/mcnp/v1/profile-form";

#[derive(Debug, Deserialize)]
struct CompletionStatusResponse {
    #[serde(default)]
    completed: bool,
}

#[derive(Debug, Serialize)]
struct SaveFormRequest<'a> {
    user_id: &'a str,
    data: WireFormData,
    completed: bool,
}

#[derive(Debug, Deserialize)]
struct SaveFormResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: Option<String>,
}

/// HTTP client for the association backend (bearer-token JSON)
pub struct BackendClient {
    base_url: String,
    token: RwLock<Option<String>>,
    client: reqwest::Client,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: RwLock::new(None),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_token(self, token: impl Into<String>) -> Self {
        self.set_token(Some(token.into()));
        self
    }

    /// Replace the bearer token (None on logout)
    pub fn set_token(&self, token: Option<String>) {
        *self.token.write() = token;
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn bearer(&self) -> Result<String, ApiError> {
        self.token
            .read()
            .as_ref()
            .map(|t| format!("Bearer {}", t))
            .ok_or(ApiError::NotAuthenticated)
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::Status { status, body })
    }
}

impl ProfileFormApi for BackendClient {
    async fn fetch_completion_status(&self, user_id: &str) -> Result<bool, ApiError> {
        let url = format!("{}{}/status", self.base_url, PROFILE_FORM_PATH);
        let auth = self.bearer()?;

        let response = self
            .client
            .get(&url)
            .query(&[("user_id", user_id)])
            .header("Authorization", auth)
            .send()
            .await?;
        let status: CompletionStatusResponse = Self::check_status(response).await?.json().await?;
        Ok(status.completed)
    }

    async fn save_form_data(
        &self,
        user_id: &str,
        data: &ProfileFormData,
        completed: bool,
    ) -> Result<(), ApiError> {
        let url = format!("{}{}", self.base_url, PROFILE_FORM_PATH);
        let auth = self.bearer()?;
        let body = SaveFormRequest {
            user_id,
            data: data.to_wire(),
            completed,
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", auth)
            .json(&body)
            .send()
            .await?;
        let result: SaveFormResponse = Self::check_status(response).await?.json().await?;

        if !result.success {
            return Err(ApiError::Rejected(
                result
                    .message
                    .unwrap_or_else(|| "Solicitud rechazada".to_string()),
            ));
        }
        tracing::debug!(user_id, completed, "profile form data saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FormField;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_fetch_completion_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/wp-json/mcnp/v1/profile-form/status"))
            .and(query_param("user_id", "42"))
            .and(header("Authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"completed": true})))
            .mount(&server)
            .await;

        let client = BackendClient::new(server.uri()).with_token("tok");
        assert!(client.fetch_completion_status("42").await.unwrap());
    }

    #[tokio::test]
    async fn test_save_sends_wire_encoding() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/wp-json/mcnp/v1/profile-form"))
            .and(body_partial_json(json!({
                "user_id": "42",
                "completed": true,
                "data": {"nombre": "Ana", "acepto_terminos": "1"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
            .expect(1)
            .mount(&server)
            .await;

        let mut data = ProfileFormData::new();
        data.set_text(FormField::Nombre, "Ana");
        data.set_consent(FormField::AceptoTerminos, true);

        let client = BackendClient::new(format!("{}/", server.uri())).with_token("tok");
        client.save_form_data("42", &data, true).await.unwrap();
    }

    #[tokio::test]
    async fn test_rejection_and_http_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"success": false, "message": "Datos incompletos"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = BackendClient::new(server.uri()).with_token("tok");
        let err = client
            .save_form_data("42", &ProfileFormData::new(), false)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Rejected(ref m) if m == "Datos incompletos"));

        let err = client.fetch_completion_status("42").await.unwrap_err();
        assert!(matches!(err, ApiError::Status { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_requires_token() {
        let client = BackendClient::new("http://127.0.0.1:9");
        let err = client.fetch_completion_status("42").await.unwrap_err();
        assert!(matches!(err, ApiError::NotAuthenticated));
    }
}
