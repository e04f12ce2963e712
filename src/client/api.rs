//! Thin typed wrapper over the REST endpoints.

use reqwest::{Method, RequestBuilder, StatusCode};
use serde::{Serialize, de::DeserializeOwned};

use super::{error::ClientError, mode::ClientSettings};

/// Endpoint paths, relative to the base URL.
pub mod endpoints {
    pub const LOGIN: &str = "/auth/login";
    pub const REGISTER: &str = "/auth/register";
    pub const LOGOUT: &str = "/auth/logout";
    pub const CURRENT_USER: &str = "/auth/current-user";
    pub const TEST_HISTORY: &str = "/auth/test-history";
    pub const TESTS: &str = "/tests";
    pub const RESULTS: &str = "/tests/results";
    pub const PERFORMANCE: &str = "/tests/performance";
    pub const FEEDBACK: &str = "/ai/feedback";

    pub fn test(id: i64) -> String {
        format!("/tests/{}", id)
    }

    pub fn test_results(id: i64) -> String {
        format!("/tests/{}/results", id)
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    timeout_secs: u64,
}

impl ApiClient {
    pub fn new(settings: &ClientSettings) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| ClientError::Network(e.to_string()))?;
        Ok(Self {
            http,
            base_url: settings.base_url.clone(),
            timeout_secs: settings.timeout.as_secs(),
        })
    }

    fn request(&self, method: Method, path: &str, token: Option<&str>) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let builder = self.http.request(method, url);
        match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        token: Option<&str>,
    ) -> Result<T, ClientError> {
        self.send(path, self.request(Method::GET, path, token)).await
    }

    pub async fn get_with_query<T: DeserializeOwned, Q: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Q,
        token: Option<&str>,
    ) -> Result<T, ClientError> {
        self.send(path, self.request(Method::GET, path, token).query(query))
            .await
    }

    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        token: Option<&str>,
    ) -> Result<T, ClientError> {
        self.send(path, self.request(Method::POST, path, token).json(body))
            .await
    }

    /// POST without a body.
    pub async fn post_empty<T: DeserializeOwned>(
        &self,
        path: &str,
        token: Option<&str>,
    ) -> Result<T, ClientError> {
        self.send(path, self.request(Method::POST, path, token))
            .await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        path: &str,
        builder: RequestBuilder,
    ) -> Result<T, ClientError> {
        tracing::debug!("API call to {}", path);

        let response = builder.send().await.map_err(|e| self.transport_error(e))?;
        let status = response.status();

        if !status.is_success() {
            let message = error_message(status, response.text().await.ok());
            tracing::warn!("API error ({}) from {}: {}", status.as_u16(), path, message);
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(e))?;
        serde_json::from_slice(&body).map_err(|e| ClientError::Decode(e.to_string()))
    }

    fn transport_error(&self, err: reqwest::Error) -> ClientError {
        if err.is_timeout() {
            ClientError::Timeout(self.timeout_secs)
        } else {
            ClientError::Network(err.to_string())
        }
    }
}

/// Prefers the `message` field of a JSON error body.
fn error_message(status: StatusCode, body: Option<String>) -> String {
    body.and_then(|raw| serde_json::from_str::<serde_json::Value>(&raw).ok())
        .and_then(|value| value.get("message")?.as_str().map(str::to_string))
        .unwrap_or_else(|| format!("API Error: {}", status.as_u16()))
}
