//! Per-feature switch between the backend and bundled data.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{
    error::ClientError,
    store::{self, API_MODE_KEY, KeyValueStore},
};

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceMode {
    pub use_backend: bool,
}

impl ServiceMode {
    pub const BACKEND: Self = Self { use_backend: true };
    pub const LOCAL: Self = Self { use_backend: false };
}

/// Which feature areas call the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiMode {
    pub auth: ServiceMode,
    pub tests: ServiceMode,
    pub ai_helper: ServiceMode,
}

impl Default for ApiMode {
    /// Auth against the backend, tests and feedback from bundled data.
    fn default() -> Self {
        Self {
            auth: ServiceMode::BACKEND,
            tests: ServiceMode::LOCAL,
            ai_helper: ServiceMode::LOCAL,
        }
    }
}

impl ApiMode {
    pub fn all_backend() -> Self {
        Self {
            auth: ServiceMode::BACKEND,
            tests: ServiceMode::BACKEND,
            ai_helper: ServiceMode::BACKEND,
        }
    }

    pub fn all_local() -> Self {
        Self {
            auth: ServiceMode::LOCAL,
            tests: ServiceMode::LOCAL,
            ai_helper: ServiceMode::LOCAL,
        }
    }

    /// Reads the persisted mode, writing the default when none (or a malformed one) is stored.
    pub async fn load_or_init(store: &dyn KeyValueStore) -> Result<Self, ClientError> {
        if let Some(mode) = store::load::<ApiMode>(store, API_MODE_KEY).await? {
            return Ok(mode);
        }
        let mode = ApiMode::default();
        mode.persist(store).await?;
        Ok(mode)
    }

    pub async fn persist(&self, store: &dyn KeyValueStore) -> Result<(), ClientError> {
        store::save(store, API_MODE_KEY, self).await
    }
}

/// Everything the client needs to know up front.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// e.g. `http://localhost:5000`, without a trailing slash.
    pub base_url: String,
    pub timeout: Duration,
    pub mode: ApiMode,
}

impl ClientSettings {
    pub fn new(base_url: impl Into<String>, mode: ApiMode) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: DEFAULT_TIMEOUT,
            mode,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::store::MemoryStore;

    #[tokio::test]
    async fn missing_mode_is_initialised_to_default() {
        let store = MemoryStore::new();
        let mode = ApiMode::load_or_init(&store).await.unwrap();
        assert_eq!(mode, ApiMode::default());
        assert!(store.get(API_MODE_KEY).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn persisted_mode_is_read_back() {
        let store = MemoryStore::new();
        ApiMode::all_backend().persist(&store).await.unwrap();
        assert_eq!(
            ApiMode::load_or_init(&store).await.unwrap(),
            ApiMode::all_backend()
        );
    }

    #[test]
    fn mode_uses_camel_case_keys() {
        let body = serde_json::to_value(ApiMode::default()).unwrap();
        assert_eq!(body["aiHelper"]["useBackend"], false);
        assert_eq!(body["auth"]["useBackend"], true);
    }

    #[test]
    fn base_url_drops_trailing_slash() {
        let settings = ClientSettings::new("http://localhost:5000/", ApiMode::default());
        assert_eq!(settings.base_url, "http://localhost:5000");
    }
}
