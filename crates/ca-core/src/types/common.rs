use serde::{Deserialize, Serialize};

/// Response from `/api/v1/health`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthInfoDto {
    /// Version of the CA backend
    pub version: String,

    /// Version of the identity provider, if the backend could reach it
    #[serde(rename = "keycloakVersion", default)]
    pub keycloak_version: Option<String>,

    /// Free-form status string ("OK" when healthy)
    #[serde(default)]
    pub status: Option<String>,

    /// Overall health flag
    #[serde(default)]
    pub ok: bool,

    /// Whether an active root and intermediate certificate exist
    #[serde(rename = "isInitialized", default)]
    pub is_initialized: Option<bool>,
}

impl HealthInfoDto {
    /// Returns true once the CA has both an active root and intermediate
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.is_initialized.unwrap_or(false)
    }
}

/// Error body returned by the backend for every non-success status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDto {
    /// HTTP status code
    pub code: u16,

    /// Status text (e.g. "Not Found")
    pub error: String,

    /// Human-readable detail
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorDto {
    /// The most specific message available
    #[must_use]
    pub fn describe(&self) -> &str {
        self.message.as_deref().unwrap_or(&self.error)
    }
}
