//! Client configuration types.

use ca_core::{CaError, Result};
use url::Url;

/// Environment variable holding the backend base URL
pub const ENV_API_BASE_URL: &str = "CA_API_BASE_URL";
/// Environment variable holding the identity provider URL
pub const ENV_KEYCLOAK_URL: &str = "CA_KEYCLOAK_URL";
/// Environment variable holding the identity provider realm
pub const ENV_KEYCLOAK_REALM: &str = "CA_KEYCLOAK_REALM";
/// Environment variable holding the OIDC client id
pub const ENV_KEYCLOAK_CLIENT_ID: &str = "CA_KEYCLOAK_CLIENT_ID";

/// Identity provider coordinates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeycloakConfig {
    /// Base URL of the Keycloak server (without `/realms/...`)
    pub url: String,

    /// Realm name
    pub realm: String,

    /// Public OIDC client id
    pub client_id: String,
}

impl KeycloakConfig {
    /// Create a new identity provider configuration
    #[must_use]
    pub fn new(
        url: impl Into<String>,
        realm: impl Into<String>,
        client_id: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            realm: realm.into(),
            client_id: client_id.into(),
        }
    }

    /// OpenID Connect endpoint under the realm, e.g. `token` or `logout`
    #[must_use]
    pub fn openid_endpoint(&self, name: &str) -> String {
        format!(
            "{}/realms/{}/protocol/openid-connect/{name}",
            self.url.trim_end_matches('/'),
            self.realm
        )
    }

    /// Check that all fields are usable
    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.url).map_err(|e| CaError::InvalidUrl(format!("{}: {e}", self.url)))?;
        if self.realm.trim().is_empty() {
            return Err(CaError::Config("identity provider realm is empty".into()));
        }
        if self.client_id.trim().is_empty() {
            return Err(CaError::Config("identity provider client id is empty".into()));
        }
        Ok(())
    }
}

/// Everything needed to talk to a deployment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    /// Backend base URL
    pub api_base_url: String,

    /// Identity provider coordinates
    pub keycloak: KeycloakConfig,
}

impl Environment {
    /// Read the configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through an arbitrary lookup function
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| CaError::Config(format!("{key} is not set")))
        };

        let env = Self {
            api_base_url: require(ENV_API_BASE_URL)?,
            keycloak: KeycloakConfig::new(
                require(ENV_KEYCLOAK_URL)?,
                require(ENV_KEYCLOAK_REALM)?,
                require(ENV_KEYCLOAK_CLIENT_ID)?,
            ),
        };
        env.validate()?;
        Ok(env)
    }

    /// Check that all URLs parse
    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.api_base_url)
            .map_err(|e| CaError::InvalidUrl(format!("{}: {e}", self.api_base_url)))?;
        self.keycloak.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_from_lookup() {
        let env = Environment::from_lookup(lookup(&[
            (ENV_API_BASE_URL, "https://ca.example.com"),
            (ENV_KEYCLOAK_URL, "https://auth.example.com/"),
            (ENV_KEYCLOAK_REALM, "pki"),
            (ENV_KEYCLOAK_CLIENT_ID, "ca-frontend"),
        ]))
        .unwrap();

        assert_eq!(env.api_base_url, "https://ca.example.com");
        assert_eq!(
            env.keycloak.openid_endpoint("token"),
            "https://auth.example.com/realms/pki/protocol/openid-connect/token"
        );
    }

    #[test]
    fn test_missing_variable() {
        let err = Environment::from_lookup(lookup(&[(ENV_API_BASE_URL, "https://ca.example.com")]))
            .unwrap_err();
        assert!(matches!(err, CaError::Config(msg) if msg.contains(ENV_KEYCLOAK_URL)));
    }

    #[test]
    fn test_invalid_url() {
        let err = Environment::from_lookup(lookup(&[
            (ENV_API_BASE_URL, "not a url"),
            (ENV_KEYCLOAK_URL, "https://auth.example.com"),
            (ENV_KEYCLOAK_REALM, "pki"),
            (ENV_KEYCLOAK_CLIENT_ID, "ca-frontend"),
        ]))
        .unwrap_err();
        assert!(matches!(err, CaError::InvalidUrl(_)));
    }
}
