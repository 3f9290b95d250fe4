//! Configuration management.

use anyhow::Result;
use ca::{ENV_API_BASE_URL, ENV_KEYCLOAK_CLIENT_ID, ENV_KEYCLOAK_REALM, ENV_KEYCLOAK_URL};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::output::OutputFormat;

/// Keys accepted by `ca-admin config set`
pub const KEYS: [&str; 6] = [
    "api_url",
    "keycloak_url",
    "realm",
    "client_id",
    "username",
    "output_format",
];

/// CLI configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    /// Backend base URL.
    pub api_url: Option<String>,

    /// Keycloak base URL.
    pub keycloak_url: Option<String>,

    /// Keycloak realm.
    pub realm: Option<String>,

    /// Public OIDC client id.
    pub client_id: Option<String>,

    /// Username offered at login.
    pub username: Option<String>,

    /// Default output format.
    pub output_format: Option<OutputFormat>,
}

impl Config {
    fn dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("org", "ca-admin", "ca-admin")
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))
    }

    /// Get the config file path.
    pub fn path() -> Result<PathBuf> {
        Ok(Self::dirs()?.config_dir().join("config.toml"))
    }

    /// File holding the persisted session and preferences.
    pub fn session_path() -> Result<PathBuf> {
        Ok(Self::dirs()?.data_local_dir().join("session.json"))
    }

    /// Load configuration from file.
    pub fn load() -> Result<Self> {
        let path = Self::path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)?;
        let config: Self = toml::from_str(&content)?;

        Ok(config)
    }

    /// Save configuration to file.
    pub fn save(&self) -> Result<()> {
        let path = Self::path()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&path, content)?;

        Ok(())
    }

    /// Set one key from its string form.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let value = Some(value.to_string());
        match key {
            "api_url" => self.api_url = value,
            "keycloak_url" => self.keycloak_url = value,
            "realm" => self.realm = value,
            "client_id" => self.client_id = value,
            "username" => self.username = value,
            "output_format" | "output" => {
                self.output_format = value.as_deref().map(str::parse).transpose()?;
            }
            _ => anyhow::bail!(
                "Unknown config key: {key}\n\nAvailable keys: {}",
                KEYS.join(", ")
            ),
        }
        Ok(())
    }

    /// Value backing one of the deployment environment variables.
    pub fn lookup(&self, variable: &str) -> Option<String> {
        match variable {
            ENV_API_BASE_URL => self.api_url.clone(),
            ENV_KEYCLOAK_URL => self.keycloak_url.clone(),
            ENV_KEYCLOAK_REALM => self.realm.clone(),
            ENV_KEYCLOAK_CLIENT_ID => self.client_id.clone(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_known_keys() {
        let mut config = Config::default();
        config.set("realm", "pki").unwrap();
        config.set("output", "yaml").unwrap();

        assert_eq!(config.realm.as_deref(), Some("pki"));
        assert_eq!(config.output_format, Some(OutputFormat::Yaml));
        assert_eq!(config.lookup(ENV_KEYCLOAK_REALM).as_deref(), Some("pki"));
    }

    #[test]
    fn test_set_unknown_key() {
        let mut config = Config::default();
        assert!(config.set("api_key", "x").is_err());
        assert!(config.set("output_format", "xml").is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = Config::default();
        config.set("api_url", "https://ca.example.com").unwrap();
        config.set("output_format", "json").unwrap();

        let text = toml::to_string_pretty(&config).unwrap();
        assert!(text.contains("output_format = \"json\""));
        assert_eq!(toml::from_str::<Config>(&text).unwrap(), config);
    }
}
