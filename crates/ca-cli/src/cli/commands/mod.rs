//! Command implementations.

pub mod certificate;
pub mod client;
pub mod config;
pub mod health;
pub mod prefs;
pub mod session;
pub mod signing_request;
pub mod user;

use anyhow::{anyhow, Result};
use ca::pages::loaders::HomeData;
use ca::pages::Loaders;
use ca::{
    CaClient, CaError, CredentialProvider, Credentials, Environment, FileStorage, InitMode,
    KeycloakAdapter, ENV_API_BASE_URL,
};
use dialoguer::{Input, Password};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::config::Config;
use crate::output::OutputFormat;

/// Username for non-interactive logins
pub const ENV_USERNAME: &str = "CA_USERNAME";
/// Password for non-interactive logins
pub const ENV_PASSWORD: &str = "CA_PASSWORD";

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Loaded configuration file
    pub config: Config,

    /// Backend URL from the command line or environment
    pub api_url: Option<String>,

    /// Output format
    pub output_format: OutputFormat,

    /// Verbose output
    pub verbose: bool,

    /// Disable colors
    pub no_color: bool,
}

/// Loaders for the `/home` routes together with their layout data.
pub struct Home {
    pub loaders: Loaders,
    pub data: HomeData,
}

impl Context {
    /// Resolve the deployment: command line, then environment, then config file.
    pub fn environment(&self) -> Result<Environment> {
        Environment::from_lookup(|key| self.lookup(key)).map_err(|e| {
            anyhow!(
                "{e}\n\n\
                 Set it with one of:\n  \
                 1. the environment variable\n  \
                 2. ca-admin config set <key> <value>  (keys: {})",
                crate::config::KEYS.join(", ")
            )
        })
    }

    fn lookup(&self, key: &str) -> Option<String> {
        if key == ENV_API_BASE_URL {
            if let Some(url) = &self.api_url {
                return Some(url.clone());
            }
        }
        std::env::var(key)
            .ok()
            .filter(|v| !v.is_empty())
            .or_else(|| self.config.lookup(key))
    }

    /// Session and preference storage shared across invocations.
    pub fn storage(&self) -> Result<Arc<FileStorage>> {
        let path = Config::session_path()?;
        debug!(path = %path.display(), "session storage");
        Ok(Arc::new(FileStorage::new(path)))
    }

    /// Identity adapter backed by the session file.
    pub fn auth(&self, username: Option<String>) -> Result<Arc<KeycloakAdapter>> {
        let env = self.environment()?;
        let credentials = PromptCredentials {
            username: username.or_else(|| self.config.username.clone()),
        };

        Ok(Arc::new(
            KeycloakAdapter::builder(env.keycloak)
                .storage(self.storage()?)
                .credentials(Arc::new(credentials))
                .build()?,
        ))
    }

    /// Client without a session, for public endpoints.
    pub fn anonymous_client(&self) -> Result<CaClient> {
        let url = self.lookup(ENV_API_BASE_URL).ok_or_else(|| {
            anyhow!(
                "Backend URL required.\n\n\
                 Set it with one of:\n  \
                 1. --api-url <URL>\n  \
                 2. {ENV_API_BASE_URL} environment variable\n  \
                 3. ca-admin config set api_url <URL>"
            )
        })?;
        Ok(CaClient::new(url)?)
    }

    /// Loaders whose client carries the bearer token of `auth`.
    pub fn loaders(&self, auth: Arc<KeycloakAdapter>) -> Result<Loaders> {
        let env = self.environment()?;
        let client = CaClient::builder(env.api_base_url)
            .token_source(auth.clone())
            .build()?;
        Ok(Loaders::new(client, auth))
    }

    /// Log in (or resume) and resolve the root and home layouts.
    pub async fn home(&self) -> Result<Home> {
        let auth = self.auth(None)?;
        auth.init(InitMode::LoginRequired)
            .await
            .map_err(login_error)?;

        let loaders = self.loaders(auth)?;
        let root = loaders.root_layout().await?;
        let data = loaders.home_layout(&root).await?;
        Ok(Home { loaders, data })
    }

    /// Spinner on stderr for the pretty format.
    pub fn spinner(&self, message: &str) -> ProgressBar {
        if self.output_format != OutputFormat::Pretty {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(80));
        pb
    }
}

/// Error for a page that came back empty because the session was rejected.
pub fn not_authorized() -> anyhow::Error {
    anyhow!("Not authorized. Run `ca-admin login` to start a new session.")
}

pub(crate) fn login_error(err: CaError) -> anyhow::Error {
    match err {
        CaError::LoginRequired => anyhow!(
            "Login required.\n\n\
             Run `ca-admin login` in a terminal, or set {ENV_USERNAME} and {ENV_PASSWORD}."
        ),
        other => other.into(),
    }
}

/// Credentials from the environment, or prompted for on a terminal.
struct PromptCredentials {
    username: Option<String>,
}

impl CredentialProvider for PromptCredentials {
    fn credentials(&self) -> ca::Result<Option<Credentials>> {
        let env_username = std::env::var(ENV_USERNAME).ok();
        if let Ok(password) = std::env::var(ENV_PASSWORD) {
            if let Some(username) = env_username.clone().or_else(|| self.username.clone()) {
                return Ok(Some(Credentials::new(username, password)));
            }
        }

        if !std::io::stdin().is_terminal() {
            return Ok(None);
        }

        let username = match env_username.or_else(|| self.username.clone()) {
            Some(username) => username,
            None => Input::<String>::new()
                .with_prompt("Username")
                .interact_text()
                .map_err(|e| CaError::Auth(e.to_string()))?,
        };
        let password = Password::new()
            .with_prompt(format!("Password for {username}"))
            .interact()
            .map_err(|e| CaError::Auth(e.to_string()))?;

        Ok(Some(Credentials::new(username, password)))
    }
}
