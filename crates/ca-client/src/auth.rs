//! Identity provider adapter.
//!
//! [`KeycloakAdapter`] owns the login session for one user. It is built once
//! and shared (`Arc`) between the API client, which pulls bearer tokens from
//! it through [`TokenSource`], and whatever drives page loading.
//!
//! Two start-up modes exist:
//!
//! - [`InitMode::CheckSso`] resumes a session persisted in session storage
//!   and otherwise stays anonymous.
//! - [`InitMode::LoginRequired`] additionally falls back to a password grant
//!   with credentials from the configured [`CredentialProvider`].
//!
//! Once a session is established, further `init` calls return it without
//! contacting the identity provider.

use crate::config::KeycloakConfig;
use ca_core::{CaError, Result, SessionStorage};
use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::{DecodingKey, Validation};
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Session storage key of the persisted refresh token
pub const AUTH_STORAGE_KEY: &str = "auth";

/// Scope requested on every grant so that an ID token comes back
const SCOPE: &str = "openid";

/// Supplies bearer tokens to [`CaClient`](crate::CaClient)
pub trait TokenSource: Send + Sync {
    /// The token to send, or `None` when not authenticated
    fn bearer_token(&self) -> Option<String>;
}

/// A fixed bearer token, e.g. a client JWT used for signing requests
#[derive(Clone)]
pub struct StaticToken(String);

impl StaticToken {
    /// Wrap a token
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StaticToken(***)")
    }
}

impl TokenSource for StaticToken {
    fn bearer_token(&self) -> Option<String> {
        Some(self.0.clone())
    }
}

/// How [`KeycloakAdapter::init`] behaves without a resumable session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitMode {
    /// Log in, failing with [`CaError::LoginRequired`] if no credentials
    LoginRequired,
    /// Only resume an existing session; stay anonymous otherwise
    CheckSso,
}

/// Username and password for the resource owner password grant
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Produces credentials when a login is actually needed (e.g. by prompting)
pub trait CredentialProvider: Send + Sync {
    /// `Ok(None)` means no credentials are available
    fn credentials(&self) -> Result<Option<Credentials>>;
}

impl CredentialProvider for Credentials {
    fn credentials(&self) -> Result<Option<Credentials>> {
        Ok(Some(self.clone()))
    }
}

/// Snapshot of an authenticated session
#[derive(Clone, Serialize)]
pub struct Session {
    /// `preferred_username` of the logged in user
    pub username: Option<String>,

    /// Realm roles carried by the access token
    pub roles: Vec<String>,

    /// When the access token expires
    pub expires_at: DateTime<Utc>,

    #[serde(skip)]
    token: String,
}

impl Session {
    /// The access token
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Returns true if the session holds the given realm role
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("username", &self.username)
            .field("roles", &self.roles)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

/// Token endpoint response
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    id_token: Option<String>,
}

/// OAuth error body (`{"error": "...", "error_description": "..."}`)
#[derive(Debug, Deserialize)]
struct OAuthError {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct AccessClaims {
    #[serde(default)]
    preferred_username: Option<String>,
    #[serde(default)]
    realm_access: Option<RealmAccess>,
}

#[derive(Debug, Default, Deserialize)]
struct RealmAccess {
    #[serde(default)]
    roles: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct IdClaims {
    #[serde(default)]
    preferred_username: Option<String>,
}

/// What gets written under [`AUTH_STORAGE_KEY`]
#[derive(Debug, Serialize, Deserialize)]
struct PersistedSession {
    refresh_token: String,
}

/// Live token state
struct TokenSet {
    access_token: String,
    refresh_token: Option<String>,
    expires_at: DateTime<Utc>,
    roles: Vec<String>,
    username: Option<String>,
}

impl TokenSet {
    fn from_response(response: TokenResponse) -> Result<Self> {
        let access: AccessClaims = decode_claims(&response.access_token)?;
        let id: Option<IdClaims> = response
            .id_token
            .as_deref()
            .map(decode_claims)
            .transpose()?;

        let expires_at = TimeDelta::try_seconds(response.expires_in)
            .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
            .ok_or_else(|| {
                CaError::Auth(format!("token lifetime out of range: {}s", response.expires_in))
            })?;

        Ok(Self {
            expires_at,
            username: id
                .and_then(|c| c.preferred_username)
                .or(access.preferred_username),
            roles: access.realm_access.map(|r| r.roles).unwrap_or_default(),
            access_token: response.access_token,
            refresh_token: response.refresh_token,
        })
    }

    fn session(&self) -> Session {
        Session {
            username: self.username.clone(),
            roles: self.roles.clone(),
            expires_at: self.expires_at,
            token: self.access_token.clone(),
        }
    }
}

/// Read token claims without verifying the signature.
///
/// The backend verifies tokens; the client only needs the role and name
/// claims for display and page guards.
fn decode_claims<T: DeserializeOwned>(token: &str) -> Result<T> {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    jsonwebtoken::decode::<T>(token, &DecodingKey::from_secret(&[]), &validation)
        .map(|data| data.claims)
        .map_err(|e| CaError::Auth(format!("malformed token: {e}")))
}

/// Login session against a Keycloak realm
pub struct KeycloakAdapter {
    config: KeycloakConfig,
    http: HttpClient,
    storage: Option<Arc<dyn SessionStorage>>,
    credentials: Option<Arc<dyn CredentialProvider>>,
    state: RwLock<Option<TokenSet>>,
    init_lock: Mutex<()>,
}

impl KeycloakAdapter {
    /// Create an adapter with default settings
    pub fn new(config: KeycloakConfig) -> Result<Self> {
        KeycloakAdapterBuilder::new(config).build()
    }

    /// Create a builder for custom configuration
    #[must_use]
    pub fn builder(config: KeycloakConfig) -> KeycloakAdapterBuilder {
        KeycloakAdapterBuilder::new(config)
    }

    /// Identity provider coordinates
    #[must_use]
    pub const fn config(&self) -> &KeycloakConfig {
        &self.config
    }

    /// Establish a session according to `mode`.
    ///
    /// Returns the session, or `None` in [`InitMode::CheckSso`] when nobody
    /// is logged in. Concurrent callers are serialized; only the first one
    /// talks to the identity provider.
    pub async fn init(&self, mode: InitMode) -> Result<Option<Session>> {
        let _guard = self.init_lock.lock().await;

        if let Some(session) = self.session() {
            debug!("identity adapter already initialized");
            return Ok(Some(session));
        }

        if let Some(tokens) = self.resume().await? {
            info!(username = ?tokens.username, "resumed identity session");
            return Ok(Some(self.install(tokens)?));
        }

        match mode {
            InitMode::CheckSso => {
                debug!("no session to resume, continuing anonymously");
                Ok(None)
            }
            InitMode::LoginRequired => {
                let credentials = match &self.credentials {
                    Some(provider) => provider.credentials()?,
                    None => None,
                }
                .ok_or(CaError::LoginRequired)?;

                let tokens = self.password_grant(&credentials).await?;
                info!(username = ?tokens.username, "logged in");
                Ok(Some(self.install(tokens)?))
            }
        }
    }

    /// Returns true while a session is held
    #[must_use]
    pub fn authenticated(&self) -> bool {
        self.read_state(Option::is_some)
    }

    /// Current access token
    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.read_state(|state| state.as_ref().map(|t| t.access_token.clone()))
    }

    /// Returns true if the session holds the given realm role
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.read_state(|state| {
            state
                .as_ref()
                .is_some_and(|t| t.roles.iter().any(|r| r == role))
        })
    }

    /// `preferred_username` of the logged in user
    #[must_use]
    pub fn username(&self) -> Option<String> {
        self.read_state(|state| state.as_ref().and_then(|t| t.username.clone()))
    }

    /// Snapshot of the current session
    #[must_use]
    pub fn session(&self) -> Option<Session> {
        self.read_state(|state| state.as_ref().map(TokenSet::session))
    }

    /// Refresh the access token if it expires within `min_validity`.
    ///
    /// Returns whether a refresh happened. A failed refresh drops the
    /// session.
    pub async fn update_token(&self, min_validity: Duration) -> Result<bool> {
        let _guard = self.init_lock.lock().await;

        let (expires_at, refresh_token) = self
            .read_state(|state| {
                state
                    .as_ref()
                    .map(|t| (t.expires_at, t.refresh_token.clone()))
            })
            .ok_or(CaError::LoginRequired)?;

        let min_validity = TimeDelta::from_std(min_validity)
            .map_err(|e| CaError::Config(format!("invalid token validity: {e}")))?;
        if expires_at
            .checked_sub_signed(min_validity)
            .is_some_and(|deadline| deadline > Utc::now())
        {
            return Ok(false);
        }

        let refresh_token = refresh_token.ok_or(CaError::LoginRequired)?;
        match self.refresh_grant(&refresh_token).await {
            Ok(tokens) => {
                debug!("access token refreshed");
                self.install(tokens)?;
                Ok(true)
            }
            Err(e) => {
                warn!(error = %e, "token refresh failed, dropping session");
                self.clear()?;
                Err(e)
            }
        }
    }

    /// End the session at the identity provider and forget it locally.
    ///
    /// Local state is cleared even when the identity provider call fails.
    pub async fn logout(&self) -> Result<()> {
        let _guard = self.init_lock.lock().await;

        let refresh_token = self.read_state(|state| {
            state.as_ref().and_then(|t| t.refresh_token.clone())
        });
        self.clear()?;

        let Some(refresh_token) = refresh_token else {
            return Ok(());
        };

        let response = self
            .http
            .post(self.config.openid_endpoint("logout"))
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("refresh_token", refresh_token.as_str()),
            ])
            .send()
            .await
            .map_err(|e| CaError::Auth(e.to_string()))?;

        if response.status().is_success() {
            info!("logged out");
            Ok(())
        } else {
            Err(oauth_error(response).await)
        }
    }

    /// Try the refresh token persisted in session storage
    async fn resume(&self) -> Result<Option<TokenSet>> {
        let Some(storage) = &self.storage else {
            return Ok(None);
        };
        let Some(raw) = storage.get_item(AUTH_STORAGE_KEY)? else {
            return Ok(None);
        };

        let persisted: PersistedSession = match serde_json::from_str(&raw) {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "discarding unreadable persisted session");
                storage.remove_item(AUTH_STORAGE_KEY)?;
                return Ok(None);
            }
        };

        match self.refresh_grant(&persisted.refresh_token).await {
            Ok(tokens) => Ok(Some(tokens)),
            Err(CaError::Auth(reason)) => {
                debug!(%reason, "persisted session no longer valid");
                storage.remove_item(AUTH_STORAGE_KEY)?;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn password_grant(&self, credentials: &Credentials) -> Result<TokenSet> {
        self.token_request(&[
            ("grant_type", "password"),
            ("client_id", self.config.client_id.as_str()),
            ("username", credentials.username.as_str()),
            ("password", credentials.password.as_str()),
            ("scope", SCOPE),
        ])
        .await
    }

    async fn refresh_grant(&self, refresh_token: &str) -> Result<TokenSet> {
        self.token_request(&[
            ("grant_type", "refresh_token"),
            ("client_id", self.config.client_id.as_str()),
            ("refresh_token", refresh_token),
            ("scope", SCOPE),
        ])
        .await
    }

    async fn token_request(&self, form: &[(&str, &str)]) -> Result<TokenSet> {
        let url = self.config.openid_endpoint("token");
        debug!(url = %url, grant = form[0].1, "token request");

        let response = self
            .http
            .post(&url)
            .form(form)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    CaError::Connection(e.to_string())
                } else {
                    CaError::Http(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(oauth_error(response).await);
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| CaError::Http(e.to_string()))?;
        TokenSet::from_response(serde_json::from_slice(&body)?)
    }

    /// Make `tokens` the live session and persist its refresh token
    fn install(&self, tokens: TokenSet) -> Result<Session> {
        if let (Some(storage), Some(refresh_token)) = (&self.storage, &tokens.refresh_token) {
            let persisted = PersistedSession {
                refresh_token: refresh_token.clone(),
            };
            storage.set_item(AUTH_STORAGE_KEY, &serde_json::to_string(&persisted)?)?;
        }

        let session = tokens.session();
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = Some(tokens);
        Ok(session)
    }

    fn clear(&self) -> Result<()> {
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = None;
        if let Some(storage) = &self.storage {
            storage.remove_item(AUTH_STORAGE_KEY)?;
        }
        Ok(())
    }

    fn read_state<R>(&self, f: impl FnOnce(&Option<TokenSet>) -> R) -> R {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        f(&state)
    }
}

impl TokenSource for KeycloakAdapter {
    fn bearer_token(&self) -> Option<String> {
        self.token()
    }
}

impl fmt::Debug for KeycloakAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeycloakAdapter")
            .field("config", &self.config)
            .field("authenticated", &self.authenticated())
            .finish_non_exhaustive()
    }
}

async fn oauth_error(response: reqwest::Response) -> CaError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    match serde_json::from_str::<OAuthError>(&body) {
        Ok(err) => CaError::Auth(err.error_description.unwrap_or(err.error)),
        Err(_) if status.is_server_error() => CaError::Api {
            code: status.as_u16(),
            message: body,
        },
        Err(_) => CaError::Auth(format!("identity provider returned {status}")),
    }
}

/// Builder for configuring a [`KeycloakAdapter`]
pub struct KeycloakAdapterBuilder {
    config: KeycloakConfig,
    timeout: Duration,
    storage: Option<Arc<dyn SessionStorage>>,
    credentials: Option<Arc<dyn CredentialProvider>>,
}

impl KeycloakAdapterBuilder {
    /// Create a new builder
    #[must_use]
    pub fn new(config: KeycloakConfig) -> Self {
        Self {
            config,
            timeout: Duration::from_secs(30),
            storage: None,
            credentials: None,
        }
    }

    /// Set the request timeout for identity provider calls
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Persist refresh tokens in `storage` so later runs can resume
    #[must_use]
    pub fn storage(mut self, storage: Arc<dyn SessionStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Where [`InitMode::LoginRequired`] gets credentials from
    #[must_use]
    pub fn credentials(mut self, provider: Arc<dyn CredentialProvider>) -> Self {
        self.credentials = Some(provider);
        self
    }

    /// Build the adapter
    pub fn build(self) -> Result<KeycloakAdapter> {
        self.config.validate()?;

        let http = HttpClient::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| CaError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(KeycloakAdapter {
            config: self.config,
            http,
            storage: self.storage,
            credentials: self.credentials,
            state: RwLock::new(None),
            init_lock: Mutex::new(()),
        })
    }
}
