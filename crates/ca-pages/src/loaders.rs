//! Route loaders.
//!
//! Each loader receives the data of its parent layout and resolves either the
//! data its view needs or a [`LoadError`]. A 401 from the backend is not an
//! error: the view renders its logged-out state instead.

use ca_client::{CaClient, InitMode, KeycloakAdapter, Session};
use ca_core::{
    CaCertificateDto, CaError, ClientDto, HealthInfoDto, Result, SigningRequestDto, UserDto,
};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Why a route could not be rendered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// Navigate elsewhere instead
    Redirect(String),
    /// Render the error page for this status
    Page { status: u16 },
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Redirect(location) => write!(f, "redirect to {location}"),
            Self::Page { status } => write!(f, "request failed with status {status}"),
        }
    }
}

impl std::error::Error for LoadError {}

pub type LoadResult<T> = std::result::Result<T, LoadError>;

/// Map a failed call to an error page: its HTTP status, or 500 otherwise
#[must_use]
pub fn page_error(err: &CaError) -> LoadError {
    LoadError::Page {
        status: err.status_code().unwrap_or(500),
    }
}

/// Turn a 401 into `None` and any other failure into a [`LoadError`]
pub fn recover_unauthorized<T>(result: Result<T>) -> LoadResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(CaError::Unauthorized { message }) => {
            debug!(%message, "unauthorized, rendering logged out state");
            Ok(None)
        }
        Err(e) => {
            warn!(error = %e, "page load failed");
            Err(page_error(&e))
        }
    }
}

/// A 404 on a certificate means it has not been generated yet
fn not_generated<T>(result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(CaError::NotFound { .. }) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Data shared by every route
#[derive(Debug, Clone)]
pub struct RootData {
    /// Backend health, `None` when the check was rejected as unauthorized
    pub health: Option<HealthInfoDto>,
    /// The resumed session, if any
    pub session: Option<Session>,
}

impl RootData {
    fn is_initialized(&self) -> bool {
        self.health.as_ref().is_some_and(HealthInfoDto::is_initialized)
    }
}

/// Data of the `/home` layout
#[derive(Debug, Clone)]
pub struct HomeData {
    pub health: Option<HealthInfoDto>,
    pub session: Option<Session>,
}

/// Data of the `/setup` layout
#[derive(Debug, Clone)]
pub struct SetupData {
    pub session: Option<Session>,
}

/// A client with the signing requests issued to it
#[derive(Debug, Clone, Default)]
pub struct ClientPage {
    pub client: Option<ClientDto>,
    pub signing_requests: Option<Vec<SigningRequestDto>>,
}

/// Root and intermediate certificates; `None` when not generated yet
#[derive(Debug, Clone, Default)]
pub struct CertificatesPage {
    pub root: Option<CaCertificateDto>,
    pub intermediate: Option<CaCertificateDto>,
}

/// Users together with the roles that can be assigned
#[derive(Debug, Clone, Default)]
pub struct UsersPage {
    pub users: Vec<UserDto>,
    pub roles: Vec<String>,
}

/// Resolves route data against one backend and identity session
#[derive(Debug, Clone)]
pub struct Loaders {
    client: CaClient,
    auth: Arc<KeycloakAdapter>,
}

impl Loaders {
    /// `client` should draw its bearer token from `auth`
    #[must_use]
    pub const fn new(client: CaClient, auth: Arc<KeycloakAdapter>) -> Self {
        Self { client, auth }
    }

    #[must_use]
    pub const fn client(&self) -> &CaClient {
        &self.client
    }

    #[must_use]
    pub fn auth(&self) -> &KeycloakAdapter {
        &self.auth
    }

    /// Health check plus a silent session resume
    pub async fn root_layout(&self) -> LoadResult<RootData> {
        let health = recover_unauthorized(self.client.common().health_check().await)?;
        let session = self
            .auth
            .init(InitMode::CheckSso)
            .await
            .map_err(|e| page_error(&e))?;

        Ok(RootData { health, session })
    }

    /// Requires a login unless the parent already resumed a session
    pub async fn home_layout(&self, parent: &RootData) -> LoadResult<HomeData> {
        let session = match &parent.session {
            Some(session) => Some(session.clone()),
            None => self
                .auth
                .init(InitMode::LoginRequired)
                .await
                .map_err(|e| page_error(&e))?,
        };

        Ok(HomeData {
            health: parent.health.clone(),
            session,
        })
    }

    /// Redirects to `/` unless the session holds the `admin` role
    pub fn admin_layout(&self, parent: &HomeData) -> LoadResult<()> {
        if parent.session.is_some() && (!self.auth.authenticated() || !self.auth.has_role("admin"))
        {
            debug!("not an administrator, redirecting");
            return Err(LoadError::Redirect("/".into()));
        }
        Ok(())
    }

    /// Redirects to `/` once the authority is initialized, otherwise logs in
    pub async fn setup_layout(&self, parent: &RootData) -> LoadResult<SetupData> {
        if parent.is_initialized() {
            return Err(LoadError::Redirect("/".into()));
        }

        let session = self
            .auth
            .init(InitMode::LoginRequired)
            .await
            .map_err(|e| page_error(&e))?;
        Ok(SetupData { session })
    }

    /// A client (including inactive ones) and, if active, its signing requests
    pub async fn client_page(&self, parent: &HomeData, id: &str) -> LoadResult<ClientPage> {
        if parent.session.is_none() || id.is_empty() {
            return Ok(ClientPage::default());
        }

        let loaded = recover_unauthorized(self.fetch_client(id).await)?;
        Ok(loaded.map_or_else(ClientPage::default, |(client, signing_requests)| {
            ClientPage {
                client: Some(client),
                signing_requests: Some(signing_requests),
            }
        }))
    }

    async fn fetch_client(&self, id: &str) -> Result<(ClientDto, Vec<SigningRequestDto>)> {
        let client = self.client.clients().get(id, true).await?;
        let signing_requests = if client.active {
            self.client.signing_requests().by_client_id(id).await?
        } else {
            Vec::new()
        };
        Ok((client, signing_requests))
    }

    /// All clients of the current user
    pub async fn clients_page(
        &self,
        parent: &HomeData,
        include_inactive: bool,
    ) -> LoadResult<Option<Vec<ClientDto>>> {
        if parent.session.is_none() {
            return Ok(None);
        }
        recover_unauthorized(self.client.clients().list(include_inactive).await)
    }

    /// Root and intermediate certificates
    pub async fn certificates_page(&self, parent: &HomeData) -> LoadResult<CertificatesPage> {
        if parent.session.is_none() {
            return Ok(CertificatesPage::default());
        }

        let certificates = self.client.certificates();
        let fetched = tokio::try_join!(
            async { not_generated(certificates.root().await) },
            async { not_generated(certificates.intermediate().await) },
        );

        Ok(recover_unauthorized(fetched)?
            .map(|(root, intermediate)| CertificatesPage { root, intermediate })
            .unwrap_or_default())
    }

    /// Users and assignable roles
    pub async fn users_page(&self, parent: &HomeData) -> LoadResult<UsersPage> {
        if parent.session.is_none() {
            return Ok(UsersPage::default());
        }

        let users = self.client.users();
        let admin = self.client.admin();
        let fetched = tokio::try_join!(users.list(true), admin.list_roles());

        Ok(recover_unauthorized(fetched)?
            .map(|(users, roles)| UsersPage { users, roles })
            .unwrap_or_default())
    }

    /// Every signing request visible to the current user
    pub async fn signing_requests_page(
        &self,
        parent: &HomeData,
    ) -> LoadResult<Option<Vec<SigningRequestDto>>> {
        if parent.session.is_none() {
            return Ok(None);
        }
        recover_unauthorized(self.client.signing_requests().list().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ca_client::{Credentials, KeycloakConfig, TokenSource};
    use jsonwebtoken::{EncodingKey, Header};
    use serde_json::json;
    use tokio_test::assert_ok;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TOKEN_PATH: &str = "/realms/pki/protocol/openid-connect/token";

    fn jwt(claims: &serde_json::Value) -> String {
        jsonwebtoken::encode(&Header::default(), claims, &EncodingKey::from_secret(b"k")).unwrap()
    }

    async fn mount_login(server: &MockServer, roles: &[&str]) {
        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": jwt(&json!({
                    "preferred_username": "alice",
                    "realm_access": { "roles": roles }
                })),
                "expires_in": 300,
                "refresh_token": "refresh"
            })))
            .mount(server)
            .await;
    }

    fn loaders(server: &MockServer) -> Loaders {
        let auth = Arc::new(
            KeycloakAdapter::builder(KeycloakConfig::new(server.uri(), "pki", "ca-frontend"))
                .credentials(Arc::new(Credentials::new("alice", "secret")))
                .build()
                .unwrap(),
        );
        let client = CaClient::builder(server.uri())
            .token_source(auth.clone() as Arc<dyn TokenSource>)
            .build()
            .unwrap();
        Loaders::new(client, auth)
    }

    async fn logged_in(loaders: &Loaders) -> HomeData {
        let session = loaders.auth().init(InitMode::LoginRequired).await.unwrap();
        HomeData {
            health: None,
            session,
        }
    }

    fn client_json(active: bool) -> serde_json::Value {
        json!({
            "id": "c1",
            "name": "web",
            "displayName": "Web",
            "userId": "u1",
            "tokenHash": "abc",
            "active": active,
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": "2024-01-01T00:00:00Z"
        })
    }

    #[test]
    fn test_page_error_status() {
        let err = CaError::from_status(403, "no");
        assert_eq!(page_error(&err), LoadError::Page { status: 403 });
        assert_eq!(page_error(&CaError::Timeout), LoadError::Page { status: 500 });
    }

    #[test]
    fn test_recover_unauthorized() {
        let unauthorized: Result<u8> = Err(CaError::from_status(401, "expired"));
        assert_eq!(recover_unauthorized(unauthorized), Ok(None));

        let failed: Result<u8> = Err(CaError::from_status(502, "bad gateway"));
        assert_eq!(
            recover_unauthorized(failed),
            Err(LoadError::Page { status: 502 })
        );

        let cancelled: Result<u8> = Err(CaError::Cancelled("Query was cancelled".into()));
        assert_eq!(
            recover_unauthorized(cancelled),
            Err(LoadError::Page { status: 500 })
        );
    }

    #[tokio::test]
    async fn test_client_page_without_session() {
        let server = MockServer::start().await;
        let loaders = loaders(&server);
        let parent = HomeData {
            health: None,
            session: None,
        };

        let page = loaders.client_page(&parent, "c1").await.unwrap();
        assert!(page.client.is_none());
        assert!(page.signing_requests.is_none());
    }

    #[tokio::test]
    async fn test_client_page_active_client() {
        let server = MockServer::start().await;
        mount_login(&server, &[]).await;
        Mock::given(method("GET"))
            .and(path("/api/v1/client/c1"))
            .and(query_param("includeInactive", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(client_json(true)))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/signing-request/c1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "clientId": "c1",
                "hash": "h",
                "issuedAt": "2024-01-02T00:00:00Z",
                "serialNumber": "01",
                "subjectName": "CN=web"
            }])))
            .expect(1)
            .mount(&server)
            .await;

        let loaders = loaders(&server);
        let parent = logged_in(&loaders).await;
        let page = loaders.client_page(&parent, "c1").await.unwrap();

        assert!(page.client.unwrap().active);
        assert_eq!(page.signing_requests.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_client_page_inactive_skips_signing_requests() {
        let server = MockServer::start().await;
        mount_login(&server, &[]).await;
        Mock::given(method("GET"))
            .and(path("/api/v1/client/c1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(client_json(false)))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/signing-request/c1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(0)
            .mount(&server)
            .await;

        let loaders = loaders(&server);
        let parent = logged_in(&loaders).await;
        let page = loaders.client_page(&parent, "c1").await.unwrap();

        assert!(!page.client.unwrap().active);
        assert!(page.signing_requests.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_client_page_unauthorized_renders_empty() {
        let server = MockServer::start().await;
        mount_login(&server, &[]).await;
        Mock::given(method("GET"))
            .and(path("/api/v1/client/c1"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let loaders = loaders(&server);
        let parent = logged_in(&loaders).await;
        let page = loaders.client_page(&parent, "c1").await.unwrap();
        assert!(page.client.is_none());
        assert!(page.signing_requests.is_none());
    }

    #[tokio::test]
    async fn test_client_page_status_error() {
        let server = MockServer::start().await;
        mount_login(&server, &[]).await;
        Mock::given(method("GET"))
            .and(path("/api/v1/client/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let loaders = loaders(&server);
        let parent = logged_in(&loaders).await;
        let err = loaders.client_page(&parent, "missing").await.unwrap_err();
        assert_eq!(err, LoadError::Page { status: 404 });
    }

    #[tokio::test]
    async fn test_admin_layout_redirects_non_admin() {
        let server = MockServer::start().await;
        mount_login(&server, &["user"]).await;

        let loaders = loaders(&server);
        let parent = logged_in(&loaders).await;
        assert_eq!(
            loaders.admin_layout(&parent),
            Err(LoadError::Redirect("/".into()))
        );
    }

    #[tokio::test]
    async fn test_admin_layout_allows_admin() {
        let server = MockServer::start().await;
        mount_login(&server, &["admin"]).await;

        let loaders = loaders(&server);
        let parent = logged_in(&loaders).await;
        assert_ok!(loaders.admin_layout(&parent));
    }

    #[tokio::test]
    async fn test_setup_layout_redirects_when_initialized() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "version": "1.0.0",
                "ok": true,
                "isInitialized": true
            })))
            .mount(&server)
            .await;

        let loaders = loaders(&server);
        let root = loaders.root_layout().await.unwrap();
        assert!(root.session.is_none());
        assert_eq!(
            loaders.setup_layout(&root).await.unwrap_err(),
            LoadError::Redirect("/".into())
        );
    }

    #[tokio::test]
    async fn test_home_layout_logs_in() {
        let server = MockServer::start().await;
        mount_login(&server, &[]).await;

        let loaders = loaders(&server);
        let root = RootData {
            health: None,
            session: None,
        };
        let home = loaders.home_layout(&root).await.unwrap();
        assert_eq!(home.session.unwrap().username.as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn test_certificates_page_not_generated() {
        let server = MockServer::start().await;
        mount_login(&server, &[]).await;
        Mock::given(method("GET"))
            .and(path("/api/v1/certificate/root"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "certificate": "-----BEGIN CERTIFICATE-----",
                "validUntil": "2034-01-01T00:00:00Z",
                "createdAt": "2024-01-01T00:00:00Z"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/certificate/intermediate"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let loaders = loaders(&server);
        let parent = logged_in(&loaders).await;
        let page = loaders.certificates_page(&parent).await.unwrap();
        assert!(page.root.is_some());
        assert!(page.intermediate.is_none());
    }

    #[tokio::test]
    async fn test_users_page_server_error() {
        let server = MockServer::start().await;
        mount_login(&server, &["admin"]).await;
        Mock::given(method("GET"))
            .and(path("/api/v1/user/list"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/admin/roles"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let loaders = loaders(&server);
        let parent = logged_in(&loaders).await;
        assert_eq!(
            loaders.users_page(&parent).await.unwrap_err(),
            LoadError::Page { status: 500 }
        );
    }

    #[tokio::test]
    async fn test_users_page() {
        let server = MockServer::start().await;
        mount_login(&server, &["admin"]).await;
        Mock::given(method("GET"))
            .and(path("/api/v1/user/list"))
            .and(query_param("includeInactive", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "id": "u1",
                "name": "alice",
                "displayName": "Alice",
                "active": true,
                "roles": ["admin"],
                "createdAt": "2024-01-01T00:00:00Z",
                "updatedAt": "2024-01-01T00:00:00Z"
            }])))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/admin/roles"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(["admin", "user"])))
            .expect(1)
            .mount(&server)
            .await;

        let loaders = loaders(&server);
        let parent = logged_in(&loaders).await;
        let page = loaders.users_page(&parent).await.unwrap();

        assert_eq!(page.users.len(), 1);
        assert_eq!(page.users[0].name, "alice");
        assert_eq!(page.roles, vec!["admin", "user"]);
    }

    #[tokio::test]
    async fn test_root_layout_unauthorized_health() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/health"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let loaders = loaders(&server);
        let root = loaders.root_layout().await.unwrap();
        assert!(root.health.is_none());
        assert!(root.session.is_none());
        assert!(!root.is_initialized());
    }

    #[tokio::test]
    async fn test_home_layout_reuses_parent_session() {
        let issuer = MockServer::start().await;
        mount_login(&issuer, &["user"]).await;
        let parent_session = logged_in(&loaders(&issuer)).await.session;

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let root = RootData {
            health: None,
            session: parent_session,
        };
        let home = loaders(&server).home_layout(&root).await.unwrap();
        let session = home.session.unwrap();
        assert_eq!(session.username.as_deref(), Some("alice"));
        assert!(session.has_role("user"));
    }
}
