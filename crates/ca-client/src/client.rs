//! Main certificate authority API client implementation.

use crate::api::*;
use crate::auth::{StaticToken, TokenSource};
use crate::endpoint::Endpoint;
use ca_core::{CaError, ErrorDto, Result};
use futures_util::future::{AbortRegistration, Abortable};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Default request timeout
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Message carried by [`CaError::Cancelled`] when a call is aborted
const CANCELLED_MESSAGE: &str = "Query was cancelled";

/// Certificate authority API client
#[derive(Clone)]
pub struct CaClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http: HttpClient,
    base_url: Url,
    tokens: Option<Arc<dyn TokenSource>>,
    headers: HeaderMap,
}

impl std::fmt::Debug for CaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("authenticated", &self.inner.tokens.is_some())
            .finish_non_exhaustive()
    }
}

impl CaClient {
    /// Create a client for the given base URL using default settings
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        CaClientBuilder::new(base_url).build()
    }

    /// Create a builder for custom configuration
    #[must_use]
    pub fn builder(base_url: impl Into<String>) -> CaClientBuilder {
        CaClientBuilder::new(base_url)
    }

    /// The configured base URL
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// A copy of this client that sends `headers` on every request.
    ///
    /// These override both the default headers and the bearer token.
    #[must_use]
    pub fn with_headers(&self, headers: HeaderMap) -> Self {
        let mut merged = self.inner.headers.clone();
        for (name, value) in &headers {
            merged.insert(name.clone(), value.clone());
        }

        Self {
            inner: Arc::new(ClientInner {
                http: self.inner.http.clone(),
                base_url: self.inner.base_url.clone(),
                tokens: self.inner.tokens.clone(),
                headers: merged,
            }),
        }
    }

    /// Health and version endpoints
    #[must_use]
    pub fn common(&self) -> CommonApi<'_> {
        CommonApi::new(self)
    }

    /// Admin-only endpoints
    #[must_use]
    pub fn admin(&self) -> AdminApi<'_> {
        AdminApi::new(self)
    }

    /// Root/intermediate certificate and signing endpoints
    #[must_use]
    pub fn certificates(&self) -> CertificatesApi<'_> {
        CertificatesApi::new(self)
    }

    /// Client management endpoints
    #[must_use]
    pub fn clients(&self) -> ClientsApi<'_> {
        ClientsApi::new(self)
    }

    /// Signing request history endpoints
    #[must_use]
    pub fn signing_requests(&self) -> SigningRequestsApi<'_> {
        SigningRequestsApi::new(self)
    }

    /// User management endpoints
    #[must_use]
    pub fn users(&self) -> UsersApi<'_> {
        UsersApi::new(self)
    }

    /// Perform a request without a body and decode the JSON response
    pub(crate) async fn fetch<T: DeserializeOwned>(&self, endpoint: &Endpoint) -> Result<T> {
        let response = self.send(endpoint, None::<&()>).await?;
        self.handle_response(response).await
    }

    /// Perform a request with a JSON body and decode the JSON response
    pub(crate) async fn submit<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        endpoint: &Endpoint,
        body: &B,
    ) -> Result<T> {
        let response = self.send(endpoint, Some(body)).await?;
        self.handle_response(response).await
    }

    /// Perform a request whose success response has no body
    pub(crate) async fn execute(&self, endpoint: &Endpoint) -> Result<()> {
        let response = self.send(endpoint, None::<&()>).await?;
        self.handle_empty_response(response).await
    }

    async fn send<B: Serialize + Sync>(
        &self,
        endpoint: &Endpoint,
        body: Option<&B>,
    ) -> Result<reqwest::Response> {
        let url = self.build_url(endpoint)?;
        debug!(operation = endpoint.operation(), method = %endpoint.method(), url = %url, "API request");

        let mut request = self.inner.http.request(endpoint.method().clone(), url);

        if !endpoint.query().is_empty() {
            request = request.query(endpoint.query());
        }

        if let Some(token) = self.inner.tokens.as_ref().and_then(|t| t.bearer_token()) {
            request = request.bearer_auth(token);
        }

        // Applied after the bearer token so explicit headers win
        request = request.headers(self.inner.headers.clone());

        if let Some(body) = body {
            request = request.json(body);
        }

        request.send().await.map_err(transport_error)
    }

    /// Build the full URL, percent-encoding each path segment
    fn build_url(&self, endpoint: &Endpoint) -> Result<Url> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| CaError::InvalidUrl(self.inner.base_url.to_string()))?
            .pop_if_empty()
            .extend(endpoint.segments());
        Ok(url)
    }

    /// Handle an API response that returns JSON
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if status.is_success() {
            let body = response.bytes().await.map_err(transport_error)?;
            serde_json::from_slice(&body).map_err(CaError::Json)
        } else {
            self.handle_error(status, response).await
        }
    }

    /// Handle an API response that returns no body
    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<()> {
        let status = response.status();

        if status.is_success() {
            Ok(())
        } else {
            self.handle_error(status, response).await
        }
    }

    /// Convert an error response to a CaError
    async fn handle_error<T>(
        &self,
        status: reqwest::StatusCode,
        response: reqwest::Response,
    ) -> Result<T> {
        let body = response.text().await.unwrap_or_default();

        let message = serde_json::from_str::<ErrorDto>(&body)
            .map(|dto| dto.describe().to_string())
            .ok()
            .or_else(|| (!body.trim().is_empty()).then(|| body.clone()))
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_string());

        if status == reqwest::StatusCode::UNAUTHORIZED {
            warn!(%message, "request rejected as unauthenticated");
        }

        Err(CaError::from_status(status.as_u16(), message))
    }
}

/// Run an API call that can be cancelled through the matching
/// [`AbortHandle`](futures_util::future::AbortHandle).
///
/// ```rust,ignore
/// let (handle, registration) = AbortHandle::new_pair();
/// let call = abortable(registration, client.clients().list(false));
/// handle.abort();
/// assert!(matches!(call.await, Err(CaError::Cancelled(_))));
/// ```
pub async fn abortable<F, T>(registration: AbortRegistration, call: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match Abortable::new(call, registration).await {
        Ok(result) => result,
        Err(_) => {
            debug!("API call aborted");
            Err(CaError::Cancelled(CANCELLED_MESSAGE.to_string()))
        }
    }
}

fn transport_error(e: reqwest::Error) -> CaError {
    if e.is_timeout() {
        CaError::Timeout
    } else if e.is_connect() {
        CaError::Connection(e.to_string())
    } else if e.is_decode() {
        CaError::Http(format!("invalid response body: {e}"))
    } else {
        CaError::Http(e.to_string())
    }
}

/// Builder for configuring a [`CaClient`]
pub struct CaClientBuilder {
    base_url: String,
    timeout: Duration,
    user_agent: String,
    tokens: Option<Arc<dyn TokenSource>>,
    headers: HeaderMap,
}

impl CaClientBuilder {
    /// Create a new builder for the given base URL
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: format!("ca-admin/{}", env!("CARGO_PKG_VERSION")),
            tokens: None,
            headers: HeaderMap::new(),
        }
    }

    /// Set the request timeout
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the User-Agent header
    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    /// Pull bearer tokens from `source` on every request
    #[must_use]
    pub fn token_source(mut self, source: Arc<dyn TokenSource>) -> Self {
        self.tokens = Some(source);
        self
    }

    /// Always send the given bearer token (e.g. a client JWT)
    #[must_use]
    pub fn bearer_token(self, token: impl Into<String>) -> Self {
        self.token_source(Arc::new(StaticToken::new(token)))
    }

    /// Send an extra header on every request
    pub fn header(mut self, name: &str, value: &str) -> Result<Self> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| CaError::Config(format!("invalid header name {name}: {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| CaError::Config(format!("invalid header value: {e}")))?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Build the client
    pub fn build(self) -> Result<CaClient> {
        let base_url = Url::parse(&self.base_url)
            .map_err(|e| CaError::InvalidUrl(format!("{}: {e}", self.base_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(CaError::InvalidUrl(self.base_url));
        }

        let http = HttpClient::builder()
            .timeout(self.timeout)
            .user_agent(&self.user_agent)
            .gzip(true)
            .build()
            .map_err(|e| CaError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(CaClient {
            inner: Arc::new(ClientInner {
                http,
                base_url,
                tokens: self.tokens,
                headers: self.headers,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AbortHandle;
    use serde_json::json;
    use tokio_test::assert_err;
    use wiremock::matchers::{header, header_exists, method, path};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    fn health() -> serde_json::Value {
        json!({ "version": "0.1.0", "status": "OK", "ok": true, "isInitialized": false })
    }

    #[tokio::test]
    async fn test_no_authorization_without_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(health()))
            .expect(1)
            .mount(&server)
            .await;

        let client = CaClient::new(server.uri()).unwrap();
        let info = client.common().health_check().await.unwrap();
        assert_eq!(info.version, "0.1.0");

        let received: Vec<Request> = server.received_requests().await.unwrap();
        assert!(!received[0].headers.contains_key("authorization"));
    }

    #[tokio::test]
    async fn test_bearer_token_attached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/admin/roles"))
            .and(header("authorization", "Bearer abc.def.ghi"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(["admin", "user"])))
            .expect(1)
            .mount(&server)
            .await;

        let client = CaClient::builder(server.uri())
            .bearer_token("abc.def.ghi")
            .build()
            .unwrap();
        let roles = client.admin().list_roles().await.unwrap();
        assert_eq!(roles, vec!["admin".to_string(), "user".to_string()]);
    }

    #[tokio::test]
    async fn test_explicit_headers_override_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/health"))
            .and(header("authorization", "Bearer override"))
            .and(header_exists("x-request-id"))
            .respond_with(ResponseTemplate::new(200).set_body_json(health()))
            .expect(1)
            .mount(&server)
            .await;

        let mut extra = HeaderMap::new();
        extra.insert("authorization", HeaderValue::from_static("Bearer override"));
        extra.insert("x-request-id", HeaderValue::from_static("42"));

        let client = CaClient::builder(server.uri())
            .bearer_token("from-source")
            .build()
            .unwrap()
            .with_headers(extra);
        client.common().health_check().await.unwrap();
    }

    #[tokio::test]
    async fn test_error_dto_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/certificate/root"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "code": 404,
                "error": "Not Found",
                "message": "No active root certificate"
            })))
            .mount(&server)
            .await;

        let client = CaClient::new(server.uri()).unwrap();
        let err = client.certificates().root().await.unwrap_err();
        assert_eq!(err.status_code(), Some(404));
        assert!(err.to_string().contains("No active root certificate"));
    }

    #[tokio::test]
    async fn test_plain_text_error_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/health"))
            .respond_with(ResponseTemplate::new(502).set_body_string("upstream down"))
            .mount(&server)
            .await;

        let client = CaClient::new(server.uri()).unwrap();
        let err = client.common().health_check().await.unwrap_err();
        assert!(matches!(err, CaError::Api { code: 502, ref message } if message == "upstream down"));
    }

    #[tokio::test]
    async fn test_base_url_with_path_prefix() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ca/api/v1/health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(health()))
            .expect(1)
            .mount(&server)
            .await;

        let client = CaClient::new(format!("{}/ca/", server.uri())).unwrap();
        client.common().health_check().await.unwrap();
    }

    #[tokio::test]
    async fn test_abort_cancels_call() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/health"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(health())
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let client = CaClient::new(server.uri()).unwrap();
        let (handle, registration) = AbortHandle::new_pair();
        handle.abort();

        let result = abortable(registration, client.common().health_check()).await;
        let err = assert_err!(result);
        assert!(matches!(err, CaError::Cancelled(ref msg) if msg == CANCELLED_MESSAGE));
    }

    #[tokio::test]
    async fn test_connection_refused() {
        let client = CaClient::new("http://127.0.0.1:9").unwrap();
        let err = client.common().health_check().await.unwrap_err();
        assert!(!err.is_http_status());
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            CaClient::new("mailto:ca@example.com"),
            Err(CaError::InvalidUrl(_))
        ));
        assert!(matches!(CaClient::new("::"), Err(CaError::InvalidUrl(_))));
    }
}
