//! Client library for a certificate authority backend.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use ca::{CaClient, Credentials, InitMode, KeycloakAdapter, KeycloakConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> ca::Result<()> {
//!     let auth = Arc::new(
//!         KeycloakAdapter::builder(KeycloakConfig::new("https://auth.example.com", "pki", "ca-frontend"))
//!             .credentials(Arc::new(Credentials::new("alice", "secret")))
//!             .build()?,
//!     );
//!     auth.init(InitMode::LoginRequired).await?;
//!
//!     let client = CaClient::builder("https://ca.example.com")
//!         .token_source(auth.clone())
//!         .build()?;
//!
//!     for c in client.clients().list(false).await? {
//!         println!("{} valid until {:?}", c.display_name, c.valid_until);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - `default` - Uses rustls for TLS
//! - `rustls` - Use rustls for TLS (recommended)
//! - `native-tls` - Use system native TLS
//! - `pages` - Route loaders and session preferences

// Re-export core types
pub use ca_core::*;

// Re-export client
pub use ca_client::{
    abortable, api, AbortHandle, AbortRegistration, CaClient, CaClientBuilder, CredentialProvider,
    Credentials, Endpoint, Environment, InitMode, KeycloakAdapter, KeycloakAdapterBuilder,
    KeycloakConfig, Session, StaticToken, TokenSource, AUTH_STORAGE_KEY, ENV_API_BASE_URL,
    ENV_KEYCLOAK_CLIENT_ID, ENV_KEYCLOAK_REALM, ENV_KEYCLOAK_URL,
};

#[cfg(feature = "pages")]
pub use ca_pages as pages;

// Re-export runtime for convenience
pub use tokio;
pub use serde;
pub use serde_json;
