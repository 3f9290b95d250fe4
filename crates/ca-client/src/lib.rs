//! HTTP client for the certificate authority API.
//!
//! This crate provides the main [`CaClient`] for calling the backend and the
//! [`KeycloakAdapter`] that authenticates against the identity provider and
//! feeds bearer tokens into the client.

mod auth;
mod client;
mod config;
mod endpoint;
pub mod api;

pub use auth::{
    CredentialProvider, Credentials, InitMode, KeycloakAdapter, KeycloakAdapterBuilder, Session,
    AUTH_STORAGE_KEY,
    StaticToken, TokenSource,
};
pub use client::{abortable, CaClient, CaClientBuilder};
pub use config::*;
pub use endpoint::Endpoint;
pub use ca_core::{CaError, Result};
pub use futures_util::future::{AbortHandle, AbortRegistration};
