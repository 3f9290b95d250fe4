//! # ca-cli
//!
//! Command-line administration for a certificate authority backend.
//!
//! ## Features
//!
//! - **Certificates**: inspect and generate the root and intermediate CA, sign requests
//! - **Clients**: create, list, regenerate tokens and delete machine clients
//! - **Users**: manage users and their roles (requires the `admin` role)
//! - **Sessions**: Keycloak login that is resumed across invocations
//! - **Multiple output formats**: Pretty tables, JSON, CSV, YAML

pub mod cli;
pub mod config;
pub mod output;

pub use cli::run;
