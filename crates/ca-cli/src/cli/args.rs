//! Command-line argument definitions using clap.

use crate::output::OutputFormat;
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

/// Longest token lifetime accepted, in days
const MAX_DAYS: i64 = 36_500;

/// Administration tool for a certificate authority
///
/// Manages the root and intermediate certificates, machine clients,
/// signing requests and users of a certificate authority backend.
/// Log in once with `ca-admin login`; the session is resumed afterwards.
#[derive(Parser, Debug)]
#[command(name = "ca-admin")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Backend base URL
    #[arg(short = 'u', long, env = "CA_API_BASE_URL", global = true)]
    pub api_url: Option<String>,

    /// Output format
    #[arg(short, long, global = true, value_enum)]
    pub output: Option<OutputFormat>,

    /// Log requests and session handling
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show backend health and version
    Health,

    /// Log in to the identity provider
    Login(LoginArgs),

    /// End the current session
    Logout,

    /// Show the logged in user and roles
    Whoami,

    /// List roles that can be assigned to users
    Roles,

    /// Root certificate
    Root(CertificateArgs),

    /// Intermediate certificate
    Intermediate(IntermediateArgs),

    /// Sign a certificate signing request
    Sign(SignArgs),

    /// Manage machine clients
    Client(ClientArgs),

    /// Inspect issued signing requests
    SigningRequest(SigningRequestArgs),

    /// Manage users (requires the admin role)
    User(UserArgs),

    /// Show or change UI preferences
    Prefs(PrefsArgs),

    /// Manage CLI configuration
    Config(ConfigArgs),
}

// ============================================================================
// Login command
// ============================================================================

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Username (prompted for if omitted)
    #[arg(long)]
    pub username: Option<String>,
}

// ============================================================================
// Certificate commands
// ============================================================================

#[derive(Args, Debug)]
pub struct CertificateArgs {
    #[command(subcommand)]
    pub command: CertificateCommands,
}

#[derive(Subcommand, Debug)]
pub enum CertificateCommands {
    /// Show the certificate
    Get {
        /// Also write the PEM to this file
        #[arg(long)]
        out: Option<String>,
    },

    /// Generate the certificate
    Generate {
        /// File that receives the certificate and its private key
        #[arg(long)]
        out: String,
    },
}

#[derive(Args, Debug)]
pub struct IntermediateArgs {
    #[command(subcommand)]
    pub command: IntermediateCommands,
}

#[derive(Subcommand, Debug)]
pub enum IntermediateCommands {
    /// Show the intermediate certificate
    Get {
        /// Also write the PEM to this file
        #[arg(long)]
        out: Option<String>,
    },

    /// Generate the intermediate certificate under a root
    Generate {
        /// PEM file with the root certificate and its private key, as
        /// written by `root generate --out`
        #[arg(long)]
        root_certificate: PathBuf,
    },
}

#[derive(Args, Debug)]
pub struct SignArgs {
    /// PEM encoded certificate signing request
    pub csr: PathBuf,

    /// Subject alternative names
    #[arg(short = 'n', long = "alt-name")]
    pub alternative_names: Vec<String>,

    /// Sign with a client token instead of the user session
    #[arg(long, env = "CA_CLIENT_TOKEN", hide_env_values = true)]
    pub client_token: Option<String>,

    /// Write the certificate chain to this file
    #[arg(long)]
    pub out: Option<String>,
}

// ============================================================================
// Client commands
// ============================================================================

#[derive(Args, Debug)]
pub struct ClientArgs {
    #[command(subcommand)]
    pub command: ClientCommands,
}

#[derive(Subcommand, Debug)]
pub enum ClientCommands {
    /// List your clients
    List {
        /// Include deactivated clients (defaults to the saved preference)
        #[arg(long)]
        include_inactive: bool,
    },

    /// Show a client and its signing requests
    Get {
        /// Client id
        id: String,
    },

    /// Create a client
    Create {
        /// Client name
        name: String,

        /// Days until the client token expires
        #[arg(
            long,
            default_value = "365",
            value_parser = clap::value_parser!(i64).range(1..=MAX_DAYS)
        )]
        days: i64,
    },

    /// Issue a new token for a client
    Regenerate {
        /// Client id
        id: String,

        /// Days until the new token expires
        #[arg(
            long,
            default_value = "365",
            value_parser = clap::value_parser!(i64).range(1..=MAX_DAYS)
        )]
        days: i64,
    },

    /// Deactivate a client
    Delete {
        /// Client id
        id: String,

        /// Remove the client from the database instead of deactivating it
        #[arg(long)]
        purge: bool,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

// ============================================================================
// Signing request commands
// ============================================================================

#[derive(Args, Debug)]
pub struct SigningRequestArgs {
    #[command(subcommand)]
    pub command: SigningRequestCommands,
}

#[derive(Subcommand, Debug)]
pub enum SigningRequestCommands {
    /// List all signing requests
    List,

    /// List signing requests of one client
    Client {
        /// Client id
        id: String,
    },
}

// ============================================================================
// User commands
// ============================================================================

#[derive(Args, Debug)]
pub struct UserArgs {
    #[command(subcommand)]
    pub command: UserCommands,
}

#[derive(Subcommand, Debug)]
pub enum UserCommands {
    /// List users
    List,

    /// Show a user
    Get {
        /// User id, or name with --by-name
        id: String,

        /// Look the user up by name
        #[arg(long)]
        by_name: bool,
    },

    /// Create a user
    Create {
        /// Login name
        name: String,

        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        first_name: Option<String>,

        #[arg(long)]
        last_name: Option<String>,

        /// Role to assign (repeatable)
        #[arg(short, long = "role")]
        roles: Vec<String>,

        /// Initial password (prompted for if omitted)
        #[arg(long, env = "CA_NEW_USER_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Deactivate a user
    Delete {
        /// User id
        id: String,

        /// Remove the user from the database instead of deactivating it
        #[arg(long)]
        purge: bool,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

// ============================================================================
// Preference commands
// ============================================================================

#[derive(Args, Debug)]
pub struct PrefsArgs {
    #[command(subcommand)]
    pub command: PrefsCommands,
}

#[derive(Subcommand, Debug)]
pub enum PrefsCommands {
    /// Show stored preferences
    Show,

    /// Change a preference (sideDrawerOpen, includeInactive)
    Set {
        key: String,

        #[arg(action = ArgAction::Set)]
        value: bool,
    },
}

// ============================================================================
// Config command
// ============================================================================

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key (api_url, keycloak_url, realm, client_id, username, output_format)
        key: String,

        /// Value to set
        value: String,
    },

    /// Show configuration file path
    Path,
}
