use thiserror::Error;

/// Result type alias for certificate authority client operations
pub type Result<T> = std::result::Result<T, CaError>;

/// Errors that can occur when talking to the CA backend or identity provider
#[derive(Error, Debug)]
pub enum CaError {
    /// Missing or rejected bearer token
    #[error("not authenticated: {message}")]
    Unauthorized {
        /// Message reported by the backend
        message: String,
    },

    /// Authenticated, but the account lacks the required role
    #[error("forbidden: {message}")]
    Forbidden {
        /// Message reported by the backend
        message: String,
    },

    /// Resource not found
    #[error("resource not found: {resource}")]
    NotFound {
        /// Description of the resource that wasn't found
        resource: String,
    },

    /// Backend rejected the request payload
    #[error("bad request: {message}")]
    BadRequest {
        /// Message reported by the backend
        message: String,
    },

    /// API returned any other error response
    #[error("API error ({code}): {message}")]
    Api {
        /// HTTP status code
        code: u16,
        /// Error message from the API
        message: String,
    },

    /// HTTP request failed before a response arrived
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Request timed out
    #[error("request timed out")]
    Timeout,

    /// Connection failed
    #[error("connection failed: {0}")]
    Connection(String),

    /// The call was aborted by its caller
    #[error("{0}")]
    Cancelled(String),

    /// JSON parsing/serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Identity provider rejected a grant or returned garbage
    #[error("identity provider error: {0}")]
    Auth(String),

    /// Login was required but no credentials were available
    #[error("login required")]
    LoginRequired,

    /// Invalid URL
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Session storage could not be read or written
    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),
}

impl CaError {
    /// Build an error from a non-success HTTP status and the message the
    /// backend attached to it
    #[must_use]
    pub fn from_status(code: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match code {
            400 => Self::BadRequest { message },
            401 => Self::Unauthorized { message },
            403 => Self::Forbidden { message },
            404 => Self::NotFound { resource: message },
            _ => Self::Api { code, message },
        }
    }

    /// Returns true if the error is due to authentication
    #[must_use]
    pub const fn is_auth_error(&self) -> bool {
        matches!(self, Self::Unauthorized { .. } | Self::LoginRequired)
    }

    /// Returns true if the error carries an upstream HTTP status
    #[must_use]
    pub const fn is_http_status(&self) -> bool {
        self.status_code().is_some()
    }

    /// Returns the HTTP status code if this error came from a response
    #[must_use]
    pub const fn status_code(&self) -> Option<u16> {
        match self {
            Self::BadRequest { .. } => Some(400),
            Self::Unauthorized { .. } => Some(401),
            Self::Forbidden { .. } => Some(403),
            Self::NotFound { .. } => Some(404),
            Self::Api { code, .. } => Some(*code),
            _ => None,
        }
    }
}
