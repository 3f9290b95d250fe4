use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A root or intermediate CA certificate
///
/// Only the public part is ever returned; the root private key is not stored
/// on the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaCertificateDto {
    /// PEM encoded certificate
    pub certificate: String,

    /// RFC 3339 timestamp the certificate expires at
    #[serde(rename = "validUntil")]
    pub valid_until: String,

    /// RFC 3339 timestamp the certificate was created at
    #[serde(rename = "createdAt")]
    pub created_at: String,
}

impl CaCertificateDto {
    /// Parsed expiry, if the backend sent a valid timestamp
    #[must_use]
    pub fn valid_until(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.valid_until)
    }

    /// Returns true if the certificate is past its expiry at `now`
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.valid_until().is_some_and(|until| until <= now)
    }
}

/// Request body for `/api/v1/certificate/intermediate/generate`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateIntermediateDto {
    /// PEM bundle of the root certificate and its private key
    #[serde(rename = "rootCertificate")]
    pub root_certificate: String,
}

/// A certificate signing request submitted by a client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSigningRequestDto {
    /// PEM encoded CSR
    pub request: String,

    /// Subject alternative names to add
    #[serde(
        rename = "alternativeNames",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub alternative_names: Option<Vec<String>>,
}

impl NewSigningRequestDto {
    /// Create a request without alternative names
    #[must_use]
    pub fn new(request: impl Into<String>) -> Self {
        Self {
            request: request.into(),
            alternative_names: None,
        }
    }

    /// Attach alternative names; an empty list is sent as absent
    #[must_use]
    pub fn with_alternative_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        self.alternative_names = if names.is_empty() { None } else { Some(names) };
        self
    }
}

/// A signing request recorded by the CA
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SigningRequestDto {
    /// Client that submitted the request
    #[serde(rename = "clientId")]
    pub client_id: String,

    /// Colon separated SHA-256 fingerprint of the issued certificate
    pub hash: String,

    /// RFC 3339 issue timestamp
    #[serde(rename = "issuedAt")]
    pub issued_at: String,

    /// PEM of the issued certificate; only present right after signing
    #[serde(default)]
    pub certificate: Option<String>,

    /// Hex serial number
    #[serde(rename = "serialNumber")]
    pub serial_number: String,

    /// Common name of the subject
    #[serde(rename = "subjectName")]
    pub subject_name: String,
}

pub(crate) fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}
