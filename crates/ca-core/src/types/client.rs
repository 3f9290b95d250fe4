use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::certificate::parse_timestamp;

/// A machine client allowed to submit signing requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientDto {
    /// Client id (UUID)
    pub id: String,

    /// Normalized client name
    pub name: String,

    /// Name as entered by the owner
    #[serde(rename = "displayName")]
    pub display_name: String,

    /// Owning user id
    #[serde(rename = "userId")]
    pub user_id: String,

    /// Client token; only returned when creating or regenerating
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Hash of the current client token
    #[serde(rename = "tokenHash")]
    pub token_hash: String,

    /// Whether the client is active
    pub active: bool,

    /// RFC 3339 timestamp the client token expires at
    #[serde(rename = "validUntil", default, skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<String>,

    /// RFC 3339 creation timestamp
    #[serde(rename = "createdAt")]
    pub created_at: String,

    /// RFC 3339 last update timestamp
    #[serde(rename = "updatedAt")]
    pub updated_at: String,
}

impl ClientDto {
    /// Returns true if the client token has expired at `now`
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.valid_until
            .as_deref()
            .and_then(parse_timestamp)
            .is_some_and(|until| until <= now)
    }
}

/// Request body for creating a client or regenerating its token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateClientDto {
    /// Client name; required on create, ignored on regenerate
    #[serde(default)]
    pub name: Option<String>,

    /// RFC 3339 expiry of the new token, must be in the future
    #[serde(rename = "validUntil")]
    pub valid_until: String,
}

impl CreateClientDto {
    /// Body for creating a new client
    #[must_use]
    pub fn new(name: impl Into<String>, valid_until: DateTime<Utc>) -> Self {
        Self {
            name: Some(name.into()),
            valid_until: valid_until.to_rfc3339(),
        }
    }

    /// Body for regenerating an existing client's token
    #[must_use]
    pub fn regenerate(valid_until: DateTime<Utc>) -> Self {
        Self {
            name: None,
            valid_until: valid_until.to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(valid_until: Option<&str>) -> ClientDto {
        ClientDto {
            id: "9f0c".into(),
            name: "web01".into(),
            display_name: "Web 01".into(),
            user_id: "u1".into(),
            token: None,
            token_hash: "abc".into(),
            active: true,
            valid_until: valid_until.map(String::from),
            created_at: "2024-01-01T00:00:00Z".into(),
            updated_at: "2024-01-01T00:00:00Z".into(),
        }
    }

    #[test]
    fn test_expiry() {
        let now = parse_timestamp("2025-06-01T00:00:00Z").unwrap();
        assert!(client(Some("2025-01-01T00:00:00Z")).is_expired_at(now));
        assert!(!client(Some("2026-01-01T00:00:00Z")).is_expired_at(now));
        assert!(!client(None).is_expired_at(now));
    }

    #[test]
    fn test_token_not_serialized_when_absent() {
        let json = serde_json::to_value(client(None)).unwrap();
        assert!(json.get("token").is_none());
        assert!(json.get("validUntil").is_none());
        assert_eq!(json["displayName"], "Web 01");
    }
}
