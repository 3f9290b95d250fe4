//! Client management API endpoints.

use crate::{CaClient, Endpoint};
use ca_core::{ClientDto, CreateClientDto, Result};
use chrono::{DateTime, Utc};

/// Client management API endpoints
pub struct ClientsApi<'a> {
    client: &'a CaClient,
}

impl<'a> ClientsApi<'a> {
    pub(crate) const fn new(client: &'a CaClient) -> Self {
        Self { client }
    }

    /// Endpoint descriptor for [`Self::list`]
    #[must_use]
    pub fn list_endpoint(include_inactive: bool) -> Endpoint {
        Endpoint::get("listClients", ["client", "list"]).param("includeInactive", include_inactive)
    }

    /// Endpoint descriptor for [`Self::get`]
    #[must_use]
    pub fn get_endpoint(id: &str, include_inactive: bool) -> Endpoint {
        Endpoint::get("getClientById", ["client", id]).param("includeInactive", include_inactive)
    }

    /// Create a client owned by the current user.
    ///
    /// The returned DTO is the only one that carries the client token.
    pub async fn create(
        &self,
        name: impl Into<String>,
        valid_until: DateTime<Utc>,
    ) -> Result<ClientDto> {
        let body = CreateClientDto::new(name, valid_until);
        self.client
            .submit(&Endpoint::post("createClient", ["client"]), &body)
            .await
    }

    /// Issue a new token for a client, revoking the previous ones
    pub async fn regenerate_token(&self, id: &str, valid_until: DateTime<Utc>) -> Result<ClientDto> {
        let body = CreateClientDto::regenerate(valid_until);
        self.client
            .submit(
                &Endpoint::put("regenerateClientToken", ["client", "regenerate", id]),
                &body,
            )
            .await
    }

    /// List the current user's clients
    pub async fn list(&self, include_inactive: bool) -> Result<Vec<ClientDto>> {
        self.client.fetch(&Self::list_endpoint(include_inactive)).await
    }

    /// Get a single client owned by the current user
    pub async fn get(&self, id: &str, include_inactive: bool) -> Result<ClientDto> {
        self.client
            .fetch(&Self::get_endpoint(id, include_inactive))
            .await
    }

    /// Deactivate a client, or remove it entirely with `delete_in_database`
    pub async fn delete(&self, id: &str, delete_in_database: bool) -> Result<()> {
        self.client
            .execute(
                &Endpoint::delete("deleteClient", ["client", id])
                    .param("deleteInDatabase", delete_in_database),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use crate::CaClient;
    use chrono::TimeZone;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_json(active: bool) -> serde_json::Value {
        json!({
            "id": "0b6e1c1e-8f5e-4c54-9d7e-0f7a3f3c2a11",
            "name": "web01",
            "displayName": "Web01",
            "userId": "u1",
            "tokenHash": "deadbeef",
            "active": active,
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": "2024-01-01T00:00:00Z"
        })
    }

    #[tokio::test]
    async fn test_list_sends_include_inactive() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/client/list"))
            .and(query_param("includeInactive", "true"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([client_json(true), client_json(false)])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = CaClient::new(server.uri()).unwrap();
        let clients = client.clients().list(true).await.unwrap();
        assert_eq!(clients.len(), 2);
        assert!(!clients[1].active);
    }

    #[tokio::test]
    async fn test_create() {
        let server = MockServer::start().await;
        let mut created = client_json(true);
        created["token"] = json!("eyJ.client.token");

        Mock::given(method("POST"))
            .and(path("/api/v1/client"))
            .and(body_json(json!({
                "name": "web01",
                "validUntil": "2030-01-01T00:00:00+00:00"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(created))
            .expect(1)
            .mount(&server)
            .await;

        let client = CaClient::new(server.uri()).unwrap();
        let valid_until = chrono::Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        let dto = client.clients().create("web01", valid_until).await.unwrap();
        assert_eq!(dto.token.as_deref(), Some("eyJ.client.token"));
    }

    #[tokio::test]
    async fn test_regenerate_uses_put() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/v1/client/regenerate/abc"))
            .and(body_json(json!({
                "name": null,
                "validUntil": "2031-06-01T12:00:00+00:00"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(client_json(true)))
            .expect(1)
            .mount(&server)
            .await;

        let client = CaClient::new(server.uri()).unwrap();
        let valid_until = chrono::Utc.with_ymd_and_hms(2031, 6, 1, 12, 0, 0).unwrap();
        client
            .clients()
            .regenerate_token("abc", valid_until)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_delete_no_content() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/v1/client/abc"))
            .and(query_param("deleteInDatabase", "false"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let client = CaClient::new(server.uri()).unwrap();
        client.clients().delete("abc", false).await.unwrap();
    }

    #[tokio::test]
    async fn test_get_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/client/abc"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "code": 401,
                "error": "Unauthorized",
                "message": "Token expired"
            })))
            .mount(&server)
            .await;

        let client = CaClient::new(server.uri()).unwrap();
        let err = client.clients().get("abc", true).await.unwrap_err();
        assert!(err.is_auth_error());
    }

    #[test]
    fn test_get_query_key() {
        let key = super::ClientsApi::get_endpoint("abc", true).query_key();
        assert_eq!(key, vec!["/api/v1/client/abc", "includeInactive=true"]);
    }
}
