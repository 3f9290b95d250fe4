//! Signing request API endpoints.

use crate::{CaClient, Endpoint};
use ca_core::{Result, SigningRequestDto};

/// Signing request history endpoints
pub struct SigningRequestsApi<'a> {
    client: &'a CaClient,
}

impl<'a> SigningRequestsApi<'a> {
    pub(crate) const fn new(client: &'a CaClient) -> Self {
        Self { client }
    }

    /// Endpoint descriptor for [`Self::by_client_id`]
    #[must_use]
    pub fn by_client_id_endpoint(client_id: &str) -> Endpoint {
        Endpoint::get("getSigningRequestsByClientId", ["signing-request", client_id])
    }

    /// Endpoint descriptor for [`Self::list`]
    #[must_use]
    pub fn list_endpoint() -> Endpoint {
        Endpoint::get("getSigningRequests", ["signing-request"])
    }

    /// Certificates issued to one of the current user's clients
    pub async fn by_client_id(&self, client_id: &str) -> Result<Vec<SigningRequestDto>> {
        self.client
            .fetch(&Self::by_client_id_endpoint(client_id))
            .await
    }

    /// Certificates issued to any of the current user's clients
    pub async fn list(&self) -> Result<Vec<SigningRequestDto>> {
        self.client.fetch(&Self::list_endpoint()).await
    }
}
