//! Health API endpoints.

use crate::{CaClient, Endpoint};
use ca_core::{HealthInfoDto, Result};

/// Health API endpoints
pub struct CommonApi<'a> {
    client: &'a CaClient,
}

impl<'a> CommonApi<'a> {
    pub(crate) const fn new(client: &'a CaClient) -> Self {
        Self { client }
    }

    /// Endpoint descriptor for [`Self::health_check`]
    #[must_use]
    pub fn health_check_endpoint() -> Endpoint {
        Endpoint::get("healthCheck", ["health"])
    }

    /// Backend version, identity provider version and initialization state.
    /// Does not require authentication.
    pub async fn health_check(&self) -> Result<HealthInfoDto> {
        self.client.fetch(&Self::health_check_endpoint()).await
    }
}
