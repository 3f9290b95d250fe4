//! Admin API endpoints.

use crate::{CaClient, Endpoint};
use ca_core::Result;

/// Admin API endpoints; require the `admin` realm role
pub struct AdminApi<'a> {
    client: &'a CaClient,
}

impl<'a> AdminApi<'a> {
    pub(crate) const fn new(client: &'a CaClient) -> Self {
        Self { client }
    }

    /// Endpoint descriptor for [`Self::list_roles`]
    #[must_use]
    pub fn list_roles_endpoint() -> Endpoint {
        Endpoint::get("listRoles", ["admin", "roles"])
    }

    /// Realm roles that can be granted to users.
    ///
    /// The backend already hides Keycloak's built-in roles.
    pub async fn list_roles(&self) -> Result<Vec<String>> {
        self.client.fetch(&Self::list_roles_endpoint()).await
    }
}
