//! User management API endpoints.

use crate::{CaClient, Endpoint};
use ca_core::{CreateUserDto, Result, UserDto};

/// User management endpoints; require the `admin` realm role
pub struct UsersApi<'a> {
    client: &'a CaClient,
}

impl<'a> UsersApi<'a> {
    pub(crate) const fn new(client: &'a CaClient) -> Self {
        Self { client }
    }

    /// Endpoint descriptor for [`Self::list`]
    #[must_use]
    pub fn list_endpoint(include_inactive: bool) -> Endpoint {
        Endpoint::get("listUsers", ["user", "list"]).param("includeInactive", include_inactive)
    }

    /// Endpoint descriptor for [`Self::get`]
    #[must_use]
    pub fn get_endpoint(id: &str, include_inactive: bool) -> Endpoint {
        Endpoint::get("getUser", ["user", id]).param("includeInactive", include_inactive)
    }

    /// Endpoint descriptor for [`Self::by_name`]
    #[must_use]
    pub fn by_name_endpoint(name: &str, include_inactive: bool) -> Endpoint {
        Endpoint::get("getUserByName", ["user", "by-name", name])
            .param("includeInactive", include_inactive)
    }

    /// Create a user, in the identity provider too if it does not exist there
    pub async fn create(&self, user: &CreateUserDto) -> Result<UserDto> {
        self.client
            .submit(&Endpoint::post("createUser", ["user"]), user)
            .await
    }

    /// List all users
    pub async fn list(&self, include_inactive: bool) -> Result<Vec<UserDto>> {
        self.client.fetch(&Self::list_endpoint(include_inactive)).await
    }

    /// Get a user by id
    pub async fn get(&self, id: &str, include_inactive: bool) -> Result<UserDto> {
        self.client
            .fetch(&Self::get_endpoint(id, include_inactive))
            .await
    }

    /// Get a user by login name
    pub async fn by_name(&self, name: &str, include_inactive: bool) -> Result<UserDto> {
        self.client
            .fetch(&Self::by_name_endpoint(name, include_inactive))
            .await
    }

    /// Delete a user from the identity provider, and from the database unless
    /// `delete_in_database` is false (then it is only deactivated)
    pub async fn delete(&self, id: &str, delete_in_database: bool) -> Result<()> {
        self.client
            .execute(
                &Endpoint::delete("deleteUser", ["user", id])
                    .param("deleteInDatabase", delete_in_database),
            )
            .await
    }
}
