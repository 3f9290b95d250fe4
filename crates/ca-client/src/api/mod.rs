//! API endpoint groups.

mod admin;
mod certificates;
mod clients;
mod common;
mod signing_requests;
mod users;

pub use admin::AdminApi;
pub use certificates::CertificatesApi;
pub use clients::ClientsApi;
pub use common::CommonApi;
pub use signing_requests::SigningRequestsApi;
pub use users::UsersApi;
