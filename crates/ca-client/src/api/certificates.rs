//! Certificate API endpoints.

use crate::{CaClient, Endpoint};
use ca_core::{
    CaCertificateDto, GenerateIntermediateDto, NewSigningRequestDto, Result, SigningRequestDto,
};
use tracing::info;

/// Certificate API endpoints
pub struct CertificatesApi<'a> {
    client: &'a CaClient,
}

impl<'a> CertificatesApi<'a> {
    pub(crate) const fn new(client: &'a CaClient) -> Self {
        Self { client }
    }

    /// Endpoint descriptor for [`Self::intermediate`]
    #[must_use]
    pub fn intermediate_endpoint() -> Endpoint {
        Endpoint::get("getCaCertificate", ["certificate", "intermediate"])
    }

    /// Endpoint descriptor for [`Self::root`]
    #[must_use]
    pub fn root_endpoint() -> Endpoint {
        Endpoint::get("getRootCertificate", ["certificate", "root"])
    }

    /// Get the CA's intermediate certificate, the one that signs client
    /// certificates
    pub async fn intermediate(&self) -> Result<CaCertificateDto> {
        self.client.fetch(&Self::intermediate_endpoint()).await
    }

    /// Generate a new intermediate certificate signed by the given root
    /// bundle (certificate and private key, PEM)
    pub async fn generate_intermediate(
        &self,
        root_certificate: impl Into<String>,
    ) -> Result<CaCertificateDto> {
        let body = GenerateIntermediateDto {
            root_certificate: root_certificate.into(),
        };
        let cert: CaCertificateDto = self
            .client
            .submit(
                &Endpoint::post(
                    "generateIntermediate",
                    ["certificate", "intermediate", "generate"],
                ),
                &body,
            )
            .await?;
        info!(valid_until = %cert.valid_until, "intermediate certificate generated");
        Ok(cert)
    }

    /// Get the root CA certificate (public part only)
    pub async fn root(&self) -> Result<CaCertificateDto> {
        self.client.fetch(&Self::root_endpoint()).await
    }

    /// Generate a new root certificate.
    ///
    /// The response carries the only copy of the root private key; the old
    /// root is invalidated.
    pub async fn generate_root(&self) -> Result<CaCertificateDto> {
        let cert: CaCertificateDto = self
            .client
            .fetch(&Endpoint::post(
                "generateRootCertificate",
                ["certificate", "root", "generate"],
            ))
            .await?;
        info!(valid_until = %cert.valid_until, "root certificate generated");
        Ok(cert)
    }

    /// Sign a certificate signing request with the CA's intermediate.
    ///
    /// Requires a client token rather than a user session.
    pub async fn sign(&self, request: &NewSigningRequestDto) -> Result<SigningRequestDto> {
        self.client
            .submit(
                &Endpoint::post("signCertificate", ["certificate", "sign"]),
                request,
            )
            .await
    }
}
