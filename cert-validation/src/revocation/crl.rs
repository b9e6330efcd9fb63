use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, error, warn};
use x509_parser::extensions::{DistributionPointName, GeneralName, ParsedExtension};
use x509_parser::prelude::*;
use x509_parser::revocation_list::CertificateRevocationList;

use super::{RevocationValidator, ValidatorSettings};
use crate::certificate::ClientCertificate;
use crate::error::ValidatorError;
use crate::model::RevocationStatus;

/// Downloads a CRL from a distribution point
#[async_trait]
pub trait CrlFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, ValidatorError>;
}

/// Fetches CRLs over HTTP
pub struct HttpCrlFetcher {
    client: reqwest::Client,
}

impl HttpCrlFetcher {
    pub fn new(settings: &ValidatorSettings) -> Self {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.attempt_budget());

        if let Some(proxy) = &settings.proxy {
            match proxy.url().map(|url| reqwest::Proxy::all(url.as_str())) {
                Some(Ok(proxy)) => builder = builder.proxy(proxy),
                Some(Err(e)) => error!(host = %proxy.host, error = %e, "Invalid revocation proxy; fetching CRLs directly"),
                None => error!("Revocation proxy host is not configured; fetching CRLs directly"),
            }
        }

        let client = builder.build().unwrap_or_else(|_| reqwest::Client::new());
        Self { client }
    }
}

#[async_trait]
impl CrlFetcher for HttpCrlFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, ValidatorError> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }
}

/// Checks a certificate against the CRLs named in its distribution points
pub struct CrlValidator {
    settings: ValidatorSettings,
    fetcher: Arc<dyn CrlFetcher>,
}

impl CrlValidator {
    pub const NAME: &'static str = "CRL";

    pub fn new(settings: ValidatorSettings, fetcher: Arc<dyn CrlFetcher>) -> Self {
        Self { settings, fetcher }
    }

    /// URIs from the CRL distribution points extension
    pub fn distribution_points(cert: &X509Certificate<'_>) -> Vec<String> {
        let mut urls = Vec::new();
        for ext in cert.extensions() {
            if let ParsedExtension::CRLDistributionPoints(points) = ext.parsed_extension() {
                for point in points.iter() {
                    if let Some(DistributionPointName::FullName(names)) = &point.distribution_point
                    {
                        for name in names {
                            if let GeneralName::URI(uri) = name {
                                urls.push((*uri).to_string());
                            }
                        }
                    }
                }
            }
        }
        urls
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, ValidatorError> {
        let attempts = self.settings.attempts();
        for attempt in 1..=attempts {
            match tokio::time::timeout(self.settings.attempt_budget(), self.fetcher.fetch(url)).await
            {
                Ok(Ok(bytes)) => return Ok(bytes),
                Ok(Err(e)) => warn!(url, attempt, error = %e, "CRL download failed"),
                Err(_) => warn!(url, attempt, "CRL download timed out"),
            }
        }
        Err(ValidatorError::Unreachable {
            url: url.to_string(),
            attempts,
        })
    }

    /// Look the peer up in one downloaded CRL
    fn status_from_crl(
        crl_bytes: &[u8],
        peer: &ClientCertificate,
        issuer: &ClientCertificate,
    ) -> Result<RevocationStatus, ValidatorError> {
        let der = if crl_bytes.starts_with(b"-----BEGIN") {
            ::pem::parse(crl_bytes)
                .map_err(|e| ValidatorError::InvalidResponse(e.to_string()))?
                .contents()
                .to_vec()
        } else {
            crl_bytes.to_vec()
        };

        let (_, crl) = CertificateRevocationList::from_der(&der)
            .map_err(|e| ValidatorError::InvalidResponse(format!("unparsable CRL: {e}")))?;

        if crl.issuer().as_raw() != issuer.subject_raw() {
            return Err(ValidatorError::InvalidResponse(format!(
                "CRL issued by {} instead of {}",
                crl.issuer(),
                issuer.subject_dn()
            )));
        }

        let now = Utc::now().timestamp();
        if let Some(next_update) = crl.next_update() {
            if now > next_update.timestamp() {
                return Err(ValidatorError::InvalidResponse("CRL is stale".to_string()));
            }
        }

        let issuer_x509 = issuer.x509()?;
        crl.verify_signature(issuer_x509.public_key())
            .map_err(|e| ValidatorError::InvalidResponse(format!("CRL signature invalid: {e}")))?;

        let peer_x509 = peer.x509()?;
        let serial = peer_x509.raw_serial();
        let revoked = crl
            .iter_revoked_certificates()
            .any(|entry| entry.raw_serial() == serial);

        Ok(if revoked {
            RevocationStatus::Revoked
        } else {
            RevocationStatus::Good
        })
    }
}

#[async_trait]
impl RevocationValidator for CrlValidator {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn check_revocation_status(
        &self,
        peer: &ClientCertificate,
        issuer: &ClientCertificate,
    ) -> Result<RevocationStatus, ValidatorError> {
        let urls = Self::distribution_points(&peer.x509()?);
        if urls.is_empty() {
            return Err(ValidatorError::NoDistributionPoint);
        }

        for url in &urls {
            let bytes = match self.download(url).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(serial = peer.serial(), url = %url, error = %e, "Skipping CRL distribution point");
                    continue;
                }
            };
            match Self::status_from_crl(&bytes, peer, issuer) {
                Ok(status) => {
                    debug!(serial = peer.serial(), url = %url, %status, "CRL check complete");
                    return Ok(status);
                }
                Err(e) => warn!(serial = peer.serial(), url = %url, error = %e, "Unusable CRL"),
            }
        }

        Ok(RevocationStatus::Unknown)
    }
}
