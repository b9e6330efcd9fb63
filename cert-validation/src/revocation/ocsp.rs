use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};
use x509_parser::extensions::{GeneralName, ParsedExtension};
use x509_parser::prelude::*;

use super::{RevocationValidator, ValidatorSettings};
use crate::certificate::ClientCertificate;
use crate::error::ValidatorError;
use crate::model::RevocationStatus;

const OCSP_ACCESS_METHOD_OID: &str = "1.3.6.1.5.5.7.48.1";

/// Performs a single OCSP exchange with a responder.
///
/// Request encoding, transport and response signature checks live behind
/// this trait; the validator only decides which responders to ask and how
/// often. Implementations should honour `settings.proxy`.
#[async_trait]
pub trait OcspResponder: Send + Sync {
    async fn query(
        &self,
        url: &str,
        peer: &ClientCertificate,
        issuer: &ClientCertificate,
        settings: &ValidatorSettings,
    ) -> Result<RevocationStatus, ValidatorError>;
}

/// Checks a certificate with the OCSP responders listed in its AIA extension
pub struct OcspValidator {
    settings: ValidatorSettings,
    responder: Arc<dyn OcspResponder>,
}

impl OcspValidator {
    pub const NAME: &'static str = "OCSP";

    pub fn new(settings: ValidatorSettings, responder: Arc<dyn OcspResponder>) -> Self {
        Self {
            settings,
            responder,
        }
    }

    /// OCSP responder URIs from the authority information access extension
    pub fn responder_urls(cert: &X509Certificate<'_>) -> Vec<String> {
        let mut urls = Vec::new();
        for ext in cert.extensions() {
            if let ParsedExtension::AuthorityInfoAccess(aia) = ext.parsed_extension() {
                for desc in &aia.accessdescs {
                    if desc.access_method.to_id_string() != OCSP_ACCESS_METHOD_OID {
                        continue;
                    }
                    if let GeneralName::URI(uri) = &desc.access_location {
                        urls.push((*uri).to_string());
                    }
                }
            }
        }
        urls
    }

    async fn query_with_retries(
        &self,
        url: &str,
        peer: &ClientCertificate,
        issuer: &ClientCertificate,
    ) -> RevocationStatus {
        for attempt in 1..=self.settings.attempts() {
            let query = self.responder.query(url, peer, issuer, &self.settings);
            match tokio::time::timeout(self.settings.attempt_budget(), query).await {
                Ok(Ok(status)) => return status,
                Ok(Err(e)) => warn!(url, attempt, error = %e, "OCSP query failed"),
                Err(_) => warn!(url, attempt, "OCSP query timed out"),
            }
        }
        RevocationStatus::Unknown
    }
}

#[async_trait]
impl RevocationValidator for OcspValidator {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn check_revocation_status(
        &self,
        peer: &ClientCertificate,
        issuer: &ClientCertificate,
    ) -> Result<RevocationStatus, ValidatorError> {
        let urls = Self::responder_urls(&peer.x509()?);
        if urls.is_empty() {
            return Err(ValidatorError::NoResponderLocation);
        }

        for url in &urls {
            let status = self.query_with_retries(url, peer, issuer).await;
            if status.is_decisive() {
                debug!(serial = peer.serial(), url = %url, %status, "OCSP check complete");
                return Ok(status);
            }
        }

        Ok(RevocationStatus::Unknown)
    }
}
