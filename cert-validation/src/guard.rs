use chrono::{DateTime, Utc};
use error_common::GatewayError;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::cache::CertificateRevocationCache;
use crate::certificate::ClientCertificate;
use crate::config::RevocationConfig;
use crate::lifecycle::{
    ensure_valid_at, leaf_certificate, revocation_exemption, ExcludedIssuers, RevocationExemption,
};
use crate::revocation::{RevocationValidator, RevocationValidatorSelector, ValidatorRegistry};
use crate::service::CertValidationService;
use crate::truststore::IssuerResolver;

/// Lifecycle gate plus revocation chain for presented client certificates.
///
/// Owns the revocation cache; one instance per gateway.
pub struct RevocationGuard {
    enabled: bool,
    excluded_issuers: ExcludedIssuers,
    issuer_resolver: Arc<dyn IssuerResolver>,
    validators: Vec<Arc<dyn RevocationValidator>>,
    service: Arc<CertValidationService>,
    cache: CertificateRevocationCache,
}

impl RevocationGuard {
    pub fn new(
        config: &RevocationConfig,
        service: Arc<CertValidationService>,
        issuer_resolver: Arc<dyn IssuerResolver>,
        validators: Vec<Arc<dyn RevocationValidator>>,
    ) -> Self {
        Self {
            enabled: config.enabled,
            excluded_issuers: ExcludedIssuers::new(&config.excluded_issuers),
            issuer_resolver,
            validators,
            service,
            cache: CertificateRevocationCache::new(config.cache_ttl(), config.cache_max_entries),
        }
    }

    /// Build the validator chain from the configured strategies
    pub fn from_config(
        config: &RevocationConfig,
        registry: ValidatorRegistry,
        service: Arc<CertValidationService>,
        issuer_resolver: Arc<dyn IssuerResolver>,
    ) -> Self {
        let validators = RevocationValidatorSelector::new(registry)
            .select(&config.validators, &config.validator_settings());
        Self::new(config, service, issuer_resolver, validators)
    }

    pub fn cache(&self) -> &CertificateRevocationCache {
        &self.cache
    }

    /// Full gate for a presented chain: parse, validity window, revocation.
    ///
    /// # Errors
    ///
    /// The first failing step, as a [`GatewayError`].
    pub async fn check_chain(
        &self,
        chain: Option<&[Vec<u8>]>,
        now: DateTime<Utc>,
    ) -> Result<ClientCertificate, GatewayError> {
        let cert = leaf_certificate(chain)?;
        ensure_valid_at(&cert, now)?;

        if !self.enabled {
            debug!(serial = cert.serial(), "Revocation validation disabled");
            return Ok(cert);
        }
        if self.is_revoked(&cert).await {
            return Err(GatewayError::CertificateRevoked {
                serial: cert.serial().to_string(),
            });
        }
        Ok(cert)
    }

    /// Cached revocation decision; only a "not revoked" outcome is remembered
    pub async fn is_revoked(&self, cert: &ClientCertificate) -> bool {
        if self.cache.is_known_good(cert.thumbprint()) {
            debug!(serial = cert.serial(), "Revocation cache hit");
            return false;
        }

        if self.is_revocation_success(cert).await {
            self.cache.remember_not_revoked(cert.thumbprint());
            false
        } else {
            true
        }
    }

    /// Exemptions, issuer lookup and the validator chain, without the cache
    pub async fn is_revocation_success(&self, cert: &ClientCertificate) -> bool {
        match revocation_exemption(cert, &self.excluded_issuers) {
            Some(RevocationExemption::SelfSigned) => {
                debug!(serial = cert.serial(), "Self-signed certificate; skipping revocation check");
                return true;
            }
            Some(RevocationExemption::ExcludedIssuer) => {
                info!(
                    serial = cert.serial(),
                    issuer = cert.issuer_dn(),
                    "Issuer excluded from revocation check"
                );
                return true;
            }
            None => {}
        }

        let issuer = match self.issuer_resolver.find_issuer(cert) {
            Ok(issuer) => issuer,
            Err(e) => {
                error!(serial = cert.serial(), error = %e, "Certificate issuer not trusted");
                return false;
            }
        };

        self.service.verify(cert, &issuer, &self.validators).await
    }
}
