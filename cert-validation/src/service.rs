use error_common::GatewayError;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::cache::TppValidationCache;
use crate::certificate::ClientCertificate;
use crate::config::TppConfig;
use crate::model::{CertificateContent, Psd2Role, RevocationStatus};
use crate::psd2::extract_certificate_content;
use crate::revocation::RevocationValidator;
use crate::tpp::{TppMetadata, TppValidationService};

/// Revocation chain evaluation and TPP role authorization.
///
/// One instance is built per gateway and shared by handle; it owns the TPP
/// validation cache.
pub struct CertValidationService {
    tpp_config: TppConfig,
    tpp_service: Option<Arc<dyn TppValidationService>>,
    tpp_cache: TppValidationCache,
}

impl CertValidationService {
    pub fn new(tpp_config: TppConfig) -> Self {
        let tpp_cache = TppValidationCache::new(tpp_config.cache_ttl(), tpp_config.cache_max_entries);
        Self {
            tpp_config,
            tpp_service: None,
            tpp_cache,
        }
    }

    /// Attach the external TPP validation service
    pub fn with_tpp_service(mut self, service: Arc<dyn TppValidationService>) -> Self {
        self.tpp_service = Some(service);
        self
    }

    pub fn tpp_cache(&self) -> &TppValidationCache {
        &self.tpp_cache
    }

    // =============================================================================
    // Revocation
    // =============================================================================

    /// Run the validator chain in order.
    ///
    /// The first GOOD or REVOKED answer ends the chain. Validator errors count
    /// as UNKNOWN. When every validator is UNKNOWN, or there are none, the
    /// certificate is not verified.
    pub async fn verify(
        &self,
        peer: &ClientCertificate,
        issuer: &ClientCertificate,
        validators: &[Arc<dyn RevocationValidator>],
    ) -> bool {
        if validators.is_empty() {
            error!(serial = peer.serial(), "No revocation validators configured; certificate not verified");
            return false;
        }

        for validator in validators {
            let status = match validator.check_revocation_status(peer, issuer).await {
                Ok(status) => status,
                Err(e) => {
                    warn!(
                        serial = peer.serial(),
                        validator = validator.name(),
                        error = %e,
                        "Revocation validator failed; treating status as unknown"
                    );
                    RevocationStatus::Unknown
                }
            };

            debug!(serial = peer.serial(), validator = validator.name(), %status, "Revocation status");
            match status {
                RevocationStatus::Good => return true,
                RevocationStatus::Revoked => return false,
                RevocationStatus::Unknown => {}
            }
        }

        error!(
            serial = peer.serial(),
            issuer = issuer.subject_dn(),
            "Unable to determine revocation status from any validator"
        );
        false
    }

    // =============================================================================
    // TPP role authorization
    // =============================================================================

    /// Check the TPP behind `certificate` holds every role in `required_roles`.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::MissingRole`] naming the first role absent from the
    ///   certificate when PSD2 role matching is used
    /// - [`GatewayError::TppServiceUnavailable`] when external validation is
    ///   enabled but no service is configured or attached
    /// - [`GatewayError::NoAuthorizationStrategy`] when neither strategy is enabled
    pub async fn validate_tpp_roles(
        &self,
        certificate: &ClientCertificate,
        required_roles: &BTreeSet<Psd2Role>,
        metadata: &TppMetadata,
    ) -> Result<bool, GatewayError> {
        if self.tpp_config.tpp_validation_enabled {
            self.validate_with_service(certificate, required_roles, metadata)
                .await
        } else if self.tpp_config.psd2_role_validation_enabled {
            let content = extract_certificate_content(certificate)?;
            Self::match_required_roles(&content, required_roles)
        } else {
            Err(GatewayError::NoAuthorizationStrategy)
        }
    }

    async fn validate_with_service(
        &self,
        certificate: &ClientCertificate,
        required_roles: &BTreeSet<Psd2Role>,
        metadata: &TppMetadata,
    ) -> Result<bool, GatewayError> {
        let configured = self
            .tpp_config
            .tpp_validation_service
            .as_deref()
            .is_some_and(|name| !name.trim().is_empty());
        if !configured {
            return Err(GatewayError::TppServiceUnavailable(
                "TPP validation service implementation is not configured".to_string(),
            ));
        }
        let service = self.tpp_service.as_ref().ok_or_else(|| {
            GatewayError::TppServiceUnavailable(format!(
                "TPP validation service {} is not available",
                self.tpp_config
                    .tpp_validation_service
                    .as_deref()
                    .unwrap_or_default()
            ))
        })?;

        let cache_key = service.cache_key(certificate, required_roles, metadata);
        if self.tpp_cache.is_known_authorized(&cache_key) {
            debug!(cache_key = %cache_key, "TPP validation cache hit");
            return Ok(true);
        }

        let authorized = service
            .validate(certificate, required_roles, metadata)
            .await?;
        if authorized {
            self.tpp_cache.remember_authorized(&cache_key);
        }
        Ok(authorized)
    }

    /// Every required role must appear in the certificate's PSP or PSD2 role list
    ///
    /// # Errors
    ///
    /// [`GatewayError::MissingRole`] naming the first missing role.
    pub fn match_required_roles(
        content: &CertificateContent,
        required_roles: &BTreeSet<Psd2Role>,
    ) -> Result<bool, GatewayError> {
        if let Some(missing) = required_roles.iter().find(|role| !content.has_role(**role)) {
            debug!(role = %missing, "Required PSD2 role missing from certificate");
            return Err(GatewayError::MissingRole(missing.to_string()));
        }
        Ok(true)
    }
}
