use async_trait::async_trait;
use cert_validation::lifecycle::leaf_certificate;
use cert_validation::{CertValidationService, Psd2Role, TppConfig};
use error_common::GatewayError;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::context::RequestContext;
use crate::executor::{fail_request, GatewayExecutor};

/// Authorizes the TPP for the PSD2 roles implied by the request's scopes
pub struct TppValidationExecutor {
    service: Arc<CertValidationService>,
    /// Lowercased scope to allowed roles
    allowed_scopes: HashMap<String, Vec<Psd2Role>>,
}

impl TppValidationExecutor {
    pub fn new(service: Arc<CertValidationService>, config: &TppConfig) -> Self {
        let allowed_scopes = config
            .allowed_scopes
            .iter()
            .map(|(scope, roles)| {
                let roles = roles
                    .iter()
                    .filter_map(|role| match role.parse::<Psd2Role>() {
                        Ok(role) => Some(role),
                        Err(e) => {
                            warn!(scope = %scope, error = %e, "Ignoring unknown role in allowed scopes");
                            None
                        }
                    })
                    .collect::<Vec<_>>();
                (scope.trim().to_lowercase(), roles)
            })
            .collect();

        Self {
            service,
            allowed_scopes,
        }
    }

    /// Union of the roles allowed for each scope; scopes match case-insensitively
    pub fn required_roles(&self, scopes: &[String]) -> BTreeSet<Psd2Role> {
        scopes
            .iter()
            .filter_map(|scope| self.allowed_scopes.get(&scope.trim().to_lowercase()))
            .flatten()
            .copied()
            .collect()
    }
}

#[async_trait]
impl GatewayExecutor for TppValidationExecutor {
    fn name(&self) -> &'static str {
        "tpp_validation"
    }

    async fn post_process_request(&self, ctx: &mut RequestContext) {
        if ctx.is_error {
            return;
        }
        let cert = match leaf_certificate(ctx.client_certificates()) {
            Ok(cert) => cert,
            Err(e) => {
                fail_request(self.name(), ctx, &e);
                return;
            }
        };

        let roles = self.required_roles(&ctx.scopes);
        if roles.is_empty() {
            let error = GatewayError::TppValidationFailed(format!(
                "no PSD2 roles are allowed for scopes {:?}",
                ctx.scopes
            ));
            fail_request(self.name(), ctx, &error);
            return;
        }

        let outcome = self
            .service
            .validate_tpp_roles(&cert, &roles, &ctx.metadata)
            .await;
        match outcome {
            Ok(true) => debug!(serial = cert.serial(), roles = ?roles, "TPP authorized"),
            Ok(false) => {
                let listed = roles
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                let error = GatewayError::TppValidationFailed(format!(
                    "TPP is not authorized for roles {listed}"
                ));
                fail_request(self.name(), ctx, &error);
            }
            Err(e) => fail_request(self.name(), ctx, &e),
        }
    }
}
