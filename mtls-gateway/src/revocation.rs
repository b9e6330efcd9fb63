use async_trait::async_trait;
use cert_validation::RevocationGuard;
use chrono::Utc;
use std::sync::Arc;
use tracing::debug;

use crate::context::RequestContext;
use crate::executor::{fail_request, GatewayExecutor};

/// Rejects expired, revoked or untrusted client certificates
pub struct CertRevocationValidationExecutor {
    guard: Arc<RevocationGuard>,
}

impl CertRevocationValidationExecutor {
    pub fn new(guard: Arc<RevocationGuard>) -> Self {
        Self { guard }
    }
}

#[async_trait]
impl GatewayExecutor for CertRevocationValidationExecutor {
    fn name(&self) -> &'static str {
        "cert_revocation_validation"
    }

    async fn pre_process_request(&self, ctx: &mut RequestContext) {
        if ctx.is_error {
            return;
        }
        let outcome = self
            .guard
            .check_chain(ctx.client_certificates(), Utc::now())
            .await;
        match outcome {
            Ok(cert) => debug!(serial = cert.serial(), "Client certificate passed revocation validation"),
            Err(e) => fail_request(self.name(), ctx, &e),
        }
    }
}
