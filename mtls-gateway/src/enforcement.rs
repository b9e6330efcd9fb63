use async_trait::async_trait;
use cert_validation::lifecycle::leaf_certificate;
use tracing::debug;

use crate::context::RequestContext;
use crate::executor::{fail_request, GatewayExecutor};

/// Rejects requests that did not present a usable client certificate
#[derive(Debug, Default)]
pub struct MtlsEnforcementExecutor;

impl MtlsEnforcementExecutor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl GatewayExecutor for MtlsEnforcementExecutor {
    fn name(&self) -> &'static str {
        "mtls_enforcement"
    }

    async fn pre_process_request(&self, ctx: &mut RequestContext) {
        if ctx.is_error {
            return;
        }
        match leaf_certificate(ctx.client_certificates()) {
            Ok(cert) => debug!(serial = cert.serial(), subject = cert.subject_dn(), "Client certificate presented"),
            Err(e) => fail_request(self.name(), ctx, &e),
        }
    }
}
