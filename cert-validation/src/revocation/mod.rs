//! Revocation validators and the strategy registry that builds them.

pub mod crl;
pub mod ocsp;
pub mod selector;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::certificate::ClientCertificate;
use crate::error::ValidatorError;
use crate::model::RevocationStatus;

pub use crl::{CrlFetcher, CrlValidator, HttpCrlFetcher};
pub use ocsp::{OcspResponder, OcspValidator};
pub use selector::{RevocationValidatorSelector, ValidatorFactory, ValidatorRegistry};

/// Forward proxy for revocation lookups
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RevocationProxy {
    pub host: String,
    pub port: u16,
}

impl RevocationProxy {
    /// `http://host:port`, or `None` when no host is set
    pub fn url(&self) -> Option<String> {
        let host = self.host.trim();
        if host.is_empty() {
            return None;
        }
        Some(format!("http://{host}:{}", self.port))
    }
}

/// Retry and timeout budget shared by every validator in a chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatorSettings {
    /// Retries after the first attempt, per responder or distribution point
    pub retry_count: u32,
    pub connect_timeout: Duration,
    pub connection_request_timeout: Duration,
    pub socket_timeout: Duration,
    /// Route CRL and OCSP traffic through this proxy
    pub proxy: Option<RevocationProxy>,
}

impl Default for ValidatorSettings {
    fn default() -> Self {
        Self {
            retry_count: 3,
            connect_timeout: Duration::from_millis(10_000),
            connection_request_timeout: Duration::from_millis(10_000),
            socket_timeout: Duration::from_millis(10_000),
            proxy: None,
        }
    }
}

impl ValidatorSettings {
    /// Upper bound on a single attempt
    pub fn attempt_budget(&self) -> Duration {
        self.connect_timeout
            .saturating_add(self.connection_request_timeout)
            .saturating_add(self.socket_timeout)
    }

    /// The first attempt plus `retry_count` retries
    pub fn attempts(&self) -> u32 {
        self.retry_count.saturating_add(1)
    }
}

/// A strategy that can tell whether a certificate has been revoked
#[async_trait]
pub trait RevocationValidator: Send + Sync {
    /// Strategy name, e.g. `OCSP` or `CRL`
    fn name(&self) -> &str;

    /// Check `peer` against its `issuer`.
    ///
    /// Errors are treated by the caller exactly like [`RevocationStatus::Unknown`].
    async fn check_revocation_status(
        &self,
        peer: &ClientCertificate,
        issuer: &ClientCertificate,
    ) -> Result<RevocationStatus, ValidatorError>;
}
