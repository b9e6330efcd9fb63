use error_common::ExecutorError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Per-request state shared by the executors of one request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestContext {
    /// Presented client certificate chain, leaf first, DER or PEM encoded
    #[serde(skip)]
    pub client_certificates: Option<Vec<Vec<u8>>>,

    /// OAuth scopes granted to the access token
    #[serde(default)]
    pub scopes: Vec<String>,

    /// Attributes forwarded to the TPP validation service
    #[serde(default)]
    pub metadata: HashMap<String, Value>,

    #[serde(default)]
    pub errors: Vec<ExecutorError>,

    #[serde(default)]
    pub is_error: bool,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client_certificates(mut self, chain: Vec<Vec<u8>>) -> Self {
        self.client_certificates = Some(chain);
        self
    }

    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub fn client_certificates(&self) -> Option<&[Vec<u8>]> {
        self.client_certificates.as_deref()
    }

    /// Record an error and mark the request as failed
    pub fn add_error(&mut self, error: ExecutorError) {
        self.errors.push(error);
        self.is_error = true;
    }

    pub fn first_error(&self) -> Option<&ExecutorError> {
        self.errors.first()
    }
}

/// Per-response state; the mTLS executors leave it untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResponseContext {
    pub status: u16,
    #[serde(default)]
    pub errors: Vec<ExecutorError>,
    #[serde(default)]
    pub is_error: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use error_common::GatewayError;

    #[test]
    fn test_add_error_sets_flag() {
        let mut ctx = RequestContext::new();
        assert!(!ctx.is_error);

        ctx.add_error(ExecutorError::from(GatewayError::CertificateMissing));
        assert!(ctx.is_error);
        assert_eq!(ctx.first_error().map(|e| e.code.as_str()), Some("MTLS_4001"));
    }

    #[test]
    fn test_empty_chain_reads_as_empty_slice() {
        let ctx = RequestContext::new().with_client_certificates(Vec::new());
        assert_eq!(ctx.client_certificates().map(<[Vec<u8>]>::len), Some(0));
    }
}
