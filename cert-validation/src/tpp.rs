use async_trait::async_trait;
use error_common::GatewayError;
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};

use crate::certificate::ClientCertificate;
use crate::model::Psd2Role;

/// Request attributes forwarded to the TPP validation service
pub type TppMetadata = HashMap<String, Value>;

/// External service deciding whether a TPP holds the required roles,
/// typically backed by a national competent authority register.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TppValidationService: Send + Sync {
    /// `Ok(true)` when the TPP is authorized for every role in `roles`.
    ///
    /// Implementations report transport or upstream failures as
    /// [`GatewayError::TppServiceUnavailable`].
    async fn validate(
        &self,
        certificate: &ClientCertificate,
        roles: &BTreeSet<Psd2Role>,
        metadata: &TppMetadata,
    ) -> Result<bool, GatewayError>;

    /// Key under which a positive result for this request may be cached
    fn cache_key(
        &self,
        certificate: &ClientCertificate,
        roles: &BTreeSet<Psd2Role>,
        metadata: &TppMetadata,
    ) -> String;
}
