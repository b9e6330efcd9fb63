//! Client certificate validation for the mTLS gateway
//!
//! This crate decides whether a client certificate presented over mutual TLS
//! may be used: it is parsed, checked against its validity window, checked for
//! revocation through an ordered chain of validators, and the TPP behind it
//! can be authorized for PSD2 roles.
//!
//! # Key Features
//!
//! - **Revocation Chain**: OCSP and CRL validators run in priority order;
//!   the first decisive answer wins and indeterminate results fail closed
//! - **Pluggable Strategies**: a registry maps strategy names to validator
//!   constructors; unknown names are dropped
//! - **Lifecycle Gate**: self-signed certificates and excluded issuers skip
//!   revocation checks; unknown issuers are rejected
//! - **Positive Caching**: revocation and TPP validation successes are cached
//!   with a TTL; failures are always re-evaluated
//! - **TPP Authorization**: external validation service or in-certificate
//!   PSD2 QC statement role matching
//!
//! # Example
//!
//! ```rust,no_run
//! use cert_validation::{
//!     CertValidationConfig, CertValidationService, RevocationGuard, TrustStore, ValidatorRegistry,
//! };
//! use std::sync::Arc;
//!
//! # async fn run(ca_bundle: &[u8], chain: Vec<Vec<u8>>) -> anyhow::Result<()> {
//! let config = CertValidationConfig::default();
//! let service = Arc::new(CertValidationService::new(config.tpp.clone()));
//! let guard = RevocationGuard::from_config(
//!     &config.revocation,
//!     ValidatorRegistry::with_defaults(),
//!     service,
//!     Arc::new(TrustStore::from_pem_bundle(ca_bundle)?),
//! );
//!
//! let cert = guard.check_chain(Some(chain.as_slice()), chrono::Utc::now()).await?;
//! println!("accepted {}", cert.subject_dn());
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod certificate;
pub mod config;
pub mod error;
pub mod guard;
pub mod lifecycle;
pub mod model;
pub mod psd2;
pub mod revocation;
pub mod service;
pub mod tpp;
pub mod truststore;

#[cfg(test)]
mod test_support;

pub use cache::{CertificateRevocationCache, TppValidationCache, ValidationCache};
pub use certificate::{ClientCertificate, ValidityState};
pub use config::{CertValidationConfig, RevocationConfig, RevocationValidatorEntry, TppConfig};
pub use error::{CertificateError, TrustStoreError, ValidatorError};
pub use guard::RevocationGuard;
pub use model::{CertificateContent, Psd2Role, RevocationStatus};
pub use psd2::extract_certificate_content;
pub use revocation::{
    CrlFetcher, CrlValidator, HttpCrlFetcher, OcspResponder, OcspValidator, RevocationValidator,
    RevocationProxy, RevocationValidatorSelector, ValidatorRegistry, ValidatorSettings,
};
pub use service::CertValidationService;
pub use tpp::{TppMetadata, TppValidationService};
pub use truststore::{IssuerResolver, TrustStore};
