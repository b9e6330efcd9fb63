//! mTLS gateway executors
//!
//! Request pipeline stages that enforce mutual TLS for financial-grade APIs:
//!
//! - [`MtlsEnforcementExecutor`]: a parsable client certificate must be present
//! - [`CertRevocationValidationExecutor`]: the certificate must be within its
//!   validity window, issued by a trusted CA and not revoked
//! - [`TppValidationExecutor`]: the TPP must hold the PSD2 roles implied by the
//!   requested scopes
//!
//! Executors do nothing on responses and do nothing once an earlier stage has
//! marked the request as failed. Failures are attached to the
//! [`RequestContext`] as [`error_common::ExecutorError`] records.
//!
//! # Example
//!
//! ```rust,no_run
//! use mtls_gateway::{GatewayConfig, MtlsGateway, RequestContext};
//! use cert_validation::TrustStore;
//!
//! # async fn run(ca_bundle: &[u8], chain: Vec<Vec<u8>>) -> anyhow::Result<()> {
//! let config = GatewayConfig::from_env()?;
//! mtls_gateway::init_logging(&config.logging)?;
//!
//! let gateway = MtlsGateway::builder(config.validation)
//!     .trust_store(TrustStore::from_pem_bundle(ca_bundle)?)
//!     .build();
//!
//! let mut ctx = RequestContext::new()
//!     .with_client_certificates(chain)
//!     .with_scopes(["accounts"]);
//! gateway.process_request(&mut ctx).await;
//! if ctx.is_error {
//!     println!("{}", serde_json::to_string(&ctx.errors)?);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod context;
pub mod enforcement;
pub mod executor;
pub mod gateway;
pub mod logging;
pub mod revocation;
pub mod tpp;

pub use config::{GatewayConfig, LoggingConfig};
pub use context::{RequestContext, ResponseContext};
pub use enforcement::MtlsEnforcementExecutor;
pub use executor::GatewayExecutor;
pub use gateway::{MtlsGateway, MtlsGatewayBuilder};
pub use logging::init_logging;
pub use revocation::CertRevocationValidationExecutor;
pub use tpp::TppValidationExecutor;
