//! Common error handling for the mTLS gateway
//!
//! Every failure the gateway reports to an API client goes through this crate.
//! Validators and other internals keep their own error types; only the
//! outcomes that callers must see are expressed as [`GatewayError`].
//!
//! # Error Categories
//!
//! - **MalformedInput**: missing or unparsable client certificate, unreadable
//!   PSD2 role metadata
//! - **PolicyRejection**: expired, revoked, or missing required PSD2 role
//! - **Configuration**: no TPP authorization strategy enabled, or an external
//!   TPP validation service configured but not available
//!
//! # Example
//!
//! ```rust
//! use error_common::{ExecutorError, GatewayError};
//!
//! let error = GatewayError::CertificateMissing;
//! let record = ExecutorError::from(&error);
//! assert_eq!(record.code, "MTLS_4001");
//! assert_eq!(record.http_status, 401);
//! ```

pub mod codes;
pub mod reporting;
pub mod types;

pub use reporting::*;
pub use types::*;
