use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::codes::{http, mtls, tpp};

/// How an error should be treated by the caller.
///
/// Transient validator failures never reach this type; they are absorbed
/// inside the revocation chain and surface only as an indeterminate status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The client sent something unusable (absent or unparsable certificate,
    /// malformed role metadata).
    MalformedInput,
    /// A well-formed request failed a policy check.
    PolicyRejection,
    /// The gateway itself is misconfigured.
    Configuration,
}

/// Errors surfaced by the mTLS gateway to the request pipeline
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// No client certificate was presented
    #[error("Client certificate is missing")]
    CertificateMissing,

    /// The presented bytes are not a valid X.509 certificate
    #[error("Client certificate is invalid: {0}")]
    CertificateInvalid(String),

    /// The certificate's validity window has ended
    #[error("Certificate with serial {serial} issued by {issuer} is expired")]
    CertificateExpired { serial: String, issuer: String },

    /// The certificate's validity window has not started yet
    #[error("Certificate with serial {serial} issued by {issuer} is not yet valid")]
    CertificateNotYetValid { serial: String, issuer: String },

    /// The revocation chain did not confirm the certificate as good
    #[error("Certificate with serial {serial} is revoked or its status could not be verified")]
    CertificateRevoked { serial: String },

    /// A required PSD2 role is absent from the certificate
    #[error("Required PSD2 role {0} is not present in the certificate")]
    MissingRole(String),

    /// The certificate's PSD2 role metadata could not be read
    #[error("Unable to read PSD2 roles from certificate: {0}")]
    MalformedRoleMetadata(String),

    /// The TPP was not authorized for the requested roles
    #[error("TPP validation failed: {0}")]
    TppValidationFailed(String),

    /// The external TPP validation service is configured but unusable
    #[error("TPP validation service unavailable: {0}")]
    TppServiceUnavailable(String),

    /// Neither external TPP validation nor PSD2 role matching is enabled
    #[error("Neither TPP validation nor PSD2 role validation is enabled")]
    NoAuthorizationStrategy,
}

impl GatewayError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::CertificateMissing => mtls::CERTIFICATE_MISSING,
            Self::CertificateInvalid(_) => mtls::CERTIFICATE_INVALID,
            Self::CertificateExpired { .. } | Self::CertificateNotYetValid { .. } => {
                mtls::CERTIFICATE_EXPIRED
            }
            Self::CertificateRevoked { .. } => mtls::CERTIFICATE_REVOKED,
            Self::MissingRole(_)
            | Self::MalformedRoleMetadata(_)
            | Self::TppValidationFailed(_) => tpp::ROLE_INVALID,
            Self::TppServiceUnavailable(_) | Self::NoAuthorizationStrategy => {
                tpp::VALIDATION_SERVICE_UNAVAILABLE
            }
        }
    }

    /// Short human readable summary, stable per code
    pub fn title(&self) -> &'static str {
        match self {
            Self::CertificateMissing => "Invalid mutual TLS request. Client certificate is missing",
            Self::CertificateInvalid(_) => "Invalid mutual TLS request. Client certificate is invalid",
            Self::CertificateExpired { .. } | Self::CertificateNotYetValid { .. } => {
                "Client certificate is expired"
            }
            Self::CertificateRevoked { .. } => "Client certificate is revoked",
            Self::MissingRole(_)
            | Self::MalformedRoleMetadata(_)
            | Self::TppValidationFailed(_) => "TPP role validation failed",
            Self::TppServiceUnavailable(_) | Self::NoAuthorizationStrategy => {
                "TPP validation service unavailable"
            }
        }
    }

    pub fn description(&self) -> String {
        self.to_string()
    }

    pub fn http_status(&self) -> u16 {
        match self.kind() {
            ErrorKind::Configuration => http::SERVICE_UNAVAILABLE,
            ErrorKind::MalformedInput | ErrorKind::PolicyRejection => match self {
                Self::MissingRole(_)
                | Self::MalformedRoleMetadata(_)
                | Self::TppValidationFailed(_) => http::FORBIDDEN,
                _ => http::UNAUTHORIZED,
            },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::CertificateMissing
            | Self::CertificateInvalid(_)
            | Self::MalformedRoleMetadata(_) => ErrorKind::MalformedInput,
            Self::CertificateExpired { .. }
            | Self::CertificateNotYetValid { .. }
            | Self::CertificateRevoked { .. }
            | Self::MissingRole(_)
            | Self::TppValidationFailed(_) => ErrorKind::PolicyRejection,
            Self::TppServiceUnavailable(_) | Self::NoAuthorizationStrategy => {
                ErrorKind::Configuration
            }
        }
    }
}

/// Result type alias for gateway operations
pub type Result<T> = std::result::Result<T, GatewayError>;
