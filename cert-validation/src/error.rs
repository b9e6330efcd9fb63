use thiserror::Error;

/// Failures while decoding certificate bytes
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CertificateError {
    #[error("Invalid PEM encoding: {0}")]
    InvalidPem(String),

    #[error("Failed to parse X.509 certificate: {0}")]
    InvalidDer(String),

    #[error("Invalid validity timestamp in certificate")]
    InvalidValidity,
}

/// Failures inside a single revocation validator.
///
/// These never leave the revocation chain: the orchestrator treats every one
/// of them as an indeterminate status and moves on to the next validator.
#[derive(Error, Debug)]
pub enum ValidatorError {
    #[error("Certificate has no CRL distribution point")]
    NoDistributionPoint,

    #[error("Certificate has no OCSP responder location")]
    NoResponderLocation,

    #[error("Request to {url} failed after {attempts} attempt(s)")]
    Unreachable { url: String, attempts: u32 },

    #[error("Request to {url} timed out")]
    Timeout { url: String },

    #[error("HTTP error from {url}: {message}")]
    Http { url: String, message: String },

    #[error("Invalid revocation data: {0}")]
    InvalidResponse(String),

    #[error(transparent)]
    Certificate(#[from] CertificateError),
}

impl From<reqwest::Error> for ValidatorError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http {
            url: err
                .url()
                .map(ToString::to_string)
                .unwrap_or_default(),
            message: err.to_string(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrustStoreError {
    #[error("No issuer found in trust store for {0}")]
    IssuerNotFound(String),

    #[error("Invalid trust store entry: {0}")]
    InvalidEntry(#[from] CertificateError),
}
