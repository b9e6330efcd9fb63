use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use x509_parser::prelude::*;

use crate::error::CertificateError;

const PEM_PREFIX: &[u8] = b"-----BEGIN";

fn name_attributes(name: &X509Name<'_>) -> Vec<(String, String)> {
    name.iter_attributes()
        .map(|attr| {
            let key = x509_parser::objects::oid2abbrev(
                attr.attr_type(),
                x509_parser::objects::oid_registry(),
            )
            .map(str::to_string)
            .unwrap_or_else(|_| attr.attr_type().to_id_string());
            let value = attr
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|_| format!("#{}", hex::encode(attr.as_slice())));
            (key, value)
        })
        .collect()
}

/// Where a certificate stands relative to its validity window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidityState {
    Valid,
    Expired,
    NotYetValid,
}

/// A parsed client or issuer certificate.
///
/// Owns the DER encoding and the fields the gateway inspects on every
/// request; the full `x509-parser` view is re-derived on demand through
/// [`ClientCertificate::x509`].
#[derive(Debug, Clone)]
pub struct ClientCertificate {
    der: Vec<u8>,
    thumbprint: String,
    serial: String,
    subject_dn: String,
    issuer_dn: String,
    issuer_attributes: Vec<(String, String)>,
    subject_raw: Vec<u8>,
    issuer_raw: Vec<u8>,
    not_before: DateTime<Utc>,
    not_after: DateTime<Utc>,
}

impl ClientCertificate {
    /// Parse either a PEM block or raw DER bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CertificateError> {
        let start = bytes
            .iter()
            .position(|b| !b.is_ascii_whitespace())
            .unwrap_or(0);
        let trimmed = bytes.get(start..).unwrap_or(bytes);

        if trimmed.starts_with(PEM_PREFIX) {
            let block =
                ::pem::parse(trimmed).map_err(|e| CertificateError::InvalidPem(e.to_string()))?;
            return Self::from_der(block.contents().to_vec());
        }
        Self::from_der(bytes.to_vec())
    }

    pub fn from_der(der: Vec<u8>) -> Result<Self, CertificateError> {
        // Thumbprint over the exact DER bytes presented
        let mut hasher = Sha256::new();
        hasher.update(&der);
        let thumbprint = hex::encode(hasher.finalize());

        let (
            serial,
            subject_dn,
            issuer_dn,
            issuer_attributes,
            subject_raw,
            issuer_raw,
            not_before,
            not_after,
        ) = {
            let (_rem, cert) = X509Certificate::from_der(&der)
                .map_err(|e| CertificateError::InvalidDer(e.to_string()))?;

            let not_before_time = cert.validity().not_before.to_datetime();
            let not_after_time = cert.validity().not_after.to_datetime();
            let not_before = DateTime::<Utc>::from_timestamp(not_before_time.unix_timestamp(), 0)
                .ok_or(CertificateError::InvalidValidity)?;
            let not_after = DateTime::<Utc>::from_timestamp(not_after_time.unix_timestamp(), 0)
                .ok_or(CertificateError::InvalidValidity)?;

            (
                cert.serial.to_str_radix(16),
                cert.subject().to_string(),
                cert.issuer().to_string(),
                name_attributes(cert.issuer()),
                cert.subject().as_raw().to_vec(),
                cert.issuer().as_raw().to_vec(),
                not_before,
                not_after,
            )
        };

        Ok(Self {
            der,
            thumbprint,
            serial,
            subject_dn,
            issuer_dn,
            issuer_attributes,
            subject_raw,
            issuer_raw,
            not_before,
            not_after,
        })
    }

    /// Borrowing `x509-parser` view over the owned DER bytes
    pub fn x509(&self) -> Result<X509Certificate<'_>, CertificateError> {
        X509Certificate::from_der(&self.der)
            .map(|(_, cert)| cert)
            .map_err(|e| CertificateError::InvalidDer(e.to_string()))
    }

    pub fn der(&self) -> &[u8] {
        &self.der
    }

    /// Lowercase hex SHA-256 of the DER encoding
    pub fn thumbprint(&self) -> &str {
        &self.thumbprint
    }

    /// Lowercase hex serial number
    pub fn serial(&self) -> &str {
        &self.serial
    }

    pub fn subject_dn(&self) -> &str {
        &self.subject_dn
    }

    pub fn issuer_dn(&self) -> &str {
        &self.issuer_dn
    }

    /// Issuer attributes as `(TYPE, value)` pairs in encoding order.
    ///
    /// Values are unescaped; non-string values are rendered as `#` followed
    /// by the hex of their content octets.
    pub fn issuer_attributes(&self) -> &[(String, String)] {
        &self.issuer_attributes
    }

    pub fn subject_raw(&self) -> &[u8] {
        &self.subject_raw
    }

    pub fn issuer_raw(&self) -> &[u8] {
        &self.issuer_raw
    }

    pub fn not_before(&self) -> DateTime<Utc> {
        self.not_before
    }

    pub fn not_after(&self) -> DateTime<Utc> {
        self.not_after
    }

    /// Subject and issuer names are byte-identical
    pub fn is_self_signed(&self) -> bool {
        self.subject_raw == self.issuer_raw
    }

    pub fn validity_at(&self, now: DateTime<Utc>) -> ValidityState {
        if now < self.not_before {
            ValidityState::NotYetValid
        } else if now > self.not_after {
            ValidityState::Expired
        } else {
            ValidityState::Valid
        }
    }
}
