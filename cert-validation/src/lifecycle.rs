use chrono::{DateTime, Utc};
use error_common::GatewayError;
use std::collections::BTreeSet;
use tracing::warn;

use crate::certificate::{ClientCertificate, ValidityState};

/// Parse the leaf (index 0) of the presented chain
///
/// # Errors
///
/// [`GatewayError::CertificateMissing`] for an absent or empty chain,
/// [`GatewayError::CertificateInvalid`] when the leaf does not parse.
pub fn leaf_certificate(chain: Option<&[Vec<u8>]>) -> Result<ClientCertificate, GatewayError> {
    let leaf = chain
        .and_then(<[Vec<u8>]>::first)
        .ok_or(GatewayError::CertificateMissing)?;
    ClientCertificate::from_bytes(leaf).map_err(|e| GatewayError::CertificateInvalid(e.to_string()))
}

/// # Errors
///
/// [`GatewayError::CertificateExpired`] or [`GatewayError::CertificateNotYetValid`]
/// when `now` is outside the validity window.
pub fn ensure_valid_at(cert: &ClientCertificate, now: DateTime<Utc>) -> Result<(), GatewayError> {
    match cert.validity_at(now) {
        ValidityState::Valid => Ok(()),
        ValidityState::Expired => Err(GatewayError::CertificateExpired {
            serial: cert.serial().to_string(),
            issuer: cert.issuer_dn().to_string(),
        }),
        ValidityState::NotYetValid => Err(GatewayError::CertificateNotYetValid {
            serial: cert.serial().to_string(),
            issuer: cert.issuer_dn().to_string(),
        }),
    }
}

/// Why a certificate skips revocation checking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevocationExemption {
    SelfSigned,
    ExcludedIssuer,
}

/// Issuer DNs exempt from revocation checking.
///
/// Names are compared as sets of `TYPE=value` components so that attribute
/// order and spacing in the configuration do not matter. Commas inside a
/// value must be escaped as `\,`. A configured name with a component that
/// is not `TYPE=value` is dropped with a warning rather than matched loosely.
#[derive(Debug, Clone, Default)]
pub struct ExcludedIssuers {
    names: Vec<BTreeSet<String>>,
}

impl ExcludedIssuers {
    pub fn new<I, S>(issuers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names = issuers
            .into_iter()
            .filter_map(|dn| {
                let dn = dn.as_ref();
                let parsed = parse_dn(dn);
                if parsed.is_none() {
                    warn!(issuer = dn, "Ignoring malformed excluded issuer DN");
                }
                parsed
            })
            .collect();
        Self { names }
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Match a DN string; an unparsable DN never matches
    pub fn contains(&self, issuer_dn: &str) -> bool {
        parse_dn(issuer_dn).is_some_and(|wanted| self.matches(&wanted))
    }

    /// Match already-split `(TYPE, value)` attributes
    pub fn contains_attributes<'a, I>(&self, attributes: I) -> bool
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let wanted = attributes
            .into_iter()
            .map(|(key, value)| component(key, value))
            .collect();
        self.matches(&wanted)
    }

    fn matches(&self, wanted: &BTreeSet<String>) -> bool {
        !wanted.is_empty() && self.names.iter().any(|name| name == wanted)
    }
}

fn component(key: &str, value: &str) -> String {
    format!("{}={}", key.trim().to_ascii_uppercase(), value.trim())
}

/// Split on unescaped commas (or `+` for multi-valued RDNs) and unescape
/// values. `None` when any component lacks a type or a `=`.
fn parse_dn(dn: &str) -> Option<BTreeSet<String>> {
    let mut components = BTreeSet::new();
    let mut current = String::new();
    let mut key: Option<String> = None;
    let mut chars = dn.chars();

    loop {
        let next = chars.next();
        match next {
            Some('\\') => current.push(chars.next()?),
            Some('=') if key.is_none() => {
                key = Some(std::mem::take(&mut current));
            }
            Some(',' | '+') | None => {
                let name = key.take()?;
                if name.trim().is_empty() {
                    return None;
                }
                components.insert(component(&name, &current));
                current.clear();
                if next.is_none() {
                    return Some(components);
                }
            }
            Some(c) => current.push(c),
        }
    }
}

/// Exemption applying to `cert`, if any; self-signed is checked first
pub fn revocation_exemption(
    cert: &ClientCertificate,
    excluded: &ExcludedIssuers,
) -> Option<RevocationExemption> {
    if cert.is_self_signed() {
        Some(RevocationExemption::SelfSigned)
    } else if excluded.contains_attributes(
        cert.issuer_attributes()
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str())),
    ) {
        Some(RevocationExemption::ExcludedIssuer)
    } else {
        None
    }
}
