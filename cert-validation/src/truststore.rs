use tracing::debug;

use crate::certificate::ClientCertificate;
use crate::error::TrustStoreError;

/// Finds the issuing certificate for a peer certificate
pub trait IssuerResolver: Send + Sync {
    fn find_issuer(&self, peer: &ClientCertificate) -> Result<ClientCertificate, TrustStoreError>;
}

/// In-memory set of trusted CA certificates
#[derive(Debug, Clone, Default)]
pub struct TrustStore {
    certificates: Vec<ClientCertificate>,
}

impl TrustStore {
    pub fn from_certificates(certificates: Vec<ClientCertificate>) -> Self {
        Self { certificates }
    }

    /// Parse every certificate in a PEM bundle
    pub fn from_pem_bundle(bundle: &[u8]) -> Result<Self, TrustStoreError> {
        let blocks = pem::parse_many(bundle).map_err(|e| {
            TrustStoreError::InvalidEntry(crate::error::CertificateError::InvalidPem(e.to_string()))
        })?;
        let certificates = blocks
            .into_iter()
            .filter(|block| block.tag() == "CERTIFICATE")
            .map(|block| ClientCertificate::from_der(block.into_contents()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { certificates })
    }

    pub fn add(&mut self, certificate: ClientCertificate) {
        self.certificates.push(certificate);
    }

    pub fn len(&self) -> usize {
        self.certificates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.certificates.is_empty()
    }

    fn signed_by(peer: &ClientCertificate, candidate: &ClientCertificate) -> bool {
        let (Ok(peer_x509), Ok(candidate_x509)) = (peer.x509(), candidate.x509()) else {
            return false;
        };
        peer_x509
            .verify_signature(Some(candidate_x509.public_key()))
            .is_ok()
    }
}

impl IssuerResolver for TrustStore {
    /// The first trusted certificate whose subject names the peer's issuer
    /// and whose key verifies the peer's signature
    fn find_issuer(&self, peer: &ClientCertificate) -> Result<ClientCertificate, TrustStoreError> {
        self.certificates
            .iter()
            .filter(|candidate| candidate.subject_raw() == peer.issuer_raw())
            .find(|candidate| Self::signed_by(peer, candidate))
            .cloned()
            .map(|issuer| {
                debug!(serial = peer.serial(), issuer = issuer.subject_dn(), "Issuer found in trust store");
                issuer
            })
            .ok_or_else(|| TrustStoreError::IssuerNotFound(peer.issuer_dn().to_string()))
    }
}
