// Certificate fixtures and fake validators shared by the unit tests

use async_trait::async_trait;
use rcgen::{
    date_time_ymd, BasicConstraints, CertificateParams, CertificateRevocationListParams,
    CrlDistributionPoint, CustomExtension, DistinguishedName, DnType, IsCa, KeyIdMethod, KeyPair,
    KeyUsagePurpose, RevokedCertParams, SerialNumber,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::certificate::ClientCertificate;
use crate::error::ValidatorError;
use crate::model::RevocationStatus;
use crate::revocation::RevocationValidator;

pub fn tlv(tag: u8, body: &[u8]) -> Vec<u8> {
    let mut out = vec![tag];
    let len = body.len();
    if len < 0x80 {
        out.push(len as u8);
    } else if len <= 0xff {
        out.extend([0x81, len as u8]);
    } else {
        out.extend([0x82, (len >> 8) as u8, len as u8]);
    }
    out.extend_from_slice(body);
    out
}

pub fn oid(arcs: &[u64]) -> Vec<u8> {
    let mut body = vec![(arcs[0] * 40 + arcs[1]) as u8];
    for &arc in &arcs[2..] {
        let mut chunk = vec![(arc & 0x7f) as u8];
        let mut rest = arc >> 7;
        while rest > 0 {
            chunk.push(((rest & 0x7f) as u8) | 0x80);
            rest >>= 7;
        }
        chunk.reverse();
        body.extend(chunk);
    }
    tlv(0x06, &body)
}

pub fn seq(items: &[Vec<u8>]) -> Vec<u8> {
    tlv(0x30, &items.concat())
}

pub fn utf8(s: &str) -> Vec<u8> {
    tlv(0x0c, s.as_bytes())
}

/// QC statements extension value carrying a PSD2 statement.
/// Each role is (last arc of the role OID, role name).
pub fn qc_statements(roles: &[(u64, &str)]) -> Vec<u8> {
    let roles_of_psp = seq(&roles
        .iter()
        .map(|(arc, name)| seq(&[oid(&[0, 4, 0, 19495, 1, *arc]), utf8(name)]))
        .collect::<Vec<_>>());
    let psd2 = seq(&[roles_of_psp, utf8("Financial Conduct Authority"), utf8("GB-FCA")]);
    seq(&[seq(&[oid(&[0, 4, 0, 19495, 2]), psd2])])
}

/// Authority information access extension value with one OCSP responder
pub fn ocsp_aia(url: &str) -> Vec<u8> {
    seq(&[seq(&[oid(&[1, 3, 6, 1, 5, 5, 7, 48, 1]), tlv(0x86, url.as_bytes())])])
}

fn empty_params() -> CertificateParams {
    let mut params = CertificateParams::new(Vec::<String>::new()).unwrap();
    params.distinguished_name = DistinguishedName::new();
    params
}

pub fn self_signed(cn: &str) -> ClientCertificate {
    let key = KeyPair::generate().unwrap();
    let mut params = empty_params();
    params.distinguished_name.push(DnType::CommonName, cn);
    let cert = params.self_signed(&key).unwrap();
    ClientCertificate::from_der(cert.der().to_vec()).unwrap()
}

/// A throwaway issuing CA
pub struct TestPki {
    key: KeyPair,
    cert: rcgen::Certificate,
    pub ca: ClientCertificate,
}

impl TestPki {
    pub fn new(cn: &str) -> Self {
        Self::with_organization(cn, "Test Trust Services")
    }

    pub fn with_organization(cn: &str, organization: &str) -> Self {
        let key = KeyPair::generate().unwrap();
        let mut params = empty_params();
        params.distinguished_name.push(DnType::CommonName, cn);
        params.distinguished_name.push(DnType::OrganizationName, organization);
        params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        params.key_usages = vec![KeyUsagePurpose::KeyCertSign, KeyUsagePurpose::CrlSign];
        let cert = params.self_signed(&key).unwrap();
        let ca = ClientCertificate::from_der(cert.der().to_vec()).unwrap();
        Self { key, cert, ca }
    }

    pub fn leaf(&self) -> LeafBuilder<'_> {
        let mut params = empty_params();
        params.distinguished_name.push(DnType::CommonName, "Example TPP");
        params.serial_number = Some(SerialNumber::from_slice(&[0x0a, 0x0b, 0x0c]));
        // rcgen omits the extensions block entirely unless one is always present
        params.use_authority_key_identifier_extension = true;
        LeafBuilder { pki: self, params }
    }

    /// DER CRL signed by this CA listing the given serials
    pub fn crl(&self, revoked_serials: &[&[u8]]) -> Vec<u8> {
        let params = CertificateRevocationListParams {
            this_update: date_time_ymd(2024, 1, 1),
            next_update: date_time_ymd(2099, 1, 1),
            crl_number: SerialNumber::from_slice(&[1]),
            issuing_distribution_point: None,
            revoked_certs: revoked_serials
                .iter()
                .map(|serial| RevokedCertParams {
                    serial_number: SerialNumber::from_slice(serial),
                    revocation_time: date_time_ymd(2024, 1, 1),
                    reason_code: None,
                    invalidity_date: None,
                })
                .collect(),
            key_identifier_method: KeyIdMethod::Sha256,
        };
        params
            .signed_by(&self.cert, &self.key)
            .unwrap()
            .der()
            .to_vec()
    }
}

pub struct LeafBuilder<'a> {
    pki: &'a TestPki,
    params: CertificateParams,
}

impl LeafBuilder<'_> {
    pub fn serial(mut self, serial: &[u8]) -> Self {
        self.params.serial_number = Some(SerialNumber::from_slice(serial));
        self
    }

    pub fn organization_id(mut self, id: &str) -> Self {
        self.params
            .distinguished_name
            .push(DnType::CustomDnType(vec![2, 5, 4, 97]), id);
        self
    }

    pub fn crl_url(mut self, url: &str) -> Self {
        self.params.crl_distribution_points = vec![CrlDistributionPoint {
            uris: vec![url.to_string()],
        }];
        self
    }

    pub fn ocsp_url(mut self, url: &str) -> Self {
        self.params
            .custom_extensions
            .push(CustomExtension::from_oid_content(&[1, 3, 6, 1, 5, 5, 7, 1, 1], ocsp_aia(url)));
        self
    }

    pub fn roles(mut self, roles: &[(u64, &str)]) -> Self {
        self.params.custom_extensions.push(CustomExtension::from_oid_content(
            &[1, 3, 6, 1, 5, 5, 7, 1, 3],
            qc_statements(roles),
        ));
        self
    }

    pub fn expired(mut self) -> Self {
        self.params.not_before = date_time_ymd(2020, 1, 1);
        self.params.not_after = date_time_ymd(2021, 1, 1);
        self
    }

    pub fn build(self) -> ClientCertificate {
        let key = KeyPair::generate().unwrap();
        let cert = self
            .params
            .signed_by(&key, &self.pki.cert, &self.pki.key)
            .unwrap();
        ClientCertificate::from_der(cert.der().to_vec()).unwrap()
    }
}

pub enum Outcome {
    Status(RevocationStatus),
    Fail,
}

/// Validator returning a fixed outcome and counting invocations
pub struct CountingValidator {
    name: String,
    outcome: Outcome,
    calls: AtomicUsize,
}

impl CountingValidator {
    pub fn new(name: &str, outcome: Outcome) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            outcome,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn good(name: &str) -> Arc<Self> {
        Self::new(name, Outcome::Status(RevocationStatus::Good))
    }

    pub fn revoked(name: &str) -> Arc<Self> {
        Self::new(name, Outcome::Status(RevocationStatus::Revoked))
    }

    pub fn unknown(name: &str) -> Arc<Self> {
        Self::new(name, Outcome::Status(RevocationStatus::Unknown))
    }

    pub fn failing(name: &str) -> Arc<Self> {
        Self::new(name, Outcome::Fail)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RevocationValidator for CountingValidator {
    fn name(&self) -> &str {
        &self.name
    }

    async fn check_revocation_status(
        &self,
        _peer: &ClientCertificate,
        _issuer: &ClientCertificate,
    ) -> Result<RevocationStatus, ValidatorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.outcome {
            Outcome::Status(status) => Ok(status),
            Outcome::Fail => Err(ValidatorError::Timeout {
                url: "http://ocsp.example.test".to_string(),
            }),
        }
    }
}
