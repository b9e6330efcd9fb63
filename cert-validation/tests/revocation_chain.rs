//! Revocation chain tests driven from TOML configuration
//!
//! A guard is built the way an embedder would: configuration text, a
//! strategy registry and a PEM trust bundle. CRLs are served from memory.

use async_trait::async_trait;
use cert_validation::{
    CertValidationConfig, CertValidationService, ClientCertificate, CrlFetcher, CrlValidator,
    RevocationGuard, RevocationValidator, TrustStore, ValidatorError, ValidatorRegistry,
    ValidatorSettings,
};
use chrono::Utc;
use error_common::GatewayError;
use rcgen::{
    date_time_ymd, BasicConstraints, CertificateParams, CertificateRevocationListParams,
    CrlDistributionPoint, DistinguishedName, DnType, IsCa, KeyIdMethod, KeyPair, KeyUsagePurpose,
    RevokedCertParams, SerialNumber,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const CRL_URL: &str = "http://crl.example.test/issuing.crl";

const CONFIG: &str = r#"
[revocation]
retry_count = 2
connect_timeout_ms = 500
socket_timeout_ms = 500
validators = [
    { priority = 5, strategy = "CRL" },
    { priority = 1, strategy = "SCVP" },
]

[tpp]
psd2_role_validation_enabled = true
"#;

struct Pki {
    key: KeyPair,
    cert: rcgen::Certificate,
}

impl Pki {
    fn new(cn: &str) -> Self {
        let key = KeyPair::generate().unwrap();
        let mut params = CertificateParams::new(Vec::<String>::new()).unwrap();
        params.distinguished_name = DistinguishedName::new();
        params.distinguished_name.push(DnType::CommonName, cn);
        params.distinguished_name.push(DnType::OrganizationName, "Test Trust Services");
        params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        params.key_usages = vec![KeyUsagePurpose::KeyCertSign, KeyUsagePurpose::CrlSign];
        let cert = params.self_signed(&key).unwrap();
        Self { key, cert }
    }

    fn pem(&self) -> String {
        self.cert.pem()
    }

    fn leaf(&self, serial: &[u8]) -> Vec<u8> {
        let mut params = CertificateParams::new(Vec::<String>::new()).unwrap();
        params.distinguished_name = DistinguishedName::new();
        params.distinguished_name.push(DnType::CommonName, "Example TPP Ltd");
        params.serial_number = Some(SerialNumber::from_slice(serial));
        params.use_authority_key_identifier_extension = true;
        params.crl_distribution_points = vec![CrlDistributionPoint {
            uris: vec![CRL_URL.to_string()],
        }];
        let key = KeyPair::generate().unwrap();
        params
            .signed_by(&key, &self.cert, &self.key)
            .unwrap()
            .der()
            .to_vec()
    }

    fn crl(&self, revoked: &[u8]) -> Vec<u8> {
        CertificateRevocationListParams {
            this_update: date_time_ymd(2024, 1, 1),
            next_update: date_time_ymd(2099, 1, 1),
            crl_number: SerialNumber::from_slice(&[3]),
            issuing_distribution_point: None,
            revoked_certs: vec![RevokedCertParams {
                serial_number: SerialNumber::from_slice(revoked),
                revocation_time: date_time_ymd(2024, 3, 1),
                reason_code: None,
                invalidity_date: None,
            }],
            key_identifier_method: KeyIdMethod::Sha256,
        }
        .signed_by(&self.cert, &self.key)
        .unwrap()
        .der()
        .to_vec()
    }
}

struct MemoryCrl {
    body: Vec<u8>,
    fetches: AtomicUsize,
}

#[async_trait]
impl CrlFetcher for MemoryCrl {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, ValidatorError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if url == CRL_URL {
            Ok(self.body.clone())
        } else {
            Err(ValidatorError::Http {
                url: url.to_string(),
                message: "404 Not Found".to_string(),
            })
        }
    }
}

fn guard(config: &CertValidationConfig, pki: &Pki, fetcher: &Arc<MemoryCrl>) -> RevocationGuard {
    let fetcher = fetcher.clone();
    let registry = ValidatorRegistry::empty().register("crl", move |settings: &ValidatorSettings| {
        Arc::new(CrlValidator::new(settings.clone(), fetcher.clone())) as Arc<dyn RevocationValidator>
    });
    let store = TrustStore::from_pem_bundle(pki.pem().as_bytes()).unwrap();
    RevocationGuard::from_config(
        &config.revocation,
        registry,
        Arc::new(CertValidationService::new(config.tpp.clone())),
        Arc::new(store),
    )
}

#[tokio::test]
async fn test_config_drives_crl_chain() {
    let config = CertValidationConfig::from_toml_str(CONFIG).unwrap();
    let settings = config.revocation.validator_settings();
    assert_eq!(settings.retry_count, 2);

    let pki = Pki::new("Test Issuing CA");
    let fetcher = Arc::new(MemoryCrl {
        body: pki.crl(&[0x66]),
        fetches: AtomicUsize::new(0),
    });
    let guard = guard(&config, &pki, &fetcher);

    let good = vec![pki.leaf(&[0x01, 0x02])];
    let cert = guard.check_chain(Some(good.as_slice()), Utc::now()).await.unwrap();
    assert_eq!(cert.serial(), "102");

    // Served from the cache
    guard.check_chain(Some(good.as_slice()), Utc::now()).await.unwrap();
    assert_eq!(fetcher.fetches.load(Ordering::SeqCst), 1);

    let revoked = vec![pki.leaf(&[0x66])];
    let err = guard
        .check_chain(Some(revoked.as_slice()), Utc::now())
        .await
        .unwrap_err();
    assert_eq!(
        err,
        GatewayError::CertificateRevoked {
            serial: "66".to_string()
        }
    );
    assert_eq!(guard.cache().len(), 1);
}

#[tokio::test]
async fn test_excluded_issuer_bypasses_crl() {
    let mut config = CertValidationConfig::from_toml_str(CONFIG).unwrap();
    // Attribute order differs from the certificate's issuer DN
    config.revocation.excluded_issuers = vec!["O=Test Trust Services, CN=Test Issuing CA".to_string()];

    let pki = Pki::new("Test Issuing CA");
    let fetcher = Arc::new(MemoryCrl {
        body: pki.crl(&[0x66]),
        fetches: AtomicUsize::new(0),
    });
    let guard = guard(&config, &pki, &fetcher);

    let revoked = vec![pki.leaf(&[0x66])];
    assert!(guard.check_chain(Some(revoked.as_slice()), Utc::now()).await.is_ok());
    assert_eq!(fetcher.fetches.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_garbage_chain_is_invalid() {
    let config = CertValidationConfig::default();
    let pki = Pki::new("Test Issuing CA");
    let fetcher = Arc::new(MemoryCrl {
        body: Vec::new(),
        fetches: AtomicUsize::new(0),
    });
    let guard = guard(&config, &pki, &fetcher);

    let chain = vec![b"not a certificate".to_vec()];
    let err = guard
        .check_chain(Some(chain.as_slice()), Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::CertificateInvalid(_)));

    let err = guard.check_chain(None, Utc::now()).await.unwrap_err();
    assert_eq!(err, GatewayError::CertificateMissing);

    assert!(ClientCertificate::from_bytes(b"junk").is_err());
}
