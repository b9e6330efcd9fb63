use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::revocation::{RevocationProxy, ValidatorSettings};

/// Certificate validation configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CertValidationConfig {
    /// Revocation checking of client certificates
    #[serde(default)]
    pub revocation: RevocationConfig,

    /// TPP role authorization
    #[serde(default)]
    pub tpp: TppConfig,
}

/// One configured revocation strategy
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RevocationValidatorEntry {
    /// Lower runs first
    pub priority: i32,
    /// Strategy name, e.g. `OCSP` or `CRL`
    pub strategy: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RevocationConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Retries after the first attempt per responder or distribution point (default: 3)
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    #[serde(default = "default_timeout_ms")]
    pub connect_timeout_ms: u64,

    #[serde(default = "default_timeout_ms")]
    pub connection_request_timeout_ms: u64,

    #[serde(default = "default_timeout_ms")]
    pub socket_timeout_ms: u64,

    #[serde(default = "default_validators")]
    pub validators: Vec<RevocationValidatorEntry>,

    /// Issuer DNs whose certificates skip revocation checks
    #[serde(default)]
    pub excluded_issuers: Vec<String>,

    /// Lifetime of a positive revocation result in seconds (default: 3600 = 1 hour)
    #[serde(default = "default_cache_expiry")]
    pub cache_expiry_secs: u64,

    #[serde(default = "default_cache_max_entries")]
    pub cache_max_entries: usize,

    /// Forward proxy for CRL and OCSP requests
    #[serde(default)]
    pub proxy: Option<RevocationProxy>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TppConfig {
    /// Delegate role checks to an external TPP validation service
    #[serde(default = "default_false")]
    pub tpp_validation_enabled: bool,

    /// Name of the external TPP validation service implementation
    #[serde(default)]
    pub tpp_validation_service: Option<String>,

    /// Match required roles against the certificate's PSD2 QC statement
    #[serde(default = "default_true")]
    pub psd2_role_validation_enabled: bool,

    /// Lifetime of a positive TPP validation result in seconds (default: 3600 = 1 hour)
    #[serde(default = "default_cache_expiry")]
    pub cache_expiry_secs: u64,

    #[serde(default = "default_cache_max_entries")]
    pub cache_max_entries: usize,

    /// OAuth scope to the PSD2 roles allowed to request it
    #[serde(default)]
    pub allowed_scopes: HashMap<String, Vec<String>>,
}

fn default_true() -> bool { true }
fn default_false() -> bool { false }
fn default_retry_count() -> u32 { 3 }
fn default_timeout_ms() -> u64 { 10_000 } // 10 seconds
fn default_cache_expiry() -> u64 { 3600 } // 1 hour
fn default_cache_max_entries() -> usize { 10_000 }

fn default_validators() -> Vec<RevocationValidatorEntry> {
    vec![
        RevocationValidatorEntry { priority: 1, strategy: "OCSP".to_string() },
        RevocationValidatorEntry { priority: 2, strategy: "CRL".to_string() },
    ]
}

impl Default for RevocationConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            retry_count: default_retry_count(),
            connect_timeout_ms: default_timeout_ms(),
            connection_request_timeout_ms: default_timeout_ms(),
            socket_timeout_ms: default_timeout_ms(),
            validators: default_validators(),
            excluded_issuers: Vec::new(),
            cache_expiry_secs: default_cache_expiry(),
            cache_max_entries: default_cache_max_entries(),
            proxy: None,
        }
    }
}

impl RevocationConfig {
    pub fn validator_settings(&self) -> ValidatorSettings {
        ValidatorSettings {
            retry_count: self.retry_count,
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            connection_request_timeout: Duration::from_millis(self.connection_request_timeout_ms),
            socket_timeout: Duration::from_millis(self.socket_timeout_ms),
            proxy: self.proxy.clone(),
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_expiry_secs)
    }
}

impl Default for TppConfig {
    fn default() -> Self {
        Self {
            tpp_validation_enabled: default_false(),
            tpp_validation_service: None,
            psd2_role_validation_enabled: default_true(),
            cache_expiry_secs: default_cache_expiry(),
            cache_max_entries: default_cache_max_entries(),
            allowed_scopes: HashMap::new(),
        }
    }
}

impl TppConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_expiry_secs)
    }
}

impl CertValidationConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> anyhow::Result<Self> {
        let config: CertValidationConfig = toml::from_str(contents)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CertValidationConfig::default();
        assert!(config.revocation.enabled);
        assert_eq!(config.revocation.retry_count, 3);
        assert_eq!(config.revocation.cache_expiry_secs, 3600); // 1 hour
        assert_eq!(config.revocation.validators.len(), 2);
        assert!(!config.tpp.tpp_validation_enabled);
        assert!(config.tpp.psd2_role_validation_enabled);

        let settings = config.revocation.validator_settings();
        assert_eq!(settings, ValidatorSettings::default());
    }

    #[test]
    fn test_parse_toml() {
        let config = CertValidationConfig::from_toml_str(
            r#"
            [revocation]
            retry_count = 1
            socket_timeout_ms = 2500
            excluded_issuers = ["CN=Internal CA, O=Example Bank"]

            [revocation.proxy]
            host = "proxy.bank.internal"
            port = 3128

            [[revocation.validators]]
            priority = 1
            strategy = "CRL"

            [tpp]
            tpp_validation_enabled = true
            tpp_validation_service = "directory"

            [tpp.allowed_scopes]
            accounts = ["AISP"]
            payments = ["PISP"]
            "#,
        )
        .unwrap();

        assert_eq!(config.revocation.retry_count, 1);
        assert_eq!(config.revocation.socket_timeout_ms, 2500);
        assert_eq!(config.revocation.connect_timeout_ms, 10_000);
        assert_eq!(config.revocation.validators.len(), 1);
        assert_eq!(config.revocation.excluded_issuers.len(), 1);
        assert_eq!(
            config.revocation.validator_settings().proxy,
            Some(RevocationProxy {
                host: "proxy.bank.internal".to_string(),
                port: 3128,
            })
        );
        assert!(config.tpp.tpp_validation_enabled);
        assert_eq!(config.tpp.tpp_validation_service.as_deref(), Some("directory"));
        assert_eq!(config.tpp.allowed_scopes["payments"], vec!["PISP".to_string()]);
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = CertValidationConfig::from_toml_str("").unwrap();
        assert_eq!(config.tpp.cache_expiry_secs, 3600);
        assert!(config.revocation.enabled);
    }
}
