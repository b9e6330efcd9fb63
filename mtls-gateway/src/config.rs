use cert_validation::CertValidationConfig;
use serde::{Deserialize, Serialize};
use std::env;

pub const CONFIG_PATH_ENV: &str = "MTLS_GATEWAY_CONFIG";
pub const LOG_LEVEL_ENV: &str = "MTLS_GATEWAY_LOG_LEVEL";

/// Gateway configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GatewayConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub validation: CertValidationConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Structured JSON output instead of human readable lines
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String { "info".to_string() }

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl GatewayConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> anyhow::Result<Self> {
        let config: GatewayConfig = toml::from_str(contents)?;
        Ok(config)
    }

    /// Load from the file named by `MTLS_GATEWAY_CONFIG` (defaults otherwise),
    /// reading a `.env` file first when present
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = match env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_file(&path)?,
            Err(_) => Self::default(),
        };
        if let Ok(level) = env::var(LOG_LEVEL_ENV) {
            config.logging.level = level;
        }
        Ok(config)
    }
}
