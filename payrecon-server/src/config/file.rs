//! TOML file configuration structures.
//!
//! These structs directly map to the `payrecon-config.toml` file format.

use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use url::Url;

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub admin: AdminConfig,
    pub provider: ProviderConfig,
    #[serde(default)]
    pub beneficiary: BeneficiaryConfig,
    #[serde(default)]
    pub generator: GeneratorConfig,
    #[serde(default)]
    pub archive: ArchiveConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The address and port to listen on (e.g., "0.0.0.0:8080").
    #[serde(default = "default_listen_addr")]
    pub listen: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen_addr(),
        }
    }
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::UNSPECIFIED, 8080))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    /// The admin secret. If this is plaintext (doesn't start with `$argon2`),
    /// it will be hashed and the config file will be rewritten.
    pub secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Root URL of the provider API.
    pub base_url: Url,
    pub access_id: String,
    pub access_key: String,
    /// Upper bound on a single provider call.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    15
}

/// Destination account for outbound transfers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BeneficiaryConfig {
    pub bank_code: String,
    pub branch_code: String,
    pub account_number: String,
    pub name: String,
    pub tax_id: String,
    pub account_type: String,
}

impl Default for BeneficiaryConfig {
    fn default() -> Self {
        let defaults = payrecon_core::config::BeneficiaryConfig::default();
        Self {
            bank_code: defaults.bank_code,
            branch_code: defaults.branch_code,
            account_number: defaults.account_number,
            name: defaults.name,
            tax_id: defaults.tax_id,
            account_type: defaults.account_type,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub enabled: bool,
    pub interval_secs: u64,
    pub first_run_delay_secs: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 3 * 60 * 60,
            first_run_delay_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// JSON-lines file receiving every inbound webhook.
    pub path: PathBuf,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("webhook_requests.log"),
        }
    }
}

impl FileConfig {
    /// Check if the admin secret is already hashed (argon2 format).
    pub fn is_admin_secret_hashed(&self) -> bool {
        self.admin.secret.starts_with("$argon2")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[admin]
secret = "test-secret"

[provider]
base_url = "https://sandbox.api.example.com"
access_id = "project/123"
access_key = "key"
"#;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: FileConfig = toml::from_str(MINIMAL).unwrap();
        assert_eq!(config.server.listen.port(), 8080);
        assert_eq!(config.provider.timeout_secs, 15);
        assert_eq!(config.beneficiary.bank_code, "20018183");
        assert!(config.generator.enabled);
        assert_eq!(config.generator.interval_secs, 10800);
        assert_eq!(config.generator.first_run_delay_secs, 30);
        assert_eq!(config.archive.path, PathBuf::from("webhook_requests.log"));
        assert!(!config.is_admin_secret_hashed());
    }

    #[test]
    fn test_full_config_parsing() {
        let toml_str = r#"
[server]
listen = "127.0.0.1:3000"

[admin]
secret = "$argon2id$v=19$m=19456,t=2,p=1$abc123"

[provider]
base_url = "https://api.example.com"
access_id = "project/123"
access_key = "key"
timeout_secs = 5

[beneficiary]
name = "Acme Ltda"
account_number = "42"

[generator]
enabled = false

[archive]
path = "/var/log/payrecon/webhooks.log"
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.listen.port(), 3000);
        assert_eq!(config.provider.timeout_secs, 5);
        assert_eq!(config.beneficiary.name, "Acme Ltda");
        assert_eq!(config.beneficiary.bank_code, "20018183");
        assert!(!config.generator.enabled);
        assert_eq!(config.generator.interval_secs, 10800);
        assert!(config.is_admin_secret_hashed());
    }

    #[test]
    fn test_provider_section_is_required() {
        let toml_str = r#"
[admin]
secret = "s"
"#;
        assert!(toml::from_str::<FileConfig>(toml_str).is_err());
    }
}
