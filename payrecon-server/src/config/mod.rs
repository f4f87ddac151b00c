//! Configuration module for payrecon-server.
//!
//! Handles loading configuration from TOML files, CLI arguments,
//! and environment variables. Also handles admin secret hashing.

pub mod file;
pub mod runtime;

use crate::config::file::FileConfig;
use crate::config::runtime::{
    AdminConfig, ArchiveConfig, BeneficiaryConfig, GeneratorConfig, ProviderConfig, ServerConfig,
    SharedConfig,
};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("password hashing error: {0}")]
    HashError(String),

    #[error("DATABASE_URL environment variable not set")]
    MissingDatabaseUrl,
}

/// Loaded configuration result containing all parts.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub server: ServerConfig,
    pub admin: AdminConfig,
    pub provider: ProviderConfig,
    pub beneficiary: BeneficiaryConfig,
    pub generator: GeneratorConfig,
    pub archive: ArchiveConfig,
}

impl LoadedConfig {
    /// The sections that can be swapped on reload.
    pub fn shared(&self) -> SharedConfig {
        SharedConfig::new(self.admin.clone(), self.beneficiary.clone())
    }
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: PathBuf,
    listen_override: Option<SocketAddr>,
}

impl ConfigLoader {
    pub fn new(config_path: impl AsRef<Path>, listen_override: Option<SocketAddr>) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            listen_override,
        }
    }

    /// Load and process the configuration.
    ///
    /// This will:
    /// 1. Read the TOML file
    /// 2. Apply CLI overrides
    /// 3. Validate the configuration
    /// 4. Hash the admin secret if it's plaintext (and rewrite the file)
    /// 5. Build the loaded configuration
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let config_content = std::fs::read_to_string(&self.config_path)?;
        let mut file_config: FileConfig = toml::from_str(&config_content)?;

        self.validate(&file_config)?;

        let secret_hash = if file_config.is_admin_secret_hashed() {
            file_config.admin.secret.clone()
        } else {
            let hash = payrecon_core::config::hash_secret(&file_config.admin.secret)
                .map_err(|e| ConfigError::HashError(e.to_string()))?;
            file_config.admin.secret = hash.clone();
            self.rewrite_config(&file_config)?;
            tracing::info!("Admin secret hashed and config file updated");
            hash
        };

        // Applied after the rewrite so the override never lands in the file.
        if let Some(listen) = self.listen_override {
            file_config.server.listen = listen;
        }

        Ok(build_loaded_config(file_config, secret_hash))
    }

    /// Reload the configuration (used during SIGHUP).
    pub fn reload(&self) -> Result<LoadedConfig, ConfigError> {
        self.load()
    }

    fn validate(&self, config: &FileConfig) -> Result<(), ConfigError> {
        if config.admin.secret.is_empty() {
            return Err(ConfigError::ValidationError(
                "admin secret must not be empty".to_string(),
            ));
        }
        if config.provider.access_id.is_empty() || config.provider.access_key.is_empty() {
            return Err(ConfigError::ValidationError(
                "provider access_id and access_key must be set".to_string(),
            ));
        }
        if config.provider.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "provider timeout_secs must be positive".to_string(),
            ));
        }
        if config.generator.interval_secs == 0 {
            return Err(ConfigError::ValidationError(
                "generator interval_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    fn rewrite_config(&self, config: &FileConfig) -> Result<(), ConfigError> {
        let toml_string = toml::to_string_pretty(config)?;

        // Write atomically: write to temp file, then rename
        let temp_path = self.config_path.with_extension("toml.tmp");
        std::fs::write(&temp_path, toml_string)?;
        std::fs::rename(&temp_path, &self.config_path)?;

        Ok(())
    }
}

fn build_loaded_config(file_config: FileConfig, secret_hash: String) -> LoadedConfig {
    let beneficiary = file_config.beneficiary;
    let generator = file_config.generator;
    LoadedConfig {
        server: ServerConfig {
            listen: file_config.server.listen,
        },
        admin: AdminConfig::new(secret_hash),
        provider: ProviderConfig {
            base_url: file_config.provider.base_url,
            access_id: file_config.provider.access_id,
            access_key: file_config.provider.access_key,
            timeout: Duration::from_secs(file_config.provider.timeout_secs),
        },
        beneficiary: BeneficiaryConfig {
            bank_code: beneficiary.bank_code,
            branch_code: beneficiary.branch_code,
            account_number: beneficiary.account_number,
            name: beneficiary.name,
            tax_id: beneficiary.tax_id,
            account_type: beneficiary.account_type,
        },
        generator: GeneratorConfig {
            enabled: generator.enabled,
            interval: Duration::from_secs(generator.interval_secs),
            first_run_delay: Duration::from_secs(generator.first_run_delay_secs),
        },
        archive: ArchiveConfig {
            path: file_config.archive.path,
        },
    }
}

/// Get the database URL from the environment.
pub fn get_database_url() -> Result<String, ConfigError> {
    std::env::var("DATABASE_URL").map_err(|_| ConfigError::MissingDatabaseUrl)
}
