//! Configuration types shared by the reconciler and the server.
//!
//! These are validated runtime values. Loading and parsing the TOML file is
//! handled by the server crate.

mod admin;
mod beneficiary;
mod config_store;
mod generator;
mod provider;

pub use admin::{AdminConfig, hash_secret};
pub use beneficiary::BeneficiaryConfig;
pub use config_store::ConfigStore;
pub use generator::GeneratorConfig;
pub use provider::ProviderConfig;

/// Sections that can be swapped while the server is running.
#[derive(Clone)]
pub struct SharedConfig {
    /// Admin API authentication.
    pub admin: ConfigStore<AdminConfig>,
    /// Destination account for outbound transfers.
    pub beneficiary: ConfigStore<BeneficiaryConfig>,
}

impl SharedConfig {
    pub fn new(admin: AdminConfig, beneficiary: BeneficiaryConfig) -> Self {
        Self {
            admin: ConfigStore::new(admin),
            beneficiary: ConfigStore::new(beneficiary),
        }
    }
}
