//! Runtime configuration types.
//!
//! Shared sections come from `payrecon_core::config`; the ones only the
//! server binary needs are defined here.

pub use payrecon_core::config::{
    AdminConfig, BeneficiaryConfig, GeneratorConfig, ProviderConfig, SharedConfig,
};

use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen: SocketAddr,
}

#[derive(Debug, Clone)]
pub struct ArchiveConfig {
    pub path: PathBuf,
}
