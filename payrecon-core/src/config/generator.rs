//! Scheduled invoice generation.

use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    pub enabled: bool,
    /// Time between generation runs.
    pub interval: Duration,
    /// Delay before the first run after startup.
    pub first_run_delay: Duration,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: Duration::from_secs(3 * 60 * 60),
            first_run_delay: Duration::from_secs(30),
        }
    }
}
