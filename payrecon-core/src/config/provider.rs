//! Payment provider API access.

use std::time::Duration;
use url::Url;

#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub base_url: Url,
    pub access_id: String,
    /// Shared HMAC key for request signing.
    pub access_key: String,
    /// Upper bound on a single provider call.
    pub timeout: Duration,
}
