// Shared transport configuration for building reqwest::Client instances.
//
// The session manager and the device client share timeout and user-agent
// settings through this module, avoiding duplicated builder logic.

use std::time::Duration;

/// User agent presented to both Gigya and the AWS gateway.
///
/// The cloud expects a mobile-app client; this mirrors the string the
/// official app sends.
pub const USER_AGENT: &str = "Blueair/58 CFNetwork/1327.0.4 Darwin/21.2.0";

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Per-request timeout applied by reqwest.
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, crate::error::Error> {
        Ok(reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT)
            .build()?)
    }
}
