//! Signal node configuration

use serde::{Deserialize, Serialize};

/// Signal node configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalConfig {
    /// Address of the control node listener (host:port)
    pub peer_addr: String,

    /// Path of the per-tick firing-rate log
    pub rate_log_path: String,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            peer_addr: format!("127.0.0.1:{}", mea_protocol::DEFAULT_PORT),
            rate_log_path: "firing_rates.txt".to_string(),
        }
    }
}

impl SignalConfig {
    /// Load configuration: defaults, then an optional `signal-node.toml`,
    /// then `SIGNAL_NODE_*` environment variables.
    pub fn load() -> Result<Self, ::config::ConfigError> {
        let defaults = Self::default();
        ::config::Config::builder()
            .set_default("peer_addr", defaults.peer_addr)?
            .set_default("rate_log_path", defaults.rate_log_path)?
            .add_source(::config::File::with_name("signal-node").required(false))
            .add_source(::config::Environment::with_prefix("SIGNAL_NODE").try_parsing(true))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_point_at_standard_port() {
        let config = SignalConfig::default();
        assert!(config.peer_addr.ends_with(":5480"));
        assert_eq!(config.rate_log_path, "firing_rates.txt");
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let config = SignalConfig::load().unwrap();
        assert_eq!(config.rate_log_path, SignalConfig::default().rate_log_path);
    }
}
