//! Control node configuration

use motor_decoder::DecoderConfig;
use proximity_scan::ScanConfig;
use serde::{Deserialize, Serialize};

/// Control node configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlConfig {
    /// Listener address for the signal node (host:port)
    pub listen_addr: String,

    /// Simulation connection port (positional CLI argument)
    pub sim_port: u16,

    /// Angular speed of the operator-commanded reverse burst (rad/s)
    pub reverse_speed: f32,

    /// Speed decoding setup
    pub decoder: DecoderConfig,

    /// Obstacle scanner setup
    pub scan: ScanConfig,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            listen_addr: format!("0.0.0.0:{}", mea_protocol::DEFAULT_PORT),
            sim_port: 19997,
            reverse_speed: 10.0,
            decoder: DecoderConfig::default(),
            scan: ScanConfig::default(),
        }
    }
}

impl ControlConfig {
    /// Load configuration: defaults, then an optional `control-node.toml`,
    /// then `CONTROL_NODE_*` environment variables.
    pub fn load() -> Result<Self, ::config::ConfigError> {
        let defaults = Self::default();
        ::config::Config::builder()
            .set_default("listen_addr", defaults.listen_addr)?
            .set_default("sim_port", defaults.sim_port as i64)?
            .set_default("reverse_speed", defaults.reverse_speed as f64)?
            .set_default("decoder.policy", "discrete")?
            .set_default("decoder.max_speed", defaults.decoder.max_speed as f64)?
            .set_default("decoder.brake_speed", defaults.decoder.brake_speed as f64)?
            .set_default("scan.coding", "proportional")?
            .set_default("scan.min_period_ms", defaults.scan.min_period_ms as i64)?
            .set_default("scan.max_period_ms", defaults.scan.max_period_ms as i64)?
            .set_default("scan.binary_period_ms", defaults.scan.binary_period_ms as i64)?
            .add_source(::config::File::with_name("control-node").required(false))
            .add_source(
                ::config::Environment::with_prefix("CONTROL_NODE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
