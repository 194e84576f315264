use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub reservation: ReservationRules,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReservationRules {
    /// How long an unpaid order keeps its reservation before a sweep
    /// reclaims it.
    #[serde(default = "default_grace")]
    pub payment_grace_seconds: u64,
    /// How often the background reclaimer wakes up.
    #[serde(default = "default_interval")]
    pub reclaim_interval_seconds: u64,
}

fn default_grace() -> u64 {
    900
}

fn default_interval() -> u64 {
    300
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(config::File::with_name("config/default"))
            // Per-environment file is optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides, not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // Eg. `HOLDFAST_SERVER__PORT=8080` sets `server.port`
            .add_source(config::Environment::with_prefix("HOLDFAST").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
