use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub business_rules: BusinessRules,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// Postgres connection string. Leave empty to run on the in-memory
    /// stores (development and tests).
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BusinessRules {
    /// How long an uncommitted capacity hold stays alive.
    pub hold_ttl_seconds: u64,
    /// Platform service fee in basis points (300 = 3%).
    #[serde(default = "default_service_fee_bps")]
    pub service_fee_bps: u32,
    #[serde(default = "default_reference_attempts")]
    pub max_reference_attempts: u32,
    #[serde(default = "default_update_attempts")]
    pub max_update_attempts: u32,
    /// Cadence of the background sweep that reaps expired holds.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_seconds: u64,
}

fn default_service_fee_bps() -> u32 {
    300
}

fn default_reference_attempts() -> u32 {
    5
}

fn default_update_attempts() -> u32 {
    3
}

fn default_sweep_interval() -> u64 {
    60
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(config::File::with_name("config/default"))
            // Add in the current environment file; optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides, not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // Eg. `VELORA__SERVER__PORT=9090` overrides server.port
            .add_source(config::Environment::with_prefix("VELORA").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
