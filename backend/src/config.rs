//! Configuration management for the Branch Stock Management Platform
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with BSM_ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// JWT verification configuration
    pub jwt: JwtConfig,

    /// Stock business rules
    pub stock: StockConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    /// Secret key for verifying tokens issued by the identity provider
    pub secret: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StockConfig {
    /// Derived quantity at or below which a low-stock alert is emitted
    pub low_stock_threshold: i64,

    /// Hours a movement stays reversible after it was recorded
    pub reversal_window_hours: i64,
}

impl Config {
    /// Load configuration from files and environment
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("BSM_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Defaults
            .set_default("environment", environment.clone())?
            .set_default("server.port", 8080)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 1)?
            .set_default("stock.low_stock_threshold", 10)?
            .set_default(
                "stock.reversal_window_hours",
                shared::DEFAULT_REVERSAL_WINDOW_HOURS,
            )?
            // Optional environment-specific file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Environment overrides: BSM__DATABASE__URL etc.
            .add_source(Environment::with_prefix("BSM").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
