//! Application configuration management.

use rust_decimal::Decimal;
use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// JWT configuration.
    pub jwt: JwtSettings,
    /// Access and spending policy tunables.
    #[serde(default)]
    pub policy: PolicyConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// JWT settings as read from configuration sources.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtSettings {
    /// Secret key for verifying tokens issued by the identity provider.
    pub secret: String,
    /// Access token expiration in seconds (used when minting dev tokens).
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry_secs: u64,
}

fn default_access_token_expiry() -> u64 {
    900 // 15 minutes
}

/// Policy engine configuration.
///
/// Daily, monthly and annual spending windows are cut in
/// `aggregation_timezone`.
#[derive(Debug, Clone, Deserialize)]
pub struct PolicyConfig {
    /// IANA timezone used to cut daily/monthly/annual spending windows.
    #[serde(default = "default_aggregation_timezone")]
    pub aggregation_timezone: String,
    /// Amount above which a payee must be a verified whitelist account.
    #[serde(default = "default_cashless_threshold")]
    pub cashless_threshold: Decimal,
    /// How long a resolved access context stays cached.
    #[serde(default = "default_permission_cache_ttl")]
    pub permission_cache_ttl_secs: u64,
    /// Interval between auto-approval sweeps.
    #[serde(default = "default_auto_approve_sweep")]
    pub auto_approve_sweep_secs: u64,
    /// Maximum rows returned by the admin SQL console.
    #[serde(default = "default_console_row_limit")]
    pub console_row_limit: u64,
}

fn default_aggregation_timezone() -> String {
    "Asia/Jakarta".to_string()
}

fn default_cashless_threshold() -> Decimal {
    Decimal::new(1_000_000, 0)
}

fn default_permission_cache_ttl() -> u64 {
    30
}

fn default_auto_approve_sweep() -> u64 {
    300
}

fn default_console_row_limit() -> u64 {
    500
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            aggregation_timezone: default_aggregation_timezone(),
            cashless_threshold: default_cashless_threshold(),
            permission_cache_ttl_secs: default_permission_cache_ttl(),
            auto_approve_sweep_secs: default_auto_approve_sweep(),
            console_row_limit: default_console_row_limit(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from `.env`, config files and the environment.
    ///
    /// Sources are layered: `config/default`, `config/{RUN_MODE}`, then
    /// `RIMBA__*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("RIMBA").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
