//! Application configuration management.

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
    pub jwt: JwtConfig,
    /// Partner tier breakpoints.
    #[serde(default)]
    pub tier: TierConfig,
    /// Agreement expiry scheduling.
    #[serde(default)]
    pub agreements: AgreementsConfig,
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

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
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
    /// Apply pending migrations on server start.
    #[serde(default)]
    pub run_migrations: bool,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// JWT configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    /// Secret key shared with the identity provider.
    pub secret: String,
    /// Access token expiration in seconds.
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry_secs: i64,
}

fn default_access_token_expiry() -> i64 {
    900 // 15 minutes
}

/// Successful-event counts at which a partner reaches each tier.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TierConfig {
    /// Silver breakpoint.
    #[serde(default = "default_silver")]
    pub silver: u32,
    /// Gold breakpoint.
    #[serde(default = "default_gold")]
    pub gold: u32,
    /// Platinum breakpoint.
    #[serde(default = "default_platinum")]
    pub platinum: u32,
}

impl Default for TierConfig {
    fn default() -> Self {
        Self {
            silver: default_silver(),
            gold: default_gold(),
            platinum: default_platinum(),
        }
    }
}

fn default_silver() -> u32 {
    3
}

fn default_gold() -> u32 {
    5
}

fn default_platinum() -> u32 {
    10
}

/// Agreement expiry scheduling.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct AgreementsConfig {
    /// Days before expiry at which an approved partnership goes under review.
    #[serde(default = "default_review_window")]
    pub review_window_days: u32,
}

impl Default for AgreementsConfig {
    fn default() -> Self {
        Self {
            review_window_days: default_review_window(),
        }
    }
}

fn default_review_window() -> u32 {
    30
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("TULAY").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
