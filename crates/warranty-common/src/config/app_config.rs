//! Application configuration structs
//!
//! Loads configuration from environment variables (and a `.env` file when
//! present). Every value is validated here so components receive typed,
//! already-checked settings by injection.

use serde::Deserialize;
use std::env;
use std::fmt;
use std::time::Duration;

use warranty_core::Snowflake;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub api: ServerConfig,
    pub database: DatabaseConfig,
    pub discord: DiscordConfig,
    pub roles: RoleConfig,
    pub engine: EngineConfig,
    pub schedule: ScheduleConfig,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default = "default_env")]
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

/// HTTP server configuration
#[derive(Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
    /// Shared bearer secret for the redemption form, operator tooling and gateway relay
    pub token: String,
}

impl ServerConfig {
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Database configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// Directory holding SQL migrations; the crate's bundled set when unset
    #[serde(default)]
    pub migrations_dir: Option<String>,
}

/// Discord REST configuration
#[derive(Clone, Deserialize)]
pub struct DiscordConfig {
    pub token: String,
    /// The single community whose roles are managed
    pub guild_id: Snowflake,
    #[serde(default = "default_discord_api_base")]
    pub api_base: String,
}

impl fmt::Debug for DiscordConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiscordConfig")
            .field("token", &"<redacted>")
            .field("guild_id", &self.guild_id)
            .field("api_base", &self.api_base)
            .finish()
    }
}

/// Managed role identifiers; an unset role is simply never granted or revoked
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct RoleConfig {
    #[serde(default)]
    pub premium: Option<Snowflake>,
    #[serde(default)]
    pub warranty: Option<Snowflake>,
    #[serde(default)]
    pub member: Option<Snowflake>,
}

/// Activation engine settings
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_store_timeout_secs")]
    pub store_timeout_secs: u64,
}

impl EngineConfig {
    #[must_use]
    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store_timeout_secs)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            store_timeout_secs: default_store_timeout_secs(),
        }
    }
}

/// Sweep schedules (six-field cron expressions, seconds first)
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_reminder_cron")]
    pub reminder_cron: String,
    #[serde(default = "default_expiry_cron")]
    pub expiry_cron: String,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            reminder_cron: default_reminder_cron(),
            expiry_cron: default_expiry_cron(),
        }
    }
}

// Default value functions
fn default_app_name() -> String {
    "warranty-engine".to_string()
}

fn default_env() -> Environment {
    Environment::Development
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_max_connections() -> u32 {
    20
}

fn default_min_connections() -> u32 {
    5
}

fn default_discord_api_base() -> String {
    "https://discord.com/api/v10".to_string()
}

fn default_store_timeout_secs() -> u64 {
    10
}

fn default_reminder_cron() -> String {
    // Daily at 09:00
    "0 0 9 * * *".to_string()
}

fn default_expiry_cron() -> String {
    // Hourly
    "0 0 * * * *".to_string()
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if required environment variables are missing or malformed
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let config = Self {
            app: AppSettings {
                name: var("APP_NAME").unwrap_or_else(default_app_name),
                env: match var("APP_ENV") {
                    Some(s) => match s.to_lowercase().as_str() {
                        "production" => Environment::Production,
                        "staging" => Environment::Staging,
                        "development" => Environment::Development,
                        _ => return Err(ConfigError::InvalidValue("APP_ENV", s)),
                    },
                    None => default_env(),
                },
            },
            api: ServerConfig {
                host: var("API_HOST").unwrap_or_else(default_host),
                port: parse_var(&var, "API_PORT")?.ok_or(ConfigError::MissingVar("API_PORT"))?,
                token: var("API_TOKEN").ok_or(ConfigError::MissingVar("API_TOKEN"))?,
            },
            database: DatabaseConfig {
                url: var("DATABASE_URL").ok_or(ConfigError::MissingVar("DATABASE_URL"))?,
                max_connections: parse_var(&var, "DATABASE_MAX_CONNECTIONS")?
                    .unwrap_or_else(default_max_connections),
                min_connections: parse_var(&var, "DATABASE_MIN_CONNECTIONS")?
                    .unwrap_or_else(default_min_connections),
                migrations_dir: var("MIGRATIONS_DIR"),
            },
            discord: DiscordConfig {
                token: var("DISCORD_TOKEN").ok_or(ConfigError::MissingVar("DISCORD_TOKEN"))?,
                guild_id: parse_var(&var, "DISCORD_GUILD_ID")?
                    .ok_or(ConfigError::MissingVar("DISCORD_GUILD_ID"))?,
                api_base: var("DISCORD_API_BASE")
                    .map(|s| s.trim_end_matches('/').to_string())
                    .unwrap_or_else(default_discord_api_base),
            },
            roles: RoleConfig {
                premium: parse_var(&var, "PREMIUM_ROLE_ID")?,
                warranty: parse_var(&var, "WARRANTY_ROLE_ID")?,
                member: parse_var(&var, "MEMBER_ROLE_ID")?,
            },
            engine: EngineConfig {
                store_timeout_secs: parse_var(&var, "STORE_TIMEOUT_SECS")?
                    .unwrap_or_else(default_store_timeout_secs),
            },
            schedule: ScheduleConfig {
                reminder_cron: var("REMINDER_CRON").unwrap_or_else(default_reminder_cron),
                expiry_cron: var("EXPIRY_CRON").unwrap_or_else(default_expiry_cron),
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigError::InvalidValue(
                "DATABASE_MIN_CONNECTIONS",
                format!(
                    "{} exceeds DATABASE_MAX_CONNECTIONS ({})",
                    self.database.min_connections, self.database.max_connections
                ),
            ));
        }
        if self.engine.store_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "STORE_TIMEOUT_SECS",
                "must be greater than zero".to_string(),
            ));
        }
        check_cron("REMINDER_CRON", &self.schedule.reminder_cron)?;
        check_cron("EXPIRY_CRON", &self.schedule.expiry_cron)?;
        Ok(())
    }
}

fn parse_var<T, F>(var: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue(key, raw)),
        None => Ok(None),
    }
}

fn check_cron(key: &'static str, expr: &str) -> Result<(), ConfigError> {
    let fields = expr.split_whitespace().count();
    if fields == 6 || fields == 7 {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue(
            key,
            format!("expected 6 cron fields (with seconds), got {fields}"),
        ))
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
