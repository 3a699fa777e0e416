use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info};
use validator::{Validate, ValidationError};

use crate::{
    clients::{PLAYGROUND_API_URL, PRODUCTION_API_URL},
    constants::KLARNA_PAYMENT_SYSTEM_KEYWORD,
};

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_KLARNA_TIMEOUT_SECS: u64 = 30;
const CONFIG_DIR: &str = "config";

/// Klarna merchant credentials and endpoint selection
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct KlarnaConfig {
    /// Merchant API username (UID)
    #[validate(length(min = 1))]
    pub username: String,

    #[validate(length(min = 1))]
    pub password: String,

    /// Selects the production API instead of the playground
    #[serde(default)]
    pub is_production: bool,

    /// Overrides the base URL derived from `is_production`
    #[serde(default)]
    pub api_url: Option<String>,

    #[serde(default = "default_klarna_timeout_secs")]
    pub timeout_secs: u64,
}

impl KlarnaConfig {
    pub fn api_base_url(&self) -> &str {
        match self.api_url.as_deref() {
            Some(url) if !url.trim().is_empty() => url,
            _ if self.is_production => PRODUCTION_API_URL,
            _ => PLAYGROUND_API_URL,
        }
    }
}

/// A payment method row as configured by the merchant
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PaymentMethodConfig {
    pub system_name: String,
    pub language: String,
    #[serde(default)]
    pub parameters: HashMap<String, String>,
}

impl PaymentMethodConfig {
    /// Parameter lookup ignoring case; file sources may lowercase keys
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Application configuration structure with validation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Server host address
    pub host: String,

    /// Server port (1024-65535)
    #[serde(default = "default_port")]
    #[validate(range(min = 1024))]
    pub port: u16,

    /// Application environment
    #[validate(length(min = 1))]
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    #[validate(custom = "validate_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    #[validate]
    pub klarna: KlarnaConfig,

    #[serde(default)]
    #[validate(custom = "validate_payment_methods")]
    pub payment_methods: Vec<PaymentMethodConfig>,
}

impl AppConfig {
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    /// Gets log level reference
    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Configuration loading failed: {0}")]
    Load(#[from] ConfigError),

    #[error("Configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_klarna_timeout_secs() -> u64 {
    DEFAULT_KLARNA_TIMEOUT_SECS
}

/// Validates log level values
fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if valid_levels.contains(&level.to_lowercase().as_str()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("log_level");
        err.message = Some("Must be one of: trace, debug, info, warn, error".into());
        Err(err)
    }
}

#[allow(clippy::ptr_arg)]
fn validate_payment_methods(methods: &Vec<PaymentMethodConfig>) -> Result<(), ValidationError> {
    if methods
        .iter()
        .any(|m| m.system_name == KLARNA_PAYMENT_SYSTEM_KEYWORD)
    {
        Ok(())
    } else {
        let mut err = ValidationError::new("payment_methods");
        err.message = Some(
            format!(
                "At least one payment method must use system name {}",
                KLARNA_PAYMENT_SYSTEM_KEYWORD
            )
            .into(),
        );
        Err(err)
    }
}

/// Initializes tracing using the provided log level as the default filter
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_directive = format!("stateset_klarna_payments={},tower_http=debug", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    let filter = EnvFilter::new(filter_directive);
    if json {
        let _ = fmt().with_env_filter(filter).json().try_init();
    } else {
        let _ = fmt().with_env_filter(filter).try_init();
    }
}

/// Loads application configuration
///
/// Layers configuration sources in this order:
/// 1. Built-in defaults
/// 2. Default config (config/default.toml)
/// 3. Environment-specific config (config/{env}.toml)
/// 4. Environment variables (APP__*)
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    load_config_from(Path::new(CONFIG_DIR))
}

pub fn load_config_from(config_dir: &Path) -> Result<AppConfig, AppConfigError> {
    // Support both RUN_ENV and APP_ENV for selecting config profile
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    if !config_dir.exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            config_dir.display()
        );
    }

    let config = Config::builder()
        .set_default("host", "0.0.0.0")?
        .set_default("port", i64::from(DEFAULT_PORT))?
        .set_default("environment", DEFAULT_ENV)?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .add_source(File::from(config_dir.join("default")).required(false))
        .add_source(File::from(config_dir.join(&run_env)).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    // Credentials have no default; fail with a readable message before deserializing
    if config.get_string("klarna.username").is_err() {
        error!("Klarna credentials are not configured. Set APP__KLARNA__USERNAME and APP__KLARNA__PASSWORD.");
        return Err(AppConfigError::Load(ConfigError::NotFound(
            "klarna.username is required but not configured".into(),
        )));
    }

    let app_config: AppConfig = config.try_deserialize()?;

    app_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    info!("Configuration loaded successfully");
    Ok(app_config)
}
