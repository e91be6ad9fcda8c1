use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use config;

use crate::models::project_filter::FilterPolicy;

#[derive(Debug, Deserialize, Clone)]
pub struct WebConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub web: WebConfig,
    pub database_path: String,
    pub media_path: String,
    pub allowed_origins: String,
    pub log_level: String,
    pub session_secret_key: String,
    pub use_secure_cookies: bool,
    pub filter_policy: FilterPolicy,
    pub max_upload_size_mb: u64,
    pub cost_of_living_csv: String,
}

/// Variable name to value, as loaded from the `.env` file and the process environment.
pub type EnvVars = HashMap<String, String>;

fn required_var<'a>(vars: &'a EnvVars, name: &str) -> Result<&'a str, config::ConfigError> {
    vars.get(name).map(String::as_str).ok_or_else(|| config::ConfigError::Message(format!(
        "FATAL: Environment variable '{}' is not set in your .env file.", name
    )))
}

fn require_absolute(name: &str, value: &str) -> Result<(), config::ConfigError> {
    if Path::new(value).is_relative() {
        return Err(config::ConfigError::Message(format!(
            "FATAL: The '{}' in your .env file is a relative path ('{}'). It MUST be an absolute path.",
            name, value
        )));
    }
    Ok(())
}

impl Config {
    pub fn from_env(env_path: &Path) -> Result<Self, config::ConfigError> {
        dotenvy::from_path(env_path)
            .map_err(|e| config::ConfigError::Message(format!(
                "FATAL: Failed to load .env file from '{}'. Error: {}", env_path.display(), e
            )))?;

        let vars: EnvVars = env::vars_os()
            .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
            .collect();
        Config::from_vars(&vars)
    }

    /// Checks the variables and layers them over `config/default.toml`.
    pub fn from_vars(vars: &EnvVars) -> Result<Self, config::ConfigError> {
        let database_path = required_var(vars, "DATABASE_PATH")?;
        let media_path = required_var(vars, "MEDIA_PATH")?;
        let session_secret_key = required_var(vars, "SESSION_SECRET_KEY")?;

        // 128 hex characters decode to the 64 bytes actix's cookie Key needs.
        if session_secret_key.len() != 128 || !session_secret_key.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(config::ConfigError::Message(
                "FATAL: 'SESSION_SECRET_KEY' must be 128 hexadecimal characters long (64 bytes). Run 'setup_cli secret generate'.".to_string()
            ));
        }

        require_absolute("DATABASE_PATH", database_path)?;
        require_absolute("MEDIA_PATH", media_path)?;

        let allowed_origins = vars.get("ALLOWED_ORIGINS").cloned().unwrap_or_default();
        let log_level = vars.get("LOG_LEVEL").cloned().unwrap_or_else(|| "info".to_string());
        let use_secure_cookies = vars
            .get("USE_SECURE_COOKIES")
            .and_then(|raw| raw.parse::<bool>().ok())
            .unwrap_or(false);

        let filter_policy = match vars.get("FILTER_POLICY") {
            Some(raw) => raw.parse::<FilterPolicy>().map_err(|_| config::ConfigError::Message(format!(
                "FATAL: 'FILTER_POLICY' must be 'permissive' or 'strict', got '{}'.", raw
            )))?,
            None => FilterPolicy::default(),
        };

        let builder = config::Config::builder()
            .add_source(config::File::new("config/default.toml", config::FileFormat::Toml))
            .set_override("database_path", database_path)?
            .set_override("media_path", media_path)?
            .set_override("session_secret_key", session_secret_key)?
            .set_override("allowed_origins", allowed_origins)?
            .set_override("log_level", log_level)?
            .set_override("use_secure_cookies", use_secure_cookies)?
            .set_override("filter_policy", filter_policy.as_str())?;

        // Optional values fall back to config/default.toml when absent from the environment.
        let builder = match vars.get("MAX_UPLOAD_SIZE_MB") {
            Some(raw) => {
                let mb = raw.trim().parse::<u64>().map_err(|_| config::ConfigError::Message(format!(
                    "FATAL: 'MAX_UPLOAD_SIZE_MB' must be a whole number, got '{}'.", raw
                )))?;
                builder.set_override("max_upload_size_mb", mb)?
            }
            None => builder,
        };
        let builder = match vars.get("COST_OF_LIVING_CSV") {
            Some(path) => builder.set_override("cost_of_living_csv", path.as_str())?,
            None => builder,
        };

        builder.build()?.try_deserialize()
    }

    /// Returns the full path to the SQLite database file inside its own folder.
    pub fn db_file_path(&self) -> PathBuf {
        PathBuf::from(&self.database_path)
            .join("supplychain")
            .join("supplychain.db")
    }

    /// Directory that receives uploaded event images.
    pub fn event_images_path(&self) -> PathBuf {
        PathBuf::from(&self.media_path).join("events")
    }
}
