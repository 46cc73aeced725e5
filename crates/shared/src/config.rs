use std::path::PathBuf;

use thiserror::Error;

use crate::config_env::{optional_trimmed_env, parse_u32_env, require_env};

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
const DEFAULT_SHOP_NAME: &str = "Curt's Small Engine Repair";

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bind_addr: String,
    pub database_url: String,
    pub database_max_connections: u32,
    pub migrations_dir: PathBuf,
    pub assistant_shop_name: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required env var {0}")]
    MissingVar(String),
    #[error("invalid integer in env var {0}")]
    ParseInt(String),
    #[error("failed to load .env file: {0}")]
    Dotenv(String),
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            bind_addr: optional_trimmed_env("API_BIND_ADDR")
                .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            database_url: require_env("DATABASE_URL")?,
            database_max_connections: parse_u32_env("DATABASE_MAX_CONNECTIONS", 10)?,
            migrations_dir: optional_trimmed_env("MIGRATIONS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| {
                    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../db/migrations")
                }),
            assistant_shop_name: optional_trimmed_env("ASSISTANT_SHOP_NAME")
                .unwrap_or_else(|| DEFAULT_SHOP_NAME.to_string()),
        })
    }
}

/// Loads `.env` from the working directory when present. A missing file is not an error.
pub fn load_dotenv() -> Result<(), ConfigError> {
    match dotenvy::dotenv() {
        Ok(_) => Ok(()),
        Err(err) if err.not_found() => Ok(()),
        Err(err) => Err(ConfigError::Dotenv(err.to_string())),
    }
}
