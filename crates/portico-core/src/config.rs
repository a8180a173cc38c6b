//! Configuration module
//!
//! Environment-driven configuration for the API service: server, database,
//! storage backend, upload dispatcher, and realtime channel settings.

use std::env;

const DEFAULT_SERVER_PORT: u16 = 8080;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 20;
const DEFAULT_DB_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_UPLOAD_SIZE_BYTES: usize = 50 * 1024 * 1024;
const DEFAULT_REALTIME_TOKEN_TTL_SECS: u64 = 3600;
const DEFAULT_REALTIME_CHANNEL_CAPACITY: usize = 256;

/// Storage backend selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageBackend {
    S3,
    Local,
}

impl StorageBackend {
    fn parse(value: &str) -> Result<Self, anyhow::Error> {
        match value.to_lowercase().as_str() {
            "s3" => Ok(StorageBackend::S3),
            "local" => Ok(StorageBackend::Local),
            other => Err(anyhow::anyhow!("Unknown storage backend: {}", other)),
        }
    }
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub environment: String,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub storage_backend: StorageBackend,
    pub storage_bucket: String,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    pub dispatcher_url: String,
    pub gateway_shared_key: String,
    pub max_upload_size_bytes: usize,
    pub realtime_token_secret: String,
    pub realtime_token_ttl_secs: u64,
    pub realtime_channel_capacity: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        // .env is optional; real deployments configure through the environment.
        dotenvy::dotenv().ok();

        let database_url = require_env("DATABASE_URL")?;
        let dispatcher_url = require_env("UPLOAD_DISPATCHER_URL")?;
        let storage_bucket = require_env("STORAGE_BUCKET")?;
        let gateway_shared_key = require_env("SESSION_GATEWAY_KEY")?;
        let realtime_token_secret = require_env("REALTIME_TOKEN_SECRET")?;
        if realtime_token_secret.len() < 32 {
            return Err(anyhow::anyhow!(
                "REALTIME_TOKEN_SECRET must be at least 32 characters long"
            ));
        }

        let storage_backend = StorageBackend::parse(
            &env::var("STORAGE_BACKEND").unwrap_or_else(|_| "s3".to_string()),
        )?;

        Ok(Config {
            server_port: env_parse("SERVER_PORT", DEFAULT_SERVER_PORT)?,
            cors_origins: env_list("CORS_ORIGINS"),
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            database_url,
            db_max_connections: env_parse("DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS)?,
            db_timeout_seconds: env_parse("DB_TIMEOUT_SECONDS", DEFAULT_DB_TIMEOUT_SECS)?,
            storage_backend,
            storage_bucket,
            s3_region: env::var("S3_REGION").ok(),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            local_storage_path: env::var("LOCAL_STORAGE_PATH").ok(),
            local_storage_base_url: env::var("LOCAL_STORAGE_BASE_URL").ok(),
            dispatcher_url,
            gateway_shared_key,
            max_upload_size_bytes: env_parse("MAX_UPLOAD_SIZE_BYTES", DEFAULT_MAX_UPLOAD_SIZE_BYTES)?,
            realtime_token_secret,
            realtime_token_ttl_secs: env_parse(
                "REALTIME_TOKEN_TTL_SECS",
                DEFAULT_REALTIME_TOKEN_TTL_SECS,
            )?,
            realtime_channel_capacity: env_parse(
                "REALTIME_CHANNEL_CAPACITY",
                DEFAULT_REALTIME_CHANNEL_CAPACITY,
            )?,
        })
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }
}

fn require_env(key: &str) -> Result<String, anyhow::Error> {
    env::var(key).map_err(|_| anyhow::anyhow!("{} environment variable not set", key))
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> Result<T, anyhow::Error>
where
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(value) => value
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("Invalid value for {}: {}", key, e)),
        Err(_) => Ok(default),
    }
}

fn env_list(key: &str) -> Vec<String> {
    env::var(key)
        .unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
