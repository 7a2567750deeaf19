use serde::Deserialize;
use std::env;
use std::str::FromStr;

use crate::models::leaderboard::DEFAULT_LEADERBOARD_LIMIT;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    Mongo,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = config::ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mongo" | "mongodb" => Ok(StorageBackend::Mongo),
            "memory" | "in-memory" => Ok(StorageBackend::Memory),
            other => Err(config::ConfigError::Message(format!(
                "unknown storage backend '{}', expected 'mongo' or 'memory'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub storage: StorageBackend,
    pub mongo_uri: String,
    pub mongo_database: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub leaderboard_default_limit: u32,
    /// `username:password` guarding the /metrics endpoint.
    pub metrics_auth: String,
    pub otlp_endpoint: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        // Load environment variables from root .env file (two levels up)
        // Try root .env first, then fallback to local .env
        let skip_root_env = env::var("SKIP_ROOT_ENV").is_ok();
        if skip_root_env {
            dotenvy::dotenv().ok();
        } else if dotenvy::from_path("../../.env").is_err() {
            dotenvy::dotenv().ok();
        }

        // Determine environment (defaults to dev)
        let env = env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());

        // Build configuration from config/*.toml + ENV overrides
        let settings = config::Config::builder()
            .add_source(config::File::with_name(&format!("config/{}", env)).required(false))
            // Override with environment variables (prefix: APP__)
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        let storage = settings
            .get_string("storage.backend")
            .or_else(|_| env::var("STORAGE_BACKEND"))
            .unwrap_or_else(|_| "mongo".to_string())
            .parse::<StorageBackend>()?;

        let mongo_uri = settings
            .get_string("database.mongo_uri")
            .or_else(|_| env::var("MONGO_URI"))
            .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());

        let mongo_database = settings
            .get_string("database.mongo_database")
            .or_else(|_| env::var("MONGO_DATABASE"))
            .unwrap_or_else(|_| "flagforge".to_string());

        let jwt_secret = match settings
            .get_string("auth.jwt_secret")
            .or_else(|_| env::var("JWT_SECRET"))
        {
            Ok(secret) => secret,
            Err(_) if env == "prod" => {
                return Err(config::ConfigError::Message(
                    "JWT_SECRET must be set in production".to_string(),
                ))
            }
            Err(_) => {
                eprintln!("WARNING: Using default JWT_SECRET (dev mode only!)");
                "dev-secret-only-for-local-testing".to_string()
            }
        };

        let bind_addr = settings
            .get_string("server.bind_addr")
            .or_else(|_| env::var("BIND_ADDR"))
            .unwrap_or_else(|_| "0.0.0.0:8081".to_string());

        let leaderboard_default_limit = match settings
            .get_int("leaderboard.default_limit")
            .ok()
            .map(|v| v.to_string())
            .or_else(|| env::var("LEADERBOARD_DEFAULT_LIMIT").ok())
        {
            Some(raw) => raw.parse::<u32>().ok().filter(|v| *v > 0).ok_or_else(|| {
                config::ConfigError::Message(format!(
                    "leaderboard default limit must be a positive integer, got '{}'",
                    raw
                ))
            })?,
            None => DEFAULT_LEADERBOARD_LIMIT,
        };

        let metrics_auth = settings
            .get_string("metrics.auth")
            .or_else(|_| env::var("METRICS_AUTH"))
            .unwrap_or_else(|_| "admin:changeme".to_string());

        let otlp_endpoint = settings
            .get_string("telemetry.otlp_endpoint")
            .or_else(|_| env::var("OTEL_EXPORTER_OTLP_ENDPOINT"))
            .ok()
            .filter(|v| !v.trim().is_empty());

        Ok(Config {
            storage,
            mongo_uri,
            mongo_database,
            jwt_secret,
            bind_addr,
            leaderboard_default_limit,
            metrics_auth,
            otlp_endpoint,
        })
    }
}
