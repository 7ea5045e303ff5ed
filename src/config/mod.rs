//! Configuration module for the bucket reader service

use serde::Deserialize;
use config::{Config, ConfigError, Environment, File};
use std::path::PathBuf;

use crate::storage::BucketRef;

/// Main application settings
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub storage: StorageSettings,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Object storage configuration
///
/// `bucket`, `endpoint` and `region` have no defaults and must be provided.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    pub bucket: String,
    pub endpoint: String,
    pub region: String,
    #[serde(default)]
    pub force_path_style: bool,
    #[serde(default = "default_fetch_concurrency")]
    pub fetch_concurrency: usize,
}

fn default_fetch_concurrency() -> usize { 1 }

impl Settings {
    /// Load configuration from files and environment variables
    ///
    /// Configuration priority (highest to lowest):
    /// 1. Environment variables (prefixed with S3API_)
    /// 2. config/local.toml (gitignored)
    /// 3. config/default.toml
    pub fn load() -> Result<Self, ConfigError> {
        let config_dir = std::env::var("CONFIG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config"));

        let builder = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            .add_source(File::from(config_dir.join("local.toml")).required(false))
            // S3API_STORAGE__BUCKET, S3API_SERVER__PORT, etc.
            .add_source(
                Environment::with_prefix("S3API")
                    .separator("__")
                    .try_parsing(true)
            );

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("storage.bucket", &self.storage.bucket),
            ("storage.endpoint", &self.storage.endpoint),
            ("storage.region", &self.storage.region),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::Message(format!("{} must not be empty", name)));
            }
        }
        if self.storage.fetch_concurrency == 0 {
            return Err(ConfigError::Message(
                "storage.fetch_concurrency must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl StorageSettings {
    /// The immutable bucket reference handed to the reader
    pub fn bucket_ref(&self) -> BucketRef {
        BucketRef::new(&self.bucket, &self.endpoint, &self.region)
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        ServerSettings {
            host: "0.0.0.0".to_string(),
            port: 8080,
            workers: None,
        }
    }
}
