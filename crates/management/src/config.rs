use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::engine::{EngineBackend, EngineConfig};
use crate::management::{ObjectName, DEPLOYMENTS_OBJECT_NAME};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub engine: EngineConfig,
    #[serde(default)]
    pub management: ManagementConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagementConfig {
    /// Name the deployments bean is registered under
    #[serde(rename = "objectName", alias = "object_name")]
    pub object_name: String,
}

impl Default for ManagementConfig {
    fn default() -> Self {
        Self {
            object_name: DEPLOYMENTS_OBJECT_NAME.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// tracing-subscriber filter directive; `RUST_LOG` wins when set
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

impl Config {
    /// Load from `MANAGEMENT_CONFIG` (YAML) when set, otherwise from the
    /// environment.
    pub fn load() -> crate::Result<Self> {
        // Load environment variables from .env file if it exists
        let _ = dotenvy::dotenv();

        if let Ok(path) = std::env::var("MANAGEMENT_CONFIG") {
            return Self::from_file(Path::new(&path));
        }

        let config = Config {
            engine: EngineConfig {
                backend: match std::env::var("ENGINE_BACKEND")
                    .unwrap_or_else(|_| "sqlite".to_string())
                    .to_lowercase()
                    .as_str()
                {
                    "memory" => EngineBackend::Memory,
                    "sqlite" => EngineBackend::Sqlite,
                    other => {
                        return Err(crate::Error::Config(format!(
                            "Unknown ENGINE_BACKEND '{}' (expected memory or sqlite)",
                            other
                        )))
                    }
                },
                sqlite_path: std::env::var("ENGINE_SQLITE_PATH")
                    .map(PathBuf::from)
                    .ok()
                    .or_else(|| Some(PathBuf::from("data/process-engine.db"))),
                max_connections: std::env::var("ENGINE_MAX_CONNECTIONS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5),
            },
            management: ManagementConfig {
                object_name: std::env::var("MANAGEMENT_OBJECT_NAME")
                    .unwrap_or_else(|_| DEPLOYMENTS_OBJECT_NAME.to_string()),
            },
            logging: LoggingConfig {
                filter: std::env::var("LOG_FILTER").unwrap_or_else(|_| "info".to_string()),
            },
        };

        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> crate::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> crate::Result<()> {
        self.engine.validate().map_err(crate::Error::Config)?;
        self.management
            .object_name
            .parse::<ObjectName>()
            .map_err(|e| crate::Error::Config(e.to_string()))?;
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            management: ManagementConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
