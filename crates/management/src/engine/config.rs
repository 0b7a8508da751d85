use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub backend: EngineBackend,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sqlite_path: Option<PathBuf>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineBackend {
    Memory,
    Sqlite,
}

fn default_max_connections() -> u32 {
    5
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            backend: EngineBackend::Sqlite,
            sqlite_path: Some(PathBuf::from("data/process-engine.db")),
            max_connections: default_max_connections(),
        }
    }
}

impl EngineConfig {
    pub fn memory() -> Self {
        Self {
            backend: EngineBackend::Memory,
            sqlite_path: None,
            max_connections: default_max_connections(),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        match self.backend {
            EngineBackend::Memory => {}
            EngineBackend::Sqlite => {
                if self.sqlite_path.is_none() {
                    return Err("SQLite path is required for the sqlite engine backend".to_string());
                }
                if self.max_connections == 0 {
                    return Err("max_connections must be at least 1".to_string());
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlite_requires_path() {
        let config = EngineConfig {
            backend: EngineBackend::Sqlite,
            sqlite_path: None,
            max_connections: 1,
        };
        assert!(config.validate().is_err());
        assert!(EngineConfig::default().validate().is_ok());
        assert!(EngineConfig::memory().validate().is_ok());
    }

    #[test]
    fn test_backend_deserializes_lowercase() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"backend": "memory"}"#).unwrap();
        assert_eq!(config.backend, EngineBackend::Memory);
        assert_eq!(config.max_connections, 5);
    }
}
