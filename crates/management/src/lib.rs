pub mod config;
pub mod engine;
pub mod management;
pub mod metrics;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Deployment error: {0}")]
    Deploy(String),
    #[error("Invocation error: {0}")]
    Invocation(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Database migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error("SQLx error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),
    #[error("YAML error: {0}")]
    SerdeYaml(#[from] serde_yaml::Error),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Short, stable label used for metrics and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::NotFound(_) => "not_found",
            Error::Deploy(_) => "deploy",
            Error::Invocation(_) => "invocation",
            Error::Config(_) => "config",
            Error::Io(_) => "io",
            Error::Migrate(_) | Error::Sqlx(_) => "database",
            Error::SerdeJson(_) | Error::SerdeYaml(_) => "serialization",
            Error::Internal(_) => "internal",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
