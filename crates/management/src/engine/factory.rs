use crate::engine::{EngineBackend, EngineConfig, InMemoryRepository, RepositoryService, SqliteRepository};
use std::sync::Arc;
use tracing::info;

/// Build and initialise the repository backend named by `config`.
pub async fn create_repository(config: &EngineConfig) -> crate::Result<Arc<dyn RepositoryService>> {
    config.validate().map_err(crate::Error::Config)?;

    let repository: Arc<dyn RepositoryService> = match config.backend {
        EngineBackend::Memory => {
            info!("Using in-memory process repository");
            Arc::new(InMemoryRepository::new())
        }
        EngineBackend::Sqlite => {
            let path = config
                .sqlite_path
                .as_ref()
                .ok_or_else(|| crate::Error::Config("SQLite path not configured".into()))?;
            Arc::new(SqliteRepository::new(path, config.max_connections).await?)
        }
    };

    repository.init().await?;
    Ok(repository)
}
