mod config;
mod models;
mod memory;
mod sqlite;
mod factory;
pub mod parser;

pub use config::{EngineBackend, EngineConfig};
pub use models::*;
pub use memory::InMemoryRepository;
pub use sqlite::SqliteRepository;
pub use factory::create_repository;

use async_trait::async_trait;

/// Repository capability of the process engine.
///
/// Implementations own all deployment state. Every mutation is atomic with
/// respect to concurrent readers: a deployment and its process definitions
/// become visible together and disappear together.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RepositoryService: Send + Sync {
    /// Prepare backing storage (schema migrations etc.)
    async fn init(&self) -> crate::Result<()>;

    // Deployment operations
    async fn deploy(&self, name: &str, resource: &[u8]) -> crate::Result<Deployment>;
    async fn list_deployments(&self) -> crate::Result<Vec<Deployment>>;
    async fn delete_deployment(&self, id: &str) -> crate::Result<()>;

    // Process definition operations
    async fn list_process_definitions(&self) -> crate::Result<Vec<ProcessDefinition>>;
    async fn get_process_definition(&self, id: &str) -> crate::Result<ProcessDefinition>;
    async fn suspend_process_definition(&self, id: &str) -> crate::Result<()>;
    async fn activate_process_definition(&self, id: &str) -> crate::Result<()>;
}
