use std::sync::Arc;
use tracing::debug;

use crate::{
    engine::{Deployment, ProcessDefinition, RepositoryService},
    Result,
};

/// The facade's only way into the engine. Holds no state besides the
/// repository handle and never caches results.
#[derive(Clone)]
pub struct RepositoryAdapter {
    repository: Arc<dyn RepositoryService>,
}

impl RepositoryAdapter {
    pub fn new(repository: Arc<dyn RepositoryService>) -> Self {
        Self { repository }
    }

    pub async fn deploy(&self, name: &str, resource: &[u8]) -> Result<Deployment> {
        debug!("Deploying resource {} ({} bytes)", name, resource.len());
        self.repository.deploy(name, resource).await
    }

    pub async fn list_deployments(&self) -> Result<Vec<Deployment>> {
        self.repository.list_deployments().await
    }

    pub async fn list_process_definitions(&self) -> Result<Vec<ProcessDefinition>> {
        self.repository.list_process_definitions().await
    }

    pub async fn get_process_definition(&self, id: &str) -> Result<ProcessDefinition> {
        debug!("Looking up process definition {}", id);
        self.repository.get_process_definition(id).await
    }

    pub async fn suspend(&self, id: &str) -> Result<()> {
        debug!("Suspending process definition {}", id);
        self.repository.suspend_process_definition(id).await
    }

    pub async fn activate(&self, id: &str) -> Result<()> {
        debug!("Activating process definition {}", id);
        self.repository.activate_process_definition(id).await
    }

    pub async fn delete_deployment(&self, id: &str) -> Result<()> {
        debug!("Deleting deployment {}", id);
        self.repository.delete_deployment(id).await
    }
}
