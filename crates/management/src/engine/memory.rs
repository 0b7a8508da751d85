use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    engine::{
        parser, Deployment, ProcessDefinition, ProcessDescriptor, RepositoryService,
        SuspensionState,
    },
    Error, Result,
};

#[derive(Debug, Default)]
struct RepositoryState {
    // Kept in deployment order
    deployments: Vec<Deployment>,
    definitions: Vec<ProcessDefinition>,
}

impl RepositoryState {
    fn next_version(&self, key: &str) -> u32 {
        self.definitions
            .iter()
            .filter(|d| d.key == key)
            .map(|d| d.version)
            .max()
            .unwrap_or(0)
            + 1
    }

    fn definition_mut(&mut self, id: &str) -> Result<&mut ProcessDefinition> {
        self.definitions
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| Error::NotFound(format!("process definition '{}'", id)))
    }
}

/// Repository that keeps all state in process memory.
pub struct InMemoryRepository {
    state: RwLock<RepositoryState>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(RepositoryState::default()),
        }
    }

    async fn set_state(&self, id: &str, state: SuspensionState) -> Result<()> {
        let mut guard = self.state.write().await;
        let definition = guard.definition_mut(id)?;
        if definition.state != state {
            debug!("Process definition {}: {} -> {}", id, definition.state, state);
            definition.state = state;
        }
        Ok(())
    }
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

fn build_definitions(
    state: &RepositoryState,
    deployment: &Deployment,
    descriptors: Vec<ProcessDescriptor>,
) -> Vec<ProcessDefinition> {
    descriptors
        .into_iter()
        .map(|descriptor| {
            let version = state.next_version(&descriptor.key);
            ProcessDefinition {
                id: ProcessDefinition::make_id(&descriptor.key, version, &deployment.id),
                key: descriptor.key,
                name: descriptor.name,
                version,
                state: SuspensionState::Active,
                description: descriptor.description,
                deployment_id: deployment.id.clone(),
                resource_name: deployment.name.clone(),
            }
        })
        .collect()
}

#[async_trait]
impl RepositoryService for InMemoryRepository {
    async fn init(&self) -> Result<()> {
        Ok(())
    }

    async fn deploy(&self, name: &str, resource: &[u8]) -> Result<Deployment> {
        // Parse before taking the lock so a bad resource never touches state
        let descriptors = parser::parse_process_resource(name, resource)?;

        let deployment = Deployment {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            deployment_time: Utc::now(),
        };

        let mut state = self.state.write().await;
        let definitions = build_definitions(&state, &deployment, descriptors);
        info!(
            "Deployed {} ({}) with {} process definition(s)",
            deployment.name,
            deployment.id,
            definitions.len()
        );
        state.definitions.extend(definitions);
        state.deployments.push(deployment.clone());

        Ok(deployment)
    }

    async fn list_deployments(&self) -> Result<Vec<Deployment>> {
        Ok(self.state.read().await.deployments.clone())
    }

    async fn delete_deployment(&self, id: &str) -> Result<()> {
        let mut state = self.state.write().await;
        let position = state
            .deployments
            .iter()
            .position(|d| d.id == id)
            .ok_or_else(|| Error::NotFound(format!("deployment '{}'", id)))?;

        state.deployments.remove(position);
        let before = state.definitions.len();
        state.definitions.retain(|d| d.deployment_id != id);
        info!(
            "Deleted deployment {} and {} process definition(s)",
            id,
            before - state.definitions.len()
        );
        Ok(())
    }

    async fn list_process_definitions(&self) -> Result<Vec<ProcessDefinition>> {
        let mut definitions = self.state.read().await.definitions.clone();
        definitions.sort_by(|a, b| a.key.cmp(&b.key).then(a.version.cmp(&b.version)));
        Ok(definitions)
    }

    async fn get_process_definition(&self, id: &str) -> Result<ProcessDefinition> {
        self.state
            .read()
            .await
            .definitions
            .iter()
            .find(|d| d.id == id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("process definition '{}'", id)))
    }

    async fn suspend_process_definition(&self, id: &str) -> Result<()> {
        self.set_state(id, SuspensionState::Suspended).await
    }

    async fn activate_process_definition(&self, id: &str) -> Result<()> {
        self.set_state(id, SuspensionState::Active).await
    }
}
