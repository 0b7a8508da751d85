use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use url::Url;

use crate::{
    engine::RepositoryService,
    management::{
        adapter::RepositoryAdapter,
        info::{AttributeInfo, Impact, MBeanInfo, OperationInfo, ParameterInfo},
        projection::{deployment_rows, process_definition_rows, DeploymentRow, ProcessDefinitionRow},
        server::{expect_args, ManagedBean, ManagementValue},
    },
    Error, Result,
};

/// Management facade over the engine's deployment lifecycle.
///
/// Stateless: every attribute read goes back to the engine, so what this
/// reports always matches what the engine's own API reports.
#[derive(Clone)]
pub struct DeploymentsMBean {
    adapter: RepositoryAdapter,
}

impl DeploymentsMBean {
    pub fn new(repository: Arc<dyn RepositoryService>) -> Self {
        Self {
            adapter: RepositoryAdapter::new(repository),
        }
    }

    /// Attribute `Deployments`
    pub async fn deployments(&self) -> Result<Vec<DeploymentRow>> {
        let deployments = self.adapter.list_deployments().await?;
        Ok(deployment_rows(&deployments))
    }

    /// Attribute `ProcessDefinitions`
    pub async fn process_definitions(&self) -> Result<Vec<ProcessDefinitionRow>> {
        let definitions = self.adapter.list_process_definitions().await?;
        Ok(process_definition_rows(&definitions))
    }

    /// Read the package at `resource_path` and deploy it under `resource_name`.
    pub async fn deploy_process_definition(&self, resource_name: &str, resource_path: &str) -> Result<()> {
        let path = resolve_resource_path(resource_path)?;
        let resource = tokio::fs::read(&path).await.map_err(|e| {
            warn!("Cannot read deployment resource {}: {}", path.display(), e);
            Error::Deploy(format!("Cannot read resource '{}': {}", resource_path, e))
        })?;

        let deployment = self.adapter.deploy(resource_name, &resource).await?;
        info!("Deployed {} as deployment {}", resource_name, deployment.id);
        Ok(())
    }

    pub async fn suspend_process_definition_by_id(&self, id: &str) -> Result<()> {
        self.adapter.suspend(id).await
    }

    /// Activation keeps the past-tense name clients already call.
    pub async fn activated_process_definition_by_id(&self, id: &str) -> Result<()> {
        self.adapter.activate(id).await
    }

    pub async fn get_process_definition_by_id(&self, id: &str) -> Result<ProcessDefinitionRow> {
        let definition = self.adapter.get_process_definition(id).await?;
        Ok(ProcessDefinitionRow::from(&definition))
    }

    pub async fn delete_deployment(&self, id: &str) -> Result<()> {
        self.adapter.delete_deployment(id).await?;
        info!("Deleted deployment {}", id);
        Ok(())
    }
}

pub const ATTR_DEPLOYMENTS: &str = "Deployments";
pub const ATTR_PROCESS_DEFINITIONS: &str = "ProcessDefinitions";
pub const OP_DEPLOY_PROCESS_DEFINITION: &str = "deployProcessDefinition";
pub const OP_SUSPEND_PROCESS_DEFINITION: &str = "suspendProcessDefinitionById";
pub const OP_ACTIVATE_PROCESS_DEFINITION: &str = "activatedProcessDefinitionById";
// Accepted on dispatch, not advertised
pub const OP_ACTIVATE_PROCESS_DEFINITION_ALIAS: &str = "activateProcessDefinitionById";
pub const OP_GET_PROCESS_DEFINITION: &str = "getProcessDefinitionById";
pub const OP_DELETE_DEPLOYMENT: &str = "deleteDeployment";

fn string_param(name: &str, description: &str) -> ParameterInfo {
    ParameterInfo {
        name: name.to_string(),
        type_name: "string".to_string(),
        description: description.to_string(),
    }
}

fn operation(name: &str, description: &str, signature: Vec<ParameterInfo>, return_type: &str, impact: Impact) -> OperationInfo {
    OperationInfo {
        name: name.to_string(),
        description: description.to_string(),
        signature,
        return_type: return_type.to_string(),
        impact,
    }
}

#[async_trait]
impl ManagedBean for DeploymentsMBean {
    fn info(&self) -> MBeanInfo {
        let id = || string_param("id", "Process definition id");
        MBeanInfo {
            class_name: "DeploymentsMBean".to_string(),
            description: "Deployment lifecycle of the process engine".to_string(),
            attributes: vec![
                AttributeInfo {
                    name: ATTR_DEPLOYMENTS.to_string(),
                    type_name: "string[][]".to_string(),
                    description: "Deployments as [id, name, timestamp]".to_string(),
                },
                AttributeInfo {
                    name: ATTR_PROCESS_DEFINITIONS.to_string(),
                    type_name: "string[][]".to_string(),
                    description: "Process definitions as [id, name, version, suspended, description]"
                        .to_string(),
                },
            ],
            operations: vec![
                operation(
                    OP_DEPLOY_PROCESS_DEFINITION,
                    "Deploy a process package read from a path or file URL",
                    vec![
                        string_param("resourceName", "Name of the deployed resource"),
                        string_param("resourcePath", "Path or file URL of the package"),
                    ],
                    "void",
                    Impact::Action,
                ),
                operation(OP_SUSPEND_PROCESS_DEFINITION, "Suspend a process definition", vec![id()], "void", Impact::Action),
                operation(OP_ACTIVATE_PROCESS_DEFINITION, "Activate a suspended process definition", vec![id()], "void", Impact::Action),
                operation(OP_GET_PROCESS_DEFINITION, "Read one process definition", vec![id()], "string[]", Impact::Info),
                operation(
                    OP_DELETE_DEPLOYMENT,
                    "Delete a deployment and its process definitions",
                    vec![string_param("id", "Deployment id")],
                    "void",
                    Impact::Action,
                ),
            ],
        }
    }

    async fn get_attribute(&self, attribute: &str) -> Result<ManagementValue> {
        match attribute {
            ATTR_DEPLOYMENTS => Ok(ManagementValue::Rows(
                self.deployments().await?.into_iter().map(DeploymentRow::into_vec).collect(),
            )),
            ATTR_PROCESS_DEFINITIONS => Ok(ManagementValue::Rows(
                self.process_definitions()
                    .await?
                    .into_iter()
                    .map(ProcessDefinitionRow::into_vec)
                    .collect(),
            )),
            other => Err(Error::Invocation(format!("Attribute not found: {}", other))),
        }
    }

    async fn invoke(&self, op: &str, args: &[String]) -> Result<ManagementValue> {
        match op {
            OP_DEPLOY_PROCESS_DEFINITION => {
                let [name, path] = expect_args::<2>(op, args)?;
                self.deploy_process_definition(name, path).await?;
                Ok(ManagementValue::Void)
            }
            OP_SUSPEND_PROCESS_DEFINITION => {
                let [id] = expect_args::<1>(op, args)?;
                self.suspend_process_definition_by_id(id).await?;
                Ok(ManagementValue::Void)
            }
            OP_ACTIVATE_PROCESS_DEFINITION | OP_ACTIVATE_PROCESS_DEFINITION_ALIAS => {
                let [id] = expect_args::<1>(op, args)?;
                self.activated_process_definition_by_id(id).await?;
                Ok(ManagementValue::Void)
            }
            OP_GET_PROCESS_DEFINITION => {
                let [id] = expect_args::<1>(op, args)?;
                let row = self.get_process_definition_by_id(id).await?;
                Ok(ManagementValue::Row(row.into_vec()))
            }
            OP_DELETE_DEPLOYMENT => {
                let [id] = expect_args::<1>(op, args)?;
                self.delete_deployment(id).await?;
                Ok(ManagementValue::Void)
            }
            other => Err(Error::Invocation(format!("Operation not found: {}", other))),
        }
    }
}

/// Accepts a plain filesystem path or a `file:` URL. Only locators that start
/// with `file:` or contain `://` are read as URLs, so `proc:v1.bpmn` and
/// `C:\defs\p.bpmn` stay paths.
fn resolve_resource_path(locator: &str) -> Result<PathBuf> {
    if locator.trim().is_empty() {
        return Err(Error::Deploy("Resource path is empty".to_string()));
    }

    let is_url = locator.contains("://")
        || locator
            .get(..5)
            .map_or(false, |prefix| prefix.eq_ignore_ascii_case("file:"));
    if !is_url {
        return Ok(PathBuf::from(locator));
    }

    let url = Url::parse(locator)
        .map_err(|e| Error::Deploy(format!("Invalid resource locator '{}': {}", locator, e)))?;
    if url.scheme() != "file" {
        return Err(Error::Deploy(format!(
            "Unsupported resource locator scheme '{}'",
            url.scheme()
        )));
    }
    url.to_file_path()
        .map_err(|_| Error::Deploy(format!("Invalid file URL '{}'", locator)))
}
