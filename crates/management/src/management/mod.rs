//! Management surface over the engine repository.
//!
//! `DeploymentsMBean` is the facade; `MBeanServer` dispatches string-typed
//! attribute reads and operation calls to it by object name.

pub mod adapter;
pub mod facade;
pub mod info;
pub mod projection;
pub mod server;

pub use adapter::RepositoryAdapter;
pub use facade::DeploymentsMBean;
pub use info::{MBeanInfo, ObjectName, DEPLOYMENTS_OBJECT_NAME};
pub use projection::{DeploymentRow, ProcessDefinitionRow};
pub use server::{MBeanServer, ManagedBean, ManagementValue};

use std::sync::Arc;

use crate::engine::RepositoryService;

/// Server with the deployments bean registered under `object_name`.
pub async fn deployments_server(
    repository: Arc<dyn RepositoryService>,
    object_name: &str,
) -> crate::Result<(MBeanServer, ObjectName)> {
    let name: ObjectName = object_name.parse()?;
    let server = MBeanServer::new();
    server
        .register(name.clone(), Arc::new(DeploymentsMBean::new(repository)))
        .await?;
    Ok((server, name))
}
