//! Row projections of engine entities.
//!
//! Rows are what management clients read: fixed-arity sequences of strings.
//! Arity is carried by the array type, so a row can never grow or shrink
//! whatever the entity contains.

use chrono::SecondsFormat;
use serde::Serialize;

use crate::engine::{Deployment, ProcessDefinition};

pub const DEPLOYMENT_ROW_ARITY: usize = 3;
pub const PROCESS_DEFINITION_ROW_ARITY: usize = 5;

/// `[id, name, timestamp]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DeploymentRow([String; DEPLOYMENT_ROW_ARITY]);

/// `[id, name, version, suspended, description]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ProcessDefinitionRow([String; PROCESS_DEFINITION_ROW_ARITY]);

impl DeploymentRow {
    pub fn id(&self) -> &str {
        &self.0[0]
    }

    pub fn name(&self) -> &str {
        &self.0[1]
    }

    pub fn timestamp(&self) -> &str {
        &self.0[2]
    }

    pub fn fields(&self) -> &[String] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0.into()
    }
}

impl ProcessDefinitionRow {
    pub fn id(&self) -> &str {
        &self.0[0]
    }

    pub fn name(&self) -> &str {
        &self.0[1]
    }

    pub fn version(&self) -> &str {
        &self.0[2]
    }

    pub fn suspended(&self) -> &str {
        &self.0[3]
    }

    pub fn description(&self) -> &str {
        &self.0[4]
    }

    pub fn fields(&self) -> &[String] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0.into()
    }
}

impl From<&Deployment> for DeploymentRow {
    fn from(deployment: &Deployment) -> Self {
        Self([
            deployment.id.clone(),
            deployment.name.clone(),
            deployment
                .deployment_time
                .to_rfc3339_opts(SecondsFormat::Millis, true),
        ])
    }
}

impl From<&ProcessDefinition> for ProcessDefinitionRow {
    fn from(definition: &ProcessDefinition) -> Self {
        Self([
            definition.id.clone(),
            definition.name.clone().unwrap_or_default(),
            definition.version.to_string(),
            definition.is_suspended().to_string(),
            definition.description.clone().unwrap_or_default(),
        ])
    }
}

pub fn deployment_rows(deployments: &[Deployment]) -> Vec<DeploymentRow> {
    deployments.iter().map(DeploymentRow::from).collect()
}

pub fn process_definition_rows(definitions: &[ProcessDefinition]) -> Vec<ProcessDefinitionRow> {
    definitions.iter().map(ProcessDefinitionRow::from).collect()
}
