use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// Unit of upload; immutable once created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    pub id: String,
    pub name: String,
    pub deployment_time: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessDefinition {
    pub id: String,
    pub key: String,
    pub name: Option<String>,
    pub version: u32,
    pub state: SuspensionState,
    pub description: Option<String>,
    pub deployment_id: String,
    pub resource_name: String,
}

impl ProcessDefinition {
    /// Engine-assigned identifier for a definition, unique per (key, version).
    pub fn make_id(key: &str, version: u32, deployment_id: &str) -> String {
        format!("{}:{}:{}", key, version, deployment_id)
    }

    pub fn is_suspended(&self) -> bool {
        self.state == SuspensionState::Suspended
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuspensionState {
    Active,
    Suspended,
}

impl Default for SuspensionState {
    fn default() -> Self {
        SuspensionState::Active
    }
}

impl fmt::Display for SuspensionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SuspensionState::Active => write!(f, "active"),
            SuspensionState::Suspended => write!(f, "suspended"),
        }
    }
}

impl FromStr for SuspensionState {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(SuspensionState::Active),
            "suspended" => Ok(SuspensionState::Suspended),
            other => Err(crate::Error::Internal(format!(
                "Unknown suspension state: {}",
                other
            ))),
        }
    }
}

/// A process found inside a deployment resource, before the engine assigns
/// it an identifier and a version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessDescriptor {
    pub key: String,
    pub name: Option<String>,
    pub description: Option<String>,
}
