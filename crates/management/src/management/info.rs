use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Well-known name the deployments bean is registered under.
pub const DEPLOYMENTS_OBJECT_NAME: &str = "org.activiti.jmx.Mbeans:type=Deployments";

/// `domain:key=value[,key=value]*`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectName {
    domain: String,
    properties: BTreeMap<String, String>,
}

impl ObjectName {
    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }
}

impl FromStr for ObjectName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| Error::Invocation(format!("Invalid object name '{}': {}", s, reason));

        let (domain, props) = s.split_once(':').ok_or_else(|| invalid("missing ':'"))?;
        if domain.is_empty() {
            return Err(invalid("empty domain"));
        }

        let mut properties = BTreeMap::new();
        for pair in props.split(',') {
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| invalid("property without '='"))?;
            let (key, value) = (key.trim(), value.trim());
            if key.is_empty() || value.is_empty() {
                return Err(invalid("empty property key or value"));
            }
            if properties.insert(key.to_string(), value.to_string()).is_some() {
                return Err(invalid("duplicate property key"));
            }
        }

        Ok(Self {
            domain: domain.to_string(),
            properties,
        })
    }
}

impl fmt::Display for ObjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.domain)?;
        for (i, (key, value)) in self.properties.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}={}", key, value)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Impact {
    /// Read-only
    Info,
    /// Changes engine state
    Action,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationInfo {
    pub name: String,
    pub description: String,
    pub signature: Vec<ParameterInfo>,
    #[serde(rename = "returnType")]
    pub return_type: String,
    pub impact: Impact,
}

/// Metadata a managed bean publishes about its attributes and operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MBeanInfo {
    #[serde(rename = "className")]
    pub class_name: String,
    pub description: String,
    pub attributes: Vec<AttributeInfo>,
    pub operations: Vec<OperationInfo>,
}

impl MBeanInfo {
    pub fn attribute(&self, name: &str) -> Option<&AttributeInfo> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn operation(&self, name: &str) -> Option<&OperationInfo> {
        self.operations.iter().find(|o| o.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_well_known_name() {
        let name: ObjectName = DEPLOYMENTS_OBJECT_NAME.parse().unwrap();
        assert_eq!(name.domain(), "org.activiti.jmx.Mbeans");
        assert_eq!(name.property("type"), Some("Deployments"));
        assert_eq!(name.to_string(), DEPLOYMENTS_OBJECT_NAME);
    }

    #[test]
    fn test_properties_are_canonically_ordered() {
        let a: ObjectName = "d:type=X,name=y".parse().unwrap();
        let b: ObjectName = "d:name=y,type=X".parse().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "d:name=y,type=X");
    }

    #[test]
    fn test_rejects_malformed_names() {
        for bad in ["nodomain", ":type=X", "d:", "d:type", "d:type=", "d:a=1,a=2"] {
            assert!(
                matches!(bad.parse::<ObjectName>(), Err(Error::Invocation(_))),
                "accepted {}",
                bad
            );
        }
    }

    #[test]
    fn test_impact_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&Impact::Action).unwrap(), "\"ACTION\"");
    }
}
