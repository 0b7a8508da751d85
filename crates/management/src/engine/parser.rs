//! Process package reader.
//!
//! Extracts the process elements of a BPMN 2.0 resource so the repository can
//! assign keys, names and descriptions. Flow elements are skipped; nothing
//! here interprets execution semantics.

use serde::Deserialize;
use std::collections::HashSet;
use tracing::debug;

use crate::{engine::ProcessDescriptor, Error, Result};

/// Resource name suffixes the engine treats as process packages.
pub const BPMN_RESOURCE_SUFFIXES: &[&str] = &[".bpmn20.xml", ".bpmn"];

#[derive(Debug, Deserialize)]
struct DefinitionsXml {
    #[serde(
        rename = "process",
        alias = "bpmn:process",
        alias = "bpmn2:process",
        default
    )]
    processes: Vec<ProcessXml>,
}

#[derive(Debug, Deserialize)]
struct ProcessXml {
    #[serde(rename = "@id", default)]
    id: String,
    #[serde(rename = "@name", default)]
    name: Option<String>,
    #[serde(rename = "@isExecutable", default)]
    is_executable: Option<bool>,
    #[serde(
        rename = "documentation",
        alias = "bpmn:documentation",
        alias = "bpmn2:documentation",
        default
    )]
    documentation: Vec<DocumentationXml>,
}

impl ProcessXml {
    /// Processes default to executable when the attribute is absent.
    fn executable(&self) -> bool {
        self.is_executable.unwrap_or(true)
    }

    /// Documentation entries joined by newlines, in document order.
    fn description(&self) -> Option<String> {
        let text = self
            .documentation
            .iter()
            .map(|d| d.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n");
        non_empty(Some(text))
    }
}

#[derive(Debug, Deserialize)]
struct DocumentationXml {
    #[serde(rename = "$text", default)]
    text: String,
}

pub fn is_process_resource(resource_name: &str) -> bool {
    let lower = resource_name.to_ascii_lowercase();
    BPMN_RESOURCE_SUFFIXES
        .iter()
        .any(|suffix| lower.ends_with(suffix))
}

/// Parse a deployment resource into the executable processes it declares, in
/// document order. Processes marked `isExecutable="false"` are skipped.
pub fn parse_process_resource(resource_name: &str, resource: &[u8]) -> Result<Vec<ProcessDescriptor>> {
    if !is_process_resource(resource_name) {
        return Err(Error::Deploy(format!(
            "Resource '{}' is not a process package (expected one of {:?})",
            resource_name, BPMN_RESOURCE_SUFFIXES
        )));
    }

    let definitions: DefinitionsXml = quick_xml::de::from_reader(resource)
        .map_err(|e| Error::Deploy(format!("Failed to parse '{}': {}", resource_name, e)))?;

    let declared = definitions.processes.len();
    let processes: Vec<ProcessXml> = definitions
        .processes
        .into_iter()
        .filter(|p| {
            if !p.executable() {
                debug!("Skipping non-executable process '{}' in {}", p.id, resource_name);
            }
            p.executable()
        })
        .collect();

    if processes.is_empty() {
        return Err(Error::Deploy(if declared == 0 {
            format!("Resource '{}' does not declare any process", resource_name)
        } else {
            format!("Resource '{}' declares no executable process", resource_name)
        }));
    }

    let mut seen = HashSet::new();
    let mut descriptors = Vec::with_capacity(processes.len());
    for process in processes {
        let description = process.description();
        let key = process.id.trim().to_string();
        if key.is_empty() {
            return Err(Error::Deploy(format!(
                "Resource '{}' declares a process without an id",
                resource_name
            )));
        }
        if key.contains(':') || key.chars().any(char::is_whitespace) {
            return Err(Error::Deploy(format!("Invalid process id '{}'", key)));
        }
        if !seen.insert(key.clone()) {
            return Err(Error::Deploy(format!(
                "Process id '{}' is declared more than once in '{}'",
                key, resource_name
            )));
        }

        descriptors.push(ProcessDescriptor {
            key,
            name: non_empty(process.name),
            description,
        });
    }

    debug!("Parsed {} process(es) from {}", descriptors.len(), resource_name);
    Ok(descriptors)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
