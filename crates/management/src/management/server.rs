use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::{
    management::info::{MBeanInfo, ObjectName},
    metrics, Error, Result,
};

/// Loosely typed value crossing the management boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ManagementValue {
    Void,
    Row(Vec<String>),
    Rows(Vec<Vec<String>>),
}

/// A bean addressable through the management server. Arguments and results
/// are strings only; typed work happens behind this boundary.
#[async_trait]
pub trait ManagedBean: Send + Sync {
    fn info(&self) -> MBeanInfo;
    async fn get_attribute(&self, attribute: &str) -> Result<ManagementValue>;
    async fn invoke(&self, operation: &str, args: &[String]) -> Result<ManagementValue>;
}

/// Check the argument count of a string-typed call.
pub fn expect_args<'a, const N: usize>(operation: &str, args: &'a [String]) -> Result<[&'a str; N]> {
    if args.len() != N {
        return Err(Error::Invocation(format!(
            "Operation '{}' expects {} argument(s), got {}",
            operation,
            N,
            args.len()
        )));
    }
    Ok(std::array::from_fn(|i| args[i].as_str()))
}

/// In-process registry dispatching management calls by object name.
pub struct MBeanServer {
    beans: RwLock<BTreeMap<ObjectName, Arc<dyn ManagedBean>>>,
}

impl MBeanServer {
    pub fn new() -> Self {
        Self {
            beans: RwLock::new(BTreeMap::new()),
        }
    }

    pub async fn register(&self, name: ObjectName, bean: Arc<dyn ManagedBean>) -> Result<()> {
        let mut beans = self.beans.write().await;
        if beans.contains_key(&name) {
            return Err(Error::Invocation(format!("Instance already exists: {}", name)));
        }
        info!("Registered managed bean {}", name);
        beans.insert(name, bean);
        Ok(())
    }

    pub async fn unregister(&self, name: &ObjectName) -> Result<()> {
        self.beans
            .write()
            .await
            .remove(name)
            .map(|_| info!("Unregistered managed bean {}", name))
            .ok_or_else(|| instance_not_found(name))
    }

    pub async fn query_names(&self) -> Vec<ObjectName> {
        self.beans.read().await.keys().cloned().collect()
    }

    pub async fn get_info(&self, name: &ObjectName) -> Result<MBeanInfo> {
        Ok(self.lookup(name).await?.info())
    }

    pub async fn get_attribute(&self, name: &ObjectName, attribute: &str) -> Result<ManagementValue> {
        debug!("getAttribute {} {}", name, attribute);
        let (label, result) = match self.lookup(name).await {
            Ok(bean) => {
                let advertised = bean.info().attribute(attribute).is_some();
                (member_label(attribute, advertised), bean.get_attribute(attribute).await)
            }
            Err(e) => (UNKNOWN_MEMBER, Err(e)),
        };
        record(attribute, label, &result);
        result
    }

    pub async fn invoke(&self, name: &ObjectName, operation: &str, args: &[String]) -> Result<ManagementValue> {
        debug!("invoke {} {} {:?}", name, operation, args);
        let (label, result) = match self.lookup(name).await {
            Ok(bean) => {
                let advertised = bean.info().operation(operation).is_some();
                (member_label(operation, advertised), bean.invoke(operation, args).await)
            }
            Err(e) => (UNKNOWN_MEMBER, Err(e)),
        };
        record(operation, label, &result);
        result
    }

    // Clones the handle so no registry guard is held across a bean call
    async fn lookup(&self, name: &ObjectName) -> Result<Arc<dyn ManagedBean>> {
        self.beans
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| instance_not_found(name))
    }
}

impl Default for MBeanServer {
    fn default() -> Self {
        Self::new()
    }
}

fn instance_not_found(name: &ObjectName) -> Error {
    Error::Invocation(format!("Instance not found: {}", name))
}

/// Metric label for calls to members a bean does not advertise.
pub const UNKNOWN_MEMBER: &str = "unknown";

// Caller-supplied names only become label values once the bean advertises them
fn member_label(member: &str, advertised: bool) -> &str {
    if advertised {
        member
    } else {
        UNKNOWN_MEMBER
    }
}

fn record(member: &str, label: &str, result: &Result<ManagementValue>) {
    match result {
        Ok(_) => metrics::record_invocation(label, "ok"),
        Err(e) => {
            warn!("Management call {} failed: {}", member, e);
            metrics::record_invocation(label, e.kind());
        }
    }
}
