use schemars::{JsonSchema, Schema, schema_for};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-webhook configuration of the deployment update driver.
///
/// `name` is both the deployment name and the name of the container whose image gets replaced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct DeploymentUpdateConfig {
    pub tag: String,
    pub name: String,
    pub namespace: String,
    pub env: String,
    /// Stamped with the owning webhook's driver name, never read by the driver.
    #[serde(rename = "type")]
    pub r#type: String,
}

impl DeploymentUpdateConfig {
    pub fn schema(&self) -> Schema {
        schema_for!(DeploymentUpdateConfig)
    }
}

/// Configuration as handed to a driver by the host, either already typed or still a loose JSON value.
#[derive(Debug, Clone, PartialEq)]
pub enum RawConfig {
    DeploymentUpdate(DeploymentUpdateConfig),
    Untyped(serde_json::Value),
}


/// A webhook record owned by the host.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Webhook {
    pub name: String,
    pub driver: String,
    pub deployment_update_config: DeploymentUpdateConfig,
}

impl Webhook {
    pub fn new(name: impl Into<String>, driver: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            driver: driver.into(),
            ..Default::default()
        }
    }
}

/// Image coordinates announced by a registry push event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushedImage {
    pub repository: String,
    pub tag: String,
}

impl fmt::Display for PushedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.repository, self.tag)
    }
}
