use crate::deployment::DeploymentClient;
use crate::endpoint::resolve_deployment_url;
use crate::error::DriverError;
use crate::model::{DeploymentUpdateConfig, RawConfig, Webhook};
use crate::payload::extract_pushed_image;
use crate::tag::is_valid_tag;
use async_trait::async_trait;
use axum::http::StatusCode;
use schemars::Schema;
use serde_json::Value;
use tracing::{debug, info};

pub static DEPLOYMENT_UPDATE_DRIVER: &str = "deploymentUpdate";

/// A webhook action the host can dispatch to by driver name.
#[async_trait]
pub trait Driver: Send + Sync {
    /// Checks a webhook's configuration at registration time. Performs no I/O.
    fn validate_payload(&self, config: &RawConfig) -> Result<StatusCode, DriverError>;

    /// Runs the webhook action for one inbound payload.
    async fn execute(&self, config: &RawConfig, payload: &Value) -> Result<StatusCode, DriverError>;

    /// Normalizes a loosely typed configuration onto the webhook record.
    fn convert_to_config_and_set_on_webhook(
        &self,
        config: RawConfig,
        webhook: &mut Webhook,
    ) -> Result<(), DriverError>;

    /// Zero value of the driver's configuration, used to derive its schema.
    fn driver_config_resource(&self) -> DeploymentUpdateConfig;

    fn customize_schema(&self, schema: Schema) -> Schema {
        schema
    }
}

/// Points one container of a deployment at the image announced by a registry push.
pub struct DeploymentUpdateDriver {
    cattle_url: String,
    deployments: DeploymentClient,
}

impl DeploymentUpdateDriver {
    pub fn new(cattle_url: impl Into<String>, deployments: DeploymentClient) -> Self {
        Self {
            cattle_url: cattle_url.into(),
            deployments,
        }
    }

    fn decode_config(config: &RawConfig) -> Result<DeploymentUpdateConfig, DriverError> {
        match config {
            RawConfig::DeploymentUpdate(config) => Ok(config.clone()),
            RawConfig::Untyped(value @ Value::Object(_)) => serde_json::from_value(value.clone())
                .map_err(|e| DriverError::ConfigShape(format!("couldn't unmarshal config: {}", e))),
            RawConfig::Untyped(value) => Err(DriverError::ConfigShape(format!(
                "expected a mapping, got {}",
                value
            ))),
        }
    }
}

#[async_trait]
impl Driver for DeploymentUpdateDriver {
    fn validate_payload(&self, config: &RawConfig) -> Result<StatusCode, DriverError> {
        let RawConfig::DeploymentUpdate(config) = config else {
            return Err(DriverError::ConfigShape(
                "expected a deployment update config".to_string(),
            ));
        };

        if config.tag.is_empty() {
            return Err(DriverError::MissingConfigField("Tag"));
        }
        if config.name.is_empty() {
            return Err(DriverError::MissingConfigField("Name"));
        }
        if config.namespace.is_empty() {
            return Err(DriverError::MissingConfigField("Namespace"));
        }
        is_valid_tag(&config.tag)?;

        Ok(StatusCode::OK)
    }

    async fn execute(&self, config: &RawConfig, payload: &Value) -> Result<StatusCode, DriverError> {
        let config = Self::decode_config(config)?;
        let pushed_image = extract_pushed_image(payload)?.to_string();
        debug!("Received push for image {}", pushed_image);

        let url = resolve_deployment_url(&self.cattle_url, &config.env, &config.namespace, &config.name)?;
        debug!("Resolved deployment {}/{} to {}", config.namespace, config.name, url);

        self.deployments
            .update_container_image(&url, &config.name, &pushed_image)
            .await?;
        info!(
            "Patched container {} of deployment {}/{} to image {}",
            config.name, config.namespace, config.name, pushed_image
        );

        Ok(StatusCode::OK)
    }

    fn convert_to_config_and_set_on_webhook(
        &self,
        config: RawConfig,
        webhook: &mut Webhook,
    ) -> Result<(), DriverError> {
        let mut config = match config {
            RawConfig::DeploymentUpdate(config) => config,
            RawConfig::Untyped(value @ Value::Object(_)) => serde_json::from_value(value)
                .map_err(|e| DriverError::UnconvertibleConfig(e.to_string()))?,
            RawConfig::Untyped(value) => return Err(DriverError::UnconvertibleConfig(value.to_string())),
        };
        config.r#type = webhook.driver.clone();
        webhook.deployment_update_config = config;
        Ok(())
    }

    fn driver_config_resource(&self) -> DeploymentUpdateConfig {
        DeploymentUpdateConfig::default()
    }
}
