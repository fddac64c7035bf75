use crate::config::WebhookDefinition;
use crate::driver::Driver;
use crate::model::{RawConfig, Webhook};
use anyhow::{Context, Result, anyhow, bail};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Drivers by the name webhooks refer to them with.
#[derive(Default, Clone)]
pub struct DriverRegistry {
    drivers: HashMap<String, Arc<dyn Driver>>,
}

impl DriverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, driver: Arc<dyn Driver>) {
        self.drivers.insert(name.into(), driver);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Driver>> {
        self.drivers.get(name).cloned()
    }

    pub fn driver_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.drivers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Converts and validates every configured webhook with its driver.
    pub fn register_webhooks(
        &self,
        definitions: &[WebhookDefinition],
    ) -> Result<HashMap<String, Webhook>> {
        let mut webhooks = HashMap::new();
        for definition in definitions {
            if webhooks.contains_key(&definition.name) {
                bail!("Webhook {} is defined more than once", definition.name);
            }
            let webhook = self
                .register_webhook(definition)
                .with_context(|| format!("Failed to register webhook {}", definition.name))?;
            info!(
                "Registered webhook {} with driver {}",
                webhook.name, webhook.driver
            );
            webhooks.insert(webhook.name.clone(), webhook);
        }
        Ok(webhooks)
    }

    fn register_webhook(&self, definition: &WebhookDefinition) -> Result<Webhook> {
        let driver = self.get(&definition.driver).ok_or_else(|| {
            anyhow!(
                "Unknown driver {}, known drivers are {:?}",
                definition.driver,
                self.driver_names()
            )
        })?;

        let mut webhook = Webhook::new(&definition.name, &definition.driver);
        driver.convert_to_config_and_set_on_webhook(
            RawConfig::Untyped(definition.config.clone()),
            &mut webhook,
        )?;
        driver.validate_payload(&RawConfig::DeploymentUpdate(
            webhook.deployment_update_config.clone(),
        ))?;
        Ok(webhook)
    }
}
