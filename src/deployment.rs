use crate::config::Config;
use crate::error::DriverError;
use anyhow::{Context, Result};
use k8s_openapi::api::core::v1::{Container, PodTemplateSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Certificate, Client, Response};
use serde::Deserialize;
use serde_json::{Value, json};
use std::fs;
use std::time::Duration;
use tracing::{debug, info};

pub static REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
static STRATEGIC_MERGE_PATCH: &str = "application/strategic-merge-patch+json";

pub fn create_client(config: &Config) -> Result<Client> {
    info!("Initializing Kubernetes proxy HTTP client");
    // System certificates are loaded automatically with rustls-tls-native-roots
    let mut client_builder = Client::builder().timeout(REQUEST_TIMEOUT);

    for file_path in &config.tls.ca_certificate_paths {
        let file_content = fs::read(file_path)
            .with_context(|| format!("Failed to read file {}", file_path.display()))?;
        let cert = Certificate::from_pem(&file_content).context("Failed to parse certificate")?;
        client_builder = client_builder.add_root_certificate(cert);
    }

    client_builder.build().context("Failed to build HTTP client")
}

/// The parts of a fetched deployment the patcher looks at.
///
/// The proxy serves `apps/v1beta1` objects, so the strictly versioned `Deployment` type of
/// k8s-openapi can't be used for decoding.
#[derive(Debug, Default, Deserialize)]
pub struct RemoteDeployment {
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: Option<RemoteDeploymentSpec>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RemoteDeploymentSpec {
    #[serde(default)]
    pub template: PodTemplateSpec,
}

impl RemoteDeployment {
    pub fn containers(&self) -> &[Container] {
        self.spec
            .as_ref()
            .and_then(|spec| spec.template.spec.as_ref())
            .map(|pod_spec| pod_spec.containers.as_slice())
            .unwrap_or_default()
    }

    fn display_name(&self) -> String {
        match (&self.metadata.namespace, &self.metadata.name) {
            (Some(namespace), Some(name)) => format!("{}/{}", namespace, name),
            (None, Some(name)) => name.clone(),
            _ => "<unnamed>".to_string(),
        }
    }
}

/// Strategic merge patch that replaces a single container of a deployment's pod template.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerPatch {
    pub container: Container,
}

impl ContainerPatch {
    /// Copies the container named `container_name` and points it at `image`.
    pub fn for_container(
        deployment: &RemoteDeployment,
        container_name: &str,
        image: &str,
    ) -> Result<Self, DriverError> {
        let mut container = deployment
            .containers()
            .iter()
            .find(|container| container.name == container_name)
            .cloned()
            .ok_or_else(|| DriverError::ContainerNotFound {
                container: container_name.to_string(),
                deployment: deployment.display_name(),
            })?;
        container.image = Some(image.to_string());
        Ok(Self { container })
    }

    pub fn to_body(&self) -> Value {
        json!({
            "spec": {
                "template": {
                    "spec": {
                        "containers": [&self.container]
                    }
                }
            }
        })
    }
}

/// Reads and patches deployments through the cluster proxy.
#[derive(Debug, Clone)]
pub struct DeploymentClient {
    http_client: Client,
}

impl DeploymentClient {
    pub fn new(http_client: Client) -> Self {
        Self { http_client }
    }

    pub async fn fetch(&self, endpoint_url: &str) -> Result<RemoteDeployment, DriverError> {
        debug!("Fetching deployment from {}", endpoint_url);
        let response = self
            .http_client
            .get(endpoint_url)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .and_then(Response::error_for_status)
            .map_err(|source| transport_error(endpoint_url, source))?;
        let body = response
            .bytes()
            .await
            .map_err(|source| transport_error(endpoint_url, source))?;

        serde_json::from_slice(&body).map_err(|source| DriverError::Decode {
            url: endpoint_url.to_string(),
            source,
        })
    }

    pub async fn patch(&self, endpoint_url: &str, patch: &ContainerPatch) -> Result<(), DriverError> {
        let body = patch.to_body();
        debug!("Patching deployment at {} with patch {}", endpoint_url, body);
        self.http_client
            .patch(endpoint_url)
            .timeout(REQUEST_TIMEOUT)
            .header(CONTENT_TYPE, STRATEGIC_MERGE_PATCH)
            .body(body.to_string())
            .send()
            .await
            .and_then(Response::error_for_status)
            .map_err(|source| transport_error(endpoint_url, source))?;
        Ok(())
    }

    /// Replaces the image of one container in the deployment at `endpoint_url`.
    ///
    /// Issues exactly one GET followed by one PATCH, without retries. Returns the patch that was sent.
    pub async fn update_container_image(
        &self,
        endpoint_url: &str,
        container_name: &str,
        new_image: &str,
    ) -> Result<ContainerPatch, DriverError> {
        let deployment = self.fetch(endpoint_url).await?;
        let patch = ContainerPatch::for_container(&deployment, container_name, new_image)?;
        self.patch(endpoint_url, &patch).await?;
        Ok(patch)
    }
}

fn transport_error(url: &str, source: reqwest::Error) -> DriverError {
    DriverError::Transport {
        url: url.to_string(),
        source,
    }
}
