use crate::error::DriverError;
use url::{Position, Url};

/// Derives the tenant-scoped Kubernetes API address of a deployment behind the Rancher proxy.
///
/// The path of the configured service url (typically `/v3`) is dropped and replaced by
/// `/r/projects/<env>/kubernetes:6443` followed by the deployment's REST path.
pub fn resolve_deployment_url(
    base_cattle_url: &str,
    env: &str,
    namespace: &str,
    name: &str,
) -> Result<String, DriverError> {
    let url = Url::parse(base_cattle_url).map_err(|e| DriverError::Configuration {
        url: base_cattle_url.to_string(),
        reason: e.to_string(),
    })?;
    if url.cannot_be_a_base() || !url.has_host() {
        return Err(DriverError::Configuration {
            url: base_cattle_url.to_string(),
            reason: "url has no host".to_string(),
        });
    }

    let origin = &url[..Position::BeforePath];
    Ok(format!(
        "{}/r/projects/{}/kubernetes:6443/apis/apps/v1beta1/namespaces/{}/deployments/{}",
        origin, env, namespace, name
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replaces_api_path_with_project_proxy() {
        let url = resolve_deployment_url("https://rancher.example.com/v3", "proj1", "ns1", "svc1")
            .unwrap();
        assert_eq!(
            url,
            "https://rancher.example.com/r/projects/proj1/kubernetes:6443/apis/apps/v1beta1/namespaces/ns1/deployments/svc1"
        );
    }

    #[test]
    fn test_keeps_port_and_drops_query() {
        let url = resolve_deployment_url("http://10.0.0.5:8080/v2-beta/?debug=1", "1a5", "default", "web")
            .unwrap();
        assert_eq!(
            url,
            "http://10.0.0.5:8080/r/projects/1a5/kubernetes:6443/apis/apps/v1beta1/namespaces/default/deployments/web"
        );
    }

    #[test]
    fn test_origin_is_normalized() {
        let url = resolve_deployment_url("HTTP://Rancher.Example.com:80/v3", "p", "n", "d").unwrap();
        assert_eq!(
            url,
            "http://rancher.example.com/r/projects/p/kubernetes:6443/apis/apps/v1beta1/namespaces/n/deployments/d"
        );
    }

    #[test]
    fn test_works_without_path() {
        for base in ["https://rancher.example.com", "https://rancher.example.com/"] {
            let url = resolve_deployment_url(base, "proj1", "ns1", "svc1").unwrap();
            assert!(
                url.starts_with("https://rancher.example.com/r/projects/proj1/"),
                "{}",
                url
            );
        }
    }

    #[test]
    fn test_host_that_repeats_the_path_is_kept_intact() {
        let url = resolve_deployment_url("https://v3.example.com/v3", "p", "n", "d").unwrap();
        assert!(url.starts_with("https://v3.example.com/r/projects/p/"), "{}", url);
    }

    #[test]
    fn test_rejects_unparsable_url() {
        for base in ["", "not a url", "/v3", "mailto:ops@example.com"] {
            let err = resolve_deployment_url(base, "proj1", "ns1", "svc1").unwrap_err();
            assert!(
                matches!(err, DriverError::Configuration { ref url, .. } if url == base),
                "{:?} should be rejected, got {:?}",
                base,
                err
            );
        }
    }
}
