//! In-process stand-in for the Rancher Kubernetes proxy.

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::IntoResponse;
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

pub(crate) static PROXY_PREFIX: &str = "/r/projects/proj1/kubernetes:6443";

#[derive(Debug, Clone)]
pub(crate) struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl RecordedRequest {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("request body should be JSON")
    }
}

struct Responses {
    get_status: StatusCode,
    get_body: String,
    patch_status: StatusCode,
}

#[derive(Clone)]
struct MockState {
    responses: Arc<Mutex<Responses>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

pub(crate) struct MockCluster {
    addr: SocketAddr,
    state: MockState,
}

impl MockCluster {
    /// Serves `deployment` on every GET and accepts every PATCH.
    pub async fn start(deployment: Value) -> Self {
        let state = MockState {
            responses: Arc::new(Mutex::new(Responses {
                get_status: StatusCode::OK,
                get_body: deployment.to_string(),
                patch_status: StatusCode::OK,
            })),
            requests: Arc::new(Mutex::new(Vec::new())),
        };
        let app = Router::new().fallback(record).with_state(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock cluster");
        let addr = listener.local_addr().expect("mock cluster address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("mock cluster failed");
        });
        Self { addr, state }
    }

    pub fn with_get_response(self, status: StatusCode, body: &str) -> Self {
        {
            let mut responses = self.state.responses.lock().unwrap();
            responses.get_status = status;
            responses.get_body = body.to_string();
        }
        self
    }

    pub fn with_patch_status(self, status: StatusCode) -> Self {
        self.state.responses.lock().unwrap().patch_status = status;
        self
    }

    /// Base service url as it would appear in the service configuration.
    pub fn cattle_url(&self) -> String {
        format!("http://{}/v3", self.addr)
    }

    /// Full proxy url for a Kubernetes REST path.
    pub fn url(&self, api_path: &str) -> String {
        format!("http://{}{}{}", self.addr, PROXY_PREFIX, api_path)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }
}

async fn record(
    State(state): State<MockState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    state.requests.lock().unwrap().push(RecordedRequest {
        method: method.clone(),
        path: uri.path().to_string(),
        content_type,
        body,
    });

    let responses = state.responses.lock().unwrap();
    match method {
        Method::GET => (responses.get_status, responses.get_body.clone()),
        Method::PATCH => (responses.patch_status, "{}".to_string()),
        _ => (StatusCode::METHOD_NOT_ALLOWED, String::new()),
    }
}

/// Deployment `ns1/web` running `acme/app:v1` in container `web` next to a sidecar.
pub(crate) fn web_deployment() -> Value {
    json!({
        "apiVersion": "apps/v1beta1",
        "kind": "Deployment",
        "metadata": {"name": "web", "namespace": "ns1"},
        "spec": {
            "replicas": 2,
            "selector": {"matchLabels": {"app": "web"}},
            "template": {
                "metadata": {"labels": {"app": "web"}},
                "spec": {
                    "containers": [
                        {
                            "name": "web",
                            "image": "acme/app:v1",
                            "imagePullPolicy": "Always",
                            "ports": [{"containerPort": 80, "protocol": "TCP"}]
                        },
                        {
                            "name": "sidecar",
                            "image": "acme/proxy:1"
                        }
                    ]
                }
            }
        }
    })
}
