//! Secret, Deployment and Service manifests for running a function app
//! image on Kubernetes.

use base64::Engine;
use funckit_models::{FuncError, WorkerRuntime, FUNCTIONS_WORKER_RUNTIME};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const NAME_PATTERN: &str = r"^[a-z0-9\-\.]*$";
pub const MAX_NAME_LENGTH: usize = 253;
pub const DEFAULT_PORT: u16 = 80;
pub const DEFAULT_SERVICE_TYPE: &str = "LoadBalancer";

const NAME_DOC: &str = "See: https://kubernetes.io/docs/concepts/overview/working-with-objects/names";

pub fn validate_name(name: &str) -> Result<(), FuncError> {
    let invalid = |reason: String| FuncError::InvalidKubernetesName {
        name: name.to_string(),
        reason,
    };

    if name.is_empty() {
        return Err(invalid("name can't be empty".to_string()));
    }
    if name.len() > MAX_NAME_LENGTH {
        return Err(invalid(format!(
            "must be at most {MAX_NAME_LENGTH} characters. {NAME_DOC}"
        )));
    }

    let pattern = Regex::new(NAME_PATTERN).map_err(|e| invalid(e.to_string()))?;
    if !pattern.is_match(name) {
        return Err(invalid(format!("must match {NAME_PATTERN}. {NAME_DOC}")));
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct ManifestOptions {
    pub name: String,
    pub image: String,
    pub namespace: Option<String>,
    pub worker_runtime: Option<WorkerRuntime>,
    /// App settings, usually the `Values` of `local.settings.json`.
    pub settings: BTreeMap<String, String>,
    pub service_type: Option<String>,
    pub replicas: u32,
    pub pull_secret: Option<String>,
    pub port: Option<u16>,
}

impl ManifestOptions {
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            namespace: None,
            worker_runtime: None,
            settings: BTreeMap::new(),
            service_type: None,
            replicas: 1,
            pull_secret: None,
            port: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Resource {
    Secret(Secret),
    Deployment(Deployment),
    Service(Service),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Secret {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    pub data: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    pub spec: DeploymentSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentSpec {
    pub replicas: u32,
    pub selector: LabelSelector,
    pub template: PodTemplate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelSelector {
    pub match_labels: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PodTemplate {
    pub metadata: ObjectMeta,
    pub spec: PodSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodSpec {
    pub containers: Vec<Container>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub image_pull_secrets: Vec<NamedRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    pub name: String,
    pub image: String,
    pub env_from: Vec<EnvFromSource>,
    pub ports: Vec<ContainerPort>,
    pub readiness_probe: Probe,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvFromSource {
    pub secret_ref: NamedRef,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedRef {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerPort {
    pub container_port: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Probe {
    pub http_get: HttpGetAction,
    pub failure_threshold: u32,
    pub period_seconds: u32,
    pub success_threshold: u32,
    pub timeout_seconds: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpGetAction {
    pub path: String,
    pub port: u16,
    pub scheme: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    pub spec: ServiceSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceSpec {
    #[serde(rename = "type")]
    pub service_type: String,
    pub selector: BTreeMap<String, String>,
    pub ports: Vec<ServicePort>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicePort {
    pub port: u16,
    pub protocol: String,
    pub target_port: u16,
}

/// Builds the Secret, Deployment and Service for one app, in that order.
pub fn generate(options: &ManifestOptions) -> Result<Vec<Resource>, FuncError> {
    validate_name(&options.name)?;
    if let Some(namespace) = &options.namespace {
        validate_name(namespace)?;
    }
    if options.image.trim().is_empty() {
        return Err(FuncError::InvalidArgument {
            reason: "an image name is required".to_string(),
        });
    }

    let name = options.name.clone();
    let port = options.port.unwrap_or(DEFAULT_PORT);
    let app_labels = BTreeMap::from([("app".to_string(), name.clone())]);
    let metadata = |labels: BTreeMap<String, String>| ObjectMeta {
        name: name.clone(),
        namespace: options.namespace.clone(),
        labels,
    };

    let mut values = options.settings.clone();
    if let Some(runtime) = options.worker_runtime {
        values
            .entry(FUNCTIONS_WORKER_RUNTIME.to_string())
            .or_insert_with(|| runtime.moniker().to_string());
    }
    let engine = base64::engine::general_purpose::STANDARD;
    let secret = Secret {
        api_version: "v1".to_string(),
        kind: "Secret".to_string(),
        metadata: metadata(BTreeMap::new()),
        data: values
            .into_iter()
            .map(|(k, v)| (k, engine.encode(v)))
            .collect(),
    };

    let deployment = Deployment {
        api_version: "apps/v1".to_string(),
        kind: "Deployment".to_string(),
        metadata: metadata(app_labels.clone()),
        spec: DeploymentSpec {
            replicas: options.replicas,
            selector: LabelSelector {
                match_labels: app_labels.clone(),
            },
            template: PodTemplate {
                metadata: metadata(app_labels.clone()),
                spec: PodSpec {
                    containers: vec![Container {
                        name: name.clone(),
                        image: options.image.clone(),
                        env_from: vec![EnvFromSource {
                            secret_ref: NamedRef { name: name.clone() },
                        }],
                        ports: vec![ContainerPort { container_port: port }],
                        readiness_probe: Probe {
                            http_get: HttpGetAction {
                                path: "/".to_string(),
                                port,
                                scheme: "HTTP".to_string(),
                            },
                            failure_threshold: 3,
                            period_seconds: 10,
                            success_threshold: 1,
                            timeout_seconds: 240,
                        },
                    }],
                    image_pull_secrets: options
                        .pull_secret
                        .iter()
                        .map(|s| NamedRef { name: s.clone() })
                        .collect(),
                },
            },
        },
    };

    let service = Service {
        api_version: "v1".to_string(),
        kind: "Service".to_string(),
        metadata: metadata(BTreeMap::new()),
        spec: ServiceSpec {
            service_type: options
                .service_type
                .clone()
                .unwrap_or_else(|| DEFAULT_SERVICE_TYPE.to_string()),
            selector: app_labels,
            ports: vec![ServicePort {
                port,
                protocol: "TCP".to_string(),
                target_port: port,
            }],
        },
    };

    Ok(vec![
        Resource::Secret(secret),
        Resource::Deployment(deployment),
        Resource::Service(service),
    ])
}

/// Multi-document YAML, documents separated by `---`.
pub fn to_yaml(resources: &[Resource]) -> Result<String, FuncError> {
    let documents = resources
        .iter()
        .map(|r| {
            serde_yaml::to_string(r).map_err(|e| FuncError::TemplateError {
                reason: format!("failed to serialize manifest: {e}"),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(documents.join("---\n"))
}
