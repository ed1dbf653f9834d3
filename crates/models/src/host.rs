use crate::{FuncError, WorkerRuntime};
use serde::{Deserialize, Serialize};

pub const HOST_JSON_FILE: &str = "host.json";
pub const EXTENSION_BUNDLE_ID: &str = "Microsoft.Azure.Functions.ExtensionBundle";
pub const EXTENSION_BUNDLE_VERSION: &str = "[4.*, 5.0.0)";

#[derive(Debug, Clone, Copy, Default)]
pub struct HostJsonOptions {
    pub extension_bundle: bool,
    pub managed_dependencies: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostJson {
    pub version: String,
    pub logging: Logging,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension_bundle: Option<ExtensionBundle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub managed_dependency: Option<ManagedDependency>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_handler: Option<CustomHandler>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Logging {
    pub application_insights: ApplicationInsights,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationInsights {
    pub sampling_settings: SamplingSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SamplingSettings {
    pub is_enabled: bool,
    pub excluded_types: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtensionBundle {
    pub id: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManagedDependency {
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomHandler {
    pub description: CustomHandlerDescription,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomHandlerDescription {
    pub default_executable_path: String,
    pub working_directory: String,
    pub arguments: Vec<String>,
}

impl HostJson {
    pub fn new(runtime: WorkerRuntime, options: HostJsonOptions) -> Self {
        let extension_bundle = (options.extension_bundle && !runtime.is_dotnet()).then(|| ExtensionBundle {
            id: EXTENSION_BUNDLE_ID.to_string(),
            version: EXTENSION_BUNDLE_VERSION.to_string(),
        });

        let managed_dependency = (runtime == WorkerRuntime::Powershell && options.managed_dependencies)
            .then_some(ManagedDependency { enabled: true });

        let custom_handler = (runtime == WorkerRuntime::Custom).then(|| CustomHandler {
            description: CustomHandlerDescription {
                default_executable_path: String::new(),
                working_directory: String::new(),
                arguments: Vec::new(),
            },
        });

        Self {
            version: "2.0".to_string(),
            logging: Logging {
                application_insights: ApplicationInsights {
                    sampling_settings: SamplingSettings {
                        is_enabled: true,
                        excluded_types: "Request".to_string(),
                    },
                },
            },
            extension_bundle,
            managed_dependency,
            custom_handler,
        }
    }

    pub fn to_json(&self) -> Result<String, FuncError> {
        let mut json = serde_json::to_string_pretty(self).map_err(|e| FuncError::TemplateError {
            reason: e.to_string(),
        })?;
        json.push('\n');
        Ok(json)
    }
}
