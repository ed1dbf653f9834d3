use crate::{FuncError, WorkerRuntime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const LOCAL_SETTINGS_FILE: &str = "local.settings.json";
pub const FUNCTIONS_WORKER_RUNTIME: &str = "FUNCTIONS_WORKER_RUNTIME";
pub const FUNCTIONS_WORKER_RUNTIME_VERSION: &str = "FUNCTIONS_WORKER_RUNTIME_VERSION";
pub const AZURE_WEB_JOBS_STORAGE: &str = "AzureWebJobsStorage";
pub const STORAGE_EMULATOR_CONNECTION_STRING: &str = "UseDevelopmentStorage=true";
pub const POWERSHELL_WORKER_DEFAULT_VERSION: &str = "7.4";
pub const DEFAULT_SQL_PROVIDER_NAME: &str = "System.Data.SqlClient";

/// Contents of `local.settings.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LocalSettings {
    #[serde(default)]
    pub is_encrypted: bool,
    #[serde(default)]
    pub values: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub connection_strings: BTreeMap<String, ConnectionStringEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<HostStartSettings>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConnectionStringEntry {
    Plain(String),
    Full {
        #[serde(rename = "ConnectionString")]
        connection_string: String,
        #[serde(rename = "ProviderName", default, skip_serializing_if = "Option::is_none")]
        provider_name: Option<String>,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HostStartSettings {
    #[serde(rename = "LocalHttpPort", default, skip_serializing_if = "Option::is_none")]
    pub local_http_port: Option<u16>,
    #[serde(rename = "CORS", default, skip_serializing_if = "Option::is_none")]
    pub cors: Option<String>,
    #[serde(rename = "CORSCredentials", default)]
    pub cors_credentials: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionString {
    pub name: String,
    pub value: String,
    pub provider_name: String,
}

impl LocalSettings {
    /// Settings a freshly initialised project starts with.
    pub fn new(runtime: WorkerRuntime) -> Self {
        let mut values = BTreeMap::new();
        values.insert(FUNCTIONS_WORKER_RUNTIME.to_string(), runtime.moniker().to_string());
        values.insert(
            AZURE_WEB_JOBS_STORAGE.to_string(),
            STORAGE_EMULATOR_CONNECTION_STRING.to_string(),
        );
        if runtime == WorkerRuntime::Powershell {
            values.insert(
                FUNCTIONS_WORKER_RUNTIME_VERSION.to_string(),
                POWERSHELL_WORKER_DEFAULT_VERSION.to_string(),
            );
        }

        Self {
            is_encrypted: false,
            values,
            connection_strings: BTreeMap::new(),
            host: None,
        }
    }

    pub fn to_json(&self) -> Result<String, FuncError> {
        let mut json = serde_json::to_string_pretty(self).map_err(|e| FuncError::InvalidSettings {
            path: LOCAL_SETTINGS_FILE.to_string(),
            reason: e.to_string(),
        })?;
        json.push('\n');
        Ok(json)
    }
}

/// A `local.settings.json` bound to its location on disk.
#[derive(Debug, Clone)]
pub struct SettingsFile {
    path: PathBuf,
    settings: LocalSettings,
}

impl SettingsFile {
    /// Loads the file; a missing file yields empty settings.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, FuncError> {
        let path = path.into();
        let settings = if path.exists() {
            let content = fs::read_to_string(&path).map_err(|e| FuncError::io(&path, e))?;
            let settings: LocalSettings =
                serde_json::from_str(&content).map_err(|e| FuncError::InvalidSettings {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                })?;
            if settings.is_encrypted {
                return Err(FuncError::EncryptedSettings {
                    path: path.display().to_string(),
                });
            }
            settings
        } else {
            LocalSettings::default()
        };

        Ok(Self { path, settings })
    }

    pub fn open_in(app_root: &Path) -> Result<Self, FuncError> {
        Self::open(app_root.join(LOCAL_SETTINGS_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn settings(&self) -> &LocalSettings {
        &self.settings
    }

    pub fn set_value(&mut self, name: &str, value: &str) {
        self.settings.values.insert(name.to_string(), value.to_string());
    }

    pub fn remove_value(&mut self, name: &str) -> bool {
        self.settings.values.remove(name).is_some()
    }

    pub fn values(&self) -> &BTreeMap<String, String> {
        &self.settings.values
    }

    pub fn set_connection_string(&mut self, name: &str, value: &str, provider_name: Option<&str>) {
        self.settings.connection_strings.insert(
            name.to_string(),
            ConnectionStringEntry::Full {
                connection_string: value.to_string(),
                provider_name: Some(provider_name.unwrap_or(DEFAULT_SQL_PROVIDER_NAME).to_string()),
            },
        );
    }

    pub fn remove_connection_string(&mut self, name: &str) -> bool {
        self.settings.connection_strings.remove(name).is_some()
    }

    pub fn connection_strings(&self) -> Vec<ConnectionString> {
        self.settings
            .connection_strings
            .iter()
            .map(|(name, entry)| match entry {
                ConnectionStringEntry::Plain(value) => ConnectionString {
                    name: name.clone(),
                    value: value.clone(),
                    provider_name: DEFAULT_SQL_PROVIDER_NAME.to_string(),
                },
                ConnectionStringEntry::Full {
                    connection_string,
                    provider_name,
                } => ConnectionString {
                    name: name.clone(),
                    value: connection_string.clone(),
                    provider_name: provider_name
                        .clone()
                        .unwrap_or_else(|| DEFAULT_SQL_PROVIDER_NAME.to_string()),
                },
            })
            .collect()
    }

    /// The configured worker runtime; `FUNCTIONS_WORKER_RUNTIME` in the
    /// process environment takes precedence over the file.
    pub fn worker_runtime(&self) -> Option<WorkerRuntime> {
        let env = std::env::var(FUNCTIONS_WORKER_RUNTIME).ok();
        resolve_worker_runtime(env.as_deref(), &self.settings.values)
    }

    pub fn commit(&self) -> Result<(), FuncError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| FuncError::io(parent, e))?;
            }
        }
        fs::write(&self.path, self.settings.to_json()?).map_err(|e| FuncError::io(&self.path, e))
    }
}

pub(crate) fn resolve_worker_runtime(
    env_value: Option<&str>,
    values: &BTreeMap<String, String>,
) -> Option<WorkerRuntime> {
    let setting = env_value.map(str::to_string).or_else(|| {
        values
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(FUNCTIONS_WORKER_RUNTIME))
            .map(|(_, v)| v.clone())
    })?;
    setting.parse().ok()
}
