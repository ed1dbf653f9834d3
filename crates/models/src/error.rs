use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ErrorShape {
    pub error_message: String,
    pub error_type: String,
}

#[derive(Error, Debug)]
pub enum FuncError {
    #[error("Worker runtime '{value}' is not a valid option. Options are {options}")]
    InvalidWorkerRuntime { value: String, options: String },

    #[error("Language '{value}' is not available. Available language strings are {options}")]
    InvalidLanguage { value: String, options: String },

    #[error("Language {language} is not supported by worker runtime {runtime}")]
    UnsupportedLanguage { language: String, runtime: String },

    #[error("Unable to parse target framework {value} for worker runtime {runtime}. Valid options are {options}")]
    InvalidTargetFramework {
        value: String,
        runtime: String,
        options: String,
    },

    #[error("Invalid argument: {reason}")]
    InvalidArgument { reason: String },

    #[error("Unable to determine the worker runtime. Pass --worker-runtime or set FUNCTIONS_WORKER_RUNTIME in local.settings.json")]
    MissingWorkerRuntime,

    #[error("Settings in {path} are encrypted; encrypted settings are not supported")]
    EncryptedSettings { path: String },

    #[error("Invalid settings file {path}: {reason}")]
    InvalidSettings { path: String, reason: String },

    #[error("Template error: {reason}")]
    TemplateError { reason: String },

    #[error("Invalid Dockerfile at line {line}: {reason}")]
    InvalidDockerfile { line: usize, reason: String },

    #[error("Package too large: {size} bytes (max: {max_size})")]
    PackageTooLarge { size: u64, max_size: u64 },

    #[error("Invalid package: {reason}")]
    InvalidPackage { reason: String },

    #[error("No build output found under {path}. Run 'mvn clean package' first")]
    BuildOutputNotFound { path: String },

    #[error("Can't find {path}")]
    ProjectNotFound { path: String },

    #[error("Docker error: {message}")]
    DockerError { message: String },

    #[error("Kubernetes name '{name}' is invalid: {reason}")]
    InvalidKubernetesName { name: String, reason: String },

    #[error("I/O error on {path}: {reason}")]
    IoError { path: String, reason: String },

    #[error("Configuration error: {reason}")]
    ConfigError { reason: String },
}

impl FuncError {
    /// Wraps an `std::io::Error` together with the path it happened on.
    pub fn io(path: impl AsRef<Path>, err: std::io::Error) -> Self {
        FuncError::IoError {
            path: path.as_ref().display().to_string(),
            reason: err.to_string(),
        }
    }

    pub fn to_error_shape(&self) -> ErrorShape {
        ErrorShape {
            error_message: self.to_string(),
            error_type: self.error_type().to_string(),
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            FuncError::InvalidWorkerRuntime { .. } => "InvalidWorkerRuntime",
            FuncError::InvalidLanguage { .. } => "InvalidLanguage",
            FuncError::UnsupportedLanguage { .. } => "UnsupportedLanguage",
            FuncError::InvalidTargetFramework { .. } => "InvalidTargetFramework",
            FuncError::InvalidArgument { .. } => "InvalidArgument",
            FuncError::MissingWorkerRuntime => "MissingWorkerRuntime",
            FuncError::EncryptedSettings { .. } => "EncryptedSettings",
            FuncError::InvalidSettings { .. } => "InvalidSettings",
            FuncError::TemplateError { .. } => "TemplateError",
            FuncError::InvalidDockerfile { .. } => "InvalidDockerfile",
            FuncError::PackageTooLarge { .. } => "PackageTooLarge",
            FuncError::InvalidPackage { .. } => "InvalidPackage",
            FuncError::BuildOutputNotFound { .. } => "BuildOutputNotFound",
            FuncError::ProjectNotFound { .. } => "ProjectNotFound",
            FuncError::DockerError { .. } => "DockerError",
            FuncError::InvalidKubernetesName { .. } => "InvalidKubernetesName",
            FuncError::IoError { .. } => "IoError",
            FuncError::ConfigError { .. } => "ConfigError",
        }
    }

    /// Process exit code for the CLI: 2 for bad arguments, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        match self {
            FuncError::InvalidWorkerRuntime { .. }
            | FuncError::InvalidLanguage { .. }
            | FuncError::UnsupportedLanguage { .. }
            | FuncError::InvalidTargetFramework { .. }
            | FuncError::InvalidArgument { .. }
            | FuncError::MissingWorkerRuntime
            | FuncError::InvalidKubernetesName { .. } => 2,
            FuncError::EncryptedSettings { .. }
            | FuncError::InvalidSettings { .. }
            | FuncError::TemplateError { .. }
            | FuncError::InvalidDockerfile { .. }
            | FuncError::PackageTooLarge { .. }
            | FuncError::InvalidPackage { .. }
            | FuncError::BuildOutputNotFound { .. }
            | FuncError::ProjectNotFound { .. }
            | FuncError::DockerError { .. }
            | FuncError::IoError { .. }
            | FuncError::ConfigError { .. } => 1,
        }
    }
}
