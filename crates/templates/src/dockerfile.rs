use crate::assets;
use funckit_models::{DefaultsConfig, FuncError, Language, WorkerRuntime, POWERSHELL_WORKER_DEFAULT_VERSION};
use handlebars::Handlebars;
use serde::Serialize;
use tracing::debug;

pub const DOCKERFILE_NAME: &str = "Dockerfile";
pub const DOCKERIGNORE_NAME: &str = ".dockerignore";

/// Directory the functions host serves the app from.
pub const WEB_ROOT: &str = "/home/site/wwwroot";
pub const SCRIPT_ROOT_ENV: &str = "AzureWebJobsScriptRoot";
pub const CONSOLE_LOGGING_ENV: &str = "AzureFunctionsJobHost__Logging__Console__IsEnabled";

/// Fixed layout of the Java two-stage recipe.
pub mod java {
    pub const BUILD_STAGE: &str = "installer-env";
    pub const SOURCE_DIR: &str = "/src/java-function-app";
    pub const BUILD_COMMAND: &str = "mvn clean package";
    /// Maven output root; the first directory beneath it is the packaged app.
    pub const BUILD_OUTPUT_DIR: &str = "./target/azure-functions/";
    pub const FIRST_DIR_LOOKUP: &str = "$(ls -d */|head -n 1)";
    pub const IMAGE_REPOSITORY: &str = "mcr.microsoft.com/azure-functions/java";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DockerfileKind {
    Java,
    Node,
    TypeScript,
    Python,
    Powershell,
    Dotnet,
    DotnetCsx,
    DotnetIsolated,
    Custom,
}

impl DockerfileKind {
    pub const ALL: [DockerfileKind; 9] = [
        DockerfileKind::Java,
        DockerfileKind::Node,
        DockerfileKind::TypeScript,
        DockerfileKind::Python,
        DockerfileKind::Powershell,
        DockerfileKind::Dotnet,
        DockerfileKind::DotnetCsx,
        DockerfileKind::DotnetIsolated,
        DockerfileKind::Custom,
    ];

    pub fn select(runtime: WorkerRuntime, language: Language, csx: bool) -> Self {
        match runtime {
            WorkerRuntime::Java => DockerfileKind::Java,
            WorkerRuntime::Node if language == Language::TypeScript => DockerfileKind::TypeScript,
            WorkerRuntime::Node => DockerfileKind::Node,
            WorkerRuntime::Python => DockerfileKind::Python,
            WorkerRuntime::Powershell => DockerfileKind::Powershell,
            WorkerRuntime::Dotnet if csx => DockerfileKind::DotnetCsx,
            WorkerRuntime::Dotnet => DockerfileKind::Dotnet,
            WorkerRuntime::DotnetIsolated => DockerfileKind::DotnetIsolated,
            WorkerRuntime::Custom => DockerfileKind::Custom,
        }
    }

    pub fn template_name(&self) -> &'static str {
        match self {
            DockerfileKind::Java => "java",
            DockerfileKind::Node => "node",
            DockerfileKind::TypeScript => "typescript",
            DockerfileKind::Python => "python",
            DockerfileKind::Powershell => "powershell",
            DockerfileKind::Dotnet => "dotnet",
            DockerfileKind::DotnetCsx => "dotnet-csx",
            DockerfileKind::DotnetIsolated => "dotnet-isolated",
            DockerfileKind::Custom => "custom",
        }
    }

    fn asset_path(&self) -> String {
        format!("dockerfiles/{}.hbs", self.template_name())
    }
}

/// Values substituted into the recipe templates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DockerfileParams {
    pub host_version: u32,
    pub java_version: String,
    pub python_version: String,
    pub node_version: String,
    pub dotnet_version: String,
    pub powershell_version: String,
}

impl DockerfileParams {
    pub fn from_defaults(defaults: &DefaultsConfig) -> Self {
        Self {
            host_version: defaults.host_version,
            java_version: defaults.java_version.clone(),
            python_version: defaults.python_version.clone(),
            node_version: defaults.node_version.clone(),
            dotnet_version: defaults.dotnet_version.clone(),
            powershell_version: POWERSHELL_WORKER_DEFAULT_VERSION.to_string(),
        }
    }

    pub fn with_java_version(mut self, version: impl Into<String>) -> Self {
        self.java_version = version.into();
        self
    }

    /// Applies a target framework moniker such as `net8.0`.
    pub fn with_target_framework(mut self, target_framework: &str) -> Self {
        let version = target_framework.strip_prefix("net").unwrap_or(target_framework);
        self.dotnet_version = version.to_string();
        self
    }
}

/// Handlebars registry holding every recipe template.
pub struct DockerfileRenderer<'a> {
    handlebars: Handlebars<'a>,
}

impl<'a> DockerfileRenderer<'a> {
    pub fn new() -> Result<Self, FuncError> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(true);
        handlebars.register_escape_fn(handlebars::no_escape);

        for kind in DockerfileKind::ALL {
            let source = assets::asset(&kind.asset_path())?;
            handlebars
                .register_template_string(kind.template_name(), source)
                .map_err(|e| FuncError::TemplateError {
                    reason: format!("{}: {e}", kind.template_name()),
                })?;
        }

        Ok(Self { handlebars })
    }

    pub fn render(&self, kind: DockerfileKind, params: &DockerfileParams) -> Result<String, FuncError> {
        debug!(template = kind.template_name(), "Rendering Dockerfile");
        self.handlebars
            .render(kind.template_name(), params)
            .map_err(|e| FuncError::TemplateError {
                reason: format!("{}: {e}", kind.template_name()),
            })
    }
}

pub fn render_dockerfile(kind: DockerfileKind, params: &DockerfileParams) -> Result<String, FuncError> {
    DockerfileRenderer::new()?.render(kind, params)
}
