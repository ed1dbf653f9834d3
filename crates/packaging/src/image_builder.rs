use crate::files::{collect_files, load_rules};
use crate::zip_handler::ZipHandler;
use funckit_models::FuncError;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, error, info, instrument};

const DOCKERFILE: &str = "Dockerfile";

pub struct ImageBuilder {
    docker_binary: String,
    registry: Option<String>,
    max_context_size: u64,
}

impl ImageBuilder {
    pub fn new(docker_binary: impl Into<String>, registry: Option<String>, max_context_size: u64) -> Self {
        Self {
            docker_binary: docker_binary.into(),
            registry,
            max_context_size,
        }
    }

    /// Builds the app at `app_root` and returns the image tag. The build
    /// context only holds files that survive `.funcignore`; `dockerfile` is
    /// used when the project does not ship its own. Without an explicit
    /// tag one is derived from the app name and the context hash.
    #[instrument(skip(self, dockerfile), fields(app_root = %app_root.display()))]
    pub async fn build_image(
        &self,
        app_root: &Path,
        dockerfile: &str,
        tag: Option<&str>,
    ) -> Result<String, FuncError> {
        let rules = load_rules(app_root)?;
        let files = collect_files(app_root, &rules)?;

        let zip_handler = ZipHandler::new(self.max_context_size);
        let package = zip_handler.create_package(app_root, &files).await?;

        let tag = match tag {
            Some(tag) => tag.to_string(),
            None => image_tag(self.registry.as_deref(), &app_name(app_root)?, &package.sha256),
        };
        let tag = tag.as_str();

        let temp_dir = tempfile::tempdir().map_err(|e| FuncError::io(std::env::temp_dir(), e))?;
        let build_context = temp_dir.path();
        zip_handler
            .extract_to_directory(&package.zip_data, build_context)
            .await?;

        let dockerfile_path = build_context.join(DOCKERFILE);
        if dockerfile_path.exists() {
            debug!("Using the project's own Dockerfile");
        } else {
            std::fs::write(&dockerfile_path, dockerfile).map_err(|e| FuncError::io(&dockerfile_path, e))?;
        }

        info!(tag, context = %build_context.display(), "Building Docker image");

        let build_result = Command::new(&self.docker_binary)
            .arg("build")
            .arg("-t")
            .arg(tag)
            .arg("-f")
            .arg(&dockerfile_path)
            .arg(build_context)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| FuncError::DockerError {
                message: format!("failed to run {}: {e}", self.docker_binary),
            })?;

        if !build_result.status.success() {
            let stdout = String::from_utf8_lossy(&build_result.stdout);
            let stderr = String::from_utf8_lossy(&build_result.stderr);
            error!(%stdout, "Docker build failed");
            return Err(FuncError::DockerError {
                message: format!("Docker build failed: {}", stderr.trim()),
            });
        }

        info!(tag, "Built Docker image");
        Ok(tag.to_string())
    }
}

/// Lowercased directory name of the app, usable as an image repository.
fn app_name(app_root: &Path) -> Result<String, FuncError> {
    let root = std::fs::canonicalize(app_root).map_err(|e| FuncError::io(app_root, e))?;
    root.file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .ok_or_else(|| FuncError::InvalidArgument {
            reason: format!("cannot derive an image name from {}", root.display()),
        })
}

/// `[<registry>/]<name>:<first 12 hex chars of the package hash>`.
pub fn image_tag(registry: Option<&str>, name: &str, sha256: &str) -> String {
    let short: String = sha256.chars().take(12).collect();
    match registry.map(|r| r.trim_end_matches('/')).filter(|r| !r.is_empty()) {
        Some(registry) => format!("{registry}/{name}:{short}"),
        None => format!("{name}:{short}"),
    }
}
