use crate::files::{collect_files, load_rules};
use crate::ignore::IgnoreRules;
use crate::java::first_output_dir;
use crate::zip_handler::{PackageInfo, ZipHandler};
use funckit_models::{FuncError, WorkerRuntime, HOST_JSON_FILE};
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

#[derive(Debug, Clone)]
pub struct PackOptions {
    pub app_root: PathBuf,
    /// Directory, relative to the working directory, to place the zip in.
    pub output: Option<PathBuf>,
    pub runtime: WorkerRuntime,
    pub max_size: u64,
}

#[derive(Debug, Clone)]
pub struct PackOutcome {
    pub path: PathBuf,
    pub package: PackageInfo,
}

/// `<cwd>/<app>.zip`, or `<cwd>/<output>/<app>.zip` with the output
/// directory created on demand.
pub fn resolve_output_path(cwd: &Path, app_root: &Path, output: Option<&Path>) -> Result<PathBuf, FuncError> {
    let root = std::fs::canonicalize(app_root).map_err(|e| FuncError::io(app_root, e))?;
    let name = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| FuncError::InvalidArgument {
            reason: format!("cannot derive a package name from {}", root.display()),
        })?;
    let file_name = format!("{name}.zip");

    match output {
        Some(dir) => {
            let dir = cwd.join(dir);
            std::fs::create_dir_all(&dir).map_err(|e| FuncError::io(&dir, e))?;
            Ok(dir.join(file_name))
        }
        None => Ok(cwd.join(file_name)),
    }
}

#[instrument(skip(options), fields(app_root = %options.app_root.display(), runtime = %options.runtime))]
pub async fn pack(cwd: &Path, options: &PackOptions) -> Result<PackOutcome, FuncError> {
    let host_json = options.app_root.join(HOST_JSON_FILE);
    if !host_json.exists() {
        return Err(FuncError::ProjectNotFound {
            path: host_json.display().to_string(),
        });
    }

    let (source_root, rules) = if options.runtime == WorkerRuntime::Java {
        (first_output_dir(&options.app_root)?, IgnoreRules::default())
    } else {
        (options.app_root.clone(), load_rules(&options.app_root)?)
    };

    let path = resolve_output_path(cwd, &options.app_root, options.output.as_deref())?;
    if path.exists() {
        info!(path = %path.display(), "Deleting the old package");
        std::fs::remove_file(&path).map_err(|e| FuncError::io(&path, e))?;
    }

    let files = collect_files(&source_root, &rules)?;
    let package = ZipHandler::new(options.max_size)
        .create_package(&source_root, &files)
        .await?;

    std::fs::write(&path, &package.zip_data).map_err(|e| FuncError::io(&path, e))?;
    info!(
        path = %path.display(),
        sha256 = %package.sha256,
        files = package.files.len(),
        "Created package"
    );

    Ok(PackOutcome { path, package })
}
