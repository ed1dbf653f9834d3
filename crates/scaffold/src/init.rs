use funckit_models::{
    Config, FuncError, HostJson, HostJsonOptions, Language, LocalSettings, SettingsFile, WorkerRuntime,
    HOST_JSON_FILE, LOCAL_SETTINGS_FILE,
};
use funckit_templates::assets;
use funckit_templates::dockerfile::{DOCKERFILE_NAME, DOCKERIGNORE_NAME};
use funckit_templates::{render_dockerfile, DockerfileKind, DockerfileParams};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

pub const ISOLATED_TARGET_FRAMEWORKS: [&str; 3] = ["net8.0", "net9.0", "net10.0"];
pub const IN_PROCESS_TARGET_FRAMEWORKS: [&str; 1] = ["net8.0"];

#[derive(Debug, Clone, Default)]
pub struct InitOptions {
    pub folder: Option<PathBuf>,
    pub worker_runtime: Option<String>,
    pub language: Option<String>,
    pub docker: bool,
    pub docker_only: bool,
    pub source_control: bool,
    pub extension_bundle: bool,
    pub managed_dependencies: Option<bool>,
    pub target_framework: Option<String>,
    pub csx: bool,
    pub force: bool,
}

#[derive(Debug, Clone)]
pub struct InitReport {
    pub root: PathBuf,
    pub runtime: WorkerRuntime,
    pub language: Language,
    /// Paths relative to `root`, in the order they were handled.
    pub written: Vec<String>,
    pub skipped: Vec<String>,
}

struct ProjectWriter {
    root: PathBuf,
    force: bool,
    written: Vec<String>,
    skipped: Vec<String>,
}

impl ProjectWriter {
    fn write(&mut self, relative: &str, content: &str) -> Result<(), FuncError> {
        let path = self.root.join(relative);
        if path.exists() && !self.force {
            debug!(file = relative, "Skipping existing file");
            self.skipped.push(relative.to_string());
            return Ok(());
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| FuncError::io(parent, e))?;
        }
        std::fs::write(&path, content).map_err(|e| FuncError::io(&path, e))?;
        info!(file = relative, "Writing");
        self.written.push(relative.to_string());
        Ok(())
    }

    fn write_asset(&mut self, relative: &str, asset_name: &str) -> Result<(), FuncError> {
        let content = assets::asset(asset_name)?;
        self.write(relative, &content)
    }

    fn into_report(self, runtime: WorkerRuntime, language: Language) -> InitReport {
        InitReport {
            root: self.root,
            runtime,
            language,
            written: self.written,
            skipped: self.skipped,
        }
    }
}

/// Accepted target frameworks and the default for a runtime, if it takes one.
pub fn target_frameworks(runtime: WorkerRuntime) -> Option<(&'static [&'static str], &'static str)> {
    match runtime {
        WorkerRuntime::DotnetIsolated => Some((&ISOLATED_TARGET_FRAMEWORKS[..], "net10.0")),
        WorkerRuntime::Dotnet => Some((&IN_PROCESS_TARGET_FRAMEWORKS[..], "net8.0")),
        _ => None,
    }
}

pub fn validate_target_framework(
    runtime: WorkerRuntime,
    requested: Option<&str>,
) -> Result<Option<String>, FuncError> {
    let Some((allowed, default)) = target_frameworks(runtime) else {
        return match requested {
            Some(_) => Err(FuncError::InvalidArgument {
                reason: "The --target-framework option is supported only when --worker-runtime is set to dotnet or dotnet-isolated".to_string(),
            }),
            None => Ok(None),
        };
    };

    match requested {
        None => Ok(Some(default.to_string())),
        Some(value) => allowed
            .iter()
            .find(|tf| tf.eq_ignore_ascii_case(value))
            .map(|tf| Some(tf.to_string()))
            .ok_or_else(|| FuncError::InvalidTargetFramework {
                value: value.to_string(),
                runtime: runtime.to_string(),
                options: allowed.join(", "),
            }),
    }
}

/// Managed dependencies are a Powershell feature that is on by default.
pub fn resolve_managed_dependencies(runtime: WorkerRuntime, requested: Option<bool>) -> Result<bool, FuncError> {
    match (runtime, requested) {
        (WorkerRuntime::Powershell, requested) => Ok(requested.unwrap_or(true)),
        (_, Some(true)) => Err(FuncError::InvalidArgument {
            reason: "Managed dependencies is only supported for PowerShell".to_string(),
        }),
        (_, _) => Ok(false),
    }
}

fn resolve_runtime_and_language(
    root: &Path,
    options: &InitOptions,
) -> Result<(WorkerRuntime, Language), FuncError> {
    if options.csx {
        let language = match options.language.as_deref() {
            Some(l) => Language::normalize(l)?,
            None => Language::CSharp,
        };
        if !Language::supported_by(WorkerRuntime::Dotnet).contains(&language) {
            return Err(FuncError::UnsupportedLanguage {
                language: language.to_string(),
                runtime: WorkerRuntime::Dotnet.to_string(),
            });
        }
        return Ok((WorkerRuntime::Dotnet, language));
    }

    match options.worker_runtime.as_deref() {
        Some(runtime) => funckit_models::resolve(runtime, options.language.as_deref()),
        None => {
            let runtime = SettingsFile::open_in(root)?
                .worker_runtime()
                .ok_or(FuncError::MissingWorkerRuntime)?;
            funckit_models::resolve(runtime.moniker(), options.language.as_deref())
        }
    }
}

fn render_project_dockerfile(
    runtime: WorkerRuntime,
    language: Language,
    csx: bool,
    target_framework: Option<&str>,
    config: &Config,
) -> Result<String, FuncError> {
    let mut params = DockerfileParams::from_defaults(&config.defaults);
    if let Some(tf) = target_framework {
        params = params.with_target_framework(tf);
    }
    render_dockerfile(DockerfileKind::select(runtime, language, csx), &params)
}

/// Scaffolds a function app. Existing files are left alone unless `force`
/// is set; the report says which files were written and which skipped.
#[instrument(skip(options, config), fields(cwd = %cwd.display()))]
pub async fn init(cwd: &Path, options: &InitOptions, config: &Config) -> Result<InitReport, FuncError> {
    let root = match &options.folder {
        Some(folder) => {
            let root = cwd.join(folder);
            std::fs::create_dir_all(&root).map_err(|e| FuncError::io(&root, e))?;
            root
        }
        None => cwd.to_path_buf(),
    };

    let (runtime, language) = resolve_runtime_and_language(&root, options)?;
    let target_framework = validate_target_framework(runtime, options.target_framework.as_deref())?;
    let mut writer = ProjectWriter {
        root,
        force: options.force,
        written: Vec::new(),
        skipped: Vec::new(),
    };

    if options.docker_only {
        write_docker_files(&mut writer, runtime, language, options.csx, target_framework.as_deref(), config)?;
        return Ok(writer.into_report(runtime, language));
    }

    let managed_dependencies = resolve_managed_dependencies(runtime, options.managed_dependencies)?;
    info!(%runtime, %language, "Initialising function app");

    match (runtime, language) {
        (WorkerRuntime::Python, _) => {
            writer.write_asset("requirements.txt", assets::PYTHON_REQUIREMENTS)?;
        }
        (WorkerRuntime::Powershell, _) => {
            writer.write_asset("profile.ps1", assets::POWERSHELL_PROFILE)?;
            if managed_dependencies {
                writer.write_asset("requirements.psd1", assets::POWERSHELL_REQUIREMENTS)?;
            }
        }
        (WorkerRuntime::Node, Language::TypeScript) => {
            writer.write_asset("package.json", assets::TYPESCRIPT_PACKAGE_JSON)?;
            writer.write_asset("tsconfig.json", assets::TSCONFIG)?;
        }
        (WorkerRuntime::Node, _) => {
            writer.write_asset("package.json", assets::JAVASCRIPT_PACKAGE_JSON)?;
        }
        _ => {}
    }

    writer.write_asset(".gitignore", assets::GITIGNORE)?;
    if !runtime.is_dotnet() {
        writer.write_asset(".funcignore", assets::FUNCIGNORE)?;
    }

    let host = HostJson::new(
        runtime,
        HostJsonOptions {
            extension_bundle: options.extension_bundle,
            managed_dependencies,
        },
    );
    writer.write(HOST_JSON_FILE, &host.to_json()?)?;
    writer.write(LOCAL_SETTINGS_FILE, &LocalSettings::new(runtime).to_json()?)?;
    writer.write_asset(".vscode/extensions.json", assets::VSCODE_EXTENSIONS)?;

    if options.source_control {
        init_git(&writer.root).await;
    }

    if options.docker {
        write_docker_files(&mut writer, runtime, language, options.csx, target_framework.as_deref(), config)?;
    }

    Ok(writer.into_report(runtime, language))
}

fn write_docker_files(
    writer: &mut ProjectWriter,
    runtime: WorkerRuntime,
    language: Language,
    csx: bool,
    target_framework: Option<&str>,
    config: &Config,
) -> Result<(), FuncError> {
    let dockerfile = render_project_dockerfile(runtime, language, csx, target_framework, config)?;
    writer.write(DOCKERFILE_NAME, &dockerfile)?;
    writer.write_asset(DOCKERIGNORE_NAME, assets::DOCKERIGNORE)
}

/// Runs `git init` unless `root` is already inside a repository. Failing to
/// run git at all is not fatal.
async fn init_git(root: &Path) {
    let inside_repo = Command::new("git")
        .args(["rev-parse", "--git-dir"])
        .current_dir(root)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;

    match inside_repo {
        Ok(status) if status.success() => debug!("Already inside a git repository"),
        Ok(_) => {
            let result = Command::new("git")
                .arg("init")
                .current_dir(root)
                .stdout(Stdio::null())
                .stderr(Stdio::piped())
                .output()
                .await;
            match result {
                Ok(output) if output.status.success() => info!("Initialized empty git repository"),
                Ok(output) => warn!(
                    stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                    "git init failed"
                ),
                Err(e) => warn!(error = %e, "Unable to run git init"),
            }
        }
        Err(e) => warn!(error = %e, "git not found; skipping source control"),
    }
}
