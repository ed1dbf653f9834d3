use anyhow::{Context, Result};
use funckit_kubernetes::ManifestOptions;
use funckit_models::{Config, FuncError, Language, SettingsFile, WorkerRuntime};
use funckit_packaging::{ImageBuilder, PackOptions};
use funckit_scaffold::InitOptions;
use funckit_templates::{render_dockerfile, DockerfileKind, DockerfileParams};
use std::path::{Path, PathBuf};
use tracing::info;

pub struct DockerfileArgs {
    pub worker_runtime: Option<String>,
    pub language: Option<String>,
    pub java_version: Option<String>,
    pub target_framework: Option<String>,
    pub csx: bool,
    pub output: Option<PathBuf>,
}

fn app_root(cwd: &Path, folder: Option<PathBuf>) -> PathBuf {
    folder.map_or_else(|| cwd.to_path_buf(), |f| cwd.join(f))
}

/// Runtime from `--worker-runtime`, else from the app's settings.
fn project_runtime(app_root: &Path, requested: Option<&str>, language: Option<&str>) -> Result<(WorkerRuntime, Language)> {
    let moniker = match requested {
        Some(r) => r.to_string(),
        None => SettingsFile::open_in(app_root)?
            .worker_runtime()
            .ok_or(FuncError::MissingWorkerRuntime)?
            .moniker()
            .to_string(),
    };
    Ok(funckit_models::resolve(&moniker, language)?)
}

pub async fn init(cwd: &Path, options: &InitOptions, config: &Config) -> Result<()> {
    let report = funckit_scaffold::init(cwd, options, config).await?;

    for file in &report.written {
        println!("✅ Wrote {file}");
    }
    for file in &report.skipped {
        println!("⏭️  {file} already exists. Skipped!");
    }
    if !options.docker_only {
        println!(
            "🚀 Initialised {} ({}) function app in {}",
            report.runtime,
            report.language,
            report.root.display()
        );
    }
    Ok(())
}

pub fn dockerfile(cwd: &Path, args: DockerfileArgs, config: &Config) -> Result<()> {
    let (runtime, language) = if args.csx {
        (WorkerRuntime::Dotnet, Language::CSharp)
    } else {
        project_runtime(cwd, args.worker_runtime.as_deref(), args.language.as_deref())?
    };

    let target_framework =
        funckit_scaffold::validate_target_framework(runtime, args.target_framework.as_deref())?;
    let mut params = DockerfileParams::from_defaults(&config.defaults);
    if let Some(version) = args.java_version {
        params = params.with_java_version(version);
    }
    if let Some(tf) = target_framework {
        params = params.with_target_framework(&tf);
    }

    let text = render_dockerfile(DockerfileKind::select(runtime, language, args.csx), &params)?;
    match args.output {
        Some(path) => {
            let path = cwd.join(path);
            std::fs::write(&path, &text).map_err(|e| FuncError::io(&path, e))?;
            println!("✅ Wrote {}", path.display());
        }
        None => print!("{text}"),
    }
    Ok(())
}

pub async fn pack(cwd: &Path, folder: Option<PathBuf>, output: Option<PathBuf>, config: &Config) -> Result<()> {
    let app_root = app_root(cwd, folder);
    let (runtime, _) = project_runtime(&app_root, None, None)?;

    let options = PackOptions {
        app_root,
        output,
        runtime,
        max_size: config.max_package_size_bytes(),
    };
    let outcome = funckit_packaging::pack(cwd, &options).await?;

    println!("📦 Created {}", outcome.path.display());
    println!("   Files: {}", outcome.package.files.len());
    println!("   SHA256: {}", outcome.package.sha256);
    Ok(())
}

pub async fn docker_build(
    cwd: &Path,
    folder: Option<PathBuf>,
    tag: Option<String>,
    target_framework: Option<String>,
    csx: bool,
    config: &Config,
) -> Result<()> {
    let app_root = app_root(cwd, folder);
    let dockerfile = project_dockerfile(&app_root, target_framework.as_deref(), csx, config)?;

    let builder = ImageBuilder::new(
        config.docker.binary.clone(),
        config.docker.registry.clone(),
        config.max_package_size_bytes(),
    );
    let tag = builder
        .build_image(&app_root, &dockerfile, tag.as_deref())
        .await
        .with_context(|| format!("building image for {}", app_root.display()))?;

    println!("🐳 Built image {tag}");
    Ok(())
}

/// Recipe used when the app has no Dockerfile of its own. A dotnet app
/// without a project file is a C# script app; the target framework comes
/// from the flag, then the project file, then the runtime default.
fn project_dockerfile(app_root: &Path, target_framework: Option<&str>, csx: bool, config: &Config) -> Result<String> {
    let (runtime, language) = project_runtime(app_root, None, None)?;
    let project_file = find_csproj(app_root)?;
    let csx = csx || (runtime == WorkerRuntime::Dotnet && project_file.is_none());

    let declared = match (target_framework, &project_file, csx) {
        (Some(tf), _, _) => Some(tf.to_string()),
        (None, Some(path), false) => declared_target_framework(path)?,
        _ => None,
    };
    let target_framework = funckit_scaffold::validate_target_framework(runtime, declared.as_deref())?;

    let mut params = DockerfileParams::from_defaults(&config.defaults);
    if let Some(tf) = target_framework {
        params = params.with_target_framework(&tf);
    }
    Ok(render_dockerfile(DockerfileKind::select(runtime, language, csx), &params)?)
}

fn find_csproj(app_root: &Path) -> Result<Option<PathBuf>> {
    let entries = match std::fs::read_dir(app_root) {
        Ok(entries) => entries,
        Err(_) => return Ok(None),
    };
    let mut projects: Vec<PathBuf> = entries
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("csproj")))
        .collect();
    projects.sort();
    Ok(projects.into_iter().next())
}

/// `<TargetFramework>` from a project file, if it declares one.
fn declared_target_framework(project_file: &Path) -> Result<Option<String>> {
    let text = std::fs::read_to_string(project_file).map_err(|e| FuncError::io(project_file, e))?;
    let value = text
        .split_once("<TargetFramework>")
        .and_then(|(_, rest)| rest.split_once("</TargetFramework>"))
        .map(|(tf, _)| tf.trim().to_string())
        .filter(|tf| !tf.is_empty());
    Ok(value)
}

pub fn settings_add(
    cwd: &Path,
    name: &str,
    value: &str,
    connection_string: bool,
    provider: Option<&str>,
) -> Result<()> {
    let mut settings = SettingsFile::open_in(cwd)?;
    if connection_string {
        settings.set_connection_string(name, value, provider);
    } else {
        settings.set_value(name, value);
    }
    settings.commit()?;
    info!(setting = name, path = %settings.path().display(), "Setting saved");
    println!("✅ Saved {name}");
    Ok(())
}

pub fn settings_list(cwd: &Path) -> Result<()> {
    let settings = SettingsFile::open_in(cwd)?;

    println!("App Settings:");
    for (name, value) in settings.values() {
        println!("   • {name} = {value}");
    }

    let connection_strings = settings.connection_strings();
    if !connection_strings.is_empty() {
        println!("Connection Strings:");
        for conn in connection_strings {
            println!("   • {} = {} ({})", conn.name, conn.value, conn.provider_name);
        }
    }
    Ok(())
}

pub fn settings_delete(cwd: &Path, name: &str, connection_string: bool) -> Result<()> {
    let mut settings = SettingsFile::open_in(cwd)?;
    let removed = if connection_string {
        settings.remove_connection_string(name)
    } else {
        settings.remove_value(name)
    };

    if removed {
        settings.commit()?;
        println!("🗑️  Deleted {name}");
    } else {
        println!("ℹ️  {name} is not set");
    }
    Ok(())
}

pub fn kubernetes_manifests(cwd: &Path, mut options: ManifestOptions, output: Option<&Path>) -> Result<()> {
    let settings = SettingsFile::open_in(cwd)?;
    options.worker_runtime = settings.worker_runtime();
    options.settings = settings.values().clone();

    let yaml = funckit_kubernetes::to_yaml(&funckit_kubernetes::generate(&options)?)?;
    match output {
        Some(path) => {
            let path = cwd.join(path);
            std::fs::write(&path, &yaml).map_err(|e| FuncError::io(&path, e))?;
            println!("✅ Wrote {}", path.display());
        }
        None => print!("{yaml}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use funckit_models::DEFAULT_SQL_PROVIDER_NAME;
    use tempfile::tempdir;

    fn set_runtime(cwd: &Path, runtime: &str) {
        settings_add(cwd, "FUNCTIONS_WORKER_RUNTIME", runtime, false, None).unwrap();
    }

    #[test]
    fn test_dockerfile_written_to_output() {
        let dir = tempdir().unwrap();
        let args = DockerfileArgs {
            worker_runtime: Some("java".to_string()),
            language: None,
            java_version: Some("21".to_string()),
            target_framework: None,
            csx: false,
            output: Some(PathBuf::from("Dockerfile")),
        };
        dockerfile(dir.path(), args, &Config::default()).unwrap();

        let text = std::fs::read_to_string(dir.path().join("Dockerfile")).unwrap();
        assert!(text.contains("java:4-java21-build AS installer-env"));
        assert!(text.contains("COPY --from=installer-env"));
    }

    #[test]
    fn test_settings_add_list_delete() {
        let dir = tempdir().unwrap();
        settings_add(dir.path(), "Greeting", "hello", false, None).unwrap();
        settings_add(dir.path(), "Other", "x", false, None).unwrap();
        settings_list(dir.path()).unwrap();

        let settings = SettingsFile::open_in(dir.path()).unwrap();
        assert_eq!(settings.values().get("Greeting").map(String::as_str), Some("hello"));
        assert!(dir.path().join("local.settings.json").is_file());

        settings_delete(dir.path(), "Greeting", false).unwrap();
        settings_delete(dir.path(), "Missing", false).unwrap();
        let settings = SettingsFile::open_in(dir.path()).unwrap();
        assert!(!settings.values().contains_key("Greeting"));
        assert!(settings.values().contains_key("Other"));
    }

    #[test]
    fn test_connection_string_provider_defaults() {
        let dir = tempdir().unwrap();
        settings_add(dir.path(), "Db", "Server=.", true, None).unwrap();
        settings_add(dir.path(), "Pg", "Host=db", true, Some("Npgsql")).unwrap();

        let settings = SettingsFile::open_in(dir.path()).unwrap();
        let conns = settings.connection_strings();
        let db = conns.iter().find(|c| c.name == "Db").unwrap();
        assert_eq!(db.provider_name, DEFAULT_SQL_PROVIDER_NAME);
        let pg = conns.iter().find(|c| c.name == "Pg").unwrap();
        assert_eq!(pg.provider_name, "Npgsql");

        settings_delete(dir.path(), "Db", true).unwrap();
        let settings = SettingsFile::open_in(dir.path()).unwrap();
        assert_eq!(settings.connection_strings().len(), 1);
    }

    #[test]
    fn test_kubernetes_manifests_written_to_output() {
        let dir = tempdir().unwrap();
        set_runtime(dir.path(), "python");
        settings_add(dir.path(), "Greeting", "hello", false, None).unwrap();

        let options = ManifestOptions::new("hello-py", "registry.example.com/hello-py:1");
        kubernetes_manifests(dir.path(), options, Some(Path::new("k8s.yaml"))).unwrap();

        let yaml = std::fs::read_to_string(dir.path().join("k8s.yaml")).unwrap();
        assert_eq!(yaml.matches("---\n").count(), 2);
        assert!(yaml.contains("kind: Secret"));
        assert!(yaml.contains("kind: Deployment"));
        assert!(yaml.contains("kind: Service"));
        assert!(yaml.contains("Greeting"));
    }

    #[test]
    fn test_isolated_app_builds_on_its_target_framework() {
        let dir = tempdir().unwrap();
        set_runtime(dir.path(), "dotnet-isolated");
        let config = Config::default();

        let text = project_dockerfile(dir.path(), None, false, &config).unwrap();
        assert!(text.contains("dotnet/sdk:10.0"));
        assert!(text.contains("dotnet-isolated10.0"));

        std::fs::write(
            dir.path().join("App.csproj"),
            "<Project><PropertyGroup><TargetFramework>net9.0</TargetFramework></PropertyGroup></Project>",
        )
        .unwrap();
        let text = project_dockerfile(dir.path(), None, false, &config).unwrap();
        assert!(text.contains("dotnet/sdk:9.0"));

        let text = project_dockerfile(dir.path(), Some("net8.0"), false, &config).unwrap();
        assert!(text.contains("dotnet/sdk:8.0"));
    }

    #[test]
    fn test_in_process_app_without_project_file_is_csx() {
        let dir = tempdir().unwrap();
        set_runtime(dir.path(), "dotnet");
        let config = Config::default();

        let text = project_dockerfile(dir.path(), None, false, &config).unwrap();
        assert!(text.contains("COPY . /home/site/wwwroot"));
        assert!(!text.contains("dotnet publish"));

        std::fs::write(
            dir.path().join("App.csproj"),
            "<Project><PropertyGroup><TargetFramework>net6.0</TargetFramework></PropertyGroup></Project>",
        )
        .unwrap();
        let err = project_dockerfile(dir.path(), None, false, &config).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<FuncError>(),
            Some(FuncError::InvalidTargetFramework { .. })
        ));
    }
}
