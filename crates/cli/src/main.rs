mod commands;
mod logging;

use clap::{ArgAction, Parser, Subcommand};
use funckit_models::{Config, FuncError};
use logging::TracingService;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "funckit")]
#[command(about = "Scaffold, package and containerise function apps", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to ./funckit.toml when present)
    #[arg(long, global = true, env = "FUNCKIT_CONFIG")]
    config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new function app in the current or given folder
    Init {
        /// Folder to create the app in
        folder: Option<PathBuf>,
        /// Worker runtime (dotnet, dotnet-isolated, node, python, java, powershell, custom)
        #[arg(long)]
        worker_runtime: Option<String>,
        /// Programming language, when the runtime supports several
        #[arg(long)]
        language: Option<String>,
        /// Also write a Dockerfile
        #[arg(long)]
        docker: bool,
        /// Only write a Dockerfile for an existing app
        #[arg(long)]
        docker_only: bool,
        /// Run git init unless already inside a repository
        #[arg(long)]
        source_control: bool,
        /// Leave the extension bundle out of host.json
        #[arg(long)]
        no_bundle: bool,
        /// Enable PowerShell managed dependencies
        #[arg(long, action = ArgAction::Set)]
        managed_dependencies: Option<bool>,
        /// Target framework for dotnet apps (net8.0, net9.0, net10.0)
        #[arg(long)]
        target_framework: Option<String>,
        /// Use C# script (.csx) functions
        #[arg(long)]
        csx: bool,
        /// Overwrite files that already exist
        #[arg(long)]
        force: bool,
    },
    /// Print or write the container recipe for a runtime
    Dockerfile {
        #[arg(long)]
        worker_runtime: Option<String>,
        #[arg(long)]
        language: Option<String>,
        /// Java major version for the Java recipe
        #[arg(long)]
        java_version: Option<String>,
        #[arg(long)]
        target_framework: Option<String>,
        #[arg(long)]
        csx: bool,
        /// Write to this path instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Zip the function app for deployment
    Pack {
        folder: Option<PathBuf>,
        /// Directory to place the zip in
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Container image commands
    Docker {
        #[command(subcommand)]
        command: DockerCommands,
    },
    /// Manage local.settings.json
    Settings {
        #[command(subcommand)]
        command: SettingsCommands,
    },
    /// Kubernetes commands
    Kubernetes {
        #[command(subcommand)]
        command: KubernetesCommands,
    },
}

#[derive(Subcommand)]
enum DockerCommands {
    /// Build an image from the function app
    Build {
        folder: Option<PathBuf>,
        /// Image tag; derived from the app name and content hash when omitted
        #[arg(long, short)]
        tag: Option<String>,
        /// Target framework for dotnet apps; read from the project file when omitted
        #[arg(long)]
        target_framework: Option<String>,
        /// Build a C# script (.csx) app
        #[arg(long)]
        csx: bool,
    },
}

#[derive(Subcommand)]
enum SettingsCommands {
    /// Add or update a setting
    Add {
        name: String,
        value: String,
        /// Store as a connection string
        #[arg(long)]
        connection_string: bool,
        /// Provider name for a connection string
        #[arg(long)]
        provider: Option<String>,
    },
    /// List settings
    List,
    /// Delete a setting
    Delete {
        name: String,
        #[arg(long)]
        connection_string: bool,
    },
}

#[derive(Subcommand)]
enum KubernetesCommands {
    /// Print the Secret, Deployment and Service for the app
    Manifests {
        #[arg(long)]
        name: String,
        #[arg(long)]
        image: String,
        #[arg(long)]
        namespace: Option<String>,
        #[arg(long)]
        service_type: Option<String>,
        #[arg(long, default_value = "1")]
        replicas: u32,
        #[arg(long)]
        pull_secret: Option<String>,
        #[arg(long)]
        port: Option<u16>,
        /// Write to this path instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            let func_error = err.downcast_ref::<FuncError>();
            if let Some(shape) = func_error.map(FuncError::to_error_shape) {
                tracing::debug!(error_type = %shape.error_type, message = %shape.error_message, "Command failed");
            }
            let code = func_error.map_or(1, FuncError::exit_code);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load(cli.config.as_deref())?;
    TracingService::init(&config.logging, cli.verbose, cli.json_logs)?;
    let cwd = std::env::current_dir()?;

    match cli.command {
        Commands::Init {
            folder,
            worker_runtime,
            language,
            docker,
            docker_only,
            source_control,
            no_bundle,
            managed_dependencies,
            target_framework,
            csx,
            force,
        } => {
            let options = funckit_scaffold::InitOptions {
                folder,
                worker_runtime,
                language,
                docker,
                docker_only,
                source_control,
                extension_bundle: !no_bundle,
                managed_dependencies,
                target_framework,
                csx,
                force,
            };
            commands::init(&cwd, &options, &config).await?;
        }
        Commands::Dockerfile {
            worker_runtime,
            language,
            java_version,
            target_framework,
            csx,
            output,
        } => {
            commands::dockerfile(
                &cwd,
                commands::DockerfileArgs {
                    worker_runtime,
                    language,
                    java_version,
                    target_framework,
                    csx,
                    output,
                },
                &config,
            )?;
        }
        Commands::Pack { folder, output } => {
            commands::pack(&cwd, folder, output, &config).await?;
        }
        Commands::Docker {
            command:
                DockerCommands::Build {
                    folder,
                    tag,
                    target_framework,
                    csx,
                },
        } => {
            commands::docker_build(&cwd, folder, tag, target_framework, csx, &config).await?;
        }
        Commands::Settings { command } => match command {
            SettingsCommands::Add {
                name,
                value,
                connection_string,
                provider,
            } => commands::settings_add(&cwd, &name, &value, connection_string, provider.as_deref())?,
            SettingsCommands::List => commands::settings_list(&cwd)?,
            SettingsCommands::Delete {
                name,
                connection_string,
            } => commands::settings_delete(&cwd, &name, connection_string)?,
        },
        Commands::Kubernetes {
            command:
                KubernetesCommands::Manifests {
                    name,
                    image,
                    namespace,
                    service_type,
                    replicas,
                    pull_secret,
                    port,
                    output,
                },
        } => {
            let mut options = funckit_kubernetes::ManifestOptions::new(name, image);
            options.namespace = namespace;
            options.service_type = service_type;
            options.replicas = replicas;
            options.pull_secret = pull_secret;
            options.port = port;
            commands::kubernetes_manifests(&cwd, options, output.as_deref())?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_init_flags_parse() {
        let cli = Cli::parse_from([
            "funckit",
            "init",
            "MyApp",
            "--worker-runtime",
            "java",
            "--docker",
            "--managed-dependencies",
            "false",
            "-v",
        ]);
        assert!(cli.verbose);
        match cli.command {
            Commands::Init {
                folder,
                worker_runtime,
                docker,
                managed_dependencies,
                ..
            } => {
                assert_eq!(folder, Some(PathBuf::from("MyApp")));
                assert_eq!(worker_runtime.as_deref(), Some("java"));
                assert!(docker);
                assert_eq!(managed_dependencies, Some(false));
            }
            _ => panic!("expected init"),
        }
    }

    #[test]
    fn test_nested_subcommands_parse() {
        let cli = Cli::parse_from(["funckit", "docker", "build", "--tag", "app:1"]);
        assert!(matches!(
            cli.command,
            Commands::Docker {
                command: DockerCommands::Build { tag: Some(_), .. }
            }
        ));

        let cli = Cli::parse_from([
            "funckit",
            "kubernetes",
            "manifests",
            "--name",
            "app",
            "--image",
            "app:1",
        ]);
        match cli.command {
            Commands::Kubernetes {
                command: KubernetesCommands::Manifests { replicas, .. },
            } => assert_eq!(replicas, 1),
            _ => panic!("expected kubernetes manifests"),
        }
    }
}
