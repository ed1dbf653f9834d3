use crate::FuncError;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

pub const CONFIG_FILE: &str = "funckit.toml";
pub const ENV_PREFIX: &str = "FUNCKIT_";

const VERSION_KEYS: [&str; 4] = ["java_version", "python_version", "node_version", "dotnet_version"];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub defaults: DefaultsConfig,
    pub docker: DockerConfig,
    pub pack: PackConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DefaultsConfig {
    pub host_version: u32,
    #[serde(deserialize_with = "version_string")]
    pub java_version: String,
    #[serde(deserialize_with = "version_string")]
    pub python_version: String,
    #[serde(deserialize_with = "version_string")]
    pub node_version: String,
    #[serde(deserialize_with = "version_string")]
    pub dotnet_version: String,
}

/// Versions may be written bare in TOML (`java_version = 21`).
fn version_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Version {
        Text(String),
        Unsigned(u64),
        Signed(i64),
        Float(f64),
    }

    Ok(match Version::deserialize(deserializer)? {
        Version::Text(s) => s,
        Version::Unsigned(n) => n.to_string(),
        Version::Signed(n) => n.to_string(),
        Version::Float(n) => n.to_string(),
    })
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DockerConfig {
    pub binary: String,
    pub registry: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PackConfig {
    pub max_package_size_mb: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            defaults: DefaultsConfig {
                host_version: 4,
                java_version: "17".to_string(),
                python_version: "3.11".to_string(),
                node_version: "20".to_string(),
                dotnet_version: "8.0".to_string(),
            },
            docker: DockerConfig {
                binary: "docker".to_string(),
                registry: None,
            },
            pack: PackConfig {
                max_package_size_mb: 512,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                json: false,
            },
        }
    }
}

impl Config {
    /// Layered sources: built-in defaults, then the TOML file, then
    /// `FUNCKIT_*` environment variables (`__` separates nested keys).
    pub fn figment(explicit_path: Option<&Path>) -> Result<Figment, FuncError> {
        let figment = Figment::from(Serialized::defaults(Config::default()));

        let figment = match explicit_path {
            Some(path) => {
                if !path.exists() {
                    return Err(FuncError::ConfigError {
                        reason: format!("config file {} does not exist", path.display()),
                    });
                }
                figment.merge(Toml::file(path))
            }
            None => figment.merge(Toml::file(CONFIG_FILE)),
        };

        let mut figment = figment.merge(Env::prefixed(ENV_PREFIX).ignore(&["config"]).split("__"));

        // Env values are parsed leniently (`3.10` becomes the float 3.1), so
        // version overrides are layered again verbatim.
        for key in VERSION_KEYS {
            let var = format!("{ENV_PREFIX}DEFAULTS__{}", key.to_ascii_uppercase());
            if let Ok(raw) = std::env::var(&var) {
                figment = figment.merge(Serialized::default(&format!("defaults.{key}"), raw.trim()));
            }
        }

        Ok(figment)
    }

    pub fn load(explicit_path: Option<&Path>) -> Result<Self, FuncError> {
        Self::figment(explicit_path)?
            .extract()
            .map_err(|e| FuncError::ConfigError { reason: e.to_string() })
    }

    pub fn max_package_size_bytes(&self) -> u64 {
        self.pack.max_package_size_mb.saturating_mul(1024 * 1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_defaults_without_sources() {
        Jail::expect_with(|_jail| {
            let config = Config::load(None).expect("defaults load");
            assert_eq!(config, Config::default());
            assert_eq!(config.defaults.java_version, "17");
            assert_eq!(config.max_package_size_bytes(), 512 * 1024 * 1024);
            Ok(())
        });
    }

    #[test]
    fn test_file_then_env_layering() {
        Jail::expect_with(|jail| {
            jail.create_file(
                CONFIG_FILE,
                r#"
                [defaults]
                java_version = "11"

                [docker]
                registry = "myregistry.azurecr.io"
                "#,
            )?;
            jail.set_env("FUNCKIT_DEFAULTS__JAVA_VERSION", "21");
            jail.set_env("FUNCKIT_CONFIG", "ignored.toml");

            let config = Config::load(None).expect("layered load");
            assert_eq!(config.defaults.java_version, "21");
            assert_eq!(config.docker.registry.as_deref(), Some("myregistry.azurecr.io"));
            assert_eq!(config.defaults.host_version, 4);
            Ok(())
        });
    }

    #[test]
    fn test_numeric_looking_versions_from_env() {
        Jail::expect_with(|jail| {
            jail.set_env("FUNCKIT_DEFAULTS__PYTHON_VERSION", "3.12");
            jail.set_env("FUNCKIT_DEFAULTS__NODE_VERSION", "22");
            jail.set_env("FUNCKIT_DEFAULTS__DOTNET_VERSION", "10.0");

            let config = Config::load(None).expect("env versions load");
            assert_eq!(config.defaults.python_version, "3.12");
            assert_eq!(config.defaults.node_version, "22");
            assert_eq!(config.defaults.dotnet_version, "10.0");

            jail.set_env("FUNCKIT_DEFAULTS__PYTHON_VERSION", "3.10");
            let config = Config::load(None).expect("trailing zero kept");
            assert_eq!(config.defaults.python_version, "3.10");
            Ok(())
        });
    }

    #[test]
    fn test_bare_numeric_versions_in_toml() {
        Jail::expect_with(|jail| {
            jail.create_file(CONFIG_FILE, "[defaults]\njava_version = 21\nnode_version = 18\n")?;
            let config = Config::load(None).expect("numeric versions load");
            assert_eq!(config.defaults.java_version, "21");
            assert_eq!(config.defaults.node_version, "18");
            Ok(())
        });
    }

    #[test]
    fn test_package_size_saturates() {
        let mut config = Config::default();
        config.pack.max_package_size_mb = u64::MAX;
        assert_eq!(config.max_package_size_bytes(), u64::MAX);
    }

    #[test]
    fn test_unknown_keys_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file(CONFIG_FILE, "[docker]\nbinary = \"podman\"\nsocket = \"x\"\n")?;
            let err = Config::load(None).unwrap_err();
            assert!(matches!(err, FuncError::ConfigError { .. }));
            Ok(())
        });
    }

    #[test]
    fn test_missing_explicit_file() {
        let err = Config::load(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }
}
