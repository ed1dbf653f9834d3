pub mod config;
pub mod error;
pub mod host;
pub mod runtime;
pub mod settings;

pub use config::*;
pub use error::*;
pub use host::*;
pub use runtime::*;
pub use settings::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_runtime_aliases() {
        assert_eq!("java".parse::<WorkerRuntime>().unwrap(), WorkerRuntime::Java);
        assert_eq!("JAVA".parse::<WorkerRuntime>().unwrap(), WorkerRuntime::Java);
        assert_eq!("ts".parse::<WorkerRuntime>().unwrap(), WorkerRuntime::Node);
        assert_eq!("pwsh".parse::<WorkerRuntime>().unwrap(), WorkerRuntime::Powershell);
        assert_eq!("csharp".parse::<WorkerRuntime>().unwrap(), WorkerRuntime::Dotnet);
        assert_eq!(
            "fsharp-isolated".parse::<WorkerRuntime>().unwrap(),
            WorkerRuntime::DotnetIsolated
        );
        assert_eq!(
            "DotnetIsolated".parse::<WorkerRuntime>().unwrap(),
            WorkerRuntime::DotnetIsolated
        );
    }

    #[test]
    fn test_worker_runtime_rejects_unknown() {
        let err = "cobol".parse::<WorkerRuntime>().unwrap_err();
        assert!(matches!(err, FuncError::InvalidWorkerRuntime { .. }));
        assert!(err.to_string().contains("dotnet-isolated"));
        assert!("  ".parse::<WorkerRuntime>().is_err());
    }

    #[test]
    fn test_worker_runtime_serde_uses_moniker() {
        let json = serde_json::to_string(&WorkerRuntime::DotnetIsolated).unwrap();
        assert_eq!(json, "\"dotnet-isolated\"");
        let back: WorkerRuntime = serde_json::from_str("\"java\"").unwrap();
        assert_eq!(back, WorkerRuntime::Java);
    }

    #[test]
    fn test_language_normalize() {
        assert_eq!(Language::normalize("js").unwrap(), Language::JavaScript);
        assert_eq!(Language::normalize("node").unwrap(), Language::JavaScript);
        assert_eq!(Language::normalize("TypeScript").unwrap(), Language::TypeScript);
        assert_eq!(Language::normalize("dotnet").unwrap(), Language::CSharp);
        assert!(Language::normalize("cobol").is_err());
    }

    #[test]
    fn test_resolve_infers_language_from_runtime_string() {
        assert_eq!(
            resolve("typescript", None).unwrap(),
            (WorkerRuntime::Node, Language::TypeScript)
        );
        assert_eq!(resolve("node", None).unwrap(), (WorkerRuntime::Node, Language::JavaScript));
        assert_eq!(resolve("java", None).unwrap(), (WorkerRuntime::Java, Language::Java));
        assert_eq!(
            resolve("DotnetIsolated", None).unwrap(),
            (WorkerRuntime::DotnetIsolated, Language::CSharpIsolated)
        );
    }

    #[test]
    fn test_resolve_rejects_mismatched_language() {
        let err = resolve("java", Some("python")).unwrap_err();
        assert!(matches!(err, FuncError::UnsupportedLanguage { .. }));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_error_shape() {
        let err = FuncError::PackageTooLarge { size: 10, max_size: 5 };
        let shape = err.to_error_shape();
        assert_eq!(shape.error_type, "PackageTooLarge");
        assert_eq!(shape.error_message, "Package too large: 10 bytes (max: 5)");
        assert_eq!(err.exit_code(), 1);
    }
}
