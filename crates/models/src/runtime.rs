use crate::FuncError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The language worker a function app targets (`FUNCTIONS_WORKER_RUNTIME`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkerRuntime {
    Dotnet,
    DotnetIsolated,
    Node,
    Python,
    Java,
    Powershell,
    Custom,
}

impl WorkerRuntime {
    pub const ALL: [WorkerRuntime; 7] = [
        WorkerRuntime::Dotnet,
        WorkerRuntime::DotnetIsolated,
        WorkerRuntime::Node,
        WorkerRuntime::Python,
        WorkerRuntime::Java,
        WorkerRuntime::Powershell,
        WorkerRuntime::Custom,
    ];

    pub fn moniker(&self) -> &'static str {
        match self {
            WorkerRuntime::Dotnet => "dotnet",
            WorkerRuntime::DotnetIsolated => "dotnet-isolated",
            WorkerRuntime::Node => "node",
            WorkerRuntime::Python => "python",
            WorkerRuntime::Java => "java",
            WorkerRuntime::Powershell => "powershell",
            WorkerRuntime::Custom => "custom",
        }
    }

    fn variant_name(&self) -> &'static str {
        match self {
            WorkerRuntime::Dotnet => "Dotnet",
            WorkerRuntime::DotnetIsolated => "DotnetIsolated",
            WorkerRuntime::Node => "Node",
            WorkerRuntime::Python => "Python",
            WorkerRuntime::Java => "Java",
            WorkerRuntime::Powershell => "Powershell",
            WorkerRuntime::Custom => "Custom",
        }
    }

    fn aliases(&self) -> &'static [&'static str] {
        match self {
            WorkerRuntime::DotnetIsolated => &[
                "c#-isolated",
                "csharp-isolated",
                "f#-isolated",
                "fsharp-isolated",
            ],
            WorkerRuntime::Dotnet => &["c#", "csharp", "f#", "fsharp"],
            WorkerRuntime::Node => &["js", "javascript", "typescript", "ts"],
            WorkerRuntime::Python => &["py"],
            WorkerRuntime::Powershell => &["pwsh"],
            WorkerRuntime::Java | WorkerRuntime::Custom => &[],
        }
    }

    pub fn is_dotnet(&self) -> bool {
        matches!(self, WorkerRuntime::Dotnet | WorkerRuntime::DotnetIsolated)
    }

    pub fn options_string() -> String {
        WorkerRuntime::ALL
            .iter()
            .map(|r| r.moniker())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for WorkerRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.moniker())
    }
}

impl std::str::FromStr for WorkerRuntime {
    type Err = FuncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim();
        if value.is_empty() {
            return Err(FuncError::InvalidArgument {
                reason: "Worker runtime cannot be null or empty.".to_string(),
            });
        }

        WorkerRuntime::ALL
            .iter()
            .copied()
            .find(|rt| {
                rt.moniker().eq_ignore_ascii_case(value)
                    || rt.variant_name().eq_ignore_ascii_case(value)
                    || rt.aliases().iter().any(|a| a.eq_ignore_ascii_case(value))
            })
            .ok_or_else(|| FuncError::InvalidWorkerRuntime {
                value: value.to_string(),
                options: WorkerRuntime::options_string(),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "javascript")]
    JavaScript,
    #[serde(rename = "typescript")]
    TypeScript,
    #[serde(rename = "python")]
    Python,
    #[serde(rename = "c#")]
    CSharp,
    #[serde(rename = "c#-isolated")]
    CSharpIsolated,
    #[serde(rename = "f#")]
    FSharp,
    #[serde(rename = "f#-isolated")]
    FSharpIsolated,
    #[serde(rename = "powershell")]
    Powershell,
    #[serde(rename = "java")]
    Java,
    #[serde(rename = "custom")]
    Custom,
}

impl Language {
    pub const ALL: [Language; 10] = [
        Language::JavaScript,
        Language::TypeScript,
        Language::Python,
        Language::CSharp,
        Language::CSharpIsolated,
        Language::FSharp,
        Language::FSharpIsolated,
        Language::Powershell,
        Language::Java,
        Language::Custom,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Python => "python",
            Language::CSharp => "c#",
            Language::CSharpIsolated => "c#-isolated",
            Language::FSharp => "f#",
            Language::FSharpIsolated => "f#-isolated",
            Language::Powershell => "powershell",
            Language::Java => "java",
            Language::Custom => "custom",
        }
    }

    fn aliases(&self) -> &'static [&'static str] {
        match self {
            Language::JavaScript => &["js", "node"],
            Language::TypeScript => &["ts"],
            Language::Python => &["py"],
            Language::Powershell => &["pwsh"],
            Language::CSharp => &["csharp", "dotnet"],
            Language::CSharpIsolated => &["dotnet-isolated", "dotnetisolated", "csharp-isolated"],
            Language::FSharp => &["fsharp"],
            Language::FSharpIsolated => &["fsharp-isolated"],
            Language::Java | Language::Custom => &[],
        }
    }

    /// Case-insensitive lookup over canonical names and aliases.
    pub fn normalize(value: &str) -> Result<Language, FuncError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(FuncError::InvalidArgument {
                reason: "language can't be empty".to_string(),
            });
        }

        Language::ALL
            .iter()
            .copied()
            .find(|l| {
                l.name().eq_ignore_ascii_case(value)
                    || l.aliases().iter().any(|a| a.eq_ignore_ascii_case(value))
            })
            .ok_or_else(|| FuncError::InvalidLanguage {
                value: value.to_string(),
                options: Language::ALL
                    .iter()
                    .map(|l| l.name())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }

    pub fn default_for(runtime: WorkerRuntime) -> Language {
        match runtime {
            WorkerRuntime::Dotnet => Language::CSharp,
            WorkerRuntime::DotnetIsolated => Language::CSharpIsolated,
            WorkerRuntime::Node => Language::JavaScript,
            WorkerRuntime::Python => Language::Python,
            WorkerRuntime::Java => Language::Java,
            WorkerRuntime::Powershell => Language::Powershell,
            WorkerRuntime::Custom => Language::Custom,
        }
    }

    pub fn supported_by(runtime: WorkerRuntime) -> &'static [Language] {
        match runtime {
            WorkerRuntime::Node => &[Language::JavaScript, Language::TypeScript],
            WorkerRuntime::Dotnet => &[Language::CSharp, Language::FSharp],
            WorkerRuntime::DotnetIsolated => &[Language::CSharpIsolated, Language::FSharpIsolated],
            WorkerRuntime::Python => &[Language::Python],
            WorkerRuntime::Java => &[Language::Java],
            WorkerRuntime::Powershell => &[Language::Powershell],
            WorkerRuntime::Custom => &[Language::Custom],
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Resolves the worker runtime and language from command-line strings.
///
/// Without an explicit language the runtime string itself is tried as a
/// language (so `typescript` resolves to node + typescript), falling back
/// to the runtime's default language.
pub fn resolve(runtime: &str, language: Option<&str>) -> Result<(WorkerRuntime, Language), FuncError> {
    let worker: WorkerRuntime = runtime.parse()?;

    let language = match language {
        Some(l) => Language::normalize(l)?,
        None => Language::normalize(runtime)
            .ok()
            .filter(|l| Language::supported_by(worker).contains(l))
            .unwrap_or_else(|| Language::default_for(worker)),
    };

    if !Language::supported_by(worker).contains(&language) {
        return Err(FuncError::UnsupportedLanguage {
            language: language.to_string(),
            runtime: worker.to_string(),
        });
    }

    Ok((worker, language))
}
