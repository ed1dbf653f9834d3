use funckit_models::FuncError;
use rust_embed::RustEmbed;

#[derive(RustEmbed)]
#[folder = "assets/"]
struct ProjectAssets;

pub const GITIGNORE: &str = "gitignore";
pub const DOCKERIGNORE: &str = "dockerignore";
pub const FUNCIGNORE: &str = "funcignore";
pub const VSCODE_EXTENSIONS: &str = "vscode-extensions.json";
pub const POWERSHELL_PROFILE: &str = "profile.ps1";
pub const POWERSHELL_REQUIREMENTS: &str = "requirements.psd1";
pub const PYTHON_REQUIREMENTS: &str = "requirements.txt";
pub const JAVASCRIPT_PACKAGE_JSON: &str = "package.json";
pub const TYPESCRIPT_PACKAGE_JSON: &str = "package.typescript.json";
pub const TSCONFIG: &str = "tsconfig.json";

/// Returns an embedded asset as UTF-8 text.
pub fn asset(name: &str) -> Result<String, FuncError> {
    let file = ProjectAssets::get(name).ok_or_else(|| FuncError::TemplateError {
        reason: format!("embedded asset not found: {name}"),
    })?;

    String::from_utf8(file.data.into_owned()).map_err(|e| FuncError::TemplateError {
        reason: format!("embedded asset {name} is not UTF-8: {e}"),
    })
}

/// Names of every embedded asset, sorted.
pub fn asset_names() -> Vec<String> {
    let mut names: Vec<String> = ProjectAssets::iter().map(|n| n.into_owned()).collect();
    names.sort();
    names
}
