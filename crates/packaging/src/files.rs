use crate::ignore::IgnoreRules;
use funckit_models::FuncError;
use std::fs;
use std::path::Path;
use tracing::debug;

pub const FUNCIGNORE_FILE: &str = ".funcignore";

const IGNORED_DIRECTORIES: [&str; 2] = [".git", ".vscode"];
const IGNORED_FILES: [&str; 4] = [".funcignore", ".gitignore", "local.settings.json", "project.lock.json"];

/// Reads `<root>/.funcignore`; a missing file yields empty rules.
pub fn load_rules(root: &Path) -> Result<IgnoreRules, FuncError> {
    let path = root.join(FUNCIGNORE_FILE);
    if !path.exists() {
        return Ok(IgnoreRules::default());
    }
    let content = fs::read_to_string(&path).map_err(|e| FuncError::io(&path, e))?;
    Ok(IgnoreRules::parse(&content))
}

/// Files under `root` that belong in a package, as sorted relative paths
/// with `/` separators.
pub fn collect_files(root: &Path, rules: &IgnoreRules) -> Result<Vec<String>, FuncError> {
    let mut files = Vec::new();
    walk(root, "", &mut files)?;

    let before = files.len();
    files.retain(|f| rules.accepts(f));
    files.sort();

    debug!(
        root = %root.display(),
        kept = files.len(),
        ignored = before - files.len(),
        "Collected package files"
    );
    Ok(files)
}

fn walk(dir: &Path, prefix: &str, out: &mut Vec<String>) -> Result<(), FuncError> {
    let entries = fs::read_dir(dir).map_err(|e| FuncError::io(dir, e))?;

    for entry in entries {
        let entry = entry.map_err(|e| FuncError::io(dir, e))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let path = entry.path();
        let relative = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{prefix}/{name}")
        };

        let file_type = entry.file_type().map_err(|e| FuncError::io(&path, e))?;
        if file_type.is_dir() || (file_type.is_symlink() && path.is_dir()) {
            if !is_one_of(&name, &IGNORED_DIRECTORIES) {
                walk(&path, &relative, out)?;
            }
        } else if !is_one_of(&name, &IGNORED_FILES) {
            out.push(relative);
        }
    }
    Ok(())
}

fn is_one_of(name: &str, list: &[&str]) -> bool {
    list.iter().any(|candidate| candidate.eq_ignore_ascii_case(name))
}
