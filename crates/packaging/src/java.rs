use funckit_models::FuncError;
use std::path::{Path, PathBuf};

/// Where `mvn clean package` leaves the staged function app.
pub const BUILD_OUTPUT_DIR: &str = "target/azure-functions";

/// The first directory under `target/azure-functions/` in lexical order.
/// Hidden directories are skipped, as the `*/` glob skips them.
///
/// Matches the `ls -d */ | head -n 1` lookup in the container recipe, so a
/// local pack and an image build ship the same directory.
pub fn first_output_dir(app_root: &Path) -> Result<PathBuf, FuncError> {
    let output = app_root.join(BUILD_OUTPUT_DIR);
    let not_found = || FuncError::BuildOutputNotFound {
        path: output.display().to_string(),
    };

    let entries = std::fs::read_dir(&output).map_err(|_| not_found())?;
    let mut dirs: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .filter(|p| !p.file_name().is_some_and(|n| n.to_string_lossy().starts_with('.')))
        .collect();
    dirs.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    dirs.into_iter().next().ok_or_else(not_found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_picks_first_directory_lexically() {
        let dir = tempdir().unwrap();
        let output = dir.path().join(BUILD_OUTPUT_DIR);
        for name in ["zeta-app", "alpha-app", "mid-app"] {
            std::fs::create_dir_all(output.join(name)).unwrap();
        }
        std::fs::write(output.join("aaa-not-a-dir.txt"), "x").unwrap();

        let chosen = first_output_dir(dir.path()).unwrap();
        assert_eq!(chosen.file_name().unwrap(), "alpha-app");
    }

    #[test]
    fn test_hidden_directories_are_skipped() {
        let dir = tempdir().unwrap();
        let output = dir.path().join(BUILD_OUTPUT_DIR);
        for name in [".cache", "my-app"] {
            std::fs::create_dir_all(output.join(name)).unwrap();
        }

        let chosen = first_output_dir(dir.path()).unwrap();
        assert_eq!(chosen.file_name().unwrap(), "my-app");

        std::fs::remove_dir_all(output.join("my-app")).unwrap();
        let err = first_output_dir(dir.path()).unwrap_err();
        assert!(matches!(err, FuncError::BuildOutputNotFound { .. }));
    }

    #[test]
    fn test_missing_or_empty_output() {
        let dir = tempdir().unwrap();
        let err = first_output_dir(dir.path()).unwrap_err();
        assert!(matches!(err, FuncError::BuildOutputNotFound { .. }));

        std::fs::create_dir_all(dir.path().join(BUILD_OUTPUT_DIR)).unwrap();
        let err = first_output_dir(dir.path()).unwrap_err();
        assert!(matches!(err, FuncError::BuildOutputNotFound { .. }));
    }
}
