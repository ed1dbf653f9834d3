use crate::helpers::write_file;
use anyhow::Result;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const SAMPLE_HOST_JSON: &str = r#"{
  "version": "2.0"
}
"#;

/// A throwaway working directory with an app folder inside it.
pub struct SampleProject {
    pub cwd: TempDir,
    pub app_root: PathBuf,
}

impl SampleProject {
    pub fn new(app_name: &str) -> Result<Self> {
        let cwd = tempfile::tempdir()?;
        let app_root = cwd.path().join(app_name);
        std::fs::create_dir_all(&app_root)?;
        Ok(Self { cwd, app_root })
    }

    pub fn cwd(&self) -> &Path {
        self.cwd.path()
    }

    pub fn write(&self, relative: &str, content: &str) -> Result<()> {
        write_file(&self.app_root, relative, content)
    }
}

/// A Maven function app as it looks after `mvn clean package`, with two
/// staged output folders so lookups have to choose.
pub fn java_project(app_name: &str) -> Result<SampleProject> {
    let project = SampleProject::new(app_name)?;
    project.write("host.json", SAMPLE_HOST_JSON)?;
    project.write("pom.xml", "<project></project>\n")?;
    project.write("src/main/java/com/function/Function.java", "package com.function;\n")?;
    project.write(
        "local.settings.json",
        r#"{"IsEncrypted": false, "Values": {"FUNCTIONS_WORKER_RUNTIME": "java"}}"#,
    )?;

    for staged in ["func-app-a", "func-app-b"] {
        let base = format!("target/azure-functions/{staged}");
        project.write(&format!("{base}/host.json"), SAMPLE_HOST_JSON)?;
        project.write(&format!("{base}/HttpExample/function.json"), "{}\n")?;
        project.write(&format!("{base}/lib/{staged}.jar"), staged)?;
    }
    Ok(project)
}

/// A minimal Python v2 app with a `.funcignore`.
pub fn python_project(app_name: &str) -> Result<SampleProject> {
    let project = SampleProject::new(app_name)?;
    project.write("host.json", SAMPLE_HOST_JSON)?;
    project.write("function_app.py", "import azure.functions as func\n")?;
    project.write("requirements.txt", "azure-functions\n")?;
    project.write(".funcignore", ".venv\n__pycache__\n")?;
    project.write(".venv/bin/python", "")?;
    project.write("__pycache__/function_app.cpython-311.pyc", "")?;
    project.write(
        "local.settings.json",
        r#"{"IsEncrypted": false, "Values": {"FUNCTIONS_WORKER_RUNTIME": "python"}}"#,
    )?;
    Ok(project)
}
