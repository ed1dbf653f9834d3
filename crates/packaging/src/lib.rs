pub mod files;
pub mod ignore;
pub mod image_builder;
pub mod java;
pub mod pack;
pub mod zip_handler;

pub use files::*;
pub use ignore::*;
pub use image_builder::*;
pub use java::*;
pub use pack::*;
pub use zip_handler::*;

#[cfg(test)]
mod tests {
    use super::*;
    use funckit_models::{FuncError, WorkerRuntime};
    use std::io::Write;
    use std::path::Path;
    use tempfile::tempdir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut zip = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
        for (name, content) in entries {
            zip.start_file(*name, zip::write::FileOptions::default()).unwrap();
            zip.write_all(content).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    #[tokio::test]
    async fn test_package_is_deterministic() {
        let dir = tempdir().unwrap();
        write(dir.path(), "host.json", "{}");
        write(dir.path(), "src/app.py", "print('hi')");
        let files = collect_files(dir.path(), &IgnoreRules::default()).unwrap();

        let handler = ZipHandler::new(1024 * 1024);
        let first = handler.create_package(dir.path(), &files).await.unwrap();
        let second = handler.create_package(dir.path(), &files).await.unwrap();

        assert_eq!(first.zip_data, second.zip_data);
        assert_eq!(first.sha256, second.sha256);
        assert_eq!(first.file_names(), vec!["host.json", "src/app.py"]);
        assert_eq!(first.total_size, 2 + 11);
    }

    #[tokio::test]
    async fn test_process_zip_size_limit() {
        let data = zip_bytes(&[("a.txt", b"0123456789")]);
        let handler = ZipHandler::new(data.len() as u64 - 1);
        let err = handler.process_zip(&data).await.unwrap_err();
        assert!(matches!(err, FuncError::PackageTooLarge { .. }));

        let handler = ZipHandler::new(data.len() as u64);
        let info = handler.process_zip(&data).await.unwrap();
        assert_eq!(info.sha256.len(), 64);
    }

    #[tokio::test]
    async fn test_process_zip_rejects_garbage() {
        let handler = ZipHandler::new(1024);
        let err = handler.process_zip(b"definitely not a zip").await.unwrap_err();
        assert!(matches!(err, FuncError::InvalidPackage { .. }));
    }

    #[tokio::test]
    async fn test_extract_round_trip() {
        let data = zip_bytes(&[("test.txt", b"test content"), ("nested/dir/file.txt", b"deep")]);
        let target = tempdir().unwrap();
        ZipHandler::new(1024 * 1024)
            .extract_to_directory(&data, target.path())
            .await
            .unwrap();

        assert_eq!(
            std::fs::read_to_string(target.path().join("test.txt")).unwrap(),
            "test content"
        );
        assert_eq!(
            std::fs::read_to_string(target.path().join("nested/dir/file.txt")).unwrap(),
            "deep"
        );
    }

    #[tokio::test]
    async fn test_extract_rejects_escaping_entries() {
        let data = zip_bytes(&[("../evil.txt", b"x")]);
        let target = tempdir().unwrap();
        let err = ZipHandler::new(1024 * 1024)
            .extract_to_directory(&data, target.path())
            .await
            .unwrap_err();
        assert!(matches!(err, FuncError::InvalidPackage { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_executable_bit_survives() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        write(dir.path(), "handler", "#!/bin/sh\n");
        std::fs::set_permissions(dir.path().join("handler"), std::fs::Permissions::from_mode(0o755)).unwrap();

        let info = ZipHandler::new(1024 * 1024)
            .create_package(dir.path(), &["handler".to_string()])
            .await
            .unwrap();
        assert!(info.files[0].is_executable);
    }

    #[test]
    fn test_image_tag() {
        let sha = "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";
        assert_eq!(image_tag(None, "myapp", sha), "myapp:0123456789ab");
        assert_eq!(
            image_tag(Some("registry.example.com/"), "myapp", sha),
            "registry.example.com/myapp:0123456789ab"
        );
        assert_eq!(image_tag(Some(""), "myapp", sha), "myapp:0123456789ab");
    }

    #[test]
    fn test_resolve_output_path() {
        let cwd = tempdir().unwrap();
        let app = cwd.path().join("MyFunctionApp");
        std::fs::create_dir_all(&app).unwrap();

        let plain = resolve_output_path(cwd.path(), &app, None).unwrap();
        assert_eq!(plain, cwd.path().join("MyFunctionApp.zip"));

        let nested = resolve_output_path(cwd.path(), &app, Some(Path::new("dist"))).unwrap();
        assert_eq!(nested, cwd.path().join("dist").join("MyFunctionApp.zip"));
        assert!(cwd.path().join("dist").is_dir());
    }

    #[tokio::test]
    async fn test_pack_requires_host_json() {
        let cwd = tempdir().unwrap();
        let options = PackOptions {
            app_root: cwd.path().to_path_buf(),
            output: None,
            runtime: WorkerRuntime::Python,
            max_size: 1024 * 1024,
        };
        let err = pack(cwd.path(), &options).await.unwrap_err();
        assert!(matches!(err, FuncError::ProjectNotFound { .. }));
    }

    #[tokio::test]
    async fn test_pack_java_uses_first_output_dir() {
        let cwd = tempdir().unwrap();
        let app = cwd.path().join("javaapp");
        write(&app, "host.json", "{}");
        write(&app, "pom.xml", "<project/>");
        write(&app, "target/azure-functions/b-app/host.json", "{}");
        write(&app, "target/azure-functions/a-app/host.json", "{}");
        write(&app, "target/azure-functions/a-app/lib/fn.jar", "jar");

        let options = PackOptions {
            app_root: app.clone(),
            output: None,
            runtime: WorkerRuntime::Java,
            max_size: 1024 * 1024,
        };
        let outcome = pack(cwd.path(), &options).await.unwrap();
        assert_eq!(outcome.path, cwd.path().join("javaapp.zip"));
        assert_eq!(outcome.package.file_names(), vec!["host.json", "lib/fn.jar"]);
        assert!(outcome.path.exists());
    }

    #[tokio::test]
    async fn test_pack_applies_funcignore_and_replaces_old_zip() {
        let cwd = tempdir().unwrap();
        let app = cwd.path().join("pyapp");
        write(&app, "host.json", "{}");
        write(&app, "function_app.py", "");
        write(&app, ".venv/lib/site.py", "");
        write(&app, "local.settings.json", "{}");
        write(&app, ".funcignore", ".venv\n");
        write(cwd.path(), "pyapp.zip", "stale");

        let options = PackOptions {
            app_root: app,
            output: None,
            runtime: WorkerRuntime::Python,
            max_size: 1024 * 1024,
        };
        let outcome = pack(cwd.path(), &options).await.unwrap();
        assert_eq!(outcome.package.file_names(), vec!["function_app.py", "host.json"]);
        assert_eq!(std::fs::read(&outcome.path).unwrap(), outcome.package.zip_data);
    }
}
