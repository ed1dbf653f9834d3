use funckit_models::FuncError;
use sha2::{Digest, Sha256};
use std::io::{Cursor, Read, Write};
use std::path::Path;
use tracing::{info, instrument};
use zip::write::FileOptions;
use zip::{CompressionMethod, DateTime, ZipArchive, ZipWriter};

pub struct ZipHandler {
    max_size: u64,
}

impl ZipHandler {
    pub fn new(max_size: u64) -> Self {
        Self { max_size }
    }

    /// Zips `files` (relative to `root`) in the given order. Timestamps are
    /// pinned so the same tree always yields the same bytes.
    #[instrument(skip(self, files), fields(root = %root.display(), count = files.len()))]
    pub async fn create_package(&self, root: &Path, files: &[String]) -> Result<PackageInfo, FuncError> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let base = FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(DateTime::default());

        for name in files {
            let path = root.join(name);
            let content = std::fs::read(&path).map_err(|e| FuncError::io(&path, e))?;
            let options = match unix_mode(&path) {
                Some(mode) => base.unix_permissions(mode),
                None => base,
            };

            zip.start_file(name.as_str(), options)
                .map_err(|e| FuncError::InvalidPackage { reason: e.to_string() })?;
            zip.write_all(&content).map_err(|e| FuncError::io(&path, e))?;
        }

        let zip_data = zip
            .finish()
            .map_err(|e| FuncError::InvalidPackage { reason: e.to_string() })?
            .into_inner();

        self.process_zip(&zip_data).await
    }

    #[instrument(skip(self, zip_data))]
    pub async fn process_zip(&self, zip_data: &[u8]) -> Result<PackageInfo, FuncError> {
        if zip_data.len() as u64 > self.max_size {
            return Err(FuncError::PackageTooLarge {
                size: zip_data.len() as u64,
                max_size: self.max_size,
            });
        }

        let sha256 = format!("{:x}", Sha256::digest(zip_data));

        let mut archive = ZipArchive::new(Cursor::new(zip_data))
            .map_err(|e| FuncError::InvalidPackage { reason: e.to_string() })?;

        let mut files = Vec::with_capacity(archive.len());
        let mut total_size = 0;

        for i in 0..archive.len() {
            let file = archive
                .by_index(i)
                .map_err(|e| FuncError::InvalidPackage { reason: e.to_string() })?;

            total_size += file.size();
            files.push(PackageFileInfo {
                name: file.name().to_string(),
                size: file.size(),
                is_executable: file.unix_mode().is_some_and(|mode| mode & 0o111 != 0),
            });
        }

        info!(
            files = files.len(),
            total_size,
            sha256 = %sha256,
            "Processed package"
        );

        Ok(PackageInfo {
            sha256,
            files,
            total_size,
            zip_data: zip_data.to_vec(),
        })
    }

    #[instrument(skip(self, zip_data), fields(target = %target_dir.display()))]
    pub async fn extract_to_directory(&self, zip_data: &[u8], target_dir: &Path) -> Result<(), FuncError> {
        let mut archive = ZipArchive::new(Cursor::new(zip_data))
            .map_err(|e| FuncError::InvalidPackage { reason: e.to_string() })?;

        for i in 0..archive.len() {
            let mut file = archive
                .by_index(i)
                .map_err(|e| FuncError::InvalidPackage { reason: e.to_string() })?;

            let relative = file.enclosed_name().map(Path::to_path_buf).ok_or_else(|| {
                FuncError::InvalidPackage {
                    reason: format!("entry '{}' escapes the target directory", file.name()),
                }
            })?;
            let file_path = target_dir.join(relative);

            if file.is_dir() {
                std::fs::create_dir_all(&file_path).map_err(|e| FuncError::io(&file_path, e))?;
                continue;
            }

            if let Some(parent) = file_path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| FuncError::io(parent, e))?;
            }

            let mut content = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut content)
                .map_err(|e| FuncError::InvalidPackage { reason: e.to_string() })?;
            std::fs::write(&file_path, content).map_err(|e| FuncError::io(&file_path, e))?;

            #[cfg(unix)]
            if let Some(mode) = file.unix_mode() {
                use std::os::unix::fs::PermissionsExt;
                std::fs::set_permissions(&file_path, std::fs::Permissions::from_mode(mode))
                    .map_err(|e| FuncError::io(&file_path, e))?;
            }
        }

        info!("Extracted package");
        Ok(())
    }
}

#[cfg(unix)]
fn unix_mode(path: &Path) -> Option<u32> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path).ok().map(|m| m.permissions().mode() & 0o777)
}

#[cfg(not(unix))]
fn unix_mode(_path: &Path) -> Option<u32> {
    None
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PackageInfo {
    pub sha256: String,
    pub files: Vec<PackageFileInfo>,
    pub total_size: u64,
    #[serde(skip)]
    pub zip_data: Vec<u8>,
}

impl PackageInfo {
    pub fn file_names(&self) -> Vec<&str> {
        self.files.iter().map(|f| f.name.as_str()).collect()
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PackageFileInfo {
    pub name: String,
    pub size: u64,
    pub is_executable: bool,
}
