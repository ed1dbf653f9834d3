use anyhow::Result;
use std::io::{Cursor, Read};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use zip::ZipArchive;

/// Writes `content` to `root/relative`, creating parent directories.
pub fn write_file(root: &Path, relative: &str, content: &str) -> Result<()> {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    Ok(())
}

/// Entry names of a zip archive in archive order.
pub fn zip_entries(zip_data: &[u8]) -> Result<Vec<String>> {
    let mut archive = ZipArchive::new(Cursor::new(zip_data))?;
    let mut names = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        names.push(archive.by_index(i)?.name().to_string());
    }
    Ok(names)
}

/// Reads one entry of a zip archive as UTF-8.
pub fn zip_entry_text(zip_data: &[u8], name: &str) -> Result<String> {
    let mut archive = ZipArchive::new(Cursor::new(zip_data))?;
    let mut file = archive.by_name(name)?;
    let mut text = String::new();
    file.read_to_string(&mut text)?;
    Ok(text)
}

/// Whether `binary --version` runs successfully on this machine.
pub async fn command_available(binary: &str) -> bool {
    Command::new(binary)
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map(|s| s.success())
        .unwrap_or(false)
}
