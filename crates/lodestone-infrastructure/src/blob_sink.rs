//! Saves downloads into a local directory.

use async_trait::async_trait;
use lodestone_core::Result;
use lodestone_core::files::{BlobSink, DownloadedFile};
use std::path::PathBuf;

const FALLBACK_NAME: &str = "download";

/// [`BlobSink`] that writes each download into one directory.
///
/// Server-suggested names are reduced to their final path component, so a
/// download can never land outside the directory. Existing files are
/// overwritten.
#[derive(Debug, Clone)]
pub struct DirectoryBlobSink {
    dir: PathBuf,
}

impl DirectoryBlobSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Where a file named `filename` would be written.
    pub fn path_for(&self, filename: &str) -> PathBuf {
        self.dir.join(sanitize(filename))
    }
}

fn sanitize(filename: &str) -> String {
    let name = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim()
        .chars()
        .filter(|c| !c.is_control())
        .collect::<String>();

    match name.as_str() {
        "" | "." | ".." => FALLBACK_NAME.to_string(),
        _ => name,
    }
}

#[async_trait]
impl BlobSink for DirectoryBlobSink {
    async fn save(&self, file: &DownloadedFile) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let path = self.path_for(&file.filename);
        tokio::fs::write(&path, &file.bytes).await?;

        tracing::debug!(path = %path.display(), size = file.bytes.len(), "saved download");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn downloaded(filename: &str, bytes: &[u8]) -> DownloadedFile {
        DownloadedFile {
            filename: filename.to_string(),
            content_type: None,
            bytes: bytes.to_vec(),
        }
    }

    #[test]
    fn test_sanitize_strips_directories() {
        assert_eq!(sanitize("../../etc/passwd"), "passwd");
        assert_eq!(sanitize("C:\\temp\\report.pdf"), "report.pdf");
        assert_eq!(sanitize(".."), FALLBACK_NAME);
        assert_eq!(sanitize("dir/"), FALLBACK_NAME);
        assert_eq!(sanitize("  notes.txt "), "notes.txt");
    }

    #[tokio::test]
    async fn test_saves_into_directory() {
        let dir = TempDir::new().unwrap();
        let sink = DirectoryBlobSink::new(dir.path().join("downloads"));

        sink.save(&downloaded("report.pdf", b"%PDF")).await.unwrap();

        let written = std::fs::read(dir.path().join("downloads/report.pdf")).unwrap();
        assert_eq!(written, b"%PDF");
    }

    #[tokio::test]
    async fn test_traversal_stays_inside_directory() {
        let dir = TempDir::new().unwrap();
        let sink = DirectoryBlobSink::new(dir.path());

        sink.save(&downloaded("../escape.txt", b"x")).await.unwrap();

        assert!(dir.path().join("escape.txt").exists());
        assert_eq!(sink.path_for("../escape.txt"), dir.path().join("escape.txt"));
    }

    #[tokio::test]
    async fn test_overwrites_existing_file() {
        let dir = TempDir::new().unwrap();
        let sink = DirectoryBlobSink::new(dir.path());

        sink.save(&downloaded("a.txt", b"first")).await.unwrap();
        sink.save(&downloaded("a.txt", b"second")).await.unwrap();

        assert_eq!(std::fs::read(dir.path().join("a.txt")).unwrap(), b"second");
    }
}
