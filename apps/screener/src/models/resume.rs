use std::path::Path;

use anyhow::{Context, Result};
use bytes::Bytes;

/// A resume file staged for upload: its display name plus raw contents.
#[derive(Debug, Clone, PartialEq)]
pub struct ResumeFile {
    pub name: String,
    pub bytes: Bytes,
}

impl ResumeFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Reads a resume from disk, naming it after the file's final path component.
    pub async fn from_path(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read resume '{}'", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self::new(name, bytes))
    }

    /// MIME type sent with the multipart part.
    pub fn mime_type(&self) -> &'static str {
        let is_pdf = Path::new(&self.name)
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("pdf"))
            .unwrap_or(false);
        if is_pdf {
            "application/pdf"
        } else {
            "application/octet-stream"
        }
    }
}
