//! Documents selected for upload

use std::path::Path;

/// Raw file contents plus the name the user picked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl DocumentFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk, keeping only its file name
    pub async fn from_path<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string_lossy().to_string());
        Ok(Self { name, bytes })
    }

    /// Whether the name ends in `.pdf`, ignoring case
    pub fn is_pdf(&self) -> bool {
        self.name.to_ascii_lowercase().ends_with(".pdf")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_extension_is_case_insensitive() {
        assert!(DocumentFile::new("notes.pdf", b"%PDF".to_vec()).is_pdf());
        assert!(DocumentFile::new("REPORT.PDF", Vec::new()).is_pdf());
        assert!(DocumentFile::new("Thesis.Pdf", Vec::new()).is_pdf());
        assert!(!DocumentFile::new("notes.pdf.txt", Vec::new()).is_pdf());
        assert!(!DocumentFile::new("pdf", Vec::new()).is_pdf());
        assert!(!DocumentFile::new("slides.pptx", Vec::new()).is_pdf());
    }

    #[tokio::test]
    async fn test_from_path_keeps_file_name() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("chapter-1.pdf");
        std::fs::write(&path, b"%PDF-1.7").unwrap();

        let document = DocumentFile::from_path(&path).await.unwrap();
        assert_eq!(document.name, "chapter-1.pdf");
        assert_eq!(document.bytes, b"%PDF-1.7");
    }

    #[tokio::test]
    async fn test_from_path_missing_file() {
        let result = DocumentFile::from_path("/nonexistent/file.pdf").await;
        assert!(result.is_err());
    }
}
