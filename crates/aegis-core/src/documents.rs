//! The document folder and uploaded files
//!
//! Analysis runs against documents kept in one folder, next to the company's
//! policy guidelines. The guidelines are context, never a subject of
//! analysis, so they are left out of listings. Chat sessions can instead take
//! an uploaded file, whose stem becomes the session's display name. Uploads
//! may be plain text or PDF; a PDF contributes the text of all its pages.

use std::path::{Path, PathBuf};
use tokio::fs;

use crate::config::RetrievalConfig;
use crate::errors::AegisError;

const TEXT_EXTENSIONS: &[&str] = &["txt", "md"];
const PDF_EXTENSION: &str = "pdf";

fn lowercase_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

/// True for files whose extension marks them as plain text.
pub fn is_text_document(path: &Path) -> bool {
    lowercase_extension(path)
        .map(|ext| TEXT_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

pub fn is_pdf_document(path: &Path) -> bool {
    lowercase_extension(path).as_deref() == Some(PDF_EXTENSION)
}

pub struct DocumentLibrary {
    dir: PathBuf,
    guidelines_file: String,
}

impl DocumentLibrary {
    pub fn new(dir: impl Into<PathBuf>, guidelines_file: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            guidelines_file: guidelines_file.into(),
        }
    }

    pub fn from_config(config: &RetrievalConfig) -> Self {
        Self::new(config.documents_dir.clone(), config.guidelines_file.clone())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Names of the documents available for analysis, sorted
    pub async fn list(&self) -> Result<Vec<String>, AegisError> {
        let mut entries = fs::read_dir(&self.dir).await.map_err(|e| {
            AegisError::DocumentError(format!(
                "Failed to list documents in {}: {}",
                self.dir.display(),
                e
            ))
        })?;

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if name == self.guidelines_file {
                continue;
            }
            names.push(name);
        }
        names.sort();
        Ok(names)
    }

    /// Contents of one listed document
    pub async fn read(&self, name: &str) -> Result<String, AegisError> {
        if name.is_empty()
            || name.contains('/')
            || name.contains('\\')
            || name == "."
            || name == ".."
        {
            return Err(AegisError::DocumentError(format!(
                "Invalid document name '{}'",
                name
            )));
        }

        let path = self.dir.join(name);
        fs::read_to_string(&path).await.map_err(|e| {
            AegisError::DocumentError(format!("Failed to read {}: {}", path.display(), e))
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedDocument {
    /// File name as given, extension included
    pub file_name: String,
    /// File stem, used as the session's display name
    pub display_name: String,
    pub text: String,
}

/// Reads an uploaded file as text.
///
/// `.txt` and `.md` files must be UTF-8. For `.pdf` files the text of every
/// page is extracted and concatenated in page order.
pub async fn load_upload(path: &Path) -> Result<UploadedDocument, AegisError> {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .ok_or_else(|| {
            AegisError::DocumentError(format!("Not a file path: {}", path.display()))
        })?;

    let is_pdf = is_pdf_document(path);
    if !is_pdf && !is_text_document(path) {
        return Err(AegisError::DocumentError(format!(
            "Unsupported file type for '{}': only .txt, .md and .pdf files can be uploaded",
            file_name
        )));
    }

    let bytes = fs::read(path).await.map_err(|e| {
        AegisError::DocumentError(format!("Failed to read {}: {}", path.display(), e))
    })?;
    let text = if is_pdf {
        extract_pdf_text(&file_name, bytes).await?
    } else {
        String::from_utf8(bytes).map_err(|_| {
            AegisError::DocumentError(format!("'{}' is not valid UTF-8 text", file_name))
        })?
    };

    let display_name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_else(|| file_name.clone());

    log::info!("Loaded upload '{}' ({} bytes)", file_name, text.len());
    Ok(UploadedDocument {
        file_name,
        display_name,
        text,
    })
}

async fn extract_pdf_text(file_name: &str, bytes: Vec<u8>) -> Result<String, AegisError> {
    // The parser is synchronous and may panic on damaged files; a panic in
    // the blocking task comes back as a join error.
    let extracted = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
        .await
        .map_err(|e| {
            AegisError::DocumentError(format!(
                "Failed to extract text from '{}': {}",
                file_name, e
            ))
        })?;

    extracted.map_err(|e| {
        log::warn!("PDF extraction failed for '{}': {}", file_name, e);
        AegisError::DocumentError(format!(
            "Failed to extract text from '{}': {}",
            file_name, e
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::single_page_pdf;
    use std::fs as std_fs;

    fn library_with_files() -> (tempfile::TempDir, DocumentLibrary) {
        let dir = tempfile::tempdir().unwrap();
        std_fs::write(dir.path().join("policy_guidelines.txt"), "Rules").unwrap();
        std_fs::write(dir.path().join("vendor_nda.txt"), "NDA text").unwrap();
        std_fs::write(dir.path().join("acme_msa.txt"), "MSA text").unwrap();
        std_fs::create_dir(dir.path().join("archive")).unwrap();
        let library = DocumentLibrary::new(dir.path(), "policy_guidelines.txt");
        (dir, library)
    }

    #[tokio::test]
    async fn test_list_excludes_guidelines_and_directories() {
        let (_dir, library) = library_with_files();
        let names = library.list().await.unwrap();
        assert_eq!(names, vec!["acme_msa.txt", "vendor_nda.txt"]);
    }

    #[tokio::test]
    async fn test_read_document() {
        let (_dir, library) = library_with_files();
        assert_eq!(library.read("vendor_nda.txt").await.unwrap(), "NDA text");
    }

    #[tokio::test]
    async fn test_read_rejects_path_traversal() {
        let (_dir, library) = library_with_files();
        for name in ["../secrets.txt", "archive/x.txt", "..", ""] {
            assert!(matches!(
                library.read(name).await,
                Err(AegisError::DocumentError(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_list_missing_folder_is_document_error() {
        let library = DocumentLibrary::new("/definitely/not/here", "policy_guidelines.txt");
        assert!(matches!(
            library.list().await,
            Err(AegisError::DocumentError(_))
        ));
    }

    #[tokio::test]
    async fn test_load_upload_uses_stem_as_display_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Lease Agreement.TXT");
        std_fs::write(&path, "The tenant shall...").unwrap();

        let upload = load_upload(&path).await.unwrap();
        assert_eq!(upload.file_name, "Lease Agreement.TXT");
        assert_eq!(upload.display_name, "Lease Agreement");
        assert_eq!(upload.text, "The tenant shall...");
    }

    #[tokio::test]
    async fn test_load_upload_extracts_pdf_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Lease Summary.pdf");
        std_fs::write(&path, single_page_pdf("Lease term is five years")).unwrap();

        let upload = load_upload(&path).await.unwrap();
        assert_eq!(upload.file_name, "Lease Summary.pdf");
        assert_eq!(upload.display_name, "Lease Summary");
        assert!(upload.text.contains("Lease term is five years"), "{:?}", upload.text);
    }

    #[tokio::test]
    async fn test_load_upload_reports_damaged_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        std_fs::write(&path, b"%PDF-1.7\nnot really a pdf").unwrap();

        assert!(matches!(
            load_upload(&path).await,
            Err(AegisError::DocumentError(m)) if m.contains("broken.pdf")
        ));
    }

    #[tokio::test]
    async fn test_load_upload_rejects_other_types_and_binary() {
        let dir = tempfile::tempdir().unwrap();
        let docx = dir.path().join("contract.docx");
        std_fs::write(&docx, b"PK\x03\x04").unwrap();
        assert!(matches!(
            load_upload(&docx).await,
            Err(AegisError::DocumentError(m)) if m.contains("Unsupported")
        ));

        let binary = dir.path().join("garbage.txt");
        std_fs::write(&binary, [0xff, 0xfe, 0x00]).unwrap();
        assert!(matches!(
            load_upload(&binary).await,
            Err(AegisError::DocumentError(m)) if m.contains("UTF-8")
        ));
    }
}
