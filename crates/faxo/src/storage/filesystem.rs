use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;

use crate::error::StorageError;

/// Pointer to a stored document plus its guessed media type.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRef {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

/// Storage backend for fax documents.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Persists the document bytes for an owner and returns a reference
    /// usable as a fax's document ref.
    async fn store(
        &self,
        owner_id: &str,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<DocumentRef, StorageError>;

    /// Resolves a stored reference to a URL the caller can open.
    async fn resolve(&self, document_ref: &str) -> Result<String, StorageError>;
}

/// Stores documents on the local filesystem, one directory per owner.
pub struct FileDocumentStore {
    root: PathBuf,
}

impl FileDocumentStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

fn sanitize_file_name(file_name: &str) -> String {
    let cleaned: String = file_name
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        "document".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Creates the file with O_EXCL semantics, appending `_N` before the
/// extension when the name is already taken.
fn create_exclusive(
    directory: &Path,
    filename: &str,
    content: &[u8],
) -> Result<PathBuf, StorageError> {
    let (base, ext) = if let Some(dot_pos) = filename.rfind('.') {
        (&filename[..dot_pos], Some(&filename[dot_pos..]))
    } else {
        (filename, None)
    };

    for counter in 1..=1000 {
        let try_filename = if counter == 1 {
            filename.to_string()
        } else {
            match ext {
                Some(ext) => format!("{}_{}{}", base, counter, ext),
                None => format!("{}_{}", base, counter),
            }
        };

        let try_path = directory.join(&try_filename);

        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true) // Fails if file exists - atomic check-and-create
            .open(&try_path)
        {
            Ok(mut file) => {
                file.write_all(content)
                    .map_err(|e| StorageError::WriteFile {
                        path: try_path.clone(),
                        source: e,
                    })?;
                return Ok(try_path);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                continue;
            }
            Err(e) => {
                return Err(StorageError::WriteFile {
                    path: try_path,
                    source: e,
                });
            }
        }
    }

    Err(StorageError::FileExists(directory.join(filename)))
}

#[async_trait]
impl DocumentStore for FileDocumentStore {
    async fn store(
        &self,
        owner_id: &str,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<DocumentRef, StorageError> {
        let dir = self.root.join(owner_id);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| StorageError::CreateDirectory {
                path: dir.clone(),
                source: e,
            })?;

        let name = sanitize_file_name(file_name);
        let stamped = format!("{}_{}", Utc::now().timestamp_millis(), name);
        let path = create_exclusive(&dir, &stamped, bytes)?;

        let content_type = mime_guess::from_path(file_name)
            .first()
            .map(|m| m.essence_str().to_string());

        Ok(DocumentRef {
            path: path.to_string_lossy().into_owned(),
            content_type,
        })
    }

    async fn resolve(&self, document_ref: &str) -> Result<String, StorageError> {
        let path = Path::new(document_ref);
        if tokio::fs::metadata(path).await.is_err() {
            return Err(StorageError::NotFound(path.to_path_buf()));
        }
        Ok(format!("file://{}", document_ref))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_store_document() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileDocumentStore::new(temp_dir.path());

        let doc = store
            .store("owner-1", "invoice.pdf", b"%PDF-1.4 content")
            .await
            .unwrap();

        let path = PathBuf::from(&doc.path);
        assert!(path.starts_with(temp_dir.path().join("owner-1")));
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.4 content");
        assert_eq!(doc.content_type.as_deref(), Some("application/pdf"));
    }

    #[tokio::test]
    async fn test_store_sanitizes_separators() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileDocumentStore::new(temp_dir.path());

        let doc = store
            .store("owner-1", "../../etc/passwd", b"nope")
            .await
            .unwrap();

        let path = PathBuf::from(&doc.path);
        assert!(path.starts_with(temp_dir.path().join("owner-1")));
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.contains(".._.._etc_passwd"));
    }

    #[tokio::test]
    async fn test_store_empty_name_falls_back() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileDocumentStore::new(temp_dir.path());

        let doc = store.store("owner-1", "  ", b"data").await.unwrap();

        let name = PathBuf::from(&doc.path)
            .file_name()
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(name.ends_with("_document"));
        assert!(doc.content_type.is_none());
    }

    #[test]
    fn test_create_exclusive_appends_counter() {
        let temp_dir = TempDir::new().unwrap();

        let first = create_exclusive(temp_dir.path(), "scan.pdf", b"one").unwrap();
        let second = create_exclusive(temp_dir.path(), "scan.pdf", b"two").unwrap();
        let third = create_exclusive(temp_dir.path(), "scan.pdf", b"three").unwrap();

        assert!(first.ends_with("scan.pdf"));
        assert!(second.ends_with("scan_2.pdf"));
        assert!(third.ends_with("scan_3.pdf"));
        assert_eq!(std::fs::read(&second).unwrap(), b"two");
    }

    #[test]
    fn test_create_exclusive_without_extension() {
        let temp_dir = TempDir::new().unwrap();

        create_exclusive(temp_dir.path(), "scan", b"one").unwrap();
        let second = create_exclusive(temp_dir.path(), "scan", b"two").unwrap();

        assert!(second.ends_with("scan_2"));
    }

    #[tokio::test]
    async fn test_resolve_existing_document() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileDocumentStore::new(temp_dir.path());

        let doc = store.store("owner-1", "note.txt", b"hello").await.unwrap();
        let url = store.resolve(&doc.path).await.unwrap();

        assert!(url.starts_with("file://"));
        assert!(url.ends_with(".txt") || url.contains("note"));
    }

    #[tokio::test]
    async fn test_resolve_missing_document() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileDocumentStore::new(temp_dir.path());

        let err = store
            .resolve(temp_dir.path().join("gone.pdf").to_str().unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_unknown_extension_has_no_content_type() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileDocumentStore::new(temp_dir.path());

        let doc = store
            .store("owner-1", "payload.zzz9", b"data")
            .await
            .unwrap();
        assert!(doc.content_type.is_none());
    }
}
