//! Token Storage
//!
//! Persisted token records: an XML file store and an in-memory store.

use async_trait::async_trait;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::codec;
use crate::error::{HxTokenError, StorageError};
use crate::types::{ProjectedValue, Projection, TokenRecord};

/// Token storage interface.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Check whether a record is present at `path`.
    async fn exists(&self, path: &Path) -> Result<bool, HxTokenError>;

    /// Replace whatever is at `path` with `record`, creating parent
    /// directories as needed. Either the old or the new record stays
    /// readable if the write is interrupted.
    async fn write(&self, path: &Path, record: &TokenRecord) -> Result<(), HxTokenError>;

    /// Read the full record at `path`.
    async fn read_record(&self, path: &Path) -> Result<TokenRecord, HxTokenError>;

    /// Delete the record at `path`. Returns false if nothing was there.
    async fn delete(&self, path: &Path) -> Result<bool, HxTokenError>;

    /// Read one projection of the record at `path`.
    async fn read(&self, path: &Path, projection: Projection) -> Result<ProjectedValue, HxTokenError> {
        Ok(self.read_record(path).await?.project(projection))
    }
}

fn display(path: &Path) -> String {
    path.display().to_string()
}

fn decode_at(path: &Path, xml: &str) -> Result<TokenRecord, HxTokenError> {
    codec::decode(xml).map_err(|e| {
        StorageError::Corrupt {
            path: display(path),
            message: e.message,
        }
        .into()
    })
}

fn encode_for(path: &Path, record: &TokenRecord) -> Result<String, HxTokenError> {
    codec::encode(record).map_err(|e| {
        StorageError::WriteFailed {
            path: display(path),
            message: e.to_string(),
        }
        .into()
    })
}

/// File-backed token storage using the XML token document format.
#[derive(Clone, Debug, Default)]
pub struct FileTokenStore;

impl FileTokenStore {
    /// Create new file store.
    pub fn new() -> Self {
        Self
    }

    // Sibling of the target so the final rename stays on one filesystem.
    fn temp_path_for(path: &Path) -> Result<PathBuf, HxTokenError> {
        let file_name = path.file_name().ok_or_else(|| StorageError::WriteFailed {
            path: display(path),
            message: "path has no file name".to_string(),
        })?;

        Ok(path.with_file_name(format!(
            ".{}.{}.tmp",
            file_name.to_string_lossy(),
            uuid::Uuid::new_v4().simple()
        )))
    }

    async fn write_temp(temp: &Path, contents: &[u8]) -> std::io::Result<()> {
        let mut file = tokio::fs::File::create(temp).await?;
        file.write_all(contents).await?;
        file.sync_all().await
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn exists(&self, path: &Path) -> Result<bool, HxTokenError> {
        match tokio::fs::metadata(path).await {
            Ok(metadata) => Ok(metadata.is_file()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::ReadFailed {
                path: display(path),
                message: e.to_string(),
            }
            .into()),
        }
    }

    async fn write(&self, path: &Path, record: &TokenRecord) -> Result<(), HxTokenError> {
        let xml = encode_for(path, record)?;
        let write_failed = |e: std::io::Error| -> HxTokenError {
            StorageError::WriteFailed {
                path: display(path),
                message: e.to_string(),
            }
            .into()
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(write_failed)?;
        }

        let temp = Self::temp_path_for(path)?;
        if let Err(e) = Self::write_temp(&temp, xml.as_bytes()).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(write_failed(e));
        }

        if let Err(e) = tokio::fs::rename(&temp, path).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(write_failed(e));
        }

        debug!(path = %path.display(), "Token record written");
        Ok(())
    }

    async fn read_record(&self, path: &Path) -> Result<TokenRecord, HxTokenError> {
        let xml = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                HxTokenError::from(StorageError::NotFound { path: display(path) })
            } else {
                StorageError::ReadFailed {
                    path: display(path),
                    message: e.to_string(),
                }
                .into()
            }
        })?;

        decode_at(path, &xml).inspect_err(|e| {
            warn!(path = %path.display(), error = %e, "Token record is corrupt");
        })
    }

    async fn delete(&self, path: &Path) -> Result<bool, HxTokenError> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => {
                debug!(path = %path.display(), "Token record deleted");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::DeleteFailed {
                path: display(path),
                message: e.to_string(),
            }
            .into()),
        }
    }
}

/// In-memory token storage holding encoded documents, for testing.
#[derive(Default)]
pub struct InMemoryTokenStore {
    documents: Mutex<HashMap<PathBuf, String>>,
    read_count: AtomicUsize,
    write_count: AtomicUsize,
    fail_writes: Mutex<bool>,
}

impl InMemoryTokenStore {
    /// Create new in-memory token storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record without counting a write.
    pub fn insert(&self, path: impl Into<PathBuf>, record: &TokenRecord) -> &Self {
        let xml = codec::encode(record).unwrap_or_default();
        self.insert_raw(path, xml)
    }

    /// Seed a raw document (which may be corrupt).
    pub fn insert_raw(&self, path: impl Into<PathBuf>, xml: impl Into<String>) -> &Self {
        self.documents.lock().unwrap().insert(path.into(), xml.into());
        self
    }

    /// The stored document, byte for byte.
    pub fn raw(&self, path: &Path) -> Option<String> {
        self.documents.lock().unwrap().get(path).cloned()
    }

    /// Make every write fail.
    pub fn set_fail_writes(&self, fail: bool) -> &Self {
        *self.fail_writes.lock().unwrap() = fail;
        self
    }

    pub fn read_count(&self) -> usize {
        self.read_count.load(Ordering::SeqCst)
    }

    pub fn write_count(&self) -> usize {
        self.write_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn exists(&self, path: &Path) -> Result<bool, HxTokenError> {
        Ok(self.documents.lock().unwrap().contains_key(path))
    }

    async fn write(&self, path: &Path, record: &TokenRecord) -> Result<(), HxTokenError> {
        self.write_count.fetch_add(1, Ordering::SeqCst);
        if *self.fail_writes.lock().unwrap() {
            return Err(StorageError::WriteFailed {
                path: display(path),
                message: "simulated write failure".to_string(),
            }
            .into());
        }

        let xml = encode_for(path, record)?;
        self.documents
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), xml);
        Ok(())
    }

    async fn read_record(&self, path: &Path) -> Result<TokenRecord, HxTokenError> {
        self.read_count.fetch_add(1, Ordering::SeqCst);
        let xml = self
            .raw(path)
            .ok_or_else(|| StorageError::NotFound { path: display(path) })?;
        decode_at(path, &xml)
    }

    async fn delete(&self, path: &Path) -> Result<bool, HxTokenError> {
        Ok(self.documents.lock().unwrap().remove(path).is_some())
    }
}

/// Create in-memory token storage.
pub fn create_in_memory_token_store() -> InMemoryTokenStore {
    InMemoryTokenStore::new()
}
