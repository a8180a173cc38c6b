//! Local filesystem backend for development and tests.
//!
//! Objects live under a base directory; the content type and custom metadata
//! map are kept in a `<object>.meta.json` sidecar so confirmation-time reads
//! see the same view S3 attributes would give.

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::traits::{Storage, StorageError, StorageResult};

const SIDECAR_SUFFIX: &str = ".meta.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct SidecarMeta {
    content_type: Option<String>,
    #[serde(default)]
    metadata: HashMap<String, String>,
}

pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        LocalStorage {
            base_path: base_path.into(),
            base_url: base_url.into(),
        }
    }

    fn resolve(&self, key: &str) -> StorageResult<PathBuf> {
        if key.split('/').any(|segment| segment == "..") || Path::new(key).is_absolute() {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.base_path.join(key))
    }

    async fn read_sidecar(&self, key: &str) -> StorageResult<SidecarMeta> {
        let mut path = self.resolve(key)?.into_os_string();
        path.push(SIDECAR_SUFFIX);
        match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| StorageError::BackendError(format!("Corrupt sidecar: {}", e))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(SidecarMeta::default()),
            Err(e) => Err(StorageError::IoError(e)),
        }
    }

    async fn write_sidecar(&self, key: &str, meta: &SidecarMeta) -> StorageResult<()> {
        let mut path = self.resolve(key)?.into_os_string();
        path.push(SIDECAR_SUFFIX);
        let json = serde_json::to_vec(meta)
            .map_err(|e| StorageError::BackendError(format!("Sidecar encode: {}", e)))?;
        tokio::fs::write(&path, json).await?;
        Ok(())
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn exists(&self, path: &str) -> StorageResult<bool> {
        let file = self.resolve(path)?;
        Ok(tokio::fs::try_exists(&file).await?)
    }

    async fn put(&self, path: &str, data: Bytes, content_type: &str) -> StorageResult<()> {
        let file = self.resolve(path)?;
        if let Some(parent) = file.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&file, &data).await?;
        self.write_sidecar(
            path,
            &SidecarMeta {
                content_type: Some(content_type.to_string()),
                metadata: HashMap::new(),
            },
        )
        .await?;
        Ok(())
    }

    async fn download(&self, path: &str) -> StorageResult<Vec<u8>> {
        let file = self.resolve(path)?;
        match tokio::fs::read(&file).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(path.to_string()))
            }
            Err(e) => Err(StorageError::IoError(e)),
        }
    }

    async fn content_type(&self, path: &str) -> StorageResult<Option<String>> {
        if !self.exists(path).await? {
            return Err(StorageError::NotFound(path.to_string()));
        }
        Ok(self.read_sidecar(path).await?.content_type)
    }

    async fn metadata(&self, path: &str) -> StorageResult<HashMap<String, String>> {
        if !self.exists(path).await? {
            return Err(StorageError::NotFound(path.to_string()));
        }
        Ok(self.read_sidecar(path).await?.metadata)
    }

    async fn set_metadata(
        &self,
        path: &str,
        metadata: HashMap<String, String>,
    ) -> StorageResult<()> {
        if !self.exists(path).await? {
            return Err(StorageError::NotFound(path.to_string()));
        }
        let mut sidecar = self.read_sidecar(path).await?;
        sidecar.metadata = metadata;
        self.write_sidecar(path, &sidecar).await
    }

    async fn signed_read_url(&self, path: &str, _expires_in: Duration) -> StorageResult<String> {
        // Local files are served directly; there is nothing to sign.
        self.resolve(path)?;
        Ok(format!("{}/{}", self.base_url.trim_end_matches('/'), path))
    }

    fn backend_name(&self) -> &'static str {
        "local"
    }
}
