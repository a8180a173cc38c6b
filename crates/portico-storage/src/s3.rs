//! S3 storage backend built on `object_store`.

use async_trait::async_trait;
use bytes::Bytes;
use http::Method;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::signer::Signer;
use object_store::{
    Attribute, AttributeValue, Attributes, GetOptions, ObjectStore, ObjectStoreExt, PutOptions,
};
use std::borrow::Cow;
use std::collections::HashMap;
use std::time::Duration;

use crate::traits::{Storage, StorageError, StorageResult};

pub struct S3Storage {
    store: AmazonS3,
    bucket: String,
}

impl S3Storage {
    /// Build an S3 backend from the environment (credentials, region) plus
    /// explicit bucket and optional custom endpoint for S3-compatible stores.
    pub fn new(
        bucket: String,
        region: Option<String>,
        endpoint: Option<String>,
    ) -> StorageResult<Self> {
        let mut builder = AmazonS3Builder::from_env().with_bucket_name(bucket.clone());
        if let Some(region) = region {
            builder = builder.with_region(region);
        }
        if let Some(endpoint) = endpoint {
            // Custom endpoints (MinIO etc.) are often plain HTTP in dev.
            builder = builder.with_endpoint(endpoint).with_allow_http(true);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(format!("Failed to build S3 store: {}", e)))?;

        Ok(S3Storage { store, bucket })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    fn map_err(path: &str, err: object_store::Error) -> StorageError {
        match err {
            object_store::Error::NotFound { .. } => StorageError::NotFound(path.to_string()),
            other => StorageError::BackendError(other.to_string()),
        }
    }
}

#[async_trait]
impl Storage for S3Storage {
    #[tracing::instrument(skip(self), fields(s3.bucket = %self.bucket, s3.key = %path))]
    async fn exists(&self, path: &str) -> StorageResult<bool> {
        let location = Path::from(path);
        match self.store.head(&location).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(StorageError::BackendError(e.to_string())),
        }
    }

    #[tracing::instrument(skip(self, data), fields(s3.bucket = %self.bucket, s3.key = %path, s3.size = %data.len()))]
    async fn put(&self, path: &str, data: Bytes, content_type: &str) -> StorageResult<()> {
        let location = Path::from(path);
        let mut attributes = Attributes::new();
        attributes.insert(
            Attribute::ContentType,
            AttributeValue::from(content_type.to_string()),
        );
        let opts = PutOptions {
            attributes,
            ..Default::default()
        };
        self.store
            .put_opts(&location, data.into(), opts)
            .await
            .map_err(|e| StorageError::UploadFailed(e.to_string()))?;
        tracing::info!("S3 upload successful");
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(s3.bucket = %self.bucket, s3.key = %path))]
    async fn download(&self, path: &str) -> StorageResult<Vec<u8>> {
        let location = Path::from(path);
        let result = self
            .store
            .get(&location)
            .await
            .map_err(|e| Self::map_err(path, e))?;
        let bytes = result
            .bytes()
            .await
            .map_err(|e| StorageError::DownloadFailed(e.to_string()))?;
        Ok(bytes.to_vec())
    }

    async fn content_type(&self, path: &str) -> StorageResult<Option<String>> {
        let location = Path::from(path);
        let opts = GetOptions {
            head: true,
            ..Default::default()
        };
        let result = self
            .store
            .get_opts(&location, opts)
            .await
            .map_err(|e| Self::map_err(path, e))?;
        Ok(result
            .attributes
            .get(&Attribute::ContentType)
            .map(|v| v.as_ref().to_string()))
    }

    async fn metadata(&self, path: &str) -> StorageResult<HashMap<String, String>> {
        let location = Path::from(path);
        let opts = GetOptions {
            head: true,
            ..Default::default()
        };
        let result = self
            .store
            .get_opts(&location, opts)
            .await
            .map_err(|e| Self::map_err(path, e))?;
        let mut map = HashMap::new();
        for (attribute, value) in result.attributes.iter() {
            if let Attribute::Metadata(key) = attribute {
                map.insert(key.to_string(), value.as_ref().to_string());
            }
        }
        Ok(map)
    }

    #[tracing::instrument(skip(self, metadata), fields(s3.bucket = %self.bucket, s3.key = %path))]
    async fn set_metadata(
        &self,
        path: &str,
        metadata: HashMap<String, String>,
    ) -> StorageResult<()> {
        // S3 has no in-place metadata update; rewrite the object with the
        // merged attribute set.
        let location = Path::from(path);
        let current = self
            .store
            .get(&location)
            .await
            .map_err(|e| Self::map_err(path, e))?;
        let mut attributes = Attributes::new();
        if let Some(content_type) = current.attributes.get(&Attribute::ContentType) {
            attributes.insert(Attribute::ContentType, content_type.clone());
        }
        for (key, value) in metadata {
            attributes.insert(
                Attribute::Metadata(Cow::Owned(key)),
                AttributeValue::from(value),
            );
        }
        let bytes = current
            .bytes()
            .await
            .map_err(|e| StorageError::DownloadFailed(e.to_string()))?;
        let opts = PutOptions {
            attributes,
            ..Default::default()
        };
        self.store
            .put_opts(&location, bytes.into(), opts)
            .await
            .map_err(|e| StorageError::UploadFailed(e.to_string()))?;
        Ok(())
    }

    async fn signed_read_url(&self, path: &str, expires_in: Duration) -> StorageResult<String> {
        let location = Path::from(path);
        let url = self
            .store
            .signed_url(Method::GET, &location, expires_in)
            .await
            .map_err(|e| StorageError::BackendError(format!("Failed to sign URL: {}", e)))?;
        Ok(url.to_string())
    }

    fn backend_name(&self) -> &'static str {
        "s3"
    }
}
