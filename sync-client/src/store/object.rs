//! Cloud object storage backend (S3, GCS) via `object_store`.

use super::{validate_blob_name, RemoteStore, StoreError};
use async_trait::async_trait;
use futures_util::StreamExt;
use object_store::aws::AmazonS3Builder;
use object_store::buffered::BufWriter;
use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::path::Path as ObjectPath;
use object_store::{ObjectStore, PutPayload};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;

/// Supported cloud providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloudProvider {
    /// Amazon S3 and S3-compatible services.
    S3,
    /// Google Cloud Storage.
    Gcs,
}

impl fmt::Display for CloudProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::S3 => f.write_str("s3"),
            Self::Gcs => f.write_str("gcs"),
        }
    }
}

/// Blob store over a cloud bucket, optionally under a key prefix.
///
/// Credentials and region come from the environment (`AWS_*`,
/// `GOOGLE_*`), as read by the `object_store` builders.
pub struct ObjectStoreBackend {
    store: Arc<dyn ObjectStore>,
    provider: CloudProvider,
    bucket: String,
    prefix: ObjectPath,
}

impl fmt::Debug for ObjectStoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectStoreBackend")
            .field("provider", &self.provider)
            .field("bucket", &self.bucket)
            .field("prefix", &self.prefix.as_ref())
            .finish()
    }
}

impl ObjectStoreBackend {
    /// Connect to `bucket` on `provider` using environment credentials.
    pub fn from_env(
        provider: CloudProvider,
        bucket: &str,
        prefix: &str,
    ) -> Result<Self, StoreError> {
        let store: Arc<dyn ObjectStore> = match provider {
            CloudProvider::S3 => Arc::new(
                AmazonS3Builder::from_env()
                    .with_bucket_name(bucket)
                    .build()
                    .map_err(map_error)?,
            ),
            CloudProvider::Gcs => Arc::new(
                GoogleCloudStorageBuilder::from_env()
                    .with_bucket_name(bucket)
                    .build()
                    .map_err(map_error)?,
            ),
        };
        Ok(Self::with_store(store, provider, bucket, prefix))
    }

    /// Wrap an already-built store.
    pub fn with_store(
        store: Arc<dyn ObjectStore>,
        provider: CloudProvider,
        bucket: &str,
        prefix: &str,
    ) -> Self {
        Self {
            store,
            provider,
            bucket: bucket.to_string(),
            prefix: ObjectPath::from(prefix),
        }
    }

    fn key(&self, name: &str) -> Result<ObjectPath, StoreError> {
        validate_blob_name(name)?;
        Ok(self.prefix.child(name))
    }
}

fn map_error(e: object_store::Error) -> StoreError {
    StoreError::Unavailable(e.to_string())
}

fn map_get_error(name: &str, e: object_store::Error) -> StoreError {
    match e {
        object_store::Error::NotFound { .. } => StoreError::NotFound {
            name: name.to_string(),
        },
        other => map_error(other),
    }
}

fn local_error(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Local {
        path: path.to_path_buf(),
        source,
    }
}

#[async_trait]
impl RemoteStore for ObjectStoreBackend {
    async fn ensure_container(&self) -> Result<(), StoreError> {
        // Buckets are provisioned out of band; listing proves reachability.
        self.store
            .list_with_delimiter(Some(&self.prefix))
            .await
            .map(|_| ())
            .map_err(map_error)
    }

    async fn exists(&self, name: &str) -> Result<bool, StoreError> {
        let key = self.key(name)?;
        match self.store.head(&key).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(map_error(e)),
        }
    }

    async fn read_text(&self, name: &str) -> Result<Option<String>, StoreError> {
        let key = self.key(name)?;
        let result = match self.store.get(&key).await {
            Ok(r) => r,
            Err(object_store::Error::NotFound { .. }) => return Ok(None),
            Err(e) => return Err(map_error(e)),
        };
        let bytes = result.bytes().await.map_err(map_error)?;
        Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
    }

    async fn upload_file(&self, name: &str, path: &Path) -> Result<(), StoreError> {
        let key = self.key(name)?;
        let mut file = tokio::fs::File::open(path)
            .await
            .map_err(|e| local_error(path, e))?;

        let mut writer = BufWriter::new(Arc::clone(&self.store), key);
        if let Err(e) = tokio::io::copy(&mut file, &mut writer).await {
            let _ = writer.abort().await;
            return Err(StoreError::Unavailable(format!("upload {name}: {e}")));
        }
        writer
            .shutdown()
            .await
            .map_err(|e| StoreError::Unavailable(format!("upload {name}: {e}")))
    }

    async fn upload_text(&self, name: &str, content: &str) -> Result<(), StoreError> {
        let key = self.key(name)?;
        self.store
            .put(&key, PutPayload::from(content.as_bytes().to_vec()))
            .await
            .map(|_| ())
            .map_err(map_error)
    }

    async fn download_to_file(&self, name: &str, path: &Path) -> Result<(), StoreError> {
        let key = self.key(name)?;
        let result = self
            .store
            .get(&key)
            .await
            .map_err(|e| map_get_error(name, e))?;

        let mut file = tokio::fs::File::create(path)
            .await
            .map_err(|e| local_error(path, e))?;
        let mut stream = result.into_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_error)?;
            file.write_all(&chunk)
                .await
                .map_err(|e| local_error(path, e))?;
        }
        file.sync_all().await.map_err(|e| local_error(path, e))
    }

    fn describe(&self) -> String {
        if self.prefix.as_ref().is_empty() {
            format!("{}://{}", self.provider, self.bucket)
        } else {
            format!("{}://{}/{}", self.provider, self.bucket, self.prefix)
        }
    }
}
