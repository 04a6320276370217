use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use futures::StreamExt;

use crate::{
    config::Config,
    dated,
    error::{require_non_empty, StoreError},
    models::{Payload, PutReceipt},
    storage::{s3::S3Store, ObjectBody, ObjectStore},
};

#[derive(Clone)]
pub struct ObjectStoreClient {
    store: Arc<dyn ObjectStore>,
    region: String,
}

impl ObjectStoreClient {
    pub fn new(store: Arc<dyn ObjectStore>, region: impl Into<String>) -> Self {
        Self {
            store,
            region: region.into(),
        }
    }

    /// `bucket` is created first when `S3_CREATE_BUCKET` is set.
    pub async fn from_config(
        cfg: &Config,
        bucket: Option<&str>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let store = S3Store::new(cfg).await?;
        if let Some(bucket) = cfg.bucket_to_create(bucket) {
            store.ensure_bucket(bucket).await?;
        }
        Ok(Self::new(Arc::new(store), cfg.s3_region.clone()))
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub async fn upload(
        &self,
        bucket: &str,
        key: &str,
        payload: impl Into<Payload>,
        content_type: &str,
    ) -> Result<PutReceipt, StoreError> {
        require_non_empty("bucket", bucket)?;
        require_non_empty("key", key)?;

        let bytes = payload.into().into_bytes();
        tracing::debug!(bucket, key, size = bytes.len(), content_type, "uploading object");

        let receipt = self
            .store
            .put(bucket, key, bytes, content_type)
            .await
            .map_err(|err| {
                tracing::error!(bucket, key, error = %err, "upload failed");
                match err {
                    StoreError::Upload(_) => err,
                    other => StoreError::Upload(other.to_string()),
                }
            })?;

        tracing::info!(bucket, key, e_tag = ?receipt.e_tag, "object uploaded");
        Ok(receipt)
    }

    pub async fn download_text(&self, bucket: &str, key: &str) -> Result<String, StoreError> {
        let bytes = self.download_binary(bucket, key).await?;
        String::from_utf8(bytes.to_vec()).map_err(|e| {
            StoreError::Download(format!("s3://{bucket}/{key} is not valid utf-8: {e}"))
        })
    }

    pub async fn download_binary(&self, bucket: &str, key: &str) -> Result<Bytes, StoreError> {
        let mut body = self.download_stream(bucket, key).await?;
        let mut buf = BytesMut::new();
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|err| {
                tracing::error!(bucket, key, error = %err, "reading object body failed");
                as_download(err)
            })?;
            buf.extend_from_slice(&chunk);
        }
        tracing::debug!(bucket, key, size = buf.len(), "object downloaded");
        Ok(buf.freeze())
    }

    pub async fn download_stream(&self, bucket: &str, key: &str) -> Result<ObjectBody, StoreError> {
        require_non_empty("bucket", bucket)?;
        require_non_empty("key", key)?;

        self.store.get(bucket, key).await.map_err(|err| {
            tracing::error!(bucket, key, error = %err, "download failed");
            as_download(err)
        })
    }

    /// `None` when no key under `prefix` carries a date.
    pub async fn find_most_recent_by_prefix(
        &self,
        bucket: &str,
        prefix: &str,
    ) -> Result<Option<String>, StoreError> {
        require_non_empty("bucket", bucket)?;

        let entries = self.store.list(bucket, prefix).await?;
        let listed = entries.len();
        let latest = dated::most_recent(entries.into_iter().map(|e| e.key));

        match &latest {
            Some(key) => tracing::debug!(bucket, prefix, listed, key = %key, "latest dated key"),
            None => tracing::debug!(bucket, prefix, listed, "no dated key under prefix"),
        }
        Ok(latest)
    }
}

fn as_download(err: StoreError) -> StoreError {
    match err {
        StoreError::Download(_) => err,
        other => StoreError::Download(other.to_string()),
    }
}
