use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use futures::stream;

use crate::{
    error::StoreError,
    models::{ListingEntry, PutReceipt},
    storage::{ObjectBody, ObjectStore},
    util::sha256_hex,
};

const CHUNK_SIZE: usize = 64 * 1024;

#[derive(Clone, Debug)]
struct StoredObject {
    bytes: Bytes,
    content_type: String,
    last_modified: DateTime<Utc>,
}

#[derive(Default)]
pub struct MemoryStore {
    objects: DashMap<(String, String), StoredObject>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content_type(&self, bucket: &str, key: &str) -> Option<String> {
        self.objects
            .get(&(bucket.to_string(), key.to_string()))
            .map(|obj| obj.content_type.clone())
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<PutReceipt, StoreError> {
        let e_tag = format!("\"{}\"", sha256_hex(&bytes));
        let size_bytes = bytes.len() as u64;
        self.objects.insert(
            (bucket.to_string(), key.to_string()),
            StoredObject {
                bytes,
                content_type: content_type.to_string(),
                last_modified: Utc::now(),
            },
        );
        Ok(PutReceipt {
            e_tag: Some(e_tag),
            version_id: None,
            size_bytes,
        })
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<ObjectBody, StoreError> {
        let bytes = self
            .objects
            .get(&(bucket.to_string(), key.to_string()))
            .map(|obj| obj.bytes.clone())
            .ok_or_else(|| StoreError::Download(format!("no such key: s3://{bucket}/{key}")))?;

        let mut chunks: Vec<Result<Bytes, StoreError>> =
            Vec::with_capacity(bytes.len() / CHUNK_SIZE + 1);
        let mut rest = bytes;
        while rest.len() > CHUNK_SIZE {
            chunks.push(Ok(rest.split_to(CHUNK_SIZE)));
        }
        if !rest.is_empty() {
            chunks.push(Ok(rest));
        }
        Ok(Box::pin(stream::iter(chunks)))
    }

    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<ListingEntry>, StoreError> {
        let mut entries: Vec<ListingEntry> = self
            .objects
            .iter()
            .filter(|e| e.key().0 == bucket && e.key().1.starts_with(prefix))
            .map(|e| ListingEntry {
                key: e.key().1.clone(),
                size: e.value().bytes.len() as u64,
                last_modified: Some(e.value().last_modified),
            })
            .collect();
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(entries)
    }
}
