use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;

use crate::{
    error::StoreError,
    models::{ListingEntry, PutReceipt},
};

pub mod memory;
pub mod s3;

pub type ObjectBody = BoxStream<'static, Result<Bytes, StoreError>>;

#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<PutReceipt, StoreError>;

    async fn get(&self, bucket: &str, key: &str) -> Result<ObjectBody, StoreError>;

    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<ListingEntry>, StoreError>;
}
