use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_s3::{
    error::DisplayErrorContext,
    primitives::ByteStream,
    types::{BucketLocationConstraint, CreateBucketConfiguration},
    Client as S3Client,
};
use bytes::Bytes;
use chrono::DateTime;
use futures::stream;

use crate::{
    config::Config,
    error::StoreError,
    models::{ListingEntry, PutReceipt},
    storage::{ObjectBody, ObjectStore},
};

const DEFAULT_REGION: &str = "us-east-1";

#[derive(Clone)]
pub struct S3Store {
    client: S3Client,
    region: String,
}

impl S3Store {
    pub async fn new(cfg: &Config) -> Result<Self, Box<dyn std::error::Error>> {
        let mut loader =
            aws_config::defaults(BehaviorVersion::latest()).region(Region::new(cfg.s3_region.clone()));

        if let Some(endpoint) = &cfg.s3_endpoint {
            loader = loader.endpoint_url(endpoint);
        }

        if let (Some(access), Some(secret)) = (&cfg.s3_access_key, &cfg.s3_secret_key) {
            let creds = Credentials::new(access, secret, None, None, "env");
            loader = loader.credentials_provider(creds);
        }

        let shared = loader.load().await;
        let mut s3_config = aws_sdk_s3::config::Builder::from(&shared);
        if cfg.s3_force_path_style {
            s3_config = s3_config.force_path_style(true);
        }
        let client = S3Client::from_conf(s3_config.build());

        tracing::info!(
            region = %cfg.s3_region,
            endpoint = cfg.s3_endpoint.as_deref().unwrap_or("default"),
            "s3 store initialized"
        );

        Ok(Self::from_client(client, cfg.s3_region.clone()))
    }

    pub fn from_client(client: S3Client, region: impl Into<String>) -> Self {
        Self {
            client,
            region: region.into(),
        }
    }

    pub async fn ensure_bucket(&self, bucket: &str) -> Result<(), Box<dyn std::error::Error>> {
        let head = self.client.head_bucket().bucket(bucket).send().await;
        if head.is_err() {
            let mut req = self.client.create_bucket().bucket(bucket);
            if self.region != DEFAULT_REGION {
                req = req.create_bucket_configuration(
                    CreateBucketConfiguration::builder()
                        .location_constraint(BucketLocationConstraint::from(self.region.as_str()))
                        .build(),
                );
            }
            req.send().await?;
            tracing::info!(bucket, "bucket created");
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl ObjectStore for S3Store {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<PutReceipt, StoreError> {
        let size_bytes = bytes.len() as u64;
        let resp = self
            .client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StoreError::Upload(DisplayErrorContext(&e).to_string()))?;

        Ok(PutReceipt {
            e_tag: resp.e_tag().map(str::to_string),
            version_id: resp.version_id().map(str::to_string),
            size_bytes,
        })
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<ObjectBody, StoreError> {
        let resp = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let missing = e
                    .as_service_error()
                    .map(|se| se.is_no_such_key())
                    .unwrap_or(false);
                if missing {
                    StoreError::Download(format!("no such key: s3://{bucket}/{key}"))
                } else {
                    StoreError::Download(DisplayErrorContext(&e).to_string())
                }
            })?;

        Ok(body_stream(resp.body))
    }

    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<ListingEntry>, StoreError> {
        let mut entries = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let mut req = self.client.list_objects_v2().bucket(bucket).prefix(prefix);
            if let Some(token) = &continuation_token {
                req = req.continuation_token(token);
            }

            let resp = req
                .send()
                .await
                .map_err(|e| StoreError::Listing(DisplayErrorContext(&e).to_string()))?;

            for obj in resp.contents() {
                let Some(key) = obj.key() else { continue };
                entries.push(ListingEntry {
                    key: key.to_string(),
                    size: obj.size().unwrap_or(0).max(0) as u64,
                    last_modified: obj
                        .last_modified()
                        .and_then(|t| DateTime::from_timestamp(t.secs(), t.subsec_nanos())),
                });
            }

            continuation_token = match (resp.is_truncated(), resp.next_continuation_token()) {
                (Some(true), Some(token)) => Some(token.to_string()),
                _ => break,
            };
            tracing::debug!(bucket, prefix, so_far = entries.len(), "listing next page");
        }

        Ok(entries)
    }
}

fn body_stream(body: ByteStream) -> ObjectBody {
    Box::pin(stream::unfold(body, |mut body| async move {
        body.next()
            .await
            .map(|chunk| (chunk.map_err(|e| StoreError::Download(e.to_string())), body))
    }))
}

#[cfg(test)]
mod tests {
    use aws_sdk_s3::{
        error::ErrorMetadata,
        operation::{
            get_object::{GetObjectError, GetObjectOutput},
            list_objects_v2::ListObjectsV2Output,
            put_object::{PutObjectError, PutObjectOutput},
        },
        types::{error::NoSuchKey, Object},
        Client,
    };
    use aws_smithy_mocks::{mock, mock_client, RuleMode};
    use futures::StreamExt;

    use super::*;

    fn object(key: &str) -> Object {
        Object::builder().key(key).size(1).build()
    }

    #[tokio::test]
    async fn list_follows_continuation_token() {
        let first = mock!(Client::list_objects_v2)
            .match_requests(|req| req.continuation_token().is_none())
            .then_output(|| {
                ListObjectsV2Output::builder()
                    .contents(object("daily/report_2024-01-01.pdf"))
                    .contents(object("daily/report_2024-01-02.pdf"))
                    .is_truncated(true)
                    .next_continuation_token("page-2")
                    .build()
            });
        let second = mock!(Client::list_objects_v2)
            .match_requests(|req| req.continuation_token() == Some("page-2"))
            .then_output(|| {
                ListObjectsV2Output::builder()
                    .contents(object("daily/report_2024-06-15.pdf"))
                    .is_truncated(false)
                    .build()
            });
        let client = mock_client!(aws_sdk_s3, RuleMode::MatchAny, [&first, &second]);
        let store = S3Store::from_client(client, "us-east-1");

        let keys: Vec<_> = store
            .list("reports", "daily/")
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.key)
            .collect();
        assert_eq!(
            keys,
            vec![
                "daily/report_2024-01-01.pdf",
                "daily/report_2024-01-02.pdf",
                "daily/report_2024-06-15.pdf",
            ]
        );
        assert_eq!(first.num_calls(), 1);
        assert_eq!(second.num_calls(), 1);
    }

    #[tokio::test]
    async fn truncated_page_without_token_stops() {
        let only = mock!(Client::list_objects_v2).then_output(|| {
            ListObjectsV2Output::builder()
                .contents(object("a_2024-01-01.txt"))
                .is_truncated(true)
                .build()
        });
        let client = mock_client!(aws_sdk_s3, [&only]);
        let store = S3Store::from_client(client, "us-east-1");

        let entries = store.list("b", "").await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(only.num_calls(), 1);
    }

    #[tokio::test]
    async fn no_such_key_is_download_error() {
        let missing = mock!(Client::get_object).then_error(|| {
            GetObjectError::NoSuchKey(NoSuchKey::builder().message("The specified key does not exist.").build())
        });
        let client = mock_client!(aws_sdk_s3, [&missing]);
        let store = S3Store::from_client(client, "us-east-1");

        let err = store.get("reports", "missing.txt").await.err().unwrap();
        assert!(err.is_download());
        assert_eq!(err.to_string(), "download failed: no such key: s3://reports/missing.txt");
    }

    #[tokio::test]
    async fn get_streams_body() {
        let found = mock!(Client::get_object).then_output(|| {
            GetObjectOutput::builder()
                .body(ByteStream::from_static(b"hello s3"))
                .build()
        });
        let client = mock_client!(aws_sdk_s3, [&found]);
        let store = S3Store::from_client(client, "us-east-1");

        let mut body = store.get("b", "k").await.unwrap();
        let mut buf = Vec::new();
        while let Some(chunk) = body.next().await {
            buf.extend_from_slice(&chunk.unwrap());
        }
        assert_eq!(buf, b"hello s3");
    }

    #[tokio::test]
    async fn put_failure_is_upload_error() {
        let denied = mock!(Client::put_object).then_error(|| {
            PutObjectError::generic(
                ErrorMetadata::builder()
                    .code("AccessDenied")
                    .message("Access Denied")
                    .build(),
            )
        });
        let client = mock_client!(aws_sdk_s3, [&denied]);
        let store = S3Store::from_client(client, "us-east-1");

        let err = store
            .put("b", "k", Bytes::from_static(b"x"), "text/plain")
            .await
            .unwrap_err();
        assert!(err.is_upload());
        assert!(err.to_string().starts_with("upload failed: "));
    }

    #[tokio::test]
    async fn put_returns_receipt() {
        let ok = mock!(Client::put_object).then_output(|| {
            PutObjectOutput::builder()
                .e_tag("\"abc\"")
                .version_id("v1")
                .build()
        });
        let client = mock_client!(aws_sdk_s3, [&ok]);
        let store = S3Store::from_client(client, "us-east-1");

        let receipt = store
            .put("b", "k", Bytes::from_static(b"xyz"), "text/plain")
            .await
            .unwrap();
        assert_eq!(receipt.e_tag.as_deref(), Some("\"abc\""));
        assert_eq!(receipt.version_id.as_deref(), Some("v1"));
        assert_eq!(receipt.size_bytes, 3);
    }
}
