//! S3-compatible object store.
//!
//! Talks to MinIO (or any S3 API) with path-style addressing. Writes are
//! conditional on the key being absent, so a key that appears between the
//! existence check and the upload is reported as already existing instead of
//! being overwritten.

use async_trait::async_trait;
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::config::{BehaviorVersion, Builder, Credentials, Region};
use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tracing::{debug, info};

use crate::config::S3Config;
use crate::errors::StorageError;
use crate::interfaces::{ObjectStore, PutOutcome};

/// Object store backed by an S3-compatible server.
#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    client: Client,
}

impl S3ObjectStore {
    /// Create a store for the server described by `config`.
    pub fn new(config: &S3Config) -> Self {
        let credentials = Credentials::new(
            config.access_key.clone(),
            config.secret_key.clone(),
            None,
            None,
            "museum-static",
        );
        let sdk_config = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(config.endpoint_url())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        Self {
            client: Client::from_conf(sdk_config),
        }
    }
}

fn status<E>(err: &SdkError<E, HttpResponse>) -> Option<u16> {
    err.raw_response().map(|response| response.status().as_u16())
}

fn backend_error<E>(action: &str, target: &str, err: SdkError<E, HttpResponse>) -> StorageError
where
    E: std::error::Error + Send + Sync + 'static,
{
    StorageError::io(format!("{} {}: {}", action, target, DisplayErrorContext(err)))
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn ensure_bucket(&self, bucket: &str) -> Result<(), StorageError> {
        match self.client.head_bucket().bucket(bucket).send().await {
            Ok(_) => {
                debug!(bucket = %bucket, "Bucket already exists");
                return Ok(());
            }
            Err(e) if status(&e) == Some(404) => {}
            Err(e) => return Err(backend_error("head bucket", bucket, e)),
        }

        match self.client.create_bucket().bucket(bucket).send().await {
            Ok(_) => {
                info!(bucket = %bucket, "Created bucket");
                Ok(())
            }
            // Another writer created it first.
            Err(e) if status(&e) == Some(409) => Ok(()),
            Err(e) => Err(backend_error("create bucket", bucket, e)),
        }
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
    ) -> Result<PutOutcome, StorageError> {
        if key.is_empty() {
            return Err(StorageError::invalid_key("empty object key"));
        }

        match self.client.head_object().bucket(bucket).key(key).send().await {
            Ok(_) => {
                debug!(bucket = %bucket, key = %key, "Object already exists");
                return Ok(PutOutcome::AlreadyExists);
            }
            Err(e) if status(&e) == Some(404) => {}
            Err(e) => return Err(backend_error("head object", key, e)),
        }

        let result = self
            .client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type("application/json")
            .if_none_match("*")
            .body(ByteStream::from(body))
            .send()
            .await;

        match result {
            Ok(_) => {
                debug!(bucket = %bucket, key = %key, "Stored object");
                Ok(PutOutcome::Created)
            }
            Err(e) if matches!(status(&e), Some(409 | 412)) => {
                debug!(bucket = %bucket, key = %key, "Object appeared before upload");
                Ok(PutOutcome::AlreadyExists)
            }
            Err(e) if status(&e) == Some(404) => Err(StorageError::bucket_not_found(bucket)),
            Err(e) => Err(backend_error("put object", key, e)),
        }
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        let response = match self.client.get_object().bucket(bucket).key(key).send().await {
            Ok(response) => response,
            Err(e) if status(&e) == Some(404) => {
                return Err(StorageError::not_found(bucket, key));
            }
            Err(e) => return Err(backend_error("get object", key, e)),
        };

        let data = response
            .body
            .collect()
            .await
            .map_err(|e| StorageError::io(format!("read object {}: {}", key, e)))?;
        Ok(data.into_bytes().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const OBJECT_PATH: &str = "/museums/raw_data/france/louvre.json";
    const OBJECT_KEY: &str = "raw_data/france/louvre.json";

    fn store_for(server: &MockServer) -> S3ObjectStore {
        S3ObjectStore::new(&S3Config::new(server.uri(), "minioadmin", "minioadmin"))
    }

    fn s3_error(status: u16, code: &str) -> ResponseTemplate {
        ResponseTemplate::new(status).set_body_raw(
            format!(
                "<?xml version=\"1.0\" encoding=\"UTF-8\"?><Error><Code>{}</Code><Message>{}</Message></Error>",
                code, code
            ),
            "application/xml",
        )
    }

    #[tokio::test]
    async fn test_put_uploads_missing_object() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path(OBJECT_PATH))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path(OBJECT_PATH))
            .and(header("if-none-match", "*"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = store_for(&server)
            .put_object("museums", OBJECT_KEY, b"{\"name\":\"Louvre\"}".to_vec())
            .await
            .unwrap();

        assert_eq!(outcome, PutOutcome::Created);
    }

    #[tokio::test]
    async fn test_put_skips_existing_object() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path(OBJECT_PATH))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let outcome = store_for(&server)
            .put_object("museums", OBJECT_KEY, b"{}".to_vec())
            .await
            .unwrap();

        assert_eq!(outcome, PutOutcome::AlreadyExists);
    }

    #[tokio::test]
    async fn test_conflicting_upload_is_not_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path(OBJECT_PATH))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path(OBJECT_PATH))
            .respond_with(s3_error(412, "PreconditionFailed"))
            .mount(&server)
            .await;

        let outcome = store_for(&server)
            .put_object("museums", OBJECT_KEY, b"{}".to_vec())
            .await
            .unwrap();

        assert_eq!(outcome, PutOutcome::AlreadyExists);
    }

    #[tokio::test]
    async fn test_put_into_missing_bucket() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .respond_with(s3_error(404, "NoSuchBucket"))
            .mount(&server)
            .await;

        let err = store_for(&server)
            .put_object("museums", OBJECT_KEY, b"{}".to_vec())
            .await
            .unwrap_err();

        assert!(matches!(err, StorageError::BucketNotFound(_)));
    }

    #[tokio::test]
    async fn test_get_returns_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(OBJECT_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"{\"name\":\"Louvre\"}".to_vec()))
            .mount(&server)
            .await;

        let body = store_for(&server)
            .get_object("museums", OBJECT_KEY)
            .await
            .unwrap();

        assert_eq!(body, b"{\"name\":\"Louvre\"}".to_vec());
    }

    #[tokio::test]
    async fn test_get_missing_object() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(s3_error(404, "NoSuchKey"))
            .mount(&server)
            .await;

        let err = store_for(&server)
            .get_object("museums", OBJECT_KEY)
            .await
            .unwrap_err();

        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_ensure_bucket_creates_missing_bucket() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/museums"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/museums"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        store_for(&server).ensure_bucket("museums").await.unwrap();
    }

    #[tokio::test]
    async fn test_ensure_bucket_keeps_existing_bucket() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/museums"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        store_for(&server).ensure_bucket("museums").await.unwrap();
    }
}
