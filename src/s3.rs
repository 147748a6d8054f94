use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::{
    config::{Credentials, Region},
    error::{DisplayErrorContext, ProvideErrorMetadata, SdkError},
    primitives::ByteStream,
    types::EncodingType,
    Client,
};

use crate::config::StorageConfig;
use crate::error::StorageError;
use crate::storage::{ListPage, ListedObject, ObjectBody, ObjectStorage};

/// Builds a client from an explicit configuration record.
///
/// Static credentials are used when present, otherwise the SDK's default
/// provider chain. A custom endpoint switches to path-style addressing.
pub async fn connect(config: &StorageConfig) -> Client {
    let mut loader =
        aws_config::defaults(BehaviorVersion::latest()).region(Region::new(config.region.clone()));

    if let Some(credentials) = &config.credentials {
        loader = loader.credentials_provider(Credentials::new(
            &credentials.access_key,
            &credentials.secret_key,
            None,
            None,
            "s3-folder-download",
        ));
    }
    if let Some(endpoint) = &config.endpoint {
        log::debug!("Using custom endpoint: {}", endpoint);
        loader = loader.endpoint_url(endpoint.as_str().trim_end_matches('/'));
    }

    let sdk_config = loader.load().await;
    let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
        .force_path_style(config.endpoint.is_some())
        .build();

    Client::from_conf(s3_config)
}

#[derive(Clone, Debug)]
pub struct S3Storage {
    client: Client,
    bucket: String,
}

impl S3Storage {
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub async fn put_object(&self, key: &str, body: Vec<u8>) -> Result<(), StorageError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(storage_error)?;

        Ok(())
    }
}

#[async_trait]
impl ObjectStorage for S3Storage {
    async fn list_page(
        &self,
        prefix: &str,
        continuation_token: Option<String>,
        max_keys: i32,
    ) -> Result<ListPage, StorageError> {
        let output = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(prefix)
            .encoding_type(EncodingType::Url)
            .max_keys(max_keys)
            .set_continuation_token(continuation_token)
            .send()
            .await
            .map_err(storage_error)?;

        let objects = output
            .contents()
            .iter()
            .filter_map(|obj| {
                obj.key().map(|key| ListedObject {
                    key: key.to_string(),
                    size: obj.size(),
                })
            })
            .collect();

        Ok(ListPage {
            objects,
            next_continuation_token: next_token(
                output.is_truncated(),
                output.next_continuation_token(),
            ),
        })
    }

    async fn get_object(&self, key: &str) -> Result<Option<ObjectBody>, StorageError> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(storage_error)?;

        Ok(Some(Box::pin(output.body.into_async_read())))
    }
}

/// A continuation token is only meaningful while the listing is truncated.
fn next_token(is_truncated: Option<bool>, token: Option<&str>) -> Option<String> {
    match is_truncated {
        Some(true) => token.map(String::from),
        _ => None,
    }
}

fn storage_error<E, R>(err: SdkError<E, R>) -> StorageError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    R: std::fmt::Debug + Send + Sync + 'static,
{
    match err {
        SdkError::ServiceError(context) => {
            let service_error = context.into_err();
            match service_error.code() {
                Some("NoSuchKey") | Some("NotFound") => StorageError::NotFound,
                code => StorageError::Service {
                    code: code.unwrap_or("Unknown").to_string(),
                    message: service_error
                        .message()
                        .map(String::from)
                        .unwrap_or_else(|| DisplayErrorContext(&service_error).to_string()),
                },
            }
        }
        other => StorageError::Transport(DisplayErrorContext(&other).to_string()),
    }
}
