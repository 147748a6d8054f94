use std::pin::Pin;

use async_trait::async_trait;
use tokio::io::AsyncRead;

use crate::error::StorageError;

pub type ObjectBody = Pin<Box<dyn AsyncRead + Send>>;

/// An entry exactly as the listing returned it. `key` is still URL-encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedObject {
    pub key: String,
    pub size: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct ListPage {
    pub objects: Vec<ListedObject>,
    /// `None` once the listing is complete.
    pub next_continuation_token: Option<String>,
}

/// The two object store operations a download run needs.
///
/// Implementations are expected to request URL-encoded keys from the listing
/// call and to map every error they see into [`StorageError`].
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn list_page(
        &self,
        prefix: &str,
        continuation_token: Option<String>,
        max_keys: i32,
    ) -> Result<ListPage, StorageError>;

    /// Issues a single GET. `Ok(None)` means the service answered without a body.
    async fn get_object(&self, key: &str) -> Result<Option<ObjectBody>, StorageError>;
}
