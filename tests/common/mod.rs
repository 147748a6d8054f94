#![allow(dead_code)]

use std::collections::{BTreeMap, HashSet};
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use s3_folder_download::error::StorageError;
use s3_folder_download::storage::{ListPage, ListedObject, ObjectBody, ObjectStorage};

/// In-memory bucket. Listing returns URL-encoded keys in lexicographic order
/// and uses the next offset as continuation token.
#[derive(Default)]
pub struct MemoryStorage {
    objects: BTreeMap<String, Vec<u8>>,
    failing_gets: HashSet<String>,
    missing_bodies: HashSet<String>,
    failing_page: Option<usize>,
    get_delay: Option<Duration>,
    pub list_calls: AtomicUsize,
    pub get_calls: AtomicUsize,
    in_flight: AtomicUsize,
    pub peak_in_flight: AtomicUsize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_object(mut self, key: &str, body: &str) -> Self {
        self.objects.insert(key.to_string(), body.as_bytes().to_vec());
        self
    }

    pub fn with_objects(mut self, prefix: &str, count: usize) -> Self {
        for i in 0..count {
            self.objects
                .insert(format!("{}/file-{:05}.txt", prefix, i), i.to_string().into_bytes());
        }
        self
    }

    pub fn failing_get(mut self, key: &str) -> Self {
        self.failing_gets.insert(key.to_string());
        self
    }

    pub fn missing_body(mut self, key: &str) -> Self {
        self.missing_bodies.insert(key.to_string());
        self
    }

    /// Fails the listing request for the given 1-based page number.
    pub fn failing_page(mut self, page: usize) -> Self {
        self.failing_page = Some(page);
        self
    }

    pub fn get_delay(mut self, delay: Duration) -> Self {
        self.get_delay = Some(delay);
        self
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
    async fn list_page(
        &self,
        prefix: &str,
        continuation_token: Option<String>,
        max_keys: i32,
    ) -> Result<ListPage, StorageError> {
        let call = self.list_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.failing_page == Some(call) {
            return Err(StorageError::Transport("connection reset".to_string()));
        }

        let offset = match continuation_token {
            Some(token) => token.parse::<usize>().map_err(|_| StorageError::Service {
                code: "InvalidArgument".to_string(),
                message: "bad continuation token".to_string(),
            })?,
            None => 0,
        };

        let matching: Vec<_> = self
            .objects
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .collect();
        let end = (offset + max_keys as usize).min(matching.len());

        let objects = matching[offset..end]
            .iter()
            .map(|(key, body)| ListedObject {
                key: urlencoding::encode(key).into_owned(),
                size: Some(body.len() as i64),
            })
            .collect();

        Ok(ListPage {
            objects,
            next_continuation_token: (end < matching.len()).then(|| end.to_string()),
        })
    }

    async fn get_object(&self, key: &str) -> Result<Option<ObjectBody>, StorageError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(current, Ordering::SeqCst);

        if let Some(delay) = self.get_delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing_gets.contains(key) {
            return Err(StorageError::Transport("simulated network failure".to_string()));
        }
        if self.missing_bodies.contains(key) {
            return Ok(None);
        }

        match self.objects.get(key) {
            Some(body) => Ok(Some(Box::pin(Cursor::new(body.clone())))),
            None => Err(StorageError::NotFound),
        }
    }
}
