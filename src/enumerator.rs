use std::sync::Arc;

use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use glob::Pattern;

use crate::error::EnumerationError;
use crate::storage::{ListedObject, ObjectStorage};
use crate::types::{ObjectDescriptor, Page};

/// Largest page the listing service returns.
pub const MAX_PAGE_SIZE: i32 = 1000;

enum Cursor {
    First,
    Next { token: String, number: usize },
    Done,
}

/// Walks the paginated listing under a prefix.
///
/// Each call to [`Enumerator::pages`] starts a fresh listing; the continuation
/// token lives only inside the returned stream.
pub struct Enumerator {
    storage: Arc<dyn ObjectStorage>,
    prefix: String,
    page_size: i32,
    include: Option<Pattern>,
}

impl Enumerator {
    pub fn new(storage: Arc<dyn ObjectStorage>, prefix: impl Into<String>) -> Self {
        Self {
            storage,
            prefix: prefix.into(),
            page_size: MAX_PAGE_SIZE,
            include: None,
        }
    }

    /// Clamped to `1..=MAX_PAGE_SIZE`.
    pub fn with_page_size(mut self, page_size: i32) -> Self {
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    /// Keeps only keys matching `pattern`, evaluated on the decoded key.
    pub fn with_include(mut self, pattern: Option<Pattern>) -> Self {
        self.include = pattern;
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn pages(&self) -> BoxStream<'_, Result<Page, EnumerationError>> {
        stream::try_unfold(Cursor::First, move |cursor| async move {
            let (token, number) = match cursor {
                Cursor::First => (None, 1),
                Cursor::Next { token, number } => (Some(token), number),
                Cursor::Done => return Ok(None),
            };

            let listed = self
                .storage
                .list_page(&self.prefix, token, self.page_size)
                .await
                .map_err(|source| EnumerationError::Page {
                    page: number,
                    source,
                })?;

            let descriptors = listed
                .objects
                .into_iter()
                .map(describe)
                .filter(|descriptor| match (descriptor, &self.include) {
                    (Ok(descriptor), Some(pattern)) => pattern.matches(&descriptor.key),
                    _ => true,
                })
                .collect::<Result<Vec<_>, _>>()?;

            log::info!(
                "Retrieved page no. {} ({} objects) under prefix {:?}",
                number,
                descriptors.len(),
                self.prefix
            );

            let next = match listed.next_continuation_token {
                Some(token) => Cursor::Next {
                    token,
                    number: number + 1,
                },
                None => Cursor::Done,
            };

            Ok::<_, EnumerationError>(Some((
                Page {
                    number,
                    descriptors,
                },
                next,
            )))
        })
        .boxed()
    }

    pub fn descriptors(&self) -> BoxStream<'_, Result<ObjectDescriptor, EnumerationError>> {
        self.pages()
            .map_ok(|page| stream::iter(page.descriptors.into_iter().map(Ok::<_, EnumerationError>)))
            .try_flatten()
            .boxed()
    }
}

fn describe(listed: ListedObject) -> Result<ObjectDescriptor, EnumerationError> {
    let key = decode_key(&listed.key)?;
    let size_hint = listed.size.and_then(|size| u64::try_from(size).ok());

    Ok(ObjectDescriptor { key, size_hint })
}

/// Reverses the listing's URL encoding, where a space is sent as `+`.
pub fn decode_key(raw: &str) -> Result<String, EnumerationError> {
    urlencoding::decode(&raw.replace('+', " "))
        .map(|key| key.into_owned())
        .map_err(|_| EnumerationError::KeyDecode {
            raw: raw.to_string(),
        })
}
