use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::{Stream, StreamExt};
use tokio::{io::AsyncWriteExt, sync::Semaphore, task::JoinHandle};

use crate::error::{DispatchError, DownloadError, EnumerationError};
use crate::ext::{is_plain_file_name, FlattenKey};
use crate::storage::ObjectStorage;
use crate::types::{BatchReport, DownloadResult, ObjectDescriptor, Outcome, Page};

/// Downloads every listed object into one flat destination directory.
///
/// One task is spawned per descriptor as soon as its page arrives. When a
/// concurrency limit is set, a semaphore permit gates each task's GET and
/// file write, capping open connections and file handles.
pub struct Dispatcher {
    storage: Arc<dyn ObjectStorage>,
    destination: PathBuf,
    limiter: Option<Arc<Semaphore>>,
}

impl Dispatcher {
    pub fn new(storage: Arc<dyn ObjectStorage>, destination: impl Into<PathBuf>) -> Self {
        Self {
            storage,
            destination: destination.into(),
            limiter: None,
        }
    }

    /// `0` keeps the fan-out unbounded.
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.limiter = (max_concurrency > 0).then(|| Arc::new(Semaphore::new(max_concurrency)));
        self
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    async fn ensure_destination(&self) -> Result<(), DispatchError> {
        match tokio::fs::metadata(&self.destination).await {
            Ok(metadata) if metadata.is_dir() => return Ok(()),
            Ok(_) => {
                return Err(DispatchError::Destination(std::io::Error::new(
                    std::io::ErrorKind::AlreadyExists,
                    format!("{} exists and is not a directory", self.destination.display()),
                )))
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => return Err(DispatchError::Destination(err)),
        }

        tokio::fs::create_dir_all(&self.destination)
            .await
            .map_err(DispatchError::Destination)?;
        log::info!("Created local folder: {}", self.destination.display());
        Ok(())
    }

    /// Consumes a live page feed and waits for every spawned download.
    ///
    /// Per-object failures land in the report. A listing error stops further
    /// dispatch; downloads already started still settle and are returned as
    /// the partial report inside the error.
    pub async fn run<S>(&self, pages: S) -> Result<BatchReport, DispatchError>
    where
        S: Stream<Item = Result<Page, EnumerationError>>,
    {
        let mut report = BatchReport::default();
        let mut handles: Vec<(ObjectDescriptor, PathBuf, JoinHandle<_>)> = Vec::new();
        let mut destination_ready = false;
        let mut listing_error = None;

        futures::pin_mut!(pages);
        while let Some(page) = pages.next().await {
            let page = match page {
                Ok(page) => page,
                Err(err) => {
                    log::error!("Listing failed, no further downloads dispatched: {}", err);
                    listing_error = Some(err);
                    break;
                }
            };
            report.pages += 1;

            if !page.descriptors.is_empty() && !destination_ready {
                self.ensure_destination().await?;
                destination_ready = true;
            }

            for descriptor in page.descriptors {
                let local_path = descriptor.local_path(&self.destination);
                let handle = tokio::spawn(download(
                    self.storage.clone(),
                    self.limiter.clone(),
                    descriptor.key.clone(),
                    local_path.clone(),
                ));
                handles.push((descriptor, local_path, handle));
            }
        }

        for (descriptor, local_path, handle) in handles {
            let outcome = match handle.await {
                Ok(Ok(bytes)) => {
                    log::info!("Downloaded {}", descriptor.key);
                    Outcome::Success { bytes }
                }
                Ok(Err(err)) => {
                    log::error!("Failed to get object {}: {}", descriptor.key, err);
                    Outcome::Failure {
                        reason: err.to_string(),
                    }
                }
                Err(join_error) => {
                    let err = DownloadError::Aborted(join_error.to_string());
                    log::error!("Failed to get object {}: {}", descriptor.key, err);
                    Outcome::Failure {
                        reason: err.to_string(),
                    }
                }
            };

            report.record(DownloadResult {
                key: descriptor.key,
                local_path,
                outcome,
            });
        }
        report.finish();

        if let Some(source) = listing_error {
            log::warn!(
                "Partial run: {} of {} dispatched downloads succeeded",
                report.succeeded,
                report.total
            );
            return Err(DispatchError::Enumeration {
                source,
                partial: report,
            });
        }

        if report.has_failures() {
            log::warn!(
                "Downloaded {} of {} objects, {} failed",
                report.succeeded,
                report.total,
                report.failed.len()
            );
        } else {
            log::info!("Successfully downloaded {} objects", report.succeeded);
        }

        Ok(report)
    }
}

async fn download(
    storage: Arc<dyn ObjectStorage>,
    limiter: Option<Arc<Semaphore>>,
    key: String,
    local_path: PathBuf,
) -> Result<u64, DownloadError> {
    let file_name = key.flatten_key();
    if !is_plain_file_name(&file_name) {
        return Err(DownloadError::UnsafeName(file_name));
    }

    let _permit = match limiter {
        Some(limiter) => Some(
            limiter
                .acquire_owned()
                .await
                .map_err(|err| DownloadError::Aborted(err.to_string()))?,
        ),
        None => None,
    };

    log::info!("Downloading object {} to {}", key, local_path.display());
    let mut body = storage
        .get_object(&key)
        .await?
        .ok_or(DownloadError::MissingBody)?;

    let mut file = tokio::fs::File::create(&local_path).await?;
    let bytes = tokio::io::copy(&mut body, &mut file).await?;
    file.flush().await?;

    Ok(bytes)
}
