use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::ext::LocalPathExt;

/// One object found under the listed prefix. The key is already URL-decoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectDescriptor {
    pub key: String,
    pub size_hint: Option<u64>,
}

impl ObjectDescriptor {
    pub fn new(key: impl Into<String>, size_hint: Option<u64>) -> Self {
        Self {
            key: key.into(),
            size_hint,
        }
    }

    pub fn local_path(&self, destination: &Path) -> PathBuf {
        destination.local_path_for(&self.key)
    }
}

/// A single listing page, numbered from 1.
#[derive(Debug, Clone)]
pub struct Page {
    pub number: usize,
    pub descriptors: Vec<ObjectDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Success { bytes: u64 },
    Failure { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadResult {
    pub key: String,
    pub local_path: PathBuf,
    pub outcome: Outcome,
}

impl DownloadResult {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Success { .. })
    }
}

/// Aggregate of one run. Only failures are kept individually.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub total: usize,
    pub succeeded: usize,
    pub failed: Vec<DownloadResult>,
    pub pages: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Default for BatchReport {
    fn default() -> Self {
        Self {
            total: 0,
            succeeded: 0,
            failed: Vec::new(),
            pages: 0,
            started_at: Utc::now(),
            finished_at: None,
        }
    }
}

impl BatchReport {
    pub fn record(&mut self, result: DownloadResult) {
        self.total += 1;
        if result.is_success() {
            self.succeeded += 1;
        } else {
            self.failed.push(result);
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}
