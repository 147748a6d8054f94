pub mod config;
pub mod dispatcher;
pub mod enumerator;
pub mod error;
pub mod ext;
pub mod logging;
pub mod s3;
pub mod storage;
pub mod types;

pub use dispatcher::Dispatcher;
pub use enumerator::Enumerator;
pub use storage::ObjectStorage;
pub use types::{BatchReport, DownloadResult, ObjectDescriptor, Outcome, Page};
