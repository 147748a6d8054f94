use std::process::ExitCode;

use clap::Parser;
use futures::{stream, StreamExt, TryStreamExt};
use s3_folder_download::{
    config::{LogArgs, LogConfig, StorageArgs, StorageConfig},
    logging,
    s3::{self, S3Storage},
};

/// Upload sample objects under a prefix, enough to span several listing pages.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Objects are named `<prefix>-<i>.txt`
    prefix: String,

    #[arg(long, default_value_t = 1100)]
    count: usize,

    #[arg(long, default_value = "This is the content of the test file.")]
    body: String,

    #[arg(long, default_value_t = 32)]
    max_concurrency: usize,

    #[command(flatten)]
    storage: StorageArgs,

    #[command(flatten)]
    log: LogArgs,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let storage_config = match StorageConfig::try_from(args.storage) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Invalid configuration: {}", err);
            return ExitCode::from(2);
        }
    };
    let log_config = LogConfig {
        level: args.log.log_level,
        dir: args.log.log_dir,
    };
    if let Err(err) = logging::init(&log_config) {
        eprintln!("Failed to set up logging: {}", err);
        return ExitCode::from(2);
    }

    let storage = S3Storage::new(s3::connect(&storage_config).await, &storage_config.bucket);
    log::info!(
        "Uploading {} objects to s3://{}/{}",
        args.count,
        storage.bucket(),
        args.prefix
    );

    let uploaded = stream::iter(0..args.count)
        .map(|i| {
            let key = format!("{}-{}.txt", args.prefix, i);
            let storage = &storage;
            let body = args.body.clone().into_bytes();
            async move {
                storage.put_object(&key, body).await?;
                log::debug!("Uploaded {}", key);
                Ok::<_, s3_folder_download::error::StorageError>(())
            }
        })
        .buffer_unordered(args.max_concurrency.max(1))
        .try_fold(0usize, |count, ()| async move { Ok(count + 1) })
        .await;

    match uploaded {
        Ok(count) => {
            log::info!("Uploaded {} objects", count);
            println!("Uploaded {} objects.", count);
            ExitCode::SUCCESS
        }
        Err(err) => {
            log::error!("Upload failed: {}", err);
            eprintln!("Upload failed: {}", err);
            ExitCode::from(1)
        }
    }
}
