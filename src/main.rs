use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
    process::ExitCode,
    sync::Arc,
};

use anyhow::Context;
use clap::Parser;
use s3_folder_download::{
    config::{CliArgs, Config},
    error::DispatchError,
    logging,
    s3::{self, S3Storage},
    BatchReport, Dispatcher, Enumerator, ObjectStorage,
};

const EXIT_RUNTIME: u8 = 1;
const EXIT_CONFIG: u8 = 2;
const EXIT_PARTIAL_FAILURE: u8 = 3;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let args = CliArgs::parse();

    let config = match Config::try_from(args) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Invalid configuration: {}", err);
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    match logging::init(&config.log) {
        Ok(Some(path)) => eprintln!("Logging to {}", path.display()),
        Ok(None) => {}
        Err(err) => {
            eprintln!("Failed to set up logging: {}", err);
            return ExitCode::from(EXIT_CONFIG);
        }
    }

    match run(config).await {
        Ok(code) => code,
        Err(err) => {
            log::error!("Error downloading folder contents: {:#}", err);
            eprintln!("Error downloading folder contents: {:#}", err);
            ExitCode::from(EXIT_RUNTIME)
        }
    }
}

async fn run(config: Config) -> anyhow::Result<ExitCode> {
    let client = s3::connect(&config.storage).await;
    let storage: Arc<dyn ObjectStorage> = Arc::new(S3Storage::new(client, &config.storage.bucket));
    log::info!(
        "Downloading s3://{}/{} to {}",
        config.storage.bucket,
        config.run.prefix,
        config.run.destination.display()
    );

    let enumerator = Enumerator::new(storage.clone(), &config.run.prefix)
        .with_page_size(config.run.page_size)
        .with_include(config.run.include.clone());
    let dispatcher = Dispatcher::new(storage, &config.run.destination)
        .with_max_concurrency(config.run.max_concurrency);

    let report = match dispatcher.run(enumerator.pages()).await {
        Ok(report) => report,
        Err(DispatchError::Enumeration { source, partial }) => {
            if let Some(path) = &config.run.report {
                write_report(path, &partial)?;
            }
            return Err(anyhow::Error::new(source).context("Failed to list objects"));
        }
        Err(err) => return Err(err.into()),
    };

    if let Some(path) = &config.run.report {
        write_report(path, &report)?;
    }

    println!(
        "Downloaded {} of {} objects ({} pages)",
        report.succeeded, report.total, report.pages
    );
    for failure in &report.failed {
        println!("  failed: {}", failure.key);
    }

    if config.run.fail_on_error && report.has_failures() {
        return Ok(ExitCode::from(EXIT_PARTIAL_FAILURE));
    }

    Ok(ExitCode::SUCCESS)
}

fn write_report(path: &Path, report: &BatchReport) -> anyhow::Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create report file {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, report)
        .with_context(|| format!("Failed to write report file {}", path.display()))?;
    writer.flush()?;
    log::info!("Wrote batch report to {}", path.display());

    Ok(())
}
