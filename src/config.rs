use std::path::PathBuf;

use clap::Parser;
use glob::Pattern;
use log::LevelFilter;
use url::Url;

use crate::enumerator::MAX_PAGE_SIZE;
use crate::error::ConfigError;

/// Download every object under an S3 prefix into a local folder.
///
/// Object keys are flattened into file names by replacing `/` with `_`.
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct CliArgs {
    /// Key prefix ("folder") to download
    pub prefix: String,

    /// Local directory to download into
    pub destination: PathBuf,

    #[command(flatten)]
    pub storage: StorageArgs,

    /// Objects requested per listing page
    #[arg(long, default_value_t = MAX_PAGE_SIZE)]
    pub page_size: i32,

    /// Downloads allowed to run at once, 0 for no limit
    #[arg(long, default_value_t = 64)]
    pub max_concurrency: usize,

    /// Only download keys matching this glob pattern
    #[arg(long)]
    pub include: Option<String>,

    /// Write the JSON batch report to this file
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Exit non-zero when any object failed to download
    #[arg(long)]
    pub fail_on_error: bool,

    #[command(flatten)]
    pub log: LogArgs,
}

#[derive(Debug, clap::Args)]
pub struct StorageArgs {
    #[arg(long, env = "S3_BUCKET_NAME")]
    pub bucket: String,

    #[arg(long, env = "AWS_REGION")]
    pub region: String,

    #[arg(long, env = "AWS_ACCESS_KEY", hide_env_values = true)]
    pub access_key: Option<String>,

    #[arg(long, env = "AWS_SECRET_KEY", hide_env_values = true)]
    pub secret_key: Option<String>,

    /// Alternate S3-compatible endpoint, e.g. http://localhost:4566
    #[arg(long, env = "AWS_ENDPOINT")]
    pub endpoint: Option<String>,
}

#[derive(Debug, clap::Args)]
pub struct LogArgs {
    #[arg(long, env = "LOG_LEVEL", default_value_t = LevelFilter::Info)]
    pub log_level: LevelFilter,

    /// Write logs to a timestamped file in this directory instead of stderr
    #[arg(long, env = "LOG_DIR")]
    pub log_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticCredentials {
    pub access_key: String,
    pub secret_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    pub bucket: String,
    pub region: String,
    pub credentials: Option<StaticCredentials>,
    pub endpoint: Option<Url>,
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub prefix: String,
    pub destination: PathBuf,
    pub page_size: i32,
    pub max_concurrency: usize,
    pub include: Option<Pattern>,
    pub report: Option<PathBuf>,
    pub fail_on_error: bool,
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: LevelFilter,
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub storage: StorageConfig,
    pub run: RunConfig,
    pub log: LogConfig,
}

impl TryFrom<StorageArgs> for StorageConfig {
    type Error = ConfigError;

    fn try_from(args: StorageArgs) -> Result<Self, Self::Error> {
        let credentials = match (args.access_key, args.secret_key) {
            (Some(access_key), Some(secret_key)) => Some(StaticCredentials {
                access_key,
                secret_key,
            }),
            (None, None) => None,
            _ => return Err(ConfigError::PartialCredentials),
        };

        let endpoint = args
            .endpoint
            .filter(|endpoint| !endpoint.is_empty())
            .map(|endpoint| {
                Url::parse(&endpoint).map_err(|err| ConfigError::Endpoint {
                    endpoint: endpoint.clone(),
                    message: err.to_string(),
                })
            })
            .transpose()?;

        Ok(Self {
            bucket: args.bucket,
            region: args.region,
            credentials,
            endpoint,
        })
    }
}

impl TryFrom<CliArgs> for Config {
    type Error = ConfigError;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if !(1..=MAX_PAGE_SIZE).contains(&args.page_size) {
            return Err(ConfigError::PageSize {
                got: args.page_size,
                max: MAX_PAGE_SIZE,
            });
        }

        let include = args
            .include
            .map(|pattern| {
                Pattern::new(&pattern).map_err(|err| ConfigError::IncludePattern {
                    pattern: pattern.clone(),
                    message: err.to_string(),
                })
            })
            .transpose()?;

        Ok(Self {
            storage: StorageConfig::try_from(args.storage)?,
            run: RunConfig {
                prefix: args.prefix,
                destination: args.destination,
                page_size: args.page_size,
                max_concurrency: args.max_concurrency,
                include,
                report: args.report,
                fail_on_error: args.fail_on_error,
            },
            log: LogConfig {
                level: args.log.log_level,
                dir: args.log.log_dir,
            },
        })
    }
}
