use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "sealstore",
    version,
    about = "Encrypted blob storage maintenance",
    after_help = "\
Environment variables:
  STORAGE_ENCRYPTION_KEY                Storage encryption secret
  ACTIVE_RECORD_ENCRYPTION_PRIMARY_KEY  Fallback secret when the storage secret is unset
                                        (APP_PRIMARY_ENCRYPTION_KEY is also accepted)
  APP_ENV (or RAILS_ENV)                'production' makes a missing secret an error
  S3_BUCKET, S3_REGION, S3_ENDPOINT, S3_PREFIX,
  AWS_ACCESS_KEY_ID, AWS_SECRET_ACCESS_KEY
                                        S3 settings when --local is not given"
)]
pub(crate) struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(flatten)]
    pub backend: BackendArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Default)]
pub(crate) struct BackendArgs {
    /// Store objects in a local directory instead of S3
    #[arg(long, value_name = "DIR", global = true, conflicts_with = "s3_bucket")]
    pub local: Option<PathBuf>,

    /// S3 bucket (overrides S3_BUCKET)
    #[arg(long, global = true)]
    pub s3_bucket: Option<String>,

    /// S3 region (overrides S3_REGION)
    #[arg(long, global = true)]
    pub s3_region: Option<String>,

    /// Custom S3 endpoint, e.g. MinIO (overrides S3_ENDPOINT)
    #[arg(long, global = true)]
    pub s3_endpoint: Option<String>,

    /// Key prefix inside the bucket (overrides S3_PREFIX)
    #[arg(long, global = true)]
    pub s3_prefix: Option<String>,

    /// Use path-style bucket addressing
    #[arg(long, global = true)]
    pub s3_path_style: bool,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Commands {
    /// Encrypt every legacy object recorded in the catalog
    Sweep {
        /// Blob catalog database
        #[arg(long, env = "SEALSTORE_CATALOG")]
        catalog: PathBuf,

        /// Catalog rows per batch
        #[arg(long, default_value_t = 100)]
        batch_size: usize,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show whether a stored object is encrypted
    Inspect {
        /// Object key
        key: String,
    },

    /// Show migration progress
    Status {
        /// Blob catalog database
        #[arg(long, env = "SEALSTORE_CATALOG")]
        catalog: PathBuf,
    },
}
