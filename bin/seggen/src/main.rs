use std::{
    io::{BufWriter, Write},
    path::PathBuf,
    process::ExitCode,
    time::Duration,
};

use clap::Parser;
use seggen::{CancellationToken, Credentials, ErrorKind, SegGen, SegGenConfig, StreamFormat};
use tracing_subscriber::EnvFilter;

mod config;

use config::FileConfig;

/// Prints the segment URL of every stream found in a bucket, one per line, in playback order.
#[derive(Parser, Debug)]
#[clap(name = "seggen", version, author)]
struct SegGenArgs {
    /// Origin URL the manifest keys are appended to, e.g. `http://origin.example.com/`
    #[clap(long)]
    root_url: Option<String>,

    /// Bucket to search for `.ism` manifests
    #[clap(long)]
    bucket: Option<String>,

    /// Only consider keys starting with this prefix
    #[clap(long)]
    prefix: Option<String>,

    /// Maximum number of manifests to expand
    #[clap(short = 'n', long)]
    count: Option<usize>,

    /// Formats to expand. Defaults to all of them.
    #[clap(short, long = "format")]
    formats: Vec<StreamFormat>,

    #[clap(long, env = "AWS_PROFILE")]
    aws_profile: Option<String>,

    #[clap(long, env = "AWS_ACCESS_KEY_ID", hide_env_values = true)]
    access_key_id: Option<String>,

    #[clap(long, env = "AWS_SECRET_ACCESS_KEY", hide_env_values = true)]
    secret_access_key: Option<String>,

    #[clap(long, env = "AWS_REGION")]
    region: Option<String>,

    /// Custom S3 endpoint
    #[clap(long)]
    endpoint: Option<String>,

    /// Number of manifests resolved at the same time
    #[clap(long)]
    concurrency: Option<usize>,

    /// Timeout of a single manifest request, in seconds
    #[clap(long)]
    timeout: Option<u64>,

    /// Total tries per manifest request
    #[clap(long)]
    retry: Option<u32>,

    /// TOML file with default values for the flags above
    #[clap(long)]
    config: Option<PathBuf>,

    #[clap(short, long)]
    verbose: bool,
}

impl SegGenArgs {
    fn into_config(self) -> anyhow::Result<SegGenConfig> {
        let file = match &self.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };

        let root_url = self
            .root_url
            .or(file.root_url)
            .ok_or_else(|| anyhow::anyhow!("--root-url is required"))?;
        let bucket = self
            .bucket
            .or(file.storage.bucket)
            .ok_or_else(|| anyhow::anyhow!("--bucket is required"))?;

        let formats = if !self.formats.is_empty() {
            self.formats
        } else if !file.formats.is_empty() {
            file.formats
        } else {
            StreamFormat::ALL.to_vec()
        };

        let credentials = match (self.access_key_id, self.secret_access_key, self.aws_profile) {
            (Some(access_key_id), Some(secret_access_key), _) => Credentials::Static {
                access_key_id,
                secret_access_key,
            },
            (_, _, Some(profile)) => Credentials::Profile(profile),
            _ => file.storage.credentials.unwrap_or_default(),
        };

        let mut builder = SegGenConfig::builder(root_url, bucket)
            .prefix(self.prefix.or(file.prefix).unwrap_or_default())
            .count(self.count.or(file.count))
            .formats(formats)
            .region(self.region.or(file.storage.region))
            .endpoint(self.endpoint.or(file.storage.endpoint))
            .credentials(credentials);
        if let Some(timeout) = self.timeout.or(file.timeout) {
            builder = builder.timeout(Duration::from_secs(timeout));
        }
        if let Some(retry) = self.retry.or(file.retry) {
            builder = builder.attempts(retry);
        }
        if let Some(concurrency) = self.concurrency.or(file.concurrency) {
            builder = builder.concurrency(concurrency);
        }

        Ok(builder.build()?)
    }
}

fn main() -> ExitCode {
    let args = SegGenArgs::parse();

    let filter = if args.verbose {
        EnvFilter::new("seggen=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = match args.into_config() {
        Ok(config) => config,
        Err(error) => {
            tracing::error!("{error}");
            return ExitCode::FAILURE;
        }
    };

    // The S3 client reads the profile from the environment, so it has to be in place before
    // the runtime spawns any thread.
    if let Credentials::Profile(profile) = &config.storage.credentials {
        std::env::set_var("AWS_PROFILE", profile);
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(error) => {
            tracing::error!("Failed to start runtime: {error}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(config)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!("{error}");
            match error.downcast_ref::<seggen::SegGenError>().map(|e| e.kind()) {
                Some(ErrorKind::Discovery) => ExitCode::from(127),
                _ => ExitCode::FAILURE,
            }
        }
    }
}

async fn run(config: SegGenConfig) -> anyhow::Result<()> {
    let seggen = SegGen::new(config)?;

    let token = CancellationToken::new();
    let ctrlc_token = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Ctrl-C received, stopping.");
            ctrlc_token.cancel();
        }
    });

    let segments = seggen.generate_with_cancel(&token).await?;
    tracing::info!("Generated {} segment url(s).", segments.len());

    let mut stdout = BufWriter::new(std::io::stdout().lock());
    for segment in segments {
        writeln!(stdout, "{segment}")?;
    }
    stdout.flush()?;

    Ok(())
}
