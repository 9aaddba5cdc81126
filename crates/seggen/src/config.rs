use std::{collections::BTreeSet, fmt, num::NonZeroUsize, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{SegGenError, SegGenResult};

/// Manifest formats a stream can be expanded into.
///
/// The declaration order is the order in which formats are aggregated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamFormat {
    Hls,
    Dash,
    Smooth,
}

impl StreamFormat {
    pub const ALL: [StreamFormat; 3] = [StreamFormat::Hls, StreamFormat::Dash, StreamFormat::Smooth];

    pub fn as_str(&self) -> &'static str {
        match self {
            StreamFormat::Hls => "hls",
            StreamFormat::Dash => "dash",
            StreamFormat::Smooth => "smooth",
        }
    }
}

impl fmt::Display for StreamFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StreamFormat {
    type Err = SegGenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hls" => Ok(StreamFormat::Hls),
            "dash" => Ok(StreamFormat::Dash),
            "smooth" => Ok(StreamFormat::Smooth),
            other => Err(SegGenError::InvalidConfig(format!(
                "unknown format {other:?}, expected one of hls, dash, smooth"
            ))),
        }
    }
}

/// How the object store client authenticates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Credentials {
    /// Environment, shared config files and instance metadata, in the usual AWS order.
    #[default]
    Default,
    /// A named profile of the shared AWS config. The process must export it as `AWS_PROFILE`
    /// before any storage client is created.
    Profile(String),
    Static {
        access_key_id: String,
        secret_access_key: String,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    pub bucket: String,
    pub region: Option<String>,
    pub endpoint: Option<String>,
    #[serde(default)]
    pub credentials: Credentials,
}

#[derive(Debug, Clone)]
pub struct SegGenConfig {
    /// Origin URL the manifest keys are appended to.
    pub root_url: String,
    pub storage: StorageConfig,
    pub prefix: String,
    /// Maximum number of manifests to expand, `None` for all of them.
    pub count: Option<usize>,
    pub formats: BTreeSet<StreamFormat>,
    pub timeout: Duration,
    /// Total tries per manifest fetch.
    pub attempts: u32,
    pub concurrency: NonZeroUsize,
}

impl SegGenConfig {
    pub fn builder(root_url: impl Into<String>, bucket: impl Into<String>) -> SegGenConfigBuilder {
        SegGenConfigBuilder::new(root_url.into(), bucket.into())
    }
}

pub struct SegGenConfigBuilder {
    root_url: String,
    storage: StorageConfig,
    prefix: String,
    count: Option<usize>,
    formats: BTreeSet<StreamFormat>,
    timeout: Duration,
    attempts: u32,
    concurrency: usize,
}

impl SegGenConfigBuilder {
    fn new(root_url: String, bucket: String) -> Self {
        Self {
            root_url,
            storage: StorageConfig {
                bucket,
                ..Default::default()
            },
            prefix: String::new(),
            count: None,
            formats: BTreeSet::new(),
            timeout: crate::util::http::DEFAULT_TIMEOUT,
            attempts: 1,
            concurrency: 8,
        }
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn count(mut self, count: Option<usize>) -> Self {
        self.count = count;
        self
    }

    pub fn format(mut self, format: StreamFormat) -> Self {
        self.formats.insert(format);
        self
    }

    pub fn formats(mut self, formats: impl IntoIterator<Item = StreamFormat>) -> Self {
        self.formats.extend(formats);
        self
    }

    pub fn region(mut self, region: Option<String>) -> Self {
        self.storage.region = region;
        self
    }

    pub fn endpoint(mut self, endpoint: Option<String>) -> Self {
        self.storage.endpoint = endpoint;
        self
    }

    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.storage.credentials = credentials;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn build(self) -> SegGenResult<SegGenConfig> {
        let root = Url::parse(&self.root_url)
            .map_err(|e| SegGenError::InvalidConfig(format!("root url {:?}: {e}", self.root_url)))?;
        if !matches!(root.scheme(), "http" | "https") {
            return Err(SegGenError::InvalidConfig(format!(
                "root url must be http(s), got {}",
                root.scheme()
            )));
        }
        if self.storage.bucket.is_empty() {
            return Err(SegGenError::InvalidConfig("bucket name is empty".into()));
        }
        if self.formats.is_empty() {
            return Err(SegGenError::InvalidConfig(
                "at least one format must be requested".into(),
            ));
        }
        match &self.storage.credentials {
            Credentials::Profile(name) if name.is_empty() => {
                return Err(SegGenError::InvalidConfig("profile name is empty".into()))
            }
            Credentials::Static {
                access_key_id,
                secret_access_key,
            } if access_key_id.is_empty() || secret_access_key.is_empty() => {
                return Err(SegGenError::InvalidConfig(
                    "static credentials need both access key id and secret access key".into(),
                ))
            }
            _ => {}
        }
        if self.attempts == 0 {
            return Err(SegGenError::InvalidConfig(
                "fetch attempts must be at least 1".into(),
            ));
        }
        let concurrency = NonZeroUsize::new(self.concurrency)
            .ok_or_else(|| SegGenError::InvalidConfig("concurrency must be at least 1".into()))?;

        Ok(SegGenConfig {
            root_url: self.root_url,
            storage: self.storage,
            prefix: self.prefix,
            count: self.count,
            formats: self.formats,
            timeout: self.timeout,
            attempts: self.attempts,
            concurrency,
        })
    }
}
