use std::path::Path;

use seggen::{Credentials, StreamFormat};
use serde::Deserialize;

/// Settings that can be kept in a TOML file instead of being passed as flags.
///
/// ```toml
/// root_url = "http://origin.example.com/"
/// prefix = "shows/"
/// formats = ["dash", "hls"]
///
/// [storage]
/// bucket = "media"
/// region = "eu-central-1"
/// credentials = { profile = "loadtest" }
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub root_url: Option<String>,
    pub prefix: Option<String>,
    pub count: Option<usize>,
    pub formats: Vec<StreamFormat>,
    pub storage: FileStorageConfig,
    pub timeout: Option<u64>,
    pub retry: Option<u32>,
    pub concurrency: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FileStorageConfig {
    pub bucket: Option<String>,
    pub region: Option<String>,
    pub endpoint: Option<String>,
    pub credentials: Option<Credentials>,
}

impl FileConfig {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let config = toml::from_str(&data)?;
        Ok(config)
    }
}
