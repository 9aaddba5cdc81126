pub mod config;
pub mod dash;
pub mod discovery;
pub mod error;
pub mod hls;
pub mod resolver;
pub mod smooth;
pub mod timeline;
pub mod util;

pub use config::{Credentials, SegGenConfig, StorageConfig, StreamFormat};
pub use discovery::ManifestDiscovery;
pub use error::{ErrorKind, SegGenError, SegGenResult};
pub use resolver::{ResolvedSegmentSet, SegmentResolver};
pub use tokio_util::sync::CancellationToken;
pub use url::Url;
pub use util::http::HttpClient;

/// ┌──────────────┐   base urls   ┌────────────────────┐
/// │              ├──────────────►│                    │  .m3u8 ─► variant ─► segments
/// │  Discovery   │               │  SegmentResolver   │  .mpd  ─► SegmentTimeline
/// │  (*.ism keys)│               │  [format x url]    │  manifest ─► StreamIndex/c
/// │              │               │                    │
/// └──────────────┘               └─────────┬──────────┘
///                                          │ ordered segment urls
///                                          ▼
pub trait ManifestResolver {
    fn format(&self) -> StreamFormat;

    /// Expands the manifest of the stream at `base_url` into its ordered segment URLs.
    fn resolve(
        &self,
        base_url: &Url,
    ) -> impl std::future::Future<Output = SegGenResult<Vec<Url>>> + Send;
}

/// Discovers manifests and expands them into the requests a player would make.
pub struct SegGen {
    config: SegGenConfig,
    discovery: ManifestDiscovery,
    resolver: SegmentResolver,
}

impl SegGen {
    /// Connects to the configured S3 bucket and the origin.
    pub fn new(config: SegGenConfig) -> SegGenResult<Self> {
        let client = HttpClient::with_timeout(config.timeout)?;
        let discovery = ManifestDiscovery::s3(&config.storage)?;
        Ok(Self::from_parts(config, discovery, client))
    }

    pub fn from_parts(config: SegGenConfig, discovery: ManifestDiscovery, client: HttpClient) -> Self {
        let resolver = SegmentResolver::new(client, config.attempts, config.concurrency);
        Self {
            config,
            discovery,
            resolver,
        }
    }

    pub fn config(&self) -> &SegGenConfig {
        &self.config
    }

    /// Base URL of every discovered stream, honouring the prefix and count limit.
    pub async fn base_urls(&self) -> SegGenResult<Vec<Url>> {
        self.discovery
            .discover_base_urls(&self.config.root_url, &self.config.prefix, self.config.count)
            .await
    }

    pub async fn generate(&self) -> SegGenResult<Vec<Url>> {
        self.generate_with_cancel(&CancellationToken::new()).await
    }

    /// Runs discovery and resolution. Only discovery failures and cancellation are returned as
    /// errors; streams that fail to resolve contribute no segments.
    pub async fn generate_with_cancel(&self, token: &CancellationToken) -> SegGenResult<Vec<Url>> {
        let base_urls = tokio::select! {
            biased;
            _ = token.cancelled() => return Err(SegGenError::Cancelled),
            base_urls = self.base_urls() => base_urls?,
        };

        self.resolver
            .resolve_with_cancel(&base_urls, &self.config.formats, token)
            .await
    }
}
