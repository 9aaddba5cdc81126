use futures::{stream, Stream, StreamExt, TryStreamExt};
use opendal::{services, Lister, Operator};
use url::Url;

use crate::{
    config::{Credentials, StorageConfig},
    error::{SegGenError, SegGenResult},
};

/// Extension of server manifests; each one is a stream available in every format.
pub const MANIFEST_EXTENSION: &str = ".ism";

/// Enumerates server manifests stored in an object store.
#[derive(Clone)]
pub struct ManifestDiscovery {
    operator: Operator,
}

impl ManifestDiscovery {
    pub fn new(operator: Operator) -> Self {
        Self { operator }
    }

    pub fn s3(config: &StorageConfig) -> SegGenResult<Self> {
        let mut builder = services::S3::default().bucket(&config.bucket);
        if let Some(region) = &config.region {
            builder = builder.region(region);
        }
        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint(endpoint);
        }
        match &config.credentials {
            // both resolved by the AWS config loader
            Credentials::Default | Credentials::Profile(_) => {}
            Credentials::Static {
                access_key_id,
                secret_access_key,
            } => {
                builder = builder
                    .access_key_id(access_key_id)
                    .secret_access_key(secret_access_key);
            }
        }

        Ok(Self::new(Operator::new(builder)?.finish()))
    }

    /// Lazily lists every key under `prefix` ending with [MANIFEST_EXTENSION].
    ///
    /// Pages are requested only as the stream is polled. If the store holds no object at all
    /// under `prefix`, the stream ends with [SegGenError::DiscoveryError]; objects that merely
    /// are not manifests produce an empty stream instead.
    pub async fn list_manifest_keys(
        &self,
        prefix: &str,
    ) -> SegGenResult<impl Stream<Item = SegGenResult<String>> + Send + 'static> {
        let root = listing_root(prefix);
        let lister = match self.operator.lister_with(&root).recursive(true).await {
            Ok(lister) => Some(lister),
            Err(error) if error.kind() == opendal::ErrorKind::NotFound => None,
            Err(error) => return Err(error.into()),
        };

        let prefix = prefix.to_string();
        Ok(stream::try_unfold((lister, false), move |(lister, seen_object)| {
            next_manifest_key(lister, seen_object, prefix.clone())
        }))
    }

    /// Collects at most `count` manifest keys and turns them into stream base URLs.
    pub async fn discover_base_urls(
        &self,
        root_url: &str,
        prefix: &str,
        count: Option<usize>,
    ) -> SegGenResult<Vec<Url>> {
        let keys = self.list_manifest_keys(prefix).await?;
        let keys: Vec<String> = match count {
            Some(count) => keys.take(count).try_collect().await?,
            None => keys.try_collect().await?,
        };
        tracing::info!("Found {} manifest(s) under {prefix:?}.", keys.len());

        build_base_urls(root_url, &keys)
    }
}

type ListState = (Option<Lister>, bool);

async fn next_manifest_key(
    lister: Option<Lister>,
    mut seen_object: bool,
    prefix: String,
) -> SegGenResult<Option<(String, ListState)>> {
    if let Some(mut lister) = lister {
        while let Some(entry) = lister.try_next().await? {
            if !entry.metadata().is_file() || !entry.path().starts_with(&prefix) {
                continue;
            }
            seen_object = true;

            if entry.path().ends_with(MANIFEST_EXTENSION) {
                let key = entry.path().to_string();
                return Ok(Some((key, (Some(lister), seen_object))));
            }
        }
    }

    if seen_object {
        Ok(None)
    } else {
        tracing::error!("Listing under {prefix:?} does not contain any object.");
        Err(SegGenError::DiscoveryError(prefix))
    }
}

/// Deepest directory containing every key that starts with `prefix`.
fn listing_root(prefix: &str) -> String {
    match prefix.rfind('/') {
        Some(index) => prefix[..=index].to_string(),
        None => "/".to_string(),
    }
}

/// `root_url + key + "/"` for every key, in order.
pub fn build_base_urls<S>(root_url: &str, keys: &[S]) -> SegGenResult<Vec<Url>>
where
    S: AsRef<str>,
{
    keys.iter()
        .map(|key| Url::parse(&format!("{root_url}{}/", key.as_ref())).map_err(SegGenError::from))
        .collect()
}
