use std::{collections::BTreeSet, num::NonZeroUsize};

use futures::{stream, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use url::Url;

use crate::{
    config::StreamFormat,
    dash::DashResolver,
    error::{SegGenError, SegGenResult},
    hls::HlsResolver,
    smooth::SmoothResolver,
    util::http::HttpClient,
    ManifestResolver,
};

/// Outcome of expanding one stream in one format.
#[derive(Debug)]
pub struct ResolvedSegmentSet {
    pub format: StreamFormat,
    pub base_url: Url,
    pub result: SegGenResult<Vec<Url>>,
}

impl ResolvedSegmentSet {
    /// Segment URLs, or nothing when the unit failed.
    pub fn segments(&self) -> &[Url] {
        self.result.as_deref().unwrap_or_default()
    }
}

/// Drives fetch, parse and expansion for every (format, base url) pair.
///
/// Units run concurrently but results always come back format-major, then in base URL order,
/// regardless of completion order. A failing unit never affects the others.
pub struct SegmentResolver {
    hls: HlsResolver,
    dash: DashResolver,
    smooth: SmoothResolver,
    concurrency: NonZeroUsize,
}

impl SegmentResolver {
    pub fn new(client: HttpClient, attempts: u32, concurrency: NonZeroUsize) -> Self {
        Self {
            hls: HlsResolver::new(client.clone(), attempts),
            dash: DashResolver::new(client.clone(), attempts),
            smooth: SmoothResolver::new(client, attempts),
            concurrency,
        }
    }

    async fn resolve_unit(&self, format: StreamFormat, base_url: &Url) -> SegGenResult<Vec<Url>> {
        match format {
            StreamFormat::Hls => run(&self.hls, base_url).await,
            StreamFormat::Dash => run(&self.dash, base_url).await,
            StreamFormat::Smooth => run(&self.smooth, base_url).await,
        }
    }

    pub async fn resolve_sets(
        &self,
        base_urls: &[Url],
        formats: &BTreeSet<StreamFormat>,
    ) -> Vec<ResolvedSegmentSet> {
        let units = formats
            .iter()
            .flat_map(|format| base_urls.iter().map(move |base_url| (*format, base_url)));

        stream::iter(units)
            .map(|(format, base_url)| async move {
                let span = tracing::info_span!("resolve", %format, %base_url);
                let result = self.resolve_unit(format, base_url).instrument(span).await;
                ResolvedSegmentSet {
                    format,
                    base_url: base_url.clone(),
                    result,
                }
            })
            .buffered(self.concurrency.get())
            .collect()
            .await
    }

    /// Like [Self::resolve_sets], but gives up as soon as `token` is cancelled.
    ///
    /// In-flight units are dropped and nothing is returned for them.
    pub async fn resolve_sets_with_cancel(
        &self,
        base_urls: &[Url],
        formats: &BTreeSet<StreamFormat>,
        token: &CancellationToken,
    ) -> SegGenResult<Vec<ResolvedSegmentSet>> {
        tokio::select! {
            biased;
            _ = token.cancelled() => Err(SegGenError::Cancelled),
            sets = self.resolve_sets(base_urls, formats) => Ok(sets),
        }
    }

    /// Flat list of every segment URL of every requested format.
    pub async fn resolve(&self, base_urls: &[Url], formats: &BTreeSet<StreamFormat>) -> Vec<Url> {
        flatten(self.resolve_sets(base_urls, formats).await)
    }

    pub async fn resolve_with_cancel(
        &self,
        base_urls: &[Url],
        formats: &BTreeSet<StreamFormat>,
        token: &CancellationToken,
    ) -> SegGenResult<Vec<Url>> {
        let sets = self
            .resolve_sets_with_cancel(base_urls, formats, token)
            .await?;
        Ok(flatten(sets))
    }
}

async fn run<R: ManifestResolver>(resolver: &R, base_url: &Url) -> SegGenResult<Vec<Url>> {
    let result = resolver.resolve(base_url).await;
    match &result {
        Ok(segments) => tracing::debug!("Resolved {} segment(s).", segments.len()),
        Err(error) => tracing::warn!(
            format = %resolver.format(),
            %base_url,
            kind = ?error.kind(),
            "Could not resolve segments: {error}"
        ),
    }
    result
}

fn flatten(sets: Vec<ResolvedSegmentSet>) -> Vec<Url> {
    sets.into_iter()
        .flat_map(|set| set.result.unwrap_or_default())
        .collect()
}
