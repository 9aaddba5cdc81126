//! Microsoft Smooth Streaming client manifests.
//!
//! The manifest lives at `<base_url>manifest`. Each `c` element of the video `StreamIndex` is one
//! fragment; its URL comes from `StreamIndex@Url` with `{bitrate}` and `{start time}` replaced.

use serde::Deserialize;
use url::Url;

use crate::{
    error::{SegGenError, SegGenResult},
    timeline::{smooth_segment_times, TimelineEntry},
    util::{
        http::HttpClient,
        url::{manifest_url, merge_baseurls},
    },
    ManifestResolver, StreamFormat,
};

pub const MANIFEST_SUFFIX: &str = "manifest";

#[derive(Debug, Clone, Deserialize)]
pub struct SmoothStreamingMedia {
    #[serde(rename = "StreamIndex", default)]
    pub stream_indexes: Vec<StreamIndex>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StreamIndex {
    #[serde(rename = "@Type")]
    pub r#type: Option<String>,
    #[serde(rename = "@Url")]
    pub url: Option<String>,
    #[serde(rename = "QualityLevel", default)]
    pub quality_levels: Vec<QualityLevel>,
    #[serde(rename = "c", default)]
    pub chunks: Vec<Chunk>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QualityLevel {
    #[serde(rename = "@Bitrate")]
    pub bitrate: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chunk {
    #[serde(rename = "@t")]
    pub t: Option<u64>,
    #[serde(rename = "@d")]
    pub d: Option<u64>,
}

impl TryFrom<&Chunk> for TimelineEntry {
    type Error = SegGenError;

    fn try_from(chunk: &Chunk) -> SegGenResult<Self> {
        let duration = chunk.d.ok_or(SegGenError::MissingField("c@d"))?;
        Ok(TimelineEntry {
            duration,
            start: chunk.t,
            repeat: None,
        })
    }
}

pub fn parse(text: &str) -> SegGenResult<SmoothStreamingMedia> {
    Ok(quick_xml::de::from_str(text)?)
}

pub struct SmoothResolver {
    client: HttpClient,
    attempts: u32,
}

impl SmoothResolver {
    pub fn new(client: HttpClient, attempts: u32) -> Self {
        Self { client, attempts }
    }
}

impl ManifestResolver for SmoothResolver {
    fn format(&self) -> StreamFormat {
        StreamFormat::Smooth
    }

    async fn resolve(&self, base_url: &Url) -> SegGenResult<Vec<Url>> {
        let url = manifest_url(base_url, MANIFEST_SUFFIX)?;
        tracing::debug!("Fetching smooth manifest {url}");

        let bytes = self.client.fetch(url, self.attempts).await?;
        let manifest = parse(&String::from_utf8_lossy(&bytes))?;
        resolve_smooth_segments(base_url, &manifest)
    }
}

fn fill_template(template: &str, bitrate: &str, time: u64) -> String {
    let time = time.to_string();
    template
        .replace("{bitrate}", bitrate)
        .replace("{Bitrate}", bitrate)
        .replace("{start time}", &time)
        .replace("{start_time}", &time)
}

/// Expands the video `StreamIndex` into fragment URLs. When several stream indexes are video,
/// the last one is used.
pub fn resolve_smooth_segments(
    base_url: &Url,
    manifest: &SmoothStreamingMedia,
) -> SegGenResult<Vec<Url>> {
    let stream_index = manifest
        .stream_indexes
        .iter()
        .rev()
        .find(|index| index.r#type.as_deref().is_some_and(|t| t.contains("video")))
        .ok_or(SegGenError::MissingField("video StreamIndex"))?;

    let template = stream_index
        .url
        .as_deref()
        .ok_or(SegGenError::MissingField("StreamIndex@Url"))?;
    let bitrate = stream_index
        .quality_levels
        .first()
        .and_then(|level| level.bitrate.as_deref())
        .ok_or(SegGenError::MissingField("QualityLevel@Bitrate"))?;

    let entries = stream_index
        .chunks
        .iter()
        .map(TimelineEntry::try_from)
        .collect::<SegGenResult<Vec<_>>>()?;

    smooth_segment_times(&entries)?
        .into_iter()
        .map(|time| merge_baseurls(base_url, &fill_template(template, bitrate, time)))
        .collect()
}
