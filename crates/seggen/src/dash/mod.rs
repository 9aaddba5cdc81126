//! # MPEG-DASH segment resolution
//!
//! A static MPD served at `<base_url>.mpd` is expanded into the initialization segment of the
//! video representation followed by every media segment listed in its `SegmentTimeline`.
//!
//! Only `SegmentTemplate` + `SegmentTimeline` addressing is understood, which is what the origin
//! generates for on-demand assets. Selection rules:
//!
//! * the first `Period` is used, with `MPD/BaseURL` and `Period/BaseURL` applied in that order;
//! * among the `AdaptationSet`s whose `@contentType` (or `@mimeType`) mentions `video`, the
//!   **last** one wins;
//! * the first `Representation` carrying an `@id` provides `$RepresentationID$` and
//!   `$Bandwidth$`;
//! * the `SegmentTemplate` of the adaptation set is preferred over the representation's.
//!
//! See [crate::timeline::dash_segment_times] for how `$Time$` values are derived.

pub mod template;

use dash_mpd::{AdaptationSet, MPD};
use url::Url;

use crate::{
    error::{SegGenError, SegGenResult},
    timeline::{dash_segment_times, TimelineEntry},
    util::{
        http::HttpClient,
        url::{manifest_url, merge_baseurls},
    },
    ManifestResolver, StreamFormat,
};
use template::TemplateParams;

pub const MPD_SUFFIX: &str = ".mpd";

pub struct DashResolver {
    client: HttpClient,
    attempts: u32,
}

impl DashResolver {
    pub fn new(client: HttpClient, attempts: u32) -> Self {
        Self { client, attempts }
    }
}

impl ManifestResolver for DashResolver {
    fn format(&self) -> StreamFormat {
        StreamFormat::Dash
    }

    async fn resolve(&self, base_url: &Url) -> SegGenResult<Vec<Url>> {
        let mpd_url = manifest_url(base_url, MPD_SUFFIX)?;
        tracing::debug!("Fetching MPD {mpd_url}");

        let bytes = self.client.fetch(mpd_url, self.attempts).await?;
        let mpd = dash_mpd::parse(&String::from_utf8_lossy(&bytes))?;
        resolve_mpd_segments(base_url, &mpd)
    }
}

fn is_video(adaptation: &AdaptationSet) -> bool {
    adaptation
        .contentType
        .as_deref()
        .or(adaptation.mimeType.as_deref())
        .is_some_and(|content_type| content_type.contains("video"))
}

/// Expands a parsed MPD into the ordered request list of its video track.
pub fn resolve_mpd_segments(base_url: &Url, mpd: &MPD) -> SegGenResult<Vec<Url>> {
    let period = mpd
        .periods
        .first()
        .ok_or(SegGenError::MissingField("Period"))?;

    let mut base_url = base_url.clone();
    if let Some(mpd_base_url) = mpd.base_url.first() {
        base_url = merge_baseurls(&base_url, &mpd_base_url.base)?;
    }
    if let Some(period_base_url) = period.BaseURL.first() {
        base_url = merge_baseurls(&base_url, &period_base_url.base)?;
    }

    let adaptation = period
        .adaptations
        .iter()
        .rev()
        .find(|adaptation| is_video(adaptation))
        .ok_or(SegGenError::MissingField("video AdaptationSet"))?;

    let representation = adaptation
        .representations
        .iter()
        .find(|representation| representation.id.is_some())
        .ok_or(SegGenError::MissingField("Representation@id"))?;

    let segment_template = adaptation
        .SegmentTemplate
        .as_ref()
        .or(representation.SegmentTemplate.as_ref())
        .ok_or(SegGenError::MissingField("SegmentTemplate"))?;
    let initialization = segment_template
        .initialization
        .as_deref()
        .ok_or(SegGenError::MissingField("SegmentTemplate@initialization"))?;
    let media = segment_template
        .media
        .as_deref()
        .ok_or(SegGenError::MissingField("SegmentTemplate@media"))?;
    let timeline = segment_template
        .SegmentTimeline
        .as_ref()
        .ok_or(SegGenError::MissingField("SegmentTimeline"))?;

    let entries = timeline
        .segments
        .iter()
        .map(TimelineEntry::try_from)
        .collect::<SegGenResult<Vec<_>>>()?;

    let mut params = TemplateParams {
        representation_id: representation.id.clone(),
        bandwidth: representation.bandwidth,
        ..Default::default()
    };

    let times = dash_segment_times(&entries)?;
    let mut segments = Vec::with_capacity(times.len() + 1);
    segments.push(merge_baseurls(&base_url, &params.fill(initialization))?);

    let start_number = segment_template.startNumber.unwrap_or(1);
    for (number, time) in (start_number..).zip(times) {
        params.time = Some(time);
        params.number = Some(number);
        segments.push(merge_baseurls(&base_url, &params.fill(media))?);
    }

    Ok(segments)
}
