use m3u8_rs::{MasterPlaylist, MediaPlaylist, Playlist, VariantStream};
use url::Url;

use crate::{
    error::{SegGenError, SegGenResult},
    util::{
        http::HttpClient,
        url::{manifest_url, merge_baseurls},
    },
    ManifestResolver, StreamFormat,
};

pub const MASTER_SUFFIX: &str = ".m3u8";

/// First variant whose URI mentions `video` and which declares a resolution.
///
/// I-frame playlists are never selected.
pub fn select_video_variant(master: &MasterPlaylist) -> Option<&VariantStream> {
    master.variants.iter().find(|variant| {
        !variant.is_i_frame && variant.uri.contains("video") && variant.resolution.is_some()
    })
}

/// Segment URIs of a media playlist resolved against the playlist location.
pub fn media_segment_urls(playlist_url: &Url, playlist: &MediaPlaylist) -> SegGenResult<Vec<Url>> {
    playlist
        .segments
        .iter()
        .map(|segment| merge_baseurls(playlist_url, &segment.uri))
        .collect()
}

fn parse_playlist(bytes: &[u8]) -> SegGenResult<Playlist> {
    m3u8_rs::parse_playlist_res(bytes)
        .map_err(|error| SegGenError::M3u8ParseError(format!("{error:?}")))
}

pub struct HlsResolver {
    client: HttpClient,
    attempts: u32,
}

impl HlsResolver {
    pub fn new(client: HttpClient, attempts: u32) -> Self {
        Self { client, attempts }
    }

    async fn load(&self, url: &Url) -> SegGenResult<Playlist> {
        let bytes = self.client.fetch(url.clone(), self.attempts).await?;
        parse_playlist(&bytes)
    }
}

impl ManifestResolver for HlsResolver {
    fn format(&self) -> StreamFormat {
        StreamFormat::Hls
    }

    async fn resolve(&self, base_url: &Url) -> SegGenResult<Vec<Url>> {
        let master_url = manifest_url(base_url, MASTER_SUFFIX)?;
        tracing::debug!("Fetching master playlist {master_url}");

        let master = match self.load(&master_url).await? {
            Playlist::MasterPlaylist(master) => master,
            Playlist::MediaPlaylist(media) => {
                tracing::debug!("{master_url} is a media playlist, listing it directly");
                return media_segment_urls(&master_url, &media);
            }
        };

        let variant =
            select_video_variant(&master).ok_or(SegGenError::MissingField("video variant"))?;
        let playlist_url = merge_baseurls(&master_url, &variant.uri)?;
        tracing::debug!("Selected video playlist {playlist_url}");

        match self.load(&playlist_url).await? {
            Playlist::MediaPlaylist(media) => media_segment_urls(&playlist_url, &media),
            Playlist::MasterPlaylist(_) => Err(SegGenError::M3u8ParseError(format!(
                "expected a media playlist at {playlist_url}"
            ))),
        }
    }
}
