use seggen::{hls::HlsResolver, ErrorKind, HttpClient, ManifestResolver};
use wiremock::MockServer;

use crate::{as_strs, base_url, StreamMock};

#[tokio::test]
async fn selects_first_video_variant() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    server
        .mock("/a.ism/.m3u8", include_str!("../fixtures/hls/master.m3u8"))
        .await
        .mock(
            "/a.ism/a-video=400000.m3u8",
            include_str!("../fixtures/hls/video-400000.m3u8"),
        )
        .await;

    let base = base_url(&server, "a.ism");
    let resolver = HlsResolver::new(HttpClient::default(), 1);
    let segments = resolver.resolve(&base).await?;

    assert_eq!(
        as_strs(&segments),
        (1..=4)
            .map(|i| format!("{base}a-video=400000-{i}.ts"))
            .collect::<Vec<_>>()
    );

    let requests = server.received_requests().await.unwrap_or_default();
    assert!(requests
        .iter()
        .all(|request| !request.url.path().contains("1100000")));
    Ok(())
}

#[tokio::test]
async fn media_playlist_at_master_location() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    server
        .mock(
            "/a.ism/.m3u8",
            include_str!("../fixtures/hls/video-400000.m3u8"),
        )
        .await;

    let base = base_url(&server, "a.ism");
    let resolver = HlsResolver::new(HttpClient::default(), 1);
    let segments = resolver.resolve(&base).await?;
    assert_eq!(segments.len(), 4);
    assert_eq!(segments[0].as_str(), format!("{base}a-video=400000-1.ts"));
    Ok(())
}

#[tokio::test]
async fn no_video_variant_is_resolution_error() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    server
        .mock(
            "/a.ism/.m3u8",
            "#EXTM3U\n#EXT-X-STREAM-INF:BANDWIDTH=136000,CODECS=\"mp4a.40.2\"\na-audio_eng=128000.m3u8\n",
        )
        .await;

    let resolver = HlsResolver::new(HttpClient::default(), 1);
    let error = resolver
        .resolve(&base_url(&server, "a.ism"))
        .await
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Resolution);
    Ok(())
}

#[tokio::test]
async fn missing_sub_playlist_is_fetch_error() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    server
        .mock("/a.ism/.m3u8", include_str!("../fixtures/hls/master.m3u8"))
        .await
        .mock_status("/a.ism/a-video=400000.m3u8", 500)
        .await;

    let resolver = HlsResolver::new(HttpClient::default(), 1);
    let error = resolver
        .resolve(&base_url(&server, "a.ism"))
        .await
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Fetch);
    Ok(())
}
