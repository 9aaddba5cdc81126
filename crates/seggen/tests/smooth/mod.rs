use seggen::{smooth::SmoothResolver, ErrorKind, HttpClient, ManifestResolver};
use wiremock::MockServer;

use crate::{as_strs, base_url, StreamMock};

#[tokio::test]
async fn video_stream_index() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    server
        .mock(
            "/a.ism/manifest",
            include_str!("../fixtures/smooth/manifest.ismc"),
        )
        .await;

    let base = base_url(&server, "a.ism");
    let resolver = SmoothResolver::new(HttpClient::default(), 1);
    let segments = resolver.resolve(&base).await?;

    // each fragment starts where the preceding ones end
    assert_eq!(
        as_strs(&segments),
        [0u64, 40000000, 80000000, 120000000]
            .iter()
            .map(|time| format!("{base}QualityLevels(400000)/Fragments(video={time})"))
            .collect::<Vec<_>>()
    );
    Ok(())
}

#[tokio::test]
async fn resolving_twice_is_identical() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    server
        .mock(
            "/a.ism/manifest",
            include_str!("../fixtures/smooth/manifest.ismc"),
        )
        .await;

    let base = base_url(&server, "a.ism");
    let resolver = SmoothResolver::new(HttpClient::default(), 1);
    let first = resolver.resolve(&base).await?;
    let second = resolver.resolve(&base).await?;
    assert_eq!(first, second);
    Ok(())
}

#[tokio::test]
async fn not_xml_is_parse_error() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    server.mock("/a.ism/manifest", "<SmoothStreamingMedia").await;

    let resolver = SmoothResolver::new(HttpClient::default(), 1);
    let error = resolver
        .resolve(&base_url(&server, "a.ism"))
        .await
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Parse);
    Ok(())
}
