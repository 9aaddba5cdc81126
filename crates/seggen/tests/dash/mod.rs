use seggen::{dash::DashResolver, ErrorKind, HttpClient, ManifestResolver};
use wiremock::MockServer;

use crate::{as_strs, base_url, StreamMock};

#[tokio::test]
async fn single_video_track() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    server
        .mock(
            "/a.ism/.mpd",
            include_str!("../fixtures/dash/single-video.mpd"),
        )
        .await;

    let base = base_url(&server, "a.ism");
    let resolver = DashResolver::new(HttpClient::default(), 1);
    let segments = resolver.resolve(&base).await?;

    assert_eq!(
        as_strs(&segments),
        vec![
            format!("{base}init-1.mp4"),
            format!("{base}seg-1-4.mp4"),
            format!("{base}seg-1-8.mp4"),
        ]
    );
    Ok(())
}

#[tokio::test]
async fn audio_and_video_adaptations() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    server
        .mock("/a.ism/.mpd", include_str!("../fixtures/dash/audio-video.mpd"))
        .await;

    let base = base_url(&server, "a.ism");
    let resolver = DashResolver::new(HttpClient::default(), 1);
    let segments = resolver.resolve(&base).await?;

    let expected: Vec<String> = std::iter::once(format!("{base}dash/a-video=400000.dash"))
        .chain(
            [0, 2400, 4800, 7200, 9600, 12000, 14400, 15600]
                .iter()
                .map(|time| format!("{base}dash/a-video=400000-{time}.dash")),
        )
        .collect();
    assert_eq!(as_strs(&segments), expected);
    Ok(())
}

#[tokio::test]
async fn missing_manifest_is_fetch_error() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    server.mock_status("/a.ism/.mpd", 404).await;

    let resolver = DashResolver::new(HttpClient::default(), 1);
    let error = resolver
        .resolve(&base_url(&server, "a.ism"))
        .await
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Fetch);
    Ok(())
}

#[tokio::test]
async fn malformed_manifest_is_parse_error() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    server.mock("/a.ism/.mpd", "<MPD><Period>").await;

    let resolver = DashResolver::new(HttpClient::default(), 1);
    let error = resolver
        .resolve(&base_url(&server, "a.ism"))
        .await
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Parse);
    Ok(())
}

#[tokio::test]
async fn retries_failed_fetch() -> anyhow::Result<()> {
    use wiremock::{
        matchers::{method, path},
        Mock, ResponseTemplate,
    };

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/a.ism/.mpd"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    server
        .mock(
            "/a.ism/.mpd",
            include_str!("../fixtures/dash/single-video.mpd"),
        )
        .await;

    let resolver = DashResolver::new(HttpClient::default(), 2);
    let segments = resolver.resolve(&base_url(&server, "a.ism")).await?;
    assert_eq!(segments.len(), 3);
    Ok(())
}

#[tokio::test]
async fn default_client_sends_user_agent() -> anyhow::Result<()> {
    use wiremock::{
        matchers::{header_exists, method, path},
        Mock, ResponseTemplate,
    };

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/a.ism/.mpd"))
        .and(header_exists("user-agent"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(include_str!("../fixtures/dash/single-video.mpd")),
        )
        .mount(&server)
        .await;

    let resolver = DashResolver::new(HttpClient::default(), 1);
    let segments = resolver.resolve(&base_url(&server, "a.ism")).await?;
    assert_eq!(segments.len(), 3);
    Ok(())
}
