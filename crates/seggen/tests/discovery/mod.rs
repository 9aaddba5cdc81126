use futures::TryStreamExt;
use opendal::{services, Operator};
use seggen::{ErrorKind, ManifestDiscovery};

pub async fn memory_store(keys: &[&str]) -> anyhow::Result<Operator> {
    let operator = Operator::new(services::Memory::default())?.finish();
    for key in keys {
        operator.write(key, b"<smil/>".to_vec()).await?;
    }
    Ok(operator)
}

#[tokio::test]
async fn filters_by_prefix_and_extension() -> anyhow::Result<()> {
    let operator = memory_store(&[
        "shows/ep1/video.ism",
        "shows/ep2/video.ism",
        "shows/ep1/notes.txt",
    ])
    .await?;

    let discovery = ManifestDiscovery::new(operator);
    let keys: Vec<String> = discovery
        .list_manifest_keys("shows/ep1")
        .await?
        .try_collect()
        .await?;
    assert_eq!(keys, vec!["shows/ep1/video.ism"]);
    Ok(())
}

#[tokio::test]
async fn empty_listing_is_discovery_error() -> anyhow::Result<()> {
    let operator = memory_store(&["movies/a.ism"]).await?;

    let discovery = ManifestDiscovery::new(operator);
    let error = discovery
        .list_manifest_keys("shows/")
        .await?
        .try_collect::<Vec<_>>()
        .await
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Discovery);
    Ok(())
}

#[tokio::test]
async fn objects_without_manifests_are_not_an_error() -> anyhow::Result<()> {
    let operator = memory_store(&["shows/ep1/notes.txt"]).await?;

    let discovery = ManifestDiscovery::new(operator);
    let keys: Vec<String> = discovery
        .list_manifest_keys("shows/")
        .await?
        .try_collect()
        .await?;
    assert!(keys.is_empty());
    Ok(())
}

#[tokio::test]
async fn count_limits_base_urls() -> anyhow::Result<()> {
    let operator = memory_store(&["a.ism", "b.ism", "c.ism"]).await?;

    let discovery = ManifestDiscovery::new(operator);
    let all = discovery
        .discover_base_urls("http://cdn.example.com/", "", None)
        .await?;
    assert_eq!(all.len(), 3);
    assert!(all
        .iter()
        .all(|url| url.as_str().starts_with("http://cdn.example.com/")
            && url.as_str().ends_with(".ism/")));

    let limited = discovery
        .discover_base_urls("http://cdn.example.com/", "", Some(2))
        .await?;
    assert_eq!(limited.len(), 2);
    assert_eq!(limited[..], all[..2]);
    Ok(())
}
