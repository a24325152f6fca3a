mod common;

use common::init_tracing;
use crec::{
    Config, ContentAggregator, CrecError, Provider, Providers, RecommendParams, Result,
};
use interfaces::MemoryOpener;
use std::sync::Arc;
use std::time::Duration;

fn aggregator(dir: &tempfile::TempDir) -> Result<ContentAggregator> {
    let config = Config {
        recommenders: vec!["tags".to_string(), "provider".to_string()],
        ..Config::with_dirs(&dir.path().join("import"), &dir.path().join("index"))
    };
    let providers = Providers::new(vec![Provider::new("test")])?;
    ContentAggregator::new(config, providers, Arc::new(MemoryOpener))
}

#[tokio::test]
async fn test_enqueue_refresh_recommend() -> Result<()> {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let aggregator = aggregator(&dir)?;
    let initial_etag = aggregator.etag();
    assert!(aggregator.current().is_empty());

    aggregator
        .enqueue("test", br#"[{"id":"0","tags":["t1"]},{"id":"1"}]"#)
        .await?;
    let index = aggregator.refresh().await?;

    assert_eq!(aggregator.etag(), index.id());
    assert_ne!(aggregator.etag(), initial_etag);
    assert_eq!(aggregator.current().len(), 2);

    let params = RecommendParams::default()
        .with_tags("t1")
        .with_provider("test");
    let recommendations = aggregator.recommend(&params).await;
    assert_eq!(recommendations.ids(), vec!["0", "1"]);
    assert_eq!(
        recommendations.contents[0].explanation,
        "Selected for users interested in t1"
    );
    assert!(recommendations
        .cache_control(aggregator.config())
        .is_some());
    Ok(())
}

#[tokio::test]
async fn test_enqueue_rejects_unknown_provider() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let aggregator = aggregator(&dir)?;

    let result = aggregator.enqueue("other", b"[]").await;
    assert!(matches!(result, Err(CrecError::UnknownProvider { id }) if id == "other"));
    Ok(())
}

#[tokio::test]
async fn test_invalid_configuration_is_rejected() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let providers = Providers::new(vec![Provider::new("test")])?;

    let config = Config {
        recommenders: vec!["unknown".to_string()],
        ..Config::with_dirs(dir.path(), dir.path())
    };
    let result = ContentAggregator::new(config, providers.clone(), Arc::new(MemoryOpener));
    assert!(matches!(result, Err(CrecError::UnknownRecommender { .. })));

    let config = Config {
        index_refresh_interval_minutes: 0,
        ..Config::with_dirs(dir.path(), dir.path())
    };
    let result = ContentAggregator::new(config, providers, Arc::new(MemoryOpener));
    assert!(matches!(result, Err(CrecError::Config(_))));
    Ok(())
}

#[tokio::test]
async fn test_refresh_loop_runs_immediately() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let aggregator = Arc::new(aggregator(&dir)?);
    aggregator.enqueue("test", br#"[{"id":"0"}]"#).await?;

    let handle = aggregator.clone().spawn_refresh_loop();
    let mut refreshed = false;
    for _ in 0..100 {
        if aggregator.current().len() == 1 {
            refreshed = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    handle.abort();

    assert!(refreshed);
    Ok(())
}
