mod common;

use anyhow::anyhow;
use async_trait::async_trait;
use common::init_tracing;
use crec::{Config, Content, CrecError, Index, Result};
use interfaces::{FullTextIndex, MemoryFullTextIndex, MemoryOpener, SqliteOpener};
use std::sync::Arc;

fn memory_index() -> Index {
    Index::with_full_text("test", Arc::new(MemoryFullTextIndex::new()))
}

fn localized(id: &str, language: &str, regions: &[&str], script: &str) -> Content {
    Content {
        language: language.to_string(),
        regions: regions.iter().map(|r| r.to_string()).collect(),
        script: script.to_string(),
        ..Content::new(id)
    }
}

fn ids(contents: &[Arc<Content>]) -> Vec<&str> {
    contents.iter().map(|c| c.id.as_str()).collect()
}

struct FailingFullText;

#[async_trait]
impl FullTextIndex for FailingFullText {
    async fn index(&self, _id: &str, _text: &str) -> anyhow::Result<()> {
        Err(anyhow!("backend unavailable"))
    }

    async fn search(&self, _query: &str) -> anyhow::Result<Vec<String>> {
        Err(anyhow!("backend unavailable"))
    }

    async fn len(&self) -> anyhow::Result<usize> {
        Ok(0)
    }
}

#[tokio::test]
async fn test_generation_ids_are_unique() -> Result<()> {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let config = Config::with_dirs(dir.path(), dir.path());

    let first = Index::create(&config, &MemoryOpener).await?;
    let second = Index::create(&config, &MemoryOpener).await?;
    assert!(!first.id().is_empty());
    assert_ne!(first.id(), second.id());
    Ok(())
}

#[tokio::test]
async fn test_full_text_disabled_queries_are_empty() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let config = Config {
        full_text_index: false,
        ..Config::with_dirs(dir.path(), dir.path())
    };

    let mut index = Index::create(&config, &MemoryOpener).await?;
    assert!(!index.has_full_text());
    index
        .add(Content {
            excerpt: "a summary".to_string(),
            ..Content::new("0")
        })
        .await?;
    assert!(index.query("summary").await?.is_empty());
    assert_eq!(index.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_add_and_query_excerpt_and_title() -> Result<()> {
    let mut index = memory_index();
    index
        .add(Content {
            title: "a title".to_string(),
            excerpt: "a summary".to_string(),
            ..Content::new("0")
        })
        .await?;

    assert_eq!(index.content().len(), 1);
    assert_eq!(ids(&index.query("summary").await?), vec!["0"]);
    assert_eq!(ids(&index.query("title").await?), vec!["0"]);
    assert!(index.query("missing").await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_sqlite_backend_is_stored_under_generation_dir() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let config = Config::with_dirs(&dir.path().join("import"), &dir.path().join("index"));

    let mut index = Index::create(&config, &SqliteOpener).await?;
    index
        .add(Content {
            title: "a title".to_string(),
            excerpt: "a summary".to_string(),
            ..Content::new("0")
        })
        .await?;

    assert!(config.full_text_index_path(index.id()).exists());
    assert_eq!(ids(&index.query("summary").await?), vec!["0"]);
    assert_eq!(ids(&index.query("+title -missing").await?), vec!["0"]);
    assert!(index.query("missing").await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_add_all_keeps_insertion_order() -> Result<()> {
    let mut index = memory_index();
    index
        .add_all(vec![
            Arc::new(Content {
                excerpt: "a summary".to_string(),
                ..Content::new("0")
            }),
            Arc::new(Content {
                excerpt: "a summary".to_string(),
                ..Content::new("1")
            }),
        ])
        .await?;

    assert_eq!(ids(index.content()), vec!["0", "1"]);
    assert_eq!(index.query("summary").await?.len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_repeated_id_last_write_wins() -> Result<()> {
    let mut index = Index::with_id("test");
    index
        .add(Content {
            title: "first".to_string(),
            ..Content::new("0")
        })
        .await?;
    index
        .add(Content {
            title: "second".to_string(),
            ..Content::new("0")
        })
        .await?;

    assert_eq!(index.get("0").map(|c| c.title.as_str()), Some("second"));
    assert_eq!(index.len(), 2);
    assert!(index.get("1").is_none());
    Ok(())
}

#[tokio::test]
async fn test_full_text_failure_keeps_in_memory_indexing() -> Result<()> {
    let mut index = Index::with_full_text("test", Arc::new(FailingFullText));
    let result = index
        .add(Content {
            source: "p".to_string(),
            tags: vec!["t1".to_string()],
            ..Content::new("0")
        })
        .await;

    assert!(matches!(result, Err(CrecError::FullText(_))));
    assert_eq!(index.len(), 1);
    assert!(index.get("0").is_some());
    assert_eq!(index.provider_content("p").len(), 1);
    assert_eq!(index.tagged_content("t1").len(), 1);
    assert!(index.query("anything").await.is_err());
    Ok(())
}

#[tokio::test]
async fn test_add_all_indexes_everything_despite_full_text_failure() -> Result<()> {
    let mut index = Index::with_full_text("test", Arc::new(FailingFullText));
    let result = index
        .add_all(vec![Arc::new(Content::new("0")), Arc::new(Content::new("1"))])
        .await;

    assert!(result.is_err());
    assert_eq!(ids(index.content()), vec!["0", "1"]);
    Ok(())
}

#[tokio::test]
async fn test_localized_content() -> Result<()> {
    init_tracing();
    let mut index = Index::with_id("test");
    index
        .add(Content {
            title: "Any".to_string(),
            ..Content::new("0")
        })
        .await?;
    index.add(localized("1", "de", &["AT"], "")).await?;

    // de-AT content is limited to its language and region
    assert_eq!(ids(&index.localized_content("en-CA, en")), vec!["0"]);
    assert_eq!(ids(&index.localized_content("de")), vec!["0"]);

    let hits = index.localized_content("de-AT");
    assert_eq!(hits.len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_empty_regions_match_any_locale() -> Result<()> {
    let mut index = Index::with_id("test");
    index.add(localized("0", "", &[], "")).await?;

    for header in ["en", "de-AT", "fr-CA;q=0.5", "zh-Hant-TW", "pt-BR, en;q=0.2"] {
        assert_eq!(ids(&index.localized_content(header)), vec!["0"], "header {}", header);
    }
    Ok(())
}

#[tokio::test]
async fn test_every_declared_region_is_indexed() -> Result<()> {
    let mut index = Index::with_id("test");
    index.add(localized("0", "de", &["AT", "CH"], "Latn")).await?;

    assert_eq!(ids(&index.localized_content("de-CH")), vec!["0"]);
    assert_eq!(ids(&index.localized_content("de-AT")), vec!["0"]);
    assert!(index.localized_content("de-DE").is_empty());
    Ok(())
}

#[tokio::test]
async fn test_script_must_match() -> Result<()> {
    let mut index = Index::with_id("test");
    index.add(localized("hant", "zh", &[], "Hant")).await?;
    index.add(localized("hans", "zh", &[], "Hans")).await?;

    assert_eq!(ids(&index.localized_content("zh-TW")), vec!["hant"]);
    assert_eq!(ids(&index.localized_content("zh-CN")), vec!["hans"]);
    assert_eq!(index.localized_content("zh-TW, zh-CN").len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_unparseable_header_yields_all_content() -> Result<()> {
    let mut index = Index::with_id("test");
    index.add(localized("0", "de", &["AT"], "")).await?;
    index.add(localized("1", "en", &[], "")).await?;

    assert_eq!(index.localized_content("").len(), 2);
    assert_eq!(index.localized_content("*").len(), 2);
    assert_eq!(index.localized_content("!!").len(), 2);
    assert_eq!(index.localized_content("de-AT, !!").len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_preloaded_locales_are_served_from_cache() -> Result<()> {
    let mut index = Index::with_id("test");
    index.add(localized("0", "en", &[], "")).await?;
    index.add(localized("1", "de", &["AT"], "")).await?;
    index.preload_locales("en, de-AT");

    assert_eq!(ids(&index.localized_content("en")), vec!["0"]);
    assert_eq!(ids(&index.localized_content(" de-AT")), vec!["1"]);
    Ok(())
}

#[tokio::test]
async fn test_tagged_content_is_case_insensitive() -> Result<()> {
    let mut index = Index::with_id("test");
    index
        .add(Content {
            tags: vec!["T1".to_string()],
            ..Content::new("0")
        })
        .await?;
    index
        .add(Content {
            tags: vec!["t2".to_string()],
            ..Content::new("1")
        })
        .await?;

    assert_eq!(ids(index.tagged_content("t1")), vec!["0"]);
    assert_eq!(ids(index.tagged_content(" T2 ")), vec!["1"]);
    assert!(index.tagged_content("t3").is_empty());
    Ok(())
}

#[tokio::test]
async fn test_provider_lookups() -> Result<()> {
    let mut index = Index::with_id("test");
    index
        .add(Content {
            source: "p1".to_string(),
            ..Content::new("0")
        })
        .await?;

    assert_eq!(ids(index.provider_content("p1")), vec!["0"]);
    assert!(index.provider_content("p2").is_empty());
    assert!(index.provider_last_updated("p1").is_none());

    index.set_provider_last_updated("p1");
    assert!(index.provider_last_updated("p1").is_some());
    Ok(())
}
