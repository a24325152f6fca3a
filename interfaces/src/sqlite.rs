use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use tracing::debug;

use crate::defs::{FullTextIndex, FullTextOpener};
use crate::query::Query;

/// Full-text backend stored in an SQLite database with an FTS5 table.
pub struct SqliteFullTextIndex {
    path: PathBuf,
    pool: SqlitePool,
}

impl SqliteFullTextIndex {
    /// Opens the database at `path`, creating it and its parent directories
    /// when missing.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create index directory {}", parent.display()))?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        // one connection: SQLite takes a single writer at a time
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to open full-text index {}", path.display()))?;

        sqlx::query(
            r#"
            CREATE VIRTUAL TABLE IF NOT EXISTS content_fts USING fts5(
                content_id UNINDEXED,
                text
            )
            "#,
        )
        .execute(&pool)
        .await?;
        debug!("Opened full-text index at {}", path.display());

        Ok(Self {
            path: path.to_path_buf(),
            pool,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl FullTextIndex for SqliteFullTextIndex {
    async fn index(&self, id: &str, text: &str) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM content_fts WHERE content_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("INSERT INTO content_fts (content_id, text) VALUES (?, ?)")
            .bind(id)
            .bind(text)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn search(&self, query: &str) -> Result<Vec<String>> {
        let Some(expression) = Query::parse(query).to_fts5() else {
            return Ok(Vec::new());
        };

        let rows = sqlx::query(
            r#"
            SELECT content_id
            FROM content_fts
            WHERE content_fts MATCH ?
            ORDER BY rank
            "#,
        )
        .bind(expression.as_str())
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("Full-text query failed: {}", expression))?;

        Ok(rows.iter().map(|row| row.get::<String, _>("content_id")).collect())
    }

    async fn len(&self) -> Result<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM content_fts")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as usize)
    }
}

/// Opens an SQLite backend at the given path.
pub struct SqliteOpener;

#[async_trait]
impl FullTextOpener for SqliteOpener {
    async fn open(&self, path: &Path) -> Result<Arc<dyn FullTextIndex>> {
        Ok(Arc::new(SqliteFullTextIndex::open(path).await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reopen_keeps_documents() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("generation").join("crec.idx");

        {
            let index = SqliteFullTextIndex::open(&path).await?;
            index.index("0", "a title a summary").await?;
            index.pool.close().await;
        }

        let reopened = SqliteFullTextIndex::open(&path).await?;
        assert_eq!(reopened.len().await?, 1);
        assert_eq!(reopened.search("summary").await?, vec!["0".to_string()]);
        Ok(())
    }

    #[tokio::test]
    async fn test_required_and_excluded_terms() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let index = SqliteFullTextIndex::open(&dir.path().join("crec.idx")).await?;
        index.index("0", "rust async runtime").await?;
        index.index("1", "rust book").await?;

        let mut hits = index.search("rust").await?;
        hits.sort();
        assert_eq!(hits, vec!["0".to_string(), "1".to_string()]);
        assert_eq!(index.search("+book rust").await?, vec!["1".to_string()]);
        assert_eq!(index.search("rust -book").await?, vec!["0".to_string()]);
        assert!(index.search("-rust").await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_reindex_replaces_text() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let index = SqliteFullTextIndex::open(&dir.path().join("crec.idx")).await?;
        index.index("0", "old words").await?;
        index.index("0", "new words").await?;

        assert!(index.search("old").await?.is_empty());
        assert_eq!(index.search("new").await?, vec!["0".to_string()]);
        assert_eq!(index.len().await?, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_punctuation_only_query_matches_nothing() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let index = SqliteFullTextIndex::open(&dir.path().join("crec.idx")).await?;
        index.index("0", "anything").await?;

        assert!(index.search("!! ,").await?.is_empty());
        Ok(())
    }
}
