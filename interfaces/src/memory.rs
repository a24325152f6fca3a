use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::defs::{FullTextIndex, FullTextOpener};
use crate::query::{Occur, Query, tokenize};

#[derive(Default)]
struct Postings {
    ids: Vec<String>,
    ordinals: HashMap<String, usize>,
    tokens: Vec<HashSet<String>>,
    postings: HashMap<String, BTreeSet<usize>>,
}

impl Postings {
    fn insert(&mut self, id: &str, text: &str) {
        let tokens = tokenize(text);

        let ordinal = match self.ordinals.get(id) {
            Some(&ordinal) => {
                for old in &self.tokens[ordinal] {
                    if let Some(set) = self.postings.get_mut(old) {
                        set.remove(&ordinal);
                    }
                }
                ordinal
            }
            None => {
                let ordinal = self.ids.len();
                self.ids.push(id.to_string());
                self.ordinals.insert(id.to_string(), ordinal);
                self.tokens.push(HashSet::new());
                ordinal
            }
        };

        for token in &tokens {
            self.postings.entry(token.clone()).or_default().insert(ordinal);
        }
        self.tokens[ordinal] = tokens;
    }

    fn search(&self, query: &Query) -> Vec<String> {
        let mut scores: HashMap<usize, usize> = HashMap::new();
        for (occur, token) in &query.terms {
            if *occur == Occur::MustNot {
                continue;
            }
            if let Some(docs) = self.postings.get(token) {
                for &doc in docs {
                    *scores.entry(doc).or_insert(0) += 1;
                }
            }
        }

        let mut hits: Vec<(usize, usize)> = scores
            .into_iter()
            .filter(|(doc, _)| {
                let tokens = &self.tokens[*doc];
                query.with(Occur::Must).all(|t| tokens.contains(t))
                    && query.with(Occur::MustNot).all(|t| !tokens.contains(t))
            })
            .collect();

        hits.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        hits.into_iter().map(|(doc, _)| self.ids[doc].clone()).collect()
    }
}

/// Inverted index kept entirely in memory. Nothing survives the process;
/// meant for tests and for deployments that do not need persistence.
#[derive(Default)]
pub struct MemoryFullTextIndex {
    inner: RwLock<Postings>,
}

impl MemoryFullTextIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FullTextIndex for MemoryFullTextIndex {
    async fn index(&self, id: &str, text: &str) -> Result<()> {
        self.inner.write().await.insert(id, text);
        Ok(())
    }

    async fn search(&self, query: &str) -> Result<Vec<String>> {
        Ok(self.inner.read().await.search(&Query::parse(query)))
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.inner.read().await.ids.len())
    }
}

/// Opens a fresh in-memory backend, ignoring the path.
pub struct MemoryOpener;

#[async_trait]
impl FullTextOpener for MemoryOpener {
    async fn open(&self, _path: &Path) -> Result<Arc<dyn FullTextIndex>> {
        Ok(Arc::new(MemoryFullTextIndex::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_search_ranks_by_matching_terms() -> Result<()> {
        let index = MemoryFullTextIndex::new();
        index.index("0", "rust async runtime").await?;
        index.index("1", "rust book").await?;

        let hits = index.search("rust async").await?;
        assert_eq!(hits, vec!["0".to_string(), "1".to_string()]);
        Ok(())
    }

    #[tokio::test]
    async fn test_search_required_and_excluded_terms() -> Result<()> {
        let index = MemoryFullTextIndex::new();
        index.index("0", "rust async runtime").await?;
        index.index("1", "rust book").await?;

        assert_eq!(index.search("+book rust").await?, vec!["1".to_string()]);
        assert_eq!(index.search("rust -book").await?, vec!["0".to_string()]);
        Ok(())
    }

    #[tokio::test]
    async fn test_reindex_replaces_text() -> Result<()> {
        let index = MemoryFullTextIndex::new();
        index.index("0", "old words").await?;
        index.index("0", "new words").await?;

        assert!(index.search("old").await?.is_empty());
        assert_eq!(index.search("new").await?, vec!["0".to_string()]);
        assert_eq!(index.len().await?, 1);
        Ok(())
    }
}
