use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use scraper::Html;

/// Full-text backend holding one generation of indexed content.
///
/// Documents are keyed by content id. Indexing an id a second time replaces
/// the earlier text. Backends are shared between the tasks building a
/// generation, so every method takes `&self`.
#[async_trait]
pub trait FullTextIndex: Send + Sync {
    async fn index(&self, id: &str, text: &str) -> Result<()>;

    /// Returns matching ids, best match first.
    ///
    /// Query strings use whitespace separated terms; `+term` is required and
    /// `-term` excluded.
    async fn search(&self, query: &str) -> Result<Vec<String>>;

    async fn len(&self) -> Result<usize>;
}

/// Opens (or creates) a full-text backend at a generation-specific path.
#[async_trait]
pub trait FullTextOpener: Send + Sync {
    async fn open(&self, path: &Path) -> Result<Arc<dyn FullTextIndex>>;
}

/// Processing context handed from one transform to the next.
///
/// `result` is a side channel for values discovered while transforming,
/// e.g. the `"image"` key set by an image extractor.
pub struct TransformContext {
    pub document: Html,
    pub result: HashMap<String, String>,
}

impl TransformContext {
    pub fn from_fragment(fragment: &str) -> Self {
        Self {
            document: Html::parse_fragment(fragment),
            result: HashMap::new(),
        }
    }

    /// Serialized HTML of the (possibly transformed) fragment.
    pub fn html(&self) -> String {
        self.document.root_element().inner_html()
    }
}

/// A single stage of a provider's content transform pipeline.
pub trait Transform: Send + Sync {
    fn name(&self) -> &str;

    fn process(&self, context: TransformContext) -> Result<TransformContext>;
}

// Object style note:
// Transforms are resolved by name once, when a provider is loaded, and then
// shared by every refresh cycle. Keep them stateless; anything discovered
// while processing belongs in `TransformContext::result`.
