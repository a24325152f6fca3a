use crate::config::Config;
use crate::content::Content;
use crate::locale::parse_accept_language;
use crate::types::{CrecError, Result};
use chrono::{DateTime, Utc};
use interfaces::{FullTextIndex, FullTextOpener};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Bucket key for content that declares no value for a locale dimension.
pub const ANY: &str = "any";

/// One generation of indexed content.
///
/// Built by a single refresh cycle through `&mut self` methods, then shared
/// read-only behind an `Arc` once published. Nothing mutates a generation
/// after that point.
pub struct Index {
    id: String,
    all: Vec<Arc<Content>>,
    by_id: HashMap<String, Arc<Content>>,
    by_provider: HashMap<String, Vec<Arc<Content>>>,
    by_language: HashMap<String, Vec<Arc<Content>>>,
    by_region: HashMap<String, Vec<Arc<Content>>>,
    by_script: HashMap<String, Vec<Arc<Content>>>,
    by_tag: HashMap<String, Vec<Arc<Content>>>,
    localized: HashMap<String, Vec<Arc<Content>>>,
    provider_last_updated: HashMap<String, DateTime<Utc>>,
    full_text: Option<Arc<dyn FullTextIndex>>,
}

impl fmt::Debug for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Index")
            .field("id", &self.id)
            .field("content", &self.all.len())
            .field("providers", &self.by_provider.len())
            .field("full_text", &self.full_text.is_some())
            .finish()
    }
}

impl Index {
    /// Creates an empty generation with a fresh id. When full-text indexing
    /// is enabled the backend is opened under a directory named after the id.
    pub async fn create(config: &Config, opener: &dyn FullTextOpener) -> Result<Self> {
        let id = Uuid::new_v4().to_string();

        let full_text = if config.full_text_index {
            let path = config.full_text_index_path(&id);
            debug!("Opening full-text index at {}", path.display());
            Some(opener.open(&path).await.map_err(CrecError::FullText)?)
        } else {
            None
        };

        Ok(Self::build(id, full_text))
    }

    /// Empty generation without a full-text backend.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self::build(id.into(), None)
    }

    pub fn with_full_text(id: impl Into<String>, full_text: Arc<dyn FullTextIndex>) -> Self {
        Self::build(id.into(), Some(full_text))
    }

    fn build(id: String, full_text: Option<Arc<dyn FullTextIndex>>) -> Self {
        Self {
            id,
            all: Vec::new(),
            by_id: HashMap::new(),
            by_provider: HashMap::new(),
            by_language: HashMap::new(),
            by_region: HashMap::new(),
            by_script: HashMap::new(),
            by_tag: HashMap::new(),
            localized: HashMap::new(),
            provider_last_updated: HashMap::new(),
            full_text,
        }
    }

    /// Unique generation id, usable as a cache validator.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn content(&self) -> &[Arc<Content>] {
        &self.all
    }

    pub fn len(&self) -> usize {
        self.all.len()
    }

    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }

    pub fn has_full_text(&self) -> bool {
        self.full_text.is_some()
    }

    /// Handle to the full-text backend, for indexing without holding the
    /// generation itself.
    pub fn full_text(&self) -> Option<Arc<dyn FullTextIndex>> {
        self.full_text.clone()
    }

    pub fn get(&self, id: &str) -> Option<&Arc<Content>> {
        self.by_id.get(id)
    }

    /// Adds one item to every in-memory lookup structure. The full-text
    /// backend is left alone; see [`Index::add`].
    pub fn insert<C: Into<Arc<Content>>>(&mut self, content: C) -> Arc<Content> {
        let content = content.into();

        self.all.push(content.clone());
        self.by_id.insert(content.id.clone(), content.clone());
        self.by_provider
            .entry(content.source.clone())
            .or_default()
            .push(content.clone());

        for tag in &content.tags {
            self.by_tag
                .entry(tag.trim().to_lowercase())
                .or_default()
                .push(content.clone());
        }

        if content.regions.is_empty() {
            bucket(&mut self.by_region, "", &content);
        } else {
            for region in &content.regions {
                bucket(&mut self.by_region, region, &content);
            }
        }
        bucket(&mut self.by_language, &content.language, &content);
        bucket(&mut self.by_script, &content.script, &content);

        content
    }

    /// Adds one item to every lookup structure, then to the full-text backend.
    ///
    /// In-memory indexing always completes; only a full-text failure is
    /// reported, and the caller decides what to do about it.
    pub async fn add<C: Into<Arc<Content>>>(&mut self, content: C) -> Result<()> {
        let content = self.insert(content);
        match self.full_text.as_deref() {
            Some(full_text) => index_full_text(full_text, &[content]).await,
            None => Ok(()),
        }
    }

    /// Adds every item in order. All items reach the in-memory structures;
    /// the first full-text failure, if any, is returned.
    pub async fn add_all<I>(&mut self, contents: I) -> Result<()>
    where
        I: IntoIterator<Item = Arc<Content>>,
    {
        let contents: Vec<Arc<Content>> = contents.into_iter().map(|c| self.insert(c)).collect();
        match self.full_text.as_deref() {
            Some(full_text) => index_full_text(full_text, &contents).await,
            None => Ok(()),
        }
    }

    /// Full-text query. Hits no longer present in this generation are
    /// dropped. Empty when full-text indexing is disabled.
    pub async fn query(&self, text: &str) -> Result<Vec<Arc<Content>>> {
        let Some(full_text) = self.full_text.as_ref() else {
            return Ok(Vec::new());
        };

        let hits = full_text.search(text).await?;
        Ok(hits
            .iter()
            .filter_map(|id| self.by_id.get(id).cloned())
            .collect())
    }

    /// Content matching the given Accept-Language header on language, region
    /// and script at once. An empty or unparseable header yields everything.
    pub fn localized_content(&self, accept_language: &str) -> Vec<Arc<Content>> {
        if let Some(cached) = self.localized.get(accept_language) {
            return cached.clone();
        }

        let tags = parse_accept_language(accept_language);
        if tags.is_empty() {
            return self.all.clone();
        }

        let mut languages = pool(&self.by_language, ANY);
        let mut regions = pool(&self.by_region, ANY);
        let mut scripts = pool(&self.by_script, ANY);
        for tag in &tags {
            languages.extend(pool(&self.by_language, &tag.language));
            if let Some(region) = &tag.region {
                regions.extend(pool(&self.by_region, region));
            }
            if let Some(script) = &tag.script {
                scripts.extend(pool(&self.by_script, script));
            }
        }

        self.all
            .iter()
            .filter(|c| {
                let key = Arc::as_ptr(c);
                languages.contains(&key) && regions.contains(&key) && scripts.contains(&key)
            })
            .cloned()
            .collect()
    }

    /// Computes and caches localized content for each comma-separated locale.
    pub fn preload_locales(&mut self, locales: &str) {
        for locale in locales.split(',') {
            let content = self.localized_content(locale);
            debug!("Preloaded {} items for locale {:?}", content.len(), locale);
            self.localized.insert(locale.to_string(), content);
        }
    }

    pub fn provider_content(&self, provider_id: &str) -> &[Arc<Content>] {
        self.by_provider
            .get(provider_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn tagged_content(&self, tag: &str) -> &[Arc<Content>] {
        self.by_tag
            .get(&tag.trim().to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Last successful refresh of the provider, `None` if never refreshed.
    pub fn provider_last_updated(&self, provider_id: &str) -> Option<DateTime<Utc>> {
        self.provider_last_updated.get(provider_id).copied()
    }

    pub fn set_provider_last_updated(&mut self, provider_id: &str) {
        self.set_provider_last_updated_at(provider_id, Utc::now());
    }

    pub fn set_provider_last_updated_at(&mut self, provider_id: &str, at: DateTime<Utc>) {
        if provider_id.is_empty() {
            warn!("Ignoring last-updated timestamp for empty provider id");
            return;
        }
        self.provider_last_updated.insert(provider_id.to_string(), at);
    }
}

/// Indexes title and excerpt of every item. Every item is attempted; the
/// first failure is returned.
pub async fn index_full_text(full_text: &dyn FullTextIndex, contents: &[Arc<Content>]) -> Result<()> {
    let mut first_error = None;
    for content in contents {
        let text = format!("{} {}", content.title, content.excerpt);
        if let Err(e) = full_text.index(&content.id, &text).await {
            if first_error.is_none() {
                first_error = Some(CrecError::FullText(e));
            }
        }
    }
    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn bucket(map: &mut HashMap<String, Vec<Arc<Content>>>, value: &str, content: &Arc<Content>) {
    let key = value.trim().to_lowercase();
    let key = if key.is_empty() { ANY.to_string() } else { key };
    map.entry(key).or_default().push(content.clone());
}

fn pool(map: &HashMap<String, Vec<Arc<Content>>>, key: &str) -> HashSet<*const Content> {
    map.get(key)
        .map(|items| items.iter().map(Arc::as_ptr).collect())
        .unwrap_or_default()
}
