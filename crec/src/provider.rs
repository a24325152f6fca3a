use crate::transform::Pipeline;
use crate::types::{CrecError, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Static description of one upstream content provider.
///
/// A provider without a content URL is push based: its content arrives
/// through the import queue. Everything else is pulled over HTTP, either as
/// native JSON or as a syndication feed.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Provider {
    pub id: String,
    pub content_url: String,
    pub native: bool,
    pub categories: Vec<String>,
    pub transforms: Vec<String>,
    pub language: String,
    pub regions: Vec<String>,
    pub script: String,
    pub max_content_age_minutes: i64,
    pub domains: HashMap<String, f32>,

    #[serde(skip)]
    pipeline: Pipeline,
}

impl Provider {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_content_url(mut self, url: impl Into<String>) -> Self {
        self.content_url = url.into();
        self
    }

    pub fn with_native(mut self, native: bool) -> Self {
        self.native = native;
        self
    }

    pub fn with_categories(mut self, categories: &[&str]) -> Self {
        self.categories = categories.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn with_transforms(mut self, transforms: &[&str]) -> Self {
        self.transforms = transforms.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn with_locale(mut self, language: &str, regions: &[&str], script: &str) -> Self {
        self.language = language.to_string();
        self.regions = regions.iter().map(|r| r.to_string()).collect();
        self.script = script.to_string();
        self
    }

    pub fn with_max_content_age(mut self, minutes: i64) -> Self {
        self.max_content_age_minutes = minutes;
        self
    }

    pub fn with_domain(mut self, domain: &str, affinity: f32) -> Self {
        self.domains.insert(domain.to_string(), affinity);
        self
    }

    pub fn is_queued(&self) -> bool {
        self.content_url.trim().is_empty()
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Resolves the declared transform names against the registry.
    fn resolve(mut self) -> Result<Self> {
        if self.id.trim().is_empty() {
            return Err(CrecError::Config("Provider id must not be empty".to_string()));
        }
        self.pipeline = Pipeline::from_names(self.transforms.as_slice())?;
        Ok(self)
    }
}

/// The configured providers in declaration order.
#[derive(Debug, Clone, Default)]
pub struct Providers {
    ordered: Vec<Arc<Provider>>,
    by_id: HashMap<String, Arc<Provider>>,
}

impl Providers {
    pub fn new(providers: Vec<Provider>) -> Result<Self> {
        let mut registry = Self::default();
        for provider in providers {
            let provider = Arc::new(provider.resolve()?);
            if registry.by_id.contains_key(&provider.id) {
                return Err(CrecError::Config(format!(
                    "Duplicate provider id {}",
                    provider.id
                )));
            }
            debug!(
                provider = %provider.id,
                queued = provider.is_queued(),
                transforms = provider.pipeline().len(),
                "Registered provider"
            );
            registry.by_id.insert(provider.id.clone(), provider.clone());
            registry.ordered.push(provider);
        }
        Ok(registry)
    }

    /// Parses a JSON array of provider descriptors.
    pub fn from_json(json: &str) -> Result<Self> {
        let providers: Vec<Provider> = serde_json::from_str(json)?;
        Self::new(providers)
    }

    pub fn get(&self, id: &str) -> Option<&Arc<Provider>> {
        self.by_id.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Provider>> {
        self.ordered.iter()
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }
}
