use crate::config::Config;
use crate::content::{all_tag_filter, any_tag_filter, explanation_for, filter, transform, Content};
use crate::index::Index;
use crate::types::{CrecError, Result};
use crate::utils::cache_control_header;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Request parameters understood by the recommenders. Empty means absent.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RecommendParams {
    /// Tag expression: `a,b` matches any tag, `a b` matches all of them.
    pub tags: String,
    pub query: String,
    pub provider: String,
    pub accept_language: String,
}

impl RecommendParams {
    pub fn with_tags(mut self, tags: &str) -> Self {
        self.tags = tags.to_string();
        self
    }

    pub fn with_query(mut self, query: &str) -> Self {
        self.query = query.to_string();
        self
    }

    pub fn with_provider(mut self, provider: &str) -> Self {
        self.provider = provider.to_string();
        self
    }

    pub fn with_accept_language(mut self, accept_language: &str) -> Self {
        self.accept_language = accept_language.to_string();
        self
    }
}

/// A strategy selecting content from one index generation.
#[async_trait]
pub trait Recommender: Send + Sync {
    fn name(&self) -> &str;

    async fn recommend(&self, index: &Index, params: &RecommendParams) -> Result<Vec<Arc<Content>>>;
}

/// Selects content by tag expression among the content matching the
/// request's locale.
pub struct TagRecommender;

#[async_trait]
impl Recommender for TagRecommender {
    fn name(&self) -> &str {
        "tags"
    }

    async fn recommend(&self, index: &Index, params: &RecommendParams) -> Result<Vec<Arc<Content>>> {
        let expression = params.tags.as_str();
        if expression.trim().is_empty() {
            return Ok(Vec::new());
        }

        let candidates = index.localized_content(&params.accept_language);
        let matched = if expression.contains(',') || !expression.contains(' ') {
            let tags: HashSet<String> = split_tags(expression, ',').into_iter().collect();
            filter(&candidates, any_tag_filter(tags))
        } else {
            filter(&candidates, all_tag_filter(split_tags(expression, ' ')))
        };

        let explanation = explanation_for(expression);
        Ok(transform(&matched, |mut content| {
            content.explanation = explanation.clone();
            content
        }))
    }
}

fn split_tags(expression: &str, separator: char) -> Vec<String> {
    expression
        .split(separator)
        .map(|tag| tag.trim().to_lowercase())
        .filter(|tag| !tag.is_empty())
        .collect()
}

/// Full-text search over the index.
pub struct QueryRecommender;

#[async_trait]
impl Recommender for QueryRecommender {
    fn name(&self) -> &str {
        "query"
    }

    async fn recommend(&self, index: &Index, params: &RecommendParams) -> Result<Vec<Arc<Content>>> {
        if params.query.trim().is_empty() {
            return Ok(Vec::new());
        }
        index.query(&params.query).await
    }
}

/// Everything a single provider currently offers.
pub struct ProviderRecommender;

#[async_trait]
impl Recommender for ProviderRecommender {
    fn name(&self) -> &str {
        "provider"
    }

    async fn recommend(&self, index: &Index, params: &RecommendParams) -> Result<Vec<Arc<Content>>> {
        if params.provider.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(index.provider_content(params.provider.trim()).to_vec())
    }
}

/// Content matching an explicitly requested locale. Without a locale it
/// contributes nothing.
pub struct LocaleRecommender;

#[async_trait]
impl Recommender for LocaleRecommender {
    fn name(&self) -> &str {
        "locale"
    }

    async fn recommend(&self, index: &Index, params: &RecommendParams) -> Result<Vec<Arc<Content>>> {
        if params.accept_language.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(index.localized_content(&params.accept_language))
    }
}

type RecommenderFactory = fn() -> Box<dyn Recommender>;

fn tags() -> Box<dyn Recommender> {
    Box::new(TagRecommender)
}

fn query() -> Box<dyn Recommender> {
    Box::new(QueryRecommender)
}

fn provider() -> Box<dyn Recommender> {
    Box::new(ProviderRecommender)
}

fn locale() -> Box<dyn Recommender> {
    Box::new(LocaleRecommender)
}

const REGISTRY: &[(&str, RecommenderFactory)] = &[
    ("tags", tags),
    ("query", query),
    ("provider", provider),
    ("locale", locale),
];

pub fn create_recommender(name: &str) -> Result<Box<dyn Recommender>> {
    REGISTRY
        .iter()
        .find(|(registered, _)| *registered == name.trim())
        .map(|(_, factory)| factory())
        .ok_or_else(|| CrecError::UnknownRecommender {
            name: name.to_string(),
        })
}

/// Merged output of a recommender set.
#[derive(Debug, Clone, Default)]
pub struct Recommendations {
    pub contents: Vec<Arc<Content>>,
    /// Set when at least one recommender failed and was left out.
    pub had_errors: bool,
}

impl Recommendations {
    pub fn len(&self) -> usize {
        self.contents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.contents.iter().map(|c| c.id.as_str()).collect()
    }

    /// Client caching is only allowed for complete responses.
    pub fn cache_control(&self, config: &Config) -> Option<String> {
        if self.had_errors {
            None
        } else {
            Some(cache_control_header(config.client_cache_max_age_seconds))
        }
    }
}

/// Recommenders run in declaration order against one generation.
#[derive(Default)]
pub struct RecommenderSet {
    recommenders: Vec<Box<dyn Recommender>>,
}

impl fmt::Debug for RecommenderSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.recommenders.iter().map(|r| r.name()))
            .finish()
    }
}

impl RecommenderSet {
    pub fn new(recommenders: Vec<Box<dyn Recommender>>) -> Self {
        Self { recommenders }
    }

    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        let recommenders = names
            .iter()
            .map(|name| create_recommender(name.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(recommenders))
    }

    pub fn len(&self) -> usize {
        self.recommenders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recommenders.is_empty()
    }

    /// Concatenates every recommender's result and keeps the first
    /// occurrence of each id. Failing recommenders are skipped.
    pub async fn recommend(&self, index: &Index, params: &RecommendParams) -> Recommendations {
        let mut recommendations = Recommendations::default();
        let mut seen = HashSet::new();

        for recommender in &self.recommenders {
            match recommender.recommend(index, params).await {
                Ok(contents) => {
                    debug!(recommender = recommender.name(), items = contents.len(), "Recommended");
                    for content in contents {
                        if seen.insert(content.id.clone()) {
                            recommendations.contents.push(content);
                        }
                    }
                }
                Err(e) => {
                    warn!(recommender = recommender.name(), "Recommender failed: {}", e);
                    recommendations.had_errors = true;
                }
            }
        }

        recommendations
    }
}
