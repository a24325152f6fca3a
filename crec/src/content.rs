use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// Labels content for client-side display purposes (e.g. ordering).
///
/// Providers may send labels of their own; those pass through unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    #[default]
    Recommended,
    /// Boosted based on popularity.
    Promoted,
    /// Partner content.
    Sponsored,
    #[serde(untagged)]
    Other(String),
}

/// Treats an explicit `null` like a missing field.
fn nullable<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Unified representation of one item from any provider.
///
/// The serialized field names form the native JSON wire format accepted from
/// native and queue-based providers. `html` never leaves the process; the
/// locale fields are accepted on input but not echoed back to clients.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Content {
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "nullable")]
    pub id: String,

    /// Id of the provider this content was ingested from.
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "nullable")]
    pub source: String,

    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "nullable")]
    pub title: String,

    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "nullable")]
    pub url: String,

    #[serde(
        rename = "image_src",
        skip_serializing_if = "String::is_empty",
        deserialize_with = "nullable"
    )]
    pub image: String,

    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "nullable")]
    pub excerpt: String,

    #[serde(skip)]
    pub html: String,

    /// Why this content was recommended. Computed, never provider supplied.
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "nullable")]
    pub explanation: String,

    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "nullable")]
    pub author: String,

    #[serde(
        rename = "published_timestamp",
        skip_serializing_if = "String::is_empty",
        deserialize_with = "nullable"
    )]
    pub published: String,

    #[serde(skip_serializing_if = "Vec::is_empty", deserialize_with = "nullable")]
    pub tags: Vec<String>,

    #[serde(skip_serializing, deserialize_with = "nullable")]
    pub language: String,

    /// Empty means applicable to all regions.
    #[serde(skip_serializing, deserialize_with = "nullable")]
    pub regions: Vec<String>,

    #[serde(skip_serializing, deserialize_with = "nullable")]
    pub script: String,

    /// Domain name to affinity weight in [0, 1].
    #[serde(
        rename = "domain_affinities",
        skip_serializing_if = "HashMap::is_empty",
        deserialize_with = "nullable"
    )]
    pub domains: HashMap<String, f32>,

    #[serde(rename = "type", deserialize_with = "nullable")]
    pub content_type: ContentType,
}

impl fmt::Display for Content {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Source: {}: Title: {}", self.source, self.title)
    }
}

impl Content {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Sets the ingestion-time explanation derived from the item's own tags.
    pub fn with_tag_explanation(mut self) -> Self {
        if !self.tags.is_empty() {
            self.explanation = explanation_for(&self.tags.join(","));
        }
        self
    }
}

pub fn explanation_for(interests: &str) -> String {
    format!("Selected for users interested in {}", interests)
}

/// Keeps the content for which `predicate` holds, preserving order.
pub fn filter<F>(contents: &[Arc<Content>], predicate: F) -> Vec<Arc<Content>>
where
    F: Fn(&Content) -> bool,
{
    contents
        .iter()
        .filter(|c| {
            let content: &Content = c;
            predicate(content)
        })
        .cloned()
        .collect()
}

/// Retains content carrying any of the given (lower-cased) tags.
pub fn any_tag_filter(tags: HashSet<String>) -> impl Fn(&Content) -> bool {
    move |content: &Content| {
        content
            .tags
            .iter()
            .any(|t| tags.contains(&t.trim().to_lowercase()))
    }
}

/// Retains content carrying all of the given (lower-cased) tags.
pub fn all_tag_filter(tags: Vec<String>) -> impl Fn(&Content) -> bool {
    move |content: &Content| {
        let present: HashSet<String> = content
            .tags
            .iter()
            .map(|t| t.trim().to_lowercase())
            .collect();
        tags.iter().all(|t| present.contains(t))
    }
}

/// Applies `f` to a copy of every element; the source is left untouched.
pub fn transform<F>(contents: &[Arc<Content>], f: F) -> Vec<Arc<Content>>
where
    F: Fn(Content) -> Content,
{
    contents
        .iter()
        .map(|c| Arc::new(f(Content::clone(c))))
        .collect()
}
