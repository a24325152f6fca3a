use crate::content::{Content, ContentType};
use crate::provider::Provider;
use crate::transform::Transformed;
use crate::types::{CrecError, Result};
use feed_rs::model::{Entry, Link, Text};
use feed_rs::parser;
use tracing::{debug, info, warn};

// wide enough that excerpt paragraphs are not hard-wrapped
const EXCERPT_WIDTH: usize = 100_000;

/// Parses a native JSON array of content published by `provider`.
///
/// Items are attributed to the provider and inherit its domains and locale
/// when they declare none. Items that do not decode, or have no id, are
/// dropped one by one; only a payload that is not a JSON array fails.
pub fn parse_native(bytes: &[u8], provider: &Provider) -> Result<Vec<Content>> {
    let items: Vec<serde_json::Value> = serde_json::from_slice(bytes)
        .map_err(|e| CrecError::Parse(format!("Invalid content JSON from {}: {}", provider.id, e)))?;

    let total = items.len();
    let contents: Vec<Content> = items
        .into_iter()
        .enumerate()
        .filter_map(|(position, value)| match serde_json::from_value::<Content>(value) {
            Ok(item) if item.id.trim().is_empty() => {
                warn!(provider = %provider.id, position, "Skipping content without id");
                None
            }
            Ok(item) => Some(item),
            Err(e) => {
                warn!(provider = %provider.id, position, "Skipping malformed content: {}", e);
                None
            }
        })
        .map(|item| apply_provider_defaults(item, provider))
        .collect();

    debug!(provider = %provider.id, "Parsed {} of {} native items", contents.len(), total);
    Ok(contents)
}

fn apply_provider_defaults(mut item: Content, provider: &Provider) -> Content {
    item.source = provider.id.clone();
    if item.domains.is_empty() {
        item.domains = provider.domains.clone();
    }
    if item.language.is_empty() {
        item.language = provider.language.clone();
    }
    if item.regions.is_empty() {
        item.regions = provider.regions.clone();
    }
    if item.script.is_empty() {
        item.script = provider.script.clone();
    }
    item.with_tag_explanation()
}

/// Raw item of a syndication feed, before the provider's transforms ran.
#[derive(Debug, Clone, Default)]
pub struct FeedItem {
    pub id: String,
    pub title: String,
    pub url: String,
    pub html: String,
    pub author: String,
    pub published: String,
    pub categories: Vec<String>,
    /// Image declared through media extensions, if any.
    pub media_image: Option<String>,
}

/// Parses an RSS or Atom document. Entries without a guid are identified by
/// their first link.
pub fn parse_feed(bytes: &[u8]) -> Result<Vec<FeedItem>> {
    let parser = parser::Builder::new()
        .id_generator(|links: &[Link], _title: &Option<Text>, _uri: Option<&str>| {
            links.first().map(|l| l.href.clone()).unwrap_or_default()
        })
        .build();

    let feed = parser
        .parse(bytes)
        .map_err(|e| CrecError::Parse(format!("Failed to parse feed: {}", e)))?;

    let items: Vec<FeedItem> = feed.entries.into_iter().map(feed_item).collect();
    info!("Parsed feed with {} entries", items.len());
    Ok(items)
}

fn feed_item(entry: Entry) -> FeedItem {
    let url = entry
        .links
        .first()
        .map(|l| l.href.clone())
        .unwrap_or_default();

    let html = entry
        .summary
        .map(|s| s.content)
        .or_else(|| entry.content.and_then(|c| c.body))
        .unwrap_or_default();

    let media_image = entry
        .media
        .iter()
        .flat_map(|m| m.content.iter())
        .find_map(|c| c.url.as_ref().map(|u| u.to_string()))
        .or_else(|| {
            entry
                .media
                .iter()
                .flat_map(|m| m.thumbnails.iter())
                .map(|t| t.image.uri.clone())
                .find(|uri| !uri.is_empty())
        });

    FeedItem {
        id: entry.id,
        title: entry.title.map(|t| t.content).unwrap_or_default(),
        url,
        html,
        author: entry
            .authors
            .first()
            .map(|a| a.name.clone())
            .unwrap_or_default(),
        published: entry
            .published
            .or(entry.updated)
            .map(|dt| dt.to_rfc3339())
            .unwrap_or_default(),
        categories: entry.categories.into_iter().map(|c| c.term).collect(),
        media_image,
    }
}

/// Plain-text rendering of an HTML fragment.
pub fn excerpt(html: &str) -> Result<String> {
    let text = html2text::from_read(html.as_bytes(), EXCERPT_WIDTH)
        .map_err(|e| CrecError::Parse(format!("Failed to render excerpt: {}", e)))?;
    Ok(text.trim().to_string())
}

/// Builds content from a feed item and the output of the provider's
/// transform pipeline.
pub fn content_from_feed_item(
    item: FeedItem,
    transformed: Transformed,
    provider: &Provider,
) -> Result<Content> {
    let excerpt = excerpt(&transformed.html)?;
    let image = item
        .media_image
        .or_else(|| transformed.result.get("image").cloned())
        .unwrap_or_default();

    let mut tags = item.categories;
    tags.extend(provider.categories.iter().cloned());

    let content = Content {
        id: item.id,
        source: provider.id.clone(),
        title: item.title,
        url: item.url,
        image,
        excerpt,
        html: item.html,
        author: item.author,
        published: item.published,
        tags,
        language: provider.language.clone(),
        regions: provider.regions.clone(),
        script: provider.script.clone(),
        domains: provider.domains.clone(),
        content_type: ContentType::Recommended,
        ..Content::default()
    };
    Ok(content.with_tag_explanation())
}
