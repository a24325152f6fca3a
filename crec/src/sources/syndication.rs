use crate::content::Content;
use crate::fetcher::Fetcher;
use crate::parser::{content_from_feed_item, parse_feed, FeedItem};
use crate::provider::Provider;
use crate::traits::ContentSource;
use crate::types::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

/// Provider publishing an RSS or Atom feed. Every item goes through the
/// provider's transform pipeline before it becomes content.
pub struct SyndicationSource {
    provider: Arc<Provider>,
    fetcher: Fetcher,
}

impl SyndicationSource {
    pub fn new(provider: Arc<Provider>, fetcher: Fetcher) -> Self {
        Self { provider, fetcher }
    }

    fn convert(&self, item: FeedItem) -> Result<Content> {
        let transformed = self.provider.pipeline().run(&item.html)?;
        content_from_feed_item(item, transformed, &self.provider)
    }
}

#[async_trait]
impl ContentSource for SyndicationSource {
    fn provider_id(&self) -> &str {
        &self.provider.id
    }

    fn kind(&self) -> &'static str {
        "syndication"
    }

    async fn pull(&self) -> Result<Vec<Content>> {
        let body = self.fetcher.fetch(&self.provider.content_url).await?;
        let items = parse_feed(&body)?;
        let total = items.len();

        let mut contents = Vec::with_capacity(total);
        for item in items {
            if item.id.trim().is_empty() {
                warn!(provider = %self.provider.id, "Skipping feed item without guid or link");
                continue;
            }
            let id = item.id.clone();
            match self.convert(item) {
                Ok(content) => contents.push(content),
                Err(e) => warn!(provider = %self.provider.id, "Skipping feed item {}: {}", id, e),
            }
        }

        info!(
            provider = %self.provider.id,
            "Pulled {} of {} feed items",
            contents.len(),
            total
        );
        Ok(contents)
    }
}
