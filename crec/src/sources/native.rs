use crate::content::Content;
use crate::fetcher::Fetcher;
use crate::parser::parse_native;
use crate::provider::Provider;
use crate::traits::ContentSource;
use crate::types::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

/// Provider publishing a JSON array of content over HTTP.
pub struct NativeSource {
    provider: Arc<Provider>,
    fetcher: Fetcher,
}

impl NativeSource {
    pub fn new(provider: Arc<Provider>, fetcher: Fetcher) -> Self {
        Self { provider, fetcher }
    }
}

#[async_trait]
impl ContentSource for NativeSource {
    fn provider_id(&self) -> &str {
        &self.provider.id
    }

    fn kind(&self) -> &'static str {
        "native"
    }

    async fn pull(&self) -> Result<Vec<Content>> {
        let body = self.fetcher.fetch(&self.provider.content_url).await?;
        let contents = parse_native(&body, &self.provider)?;
        info!(provider = %self.provider.id, "Pulled {} native items", contents.len());
        Ok(contents)
    }
}
