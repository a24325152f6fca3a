use crate::content::Content;
use crate::parser::parse_native;
use crate::provider::Provider;
use crate::queue::queued_files;
use crate::traits::ContentSource;
use crate::types::Result;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

/// Push-based provider whose batches sit in the import queue.
///
/// A file that cannot be read or parsed is skipped on its own; only a queue
/// directory that cannot be listed fails the whole pull.
pub struct QueueSource {
    provider: Arc<Provider>,
    dir: PathBuf,
}

impl QueueSource {
    pub fn new(provider: Arc<Provider>, dir: PathBuf) -> Self {
        Self { provider, dir }
    }
}

#[async_trait]
impl ContentSource for QueueSource {
    fn provider_id(&self) -> &str {
        &self.provider.id
    }

    fn kind(&self) -> &'static str {
        "queue"
    }

    async fn pull(&self) -> Result<Vec<Content>> {
        let mut contents = Vec::new();

        for path in queued_files(&self.dir).await? {
            let bytes = match tokio::fs::read(&path).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(provider = %self.provider.id, "Skipping unreadable queue file {}: {}", path.display(), e);
                    continue;
                }
            };
            match parse_native(&bytes, &self.provider) {
                Ok(items) => {
                    debug!(provider = %self.provider.id, "Read {} items from {}", items.len(), path.display());
                    contents.extend(items);
                }
                Err(e) => {
                    warn!(provider = %self.provider.id, "Skipping malformed queue file {}: {}", path.display(), e);
                }
            }
        }

        Ok(contents)
    }
}
