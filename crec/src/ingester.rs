use crate::config::Config;
use crate::content::Content;
use crate::fetcher::Fetcher;
use crate::index::{index_full_text, Index};
use crate::provider::{Provider, Providers};
use crate::sources::source_for;
use crate::types::Result;
use crate::utils::needs_refresh;
use chrono::Utc;
use futures::future::join_all;
use interfaces::FullTextOpener;
use std::io::ErrorKind;
use std::sync::Arc;
use std::time::Instant;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Builds new index generations from the configured providers.
pub struct Ingester {
    config: Config,
    fetcher: Fetcher,
    opener: Arc<dyn FullTextOpener>,
}

impl Ingester {
    pub fn new(config: Config, opener: Arc<dyn FullTextOpener>) -> Result<Self> {
        let fetcher = Fetcher::new(config.fetch.clone())?;
        Ok(Self {
            config,
            fetcher,
            opener,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Builds the next generation from `previous`.
    ///
    /// Providers are refreshed concurrently, one task each, and the call
    /// returns only once every task has finished. A failing provider keeps
    /// its content from `previous`; it never fails the refresh. The only
    /// error is failing to create the new generation itself.
    pub async fn refresh(&self, providers: &Providers, previous: &Index) -> Result<Index> {
        let start_time = Instant::now();
        self.clean_up(previous).await;

        let index = Index::create(&self.config, self.opener.as_ref()).await?;
        info!(
            generation = %index.id(),
            providers = providers.len(),
            "Starting refresh"
        );

        let index = Mutex::new(index);
        let tasks = providers
            .iter()
            .map(|provider| self.refresh_provider(provider.clone(), previous, &index));
        join_all(tasks).await;

        let mut index = index.into_inner();
        index.preload_locales(&self.config.locales);

        info!(
            generation = %index.id(),
            items = index.len(),
            "Refresh complete in {}ms",
            start_time.elapsed().as_millis()
        );
        Ok(index)
    }

    async fn refresh_provider(&self, provider: Arc<Provider>, previous: &Index, index: &Mutex<Index>) {
        if !provider.is_queued() {
            let last_updated = previous.provider_last_updated(&provider.id);
            let due = needs_refresh(
                last_updated,
                Utc::now(),
                self.config.refresh_interval(),
                provider.max_content_age_minutes,
            );
            if !due {
                info!(provider = %provider.id, "Reusing content");
                carry_over(index, previous, &provider.id).await;
                return;
            }
        }

        let source = source_for(provider.clone(), &self.fetcher, &self.config);
        debug!(provider = source.provider_id(), kind = source.kind(), "Refreshing content");

        match source.pull().await {
            Ok(contents) => {
                let count = contents.len();
                let contents: Vec<Arc<Content>> = contents.into_iter().map(Arc::new).collect();
                {
                    let mut index = index.lock().await;
                    if !provider.is_queued() {
                        index.set_provider_last_updated(&provider.id);
                    }
                }
                add_contents(index, source.provider_id(), contents).await;
                info!(provider = source.provider_id(), items = count, "Refreshed content");
            }
            Err(e) => {
                warn!(provider = source.provider_id(), "Failed to refresh content, keeping previous: {}", e);
                carry_over(index, previous, &provider.id).await;
            }
        }
    }

    /// Removes full-text directories of every generation but `previous`.
    async fn clean_up(&self, previous: &Index) {
        let dir = &self.config.full_text_index_dir;
        let mut entries = match fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return,
            Err(e) => {
                warn!("Failed to list index directory {}: {}", dir.display(), e);
                return;
            }
        };

        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    warn!("Failed to list index directory {}: {}", dir.display(), e);
                    break;
                }
            };
            if entry.file_name().to_string_lossy() == previous.id() {
                continue;
            }

            let path = entry.path();
            let removed = match entry.file_type().await {
                Ok(file_type) if file_type.is_dir() => fs::remove_dir_all(&path).await,
                _ => fs::remove_file(&path).await,
            };
            match removed {
                Ok(()) => debug!("Removed stale index {}", path.display()),
                Err(e) => warn!("Failed to clean up old index {}: {}", path.display(), e),
            }
        }
    }
}

/// Adds content to the in-memory structures under the lock, then to the
/// full-text backend once the lock is released.
async fn add_contents(index: &Mutex<Index>, provider_id: &str, contents: Vec<Arc<Content>>) {
    let count = contents.len();
    let full_text = {
        let mut index = index.lock().await;
        for content in &contents {
            index.insert(content.clone());
        }
        index.full_text()
    };

    if let Some(full_text) = full_text {
        if let Err(e) = index_full_text(full_text.as_ref(), &contents).await {
            error!(provider = %provider_id, "Full-text indexing failed: {}", e);
        }
    }
    debug!(provider = %provider_id, items = count, "Indexed content");
}

/// Copies a provider's content and last update from the previous generation.
async fn carry_over(index: &Mutex<Index>, previous: &Index, provider_id: &str) {
    if let Some(last_updated) = previous.provider_last_updated(provider_id) {
        index
            .lock()
            .await
            .set_provider_last_updated_at(provider_id, last_updated);
    }
    let contents = previous.provider_content(provider_id).to_vec();
    add_contents(index, provider_id, contents).await;
}
