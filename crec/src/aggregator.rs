use crate::config::Config;
use crate::index::Index;
use crate::ingester::Ingester;
use crate::provider::Providers;
use crate::publisher::Publisher;
use crate::queue;
use crate::recommender::{RecommendParams, RecommenderSet, Recommendations};
use crate::types::{CrecError, Result};
use interfaces::FullTextOpener;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Content service: keeps a published index fresh and answers
/// recommendation requests from it.
pub struct ContentAggregator {
    config: Config,
    providers: Providers,
    ingester: Ingester,
    publisher: Publisher,
    recommenders: RecommenderSet,
    refresh_lock: Mutex<()>,
}

impl ContentAggregator {
    pub fn new(
        config: Config,
        providers: Providers,
        opener: Arc<dyn FullTextOpener>,
    ) -> Result<Self> {
        config.validate()?;
        let recommenders = RecommenderSet::from_names(config.recommenders.as_slice())?;
        let ingester = Ingester::new(config.clone(), opener)?;

        info!(
            providers = providers.len(),
            recommenders = ?recommenders,
            "Created content aggregator"
        );

        Ok(Self {
            config,
            providers,
            ingester,
            publisher: Publisher::default(),
            recommenders,
            refresh_lock: Mutex::new(()),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn providers(&self) -> &Providers {
        &self.providers
    }

    /// The generation currently served.
    pub fn current(&self) -> Arc<Index> {
        self.publisher.get()
    }

    /// Validator for client caches: the id of the served generation.
    pub fn etag(&self) -> String {
        self.publisher.get().id().to_string()
    }

    /// Builds a new generation and publishes it. Concurrent calls are
    /// serialized so each refresh starts from the latest published index.
    pub async fn refresh(&self) -> Result<Arc<Index>> {
        let _guard = self.refresh_lock.lock().await;

        let previous = self.publisher.get();
        let index = Arc::new(self.ingester.refresh(&self.providers, &previous).await?);
        self.publisher.set(index.clone());
        Ok(index)
    }

    pub async fn recommend(&self, params: &RecommendParams) -> Recommendations {
        let index = self.publisher.get();
        self.recommenders.recommend(&index, params).await
    }

    /// Queues a JSON content batch for a push-based provider.
    pub async fn enqueue(&self, provider_id: &str, payload: &[u8]) -> Result<PathBuf> {
        if !self.providers.contains(provider_id) {
            return Err(CrecError::UnknownProvider {
                id: provider_id.to_string(),
            });
        }
        queue::enqueue(&self.config, provider_id, payload).await
    }

    /// Refreshes once right away, then once per configured interval.
    pub fn spawn_refresh_loop(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.config.refresh_interval());
            loop {
                interval.tick().await;
                match self.refresh().await {
                    Ok(index) => info!(generation = %index.id(), items = index.len(), "Index refreshed"),
                    Err(e) => error!("Index refresh failed: {}", e),
                }
            }
        })
    }
}
