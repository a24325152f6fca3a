pub mod native;
pub mod queue;
pub mod syndication;

pub use native::NativeSource;
pub use queue::QueueSource;
pub use syndication::SyndicationSource;

use crate::config::Config;
use crate::fetcher::Fetcher;
use crate::provider::Provider;
use crate::traits::ContentSource;
use std::sync::Arc;

/// Picks the source matching how the provider publishes its content.
pub fn source_for(
    provider: Arc<Provider>,
    fetcher: &Fetcher,
    config: &Config,
) -> Box<dyn ContentSource> {
    if provider.is_queued() {
        let dir = config.provider_queue_dir(&provider.id);
        Box::new(QueueSource::new(provider, dir))
    } else if provider.native {
        Box::new(NativeSource::new(provider, fetcher.clone()))
    } else {
        Box::new(SyndicationSource::new(provider, fetcher.clone()))
    }
}
