//! Content index and recommendation engine.
//!
//! Content is pulled from independent providers into immutable index
//! generations, which are published atomically and queried by a set of
//! recommenders.

pub mod aggregator;
pub mod config;
pub mod content;
pub mod fetcher;
pub mod index;
pub mod ingester;
pub mod locale;
pub mod parser;
pub mod provider;
pub mod publisher;
pub mod queue;
pub mod recommender;
pub mod sources;
pub mod traits;
pub mod transform;
pub mod types;
pub mod utils;

pub use aggregator::ContentAggregator;
pub use config::{Config, FetchConfig};
pub use content::{Content, ContentType};
pub use fetcher::Fetcher;
pub use index::Index;
pub use ingester::Ingester;
pub use provider::{Provider, Providers};
pub use publisher::Publisher;
pub use recommender::{RecommendParams, Recommendations, Recommender, RecommenderSet};
pub use traits::ContentSource;
pub use types::*;
