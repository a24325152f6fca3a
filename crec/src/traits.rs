use crate::content::Content;
use crate::types::Result;
use async_trait::async_trait;

/// Pulls the current content of one provider.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Id of the provider this source reads from.
    fn provider_id(&self) -> &str;

    /// Human-readable kind, used in logs.
    fn kind(&self) -> &'static str;

    /// Everything the provider currently offers, in provider order.
    async fn pull(&self) -> Result<Vec<Content>>;
}
