use async_trait::async_trait;

use crate::error::Result;
use crate::types::Coordinate;

/// One-shot source of the device position.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Resolve the current position.
    async fn current_position(&self) -> Result<Coordinate>;
}
