use async_trait::async_trait;

use crate::error::Result;
use crate::types::{AnalysisResult, Coordinate, EncodedImage};

/// Client for the multimodal analysis service.
#[async_trait]
pub trait ImageAnalyzer: Send + Sync {
    /// Identify the item in `image` and look up shops near `coordinate`.
    ///
    /// Performs exactly one remote exchange. Failures are
    /// `ServiceUnavailable`, `InvalidResponse` or `RequestRejected`.
    async fn analyze(
        &self,
        image: &EncodedImage,
        coordinate: Option<Coordinate>,
    ) -> Result<AnalysisResult>;
}
