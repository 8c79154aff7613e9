//! Builder for SearchController.

use std::sync::Arc;

use shopseeker_core::{traits::ImageAnalyzer, Error, Result};
use shopseeker_gateway::LocationHandle;

use crate::controller::SearchController;

/// Builder for constructing a SearchController.
#[derive(Default)]
pub struct SearchControllerBuilder {
    analyzer: Option<Arc<dyn ImageAnalyzer>>,
    location: Option<LocationHandle>,
}

impl SearchControllerBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the analysis client.
    pub fn with_analyzer(mut self, analyzer: Arc<dyn ImageAnalyzer>) -> Self {
        self.analyzer = Some(analyzer);
        self
    }

    /// Set the location handle. Without one the session never has a location.
    pub fn with_location(mut self, location: LocationHandle) -> Self {
        self.location = Some(location);
        self
    }

    /// Build the controller.
    pub fn build(self) -> Result<SearchController> {
        let analyzer = self
            .analyzer
            .ok_or_else(|| Error::config("SearchController needs an analyzer"))?;
        let location = self.location.unwrap_or_else(LocationHandle::unavailable);
        Ok(SearchController::new(analyzer, location))
    }
}
