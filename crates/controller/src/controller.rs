//! Search controller: drives the session against the analysis client.

use std::sync::Arc;
use std::time::Instant;

use uuid::Uuid;

use shopseeker_core::{traits::ImageAnalyzer, types::EncodedImage};
use shopseeker_gateway::LocationHandle;

use crate::builder::SearchControllerBuilder;
use crate::session::{AppStatus, SearchSession, SessionState};

/// Owns one user session and the collaborators it talks to.
pub struct SearchController {
    /// Session id for log correlation.
    id: Uuid,
    session: SearchSession,
    analyzer: Arc<dyn ImageAnalyzer>,
    location: LocationHandle,
}

impl SearchController {
    /// Create a new builder for SearchController.
    pub fn builder() -> SearchControllerBuilder {
        SearchControllerBuilder::new()
    }

    pub fn new(analyzer: Arc<dyn ImageAnalyzer>, location: LocationHandle) -> Self {
        let id = Uuid::new_v4();
        tracing::info!(session_id = %id, "Session started");
        Self {
            id,
            session: SearchSession::new(),
            analyzer,
            location,
        }
    }

    pub fn state(&self) -> &SessionState {
        self.session.state()
    }

    pub fn status(&self) -> AppStatus {
        self.session.status()
    }

    pub fn location(&self) -> &LocationHandle {
        &self.location
    }

    /// Attach an image. See [`SearchSession::select_image`].
    pub fn select_image(&mut self, image: EncodedImage) -> &SessionState {
        if self.session.select_image(image) {
            tracing::info!(session_id = %self.id, "Image selected");
        }
        self.session.state()
    }

    /// Run one search with the attached image and whatever location is
    /// known right now. A no-op unless the session is idle with an image.
    pub async fn search(&mut self) -> &SessionState {
        let Some(ticket) = self.session.begin_search(self.location.current()) else {
            return self.session.state();
        };

        tracing::info!(
            session_id = %self.id,
            search_id = ticket.id(),
            has_location = ticket.coordinate().is_some(),
            "Analyzing image"
        );
        if ticket.coordinate().is_none() {
            tracing::debug!(session_id = %self.id, "No location yet; results may be less accurate");
        }

        let started = Instant::now();
        let outcome = self
            .analyzer
            .analyze(ticket.image(), ticket.coordinate())
            .await;
        let elapsed = started.elapsed().as_secs_f64();

        match &outcome {
            Ok(result) => {
                shopseeker_governance::track_analysis("success", elapsed, result.shops.len());
                tracing::info!(
                    session_id = %self.id,
                    shops = result.shops.len(),
                    elapsed_ms = (elapsed * 1000.0) as u64,
                    "Search succeeded"
                );
            }
            Err(err) => {
                shopseeker_governance::track_analysis("error", elapsed, 0);
                tracing::error!(session_id = %self.id, error = %err, "Search failed");
            }
        }

        self.session.complete(ticket, outcome);
        self.session.state()
    }

    /// Clear image, result and error. See [`SearchSession::reset`].
    pub fn reset(&mut self) -> &SessionState {
        if self.session.reset() {
            tracing::info!(session_id = %self.id, "Session reset");
        }
        self.session.state()
    }
}
