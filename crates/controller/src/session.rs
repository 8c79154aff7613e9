//! Session state machine.
//!
//! The session cycles Idle → Analyzing → Success/Error → Idle. State only
//! changes through the transition methods; a result can only exist in
//! `Success` and an error message only in `Error`.
//!
//! Searches are split into `begin_search` and `complete` so the caller can
//! run the remote call between them. The ticket returned by `begin_search`
//! is the only way to land a result, and only for the search in flight.

use serde::Serialize;
use std::fmt;

use shopseeker_core::{
    types::{AnalysisResult, Coordinate, EncodedImage},
    Result,
};

/// Shown when a failed search carries no message of its own.
pub const GENERIC_FAILURE: &str = "Something went wrong during the search.";

/// Coarse phase of the session, for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AppStatus {
    Idle,
    Analyzing,
    Success,
    Error,
}

impl fmt::Display for AppStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AppStatus::Idle => "idle",
            AppStatus::Analyzing => "analyzing",
            AppStatus::Success => "success",
            AppStatus::Error => "error",
        };
        f.write_str(name)
    }
}

/// Full session state.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    /// Waiting for the user; an image may already be attached.
    Idle { image: Option<EncodedImage> },
    /// One analysis in flight.
    Analyzing { image: EncodedImage, search_id: u64 },
    /// Last search produced a result.
    Success {
        image: EncodedImage,
        result: AnalysisResult,
    },
    /// Last search failed.
    Error { image: EncodedImage, message: String },
}

impl SessionState {
    pub fn status(&self) -> AppStatus {
        match self {
            SessionState::Idle { .. } => AppStatus::Idle,
            SessionState::Analyzing { .. } => AppStatus::Analyzing,
            SessionState::Success { .. } => AppStatus::Success,
            SessionState::Error { .. } => AppStatus::Error,
        }
    }

    pub fn image(&self) -> Option<&EncodedImage> {
        match self {
            SessionState::Idle { image } => image.as_ref(),
            SessionState::Analyzing { image, .. }
            | SessionState::Success { image, .. }
            | SessionState::Error { image, .. } => Some(image),
        }
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        match self {
            SessionState::Success { result, .. } => Some(result),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            SessionState::Error { message, .. } => Some(message),
            _ => None,
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        SessionState::Idle { image: None }
    }
}

/// Everything the analysis call needs, captured when the search began.
#[derive(Debug)]
pub struct SearchTicket {
    id: u64,
    image: EncodedImage,
    coordinate: Option<Coordinate>,
}

impl SearchTicket {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn image(&self) -> &EncodedImage {
        &self.image
    }

    pub fn coordinate(&self) -> Option<Coordinate> {
        self.coordinate
    }
}

/// Owner of the session state.
#[derive(Debug, Default)]
pub struct SearchSession {
    state: SessionState,
    searches_started: u64,
}

impl SearchSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn status(&self) -> AppStatus {
        self.state.status()
    }

    /// Attach a new image, dropping any previous image, result or error.
    ///
    /// Ignored while a search is in flight. Returns whether it applied.
    pub fn select_image(&mut self, image: EncodedImage) -> bool {
        if let SessionState::Analyzing { search_id, .. } = &self.state {
            tracing::debug!(search_id, "Image selection ignored while analyzing");
            return false;
        }
        self.state = SessionState::Idle { image: Some(image) };
        true
    }

    /// Move to `Analyzing` if an image is attached and nothing is in flight.
    ///
    /// `coordinate` is whatever location is known at this moment.
    pub fn begin_search(&mut self, coordinate: Option<Coordinate>) -> Option<SearchTicket> {
        let image = match &self.state {
            SessionState::Idle { image: Some(image) } => image.clone(),
            SessionState::Idle { image: None } => {
                tracing::debug!("Search ignored: no image attached");
                return None;
            }
            SessionState::Analyzing { search_id, .. } => {
                tracing::debug!(search_id, "Search ignored: already analyzing");
                return None;
            }
            // The caller resets or re-selects before searching again.
            SessionState::Success { .. } | SessionState::Error { .. } => {
                tracing::debug!(status = %self.status(), "Search ignored: session not idle");
                return None;
            }
        };

        self.searches_started += 1;
        let id = self.searches_started;
        self.state = SessionState::Analyzing {
            image: image.clone(),
            search_id: id,
        };

        Some(SearchTicket {
            id,
            image,
            coordinate,
        })
    }

    /// Land the outcome of the search `ticket` belongs to.
    ///
    /// A ticket for any other search is ignored. Returns whether it applied.
    pub fn complete(&mut self, ticket: SearchTicket, outcome: Result<AnalysisResult>) -> bool {
        let in_flight = matches!(
            &self.state,
            SessionState::Analyzing { search_id, .. } if *search_id == ticket.id
        );
        if !in_flight {
            tracing::warn!(search_id = ticket.id, "Stale search outcome dropped");
            return false;
        }

        let SearchTicket { image, .. } = ticket;
        self.state = match outcome {
            Ok(result) => SessionState::Success { image, result },
            Err(err) => {
                let message = err.message();
                let message = if message.trim().is_empty() {
                    GENERIC_FAILURE.to_string()
                } else {
                    message
                };
                SessionState::Error { image, message }
            }
        };
        true
    }

    /// Return to an empty `Idle`. Ignored while a search is in flight.
    pub fn reset(&mut self) -> bool {
        if let SessionState::Analyzing { search_id, .. } = &self.state {
            tracing::debug!(search_id, "Reset ignored while analyzing");
            return false;
        }
        self.state = SessionState::Idle { image: None };
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shopseeker_core::{types::ShopResult, Error};

    fn image(tag: &str) -> EncodedImage {
        EncodedImage::new(tag, "image/png")
    }

    fn result() -> AnalysisResult {
        AnalysisResult {
            description: "A blue ceramic mug".into(),
            shops: vec![ShopResult {
                title: "Corner Pottery".into(),
                uri: "https://example.com/shop".into(),
                snippet: None,
            }],
        }
    }

    #[test]
    fn test_search_without_image_is_noop() {
        let mut session = SearchSession::new();
        assert!(session.begin_search(None).is_none());
        assert_eq!(session.state(), &SessionState::Idle { image: None });
    }

    #[test]
    fn test_happy_path() {
        let mut session = SearchSession::new();
        assert!(session.select_image(image("a")));
        assert_eq!(session.status(), AppStatus::Idle);

        let ticket = session.begin_search(None).unwrap();
        assert_eq!(session.status(), AppStatus::Analyzing);
        assert_eq!(ticket.image(), &image("a"));

        assert!(session.complete(ticket, Ok(result())));
        assert_eq!(session.state().result(), Some(&result()));
        assert_eq!(session.state().image(), Some(&image("a")));
    }

    #[test]
    fn test_duplicate_search_is_ignored() {
        let mut session = SearchSession::new();
        session.select_image(image("a"));
        let first = session.begin_search(None).unwrap();
        assert!(session.begin_search(None).is_none());

        assert!(session.complete(first, Ok(result())));
        assert_eq!(session.status(), AppStatus::Success);
    }

    #[test]
    fn test_blank_failure_message_gets_generic_text() {
        let mut session = SearchSession::new();
        session.select_image(image("a"));
        let ticket = session.begin_search(None).unwrap();
        session.complete(ticket, Err(Error::service_unavailable("  ")));
        assert_eq!(session.state().error(), Some(GENERIC_FAILURE));

        session.reset();
        session.select_image(image("b"));
        let ticket = session.begin_search(None).unwrap();
        session.complete(ticket, Err(Error::Other(anyhow::anyhow!(""))));
        assert_eq!(session.state().error(), Some(GENERIC_FAILURE));
    }

    #[test]
    fn test_failure_carries_message_and_reset_clears() {
        let mut session = SearchSession::new();
        session.select_image(image("a"));
        let ticket = session.begin_search(None).unwrap();
        session.complete(ticket, Err(Error::service_unavailable("connection reset by peer")));

        assert_eq!(session.status(), AppStatus::Error);
        assert_eq!(session.state().error(), Some("connection reset by peer"));

        assert!(session.reset());
        assert_eq!(session.state(), &SessionState::Idle { image: None });
        assert!(session.reset());
        assert_eq!(session.state(), &SessionState::Idle { image: None });
    }

    #[test]
    fn test_reselect_after_success_clears_result() {
        let mut session = SearchSession::new();
        session.select_image(image("a"));
        let ticket = session.begin_search(None).unwrap();
        session.complete(ticket, Ok(result()));

        assert!(session.select_image(image("b")));
        assert_eq!(
            session.state(),
            &SessionState::Idle {
                image: Some(image("b"))
            }
        );
        assert!(session.state().result().is_none());
    }

    #[test]
    fn test_no_changes_while_analyzing() {
        let mut session = SearchSession::new();
        session.select_image(image("a"));
        let ticket = session.begin_search(None).unwrap();

        assert!(!session.reset());
        assert!(!session.select_image(image("b")));
        assert_eq!(session.status(), AppStatus::Analyzing);

        assert!(session.complete(ticket, Ok(result())));
        assert_eq!(session.state().image(), Some(&image("a")));
    }

    #[test]
    fn test_stale_ticket_is_dropped() {
        let mut session = SearchSession::new();
        session.select_image(image("a"));
        let first = session.begin_search(None).unwrap();
        session.complete(first, Err(Error::request_rejected("bad image")));

        session.select_image(image("b"));
        let second = session.begin_search(None).unwrap();
        let forged = SearchTicket {
            id: second.id() - 1,
            image: image("a"),
            coordinate: None,
        };
        assert!(!session.complete(forged, Ok(result())));
        assert_eq!(session.status(), AppStatus::Analyzing);

        assert!(session.complete(second, Ok(result())));
        assert_eq!(session.state().image(), Some(&image("b")));
    }

    #[test]
    fn test_search_from_success_requires_reset() {
        let mut session = SearchSession::new();
        session.select_image(image("a"));
        let ticket = session.begin_search(None).unwrap();
        session.complete(ticket, Ok(result()));

        assert!(session.begin_search(None).is_none());
        assert_eq!(session.status(), AppStatus::Success);
    }
}
