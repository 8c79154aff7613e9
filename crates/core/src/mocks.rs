//! Mock implementations of core traits for testing.
//!
//! These are shared across the workspace's unit and integration tests.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::{
    traits::{ImageAnalyzer, LocationProvider},
    types::{AnalysisResult, Coordinate, EncodedImage},
    Error, Result,
};

// =============================================================================
// Mock Analyzer
// =============================================================================

/// A call observed by [`MockAnalyzer`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub media_type: String,
    pub encoded_len: usize,
    pub coordinate: Option<Coordinate>,
}

/// Scripted analyzer that replays queued replies in order.
pub struct MockAnalyzer {
    replies: Mutex<VecDeque<Result<AnalysisResult>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockAnalyzer {
    /// Create a mock with a queue of replies.
    pub fn new(replies: Vec<Result<AnalysisResult>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// A mock whose single call succeeds with `result`.
    pub fn succeeding(result: AnalysisResult) -> Self {
        Self::new(vec![Ok(result)])
    }

    /// A mock whose single call fails with `err`.
    pub fn failing(err: Error) -> Self {
        Self::new(vec![Err(err)])
    }

    /// Get the number of calls made to this mock.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Calls observed so far, oldest first.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageAnalyzer for MockAnalyzer {
    async fn analyze(
        &self,
        image: &EncodedImage,
        coordinate: Option<Coordinate>,
    ) -> Result<AnalysisResult> {
        self.calls.lock().unwrap().push(RecordedCall {
            media_type: image.media_type().to_string(),
            encoded_len: image.encoded_len(),
            coordinate,
        });

        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Error::internal("MockAnalyzer has no scripted reply left")))
    }
}

// =============================================================================
// Mock Location Provider
// =============================================================================

/// Location provider that always returns the same answer.
pub struct MockLocation {
    position: Option<Coordinate>,
}

impl MockLocation {
    /// A provider that resolves to `coordinate`.
    pub fn at(coordinate: Coordinate) -> Self {
        Self {
            position: Some(coordinate),
        }
    }

    /// A provider that always fails, like a denied permission.
    pub fn denied() -> Self {
        Self { position: None }
    }
}

#[async_trait]
impl LocationProvider for MockLocation {
    fn name(&self) -> &str {
        "mock"
    }

    async fn current_position(&self) -> Result<Coordinate> {
        self.position
            .ok_or_else(|| Error::location_unavailable("permission denied"))
    }
}
