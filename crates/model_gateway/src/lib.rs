#![deny(unused)]
//! Analysis client for ShopSeeker.
//!
//! This crate provides:
//! - The Gemini `generateContent` client with Maps grounding
//! - Wire types for the request and the heterogeneous response
//! - Normalization of the response into an `AnalysisResult`

pub mod config;
pub mod gemini;
pub mod wire;

pub use config::GeminiConfig;
pub use gemini::{GeminiClient, FALLBACK_DESCRIPTION, INSTRUCTION};
pub use wire::{Citation, PlaceCitation};

use shopseeker_core::config::AnalysisConfig;

/// Create the analysis client from the `analysis` config section.
pub fn create_client_from_config(config: &AnalysisConfig) -> shopseeker_core::Result<GeminiClient> {
    let gemini = GeminiConfig::from_analysis_config(config)?;
    tracing::info!(model = %gemini.model, endpoint = %gemini.endpoint, "Analysis client configured");
    GeminiClient::new(gemini)
}
