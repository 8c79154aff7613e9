use serde::{Deserialize, Serialize};

/// A shop found through the service's map grounding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopResult {
    /// Place name.
    pub title: String,
    /// Link to the place (directions, hours).
    pub uri: String,
    /// First review or answer snippet, if the service attached one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}

/// Normalized outcome of one analysis call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Free-text answer describing the item.
    pub description: String,
    /// Shops in the order the service cited them.
    pub shops: Vec<ShopResult>,
}
