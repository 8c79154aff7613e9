//! Wire types for the Gemini `generateContent` endpoint.
//!
//! Requests are borrowed views over the session's data. Responses are parsed
//! leniently: every field the client does not strictly need is optional, and
//! grounding chunks are lifted into the [`Citation`] sum type so unknown
//! shapes drop out instead of failing the whole parse.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use shopseeker_core::types::{Coordinate, EncodedImage, ShopResult};

// =============================================================================
// Request
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest<'a> {
    pub contents: Vec<RequestContent<'a>>,
    pub tools: Vec<Tool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_config: Option<ToolConfig>,
}

#[derive(Debug, Serialize)]
pub struct RequestContent<'a> {
    pub role: &'static str,
    pub parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestPart<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineData<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData<'a> {
    pub mime_type: &'a str,
    pub data: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    pub google_maps: GoogleMaps,
}

#[derive(Debug, Serialize)]
pub struct GoogleMaps {}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolConfig {
    pub retrieval_config: RetrievalConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievalConfig {
    pub lat_lng: LatLng,
}

#[derive(Debug, Serialize)]
pub struct LatLng {
    pub latitude: f64,
    pub longitude: f64,
}

impl<'a> GenerateContentRequest<'a> {
    /// Image first, then the instruction, with Maps grounding always on.
    /// The location hint is attached only when a coordinate is known.
    pub fn new(image: &'a EncodedImage, instruction: &'a str, coordinate: Option<Coordinate>) -> Self {
        Self {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![
                    RequestPart {
                        inline_data: Some(InlineData {
                            mime_type: image.media_type(),
                            data: image.data(),
                        }),
                        text: None,
                    },
                    RequestPart {
                        inline_data: None,
                        text: Some(instruction),
                    },
                ],
            }],
            tools: vec![Tool {
                google_maps: GoogleMaps {},
            }],
            tool_config: coordinate.map(|c| ToolConfig {
                retrieval_config: RetrievalConfig {
                    lat_lng: LatLng {
                        latitude: c.latitude(),
                        longitude: c.longitude(),
                    },
                },
            }),
        }
    }
}

// =============================================================================
// Response
// =============================================================================

// The service sends `null` for lists it has nothing to put in.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<ResponseContent>,
    #[serde(default)]
    pub grounding_metadata: Option<GroundingMetadata>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResponseContent {
    #[serde(default, deserialize_with = "null_as_default")]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResponsePart {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub thought: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    #[serde(default)]
    pub block_reason: Option<String>,
    #[serde(default)]
    pub block_reason_message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroundingMetadata {
    /// Kept raw so one odd chunk cannot fail the whole response.
    #[serde(default, deserialize_with = "null_as_default")]
    pub grounding_chunks: Vec<Value>,
}

/// One grounding chunk as it appears on the wire: an object keyed by source kind.
#[derive(Debug, Default, Deserialize)]
pub struct GroundingChunk {
    #[serde(default)]
    pub maps: Option<MapsSource>,
    #[serde(default)]
    pub web: Option<WebSource>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapsSource {
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub place_answer_sources: Option<AnswerSources>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WebSource {
    #[serde(default)]
    pub uri: Option<String>,
}

/// `placeAnswerSources` shows up both as a single object and as a list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum AnswerSources {
    Many(Vec<PlaceAnswerSources>),
    One(PlaceAnswerSources),
    Other(Value),
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceAnswerSources {
    #[serde(default, deserialize_with = "null_as_default")]
    pub review_snippets: Vec<ReviewSnippet>,
}

/// A review snippet: plain text, or an object carrying the text.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ReviewSnippet {
    Text(String),
    Structured {
        #[serde(default)]
        review: Option<String>,
        #[serde(default)]
        text: Option<String>,
        #[serde(default)]
        title: Option<String>,
    },
    Other(Value),
}

impl ReviewSnippet {
    fn text(&self) -> Option<&str> {
        let text = match self {
            ReviewSnippet::Text(text) => Some(text.as_str()),
            ReviewSnippet::Structured {
                review,
                text,
                title,
            } => review
                .as_deref()
                .filter(|s| !s.trim().is_empty())
                .or(text.as_deref())
                .filter(|s| !s.trim().is_empty())
                .or(title.as_deref()),
            ReviewSnippet::Other(_) => None,
        };
        text.filter(|s| !s.trim().is_empty())
    }
}

/// Error envelope returned with non-2xx statuses.
#[derive(Debug, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

// =============================================================================
// Citations
// =============================================================================

/// A grounding source attached to the answer, classified by kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Citation {
    /// A map/place result.
    Place(PlaceCitation),
    /// A web page result.
    Web { uri: Option<String> },
    /// Any shape this client does not recognise.
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceCitation {
    pub title: Option<String>,
    pub uri: Option<String>,
    pub snippet: Option<String>,
}

impl From<GroundingChunk> for Citation {
    fn from(chunk: GroundingChunk) -> Self {
        if let Some(maps) = chunk.maps {
            let snippet = maps.place_answer_sources.and_then(|sources| {
                let sources = match sources {
                    AnswerSources::Many(list) => list,
                    AnswerSources::One(single) => vec![single],
                    AnswerSources::Other(_) => Vec::new(),
                };
                sources
                    .iter()
                    .flat_map(|source| source.review_snippets.iter())
                    .find_map(|snippet| snippet.text().map(str::to_string))
            });
            return Citation::Place(PlaceCitation {
                title: maps.title,
                uri: maps.uri,
                snippet,
            });
        }
        if let Some(web) = chunk.web {
            return Citation::Web { uri: web.uri };
        }
        Citation::Unknown
    }
}

impl From<Value> for Citation {
    /// Chunks that do not fit the known shapes become `Unknown`.
    fn from(raw: Value) -> Self {
        serde_json::from_value::<GroundingChunk>(raw)
            .map(Citation::from)
            .unwrap_or(Citation::Unknown)
    }
}

impl PlaceCitation {
    /// A shop entry, if both a title and a link are present.
    pub fn into_shop(self) -> Option<ShopResult> {
        let title = self.title.filter(|t| !t.trim().is_empty())?;
        let uri = self.uri.filter(|u| !u.trim().is_empty())?;
        Some(ShopResult {
            title,
            uri,
            snippet: self.snippet,
        })
    }
}
