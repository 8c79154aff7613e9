use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// An image ready to be sent to the analysis service.
///
/// The base64 payload sits behind an `Arc`, so clones handed to the
/// analysis client share the buffer with the session.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedImage {
    data: Arc<str>,
    media_type: String,
}

impl EncodedImage {
    /// Wrap an already base64-encoded payload.
    pub fn new(data: impl Into<Arc<str>>, media_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            media_type: media_type.into(),
        }
    }

    /// Base64 text of the raw image bytes.
    pub fn data(&self) -> &str {
        &self.data
    }

    /// Media type as declared or detected at ingestion, e.g. `image/png`.
    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    /// Length of the base64 payload.
    pub fn encoded_len(&self) -> usize {
        self.data.len()
    }
}

// Payloads run to megabytes; keep them out of logs.
impl fmt::Debug for EncodedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncodedImage")
            .field("media_type", &self.media_type)
            .field("encoded_len", &self.data.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clone_shares_payload() {
        let image = EncodedImage::new("aGVsbG8=", "image/png");
        let copy = image.clone();
        assert!(std::ptr::eq(image.data(), copy.data()));
        assert_eq!(copy.media_type(), "image/png");
    }

    #[test]
    fn test_debug_omits_payload() {
        let image = EncodedImage::new("aGVsbG8=", "image/jpeg");
        let rendered = format!("{:?}", image);
        assert!(!rendered.contains("aGVsbG8="));
        assert!(rendered.contains("image/jpeg"));
    }
}
