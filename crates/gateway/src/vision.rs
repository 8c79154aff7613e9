//! Image ingestion.
//!
//! Turns a user-selected file (or uploaded bytes) into an [`EncodedImage`]
//! ready for the analysis service. Nothing here touches the network.

use std::io::Cursor;
use std::path::Path;

use base64::Engine;

use shopseeker_core::{config::IngestConfig, types::EncodedImage, Error, Result};

/// Reads images into their base64 form.
#[derive(Debug, Clone)]
pub struct ImageIngestor {
    /// Largest raw image accepted.
    max_bytes: usize,
}

impl ImageIngestor {
    /// Create an ingestor with a size limit in bytes.
    pub fn new(max_bytes: usize) -> Self {
        Self { max_bytes }
    }

    pub fn from_config(config: &IngestConfig) -> Self {
        Self::new(config.max_image_bytes)
    }

    /// Read and encode an image file.
    ///
    /// The media type is sniffed from the file's magic bytes, falling back to
    /// the extension for HEIC/HEIF.
    pub async fn ingest_file(&self, path: &Path) -> Result<EncodedImage> {
        let data = tokio::fs::read(path)
            .await
            .map_err(|e| Error::unreadable_file(format!("{}: {}", path.display(), e)))?;

        self.check_size(&data)?;

        let media_type = sniff_media_type(&data)
            .or_else(|| media_type_from_extension(path))
            .ok_or_else(|| {
                Error::unreadable_file(format!("{}: unrecognized image format", path.display()))
            })?;

        // HEIC has no decoder here; the service still accepts it.
        match inspect(&data) {
            Ok(info) => tracing::debug!(
                width = info.width,
                height = info.height,
                format = %info.format,
                "Image header"
            ),
            Err(e) => tracing::debug!(error = %e, "Image header not decoded"),
        }

        let image = encode(&data, media_type);
        tracing::info!(
            path = %path.display(),
            media_type = %image.media_type(),
            size = data.len(),
            "Image ingested"
        );
        Ok(image)
    }

    /// Encode bytes that arrived with an optional declared media type.
    ///
    /// A declared `image/*` type is kept verbatim; without one the type is
    /// sniffed from the bytes.
    pub fn ingest_bytes(&self, data: &[u8], declared_media_type: Option<&str>) -> Result<EncodedImage> {
        self.check_size(data)?;

        let media_type = match declared_media_type.filter(|mt| !mt.trim().is_empty()) {
            Some(mt) if mt.trim_start().to_ascii_lowercase().starts_with("image/") => mt.to_string(),
            Some(mt) => {
                return Err(Error::unreadable_file(format!("not an image media type: {}", mt)))
            }
            None => sniff_media_type(data)
                .ok_or_else(|| Error::unreadable_file("unrecognized image format"))?,
        };

        let image = encode(data, media_type);
        tracing::debug!(media_type = %image.media_type(), size = data.len(), "Image bytes ingested");
        Ok(image)
    }

    fn check_size(&self, data: &[u8]) -> Result<()> {
        if data.is_empty() {
            return Err(Error::unreadable_file("file is empty"));
        }
        if data.len() > self.max_bytes {
            return Err(Error::unreadable_file(format!(
                "image is {} bytes, limit is {}",
                data.len(),
                self.max_bytes
            )));
        }
        Ok(())
    }
}

impl Default for ImageIngestor {
    fn default() -> Self {
        Self::new(shopseeker_core::config::DEFAULT_MAX_IMAGE_BYTES)
    }
}

fn encode(data: &[u8], media_type: String) -> EncodedImage {
    let content = base64::engine::general_purpose::STANDARD.encode(data);
    EncodedImage::new(content, media_type)
}

/// Media type from the leading magic bytes.
pub fn sniff_media_type(data: &[u8]) -> Option<String> {
    if let Ok(format) = image::guess_format(data) {
        return Some(format.to_mime_type().to_string());
    }
    // ISO-BMFF brands the image crate does not know.
    if data.len() >= 12 && &data[4..8] == b"ftyp" {
        return match &data[8..12] {
            b"heic" | b"heix" | b"heim" | b"heis" => Some("image/heic".into()),
            b"mif1" | b"msf1" => Some("image/heif".into()),
            _ => None,
        };
    }
    None
}

// Only for containers the magic-byte check cannot place. A `.png` that
// fails the sniff is corrupt, not a PNG.
fn media_type_from_extension(path: &Path) -> Option<String> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "heic" => Some("image/heic".into()),
        "heif" => Some("image/heif".into()),
        _ => None,
    }
}

/// Validate an image header and report its dimensions.
pub fn inspect(data: &[u8]) -> Result<ImageInfo> {
    let reader = image::ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| Error::unreadable_file(format!("Invalid image: {}", e)))?;

    let format = reader
        .format()
        .map(|f| format!("{:?}", f))
        .unwrap_or_else(|| "unknown".to_string());

    let (width, height) = reader
        .into_dimensions()
        .map_err(|e| Error::unreadable_file(format!("Invalid image: {}", e)))?;

    Ok(ImageInfo {
        width,
        height,
        format,
        size_bytes: data.len(),
    })
}

/// Information about an image.
#[derive(Debug, Clone)]
pub struct ImageInfo {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Image format (Png, Jpeg, etc.).
    pub format: String,
    /// Size in bytes.
    pub size_bytes: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes() -> Vec<u8> {
        let img = image::RgbImage::from_pixel(3, 2, image::Rgb([10, 20, 200]));
        let mut out = Vec::new();
        img.write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
            .unwrap();
        out
    }

    #[test]
    fn test_ingest_bytes_sniffs_png() {
        let data = png_bytes();
        let image = ImageIngestor::default().ingest_bytes(&data, None).unwrap();
        assert_eq!(image.media_type(), "image/png");

        let decoded = base64::engine::general_purpose::STANDARD
            .decode(image.data())
            .unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn test_declared_media_type_is_preserved() {
        let data = png_bytes();
        let image = ImageIngestor::default()
            .ingest_bytes(&data, Some("image/x-custom-PNG"))
            .unwrap();
        assert_eq!(image.media_type(), "image/x-custom-PNG");
    }

    #[test]
    fn test_rejects_non_image() {
        let ingestor = ImageIngestor::default();
        assert!(matches!(
            ingestor.ingest_bytes(b"just some text", None),
            Err(Error::UnreadableFile(_))
        ));
        assert!(matches!(
            ingestor.ingest_bytes(&png_bytes(), Some("text/plain")),
            Err(Error::UnreadableFile(_))
        ));
        assert!(matches!(
            ingestor.ingest_bytes(&[], Some("image/png")),
            Err(Error::UnreadableFile(_))
        ));
    }

    #[test]
    fn test_size_limit() {
        let data = png_bytes();
        let err = ImageIngestor::new(8).ingest_bytes(&data, None).unwrap_err();
        assert!(err.message().contains("limit is 8"));
    }

    #[test]
    fn test_sniff_heic_brand() {
        let mut data = vec![0, 0, 0, 24];
        data.extend_from_slice(b"ftypheic");
        data.extend_from_slice(&[0; 12]);
        assert_eq!(sniff_media_type(&data).as_deref(), Some("image/heic"));
    }

    #[test]
    fn test_inspect_dimensions() {
        let info = inspect(&png_bytes()).unwrap();
        assert_eq!((info.width, info.height), (3, 2));
        assert_eq!(info.format, "Png");
        assert!(inspect(b"nope").is_err());
    }
}
