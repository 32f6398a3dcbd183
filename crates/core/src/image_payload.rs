//! The image attached to a submission.

use std::io::Cursor;
use std::path::Path;

use base64::{engine::general_purpose, Engine as _};
use image::{ImageFormat, ImageReader};

use crate::error::ValidationError;

/// Formats the prediction backend accepts.
const SUPPORTED_FORMATS: [ImageFormat; 3] = [ImageFormat::Png, ImageFormat::Jpeg, ImageFormat::WebP];

/// A selected image file held in memory.
#[derive(Clone, PartialEq, Eq)]
pub struct ImagePayload {
    file_name: String,
    mime_type: &'static str,
    bytes: Vec<u8>,
    width: u32,
    height: u32,
}

impl std::fmt::Debug for ImagePayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImagePayload")
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

impl ImagePayload {
    /// Read an image file from disk.
    pub fn from_path(path: &Path) -> Result<Self, ValidationError> {
        let bytes = std::fs::read(path)
            .map_err(|e| ValidationError::UnreadableImage(format!("{}: {e}", path.display())))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        Self::from_bytes(file_name, bytes)
    }

    /// Wrap in-memory bytes, sniffing the format from the header and
    /// reading the dimensions without decoding pixel data.
    pub fn from_bytes(file_name: impl Into<String>, bytes: Vec<u8>) -> Result<Self, ValidationError> {
        let file_name = file_name.into();
        let format = image::guess_format(&bytes).map_err(|_| {
            ValidationError::UnreadableImage(format!("{file_name}: unrecognized image format"))
        })?;
        if !SUPPORTED_FORMATS.contains(&format) {
            return Err(ValidationError::UnreadableImage(format!(
                "{file_name}: unsupported format {format:?}"
            )));
        }

        let (width, height) = ImageReader::with_format(Cursor::new(&bytes), format)
            .into_dimensions()
            .map_err(|e| ValidationError::UnreadableImage(format!("{file_name}: {e}")))?;

        Ok(Self {
            file_name,
            mime_type: format.to_mime_type(),
            bytes,
            width,
            height,
        })
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn mime_type(&self) -> &'static str {
        self.mime_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Short description for previews, e.g. `scan.png (640x480, 12.3 KiB)`.
    pub fn summary(&self) -> String {
        format!(
            "{} ({}x{}, {:.1} KiB)",
            self.file_name,
            self.width,
            self.height,
            self.bytes.len() as f64 / 1024.0
        )
    }

    /// Standard base64 encoding of the raw file bytes.
    pub fn to_base64(&self) -> String {
        general_purpose::STANDARD.encode(&self.bytes)
    }

    /// Length of [`to_base64`](Self::to_base64) without encoding.
    pub fn base64_len(&self) -> usize {
        self.bytes.len().div_ceil(3) * 4
    }
}

/// Encode a blank PNG of the given size.
#[cfg(any(test, feature = "test-util"))]
pub fn blank_png(width: u32, height: u32) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    image::RgbImage::new(width, height)
        .write_to(&mut out, ImageFormat::Png)
        .expect("encode blank png");
    out.into_inner()
}
