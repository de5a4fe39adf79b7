//! Scan input and its validated, borrowed view.

use super::detectors::Modality;
use crate::error::{Error, Result};

/// Media types whose buffer is itself the sample sequence.
pub const RAW_MEDIA_TYPES: &[&str] = &["image/x-raw", "application/octet-stream"];

/// Content submitted for one scan. Text and image are mutually exclusive.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanInput {
    /// A Unicode text sequence.
    Text(String),
    /// A byte buffer with its declared media type.
    Image(ImageInput),
}

/// Image payload: container bytes plus, optionally, decoded samples.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageInput {
    /// Original container bytes (or raw samples for raw media types).
    pub buffer: Vec<u8>,
    /// Declared media type, e.g. `image/png`.
    pub media_type: String,
    /// Decoded channel samples, row-major, one byte per channel.
    pub samples: Option<Vec<u8>>,
}

/// Container format, sniffed from magic bytes or the declared media type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerFormat {
    /// Portable Network Graphics.
    Png,
    /// JPEG / JFIF.
    Jpeg,
    /// GIF.
    Gif,
    /// Windows bitmap.
    Bmp,
    /// Bare sample buffer with no container.
    Raw,
    /// Some other image container.
    Unknown,
}

impl ContainerFormat {
    /// Detect the format, preferring magic bytes over the declared type.
    pub fn sniff(buffer: &[u8], media_type: &str) -> Self {
        if buffer.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
            return ContainerFormat::Png;
        }
        if buffer.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return ContainerFormat::Jpeg;
        }
        if buffer.starts_with(b"GIF8") {
            return ContainerFormat::Gif;
        }
        if buffer.starts_with(b"BM") && media_type != "application/octet-stream" {
            return ContainerFormat::Bmp;
        }
        match media_type {
            "image/png" => ContainerFormat::Png,
            "image/jpeg" | "image/jpg" => ContainerFormat::Jpeg,
            "image/gif" => ContainerFormat::Gif,
            "image/bmp" => ContainerFormat::Bmp,
            t if RAW_MEDIA_TYPES.contains(&t) => ContainerFormat::Raw,
            _ => ContainerFormat::Unknown,
        }
    }

    /// Whether the buffer has container structure worth inspecting.
    pub fn is_container(self) -> bool {
        !matches!(self, ContainerFormat::Raw)
    }
}

/// Validated, borrowed view of an input, handed to every detector.
#[derive(Debug, Clone, Copy)]
pub struct ScanSubject<'a> {
    /// Classified modality.
    pub modality: Modality,
    /// Text content; empty for images.
    pub text: &'a str,
    /// Image content, if any.
    pub image: Option<ImageView<'a>>,
}

/// Borrowed image content.
#[derive(Debug, Clone, Copy)]
pub struct ImageView<'a> {
    /// Container bytes.
    pub container: &'a [u8],
    /// Sniffed container format.
    pub format: ContainerFormat,
    /// Channel samples, when available.
    pub samples: Option<&'a [u8]>,
}

fn normalize_media_type(media_type: &str) -> String {
    let essence = media_type.split(';').next().unwrap_or_default().trim();
    if essence.is_empty() {
        "application/octet-stream".to_string()
    } else {
        essence.to_ascii_lowercase()
    }
}

impl ScanInput {
    /// Text input.
    pub fn text(text: impl Into<String>) -> Self {
        ScanInput::Text(text.into())
    }

    /// Image container without decoded samples.
    pub fn image(buffer: Vec<u8>, media_type: impl Into<String>) -> Self {
        ScanInput::Image(ImageInput {
            buffer,
            media_type: media_type.into(),
            samples: None,
        })
    }

    /// Image container with its decoded samples.
    pub fn image_with_samples(
        buffer: Vec<u8>,
        media_type: impl Into<String>,
        samples: Vec<u8>,
    ) -> Self {
        ScanInput::Image(ImageInput {
            buffer,
            media_type: media_type.into(),
            samples: Some(samples),
        })
    }

    /// Bare channel samples with no container.
    pub fn raw_samples(samples: Vec<u8>) -> Self {
        ScanInput::Image(ImageInput {
            buffer: samples,
            media_type: RAW_MEDIA_TYPES[0].to_string(),
            samples: None,
        })
    }

    /// Reject inputs that cannot be scanned.
    pub fn validate(&self) -> Result<()> {
        match self {
            ScanInput::Text(text) if text.is_empty() => Err(Error::EmptyInput),
            ScanInput::Text(_) => Ok(()),
            ScanInput::Image(image) => {
                let has_samples = image.samples.as_ref().is_some_and(|s| !s.is_empty());
                if image.buffer.is_empty() && !has_samples {
                    return Err(Error::EmptyInput);
                }
                let media_type = normalize_media_type(&image.media_type);
                if media_type.starts_with("image/") || RAW_MEDIA_TYPES.contains(&media_type.as_str())
                {
                    Ok(())
                } else {
                    Err(Error::UnsupportedMediaType(image.media_type.clone()))
                }
            }
        }
    }

    /// Validate and borrow this input as a [`ScanSubject`].
    pub fn subject(&self, modality: Modality) -> Result<ScanSubject<'_>> {
        self.validate()?;
        Ok(match self {
            ScanInput::Text(text) => ScanSubject {
                modality,
                text,
                image: None,
            },
            ScanInput::Image(image) => {
                let media_type = normalize_media_type(&image.media_type);
                let format = if image.buffer.is_empty() {
                    ContainerFormat::Raw
                } else {
                    ContainerFormat::sniff(&image.buffer, &media_type)
                };
                let samples = match (&image.samples, format) {
                    (Some(samples), _) if !samples.is_empty() => Some(samples.as_slice()),
                    (_, ContainerFormat::Raw) => Some(image.buffer.as_slice()),
                    _ => None,
                };
                ScanSubject {
                    modality,
                    text: "",
                    image: Some(ImageView {
                        container: &image.buffer,
                        format,
                        samples,
                    }),
                }
            }
        })
    }
}
