//! Structural checks on image containers: data appended after the end
//! marker and steganography tool signatures in leading metadata.

use super::detectors::{Category, Detection, Detector, Modality, Tier};
use super::input::{ContainerFormat, ScanSubject};
use super::patterns::matching_signatures;
use crate::config::ImageConfig;
use crate::value::FindingValue;

/// Points for bytes after the container end marker.
pub const TRAILING_DATA_POINTS: f64 = 35.0;
/// Points for a known tool signature in metadata.
pub const SIGNATURE_POINTS: f64 = 40.0;

/// Bytes past the end marker needed to flag trailing data.
pub const TRAILING_MIN_BYTES: usize = 4;
/// Leading container bytes searched for tool signatures.
pub const METADATA_WINDOW: usize = 4096;

const PNG_END: &[u8] = b"IEND";
/// Chunk type plus CRC.
const PNG_END_LEN: usize = 8;
const JPEG_END: &[u8] = &[0xFF, 0xD9];

/// Result of looking for appended data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrailingData {
    /// End marker located.
    pub end_marker_found: bool,
    /// Bytes after the end marker.
    pub extra_bytes: usize,
}

fn rfind(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).rposition(|w| w == needle)
}

/// Count bytes following the last end marker of a PNG or JPEG.
///
/// Returns `None` for formats without a defined end marker.
pub fn trailing_data(buffer: &[u8], format: ContainerFormat) -> Option<TrailingData> {
    let (marker, marker_len) = match format {
        ContainerFormat::Png => (PNG_END, PNG_END_LEN),
        ContainerFormat::Jpeg => (JPEG_END, JPEG_END.len()),
        _ => return None,
    };
    Some(match rfind(buffer, marker) {
        Some(pos) => TrailingData {
            end_marker_found: true,
            extra_bytes: buffer.len().saturating_sub(pos + marker_len),
        },
        None => TrailingData {
            end_marker_found: false,
            extra_bytes: 0,
        },
    })
}

/// Cheap-tier detector for container structure.
pub struct ContainerInspector {
    config: ImageConfig,
}

impl ContainerInspector {
    /// Create an inspector with default limits.
    pub fn new() -> Self {
        Self::with_config(ImageConfig::default())
    }

    /// Create an inspector with custom limits.
    pub fn with_config(config: ImageConfig) -> Self {
        Self { config }
    }
}

impl Default for ContainerInspector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for ContainerInspector {
    fn name(&self) -> &str {
        "container"
    }

    fn tier(&self) -> Tier {
        Tier::Cheap
    }

    fn supports(&self, modality: Modality) -> bool {
        modality == Modality::Image
    }

    fn detect(&self, subject: &ScanSubject<'_>) -> Detection {
        let mut detection = Detection::new(self.name());
        let Some(image) = subject.image else {
            return detection;
        };

        let mut findings = FindingValue::map()
            .with("format", format!("{:?}", image.format).to_lowercase())
            .with("bytes", image.container.len());

        if !image.format.is_container() {
            detection.findings = findings.with("inspected", false);
            return detection;
        }

        if let Some(trailing) = trailing_data(image.container, image.format) {
            let flagged = trailing.extra_bytes >= self.config.trailing_min_bytes;
            if flagged {
                detection.signal(Category::ImageStructural, "trailing_data", TRAILING_DATA_POINTS);
            }
            findings.insert(
                "trailing_data",
                FindingValue::map()
                    .with("end_marker_found", trailing.end_marker_found)
                    .with("extra_bytes", trailing.extra_bytes)
                    .with("suspicious", flagged),
            );
        }

        let window = &image.container[..image.container.len().min(self.config.metadata_window)];
        let signatures = matching_signatures(window);
        if !signatures.is_empty() {
            tracing::debug!("Tool signatures in container metadata: {:?}", signatures);
            detection.signal(Category::ImageStructural, "stego_tool_signature", SIGNATURE_POINTS);
        }
        findings.insert("tool_signatures", signatures);

        detection.findings = findings.with("inspected", true);
        detection
    }
}
