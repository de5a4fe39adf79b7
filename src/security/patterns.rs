//! Compiled regex patterns for the steganography detectors.
//!
//! Uses `std::sync::OnceLock` for lazy one-time initialization.

use regex::bytes::Regex as BytesRegex;
use regex::Regex;
use std::sync::OnceLock;

/// Signatures left in image metadata by common steganography tools.
pub fn stego_tool_signatures() -> &'static [BytesRegex] {
    static PATTERNS: OnceLock<Vec<BytesRegex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        compile_all_bytes(&[
            r"(?i)steghide",
            r"(?i)outguess",
            r"(?i)openstego",
            r"(?i)jp(?:hide|seek)",
            r"(?i)silent\s*eye",
            r"(?i)invisible\s+secrets",
            r"(?i)stegosuite",
            r"(?i)stegano(?:graphy)?",
            r"(?i)camouflage",
            r"(?i)zsteg",
            r"(?i)lsb[-_ ]?steg",
            r"(?i)(?-u:\b)f5[-_ ](?:stego|embed)",
        ])
    })
}

/// Printable ASCII with whitespace, the shape of a plausible hidden message.
pub fn printable_payload() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| compile_all(&[r"^[\x20-\x7E\t\r\n]+$"]).into_iter().next())
        .as_ref()
}

/// Whether an extracted candidate looks like a real message.
///
/// Needs at least `min_chars` characters once surrounding whitespace is trimmed.
pub fn is_printable_payload(candidate: &str, min_chars: usize) -> bool {
    candidate.trim().chars().count() >= min_chars
        && printable_payload().is_some_and(|p| p.is_match(candidate))
}

/// Names of the tool signatures found in `window`.
pub fn matching_signatures(window: &[u8]) -> Vec<String> {
    stego_tool_signatures()
        .iter()
        .filter_map(|re| re.find(window))
        .map(|m| String::from_utf8_lossy(m.as_bytes()).to_lowercase())
        .collect()
}

fn compile_all(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .filter_map(|p| match Regex::new(p) {
            Ok(r) => Some(r),
            Err(e) => {
                tracing::warn!("Failed to compile detection pattern '{}': {}", p, e);
                None
            }
        })
        .collect()
}

fn compile_all_bytes(patterns: &[&str]) -> Vec<BytesRegex> {
    patterns
        .iter()
        .filter_map(|p| match BytesRegex::new(p) {
            Ok(r) => Some(r),
            Err(e) => {
                tracing::warn!("Failed to compile signature pattern '{}': {}", p, e);
                None
            }
        })
        .collect()
}
