//! # stegscan
//!
//! Steganography detection and codec core.
//!
//! This crate scores text, emoji streams and images for hidden content and
//! ships the reversible codecs that produce such content, so detections can
//! be confirmed by actually extracting the payload.
//!
//! ## Features
//!
//! - **Unicode threats**: zero-width characters, Cyrillic/Greek homoglyphs,
//!   variation-selector streams, BiDi and tag characters, entropy
//! - **Emoji threats**: token explosion, combining-mark stacking, selector
//!   abuse, repetition fingerprinting, codec-alphabet density
//! - **Image LSB analysis**: chi-square attack, sample pair analysis, RS
//!   analysis, bit-cycle periodicity, block noise fingerprint, channel
//!   consistency, trailing data and tool signatures
//! - **Fusion**: two-tier cascade, confidence-weighted 0-100 score, and a
//!   verified override when a codec recovers a printable payload
//! - **Codecs**: zero-width (binary and 7-symbol) and 7-bit emoji alphabet
//!
//! ## Example
//!
//! ```rust
//! use stegscan::{FusionEngine, Placement, ZeroWidthMode};
//!
//! let carrier = "A".repeat(200);
//! let stego = stegscan::zero_width_encode(&carrier, "SECRET", Placement::Bottom, 1, ZeroWidthMode::Binary);
//!
//! let engine = FusionEngine::new();
//! let result = engine.scan_text(&stego)?;
//! assert_eq!(result.score, 100);
//! assert_eq!(result.verified_payload.as_deref(), Some("SECRET"));
//! # Ok::<(), stegscan::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cluster;
pub mod codec;
pub mod config;
pub mod error;
#[cfg(test)]
mod fixtures;
pub mod report;
pub mod security;
pub mod value;

pub use codec::{
    emoji_decode, emoji_encode, zero_width_clean, zero_width_decode, zero_width_encode, Placement,
    ZeroWidthMode,
};
pub use config::Config;
pub use error::{DecodeError, Error, Result};
pub use report::{RiskLevel, ScoreReport};
pub use security::{Detector, FusionEngine, Modality, ScanInput, ScanResult, Severity};
pub use value::FindingValue;
