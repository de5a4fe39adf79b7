//! Trait-based detector system for steganography screening.
//!
//! Defines the core [`Detector`] trait and the types every analyzer shares:
//! modality, severity bands, signal categories and per-detector results.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::input::ScanSubject;
use crate::config::ScoringConfig;
use crate::value::FindingValue;

/// Kind of content being scanned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    /// Ordinary text.
    Text,
    /// Emoji-dominant text.
    Emoji,
    /// Pixel samples and/or an image container.
    Image,
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Modality::Text => write!(f, "text"),
            Modality::Emoji => write!(f, "emoji"),
            Modality::Image => write!(f, "image"),
        }
    }
}

/// Five-band severity derived from the fused score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Nothing of note.
    Safe,
    /// Weak evidence.
    Low,
    /// Should be reviewed.
    Medium,
    /// Likely carries a payload.
    High,
    /// Payload verified or overwhelming evidence.
    Critical,
}

impl Severity {
    /// Map a 0-100 score to its band.
    pub fn from_score(score: u8) -> Self {
        match score {
            90..=u8::MAX => Severity::Critical,
            70..=89 => Severity::High,
            40..=69 => Severity::Medium,
            15..=39 => Severity::Low,
            _ => Severity::Safe,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Safe => write!(f, "safe"),
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

/// Confidence category of a signal; each carries its own fusion weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Invisible characters and layout controls.
    ZeroWidth,
    /// Confusable look-alike letters.
    Homoglyph,
    /// Emoji stream structure.
    Emoji,
    /// Statistical LSB estimators.
    ImageLsb,
    /// Container and channel structure.
    ImageStructural,
    /// Only counts when some other signal fired.
    Corroborating,
}

impl Category {
    /// Weight applied to this category's points.
    pub fn weight(&self, scoring: &ScoringConfig) -> f64 {
        match self {
            Category::ZeroWidth => scoring.zero_width_weight,
            Category::Homoglyph => scoring.homoglyph_weight,
            Category::Emoji => scoring.emoji_weight,
            Category::ImageLsb => scoring.image_lsb_weight,
            Category::ImageStructural => scoring.image_structural_weight,
            Category::Corroborating => scoring.corroborating_weight,
        }
    }
}

/// One triggered rule.
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    /// Confidence category.
    pub category: Category,
    /// Machine-readable reason tag.
    pub reason: String,
    /// Base points before weighting.
    pub points: f64,
}

/// Output of one detector run.
#[derive(Debug, Clone)]
pub struct Detection {
    /// Which detector produced this.
    pub detector: String,
    /// Structured findings.
    pub findings: FindingValue,
    /// Triggered rules.
    pub signals: Vec<Signal>,
    /// Payload recovered by a codec, if any.
    pub verified_payload: Option<String>,
}

impl Detection {
    /// Empty detection for `detector`.
    pub fn new(detector: impl Into<String>) -> Self {
        Self {
            detector: detector.into(),
            findings: FindingValue::map(),
            signals: Vec::new(),
            verified_payload: None,
        }
    }

    /// Record a triggered rule.
    pub fn signal(&mut self, category: Category, reason: impl Into<String>, points: f64) {
        self.signals.push(Signal {
            category,
            reason: reason.into(),
            points,
        });
    }

    /// True when no rule fired and nothing was extracted.
    pub fn is_clean(&self) -> bool {
        self.signals.is_empty() && self.verified_payload.is_none()
    }
}

/// Cost tier for the cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// Always runs.
    Cheap,
    /// Runs only when the cascade escalates.
    Heavy,
}

/// Trait for all steganography detectors.
pub trait Detector: Send + Sync {
    /// Name of this detector; also the key of its findings.
    fn name(&self) -> &str;

    /// Cascade tier.
    fn tier(&self) -> Tier;

    /// Whether this detector is relevant for the given modality.
    fn supports(&self, modality: Modality) -> bool;

    /// Analyze the subject.
    fn detect(&self, subject: &ScanSubject<'_>) -> Detection;
}
