//! Fusion engine orchestrator.
//!
//! The [`FusionEngine`] classifies each input, runs the registered
//! detectors in a two-tier cascade, weights their signals by category
//! confidence and folds everything into one bounded score. A payload
//! recovered by a codec overrides the statistics and pins the score at 100.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;

use super::container::ContainerInspector;
use super::detectors::{Detection, Detector, Modality, Severity, Tier};
use super::emoji::{EmojiFingerprinter, EmojiScanner};
use super::input::{ScanInput, ScanSubject};
use super::lsb::LsbAnalyzer;
use super::patterns;
use super::unicode::UnicodeScanner;
use crate::cluster;
use crate::codec::zero_width::{self, ZeroWidthMode};
use crate::config::Config;
use crate::error::Result;
use crate::value::FindingValue;

/// Reason tag added when a codec recovers a printable payload.
pub const VERIFIED_REASON: &str = "verified_payload_extracted";

/// Confidence weight of zero-width and invisible-layout signals.
pub const ZERO_WIDTH_WEIGHT: f64 = 1.5;
/// Confidence weight of homoglyph signals.
pub const HOMOGLYPH_WEIGHT: f64 = 1.2;
/// Confidence weight of emoji scanner signals.
pub const EMOJI_WEIGHT: f64 = 1.0;
/// Confidence weight of statistical LSB signals.
pub const IMAGE_LSB_WEIGHT: f64 = 1.3;
/// Confidence weight of container and channel-structure signals.
pub const IMAGE_STRUCTURAL_WEIGHT: f64 = 1.5;
/// Confidence weight of corroborating-only signals.
pub const CORROBORATING_WEIGHT: f64 = 1.0;
/// Weighted points that map to a score of 100.
pub const MAX_ATTAINABLE: f64 = 100.0;
/// Weighted cheap-tier points that escalate to the heavy tier.
pub const ESCALATE_POINTS: f64 = 20.0;
/// Texts with at least this many chars always escalate.
pub const TEXT_MIN_CHARS: usize = 64;
/// Images with at least this many samples always escalate.
pub const IMAGE_MIN_SAMPLES: usize = 1024;

/// Result of one scan.
#[derive(Debug, Clone, Serialize)]
pub struct ScanResult {
    /// Classified modality.
    pub modality: Modality,
    /// Fused score, 0 to 100.
    pub score: u8,
    /// Five-band severity.
    pub severity: Severity,
    /// Findings keyed by detector name.
    pub findings: FindingValue,
    /// De-duplicated reason tags.
    pub reasons: BTreeSet<String>,
    /// Payload recovered by a codec oracle.
    pub verified_payload: Option<String>,
}

impl ScanResult {
    /// Whether anything at all was flagged.
    pub fn is_suspicious(&self) -> bool {
        self.severity != Severity::Safe
    }

    /// Whether `reason` was raised during the scan.
    pub fn has_reason(&self, reason: &str) -> bool {
        self.reasons.contains(reason)
    }
}

/// Decide which scanners an input needs.
///
/// Images are always [`Modality::Image`]; text is [`Modality::Emoji`] when
/// more than half of its grapheme clusters, whitespace included, are
/// pictographic.
pub fn classify(input: &ScanInput) -> Modality {
    match input {
        ScanInput::Image(_) => Modality::Image,
        ScanInput::Text(text) => {
            let (mut total, mut pictographic) = (0usize, 0usize);
            for c in cluster::clusters(text) {
                total += 1;
                if cluster::is_pictographic_cluster(c) {
                    pictographic += 1;
                }
            }
            if total > 0 && pictographic * 2 > total {
                Modality::Emoji
            } else {
                Modality::Text
            }
        }
    }
}

/// Zero-width extraction oracle: binary mode first, then the 7-symbol tool
/// alphabet. Joiners inside emoji sequences are not hidden data.
pub fn zero_width_oracle(text: &str, min_chars: usize) -> Option<String> {
    let hidden = text.chars().filter(|c| zero_width::is_hidden_char(*c)).count();
    if hidden == 0 || hidden <= cluster::bridging_joiners(text) {
        return None;
    }
    [ZeroWidthMode::Binary, ZeroWidthMode::ZwspTool]
        .into_iter()
        .map(|mode| zero_width::decode(text, mode))
        .find(|candidate| patterns::is_printable_payload(candidate, min_chars))
}

/// Cascade bookkeeping for one scan.
struct Cascade {
    cheap_points: f64,
    escalated: bool,
}

/// The steganography fusion engine.
///
/// Holds no per-scan state; a single engine can serve any number of
/// concurrent scans.
pub struct FusionEngine {
    config: Config,
    detectors: Vec<Arc<dyn Detector>>,
}

impl FusionEngine {
    /// Create an engine with default configuration and all detectors.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Create an engine with custom configuration.
    pub fn with_config(config: Config) -> Self {
        let detectors: Vec<Arc<dyn Detector>> = vec![
            Arc::new(UnicodeScanner::with_config(config.unicode.clone())),
            Arc::new(EmojiScanner::with_config(config.emoji.clone())),
            Arc::new(ContainerInspector::with_config(config.image.clone())),
            Arc::new(EmojiFingerprinter::with_config(config.emoji.clone())),
            Arc::new(LsbAnalyzer::with_config(config.image.clone())),
        ];
        Self { config, detectors }
    }

    /// Register an additional custom detector.
    pub fn add_detector(&mut self, detector: Arc<dyn Detector>) {
        self.detectors.push(detector);
    }

    /// Get the current configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Names of the registered detectors, in run order within a tier.
    pub fn detector_names(&self) -> Vec<&str> {
        self.detectors.iter().map(|d| d.name()).collect()
    }

    /// Scan text (convenience method).
    pub fn scan_text(&self, text: &str) -> Result<ScanResult> {
        self.scan(&ScanInput::text(text))
    }

    /// Scan one input through the cascade.
    ///
    /// Fails only when the input itself is unusable; analyzer trouble is
    /// reported inside the findings.
    pub fn scan(&self, input: &ScanInput) -> Result<ScanResult> {
        let modality = classify(input);
        let subject = input.subject(modality)?;

        let mut detections = self.run_tier(Tier::Cheap, &subject);
        let cheap_points = self.weighted_points(&detections);
        let escalated = self.should_escalate(&subject, cheap_points);
        if escalated {
            tracing::debug!(cheap_points, %modality, "Cascade escalating to heavy analyzers");
            detections.extend(self.run_tier(Tier::Heavy, &subject));
        } else {
            tracing::debug!(cheap_points, %modality, "Cascade skipping heavy analyzers");
        }

        let cascade = Cascade {
            cheap_points,
            escalated,
        };
        let result = self.fuse(modality, &subject, detections, &cascade);

        if self.config.audit_all || result.severity != Severity::Safe {
            tracing::info!(
                modality = %result.modality,
                score = result.score,
                severity = %result.severity,
                reasons = result.reasons.len(),
                "Steganography scan result"
            );
        }
        Ok(result)
    }

    fn run_tier(&self, tier: Tier, subject: &ScanSubject<'_>) -> Vec<Detection> {
        self.detectors
            .iter()
            .filter(|d| d.tier() == tier && d.supports(subject.modality))
            .map(|d| {
                let detection = d.detect(subject);
                tracing::debug!(
                    detector = d.name(),
                    tier = ?tier,
                    signals = detection.signals.len(),
                    "Detector finished"
                );
                detection
            })
            .collect()
    }

    fn weighted_points(&self, detections: &[Detection]) -> f64 {
        detections
            .iter()
            .flat_map(|d| &d.signals)
            .map(|s| s.points * s.category.weight(&self.config.scoring))
            .sum()
    }

    fn should_escalate(&self, subject: &ScanSubject<'_>, cheap_points: f64) -> bool {
        let cascade = &self.config.cascade;
        if cheap_points >= cascade.escalate_points {
            return true;
        }
        match subject.image {
            // Without samples the heavy suite only reports missing evidence.
            Some(image) => image
                .samples
                .map_or(true, |s| s.len() >= cascade.image_min_samples),
            None => subject.text.chars().count() >= cascade.text_min_chars,
        }
    }

    fn fuse(
        &self,
        modality: Modality,
        subject: &ScanSubject<'_>,
        detections: Vec<Detection>,
        cascade: &Cascade,
    ) -> ScanResult {
        let total = self.weighted_points(&detections);
        let max = self.config.scoring.max_attainable;
        let mut score = if max > 0.0 {
            (total * 100.0 / max).clamp(0.0, 100.0).floor() as u8
        } else {
            0
        };

        let mut reasons = BTreeSet::new();
        let mut findings = FindingValue::map();
        let mut verified_payload = None;
        for detection in detections {
            reasons.extend(detection.signals.iter().map(|s| s.reason.clone()));
            if verified_payload.is_none() {
                verified_payload = detection.verified_payload;
            }
            findings.insert(detection.detector, detection.findings);
        }

        if verified_payload.is_none() && subject.image.is_none() {
            verified_payload =
                zero_width_oracle(subject.text, self.config.emoji.min_payload_chars);
        }
        if let Some(payload) = &verified_payload {
            tracing::warn!(
                chars = payload.chars().count(),
                "Codec recovered a hidden payload; forcing maximum score"
            );
            score = 100;
            reasons.insert(VERIFIED_REASON.to_string());
        }

        findings.insert(
            "cascade",
            FindingValue::map()
                .with("cheap_points", (cascade.cheap_points * 100.0).round() / 100.0)
                .with("escalated", cascade.escalated)
                .with("weighted_points", (total * 100.0).round() / 100.0),
        );

        ScanResult {
            modality,
            score,
            severity: Severity::from_score(score),
            findings,
            reasons,
            verified_payload,
        }
    }
}

impl Default for FusionEngine {
    fn default() -> Self {
        Self::new()
    }
}
