//! Unicode threat scanner.
//!
//! Character-level detectors for zero-width marks, homoglyphs, entropy,
//! variation-selector abuse and invisible layout controls. Every detector is
//! a single O(n) pass that keeps no state between calls. Rust strings cannot
//! hold unpaired surrogates, so malformed input is rejected at the UTF-8
//! boundary and never reaches these functions.

use std::collections::{BTreeMap, HashMap};

use super::confusables::{self, ConfusableScript};
use super::detectors::{Category, Detection, Detector, Modality, Tier};
use super::input::ScanSubject;
use crate::cluster::{self, is_basic_variation_selector};
use crate::config::UnicodeConfig;
use crate::value::FindingValue;

/// The zero-width characters this scanner tracks.
pub const ZERO_WIDTH_CHARS: [char; 4] = [
    '\u{200B}', // Zero Width Space
    '\u{200C}', // Zero Width Non-Joiner
    '\u{200D}', // Zero Width Joiner
    '\u{FEFF}', // Zero Width No-Break Space (BOM)
];

/// Points for a zero-width finding, before the per-character bonus.
pub const ZERO_WIDTH_POINTS: f64 = 20.0;
/// Points for a homoglyph finding, before the per-match bonus.
pub const HOMOGLYPH_POINTS: f64 = 20.0;
/// Points for each layout or selector anomaly.
pub const LAYOUT_POINTS: f64 = 15.0;
/// Points for high entropy, only when corroborating another signal.
pub const ENTROPY_POINTS: f64 = 10.0;

/// Bits per character above which entropy corroborates other signals.
pub const ENTROPY_THRESHOLD: f64 = 4.0;
/// Variation selectors tolerated in plain text.
pub const VARIATION_SELECTOR_LIMIT: usize = 3;
/// Homoglyph matches kept as samples.
pub const HOMOGLYPH_SAMPLE_CAP: usize = 10;
/// Exotic spaces tolerated before flagging.
pub const EXOTIC_SPACE_LIMIT: usize = 2;

/// Zero-width character census.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ZeroWidthReport {
    /// Any tracked character present.
    pub present: bool,
    /// Distinct characters found, in table order.
    pub distinct: Vec<char>,
    /// Total occurrences.
    pub count: usize,
    /// Joiners that bind two pictographs into one emoji.
    pub emoji_joiners: usize,
}

impl ZeroWidthReport {
    /// Occurrences that are not part of a legitimate emoji sequence.
    pub fn suspicious_count(&self) -> usize {
        self.count.saturating_sub(self.emoji_joiners)
    }

    fn to_value(&self) -> FindingValue {
        FindingValue::map()
            .with("present", self.present)
            .with("count", self.count)
            .with("distinct", self.distinct.iter().map(|c| codepoint(*c)).collect::<Vec<_>>())
            .with("emoji_joiners", self.emoji_joiners)
    }
}

/// Report zero-width characters from [`ZERO_WIDTH_CHARS`].
pub fn detect_zero_width(text: &str) -> ZeroWidthReport {
    let mut seen = [false; ZERO_WIDTH_CHARS.len()];
    let mut count = 0;
    for c in text.chars() {
        if let Some(i) = ZERO_WIDTH_CHARS.iter().position(|z| *z == c) {
            seen[i] = true;
            count += 1;
        }
    }
    let distinct: Vec<char> = ZERO_WIDTH_CHARS
        .iter()
        .zip(seen)
        .filter_map(|(c, hit)| hit.then_some(*c))
        .collect();
    ZeroWidthReport {
        present: count > 0,
        distinct,
        count,
        emoji_joiners: if count > 0 { cluster::bridging_joiners(text) } else { 0 },
    }
}

/// One confusable character found in the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HomoglyphMatch {
    /// The character found.
    pub found: char,
    /// The Latin letter it imitates.
    pub looks_like: char,
    /// Its script.
    pub script: ConfusableScript,
}

/// Homoglyph scan result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HomoglyphReport {
    /// Any confusable found.
    pub present: bool,
    /// First matches, capped.
    pub samples: Vec<HomoglyphMatch>,
    /// Total matches and per-script counts, in extended mode.
    pub breakdown: Option<(usize, BTreeMap<ConfusableScript, usize>)>,
    /// Whether Latin letters appear alongside the confusables.
    pub mixed_with_latin: bool,
    total: usize,
}

impl HomoglyphReport {
    /// Total matches, whether or not extended mode was requested.
    pub fn total(&self) -> usize {
        self.total
    }

    fn to_value(&self) -> FindingValue {
        let samples: Vec<FindingValue> = self
            .samples
            .iter()
            .map(|m| {
                FindingValue::map()
                    .with("char", m.found.to_string())
                    .with("looks_like", m.looks_like.to_string())
                    .with("script", m.script.to_string())
            })
            .collect();
        let mut value = FindingValue::map()
            .with("present", self.present)
            .with("samples", FindingValue::List(samples))
            .with("mixed_with_latin", self.mixed_with_latin);
        if let Some((total, by_script)) = &self.breakdown {
            let mut scripts = FindingValue::map();
            for (script, n) in by_script {
                scripts.insert(script.to_string(), *n);
            }
            value.insert("total", *total);
            value.insert("by_script", scripts);
        }
        value
    }
}

/// Scan for confusable look-alikes of Latin letters.
pub fn detect_homoglyphs(text: &str, sample_cap: usize, extended: bool) -> HomoglyphReport {
    let mut samples = Vec::new();
    let mut by_script = BTreeMap::new();
    let mut total = 0;
    for c in text.chars() {
        if let Some((looks_like, script)) = confusables::lookup(c) {
            total += 1;
            *by_script.entry(script).or_insert(0) += 1;
            if samples.len() < sample_cap {
                samples.push(HomoglyphMatch {
                    found: c,
                    looks_like,
                    script,
                });
            }
        }
    }
    HomoglyphReport {
        present: total > 0,
        samples,
        breakdown: extended.then_some((total, by_script)),
        mixed_with_latin: total > 0 && confusables::has_latin(text),
        total,
    }
}

/// Shannon entropy in bits per character. Zero for empty input.
pub fn shannon_entropy(text: &str) -> f64 {
    let mut freq: HashMap<char, usize> = HashMap::new();
    let mut len = 0usize;
    for c in text.chars() {
        *freq.entry(c).or_insert(0) += 1;
        len += 1;
    }
    if len == 0 {
        return 0.0;
    }
    let len = len as f64;
    freq.values()
        .map(|&count| {
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum::<f64>()
        .max(0.0)
}

/// Variation selector census over the 16-symbol block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VariationSelectorReport {
    /// Selectors found.
    pub count: usize,
    /// More than the tolerated number.
    pub suspicious: bool,
}

/// Count U+FE00..U+FE0F; more than `limit` is suspicious.
pub fn detect_variation_selectors(text: &str, limit: usize) -> VariationSelectorReport {
    let count = text.chars().filter(|c| is_basic_variation_selector(*c)).count();
    VariationSelectorReport {
        count,
        suspicious: count > limit,
    }
}

fn is_bidi_control(c: char) -> bool {
    matches!(
        c as u32,
        0x061C | 0x200E | 0x200F | 0x202A..=0x202E | 0x2066..=0x2069
    )
}

fn is_exotic_space(c: char) -> bool {
    matches!(
        c as u32,
        0x00A0 | 0x1680 | 0x2000..=0x200A | 0x202F | 0x205F | 0x3000
    )
}

fn is_invisible_formatter(c: char) -> bool {
    matches!(c as u32, 0x2060..=0x2064 | 0x180E | 0x00AD)
}

/// Invisible layout controls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LayoutReport {
    /// BiDi embedding, override and isolate controls.
    pub bidi_controls: usize,
    /// Tag characters outside emoji subdivision flags.
    pub tag_characters: usize,
    /// Non-standard space characters.
    pub exotic_spaces: usize,
    /// Word joiner, invisible operators and similar.
    pub invisible_formatters: usize,
}

/// Count BiDi controls, stray tag characters, exotic spaces and invisible formatters.
pub fn detect_layout_anomalies(text: &str) -> LayoutReport {
    let mut report = LayoutReport::default();
    for piece in cluster::clusters(text) {
        // Subdivision flags are a black flag followed by tag characters.
        let is_flag = piece.starts_with('\u{1F3F4}');
        for c in piece.chars() {
            if is_bidi_control(c) {
                report.bidi_controls += 1;
            } else if cluster::is_tag(c) && !is_flag {
                report.tag_characters += 1;
            } else if is_exotic_space(c) {
                report.exotic_spaces += 1;
            } else if is_invisible_formatter(c) {
                report.invisible_formatters += 1;
            }
        }
    }
    report
}

fn codepoint(c: char) -> String {
    format!("U+{:04X}", c as u32)
}

/// Detector adapter running every Unicode check.
pub struct UnicodeScanner {
    config: UnicodeConfig,
}

impl UnicodeScanner {
    /// Create a scanner with default thresholds.
    pub fn new() -> Self {
        Self::with_config(UnicodeConfig::default())
    }

    /// Create a scanner with custom thresholds.
    pub fn with_config(config: UnicodeConfig) -> Self {
        Self { config }
    }

    /// Run every check over `text`.
    pub fn scan(&self, text: &str) -> Detection {
        let mut detection = Detection::new(self.name());

        let zero_width = detect_zero_width(text);
        let suspicious_zw = zero_width.suspicious_count();
        if suspicious_zw > 0 {
            detection.signal(
                Category::ZeroWidth,
                "zero_width_characters",
                ZERO_WIDTH_POINTS + 2.0 * suspicious_zw.min(10) as f64,
            );
        }

        let homoglyphs = detect_homoglyphs(
            text,
            self.config.homoglyph_sample_cap,
            self.config.extended_homoglyphs,
        );
        if homoglyphs.mixed_with_latin {
            detection.signal(
                Category::Homoglyph,
                "homoglyph_characters",
                HOMOGLYPH_POINTS + homoglyphs.total().min(10) as f64,
            );
        }

        let selectors = detect_variation_selectors(text, self.config.variation_selector_limit);
        if selectors.suspicious {
            detection.signal(Category::ZeroWidth, "variation_selector_abuse", LAYOUT_POINTS);
        }

        let layout = detect_layout_anomalies(text);
        if layout.bidi_controls > 0 {
            detection.signal(Category::ZeroWidth, "bidi_control_characters", LAYOUT_POINTS);
        }
        if layout.tag_characters > 0 {
            detection.signal(Category::ZeroWidth, "tag_characters", LAYOUT_POINTS);
        }
        if layout.exotic_spaces > self.config.exotic_space_limit {
            detection.signal(Category::ZeroWidth, "exotic_spaces", LAYOUT_POINTS);
        }
        if layout.invisible_formatters > 0 {
            detection.signal(Category::ZeroWidth, "invisible_format_characters", LAYOUT_POINTS);
        }

        let entropy = shannon_entropy(text);
        let high_entropy = entropy > self.config.entropy_threshold;
        // Entropy never stands alone; natural prose sits around 4 bits.
        if high_entropy && !detection.signals.is_empty() {
            detection.signal(Category::Corroborating, "high_entropy", ENTROPY_POINTS);
        }

        detection.findings = FindingValue::map()
            .with("zero_width", zero_width.to_value())
            .with("homoglyphs", homoglyphs.to_value())
            .with(
                "entropy",
                FindingValue::map()
                    .with("value", (entropy * 1000.0).round() / 1000.0)
                    .with("threshold", self.config.entropy_threshold)
                    .with("above_threshold", high_entropy),
            )
            .with(
                "variation_selectors",
                FindingValue::map()
                    .with("count", selectors.count)
                    .with("suspicious", selectors.suspicious),
            )
            .with(
                "layout",
                FindingValue::map()
                    .with("bidi_controls", layout.bidi_controls)
                    .with("tag_characters", layout.tag_characters)
                    .with("exotic_spaces", layout.exotic_spaces)
                    .with("invisible_formatters", layout.invisible_formatters),
            );
        detection
    }
}

impl Default for UnicodeScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for UnicodeScanner {
    fn name(&self) -> &str {
        "unicode"
    }

    fn tier(&self) -> Tier {
        Tier::Cheap
    }

    fn supports(&self, modality: Modality) -> bool {
        matches!(modality, Modality::Text | Modality::Emoji)
    }

    fn detect(&self, subject: &ScanSubject<'_>) -> Detection {
        self.scan(subject.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_width_detection() {
        let report = detect_zero_width("a\u{200B}b\u{FEFF}c\u{200B}");
        assert!(report.present);
        assert_eq!(report.count, 3);
        assert_eq!(report.distinct, vec!['\u{200B}', '\u{FEFF}']);
        assert_eq!(report.suspicious_count(), 3);
        assert!(!detect_zero_width("plain").present);
    }

    #[test]
    fn test_emoji_joiners_not_suspicious() {
        let report = detect_zero_width("\u{1F469}\u{200D}\u{1F469}\u{200D}\u{1F467}\u{200D}\u{1F466}");
        assert_eq!(report.count, 3);
        assert_eq!(report.emoji_joiners, 3);
        assert_eq!(report.suspicious_count(), 0);
    }

    #[test]
    fn test_homoglyphs() {
        let report = detect_homoglyphs("pаypаl", 1, true);
        assert!(report.present);
        assert!(report.mixed_with_latin);
        assert_eq!(report.samples.len(), 1);
        let (total, by_script) = report.breakdown.clone().unwrap();
        assert_eq!(total, 2);
        assert_eq!(by_script.get(&ConfusableScript::Cyrillic), Some(&2));

        let plain = detect_homoglyphs("привет", 10, false);
        assert!(plain.present);
        assert!(!plain.mixed_with_latin);
        assert!(plain.breakdown.is_none());
    }

    #[test]
    fn test_entropy_bounds() {
        assert_eq!(shannon_entropy(""), 0.0);
        assert_eq!(shannon_entropy("aaaaaaa"), 0.0);
        assert!((shannon_entropy("abcd") - 2.0).abs() < 1e-12);
        assert!((shannon_entropy("abababab") - 1.0).abs() < 1e-12);
        let eight: String = "abcdefgh".repeat(5);
        assert!((shannon_entropy(&eight) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_variation_selectors() {
        let text = "a\u{FE00}b\u{FE01}c\u{FE02}d\u{FE0F}";
        let report = detect_variation_selectors(text, 3);
        assert_eq!(report.count, 4);
        assert!(report.suspicious);
        assert!(!detect_variation_selectors("\u{2764}\u{FE0F}", 3).suspicious);
    }

    #[test]
    fn test_layout_anomalies() {
        let report = detect_layout_anomalies("abc\u{202E}def\u{E0041}\u{00A0}x\u{2062}");
        assert_eq!(report.bidi_controls, 1);
        assert_eq!(report.tag_characters, 1);
        assert_eq!(report.exotic_spaces, 1);
        assert_eq!(report.invisible_formatters, 1);

        // England flag: black flag + tag sequence.
        let flag = "\u{1F3F4}\u{E0067}\u{E0062}\u{E0065}\u{E006E}\u{E0067}\u{E007F}";
        assert_eq!(detect_layout_anomalies(flag).tag_characters, 0);
    }

    #[test]
    fn test_clean_sentence_has_no_signals() {
        let scanner = UnicodeScanner::new();
        let detection = scanner.scan("The quick brown fox jumps over the lazy dog.");
        assert!(detection.is_clean());
        assert_eq!(
            detection.findings.get_path("zero_width.present"),
            Some(&FindingValue::Bool(false))
        );
    }

    #[test]
    fn test_entropy_alone_never_signals() {
        let scanner = UnicodeScanner::new();
        let noisy = "Q7#kz!Lp9@Xw2$Rm5%Tn8^Yb3&Vc6*Hd1(Jf4)Gs0";
        assert!(shannon_entropy(noisy) > 4.0);
        assert!(scanner.scan(noisy).is_clean());
    }

    #[test]
    fn test_zero_width_signal_points() {
        let scanner = UnicodeScanner::new();
        let detection = scanner.scan("hi\u{200B}\u{200C}\u{200B}");
        assert_eq!(detection.signals.len(), 1);
        assert_eq!(detection.signals[0].points, 26.0);
    }
}
