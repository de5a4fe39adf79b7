//! Emoji threat scanner.
//!
//! Independent checks over grapheme clusters: token explosion, grapheme
//! manipulation, variation-selector abuse, repetition fingerprinting and
//! codec-alphabet density. Two extraction strategies act as a verification
//! oracle: a payload that decodes to printable text is treated as proof.

use std::collections::HashSet;

use super::detectors::{Category, Detection, Detector, Modality, Tier};
use super::input::ScanSubject;
use super::patterns;
use crate::cluster::{
    self, is_combining_mark, is_pictographic, is_presentation_selector, is_variation_selector,
    is_whitespace_cluster, ZWJ,
};
use crate::codec::emoji as emoji_codec;
use crate::config::EmojiConfig;
use crate::value::FindingValue;

/// Weight of the codec-alphabet density check.
pub const ALPHABET_WEIGHT: f64 = 60.0;
/// Weight of the repetition fingerprint check.
pub const FINGERPRINT_WEIGHT: f64 = 35.0;
/// Weight of the variation-selector abuse check.
pub const SELECTOR_WEIGHT: f64 = 30.0;
/// Weight of the grapheme manipulation check.
pub const GRAPHEME_WEIGHT: f64 = 25.0;
/// Weight of the token explosion check.
pub const TOKEN_WEIGHT: f64 = 20.0;

/// Sub-tokens a single cluster may expand to.
pub const TOKEN_CEILING: usize = 3;
/// Clusters this long or longer skip the sub-token rule.
pub const TOKEN_MAX_CHARS: usize = 10;
/// Joiners tolerated per cluster when they do not bridge pictographs.
pub const JOINER_LIMIT: usize = 2;
/// Cluster length in chars above which a cluster is manipulated.
pub const MAX_CLUSTER_CHARS: usize = 10;
/// Combining marks tolerated per cluster.
pub const MAX_COMBINING_MARKS: usize = 3;
/// Joiner plus selector clusters longer than this are manipulated.
pub const JOINER_SELECTOR_MIN_CHARS: usize = 5;
/// Share of chars that may be variation selectors.
pub const SELECTOR_DENSITY: f64 = 0.05;
/// Texts shorter than this skip the selector density rule.
pub const SELECTOR_DENSITY_MIN_CHARS: usize = 20;
/// Unique tails below which repetition looks structured.
pub const FINGERPRINT_MAX_UNIQUE_TAILS: usize = 5;
/// Complex clusters needed before fingerprinting applies.
pub const FINGERPRINT_MIN_OCCURRENCES: usize = 9;
/// Repetition ratio above which repetition looks structured.
pub const FINGERPRINT_MIN_RATIO: f64 = 0.7;
/// Alphabet share that flags a short string.
pub const ALPHABET_SHORT_RATIO: f64 = 0.8;
/// Alphabet share that flags a longer string.
pub const ALPHABET_LONG_RATIO: f64 = 0.5;
/// Strings with fewer clusters than this count as short.
pub const ALPHABET_SHORT_CLUSTERS: usize = 20;
/// Clusters needed before the alphabet rule applies.
pub const ALPHABET_MIN_CLUSTERS: usize = 4;
/// Shortest recovered payload that counts as verified.
pub const MIN_PAYLOAD_CHARS: usize = 4;

/// Outcome of one cluster-counting check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClusterCheck {
    /// Clusters that tripped the rule.
    pub flagged: usize,
    /// Clusters examined.
    pub examined: usize,
}

impl ClusterCheck {
    /// True when any cluster tripped the rule.
    pub fn suspicious(&self) -> bool {
        self.flagged > 0
    }

    fn to_value(self) -> FindingValue {
        FindingValue::map()
            .with("suspicious", self.suspicious())
            .with("flagged_clusters", self.flagged)
            .with("clusters", self.examined)
    }
}

fn joiner_count(cluster: &str) -> usize {
    cluster.chars().filter(|c| *c == ZWJ).count()
}

/// Every joiner in the cluster binds two pictographs.
fn is_emoji_sequence(cluster: &str) -> bool {
    let joiners = joiner_count(cluster);
    joiners > 0 && cluster::bridging_joiners(cluster) == joiners
}

/// Clusters with stray joiners or that tokenize into too many pieces.
pub fn check_token_explosion(text: &str, config: &EmojiConfig) -> ClusterCheck {
    let mut check = ClusterCheck::default();
    for cluster in cluster::clusters(text) {
        check.examined += 1;
        let joiners = joiner_count(cluster);
        let stray_joiners = joiners > config.joiner_limit && !is_emoji_sequence(cluster);
        let tokens = cluster
            .split(|c: char| c.is_whitespace() || c.is_ascii_punctuation())
            .filter(|t| !t.is_empty())
            .count();
        let exploded =
            tokens > config.token_ceiling && cluster.chars().count() < config.token_max_chars;
        if stray_joiners || exploded {
            check.flagged += 1;
        }
    }
    check
}

/// Overlong clusters, stacked combining marks, or joiner/selector mixes.
pub fn check_grapheme_manipulation(text: &str, config: &EmojiConfig) -> ClusterCheck {
    let mut check = ClusterCheck::default();
    for cluster in cluster::clusters(text) {
        check.examined += 1;
        let len = cluster.chars().count();
        let marks = cluster.chars().filter(|c| is_combining_mark(*c)).count();
        let mixes = cluster.contains(ZWJ)
            && cluster.chars().any(is_variation_selector)
            && len > config.joiner_selector_min_chars
            && !is_emoji_sequence(cluster);
        if len > config.max_cluster_chars || marks > config.max_combining_marks || mixes {
            check.flagged += 1;
        }
    }
    check
}

/// Variation-selector stream statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SelectorCheck {
    /// Selectors of either block.
    pub count: usize,
    /// Selectors that are not a single presentation selector after an emoji base.
    pub gratuitous: usize,
    /// Two selectors in a row somewhere in the text.
    pub consecutive: bool,
    /// Gratuitous selectors per character.
    pub density: f64,
    /// Rule tripped.
    pub suspicious: bool,
}

fn is_presentation_base(c: char) -> bool {
    is_pictographic(c) || c.is_ascii_digit() || c == '#' || c == '*'
}

/// Consecutive selectors, or a selector density above the configured share.
pub fn check_selector_abuse(text: &str, config: &EmojiConfig) -> SelectorCheck {
    let mut check = SelectorCheck::default();
    let mut prev: Option<char> = None;
    let mut len = 0usize;
    for c in text.chars() {
        len += 1;
        if is_variation_selector(c) {
            check.count += 1;
            if prev.is_some_and(is_variation_selector) {
                check.consecutive = true;
            }
            let presentation =
                is_presentation_selector(c) && prev.is_some_and(is_presentation_base);
            if !presentation {
                check.gratuitous += 1;
            }
        }
        prev = Some(c);
    }
    if len > 0 {
        check.density = check.gratuitous as f64 / len as f64;
    }
    check.suspicious = check.consecutive
        || (len >= config.selector_density_min_chars && check.density > config.selector_density);
    check
}

/// Repetition statistics over complex clusters.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FingerprintCheck {
    /// Clusters using joiners or non-presentation selectors.
    pub complex: usize,
    /// Distinct cluster tails among them.
    pub unique_tails: usize,
    /// `1 - unique / complex`.
    pub repetition_ratio: f64,
    /// Rule tripped.
    pub suspicious: bool,
}

fn is_complex_cluster(cluster: &str) -> bool {
    if cluster.contains(ZWJ) {
        return true;
    }
    let mut chars = cluster.chars();
    let base = chars.next();
    let rest: Vec<char> = chars.collect();
    let plain_presentation = rest.len() == 1
        && is_presentation_selector(rest[0])
        && base.is_some_and(is_presentation_base);
    rest.iter().any(|c| is_variation_selector(*c)) && !plain_presentation
}

/// A handful of tails repeated many times suggests a structured encoding.
pub fn check_pattern_fingerprint(text: &str, config: &EmojiConfig) -> FingerprintCheck {
    let mut tails = HashSet::new();
    let mut complex = 0usize;
    for cluster in cluster::clusters(text).filter(|c| is_complex_cluster(c)) {
        complex += 1;
        let base_len = cluster.chars().next().map_or(0, char::len_utf8);
        tails.insert(&cluster[base_len..]);
    }
    let mut check = FingerprintCheck {
        complex,
        unique_tails: tails.len(),
        ..Default::default()
    };
    if complex > 0 {
        check.repetition_ratio = 1.0 - tails.len() as f64 / complex as f64;
    }
    check.suspicious = complex >= config.fingerprint_min_occurrences
        && check.unique_tails < config.fingerprint_max_unique_tails
        && check.repetition_ratio > config.fingerprint_min_ratio;
    check
}

/// Share of clusters drawn from the codec alphabet.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AlphabetCheck {
    /// Non-whitespace clusters.
    pub clusters: usize,
    /// Of which are alphabet symbols.
    pub alphabet: usize,
    /// `alphabet / clusters`.
    pub ratio: f64,
    /// Rule tripped.
    pub suspicious: bool,
}

/// Flag strings made mostly of codec alphabet symbols.
pub fn check_alphabet_density(text: &str, config: &EmojiConfig) -> AlphabetCheck {
    let mut check = AlphabetCheck::default();
    for cluster in cluster::clusters(text).filter(|c| !is_whitespace_cluster(c)) {
        check.clusters += 1;
        if emoji_codec::is_alphabet_cluster(cluster) {
            check.alphabet += 1;
        }
    }
    if check.clusters == 0 {
        return check;
    }
    check.ratio = check.alphabet as f64 / check.clusters as f64;
    let threshold = if check.clusters < config.alphabet_short_clusters {
        config.alphabet_short_ratio
    } else {
        config.alphabet_long_ratio
    };
    check.suspicious = check.clusters >= config.alphabet_min_clusters && check.ratio >= threshold;
    check
}

/// Bytes carried by the variation selectors in `text`, in order.
///
/// U+FE00..U+FE0F carry 0..15, U+E0100..U+E01EF carry 16..255.
pub fn selector_bytes(text: &str) -> Vec<u8> {
    text.chars()
        .filter_map(|c| match c as u32 {
            cp @ 0xFE00..=0xFE0F => Some((cp - 0xFE00) as u8),
            cp @ 0xE0100..=0xE01EF => Some((cp - 0xE0100 + 16) as u8),
            _ => None,
        })
        .collect()
}

/// Try both extraction strategies; keep the first printable result.
pub fn verify_payload(text: &str, min_chars: usize) -> Option<String> {
    let from_selectors = String::from_utf8(selector_bytes(text)).ok();
    let from_codec = emoji_codec::decode(text, "").ok();
    [from_selectors, from_codec]
        .into_iter()
        .flatten()
        .find(|candidate| patterns::is_printable_payload(candidate, min_chars))
}

/// Full emoji scan result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmojiReport {
    /// Token explosion check.
    pub token_explosion: ClusterCheck,
    /// Grapheme manipulation check.
    pub grapheme_manipulation: ClusterCheck,
    /// Variation-selector abuse check.
    pub selector_abuse: SelectorCheck,
    /// Repetition fingerprint check.
    pub pattern_fingerprint: FingerprintCheck,
    /// Codec alphabet density check.
    pub alphabet_density: AlphabetCheck,
    /// Payload recovered by the oracle.
    pub verified_payload: Option<String>,
    /// Capped sum of the weights of tripped checks.
    pub risk_score: u8,
}

impl EmojiReport {
    /// True iff any check tripped.
    pub fn suspicious(&self) -> bool {
        self.risk_score > 0
    }
}

/// Cheap-tier emoji detector: every check except fingerprinting.
pub struct EmojiScanner {
    config: EmojiConfig,
}

impl EmojiScanner {
    /// Create a scanner with default thresholds.
    pub fn new() -> Self {
        Self::with_config(EmojiConfig::default())
    }

    /// Create a scanner with custom thresholds.
    pub fn with_config(config: EmojiConfig) -> Self {
        Self { config }
    }

    /// Run every check, including fingerprinting, and the oracle.
    pub fn scan(&self, text: &str) -> EmojiReport {
        let mut report = EmojiReport {
            token_explosion: check_token_explosion(text, &self.config),
            grapheme_manipulation: check_grapheme_manipulation(text, &self.config),
            selector_abuse: check_selector_abuse(text, &self.config),
            pattern_fingerprint: check_pattern_fingerprint(text, &self.config),
            alphabet_density: check_alphabet_density(text, &self.config),
            verified_payload: verify_payload(text, self.config.min_payload_chars),
            risk_score: 0,
        };
        let risk: f64 = [
            (report.alphabet_density.suspicious, ALPHABET_WEIGHT),
            (report.pattern_fingerprint.suspicious, FINGERPRINT_WEIGHT),
            (report.selector_abuse.suspicious, SELECTOR_WEIGHT),
            (report.grapheme_manipulation.suspicious(), GRAPHEME_WEIGHT),
            (report.token_explosion.suspicious(), TOKEN_WEIGHT),
        ]
        .iter()
        .filter(|(hit, _)| *hit)
        .map(|(_, weight)| weight)
        .sum();
        report.risk_score = risk.min(100.0) as u8;
        report
    }
}

impl Default for EmojiScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for EmojiScanner {
    fn name(&self) -> &str {
        "emoji"
    }

    fn tier(&self) -> Tier {
        Tier::Cheap
    }

    fn supports(&self, modality: Modality) -> bool {
        matches!(modality, Modality::Text | Modality::Emoji)
    }

    fn detect(&self, subject: &ScanSubject<'_>) -> Detection {
        let text = subject.text;
        let mut detection = Detection::new(self.name());

        let alphabet = check_alphabet_density(text, &self.config);
        let selectors = check_selector_abuse(text, &self.config);
        let grapheme = check_grapheme_manipulation(text, &self.config);
        let tokens = check_token_explosion(text, &self.config);

        if alphabet.suspicious {
            detection.signal(Category::Emoji, "emoji_alphabet_stream", ALPHABET_WEIGHT);
        }
        if selectors.suspicious {
            detection.signal(Category::Emoji, "emoji_variation_selector_abuse", SELECTOR_WEIGHT);
        }
        if grapheme.suspicious() {
            detection.signal(Category::Emoji, "emoji_grapheme_manipulation", GRAPHEME_WEIGHT);
        }
        if tokens.suspicious() {
            detection.signal(Category::Emoji, "emoji_token_explosion", TOKEN_WEIGHT);
        }
        detection.verified_payload = verify_payload(text, self.config.min_payload_chars);

        detection.findings = FindingValue::map()
            .with(
                "alphabet_density",
                FindingValue::map()
                    .with("suspicious", alphabet.suspicious)
                    .with("ratio", (alphabet.ratio * 1000.0).round() / 1000.0)
                    .with("clusters", alphabet.clusters),
            )
            .with(
                "variation_selector_abuse",
                FindingValue::map()
                    .with("suspicious", selectors.suspicious)
                    .with("count", selectors.count)
                    .with("consecutive", selectors.consecutive)
                    .with("density", (selectors.density * 1000.0).round() / 1000.0),
            )
            .with("grapheme_manipulation", grapheme.to_value())
            .with("token_explosion", tokens.to_value())
            .with(
                "verified_payload",
                FindingValue::map()
                    .with("found", detection.verified_payload.is_some())
                    .with("payload", detection.verified_payload.clone().unwrap_or_default()),
            );
        detection
    }
}

/// Heavy-tier emoji detector: repetition fingerprinting.
pub struct EmojiFingerprinter {
    config: EmojiConfig,
}

impl EmojiFingerprinter {
    /// Create a fingerprinter with default thresholds.
    pub fn new() -> Self {
        Self::with_config(EmojiConfig::default())
    }

    /// Create a fingerprinter with custom thresholds.
    pub fn with_config(config: EmojiConfig) -> Self {
        Self { config }
    }
}

impl Default for EmojiFingerprinter {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for EmojiFingerprinter {
    fn name(&self) -> &str {
        "emoji_fingerprint"
    }

    fn tier(&self) -> Tier {
        Tier::Heavy
    }

    fn supports(&self, modality: Modality) -> bool {
        matches!(modality, Modality::Text | Modality::Emoji)
    }

    fn detect(&self, subject: &ScanSubject<'_>) -> Detection {
        let check = check_pattern_fingerprint(subject.text, &self.config);
        let mut detection = Detection::new(self.name());
        if check.suspicious {
            detection.signal(Category::Emoji, "emoji_pattern_fingerprint", FINGERPRINT_WEIGHT);
        }
        detection.findings = FindingValue::map()
            .with("suspicious", check.suspicious)
            .with("complex_clusters", check.complex)
            .with("unique_tails", check.unique_tails)
            .with("repetition_ratio", (check.repetition_ratio * 1000.0).round() / 1000.0);
        detection
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FAMILY: &str = "\u{1F469}\u{200D}\u{1F469}\u{200D}\u{1F467}\u{200D}\u{1F466}";

    fn scanner() -> EmojiScanner {
        EmojiScanner::new()
    }

    fn selector_stego(base: &str, message: &str) -> String {
        let mut out = base.to_string();
        for b in message.bytes() {
            let cp = if b < 16 { 0xFE00 + u32::from(b) } else { 0xE0100 + u32::from(b) - 16 };
            out.push(char::from_u32(cp).unwrap());
        }
        out
    }

    #[test]
    fn test_family_emoji_not_flagged() {
        let report = scanner().scan(FAMILY);
        assert!(!report.suspicious());
        assert_eq!(report.risk_score, 0);
    }

    #[test]
    fn test_repeated_hearts_not_flagged() {
        let hearts = "\u{2764}\u{FE0F}".repeat(12);
        let report = scanner().scan(&hearts);
        assert!(!report.selector_abuse.suspicious);
        assert!(!report.pattern_fingerprint.suspicious);
    }

    #[test]
    fn test_stray_joiners_explode() {
        let config = EmojiConfig::default();
        let check = check_token_explosion("a\u{200D}b\u{200D}c\u{200D}d", &config);
        assert_eq!(check.flagged, 1);
        let check = check_token_explosion(FAMILY, &config);
        assert_eq!(check.flagged, 0);
    }

    #[test]
    fn test_punctuation_glued_cluster_explodes() {
        let config = EmojiConfig::default();
        let check = check_token_explosion("x\u{200D}.\u{200D}y", &EmojiConfig {
            joiner_limit: 5,
            token_ceiling: 1,
            ..config
        });
        assert!(check.suspicious());
    }

    #[test]
    fn test_zalgo_is_grapheme_manipulation() {
        let zalgo = "Z\u{0300}\u{0301}\u{0302}\u{0303}\u{0304}algo";
        let check = check_grapheme_manipulation(zalgo, &EmojiConfig::default());
        assert_eq!(check.flagged, 1);
    }

    #[test]
    fn test_selector_stream() {
        let stego = selector_stego("\u{1F600}", "hidden message");
        let check = check_selector_abuse(&stego, &EmojiConfig::default());
        assert!(check.consecutive);
        assert!(check.suspicious);
        assert_eq!(verify_payload(&stego, 4).as_deref(), Some("hidden message"));
    }

    #[test]
    fn test_codec_stream_is_verified() {
        let encoded = crate::codec::emoji::encode("attack at dawn", "");
        let report = scanner().scan(&encoded);
        assert!(report.alphabet_density.suspicious);
        assert_eq!(report.verified_payload.as_deref(), Some("attack at dawn"));
        assert!(report.risk_score >= 60);
    }

    #[test]
    fn test_fingerprint_on_repeated_tails() {
        let mut text = String::new();
        for base in ['a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j'] {
            text.push(base);
            text.push_str(if base < 'e' { "\u{FE01}\u{FE02}" } else { "\u{FE03}" });
            text.push(' ');
        }
        let check = check_pattern_fingerprint(&text, &EmojiConfig::default());
        assert_eq!(check.complex, 10);
        assert_eq!(check.unique_tails, 2);
        assert!(check.suspicious);
    }

    #[test]
    fn test_alphabet_density_needs_enough_clusters() {
        let config = EmojiConfig::default();
        assert!(!check_alphabet_density("\u{1F600}\u{1F601}", &config).suspicious);
        assert!(check_alphabet_density("\u{1F600}\u{1F601}\u{1F602}\u{1F603}", &config).suspicious);
        assert!(!check_alphabet_density("Great job \u{1F600}\u{1F600}", &config).suspicious);
    }

    #[test]
    fn test_risk_is_capped() {
        let mut text = selector_stego("\u{1F600}", "payload bytes here");
        text.push_str(&crate::codec::emoji::encode("more", ""));
        let report = scanner().scan(&text);
        assert!(report.risk_score <= 100);
        assert!(report.suspicious());
    }

    #[test]
    fn test_detector_adapters() {
        let subject = ScanSubject {
            modality: Modality::Emoji,
            text: FAMILY,
            image: None,
        };
        assert!(EmojiScanner::new().detect(&subject).is_clean());
        assert!(EmojiFingerprinter::new().detect(&subject).is_clean());
        assert_eq!(EmojiFingerprinter::new().tier(), Tier::Heavy);
    }
}
