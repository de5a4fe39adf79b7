//! Configuration for stegscan analyzers and scoring.
//!
//! Every empirically chosen threshold is a named constant in the module that
//! applies it and a field here, so it can be overridden from a TOML file. Changing a threshold changes what
//! gets flagged; treat it as a policy decision.

use serde::{Deserialize, Serialize};

use crate::security::{container, emoji, fusion, lsb, unicode};

/// Main configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Log every scan decision, not only suspicious ones.
    pub audit_all: bool,
    /// Unicode threat scanner thresholds.
    pub unicode: UnicodeConfig,
    /// Emoji threat scanner thresholds.
    pub emoji: EmojiConfig,
    /// Statistical image detector thresholds.
    pub image: ImageConfig,
    /// Fusion weights.
    pub scoring: ScoringConfig,
    /// Tiered cascade escalation rules.
    pub cascade: CascadeConfig,
}

/// Unicode threat scanner settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UnicodeConfig {
    /// Entropy (bits per character) above which text is a corroborating signal.
    pub entropy_threshold: f64,
    /// Variation selectors tolerated before flagging.
    pub variation_selector_limit: usize,
    /// Maximum homoglyph matches kept as samples.
    pub homoglyph_sample_cap: usize,
    /// Report per-script breakdown and total homoglyph count.
    pub extended_homoglyphs: bool,
    /// Exotic space characters tolerated before flagging.
    pub exotic_space_limit: usize,
}

impl Default for UnicodeConfig {
    fn default() -> Self {
        Self {
            entropy_threshold: unicode::ENTROPY_THRESHOLD,
            variation_selector_limit: unicode::VARIATION_SELECTOR_LIMIT,
            homoglyph_sample_cap: unicode::HOMOGLYPH_SAMPLE_CAP,
            extended_homoglyphs: true,
            exotic_space_limit: unicode::EXOTIC_SPACE_LIMIT,
        }
    }
}

/// Emoji threat scanner settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmojiConfig {
    /// Sub-token ceiling for a single cluster.
    pub token_ceiling: usize,
    /// Clusters at or above this many chars are exempt from the sub-token rule.
    pub token_max_chars: usize,
    /// Joiners per cluster tolerated when not bridging pictographs.
    pub joiner_limit: usize,
    /// Cluster length (chars) above which a cluster is manipulated.
    pub max_cluster_chars: usize,
    /// Combining marks per cluster tolerated.
    pub max_combining_marks: usize,
    /// Joiner plus selector clusters longer than this are manipulated.
    pub joiner_selector_min_chars: usize,
    /// Fraction of characters that may be variation selectors.
    pub selector_density: f64,
    /// Texts shorter than this skip the density rule.
    pub selector_density_min_chars: usize,
    /// Unique tails below which repetition looks structured.
    pub fingerprint_max_unique_tails: usize,
    /// Complex clusters needed before fingerprinting applies.
    pub fingerprint_min_occurrences: usize,
    /// Repetition ratio above which repetition looks structured.
    pub fingerprint_min_ratio: f64,
    /// Alphabet share that flags a short string.
    pub alphabet_short_ratio: f64,
    /// Alphabet share that flags a longer string.
    pub alphabet_long_ratio: f64,
    /// Strings with fewer clusters than this are "short".
    pub alphabet_short_clusters: usize,
    /// Clusters needed before the alphabet rule applies at all.
    pub alphabet_min_clusters: usize,
    /// Minimum length of an extracted payload to count as verified.
    pub min_payload_chars: usize,
}

impl Default for EmojiConfig {
    fn default() -> Self {
        Self {
            token_ceiling: emoji::TOKEN_CEILING,
            token_max_chars: emoji::TOKEN_MAX_CHARS,
            joiner_limit: emoji::JOINER_LIMIT,
            max_cluster_chars: emoji::MAX_CLUSTER_CHARS,
            max_combining_marks: emoji::MAX_COMBINING_MARKS,
            joiner_selector_min_chars: emoji::JOINER_SELECTOR_MIN_CHARS,
            selector_density: emoji::SELECTOR_DENSITY,
            selector_density_min_chars: emoji::SELECTOR_DENSITY_MIN_CHARS,
            fingerprint_max_unique_tails: emoji::FINGERPRINT_MAX_UNIQUE_TAILS,
            fingerprint_min_occurrences: emoji::FINGERPRINT_MIN_OCCURRENCES,
            fingerprint_min_ratio: emoji::FINGERPRINT_MIN_RATIO,
            alphabet_short_ratio: emoji::ALPHABET_SHORT_RATIO,
            alphabet_long_ratio: emoji::ALPHABET_LONG_RATIO,
            alphabet_short_clusters: emoji::ALPHABET_SHORT_CLUSTERS,
            alphabet_min_clusters: emoji::ALPHABET_MIN_CLUSTERS,
            min_payload_chars: emoji::MIN_PAYLOAD_CHARS,
        }
    }
}

/// Statistical image detector settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Chi-square p-value that alone flags embedding.
    pub chi_square_p: f64,
    /// Chi-square p-value needed to corroborate SPA.
    pub chi_square_corroborating_p: f64,
    /// RS rate that alone flags embedding.
    pub rs_rate: f64,
    /// SPA rate that flags embedding together with chi-square.
    pub spa_rate: f64,
    /// RS and SPA rates that flag embedding jointly.
    pub joint_rate: f64,
    /// Largest lag in the bit-cycle sweep.
    pub bit_cycle_max_lag: usize,
    /// LSB agreement fraction that flags a periodic payload.
    pub bit_cycle_threshold: f64,
    /// Samples per block in the noise fingerprint.
    pub noise_block: usize,
    /// Block variance spread that flags localized embedding.
    pub noise_spread: f64,
    /// Maximum block variance required alongside the spread.
    pub noise_max: f64,
    /// Per-channel LSB entropy spread that flags one loaded channel.
    pub channel_spread: f64,
    /// Maximum channel entropy required alongside the spread.
    pub channel_max: f64,
    /// Bytes past the end marker needed to flag trailing data.
    pub trailing_min_bytes: usize,
    /// Leading container bytes searched for tool signatures.
    pub metadata_window: usize,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            chi_square_p: lsb::CHI_SQUARE_P,
            chi_square_corroborating_p: lsb::CHI_SQUARE_CORROBORATING_P,
            rs_rate: lsb::RS_RATE,
            spa_rate: lsb::SPA_RATE,
            joint_rate: lsb::JOINT_RATE,
            bit_cycle_max_lag: lsb::BIT_CYCLE_MAX_LAG,
            bit_cycle_threshold: lsb::BIT_CYCLE_THRESHOLD,
            noise_block: lsb::NOISE_BLOCK,
            noise_spread: lsb::NOISE_SPREAD,
            noise_max: lsb::NOISE_MAX,
            channel_spread: lsb::CHANNEL_SPREAD,
            channel_max: lsb::CHANNEL_MAX,
            trailing_min_bytes: container::TRAILING_MIN_BYTES,
            metadata_window: container::METADATA_WINDOW,
        }
    }
}

/// Per-category confidence weights.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Zero-width and invisible-layout signals.
    pub zero_width_weight: f64,
    /// Homoglyph signals.
    pub homoglyph_weight: f64,
    /// Emoji scanner signals.
    pub emoji_weight: f64,
    /// Statistical LSB signals.
    pub image_lsb_weight: f64,
    /// Container and channel-structure signals.
    pub image_structural_weight: f64,
    /// Corroborating-only signals such as entropy.
    pub corroborating_weight: f64,
    /// Weighted points that map to a score of 100.
    pub max_attainable: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            zero_width_weight: fusion::ZERO_WIDTH_WEIGHT,
            homoglyph_weight: fusion::HOMOGLYPH_WEIGHT,
            emoji_weight: fusion::EMOJI_WEIGHT,
            image_lsb_weight: fusion::IMAGE_LSB_WEIGHT,
            image_structural_weight: fusion::IMAGE_STRUCTURAL_WEIGHT,
            corroborating_weight: fusion::CORROBORATING_WEIGHT,
            max_attainable: fusion::MAX_ATTAINABLE,
        }
    }
}

/// When the cascade runs heavy analyzers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CascadeConfig {
    /// Weighted cheap-tier points that escalate to the heavy tier.
    pub escalate_points: f64,
    /// Texts with at least this many characters always escalate.
    pub text_min_chars: usize,
    /// Images with at least this many samples always escalate.
    pub image_min_samples: usize,
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self {
            escalate_points: fusion::ESCALATE_POINTS,
            text_min_chars: fusion::TEXT_MIN_CHARS,
            image_min_samples: fusion::IMAGE_MIN_SAMPLES,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &std::path::Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| crate::Error::Config(e.to_string()))
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &std::path::Path) -> crate::Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Create a builder for configuration.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config.
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the entropy corroboration threshold.
    pub fn entropy_threshold(mut self, bits: f64) -> Self {
        self.config.unicode.entropy_threshold = bits;
        self
    }

    /// Set the variation-selector tolerance.
    pub fn variation_selector_limit(mut self, limit: usize) -> Self {
        self.config.unicode.variation_selector_limit = limit;
        self
    }

    /// Set the emoji sub-token ceiling.
    pub fn token_ceiling(mut self, ceiling: usize) -> Self {
        self.config.emoji.token_ceiling = ceiling;
        self
    }

    /// Set the chi-square p-value threshold.
    pub fn chi_square_p(mut self, p: f64) -> Self {
        self.config.image.chi_square_p = p;
        self
    }

    /// Set the standalone RS and SPA rate thresholds.
    pub fn lsb_rates(mut self, rs: f64, spa: f64) -> Self {
        self.config.image.rs_rate = rs;
        self.config.image.spa_rate = spa;
        self
    }

    /// Set the cheap-tier escalation threshold.
    pub fn escalate_points(mut self, points: f64) -> Self {
        self.config.cascade.escalate_points = points;
        self
    }

    /// Log every scan decision.
    pub fn audit_all(mut self, enabled: bool) -> Self {
        self.config.audit_all = enabled;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> Config {
        self.config
    }
}
