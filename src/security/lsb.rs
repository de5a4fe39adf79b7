//! Statistical LSB embedding detector.
//!
//! Works on a flat sequence of byte samples (one per colour channel,
//! row-major). Every estimator returns a neutral 0 when the input is too
//! small or degenerate for it; that only means the estimator adds no
//! evidence.

use super::detectors::{Category, Detection, Detector, Modality, Tier};
use super::input::ScanSubject;
use super::stats::{binary_entropy, chi_square_survival};
use crate::config::ImageConfig;
use crate::value::FindingValue;

/// Base points added to the first LSB trigger.
pub const COMPOSITE_POINTS: f64 = 25.0;
/// Points for a chi-square trigger.
pub const CHI_SQUARE_POINTS: f64 = 20.0;
/// Points for an RS trigger.
pub const RS_POINTS: f64 = 20.0;
/// Points for SPA corroborated by chi-square.
pub const SPA_POINTS: f64 = 15.0;
/// Points for joint RS and SPA rates.
pub const JOINT_POINTS: f64 = 15.0;
/// Points for a periodic LSB plane.
pub const BIT_CYCLE_POINTS: f64 = 15.0;
/// Points for a localized-noise fingerprint.
pub const NOISE_POINTS: f64 = 15.0;
/// Points for a payload concentrated in one channel.
pub const CHANNEL_POINTS: f64 = 15.0;

/// Chi-square p-value that alone flags embedding.
pub const CHI_SQUARE_P: f64 = 0.95;
/// Chi-square p-value that corroborates an SPA estimate.
pub const CHI_SQUARE_CORROBORATING_P: f64 = 0.5;
/// RS embedding rate that alone flags embedding.
pub const RS_RATE: f64 = 0.12;
/// SPA embedding rate flagged when chi-square corroborates.
pub const SPA_RATE: f64 = 0.15;
/// RS and SPA rates that flag embedding together.
pub const JOINT_RATE: f64 = 0.05;
/// Largest lag in the bit-cycle sweep.
pub const BIT_CYCLE_MAX_LAG: usize = 32;
/// LSB agreement that flags a periodic plane.
pub const BIT_CYCLE_THRESHOLD: f64 = 0.65;
/// Samples per noise-fingerprint block.
pub const NOISE_BLOCK: usize = 1024;
/// Block variance spread that flags localized embedding.
pub const NOISE_SPREAD: f64 = 0.15;
/// Largest block variance required alongside the spread.
pub const NOISE_MAX: f64 = 0.2;
/// Channel entropy spread that flags one loaded channel.
pub const CHANNEL_SPREAD: f64 = 0.2;
/// Largest channel entropy required alongside the spread.
pub const CHANNEL_MAX: f64 = 0.8;

/// Buckets with fewer samples than this are skipped by the chi-square attack.
const CHI_MIN_BUCKET: u32 = 10;
/// SPA is degenerate when shift-category pairs fall below this share.
const SPA_MIN_SHIFT_SHARE: f64 = 0.05;
/// RS group size and flipping mask.
const RS_MASK: [bool; 4] = [false, true, true, false];
const RS_EPSILON: f64 = 1e-12;

/// Chi-square attack on value pairs `(2i, 2i+1)`.
///
/// Returns the probability that the pair frequencies are equalized, the
/// signature of LSB replacement: near 1 for embedded data, near 0 for
/// natural content.
pub fn chi_square_attack(samples: &[u8]) -> f64 {
    let mut histogram = [0u32; 256];
    for &s in samples {
        histogram[s as usize] += 1;
    }
    let mut total = 0.0;
    let mut buckets = 0usize;
    for pair in histogram.chunks_exact(2) {
        let (even, odd) = (pair[0], pair[1]);
        let combined = even + odd;
        if combined <= CHI_MIN_BUCKET {
            continue;
        }
        let expected = f64::from(combined) / 2.0;
        total += (f64::from(even) - expected).powi(2) / expected
            + (f64::from(odd) - expected).powi(2) / expected;
        buckets += 1;
    }
    if buckets == 0 {
        return 0.0;
    }
    let p = chi_square_survival(total / 2.0, buckets as f64);
    p.clamp(0.0, 1.0)
}

/// Sample pair analysis estimate of the embedding rate.
pub fn sample_pair_analysis(samples: &[u8]) -> f64 {
    if samples.len() < 2 {
        return 0.0;
    }
    let n = (samples.len() - 1) as f64;
    let (mut x, mut y, mut k) = (0u64, 0u64, 0u64);
    for pair in samples.windows(2) {
        let (u, v) = (pair[0], pair[1]);
        let v_even = v % 2 == 0;
        if (v_even && u < v) || (!v_even && u > v) {
            x += 1;
        } else if (v_even && u > v) || (!v_even && u < v) {
            y += 1;
        }
        if u / 2 == v / 2 {
            k += 1;
        }
    }
    let (x, y, k) = (x as f64, y as f64, k as f64);
    if x + y == 0.0 || k < SPA_MIN_SHIFT_SHARE * (x + y) {
        return 0.0;
    }

    let a = k / 2.0;
    let b = 2.0 * x - n;
    let c = y - x;
    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return 0.0;
    }
    let root = discriminant.sqrt();
    let rate = ((-b + root) / (2.0 * a)).min((-b - root) / (2.0 * a));
    if rate > 0.0 && rate <= 1.0 {
        rate
    } else {
        0.0
    }
}

fn discrimination(group: &[i32; 4]) -> i32 {
    group.windows(2).map(|w| (w[1] - w[0]).abs()).sum()
}

fn flip(v: i32) -> i32 {
    v ^ 1
}

fn flip_negative(v: i32) -> i32 {
    ((v + 1) ^ 1) - 1
}

/// Regular minus singular group shares under the mask and its negation.
fn rs_differences(samples: &[u8], flip_all: bool) -> (f64, f64) {
    let (mut regular, mut singular) = (0i64, 0i64);
    let (mut regular_neg, mut singular_neg) = (0i64, 0i64);
    let mut groups = 0i64;
    for chunk in samples.chunks_exact(4) {
        let mut group = [0i32; 4];
        for (slot, &s) in group.iter_mut().zip(chunk) {
            *slot = if flip_all { i32::from(s ^ 1) } else { i32::from(s) };
        }
        let base = discrimination(&group);

        let mut positive = group;
        let mut negative = group;
        for (i, &masked) in RS_MASK.iter().enumerate() {
            if masked {
                positive[i] = flip(group[i]);
                negative[i] = flip_negative(group[i]);
            }
        }

        let fp = discrimination(&positive);
        let fn_ = discrimination(&negative);
        regular += i64::from(fp > base);
        singular += i64::from(fp < base);
        regular_neg += i64::from(fn_ > base);
        singular_neg += i64::from(fn_ < base);
        groups += 1;
    }
    let groups = groups as f64;
    (
        (regular - singular) as f64 / groups,
        (regular_neg - singular_neg) as f64 / groups,
    )
}

/// RS analysis estimate of the embedding rate.
pub fn rs_analysis(samples: &[u8]) -> f64 {
    if samples.len() < 4 {
        return 0.0;
    }
    let (d0, dn0) = rs_differences(samples, false);
    let (d1, dn1) = rs_differences(samples, true);

    let a = 2.0 * (d1 + d0);
    let b = dn0 - dn1 - d1 - 3.0 * d0;
    let c = d0 - dn0;

    let z = if a.abs() < RS_EPSILON {
        if b.abs() < RS_EPSILON {
            return 0.0;
        }
        -c / b
    } else {
        let discriminant = b * b - 4.0 * a * c;
        if discriminant < 0.0 {
            return 0.0;
        }
        let root = discriminant.sqrt();
        let z1 = (-b + root) / (2.0 * a);
        let z2 = (-b - root) / (2.0 * a);
        if z1.abs() <= z2.abs() {
            z1
        } else {
            z2
        }
    };
    if (z - 0.5).abs() < RS_EPSILON {
        return 0.0;
    }
    (z / (z - 0.5)).clamp(0.0, 1.0)
}

/// Periodicity of the LSB plane.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BitCycle {
    /// Lag with the highest agreement.
    pub lag: usize,
    /// Fraction of positions where `lsb(i) == lsb(i + lag)`.
    pub correlation: f64,
    /// Agreement expected from the plane's bit balance alone.
    pub baseline: f64,
    /// Periodic pattern detected.
    pub detected: bool,
}

/// Sweep lags `1..=max_lag` for repeated LSB patterns.
///
/// A heavily unbalanced plane (flat or saturated regions) agrees with itself
/// at every lag, so the excess over the balance baseline must also clear the
/// margin the threshold leaves over a balanced plane.
pub fn bit_cycle(samples: &[u8], max_lag: usize, threshold: f64) -> BitCycle {
    let bits: Vec<u8> = samples.iter().map(|s| s & 1).collect();
    let mut best = BitCycle::default();
    if bits.is_empty() {
        return best;
    }
    for lag in 1..=max_lag {
        if lag >= bits.len() {
            break;
        }
        let span = bits.len() - lag;
        let agree = bits.iter().zip(&bits[lag..]).filter(|(a, b)| a == b).count();
        let correlation = agree as f64 / span as f64;
        if correlation > best.correlation {
            best.lag = lag;
            best.correlation = correlation;
        }
    }
    let ones = bits.iter().filter(|b| **b == 1).count() as f64 / bits.len() as f64;
    best.baseline = ones * ones + (1.0 - ones) * (1.0 - ones);
    best.detected =
        best.correlation > threshold && best.correlation - best.baseline > threshold - 0.5;
    best
}

/// Block-wise LSB variance spread.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NoiseFingerprint {
    /// Full blocks examined.
    pub blocks: usize,
    /// Smallest block variance.
    pub min_variance: f64,
    /// Largest block variance.
    pub max_variance: f64,
    /// Embedding looks localized.
    pub suspicious: bool,
}

/// Compare LSB variance across fixed-size blocks.
pub fn noise_fingerprint(samples: &[u8], block: usize, spread: f64, max: f64) -> NoiseFingerprint {
    let mut result = NoiseFingerprint::default();
    if block == 0 {
        return result;
    }
    let variances: Vec<f64> = samples
        .chunks_exact(block)
        .map(|chunk| {
            let p = chunk.iter().filter(|s| *s & 1 == 1).count() as f64 / block as f64;
            p * (1.0 - p)
        })
        .collect();
    result.blocks = variances.len();
    if variances.len() < 2 {
        return result;
    }
    result.min_variance = variances.iter().copied().fold(f64::INFINITY, f64::min);
    result.max_variance = variances.iter().copied().fold(0.0, f64::max);
    result.suspicious =
        result.max_variance - result.min_variance > spread && result.max_variance > max;
    result
}

/// Per-channel LSB entropy of interleaved RGB samples.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChannelCheck {
    /// LSB entropy of R, G and B.
    pub entropies: [f64; 3],
    /// One channel carries far more LSB entropy than the others.
    pub suspicious: bool,
}

/// Flag a payload concentrated in one colour channel.
pub fn channel_inconsistency(samples: &[u8], spread: f64, max: f64) -> ChannelCheck {
    let mut result = ChannelCheck::default();
    let pixels = samples.len() / 3;
    if pixels == 0 {
        return result;
    }
    let mut ones = [0usize; 3];
    for pixel in samples.chunks_exact(3) {
        for (count, s) in ones.iter_mut().zip(pixel) {
            *count += usize::from(s & 1);
        }
    }
    for (entropy, count) in result.entropies.iter_mut().zip(ones) {
        *entropy = binary_entropy(count as f64 / pixels as f64);
    }
    let hi = result.entropies.iter().copied().fold(0.0, f64::max);
    let lo = result.entropies.iter().copied().fold(f64::INFINITY, f64::min);
    result.suspicious = hi - lo > spread && hi > max;
    result
}

/// Every estimator plus the composite decision.
#[derive(Debug, Clone, PartialEq)]
pub struct LsbReport {
    /// Chi-square p-value.
    pub chi_square: f64,
    /// SPA embedding rate.
    pub spa: f64,
    /// RS embedding rate.
    pub rs: f64,
    /// LSB periodicity.
    pub bit_cycle: BitCycle,
    /// Block variance fingerprint.
    pub noise: NoiseFingerprint,
    /// Channel entropy comparison.
    pub channel: ChannelCheck,
    /// Composite rules that fired, as `(reason, points)`.
    pub triggers: Vec<(String, f64)>,
}

impl LsbReport {
    /// Composite LSB verdict.
    pub fn suspicious(&self) -> bool {
        !self.triggers.is_empty()
    }
}

/// Run the full statistical suite.
pub fn analyze(samples: &[u8], config: &ImageConfig) -> LsbReport {
    let chi_square = chi_square_attack(samples);
    let spa = sample_pair_analysis(samples);
    let rs = rs_analysis(samples);
    let cycle = bit_cycle(samples, config.bit_cycle_max_lag, config.bit_cycle_threshold);
    let noise = noise_fingerprint(samples, config.noise_block, config.noise_spread, config.noise_max);
    let channel = channel_inconsistency(samples, config.channel_spread, config.channel_max);

    let mut triggers: Vec<(String, f64)> = Vec::new();
    if chi_square > config.chi_square_p {
        triggers.push(("lsb_embedding_detected (chi_square)".into(), CHI_SQUARE_POINTS));
    }
    if rs > config.rs_rate {
        triggers.push(("lsb_embedding_detected (rs)".into(), RS_POINTS));
    }
    if spa > config.spa_rate && chi_square > config.chi_square_corroborating_p {
        triggers.push(("lsb_embedding_detected (spa)".into(), SPA_POINTS));
    }
    if rs > config.joint_rate && spa > config.joint_rate {
        triggers.push(("lsb_embedding_detected (rs+spa)".into(), JOINT_POINTS));
    }
    if cycle.detected {
        triggers.push(("lsb_bit_cycle".into(), BIT_CYCLE_POINTS));
    }
    if noise.suspicious {
        triggers.push(("lsb_noise_fingerprint".into(), NOISE_POINTS));
    }
    if let Some(first) = triggers.first_mut() {
        first.1 += COMPOSITE_POINTS;
    }

    LsbReport {
        chi_square,
        spa,
        rs,
        bit_cycle: cycle,
        noise,
        channel,
        triggers,
    }
}

fn rounded(v: f64) -> f64 {
    (v * 10_000.0).round() / 10_000.0
}

/// Heavy-tier detector running the statistical suite on decoded samples.
pub struct LsbAnalyzer {
    config: ImageConfig,
}

impl LsbAnalyzer {
    /// Create an analyzer with default thresholds.
    pub fn new() -> Self {
        Self::with_config(ImageConfig::default())
    }

    /// Create an analyzer with custom thresholds.
    pub fn with_config(config: ImageConfig) -> Self {
        Self { config }
    }
}

impl Default for LsbAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for LsbAnalyzer {
    fn name(&self) -> &str {
        "lsb"
    }

    fn tier(&self) -> Tier {
        Tier::Heavy
    }

    fn supports(&self, modality: Modality) -> bool {
        modality == Modality::Image
    }

    fn detect(&self, subject: &ScanSubject<'_>) -> Detection {
        let mut detection = Detection::new(self.name());
        let samples = match subject.image.and_then(|image| image.samples) {
            Some(samples) if !samples.is_empty() => samples,
            _ => {
                // Undecodable container: report, do not fail the scan.
                detection.findings = FindingValue::map()
                    .with("insufficient_evidence", true)
                    .with("reason", "no decoded samples available")
                    .with("suspicious", false);
                return detection;
            }
        };

        let report = analyze(samples, &self.config);
        for (reason, points) in &report.triggers {
            detection.signal(Category::ImageLsb, reason.clone(), *points);
        }
        if report.channel.suspicious {
            detection.signal(Category::ImageStructural, "channel_inconsistency", CHANNEL_POINTS);
        }

        detection.findings = FindingValue::map()
            .with("samples", samples.len())
            .with("suspicious", report.suspicious())
            .with("chi_square_p", rounded(report.chi_square))
            .with("spa_rate", rounded(report.spa))
            .with("rs_rate", rounded(report.rs))
            .with(
                "bit_cycle",
                FindingValue::map()
                    .with("lag", report.bit_cycle.lag)
                    .with("correlation", rounded(report.bit_cycle.correlation))
                    .with("detected", report.bit_cycle.detected),
            )
            .with(
                "noise_fingerprint",
                FindingValue::map()
                    .with("blocks", report.noise.blocks)
                    .with("min_variance", rounded(report.noise.min_variance))
                    .with("max_variance", rounded(report.noise.max_variance))
                    .with("suspicious", report.noise.suspicious),
            )
            .with(
                "channel_inconsistency",
                FindingValue::map()
                    .with(
                        "entropies",
                        report.channel.entropies.iter().map(|e| rounded(*e)).collect::<Vec<_>>(),
                    )
                    .with("suspicious", report.channel.suspicious),
            );
        detection
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{gaussian_noise, randomize, texture};

    #[test]
    fn test_chi_square_perfect_pairs() {
        let samples: Vec<u8> = (0..2000usize)
            .map(|i| (100 + ((i / 2) % 20) * 2 + i % 2) as u8)
            .collect();
        let p = chi_square_attack(&samples);
        assert!(p > 0.9, "p = {p}");
        assert!(p <= 1.0);
    }

    #[test]
    fn test_chi_square_natural_noise() {
        for seed in 1..6 {
            let p = chi_square_attack(&gaussian_noise(2000, seed, 3.0));
            assert!((0.0..0.5).contains(&p), "seed {seed}: p = {p}");
        }
    }

    #[test]
    fn test_chi_square_degenerate() {
        assert_eq!(chi_square_attack(&[]), 0.0);
        assert_eq!(chi_square_attack(&[1, 2, 3]), 0.0);
    }

    #[test]
    fn test_estimators_on_clean_texture() {
        for seed in 1..4 {
            let clean = texture(20_000, seed);
            assert!(chi_square_attack(&clean) < 0.01);
            assert!(sample_pair_analysis(&clean) < SPA_RATE);
            assert!(rs_analysis(&clean) < RS_RATE);
            let report = analyze(&clean, &ImageConfig::default());
            assert!(!report.suspicious(), "seed {seed}: {:?}", report.triggers);
        }
    }

    #[test]
    fn test_estimators_on_randomized_lsb() {
        let clean = texture(20_000, 2);
        let stego = randomize(&clean, 0.3, 1002);
        let spa = sample_pair_analysis(&stego);
        let rs = rs_analysis(&stego);
        assert!((0.2..0.4).contains(&spa), "spa = {spa}");
        assert!((0.2..0.4).contains(&rs), "rs = {rs}");
        let report = analyze(&stego, &ImageConfig::default());
        assert!(report.suspicious());
        let reasons: Vec<&str> = report.triggers.iter().map(|(r, _)| r.as_str()).collect();
        assert_eq!(
            reasons,
            vec!["lsb_embedding_detected (rs)", "lsb_embedding_detected (rs+spa)"]
        );
        let points: f64 = report.triggers.iter().map(|(_, p)| p).sum();
        assert_eq!(points, 60.0);
    }

    #[test]
    fn test_degenerate_inputs_are_neutral() {
        assert_eq!(sample_pair_analysis(&[7]), 0.0);
        assert_eq!(sample_pair_analysis(&[5; 100]), 0.0);
        assert_eq!(rs_analysis(&[1, 2, 3]), 0.0);
        assert_eq!(rs_analysis(&[9; 400]), 0.0);
    }

    #[test]
    fn test_bit_cycle_tiled_payload() {
        // An 8-bit pattern tiled over the plane.
        let pattern = [1u8, 0, 0, 1, 1, 1, 0, 1];
        let samples: Vec<u8> = (0..4096).map(|i| 100 + pattern[i % 8]).collect();
        let cycle = bit_cycle(&samples, 32, 0.65);
        assert!(cycle.detected);
        assert_eq!(cycle.correlation, 1.0);
        assert_eq!(cycle.lag % 8, 0);
    }

    #[test]
    fn test_bit_cycle_flat_plane_not_detected() {
        let cycle = bit_cycle(&[200u8; 4096], 32, 0.65);
        assert_eq!(cycle.correlation, 1.0);
        assert!(!cycle.detected);
    }

    #[test]
    fn test_noise_fingerprint_localized() {
        let mut samples = vec![128u8; 4096];
        let noisy = randomize(&[128u8; 2048], 1.0, 5);
        samples[..2048].copy_from_slice(&noisy);
        let result = noise_fingerprint(&samples, 1024, 0.15, 0.2);
        assert_eq!(result.blocks, 4);
        assert!(result.suspicious);
        assert!(!noise_fingerprint(&samples[..1024], 1024, 0.15, 0.2).suspicious);
    }

    #[test]
    fn test_channel_inconsistency() {
        let mut rng = fastrand::Rng::with_seed(9);
        let samples: Vec<u8> = (0..3000)
            .map(|i| if i % 3 == 0 { 100 + rng.u8(0..2) } else { 100 })
            .collect();
        let check = channel_inconsistency(&samples, 0.2, 0.8);
        assert!(check.entropies[0] > 0.9);
        assert_eq!(check.entropies[1], 0.0);
        assert!(check.suspicious);
    }

    #[test]
    fn test_analyzer_without_samples_reports_insufficient_evidence() {
        use crate::security::input::{ContainerFormat, ImageView};
        let subject = ScanSubject {
            modality: Modality::Image,
            text: "",
            image: Some(ImageView {
                container: &[0x89, b'P', b'N', b'G'],
                format: ContainerFormat::Png,
                samples: None,
            }),
        };
        let detection = LsbAnalyzer::new().detect(&subject);
        assert!(detection.is_clean());
        assert_eq!(
            detection.findings.get("insufficient_evidence"),
            Some(&FindingValue::Bool(true))
        );
    }
}
