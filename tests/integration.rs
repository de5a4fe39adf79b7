//! Integration tests for stegscan.
//!
//! Drive the public API end to end: codecs, the fusion engine and the
//! report layer.

use stegscan::security::lsb::chi_square_attack;
use stegscan::security::unicode::shannon_entropy;
use stegscan::{
    emoji_decode, emoji_encode, zero_width_clean, zero_width_decode, zero_width_encode, Error,
    FindingValue, FusionEngine, Modality, Placement, RiskLevel, ScanInput, ScoreReport, Severity,
    ZeroWidthMode,
};

// ============================================================================
// Fixtures
// ============================================================================

/// Irwin-Hall approximation of a standard normal.
fn gaussian(rng: &mut fastrand::Rng) -> f64 {
    (0..12).map(|_| rng.f64()).sum::<f64>() - 6.0
}

fn quantize(x: f64) -> u8 {
    (x + 0.5).floor().clamp(0.0, 255.0) as u8
}

/// Independent Gaussian noise around 128.
fn gaussian_noise(n: usize, seed: u64, sigma: f64) -> Vec<u8> {
    let mut rng = fastrand::Rng::with_seed(seed);
    (0..n).map(|_| quantize(128.0 + sigma * gaussian(&mut rng))).collect()
}

/// Smooth AR(1) texture around 128 (amplitude 6, alpha 0.95) plus sensor
/// noise with sigma 0.6.
fn gaussian_image(n: usize, seed: u64) -> Vec<u8> {
    let (amp, alpha, noise) = (6.0, 0.95, 0.6);
    let mut rng = fastrand::Rng::with_seed(seed);
    let c = amp * (1.0f64 - alpha * alpha).sqrt();
    let mut v = 0.0;
    (0..n)
        .map(|_| {
            v = alpha * v + c * gaussian(&mut rng);
            quantize(128.0 + v + noise * gaussian(&mut rng))
        })
        .collect()
}

fn randomize_lsb(samples: &[u8], fraction: f64, seed: u64) -> Vec<u8> {
    let mut rng = fastrand::Rng::with_seed(seed);
    samples
        .iter()
        .map(|&s| {
            if rng.f64() < fraction {
                (s & !1) | rng.u8(0..2)
            } else {
                s
            }
        })
        .collect()
}

// ============================================================================
// Scenario Tests
// ============================================================================

#[test]
fn test_secret_in_carrier_is_verified() {
    let carrier = "A".repeat(1000);
    let stego = zero_width_encode(&carrier, "SECRET", Placement::Bottom, 1, ZeroWidthMode::Binary);

    let result = FusionEngine::new().scan_text(&stego).unwrap();
    assert_eq!(
        result.findings.get_path("unicode.zero_width.present"),
        Some(&FindingValue::Bool(true))
    );
    assert_eq!(result.score, 100);
    assert_eq!(result.verified_payload.as_deref(), Some("SECRET"));
    assert_eq!(ScoreReport::new(result).severity, RiskLevel::HighRisk);
}

#[test]
fn test_clean_sentence() {
    let result = FusionEngine::new()
        .scan_text("The quick brown fox jumps over the lazy dog.")
        .unwrap();
    assert!(result.score < 20);
    assert_eq!(ScoreReport::new(result).severity, RiskLevel::Clean);
}

#[test]
fn test_family_emoji_not_flagged() {
    let family = "\u{1F469}\u{200D}\u{1F469}\u{200D}\u{1F467}\u{200D}\u{1F466}";
    let engine = FusionEngine::new();
    let result = engine.scan_text(family).unwrap();
    assert_eq!(result.modality, Modality::Emoji);
    assert_eq!(
        result.findings.get_path("emoji.token_explosion.suspicious"),
        Some(&FindingValue::Bool(false))
    );
    assert_eq!(result.severity, Severity::Safe);
}

#[test]
fn test_lsb_randomized_image() {
    let engine = FusionEngine::new();
    for seed in 1..4 {
        let clean = gaussian_image(20_000, seed);
        let stego = randomize_lsb(&clean, 0.15, seed + 1000);

        let result = engine.scan(&ScanInput::raw_samples(stego)).unwrap();
        assert_eq!(
            result.findings.get_path("lsb.suspicious"),
            Some(&FindingValue::Bool(true)),
            "seed {seed}"
        );
        assert!(result.score >= 50, "seed {seed}: score = {}", result.score);

        let result = engine.scan(&ScanInput::raw_samples(clean)).unwrap();
        assert!(result.score < 30, "seed {seed}: score = {}", result.score);
    }
}

#[test]
fn test_image_with_decoded_samples_and_appended_data() {
    let mut png = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
    png.extend_from_slice(b"IEND");
    png.extend_from_slice(&[0xAE, 0x42, 0x60, 0x82]);
    png.extend_from_slice(b"appended archive");

    let input = ScanInput::image_with_samples(png, "image/png", gaussian_image(4096, 7));
    let result = FusionEngine::new().scan(&input).unwrap();
    assert!(result.has_reason("trailing_data"));
    // 35 points at the structural weight of 1.5
    assert!(result.score >= 52);
}

// ============================================================================
// Property Tests
// ============================================================================

#[test]
fn test_zero_width_round_trip_fixed_placements() {
    let carrier = "first line\nsecond line\n\nfourth line\nlast";
    let payloads = ["SECRET", "x", "h\u{e9}llo w\u{f6}rld", "tab\tand\nnewline"];
    for mode in [ZeroWidthMode::Binary, ZeroWidthMode::ZwspTool] {
        for placement in [
            Placement::Top,
            Placement::Bottom,
            Placement::NthLines,
            Placement::RandomInLine,
        ] {
            for k in [1, 2] {
                for payload in payloads {
                    let stego = zero_width_encode(carrier, payload, placement, k, mode);
                    assert_eq!(
                        zero_width_decode(&stego, mode),
                        payload,
                        "{placement:?} k={k} {mode:?}"
                    );
                }
            }
        }
    }
}

#[test]
fn test_zero_width_no_hidden_data() {
    assert_eq!(zero_width_decode("nothing here", ZeroWidthMode::Binary), "");
    assert_eq!(zero_width_clean("nothing here"), ("nothing here".to_string(), 0));
}

#[test]
fn test_clean_is_idempotent() {
    let stego = zero_width_encode("carrier text", "payload", Placement::Top, 1, ZeroWidthMode::ZwspTool);
    let (once, removed) = zero_width_clean(&stego);
    assert_eq!(once, "carrier text");
    assert_eq!(removed, 21);
    let (twice, removed_again) = zero_width_clean(&once);
    assert_eq!(twice, once);
    assert_eq!(removed_again, 0);
}

#[test]
fn test_emoji_round_trip() {
    for (message, key) in [
        ("attack at dawn", ""),
        ("attack at dawn", "k3y"),
        ("\u{1F600} unicode \u{e9}", "longer key than message"),
        ("", "key"),
    ] {
        let encoded = emoji_encode(message, key);
        assert_eq!(emoji_decode(&encoded, key).unwrap(), message);
    }
}

#[test]
fn test_emoji_decode_unknown_symbol() {
    let err = emoji_decode("\u{1F600}Z", "").unwrap_err();
    assert!(matches!(err, Error::Decode(_)));
    assert!(!err.is_input_error());
}

#[test]
fn test_entropy_bounds() {
    assert_eq!(shannon_entropy(""), 0.0);
    assert_eq!(shannon_entropy("aaaaaaa"), 0.0);
    assert!((shannon_entropy("abcdabcd") - 2.0).abs() < 1e-12);
    assert!((shannon_entropy("ab") - 1.0).abs() < 1e-12);
}

#[test]
fn test_chi_square_bounds() {
    let pairs: Vec<u8> = (0..2000usize)
        .map(|i| (100 + ((i / 2) % 20) * 2 + i % 2) as u8)
        .collect();
    assert!(chi_square_attack(&pairs) > 0.9);

    // Sigma 3 keeps adjacent value pairs visibly unequal, as in natural content.
    for seed in 1..6 {
        let p = chi_square_attack(&gaussian_noise(2000, seed, 3.0));
        assert!((0.0..0.5).contains(&p), "seed {seed}: p = {p}");
    }

    for seed in 0..5 {
        let samples = randomize_lsb(&gaussian_image(500, seed), 0.5, seed + 100);
        let p = chi_square_attack(&samples);
        assert!((0.0..=1.0).contains(&p));
    }
}

// ============================================================================
// Input Handling Tests
// ============================================================================

#[test]
fn test_input_errors() {
    let engine = FusionEngine::new();

    let err = engine.scan_text("").unwrap_err();
    assert!(matches!(err, Error::EmptyInput));
    assert!(err.is_input_error());

    let err = engine
        .scan(&ScanInput::image(Vec::new(), "image/png"))
        .unwrap_err();
    assert!(matches!(err, Error::EmptyInput));

    let err = engine
        .scan(&ScanInput::image(b"<html>".to_vec(), "text/html"))
        .unwrap_err();
    assert!(matches!(err, Error::UnsupportedMediaType(_)));
}

#[test]
fn test_report_json_contract() {
    let result = FusionEngine::new().scan_text("plain words").unwrap();
    let json = ScoreReport::new(result).to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    for key in ["id", "timestamp", "modality", "severity", "score", "findings", "reasons"] {
        assert!(value.get(key).is_some(), "missing {key}");
    }
}
