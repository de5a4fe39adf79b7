//! Seeded sample buffers for unit tests.

/// Irwin-Hall approximation of a standard normal.
fn gaussian(rng: &mut fastrand::Rng) -> f64 {
    (0..12).map(|_| rng.f64()).sum::<f64>() - 6.0
}

fn quantize(x: f64) -> u8 {
    (x + 0.5).floor().clamp(0.0, 255.0) as u8
}

/// Independent Gaussian noise around 128.
pub(crate) fn gaussian_noise(n: usize, seed: u64, sigma: f64) -> Vec<u8> {
    let mut rng = fastrand::Rng::with_seed(seed);
    (0..n).map(|_| quantize(128.0 + sigma * gaussian(&mut rng))).collect()
}

/// Smooth AR(1) texture around 128 (amplitude 6, alpha 0.95) plus sensor
/// noise with sigma 0.6. Neighbouring samples are correlated the way
/// photographic content is.
pub(crate) fn texture(n: usize, seed: u64) -> Vec<u8> {
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

/// Replace the LSB of roughly `fraction` of samples with a random bit.
pub(crate) fn randomize(samples: &[u8], fraction: f64, seed: u64) -> Vec<u8> {
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
