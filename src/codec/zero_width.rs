//! Zero-width text codec.
//!
//! Hides a payload inside a carrier text as a run of invisible code points.
//! Two alphabets are supported: a binary one (one symbol per bit) and the
//! seven-symbol alphabet used by zwsp-steg style tools (three base-7 digits
//! per byte).

use serde::{Deserialize, Serialize};

/// Binary-mode symbol for a 0 bit.
pub const ZERO_BIT: char = '\u{200B}';
/// Binary-mode symbol for a 1 bit.
pub const ONE_BIT: char = '\u{200C}';

/// Seven-symbol alphabet, indexed by base-7 digit.
pub const ZWSP_TOOL_ALPHABET: [char; 7] = [
    '\u{200B}', // Zero Width Space
    '\u{200C}', // Zero Width Non-Joiner
    '\u{200D}', // Zero Width Joiner
    '\u{2060}', // Word Joiner
    '\u{2061}', // Function Application
    '\u{2062}', // Invisible Times
    '\u{2063}', // Invisible Separator
];

/// Base-7 digits per encoded byte.
const DIGITS_PER_BYTE: usize = 3;

/// Placement bound for the RANDOM strategy, per requested insertion.
pub const RANDOM_ATTEMPTS_PER_INSERT: usize = 10;

/// Where the encoded blob is placed in the carrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Placement {
    /// Prepend once.
    Top,
    /// Append once.
    Bottom,
    /// Insert at `k` random offsets, best effort.
    Random,
    /// Append to every k-th line.
    NthLines,
    /// Insert at a random offset in every k-th line.
    RandomInLine,
}

/// Symbol alphabet used for the hidden run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ZeroWidthMode {
    /// One symbol per payload bit.
    #[default]
    Binary,
    /// Three base-7 symbols per payload byte.
    ZwspTool,
}

impl ZeroWidthMode {
    /// Whether `c` belongs to this mode's alphabet.
    pub fn is_symbol(self, c: char) -> bool {
        match self {
            ZeroWidthMode::Binary => c == ZERO_BIT || c == ONE_BIT,
            ZeroWidthMode::ZwspTool => ZWSP_TOOL_ALPHABET.contains(&c),
        }
    }
}

/// Every character `clean` and `has_hidden` recognize.
pub fn is_hidden_char(c: char) -> bool {
    ZeroWidthMode::ZwspTool.is_symbol(c) || c == '\u{FEFF}'
}

/// Encode `payload` into its hidden-symbol blob.
pub fn encode_blob(payload: &[u8], mode: ZeroWidthMode) -> String {
    match mode {
        ZeroWidthMode::Binary => {
            let mut blob = String::with_capacity(payload.len() * 8 * 3);
            for byte in payload {
                for shift in (0..8).rev() {
                    blob.push(if (byte >> shift) & 1 == 1 { ONE_BIT } else { ZERO_BIT });
                }
            }
            blob
        }
        ZeroWidthMode::ZwspTool => {
            let mut blob = String::with_capacity(payload.len() * DIGITS_PER_BYTE * 3);
            for &byte in payload {
                let value = byte as usize;
                for digit in [value / 49, (value / 7) % 7, value % 7] {
                    blob.push(ZWSP_TOOL_ALPHABET[digit]);
                }
            }
            blob
        }
    }
}

/// Embed `payload` into `carrier` using a fresh random generator.
pub fn encode(
    carrier: &str,
    payload: &str,
    placement: Placement,
    k: usize,
    mode: ZeroWidthMode,
) -> String {
    encode_with_rng(carrier, payload, placement, k, mode, &mut fastrand::Rng::new())
}

/// Embed `payload` into `carrier`, drawing random offsets from `rng`.
///
/// RANDOM tries at most `10 * k` offsets and silently stops early, so the
/// result may carry fewer than `k` copies.
pub fn encode_with_rng(
    carrier: &str,
    payload: &str,
    placement: Placement,
    k: usize,
    mode: ZeroWidthMode,
    rng: &mut fastrand::Rng,
) -> String {
    let blob = encode_blob(payload.as_bytes(), mode);
    if blob.is_empty() {
        return carrier.to_string();
    }
    let stride = k.max(1);

    match placement {
        Placement::Top => format!("{blob}{carrier}"),
        Placement::Bottom => format!("{carrier}{blob}"),
        Placement::Random => {
            let mut chars: Vec<char> = carrier.chars().collect();
            let mut inserted = 0;
            let mut attempts = 0;
            while inserted < k && attempts < RANDOM_ATTEMPTS_PER_INSERT * k {
                attempts += 1;
                let offset = rng.usize(0..=chars.len());
                if chars.get(offset).is_some_and(|c| is_hidden_char(*c)) {
                    continue;
                }
                chars.splice(offset..offset, blob.chars());
                inserted += 1;
            }
            if inserted < k {
                tracing::debug!(requested = k, inserted, "random placement gave up early");
            }
            chars.into_iter().collect()
        }
        Placement::NthLines => carrier
            .split('\n')
            .enumerate()
            .map(|(i, line)| {
                if i % stride == 0 {
                    format!("{line}{blob}")
                } else {
                    line.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join("\n"),
        Placement::RandomInLine => carrier
            .split('\n')
            .enumerate()
            .map(|(i, line)| {
                if i % stride != 0 {
                    return line.to_string();
                }
                if line.is_empty() {
                    return blob.clone();
                }
                let mut chars: Vec<char> = line.chars().collect();
                let offset = rng.usize(0..=chars.len());
                chars.splice(offset..offset, blob.chars());
                chars.into_iter().collect()
            })
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

/// Contiguous runs of the mode's symbols, in text order.
fn hidden_runs(text: &str, mode: ZeroWidthMode) -> Vec<Vec<char>> {
    let mut runs = Vec::new();
    let mut current = Vec::new();
    for c in text.chars() {
        if mode.is_symbol(c) {
            current.push(c);
        } else if !current.is_empty() {
            runs.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs
}

/// Multi-insertion placements repeat one blob; collapse those to one copy.
fn collapse_repeats(runs: Vec<Vec<char>>) -> Vec<char> {
    let shortest = runs.iter().map(Vec::len).min().unwrap_or(0);
    let repeated = runs.len() > 1
        && shortest > 0
        && runs.iter().all(|run| {
            run.len() % shortest == 0 && run.chunks(shortest).all(|c| c == &runs[0][..shortest])
        });
    if repeated {
        runs[0][..shortest].to_vec()
    } else {
        runs.concat()
    }
}

fn symbols_to_bytes(symbols: &[char], mode: ZeroWidthMode) -> Vec<u8> {
    match mode {
        ZeroWidthMode::Binary => symbols
            .chunks_exact(8)
            .map(|bits| {
                bits.iter()
                    .fold(0u8, |acc, &c| (acc << 1) | u8::from(c == ONE_BIT))
            })
            .collect(),
        ZeroWidthMode::ZwspTool => symbols
            .chunks_exact(DIGITS_PER_BYTE)
            .filter_map(|group| {
                let value = group.iter().try_fold(0usize, |acc, c| {
                    ZWSP_TOOL_ALPHABET
                        .iter()
                        .position(|a| a == c)
                        .map(|digit| acc * 7 + digit)
                })?;
                u8::try_from(value).ok()
            })
            .collect(),
    }
}

/// Extract the raw payload bytes hidden in `text`.
pub fn decode_bytes(text: &str, mode: ZeroWidthMode) -> Vec<u8> {
    let symbols = collapse_repeats(hidden_runs(text, mode));
    symbols_to_bytes(&symbols, mode)
}

/// Extract the payload hidden in `text`. Empty when nothing is hidden.
pub fn decode(text: &str, mode: ZeroWidthMode) -> String {
    String::from_utf8_lossy(&decode_bytes(text, mode)).into_owned()
}

/// Remove every recognized hidden character; returns the text and the count removed.
pub fn clean(text: &str) -> (String, usize) {
    let mut removed = 0;
    let cleaned = text
        .chars()
        .filter(|&c| {
            let hidden = is_hidden_char(c);
            removed += usize::from(hidden);
            !hidden
        })
        .collect();
    (cleaned, removed)
}

/// Whether `text` contains any recognized hidden character.
pub fn has_hidden(text: &str) -> bool {
    text.chars().any(is_hidden_char)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CARRIER: &str = "first line\nsecond line\n\nfourth line\nfifth";

    #[test]
    fn test_binary_blob_is_msb_first() {
        let blob: Vec<char> = encode_blob(b"A", ZeroWidthMode::Binary).chars().collect();
        // 'A' = 0b0100_0001
        assert_eq!(blob.len(), 8);
        assert_eq!(blob[1], ONE_BIT);
        assert_eq!(blob[7], ONE_BIT);
        assert_eq!(blob.iter().filter(|c| **c == ONE_BIT).count(), 2);
    }

    #[test]
    fn test_zwsp_tool_blob_width() {
        let blob = encode_blob(&[255, 0, 7], ZeroWidthMode::ZwspTool);
        assert_eq!(blob.chars().count(), 9);
        assert_eq!(decode_bytes(&blob, ZeroWidthMode::ZwspTool), vec![255, 0, 7]);
    }

    #[test]
    fn test_round_trip_fixed_placements() {
        for mode in [ZeroWidthMode::Binary, ZeroWidthMode::ZwspTool] {
            for placement in [
                Placement::Top,
                Placement::Bottom,
                Placement::NthLines,
                Placement::RandomInLine,
            ] {
                for k in [1, 2, 3] {
                    let stego = encode(CARRIER, "hidden ✓ payload", placement, k, mode);
                    assert_eq!(
                        decode(&stego, mode),
                        "hidden ✓ payload",
                        "{placement:?} k={k} {mode:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_random_placement_single_copy_round_trip() {
        let mut rng = fastrand::Rng::with_seed(7);
        let stego = encode_with_rng(
            CARRIER,
            "SECRET",
            Placement::Random,
            1,
            ZeroWidthMode::Binary,
            &mut rng,
        );
        assert_eq!(decode(&stego, ZeroWidthMode::Binary), "SECRET");
    }

    #[test]
    fn test_random_placement_inserts_whole_blobs() {
        let mut rng = fastrand::Rng::with_seed(11);
        let stego = encode_with_rng(
            CARRIER,
            "SECRET",
            Placement::Random,
            3,
            ZeroWidthMode::Binary,
            &mut rng,
        );
        let (cleaned, removed) = clean(&stego);
        assert_eq!(cleaned, CARRIER);
        assert_eq!(removed % 48, 0);
        assert!((48..=144).contains(&removed));
    }

    #[test]
    fn test_random_placement_separate_copies_round_trip() {
        let blob_len = encode_blob(b"SECRET", ZeroWidthMode::Binary).chars().count();
        let mut separate = 0;
        for seed in 0..20 {
            let mut rng = fastrand::Rng::with_seed(seed);
            let stego = encode_with_rng(
                CARRIER,
                "SECRET",
                Placement::Random,
                3,
                ZeroWidthMode::Binary,
                &mut rng,
            );
            let runs = hidden_runs(&stego, ZeroWidthMode::Binary);
            if runs.iter().all(|run| run.len() == blob_len) {
                separate += 1;
                assert_eq!(decode(&stego, ZeroWidthMode::Binary), "SECRET", "seed {seed}");
            }
        }
        assert!(separate > 0);
    }

    #[test]
    fn test_random_with_zero_inserts_nothing() {
        let stego = encode(CARRIER, "x", Placement::Random, 0, ZeroWidthMode::Binary);
        assert_eq!(stego, CARRIER);
    }

    #[test]
    fn test_nth_lines_stride() {
        let stego = encode("a\nb\nc\nd", "x", Placement::NthLines, 2, ZeroWidthMode::Binary);
        let lines: Vec<&str> = stego.split('\n').collect();
        assert!(has_hidden(lines[0]));
        assert!(!has_hidden(lines[1]));
        assert!(has_hidden(lines[2]));
        assert!(!has_hidden(lines[3]));
    }

    #[test]
    fn test_random_in_line_replaces_empty_line() {
        let stego = encode("\nb", "x", Placement::RandomInLine, 1, ZeroWidthMode::Binary);
        let lines: Vec<&str> = stego.split('\n').collect();
        assert_eq!(lines[0], encode_blob(b"x", ZeroWidthMode::Binary));
    }

    #[test]
    fn test_decode_without_hidden_is_empty() {
        assert_eq!(decode("plain text", ZeroWidthMode::Binary), "");
        assert_eq!(decode("", ZeroWidthMode::ZwspTool), "");
    }

    #[test]
    fn test_partial_trailing_bits_discarded() {
        let mut blob = encode_blob(b"ok", ZeroWidthMode::Binary);
        blob.push(ONE_BIT);
        blob.push(ZERO_BIT);
        assert_eq!(decode(&blob, ZeroWidthMode::Binary), "ok");
    }

    #[test]
    fn test_out_of_range_group_discarded() {
        // 6,6,6 in base 7 is 342, which is not a byte.
        let bad: String = std::iter::repeat(ZWSP_TOOL_ALPHABET[6]).take(3).collect();
        let text = format!("{bad}{}", encode_blob(b"k", ZeroWidthMode::ZwspTool));
        assert_eq!(decode(&text, ZeroWidthMode::ZwspTool), "k");
    }

    #[test]
    fn test_clean_counts_and_is_idempotent() {
        let stego = encode("carrier", "ab", Placement::Bottom, 1, ZeroWidthMode::Binary);
        let (once, removed) = clean(&stego);
        assert_eq!(once, "carrier");
        assert_eq!(removed, 16);
        let (twice, removed_again) = clean(&once);
        assert_eq!(twice, once);
        assert_eq!(removed_again, 0);
        assert!(!has_hidden(&twice));
    }

    #[test]
    fn test_distinct_runs_are_concatenated() {
        let text = format!(
            "{}x{}",
            encode_blob(b"ab", ZeroWidthMode::Binary),
            encode_blob(b"c", ZeroWidthMode::Binary)
        );
        assert_eq!(decode(&text, ZeroWidthMode::Binary), "abc");
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(serde_json::to_string(&Placement::NthLines).unwrap(), "\"NTHLINES\"");
        assert_eq!(
            serde_json::to_string(&ZeroWidthMode::ZwspTool).unwrap(),
            "\"ZWSP_TOOL\""
        );
    }
}
