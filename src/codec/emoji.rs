//! Emoji alphabet codec.
//!
//! Packs a message into 7-bit chunks and writes each chunk as one emoji from
//! a fixed 128-symbol alphabet. The message bytes are XOR-masked with a
//! repeating key first. The mask is obfuscation, not encryption.

use crate::cluster::{clusters, is_whitespace_cluster, VS16};
use crate::error::DecodeError;

/// Bits carried by one symbol.
pub const BITS_PER_SYMBOL: usize = 7;

/// Number of symbols in the alphabet.
pub const ALPHABET_LEN: usize = 1 << BITS_PER_SYMBOL;

const FACES_START: u32 = 0x1F600;
const FACES_LEN: u32 = 80;
const ANIMALS_START: u32 = 0x1F400;

const fn build_alphabet() -> [char; ALPHABET_LEN] {
    let mut alphabet = ['\u{1F600}'; ALPHABET_LEN];
    let mut i = 0;
    while i < ALPHABET_LEN {
        let cp = if (i as u32) < FACES_LEN {
            FACES_START + i as u32
        } else {
            ANIMALS_START + (i as u32 - FACES_LEN)
        };
        alphabet[i] = match char::from_u32(cp) {
            Some(c) => c,
            None => panic!("alphabet code point out of range"),
        };
        i += 1;
    }
    alphabet
}

/// The 128 symbols: emoticons U+1F600..U+1F64F, then animals U+1F400..U+1F42F.
pub static EMOJI_ALPHABET: [char; ALPHABET_LEN] = build_alphabet();

/// Index of `c` in [`EMOJI_ALPHABET`].
pub fn symbol_index(c: char) -> Option<u8> {
    let cp = c as u32;
    if (FACES_START..FACES_START + FACES_LEN).contains(&cp) {
        Some((cp - FACES_START) as u8)
    } else if (ANIMALS_START..ANIMALS_START + (ALPHABET_LEN as u32 - FACES_LEN)).contains(&cp) {
        Some((cp - ANIMALS_START + FACES_LEN) as u8)
    } else {
        None
    }
}

/// Whether a cluster is an alphabet symbol, alone or with an emoji
/// presentation selector.
pub fn is_alphabet_cluster(cluster: &str) -> bool {
    let mut chars = cluster.chars();
    match (chars.next(), chars.next(), chars.next()) {
        (Some(c), None, None) => symbol_index(c).is_some(),
        (Some(c), Some(VS16), None) => symbol_index(c).is_some(),
        _ => false,
    }
}

fn mask(bytes: &mut [u8], key: &[u8]) {
    if key.is_empty() {
        return;
    }
    for (b, k) in bytes.iter_mut().zip(key.iter().cycle()) {
        *b ^= k;
    }
}

/// Encode `message` as an emoji string, masked with `key`.
pub fn encode(message: &str, key: &str) -> String {
    let mut bytes = message.as_bytes().to_vec();
    mask(&mut bytes, key.as_bytes());

    let mut out = String::new();
    let mut acc: u32 = 0;
    let mut pending = 0;
    for byte in bytes {
        acc = (acc << 8) | u32::from(byte);
        pending += 8;
        while pending >= BITS_PER_SYMBOL {
            pending -= BITS_PER_SYMBOL;
            let chunk = (acc >> pending) as usize & (ALPHABET_LEN - 1);
            out.push(EMOJI_ALPHABET[chunk % ALPHABET_LEN]);
        }
        acc &= (1 << pending) - 1;
    }
    if pending > 0 {
        let chunk = (acc << (BITS_PER_SYMBOL - pending)) as usize & (ALPHABET_LEN - 1);
        out.push(EMOJI_ALPHABET[chunk]);
    }
    out
}

/// Decode an emoji string to its unmasked bytes.
///
/// Whitespace between symbols is ignored. A multi-codepoint cluster falls
/// back to its first codepoint.
pub fn decode_bytes(text: &str, key: &str) -> Result<Vec<u8>, DecodeError> {
    let mut bytes = Vec::new();
    let mut acc: u32 = 0;
    let mut pending = 0;
    for (position, cluster) in clusters(text).enumerate() {
        if is_whitespace_cluster(cluster) {
            continue;
        }
        let index = cluster
            .chars()
            .next()
            .and_then(symbol_index)
            .ok_or_else(|| DecodeError::UnknownSymbol {
                symbol: cluster.to_string(),
                position,
            })?;
        acc = (acc << BITS_PER_SYMBOL) | u32::from(index);
        pending += BITS_PER_SYMBOL;
        if pending >= 8 {
            pending -= 8;
            bytes.push((acc >> pending) as u8);
            acc &= (1 << pending) - 1;
        }
    }
    mask(&mut bytes, key.as_bytes());
    Ok(bytes)
}

/// Decode an emoji string back to the original message.
pub fn decode(text: &str, key: &str) -> Result<String, DecodeError> {
    String::from_utf8(decode_bytes(text, key)?).map_err(|_| DecodeError::InvalidUtf8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alphabet_layout() {
        assert_eq!(EMOJI_ALPHABET[0], '\u{1F600}');
        assert_eq!(EMOJI_ALPHABET[79], '\u{1F64F}');
        assert_eq!(EMOJI_ALPHABET[80], '\u{1F400}');
        assert_eq!(EMOJI_ALPHABET[127], '\u{1F42F}');
        for (i, c) in EMOJI_ALPHABET.iter().enumerate() {
            assert_eq!(symbol_index(*c), Some(i as u8));
        }
        assert_eq!(symbol_index('a'), None);
    }

    #[test]
    fn test_round_trip_with_and_without_key() {
        for (message, key) in [
            ("hello world", ""),
            ("hello world", "k3y"),
            ("", "key"),
            ("ünïcödé ✓ 🦀", "a much longer key than the message"),
        ] {
            let encoded = encode(message, key);
            assert_eq!(decode(&encoded, key).unwrap(), message);
        }
    }

    #[test]
    fn test_symbol_count() {
        // 5 bytes = 40 bits -> 6 symbols (last one padded).
        assert_eq!(encode("hello", "").chars().count(), 6);
        assert_eq!(encode("", "").chars().count(), 0);
    }

    #[test]
    fn test_key_changes_output() {
        assert_ne!(encode("payload", ""), encode("payload", "x"));
    }

    #[test]
    fn test_whitespace_ignored() {
        let encoded: String = encode("spaced", "")
            .chars()
            .flat_map(|c| [c, ' '])
            .collect();
        assert_eq!(decode(&encoded, "").unwrap(), "spaced");
    }

    #[test]
    fn test_selector_suffix_falls_back_to_first_codepoint() {
        let encoded: String = encode("vs", "")
            .chars()
            .flat_map(|c| [c, VS16])
            .collect();
        assert_eq!(decode(&encoded, "").unwrap(), "vs");
    }

    #[test]
    fn test_unknown_symbol_is_error() {
        let err = decode("\u{1F600}x\u{1F601}", "").unwrap_err();
        assert_eq!(
            err,
            DecodeError::UnknownSymbol {
                symbol: "x".into(),
                position: 1
            }
        );
    }

    #[test]
    fn test_alphabet_cluster() {
        assert!(is_alphabet_cluster("\u{1F600}"));
        assert!(is_alphabet_cluster("\u{1F600}\u{FE0F}"));
        assert!(!is_alphabet_cluster("\u{1F680}"));
        assert!(!is_alphabet_cluster("\u{1F469}\u{200D}\u{1F469}"));
    }
}
