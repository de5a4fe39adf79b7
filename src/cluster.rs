//! Approximate grapheme cluster segmentation.
//!
//! A cluster is a base scalar plus any trailing variation selectors,
//! combining marks, skin-tone modifiers, tag characters and zero-width
//! joiners (each joiner also pulls in the scalar after it). Regional
//! indicators pair up into flags. This is not full UAX #29 segmentation;
//! everything goes through [`next_cluster`] so the rule set can be swapped
//! in one place.

/// Zero-width joiner.
pub const ZWJ: char = '\u{200D}';

/// Text presentation selector.
pub const VS15: char = '\u{FE0E}';

/// Emoji presentation selector.
pub const VS16: char = '\u{FE0F}';

/// Text or emoji presentation selector.
pub fn is_presentation_selector(c: char) -> bool {
    matches!(c, VS15 | VS16)
}

/// Variation selectors, both the 16-symbol block and the supplement.
pub fn is_variation_selector(c: char) -> bool {
    matches!(c as u32, 0xFE00..=0xFE0F | 0xE0100..=0xE01EF)
}

/// Variation selectors from the 16-symbol block only.
pub fn is_basic_variation_selector(c: char) -> bool {
    matches!(c as u32, 0xFE00..=0xFE0F)
}

/// Combining diacritical marks.
pub fn is_combining_mark(c: char) -> bool {
    matches!(
        c as u32,
        0x0300..=0x036F      // Combining Diacritical Marks
            | 0x1AB0..=0x1AFF // Extended
            | 0x1DC0..=0x1DFF // Supplement
            | 0x20D0..=0x20FF // For Symbols (includes the keycap)
            | 0xFE20..=0xFE2F // Half Marks
    )
}

/// Fitzpatrick skin-tone modifiers.
pub fn is_emoji_modifier(c: char) -> bool {
    matches!(c as u32, 0x1F3FB..=0x1F3FF)
}

/// Tag characters (used by subdivision flags, otherwise invisible).
pub fn is_tag(c: char) -> bool {
    matches!(c as u32, 0xE0000..=0xE007F)
}

/// Regional indicator letters.
pub fn is_regional_indicator(c: char) -> bool {
    matches!(c as u32, 0x1F1E6..=0x1F1FF)
}

/// Extended pictographic scalars, approximated by block.
pub fn is_pictographic(c: char) -> bool {
    if is_emoji_modifier(c) || is_regional_indicator(c) {
        return false;
    }
    matches!(
        c as u32,
        0x00A9 | 0x00AE | 0x203C | 0x2049 | 0x2122 | 0x2139
            | 0x2194..=0x2199
            | 0x21A9..=0x21AA
            | 0x231A..=0x231B
            | 0x2328
            | 0x23CF
            | 0x23E9..=0x23F3
            | 0x23F8..=0x23FA
            | 0x24C2
            | 0x25AA..=0x25AB
            | 0x25B6
            | 0x25C0
            | 0x25FB..=0x25FE
            | 0x2600..=0x27BF
            | 0x2934..=0x2935
            | 0x2B05..=0x2B07
            | 0x2B1B..=0x2B1C
            | 0x2B50
            | 0x2B55
            | 0x3030
            | 0x303D
            | 0x3297
            | 0x3299
            | 0x1F000..=0x1FAFF
    )
}

fn is_extender(c: char) -> bool {
    c == ZWJ || is_variation_selector(c) || is_combining_mark(c) || is_emoji_modifier(c) || is_tag(c)
}

/// Split the first cluster off `text`.
///
/// Returns `(cluster, rest)`, or `None` for empty input.
pub fn next_cluster(text: &str) -> Option<(&str, &str)> {
    let mut chars = text.char_indices().peekable();
    let (_, base) = chars.next()?;
    let mut end = base.len_utf8();

    if base == '\r' {
        if let Some(&(i, '\n')) = chars.peek() {
            end = i + 1;
        }
        return Some(text.split_at(end));
    }

    if is_regional_indicator(base) {
        if let Some(&(i, c)) = chars.peek() {
            if is_regional_indicator(c) {
                end = i + c.len_utf8();
                chars.next();
            }
        }
    }

    while let Some(&(i, c)) = chars.peek() {
        if !is_extender(c) {
            break;
        }
        chars.next();
        end = i + c.len_utf8();
        if c == ZWJ {
            // The joiner binds the following scalar into this cluster.
            if let Some(&(j, joined)) = chars.peek() {
                if !joined.is_whitespace() && !joined.is_control() {
                    chars.next();
                    end = j + joined.len_utf8();
                }
            }
        }
    }

    Some(text.split_at(end))
}

/// Iterator over the clusters of a string.
#[derive(Debug, Clone)]
pub struct Clusters<'a> {
    rest: &'a str,
}

impl<'a> Iterator for Clusters<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let (cluster, rest) = next_cluster(self.rest)?;
        self.rest = rest;
        Some(cluster)
    }
}

/// Iterate the clusters of `text`.
pub fn clusters(text: &str) -> Clusters<'_> {
    Clusters { rest: text }
}

/// True if the cluster renders as an emoji.
pub fn is_pictographic_cluster(cluster: &str) -> bool {
    let mut chars = cluster.chars();
    match chars.next() {
        Some(c) if is_pictographic(c) || is_regional_indicator(c) => true,
        // Keycaps: digit, '#' or '*' followed by VS16 and/or U+20E3.
        Some(c) if c.is_ascii_digit() || c == '#' || c == '*' => {
            chars.any(|n| n == '\u{20E3}')
        }
        _ => false,
    }
}

/// True if the cluster consists only of whitespace.
pub fn is_whitespace_cluster(cluster: &str) -> bool {
    !cluster.is_empty() && cluster.chars().all(char::is_whitespace)
}

/// Zero-width joiners in `text` that sit between two pictographic scalars.
///
/// These form legitimate emoji sequences (families, professions, flags with
/// modifiers) and are not evidence of hiding.
pub fn bridging_joiners(text: &str) -> usize {
    let chars: Vec<char> = text.chars().collect();
    let mut count = 0;
    for (i, &c) in chars.iter().enumerate() {
        if c != ZWJ || i == 0 || i + 1 >= chars.len() {
            continue;
        }
        // Walk back over modifiers and selectors to the base scalar.
        let before = chars[..i]
            .iter()
            .rev()
            .find(|p| !is_variation_selector(**p) && !is_emoji_modifier(**p));
        let after = chars[i + 1];
        if before.is_some_and(|p| is_pictographic(*p)) && is_pictographic(after) {
            count += 1;
        }
    }
    count
}
