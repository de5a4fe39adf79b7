//! Reversible steganographic codecs.
//!
//! Both codecs are used to produce test payloads and, inside the fusion
//! engine, as verification oracles: a successful extraction of printable
//! text is treated as ground truth.
//!
//! The free functions here are the tool surface consumed by UI tools and
//! benchmarks.

pub mod emoji;
pub mod zero_width;

pub use zero_width::{Placement, ZeroWidthMode};

use crate::error::Result;

/// Embed `payload` into `carrier` with invisible code points.
pub fn zero_width_encode(
    carrier: &str,
    payload: &str,
    placement: Placement,
    k: usize,
    mode: ZeroWidthMode,
) -> String {
    zero_width::encode(carrier, payload, placement, k, mode)
}

/// Extract a zero-width payload. Empty when nothing is hidden.
pub fn zero_width_decode(text: &str, mode: ZeroWidthMode) -> String {
    zero_width::decode(text, mode)
}

/// Strip every recognized hidden character, returning the count removed.
pub fn zero_width_clean(text: &str) -> (String, usize) {
    zero_width::clean(text)
}

/// Encode `message` as emoji, masked with `key`.
pub fn emoji_encode(message: &str, key: &str) -> String {
    emoji::encode(message, key)
}

/// Decode an emoji stream produced by [`emoji_encode`].
pub fn emoji_decode(text: &str, key: &str) -> Result<String> {
    Ok(emoji::decode(text, key)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DecodeError, Error};

    #[test]
    fn test_tool_surface_round_trips() {
        let stego = zero_width_encode("cover", "msg", Placement::Top, 1, ZeroWidthMode::Binary);
        assert_eq!(zero_width_decode(&stego, ZeroWidthMode::Binary), "msg");
        assert_eq!(zero_width_clean(&stego), ("cover".to_string(), 24));

        let emoji = emoji_encode("msg", "key");
        assert_eq!(emoji_decode(&emoji, "key").unwrap(), "msg");
    }

    #[test]
    fn test_emoji_decode_error_is_typed() {
        let err = emoji_decode("not emoji", "").unwrap_err();
        assert!(matches!(
            err,
            Error::Decode(DecodeError::UnknownSymbol { position: 0, .. })
        ));
    }
}
