// src/story_id.rs
//! Reversible story-id tokens for `/news/{id}` routing.
//!
//! A story id is the base64url (no padding) encoding of the story's source
//! URL. The alphabet keeps tokens path-safe: no `/`, `+`, or `=`. Decoding
//! garbage fails loudly so the routing layer can answer 404 instead of
//! serving a corrupted URL.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;

#[derive(Debug, thiserror::Error)]
pub enum StoryIdError {
    #[error("invalid base64url token")]
    InvalidToken(#[from] base64::DecodeError),
    #[error("token does not decode to UTF-8")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
}

/// Encode a source URL into a URL-path-safe opaque token.
pub fn encode(url: &str) -> String {
    URL_SAFE_NO_PAD.encode(url.as_bytes())
}

/// Recover the source URL from a token. Callers treat failure as
/// "story not found", never as a server error.
pub fn decode(id: &str) -> Result<String, StoryIdError> {
    let bytes = URL_SAFE_NO_PAD.decode(id)?;
    Ok(String::from_utf8(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_plain_urls() {
        let u = "https://src.com/markets/btc-ath";
        assert_eq!(decode(&encode(u)).unwrap(), u);
    }

    #[test]
    fn round_trips_query_strings_and_unicode() {
        for u in [
            "https://src.com/a?x=1&y=2",
            "https://src.com/so/qiimaha-bitcoin?ref=portal",
            "https://src.com/war/dhaqaale-iyo-suuq",
            "https://src.com/ünïcode/päth",
        ] {
            assert_eq!(decode(&encode(u)).unwrap(), u, "round trip failed for {u}");
        }
    }

    #[test]
    fn tokens_are_path_safe() {
        let id = encode("https://src.com/a?b=c&d=e/f+g");
        assert!(!id.contains('/'));
        assert!(!id.contains('+'));
        assert!(!id.contains('='));
    }

    #[test]
    fn garbage_fails_instead_of_returning_junk() {
        assert!(decode("!!not base64!!").is_err());
        // Valid base64url but not UTF-8.
        let id = URL_SAFE_NO_PAD.encode([0xff, 0xfe, 0xfd]);
        assert!(matches!(decode(&id), Err(StoryIdError::InvalidUtf8(_))));
    }
}
