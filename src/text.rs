use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine as _;

/// Number of characters a Farcaster feed shows before "show more".
pub const PREVIEW_CHAR_LIMIT: usize = 320;

/// base64url without padding on encode; decode accepts padded and unpadded ids.
const IMAGE_ID: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// First `PREVIEW_CHAR_LIMIT` characters of `text` (never splits a code point).
pub fn preview(text: &str) -> String {
    match text.char_indices().nth(PREVIEW_CHAR_LIMIT) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

pub fn char_count(text: &str) -> usize {
    text.chars().count()
}

/// Models asked for "ONLY JSON" still like to wrap it in a ```json fence.
/// Drops the opening fence line and everything from the last closing fence on.
/// Unfenced input comes back trimmed and otherwise untouched.
pub fn strip_json_fence(raw: &str) -> &str {
    let s = raw.trim();
    if !s.starts_with("```") {
        return s;
    }
    let body = match s.find('\n') {
        Some(nl) => &s[nl + 1..],
        None => s.trim_start_matches('`').trim_start_matches("json"),
    };
    let body = match body.rfind("```") {
        Some(end) => &body[..end],
        None => body,
    };
    body.trim()
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ImageIdError {
    #[error("image id is not valid base64url")]
    Encoding,
    #[error("image id does not decode to utf-8")]
    Utf8,
    #[error("image id does not decode to an http(s) url")]
    NotHttp,
}

/// Opaque proxy id for a blob URL.
pub fn encode_image_id(url: &str) -> String {
    IMAGE_ID.encode(url.as_bytes())
}

pub fn decode_image_id(id: &str) -> Result<reqwest::Url, ImageIdError> {
    let bytes = IMAGE_ID.decode(id.trim()).map_err(|_| ImageIdError::Encoding)?;
    let s = String::from_utf8(bytes).map_err(|_| ImageIdError::Utf8)?;
    let url = reqwest::Url::parse(&s).map_err(|_| ImageIdError::NotHttp)?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(ImageIdError::NotHttp),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_truncates_to_limit() {
        let long = "a".repeat(500);
        assert_eq!(preview(&long).len(), PREVIEW_CHAR_LIMIT);
        assert_eq!(preview("short"), "short");
    }

    #[test]
    fn preview_counts_characters_not_bytes() {
        let korean = "가".repeat(400);
        let p = preview(&korean);
        assert_eq!(p.chars().count(), PREVIEW_CHAR_LIMIT);
        assert!(korean.starts_with(&p));
    }

    #[test]
    fn fence_with_language_tag() {
        let raw = "```json\n{\"ja\": \"こんにちは\"}\n```";
        assert_eq!(strip_json_fence(raw), "{\"ja\": \"こんにちは\"}");
    }

    #[test]
    fn fence_without_tag_and_surrounding_space() {
        let raw = "  ```\n{\"ko\": \"안녕\"}\n```  \n";
        assert_eq!(strip_json_fence(raw), "{\"ko\": \"안녕\"}");
    }

    #[test]
    fn unfenced_is_trimmed_only() {
        assert_eq!(strip_json_fence("\n {\"es\": \"hola\"} \n"), "{\"es\": \"hola\"}");
    }

    #[test]
    fn fenced_and_unfenced_parse_the_same() {
        let plain = "{\"fr\": \"bonjour\", \"de\": \"hallo\"}";
        let fenced = format!("```json\n{plain}\n```");
        let a: serde_json::Value = serde_json::from_str(strip_json_fence(plain)).unwrap();
        let b: serde_json::Value = serde_json::from_str(strip_json_fence(&fenced)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn malformed_fence_still_yields_parse_error_not_panic() {
        let raw = "```json\n{\"fr\": ";
        let stripped = strip_json_fence(raw);
        assert_eq!(stripped, "{\"fr\":");
        assert!(serde_json::from_str::<serde_json::Value>(stripped).is_err());
    }

    #[test]
    fn image_id_round_trip() {
        let url = "https://blob.example.com/uploads/abc-cat.png?v=1";
        let id = encode_image_id(url);
        assert!(!id.contains('='));
        assert!(!id.contains('+') && !id.contains('/'));
        assert_eq!(decode_image_id(&id).unwrap().as_str(), url);
    }

    #[test]
    fn image_id_accepts_padding() {
        let padded = base64::engine::general_purpose::URL_SAFE.encode("https://x.io/a");
        assert!(padded.ends_with('='));
        assert_eq!(decode_image_id(&padded).unwrap().as_str(), "https://x.io/a");
    }

    #[test]
    fn image_id_rejects_garbage() {
        assert_eq!(decode_image_id("not base64!!").unwrap_err(), ImageIdError::Encoding);
        let ftp = encode_image_id("ftp://files.example.com/a.png");
        assert_eq!(decode_image_id(&ftp).unwrap_err(), ImageIdError::NotHttp);
        let bin = IMAGE_ID.encode([0xff, 0xfe, 0xfd]);
        assert_eq!(decode_image_id(&bin).unwrap_err(), ImageIdError::Utf8);
    }
}
