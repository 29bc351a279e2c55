//! Inbound request parsing

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use photoguard_core::{PhotoGuardError, PhotoGuardResult, DEFAULT_CONTENT_TYPE};
use photoguard_runtime::PhotoSubmission;
use serde::{Deserialize, Serialize};

/// Standard alphabet, padded or not
const PHOTO_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Classification request body
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassifyRequest {
    /// Base64 photo, optionally as a `data:<mime>;base64,` URL
    #[serde(default)]
    pub photo: Option<String>,

    #[serde(default, rename = "apiKey")]
    pub api_key: Option<String>,
}

/// Parse and validate a raw request body
///
/// Nothing here touches the network: every error is a validation error and
/// the pipeline is not started.
pub fn parse_submission(body: &[u8]) -> PhotoGuardResult<PhotoSubmission> {
    let request: ClassifyRequest = serde_json::from_slice(body)
        .map_err(|e| PhotoGuardError::validation(format!("body is not valid JSON: {}", e)))?;

    let api_key = request
        .api_key
        .filter(|k| !k.is_empty())
        .ok_or_else(|| PhotoGuardError::validation("apiKey is required"))?;

    let photo = request
        .photo
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| PhotoGuardError::validation("photo is required"))?;

    let (content_type, encoded) = split_data_url(&photo)?;

    // Browsers and some encoders wrap long base64 payloads
    let compact: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = PHOTO_ENGINE
        .decode(compact.as_bytes())
        .map_err(|e| PhotoGuardError::validation(format!("photo is not valid base64: {}", e)))?;

    if bytes.is_empty() {
        return Err(PhotoGuardError::validation("photo decoded to zero bytes"));
    }

    Ok(PhotoSubmission::new(bytes, api_key).with_content_type(content_type))
}

/// Split an optional data-URL prefix from the payload
///
/// Returns the declared MIME type (or the default) and the base64 part.
fn split_data_url(photo: &str) -> PhotoGuardResult<(String, &str)> {
    let trimmed = photo.trim();
    let Some(rest) = trimmed.strip_prefix("data:") else {
        return Ok((DEFAULT_CONTENT_TYPE.to_string(), trimmed));
    };

    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| PhotoGuardError::validation("data URL has no payload"))?;

    let mime = header
        .strip_suffix(";base64")
        .ok_or_else(|| PhotoGuardError::validation("only base64 data URLs are supported"))?;

    let content_type = if mime.is_empty() {
        DEFAULT_CONTENT_TYPE.to_string()
    } else {
        mime.to_string()
    };

    Ok((content_type, payload))
}

#[cfg(test)]
mod tests {
    use super::*;

    // base64 of "hello"
    const HELLO_B64: &str = "aGVsbG8=";

    fn body(json: serde_json::Value) -> Vec<u8> {
        serde_json::to_vec(&json).unwrap()
    }

    #[test]
    fn test_plain_base64() {
        let submission =
            parse_submission(&body(serde_json::json!({"photo": HELLO_B64, "apiKey": "k"}))).unwrap();

        assert_eq!(&submission.photo[..], b"hello");
        assert_eq!(submission.api_key, "k");
        assert_eq!(submission.content_type, "image/jpeg");
    }

    #[test]
    fn test_data_url_prefix_stripped() {
        let photo = format!("data:image/jpeg;base64,{}", HELLO_B64);
        let submission =
            parse_submission(&body(serde_json::json!({"photo": photo, "apiKey": "k"}))).unwrap();
        assert_eq!(&submission.photo[..], b"hello");
        assert_eq!(submission.content_type, "image/jpeg");

        let photo = format!("data:image/png;base64,{}", HELLO_B64);
        let submission =
            parse_submission(&body(serde_json::json!({"photo": photo, "apiKey": "k"}))).unwrap();
        assert_eq!(submission.content_type, "image/png");
    }

    #[test]
    fn test_wrapped_base64_accepted() {
        let submission =
            parse_submission(&body(serde_json::json!({"photo": "aGVs\nbG8=", "apiKey": "k"}))).unwrap();
        assert_eq!(&submission.photo[..], b"hello");
    }

    #[test]
    fn test_unpadded_base64_accepted() {
        let submission =
            parse_submission(&body(serde_json::json!({"photo": "aGVsbG8", "apiKey": "k"}))).unwrap();
        assert_eq!(&submission.photo[..], b"hello");

        let photo = "data:image/jpeg;base64,/9j/4GpwZWc";
        let submission =
            parse_submission(&body(serde_json::json!({"photo": photo, "apiKey": "k"}))).unwrap();
        assert_eq!(&submission.photo[..], b"\xff\xd8\xff\xe0jpeg");
    }

    #[test]
    fn test_missing_fields_rejected() {
        let cases = [
            serde_json::json!({"photo": HELLO_B64}),
            serde_json::json!({"photo": HELLO_B64, "apiKey": ""}),
            serde_json::json!({"apiKey": "k"}),
            serde_json::json!({"photo": "", "apiKey": "k"}),
            serde_json::json!({"photo": "data:image/png;base64,", "apiKey": "k"}),
        ];
        for case in cases {
            let err = parse_submission(&body(case.clone())).unwrap_err();
            assert!(matches!(err, PhotoGuardError::Validation(_)), "case: {}", case);
        }
    }

    #[test]
    fn test_bad_payloads_rejected() {
        assert!(parse_submission(b"not json").is_err());
        assert!(parse_submission(&body(serde_json::json!({"photo": "!!!", "apiKey": "k"}))).is_err());
        assert!(parse_submission(&body(serde_json::json!({"photo": "data:image/png,abc", "apiKey": "k"}))).is_err());
        assert!(parse_submission(&body(serde_json::json!({"photo": 42, "apiKey": "k"}))).is_err());
    }
}
